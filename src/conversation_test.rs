use super::*;

// =============================================================================
// TRANSCRIPT
// =============================================================================

#[test]
fn turns_append_in_order() {
    let mut conversation = Conversation::new(7, "Support");
    conversation.push_user("How do I export?");
    conversation.push_assistant("Open the export dialog.");

    assert_eq!(conversation.messages.len(), 2);
    assert_eq!(conversation.messages[0].role, Role::User);
    assert_eq!(conversation.messages[1].role, Role::Assistant);
}

#[test]
fn conversation_parses_camel_case_flags() {
    let raw = r#"{"id": 3, "title": "Billing", "isFavorite": true, "isActive": false}"#;
    let conversation: Conversation = serde_json::from_str(raw).unwrap();
    assert!(conversation.is_favorite);
    assert!(!conversation.is_active);
    assert!(conversation.messages.is_empty());
}

#[test]
fn role_uses_lowercase_wire_strings() {
    assert_eq!(serde_json::to_string(&Role::User).unwrap(), r#""user""#);
    assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), r#""assistant""#);
}

// =============================================================================
// DRAFT CACHE
// =============================================================================

#[test]
fn drafts_are_kept_per_conversation() {
    let mut drafts = DraftCache::new();
    drafts.set(1, "half-typed question");
    drafts.set(2, "other thread");

    assert_eq!(drafts.get(1), Some("half-typed question"));
    assert_eq!(drafts.get(2), Some("other thread"));
    assert_eq!(drafts.get(3), None);
}

#[test]
fn take_consumes_the_draft() {
    let mut drafts = DraftCache::new();
    drafts.set(1, "send me");

    assert_eq!(drafts.take(1), Some("send me".to_owned()));
    assert_eq!(drafts.take(1), None);
}

#[test]
fn empty_draft_clears_the_slot() {
    let mut drafts = DraftCache::new();
    drafts.set(1, "something");
    drafts.set(1, "");
    assert_eq!(drafts.get(1), None);
}

#[test]
fn clear_drops_everything() {
    let mut drafts = DraftCache::new();
    drafts.set(1, "a");
    drafts.set(2, "b");
    drafts.clear();
    assert_eq!(drafts.get(1), None);
    assert_eq!(drafts.get(2), None);
}
