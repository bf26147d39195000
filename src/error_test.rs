use super::*;

fn http(status: u16) -> ClientError {
    ClientError::Http { status, body: "body".to_owned() }
}

// =============================================================================
// RETRY CLASSIFICATION
// =============================================================================

#[test]
fn transport_errors_are_retryable() {
    assert!(ClientError::Transport("connection reset".to_owned()).retryable());
}

#[test]
fn transient_http_statuses_are_retryable() {
    assert!(http(408).retryable());
    assert!(http(429).retryable());
    assert!(http(500).retryable());
    assert!(http(503).retryable());
    assert!(http(599).retryable());
}

#[test]
fn client_http_statuses_are_terminal() {
    assert!(!http(400).retryable());
    assert!(!http(403).retryable());
    assert!(!http(404).retryable());
}

#[test]
fn application_failures_are_terminal() {
    assert!(!ClientError::Api { message: "Invalid nonce".to_owned() }.retryable());
    assert!(!ClientError::Decode("missing field".to_owned()).retryable());
    assert!(!ClientError::JobFailed { message: "export failed".to_owned() }.retryable());
    assert!(
        !ClientError::RetriesExhausted {
            attempts: 6,
            source: Box::new(ClientError::Transport("timeout".to_owned())),
        }
        .retryable()
    );
    assert!(!ClientError::PollBudgetExhausted { polls: 40 }.retryable());
    assert!(!ClientError::InvalidConfig("BOTKIT_BASE_URL not set".to_owned()).retryable());
}

// =============================================================================
// CODES AND DISPLAY
// =============================================================================

#[test]
fn error_codes_are_distinct_per_variant() {
    let errors = [
        ClientError::Transport(String::new()),
        http(500),
        ClientError::Api { message: String::new() },
        ClientError::Decode(String::new()),
        ClientError::JobFailed { message: String::new() },
        ClientError::RetriesExhausted { attempts: 1, source: Box::new(http(500)) },
        ClientError::PollBudgetExhausted { polls: 1 },
        ClientError::InvalidConfig(String::new()),
    ];
    let mut codes: Vec<&str> = errors.iter().map(ErrorCode::error_code).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), errors.len());
}

#[test]
fn server_messages_display_verbatim() {
    let api = ClientError::Api { message: "You have reached your message limit.".to_owned() };
    assert_eq!(api.to_string(), "You have reached your message limit.");

    let failed = ClientError::JobFailed { message: "PDF renderer crashed".to_owned() };
    assert_eq!(failed.to_string(), "PDF renderer crashed");
}

#[test]
fn retries_exhausted_reports_attempts_and_cause() {
    let err = ClientError::RetriesExhausted {
        attempts: 6,
        source: Box::new(ClientError::Transport("timeout".to_owned())),
    };
    assert_eq!(err.to_string(), "gave up after 6 attempts: transport error: timeout");
}
