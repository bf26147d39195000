//! Chat: message submission and streamed reply assembly.
//!
//! Submitting a message is polymorphic on the server's mood: small
//! replies come back whole in the submit response, larger ones open a
//! streamed response that is polled chunk by chunk until the server
//! flags `done`. Both paths end in the same [`ChatReply`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ClientError;
use crate::poll::{JobProbe, Step};
use crate::transport::Ajax;

pub const ACTION_CHAT_MESSAGE: &str = "ai_botkit_chat_message";
pub const ACTION_STREAM_RESPONSE: &str = "ai_botkit_stream_response";

// =============================================================================
// REQUEST AND REPLY
// =============================================================================

/// One outgoing user message.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub message: String,
    /// Omitted for the first message of a fresh conversation.
    pub conversation_id: Option<i64>,
    /// Overrides the site-wide default bot.
    pub bot_id: Option<String>,
}

impl ChatRequest {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), conversation_id: None, bot_id: None }
    }

    #[must_use]
    pub fn with_conversation(mut self, conversation_id: i64) -> Self {
        self.conversation_id = Some(conversation_id);
        self
    }

    #[must_use]
    pub fn with_bot(mut self, bot_id: impl Into<String>) -> Self {
        self.bot_id = Some(bot_id.into());
        self
    }
}

/// A finished assistant reply.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub content: String,
    /// Knowledge-base citations, passed through untouched.
    pub sources: Option<Value>,
    /// Retrieval context echoed by the server, passed through untouched.
    pub context: Option<Value>,
}

/// Outcome of a submit: the reply arrived whole, or the server opened a
/// streamed response to poll.
#[derive(Debug)]
pub enum ChatSubmit {
    Complete(ChatReply),
    Streaming { response_id: String },
}

#[derive(Debug, Deserialize)]
struct ChatMessageData {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    streaming: bool,
    #[serde(default)]
    response_id: Option<String>,
    #[serde(default)]
    context: Option<Value>,
}

/// Submit one user message.
pub async fn send_message(
    ajax: &dyn Ajax,
    request: &ChatRequest,
) -> Result<ChatSubmit, ClientError> {
    let mut fields: Vec<(&str, String)> = vec![("message", request.message.clone())];
    if let Some(conversation_id) = request.conversation_id {
        fields.push(("conversation_id", conversation_id.to_string()));
    }
    if let Some(bot_id) = &request.bot_id {
        fields.push(("bot_id", bot_id.clone()));
    }

    let data = ajax.post(ACTION_CHAT_MESSAGE, &fields).await?;
    let data: ChatMessageData =
        serde_json::from_value(data).map_err(|e| ClientError::Decode(e.to_string()))?;

    if data.streaming {
        let Some(response_id) = data.response_id else {
            return Err(ClientError::Decode("streaming reply without response_id".to_owned()));
        };
        return Ok(ChatSubmit::Streaming { response_id });
    }

    let Some(content) = data.response else {
        return Err(ClientError::Decode(
            "reply carries neither a response nor a stream handle".to_owned(),
        ));
    };
    Ok(ChatSubmit::Complete(ChatReply { content, sources: None, context: data.context }))
}

// =============================================================================
// STREAM PROBE
// =============================================================================

#[derive(Debug, Deserialize)]
struct StreamChunkData {
    #[serde(default)]
    content: String,
    #[serde(default)]
    sources: Option<Value>,
    #[serde(default)]
    done: bool,
}

/// Polls a streamed response and accumulates chunks until `done`.
///
/// Each non-terminal step carries the full text assembled so far, so a
/// later update supersedes every earlier one. The terminal step carries
/// the whole assembled reply, final chunk included.
pub struct StreamProbe {
    ajax: Arc<dyn Ajax>,
    response_id: String,
    assembled: String,
    sources: Option<Value>,
}

impl StreamProbe {
    #[must_use]
    pub fn new(ajax: Arc<dyn Ajax>, response_id: impl Into<String>) -> Self {
        Self { ajax, response_id: response_id.into(), assembled: String::new(), sources: None }
    }
}

#[async_trait]
impl JobProbe for StreamProbe {
    type Update = String;
    type Output = ChatReply;

    async fn poll(&mut self) -> Result<Step<String, ChatReply>, ClientError> {
        let fields = [("response_id", self.response_id.clone())];
        let data = self.ajax.post(ACTION_STREAM_RESPONSE, &fields).await?;
        let chunk: StreamChunkData =
            serde_json::from_value(data).map_err(|e| ClientError::Decode(e.to_string()))?;

        self.assembled.push_str(&chunk.content);
        if chunk.sources.is_some() {
            self.sources = chunk.sources;
        }

        if chunk.done {
            return Ok(Step::Done(ChatReply {
                content: std::mem::take(&mut self.assembled),
                sources: self.sources.take(),
                context: None,
            }));
        }
        Ok(Step::Running { progress: None, update: self.assembled.clone() })
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
