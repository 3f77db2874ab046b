//! Agent Message: the tagged union carried over the WebSocket surface, and the
//! structural validation pass that turns raw JSON into it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

const MAX_CONTENT_CHARS: usize = 100_000;
const MAX_BODY_CHARS: usize = 1_048_576;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    SessionsSend,
    SessionsSpawn,
    SessionsReply,
    ApiCall,
    SkillExecute,
    Ping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub content: Option<String>,
    #[serde(rename = "targetAgentId")]
    pub target_agent_id: Option<String>,
    pub url: Option<String>,
    pub headers: Option<HashMap<String, String>>,
    pub body: Option<String>,
    pub metadata: Option<HashMap<String, Value>>,
}

const KNOWN_FIELDS: [&str; 7] = ["type", "content", "targetAgentId", "url", "headers", "body", "metadata"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralError(pub String);

/// Parses `raw` into an [`AgentMessage`], rejecting unknown top-level fields and
/// oversize `content`/`body`. Never panics: every rejection is a typed error, feeding
/// the orchestrator's "Invalid message format" deny reason.
pub fn validate(raw: &str) -> Result<AgentMessage, StructuralError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| StructuralError(e.to_string()))?;
    let Value::Object(map) = &value else {
        return Err(StructuralError("message must be a JSON object".to_string()));
    };
    for key in map.keys() {
        if !KNOWN_FIELDS.contains(&key.as_str()) {
            return Err(StructuralError(format!("unknown field '{key}'")));
        }
    }

    let message: AgentMessage =
        serde_json::from_value(value).map_err(|e| StructuralError(e.to_string()))?;

    if let Some(content) = &message.content {
        if content.chars().count() > MAX_CONTENT_CHARS {
            return Err(StructuralError("content exceeds maximum length".to_string()));
        }
    }
    if let Some(body) = &message.body {
        if body.chars().count() > MAX_BODY_CHARS {
            return Err(StructuralError("body exceeds maximum length".to_string()));
        }
    }

    Ok(message)
}
