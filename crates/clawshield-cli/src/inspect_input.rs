//! The JSON envelope `clawshield inspect` reads from stdin: either an HTTP request to
//! run through `inspect_request`, or a raw Agent Message string to run through
//! `inspect_message`.

use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InspectInput {
    Request {
        agent_id: Option<String>,
        #[serde(default = "default_method")]
        method: String,
        #[serde(default = "default_path")]
        path: String,
        body: Option<String>,
        headers: Option<HashMap<String, String>>,
        ip: Option<String>,
    },
    Message {
        agent_id: String,
        /// The raw Agent Message JSON, passed through to `inspect_message` untouched.
        raw: serde_json::Value,
    },
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_path() -> String {
    "/".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_envelope_parses_with_defaults() {
        let input: InspectInput = serde_json::from_str(r#"{"kind":"request","agent_id":"a"}"#).unwrap();
        match input {
            InspectInput::Request { agent_id, method, path, .. } => {
                assert_eq!(agent_id.as_deref(), Some("a"));
                assert_eq!(method, "GET");
                assert_eq!(path, "/");
            }
            _ => panic!("expected a Request variant"),
        }
    }

    #[test]
    fn message_envelope_parses() {
        let input: InspectInput =
            serde_json::from_str(r#"{"kind":"message","agent_id":"a","raw":{"type":"ping"}}"#).unwrap();
        assert!(matches!(input, InspectInput::Message { .. }));
    }
}
