//! Authentication models

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// How requests authenticate against the server
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Credentials {
    /// API script name and its key
    Script { script_name: String, api_key: String },
    /// Token previously obtained through `get_session_token`
    SessionToken(String),
}

impl Credentials {
    /// Authentication element of the request envelope
    pub fn to_wire(&self) -> Value {
        match self {
            Credentials::Script { script_name, api_key } => json!({
                "script_name": script_name,
                "script_key": api_key,
            }),
            Credentials::SessionToken(token) => json!({ "session_token": token }),
        }
    }

    /// Same as [`Credentials::to_wire`] with secrets masked, for logging
    pub fn to_redacted_wire(&self) -> Value {
        match self {
            Credentials::Script { script_name, .. } => json!({
                "script_name": script_name,
                "script_key": "[REDACTED]",
            }),
            Credentials::SessionToken(_) => json!({ "session_token": "[REDACTED]" }),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Script { script_name, .. } => f
                .debug_struct("Script")
                .field("script_name", script_name)
                .field("api_key", &"[REDACTED]")
                .finish(),
            Credentials::SessionToken(_) => f.debug_tuple("SessionToken").field(&"[REDACTED]").finish(),
        }
    }
}
