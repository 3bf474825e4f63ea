//! Wire-level frames for the notification socket.
//!
//! Clients send `{"event":"join","userId":"<uuid>"}`. The server answers with
//! `joined` or `error` frames and later pushes `notification` frames built by
//! the hub.

use serde::{Deserialize, Serialize};

/// Text frame sent by a client.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientFrame {
    pub event: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Frames the connection loop emits itself.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ServerFrame {
    Joined { room: String },
    Error { message: String },
}

impl ServerFrame {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::{Value, json};

    #[rstest]
    #[case(ServerFrame::Joined { room: "user_1".into() }, json!({"event":"joined","room":"user_1"}))]
    #[case(ServerFrame::error("nope"), json!({"event":"error","message":"nope"}))]
    fn server_frames_carry_an_event_tag(#[case] frame: ServerFrame, #[case] expected: Value) {
        assert_eq!(serde_json::to_value(frame).expect("serialise"), expected);
    }

    #[test]
    fn join_frames_accept_camel_case_user_id() {
        let frame: ClientFrame =
            serde_json::from_str(r#"{"event":"join","userId":"abc"}"#).expect("parse");
        assert_eq!(frame.event, "join");
        assert_eq!(frame.user_id.as_deref(), Some("abc"));
    }
}
