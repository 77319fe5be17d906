//! Request/response envelopes and the structured error carried across the
//! process boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use tessera_common::WidgetHandle;

use crate::event::BridgeEvent;
use crate::ops::Operation;

/// An incoming request, as the renderer decodes it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Request {
    pub id: u64,
    #[serde(default)]
    pub authorization: String,
    pub op: Operation,
}

/// Borrowing form of [`Request`] used by clients so the session token is
/// not cloned per call.
#[derive(Debug, Serialize)]
pub struct RequestEnvelope<'a> {
    pub id: u64,
    pub authorization: &'a str,
    pub op: &'a Operation,
}

/// Successful result payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    Ack,
    Enabled { enabled: bool },
    Visible { visible: bool },
    Text { text: String },
    WidgetIds { widget_ids: Vec<WidgetHandle> },
    WindowSize { width: u32, height: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    NotAContainer,
    Unauthorized,
    Unsupported,
    InvalidRequest,
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::NotAContainer => "not_a_container",
            Self::Unauthorized => "unauthorized",
            Self::Unsupported => "unsupported",
            Self::InvalidRequest => "invalid_request",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed call. Registry and dispatcher errors are reported this way and
/// never cross the boundary as a panic or dropped connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct RpcError {
    pub code: ErrorCode,
    pub message: String,
}

impl RpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn not_a_container(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotAContainer, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::Unauthorized, "missing or invalid authorization token")
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unsupported, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

/// `{id, success, result?, error?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Reply>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    pub fn ok(id: u64, reply: Reply) -> Self {
        Self {
            id,
            success: true,
            result: Some(reply),
            error: None,
        }
    }

    pub fn err(id: u64, error: RpcError) -> Self {
        Self {
            id,
            success: false,
            result: None,
            error: Some(error),
        }
    }

    pub fn from_result(id: u64, result: Result<Reply, RpcError>) -> Self {
        match result {
            Ok(reply) => Self::ok(id, reply),
            Err(e) => Self::err(id, e),
        }
    }

    pub fn into_result(self) -> Result<Reply, RpcError> {
        if self.success {
            Ok(self.result.unwrap_or(Reply::Ack))
        } else {
            Err(self
                .error
                .unwrap_or_else(|| RpcError::internal("failure without error detail")))
        }
    }
}

/// Everything the renderer sends after the handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerFrame {
    Response(Response),
    Event(BridgeEvent),
}

impl ServerFrame {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"event","data":{{"event":"encode_error","message":"{e}"}}}}"#)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_common::WindowId;

    #[test]
    fn envelope_matches_owned_request() {
        let op = Operation::ShowWindow {
            window_id: WindowId::new("main"),
        };
        let json = serde_json::to_string(&RequestEnvelope {
            id: 7,
            authorization: "tok",
            op: &op,
        })
        .unwrap();
        let req: Request = serde_json::from_str(&json).unwrap();
        assert_eq!(req.id, 7);
        assert_eq!(req.authorization, "tok");
        assert_eq!(req.op, op);
    }

    #[test]
    fn request_without_authorization_parses_with_empty_token() {
        let req: Request = serde_json::from_str(r#"{"id":1,"op":{"op":"quit"}}"#).unwrap();
        assert!(req.authorization.is_empty());
    }

    #[test]
    fn error_response_shape() {
        let frame = ServerFrame::Response(Response::err(3, RpcError::not_found("Window not found")));
        let v: serde_json::Value = serde_json::from_str(&frame.to_json()).unwrap();
        assert_eq!(v["type"], "response");
        assert_eq!(v["data"]["success"], false);
        assert_eq!(v["data"]["error"]["code"], "not_found");
        assert_eq!(v["data"]["error"]["message"], "Window not found");
        assert!(v["data"].get("result").is_none());
    }

    #[test]
    fn widget_ids_reply_shape() {
        let resp = Response::ok(
            1,
            Reply::WidgetIds {
                widget_ids: vec!["button_4".into()],
            },
        );
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["result"]["kind"], "widget_ids");
        assert_eq!(v["result"]["widget_ids"][0], "button_4");
    }

    #[test]
    fn into_result_splits_success_and_failure() {
        assert_eq!(Response::ok(1, Reply::Ack).into_result(), Ok(Reply::Ack));
        let err = Response::err(1, RpcError::unauthorized()).into_result().unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[test]
    fn rpc_error_display() {
        let e = RpcError::not_a_container("label_1 is a label");
        assert_eq!(e.to_string(), "not_a_container: label_1 is a label");
    }
}
