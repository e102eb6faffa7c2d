//! JSON-RPC message classification and the handful of LSP parameter
//! shapes the server actually reads.

use paren_core::Position;
use serde::Deserialize;
use serde_json::Value;

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;

/// A decoded incoming message, sorted by the id/method rules of JSON-RPC.
#[derive(Debug)]
pub enum Incoming {
    Request {
        id: Value,
        method: String,
        params: Value,
    },
    Notification {
        method: String,
        params: Value,
    },
    /// A response to a request we sent. We never send requests, so these
    /// are accepted and dropped.
    Response,
    Invalid,
}

/// Classify a parsed JSON value as a request, notification, or response.
///
/// A message with both `id` and `method` is a request, one with only
/// `method` is a notification, and one with only `id` is a response.
/// Anything else is invalid.
pub fn classify(message: &Value) -> Incoming {
    let Some(object) = message.as_object() else {
        return Incoming::Invalid;
    };
    let id = object.get("id");
    let method = object.get("method").and_then(Value::as_str);
    let params = object.get("params").cloned().unwrap_or(Value::Null);
    match (id, method) {
        (Some(id), Some(method)) => Incoming::Request {
            id: id.clone(),
            method: method.to_string(),
            params,
        },
        (None, Some(method)) => Incoming::Notification {
            method: method.to_string(),
            params,
        },
        (Some(_), None) => Incoming::Response,
        (None, None) => Incoming::Invalid,
    }
}

#[derive(Debug, Deserialize)]
pub struct TextDocumentIdentifier {
    pub uri: String,
}

#[derive(Debug, Deserialize)]
pub struct TextDocumentItem {
    pub uri: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct DidOpenParams {
    #[serde(rename = "textDocument")]
    pub text_document: TextDocumentItem,
}

#[derive(Debug, Deserialize)]
pub struct ContentChange {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct DidChangeParams {
    #[serde(rename = "textDocument")]
    pub text_document: TextDocumentIdentifier,
    #[serde(rename = "contentChanges")]
    pub content_changes: Vec<ContentChange>,
}

#[derive(Debug, Deserialize)]
pub struct DidCloseParams {
    #[serde(rename = "textDocument")]
    pub text_document: TextDocumentIdentifier,
}

/// Shared parameter shape of every positional request (hover, definition,
/// completion, ...).
#[derive(Debug, Deserialize)]
pub struct PositionParams {
    #[serde(rename = "textDocument")]
    pub text_document: TextDocumentIdentifier,
    pub position: Position,
}

#[derive(Debug, Deserialize)]
pub struct SemanticTokensParams {
    #[serde(rename = "textDocument")]
    pub text_document: TextDocumentIdentifier,
}
