//! tsserver message types.
//!
//! Requests go to tsserver as one JSON object per line. Everything tsserver
//! sends back is a `response` or an `event`, framed with a Content-Length
//! header (see [`super::connection`]).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::service::ClassificationFormat;

pub const OPEN: &str = "open";
pub const CHANGE: &str = "change";
pub const CLOSE: &str = "close";
pub const EXIT: &str = "exit";
pub const ENCODED_SEMANTIC_CLASSIFICATIONS_FULL: &str = "encodedSemanticClassifications-full";

/// Outgoing request envelope
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    pub seq: u64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub command: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

impl Request {
    pub fn new(seq: u64, command: &'static str, arguments: Option<Value>) -> Self {
        Self {
            seq,
            kind: "request",
            command,
            arguments,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenArgs<'a> {
    pub file: &'a str,
    pub file_content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_kind_name: Option<&'static str>,
}

/// Edit arguments; lines and offsets are 1-based
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeArgs<'a> {
    pub file: &'a str,
    pub line: u32,
    pub offset: u32,
    pub end_line: u32,
    pub end_offset: u32,
    pub insert_string: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileArgs<'a> {
    pub file: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationArgs<'a> {
    pub file: &'a str,
    pub start: u32,
    pub length: u32,
    pub format: ClassificationFormat,
}

/// Incoming message, discriminated by its `type` field
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Response(Response),
    Event(Event),
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Response {
    pub request_seq: u64,
    pub success: bool,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub body: Option<Value>,
}

impl Response {
    /// Synthesised failure for a request that will never get a real answer
    pub fn failed(request_seq: u64, message: impl Into<String>) -> Self {
        Self {
            request_seq,
            success: false,
            command: None,
            message: Some(message.into()),
            body: None,
        }
    }

    /// The body of a successful response, if any
    pub fn into_body(self) -> Option<Value> {
        if self.success { self.body } else { None }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub event: String,
    #[serde(default)]
    pub body: Option<Value>,
}
