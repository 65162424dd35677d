//! Interface of the remote classification service.
//!
//! The provider only needs one operation from tsserver: classify a range of
//! an open file. Keeping it behind a trait lets the request cycle be driven
//! by an in-process fake in tests.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Encoding requested for the classification values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClassificationFormat {
    /// Packed type and modifier values (TypeScript 4.1+)
    #[default]
    #[serde(rename = "2020")]
    Packed2020,
    /// tsserver's native `ClassificationType` ordinals
    #[serde(rename = "original")]
    Original,
}

impl ClassificationFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ClassificationFormat::Packed2020 => "2020",
            ClassificationFormat::Original => "original",
        }
    }
}

/// One classification request: the `[start, start + length)` range of `file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRequest {
    pub file: PathBuf,
    pub start: u32,
    pub length: u32,
    pub format: ClassificationFormat,
}

/// Body of a successful `encodedSemanticClassifications-full` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResponse {
    /// Flat `[offset, length, classification, ...]` triples
    pub spans: Vec<u32>,
    #[serde(default)]
    pub end_of_line_state: u32,
}

/// A service able to classify a range of an open file.
pub trait ClassificationService: Send + Sync {
    /// Classify the requested range.
    ///
    /// `None` means the service gave no usable answer (failure, no body, the
    /// connection went away); callers treat it as "no tokens".
    fn classify(
        &self,
        request: ClassificationRequest,
    ) -> impl Future<Output = Option<ClassificationResponse>> + Send;
}

impl<S: ClassificationService> ClassificationService for Arc<S> {
    fn classify(
        &self,
        request: ClassificationRequest,
    ) -> impl Future<Output = Option<ClassificationResponse>> + Send {
        (**self).classify(request)
    }
}
