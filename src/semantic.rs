//! One semantic-tokens request cycle against the classification service.
//!
//! cancellation check → size gate → version capture → classify → staleness
//! check → projection → delta encoding.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{Range, SemanticTokens};

use crate::classification::Legend;
use crate::config::WorkspaceSettings;
use crate::document::{DocumentSnapshot, DocumentVersion};
use crate::projection::{SemanticTokensBuilder, project_spans};
use crate::service::{ClassificationFormat, ClassificationRequest, ClassificationService};
use crate::staleness::{SettleResult, StalenessGuard};
use crate::text::PositionResolver;

pub const DEFAULT_CONTENT_LENGTH_LIMIT: u32 = 100_000;
pub const DEFAULT_SETTLE_INTERVAL: Duration = Duration::from_millis(400);

/// Why a request produced no tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoTokensReason {
    Cancelled,
    /// Requested length exceeded the content length limit
    Oversized,
    /// The service failed or answered without a body
    NoResponse,
    /// Unknown document, or one without a local file path
    DocumentUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokensOutcome {
    Tokens(SemanticTokens),
    NoTokens(NoTokensReason),
    /// The document changed while the request was in flight.
    ///
    /// Returned only after the document settled; the client should keep its
    /// previous tokens and ask again.
    ContentModified,
}

/// Provider knobs, resolved from the workspace settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderSettings {
    pub content_length_limit: u32,
    pub settle_interval: Duration,
    pub format: ClassificationFormat,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            content_length_limit: DEFAULT_CONTENT_LENGTH_LIMIT,
            settle_interval: DEFAULT_SETTLE_INTERVAL,
            format: ClassificationFormat::default(),
        }
    }
}

impl From<&WorkspaceSettings> for ProviderSettings {
    fn from(settings: &WorkspaceSettings) -> Self {
        Self {
            content_length_limit: settings.content_length_limit,
            settle_interval: Duration::from_millis(settings.settle_interval_ms),
            format: settings.classification_format,
        }
    }
}

pub struct SemanticTokensProvider<S> {
    service: S,
    legend: Arc<Legend>,
    settings: ArcSwap<ProviderSettings>,
}

impl<S: ClassificationService> SemanticTokensProvider<S> {
    pub fn new(service: S, legend: Arc<Legend>, settings: ProviderSettings) -> Self {
        Self {
            service,
            legend,
            settings: ArcSwap::from_pointee(settings),
        }
    }

    pub fn legend(&self) -> &Legend {
        &self.legend
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn settings(&self) -> ProviderSettings {
        **self.settings.load()
    }

    pub fn update_settings(&self, settings: ProviderSettings) {
        self.settings.store(Arc::new(settings));
    }

    /// Produce tokens for the whole document (`range == None`) or one range.
    ///
    /// `version_rx` must be the subscription taken together with `snapshot`.
    pub async fn provide(
        &self,
        snapshot: &DocumentSnapshot,
        version_rx: watch::Receiver<DocumentVersion>,
        range: Option<Range>,
        cancel: &CancellationToken,
    ) -> TokensOutcome {
        if cancel.is_cancelled() {
            return TokensOutcome::NoTokens(NoTokensReason::Cancelled);
        }

        let settings = self.settings();
        let index = &snapshot.line_index;
        let (start, length) = match range {
            Some(range) => {
                let start = index.offset_at(range.start);
                let end = index.offset_at(range.end).max(start);
                (start, end - start)
            }
            None => (0, index.len_utf16()),
        };

        if length > settings.content_length_limit {
            log::info!(
                target: "ts_semantic_ls::semantic",
                "Skipping semantic tokens: requested length {} exceeds limit {}",
                length,
                settings.content_length_limit
            );
            return TokensOutcome::NoTokens(NoTokensReason::Oversized);
        }

        let Some(file) = snapshot.file_path.clone() else {
            log::debug!(
                target: "ts_semantic_ls::semantic",
                "Skipping semantic tokens: document has no file path"
            );
            return TokensOutcome::NoTokens(NoTokensReason::DocumentUnavailable);
        };

        let mut guard = StalenessGuard::capture(version_rx);
        let request = ClassificationRequest {
            file,
            start,
            length,
            format: settings.format,
        };

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return TokensOutcome::NoTokens(NoTokensReason::Cancelled);
            }
            response = self.service.classify(request) => response,
        };

        let Some(response) = response else {
            log::debug!(
                target: "ts_semantic_ls::semantic",
                "No classification response for {:?}",
                snapshot.file_path
            );
            return TokensOutcome::NoTokens(NoTokensReason::NoResponse);
        };

        if guard.captured() != snapshot.version || guard.is_stale() {
            log::debug!(
                target: "ts_semantic_ls::semantic",
                "Document changed during classification, waiting for it to settle"
            );
            return match guard.wait_for_settle(settings.settle_interval, cancel).await {
                SettleResult::Cancelled => TokensOutcome::NoTokens(NoTokensReason::Cancelled),
                SettleResult::Settled | SettleResult::Closed => TokensOutcome::ContentModified,
            };
        }

        let projection = project_spans(&response.spans, index.as_ref());
        if projection.stats.unrecognized > 0 {
            log::debug!(
                target: "ts_semantic_ls::semantic",
                "Dropped {} of {} spans with no semantic token equivalent",
                projection.stats.unrecognized,
                projection.stats.spans
            );
        }

        let mut builder = SemanticTokensBuilder::with_capacity(projection.records.len());
        for record in &projection.records {
            builder.push_record(record);
        }
        if builder.rejected() > 0 {
            log::warn!(
                target: "ts_semantic_ls::semantic",
                "Dropped {} out-of-order tokens",
                builder.rejected()
            );
        }

        TokensOutcome::Tokens(SemanticTokens {
            result_id: None,
            data: builder.build(),
        })
    }
}
