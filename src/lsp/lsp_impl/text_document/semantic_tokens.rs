//! Semantic token methods for TsSemanticLs.

use tower_lsp_server::jsonrpc::{Error, ErrorCode, Result};
use tower_lsp_server::ls_types::{
    Range, SemanticTokens, SemanticTokensParams, SemanticTokensRangeParams,
    SemanticTokensRangeResult, SemanticTokensResult,
};
use url::Url;

use crate::semantic::TokensOutcome;

use super::super::{TsSemanticLs, uri_to_url};

/// JSON-RPC error telling the client to keep its tokens and ask again later
pub(crate) fn content_modified_error() -> Error {
    Error {
        code: ErrorCode::ContentModified,
        message: "Document changed while computing semantic tokens".into(),
        data: None,
    }
}

/// Map a provider outcome onto the LSP response.
pub(crate) fn outcome_to_response(outcome: TokensOutcome) -> Result<Option<SemanticTokens>> {
    match outcome {
        TokensOutcome::Tokens(tokens) => Ok(Some(tokens)),
        TokensOutcome::NoTokens(_) => Ok(None),
        TokensOutcome::ContentModified => Err(content_modified_error()),
    }
}

impl TsSemanticLs {
    pub(crate) async fn semantic_tokens_full_impl(
        &self,
        params: SemanticTokensParams,
    ) -> Result<Option<SemanticTokensResult>> {
        let Ok(uri) = uri_to_url(&params.text_document.uri) else {
            log::warn!(
                target: "ts_semantic_ls::semantic",
                "Invalid URI in semanticTokens/full: {}",
                params.text_document.uri.as_str()
            );
            return Ok(None);
        };

        let tokens = self.compute_semantic_tokens(&uri, None).await?;
        Ok(tokens.map(SemanticTokensResult::Tokens))
    }

    pub(crate) async fn semantic_tokens_range_impl(
        &self,
        params: SemanticTokensRangeParams,
    ) -> Result<Option<SemanticTokensRangeResult>> {
        let Ok(uri) = uri_to_url(&params.text_document.uri) else {
            log::warn!(
                target: "ts_semantic_ls::semantic",
                "Invalid URI in semanticTokens/range: {}",
                params.text_document.uri.as_str()
            );
            return Ok(None);
        };

        let tokens = self.compute_semantic_tokens(&uri, Some(params.range)).await?;
        Ok(tokens.map(SemanticTokensRangeResult::Tokens))
    }

    async fn compute_semantic_tokens(
        &self,
        uri: &Url,
        range: Option<Range>,
    ) -> Result<Option<SemanticTokens>> {
        // Snapshot and subscription are taken under one entry guard
        let Some((snapshot, version_rx)) = self.documents.snapshot(uri) else {
            log::debug!(
                target: "ts_semantic_ls::semantic",
                "No open document for {}",
                uri
            );
            return Ok(None);
        };

        // Supersedes any in-flight request for this URI
        let request = self.semantic_request_tracker.start_request(uri);
        let outcome = self
            .provider
            .provide(&snapshot, version_rx, range, &request.cancel)
            .await;
        self.semantic_request_tracker
            .finish_request(uri, request.id);

        log::trace!(
            target: "ts_semantic_ls::semantic",
            "Request {} for {} finished: {:?}",
            request.id,
            uri,
            match &outcome {
                TokensOutcome::Tokens(tokens) => format!("{} tokens", tokens.data.len()),
                other => format!("{other:?}"),
            }
        );

        outcome_to_response(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::NoTokensReason;

    #[test]
    fn tokens_are_returned() {
        let tokens = SemanticTokens {
            result_id: None,
            data: vec![],
        };
        assert_eq!(
            outcome_to_response(TokensOutcome::Tokens(tokens.clone())).unwrap(),
            Some(tokens)
        );
    }

    #[test]
    fn no_tokens_is_null_result() {
        for reason in [
            NoTokensReason::Cancelled,
            NoTokensReason::Oversized,
            NoTokensReason::NoResponse,
            NoTokensReason::DocumentUnavailable,
        ] {
            assert_eq!(outcome_to_response(TokensOutcome::NoTokens(reason)).unwrap(), None);
        }
    }

    #[test]
    fn content_modified_is_error_32801() {
        let err = outcome_to_response(TokensOutcome::ContentModified).unwrap_err();
        assert_eq!(err.code, ErrorCode::ContentModified);
        assert_eq!(err.code.code(), -32801);
    }
}
