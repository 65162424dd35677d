//! Projection of tsserver classification spans onto per-line semantic tokens.
//!
//! tsserver answers with a flat `[offset, length, classification, ...]`
//! array addressed by document offset. LSP tokens are addressed by line and
//! column and cannot span lines, so every span is resolved against the
//! document snapshot and split into one record per line it touches.

use tower_lsp_server::ls_types::SemanticToken;

use crate::classification::decode;
use crate::text::PositionResolver;

/// A per-line token, with absolute line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineTokenRecord {
    pub line: u32,
    pub start: u32,
    pub length: u32,
    pub token_type: u32,
    pub modifiers: u32,
}

/// Counters describing what a projection did with its input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionStats {
    /// Complete triples read from the input
    pub spans: usize,
    /// Spans whose classification has no semantic token equivalent
    pub unrecognized: usize,
    /// Spans that resolved to an empty range
    pub empty: usize,
    /// Spans that crossed at least one line break
    pub multiline: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    pub records: Vec<LineTokenRecord>,
    pub stats: ProjectionStats,
}

/// Project a flat span array onto per-line records.
///
/// Records come out in input order; for spans sorted by offset (as tsserver
/// produces them) that is non-decreasing `(line, start)` order. A trailing
/// partial triple is ignored.
pub fn project_spans(spans: &[u32], resolver: &impl PositionResolver) -> Projection {
    let mut projection = Projection {
        records: Vec::with_capacity(spans.len() / 3),
        stats: ProjectionStats::default(),
    };

    if spans.len() % 3 != 0 {
        log::warn!(
            target: "ts_semantic_ls::projection",
            "Span array length {} is not a multiple of 3, ignoring trailing values",
            spans.len()
        );
    }

    for triple in spans.chunks_exact(3) {
        let (offset, length, classification) = (triple[0], triple[1], triple[2]);
        projection.stats.spans += 1;

        let Some(decoded) = decode(classification) else {
            projection.stats.unrecognized += 1;
            continue;
        };

        let start = resolver.position_at(offset);
        let end = resolver.position_at(offset.saturating_add(length));

        if start == end {
            projection.stats.empty += 1;
            continue;
        }

        let token_type = decoded.token_type.ordinal();
        let modifiers = decoded.modifiers;

        if start.line == end.line {
            projection.records.push(LineTokenRecord {
                line: start.line,
                start: start.character,
                length: end.character.saturating_sub(start.character),
                token_type,
                modifiers,
            });
            continue;
        }

        projection.stats.multiline += 1;
        for line in start.line..=end.line {
            let line_start = if line == start.line { start.character } else { 0 };
            let line_end = if line == end.line {
                end.character
            } else {
                resolver.line_length(line)
            };

            projection.records.push(LineTokenRecord {
                line,
                start: line_start,
                length: line_end.saturating_sub(line_start),
                token_type,
                modifiers,
            });
        }
    }

    projection
}

/// Append-only builder producing delta-encoded LSP semantic tokens.
///
/// Records must be pushed in non-decreasing `(line, start)` order. A record
/// that would move backwards cannot be delta-encoded and is dropped.
#[derive(Debug, Default)]
pub struct SemanticTokensBuilder {
    data: Vec<SemanticToken>,
    prev_line: u32,
    prev_start: u32,
    rejected: usize,
}

impl SemanticTokensBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Append one token. Returns `false` if it was dropped for being out of order.
    pub fn push(
        &mut self,
        line: u32,
        start: u32,
        length: u32,
        token_type: u32,
        token_modifiers_bitset: u32,
    ) -> bool {
        let backwards =
            line < self.prev_line || (line == self.prev_line && start < self.prev_start);
        if !self.data.is_empty() && backwards {
            self.rejected += 1;
            return false;
        }

        let delta_line = line - self.prev_line;
        let delta_start = if delta_line == 0 {
            start - self.prev_start
        } else {
            start
        };

        self.data.push(SemanticToken {
            delta_line,
            delta_start,
            length,
            token_type,
            token_modifiers_bitset,
        });

        self.prev_line = line;
        self.prev_start = start;
        true
    }

    pub fn push_record(&mut self, record: &LineTokenRecord) -> bool {
        self.push(
            record.line,
            record.start,
            record.length,
            record.token_type,
            record.modifiers,
        )
    }

    /// Number of tokens dropped for being out of order
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn build(self) -> Vec<SemanticToken> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::{TokenModifier, TokenType, encode};
    use crate::text::LineIndex;

    fn record(
        line: u32,
        start: u32,
        length: u32,
        token_type: TokenType,
        modifiers: u32,
    ) -> LineTokenRecord {
        LineTokenRecord {
            line,
            start,
            length,
            token_type: token_type.ordinal(),
            modifiers,
        }
    }

    #[test]
    fn packed_span_and_unmapped_span_on_one_line() {
        let index = LineIndex::new("abcdefghijklmnopqrst");
        let projection = project_spans(&[0, 5, 1800, 10, 6, 2], &index);

        assert_eq!(
            projection.records,
            vec![record(0, 0, 5, TokenType::Parameter, 8)]
        );
        assert_eq!(projection.stats.spans, 2);
        assert_eq!(projection.stats.unrecognized, 1);
    }

    #[test]
    fn single_line_span_length_is_column_difference() {
        let index = LineIndex::new("class Foo {}\nlet foo = new Foo();");
        let class = encode(TokenType::Class, TokenModifier::Declaration.bit());
        let projection = project_spans(&[6, 3, class, 27, 3, encode(TokenType::Class, 0)], &index);

        assert_eq!(
            projection.records,
            vec![
                record(0, 6, 3, TokenType::Class, 1),
                record(1, 14, 3, TokenType::Class, 0),
            ]
        );
    }

    #[test]
    fn span_across_lines_is_clipped_per_line() {
        // lines: "abc" (3), "defgh" (5), "" (0), "ij" (2)
        let index = LineIndex::new("abc\ndefgh\n\nij");
        let value = encode(TokenType::Property, 0);
        // from 'b' (offset 1) to after 'i' (offset 12)
        let projection = project_spans(&[1, 11, value], &index);

        assert_eq!(
            projection.records,
            vec![
                record(0, 1, 2, TokenType::Property, 0),
                record(1, 0, 5, TokenType::Property, 0),
                record(2, 0, 0, TokenType::Property, 0),
                record(3, 0, 1, TokenType::Property, 0),
            ]
        );
        assert_eq!(projection.stats.multiline, 1);
    }

    #[test]
    fn span_across_crlf_excludes_terminator() {
        let index = LineIndex::new("ab\r\ncd");
        let projection = project_spans(&[1, 4, encode(TokenType::Variable, 0)], &index);

        assert_eq!(
            projection.records,
            vec![
                record(0, 1, 1, TokenType::Variable, 0),
                record(1, 0, 1, TokenType::Variable, 0),
            ]
        );
    }

    #[test]
    fn zero_length_span_is_a_no_op() {
        let index = LineIndex::new("abc");
        let projection = project_spans(&[1, 0, encode(TokenType::Variable, 0)], &index);

        assert!(projection.records.is_empty());
        assert_eq!(projection.stats.empty, 1);
        assert_eq!(projection.stats.unrecognized, 0);
    }

    #[test]
    fn trailing_partial_triple_is_ignored() {
        let index = LineIndex::new("abcdef");
        let projection = project_spans(&[0, 3, encode(TokenType::Function, 0), 4, 2], &index);

        assert_eq!(projection.records.len(), 1);
        assert_eq!(projection.stats.spans, 1);
    }

    #[test]
    fn spans_past_end_of_document_clamp() {
        let index = LineIndex::new("abc");
        let projection = project_spans(&[1, 50, encode(TokenType::Method, 0)], &index);

        assert_eq!(projection.records, vec![record(0, 1, 2, TokenType::Method, 0)]);
    }

    #[test]
    fn projection_is_idempotent() {
        let index = LineIndex::new("a\nbb\nccc");
        let spans = [0, 4, encode(TokenType::Enum, 0), 5, 3, 12];
        assert_eq!(project_spans(&spans, &index), project_spans(&spans, &index));
    }

    #[test]
    fn sorted_spans_project_in_order() {
        let text = "function f(a, b) {\n  return a +\n    b;\n}\n";
        let index = LineIndex::new(text);
        let spans = [
            9,
            1,
            encode(TokenType::Function, 1),
            11,
            1,
            encode(TokenType::Parameter, 1),
            14,
            1,
            encode(TokenType::Parameter, 1),
            19,
            18,
            encode(TokenType::Variable, 0),
            36,
            1,
            encode(TokenType::Parameter, 0),
        ];
        let records = project_spans(&spans, &index).records;

        assert!(
            records
                .windows(2)
                .all(|w| (w[0].line, w[0].start) <= (w[1].line, w[1].start)),
            "records out of order: {records:?}"
        );
    }

    #[test]
    fn builder_delta_encodes() {
        let mut builder = SemanticTokensBuilder::new();
        assert!(builder.push(0, 4, 3, 1, 0));
        assert!(builder.push(0, 10, 2, 2, 1));
        assert!(builder.push(2, 1, 5, 3, 0));

        let data = builder.build();
        let flat: Vec<_> = data
            .iter()
            .map(|t| {
                (
                    t.delta_line,
                    t.delta_start,
                    t.length,
                    t.token_type,
                    t.token_modifiers_bitset,
                )
            })
            .collect();
        assert_eq!(flat, vec![(0, 4, 3, 1, 0), (0, 6, 2, 2, 1), (2, 1, 5, 3, 0)]);
    }

    #[test]
    fn builder_rejects_tokens_that_go_backwards() {
        let mut builder = SemanticTokensBuilder::new();
        assert!(builder.push(1, 5, 1, 0, 0));
        assert!(!builder.push(1, 2, 1, 0, 0));
        assert!(!builder.push(0, 9, 1, 0, 0));
        assert!(builder.push(1, 5, 2, 0, 0));

        assert_eq!(builder.rejected(), 2);
        assert_eq!(builder.len(), 2);
    }
}
