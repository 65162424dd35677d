use tower_lsp_server::ls_types::Position;

/// Offset/position conversion against one immutable text snapshot.
///
/// Offsets and columns are UTF-16 code units, which is both tsserver's offset
/// space and the default LSP position encoding. Results are only meaningful
/// against the exact text the resolver was built from.
pub trait PositionResolver {
    /// Convert a document offset to a line/column position.
    ///
    /// Offsets past the end clamp to the end of the document.
    fn position_at(&self, offset: u32) -> Position;

    /// Convert a line/column position to a document offset.
    ///
    /// Lines past the end clamp to the document length, columns past the end
    /// of a line clamp to the line length.
    fn offset_at(&self, position: Position) -> u32;

    /// Length of a line excluding its terminator. Unknown lines have length 0.
    fn line_length(&self, line: u32) -> u32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineInfo {
    byte_start: usize,
    utf16_start: u32,
    /// Excludes the `\n`, `\r\n` or `\r` terminator
    utf16_len: u32,
}

/// Line table for a text snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    lines: Vec<LineInfo>,
    len_utf16: u32,
}

impl LineIndex {
    /// Build the line table, treating `\n`, `\r\n` and a lone `\r` as line breaks
    pub fn new(text: &str) -> Self {
        let mut lines = Vec::new();
        let mut utf16 = 0u32;
        let mut current = LineInfo {
            byte_start: 0,
            utf16_start: 0,
            utf16_len: 0,
        };

        let mut chars = text.char_indices().peekable();
        while let Some((byte, ch)) = chars.next() {
            match ch {
                '\n' | '\r' => {
                    current.utf16_len = utf16 - current.utf16_start;
                    lines.push(current);

                    let mut next_byte = byte + 1;
                    utf16 += 1;
                    if ch == '\r' && chars.peek().is_some_and(|(_, next)| *next == '\n') {
                        chars.next();
                        next_byte += 1;
                        utf16 += 1;
                    }

                    current = LineInfo {
                        byte_start: next_byte,
                        utf16_start: utf16,
                        utf16_len: 0,
                    };
                }
                _ => utf16 += ch.len_utf16() as u32,
            }
        }

        current.utf16_len = utf16 - current.utf16_start;
        lines.push(current);

        Self {
            lines,
            len_utf16: utf16,
        }
    }

    /// Total length in UTF-16 code units
    pub fn len_utf16(&self) -> u32 {
        self.len_utf16
    }

    pub fn line_count(&self) -> u32 {
        self.lines.len() as u32
    }

    /// Position just past the last character of the document
    pub fn end_position(&self) -> Position {
        self.position_at(self.len_utf16)
    }

    /// Convert an LSP position to a byte offset into `text`.
    ///
    /// `text` must be the text this index was built from. Positions past the
    /// end of a line clamp to the line end, lines past the end clamp to the
    /// end of the text.
    pub fn position_to_byte(&self, text: &str, position: Position) -> usize {
        let Some(line) = self.lines.get(position.line as usize) else {
            return text.len();
        };

        let line_end = self.line_end_byte(text, position.line as usize);
        let line_text = &text[line.byte_start..line_end];

        // Use the common utility function for UTF-16 to byte conversion
        match convert_utf16_to_byte_in_line(line_text, position.character as usize) {
            Some(byte_offset) => line.byte_start + byte_offset,
            None => line_end,
        }
    }

    fn line_end_byte(&self, text: &str, line: usize) -> usize {
        match self.lines.get(line + 1) {
            Some(next) => {
                let terminator = &text[..next.byte_start];
                if terminator.ends_with("\r\n") {
                    next.byte_start - 2
                } else {
                    next.byte_start - 1
                }
            }
            None => text.len(),
        }
    }
}

impl PositionResolver for LineIndex {
    fn position_at(&self, offset: u32) -> Position {
        let offset = offset.min(self.len_utf16);

        // Binary search for the line containing this offset
        let line = match self
            .lines
            .binary_search_by_key(&offset, |line| line.utf16_start)
        {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };

        let info = self.lines[line];
        // Offsets inside a line terminator clamp to the line end
        let character = (offset - info.utf16_start).min(info.utf16_len);

        Position {
            line: line as u32,
            character,
        }
    }

    fn offset_at(&self, position: Position) -> u32 {
        match self.lines.get(position.line as usize) {
            Some(line) => line.utf16_start + position.character.min(line.utf16_len),
            None => self.len_utf16,
        }
    }

    fn line_length(&self, line: u32) -> u32 {
        self.lines
            .get(line as usize)
            .map(|info| info.utf16_len)
            .unwrap_or(0)
    }
}

/// Convert UTF-16 position to byte position within a line
/// Returns None if the UTF-16 position is invalid
#[inline(always)]
pub fn convert_utf16_to_byte_in_line(line_text: &str, utf16_pos: usize) -> Option<usize> {
    let mut byte_offset = 0;
    let mut utf16_offset = 0;

    for ch in line_text.chars() {
        if utf16_offset >= utf16_pos {
            return Some(byte_offset);
        }
        utf16_offset += ch.len_utf16();
        byte_offset += ch.len_utf8();
    }

    // If we reached the end and the position matches exactly, return the end position
    if utf16_offset == utf16_pos {
        Some(byte_offset)
    } else {
        // Position is beyond the end of the line
        None
    }
}
