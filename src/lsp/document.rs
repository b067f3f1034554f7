use ropey::{Rope, RopeSlice};

use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent, Url};

pub use crate::lsp::models::{DocumentError, LspDocument, LspDocumentState};

/// Number of chars in a line, excluding its line terminator.
fn line_content_len(line: RopeSlice<'_>) -> usize {
    let mut len = line.len_chars();
    while len > 0 && matches!(line.char(len - 1), '\n' | '\r') {
        len -= 1;
    }
    len
}

/// Converts an LSP position (UTF-16 column) to a char index in the Rope.
///
/// Positions past the end of a line clamp to the end of that line, and lines
/// past the end of the document clamp to the end of the text.
pub fn position_to_char_index(position: &Position, text: &Rope) -> usize {
    let line = position.line as usize;
    if line >= text.len_lines() {
        return text.len_chars();
    }

    let line_start = text.line_to_char(line);
    let line_slice = text.line(line);
    let target = position.character as usize;

    let mut utf16_units = 0;
    let mut chars = 0;
    for c in line_slice.chars().take(line_content_len(line_slice)) {
        if utf16_units >= target {
            break;
        }
        utf16_units += c.len_utf16();
        chars += 1;
    }
    line_start + chars
}

/// Converts a char index back to an LSP position (UTF-16 column).
pub fn char_index_to_position(char_index: usize, text: &Rope) -> Position {
    let char_index = char_index.min(text.len_chars());
    let line = text.char_to_line(char_index);
    let line_start = text.line_to_char(line);
    let character = text.char_to_utf16_cu(char_index) - text.char_to_utf16_cu(line_start);
    Position::new(line as u32, character as u32)
}

/// Text from the start of `position`'s line up to (not including) `position`.
pub fn line_prefix(position: &Position, text: &Rope) -> String {
    let line = position.line as usize;
    if line >= text.len_lines() {
        return String::new();
    }
    let start = text.line_to_char(line);
    let end = position_to_char_index(position, text);
    text.slice(start..end).to_string()
}

impl LspDocumentState {
    /// Applies a list of content changes to the document state.
    /// Fails without touching the text unless the version is newer.
    pub fn apply(
        &mut self,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32,
    ) -> Result<(), DocumentError> {
        if version <= self.version {
            return Err(DocumentError::StaleVersion { received: version, current: self.version });
        }
        for change in changes {
            if let Some(range) = change.range {
                let start = position_to_char_index(&range.start, &self.text);
                let end = position_to_char_index(&range.end, &self.text).max(start);
                self.text.remove(start..end);
                self.text.insert(start, &change.text);
            } else {
                self.text = Rope::from_str(&change.text);
            }
        }
        self.version = version;
        Ok(())
    }
}

impl LspDocument {
    pub fn new(id: u32, uri: Url, text: &str, version: i32) -> Self {
        Self {
            id,
            state: tokio::sync::RwLock::new(LspDocumentState {
                uri,
                text: Rope::from_str(text),
                version,
            }),
        }
    }

    /// Returns the URI of the document.
    pub async fn uri(&self) -> Url {
        self.state.read().await.uri.clone()
    }

    /// Returns the current text of the document as a string.
    pub async fn text(&self) -> String {
        self.state.read().await.text.to_string()
    }

    /// Returns the current version of the document.
    pub async fn version(&self) -> i32 {
        self.state.read().await.version
    }

    /// Returns the text between the start of the cursor's line and the cursor.
    pub async fn line_prefix(&self, position: Position) -> String {
        line_prefix(&position, &self.state.read().await.text)
    }

    /// Applies changes to the document.
    pub async fn apply(
        &self,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32,
    ) -> Result<(), DocumentError> {
        let mut state = self.state.write().await;
        state.apply(changes, version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tower_lsp::lsp_types::Range;

    /// Helper to create a test LspDocument.
    fn create_test_document(uri: &str, text: &str) -> Arc<LspDocument> {
        Arc::new(LspDocument::new(1, Url::parse(uri).unwrap(), text, 0))
    }

    fn ranged(start: (u32, u32), end: (u32, u32), text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range: Some(Range {
                start: Position::new(start.0, start.1),
                end: Position::new(end.0, end.1),
            }),
            range_length: None,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_apply_full_change() {
        let doc = create_test_document("file:///test.lua", "initial text");
        let changes = vec![TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "new text".to_string(),
        }];

        assert_eq!(doc.apply(changes, 1).await, Ok(()));
        assert_eq!(doc.text().await, "new text", "Text should be updated");
        assert_eq!(doc.version().await, 1, "Version should be updated");
    }

    #[tokio::test]
    async fn test_apply_incremental_change() {
        let doc = create_test_document("file:///test.lua", "hello world");
        assert_eq!(doc.apply(vec![ranged((0, 6), (0, 11), "there")], 1).await, Ok(()));
        assert_eq!(doc.text().await, "hello there");
        assert_eq!(doc.version().await, 1);
    }

    #[tokio::test]
    async fn test_apply_multiple_incremental() {
        // Each change applies to the text produced by the previous one
        let doc = create_test_document("file:///test.lua", "hello world");
        let changes = vec![ranged((0, 6), (0, 11), "lua"), ranged((0, 0), (0, 5), "hi")];

        assert_eq!(doc.apply(changes, 1).await, Ok(()));
        assert_eq!(doc.text().await, "hi lua");
    }

    #[tokio::test]
    async fn test_apply_outdated_version() {
        let doc = create_test_document("file:///test.lua", "initial text");
        let changes = vec![TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "new text".to_string(),
        }];

        assert!(doc.apply(changes.clone(), 1).await.is_ok());
        let result = doc.apply(changes, 1).await;
        assert_eq!(result, Err(DocumentError::StaleVersion { received: 1, current: 1 }));
        assert_eq!(doc.text().await, "new text", "Text should remain from previous change");
        assert_eq!(doc.version().await, 1, "Version should not change");
    }

    #[tokio::test]
    async fn test_typing_member_access_on_second_line() {
        let doc = create_test_document(
            "file:///test.lua",
            "local mod = RegisterMod(\"m\", 1)\nlocal t = ActionTriggers",
        );
        doc.apply(vec![ranged((1, 24), (1, 24), ".")], 1).await.unwrap();
        assert_eq!(doc.line_prefix(Position::new(1, 25)).await, "local t = ActionTriggers.");
        assert_eq!(doc.line_prefix(Position::new(1, 10)).await, "local t = ");
    }

    #[test]
    fn test_line_prefix_clamps() {
        let text = Rope::from_str("Challenge.\r\nnext");
        assert_eq!(line_prefix(&Position::new(0, 10), &text), "Challenge.");
        assert_eq!(line_prefix(&Position::new(0, 99), &text), "Challenge.");
        assert_eq!(line_prefix(&Position::new(1, 2), &text), "ne");
        assert_eq!(line_prefix(&Position::new(7, 0), &text), "");
        assert_eq!(line_prefix(&Position::new(0, 0), &Rope::new()), "");
    }

    #[test]
    fn test_only_lsp_line_breaks_split_lines() {
        let text = Rope::from_str("-- a\u{2028}b\u{0085}c\nChallenge.\rCard.");
        assert_eq!(text.len_lines(), 3);
        assert_eq!(line_prefix(&Position::new(1, 10), &text), "Challenge.");
        assert_eq!(line_prefix(&Position::new(2, 5), &text), "Card.");
        assert_eq!(line_prefix(&Position::new(0, 6), &text), "-- a\u{2028}b");
    }

    #[tokio::test]
    async fn test_edit_after_unicode_separator() {
        let doc = create_test_document("file:///test.lua", "-- a\u{2028}b\nlocal t = Challenge");
        doc.apply(vec![ranged((1, 19), (1, 19), ".")], 1).await.unwrap();
        assert_eq!(doc.text().await, "-- a\u{2028}b\nlocal t = Challenge.");
        assert_eq!(doc.line_prefix(Position::new(1, 20)).await, "local t = Challenge.");
    }

    #[test]
    fn test_line_prefix_uses_utf16_columns() {
        // '😀' is two UTF-16 code units, 'é' is one
        let text = Rope::from_str("-- 😀é Card.");
        assert_eq!(line_prefix(&Position::new(0, 5), &text), "-- 😀");
        assert_eq!(line_prefix(&Position::new(0, 6), &text), "-- 😀é");
        assert_eq!(line_prefix(&Position::new(0, 12), &text), "-- 😀é Card.");
    }

    #[test]
    fn test_char_index_to_position_round_trip() {
        let text = Rope::from_str("a😀b\nCard.");
        let position = char_index_to_position(2, &text);
        assert_eq!(position, Position::new(0, 3));
        assert_eq!(position_to_char_index(&position, &text), 2);
        assert_eq!(char_index_to_position(text.len_chars(), &text), Position::new(1, 5));
    }
}
