use crate::archive;
use crate::values::ValuePosition;
use crate::values::ValuesFile;
use ropey::Rope;
use tower_lsp::lsp_types::{Location, Position, Range, Url};

/// Converts an LSP position to a byte offset into `content`.
pub fn position_to_offset(content: &str, position: Position) -> Option<usize> {
    let rope = Rope::from_str(content);
    let line_start = rope.try_line_to_char(position.line as usize).ok()?;
    let char_offset = line_start + position.character as usize;
    rope.try_char_to_byte(char_offset).ok()
}

/// Converts a byte offset into `content` to an LSP position.
pub fn offset_to_position(content: &str, offset: usize) -> Position {
    let rope = Rope::from_str(content);
    let offset = offset.min(rope.len_bytes());
    let line = rope.byte_to_line(offset);
    let line_start = rope.line_to_byte(line);
    let character = rope.byte_slice(line_start..offset).len_chars();
    Position::new(line as u32, character as u32)
}

/// Builds the LSP location for a resolved value position, spanning the
/// defining key. Archive-internal positions address a `helm-tgz:` locator
/// the client opens as a read-only view.
pub fn location_for(position: &ValuePosition, key_len: usize) -> Option<Location> {
    let uri = match &position.file {
        ValuesFile::OnDisk(path) => Url::from_file_path(path).ok()?,
        ValuesFile::InArchive { archive, inner } => archive::archive_uri(archive, inner)?,
    };
    let range = Range::new(
        Position::new(position.line, position.character),
        Position::new(position.line, position.character + key_len as u32),
    );
    Some(Location { uri, range })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_offset_round_trip() {
        let content = "line1\nline2\nline3";
        let offset = position_to_offset(content, Position::new(1, 2)).unwrap();
        assert_eq!(offset, 8);
        assert_eq!(offset_to_position(content, offset), Position::new(1, 2));
    }

    #[test]
    fn position_past_line_count_is_none() {
        assert!(position_to_offset("one line", Position::new(5, 0)).is_none());
    }

    #[test]
    fn offset_to_position_with_multibyte_chars() {
        // "ä" is two bytes; the position counts characters, not bytes.
        let content = "ä: 1\nb: 2";
        assert_eq!(offset_to_position(content, 6), Position::new(1, 0));
    }

    #[test]
    fn offset_clamps_to_end() {
        let content = "ab";
        assert_eq!(offset_to_position(content, 100), Position::new(0, 2));
    }
}
