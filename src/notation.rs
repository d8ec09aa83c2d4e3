//! Cell/board notation: the coordinate label format ("A1".."G7"), the two
//! text board formats, and the symbolic glyph matrix (spec §4.J, §6).

use crate::board::{coords_to_pos, pos_to_coords, Board};
use crate::error::BoardError;

pub const PEG_GLYPH: char = '●';
pub const HOLE_GLYPH: char = '○';
pub const ABSENT_GLYPH: char = '▫';

/// Render `pos` as a column-letter + row-digit label (`A1` is `pos == 0`).
pub fn pos_to_label(pos: u8) -> String {
    let (row, col) = pos_to_coords(pos);
    format!("{}{}", (b'A' + col) as char, row + 1)
}

/// Parse a column-letter + row-digit label ("A1".."G7", case-insensitive)
/// into a cell position.
pub fn label_to_pos(label: &str) -> Result<u8, BoardError> {
    let bytes = label.as_bytes();
    if bytes.len() < 2 {
        return Err(BoardError::MalformedToken(label.to_string()));
    }
    let col_char = bytes[0].to_ascii_uppercase();
    if !(b'A'..=b'G').contains(&col_char) {
        return Err(BoardError::MalformedToken(label.to_string()));
    }
    let col = col_char - b'A';
    let row_str = std::str::from_utf8(&bytes[1..]).map_err(|_| BoardError::MalformedToken(label.to_string()))?;
    let row_num: u8 = row_str
        .parse()
        .map_err(|_| BoardError::MalformedToken(label.to_string()))?;
    if !(1..=7).contains(&row_num) {
        return Err(BoardError::MalformedToken(label.to_string()));
    }
    Ok(coords_to_pos(row_num - 1, col))
}

/// Render a move as `"<from> → <to>"` using cell labels.
pub fn format_move(mv: crate::board::Move) -> String {
    format!("{} \u{2192} {}", pos_to_label(mv.from), pos_to_label(mv.to))
}

/// Parse the coordinate position format: space-separated `"A1"` tokens,
/// optionally suffixed with `(hole)`; a bare token is a peg. The board's
/// `valid` mask is the union of every token mentioned.
pub fn parse_coordinate_format(input: &str) -> Result<Board, BoardError> {
    let mut pegs = 0u64;
    let mut valid = 0u64;
    let mut any = false;
    for token in input.split_whitespace() {
        any = true;
        let lower = token.to_ascii_lowercase();
        let (label, is_hole) = match lower.strip_suffix("(hole)") {
            Some(_) => (&token[..token.len() - "(hole)".len()], true),
            None => (token, false),
        };
        let pos = label_to_pos(label)?;
        valid |= 1u64 << pos;
        if !is_hole {
            pegs |= 1u64 << pos;
        }
    }
    if !any {
        return Err(BoardError::Empty);
    }
    Board::new(pegs, valid)
}

/// Parse the text position format: `size=7x7 pegs=A2,A6,... empty=D4,...`.
/// Column letters are case-insensitive; whitespace around tokens is ignored;
/// `size` must be `7x7`.
pub fn parse_text_format(input: &str) -> Result<Board, BoardError> {
    let mut size_ok = false;
    let mut pegs = 0u64;
    let mut valid = 0u64;

    for field in input.split_whitespace() {
        if let Some(size) = field.strip_prefix("size=") {
            if !size.eq_ignore_ascii_case("7x7") {
                return Err(BoardError::UnsupportedSize(size.to_string()));
            }
            size_ok = true;
        } else if let Some(list) = field.strip_prefix("pegs=") {
            for token in list.split(',').filter(|t| !t.is_empty()) {
                let pos = label_to_pos(token.trim())?;
                pegs |= 1u64 << pos;
                valid |= 1u64 << pos;
            }
        } else if let Some(list) = field.strip_prefix("empty=") {
            for token in list.split(',').filter(|t| !t.is_empty()) {
                let pos = label_to_pos(token.trim())?;
                valid |= 1u64 << pos;
            }
        }
    }

    if !size_ok {
        return Err(BoardError::UnsupportedSize("missing size= field".to_string()));
    }
    Board::new(pegs, valid)
}

/// The three-kind symbolic rendering of a board as a 7-row vector of
/// 7-character strings (`●` peg, `○` hole, `▫` absent).
pub fn board_to_matrix(board: &Board) -> Vec<String> {
    (0..7u8)
        .map(|row| {
            (0..7u8)
                .map(|col| {
                    let pos = coords_to_pos(row, col);
                    let in_valid = board.valid & (1u64 << pos) != 0;
                    let has_peg = board.pegs & (1u64 << pos) != 0;
                    match (in_valid, has_peg) {
                        (false, _) => ABSENT_GLYPH,
                        (true, true) => PEG_GLYPH,
                        (true, false) => HOLE_GLYPH,
                    }
                })
                .collect()
        })
        .collect()
}
