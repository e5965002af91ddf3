//! Offset-preserving text utilities shared by every analysis pass.

mod nesting;
mod position;
mod sanitize;
mod word;


pub use nesting::{matching_close, matching_open, split_top_level, top_level_assign};
pub use position::{LineIndex, Position, offset_to_position};
pub use sanitize::{SanitizeMode, sanitize};
pub use word::{
    IdentOccurrence, WordSpan, floor_char_boundary, is_ident_continue, is_ident_start, is_identifier, next_non_space, prev_non_space,
    prev_word, scan_identifiers, word_at,
};
