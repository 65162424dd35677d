//! Text manipulation utilities.
//!
//! This module provides position mapping between tsserver offsets, LSP
//! positions (both UTF-16 based) and byte offsets into the Rust string.

pub mod position;

pub use position::{LineIndex, PositionResolver, convert_utf16_to_byte_in_line};
