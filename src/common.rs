//! Building blocks shared by the bundled grammars.
//!
//! These return plain [Mode] values. Modes that contain other modes take the
//! [ModeId] of the contained mode, so it has to be registered first.

use crate::keywords::KeywordTable;
use crate::mode::{Mode, ModeId};

pub const C_NUMBER: &str = r"(-?)(\b0[xX][a-fA-F0-9]+|(\b\d+(\.\d*)?|\.\d+)([eE][-+]?\d+)?)";
pub const BINARY_NUMBER: &str = r"\b(0b[01]+)";

/// A backslash followed by any character
pub fn backslash_escape() -> Mode {
    Mode::new().begin(r"\\[\s\S]").relevance(0)
}

/// Single quoted string that may not span lines
pub fn apos_string(escape: ModeId) -> Mode {
    Mode::new()
        .class("string")
        .begin("'")
        .end("'")
        .illegal(r"\n")
        .contains(&[escape])
        .keywords(KeywordTable::new())
}

/// Double quoted string that may not span lines
pub fn quote_string(escape: ModeId) -> Mode {
    Mode::new()
        .class("string")
        .begin("\"")
        .end("\"")
        .illegal(r"\n")
        .contains(&[escape])
        .keywords(KeywordTable::new())
}

/// Comment between two delimiters
pub fn comment<S: Into<String>>(begin: S, end: S) -> Mode {
    Mode::new()
        .class("comment")
        .begin(begin)
        .end(end)
        .relevance(0)
        .keywords(KeywordTable::new())
}

pub fn hash_comment() -> Mode {
    comment("#", "$")
}

pub fn c_line_comment() -> Mode {
    comment("//", "$")
}

pub fn c_block_comment() -> Mode {
    comment(r"/\*", r"\*/")
}

pub fn c_number() -> Mode {
    Mode::new().class("number").begin(C_NUMBER).relevance(0)
}

pub fn binary_number() -> Mode {
    Mode::new().class("number").begin(BINARY_NUMBER).relevance(0)
}

/// Name of a declared entity
pub fn title(pattern: &str) -> Mode {
    Mode::new().class("title").begin(pattern).relevance(0)
}
