//! Mode based syntax highlighting.
//!
//! A grammar is a [Language]: a root keyword table plus a graph of [Mode]s, each
//! describing a region of text by a begin pattern, an end pattern and the modes that may
//! appear inside it. Grammars are compiled once into a [CompiledLanguage] and can then
//! tokenize any number of texts into a tree of [Span]s, from any number of threads.
//!
//! ```
//! use modelex::{languages, Registry};
//! let mut registry = Registry::new();
//! languages::register_all(&mut registry).unwrap();
//! let result = registry.highlight("coffee", "square = (x) -> x * x").unwrap();
//! let text: String = result.leaves().map(|span| span.text).collect();
//! assert_eq!(text, "square = (x) -> x * x");
//! ```

pub mod common;
mod compiler;
mod error;
mod highlighter;
mod keywords;
mod language;
pub mod languages;
mod mode;
mod options;
mod registry;
mod tokens;

pub use compiler::{CompiledLanguage, CompiledMode, Pattern, DEFAULT_LEXEMES};
pub use error::{Error, GrammarError, Result, UnknownLanguage};
pub use highlighter::{tokenize, NoSubLanguages, Tokenizer};
pub use keywords::{Keyword, KeywordTable, DEFAULT_KEYWORD_RELEVANCE};
pub use language::Language;
pub use mode::{Child, Mode, ModeId, SubLanguage};
pub use options::Options;
pub use registry::{Detection, LanguageResolver, Registry};
pub use tokens::{trim, Highlight, Leaves, Span, TokOpt};
