//! Error types
//!
//! Only two things can go wrong: a grammar that cannot be compiled, and a
//! request for a language nobody registered. Tokenizing text never fails.

/// Raised by [`Language::compile`](crate::Language::compile) when a grammar is defective.
///
/// This is a configuration error: the grammar has to be fixed, retrying is pointless.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("invalid {field} pattern {pattern:?} in mode {mode}: {source}")]
    InvalidPattern {
        mode: String,
        field: &'static str,
        pattern: String,
        #[source]
        source: Box<fancy_regex::Error>,
    },

    #[error("invalid lexeme pattern {pattern:?}: {source}")]
    InvalidLexemes {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("mode #{id} was declared but never defined")]
    UndefinedMode { id: usize },

    #[error("starts chain through mode {mode} loops back on itself and {mode} has no end")]
    StartsCycle { mode: String },

    #[error("mode {mode} is used as a starts continuation but declares variants")]
    StartsWithVariants { mode: String },
}

impl GrammarError {
    pub(crate) fn invalid_pattern(
        mode: String,
        field: &'static str,
        pattern: &str,
        source: fancy_regex::Error,
    ) -> Self {
        Self::InvalidPattern {
            mode,
            field,
            pattern: pattern.to_string(),
            source: Box::new(source),
        }
    }
}

/// The requested language or alias is not in the registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown language: {name}")]
pub struct UnknownLanguage {
    pub name: String,
}

impl UnknownLanguage {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }
}

/// Either of the crate's errors, for callers that handle both in one place
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    UnknownLanguage(#[from] UnknownLanguage),
}

pub type Result<T> = std::result::Result<T, Error>;
