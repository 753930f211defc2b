use crate::keywords::KeywordTable;
use std::sync::Arc;

/// Stable handle to a mode stored in a [Language](crate::Language)'s arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModeId(pub(crate) usize);

impl ModeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// An entry in a mode's `contains` list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Child {
    /// Another mode of the same language
    Mode(ModeId),
    /// The mode that owns this list (after variant expansion, the variant itself)
    This,
}

impl From<ModeId> for Child {
    fn from(id: ModeId) -> Self {
        Child::Mode(id)
    }
}

/// Which language a mode hands its body to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubLanguage {
    /// Always use this language
    Named(String),
    /// Try each of these and keep the most relevant result.
    /// An empty list means every language the resolver knows.
    Auto(Vec<String>),
}

/// A declarative grammar rule.
///
/// Every field is optional so that [Mode::inherit] can tell a field that was set from
/// one that was left at its default. Modes refer to each other through [ModeId]
/// handles handed out by [Language::mode](crate::Language::mode).
///
/// # Example
/// ```
/// use modelex::{Language, Mode};
/// let mut lang = Language::new("demo");
/// let escape = lang.mode(Mode::new().begin(r"\\[\s\S]").relevance(0));
/// let string = lang.mode(
///     Mode::new().class("string").begin("\"").end("\"").contains(&[escape])
/// );
/// lang.contains(&[string]);
/// assert!(lang.compile().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Mode {
    pub(crate) class: Option<String>,
    pub(crate) begin: Option<String>,
    pub(crate) begin_keywords: Option<Vec<String>>,
    pub(crate) end: Option<String>,
    pub(crate) contains: Option<Vec<Child>>,
    pub(crate) keywords: Option<Arc<KeywordTable>>,
    pub(crate) illegal: Option<String>,
    pub(crate) relevance: Option<u32>,
    pub(crate) exclude_begin: Option<bool>,
    pub(crate) exclude_end: Option<bool>,
    pub(crate) return_begin: Option<bool>,
    pub(crate) return_end: Option<bool>,
    pub(crate) ends_with_parent: Option<bool>,
    pub(crate) starts: Option<ModeId>,
    pub(crate) variants: Option<Vec<Mode>>,
    pub(crate) sub_language: Option<SubLanguage>,
}

impl Mode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classification given to everything this mode matches
    pub fn class<S: Into<String>>(mut self, class: S) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn begin<S: Into<String>>(mut self, pattern: S) -> Self {
        self.begin = Some(pattern.into());
        self
    }

    /// Begin on any of these words.
    /// Unless the mode has its own table the words are highlighted as `keyword`.
    pub fn begin_keywords<S: AsRef<str>>(mut self, words: &[S]) -> Self {
        self.begin_keywords = Some(words.iter().map(|w| w.as_ref().to_string()).collect());
        self
    }

    pub fn end<S: Into<String>>(mut self, pattern: S) -> Self {
        self.end = Some(pattern.into());
        self
    }

    /// Append modes to the contains list, earlier entries win ties
    pub fn contains(mut self, modes: &[ModeId]) -> Self {
        self.contains
            .get_or_insert_with(Vec::new)
            .extend(modes.iter().copied().map(Child::Mode));
        self
    }

    /// Let this mode contain itself at the current position of the contains list
    pub fn contains_self(mut self) -> Self {
        self.contains.get_or_insert_with(Vec::new).push(Child::This);
        self
    }

    pub fn keywords<K: Into<Arc<KeywordTable>>>(mut self, keywords: K) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    pub fn illegal<S: Into<String>>(mut self, pattern: S) -> Self {
        self.illegal = Some(pattern.into());
        self
    }

    pub fn relevance(mut self, relevance: u32) -> Self {
        self.relevance = Some(relevance);
        self
    }

    /// Leave the begin delimiter outside of this mode's span
    pub fn exclude_begin(mut self) -> Self {
        self.exclude_begin = Some(true);
        self
    }

    /// Leave the end delimiter outside of this mode's span
    pub fn exclude_end(mut self) -> Self {
        self.exclude_end = Some(true);
        self
    }

    /// Rescan the begin delimiter from inside the mode
    pub fn return_begin(mut self) -> Self {
        self.return_begin = Some(true);
        self
    }

    /// Leave the end delimiter unconsumed for the parent to scan
    pub fn return_end(mut self) -> Self {
        self.return_end = Some(true);
        self
    }

    pub fn ends_with_parent(mut self) -> Self {
        self.ends_with_parent = Some(true);
        self
    }

    /// Mode to enter right after this one ends
    pub fn starts(mut self, continuation: ModeId) -> Self {
        self.starts = Some(continuation);
        self
    }

    /// Alternatives that replace this mode wherever it is contained.
    /// Each variant inherits every field it does not set itself.
    pub fn variants(mut self, variants: Vec<Mode>) -> Self {
        self.variants = Some(variants);
        self
    }

    pub fn sub_language<S: Into<String>>(mut self, language: S) -> Self {
        self.sub_language = Some(SubLanguage::Named(language.into()));
        self
    }

    pub fn sub_language_auto<S: AsRef<str>>(mut self, languages: &[S]) -> Self {
        self.sub_language = Some(SubLanguage::Auto(
            languages.iter().map(|l| l.as_ref().to_string()).collect(),
        ));
        self
    }

    /// Merge two modes, fields set on `child` win over those of `parent`
    pub fn inherit(parent: &Mode, child: Mode) -> Mode {
        Mode {
            class: child.class.or_else(|| parent.class.clone()),
            begin: child.begin.or_else(|| parent.begin.clone()),
            begin_keywords: child.begin_keywords.or_else(|| parent.begin_keywords.clone()),
            end: child.end.or_else(|| parent.end.clone()),
            contains: child.contains.or_else(|| parent.contains.clone()),
            keywords: child.keywords.or_else(|| parent.keywords.clone()),
            illegal: child.illegal.or_else(|| parent.illegal.clone()),
            relevance: child.relevance.or(parent.relevance),
            exclude_begin: child.exclude_begin.or(parent.exclude_begin),
            exclude_end: child.exclude_end.or(parent.exclude_end),
            return_begin: child.return_begin.or(parent.return_begin),
            return_end: child.return_end.or(parent.return_end),
            ends_with_parent: child.ends_with_parent.or(parent.ends_with_parent),
            starts: child.starts.or(parent.starts),
            variants: child.variants.or_else(|| parent.variants.clone()),
            sub_language: child.sub_language.or_else(|| parent.sub_language.clone()),
        }
    }

    /// Short human readable label, used in error messages
    pub(crate) fn describe(&self) -> String {
        match (&self.class, &self.begin) {
            (Some(class), Some(begin)) => format!("{class} /{begin}/"),
            (Some(class), None) => class.clone(),
            (None, Some(begin)) => format!("/{begin}/"),
            (None, None) => "<anonymous>".to_string(),
        }
    }
}
