use crate::compiler::{self, CompiledLanguage};
use crate::error::GrammarError;
use crate::keywords::KeywordTable;
use crate::mode::{Child, Mode, ModeId};
use std::sync::Arc;

/// A named grammar: root keywords, root modes and the arena every mode lives in.
///
/// Modes are added with [Language::mode] and referenced by the returned [ModeId].
/// Modes that take part in a cycle (a substitution that may contain strings which
/// themselves contain substitutions) are reserved first with [Language::declare]
/// and filled in later with [Language::define].
#[derive(Debug, Clone)]
pub struct Language {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) keywords: Option<Arc<KeywordTable>>,
    pub(crate) contains: Vec<Child>,
    pub(crate) illegal: Option<String>,
    pub(crate) case_insensitive: bool,
    pub(crate) lexemes: Option<String>,
    pub(crate) modes: Vec<Option<Mode>>,
}

impl Language {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            aliases: vec![],
            keywords: None,
            contains: vec![],
            illegal: None,
            case_insensitive: false,
            lexemes: None,
            modes: vec![],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias<S: Into<String>>(&mut self, alias: S) -> &mut Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn aliases<S: AsRef<str>>(&mut self, aliases: &[S]) -> &mut Self {
        self.aliases
            .extend(aliases.iter().map(|a| a.as_ref().to_string()));
        self
    }

    /// Keywords recognised in text that no nested mode claims
    pub fn keywords<K: Into<Arc<KeywordTable>>>(&mut self, keywords: K) -> &mut Self {
        self.keywords = Some(keywords.into());
        self
    }

    /// Append modes to the root contains list
    pub fn contains(&mut self, modes: &[ModeId]) -> &mut Self {
        self.contains.extend(modes.iter().copied().map(Child::Mode));
        self
    }

    /// Pattern that is never valid at the top level of this language
    pub fn illegal<S: Into<String>>(&mut self, pattern: S) -> &mut Self {
        self.illegal = Some(pattern.into());
        self
    }

    pub fn case_insensitive(&mut self, yes: bool) -> &mut Self {
        self.case_insensitive = yes;
        self
    }

    /// Pattern that splits plain text into candidate keywords, `\w+` when unset
    pub fn lexemes<S: Into<String>>(&mut self, pattern: S) -> &mut Self {
        self.lexemes = Some(pattern.into());
        self
    }

    /// Store a mode in the arena
    pub fn mode(&mut self, mode: Mode) -> ModeId {
        self.modes.push(Some(mode));
        ModeId(self.modes.len() - 1)
    }

    /// Reserve a handle for a mode that will be defined later
    pub fn declare(&mut self) -> ModeId {
        self.modes.push(None);
        ModeId(self.modes.len() - 1)
    }

    /// Fill in (or replace) the mode behind a handle
    pub fn define(&mut self, id: ModeId, mode: Mode) {
        if id.0 >= self.modes.len() {
            self.modes.resize_with(id.0 + 1, || None);
        }
        self.modes[id.0] = Some(mode);
    }

    pub fn get(&self, id: ModeId) -> Option<&Mode> {
        self.modes.get(id.0).and_then(Option::as_ref)
    }

    /// Expand variants, resolve self references and compile every pattern
    pub fn compile(&self) -> Result<CompiledLanguage, GrammarError> {
        compiler::compile(self)
    }
}
