use crate::compiler::CompiledLanguage;
use crate::error::{GrammarError, UnknownLanguage};
use crate::highlighter::{score, Tokenizer};
use crate::language::Language;
use crate::options::Options;
use crate::tokens::Highlight;
use std::collections::HashMap;
use std::sync::Arc;

/// Looks up the languages a sub-language mode delegates to
pub trait LanguageResolver {
    fn resolve_language(&self, name: &str) -> Option<&CompiledLanguage>;

    /// Candidates for automatic sub-language selection
    fn language_names(&self) -> Vec<&str> {
        vec![]
    }
}

/// The outcome of [Registry::detect]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub language: String,
    pub relevance: u32,
    pub second_best: Option<(String, u32)>,
}

/// A set of compiled languages addressable by name or alias
#[derive(Debug, Default)]
pub struct Registry {
    languages: Vec<Arc<CompiledLanguage>>,
    names: HashMap<String, usize>,
    options: Options,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Compile and add a language, replacing any language registered under the same name
    pub fn register(&mut self, language: Language) -> Result<(), GrammarError> {
        let compiled = language.compile()?;
        self.insert(Arc::new(compiled));
        Ok(())
    }

    /// Add an already compiled language
    pub fn insert(&mut self, language: Arc<CompiledLanguage>) {
        let key = language.name().to_lowercase();
        let idx = match self.names.get(&key) {
            Some(&idx) if self.languages[idx].name().eq_ignore_ascii_case(language.name()) => {
                self.languages[idx] = Arc::clone(&language);
                // aliases the old definition had are dropped with it
                self.names.retain(|_, &mut i| i != idx);
                idx
            }
            _ => {
                self.languages.push(Arc::clone(&language));
                self.languages.len() - 1
            }
        };
        log::debug!(
            "registered language {} (aliases: {:?})",
            language.name(),
            language.aliases()
        );
        self.names.insert(key, idx);
        for alias in language.aliases() {
            self.names.insert(alias.to_lowercase(), idx);
        }
    }

    /// Find a language by name or alias, ignoring case
    pub fn resolve(&self, name: &str) -> Result<&CompiledLanguage, UnknownLanguage> {
        self.get(name)
            .map(Arc::as_ref)
            .ok_or_else(|| UnknownLanguage::new(name))
    }

    /// Shared handle to a language, for use from other threads
    pub fn get(&self, name: &str) -> Option<&Arc<CompiledLanguage>> {
        self.names
            .get(&name.to_lowercase())
            .and_then(|&idx| self.languages.get(idx))
    }

    /// Names of registered languages, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.languages.iter().map(|l| l.name())
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    pub fn tokenizer(&self) -> Tokenizer<'_> {
        Tokenizer::new(self).with_options(self.options)
    }

    /// Tokenize `text` with the named language, delegating sub-languages to this registry
    pub fn highlight<'t>(&self, name: &str, text: &'t str) -> Result<Highlight<'t>, UnknownLanguage> {
        let language = self.resolve(name)?;
        Ok(self.tokenizer().tokenize(text, language))
    }

    /// Tokenize with every registered language and rank them by relevance.
    /// Results in which an illegal pattern fired score zero. Ties go to the language
    /// registered first.
    pub fn detect(&self, text: &str) -> Option<Detection> {
        let tokenizer = self.tokenizer();
        let mut ranked: Vec<(String, u32)> = self
            .languages
            .iter()
            .map(|language| {
                let result = tokenizer.tokenize(text, language);
                (result.language.clone(), score(&result))
            })
            .collect();
        // stable sort keeps registration order among equals
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        let mut ranked = ranked.into_iter();
        let (language, relevance) = ranked.next()?;
        log::debug!("detected {language} with relevance {relevance}");
        Some(Detection {
            language,
            relevance,
            second_best: ranked.next(),
        })
    }
}

impl LanguageResolver for Registry {
    fn resolve_language(&self, name: &str) -> Option<&CompiledLanguage> {
        self.get(name).map(Arc::as_ref)
    }

    fn language_names(&self) -> Vec<&str> {
        self.names().collect()
    }
}
