//! Turns a declarative [Language] into the flat, index linked form the tokenizer runs on.
//!
//! Every mode in the arena becomes one compiled mode per variant, `contains` lists are
//! rewritten to compiled indices (a self reference is just the mode's own index), and
//! every pattern is compiled exactly once. The result is immutable and can be shared
//! between threads.

use crate::error::GrammarError;
use crate::keywords::KeywordTable;
use crate::language::Language;
use crate::mode::{Child, Mode, ModeId, SubLanguage};
use fancy_regex::Regex;
use nohash_hasher::{IntMap, IntSet};
use std::sync::Arc;

/// Index of the root mode in [CompiledLanguage::modes]
pub(crate) const ROOT: usize = 0;

/// Word pattern used to find keywords when a language does not set its own
pub const DEFAULT_LEXEMES: &str = r"\w+";

/// A compiled regular expression that remembers its source
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Leftmost match starting at or after `pos`, as a byte range
    pub(crate) fn find_at(&self, text: &str, pos: usize) -> Option<(usize, usize)> {
        match self.regex.find_from_pos(text, pos) {
            Ok(m) => m.map(|m| (m.start(), m.end())),
            Err(err) => {
                log::warn!("pattern /{}/ gave up at byte {pos}: {err}", self.source);
                None
            }
        }
    }
}

/// One mode, ready for matching
#[derive(Debug, Clone, Default)]
pub struct CompiledMode {
    pub(crate) label: String,
    pub(crate) class: Option<String>,
    pub(crate) begin: Option<Pattern>,
    pub(crate) end: Option<Pattern>,
    pub(crate) illegal: Option<Pattern>,
    pub(crate) keywords: Option<Arc<KeywordTable>>,
    pub(crate) contains: Vec<usize>,
    pub(crate) relevance: u32,
    pub(crate) exclude_begin: bool,
    pub(crate) exclude_end: bool,
    pub(crate) return_begin: bool,
    pub(crate) return_end: bool,
    pub(crate) ends_with_parent: bool,
    pub(crate) starts: Option<usize>,
    pub(crate) sub_language: Option<SubLanguage>,
}

impl CompiledMode {
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn relevance(&self) -> u32 {
        self.relevance
    }

    /// Indices of the modes that may begin inside this one, in priority order
    pub fn contains(&self) -> &[usize] {
        &self.contains
    }

    pub fn starts(&self) -> Option<usize> {
        self.starts
    }

    pub fn begin(&self) -> Option<&str> {
        self.begin.as_ref().map(Pattern::as_str)
    }

    pub fn end(&self) -> Option<&str> {
        self.end.as_ref().map(Pattern::as_str)
    }

    /// True when the mode closes on its own once nothing it contains begins at the cursor
    pub(crate) fn ends_implicitly(&self) -> bool {
        self.end.is_none() && !self.ends_with_parent
    }
}

/// A language whose grammar has been validated and compiled
#[derive(Debug)]
pub struct CompiledLanguage {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) case_insensitive: bool,
    pub(crate) lexemes: regex::Regex,
    pub(crate) modes: Vec<CompiledMode>,
}

impl CompiledLanguage {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn root(&self) -> &CompiledMode {
        &self.modes[ROOT]
    }

    pub fn mode(&self, idx: usize) -> Option<&CompiledMode> {
        self.modes.get(idx)
    }

    pub fn mode_count(&self) -> usize {
        self.modes.len()
    }
}

pub(crate) fn compile(lang: &Language) -> Result<CompiledLanguage, GrammarError> {
    let mut compiler = Compiler {
        lang,
        flags: if lang.case_insensitive { "(?mi)" } else { "(?m)" },
        modes: vec![CompiledMode::default()],
        expanded: IntMap::default(),
        lowered: IntMap::default(),
        pending: vec![],
    };
    compiler.compile_root()?;
    while let Some((idx, mode)) = compiler.pending.pop() {
        compiler.compile_mode(idx, &mode)?;
    }
    compiler.check_starts_chains()?;
    let source = lang.lexemes.as_deref().unwrap_or(DEFAULT_LEXEMES);
    let lexemes = regex::Regex::new(source).map_err(|source_err| GrammarError::InvalidLexemes {
        pattern: source.to_string(),
        source: source_err,
    })?;
    log::debug!(
        "compiled language {} into {} modes",
        lang.name,
        compiler.modes.len()
    );
    Ok(CompiledLanguage {
        name: lang.name.clone(),
        aliases: lang.aliases.clone(),
        case_insensitive: lang.case_insensitive,
        lexemes,
        modes: compiler.modes,
    })
}

struct Compiler<'l> {
    lang: &'l Language,
    flags: &'static str,
    modes: Vec<CompiledMode>,
    /// Arena index -> compiled indices (one per variant)
    expanded: IntMap<usize, Vec<usize>>,
    /// Lowercased copies of shared keyword tables, keyed by table address
    lowered: IntMap<usize, Arc<KeywordTable>>,
    /// Modes that have an index but whose fields are not compiled yet
    pending: Vec<(usize, Mode)>,
}

impl Compiler<'_> {
    fn compile_root(&mut self) -> Result<(), GrammarError> {
        let lang = self.lang;
        let mut contains = vec![];
        for child in &lang.contains {
            contains.extend(self.resolve_child(*child, ROOT)?);
        }
        let illegal = match &lang.illegal {
            Some(src) => Some(self.pattern(&lang.name, "illegal", src)?),
            None => None,
        };
        let keywords = lang.keywords.as_ref().map(|k| self.keyword_table(k));
        self.modes[ROOT] = CompiledMode {
            label: format!("{} (root)", lang.name),
            illegal,
            keywords,
            contains,
            ..CompiledMode::default()
        };
        Ok(())
    }

    /// Compiled indices standing for an arena mode, allocating them on first use
    fn expand(&mut self, id: ModeId) -> Result<Vec<usize>, GrammarError> {
        if let Some(indices) = self.expanded.get(&id.0) {
            return Ok(indices.clone());
        }
        let lang = self.lang;
        let mode = lang
            .get(id)
            .cloned()
            .ok_or(GrammarError::UndefinedMode { id: id.0 })?;
        let indices = self.allocate(mode);
        self.expanded.insert(id.0, indices.clone());
        Ok(indices)
    }

    fn allocate(&mut self, mut mode: Mode) -> Vec<usize> {
        match mode.variants.take() {
            Some(variants) if !variants.is_empty() => variants
                .into_iter()
                .flat_map(|variant| self.allocate(Mode::inherit(&mode, variant)))
                .collect(),
            _ => {
                let idx = self.modes.len();
                self.modes.push(CompiledMode::default());
                self.pending.push((idx, mode));
                vec![idx]
            }
        }
    }

    fn resolve_child(&mut self, child: Child, owner: usize) -> Result<Vec<usize>, GrammarError> {
        match child {
            Child::Mode(id) => self.expand(id),
            Child::This => Ok(vec![owner]),
        }
    }

    fn compile_mode(&mut self, idx: usize, mode: &Mode) -> Result<(), GrammarError> {
        let label = format!("#{idx} {}", mode.describe());
        let mut contains = vec![];
        for child in mode.contains.iter().flatten() {
            contains.extend(self.resolve_child(*child, idx)?);
        }
        let starts = match mode.starts {
            Some(id) => match self.expand(id)?.as_slice() {
                [single] => Some(*single),
                _ => return Err(GrammarError::StartsWithVariants { mode: label }),
            },
            None => None,
        };

        let mut keywords = mode.keywords.clone();
        let mut relevance = mode.relevance;
        let begin = match &mode.begin_keywords {
            Some(words) => {
                if keywords.is_none() {
                    keywords = Some(Arc::new(KeywordTable::new().add("keyword", words)));
                }
                relevance = relevance.or(Some(0));
                let alternation = words
                    .iter()
                    .flat_map(|w| w.split_whitespace())
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join("|");
                Some(format!(r"\b(?:{alternation})(?!\.)(?=\b|\s)"))
            }
            None => mode.begin.clone(),
        };

        let begin = match begin {
            Some(src) => Some(self.pattern(&label, "begin", &src)?),
            None => None,
        };
        let end = match &mode.end {
            Some(src) => Some(self.pattern(&label, "end", src)?),
            None => None,
        };
        let illegal = match &mode.illegal {
            Some(src) => Some(self.pattern(&label, "illegal", src)?),
            None => None,
        };
        let keywords = keywords.as_ref().map(|k| self.keyword_table(k));

        self.modes[idx] = CompiledMode {
            label,
            class: mode.class.clone(),
            begin,
            end,
            illegal,
            keywords,
            contains,
            relevance: relevance.unwrap_or(1),
            exclude_begin: mode.exclude_begin.unwrap_or(false),
            exclude_end: mode.exclude_end.unwrap_or(false),
            return_begin: mode.return_begin.unwrap_or(false),
            return_end: mode.return_end.unwrap_or(false),
            ends_with_parent: mode.ends_with_parent.unwrap_or(false),
            starts,
            sub_language: mode.sub_language.clone(),
        };
        Ok(())
    }

    fn pattern(&self, mode: &str, field: &'static str, src: &str) -> Result<Pattern, GrammarError> {
        let regex = Regex::new(&format!("{}{src}", self.flags))
            .map_err(|err| GrammarError::invalid_pattern(mode.to_string(), field, src, err))?;
        Ok(Pattern {
            source: src.to_string(),
            regex,
        })
    }

    fn keyword_table(&mut self, table: &Arc<KeywordTable>) -> Arc<KeywordTable> {
        if !self.lang.case_insensitive {
            return Arc::clone(table);
        }
        let key = Arc::as_ptr(table) as usize;
        Arc::clone(
            self.lowered
                .entry(key)
                .or_insert_with(|| Arc::new(table.to_lowercase())),
        )
    }

    /// A `starts` chain may loop only if every mode on the loop has an end of its own
    fn check_starts_chains(&self) -> Result<(), GrammarError> {
        let mut checked: IntSet<usize> = IntSet::default();
        for idx in 0..self.modes.len() {
            let mut seen: IntSet<usize> = IntSet::default();
            let mut next = Some(idx);
            while let Some(n) = next {
                if checked.contains(&n) {
                    break;
                }
                if !seen.insert(n) {
                    self.check_cycle(n)?;
                    break;
                }
                next = self.modes[n].starts;
            }
            checked.extend(seen);
        }
        Ok(())
    }

    fn check_cycle(&self, entry: usize) -> Result<(), GrammarError> {
        let mut n = entry;
        loop {
            let mode = &self.modes[n];
            if mode.end.is_none() {
                return Err(GrammarError::StartsCycle {
                    mode: mode.label.clone(),
                });
            }
            match mode.starts {
                Some(next) if next != entry => n = next,
                _ => return Ok(()),
            }
        }
    }
}
