use std::collections::HashMap;

/// Weight a keyword contributes when no `|N` suffix is given.
///
/// Relevance is counted in whole units, so this is the same as the default weight of a
/// mode. Keywords still weigh less overall because each distinct word counts only once
/// per tokenization, however often it occurs.
pub const DEFAULT_KEYWORD_RELEVANCE: u32 = 1;

/// Maps identifiers to the classification they should be highlighted with.
///
/// Words may carry a relevance suffix, `"print|0"` registers `print` with a weight of
/// zero, which keeps very common words from skewing language detection.
/// Each word maps to exactly one class, registering it again overwrites it.
///
/// # Example
/// ```
/// use modelex::KeywordTable;
/// let table = KeywordTable::new()
///     .add("keyword", &["if", "else"])
///     .add("literal", &["true", "false|0"]);
/// assert_eq!(table.get("if").unwrap().class, "keyword");
/// assert_eq!(table.get("false").unwrap().relevance, 0);
/// assert!(table.get("x").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordTable {
    classes: Vec<String>,
    words: HashMap<String, Entry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    class: usize,
    relevance: u32,
}

/// The result of looking a word up in a [KeywordTable]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keyword<'a> {
    pub class: &'a str,
    pub relevance: u32,
}

impl KeywordTable {
    /// Creates an empty table.
    ///
    /// Attaching an empty table to a mode is how a grammar stops the mode from
    /// inheriting the keywords of its enclosing modes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a list of words under a class, builder style.
    /// Each entry may hold several whitespace separated words.
    pub fn add<S: AsRef<str>>(mut self, class: &str, words: &[S]) -> Self {
        for entry in words {
            for word in entry.as_ref().split_whitespace() {
                self.insert(class, word);
            }
        }
        self
    }

    /// Register a single word (optionally suffixed with `|relevance`)
    pub fn insert(&mut self, class: &str, word: &str) {
        let (word, relevance) = split_relevance(word);
        if word.is_empty() {
            return;
        }
        let class = self.class_index(class);
        self.words.insert(word.to_string(), Entry { class, relevance });
    }

    /// Look up a word
    pub fn get(&self, word: &str) -> Option<Keyword<'_>> {
        self.words.get(word).map(|entry| Keyword {
            class: &self.classes[entry.class],
            relevance: entry.relevance,
        })
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The classification names used in this table, in registration order
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    /// Copy of this table with every word lowercased, used by case insensitive languages
    pub(crate) fn to_lowercase(&self) -> Self {
        let words = self
            .words
            .iter()
            .map(|(word, entry)| (word.to_lowercase(), *entry))
            .collect();
        Self {
            classes: self.classes.clone(),
            words,
        }
    }

    fn class_index(&mut self, class: &str) -> usize {
        if let Some(idx) = self.classes.iter().position(|c| c == class) {
            idx
        } else {
            self.classes.push(class.to_string());
            self.classes.len() - 1
        }
    }
}

fn split_relevance(word: &str) -> (&str, u32) {
    match word.split_once('|') {
        Some((word, weight)) => match weight.parse() {
            Ok(weight) => (word, weight),
            Err(_) => (word, DEFAULT_KEYWORD_RELEVANCE),
        },
        None => (word, DEFAULT_KEYWORD_RELEVANCE),
    }
}
