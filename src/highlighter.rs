//! The tokenizer engine.
//!
//! A run keeps a stack of open frames, one per active mode, with the root mode at the
//! bottom. At each step every pattern that may fire in the current frame is tried from the
//! cursor and the leftmost match wins. At equal offsets an illegal match beats an end
//! match, which beats the contained modes in their declared order. Text skipped on the way
//! is split into words and classified against the nearest keyword table on the stack.
//!
//! Tokenizing never fails. Illegal matches abort only the frame they occur in, and if a
//! grammar keeps stepping without moving the cursor (see [Options]) the character at the
//! cursor is emitted as plain text so scanning can go on.

use crate::compiler::{CompiledLanguage, Pattern, ROOT};
use crate::keywords::KeywordTable;
use crate::mode::SubLanguage;
use crate::options::Options;
use crate::registry::LanguageResolver;
use crate::tokens::{Highlight, Span};
use if_chain::if_chain;
use nohash_hasher::IntSet;
use std::borrow::Cow;
use std::collections::HashSet;
use std::ops::Range;

/// Cache slots of a frame: illegal, end, then one per contained mode
const ILLEGAL: usize = 0;
const END: usize = 1;
const BEGINS: usize = 2;

/// Resolver for callers that have no other languages to delegate to
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSubLanguages;

impl LanguageResolver for NoSubLanguages {
    fn resolve_language(&self, _name: &str) -> Option<&CompiledLanguage> {
        None
    }
}

/// Tokenize `text` with a single language.
/// Sub-language regions are left as plain text.
///
/// # Example
/// ```
/// use modelex::{tokenize, KeywordTable, Language};
/// let mut lang = Language::new("tiny");
/// lang.keywords(KeywordTable::new().add("keyword", &["if", "else"]));
/// let lang = lang.compile().unwrap();
/// let result = tokenize("if x else", &lang);
/// let kinds: Vec<_> = result.leaves().map(|s| (s.text, s.kind.as_deref())).collect();
/// assert_eq!(kinds, [("if", Some("keyword")), (" x ", None), ("else", Some("keyword"))]);
/// ```
pub fn tokenize<'t>(text: &'t str, language: &CompiledLanguage) -> Highlight<'t> {
    Tokenizer::new(&NoSubLanguages).tokenize(text, language)
}

/// Runs compiled languages over text, looking sub-languages up through a resolver
pub struct Tokenizer<'r> {
    resolver: &'r dyn LanguageResolver,
    options: Options,
}

impl<'r> Tokenizer<'r> {
    pub fn new(resolver: &'r dyn LanguageResolver) -> Self {
        Self {
            resolver,
            options: Options::default(),
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Tokenize the whole of `text`
    pub fn tokenize<'t>(&self, text: &'t str, language: &CompiledLanguage) -> Highlight<'t> {
        Run::new(self.resolver, self.options, language, text, 0, 0).finish()
    }
}

/// What fired at a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Illegal,
    /// End of the frame at this stack depth
    End(usize),
    /// Begin of this compiled mode
    Begin(usize),
    /// The top frame has nothing left to match
    ImplicitEnd,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    end: usize,
    event: Event,
}

/// Keep `candidate` only if it starts strictly before the current best
fn pick(best: &mut Option<Candidate>, candidate: Candidate) {
    if best.map_or(true, |b| candidate.start < b.start) {
        *best = Some(candidate);
    }
}

/// Last search result for one pattern of a frame
type Slot = Option<Option<(usize, usize)>>;

/// Search from the cursor, reusing the previous result while it is still ahead of it
fn probe(slot: &mut Slot, pattern: &Pattern, text: &str, cursor: usize) -> Option<(usize, usize)> {
    match *slot {
        Some(None) => return None,
        Some(Some(found)) if found.0 >= cursor => return Some(found),
        _ => {}
    }
    let found = pattern.find_at(text, cursor);
    *slot = Some(found);
    found
}

struct Frame<'t> {
    mode: usize,
    start: usize,
    children: Vec<Span<'t>>,
    relevance: u32,
    slots: Vec<Slot>,
}

struct Run<'a, 't> {
    resolver: &'a dyn LanguageResolver,
    options: Options,
    lang: &'a CompiledLanguage,
    /// The input, cut off at the end of the region being tokenized
    text: &'t str,
    start: usize,
    depth: usize,
    cursor: usize,
    stack: Vec<Frame<'t>>,
    seen: HashSet<String>,
    illegal: bool,
    /// Modes entered at `entered_at` without the cursor moving since
    entered: IntSet<usize>,
    entered_at: usize,
}

impl<'a, 't> Run<'a, 't> {
    fn new(
        resolver: &'a dyn LanguageResolver,
        options: Options,
        lang: &'a CompiledLanguage,
        text: &'t str,
        start: usize,
        depth: usize,
    ) -> Self {
        let mut run = Self {
            resolver,
            options,
            lang,
            text,
            start,
            depth,
            cursor: start,
            stack: vec![],
            seen: HashSet::new(),
            illegal: false,
            entered: IntSet::default(),
            entered_at: start,
        };
        run.enter(ROOT, start);
        run
    }

    fn finish(mut self) -> Highlight<'t> {
        let len = self.text.len();
        // steps taken since the cursor last moved
        let mut stalled = 0;
        let mut stalled_at = self.cursor;
        while self.cursor < len {
            if self.cursor != stalled_at {
                stalled = 0;
                stalled_at = self.cursor;
            }
            stalled += 1;
            let limit = self.options.stall_limit(self.lang.modes.len(), self.stack.len());
            if stalled > limit {
                log::warn!(
                    "{}: no progress after {limit} steps at byte {}, skipping a character",
                    self.lang.name,
                    self.cursor
                );
                self.skip_char();
                continue;
            }
            let Some(candidate) = self.next_event() else {
                self.emit_text(self.cursor, len);
                self.cursor = len;
                break;
            };
            log::trace!(
                "{}: {:?} at {}..{} (depth {})",
                self.lang.name,
                candidate.event,
                candidate.start,
                candidate.end,
                self.stack.len() - 1
            );
            self.emit_text(self.cursor, candidate.start);
            self.cursor = candidate.start;
            self.dispatch(candidate);
        }
        while self.stack.len() > 1 {
            self.close(len);
        }

        let root = self.stack.pop();
        let (children, relevance) = root.map_or((vec![], 0), |f| (f.children, f.relevance));
        Highlight {
            language: self.lang.name.clone(),
            root: Span {
                kind: None,
                range: self.start..len,
                text: &self.text[self.start..len],
                children,
            },
            relevance,
            illegal: self.illegal,
        }
    }

    fn next_event(&mut self) -> Option<Candidate> {
        let lang = self.lang;
        let text = self.text;
        let cursor = self.cursor;
        let top = self.stack.len() - 1;
        let mut best = None;

        let frame = &mut self.stack[top];
        let mode = &lang.modes[frame.mode];
        if let Some(pattern) = &mode.illegal {
            if let Some((start, end)) = probe(&mut frame.slots[ILLEGAL], pattern, text, cursor) {
                pick(&mut best, Candidate { start, end, event: Event::Illegal });
            }
        }

        // The top frame ends on its own end and on that of every ancestor it is chained to
        let mut depth = top;
        loop {
            let frame = &mut self.stack[depth];
            let mode = &lang.modes[frame.mode];
            if let Some(pattern) = &mode.end {
                if let Some((start, end)) = probe(&mut frame.slots[END], pattern, text, cursor) {
                    pick(&mut best, Candidate { start, end, event: Event::End(depth) });
                }
            }
            if depth == 0 || !mode.ends_with_parent {
                break;
            }
            depth -= 1;
        }

        let frame = &mut self.stack[top];
        let mode = &lang.modes[frame.mode];
        if mode.sub_language.is_none() {
            for (i, &child) in mode.contains.iter().enumerate() {
                let found = match &lang.modes[child].begin {
                    Some(pattern) => probe(&mut frame.slots[BEGINS + i], pattern, text, cursor),
                    None => Some((cursor, cursor)),
                };
                if let Some((start, end)) = found {
                    pick(&mut best, Candidate { start, end, event: Event::Begin(child) });
                }
            }
        }
        if top > 0 && mode.ends_implicitly() {
            pick(&mut best, Candidate { start: cursor, end: cursor, event: Event::ImplicitEnd });
        }
        best
    }

    fn dispatch(&mut self, Candidate { start, end, event }: Candidate) {
        let lang = self.lang;
        match event {
            Event::Illegal => {
                self.illegal = true;
                if self.stack.len() > 1 {
                    if let Some(frame) = self.stack.pop() {
                        log::debug!(
                            "{}: illegal /{}/ at byte {start}, dropping {}",
                            lang.name,
                            lang.modes[frame.mode]
                                .illegal
                                .as_ref()
                                .map_or("", Pattern::as_str),
                            lang.modes[frame.mode].label
                        );
                        self.push_plain(frame.start, start);
                    }
                } else if end > start {
                    self.push_plain(start, end);
                    self.cursor = end;
                } else {
                    self.skip_char();
                }
            }
            Event::End(depth) => {
                while self.stack.len() - 1 > depth {
                    self.close(start);
                }
                let mode = &lang.modes[self.stack[depth].mode];
                if mode.return_end {
                    self.close(start);
                } else if mode.exclude_end {
                    self.close(start);
                    self.emit_text(start, end);
                    self.cursor = end;
                } else {
                    self.emit_text(start, end);
                    self.close(end);
                    self.cursor = end;
                }
                if let Some(next) = mode.starts {
                    self.enter(next, self.cursor);
                }
            }
            Event::ImplicitEnd => {
                let mode = &lang.modes[self.stack[self.stack.len() - 1].mode];
                self.close(start);
                if let Some(next) = mode.starts {
                    self.enter(next, self.cursor);
                }
            }
            Event::Begin(child) => {
                if !self.first_entry(child) {
                    log::debug!(
                        "{}: {} would re-enter at byte {start}, skipping a character",
                        lang.name,
                        lang.modes[child].label
                    );
                    self.skip_char();
                    return;
                }
                let mode = &lang.modes[child];
                if mode.return_begin {
                    self.enter(child, start);
                } else if mode.exclude_begin {
                    self.emit_text(start, end);
                    self.enter(child, end);
                    self.cursor = end;
                } else {
                    self.enter(child, start);
                    self.emit_text(start, end);
                    self.cursor = end;
                }
            }
        }
    }

    /// True the first time a mode is entered at the current cursor
    fn first_entry(&mut self, mode: usize) -> bool {
        if self.entered_at != self.cursor {
            self.entered.clear();
            self.entered_at = self.cursor;
        }
        self.entered.insert(mode)
    }

    /// Emit the character at the cursor as plain text and step past it
    fn skip_char(&mut self) {
        let len = self.text.len();
        let step = self.text[self.cursor..]
            .chars()
            .next()
            .map_or(0, char::len_utf8);
        let next = (self.cursor + step).min(len);
        self.push_plain(self.cursor, next);
        self.cursor = if step == 0 { len } else { next };
    }

    fn enter(&mut self, mode: usize, start: usize) {
        let lang = self.lang;
        let compiled = &lang.modes[mode];
        if mode != ROOT {
            log::trace!("{}: enter {} at {start}", lang.name, compiled.label);
        }
        let relevance = if mode == ROOT || compiled.sub_language.is_some() {
            0
        } else {
            compiled.relevance
        };
        self.stack.push(Frame {
            mode,
            start,
            children: vec![],
            relevance,
            slots: vec![None; BEGINS + compiled.contains.len()],
        });
    }

    /// Pop the top frame, ending it at `end`, and hand its span to the parent
    fn close(&mut self, end: usize) {
        if self.stack.len() < 2 {
            return;
        }
        let Some(mut frame) = self.stack.pop() else {
            return;
        };
        let lang = self.lang;
        let mode = &lang.modes[frame.mode];
        log::trace!("{}: leave {} at {end}", lang.name, mode.label);
        let end = end.max(frame.start);
        if let Some(language) = &mode.sub_language {
            frame.children = self.sub_language(
                language,
                frame.start..end,
                mode.relevance,
                &mut frame.relevance,
            );
        }
        if let Some(parent) = self.stack.last_mut() {
            parent.relevance += frame.relevance;
        }
        self.adopt(Span {
            kind: mode.class.clone(),
            range: frame.start..end,
            text: &self.text[frame.start..end],
            children: frame.children,
        });
    }

    /// Attach a closed span to the top frame
    fn adopt(&mut self, span: Span<'t>) {
        if span.kind.is_none() {
            for child in span.children {
                if child.is_plain() {
                    self.push_plain(child.range.start, child.range.end);
                } else if let Some(frame) = self.stack.last_mut() {
                    frame.children.push(child);
                }
            }
        } else if !span.range.is_empty() {
            if let Some(frame) = self.stack.last_mut() {
                frame.children.push(span);
            }
        }
    }

    /// Tokenize the body of a sub-language frame.
    /// Falls back to one plain leaf when the language is unknown or nesting is too deep.
    fn sub_language(
        &self,
        language: &SubLanguage,
        range: Range<usize>,
        weight: u32,
        relevance: &mut u32,
    ) -> Vec<Span<'t>> {
        if range.is_empty() {
            return vec![];
        }
        let plain = vec![Span::leaf(None, range.clone(), &self.text[range.clone()])];
        if self.depth >= self.options.max_sub_language_depth {
            log::debug!(
                "{}: sub-language nesting deeper than {}, bytes {range:?} left plain",
                self.lang.name,
                self.options.max_sub_language_depth
            );
            return plain;
        }
        let resolver = self.resolver;
        let result = match language {
            SubLanguage::Named(name) => match resolver.resolve_language(name) {
                Some(lang) => Some(self.nested(lang, &range)),
                None => {
                    log::debug!("{}: sub-language {name} is not available", self.lang.name);
                    None
                }
            },
            SubLanguage::Auto(names) => {
                let names = if names.is_empty() {
                    resolver.language_names()
                } else {
                    names.iter().map(String::as_str).collect()
                };
                let mut best: Option<Highlight<'t>> = None;
                for name in names {
                    let Some(lang) = resolver.resolve_language(name) else {
                        continue;
                    };
                    let candidate = self.nested(lang, &range);
                    if best.as_ref().map_or(true, |b| score(&candidate) > score(b)) {
                        best = Some(candidate);
                    }
                }
                best
            }
        };
        match result {
            Some(result) => {
                if weight > 0 {
                    *relevance += result.relevance;
                }
                vec![Span {
                    kind: Some(result.language),
                    range: range.clone(),
                    text: &self.text[range],
                    children: result.root.children,
                }]
            }
            None => plain,
        }
    }

    fn nested(&self, lang: &CompiledLanguage, range: &Range<usize>) -> Highlight<'t> {
        Run::new(
            self.resolver,
            self.options,
            lang,
            &self.text[..range.end],
            range.start,
            self.depth + 1,
        )
        .finish()
    }

    /// Classify the text between two positions into the top frame
    fn emit_text(&mut self, from: usize, to: usize) {
        if from >= to {
            return;
        }
        let lang = self.lang;
        let text = self.text;
        let Some(top) = self.stack.last() else {
            return;
        };
        if lang.modes[top.mode].sub_language.is_some() {
            return;
        }
        let table: Option<&KeywordTable> = self
            .stack
            .iter()
            .rev()
            .find_map(move |frame| lang.modes[frame.mode].keywords.as_deref());
        let Some(table) = table.filter(|t| !t.is_empty()) else {
            self.push_plain(from, to);
            return;
        };

        let mut last = from;
        for word in lang.lexemes.find_iter(&text[from..to]) {
            let lookup = if lang.case_insensitive {
                Cow::Owned(word.as_str().to_lowercase())
            } else {
                Cow::Borrowed(word.as_str())
            };
            let Some(keyword) = table.get(&lookup) else {
                continue;
            };
            let (start, end) = (from + word.start(), from + word.end());
            self.push_plain(last, start);
            let first_time = self.seen.insert(lookup.into_owned());
            if let Some(frame) = self.stack.last_mut() {
                if first_time {
                    frame.relevance += keyword.relevance;
                }
                frame.children.push(Span::leaf(
                    Some(keyword.class.to_string()),
                    start..end,
                    &text[start..end],
                ));
            }
            last = end;
        }
        self.push_plain(last, to);
    }

    /// Append unclassified text to the top frame, merging with a preceding plain leaf
    fn push_plain(&mut self, from: usize, to: usize) {
        if from >= to {
            return;
        }
        let text = self.text;
        let Some(frame) = self.stack.last_mut() else {
            return;
        };
        if_chain! {
            if let Some(last) = frame.children.last_mut();
            if last.is_plain();
            if last.range.end == from;
            then {
                last.range.end = to;
                last.text = &text[last.range.start..to];
                return;
            }
        }
        frame.children.push(Span::leaf(None, from..to, &text[from..to]));
    }
}

/// Ranking used to pick between candidate languages, results with illegal matches lose
pub(crate) fn score(result: &Highlight<'_>) -> u32 {
    if result.illegal {
        0
    } else {
        result.relevance
    }
}
