use std::ops::Range;
use unicode_width::UnicodeWidthChar;

/// A node of the highlighted output.
///
/// Leaves are runs of text that are either plain (`kind` is `None`) or classified by a
/// keyword table. Inner nodes mirror the modes that were active and carry the mode's
/// classification. `range` is a byte range into the text given to the tokenizer and
/// `text` is that exact slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span<'t> {
    pub kind: Option<String>,
    pub range: Range<usize>,
    pub text: &'t str,
    pub children: Vec<Span<'t>>,
}

impl<'t> Span<'t> {
    pub(crate) fn leaf(kind: Option<String>, range: Range<usize>, text: &'t str) -> Self {
        Self {
            kind,
            range,
            text,
            children: vec![],
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Unclassified leaf
    pub fn is_plain(&self) -> bool {
        self.kind.is_none() && self.children.is_empty()
    }

    /// Depth first iterator over the leaves of this span
    pub fn leaves(&self) -> Leaves<'_, 't> {
        Leaves { stack: vec![self] }
    }

    /// Flatten into runs of text, each tagged with its innermost classification
    pub fn tokens(&self) -> Vec<TokOpt> {
        let mut result = vec![];
        flatten(self, None, &mut result);
        result
    }
}

/// Iterator returned by [Span::leaves]
pub struct Leaves<'a, 't> {
    stack: Vec<&'a Span<'t>>,
}

impl<'a, 't> Iterator for Leaves<'a, 't> {
    type Item = &'a Span<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(span) = self.stack.pop() {
            if span.is_leaf() {
                return Some(span);
            }
            self.stack.extend(span.children.iter().rev());
        }
        None
    }
}

/// The result of tokenizing a piece of text with one language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight<'t> {
    /// Name of the language that produced this result
    pub language: String,
    /// Unclassified span covering the whole input
    pub root: Span<'t>,
    /// How well the language fits the text, used for auto-detection
    pub relevance: u32,
    /// Whether an illegal pattern fired anywhere
    pub illegal: bool,
}

impl<'t> Highlight<'t> {
    /// The text that was highlighted
    pub fn text(&self) -> &'t str {
        self.root.text
    }

    pub fn leaves(&self) -> Leaves<'_, 't> {
        self.root.leaves()
    }

    /// See [Span::tokens]
    pub fn tokens(&self) -> Vec<TokOpt> {
        self.root.tokens()
    }

    /// Flat tokens split into lines, newline characters are dropped
    pub fn lines(&self) -> Vec<Vec<TokOpt>> {
        let mut lines = vec![];
        let mut line = vec![];
        for token in self.tokens() {
            let (TokOpt::Some(text, _) | TokOpt::None(text)) = &token;
            let mut pieces = text.split('\n').peekable();
            while let Some(piece) = pieces.next() {
                if !piece.is_empty() {
                    line.push(token.with_text(piece));
                }
                if pieces.peek().is_some() {
                    lines.push(std::mem::take(&mut line));
                }
            }
        }
        lines.push(line);
        lines
    }
}

/// This is an enum for representing flattened tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokOpt {
    /// Classified text in the format Some(TEXT, KIND)
    ///
    /// So for a comment you can expect to see Some("# comment", "comment")
    Some(String, String),
    /// Plain text
    None(String),
}

impl TokOpt {
    /// Works out if this token is empty, and thus redundant
    pub fn is_empty(&self) -> bool {
        let (TokOpt::Some(text, _) | TokOpt::None(text)) = self;
        text.is_empty()
    }

    pub fn text(&self) -> &str {
        let (TokOpt::Some(text, _) | TokOpt::None(text)) = self;
        text
    }

    /// This will remove the first character from the start of this token.
    /// A double width character is replaced by a space so the remaining column stays filled.
    pub fn nibble(&mut self) -> Option<char> {
        let (TokOpt::Some(ref mut text, _) | TokOpt::None(ref mut text)) = self;
        let ch = text.chars().next()?;
        text.remove(0);
        if ch.width().unwrap_or(0) > 1 {
            text.insert(0, ' ');
        }
        Some(ch)
    }

    fn with_text(&self, text: &str) -> TokOpt {
        match self {
            TokOpt::Some(_, kind) => TokOpt::Some(text.to_string(), kind.clone()),
            TokOpt::None(_) => TokOpt::None(text.to_string()),
        }
    }
}

/// Trim utility function to cut `start` display columns off the front of a line of tokens
pub fn trim(input: &[TokOpt], start: usize) -> Vec<TokOpt> {
    let mut opt: Vec<TokOpt> = input.to_vec();
    let mut remaining = start;
    while remaining > 0 {
        let Some(token) = opt.first_mut() else {
            break;
        };
        if let Some(ch) = token.nibble() {
            if ch.width().unwrap_or(0) > 0 {
                remaining -= 1;
            }
        }
        if token.is_empty() {
            opt.remove(0);
        }
    }
    opt
}

fn flatten(span: &Span<'_>, inherited: Option<&str>, out: &mut Vec<TokOpt>) {
    let kind = span.kind.as_deref().or(inherited);
    if !span.is_leaf() {
        for child in &span.children {
            flatten(child, kind, out);
        }
        return;
    }
    if span.text.is_empty() {
        return;
    }
    match (out.last_mut(), kind) {
        (Some(TokOpt::Some(text, last)), Some(kind)) if last == kind => text.push_str(span.text),
        (Some(TokOpt::None(text)), None) => text.push_str(span.text),
        (_, Some(kind)) => out.push(TokOpt::Some(span.text.to_string(), kind.to_string())),
        (_, None) => out.push(TokOpt::None(span.text.to_string())),
    }
}
