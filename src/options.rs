/// Limits applied while tokenizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// How deeply sub-language regions may nest before their body is left as plain text
    pub max_sub_language_depth: usize,
    /// Steps allowed without the cursor moving before a character is skipped.
    /// Never lower than what the grammar's shape needs, see [Options::loop_guard()]
    pub loop_guard: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_sub_language_depth: 8,
            loop_guard: 1_000,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_sub_language_depth(mut self, depth: usize) -> Self {
        self.max_sub_language_depth = depth;
        self
    }

    /// A grammar with `modes` compiled modes can open and close every mode at one
    /// position, so the effective limit is raised to `2 × modes × (depth + 2)` when
    /// that is larger.
    pub fn loop_guard(mut self, steps: usize) -> Self {
        self.loop_guard = steps;
        self
    }

    /// Steps allowed at one cursor position with `depth` frames open
    pub(crate) fn stall_limit(&self, modes: usize, depth: usize) -> usize {
        let shape = modes.saturating_mul(depth + 2).saturating_mul(2);
        self.loop_guard.max(shape)
    }
}
