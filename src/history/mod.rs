#[cfg(test)]
mod tests;

/// One completed exchange. The answer is the raw completion text, without
/// the citation footer, so stored history does not bloat future prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
}

/// Append-only session log of conversation turns. Turns are never evicted
/// within a session; prompts only ever see the most recent window via
/// [`History::recent`]. Sessions are not persisted across process runs.
#[derive(Debug, Clone, Default)]
pub struct History {
    turns: Vec<ConversationTurn>,
}

impl History {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn append(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(ConversationTurn {
            question: question.into(),
            answer: answer.into(),
        });
    }

    /// Up to the `n` most recent turns, oldest-first within the window.
    #[inline]
    pub fn recent(&self, n: usize) -> &[ConversationTurn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
