use std::collections::VecDeque;
use tracing::debug;

use crate::models::{Role, Turn};

/// Entries rendered into the prompt context (three user/bot exchanges).
pub const CONTEXT_WINDOW: usize = 6;

/// Bounded, insertion-ordered conversation log.
///
/// Holds at most `2 * max_turns` entries; the oldest are dropped first.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    max_turns: usize,
    history: VecDeque<Turn>,
}

impl ConversationMemory {
    pub fn new(max_turns: usize) -> Self {
        Self {
            max_turns,
            history: VecDeque::new(),
        }
    }

    pub fn add_user_message(&mut self, message: &str) {
        self.push(Turn::new(Role::User, message));
    }

    pub fn add_bot_message(&mut self, message: &str) {
        self.push(Turn::new(Role::Bot, message));
    }

    fn push(&mut self, turn: Turn) {
        self.history.push_back(turn);
        self.trim_history();
    }

    fn trim_history(&mut self) {
        let capacity = self.capacity();
        while self.history.len() > capacity {
            self.history.pop_front();
        }
    }

    /// Recent history as `Role: content` lines, oldest first.
    pub fn context_string(&self) -> String {
        let skip = self.history.len().saturating_sub(CONTEXT_WINDOW);
        self.history
            .iter()
            .skip(skip)
            .map(Turn::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn all_turns(&self) -> impl ExactSizeIterator<Item = &Turn> + '_ {
        self.history.iter()
    }

    /// Empties the log and returns how many entries were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.history.len();
        self.history.clear();
        debug!("Cleared {} turns from memory", dropped);
        dropped
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_turns.saturating_mul(2)
    }
}
