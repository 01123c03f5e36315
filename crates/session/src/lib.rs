//! In-memory conversation history
//!
//! Each chat session keeps a bounded list of `{role, content}` turns; the
//! oldest turns are evicted first. Nothing is written to disk.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Default maximum number of turns kept per session
pub const DEFAULT_MAX_TURNS: usize = 50;

/// One conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Role: user, assistant, system
    pub role: String,
    pub content: String,
}

impl Turn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// Bounded, ordered turn buffer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
    max_turns: usize,
    pub created_at: DateTime<Local>,
    pub updated_at: DateTime<Local>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::with_max_turns(DEFAULT_MAX_TURNS)
    }

    pub fn with_max_turns(max_turns: usize) -> Self {
        let now = Local::now();
        Self {
            turns: Vec::new(),
            max_turns,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append one turn, evicting the oldest past the limit
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.updated_at = Local::now();
        self.enforce_max_turns();
    }

    /// Append a user query and the answer it produced
    pub fn record_exchange(&mut self, query: impl Into<String>, answer: impl Into<String>) {
        self.push(Turn::user(query));
        self.push(Turn::assistant(answer));
    }

    fn enforce_max_turns(&mut self) {
        if self.turns.len() > self.max_turns {
            let to_remove = self.turns.len() - self.max_turns;
            self.turns.drain(0..to_remove);
            debug!("History truncated to {} turns", self.turns.len());
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Most recent `n` turns, oldest first
    pub fn last(&self, n: usize) -> &[Turn] {
        &self.turns[self.turns.len().saturating_sub(n)..]
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn clear(&mut self) {
        self.turns.clear();
        self.updated_at = Local::now();
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// Histories keyed by session id
pub struct SessionStore {
    sessions: HashMap<String, ConversationHistory>,
    max_turns: usize,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_max_turns(DEFAULT_MAX_TURNS)
    }

    pub fn with_max_turns(max_turns: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            max_turns,
        }
    }

    /// Fresh random session id
    pub fn new_session_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn get(&self, key: &str) -> Option<&ConversationHistory> {
        self.sessions.get(key)
    }

    pub fn get_or_create(&mut self, key: &str) -> &mut ConversationHistory {
        let max_turns = self.max_turns;
        self.sessions
            .entry(key.to_string())
            .or_insert_with(|| ConversationHistory::with_max_turns(max_turns))
    }

    /// Empty a session's history; returns false for unknown sessions
    pub fn clear(&mut self, key: &str) -> bool {
        match self.sessions.get_mut(key) {
            Some(history) => {
                history.clear();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.sessions.remove(key).is_some()
    }

    /// Session ids, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.sessions.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_order() {
        let mut history = ConversationHistory::new();
        history.push(Turn::user("a"));
        history.push(Turn::assistant("b"));
        assert_eq!(history.turns()[0], Turn::user("a"));
        assert_eq!(history.turns()[1], Turn::assistant("b"));
    }

    #[test]
    fn test_eviction_drops_oldest() {
        let mut history = ConversationHistory::with_max_turns(3);
        for i in 0..5 {
            history.push(Turn::user(format!("m{}", i)));
        }
        let contents: Vec<&str> = history.turns().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn test_last_saturates() {
        let mut history = ConversationHistory::new();
        history.record_exchange("q", "a");
        assert_eq!(history.last(10).len(), 2);
        assert_eq!(history.last(1), &[Turn::assistant("a")]);
        assert!(history.last(0).is_empty());
    }
}
