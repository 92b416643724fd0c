//! Position-key history for repetition detection.
//!
//! Keys are appended on every make (null moves included) and dropped on undo.
//! Only the tail since the last irreversible move can repeat, and the board
//! passes that length in from its half-move clock.

#[derive(Debug, Clone, Default)]
pub struct RepetitionTracker {
    keys: Vec<u64>,
}

impl RepetitionTracker {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn push(&mut self, key: u64) {
        self.keys.push(key);
    }

    #[inline]
    pub fn pop(&mut self) {
        self.keys.pop();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Occurrences of `key` with the same side to move among the last
    /// `window` entries. The newest entry is the current position.
    pub fn count(&self, key: u64, window: usize) -> usize {
        let start = self.keys.len().saturating_sub(window);
        self.keys[start..]
            .iter()
            .rev()
            .step_by(2)
            .filter(|&&k| k == key)
            .count()
    }
}
