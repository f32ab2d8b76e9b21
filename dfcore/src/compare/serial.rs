//! Serial numbering of values.
//!
//! Each side of a comparison numbers its values in order of first
//! appearance; two non-constant values match when they got the same number.
//! Numbers are handed out from an append-only log, so entries can only be
//! removed from the end and a number always equals the log position.
use std::collections::HashMap;

use dfinstr::modules::operand::{Label, Name};

/// Identity of a numbered value inside one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKey {
    /// A parameter or an instruction result.
    Reg(Name),
    /// A basic block.
    Lbl(Label),
    /// An operation without result, by position.
    Site(Label, usize),
}

/// Position in the log a map can be rolled back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

#[derive(Debug, Default, Clone)]
pub struct SerialMap {
    indices: HashMap<ValueKey, usize>,
    log: Vec<ValueKey>,
}

impl SerialMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `key`, assigning the next one on first appearance.
    pub fn number(&mut self, key: ValueKey) -> usize {
        if let Some(index) = self.indices.get(&key) {
            return *index;
        }
        let index = self.log.len();
        self.indices.insert(key, index);
        self.log.push(key);
        index
    }

    pub fn get(&self, key: ValueKey) -> Option<usize> {
        self.indices.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.log.len())
    }

    /// Forget every number assigned after `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        while self.log.len() > checkpoint.0 {
            if let Some(key) = self.log.pop() {
                self.indices.remove(&key);
            }
        }
    }

    /// Forget `key` if it holds the most recent number.
    pub fn remove_if_last(&mut self, key: ValueKey) -> bool {
        if self.log.last() != Some(&key) {
            return false;
        }
        self.log.pop();
        self.indices.remove(&key);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_appearance_order() {
        let mut map = SerialMap::new();
        assert_eq!(map.number(ValueKey::Reg(Name(7))), 0);
        assert_eq!(map.number(ValueKey::Lbl(Label(2))), 1);
        assert_eq!(map.number(ValueKey::Reg(Name(7))), 0);
        assert_eq!(map.number(ValueKey::Site(Label(2), 3)), 2);
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(ValueKey::Lbl(Label(2))), Some(1));
    }

    #[test]
    fn test_rollback_and_pop() {
        let mut map = SerialMap::new();
        map.number(ValueKey::Reg(Name(0)));
        let checkpoint = map.checkpoint();
        map.number(ValueKey::Reg(Name(1)));
        map.number(ValueKey::Lbl(Label(1)));

        assert!(!map.remove_if_last(ValueKey::Reg(Name(1))));
        assert!(map.remove_if_last(ValueKey::Lbl(Label(1))));
        assert_eq!(map.len(), 2);

        map.rollback(checkpoint);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(ValueKey::Reg(Name(1))), None);
        // Numbers handed out after a rollback reuse the freed positions.
        assert_eq!(map.number(ValueKey::Reg(Name(5))), 1);
    }
}
