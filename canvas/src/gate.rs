//! Echo suppression.
//!
//! The reconciler marks an instance right before applying a remote change to
//! it. The observer's next look at that instance reads and clears the mark in
//! one step and, finding it set, does not publish. Marks live in a side table
//! keyed by [`InstanceKey`], so a replacement instance never inherits one.

use std::collections::HashSet;

use crate::doc::InstanceKey;

#[derive(Debug, Default)]
pub struct EchoGate {
    suppressed: HashSet<InstanceKey>,
}

impl EchoGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_suppressed(&mut self, key: InstanceKey) {
        self.suppressed.insert(key);
    }

    /// Return whether `key` was marked, clearing the mark unconditionally.
    pub fn is_suppressed_and_clear(&mut self, key: InstanceKey) -> bool {
        self.suppressed.remove(&key)
    }

    /// Drop every remaining mark and return how many there were.
    pub fn purge(&mut self) -> usize {
        let n = self.suppressed.len();
        self.suppressed.clear();
        n
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.suppressed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::{CanvasObject, DocStore, Style};

    fn keys(n: usize) -> Vec<InstanceKey> {
        let mut doc = DocStore::new();
        (0..n)
            .map(|_| doc.insert(CanvasObject::rect(0.0, 0.0, 1.0, 1.0, Style::default())))
            .collect()
    }

    #[test]
    fn fresh_instances_are_not_suppressed() {
        let mut gate = EchoGate::new();
        let k = keys(1);
        assert!(!gate.is_suppressed_and_clear(k[0]));
    }

    #[test]
    fn read_clears_the_mark() {
        let mut gate = EchoGate::new();
        let k = keys(1);
        gate.mark_suppressed(k[0]);
        assert!(gate.is_suppressed_and_clear(k[0]));
        assert!(!gate.is_suppressed_and_clear(k[0]));
        assert!(gate.is_empty());
    }

    #[test]
    fn marks_are_per_instance() {
        let mut gate = EchoGate::new();
        let k = keys(2);
        gate.mark_suppressed(k[0]);
        assert!(!gate.is_suppressed_and_clear(k[1]));
        assert!(gate.is_suppressed_and_clear(k[0]));
    }

    #[test]
    fn purge_drops_leftover_marks() {
        let mut gate = EchoGate::new();
        let k = keys(3);
        gate.mark_suppressed(k[0]);
        gate.mark_suppressed(k[2]);
        assert_eq!(gate.purge(), 2);
        assert!(gate.is_empty());
        assert_eq!(gate.purge(), 0);
    }
}
