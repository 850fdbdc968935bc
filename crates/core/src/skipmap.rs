//! Pairs each `[` position in a [`StructuralIndex`] with the index of its
//! matching `]`, so later stages can jump from an array's open bracket to its
//! close in O(1) instead of re-scanning.

use crate::index::StructuralIndex;

/// `entries[i]` is the index (not byte offset) of the matching `]` for the
/// `[` at `index[i]`, or `0` (sentinel) if `index[i]` is not `[` or has no
/// match.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SkipMap {
    entries: Vec<usize>,
}

impl SkipMap {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn get(&self, i: usize) -> usize {
        self.entries[i]
    }
}

/// Build the skip-map for `index` over `buf`.
///
/// Unmatched `]` on an empty stack is ignored; an unmatched `[` left on the
/// stack at EOF keeps its sentinel `0` entry (the locator simply never
/// consumes it, since a 0 close-index can't form a valid slice).
pub fn build(index: &StructuralIndex, buf: &[u8]) -> SkipMap {
    let mut entries = vec![0usize; index.len()];
    let mut stack: Vec<usize> = Vec::new();

    for i in 0..index.len() {
        let pos = index.get(i);
        match buf[pos] {
            b'[' => stack.push(i),
            b']' => {
                if let Some(open) = stack.pop() {
                    entries[open] = i;
                }
            }
            _ => {}
        }
    }

    SkipMap { entries }
}
