use std::sync::atomic::{AtomicUsize, Ordering};
use tandem_core::PairIndex;

const NONE: usize = usize::MAX;

/// Which pair's remote stream is on screen. Starts out with nothing selected.
///
/// Shared by every pair's event loop; only the sync controller writes it.
#[derive(Debug)]
pub struct SelectionState {
    selected: AtomicUsize,
}

impl SelectionState {
    pub fn new() -> Self {
        Self {
            selected: AtomicUsize::new(NONE),
        }
    }

    pub fn get(&self) -> Option<PairIndex> {
        match self.selected.load(Ordering::Acquire) {
            NONE => None,
            index => Some(PairIndex(index)),
        }
    }

    pub fn is_selected(&self, pair: PairIndex) -> bool {
        self.selected.load(Ordering::Acquire) == pair.get()
    }

    /// Returns `false` for the one index that cannot be stored, `usize::MAX`,
    /// which encodes "nothing selected".
    pub(crate) fn select(&self, pair: PairIndex) -> bool {
        if pair.get() == NONE {
            return false;
        }
        self.selected.store(pair.get(), Ordering::Release);
        true
    }
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new()
    }
}
