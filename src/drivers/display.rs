//! Bounded display history.
//!
//! The device screen shows the last few actuator messages, newest on top.
//! [`DisplayHistory`] keeps at most `N` entries in a stack-allocated ring
//! and renders them as one text block:
//!
//! ```text
//! append("a") append("b") append("c") append("d")   (N = 3)
//!
//!   d\n
//!   c\n
//!   b\n        ← "a" evicted
//! ```

use heapless::Deque;

/// Default number of lines the device display holds.
pub const DISPLAY_LINES: usize = 3;

/// FIFO-evicting history of display texts.
#[derive(Debug, Clone)]
pub struct DisplayHistory<const N: usize = DISPLAY_LINES> {
    entries: Deque<String, N>,
}

impl<const N: usize> DisplayHistory<N> {
    pub fn new() -> Self {
        Self {
            entries: Deque::new(),
        }
    }

    /// Append `text`, evicting the oldest entry when full, and return the
    /// rendered block.
    pub fn append(&mut self, text: &str) -> String {
        if self.entries.is_full() {
            self.entries.pop_front();
        }
        // Cannot fail: a slot was freed above when the ring was full.
        let _ = self.entries.push_back(text.to_owned());
        self.render()
    }

    /// Entries newest first, each terminated by a line break.
    pub fn render(&self) -> String {
        let mut block = String::new();
        for entry in self.entries.iter().rev() {
            block.push_str(entry);
            block.push('\n');
        }
        block
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for DisplayHistory<N> {
    fn default() -> Self {
        Self::new()
    }
}
