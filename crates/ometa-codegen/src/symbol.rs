// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Fresh symbols for lowered rules.
//!
//! Every intermediate value gets its own slot, and every deferred operand
//! its own thunk id. Numbers are unique within one rule; the kind label
//! only makes listings readable.

use std::fmt;

/// A value slot in a rule's frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    index: u32,
    kind: &'static str,
}

impl Slot {
    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn kind(self) -> &'static str {
        self.kind
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}{}", self.kind, self.index)
    }
}

/// A thunk within one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThunkId {
    index: u32,
    kind: &'static str,
}

impl ThunkId {
    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn kind(self) -> &'static str {
        self.kind
    }
}

impl fmt::Display for ThunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.index)
    }
}

/// Issues slots and thunk ids for one rule. Slot and thunk numbering are
/// independent.
#[derive(Debug, Default)]
pub struct SymbolAllocator {
    next_slot: u32,
    next_thunk: u32,
}

impl SymbolAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&mut self, kind: &'static str) -> Slot {
        let slot = Slot {
            index: self.next_slot,
            kind,
        };
        self.next_slot += 1;
        slot
    }

    pub fn thunk(&mut self, kind: &'static str) -> ThunkId {
        let id = ThunkId {
            index: self.next_thunk,
            kind,
        };
        self.next_thunk += 1;
        id
    }

    pub fn slot_count(&self) -> usize {
        self.next_slot as usize
    }

    pub fn thunk_count(&self) -> usize {
        self.next_thunk as usize
    }
}
