//! The cursor: a lightweight handle to a position in a [`Machine`], used
//! while scanning.
//!
//! A cursor borrows its machine (`&'m Machine<..>`) rather than owning any
//! resources of its own, so resetting is O(1) and many cursors — even from
//! different threads — may coexist over the same machine. Because
//! `register`/`unregister` require `&mut Machine`, the borrow checker
//! refuses to compile code that would mutate a machine while a cursor
//! borrowed from it is still alive, turning the spec's "no mutation
//! concurrent with any cursor use" contract into a compile error instead of
//! a runtime obligation.

use crate::automaton::Machine;
use crate::error::{fatal, CoreError};
use crate::failure::goto;
use crate::state_id::StateID;
use crate::symbol::SymbolOps;

/// A position in a [`Machine`]'s goto graph.
pub struct Cursor<'m, T, V, O, S: StateID> {
    machine: &'m Machine<T, V, O, S>,
    state: S,
}

impl<'m, T, V, O, S: StateID> Cursor<'m, T, V, O, S> {
    pub(crate) fn new(machine: &'m Machine<T, V, O, S>) -> Self {
        Cursor {
            machine,
            state: machine.trie.root_id(),
        }
    }

    /// Resets this cursor back to the root, in place.
    pub fn reset(&mut self) {
        self.state = self.machine.trie.root_id();
    }
}

impl<'m, T, V, O, S> Cursor<'m, T, V, O, S>
where
    O: SymbolOps<T>,
    S: StateID,
{
    /// Advances the cursor by one symbol and returns the number of
    /// keywords matching as a suffix of everything fed so far.
    ///
    /// Triggers a failure-layer rebuild (under the machine's internal lock)
    /// if one is pending; this is the only place that lock is ever taken.
    pub fn feed(&mut self, symbol: &T) -> usize {
        self.machine.ensure_rebuilt();
        self.state = goto(&self.machine.trie, self.state, symbol, &self.machine.ops);
        self.machine.trie.output_count(self.state)
    }

    /// Returns the rank of the `index`-th (0-based) keyword matching at the
    /// cursor's current position, walking the fail chain and counting
    /// terminal states. If `out_keyword` is given, the matching keyword's
    /// symbols are appended to it in order.
    ///
    /// `index` must be strictly less than the match count last returned by
    /// [`Cursor::feed`]; an out-of-range index is a fatal contract
    /// violation, not a recoverable error.
    pub fn match_at(&self, index: usize, out_keyword: Option<&mut Vec<T>>) -> usize {
        let root = self.machine.trie.root_id();
        let mut cur = self.state;
        let mut seen = 0usize;
        loop {
            if self.machine.trie.is_terminal(cur) {
                if seen == index {
                    if let Some(buf) = out_keyword {
                        self.machine
                            .trie
                            .reconstruct_keyword(cur, &self.machine.ops, buf);
                    }
                    return self.machine.trie.rank(cur);
                }
                seen += 1;
            }
            if cur == root {
                break;
            }
            cur = self.machine.trie.fail(cur);
        }
        fatal(CoreError::MatchIndexOutOfRange {
            index,
            available: seen,
        })
    }

    /// Returns the value associated with the `index`-th matching keyword at
    /// the cursor's current position, same indexing as [`Cursor::match_at`].
    pub fn value_at(&self, index: usize) -> Option<&'m V> {
        let root = self.machine.trie.root_id();
        let mut cur = self.state;
        let mut seen = 0usize;
        loop {
            if self.machine.trie.is_terminal(cur) {
                if seen == index {
                    return self.machine.trie.value(cur);
                }
                seen += 1;
            }
            if cur == root {
                break;
            }
            cur = self.machine.trie.fail(cur);
        }
        fatal(CoreError::MatchIndexOutOfRange {
            index,
            available: seen,
        })
    }
}

impl<'m, T, V, O, S: StateID> Clone for Cursor<'m, T, V, O, S> {
    fn clone(&self) -> Self {
        Cursor {
            machine: self.machine,
            state: self.state,
        }
    }
}

impl<'m, T, V, O, S: StateID> std::fmt::Debug for Cursor<'m, T, V, O, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor").field("state", &self.state).finish()
    }
}
