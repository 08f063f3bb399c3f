//! The automaton controller: the public surface over a [`Trie`] and its
//! failure layer — registration, removal, lookup, enumeration, and the
//! lazy-rebuild bookkeeping that `feed` relies on.

use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::Mutex;

use crate::cursor::Cursor;
use crate::error::fatal;
use crate::failure::{rebuild, Reconstruct};
use crate::state_id::StateID;
use crate::symbol::SymbolOps;
use crate::trie::Trie;

/// A generic, mutable Aho–Corasick automaton.
///
/// `T` is the symbol type, `V` the per-keyword value type, `O` the operator
/// bundle ([`SymbolOps`]) used to compare and copy symbols, and `S` the
/// integer width used for state identifiers (see [`crate::StateID`]).
///
/// Keywords may be registered and unregistered between searches; the
/// failure layer is rebuilt lazily, the first time [`Cursor::feed`] is
/// called after a mutation. `register`/`unregister` take `&mut self` and so
/// cannot be called while any [`Cursor`] (which borrows the machine) is
/// alive — the borrow checker promotes the "mutating ops are not safe
/// concurrent with anything" contract to a compile-time guarantee.
pub struct Machine<T, V, O = crate::symbol::StdOps, S = usize>
where
    S: StateID,
{
    pub(crate) trie: Trie<T, V, S>,
    pub(crate) ops: O,
    next_rank: usize,
    keyword_count: usize,
    reconstruct: AtomicU8,
    rebuild_lock: Mutex<()>,
}

impl<T, V, O, S> Machine<T, V, O, S>
where
    O: SymbolOps<T>,
    S: StateID,
{
    /// Creates a fresh machine whose only state is the root, using `ops`
    /// as the symbol operator bundle.
    pub fn with_ops(ops: O) -> Self {
        Machine {
            trie: Trie::new(),
            ops,
            next_rank: 0,
            keyword_count: 0,
            // first feed always rebuilds, even though there is nothing to
            // reset yet; matches "reconstruct = STRUCTURAL" at creation.
            reconstruct: AtomicU8::new(Reconstruct::Structural as u8),
            rebuild_lock: Mutex::new(()),
        }
    }

    /// Registers `keyword` with an optional associated `value`.
    ///
    /// Returns `false` (and drops `value`, running its destructor exactly
    /// once) if `keyword` is empty or already registered; the pre-existing
    /// rank and value are left untouched in that case. Otherwise assigns a
    /// fresh, monotonically increasing rank and returns `true`.
    pub fn register(&mut self, keyword: &[T], value: Option<V>) -> bool {
        if keyword.is_empty() {
            drop(value);
            return false;
        }

        let (mut cur, consumed) = self.trie.walk_prefix(keyword, &self.ops);
        for sym in &keyword[consumed..] {
            cur = self
                .trie
                .alloc_child(cur, sym, &self.ops)
                .unwrap_or_else(|e| fatal(e));
        }

        if self.trie.is_terminal(cur) {
            drop(value);
            return false;
        }

        self.trie.set_value(cur, value);
        self.trie.set_terminal(cur, true);
        self.trie.set_output_count(cur, 1);
        let rank = self.next_rank;
        self.next_rank += 1;
        self.trie.set_rank(cur, rank);
        self.keyword_count += 1;
        self.mark_dirty();

        tracing::trace!(rank, len = keyword.len(), "registered keyword");
        true
    }

    /// Removes `keyword` if it is currently registered, running its
    /// value's destructor exactly once. Returns `false` if it was absent.
    ///
    /// `next_rank` is never decremented: re-registering the same keyword
    /// text gets a fresh, strictly greater rank.
    pub fn unregister(&mut self, keyword: &[T]) -> bool {
        let Some(state) = self.trie.locate(keyword, &self.ops) else {
            return false;
        };

        self.keyword_count -= 1;
        if !self.trie.edges(state).is_empty() {
            // Soft removal: the state stays (it roots other keywords), but
            // it is no longer terminal. The old rank is forgotten rather
            // than guaranteed stable across this mutation.
            self.trie.take_value(state);
            self.trie.set_terminal(state, false);
            self.trie.set_output_count(state, 0);
            self.trie.set_rank(state, 0);
        } else {
            self.trie.prune_from_leaf(state, &self.ops);
        }
        self.mark_dirty();

        tracing::trace!(len = keyword.len(), "unregistered keyword");
        true
    }

    /// Returns `true` if `keyword` is currently registered.
    pub fn is_registered(&self, keyword: &[T]) -> bool {
        self.trie.locate(keyword, &self.ops).is_some()
    }

    /// Returns the value associated with `keyword`, if it is currently
    /// registered and was given one.
    pub fn value_of(&self, keyword: &[T]) -> Option<&V> {
        self.trie.locate(keyword, &self.ops).and_then(|s| self.trie.value(s))
    }

    /// The number of currently registered keywords.
    pub fn keyword_count(&self) -> usize {
        self.keyword_count
    }

    /// The total number of live states, including the root.
    pub fn state_count(&self) -> usize {
        self.trie.len()
    }

    /// Invokes `f` once for every currently registered keyword, with its
    /// symbols (in order) and its value. Traversal order is unspecified.
    pub fn foreach_keyword<F>(&self, f: F)
    where
        F: FnMut(&[T], Option<&V>),
    {
        self.trie.foreach_keyword(&self.ops, f);
    }

    /// Returns a cursor positioned at the root. Resetting is O(1); multiple
    /// cursors (even across threads, since they only borrow `&self`) may
    /// coexist.
    pub fn reset(&self) -> Cursor<'_, T, V, O, S> {
        Cursor::new(self)
    }

    /// Rebuilds the failure/output layer if it is stale. Blocks on the
    /// internal mutex only the first time this runs after a mutation;
    /// subsequent calls observe `Reconstruct::Clean` and return
    /// immediately without locking.
    pub(crate) fn ensure_rebuilt(&self) {
        if Reconstruct::from_u8(self.reconstruct.load(Ordering::Acquire)) == Reconstruct::Clean {
            return;
        }
        let _guard = self.rebuild_lock.lock();
        let flag = Reconstruct::from_u8(self.reconstruct.load(Ordering::Relaxed));
        if flag == Reconstruct::Clean {
            return;
        }
        let reset_outputs = flag == Reconstruct::OutputAlso;
        rebuild(&self.trie, &self.ops, reset_outputs);
        tracing::debug!(reset_outputs, "failure layer rebuilt");
        self.reconstruct.store(Reconstruct::Clean as u8, Ordering::Release);
    }

    fn mark_dirty(&mut self) {
        // `&mut self` here, so plain ordering would do, but Release keeps
        // the store consistent with the Acquire load in `ensure_rebuilt`.
        self.reconstruct
            .store(Reconstruct::OutputAlso as u8, Ordering::Release);
    }
}

impl<T, V, O, S> Machine<T, V, O, S>
where
    O: SymbolOps<T> + Default,
    S: StateID,
{
    /// Creates a fresh machine using `O`'s default operator bundle.
    pub fn new() -> Self {
        Self::with_ops(O::default())
    }
}

impl<T, V, O, S> Default for Machine<T, V, O, S>
where
    O: SymbolOps<T> + Default,
    S: StateID,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, V, O, S> std::fmt::Debug for Machine<T, V, O, S>
where
    S: StateID,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("state_count", &self.trie.len())
            .field("keyword_count", &self.keyword_count)
            .finish()
    }
}

impl<T, V, O, S> Drop for Machine<T, V, O, S>
where
    O: SymbolOps<T>,
    S: StateID,
{
    fn drop(&mut self) {
        tracing::debug!(states = self.trie.len(), "releasing machine");
        // Walk every surviving edge and run `drop_symbol` on its symbol,
        // matching `unregister`'s pruning path, before the `Trie`'s
        // `Vec<State<..>>` (and the values/symbols it owns) is dropped.
        for id in self.trie.states_iter() {
            for (sym, _) in self.trie.edges(id) {
                self.ops.drop_symbol(sym);
            }
        }
    }
}
