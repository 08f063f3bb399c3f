//! The goto graph: a rooted tree of states, each reached from its parent by
//! exactly one symbol.
//!
//! States live in a slab (`Vec<State<..>>`) rather than being individually
//! heap-allocated; a free list recycles the numeric ids of pruned states so
//! `(parent, edge_index)` back-pointers stay plain integer pairs. The root
//! is always slot `0` and is never recycled.
//!
//! `fail` and `output_count` are stored as atomics even though the rest of a
//! state is plain data: the failure/output layer (`crate::failure`) rebuilds
//! them through a shared `&Trie`, while readers may be observing other
//! states through their own shared reference at the same time. Everything
//! else here (`edges`, `parent`, `is_terminal`, `rank`, `value`) is only ever
//! touched through `&mut Trie`, which the machine's mutating operations
//! (`register`/`unregister`) hold exclusively.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::CoreError;
use crate::state_id::{usize_to_state_id, StateID};
use crate::symbol::SymbolOps;

pub(crate) struct State<T, V, S> {
    pub(crate) edges: Vec<(T, S)>,
    pub(crate) parent: Option<(S, usize)>,
    pub(crate) is_terminal: bool,
    pub(crate) rank: usize,
    pub(crate) value: Option<V>,
    fail: AtomicUsize,
    output_count: AtomicUsize,
}

impl<T, V, S: StateID> State<T, V, S> {
    fn root() -> Self {
        State {
            edges: Vec::new(),
            parent: None,
            is_terminal: false,
            rank: 0,
            value: None,
            fail: AtomicUsize::new(0),
            output_count: AtomicUsize::new(0),
        }
    }

    fn leaf(parent: S, edge_index: usize) -> Self {
        State {
            edges: Vec::new(),
            parent: Some((parent, edge_index)),
            is_terminal: false,
            rank: 0,
            value: None,
            fail: AtomicUsize::new(0),
            output_count: AtomicUsize::new(0),
        }
    }
}

pub(crate) struct Trie<T, V, S> {
    states: Vec<State<T, V, S>>,
    free: Vec<S>,
    live_count: usize,
}

impl<T, V, S: StateID> Trie<T, V, S> {
    pub(crate) fn new() -> Self {
        Trie {
            states: vec![State::root()],
            free: Vec::new(),
            live_count: 1,
        }
    }

    #[inline]
    pub(crate) fn root_id(&self) -> S {
        S::from_usize(0)
    }

    /// Number of live states, including the root. Equals one plus the
    /// number of edges over all live states.
    pub(crate) fn len(&self) -> usize {
        self.live_count
    }

    #[inline]
    fn idx(id: S) -> usize {
        id.to_usize()
    }

    #[inline]
    pub(crate) fn edges(&self, id: S) -> &[(T, S)] {
        &self.states[Self::idx(id)].edges
    }

    #[inline]
    pub(crate) fn parent(&self, id: S) -> Option<(S, usize)> {
        self.states[Self::idx(id)].parent
    }

    #[inline]
    pub(crate) fn is_terminal(&self, id: S) -> bool {
        self.states[Self::idx(id)].is_terminal
    }

    #[inline]
    pub(crate) fn rank(&self, id: S) -> usize {
        self.states[Self::idx(id)].rank
    }

    #[inline]
    pub(crate) fn value(&self, id: S) -> Option<&V> {
        self.states[Self::idx(id)].value.as_ref()
    }

    #[inline]
    pub(crate) fn fail(&self, id: S) -> S {
        S::from_usize(self.states[Self::idx(id)].fail.load(Ordering::Relaxed))
    }

    #[inline]
    pub(crate) fn output_count(&self, id: S) -> usize {
        self.states[Self::idx(id)].output_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_fail(&self, id: S, fail: S) {
        self.states[Self::idx(id)].fail.store(fail.to_usize(), Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn set_output_count(&self, id: S, count: usize) {
        self.states[Self::idx(id)]
            .output_count
            .store(count, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_output_count(&self, id: S, delta: usize) {
        self.states[Self::idx(id)]
            .output_count
            .fetch_add(delta, Ordering::Relaxed);
    }

    pub(crate) fn states_iter(&self) -> impl Iterator<Item = S> + '_ {
        (0..self.states.len())
            .map(S::from_usize)
            .filter(move |&id| self.is_live(id))
    }

    fn is_live(&self, id: S) -> bool {
        id == self.root_id() || self.states[Self::idx(id)].parent.is_some()
    }

    /// Follows a single edge labelled (under `ops`) by `sym`, if present.
    pub(crate) fn find_child<O: SymbolOps<T>>(&self, id: S, sym: &T, ops: &O) -> Option<S> {
        self.edges(id)
            .iter()
            .find(|(s, _)| ops.symbols_equal(s, sym))
            .map(|&(_, child)| child)
    }

    /// Walks `keyword` from the root as far as existing edges allow,
    /// returning the reached state and how many symbols were consumed.
    pub(crate) fn walk_prefix<O: SymbolOps<T>>(&self, keyword: &[T], ops: &O) -> (S, usize) {
        let mut cur = self.root_id();
        for (i, sym) in keyword.iter().enumerate() {
            match self.find_child(cur, sym, ops) {
                Some(next) => cur = next,
                None => return (cur, i),
            }
        }
        (cur, keyword.len())
    }

    /// Finds the state reached by `keyword`, but only if it is a currently
    /// registered keyword (terminal).
    pub(crate) fn locate<O: SymbolOps<T>>(&self, keyword: &[T], ops: &O) -> Option<S> {
        let (state, consumed) = self.walk_prefix(keyword, ops);
        if consumed == keyword.len() && self.is_terminal(state) {
            Some(state)
        } else {
            None
        }
    }

    /// Allocates a new child of `parent` reached by `sym`, reusing a
    /// pruned slot if one is free.
    pub(crate) fn alloc_child<O: SymbolOps<T>>(
        &mut self,
        parent: S,
        sym: &T,
        ops: &O,
    ) -> Result<S, CoreError> {
        let edge_index = self.states[Self::idx(parent)].edges.len();
        let child = if let Some(reused) = self.free.pop() {
            self.states[Self::idx(reused)] = State::leaf(parent, edge_index);
            reused
        } else {
            let id = usize_to_state_id::<S>(self.states.len()).ok_or(CoreError::StateSpaceExhausted {
                max: S::max_id(),
            })?;
            self.states.push(State::leaf(parent, edge_index));
            id
        };
        self.states[Self::idx(parent)]
            .edges
            .push((ops.copy_symbol(sym), child));
        self.live_count += 1;
        Ok(child)
    }

    #[inline]
    pub(crate) fn set_terminal(&mut self, id: S, terminal: bool) {
        self.states[Self::idx(id)].is_terminal = terminal;
    }

    #[inline]
    pub(crate) fn set_rank(&mut self, id: S, rank: usize) {
        self.states[Self::idx(id)].rank = rank;
    }

    /// Replaces the value stored at `id`, dropping whatever was there
    /// before (including `None`, which is a no-op drop).
    #[inline]
    pub(crate) fn set_value(&mut self, id: S, value: Option<V>) {
        self.states[Self::idx(id)].value = value;
    }

    #[inline]
    pub(crate) fn take_value(&mut self, id: S) -> Option<V> {
        self.states[Self::idx(id)].value.take()
    }

    /// Prunes `leaf` and, while the resulting parent is a non-root,
    /// non-terminal state with no remaining edges, continues pruning
    /// upward. `leaf` must currently have no outgoing edges.
    pub(crate) fn prune_from_leaf<O: SymbolOps<T>>(&mut self, leaf: S, ops: &O) {
        debug_assert!(self.edges(leaf).is_empty());
        let mut cur = leaf;
        loop {
            let (parent, edge_index) = self
                .parent(cur)
                .expect("prune_from_leaf called on the root");

            // Drop the value and the edge symbol that reached `cur`.
            self.take_value(cur);
            let (sym, _) = self.states[Self::idx(parent)].edges.remove(edge_index);
            ops.drop_symbol(&sym);

            // Removing the edge shifted every sibling after it down by one;
            // re-index their `parent.1` so back-pointers stay correct.
            let parent_edges_len = self.states[Self::idx(parent)].edges.len();
            for i in edge_index..parent_edges_len {
                let (_, child) = self.states[Self::idx(parent)].edges[i];
                self.states[Self::idx(child)].parent = Some((parent, i));
            }

            self.free_state(cur);

            let parent_is_root = parent == self.root_id();
            let parent_is_terminal = self.is_terminal(parent);
            let parent_has_edges = !self.edges(parent).is_empty();
            if parent_is_root || parent_is_terminal || parent_has_edges {
                break;
            }
            cur = parent;
        }
    }

    fn free_state(&mut self, id: S) {
        let state = &mut self.states[Self::idx(id)];
        state.edges.clear();
        state.parent = None;
        state.is_terminal = false;
        state.rank = 0;
        state.value = None;
        state.fail.store(0, Ordering::Relaxed);
        state.output_count.store(0, Ordering::Relaxed);
        self.free.push(id);
        self.live_count -= 1;
    }

    /// Depth-first walk over every currently registered keyword, invoking
    /// `f` with the keyword's symbols (in order) and its value. Traversal
    /// order is unspecified beyond "every current keyword exactly once".
    pub(crate) fn foreach_keyword<O, F>(&self, ops: &O, mut f: F)
    where
        O: SymbolOps<T>,
        F: FnMut(&[T], Option<&V>),
    {
        let mut buf: Vec<T> = Vec::new();
        self.foreach_keyword_at(self.root_id(), ops, &mut buf, &mut f);
    }

    fn foreach_keyword_at<O, F>(&self, id: S, ops: &O, buf: &mut Vec<T>, f: &mut F)
    where
        O: SymbolOps<T>,
        F: FnMut(&[T], Option<&V>),
    {
        if self.is_terminal(id) {
            f(buf, self.value(id));
        }
        for (sym, child) in self.edges(id) {
            buf.push(ops.copy_symbol(sym));
            self.foreach_keyword_at(*child, ops, buf, f);
            buf.pop();
        }
    }

    /// Reconstructs the keyword ending at `id` by walking parent
    /// back-links to the root, emitting symbols in order into `out`.
    pub(crate) fn reconstruct_keyword<O: SymbolOps<T>>(&self, id: S, ops: &O, out: &mut Vec<T>) {
        let start = out.len();
        let mut cur = id;
        while let Some((parent, edge_index)) = self.parent(cur) {
            let (sym, _) = &self.edges(parent)[edge_index];
            out.push(ops.copy_symbol(sym));
            cur = parent;
        }
        out[start..].reverse();
    }
}
