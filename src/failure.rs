//! The failure-link and output-count layer, rebuilt by breadth-first
//! propagation from the root whenever the trie has changed since the last
//! rebuild.
//!
//! The key design decision inherited from the source automaton: the root
//! has no universal self-loop. Because the alphabet is open-ended, the
//! classical "add an edge to root for every symbol not already present"
//! step is impossible, so `δ` special-cases termination at the root instead
//! of materializing `|Σ|` edges there.

use std::collections::VecDeque;

use crate::state_id::StateID;
use crate::symbol::SymbolOps;
use crate::trie::Trie;

/// Tri-state flag tracking whether the failure/output layer is stale.
///
/// `Structural` is the state a fresh machine starts in (no rebuild has ever
/// run, but output counts are already fresh from construction, so the
/// reset step can be skipped). `OutputAlso` is set after any registration
/// or removal, since both can change which states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Reconstruct {
    Clean = 0,
    Structural = 1,
    OutputAlso = 2,
}

impl Reconstruct {
    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            0 => Reconstruct::Clean,
            1 => Reconstruct::Structural,
            _ => Reconstruct::OutputAlso,
        }
    }
}

/// The transition function `δ(s, c)`: pure, no side effects.
///
/// Follows `s`'s own edge for `c` if one exists; otherwise follows fail
/// links until one does, stopping at the root (which is treated as always
/// having an implicit self-loop without ever storing it).
pub(crate) fn goto<T, V, O, S>(trie: &Trie<T, V, S>, mut s: S, c: &T, ops: &O) -> S
where
    O: SymbolOps<T>,
    S: StateID,
{
    let root = trie.root_id();
    loop {
        if let Some(child) = trie.find_child(s, c, ops) {
            return child;
        }
        if s == root {
            return root;
        }
        s = trie.fail(s);
    }
}

/// Rebuilds every state's `fail` link and `output_count` by breadth-first
/// propagation from the root. `reset_outputs` controls whether
/// `output_count` is first reset to `is_terminal ? 1 : 0` (needed whenever
/// the trie's terminal set may have changed since the last rebuild).
pub(crate) fn rebuild<T, V, O, S>(trie: &Trie<T, V, S>, ops: &O, reset_outputs: bool)
where
    O: SymbolOps<T>,
    S: StateID,
{
    let root = trie.root_id();

    if reset_outputs {
        for id in trie.states_iter() {
            let base = if trie.is_terminal(id) { 1 } else { 0 };
            trie.set_output_count(id, base);
        }
    }

    let mut queue: VecDeque<S> = VecDeque::new();
    for &(_, child) in trie.edges(root) {
        trie.set_fail(child, root);
        queue.push_back(child);
    }

    while let Some(r) = queue.pop_front() {
        // `fail`/`set_fail`/`output_count`/`add_output_count` are all `&self`
        // methods (backed by atomics), so the edge list can be iterated by
        // reference directly without cloning symbols out of it first.
        let fail_r = trie.fail(r);

        for &(ref c, s) in trie.edges(r) {
            let f = goto(trie, fail_r, c, ops);
            trie.set_fail(s, f);
            trie.add_output_count(s, trie.output_count(f));
            queue.push_back(s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::StdOps;
    use crate::trie::Trie;

    fn insert(trie: &mut Trie<u8, (), usize>, ops: &StdOps, kw: &[u8]) -> usize {
        let (mut cur, consumed) = trie.walk_prefix(kw, ops);
        for &b in &kw[consumed..] {
            cur = trie.alloc_child(cur, &b, ops).unwrap();
        }
        trie.set_terminal(cur, true);
        cur
    }

    #[test]
    fn paper_example_fail_links() {
        // he, she, his, hers
        let mut trie = Trie::<u8, (), usize>::new();
        let ops = StdOps;
        insert(&mut trie, &ops, b"he");
        insert(&mut trie, &ops, b"she");
        insert(&mut trie, &ops, b"his");
        insert(&mut trie, &ops, b"hers");

        rebuild(&trie, &ops, true);

        // Feeding "ushers" should land on a state whose output_count is 2
        // (she, hers) at the final 's'.
        let mut state = trie.root_id();
        for &b in b"ushers" {
            state = goto(&trie, state, &b, &ops);
        }
        assert_eq!(trie.output_count(state), 2);
    }

    #[test]
    fn output_count_matches_fail_chain_sum() {
        let mut trie = Trie::<u8, (), usize>::new();
        let ops = StdOps;
        insert(&mut trie, &ops, b"abcde");
        insert(&mut trie, &ops, b"bcd");
        rebuild(&trie, &ops, true);

        for id in trie.states_iter() {
            let expected = (if trie.is_terminal(id) { 1 } else { 0 })
                + if id == trie.root_id() {
                    0
                } else {
                    trie.output_count(trie.fail(id))
                };
            assert_eq!(trie.output_count(id), expected, "state {:?}", id);
        }
    }
}
