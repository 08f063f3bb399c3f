//! Fatal diagnostics.
//!
//! Per the core's error taxonomy, there are no recoverable errors: a
//! contract violation (an out-of-range match index, a state space that has
//! outgrown its chosen [`crate::StateID`] width) is a programmer error, and
//! the core aborts with a diagnostic rather than threading a `Result` the
//! caller is expected to recover from. `CoreError` exists so that diagnostic
//! has a structured, locatable shape instead of an ad hoc string.

/// Fatal conditions raised by a [`crate::Machine`].
///
/// These are never returned to a caller as a `Result`; they are always
/// routed through [`fatal`], which logs and then panics.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum CoreError {
    /// `match_at` was asked for an index beyond the number of keywords
    /// matching at the cursor's current position.
    #[error("match index {index} out of range: only {available} match(es) at this position")]
    MatchIndexOutOfRange {
        /// The index the caller asked for.
        index: usize,
        /// The number of matches actually available.
        available: usize,
    },

    /// The trie has grown beyond what the chosen `StateID` width can
    /// address. Pick a wider `S` (e.g. `u32` or `usize`) for machines that
    /// will hold this many states.
    #[error("state space exhausted: cannot address more than {max} states with this StateID width")]
    StateSpaceExhausted {
        /// The maximum number of states the chosen `StateID` can address.
        max: usize,
    },
}

/// Logs `err` and then panics with it.
///
/// Centralizing this means the panic message and the `tracing::error!` event
/// always carry identical text, and gives the core one place to change if a
/// future host environment prefers `std::process::abort` to unwinding.
#[cold]
pub(crate) fn fatal(err: CoreError) -> ! {
    tracing::error!(error = %err, "fatal automaton error");
    panic!("{err}");
}
