//! A generic, mutable Aho–Corasick automaton.
//!
//! This crate implements the Aho–Corasick multi-pattern string-matching
//! construction with a handful of extensions beyond the 1975 paper:
//!
//! - Genericity over an arbitrary symbol type (`T`), with pluggable
//!   equality and copy operators bundled in a [`SymbolOps`] value rather
//!   than required as the type's own trait impls — the alphabet is not
//!   bounded to 256 bytes.
//! - Incremental construction: keywords may be registered *and*
//!   unregistered between searches. The failure layer is rebuilt lazily,
//!   the first time a [`Cursor`] is fed after a mutation.
//! - Matches are reconstructed by walking parent back-links from an
//!   accepting state rather than by storing output strings at every
//!   state, keeping per-state memory to an edge list plus a handful of
//!   scalars.
//! - A per-keyword associated value, making the automaton usable as an
//!   indexed dictionary.
//! - Thread-safe concurrent scanning: any number of [`Cursor`]s, even from
//!   different threads, may traverse a shared [`Machine`] at once.
//!
//! ```
//! use ahocorasick_dyn::Machine;
//!
//! let mut m: Machine<u8, &str> = Machine::new();
//! m.register(b"he", Some("he"));
//! m.register(b"she", Some("she"));
//! m.register(b"his", Some("his"));
//! m.register(b"hers", Some("hers"));
//!
//! let mut cursor = m.reset();
//! let mut last_count = 0;
//! for b in b"ushers" {
//!     last_count = cursor.feed(b);
//! }
//! assert_eq!(last_count, 2);
//! assert_eq!(cursor.value_at(0), Some(&"she"));
//! assert_eq!(cursor.value_at(1), Some(&"hers"));
//! ```

mod automaton;
mod cursor;
mod error;
mod failure;
mod state_id;
mod symbol;
mod trie;

pub use automaton::Machine;
pub use cursor::Cursor;
pub use error::CoreError;
pub use state_id::StateID;
pub use symbol::{CaseInsensitiveAscii, StdOps, SymbolOps};
