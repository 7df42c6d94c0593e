//! Error kinds for the arena.
//!
//! A `thiserror`-derived enum for each recoverable error surface: one for
//! construction failures, one for release-side validation failures. Kept
//! separate since only one of the two is ever propagated with `?` — the
//! other is recorded as an event and never leaves the arena.

use thiserror::Error;

/// Failure constructing an [`crate::Arena`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ArenaError {
    /// `initialHeapBytes` was zero; no heap can host even a single valid
    /// top chunk, since every chunk must be at least 16 bytes.
    #[error("initial heap size must be nonzero")]
    EmptyHeap,
}

/// A recoverable release-side validation failure. Never fatal to the
/// arena: on any of these, `Arena::release` records an `error` event,
/// leaves all state untouched, and returns normally — this type exists to
/// give that event's message text a single source of truth, not to be
/// propagated with `?`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseError {
    /// `ptr` was null/zero.
    #[error("free(): null pointer")]
    NullPointer,
    /// `ptr` does not translate to a known chunk.
    #[error("free(): invalid pointer")]
    UnknownPointer,
    /// The chunk at `ptr` is not currently in use.
    #[error("double free or invalid: chunk is not in use")]
    NotInUse,
}
