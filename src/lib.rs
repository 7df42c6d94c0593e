//! An educational simulator of a glibc-style segregated-fit heap allocator
//! (ptmalloc2 lineage): a single simulated [`Arena`] exposing allocate,
//! release and force-consolidate against an address-keyed chunk store,
//! recording every move it makes as a structured [`Event`] trace and
//! offering a deep, independent [`Snapshot`] for an external viewer to step
//! through.
//!
//! ```
//! use heapsim::Arena;
//!
//! let mut arena = Arena::new(1 << 15).unwrap();
//! let p1 = arena.allocate(24);
//! arena.release(p1);
//! let p2 = arena.allocate(24);
//! assert_eq!(p1, p2, "tcache hands the same chunk straight back, LIFO");
//! ```

mod arena;
mod bins;
mod chunk;
mod error;
mod event;
mod size_class;
mod snapshot;

pub use arena::{Arena, DEFAULT_BASE};
pub use chunk::{Address, Chunk};
pub use error::{ArenaError, ReleaseError};
pub use event::{Destination, Event, Source};
pub use snapshot::{ChunkView, Snapshot};

pub use size_class::{
    ALIGNMENT, FASTBIN_COUNT, HEADER_SIZE, LARGEBIN_COUNT, MIN_CHUNK_SIZE, SMALLBIN_COUNT,
    TCACHE_CAPACITY, TCACHE_MAX_REQUEST, request2size,
};
