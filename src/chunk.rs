//! The chunk address space and chunk store: the ground layer every other
//! component reasons about.
//!
//! Chunks live in a flat map keyed by address rather than behind direct
//! references, and every intrusive list pointer is an `Option<Address>`
//! rather than a pointer or `Rc`. That sidesteps the reference cycles an
//! intrusive doubly-linked list would otherwise require, and is what makes
//! [`crate::snapshot::Snapshot`] trivially, independently cloneable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::size_class::HEADER_SIZE;

/// An abstract non-negative integer identifying a byte position in the
/// simulated heap.
pub type Address = u64;

/// A contiguous chunk of simulated heap memory.
///
/// Field names match the normative snapshot schema exactly, so `Snapshot`'s
/// `chunks` map can serialize a `Chunk` as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub addr: Address,
    pub size: usize,
    pub prev_size: usize,
    pub inuse: bool,
    pub prev_inuse: bool,
    pub fd: Option<Address>,
    pub bk: Option<Address>,
    pub fd_nextsize: Option<Address>,
    pub bk_nextsize: Option<Address>,
}

impl Chunk {
    pub(crate) fn raw(addr: Address, size: usize, inuse: bool, prev_inuse: bool) -> Self {
        Chunk {
            addr,
            size,
            prev_size: 0,
            inuse,
            prev_inuse,
            fd: None,
            bk: None,
            fd_nextsize: None,
            bk_nextsize: None,
        }
    }

    /// The user-visible pointer for this chunk: the header's end.
    pub fn user_pointer(&self) -> Address {
        self.addr + HEADER_SIZE as Address
    }

    /// Clears every bin intrusive-list pointer. Called on unlink from any
    /// container: all list pointers are nulled out once a chunk leaves it.
    pub(crate) fn clear_list_pointers(&mut self) {
        self.fd = None;
        self.bk = None;
        self.fd_nextsize = None;
        self.bk_nextsize = None;
    }
}

/// The flat address-to-chunk map plus the monotonically growing heap bound
/// and the current top chunk's address.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    chunks: BTreeMap<Address, Chunk>,
    base: Address,
    heap_end: Address,
    top: Address,
}

impl ChunkStore {
    /// Builds the initial heap: one top chunk covering `[base, base + size)`.
    pub fn new(base: Address, size: usize) -> Self {
        let mut chunks = BTreeMap::new();
        let top_chunk = Chunk::raw(base, size, false, true);
        chunks.insert(base, top_chunk);

        ChunkStore { chunks, base, heap_end: base + size as Address, top: base }
    }

    pub fn base(&self) -> Address {
        self.base
    }

    pub fn heap_end(&self) -> Address {
        self.heap_end
    }

    pub fn top_addr(&self) -> Address {
        self.top
    }

    pub fn top(&self) -> &Chunk {
        self.chunks.get(&self.top).expect("top chunk must always exist")
    }

    pub fn top_mut(&mut self) -> &mut Chunk {
        self.chunks.get_mut(&self.top).expect("top chunk must always exist")
    }

    pub fn set_top_addr(&mut self, addr: Address) {
        self.top = addr;
    }

    pub fn get(&self, addr: Address) -> Option<&Chunk> {
        self.chunks.get(&addr)
    }

    pub fn get_mut(&mut self, addr: Address) -> Option<&mut Chunk> {
        self.chunks.get_mut(&addr)
    }

    /// Inserts a freshly created chunk (from a split or `sysmalloc`).
    pub fn insert(&mut self, chunk: Chunk) {
        self.chunks.insert(chunk.addr, chunk);
    }

    /// Destroys a chunk, e.g. after it has been merged into a neighbour.
    pub fn remove(&mut self, addr: Address) -> Option<Chunk> {
        self.chunks.remove(&addr)
    }

    /// The address of the chunk physically following `addr`, if any. Every
    /// non-top chunk has a successor; the top chunk has none.
    pub fn next_addr(&self, addr: Address) -> Option<Address> {
        let chunk = self.chunks.get(&addr)?;
        let next = addr + chunk.size as Address;
        if next < self.heap_end { Some(next) } else { None }
    }

    /// The address of the chunk physically preceding `addr`, using
    /// `prev_size` — only meaningful when `prev_inuse == false`.
    pub fn prev_addr(&self, addr: Address) -> Option<Address> {
        let chunk = self.chunks.get(&addr)?;
        if chunk.prev_inuse || chunk.prev_size == 0 {
            return None;
        }
        Some(addr - chunk.prev_size as Address)
    }

    /// Sets the successor's `prev_inuse`/`prev_size` fields to reflect
    /// `chunk`'s current in-use state and size.
    pub fn propagate_to_next(&mut self, addr: Address) {
        let Some(chunk) = self.chunks.get(&addr).copied() else { return };
        if let Some(next_addr) = self.next_addr(addr) {
            if let Some(next) = self.chunks.get_mut(&next_addr) {
                next.prev_inuse = chunk.inuse;
                next.prev_size = if chunk.inuse { 0 } else { chunk.size };
            }
        }
    }

    /// Iterates every chunk in address order (used by [`crate::snapshot`]
    /// and invariant-checking tests).
    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Grows the heap's high-water mark by `extra` bytes (`sysmalloc`).
    pub fn grow(&mut self, extra: usize) {
        self.heap_end += extra as Address;
    }
}
