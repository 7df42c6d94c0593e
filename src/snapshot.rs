//! The deep, read-only arena view.
//!
//! Every field here is `Copy`/owned data, no `Rc`/`RefCell` anywhere, so
//! `#[derive(Clone)]` already gives full independence: once taken, a
//! snapshot shares no mutable storage with the arena, and no later arena
//! mutation can be observed through it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::chunk::Address;

/// One entry of [`Snapshot::chunks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkView {
    pub size: usize,
    pub prev_size: usize,
    pub inuse: bool,
    pub prev_inuse: bool,
    pub fd: Option<Address>,
    pub bk: Option<Address>,
    pub fd_nextsize: Option<Address>,
    pub bk_nextsize: Option<Address>,
}

impl From<&crate::chunk::Chunk> for ChunkView {
    fn from(c: &crate::chunk::Chunk) -> Self {
        ChunkView {
            size: c.size,
            prev_size: c.prev_size,
            inuse: c.inuse,
            prev_inuse: c.prev_inuse,
            fd: c.fd,
            bk: c.bk,
            fd_nextsize: c.fd_nextsize,
            bk_nextsize: c.bk_nextsize,
        }
    }
}

/// A deep, structurally independent copy of the arena's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub top: Address,
    #[serde(rename = "topSize")]
    pub top_size: usize,
    pub fastbins: Vec<Option<Address>>,
    pub unsorted: Option<Address>,
    pub smallbins: Vec<Option<Address>>,
    pub largebins: Vec<Option<Address>>,
    pub tcache: BTreeMap<usize, Vec<Address>>,
    pub chunks: BTreeMap<Address, ChunkView>,
}
