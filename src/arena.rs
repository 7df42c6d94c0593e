//! The allocation/release engine. `Arena` wires the chunk store, the bin
//! containers and the event log together into the single public entry
//! point the rest of this crate exists to support: the thing that owns the
//! whole heap picture, builds it move by move, and narrates every move it
//! makes.

use crate::bins::Bins;
use crate::chunk::{Address, Chunk, ChunkStore};
use crate::error::{ArenaError, ReleaseError};
use crate::event::{Destination, Event, Source};
use crate::size_class::{
    self, ALIGNMENT, FASTBIN_CONSOLIDATION_THRESHOLD, MIN_CHUNK_SIZE, MIN_SPLIT_REMAINDER,
    SYSMALLOC_MIN_GROWTH, align_up, fastbin_index, largebin_index, request2size, smallbin_index,
    tcache_eligible,
};
use crate::snapshot::{ChunkView, Snapshot};

/// Base address the simulated heap starts at: some fixed, nonzero origin.
pub const DEFAULT_BASE: Address = 0x1000;

/// The simulated heap: one arena, one set of bins, one event trace.
#[derive(Debug, Clone)]
pub struct Arena {
    store: ChunkStore,
    bins: Bins,
    events: Vec<Event>,
}

impl Arena {
    /// Builds a fresh arena with a single top chunk covering
    /// `alignUp(initialHeapBytes, 16)` bytes.
    ///
    /// # Errors
    /// Returns [`ArenaError::EmptyHeap`] if `initial_heap_bytes` is zero.
    pub fn new(initial_heap_bytes: usize) -> Result<Self, ArenaError> {
        if initial_heap_bytes == 0 {
            return Err(ArenaError::EmptyHeap);
        }
        let size = align_up(initial_heap_bytes, ALIGNMENT);
        log::debug!("arena: {size} byte heap at base {DEFAULT_BASE:#x}");
        Ok(Arena { store: ChunkStore::new(DEFAULT_BASE, size), bins: Bins::new(), events: Vec::new() })
    }

    /// The full event trace recorded so far, in emission order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Looks up a chunk by the user pointer `malloc` would have returned for
    /// it. Exact match only: `ptr` must equal some chunk's
    /// `addr + HEADER_SIZE`, not merely fall inside its span.
    pub fn chunk_by_user_pointer(&self, ptr: Address) -> Option<Chunk> {
        if ptr < size_class::HEADER_SIZE as Address {
            return None;
        }
        let addr = ptr - size_class::HEADER_SIZE as Address;
        self.store.get(addr).copied()
    }

    /// A deep, independent copy of the arena's entire state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            top: self.store.top_addr(),
            top_size: self.store.top().size,
            fastbins: self.bins.fastbins().to_vec(),
            unsorted: self.bins.unsorted_head(),
            smallbins: self.bins.smallbins().to_vec(),
            largebins: self.bins.largebins().to_vec(),
            tcache: self.bins.tcache().iter().map(|(size, list)| (*size, list.iter().copied().collect())).collect(),
            chunks: self.store.iter().map(|c| (c.addr, ChunkView::from(c))).collect(),
        }
    }

    /// The seven-step allocation search order, tried in order: tcache,
    /// fastbin, opportunistic consolidate, smallbin, unsorted first-fit,
    /// largebin best-fit, and finally carving off the top chunk. Always
    /// succeeds — the simulated heap grows without bound via `sysmalloc`,
    /// so there is no out-of-memory case to report.
    pub fn allocate(&mut self, bytes: usize) -> Address {
        let nb = request2size(bytes);
        log::trace!("allocate(bytes={bytes}) -> nb={nb}");

        if tcache_eligible(nb) {
            if let Some(addr) = self.bins.tcache_pop(nb) {
                self.take_whole(addr);
                self.events.push(Event::TcacheGet { msg: format!("tcache[{nb}]: pop {addr:#x}"), size: nb });
                return self.finish_allocation(addr, bytes, nb, Source::Tcache);
            }
        }

        if let Some(idx) = fastbin_index(nb) {
            if let Some(addr) = self.bins.fastbin_pop(&mut self.store, idx) {
                self.take_whole(addr);
                self.events.push(Event::BinUnlink {
                    msg: format!("fastbin[{idx}]: pop {addr:#x}"),
                    bin: format!("fastbin[{idx}]"),
                    addr,
                    size: nb,
                });
                return self.finish_allocation(addr, bytes, nb, Source::Fastbin);
            }
        }

        if self.store.top().size < FASTBIN_CONSOLIDATION_THRESHOLD {
            self.malloc_consolidate();
        }

        if let Some(idx) = smallbin_index(nb) {
            if let Some(addr) = self.bins.smallbin_take(&mut self.store, idx) {
                self.take_whole(addr);
                self.events.push(Event::BinUnlink {
                    msg: format!("smallbin[{idx}]: pop {addr:#x}"),
                    bin: format!("smallbin[{idx}]"),
                    addr,
                    size: nb,
                });
                return self.finish_allocation(addr, bytes, nb, Source::Smallbin(idx));
            }
        }

        if let Some(addr) = self.bins.unsorted_take(&mut self.store, |size| size >= nb) {
            let size = self.store.get(addr).unwrap().size;
            self.events.push(Event::BinUnlink {
                msg: format!("unsorted: first-fit {addr:#x}"),
                bin: "unsorted".to_string(),
                addr,
                size,
            });
            let (result, remainder) = self.split_chunk(addr, nb);
            if let Some(r) = remainder {
                self.place_remainder(r);
            }
            return self.finish_allocation(result, bytes, nb, Source::Unsorted);
        }

        if let Some((addr, idx)) = self.bins.largebin_search(&mut self.store, nb) {
            let size = self.store.get(addr).unwrap().size;
            self.events.push(Event::BinUnlink {
                msg: format!("largebin[{idx}]: best-fit {addr:#x}"),
                bin: format!("largebin[{idx}]"),
                addr,
                size,
            });
            let (result, remainder) = self.split_chunk(addr, nb);
            if let Some(r) = remainder {
                self.place_remainder(r);
            }
            return self.finish_allocation(result, bytes, nb, Source::Largebin);
        }

        self.allocate_from_top(bytes, nb)
    }

    /// Validates `ptr`, then routes the freed chunk to tcache, fastbin, or
    /// coalesces it and routes the result to top or unsorted. On any
    /// validation failure, records an `error` event and leaves all state
    /// untouched.
    pub fn release(&mut self, ptr: Address) {
        let Some(addr) = self.validate_release(ptr) else { return };
        let nb = self.store.get(addr).unwrap().size;
        self.store.get_mut(addr).unwrap().inuse = false;

        if tcache_eligible(nb) && !self.bins.tcache_is_full(nb) {
            self.bins.tcache_push(&mut self.store, nb, addr);
            self.events.push(Event::TcachePut { msg: format!("tcache[{nb}]: push {addr:#x}"), size: nb });
            self.events.push(Event::Free {
                msg: format!("free({ptr:#x}) -> tcache[{nb}]"),
                ptr,
                size: nb,
                into: Destination::Tcache,
            });
            return;
        }

        if let Some(idx) = fastbin_index(nb) {
            self.bins.fastbin_push(&mut self.store, idx, addr);
            self.events.push(Event::Free {
                msg: format!("free({ptr:#x}) -> fastbin[{idx}]"),
                ptr,
                size: nb,
                into: Destination::Fastbin,
            });
            return;
        }

        let merged = self.coalesce(addr);
        let merged_size = self.store.get(merged).unwrap().size;

        if merged + merged_size as Address == self.store.top_addr() {
            self.absorb_into_top(merged);
            self.events.push(Event::Free {
                msg: format!("free({ptr:#x}) -> top"),
                ptr,
                size: merged_size,
                into: Destination::Top,
            });
        } else {
            self.bins.unsorted_insert(&mut self.store, merged);
            self.events.push(Event::BinInsert {
                msg: format!("unsorted: insert {merged:#x}"),
                bin: "unsorted".to_string(),
                addr: merged,
                size: merged_size,
            });
            self.events.push(Event::Free {
                msg: format!("free({ptr:#x}) -> unsorted"),
                ptr,
                size: merged_size,
                into: Destination::Unsorted,
            });
        }
    }

    /// Drains every fastbin, coalescing each drained chunk with its
    /// neighbours and routing the result to top or unsorted. A no-op — no
    /// event emitted — when no fastbin holds anything, so calling this
    /// twice in a row is idempotent.
    pub fn consolidate(&mut self) {
        self.malloc_consolidate();
    }

    fn malloc_consolidate(&mut self) {
        let drained = self.bins.drain_fastbins(&mut self.store);
        if drained.is_empty() {
            return;
        }
        log::debug!("consolidate: draining {} fastbin chunk(s)", drained.len());
        let count = drained.len();

        for addr in drained {
            let merged = self.coalesce(addr);
            let merged_size = self.store.get(merged).unwrap().size;
            if merged + merged_size as Address == self.store.top_addr() {
                self.absorb_into_top(merged);
            } else {
                self.bins.unsorted_insert(&mut self.store, merged);
                self.events.push(Event::BinInsert {
                    msg: format!("unsorted: insert {merged:#x} via consolidate"),
                    bin: "unsorted".to_string(),
                    addr: merged,
                    size: merged_size,
                });
            }
        }

        self.events.push(Event::Consolidate { msg: format!("consolidate: drained {count} fastbin chunk(s)") });
    }

    // ---- release validation -------------------------------------------

    fn validate_release(&mut self, ptr: Address) -> Option<Address> {
        if ptr == 0 {
            self.record_error(ReleaseError::NullPointer);
            return None;
        }
        if ptr < size_class::HEADER_SIZE as Address {
            self.record_error(ReleaseError::UnknownPointer);
            return None;
        }
        let addr = ptr - size_class::HEADER_SIZE as Address;
        let Some(chunk) = self.store.get(addr) else {
            self.record_error(ReleaseError::UnknownPointer);
            return None;
        };
        if !chunk.inuse {
            self.record_error(ReleaseError::NotInUse);
            return None;
        }
        Some(addr)
    }

    fn record_error(&mut self, err: ReleaseError) {
        log::warn!("release: {err}");
        self.events.push(Event::Error { msg: err.to_string() });
    }

    // ---- allocation helpers --------------------------------------------

    /// Marks a chunk taken whole from a container as in-use and propagates
    /// that to its successor. Used by every exact-size tier (tcache,
    /// fastbin, smallbin), none of which ever split.
    fn take_whole(&mut self, addr: Address) {
        self.store.get_mut(addr).unwrap().inuse = true;
        self.store.propagate_to_next(addr);
    }

    /// Split policy: if the remainder would be at least
    /// [`MIN_SPLIT_REMAINDER`] bytes, split off `nb` at the low address and
    /// leave the remainder free (caller places it); otherwise the whole
    /// chunk is handed out unsplit. Returns `(result_addr, remainder_addr)`.
    fn split_chunk(&mut self, addr: Address, nb: usize) -> (Address, Option<Address>) {
        let cs = self.store.get(addr).unwrap().size;
        let remainder_size = cs - nb;
        if remainder_size < MIN_SPLIT_REMAINDER {
            self.take_whole(addr);
            return (addr, None);
        }

        let remainder_addr = addr + nb as Address;
        {
            let c = self.store.get_mut(addr).unwrap();
            c.size = nb;
            c.inuse = true;
        }
        let remainder = Chunk::raw(remainder_addr, remainder_size, false, true);
        self.store.insert(remainder);
        self.store.propagate_to_next(remainder_addr);
        self.events.push(Event::Split {
            msg: format!("split {addr:#x}: {nb} + {remainder_size}"),
            from: addr,
            into: [addr, remainder_addr],
            sizes: [nb, remainder_size],
        });
        (addr, Some(remainder_addr))
    }

    /// Routes a freshly cut split remainder into whichever bin its size
    /// belongs to.
    fn place_remainder(&mut self, addr: Address) {
        let size = self.store.get(addr).unwrap().size;
        if let Some(idx) = smallbin_index(size) {
            self.bins.smallbin_insert(&mut self.store, idx, addr);
            self.events.push(Event::BinInsert {
                msg: format!("smallbin[{idx}]: insert remainder {addr:#x}"),
                bin: format!("smallbin[{idx}]"),
                addr,
                size,
            });
        } else {
            let idx = largebin_index(size);
            self.bins.largebin_insert(&mut self.store, idx, addr);
            self.events.push(Event::BinInsert {
                msg: format!("largebin[{idx}]: insert remainder {addr:#x}"),
                bin: format!("largebin[{idx}]"),
                addr,
                size,
            });
        }
    }

    /// Grow the heap if the top chunk cannot satisfy `nb` while leaving at
    /// least [`MIN_CHUNK_SIZE`] behind, then cut `nb` off the low end of top
    /// and advance top past it.
    ///
    /// The growth trigger is `top.size < nb + MIN_CHUNK_SIZE`, not the
    /// narrower `top.size < nb` a literal reading might suggest:
    /// `sysmalloc`'s growth amount is always 16-aligned and at least
    /// `SYSMALLOC_MIN_GROWTH`, so growing whenever the post-split remainder
    /// would fall under `MIN_CHUNK_SIZE` guarantees the new top never ends
    /// up smaller than 16 bytes, including the exact-fit case
    /// `top.size == nb`.
    fn allocate_from_top(&mut self, bytes: usize, nb: usize) -> Address {
        if self.store.top().size < nb + MIN_CHUNK_SIZE {
            self.sysmalloc(nb);
        }

        let old_addr = self.store.top_addr();
        let old_size = self.store.top().size;
        let new_top_addr = old_addr + nb as Address;
        let new_top_size = old_size - nb;

        {
            let c = self.store.get_mut(old_addr).unwrap();
            c.size = nb;
            c.inuse = true;
        }
        let new_top = Chunk::raw(new_top_addr, new_top_size, false, true);
        self.store.insert(new_top);
        self.store.set_top_addr(new_top_addr);

        self.events.push(Event::Split {
            msg: format!("top split: {nb} + {new_top_size}"),
            from: old_addr,
            into: [old_addr, new_top_addr],
            sizes: [nb, new_top_size],
        });

        self.finish_allocation(old_addr, bytes, nb, Source::Top)
    }

    /// Grows the heap by at least `SYSMALLOC_MIN_GROWTH` bytes (more if `nb`
    /// demands it), extending the top chunk in place.
    fn sysmalloc(&mut self, nb: usize) {
        let growth = align_up(nb.max(SYSMALLOC_MIN_GROWTH), ALIGNMENT);
        let old_top_acme = self.store.top_addr() + self.store.top().size as Address;
        self.store.grow(growth);
        self.store.top_mut().size += growth;
        let new_top_acme = self.store.top_addr() + self.store.top().size as Address;
        log::debug!("sysmalloc: grew heap by {growth} bytes");
        self.events.push(Event::Sysmalloc {
            msg: format!("sysmalloc: grew heap by {growth} bytes"),
            bytes: growth,
            old_top: old_top_acme,
            new_top: new_top_acme,
        });
    }

    fn finish_allocation(&mut self, addr: Address, bytes: usize, nb: usize, source: Source) -> Address {
        let ptr = self.store.get(addr).unwrap().user_pointer();
        log::debug!("malloc({bytes}) -> {ptr:#x} via {source}");
        self.events.push(Event::Malloc {
            msg: format!("malloc({bytes}) -> {ptr:#x} from {source}"),
            bytes,
            nb,
            result: ptr,
            source,
        });
        ptr
    }

    // ---- coalescing -----------------------------------------------------

    /// Merges `addr` forward with its physical successor and backward with
    /// its physical predecessor, whenever each neighbour is free and
    /// coalescable (i.e. not fastbin/tcache-held and not the top chunk).
    /// Returns the address of the final merged chunk, which is left marked
    /// free with its successor's bookkeeping updated.
    fn coalesce(&mut self, addr: Address) -> Address {
        let mut cur = addr;
        let mut parts = vec![addr];

        if let Some(next_addr) = self.store.next_addr(cur) {
            if next_addr != self.store.top_addr() && self.bins.is_coalescable(next_addr) {
                self.bins.unlink_if_coalescable(&mut self.store, next_addr);
                let next_size = self.store.get(next_addr).unwrap().size;
                self.store.remove(next_addr);
                self.store.get_mut(cur).unwrap().size += next_size;
                parts.push(next_addr);
            }
        }

        if let Some(prev_addr) = self.store.prev_addr(cur) {
            if self.bins.is_coalescable(prev_addr) {
                self.bins.unlink_if_coalescable(&mut self.store, prev_addr);
                let cur_size = self.store.get(cur).unwrap().size;
                self.store.remove(cur);
                self.store.get_mut(prev_addr).unwrap().size += cur_size;
                parts.push(prev_addr);
                cur = prev_addr;
            }
        }

        self.store.get_mut(cur).unwrap().inuse = false;
        self.store.propagate_to_next(cur);

        if parts.len() > 1 {
            let size = self.store.get(cur).unwrap().size;
            self.events.push(Event::Coalesce {
                msg: format!("coalesce -> {cur:#x} ({size} bytes)"),
                result: cur,
                size,
                parts,
            });
        }

        cur
    }

    /// Extends `addr`'s chunk to absorb the current top chunk, making
    /// `addr` the new top. Precondition: `addr`'s chunk physically abuts
    /// the current top (`addr + size == top_addr`).
    fn absorb_into_top(&mut self, addr: Address) {
        let old_top_addr = self.store.top_addr();
        let old_top_size = self.store.get(old_top_addr).unwrap().size;
        self.store.remove(old_top_addr);
        let c = self.store.get_mut(addr).unwrap();
        c.size += old_top_size;
        c.inuse = false;
        self.store.set_top_addr(addr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn rejects_empty_heap() {
        assert!(matches!(Arena::new(0), Err(ArenaError::EmptyHeap)));
    }

    #[test]
    fn new_arena_has_one_top_chunk() {
        let arena = Arena::new(4096).unwrap();
        let snap = arena.snapshot();
        assert_eq!(snap.chunks.len(), 1);
        assert_eq!(snap.top_size, 4096);
    }

    #[test]
    fn allocate_round_trip_gives_back_same_bytes() {
        logger();
        let mut arena = Arena::new(4096).unwrap();
        let ptr = arena.allocate(40);
        let chunk = arena.chunk_by_user_pointer(ptr).unwrap();
        assert!(chunk.inuse);
        assert!(chunk.size >= 40);
    }

    #[test]
    fn single_tcache_hit() {
        logger();
        let mut arena = Arena::new(4096).unwrap();
        let p1 = arena.allocate(24);
        arena.release(p1);
        let p2 = arena.allocate(24);
        assert_eq!(p1, p2, "tcache is LIFO: the very next same-size allocation reuses it");
        let malloc_events: Vec<_> = arena
            .events()
            .iter()
            .filter(|e| matches!(e, Event::Malloc { source: Source::Tcache, .. }))
            .collect();
        assert_eq!(malloc_events.len(), 1);
    }

    #[test]
    fn fastbin_overflow_falls_through_to_smallbin_eventually() {
        logger();
        let mut arena = Arena::new(1 << 20).unwrap();
        // Exhaust the tcache slot for this size first (capacity 7), then
        // keep freeing: subsequent frees must land in the fastbin.
        let size = 40;
        let mut ptrs = Vec::new();
        for _ in 0..8 {
            ptrs.push(arena.allocate(size));
        }
        for &p in &ptrs {
            arena.release(p);
        }
        let fastbin_frees = arena
            .events()
            .iter()
            .filter(|e| matches!(e, Event::Free { into: Destination::Fastbin, .. }))
            .count();
        assert!(fastbin_frees >= 1, "at least the 8th free must overflow tcache into a fastbin");
    }

    #[test]
    fn consolidate_drains_fastbins_into_unsorted_or_top() {
        logger();
        let mut arena = Arena::new(1 << 20).unwrap();
        let mut ptrs = Vec::new();
        for _ in 0..8 {
            ptrs.push(arena.allocate(40));
        }
        for &p in &ptrs {
            arena.release(p);
        }
        arena.consolidate();
        let snap = arena.snapshot();
        assert!(snap.fastbins.iter().all(Option::is_none), "consolidate must empty every fastbin");
    }

    #[test]
    fn consolidate_is_idempotent() {
        logger();
        let mut arena = Arena::new(1 << 20).unwrap();
        let p = arena.allocate(40);
        arena.release(p);
        arena.consolidate();
        let before = arena.events().len();
        arena.consolidate();
        assert_eq!(arena.events().len(), before, "a second consolidate with nothing to drain emits nothing");
    }

    #[test]
    fn split_leaves_a_free_remainder() {
        logger();
        let mut arena = Arena::new(1 << 20).unwrap();
        // A trailing guard allocation keeps `big` from being physically
        // adjacent to top, so releasing it lands in the unsorted bin
        // instead of being re-absorbed into top (release step 7 applies to
        // any chunk adjacent to top, regardless of container).
        let big = arena.allocate(2000);
        let _guard = arena.allocate(16);
        arena.release(big);

        let small = arena.allocate(500);
        assert!(arena.events().iter().any(|e| matches!(e, Event::Split { .. })));
        assert!(arena.chunk_by_user_pointer(small).unwrap().inuse);
    }

    #[test]
    fn coalesce_merges_adjacent_free_neighbours() {
        logger();
        let mut arena = Arena::new(1 << 20).unwrap();
        let a = arena.allocate(2048);
        let b = arena.allocate(2048);
        arena.release(a);
        arena.release(b);
        let coalesce_events =
            arena.events().iter().filter(|e| matches!(e, Event::Coalesce { .. })).count();
        assert!(coalesce_events >= 1, "freeing two adjacent large chunks must coalesce them");
    }

    #[test]
    fn release_of_null_pointer_is_recorded_not_panicked() {
        logger();
        let mut arena = Arena::new(4096).unwrap();
        arena.release(0);
        assert!(matches!(arena.events().last(), Some(Event::Error { .. })));
    }

    #[test]
    fn release_of_unknown_pointer_is_recorded() {
        logger();
        let mut arena = Arena::new(4096).unwrap();
        arena.release(0xdead_beef);
        assert!(matches!(arena.events().last(), Some(Event::Error { .. })));
    }

    #[test]
    fn double_release_is_recorded_as_not_in_use() {
        logger();
        let mut arena = Arena::new(4096).unwrap();
        let p = arena.allocate(32);
        arena.release(p);
        arena.consolidate();
        arena.release(p);
        assert!(matches!(arena.events().last(), Some(Event::Error { .. })));
    }

    #[test]
    fn growth_past_top_emits_sysmalloc_then_succeeds() {
        logger();
        let mut arena = Arena::new(64).unwrap();
        let ptr = arena.allocate(4096);
        assert!(arena.events().iter().any(|e| matches!(e, Event::Sysmalloc { .. })));
        assert!(arena.chunk_by_user_pointer(ptr).is_some());
    }

    #[test]
    fn every_chunk_is_at_least_min_size() {
        logger();
        let mut arena = Arena::new(1 << 16).unwrap();
        for _ in 0..20 {
            arena.allocate(8);
        }
        let snap = arena.snapshot();
        for chunk in snap.chunks.values() {
            assert!(chunk.size >= MIN_CHUNK_SIZE);
        }
    }

    /// A viewer outside this crate only ever sees `Snapshot`/`Event` through
    /// `serde_json` — exercise that boundary, not just the in-process types.
    #[test]
    fn snapshot_and_events_round_trip_through_json() {
        logger();
        let mut arena = Arena::new(4096).unwrap();
        let p = arena.allocate(24);
        arena.release(p);

        let snap = arena.snapshot();
        let snap_json = serde_json::to_value(&snap).unwrap();
        assert_eq!(snap_json["topSize"], snap.top_size);
        let snap_back: Snapshot = serde_json::from_value(snap_json).unwrap();
        assert_eq!(snap_back, snap);

        let events_json = serde_json::to_value(arena.events()).unwrap();
        let last = events_json.as_array().unwrap().last().unwrap();
        assert_eq!(last["type"], "free");
        let events_back: Vec<Event> = serde_json::from_value(events_json).unwrap();
        assert_eq!(events_back, arena.events());
    }

    /// End-to-end scenario helper plumbed through `anyhow::Result`, the
    /// idiom this crate's own test harness uses to chain several fallible
    /// `Arena::new` calls with `?` instead of `.unwrap()` at each step.
    fn two_arenas_diverge_after_first_allocation() -> anyhow::Result<()> {
        let mut a = Arena::new(4096)?;
        let mut b = Arena::new(4096)?;
        let pa = a.allocate(40);
        let pb = b.allocate(40);
        anyhow::ensure!(pa == pb, "identically constructed arenas must mint the same first address");
        a.release(pa);
        b.release(pb);
        anyhow::ensure!(a.events().len() == b.events().len(), "same call sequence, same event count");
        Ok(())
    }

    #[test]
    fn anyhow_scenario_helper_succeeds() {
        logger();
        two_arenas_diverge_after_first_allocation().unwrap();
    }
}
