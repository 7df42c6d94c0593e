//! Bin containers: the tiered free-list hierarchy a freed chunk moves
//! through before a later allocation reclaims it.
//!
//! Every bin is an intrusive list addressed through [`ChunkStore`] rather
//! than through direct references, which is what lets a single flat map
//! stand in for fastbins, the unsorted bin, smallbins, largebins, and the
//! tcache all at once. [`Bins`] also keeps a `membership` side-table so
//! "which container is chunk X currently in?" (needed by the coalescing
//! neighbour lookup) is O(1) rather than a linear scan across every
//! container — a back-pointer is a legitimate acceleration of the same
//! contract as long as the coalesce behaviour it backs is unchanged.

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::chunk::{Address, ChunkStore};
use crate::size_class::{
    FASTBIN_COUNT, LARGEBIN_COUNT, SMALLBIN_COUNT, TCACHE_CAPACITY, fastbin_index, largebin_index,
};

/// Which container a free chunk currently sits in. Purely an internal
/// bookkeeping tag — it is never part of the serialized [`crate::Chunk`],
/// only of [`Bins`]'s private side-table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Tcache(usize),
    Fastbin(usize),
    Unsorted,
    Smallbin(usize),
    Largebin(usize),
}

/// The five free-list tiers, minus the chunk storage itself.
#[derive(Debug, Clone)]
pub struct Bins {
    fastbins: [Option<Address>; FASTBIN_COUNT],
    tcache: BTreeMap<usize, VecDeque<Address>>,
    unsorted: Option<Address>,
    smallbins: [Option<Address>; SMALLBIN_COUNT],
    largebins: [Option<Address>; LARGEBIN_COUNT],
    membership: HashMap<Address, Membership>,
}

impl Default for Bins {
    fn default() -> Self {
        Bins {
            fastbins: [None; FASTBIN_COUNT],
            tcache: BTreeMap::new(),
            unsorted: None,
            smallbins: [None; SMALLBIN_COUNT],
            largebins: [None; LARGEBIN_COUNT],
            membership: HashMap::new(),
        }
    }
}

impl Bins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn membership_of(&self, addr: Address) -> Option<Membership> {
        self.membership.get(&addr).copied()
    }

    pub fn fastbin_head(&self, idx: usize) -> Option<Address> {
        self.fastbins[idx]
    }

    pub fn unsorted_head(&self) -> Option<Address> {
        self.unsorted
    }

    pub fn smallbin_head(&self, idx: usize) -> Option<Address> {
        self.smallbins[idx]
    }

    pub fn largebin_head(&self, idx: usize) -> Option<Address> {
        self.largebins[idx]
    }

    pub fn fastbins(&self) -> &[Option<Address>; FASTBIN_COUNT] {
        &self.fastbins
    }

    pub fn smallbins(&self) -> &[Option<Address>; SMALLBIN_COUNT] {
        &self.smallbins
    }

    pub fn largebins(&self) -> &[Option<Address>; LARGEBIN_COUNT] {
        &self.largebins
    }

    pub fn tcache(&self) -> &BTreeMap<usize, VecDeque<Address>> {
        &self.tcache
    }

    // ---- fastbin ----------------------------------------------------

    /// Fastbin push: `c.fd = head[idx]; head[idx] = c`.
    pub fn fastbin_push(&mut self, store: &mut ChunkStore, idx: usize, addr: Address) {
        let head = self.fastbins[idx];
        let chunk = store.get_mut(addr).expect("chunk must exist");
        chunk.fd = head;
        chunk.bk = None;
        self.fastbins[idx] = Some(addr);
        self.membership.insert(addr, Membership::Fastbin(idx));
    }

    /// Fastbin pop: detach head; return head or null.
    pub fn fastbin_pop(&mut self, store: &mut ChunkStore, idx: usize) -> Option<Address> {
        let head = self.fastbins[idx]?;
        let next = store.get(head).unwrap().fd;
        self.fastbins[idx] = next;
        store.get_mut(head).unwrap().clear_list_pointers();
        self.membership.remove(&head);
        Some(head)
    }

    pub fn fastbin_index_of(&self, chunk_size: usize) -> Option<usize> {
        fastbin_index(chunk_size)
    }

    // ---- circular doubly-linked helper (shared by unsorted/smallbin) ---

    fn ring_insert_tail(&mut self, store: &mut ChunkStore, head_slot: &mut Option<Address>, addr: Address) {
        match *head_slot {
            None => {
                let c = store.get_mut(addr).unwrap();
                c.fd = Some(addr);
                c.bk = Some(addr);
                *head_slot = Some(addr);
            }
            Some(head) => {
                let old_tail = store.get(head).unwrap().bk.unwrap();
                {
                    let c = store.get_mut(addr).unwrap();
                    c.fd = Some(head);
                    c.bk = Some(old_tail);
                }
                store.get_mut(old_tail).unwrap().fd = Some(addr);
                store.get_mut(head).unwrap().bk = Some(addr);
            }
        }
    }

    /// Unlinks `addr` from the circular ring anchored at `*head_slot`,
    /// migrating the head forward if `addr` was the head.
    fn ring_unlink(&mut self, store: &mut ChunkStore, head_slot: &mut Option<Address>, addr: Address) {
        let (fd, bk) = {
            let c = store.get(addr).unwrap();
            (c.fd.unwrap(), c.bk.unwrap())
        };
        if fd == addr {
            *head_slot = None;
        } else {
            store.get_mut(fd).unwrap().bk = Some(bk);
            store.get_mut(bk).unwrap().fd = Some(fd);
            if *head_slot == Some(addr) {
                *head_slot = Some(fd);
            }
        }
        store.get_mut(addr).unwrap().clear_list_pointers();
    }

    // ---- unsorted -----------------------------------------------------

    /// Unsorted insert: append at the tail (logically "before head");
    /// first insertion creates a self-referential singleton.
    pub fn unsorted_insert(&mut self, store: &mut ChunkStore, addr: Address) {
        let mut head = self.unsorted;
        self.ring_insert_tail(store, &mut head, addr);
        self.unsorted = head;
        self.membership.insert(addr, Membership::Unsorted);
    }

    /// Unsorted scan-and-take: walk forward from head one full revolution,
    /// returning the first chunk satisfying `predicate`. Breaks on
    /// revisiting the starting address rather than relying on `fd` ever
    /// being null, so a malformed ring can't spin this forever.
    pub fn unsorted_take<F: Fn(usize) -> bool>(
        &mut self,
        store: &mut ChunkStore,
        predicate: F,
    ) -> Option<Address> {
        let start = self.unsorted?;
        let mut cur = start;
        loop {
            let size = store.get(cur).unwrap().size;
            if predicate(size) {
                let mut head = self.unsorted;
                self.ring_unlink(store, &mut head, cur);
                self.unsorted = head;
                self.membership.remove(&cur);
                return Some(cur);
            }
            let next = store.get(cur).unwrap().fd.unwrap();
            if next == start {
                return None;
            }
            cur = next;
        }
    }

    // ---- smallbin -------------------------------------------------------

    /// Smallbins are FIFO, insert-at-tail.
    pub fn smallbin_insert(&mut self, store: &mut ChunkStore, idx: usize, addr: Address) {
        let mut head = self.smallbins[idx];
        self.ring_insert_tail(store, &mut head, addr);
        self.smallbins[idx] = head;
        self.membership.insert(addr, Membership::Smallbin(idx));
    }

    /// Smallbin take: always take head; clears the slot on the singleton
    /// case.
    pub fn smallbin_take(&mut self, store: &mut ChunkStore, idx: usize) -> Option<Address> {
        let head = self.smallbins[idx]?;
        let mut slot = self.smallbins[idx];
        self.ring_unlink(store, &mut slot, head);
        self.smallbins[idx] = slot;
        self.membership.remove(&head);
        Some(head)
    }

    // ---- largebin ---------------------------------------------------------
    //
    // The address ring (fd/bk) and the size-sorted ring (fd_nextsize/
    // bk_nextsize) are maintained to mirror the exact same order: both
    // rings hold the same elements in ascending-size order, with `head`
    // always pointing at the smallest member. Only the size ring's
    // non-decreasing order and the existence of both rings matter for
    // correctness; nothing requires the address ring to carry independent
    // insertion-order semantics. Mirroring the rings keeps best-fit search
    // and unlink a single walk instead of two.

    /// New chunks are placed immediately before the first strictly
    /// greater-size element; equal sizes land adjacent in insertion order.
    pub fn largebin_insert(&mut self, store: &mut ChunkStore, idx: usize, addr: Address) {
        let size = store.get(addr).unwrap().size;
        match self.largebins[idx] {
            None => {
                let c = store.get_mut(addr).unwrap();
                c.fd = Some(addr);
                c.bk = Some(addr);
                c.fd_nextsize = Some(addr);
                c.bk_nextsize = Some(addr);
                self.largebins[idx] = Some(addr);
            }
            Some(head) => {
                // Find the first node with size > `size`, walking ascending
                // from head; insert before it. If none exists, insert at
                // the end (i.e. before head, becoming the new tail).
                let mut cur = head;
                let insert_before = loop {
                    let cur_size = store.get(cur).unwrap().size;
                    if cur_size > size {
                        break cur;
                    }
                    let next = store.get(cur).unwrap().fd_nextsize.unwrap();
                    if next == head {
                        break head;
                    }
                    cur = next;
                };

                let prev = store.get(insert_before).unwrap().bk_nextsize.unwrap();
                {
                    let c = store.get_mut(addr).unwrap();
                    c.fd_nextsize = Some(insert_before);
                    c.bk_nextsize = Some(prev);
                    c.fd = Some(insert_before);
                    c.bk = Some(prev);
                }
                store.get_mut(prev).unwrap().fd_nextsize = Some(addr);
                store.get_mut(prev).unwrap().fd = Some(addr);
                store.get_mut(insert_before).unwrap().bk_nextsize = Some(addr);
                store.get_mut(insert_before).unwrap().bk = Some(addr);

                if insert_before == head && size < store.get(head).unwrap().size {
                    self.largebins[idx] = Some(addr);
                }
            }
        }
        self.membership.insert(addr, Membership::Largebin(idx));
    }

    fn largebin_unlink(&mut self, store: &mut ChunkStore, idx: usize, addr: Address) {
        let (fd, bk) = {
            let c = store.get(addr).unwrap();
            (c.fd_nextsize.unwrap(), c.bk_nextsize.unwrap())
        };
        if fd == addr {
            self.largebins[idx] = None;
        } else {
            store.get_mut(fd).unwrap().bk_nextsize = Some(bk);
            store.get_mut(bk).unwrap().fd_nextsize = Some(fd);
            store.get_mut(fd).unwrap().bk = Some(bk);
            store.get_mut(bk).unwrap().fd = Some(fd);
            if self.largebins[idx] == Some(addr) {
                self.largebins[idx] = Some(fd);
            }
        }
        store.get_mut(addr).unwrap().clear_list_pointers();
        self.membership.remove(&addr);
    }

    /// Largebin search: starting at `largebin_index(need)`, walk bins
    /// smallest-first; within a bin, walk the size ring ascending and
    /// return the first chunk whose size is `>= need`, along with the
    /// index of the bin it was found in (for event/source labelling).
    pub fn largebin_search(&mut self, store: &mut ChunkStore, need: usize) -> Option<(Address, usize)> {
        let start_idx = largebin_index(need);
        for idx in start_idx..LARGEBIN_COUNT {
            let Some(head) = self.largebins[idx] else { continue };
            let mut cur = head;
            loop {
                let size = store.get(cur).unwrap().size;
                if size >= need {
                    self.largebin_unlink(store, idx, cur);
                    return Some((cur, idx));
                }
                let next = store.get(cur).unwrap().fd_nextsize.unwrap();
                if next == head {
                    break;
                }
                cur = next;
            }
        }
        None
    }

    // ---- tcache -----------------------------------------------------------

    pub fn tcache_len(&self, size: usize) -> usize {
        self.tcache.get(&size).map_or(0, VecDeque::len)
    }

    pub fn tcache_is_full(&self, size: usize) -> bool {
        self.tcache_len(size) >= TCACHE_CAPACITY
    }

    /// Pushes the most-recently-freed chunk of this size (LIFO).
    pub fn tcache_push(&mut self, store: &mut ChunkStore, size: usize, addr: Address) {
        store.get_mut(addr).unwrap().clear_list_pointers();
        self.tcache.entry(size).or_default().push_back(addr);
        self.membership.insert(addr, Membership::Tcache(size));
    }

    /// Pops the most-recently-freed chunk of this size (LIFO).
    pub fn tcache_pop(&mut self, size: usize) -> Option<Address> {
        let addr = self.tcache.get_mut(&size)?.pop_back()?;
        self.membership.remove(&addr);
        Some(addr)
    }

    // ---- coalescing support ------------------------------------------------

    /// "Unlink-if-binned": locates `addr`'s current container among
    /// {unsorted, smallbins, largebins} and unlinks it. Fastbin and tcache
    /// members are deliberately excluded — fastbin chunks retain fastbin
    /// status until a later consolidation pass, and tcache chunks are
    /// quasi-in-use for the same reason. Returns `true` if something was
    /// unlinked.
    pub fn unlink_if_coalescable(&mut self, store: &mut ChunkStore, addr: Address) -> bool {
        match self.membership_of(addr) {
            Some(Membership::Unsorted) => {
                let mut head = self.unsorted;
                self.ring_unlink(store, &mut head, addr);
                self.unsorted = head;
                self.membership.remove(&addr);
                true
            }
            Some(Membership::Smallbin(idx)) => {
                let mut head = self.smallbins[idx];
                self.ring_unlink(store, &mut head, addr);
                self.smallbins[idx] = head;
                self.membership.remove(&addr);
                true
            }
            Some(Membership::Largebin(idx)) => {
                self.largebin_unlink(store, idx, addr);
                true
            }
            _ => false,
        }
    }

    /// Whether `addr` is currently free and coalescable — i.e. sitting in
    /// unsorted/smallbin/largebin, as opposed to fastbin/tcache (quasi
    /// in-use for adjacency purposes) or genuinely allocated.
    pub fn is_coalescable(&self, addr: Address) -> bool {
        matches!(
            self.membership_of(addr),
            Some(Membership::Unsorted) | Some(Membership::Smallbin(_)) | Some(Membership::Largebin(_))
        )
    }

    /// Drains every fastbin, returning the freed addresses in LIFO-within-
    /// bin, ascending-bin-index order, and clearing every fastbin head.
    /// Used by consolidation.
    pub fn drain_fastbins(&mut self, store: &mut ChunkStore) -> Vec<Address> {
        let mut drained = Vec::new();
        for idx in 0..FASTBIN_COUNT {
            while let Some(addr) = self.fastbin_pop(store, idx) {
                drained.push(addr);
            }
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Chunk;

    /// A bare store pre-populated with free chunks at the given
    /// `(addr, size)` pairs, with no regard for heap bounds or adjacency —
    /// `Bins` only ever addresses chunks through `store.get`/`get_mut`, so
    /// this is enough to exercise the containers in isolation from `Arena`.
    fn store_with(chunks: &[(Address, usize)]) -> ChunkStore {
        let mut store = ChunkStore::new(0x1000, 1 << 20);
        for &(addr, size) in chunks {
            store.insert(Chunk::raw(addr, size, false, true));
        }
        store
    }

    #[test]
    fn fastbin_pop_is_lifo() {
        let mut store = store_with(&[(0x2000, 32), (0x2100, 32), (0x2200, 32)]);
        let mut bins = Bins::new();
        bins.fastbin_push(&mut store, 0, 0x2000);
        bins.fastbin_push(&mut store, 0, 0x2100);
        bins.fastbin_push(&mut store, 0, 0x2200);

        assert_eq!(bins.fastbin_pop(&mut store, 0), Some(0x2200));
        assert_eq!(bins.fastbin_pop(&mut store, 0), Some(0x2100));
        assert_eq!(bins.fastbin_pop(&mut store, 0), Some(0x2000));
        assert_eq!(bins.fastbin_pop(&mut store, 0), None);
    }

    #[test]
    fn tcache_pop_is_lifo() {
        let mut store = store_with(&[(0x2000, 32), (0x2100, 32), (0x2200, 32)]);
        let mut bins = Bins::new();
        bins.tcache_push(&mut store, 32, 0x2000);
        bins.tcache_push(&mut store, 32, 0x2100);
        bins.tcache_push(&mut store, 32, 0x2200);

        assert_eq!(bins.tcache_pop(32), Some(0x2200));
        assert_eq!(bins.tcache_pop(32), Some(0x2100));
        assert_eq!(bins.tcache_pop(32), Some(0x2000));
        assert_eq!(bins.tcache_pop(32), None);
    }

    #[test]
    fn smallbin_take_is_fifo() {
        let mut store = store_with(&[(0x2000, 64), (0x2100, 64), (0x2200, 64)]);
        let mut bins = Bins::new();
        bins.smallbin_insert(&mut store, 2, 0x2000);
        bins.smallbin_insert(&mut store, 2, 0x2100);
        bins.smallbin_insert(&mut store, 2, 0x2200);

        assert_eq!(bins.smallbin_take(&mut store, 2), Some(0x2000), "FIFO: least-recently inserted comes out first");
        assert_eq!(bins.smallbin_take(&mut store, 2), Some(0x2100));
        assert_eq!(bins.smallbin_take(&mut store, 2), Some(0x2200));
        assert_eq!(bins.smallbin_take(&mut store, 2), None);
    }

    #[test]
    fn unsorted_take_returns_first_satisfying_match_not_the_smallest() {
        let mut store = store_with(&[(0x2000, 32), (0x2100, 96), (0x2200, 48)]);
        let mut bins = Bins::new();
        bins.unsorted_insert(&mut store, 0x2000);
        bins.unsorted_insert(&mut store, 0x2100);
        bins.unsorted_insert(&mut store, 0x2200);

        let found = bins.unsorted_take(&mut store, |size| size >= 48).unwrap();
        assert_eq!(found, 0x2100, "walk order is insertion order, not size order");
        assert_eq!(bins.unsorted_take(&mut store, |size| size >= 48), Some(0x2200));
        assert_eq!(bins.unsorted_take(&mut store, |size| size >= 48), None);
    }

    #[test]
    fn largebin_insert_migrates_head_to_the_smallest_member() {
        // Insert largest-first so the first two insertions each force a
        // head migration, exercising bins.rs's `insert_before == head`
        // branch rather than only ever appending past a fixed head.
        let mut store = store_with(&[(0x2000, 120), (0x2100, 70), (0x2200, 90)]);
        let idx = largebin_index(70);
        assert_eq!(largebin_index(90), idx, "fixture sizes must share one bin for this test to be meaningful");
        assert_eq!(largebin_index(120), idx);
        let mut bins = Bins::new();

        bins.largebin_insert(&mut store, idx, 0x2000); // singleton: head = 120
        assert_eq!(bins.largebin_head(idx), Some(0x2000));

        bins.largebin_insert(&mut store, idx, 0x2100); // 70 < 120: head migrates to 70
        assert_eq!(bins.largebin_head(idx), Some(0x2100));

        bins.largebin_insert(&mut store, idx, 0x2200); // 90 sits between 70 and 120: head unchanged
        assert_eq!(bins.largebin_head(idx), Some(0x2100));
    }

    #[test]
    fn largebin_search_is_minimum_size_best_fit_within_a_bin() {
        let mut store = store_with(&[(0x2000, 120), (0x2100, 70), (0x2200, 90)]);
        let idx = largebin_index(70);
        let mut bins = Bins::new();
        bins.largebin_insert(&mut store, idx, 0x2000);
        bins.largebin_insert(&mut store, idx, 0x2100);
        bins.largebin_insert(&mut store, idx, 0x2200);

        // 70 is too small; 90 is the minimum size >= 80 in this bin, not 120.
        let (addr, found_idx) = bins.largebin_search(&mut store, 80).unwrap();
        assert_eq!((addr, found_idx), (0x2200, idx));

        // With 90 removed, the next best fit for the same request is 120.
        let (addr, _) = bins.largebin_search(&mut store, 80).unwrap();
        assert_eq!(addr, 0x2000);
    }

    #[test]
    fn largebin_search_walks_up_to_a_higher_populated_bin() {
        let mut store = store_with(&[(0x2000, 70), (0x3000, 5000)]);
        let mut bins = Bins::new();
        bins.largebin_insert(&mut store, largebin_index(70), 0x2000);
        bins.largebin_insert(&mut store, largebin_index(5000), 0x3000);

        // A request whose own bin is empty must keep walking upward.
        let need = 3000;
        assert!(bins.largebin_head(largebin_index(need)).is_none());
        let (addr, _) = bins.largebin_search(&mut store, need).unwrap();
        assert_eq!(addr, 0x3000);
    }

    #[test]
    fn fastbin_and_tcache_members_are_not_coalescable() {
        let mut store = store_with(&[(0x2000, 32), (0x2100, 32)]);
        let mut bins = Bins::new();
        bins.fastbin_push(&mut store, 0, 0x2000);
        bins.tcache_push(&mut store, 32, 0x2100);

        assert!(!bins.is_coalescable(0x2000));
        assert!(!bins.is_coalescable(0x2100));
        assert!(!bins.unlink_if_coalescable(&mut store, 0x2000));
        assert!(!bins.unlink_if_coalescable(&mut store, 0x2100));
        // Fastbin/tcache membership must be untouched by a failed coalesce attempt.
        assert_eq!(bins.fastbin_head(0), Some(0x2000));
        assert_eq!(bins.tcache_pop(32), Some(0x2100));
    }

    #[test]
    fn unsorted_member_is_coalescable_and_unlinks_cleanly() {
        let mut store = store_with(&[(0x2000, 400)]);
        let mut bins = Bins::new();
        bins.unsorted_insert(&mut store, 0x2000);

        assert!(bins.is_coalescable(0x2000));
        assert!(bins.unlink_if_coalescable(&mut store, 0x2000));
        assert!(bins.unsorted_head().is_none());
        assert_eq!(store.get(0x2000).unwrap().fd, None, "list pointers must be nulled on unlink");
    }
}
