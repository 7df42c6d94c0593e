//! Pure size-classification functions: mapping a chunk size to the bin tier
//! (and slot within it) that owns sizes of that shape. No state, no I/O —
//! every function here is a total function of a size in bytes.
//!
//! The arithmetic mirrors the classifier half of a ptmalloc-style heap
//! reader: the same boundaries a debugger uses to say "this chunk came from
//! fastbin slot 2" are used here in the forward direction, to decide where a
//! chunk of a given size belongs before it exists.

/// Bytes of allocator bookkeeping prepended to every chunk.
pub const HEADER_SIZE: usize = 16;

/// All chunk sizes are multiples of this.
pub const ALIGNMENT: usize = 16;

/// Smallest legal chunk size.
pub const MIN_CHUNK_SIZE: usize = 16;

/// A split remainder must be at least this big or the whole chunk is
/// handed out unsplit.
pub const MIN_SPLIT_REMAINDER: usize = MIN_CHUNK_SIZE + ALIGNMENT;

/// Number of fastbin slots.
pub const FASTBIN_COUNT: usize = 10;

/// Number of smallbin slots.
pub const SMALLBIN_COUNT: usize = 64;

/// Number of largebin slots.
pub const LARGEBIN_COUNT: usize = 32;

/// Largest user request, in bytes, still eligible for the tcache.
pub const TCACHE_MAX_REQUEST: usize = 64;

/// Chunks per tcache size bucket.
pub const TCACHE_CAPACITY: usize = 7;

/// Top-chunk size below which allocation opportunistically consolidates
/// fastbins before continuing its search.
pub const FASTBIN_CONSOLIDATION_THRESHOLD: usize = 8192;

/// Minimum amount `sysmalloc` grows the heap by in one call.
pub const SYSMALLOC_MIN_GROWTH: usize = 65536;

#[inline]
pub(crate) const fn align_up(n: usize, align: usize) -> usize {
    (n + align - 1) / align * align
}

/// `request2size(req) = max(16, alignUp(req + 16, 16))`.
pub const fn request2size(req: usize) -> usize {
    let aligned = align_up(req + HEADER_SIZE, ALIGNMENT);
    if aligned < MIN_CHUNK_SIZE { MIN_CHUNK_SIZE } else { aligned }
}

/// The chunk size of the smallest fastbin-eligible chunk: `request2size(16)`.
pub const FASTBIN_MIN_SIZE: usize = request2size(16);

/// The chunk size of the smallest size ineligible for a smallbin: one step
/// past `request2size(512)`.
pub const SMALLBIN_MAX_SIZE: usize = request2size(512);

/// Maps a chunk size to its fastbin slot, or `None` if `chunk_size` is not
/// fastbin-eligible.
///
/// Fastbins step by 16 bytes starting at the smallest legal chunk size,
/// filling all `FASTBIN_COUNT` slots.
pub fn fastbin_index(chunk_size: usize) -> Option<usize> {
    if chunk_size < FASTBIN_MIN_SIZE {
        return None;
    }
    let delta = chunk_size - FASTBIN_MIN_SIZE;
    if delta % ALIGNMENT != 0 {
        return None;
    }
    let idx = delta / ALIGNMENT;
    if idx < FASTBIN_COUNT { Some(idx) } else { None }
}

/// Maps a chunk size to its smallbin slot, or `None` if `chunk_size` exceeds
/// `request2size(512)`. Uses the same `(size - firstSize) / 16` mapping as
/// the fastbin tier, sharing the same origin size — slots beyond the ones
/// reachable under the 512-byte request cap simply never populate, which is
/// harmless: nothing requires every declared slot to be reachable.
pub fn smallbin_index(chunk_size: usize) -> Option<usize> {
    if chunk_size > SMALLBIN_MAX_SIZE || chunk_size < FASTBIN_MIN_SIZE {
        return None;
    }
    let delta = chunk_size - FASTBIN_MIN_SIZE;
    if delta % ALIGNMENT != 0 {
        return None;
    }
    let idx = delta / ALIGNMENT;
    if idx < SMALLBIN_COUNT { Some(idx) } else { None }
}

/// Coarse `floor(log2(size))` clamped to `[0, 32)`.
///
/// Always returns a slot: the largebin tier is the catch-all for anything
/// not smallbin-eligible, with no further range rejection.
pub fn largebin_index(chunk_size: usize) -> usize {
    if chunk_size == 0 {
        return 0;
    }
    let bits = usize::BITS - chunk_size.leading_zeros() - 1;
    (bits as usize).min(LARGEBIN_COUNT - 1)
}

/// Whether a chunk of this size is eligible to live in the tcache:
/// `chunk_size <= request2size(TCACHE_MAX_REQUEST)`.
pub fn tcache_eligible(chunk_size: usize) -> bool {
    chunk_size <= request2size(TCACHE_MAX_REQUEST)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn request2size_minimum() {
        assert_eq!(request2size(0), 16);
        assert_eq!(request2size(1), 32);
    }

    #[rstest]
    #[case(16, 32)]
    #[case(24, 48)]
    #[case(64, 80)]
    #[case(65, 96)]
    #[case(500, 528)]
    fn request2size_table(#[case] req: usize, #[case] expected: usize) {
        assert_eq!(request2size(req), expected);
    }

    #[test]
    fn fastbin_boundaries() {
        assert_eq!(fastbin_index(FASTBIN_MIN_SIZE), Some(0));
        assert_eq!(fastbin_index(FASTBIN_MIN_SIZE + 16), Some(1));
        assert_eq!(fastbin_index(FASTBIN_MIN_SIZE - 16), None);
        let last = FASTBIN_MIN_SIZE + (FASTBIN_COUNT - 1) * ALIGNMENT;
        assert_eq!(fastbin_index(last), Some(FASTBIN_COUNT - 1));
        assert_eq!(fastbin_index(last + 16), None);
    }

    #[test]
    fn smallbin_rejects_oversize() {
        assert!(smallbin_index(SMALLBIN_MAX_SIZE).is_some());
        assert!(smallbin_index(SMALLBIN_MAX_SIZE + 16).is_none());
    }

    #[test]
    fn largebin_is_clamped_log2() {
        assert_eq!(largebin_index(1), 0);
        assert_eq!(largebin_index(2), 1);
        assert_eq!(largebin_index(1024), 10);
        assert_eq!(largebin_index(usize::MAX), LARGEBIN_COUNT - 1);
    }

    #[test]
    fn tcache_threshold_is_exact() {
        assert!(tcache_eligible(request2size(64)));
        assert!(!tcache_eligible(request2size(65)));
        assert_eq!(request2size(65), 96);
    }
}
