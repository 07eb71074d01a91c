// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

//! Block windows for offset/limit paging over height-indexed data.
//!
//! Both calculators are pure and total: any combination of inputs yields
//! either a valid window or `None`, never a panic.

use std::fmt;

/// Inclusive range of block heights, `start_block <= end_block`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockRange {
    pub start_block: u64,
    pub end_block: u64,
}

impl BlockRange {
    pub fn new(start_block: u64, end_block: u64) -> Option<Self> {
        (start_block <= end_block).then_some(Self { start_block, end_block })
    }

    pub fn block_count(&self) -> u64 {
        (self.end_block - self.start_block).saturating_add(1)
    }

    pub fn contains(&self, number: u64) -> bool {
        (self.start_block..=self.end_block).contains(&number)
    }
}

impl fmt::Display for BlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start_block, self.end_block)
    }
}

/// Page `offset / limit` counted back from the chain head.
///
/// The window ends `offset` blocks below `latest_height` and spans at most
/// `limit` blocks downwards, clamped at the genesis block. Returns `None`
/// when the offset points below genesis.
pub fn reverse_window(latest_height: u64, offset: i32, limit: i32) -> Option<BlockRange> {
    let (offset, limit) = page_bounds(offset, limit)?;
    let end_block = latest_height.checked_sub(offset)?;
    let start_block = end_block.saturating_sub(limit - 1);
    Some(BlockRange { start_block, end_block })
}

/// Page `offset / limit` of the explicit range `[number_from, number_to]`.
///
/// Returns `None` when the range is inverted or the offset runs past
/// `number_to`.
pub fn forward_window(
    number_from: u64,
    number_to: u64,
    offset: i32,
    limit: i32,
) -> Option<BlockRange> {
    let (offset, limit) = page_bounds(offset, limit)?;
    if number_from > number_to {
        return None;
    }
    let start_block = number_from.checked_add(offset)?;
    if start_block > number_to {
        return None;
    }
    let end_block = start_block.saturating_add(limit - 1).min(number_to);
    Some(BlockRange { start_block, end_block })
}

fn page_bounds(offset: i32, limit: i32) -> Option<(u64, u64)> {
    if offset < 0 || limit <= 0 {
        return None;
    }
    Some((offset as u64, limit as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start_block: u64, end_block: u64) -> Option<BlockRange> {
        Some(BlockRange { start_block, end_block })
    }

    #[test]
    fn test_reverse_window_pages() {
        assert_eq!(reverse_window(100, 0, 20), range(81, 100));
        assert_eq!(reverse_window(100, 20, 20), range(61, 80));
        assert_eq!(reverse_window(100, 40, 20), range(41, 60));
        assert_eq!(reverse_window(100, 60, 20), range(21, 40));
        // partial final page, genesis included
        assert_eq!(reverse_window(100, 90, 20), range(0, 10));
        assert_eq!(reverse_window(100, 100, 20), range(0, 0));
    }

    #[test]
    fn test_reverse_window_out_of_chain() {
        assert_eq!(reverse_window(50, 60, 20), None);
        assert_eq!(reverse_window(100, 101, 20), None);
        assert_eq!(reverse_window(0, 1, 1), None);
    }

    #[test]
    fn test_reverse_window_short_chain() {
        assert_eq!(reverse_window(5, 0, 20), range(0, 5));
        assert_eq!(reverse_window(5, 0, 20).map(|r| r.block_count()), Some(6));
        assert_eq!(reverse_window(0, 0, 20), range(0, 0));
    }

    #[test]
    fn test_reverse_window_invariants() {
        for latest in [0u64, 1, 7, 19, 20, 21, 100, 1_000] {
            for limit in [1, 2, 5, 20, 33] {
                for offset in 0..=(latest as i32 + 5) {
                    match reverse_window(latest, offset, limit) {
                        Some(window) => {
                            assert!(offset as u64 <= latest);
                            assert_eq!(window.end_block, latest - offset as u64);
                            assert!(window.start_block <= window.end_block);
                            assert!(window.block_count() <= limit as u64);
                        }
                        None => assert!(offset as u64 > latest),
                    }
                }
            }
        }
    }

    #[test]
    fn test_forward_window_pages() {
        assert_eq!(forward_window(50, 150, 0, 20), range(50, 69));
        assert_eq!(forward_window(50, 150, 20, 20), range(70, 89));
        assert_eq!(forward_window(50, 60, 20, 20), None);
        assert_eq!(forward_window(50, 65, 10, 20), range(60, 65));
        assert_eq!(forward_window(7, 7, 0, 20), range(7, 7));
    }

    #[test]
    fn test_forward_windows_tile_the_range() {
        for (from, to) in [(0u64, 0u64), (50, 150), (50, 65), (3, 1_000)] {
            for limit in [1, 7, 20] {
                let mut offset = 0;
                let mut covered = 0;
                let mut last_end: Option<u64> = None;
                while let Some(window) = forward_window(from, to, offset, limit) {
                    if let Some(end) = last_end {
                        assert_eq!(window.start_block, end + 1);
                    } else {
                        assert_eq!(window.start_block, from);
                    }
                    assert!(window.block_count() <= limit as u64);
                    covered += window.block_count();
                    last_end = Some(window.end_block);
                    offset += limit;
                }
                assert_eq!(last_end, Some(to));
                assert_eq!(covered, to - from + 1);
            }
        }
    }

    #[test]
    fn test_windows_reject_bad_paging() {
        assert_eq!(reverse_window(100, -1, 20), None);
        assert_eq!(reverse_window(100, 0, 0), None);
        assert_eq!(forward_window(0, 100, 0, -5), None);
        assert_eq!(forward_window(10, 5, 0, 20), None);
        assert_eq!(
            forward_window(u64::MAX - 1, u64::MAX, 0, i32::MAX),
            range(u64::MAX - 1, u64::MAX)
        );
    }

    #[test]
    fn test_block_range_new() {
        assert_eq!(BlockRange::new(3, 2), None);
        let r = BlockRange::new(2, 4).unwrap();
        assert!(r.contains(3));
        assert!(!r.contains(5));
        assert_eq!(r.to_string(), "[2, 4]");
    }
}
