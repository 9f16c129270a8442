//! Property tests for region enumeration, walking and search over mock processes

use memwalk::memory::mock::MockProcess;
use memwalk::memory::regions::readable_regions;
use memwalk::{find_bytes, walk, walk_sliding, Address, MemoryRegion};
use proptest::prelude::*;
use std::ops::ControlFlow;

const BASE: usize = 0x10000;

/// Segments of (size, readable, gap before) laid out upward from `BASE`
fn layout() -> impl Strategy<Value = Vec<(usize, bool, usize)>> {
    prop::collection::vec((1usize..0x900, any::<bool>(), 0usize..0x200), 1..8)
}

fn build(segments: &[(usize, bool, usize)]) -> MockProcess {
    let mut builder = MockProcess::builder();
    let mut address = BASE;
    for &(size, readable, gap) in segments {
        address += gap;
        builder = if readable {
            builder.readable_pattern(address, size)
        } else {
            builder.unreadable(address, size)
        };
        address += size;
    }
    builder.build().unwrap()
}

fn chunks(process: &MockProcess, buffer_size: usize, sliding: bool) -> Vec<(Address, usize)> {
    let mut seen = Vec::new();
    let visit = |address: Address, chunk: &[u8]| {
        seen.push((address, chunk.len()));
        ControlFlow::Continue(())
    };
    let outcome = if sliding {
        walk_sliding(process, Address::null(), buffer_size, visit)
    } else {
        walk(process, Address::null(), buffer_size, visit)
    };
    outcome.result.unwrap();
    seen
}

fn within(region: &MemoryRegion, chunks: &[(Address, usize)]) -> Vec<(Address, usize)> {
    chunks
        .iter()
        .copied()
        .filter(|(address, _)| region.contains(*address))
        .collect()
}

proptest! {
    #[test]
    fn regions_strictly_ascend(segments in layout()) {
        let process = build(&segments);
        let regions = readable_regions(&process, Address::null()).result.unwrap();
        for pair in regions.windows(2) {
            prop_assert!(pair[1].address() >= pair[0].end());
        }
    }

    #[test]
    fn walk_covers_every_region(segments in layout(), buffer_size in 1usize..0x400) {
        let process = build(&segments);
        let regions = readable_regions(&process, Address::null()).result.unwrap();
        let seen = chunks(&process, buffer_size, false);

        for region in &regions {
            let region_chunks = within(region, &seen);
            let mut covered = region.address();
            for &(address, len) in &region_chunks {
                prop_assert!(address <= covered, "gap before {}", address);
                prop_assert!(len <= buffer_size);
                covered = covered.max(address.saturating_add(len));
            }
            prop_assert_eq!(covered, region.end());

            // Only the final chunk may overlap its predecessor
            prop_assert_eq!(region_chunks[0].0, region.address());
            let body = &region_chunks[..region_chunks.len() - 1];
            for pair in body.windows(2) {
                prop_assert_eq!(pair[1].0, pair[0].0.saturating_add(pair[0].1));
            }
        }
    }

    #[test]
    fn sliding_chunks_overlap_by_half(segments in layout(), half in 1usize..0x200) {
        let buffer_size = half * 2;
        let process = build(&segments);
        let regions = readable_regions(&process, Address::null()).result.unwrap();
        let seen = chunks(&process, buffer_size, true);

        for region in &regions {
            let region_chunks = within(region, &seen);
            prop_assert!(!region_chunks.is_empty());
            let (last, body) = region_chunks.split_last().unwrap();
            prop_assert_eq!(last.0.saturating_add(last.1), region.end());
            for pair in body.windows(2) {
                prop_assert_eq!(pair[1].0.as_usize() - pair[0].0.as_usize(), half);
            }
        }
    }

    #[test]
    fn straddling_needle_is_found(
        prefix in 1usize..0x3000,
        needle in prop::collection::vec(any::<u8>(), 1..64),
    ) {
        // Zero filler cannot contain a needle that has a non-zero byte
        prop_assume!(needle.iter().any(|&b| b != 0));
        let mut data = vec![0u8; prefix];
        data.extend_from_slice(&needle);
        data.extend(std::iter::repeat(0).take(0x100));

        let process = MockProcess::builder().readable(BASE, data).build().unwrap();
        let found = find_bytes(&process, Address::null(), &needle).result.unwrap();
        prop_assert_eq!(found, Some(Address::new(BASE + prefix)));
    }
}
