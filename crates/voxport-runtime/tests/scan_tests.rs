use proptest::prelude::*;
use voxport_quad::BlockPos;
use voxport_runtime::{CHUNK_SIZE, ExportRegion, partition};

proptest! {
    #[test]
    fn units_tile_the_region(
        cx in -100i32..100,
        cz in -100i32..100,
        radius in 0i32..40,
        lower in 0i32..8,
        height in 0i32..8,
    ) {
        let region = ExportRegion::around(BlockPos::new(cx, 64, cz), radius, lower, lower + height);
        let units = region.units();
        let total: usize = units.iter().map(|u| u.block_count()).sum();
        prop_assert_eq!(total, region.block_count());

        for (i, u) in units.iter().enumerate() {
            prop_assert!(region.contains(u.min) && region.contains(u.max));
            prop_assert_eq!(u.min.x.div_euclid(CHUNK_SIZE), u.chunk_x);
            prop_assert_eq!(u.max.z.div_euclid(CHUNK_SIZE), u.chunk_z);
            for other in &units[i + 1..] {
                let apart = u.max.x < other.min.x
                    || other.max.x < u.min.x
                    || u.max.z < other.min.z
                    || other.max.z < u.min.z;
                prop_assert!(apart);
            }
        }
    }

    #[test]
    fn partition_keeps_scan_order(len in 0usize..60, workers in 1usize..12) {
        let region = ExportRegion {
            start: BlockPos::new(len as i32 * CHUNK_SIZE - 1, 0, 0),
            end: BlockPos::new(0, 0, 0),
        };
        let units = region.units();
        prop_assert_eq!(units.len(), len);
        let batches = partition(units.clone(), workers);
        prop_assert!(batches.len() <= workers);
        prop_assert!(batches.iter().all(|b| !b.is_empty()));
        let flat: Vec<_> = batches.into_iter().flatten().collect();
        prop_assert_eq!(flat, units);
    }
}
