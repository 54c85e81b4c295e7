use voxport_quad::BlockPos;

use crate::host::ChunkUnit;

pub const CHUNK_SIZE: i32 = 16;

/// Inclusive block box scanned from its `start` (maximum) corner down to its `end`
/// (minimum) corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportRegion {
    pub start: BlockPos,
    pub end: BlockPos,
}

impl ExportRegion {
    pub fn around(center: BlockPos, radius: i32, lower: i32, upper: i32) -> Self {
        Self {
            start: BlockPos::new(center.x + radius, upper, center.z + radius),
            end: BlockPos::new(center.x - radius, lower, center.z - radius),
        }
    }

    #[inline]
    pub fn contains(&self, p: BlockPos) -> bool {
        (self.end.x..=self.start.x).contains(&p.x)
            && (self.end.y..=self.start.y).contains(&p.y)
            && (self.end.z..=self.start.z).contains(&p.z)
    }

    pub fn block_count(&self) -> usize {
        let span = |lo: i32, hi: i32| (hi - lo + 1).max(0) as usize;
        span(self.end.x, self.start.x)
            * span(self.end.y, self.start.y)
            * span(self.end.z, self.start.z)
    }

    /// Chunk-aligned work units in scan order: x descending within a row of chunks,
    /// rows by descending z.
    pub fn units(&self) -> Vec<ChunkUnit> {
        let mut out = Vec::new();
        if self.end.y > self.start.y {
            return out;
        }
        let mut z = self.start.z;
        while z >= self.end.z {
            let unit_end_z = (z - z.rem_euclid(CHUNK_SIZE)).max(self.end.z);
            let mut x = self.start.x;
            while x >= self.end.x {
                let unit_end_x = (x - x.rem_euclid(CHUNK_SIZE)).max(self.end.x);
                out.push(ChunkUnit {
                    chunk_x: x.div_euclid(CHUNK_SIZE),
                    chunk_z: z.div_euclid(CHUNK_SIZE),
                    min: BlockPos::new(unit_end_x, self.end.y, unit_end_z),
                    max: BlockPos::new(x, self.start.y, z),
                    region: *self,
                });
                x = unit_end_x - 1;
            }
            z = unit_end_z - 1;
        }
        out
    }
}

/// Splits the scan into consecutive runs of `ceil(len / workers)` units, one per worker.
pub fn partition(units: Vec<ChunkUnit>, workers: usize) -> Vec<Vec<ChunkUnit>> {
    if units.is_empty() {
        return Vec::new();
    }
    let size = units.len().div_ceil(workers.max(1));
    units.chunks(size).map(<[ChunkUnit]>::to_vec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_chunk_region() {
        let r = ExportRegion::around(BlockPos::new(5, 0, 5), 2, 0, 3);
        let units = r.units();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].min, BlockPos::new(3, 0, 3));
        assert_eq!(units[0].max, BlockPos::new(7, 3, 7));
    }

    #[test]
    fn scan_runs_x_then_z_descending() {
        let r = ExportRegion::around(BlockPos::new(8, 0, 8), 16, 0, 0);
        let coords: Vec<(i32, i32)> = r.units().iter().map(|u| (u.chunk_x, u.chunk_z)).collect();
        assert_eq!(
            coords,
            vec![
                (1, 1),
                (0, 1),
                (-1, 1),
                (1, 0),
                (0, 0),
                (-1, 0),
                (1, -1),
                (0, -1),
                (-1, -1),
            ]
        );
    }

    #[test]
    fn partition_is_balanced() {
        let r = ExportRegion::around(BlockPos::new(8, 0, 8), 16, 0, 0);
        let batches = partition(r.units(), 4);
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 3]);
        assert!(partition(Vec::new(), 4).is_empty());
    }
}
