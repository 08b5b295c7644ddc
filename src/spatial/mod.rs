use glam::Vec3;

/// Spatial hash grid for O(1)-ish neighbor queries over agent positions.
///
/// Cell size tracks the largest perception radius among live schools.
/// Uses multiplicative hashing for even bucket distribution. Rebuilt from
/// scratch every tick — a derived index, never authoritative state.
pub struct SpatialHash {
    cell_size: f32,
    inv_cell_size: f32,
    table_size: usize,
    /// Each bucket holds agent slot indices. Pre-allocated, cleared each tick.
    buckets: Vec<Vec<u32>>,
    /// Distinct cells can alias one bucket; the stamp lets a query skip
    /// buckets it already visited without allocating.
    visit_stamp: Vec<u64>,
    query_counter: u64,
}

impl SpatialHash {
    pub fn new(cell_size: f32, table_size: usize) -> Self {
        let mut buckets = Vec::with_capacity(table_size);
        for _ in 0..table_size {
            // Pre-allocate each bucket to avoid allocs during rebuild.
            buckets.push(Vec::with_capacity(8));
        }
        Self {
            cell_size: cell_size.max(f32::EPSILON),
            inv_cell_size: 1.0 / cell_size.max(f32::EPSILON),
            table_size,
            buckets,
            visit_stamp: vec![0; table_size],
            query_counter: 0,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Resize the cells. Callers must rebuild afterwards — existing entries
    /// were bucketed under the old size.
    pub fn set_cell_size(&mut self, cell_size: f32) {
        self.cell_size = cell_size.max(f32::EPSILON);
        self.inv_cell_size = 1.0 / self.cell_size;
    }

    /// Clear all buckets. Call at the start of each rebuild.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear(); // Keeps allocation.
        }
    }

    /// Insert an agent slot at the given position.
    pub fn insert(&mut self, pos: Vec3, slot: u32) {
        let hash = self.hash(pos);
        self.buckets[hash].push(slot);
    }

    /// Visit every agent slot whose cell may intersect the sphere at `pos`
    /// with `radius`. Over-inclusive by up to one cell ring; the caller
    /// applies the exact squared-distance filter. Never misses an agent
    /// that is actually inside the sphere.
    pub fn query_neighbors(&mut self, pos: Vec3, radius: f32, mut callback: impl FnMut(u32)) {
        let reach = (radius * self.inv_cell_size).ceil().max(1.0) as i32;
        let (cx, cy, cz) = self.cell_coords(pos);

        self.query_counter += 1;
        let stamp = self.query_counter;

        for dz in -reach..=reach {
            for dy in -reach..=reach {
                for dx in -reach..=reach {
                    let hash = self.hash_cell(
                        cx.wrapping_add(dx),
                        cy.wrapping_add(dy),
                        cz.wrapping_add(dz),
                    );
                    if self.visit_stamp[hash] == stamp {
                        continue;
                    }
                    self.visit_stamp[hash] = stamp;
                    for &slot in &self.buckets[hash] {
                        callback(slot);
                    }
                }
            }
        }
    }

    fn cell_coords(&self, pos: Vec3) -> (i32, i32, i32) {
        let cx = (pos.x * self.inv_cell_size).floor() as i32;
        let cy = (pos.y * self.inv_cell_size).floor() as i32;
        let cz = (pos.z * self.inv_cell_size).floor() as i32;
        (cx, cy, cz)
    }

    fn hash(&self, pos: Vec3) -> usize {
        let (cx, cy, cz) = self.cell_coords(pos);
        self.hash_cell(cx, cy, cz)
    }

    fn hash_cell(&self, cx: i32, cy: i32, cz: i32) -> usize {
        // Multiplicative spatial hash — good distribution for grid data.
        let h = (cx as u32).wrapping_mul(73856093)
            ^ (cy as u32).wrapping_mul(19349663)
            ^ (cz as u32).wrapping_mul(83492791);
        (h as usize) % self.table_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_query() {
        let mut grid = SpatialHash::new(4.0, 256);
        grid.insert(Vec3::new(10.0, 0.0, 10.0), 0);
        grid.insert(Vec3::new(11.0, 1.0, 10.5), 1);
        grid.insert(Vec3::new(90.0, 0.0, 90.0), 2);

        let mut found = Vec::new();
        grid.query_neighbors(Vec3::new(10.5, 0.2, 10.2), 3.0, |idx| found.push(idx));

        assert!(found.contains(&0));
        assert!(found.contains(&1));
    }

    #[test]
    fn clear_and_reuse() {
        let mut grid = SpatialHash::new(4.0, 256);
        grid.insert(Vec3::new(5.0, 5.0, 5.0), 42);
        grid.clear();

        let mut found = Vec::new();
        grid.query_neighbors(Vec3::new(5.0, 5.0, 5.0), 3.0, |idx| found.push(idx));
        assert!(found.is_empty());
    }

    #[test]
    fn query_yields_each_slot_at_most_once() {
        // A tiny table forces many cells to alias the same buckets; the
        // visit stamp must keep duplicates out of the candidate stream.
        let mut grid = SpatialHash::new(1.0, 7);
        grid.insert(Vec3::ZERO, 3);

        let mut hits = 0;
        grid.query_neighbors(Vec3::ZERO, 4.0, |idx| {
            if idx == 3 {
                hits += 1;
            }
        });
        assert_eq!(hits, 1);
    }

    #[test]
    fn completeness_against_brute_force() {
        let mut rng = fastrand::Rng::with_seed(7);
        let mut grid = SpatialHash::new(5.0, 512);
        let mut positions = Vec::new();
        for i in 0..300u32 {
            let p = Vec3::new(
                rng.f32() * 100.0 - 50.0,
                rng.f32() * 40.0 - 20.0,
                rng.f32() * 100.0 - 50.0,
            );
            positions.push(p);
            grid.insert(p, i);
        }

        let radius = 7.5f32;
        for (i, &origin) in positions.iter().enumerate() {
            let mut from_grid: Vec<u32> = Vec::new();
            grid.query_neighbors(origin, radius, |slot| {
                if slot as usize != i
                    && positions[slot as usize].distance_squared(origin) <= radius * radius
                {
                    from_grid.push(slot);
                }
            });
            from_grid.sort_unstable();

            let mut brute: Vec<u32> = positions
                .iter()
                .enumerate()
                .filter(|&(j, &p)| j != i && p.distance_squared(origin) <= radius * radius)
                .map(|(j, _)| j as u32)
                .collect();
            brute.sort_unstable();

            assert_eq!(from_grid, brute, "neighbor mismatch at agent {i}");
        }
    }
}
