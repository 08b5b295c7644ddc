use serde::{Deserialize, Serialize};

/// Seabed heightmap — world Y of the terrain sampled at (x, z).
/// Seabed-bound species clamp against this so they never sink into rock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeabedGrid {
    /// Height values, row-major (z rows of x columns).
    pub heights: Vec<f32>,
    pub resolution: usize,
    /// World-space corner covered by cell (0, 0).
    pub origin_x: f32,
    pub origin_z: f32,
    /// World size of the grid along each axis.
    pub extent: f32,
    /// Height returned outside the grid.
    pub fallback_height: f32,
}

impl SeabedGrid {
    /// A flat seabed at the given height, used when a location ships
    /// no heightmap.
    pub fn flat(height: f32) -> Self {
        Self {
            heights: vec![height],
            resolution: 1,
            origin_x: 0.0,
            origin_z: 0.0,
            extent: 1.0,
            fallback_height: height,
        }
    }

    /// Sample the seabed height at a world (x, z) with bilinear filtering.
    /// Outside the grid returns `fallback_height`.
    pub fn sample(&self, x: f32, z: f32) -> f32 {
        if self.resolution == 0 || self.heights.is_empty() {
            return self.fallback_height;
        }
        if self.resolution == 1 {
            return self.heights[0];
        }

        let cell = self.extent / (self.resolution - 1) as f32;
        let fx = (x - self.origin_x) / cell;
        let fz = (z - self.origin_z) / cell;
        if fx < 0.0 || fz < 0.0 {
            return self.fallback_height;
        }

        let max = (self.resolution - 1) as f32;
        if fx > max || fz > max {
            return self.fallback_height;
        }

        let x0 = (fx.floor() as usize).min(self.resolution - 2);
        let z0 = (fz.floor() as usize).min(self.resolution - 2);
        let tx = fx - x0 as f32;
        let tz = fz - z0 as f32;

        let at = |cx: usize, cz: usize| self.heights[cz * self.resolution + cx];
        let h00 = at(x0, z0);
        let h10 = at(x0 + 1, z0);
        let h01 = at(x0, z0 + 1);
        let h11 = at(x0 + 1, z0 + 1);

        let top = h00 + (h10 - h00) * tx;
        let bottom = h01 + (h11 - h01) * tx;
        top + (bottom - top) * tz
    }
}
