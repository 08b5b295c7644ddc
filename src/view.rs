use serde::{Deserialize, Serialize};

/// Hard cap on simultaneous viewports sharing the simulated world.
pub const MAX_VIEWS: usize = 4;

/// Horizontal screen slice owned by one view, as fractions of the
/// combined framebuffer width. Slices are contiguous and non-overlapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewSlice {
    pub start: f32,
    /// Exclusive.
    pub end: f32,
}

/// Active multi-view layout: up to 4 equal horizontal slices, each with a
/// water-clarity scalar the renderer consumes. Changing the count or a
/// turbidity value marks the config dirty so visibility masks recompute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    views_count: usize,
    /// Turbidity in [-1, 1] per view slot. Slots past `views_count` keep
    /// their last value so toggling view counts doesn't lose settings.
    pub turbidity: [f32; MAX_VIEWS],
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            views_count: 1,
            turbidity: [0.0; MAX_VIEWS],
        }
    }
}

impl ViewConfig {
    pub fn views_count(&self) -> usize {
        self.views_count
    }

    /// Set the number of active views. Values outside 1..=4 are clamped;
    /// range validation happens at the control surface.
    pub fn set_views_count(&mut self, n: usize) {
        self.views_count = n.clamp(1, MAX_VIEWS);
    }

    /// Screen slice for view `index`: N equal intervals partitioning [0, 1)
    /// in view order.
    pub fn slice(&self, index: usize) -> ViewSlice {
        let n = self.views_count as f32;
        ViewSlice {
            start: index as f32 / n,
            end: (index + 1) as f32 / n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_partition_unit_interval() {
        let mut config = ViewConfig::default();
        config.set_views_count(3);

        let mut cursor = 0.0;
        for i in 0..3 {
            let s = config.slice(i);
            assert!((s.start - cursor).abs() < 1e-6);
            assert!(s.end > s.start);
            cursor = s.end;
        }
        assert!((cursor - 1.0).abs() < 1e-6);
    }

    #[test]
    fn count_is_clamped() {
        let mut config = ViewConfig::default();
        config.set_views_count(0);
        assert_eq!(config.views_count(), 1);
        config.set_views_count(9);
        assert_eq!(config.views_count(), MAX_VIEWS);
    }

    #[test]
    fn turbidity_survives_count_changes() {
        let mut config = ViewConfig::default();
        config.set_views_count(4);
        config.turbidity[3] = 0.7;
        config.set_views_count(1);
        config.set_views_count(4);
        assert_eq!(config.turbidity[3], 0.7);
    }
}
