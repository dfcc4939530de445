use crate::vecmath::Vec3;
use serde::{Deserialize, Serialize};

/// Dense per-run history, `cell_count x step_count x 3` floats.
///
/// Entries start as NaN ("no data") and are overwritten as steps are
/// recorded, so a cell genuinely at the origin is distinguishable from a
/// step that was never computed. External plotting and export tools read
/// this layout directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryBuffer {
    cell_count: u32,
    step_count: u32,
    data: Vec<f32>,
}

impl TrajectoryBuffer {
    /// Allocates a NaN-filled buffer for `cell_count` cells of `step_count` steps.
    pub fn new(cell_count: u32, step_count: u32) -> Self {
        let len = cell_count as usize * step_count as usize * 3;
        TrajectoryBuffer {
            cell_count,
            step_count,
            data: vec![f32::NAN; len],
        }
    }

    pub fn cell_count(&self) -> u32 {
        self.cell_count
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    /// Number of floats per cell row (`step_count x 3`).
    pub fn stride(&self) -> usize {
        self.step_count as usize * 3
    }

    /// Returns the recorded vector at (cell, step), or None for a "no data"
    /// entry or an out-of-range index.
    pub fn get(&self, cell: u32, step: u32) -> Option<Vec3> {
        if cell >= self.cell_count || step >= self.step_count {
            return None;
        }
        let base = cell as usize * self.stride() + step as usize * 3;
        let v = Vec3::new(self.data[base], self.data[base + 1], self.data[base + 2]);
        if v.x.is_nan() || v.y.is_nan() || v.z.is_nan() {
            None
        } else {
            Some(v)
        }
    }

    /// Writes the vector at (cell, step). Out-of-range indices are ignored.
    pub fn set(&mut self, cell: u32, step: u32, v: Vec3) {
        if cell >= self.cell_count || step >= self.step_count {
            return;
        }
        let base = cell as usize * self.stride() + step as usize * 3;
        self.data[base] = v.x;
        self.data[base + 1] = v.y;
        self.data[base + 2] = v.z;
    }

    /// Raw flat storage, cell-major.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable flat storage; per-cell rows are `stride()` floats apart.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

/// A step whose corrected position still failed the containment check.
/// Non-fatal; the step is recorded and the run continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryWarning {
    pub cell: u32,
    pub step: u32,
}

/// The full result of one simulation run, handed to output and plotting
/// collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRun {
    /// Seed the run was computed with (recorded for reproducibility).
    pub seed: u64,
    pub cell_count: u32,
    pub step_count: u32,
    /// Cells whose trajectories were fully computed (equals `cell_count`
    /// unless the run was cancelled).
    pub completed_cells: u32,
    pub positions: TrajectoryBuffer,
    pub headings: TrajectoryBuffer,
    /// Geometry violations, attributable to a specific (cell, step).
    pub warnings: Vec<GeometryWarning>,
    /// First step at which each cell came within the egg radius of the egg
    /// center, if it ever did.
    pub first_egg_contact: Vec<Option<u32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_buffer_reports_no_data() {
        let buf = TrajectoryBuffer::new(2, 3);
        assert_eq!(buf.data().len(), 2 * 3 * 3);
        assert!(buf.get(0, 0).is_none());
        assert!(buf.get(1, 2).is_none());
    }

    #[test]
    fn set_then_get_distinguishes_origin_from_no_data() {
        let mut buf = TrajectoryBuffer::new(1, 2);
        buf.set(0, 0, Vec3::zero());
        assert_eq!(buf.get(0, 0), Some(Vec3::zero()));
        assert!(buf.get(0, 1).is_none());
    }

    #[test]
    fn out_of_range_indices_are_no_data() {
        let buf = TrajectoryBuffer::new(1, 1);
        assert!(buf.get(1, 0).is_none());
        assert!(buf.get(0, 1).is_none());
    }
}
