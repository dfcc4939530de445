use crate::motion::{CellState, MotionMode, StepStatus};
use anyhow::Result;
use log::{debug, info, warn};
use motility_common::{GeometryWarning, Shape, SimParams, SimulationRun, TrajectoryBuffer, Vec3};
use rand::distr::Uniform;
use rand::prelude::*;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Mixing constant for deriving per-cell random sub-streams from the base
/// seed, so parallel execution draws the same samples as sequential.
const CELL_STREAM_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

const MAX_PLACEMENT_ATTEMPTS: usize = 1024;

/// Runs one set of cell trajectories for a resolved parameter record.
pub struct Simulation {
    params: SimParams,
    mode: MotionMode,
    init_x: Uniform<f32>,
    init_y: Uniform<f32>,
    init_z: Uniform<f32>,
}

/// Per-cell result collected from the parallel loop.
struct CellOutcome {
    completed: bool,
    warnings: Vec<GeometryWarning>,
    first_contact: Option<u32>,
}

impl CellOutcome {
    fn skipped() -> Self {
        CellOutcome {
            completed: false,
            warnings: Vec::new(),
            first_contact: None,
        }
    }
}

impl Simulation {
    /// Creates a new `Simulation`, validating the parameter record before
    /// any buffer is allocated.
    pub fn new(params: SimParams) -> Result<Self> {
        if params.cell_count == 0 {
            anyhow::bail!("cell_count must be at least 1.");
        }
        if params.step_count == 0 {
            anyhow::bail!("step_count must be at least 1.");
        }
        if !(params.step_length > 0.0) || !params.step_length.is_finite() {
            anyhow::bail!(
                "step_length must be positive and finite, got {}.",
                params.step_length
            );
        }
        if params.x_min >= params.x_max
            || params.y_min >= params.y_max
            || params.z_min >= params.z_max
        {
            anyhow::bail!("Degenerate vessel bounds.");
        }
        match params.shape {
            Shape::Drop => {
                if params.drop_radius <= 0.0 {
                    anyhow::bail!("drop_radius must be positive for the drop shape.");
                }
            }
            Shape::Spot => {
                if params.spot_radius <= 0.0 || params.spot_base_radius <= 0.0 {
                    anyhow::bail!("spot geometry must have positive radii.");
                }
            }
            Shape::Cube | Shape::Reflection => {}
        }

        let init_x = Uniform::new(params.x_min, params.x_max)?;
        let init_y = Uniform::new(params.y_min, params.y_max)?;
        let init_z = Uniform::new(params.z_min, params.z_max)?;
        let mode = MotionMode::for_params(&params);
        Ok(Simulation {
            params,
            mode,
            init_x,
            init_y,
            init_z,
        })
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// Runs all cell trajectories. `on_progress` is invoked once per
    /// finished cell with (completed, total); it observes, never steers.
    pub fn simulate(
        &self,
        on_progress: Option<&(dyn Fn(u32, u32) + Sync)>,
    ) -> Result<SimulationRun> {
        self.simulate_with_cancel(on_progress, None)
    }

    /// Like `simulate`, with a cooperative cancellation flag checked between
    /// cells. Cells skipped after cancellation leave "no data" rows.
    pub fn simulate_with_cancel(
        &self,
        on_progress: Option<&(dyn Fn(u32, u32) + Sync)>,
        cancel: Option<&AtomicBool>,
    ) -> Result<SimulationRun> {
        let cell_count = self.params.cell_count;
        let step_count = self.params.step_count;
        debug!(
            "Simulating {} cells x {} steps ({:?}, seed {}).",
            cell_count, step_count, self.params.shape, self.params.seed
        );

        let mut positions = TrajectoryBuffer::new(cell_count, step_count);
        let mut headings = TrajectoryBuffer::new(cell_count, step_count);
        let stride = positions.stride();
        let completed = AtomicU32::new(0);

        // Cells are independent: each owns a disjoint buffer row and its own
        // seed-derived stream, so the parallel result matches sequential.
        let outcomes: Vec<CellOutcome> = positions
            .data_mut()
            .par_chunks_mut(stride)
            .zip(headings.data_mut().par_chunks_mut(stride))
            .enumerate()
            .map(|(cell, (pos_row, head_row))| {
                if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                    return CellOutcome::skipped();
                }
                let outcome = self.run_cell(cell as u32, pos_row, head_row);
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(report) = on_progress {
                    report(done, cell_count);
                }
                outcome
            })
            .collect();

        let completed_cells = outcomes.iter().filter(|o| o.completed).count() as u32;
        let warnings: Vec<GeometryWarning> = outcomes
            .iter()
            .flat_map(|o| o.warnings.iter().copied())
            .collect();
        let first_egg_contact: Vec<Option<u32>> =
            outcomes.iter().map(|o| o.first_contact).collect();

        if completed_cells < cell_count {
            info!(
                "Run cancelled after {} of {} cells.",
                completed_cells, cell_count
            );
        }
        if !warnings.is_empty() {
            warn!("Run finished with {} geometry violations.", warnings.len());
        }

        Ok(SimulationRun {
            seed: self.params.seed,
            cell_count,
            step_count,
            completed_cells,
            positions,
            headings,
            warnings,
            first_egg_contact,
        })
    }

    /// Computes one cell's full trajectory into its buffer rows.
    fn run_cell(&self, cell: u32, pos_row: &mut [f32], head_row: &mut [f32]) -> CellOutcome {
        let params = &self.params;
        let mut rng = self.cell_rng(cell);
        let mut state = CellState::at(self.sample_initial_position(&mut rng));
        let mut warnings = Vec::new();
        let mut first_contact = None;

        for step in 0..params.step_count {
            let status = self.mode.advance(&mut state, params, &mut rng);

            // Every step is recorded, malformed or not, for diagnosability.
            let base = step as usize * 3;
            pos_row[base] = state.position.x;
            pos_row[base + 1] = state.position.y;
            pos_row[base + 2] = state.position.z;
            head_row[base] = state.heading.x;
            head_row[base + 1] = state.heading.y;
            head_row[base + 2] = state.heading.z;

            if status == StepStatus::OutOfBounds {
                warn!(
                    "Geometry violation: cell {} step {} corrected position still outside the vessel.",
                    cell, step
                );
                warnings.push(GeometryWarning { cell, step });
            }

            if first_contact.is_none()
                && state.position.distance(params.egg_center) <= params.egg_radius
            {
                first_contact = Some(step);
            }
        }

        CellOutcome {
            completed: true,
            warnings,
            first_contact,
        }
    }

    /// Derives the cell's random sub-stream from the base seed.
    fn cell_rng(&self, cell: u32) -> StdRng {
        StdRng::seed_from_u64(
            self.params
                .seed
                .wrapping_add((cell as u64).wrapping_mul(CELL_STREAM_MIX)),
        )
    }

    /// Samples a start position uniformly within the medium volume:
    /// uniform in the bounding box, rejected against the shape's
    /// containment test.
    fn sample_initial_position(&self, rng: &mut StdRng) -> Vec3 {
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let candidate = Vec3::new(
                rng.sample(&self.init_x),
                rng.sample(&self.init_y),
                rng.sample(&self.init_z),
            );
            if self.mode.contains(candidate, 0.0) {
                return candidate;
            }
        }
        // Pathological accept rate; the vertical axis midpoint is interior
        // for every supported shape.
        Vec3::new(0.0, 0.0, (self.params.z_min + self.params.z_max) / 2.0)
    }
}
