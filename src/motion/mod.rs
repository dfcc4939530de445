//! Geometry-specific motion modes.
//!
//! Each vessel shape owns its boundary test and corrective response; the
//! mode is resolved once from the configured shape so the per-step loop
//! never dispatches on strings.

use motility_common::{Shape, SimParams, Vec3};
use rand::prelude::*;
use rand_distr::StandardNormal;

pub mod cube;
pub mod drop;
pub mod reflection;
pub mod spot;

pub use cube::CubeMode;
pub use drop::DropMode;
pub use reflection::ReflectionMode;
pub use spot::SpotMode;

/// Per-cell state mutated by every step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellState {
    pub position: Vec3,
    /// Unit-length swimming direction.
    pub heading: Vec3,
    /// Remaining adhered steps; 0 means the cell swims freely.
    pub stick_counter: u32,
}

impl CellState {
    /// A free cell at `position` heading along +z (the reference initial
    /// direction).
    pub fn at(position: Vec3) -> Self {
        CellState {
            position,
            heading: Vec3::new(0.0, 0.0, 1.0),
            stick_counter: 0,
        }
    }
}

/// Outcome of one `advance` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// No boundary contact this step.
    Inside,
    /// The step touched a surface (or the cell is adhered to one).
    OnBoundary,
    /// The corrected position still fails containment. Signals a reflection
    /// bug; surfaced to the caller, never silently corrected.
    OutOfBounds,
}

/// The boundary/adhesion rule set for one container shape.
#[derive(Debug, Clone)]
pub enum MotionMode {
    Cube(CubeMode),
    Drop(DropMode),
    Spot(SpotMode),
    Reflection(ReflectionMode),
}

impl MotionMode {
    /// Resolves the mode for the configured shape.
    pub fn for_params(params: &SimParams) -> Self {
        match params.shape {
            Shape::Cube => MotionMode::Cube(CubeMode::new(params)),
            Shape::Drop => MotionMode::Drop(DropMode::new(params)),
            Shape::Spot => MotionMode::Spot(SpotMode::new(params)),
            Shape::Reflection => MotionMode::Reflection(ReflectionMode::new(params)),
        }
    }

    /// Advances one cell by one step.
    ///
    /// Draw discipline: a stuck step consumes no random draws; a free step
    /// consumes exactly two (azimuth, then polar deflection) whether or not
    /// the deviation is zero. One seed therefore maps to one trajectory.
    pub fn advance(&self, state: &mut CellState, params: &SimParams, rng: &mut StdRng) -> StepStatus {
        if state.stick_counter > 0 {
            // Adhered: hold position and heading until the counter runs out.
            state.stick_counter -= 1;
            return StepStatus::OnBoundary;
        }

        state.heading = perturb_heading(state.heading, params.deviation, rng);
        let candidate = state.position + state.heading.scale(params.step_length);

        let (position, heading, contact) = match self {
            MotionMode::Cube(m) => m.collide(candidate, state.heading),
            MotionMode::Drop(m) => m.collide(candidate, state.heading),
            MotionMode::Spot(m) => m.collide(candidate, state.heading),
            MotionMode::Reflection(m) => m.collide(candidate, state.heading),
        };
        state.position = position;
        state.heading = heading.normalize_or_zero();

        if contact && self.sticks() && params.stick_steps > 0 {
            // The contact step counts as the first adhered step.
            state.stick_counter = params.stick_steps - 1;
        }

        if !self.contains(state.position, params.boundary_tolerance) {
            StepStatus::OutOfBounds
        } else if contact {
            StepStatus::OnBoundary
        } else {
            StepStatus::Inside
        }
    }

    /// Whether this container models surface adhesion at all.
    pub fn sticks(&self) -> bool {
        !matches!(self, MotionMode::Reflection(_))
    }

    /// Containment test with slack `tol`, also used for initial placement.
    pub fn contains(&self, p: Vec3, tol: f32) -> bool {
        match self {
            MotionMode::Cube(m) => m.contains(p, tol),
            MotionMode::Drop(m) => m.contains(p, tol),
            MotionMode::Spot(m) => m.contains(p, tol),
            MotionMode::Reflection(m) => m.contains(p, tol),
        }
    }
}

/// Rotates the unit heading by a normally distributed polar deflection about
/// an axis perpendicular to it, picked by a uniform azimuth. Models
/// non-straight swimming.
fn perturb_heading(heading: Vec3, deviation: f32, rng: &mut StdRng) -> Vec3 {
    let azimuth: f32 = rng.random_range(0.0..std::f32::consts::TAU);
    let z: f32 = rng.sample(StandardNormal);
    let deflection = z * deviation;
    if deflection == 0.0 {
        return heading;
    }

    // Orthonormal basis perpendicular to the heading.
    let reference = if heading.z.abs() < 0.9 {
        Vec3::new(0.0, 0.0, 1.0)
    } else {
        Vec3::new(1.0, 0.0, 0.0)
    };
    let e1 = heading.cross(reference).normalize_or_zero();
    let e2 = heading.cross(e1);
    let perp = e1.scale(azimuth.cos()) + e2.scale(azimuth.sin());

    let rotated = heading.scale(deflection.cos()) + perp.scale(deflection.sin());
    let unit = rotated.normalize_or_zero();
    if unit == Vec3::zero() {
        heading
    } else {
        unit
    }
}
