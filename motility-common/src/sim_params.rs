use crate::vecmath::Vec3;
use serde::{Deserialize, Serialize};

/// The container geometry a simulation run takes place in.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// Axis-aligned cubic vessel.
    Cube,
    /// Free-standing spherical droplet centered at the origin.
    Drop,
    /// Spherical-cap droplet resting on a flat surface (contact angle given).
    Spot,
    /// Generic reflective box container; no surface adhesion.
    Reflection,
}

/// Resolved simulation parameters derived from the raw configuration,
/// used frequently during simulation steps. All lengths are in mm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    pub shape: Shape,

    // Medium bounds (bounding box of the vessel)
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
    pub z_min: f32,
    pub z_max: f32,

    /// Sphere radius for `Shape::Drop` (0 otherwise).
    pub drop_radius: f32,
    /// Cap sphere radius for `Shape::Spot` (0 otherwise).
    pub spot_radius: f32,
    /// Radius of the spot's circular contact line with the base plane.
    pub spot_base_radius: f32,
    /// Height of the base plane above the cap sphere's center.
    pub spot_base_height: f32,

    // Per-step motion
    /// Distance travelled per step (mm).
    pub step_length: f32,
    /// Standard deviation of the per-step angular deflection (radians).
    pub deviation: f32,
    /// Number of steps a cell stays adhered after surface contact.
    pub stick_steps: u32,

    // Run dimensions
    pub cell_count: u32,
    pub step_count: u32,

    // Gamete target
    pub egg_center: Vec3,
    pub egg_radius: f32,

    // Reproducibility
    pub seed: u64,
    pub sim_repeat: u32,

    /// Containment slack used when verifying corrected positions.
    pub boundary_tolerance: f32,
}
