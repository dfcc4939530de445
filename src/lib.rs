//! Motile-cell trajectory simulation: a per-step integrator with
//! geometry-specific boundary physics (cube, droplet, spot-on-surface and
//! generic reflective containers), surface adhesion, and deterministic
//! seed-derived randomness.

pub mod motion;
pub mod simulation;

pub use simulation::Simulation;
