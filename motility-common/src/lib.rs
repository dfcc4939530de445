pub mod config;
pub mod sim_params;
pub mod trajectory;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use config::{
    GameteConfig, GeometryConfig, MotilityConfig, OutputConfig, RunConfig, SimulationConfig,
    TimingConfig,
};
pub use sim_params::{Shape, SimParams};
pub use trajectory::{GeometryWarning, SimulationRun, TrajectoryBuffer};
pub use vecmath::{clamp, Vec3};
