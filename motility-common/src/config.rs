use crate::sim_params::{Shape, SimParams};
use crate::vecmath::Vec3;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Configuration for the vessel geometry
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GeometryConfig {
    /// Vessel shape: "cube", "drop", "spot" or "reflection".
    pub shape: String,
    /// Contact angle of the spot droplet in degrees (only used for "spot").
    #[serde(default = "default_spot_angle")]
    pub spot_angle_deg: f64,
    /// Medium volume in microliters (1 uL = 1 mm^3).
    pub volume_ul: f64,
}

// Configuration for cell motility
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct MotilityConfig {
    /// Straight-line velocity in um/s.
    pub vsl_um_per_s: f64,
    /// Standard deviation of the per-step angular deflection in radians.
    pub deviation_rad: f64,
    /// Time a cell stays adhered after touching a surface, in seconds.
    pub surface_time_s: f64,
    /// Cell concentration in cells/mL.
    pub sperm_conc_per_ml: f64,
}

// Configuration for the gamete (egg) target
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GameteConfig {
    /// Egg placement: "center", "bottom_center" or "bottom_edge".
    pub egg_localization: String,
    /// Egg radius in micrometers.
    pub gamete_radius_um: f64,
}

// Configuration for timing
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    pub sim_minutes: f64,
    pub sample_rate_hz: f64,
}

// Run-level settings (seeding and repeats)
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RunConfig {
    /// Base random seed. When absent, the caller draws one from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_sim_repeat")]
    pub sim_repeat: u32,
}

// Configuration for output settings
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    pub save_trajectories: bool,
    /// Output format: "json", "bincode", "messagepack"
    pub format: Option<String>,
    /// Display modes requested from external plotting tools. Carried so the
    /// persisted parameter set round-trips losslessly; unused by the core.
    #[serde(default = "default_display_mode")]
    pub display_mode: Vec<String>,
}

fn default_spot_angle() -> f64 {
    50.0
}

fn default_sim_repeat() -> u32 {
    1
}

fn default_display_mode() -> Vec<String> {
    vec!["2D".to_string()]
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            seed: None,
            sim_repeat: 1,
        }
    }
}

/// Main simulation configuration structure, loaded from a TOML file.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    pub geometry: GeometryConfig,
    pub motility: MotilityConfig,
    pub gamete: GameteConfig,
    pub timing: TimingConfig,
    #[serde(default)]
    pub run: RunConfig,
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config: SimulationConfig = toml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML from '{}': {}", path_ref.display(), e))?;

        config.validate()?;
        Ok(config)
    }

    /// Checks raw parameter ranges. Called by `load` and again by `resolve`
    /// so programmatically built configs fail the same way.
    pub fn validate(&self) -> Result<()> {
        if self.geometry.volume_ul <= 0.0 {
            anyhow::bail!("volume_ul must be positive.");
        }
        if self.motility.vsl_um_per_s <= 0.0 {
            anyhow::bail!("vsl_um_per_s must be positive.");
        }
        if self.motility.deviation_rad < 0.0 {
            anyhow::bail!("deviation_rad must not be negative.");
        }
        if self.motility.surface_time_s < 0.0 {
            anyhow::bail!("surface_time_s must not be negative.");
        }
        if self.motility.sperm_conc_per_ml <= 0.0 {
            anyhow::bail!("sperm_conc_per_ml must be positive.");
        }
        if self.gamete.gamete_radius_um <= 0.0 {
            anyhow::bail!("gamete_radius_um must be positive.");
        }
        if self.timing.sim_minutes <= 0.0 {
            anyhow::bail!("sim_minutes must be positive.");
        }
        if self.timing.sample_rate_hz <= 0.0 {
            anyhow::bail!("sample_rate_hz must be positive.");
        }
        if self.run.sim_repeat == 0 {
            anyhow::bail!("sim_repeat must be at least 1.");
        }
        if self.geometry.shape == "spot"
            && !(self.geometry.spot_angle_deg > 0.0 && self.geometry.spot_angle_deg <= 90.0)
        {
            anyhow::bail!(
                "spot_angle_deg must lie in (0, 90], got {}.",
                self.geometry.spot_angle_deg
            );
        }
        Ok(())
    }

    /// Converts the raw configuration into the resolved parameters used at
    /// runtime. Unknown shape or egg placement strings fail here, before any
    /// simulation work begins.
    pub fn resolve(&self) -> Result<SimParams> {
        self.validate()?;

        let shape = match self.geometry.shape.as_str() {
            "cube" => Shape::Cube,
            "drop" => Shape::Drop,
            "spot" => Shape::Spot,
            "reflection" => Shape::Reflection,
            other => anyhow::bail!("Unknown shape '{}'. Expected cube, drop, spot or reflection.", other),
        };

        let vol = self.geometry.volume_ul;
        let gamete_r_mm = self.gamete.gamete_radius_um / 1000.0;

        // --- Vessel bounds (mm) ---
        let (x_min, x_max, y_min, y_max, z_min, z_max);
        let mut drop_radius = 0.0f64;
        let mut spot_radius = 0.0f64;
        let mut spot_base_radius = 0.0f64;
        let mut spot_base_height = 0.0f64;

        match shape {
            Shape::Cube | Shape::Reflection => {
                // Edge from volume, vessel resting on the z = 0 plane.
                let edge = vol.powf(1.0 / 3.0);
                let half = edge / 2.0;
                x_min = -half;
                x_max = half;
                y_min = -half;
                y_max = half;
                z_min = 0.0;
                z_max = edge;
            }
            Shape::Drop => {
                let r = (3.0 * vol / (4.0 * std::f64::consts::PI)).powf(1.0 / 3.0);
                drop_radius = r;
                x_min = -r;
                x_max = r;
                y_min = -r;
                y_max = r;
                z_min = -r;
                z_max = r;
            }
            Shape::Spot => {
                let (r, base_r, base_h) = solve_spot_geometry(vol, self.geometry.spot_angle_deg);
                spot_radius = r;
                spot_base_radius = base_r;
                spot_base_height = base_h;
                x_min = -base_r;
                x_max = base_r;
                y_min = -base_r;
                y_max = base_r;
                z_min = base_h;
                z_max = r;
            }
        }

        // --- Egg center per shape and localization ---
        let egg_center = match (shape, self.gamete.egg_localization.as_str()) {
            (Shape::Cube | Shape::Reflection, "center") => Vec3::new(0.0, 0.0, ((z_min + z_max) / 2.0) as f32),
            (Shape::Cube | Shape::Reflection, "bottom_center") => {
                Vec3::new(0.0, 0.0, (z_min + gamete_r_mm) as f32)
            }
            (Shape::Cube | Shape::Reflection, "bottom_edge") => Vec3::new(
                0.0,
                (y_min + gamete_r_mm) as f32,
                (z_min + gamete_r_mm) as f32,
            ),
            (Shape::Drop, "center") => Vec3::zero(),
            (Shape::Drop, "bottom_center") => Vec3::new(0.0, 0.0, (z_min + gamete_r_mm) as f32),
            (Shape::Spot, "center") => Vec3::new(0.0, 0.0, ((z_min + z_max) / 2.0) as f32),
            (Shape::Spot, "bottom_center") => Vec3::new(0.0, 0.0, (z_min + gamete_r_mm) as f32),
            (Shape::Spot, "bottom_edge") => {
                // Egg tangent to both the base plane and the cap surface.
                let x_edge = (4.0 * spot_radius * gamete_r_mm).sqrt();
                Vec3::new(x_edge as f32, 0.0, (z_min + gamete_r_mm) as f32)
            }
            (_, other) => anyhow::bail!(
                "Unsupported egg_localization '{}' for shape '{}'.",
                other,
                self.geometry.shape
            ),
        };

        // --- Per-step values ---
        // um per sample converted to mm: distance covered between samples.
        let step_length = self.motility.vsl_um_per_s / self.timing.sample_rate_hz / 1000.0;
        let step_count = (self.timing.sim_minutes * 60.0 * self.timing.sample_rate_hz).round() as u32;
        if step_count == 0 {
            anyhow::bail!("sim_minutes x sample_rate_hz resolves to zero steps.");
        }
        let cell_count = (vol * self.motility.sperm_conc_per_ml / 1000.0).round().max(1.0) as u32;
        let stick_steps = (self.motility.surface_time_s * self.timing.sample_rate_hz).round() as u32;

        Ok(SimParams {
            shape,
            x_min: x_min as f32,
            x_max: x_max as f32,
            y_min: y_min as f32,
            y_max: y_max as f32,
            z_min: z_min as f32,
            z_max: z_max as f32,
            drop_radius: drop_radius as f32,
            spot_radius: spot_radius as f32,
            spot_base_radius: spot_base_radius as f32,
            spot_base_height: spot_base_height as f32,
            step_length: step_length as f32,
            deviation: self.motility.deviation_rad as f32,
            stick_steps,
            cell_count,
            step_count,
            egg_center,
            egg_radius: gamete_r_mm as f32,
            seed: self.run.seed.unwrap_or(0),
            sim_repeat: self.run.sim_repeat,
            // Slack for the post-correction containment check; sized for f32
            // round-off when projecting onto curved surfaces (lengths ~ mm).
            boundary_tolerance: 1e-5,
        })
    }
}

/// Solves the spherical-cap radius for a spot droplet of the given volume and
/// contact angle, by bisection on the cap-volume equation
/// V = pi h^2 (3R - h) / 3 with h = R (1 - cos(angle)).
/// Returns (cap radius, contact-line radius, base plane height) in mm.
fn solve_spot_geometry(volume_ul: f64, angle_deg: f64) -> (f64, f64, f64) {
    let angle_rad = angle_deg.to_radians();
    let vol_um3 = volume_ul * 1e9;
    let cap_volume = |r: f64| {
        let h = r * (1.0 - angle_rad.cos());
        std::f64::consts::PI * h * h * (3.0 * r - h) / 3.0
    };
    let mut low = 0.0f64;
    let mut high = vol_um3.powf(1.0 / 3.0).max(1.0);
    while cap_volume(high) < vol_um3 {
        high *= 2.0;
    }
    for _ in 0..60 {
        let mid = (low + high) / 2.0;
        if cap_volume(mid) < vol_um3 {
            low = mid;
        } else {
            high = mid;
        }
    }
    let r_um = (low + high) / 2.0;
    let base_r_um = r_um * angle_rad.sin();
    let base_h_um = r_um * angle_rad.cos();
    (r_um / 1000.0, base_r_um / 1000.0, base_h_um / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config(shape: &str) -> SimulationConfig {
        SimulationConfig {
            geometry: GeometryConfig {
                shape: shape.to_string(),
                spot_angle_deg: 50.0,
                volume_ul: 8.0,
            },
            motility: MotilityConfig {
                vsl_um_per_s: 130.0,
                deviation_rad: 0.4,
                surface_time_s: 2.0,
                sperm_conc_per_ml: 10_000.0,
            },
            gamete: GameteConfig {
                egg_localization: "bottom_center".to_string(),
                gamete_radius_um: 50.0,
            },
            timing: TimingConfig {
                sim_minutes: 1.0,
                sample_rate_hz: 4.0,
            },
            run: RunConfig {
                seed: Some(0),
                sim_repeat: 1,
            },
            output: OutputConfig {
                base_filename: "test".to_string(),
                save_trajectories: false,
                format: Some("json".to_string()),
                display_mode: vec!["2D".to_string()],
            },
        }
    }

    #[test]
    fn cube_edge_derives_from_volume() {
        let params = base_config("cube").resolve().unwrap();
        // 8 uL = 8 mm^3 -> 2 mm edge, resting on z = 0.
        assert!((params.x_max - 1.0).abs() < 1e-6, "x_max = {}", params.x_max);
        assert!((params.z_max - 2.0).abs() < 1e-6, "z_max = {}", params.z_max);
        assert_eq!(params.z_min, 0.0);
    }

    #[test]
    fn drop_radius_derives_from_sphere_volume() {
        let mut config = base_config("drop");
        config.geometry.volume_ul = 4.0 * std::f64::consts::PI / 3.0;
        let params = config.resolve().unwrap();
        assert!((params.drop_radius - 1.0).abs() < 1e-5, "radius = {}", params.drop_radius);
        assert!((params.z_min + 1.0).abs() < 1e-5);
    }

    #[test]
    fn spot_cap_at_ninety_degrees_is_a_hemisphere() {
        let mut config = base_config("spot");
        config.geometry.spot_angle_deg = 90.0;
        config.geometry.volume_ul = 2.0 * std::f64::consts::PI / 3.0;
        let params = config.resolve().unwrap();
        assert!((params.spot_radius - 1.0).abs() < 1e-4, "R = {}", params.spot_radius);
        assert!(params.spot_base_height.abs() < 1e-4, "base h = {}", params.spot_base_height);
        assert!((params.spot_base_radius - 1.0).abs() < 1e-4);
    }

    #[test]
    fn step_count_follows_sample_rate() {
        let params = base_config("cube").resolve().unwrap();
        // 1 min x 4 Hz x 60 s
        assert_eq!(params.step_count, 240);
    }

    #[test]
    fn step_length_is_distance_per_sample() {
        let params = base_config("cube").resolve().unwrap();
        // 130 um/s at 4 Hz -> 32.5 um -> 0.0325 mm per step
        assert!((params.step_length - 0.0325).abs() < 1e-6, "step = {}", params.step_length);
    }

    #[test]
    fn cell_count_from_volume_and_concentration() {
        let params = base_config("cube").resolve().unwrap();
        // 8 uL x 10_000 cells/mL / 1000 = 80 cells
        assert_eq!(params.cell_count, 80);
    }

    #[test]
    fn bottom_center_egg_sits_on_the_floor() {
        let params = base_config("cube").resolve().unwrap();
        assert_eq!(params.egg_center.x, 0.0);
        assert!((params.egg_center.z - 0.05).abs() < 1e-6, "z = {}", params.egg_center.z);
    }

    #[test]
    fn unknown_shape_is_rejected() {
        let config = base_config("torus");
        let err = config.resolve().unwrap_err();
        assert!(err.to_string().contains("Unknown shape"), "got: {}", err);
    }

    #[test]
    fn drop_bottom_edge_is_rejected() {
        let mut config = base_config("drop");
        config.gamete.egg_localization = "bottom_edge".to_string();
        assert!(config.resolve().is_err());
    }

    #[test]
    fn nonpositive_volume_is_rejected() {
        let mut config = base_config("cube");
        config.geometry.volume_ul = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_round_trip_preserves_fields() {
        let config = base_config("spot");
        let text = toml::to_string(&config).unwrap();
        let back: SimulationConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.geometry.shape, "spot");
        assert_eq!(back.output.display_mode, vec!["2D".to_string()]);
        assert_eq!(back.run.seed, Some(0));
        assert_eq!(back.timing.sample_rate_hz, 4.0);
    }
}
