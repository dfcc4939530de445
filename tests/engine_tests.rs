//! Engine-level tests: buffer contracts, determinism, progress reporting
//! and fail-fast configuration handling.

use motility_common::{
    GameteConfig, GeometryConfig, MotilityConfig, OutputConfig, RunConfig, SimulationConfig,
    TimingConfig,
};
use motility_engine::Simulation;
use std::sync::atomic::AtomicBool;
use std::sync::Mutex;

fn small_config(shape: &str) -> SimulationConfig {
    SimulationConfig {
        geometry: GeometryConfig {
            shape: shape.to_string(),
            spot_angle_deg: 50.0,
            volume_ul: 6.25,
        },
        motility: MotilityConfig {
            vsl_um_per_s: 130.0,
            deviation_rad: 0.4,
            surface_time_s: 0.0,
            sperm_conc_per_ml: 1_000.0,
        },
        gamete: GameteConfig {
            egg_localization: "bottom_center".to_string(),
            gamete_radius_um: 50.0,
        },
        timing: TimingConfig {
            sim_minutes: 0.2,
            sample_rate_hz: 4.0,
        },
        run: RunConfig {
            seed: Some(0),
            sim_repeat: 1,
        },
        output: OutputConfig {
            base_filename: "test".to_string(),
            save_trajectories: false,
            format: None,
            display_mode: vec!["2D".to_string()],
        },
    }
}

/// Buffers are exactly cell_count x step_count x 3, and the step count
/// follows round(sim_minutes x 60 x sample_rate_hz).
#[test]
fn buffers_have_the_contracted_shape() {
    let params = small_config("cube").resolve().unwrap();
    assert_eq!(params.step_count, 48); // 0.2 min x 60 s x 4 Hz
    let expected_cells = params.cell_count;

    let run = Simulation::new(params).unwrap().simulate(None).unwrap();
    assert_eq!(run.cell_count, expected_cells);
    assert_eq!(run.step_count, 48);
    assert_eq!(
        run.positions.data().len(),
        expected_cells as usize * 48 * 3,
        "position buffer size"
    );
    assert_eq!(
        run.headings.data().len(),
        expected_cells as usize * 48 * 3,
        "heading buffer size"
    );
}

/// Every (cell, step) entry is written — no "no data" sentinel survives a
/// completed run.
#[test]
fn every_step_is_recorded() {
    let params = small_config("drop").resolve().unwrap();
    let run = Simulation::new(params).unwrap().simulate(None).unwrap();
    for cell in 0..run.cell_count {
        for step in 0..run.step_count {
            assert!(
                run.positions.get(cell, step).is_some(),
                "missing position at ({}, {})",
                cell,
                step
            );
            assert!(
                run.headings.get(cell, step).is_some(),
                "missing heading at ({}, {})",
                cell,
                step
            );
        }
    }
}

/// Two runs with the same configuration and seed are bit-for-bit identical.
#[test]
fn same_seed_reproduces_bit_identical_buffers() {
    let params = small_config("spot").resolve().unwrap();
    let a = Simulation::new(params.clone()).unwrap().simulate(None).unwrap();
    let b = Simulation::new(params).unwrap().simulate(None).unwrap();

    let bits = |data: &[f32]| data.iter().map(|f| f.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(a.positions.data()), bits(b.positions.data()));
    assert_eq!(bits(a.headings.data()), bits(b.headings.data()));
}

/// Different seeds give different trajectories.
#[test]
fn different_seeds_diverge() {
    let mut config = small_config("cube");
    let a = Simulation::new(config.resolve().unwrap())
        .unwrap()
        .simulate(None)
        .unwrap();
    config.run.seed = Some(1);
    let b = Simulation::new(config.resolve().unwrap())
        .unwrap()
        .simulate(None)
        .unwrap();
    assert_ne!(a.positions.data(), b.positions.data());
}

/// An unrecognized shape fails at resolution time, before any simulation
/// work or buffer allocation.
#[test]
fn unknown_shape_fails_fast() {
    let config = small_config("torus");
    let err = config.resolve().unwrap_err();
    assert!(err.to_string().contains("Unknown shape"), "got: {}", err);
}

/// The progress observer fires once per finished cell and ends at
/// (total, total).
#[test]
fn progress_reports_every_cell() {
    let params = small_config("cube").resolve().unwrap();
    let total = params.cell_count;
    let calls: Mutex<Vec<(u32, u32)>> = Mutex::new(Vec::new());

    Simulation::new(params)
        .unwrap()
        .simulate(Some(&|done, of| calls.lock().unwrap().push((done, of))))
        .unwrap();

    let calls = calls.into_inner().unwrap();
    assert_eq!(calls.len(), total as usize);
    assert!(calls.iter().all(|&(_, of)| of == total));
    assert!(calls.iter().any(|&(done, _)| done == total));
}

/// A run cancelled up front completes no cells and leaves only "no data"
/// entries.
#[test]
fn cancelled_run_leaves_no_data() {
    let params = small_config("cube").resolve().unwrap();
    let cancel = AtomicBool::new(true);
    let run = Simulation::new(params)
        .unwrap()
        .simulate_with_cancel(None, Some(&cancel))
        .unwrap();
    assert_eq!(run.completed_cells, 0);
    assert!(run.positions.get(0, 0).is_none());
}

/// Full-run containment: a noisy cube walk never records a position outside
/// the vessel, and produces no geometry warnings.
#[test]
fn cube_run_positions_stay_inside_the_vessel() {
    let params = small_config("cube").resolve().unwrap();
    let half = params.x_max;
    let z_max = params.z_max;
    let run = Simulation::new(params).unwrap().simulate(None).unwrap();

    assert!(run.warnings.is_empty(), "warnings: {:?}", run.warnings);
    for cell in 0..run.cell_count {
        for step in 0..run.step_count {
            let p = run.positions.get(cell, step).unwrap();
            assert!(
                p.x.abs() <= half + 1e-6 && p.y.abs() <= half + 1e-6,
                "cell {} step {} leaked: {:?}",
                cell,
                step,
                p
            );
            assert!(p.z >= -1e-6 && p.z <= z_max + 1e-6, "z leaked: {:?}", p);
        }
    }
}

/// With an egg large enough to fill the vessel, every cell reports contact
/// on its first step.
#[test]
fn egg_contact_is_recorded_per_cell() {
    let mut config = small_config("cube");
    config.gamete.gamete_radius_um = 100_000.0; // 100 mm, swallows the vessel
    let params = config.resolve().unwrap();
    let run = Simulation::new(params).unwrap().simulate(None).unwrap();

    assert_eq!(run.first_egg_contact.len(), run.cell_count as usize);
    assert!(
        run.first_egg_contact.iter().all(|c| *c == Some(0)),
        "contacts: {:?}",
        run.first_egg_contact
    );
}

/// Surface adhesion shows up in the recorded trajectory: after first floor
/// contact the position repeats for the configured number of steps.
#[test]
fn sticking_is_visible_in_the_trajectory() {
    let mut config = small_config("cube");
    config.motility.surface_time_s = 2.0; // 8 steps at 4 Hz
    config.motility.deviation_rad = 0.0;
    let params = config.resolve().unwrap();
    let stick_steps = params.stick_steps;
    assert_eq!(stick_steps, 8);

    let run = Simulation::new(params).unwrap().simulate(None).unwrap();

    // Initial headings point up; the first contact is the ceiling for every
    // straight-swimming cell. Find it per cell and check the hold pattern.
    for cell in 0..run.cell_count {
        let mut contact_step = None;
        for step in 1..run.step_count {
            let prev = run.positions.get(cell, step - 1).unwrap();
            let here = run.positions.get(cell, step).unwrap();
            if prev == here {
                contact_step = Some(step - 1);
                break;
            }
        }
        let Some(start) = contact_step else {
            // Cell never reached a wall within the run; nothing to check.
            continue;
        };
        let held = run.positions.get(cell, start).unwrap();
        for s in start..start + stick_steps {
            if s >= run.step_count {
                break;
            }
            assert_eq!(
                run.positions.get(cell, s).unwrap(),
                held,
                "cell {} moved at step {} while adhered",
                cell,
                s
            );
        }
        if start + stick_steps < run.step_count {
            assert_ne!(
                run.positions.get(cell, start + stick_steps).unwrap(),
                held,
                "cell {} did not resume after adhesion",
                cell
            );
        }
    }
}
