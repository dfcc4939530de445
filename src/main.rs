use anyhow::Result;
use log::{debug, error, info, warn};
use motility_common::{SimulationConfig, SimulationRun};
use motility_engine::Simulation;
use std::fs::File;
use std::io::Write;
use std::time::Instant;

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    info!("Starting motility engine (CPU parallel)...");

    // --- Load Configuration ---
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = SimulationConfig::load(&config_path)?;
    let mut params = config.resolve()?;

    if config.run.seed.is_none() {
        // Record an entropy-drawn seed so the run stays reproducible.
        params.seed = rand::random();
        info!("No seed configured; drew {} from OS entropy.", params.seed);
    }

    info!(
        "Shape {:?}: {} cells x {} steps, step length {:.4} mm, {} repeat(s).",
        params.shape, params.cell_count, params.step_count, params.step_length, params.sim_repeat
    );
    info!("Using {} Rayon threads.", rayon::current_num_threads());

    // --- Simulation Runs ---
    let base_seed = params.seed;
    let mut runs: Vec<SimulationRun> = Vec::with_capacity(params.sim_repeat as usize);
    for repeat in 0..params.sim_repeat {
        let mut run_params = params.clone();
        run_params.seed = base_seed.wrapping_add(repeat as u64);

        let sim = Simulation::new(run_params)?;
        let start = Instant::now();
        let run = sim.simulate(Some(&|done, total| {
            if done == total || done % 100 == 0 {
                debug!("Trajectories computed: {} / {}", done, total);
            }
        }))?;
        info!(
            "Run {}/{} (seed {}) finished in {:.3} s.",
            repeat + 1,
            params.sim_repeat,
            run.seed,
            start.elapsed().as_secs_f64()
        );
        if !run.warnings.is_empty() {
            warn!(
                "Run {} produced {} geometry violation(s); inspect before trusting the result.",
                repeat + 1,
                run.warnings.len()
            );
        }
        runs.push(run);
    }

    // --- Save Recorded Data ---
    let output_format = config.output.format.as_deref().unwrap_or("json");
    match output_format {
        "json" => {
            let filename = format!("{}_runs.json", config.output.base_filename);
            match File::create(&filename) {
                Ok(mut file) => match serde_json::to_string(&runs) {
                    Ok(json_string) => {
                        if let Err(e) = file.write_all(json_string.as_bytes()) {
                            error!("Error writing run JSON to file '{}': {}", filename, e);
                        } else {
                            info!("All runs saved to {}", filename);
                        }
                    }
                    Err(e) => error!("Error serializing runs to JSON: {}", e),
                },
                Err(e) => error!("Error creating run file '{}': {}", filename, e),
            }
        }
        "bincode" => {
            let filename = format!("{}_runs.bin", config.output.base_filename);
            match File::create(&filename) {
                Ok(file) => match bincode::serialize_into(file, &runs) {
                    Ok(_) => info!("All runs saved to {} (binary format)", filename),
                    Err(e) => error!("Error serializing runs to bincode: {}", e),
                },
                Err(e) => error!("Error creating run file '{}': {}", filename, e),
            }
        }
        "messagepack" => {
            let filename = format!("{}_runs.msgpack", config.output.base_filename);
            match &mut File::create(&filename) {
                Ok(file) => match rmp_serde::encode::write(file, &runs) {
                    Ok(_) => info!("All runs saved to {} (MessagePack format)", filename),
                    Err(e) => error!("Error serializing runs to MessagePack: {}", e),
                },
                Err(e) => error!("Error creating run file '{}': {}", filename, e),
            }
        }
        other => {
            error!("Unknown output format: {}. Skipping run serialization.", other);
        }
    }

    // Flat CSV export of the trajectories, if requested.
    if config.output.save_trajectories {
        let filename = format!("{}_trajectories.csv", config.output.base_filename);
        match csv::Writer::from_path(&filename) {
            Ok(mut writer) => {
                writer.write_record(["run", "cell", "step", "x_mm", "y_mm", "z_mm"])?;
                for (run_idx, run) in runs.iter().enumerate() {
                    for cell in 0..run.cell_count {
                        for step in 0..run.step_count {
                            if let Some(p) = run.positions.get(cell, step) {
                                writer.write_record([
                                    run_idx.to_string(),
                                    cell.to_string(),
                                    step.to_string(),
                                    format!("{:.6}", p.x),
                                    format!("{:.6}", p.y),
                                    format!("{:.6}", p.z),
                                ])?;
                            }
                        }
                    }
                }
                writer.flush()?;
                info!("Trajectories saved to {}", filename);
            }
            Err(e) => error!("Error saving CSV file '{}': {}", filename, e),
        }
    } else {
        info!("Skipping trajectory CSV export as per config.");
    }

    info!("Simulation Complete.");
    Ok(())
}
