use anyhow::Context;
use genpaint::config::ConfigManager;
use genpaint::engines::evaluation::{Target, TargetFitness};
use genpaint::engines::generation::{
    ConsoleFrontend, GenerationOrchestrator, Population, TickOutcome,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;

/// Ticks before the demo run shuts itself down
const MAX_TICKS: u64 = 20_000;
const TICK_INTERVAL: Duration = Duration::from_micros(200);

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args().nth(1);
    let manager = ConfigManager::new();
    manager
        .load_layered(config_path.as_deref())
        .context("loading configuration")?;
    let config = manager.get();

    let mut rng = match config.population.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let target = Arc::new(Target::random(
        config.population.primitives_per_genome,
        config.population.primitive_len,
        &mut rng,
    ));
    let fitness = Arc::new(TargetFitness::new(target));

    let frontend = ConsoleFrontend::new(config.population.tribes, config.engine.progress_interval);
    let population = Population::new(config.population.clone(), fitness);
    let mut engine = GenerationOrchestrator::new(config.engine.clone(), population, Box::new(frontend));
    engine.init().context("initializing engine")?;

    let mut ticks = 0;
    loop {
        if engine.tick()? == TickOutcome::ShutDown {
            break;
        }
        std::thread::sleep(TICK_INTERVAL);
        ticks += 1;
        if ticks == MAX_TICKS {
            engine.begin_shutdown();
        }
    }

    let snapshot = engine.snapshot();
    log::info!(
        "Finished: {} generations, best fitness {:.4}, {} mutations, {} crosses",
        snapshot.generations,
        snapshot.best_fitness.unwrap_or(0.0),
        snapshot.mutations,
        snapshot.crosses
    );
    println!("{}", snapshot.to_json()?);
    Ok(())
}
