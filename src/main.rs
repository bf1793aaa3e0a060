use fledge::{random, Config, Controller, GapRunner};
use rand::RngCore;
use std::{env, error::Error};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DT: f64 = 1. / 60.;
const TICK_LIMIT: u64 = 60 * 60 * 5;

/// Usage: `fledge [config.json] [champion.json]`
fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match env::args().nth(1) {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let mut rng = random::seeded(config.seed);
    let world = GapRunner::new(rng.next_u64()).with_tick_limit(TICK_LIMIT);
    let mut controller = Controller::new(&config, world, rng)?;
    info!(
        population = config.population,
        generations = config.generations,
        "starting"
    );

    let mut last = None;
    while controller.generation() <= config.generations {
        match controller.step()? {
            Some(report) => last = Some(report),
            None => controller.env_mut().advance(DT),
        }
    }

    let Some(report) = last else {
        warn!("no generation completed");
        return Ok(());
    };
    println!(
        "ran {} generations, best fitness {}",
        report.generation, report.all_time_best
    );

    // elites survive evolve untouched, so the last champion is still at its index
    if let (Some(path), Some(champion)) = (
        env::args().nth(2),
        controller.population().network(report.best_index),
    ) {
        champion.to_file(&path)?;
        info!(path = %path, fitness = report.best_fitness, "exported champion");
    }
    Ok(())
}
