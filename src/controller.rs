//! Drives a [Population] through generations inside an [Environment]: one agent per
//! individual, decisions every tick, fitness on death, evolution on extinction.

use crate::{
    config::Config,
    environment::{Decision, Environment, Normalizer, Reading, SpawnJitter},
    error::{Error, Result},
    population::Population,
};
use rand::Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{info, trace};

/// Summary of a finished generation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationReport {
    pub generation: usize,
    /// Highest fitness scored this generation
    pub best_fitness: f64,
    /// Population index that scored it
    pub best_index: usize,
    /// Highest fitness scored by any generation so far
    pub all_time_best: f64,
}

pub struct Controller<E: Environment, R: Rng> {
    population: Population,
    env: E,
    rng: R,
    alive: Vec<bool>,
    live: usize,
    generation: usize,
    best_fitness: f64,
    threshold: f64,
    normalizer: Normalizer,
    jitter: SpawnJitter,
}

impl<E: Environment, R: Rng> Controller<E, R> {
    /// Build a random population per `config`, and spawn its first generation into `env`
    pub fn new(config: &Config, env: E, mut rng: R) -> Result<Self> {
        config.validate()?;
        let population = Population::new(
            config.population,
            config.topology,
            config.elite_step,
            &mut rng,
        )?;
        Self::with_population(population, config, env, rng)
    }

    /// Drive an existing population. Only the decision, normalization and spawn settings of
    /// `config` are used, and only those are validated.
    pub fn with_population(population: Population, config: &Config, env: E, rng: R) -> Result<Self> {
        config.normalizer.validate()?;
        config.spawn_jitter.validate()?;
        let mut controller = Self {
            alive: vec![false; population.len()],
            population,
            env,
            rng,
            live: 0,
            generation: 1,
            best_fitness: 0.,
            threshold: config.decision_threshold,
            normalizer: config.normalizer,
            jitter: config.spawn_jitter,
        };
        controller.init_generation()?;
        Ok(controller)
    }

    #[inline]
    pub fn population(&self) -> &Population {
        &self.population
    }

    #[inline]
    pub fn env(&self) -> &E {
        &self.env
    }

    #[inline]
    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    /// Current generation, starting at 1
    #[inline]
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Highest fitness of any finished generation
    #[inline]
    pub fn best_fitness(&self) -> f64 {
        self.best_fitness
    }

    #[inline]
    pub fn live_count(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_alive(&self, index: usize) -> bool {
        self.alive.get(index).copied().unwrap_or(false)
    }

    #[inline]
    pub fn all_dead(&self) -> bool {
        self.live == 0
    }

    /// Bind a freshly spawned agent to every individual, and mark all of them alive
    pub fn init_generation(&mut self) -> Result<()> {
        let spawns = (0..self.population.len())
            .map(|index| self.jitter.spawn(index, &mut self.rng))
            .collect::<Result<Vec<_>>>()?;
        self.env.spawn(&spawns);
        self.alive.fill(true);
        self.live = self.alive.len();
        Ok(())
    }

    /// Record the death of `index` with its survival metric as fitness. Only the first call
    /// per individual per generation has any effect, and returns true.
    pub fn mark_dead(&mut self, index: usize, survival: f64) -> Result<bool> {
        let len = self.alive.len();
        let alive = self
            .alive
            .get_mut(index)
            .ok_or(Error::IndexOutOfBounds { index, len })?;
        if !*alive {
            return Ok(false);
        }
        *alive = false;
        self.live -= 1;
        self.population.set_fitness(index, survival)?;
        trace!(index, survival, live = self.live, "agent died");
        Ok(true)
    }

    /// Read every live agent, retire the dead ones, and hand the rest their decision. All
    /// readings are taken before any decision is applied.
    pub fn tick(&mut self) -> Result<()> {
        let readings = (0..self.alive.len())
            .filter(|&idx| self.alive[idx])
            .map(|idx| (idx, self.env.sense(idx)))
            .collect::<Vec<_>>();

        let mut inputs = Vec::with_capacity(readings.len());
        for (idx, reading) in readings {
            match reading {
                Reading::Dead { survival } => {
                    self.mark_dead(idx, survival)?;
                }
                Reading::Sensing(sensors) => inputs.push((idx, self.normalizer.normalize(&sensors))),
                Reading::Blind => {}
            }
        }

        let networks = self.population.networks();
        let threshold = self.threshold;

        #[cfg(feature = "parallel")]
        let inputs = inputs.par_iter();
        #[cfg(not(feature = "parallel"))]
        let inputs = inputs.iter();

        let decisions = inputs
            .map(|(idx, input)| -> Result<(usize, Decision)> {
                let output = networks[*idx].compute(input)?;
                Ok((*idx, Decision::from_output(&output, threshold)))
            })
            .collect::<Result<Vec<_>>>()?;

        for (idx, decision) in decisions {
            self.env.apply(idx, decision);
        }
        Ok(())
    }

    /// Close out an extinct generation: report on it, evolve the population, spawn the next
    /// generation and restart the environment
    pub fn evolve_and_restart(&mut self) -> Result<GenerationReport> {
        let best_index = self.population.best_index();
        let best_fitness = self.population.fitness()[best_index];
        if best_fitness > self.best_fitness {
            self.best_fitness = best_fitness;
        }

        let report = GenerationReport {
            generation: self.generation,
            best_fitness,
            best_index,
            all_time_best: self.best_fitness,
        };
        info!(
            generation = report.generation,
            best_fitness = report.best_fitness,
            best_index = report.best_index,
            all_time_best = report.all_time_best,
            "generation complete"
        );

        self.population.evolve(&mut self.rng)?;
        self.generation += 1;
        self.init_generation()?;
        self.env.restart();
        Ok(report)
    }

    /// Tick once, then evolve if that tick left no agent alive
    pub fn step(&mut self) -> Result<Option<GenerationReport>> {
        self.tick()?;
        if self.all_dead() {
            self.evolve_and_restart().map(Some)
        } else {
            Ok(None)
        }
    }
}
