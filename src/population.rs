//! Functions and structs related to managing networks at the population scale.

use crate::{
    error::{Error, Result},
    genome::{mutate, Genome},
    network::{Network, Topology},
    random::{self, WyRng},
};
use rand::Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

/// A fixed size population of networks, and the fitness each scored this generation.
/// `fitness[i]` always belongs to `networks[i]`.
#[derive(Debug)]
pub struct Population {
    networks: Vec<Network>,
    fitness: Vec<f64>,
    elite_step: usize,
}

impl Population {
    /// `size` randomly weighted networks of `topology`. `elite_step` is clamped to at least 1.
    pub fn new(
        size: usize,
        topology: Topology,
        elite_step: usize,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        if size == 0 {
            return Err(Error::EmptyPopulation);
        }
        let networks = (0..size)
            .map(|_| Network::random(topology, rng))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            networks,
            fitness: vec![0.; size],
            elite_step: elite_step.max(1),
        })
    }

    /// A population of existing networks, which must all share one topology
    pub fn from_networks(networks: Vec<Network>, elite_step: usize) -> Result<Self> {
        let topology = networks.first().ok_or(Error::EmptyPopulation)?.topology();
        if networks.iter().any(|n| n.topology() != topology) {
            return Err(Error::InvalidTopology(
                "every network of a population must share one topology".into(),
            ));
        }
        Ok(Self {
            fitness: vec![0.; networks.len()],
            networks,
            elite_step: elite_step.max(1),
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.networks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    #[inline]
    pub fn elite_step(&self) -> usize {
        self.elite_step
    }

    #[inline]
    pub fn topology(&self) -> Topology {
        self.networks[0].topology()
    }

    #[inline]
    pub fn networks(&self) -> &[Network] {
        &self.networks
    }

    #[inline]
    pub fn network(&self, index: usize) -> Option<&Network> {
        self.networks.get(index)
    }

    #[inline]
    pub fn fitness(&self) -> &[f64] {
        &self.fitness
    }

    /// Unconditionally overwrite the fitness at `index`
    pub fn set_fitness(&mut self, index: usize, value: f64) -> Result<()> {
        let len = self.len();
        let slot = self
            .fitness
            .get_mut(index)
            .ok_or(Error::IndexOutOfBounds { index, len })?;
        *slot = value;
        Ok(())
    }

    /// Index of the highest fitness, the lowest index among equals. Always `ranked()[0]`.
    pub fn best_index(&self) -> usize {
        let mut best = 0;
        for (idx, fit) in self.fitness.iter().enumerate().skip(1) {
            if fit.total_cmp(&self.fitness[best]).is_gt() {
                best = idx;
            }
        }
        best
    }

    #[inline]
    pub fn best_fitness(&self) -> f64 {
        self.fitness[self.best_index()]
    }

    /// The network at [Population::best_index]
    #[inline]
    pub fn champion(&self) -> &Network {
        &self.networks[self.best_index()]
    }

    /// Population indices ordered by descending fitness. Equal fitness keeps index order.
    pub fn ranked(&self) -> Vec<usize> {
        let mut ranked = (0..self.len()).collect::<Vec<_>>();
        ranked.sort_by(|&l, &r| self.fitness[r].total_cmp(&self.fitness[l]));
        ranked
    }

    /// Produce the next generation in place: striped duplication of the top ranks, mutation of
    /// every rank past the elites, and a fitness reset.
    pub fn evolve(&mut self, rng: &mut impl Rng) -> Result<()> {
        self.evolve_with(rng, |genome, rng| mutate(genome, rng))
    }

    /// [Population::evolve], mutating non-elite genomes with `mutator`. Each mutated individual
    /// gets its own generator, seeded from `rng` in rank order.
    pub fn evolve_with<M>(&mut self, rng: &mut impl Rng, mutator: M) -> Result<()>
    where
        M: Fn(&mut [f64], &mut WyRng) -> usize + Sync,
    {
        let ranked = self.ranked();
        let step = self.elite_step.min(self.len());

        let mut genomes = self
            .networks
            .iter()
            .map(Network::to_genome)
            .collect::<Vec<_>>();
        duplicate_striped(&mut genomes, &ranked, self.elite_step);

        let mut seeds = vec![None; self.len()];
        let streams = random::stream_seeds(rng, self.len() - step);
        for (&idx, seed) in ranked[step..].iter().zip(streams) {
            seeds[idx] = Some(seed);
        }

        #[cfg(feature = "parallel")]
        let slots = genomes.par_iter_mut().zip(seeds.par_iter());
        #[cfg(not(feature = "parallel"))]
        let slots = genomes.iter_mut().zip(seeds.iter());

        let events: usize = slots
            .filter_map(|(genome, seed)| {
                seed.map(|seed| mutator(genome.as_mut_slice(), &mut WyRng::seeded(seed)))
            })
            .sum();

        for (network, genome) in self.networks.iter_mut().zip(&genomes) {
            network.from_genome(genome)?;
        }
        self.fitness.fill(0.);

        debug!(
            population = self.len(),
            elite_step = self.elite_step,
            mutated = self.len() - step,
            events,
            "evolved population"
        );
        Ok(())
    }
}

/// For every elite rank `i` below `step`, copy its genome over ranks `step + i`,
/// `2 step + i`, ... Ranks are resolved to genome indices through `ranked`.
pub fn duplicate_striped(genomes: &mut [Genome], ranked: &[usize], step: usize) {
    let step = step.max(1);
    for i in 0..step.min(ranked.len()) {
        let elite = genomes[ranked[i]].clone();
        for j in (step + i..ranked.len()).step_by(step) {
            genomes[ranked[j]].copy_from_slice(&elite);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{RngCore, SeedableRng};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn population(size: usize, step: usize, seed: u64) -> Population {
        Population::new(
            size,
            Topology::new(1, 2, 2, 1).unwrap(),
            step,
            &mut WyRng::seed_from_u64(seed),
        )
        .unwrap()
    }

    fn genomes(pop: &Population) -> Vec<Genome> {
        pop.networks().iter().map(Network::to_genome).collect()
    }

    #[test]
    fn test_empty_population() {
        assert!(matches!(
            Population::new(0, Topology::default(), 5, &mut WyRng::seed_from_u64(0)),
            Err(Error::EmptyPopulation)
        ));
    }

    #[test]
    fn test_population_init() {
        let pop = Population::new(40, Topology::default(), 0, &mut WyRng::seed_from_u64(0)).unwrap();
        assert_eq!(pop.len(), 40);
        assert_eq!(pop.elite_step(), 1);
        assert!(pop.fitness().iter().all(|f| *f == 0.));
        assert!(pop
            .networks()
            .iter()
            .all(|n| n.total_weights() == Topology::default().total_weights()));
        // independently seeded weights
        assert_ne!(pop.networks()[0], pop.networks()[1]);
    }

    #[test]
    fn test_from_networks() {
        let mut rng = WyRng::seed_from_u64(0);
        let small = Topology::new(1, 2, 2, 1).unwrap();
        let networks = (0..3)
            .map(|_| Network::random(small, &mut rng).unwrap())
            .collect::<Vec<_>>();
        let pop = Population::from_networks(networks.clone(), 5).unwrap();
        assert_eq!(pop.networks(), networks.as_slice());
        assert_eq!(pop.fitness(), &[0.; 3]);

        assert!(matches!(
            Population::from_networks(vec![], 5),
            Err(Error::EmptyPopulation)
        ));

        let mut mixed = networks;
        mixed.push(Network::random(Topology::default(), &mut rng).unwrap());
        assert!(matches!(
            Population::from_networks(mixed, 5),
            Err(Error::InvalidTopology(_))
        ));
    }

    #[test]
    fn test_set_fitness() {
        let mut pop = population(4, 5, 0);
        pop.set_fitness(2, 3.5).unwrap();
        pop.set_fitness(2, 1.5).unwrap();
        assert_eq!(pop.fitness(), &[0., 0., 1.5, 0.]);
        assert!(matches!(
            pop.set_fitness(4, 1.),
            Err(Error::IndexOutOfBounds { index: 4, len: 4 })
        ));
    }

    #[test]
    fn test_best_index() {
        let mut pop = population(5, 5, 0);
        assert_eq!(pop.best_index(), 0);
        for (idx, fit) in [3., 9., 1., 9., 7.].into_iter().enumerate() {
            pop.set_fitness(idx, fit).unwrap();
        }
        assert_eq!(pop.best_index(), 1);
        assert_eq!(pop.best_fitness(), 9.);
        assert_eq!(pop.champion(), &pop.networks()[1]);
    }

    #[test]
    fn test_best_index_agrees_with_ranked() {
        let mut pop = population(4, 5, 0);
        for fitness in [
            [-0., 0., -0., 0.],
            [1., f64::NAN, 3., 2.],
            [f64::NEG_INFINITY, -1., -1., f64::NEG_INFINITY],
        ] {
            for (idx, fit) in fitness.into_iter().enumerate() {
                pop.set_fitness(idx, fit).unwrap();
            }
            assert_eq!(pop.best_index(), pop.ranked()[0], "{fitness:?}");
        }
        assert_eq!(pop.best_index(), 1);
    }

    #[test]
    fn test_ranked() {
        let mut pop = population(4, 5, 0);
        for (idx, fit) in [3., 9., 1., 7.].into_iter().enumerate() {
            pop.set_fitness(idx, fit).unwrap();
        }
        assert_eq!(pop.ranked(), vec![1, 3, 0, 2]);

        for (idx, fit) in [1., 1., 2., 1.].into_iter().enumerate() {
            pop.set_fitness(idx, fit).unwrap();
        }
        assert_eq!(pop.ranked(), vec![2, 0, 1, 3]);
    }

    #[test]
    fn test_duplicate_striped_20_by_5() {
        let mut pop = population(20, 5, 1);
        // rank r sits at index 19 - r
        for idx in 0..20 {
            pop.set_fitness(idx, idx as f64).unwrap();
        }
        let ranked = pop.ranked();
        assert_eq!(ranked, (0..20).rev().collect::<Vec<_>>());

        let before = genomes(&pop);
        pop.evolve_with(&mut WyRng::seed_from_u64(2), |_, _| 0).unwrap();
        let after = genomes(&pop);

        for rank in 0..5 {
            assert_eq!(after[ranked[rank]], before[ranked[rank]]);
        }
        for (elite, stripe) in [
            (0, [5, 10, 15]),
            (1, [6, 11, 16]),
            (2, [7, 12, 17]),
            (3, [8, 13, 18]),
            (4, [9, 14, 19]),
        ] {
            for rank in stripe {
                assert_eq!(
                    after[ranked[rank]], before[ranked[elite]],
                    "rank {rank} should hold rank {elite}"
                );
            }
        }
    }

    #[test]
    fn test_duplicate_striped_uneven() {
        let mut genomes = (0..12).map(|i| vec![i as f64; 3]).collect::<Vec<_>>();
        let ranked = (0..12).collect::<Vec<_>>();
        duplicate_striped(&mut genomes, &ranked, 5);

        let heads = genomes.iter().map(|g| g[0] as usize).collect::<Vec<_>>();
        assert_eq!(heads, vec![0, 1, 2, 3, 4, 0, 1, 2, 3, 4, 0, 1]);
    }

    #[test]
    fn test_duplicate_striped_small_population() {
        let mut genomes = (0..3).map(|i| vec![i as f64]).collect::<Vec<_>>();
        duplicate_striped(&mut genomes, &[2, 0, 1], 5);
        assert_eq!(genomes, vec![vec![0.], vec![1.], vec![2.]]);
    }

    #[test]
    fn test_evolve_mutates_only_past_elites() {
        let mut pop = population(20, 5, 3);
        for idx in 0..20 {
            pop.set_fitness(idx, (idx * 7 % 20) as f64).unwrap();
        }
        let ranked = pop.ranked();
        let before = genomes(&pop);

        let calls = AtomicUsize::new(0);
        pop.evolve_with(&mut WyRng::seed_from_u64(4), |genome, _| {
            calls.fetch_add(1, Ordering::Relaxed);
            genome.fill(f64::MAX);
            1
        })
        .unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 15);

        let after = genomes(&pop);
        for (rank, &idx) in ranked.iter().enumerate() {
            if rank < 5 {
                assert_eq!(after[idx], before[idx]);
            } else {
                assert!(after[idx].iter().all(|w| *w == f64::MAX));
            }
        }
    }

    #[test]
    fn test_evolve_resets_fitness_and_keeps_length() {
        let mut pop = population(30, 5, 5);
        let mut rng = WyRng::seed_from_u64(6);
        let len = pop.topology().total_weights();
        for generation in 0..10 {
            for idx in 0..pop.len() {
                pop.set_fitness(idx, (idx * generation) as f64).unwrap();
            }
            pop.evolve(&mut rng).unwrap();
            assert!(pop.fitness().iter().all(|f| *f == 0.));
            assert_eq!(pop.len(), 30);
            assert!(pop.networks().iter().all(|n| n.total_weights() == len));
        }
    }

    #[test]
    fn test_evolve_elites_survive_unchanged() {
        let mut pop = population(20, 5, 7);
        for idx in 0..20 {
            pop.set_fitness(idx, idx as f64).unwrap();
        }
        let before = genomes(&pop);
        pop.evolve(&mut WyRng::seed_from_u64(8)).unwrap();
        let after = genomes(&pop);
        for idx in 15..20 {
            assert_eq!(after[idx], before[idx]);
        }
    }

    #[test]
    fn test_evolve_deterministic() {
        let mut l = population(50, 5, 9);
        let mut r = population(50, 5, 9);
        let mut rng_l = WyRng::seed_from_u64(10);
        let mut rng_r = WyRng::seed_from_u64(10);
        for _ in 0..5 {
            for idx in 0..50 {
                l.set_fitness(idx, (idx % 13) as f64).unwrap();
                r.set_fitness(idx, (idx % 13) as f64).unwrap();
            }
            l.evolve(&mut rng_l).unwrap();
            r.evolve(&mut rng_r).unwrap();
        }
        assert_eq!(genomes(&l), genomes(&r));
    }

    /// Build the next generation one genome at a time, in rank order, with no parallelism
    fn evolve_serially(pop: &Population, rng: &mut WyRng) -> Vec<Genome> {
        let ranked = pop.ranked();
        let step = pop.elite_step().min(pop.len());
        let mut next = genomes(pop);
        duplicate_striped(&mut next, &ranked, pop.elite_step());
        let seeds = random::stream_seeds(rng, pop.len() - step);
        for (&idx, seed) in ranked[step..].iter().zip(seeds) {
            mutate(&mut next[idx], &mut WyRng::seeded(seed));
        }
        next
    }

    fn bits(genomes: &[Genome]) -> Vec<Vec<u64>> {
        genomes
            .iter()
            .map(|g| g.iter().map(|w| w.to_bits()).collect())
            .collect()
    }

    #[test]
    fn test_evolve_matches_serial_order() {
        let mut pop = Population::new(
            64,
            Topology::default(),
            5,
            &mut WyRng::seed_from_u64(11),
        )
        .unwrap();
        let mut rng = WyRng::seed_from_u64(12);
        let mut reference = rng.clone();

        for generation in 0..8 {
            for idx in 0..pop.len() {
                pop.set_fitness(idx, ((idx * 31 + generation * 7) % 17) as f64)
                    .unwrap();
            }
            let expected = evolve_serially(&pop, &mut reference);
            pop.evolve(&mut rng).unwrap();
            assert_eq!(bits(&genomes(&pop)), bits(&expected), "generation {generation}");
        }
        assert_eq!(rng.next_u64(), reference.next_u64());
    }
}
