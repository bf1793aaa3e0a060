//! Flat genomes, and the operators mutating them.

use crate::constants::{
    FLEDGE_PERTURB_DIVISOR, FLEDGE_SCALE_MIN, FLEDGE_SCALE_STEPS, FLEDGE_WEIGHT_MAX,
    FLEDGE_WEIGHT_MIN,
};
use rand::Rng;

/// Every weight of one network, in the network's weight order
pub type Genome = Vec<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Set the gene to a fresh weight
    Replace,
    /// Multiply the gene by a factor in [0.5, 1.5]
    Scale,
    /// Add a delta in [-10, 10]
    Perturb,
}

impl MutationKind {
    const ALL: [Self; 3] = [Self::Replace, Self::Scale, Self::Perturb];

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    fn apply(self, gene: f64, rng: &mut impl Rng) -> f64 {
        match self {
            Self::Replace => rng.random_range(FLEDGE_WEIGHT_MIN..=FLEDGE_WEIGHT_MAX),
            Self::Scale => {
                let factor = f64::from(rng.random_range(0..=FLEDGE_SCALE_STEPS))
                    / f64::from(FLEDGE_SCALE_STEPS)
                    + FLEDGE_SCALE_MIN;
                gene * factor
            }
            Self::Perturb => {
                gene + rng.random_range(FLEDGE_WEIGHT_MIN..=FLEDGE_WEIGHT_MAX)
                    / FLEDGE_PERTURB_DIVISOR
            }
        }
    }
}

/// A single applied mutation event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mutation {
    pub kind: MutationKind,
    pub index: usize,
    pub before: f64,
    pub after: f64,
}

/// Apply between 1 and `genome.len()` mutation events, returning how many were applied.
/// Events pick their gene independently, so one gene may be hit, and compounded, more than once.
pub fn mutate(genome: &mut [f64], rng: &mut impl Rng) -> usize {
    mutate_traced(genome, rng, |_| {})
}

/// [mutate], reporting every event to `trace` as it's applied
pub fn mutate_traced(
    genome: &mut [f64],
    rng: &mut impl Rng,
    mut trace: impl FnMut(Mutation),
) -> usize {
    if genome.is_empty() {
        return 0;
    }

    let count = rng.random_range(1..=genome.len());
    for _ in 0..count {
        let kind = MutationKind::random(rng);
        let index = rng.random_range(0..genome.len());
        let before = genome[index];
        genome[index] = kind.apply(before, rng);
        trace(Mutation {
            kind,
            index,
            before,
            after: genome[index],
        });
    }
    count
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::random::WyRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Uniform};

    fn genome(rng: &mut impl Rng, len: usize) -> Genome {
        let dist = Uniform::new(-1000., 1000.).unwrap();
        (0..len).map(|_| dist.sample(rng)).collect()
    }

    #[test]
    fn test_mutation_count_bounds() {
        let mut rng = WyRng::seed_from_u64(0);
        for len in [1, 2, 9, 44, 200] {
            for _ in 0..200 {
                let mut g = genome(&mut rng, len);
                let mut events = 0;
                let count = mutate_traced(&mut g, &mut rng, |_| events += 1);
                assert_eq!(count, events);
                assert!((1..=len).contains(&count), "{count} not in 1..={len}");
                assert_eq!(g.len(), len);
            }
        }
    }

    #[test]
    fn test_mutation_count_reaches_bounds() {
        let mut rng = WyRng::seed_from_u64(1);
        let counts = (0..2000)
            .map(|_| mutate(&mut [0.; 3], &mut rng))
            .collect::<Vec<_>>();
        assert!(counts.contains(&1));
        assert!(counts.contains(&3));
    }

    #[test]
    fn test_mutation_event_bounds() {
        let mut rng = WyRng::seed_from_u64(2);
        let mut seen = [false; 3];
        for _ in 0..500 {
            let mut g = genome(&mut rng, 44);
            mutate_traced(&mut g, &mut rng, |m| match m.kind {
                MutationKind::Replace => {
                    seen[0] = true;
                    assert!((-1000. ..=1000.).contains(&m.after), "{m:?}");
                }
                MutationKind::Scale => {
                    seen[1] = true;
                    let (lo, hi) = (m.before.abs() * 0.5, m.before.abs() * 1.5);
                    assert!(
                        m.after.abs() >= lo - 1e-9 && m.after.abs() <= hi + 1e-9,
                        "{m:?}"
                    );
                    assert!(m.before == 0. || m.after.signum() == m.before.signum(), "{m:?}");
                }
                MutationKind::Perturb => {
                    seen[2] = true;
                    assert!((m.after - m.before).abs() <= 10. + 1e-9, "{m:?}");
                }
            });
        }
        assert_eq!(seen, [true; 3]);
    }

    #[test]
    fn test_mutation_events_compound() {
        let mut rng = WyRng::seed_from_u64(3);
        for _ in 0..100 {
            let original = genome(&mut rng, 4);
            let mut g = original.clone();
            let mut replay = original.clone();
            mutate_traced(&mut g, &mut rng, |m| {
                // every event starts from whatever the previous event on that gene left
                assert_eq!(replay[m.index], m.before);
                replay[m.index] = m.after;
            });
            assert_eq!(g, replay);
        }
    }

    #[test]
    fn test_mutate_deterministic() {
        let mut l = genome(&mut WyRng::seed_from_u64(4), 44);
        let mut r = l.clone();
        mutate(&mut l, &mut WyRng::seed_from_u64(5));
        mutate(&mut r, &mut WyRng::seed_from_u64(5));
        assert_eq!(l, r);
    }

    #[test]
    fn test_mutate_empty() {
        let mut rng = WyRng::seed_from_u64(6);
        assert_eq!(mutate(&mut [], &mut rng), 0);
    }
}
