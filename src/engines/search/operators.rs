use crate::types::Selection;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generator for a run: seeded when a seed is configured, entropy otherwise.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Generator for a run resumed after `step`. Deterministic for a given
/// seed and step.
pub fn resumed_rng(seed: Option<u64>, step: Option<usize>) -> StdRng {
    let offset = step.map_or(0, |s| s as u64 + 1);
    seeded_rng(seed.map(|seed| seed.wrapping_add(offset)))
}

/// Uniform random selection: every bit is an independent fair draw.
pub fn random_selection<R: Rng>(len: usize, rng: &mut R) -> Selection {
    Selection::from_bools((0..len).map(|_| rng.gen_bool(0.5)).collect())
}

/// Population paired with its costs, sorted ascending by cost. Ties keep
/// their population order.
pub fn rank_population(population: &[Selection], costs: &[f64]) -> Vec<(Selection, f64)> {
    let mut ranked: Vec<(Selection, f64)> = population
        .iter()
        .cloned()
        .zip(costs.iter().copied())
        .collect();
    ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked
}

/// Split the ranked population into the elite cohort (first `elite_count`)
/// and the breeding cohort (the rest of the first `num_parents`).
pub fn split_cohorts(
    ranked: &[(Selection, f64)],
    num_parents: usize,
    elite_count: usize,
) -> (Vec<Selection>, Vec<Selection>) {
    let cutoff = num_parents.min(ranked.len());
    let elite_end = elite_count.min(cutoff);
    let elites = ranked[..elite_end].iter().map(|(s, _)| s.clone()).collect();
    let parents = ranked[elite_end..cutoff].iter().map(|(s, _)| s.clone()).collect();
    (elites, parents)
}

/// Single-point crossover with one point shared by the whole batch.
///
/// The point is drawn once from `[1, len - 1]`; each child then takes two
/// parents drawn with replacement and joins the first one's prefix with
/// the second one's suffix. Universes with a single feature have no valid
/// point and children copy their first parent.
pub fn crossover<R: Rng>(parents: &[Selection], offspring_count: usize, rng: &mut R) -> Vec<Selection> {
    if parents.is_empty() || offspring_count == 0 {
        return Vec::new();
    }

    let len = parents[0].len();
    let point = if len > 1 { Some(rng.gen_range(1..len)) } else { None };

    (0..offspring_count)
        .map(|_| {
            let parent1 = &parents[rng.gen_range(0..parents.len())];
            let parent2 = &parents[rng.gen_range(0..parents.len())];
            match point {
                Some(point) => {
                    let mut bits = parent1.bits()[..point].to_vec();
                    bits.extend_from_slice(&parent2.bits()[point..]);
                    Selection::from_bools(bits)
                }
                None => parent1.clone(),
            }
        })
        .collect()
}

/// Flip exactly one uniformly chosen bit of every child.
pub fn mutate<R: Rng>(offspring: &mut [Selection], rng: &mut R) {
    for child in offspring.iter_mut() {
        if child.is_empty() {
            continue;
        }
        let point = rng.gen_range(0..child.len());
        child.flip(point);
    }
}

/// Copy of `solution` with one uniformly chosen bit flipped.
pub fn neighbour<R: Rng>(solution: &Selection, rng: &mut R) -> Selection {
    if solution.is_empty() {
        return solution.clone();
    }
    solution.with_flipped(rng.gen_range(0..solution.len()))
}

/// Metropolis acceptance probability for a minimised cost.
///
/// Strict improvements are always accepted. Otherwise the probability is
/// `exp((current - candidate) / temperature)`, which is 0 once the
/// temperature has reached 0.
pub fn acceptance_probability(current_cost: f64, candidate_cost: f64, temperature: f64) -> f64 {
    if candidate_cost < current_cost {
        return 1.0;
    }
    if temperature <= 0.0 {
        return 0.0;
    }
    ((current_cost - candidate_cost) / temperature).exp()
}
