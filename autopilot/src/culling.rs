//! Periodic removal of the lower half of a live population.

/// Ranks `fitness` descending and returns the indices of the lowest
/// `floor(N / 2)` entries, in ascending index order.
///
/// The sort is stable, so among equal fitness the entry with the lower index
/// (the earlier spawned agent) ranks higher and survives.
pub fn cull_lower_half(fitness: &[f64]) -> Vec<usize> {
    let mut ranked: Vec<usize> = (0..fitness.len()).collect();
    ranked.sort_by(|&a, &b| fitness[b].total_cmp(&fitness[a]));

    let keep = fitness.len() - fitness.len() / 2;
    let mut removed = ranked.split_off(keep);
    removed.sort_unstable();
    removed
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CullingPolicy {
    pub min_population: usize,
}

impl CullingPolicy {
    pub fn new(min_population: usize) -> Self {
        Self { min_population }
    }

    /// Indices to remove, or nothing when the population is at or below the
    /// floor.
    pub fn select(&self, fitness: &[f64]) -> Vec<usize> {
        if fitness.len() <= self.min_population {
            return Vec::new();
        }
        cull_lower_half(fitness)
    }
}
