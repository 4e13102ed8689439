use super::{Genome, SearchSpace};
use fastrand::Rng;

/// Exchanges the chords of two phonemes of the same group.
pub fn swap_genes(genes: &mut [usize], rng: &mut Rng) -> bool {
    if genes.len() < 2 {
        return false;
    }
    let a = rng.usize(0..genes.len());
    let b = rng.usize(0..genes.len());
    if a == b {
        return false;
    }
    genes.swap(a, b);
    true
}

/// Moves one phoneme onto a chord no other phoneme of the group uses.
pub fn reassign_gene(genes: &mut [usize], pool_len: usize, rng: &mut Rng) -> bool {
    if genes.is_empty() || pool_len <= genes.len() {
        return false;
    }
    let free: Vec<usize> = (0..pool_len).filter(|i| !genes.contains(i)).collect();
    if free.is_empty() {
        return false;
    }
    let slot = rng.usize(0..genes.len());
    genes[slot] = free[rng.usize(0..free.len())];
    true
}

/// Applies one random change to a random group.
pub fn mutate(genome: &mut Genome, space: &SearchSpace, rng: &mut Rng) {
    if space.groups.is_empty() {
        return;
    }
    let g = rng.usize(0..space.groups.len());
    let pool_len = space.groups[g].pool.len();
    let genes = &mut genome.genes[g];
    let changed = if rng.bool() {
        swap_genes(genes, rng)
    } else {
        reassign_gene(genes, pool_len, rng)
    };
    if !changed && !reassign_gene(genes, pool_len, rng) {
        swap_genes(genes, rng);
    }
}
