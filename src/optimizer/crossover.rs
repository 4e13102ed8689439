use super::Genome;
use fastrand::Rng;

/// Uniform crossover of one group's genes.
///
/// Each position inherits from either parent at random as long as the chord
/// is still free; gaps take the other parent's gene, then any unused gene of
/// either parent. When both parents are duplicate-free, so is the child.
pub fn crossover_uniform(p1: &[usize], p2: &[usize], rng: &mut Rng) -> Vec<usize> {
    let len = p1.len();
    let mut child: Vec<Option<usize>> = vec![None; len];
    let mut used: Vec<usize> = Vec::with_capacity(len);

    // 1. Random inheritance
    for i in 0..len {
        let gene = if rng.bool() { p1[i] } else { p2[i] };
        if !used.contains(&gene) {
            child[i] = Some(gene);
            used.push(gene);
        }
    }

    // 2. Other parent at the same position
    for i in 0..len {
        if child[i].is_some() {
            continue;
        }
        for gene in [p1[i], p2[i]] {
            if !used.contains(&gene) {
                child[i] = Some(gene);
                used.push(gene);
                break;
            }
        }
    }

    // 3. Any leftover parent gene
    let mut spare = p1.iter().chain(p2.iter()).copied();
    for (i, slot) in child.iter_mut().enumerate() {
        if slot.is_some() {
            continue;
        }
        let gene = spare.by_ref().find(|g| !used.contains(g)).unwrap_or(p1[i]);
        used.push(gene);
        *slot = Some(gene);
    }

    child.into_iter().flatten().collect()
}

pub fn crossover(a: &Genome, b: &Genome, rng: &mut Rng) -> Genome {
    Genome {
        genes: a
            .genes
            .iter()
            .zip(&b.genes)
            .map(|(g1, g2)| crossover_uniform(g1, g2, rng))
            .collect(),
    }
}
