pub mod crossover;
pub mod mutation;
pub mod runner;

pub use self::runner::{OptimizationOptions, OptimizationResult, Optimizer, ProgressCallback};

use crate::biphoneme::BiphonemeTable;
use crate::config::KeymapParams;
use crate::error::{SfResult, StenoForgeError};
use crate::keyboard::{Chord, Keyboard};
use crate::keymap::Keymap;
use crate::phonology::{Phoneme, PositionGroup};
use fastrand::Rng;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Phonemes of one group and the chords they may take.
#[derive(Debug, Clone)]
pub struct GroupSpace {
    pub group: PositionGroup,
    /// Observed phonemes, most frequent first.
    pub phonemes: Vec<Phoneme>,
    /// Candidate chords, easiest first.
    pub pool: Vec<Chord>,
}

/// Everything a genome indexes into.
#[derive(Debug, Clone)]
pub struct SearchSpace {
    pub groups: Vec<GroupSpace>,
}

/// One gene per phoneme: an index into the group's chord pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Genome {
    pub genes: Vec<Vec<usize>>,
}

impl SearchSpace {
    pub fn new(
        table: &BiphonemeTable,
        keyboard: &Keyboard,
        params: &KeymapParams,
        surcharge: f64,
    ) -> SfResult<Self> {
        let mut groups = Vec::new();
        for group in PositionGroup::ALL {
            let stats = table.group(group);
            let mut phonemes: Vec<Phoneme> = stats
                .alphabet
                .iter()
                .filter(|p| stats.single(p) > 0.0)
                .cloned()
                .collect();
            if phonemes.is_empty() {
                continue;
            }
            phonemes.sort_by(|a, b| {
                stats
                    .single(b)
                    .total_cmp(&stats.single(a))
                    .then_with(|| a.cmp(b))
            });

            let pool = keyboard.chord_pool(group, params.max_chord_keys, surcharge);
            if pool.is_empty() {
                return Err(StenoForgeError::Configuration(format!(
                    "Keyboard '{}' has no usable chord for the {} group",
                    keyboard.name, group
                )));
            }
            if pool.len() < phonemes.len() {
                debug!(
                    "{}: {} phonemes for {} chords, some will share",
                    group,
                    phonemes.len(),
                    pool.len()
                );
            }
            groups.push(GroupSpace {
                group,
                phonemes,
                pool,
            });
        }
        Ok(Self { groups })
    }

    pub fn gene_count(&self) -> usize {
        self.groups.iter().map(|g| g.phonemes.len()).sum()
    }

    /// Distinct chords per group when the pool allows it.
    pub fn random_genome(&self, rng: &mut Rng) -> Genome {
        let genes = self
            .groups
            .iter()
            .map(|space| {
                let mut indices: Vec<usize> = (0..space.pool.len()).collect();
                rng.shuffle(&mut indices);
                (0..space.phonemes.len())
                    .map(|i| indices[i % indices.len()])
                    .collect()
            })
            .collect();
        Genome { genes }
    }

    /// Entries a genome cannot carry: multi-phoneme entries and alternative
    /// chords beyond the primary one.
    pub fn unencodable(keymap: &Keymap) -> (usize, usize) {
        keymap.entries().fold((0, 0), |(multi, alts), ((_, phonemes), chords)| {
            (
                multi + usize::from(phonemes.len() > 1),
                alts + chords.len().saturating_sub(1),
            )
        })
    }

    /// Genome of an existing keymap. Phonemes without a pool chord take a
    /// random unused one.
    pub fn encode(&self, keymap: &Keymap, rng: &mut Rng) -> Genome {
        let (multi, alts) = Self::unencodable(keymap);
        if multi > 0 || alts > 0 {
            warn!(
                "Seed keymap loses {} multi-phoneme entries and {} alternative chords",
                multi, alts
            );
        }
        let genes = self
            .groups
            .iter()
            .map(|space| {
                let index: HashMap<Chord, usize> =
                    space.pool.iter().enumerate().map(|(i, c)| (*c, i)).collect();
                let mut genes: Vec<Option<usize>> = space
                    .phonemes
                    .iter()
                    .map(|p| {
                        keymap
                            .primary(space.group, std::slice::from_ref(p))
                            .and_then(|c| index.get(&c).copied())
                    })
                    .collect();
                let used: HashSet<usize> = genes.iter().flatten().copied().collect();
                let mut free: Vec<usize> =
                    (0..space.pool.len()).filter(|i| !used.contains(i)).collect();
                rng.shuffle(&mut free);
                for gene in genes.iter_mut().filter(|g| g.is_none()) {
                    *gene = Some(free.pop().unwrap_or_else(|| rng.usize(0..space.pool.len())));
                }
                genes.into_iter().flatten().collect()
            })
            .collect();
        Genome { genes }
    }

    /// Keymap of single-phoneme entries. A chord picked by several phonemes
    /// is declared shared.
    pub fn decode(&self, genome: &Genome) -> Keymap {
        let mut keymap = Keymap::new();
        for (space, genes) in self.groups.iter().zip(&genome.genes) {
            let mut seen = HashSet::new();
            for (p, &g) in space.phonemes.iter().zip(genes) {
                let chord = space.pool[g];
                if !seen.insert(chord) {
                    keymap.mark_shared(space.group, chord);
                }
                keymap.insert(space.group, vec![p.clone()], vec![chord]);
            }
        }
        keymap
    }
}
