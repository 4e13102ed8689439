use crate::ambiguity::MergeAmbiguity;
use crate::biphoneme::BiphonemeTable;
use crate::config::KeymapParams;
use crate::error::{SfResult, StenoForgeError};
use crate::keyboard::{Chord, Keyboard};
use crate::ordering::CanonicalOrder;
use crate::phonology::{Phoneme, PositionGroup};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Phoneme (or short phoneme combination) of one group.
pub type KeymapEntry = (PositionGroup, Vec<Phoneme>);

/// Phoneme to chord assignment. The first chord of an entry is its primary
/// representation; any further chords are alternatives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Keymap {
    entries: BTreeMap<KeymapEntry, Vec<Chord>>,
    shared: BTreeSet<(PositionGroup, Chord)>,
}

/// Two or more entries of a group using the same chord.
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    pub group: PositionGroup,
    pub chord: Chord,
    pub phonemes: Vec<Vec<Phoneme>>,
}

/// One piece of a segmented group run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: usize,
    pub len: usize,
    pub chord: Chord,
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryFile {
    group: PositionGroup,
    phonemes: Vec<Phoneme>,
    chords: Vec<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SharedFile {
    group: PositionGroup,
    keys: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct KeymapFile {
    entries: Vec<EntryFile>,
    #[serde(default)]
    shared: Vec<SharedFile>,
}

impl Keymap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, group: PositionGroup, phonemes: Vec<Phoneme>, chords: Vec<Chord>) {
        self.entries.insert((group, phonemes), chords);
    }

    /// Appends an alternative chord to an entry, creating it if needed.
    pub fn push_chord(&mut self, group: PositionGroup, phonemes: Vec<Phoneme>, chord: Chord) {
        self.entries.entry((group, phonemes)).or_default().push(chord);
    }

    /// Declares `chord` an intentional overlap inside `group`.
    pub fn mark_shared(&mut self, group: PositionGroup, chord: Chord) {
        self.shared.insert((group, chord));
    }

    pub fn is_shared(&self, group: PositionGroup, chord: Chord) -> bool {
        self.shared.contains(&(group, chord))
    }

    pub fn entries(&self) -> impl Iterator<Item = (&KeymapEntry, &[Chord])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn chords(&self, group: PositionGroup, phonemes: &[Phoneme]) -> &[Chord] {
        self.entries
            .get(&(group, phonemes.to_vec()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn primary(&self, group: PositionGroup, phonemes: &[Phoneme]) -> Option<Chord> {
        self.chords(group, phonemes).first().copied()
    }

    pub fn covers_group(&self, group: PositionGroup) -> bool {
        self.entries
            .iter()
            .any(|((g, _), chords)| *g == group && !chords.is_empty())
    }

    /// Longest phoneme combination mapped in `group`.
    pub fn max_combo_len(&self, group: PositionGroup) -> usize {
        self.entries
            .keys()
            .filter(|(g, _)| *g == group)
            .map(|(_, p)| p.len())
            .max()
            .unwrap_or(0)
    }

    /// Entries carrying more than one chord.
    pub fn multi_representation_count(&self) -> usize {
        self.entries.values().filter(|c| c.len() > 1).count()
    }

    /// Every chord reused by several entries of a group without a shared mark.
    pub fn collisions(&self) -> Vec<Collision> {
        let mut users: BTreeMap<(PositionGroup, Chord), Vec<Vec<Phoneme>>> = BTreeMap::new();
        for ((group, phonemes), chords) in &self.entries {
            let distinct: BTreeSet<Chord> = chords.iter().copied().collect();
            for chord in distinct {
                users
                    .entry((*group, chord))
                    .or_default()
                    .push(phonemes.clone());
            }
        }
        users
            .into_iter()
            .filter(|(key, list)| list.len() > 1 && !self.shared.contains(key))
            .map(|((group, chord), phonemes)| Collision {
                group,
                chord,
                phonemes,
            })
            .collect()
    }

    pub fn validate(&self) -> SfResult<()> {
        for ((group, phonemes), chords) in &self.entries {
            if phonemes.is_empty() {
                return Err(StenoForgeError::Validation(format!(
                    "Empty phoneme entry in the {} group",
                    group
                )));
            }
            if chords.is_empty() || chords.iter().any(|c| c.is_empty()) {
                return Err(StenoForgeError::Validation(format!(
                    "{} '{}' has an empty chord",
                    group,
                    phonemes.concat()
                )));
            }
        }
        if let Some(c) = self.collisions().first() {
            let names: Vec<String> = c.phonemes.iter().map(|p| p.concat()).collect();
            return Err(StenoForgeError::Validation(format!(
                "{} chord {} is used by {} without a shared declaration",
                c.group,
                c.chord,
                names.join(", ")
            )));
        }
        Ok(())
    }

    /// Cuts a group run into mapped pieces, fewest pieces first and longer
    /// leading pieces on ties. `None` when some phoneme cannot be reached.
    pub fn segment(&self, group: PositionGroup, run: &[Phoneme]) -> Option<Vec<Segment>> {
        let n = run.len();
        let max_len = self.max_combo_len(group).min(n);
        // best[i] = (pieces needed for run[i..], first piece length)
        let mut best: Vec<Option<(usize, usize)>> = vec![None; n + 1];
        best[n] = Some((0, 0));
        for i in (0..n).rev() {
            for len in (1..=max_len.min(n - i)).rev() {
                if self.primary(group, &run[i..i + len]).is_none() {
                    continue;
                }
                if let Some((rest, _)) = best[i + len] {
                    if best[i].map_or(true, |(cur, _)| rest + 1 < cur) {
                        best[i] = Some((rest + 1, len));
                    }
                }
            }
        }

        let mut out = Vec::new();
        let mut i = 0;
        while i < n {
            let (_, len) = best[i]?;
            let chord = self.primary(group, &run[i..i + len])?;
            out.push(Segment {
                start: i,
                len,
                chord,
            });
            i += len;
        }
        Some(out)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P, keyboard: &Keyboard) -> SfResult<Self> {
        let path = path.as_ref();
        info!("Loading keymap from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_json(&content, keyboard)
    }

    pub fn from_json(content: &str, keyboard: &Keyboard) -> SfResult<Self> {
        let file: KeymapFile = serde_json::from_str(content)?;
        let mut keymap = Keymap::new();
        for entry in file.entries {
            let chords = entry
                .chords
                .iter()
                .map(|ids| keyboard.chord_from_ids(ids))
                .collect::<SfResult<Vec<_>>>()?;
            for chord in &chords {
                if let Some(k) = chord.keys().find(|&k| keyboard.keys[k].reserved) {
                    return Err(StenoForgeError::Validation(format!(
                        "'{}' uses reserved key '{}'",
                        entry.phonemes.concat(),
                        keyboard.keys[k].id
                    )));
                }
                if chord.keys().any(|k| !keyboard.keys[k].zones.contains(&entry.group)) {
                    warn!(
                        "{} '{}' uses keys outside its zone",
                        entry.group,
                        entry.phonemes.concat()
                    );
                }
            }
            keymap.insert(entry.group, entry.phonemes, chords);
        }
        for shared in file.shared {
            let chord = keyboard.chord_from_ids(&shared.keys)?;
            keymap.mark_shared(shared.group, chord);
        }
        keymap.validate()?;
        debug!("Keymap holds {} entries", keymap.len());
        Ok(keymap)
    }

    pub fn to_json(&self, keyboard: &Keyboard) -> SfResult<String> {
        let file = KeymapFile {
            entries: self
                .entries
                .iter()
                .map(|((group, phonemes), chords)| EntryFile {
                    group: *group,
                    phonemes: phonemes.clone(),
                    chords: chords.iter().map(|c| keyboard.chord_ids(*c)).collect(),
                })
                .collect(),
            shared: self
                .shared
                .iter()
                .map(|(group, chord)| SharedFile {
                    group: *group,
                    keys: keyboard.chord_ids(*chord),
                })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P, keyboard: &Keyboard) -> SfResult<()> {
        fs::write(path, self.to_json(keyboard)?)?;
        Ok(())
    }
}

/// Greedy starting keymap.
///
/// Per group, the most frequent phonemes take the zone's single keys in
/// canonical order so that key order follows phoneme order. The rest take
/// multi-key chords while no key is reused more than
/// `max_key_overuse + 2 * (size - 2)` times. Phonemes still left over share the
/// chord of the assigned phoneme whose merge loses the least word mass to
/// homophony, the rarer host winning ties.
pub fn generate_base_keymap(
    table: &BiphonemeTable,
    ambiguity: &MergeAmbiguity,
    order: &CanonicalOrder,
    keyboard: &Keyboard,
    params: &KeymapParams,
    surcharge: f64,
) -> Keymap {
    let mut keymap = Keymap::new();

    for group in PositionGroup::ALL {
        let stats = table.group(group);
        let mut by_freq: Vec<&Phoneme> = stats
            .alphabet
            .iter()
            .filter(|p| stats.single(p) > 0.0)
            .collect();
        by_freq.sort_by(|a, b| stats.single(b).total_cmp(&stats.single(a)).then_with(|| a.cmp(b)));

        let mut walk: Vec<&Phoneme> = order
            .result(group)
            .permutation
            .iter()
            .filter(|p| by_freq.contains(p))
            .collect();
        for p in &by_freq {
            if !walk.contains(p) {
                walk.push(*p);
            }
        }

        let mut singles: Vec<Chord> = keyboard
            .zone_keys(group)
            .into_iter()
            .map(|k| Chord::from_keys(&[k]))
            .collect();
        let top: Vec<&Phoneme> = by_freq.iter().take(singles.len()).copied().collect();
        singles.reverse();
        for p in walk.iter().filter(|p| top.contains(*p)) {
            if let Some(chord) = singles.pop() {
                keymap.insert(group, vec![(*p).clone()], vec![chord]);
            }
        }

        let mut multi: Vec<Chord> = keyboard
            .chord_pool(group, params.max_chord_keys, surcharge)
            .into_iter()
            .filter(|c| c.len() >= 2)
            .collect();
        multi.reverse();
        let mut overuse: HashMap<usize, usize> = HashMap::new();
        let mut unassigned = Vec::new();
        for p in walk.iter().filter(|p| !top.contains(*p)) {
            let mut assigned = false;
            while let Some(&chord) = multi.last() {
                let max_use = chord
                    .keys()
                    .map(|k| overuse.get(&k).copied().unwrap_or(0))
                    .max()
                    .unwrap_or(0);
                multi.pop();
                if max_use >= params.max_key_overuse + 2 * (chord.len() - 2) {
                    continue;
                }
                for k in chord.keys() {
                    *overuse.entry(k).or_insert(0) += 1;
                }
                keymap.insert(group, vec![(*p).clone()], vec![chord]);
                assigned = true;
                break;
            }
            if !assigned {
                unassigned.push((*p).clone());
            }
        }

        if !unassigned.is_empty() {
            warn!(
                "{} phonemes without a free chord in {}: {}",
                unassigned.len(),
                group,
                unassigned.concat()
            );
        }
        for p in unassigned {
            let host = keymap
                .entries
                .iter()
                .filter(|((g, ph), chords)| {
                    *g == group
                        && ph.len() == 1
                        && chords
                            .first()
                            .is_some_and(|c| !keymap.is_shared(group, *c))
                })
                .map(|((_, ph), chords)| {
                    let q = &ph[0];
                    let conflict = ambiguity.conflict(group, &p, q);
                    (conflict, stats.single(q), q.clone(), chords[0])
                })
                .min_by(|a, b| {
                    a.0.total_cmp(&b.0)
                        .then_with(|| a.1.total_cmp(&b.1))
                        .then_with(|| a.2.cmp(&b.2))
                });
            if let Some((_, _, q, chord)) = host {
                debug!("{} '{}' shares the chord of '{}'", group, p, q);
                keymap.insert(group, vec![p], vec![chord]);
                keymap.mark_shared(group, chord);
            }
        }
    }

    info!("Base keymap: {} entries", keymap.len());
    keymap
}
