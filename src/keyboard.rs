use crate::error::{SfResult, StenoForgeError};
use crate::phonology::PositionGroup;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use tracing::info;

pub const MAX_KEYS: usize = 64;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Finger {
    LeftPinky,
    LeftRing,
    LeftMiddle,
    LeftIndex,
    LeftThumb,
    RightThumb,
    RightIndex,
    RightMiddle,
    RightRing,
    RightPinky,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Hand {
    Left,
    Right,
}

impl Finger {
    pub const COUNT: usize = 10;

    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn hand(self) -> Hand {
        if self.index() < 5 {
            Hand::Left
        } else {
            Hand::Right
        }
    }
}

/// Set of simultaneously pressed keys, one bit per key index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Chord(pub u64);

impl Chord {
    pub const EMPTY: Chord = Chord(0);

    pub fn from_keys(keys: &[usize]) -> Self {
        Chord(keys.iter().fold(0u64, |acc, &k| acc | (1u64 << k)))
    }

    #[inline(always)]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline(always)]
    pub fn contains(self, key: usize) -> bool {
        self.0 & (1u64 << key) != 0
    }

    #[inline(always)]
    pub fn intersects(self, other: Chord) -> bool {
        self.0 & other.0 != 0
    }

    #[inline(always)]
    pub fn union(self, other: Chord) -> Chord {
        Chord(self.0 | other.0)
    }

    pub fn keys(self) -> impl Iterator<Item = usize> {
        let mut rest = self.0;
        std::iter::from_fn(move || {
            if rest == 0 {
                None
            } else {
                let k = rest.trailing_zeros() as usize;
                rest &= rest - 1;
                Some(k)
            }
        })
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keys().map(|k| k.to_string()).join("+"))
    }
}

fn default_strain() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Key {
    pub id: String,
    pub finger: Finger,
    #[serde(default = "default_strain")]
    pub strain: f64,
    /// Position groups this key may encode.
    #[serde(default)]
    pub zones: Vec<PositionGroup>,
    /// Reserved keys never carry phonemes.
    #[serde(default)]
    pub reserved: bool,
}

/// A multi-key press by one finger and its strain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerCombo {
    pub keys: Vec<String>,
    pub strain: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct KeyboardFile {
    name: String,
    keys: Vec<Key>,
    #[serde(default)]
    combos: Vec<FingerCombo>,
}

#[derive(Debug, Clone)]
pub struct Keyboard {
    pub name: String,
    pub keys: Vec<Key>,
    index: HashMap<String, usize>,
    combos: HashMap<Chord, f64>,
    /// Fingers whose multi-key presses are restricted to `combos`.
    restricted: [bool; Finger::COUNT],
}

impl Keyboard {
    pub fn new(name: &str, keys: Vec<Key>, combos: Vec<FingerCombo>) -> SfResult<Self> {
        if keys.len() > MAX_KEYS {
            return Err(StenoForgeError::Configuration(format!(
                "Keyboard '{}' has {} keys; at most {} are supported",
                name,
                keys.len(),
                MAX_KEYS
            )));
        }
        let mut index = HashMap::new();
        for (i, k) in keys.iter().enumerate() {
            if !k.strain.is_finite() || k.strain < 0.0 {
                return Err(StenoForgeError::Configuration(format!(
                    "Key '{}' has invalid strain {}",
                    k.id, k.strain
                )));
            }
            if index.insert(k.id.clone(), i).is_some() {
                return Err(StenoForgeError::Configuration(format!(
                    "Duplicate key id '{}'",
                    k.id
                )));
            }
        }

        let mut kb = Self {
            name: name.to_string(),
            keys,
            index,
            combos: HashMap::new(),
            restricted: [false; Finger::COUNT],
        };

        for combo in combos {
            let chord = kb.chord_from_ids(&combo.keys)?;
            let fingers: Vec<Finger> = chord.keys().map(|k| kb.keys[k].finger).unique().collect();
            if fingers.len() != 1 || chord.len() < 2 {
                return Err(StenoForgeError::Configuration(format!(
                    "Combo {:?} must cover several keys of a single finger",
                    combo.keys
                )));
            }
            kb.restricted[fingers[0].index()] = true;
            kb.combos.insert(chord, combo.strain);
        }
        Ok(kb)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> SfResult<Self> {
        let path = path.as_ref();
        info!("Loading keyboard from {}", path.display());
        let content = fs::read_to_string(path)?;
        let file: KeyboardFile = serde_json::from_str(&content)?;
        Self::new(&file.name, file.keys, file.combos)
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn key_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn chord_from_ids<S: AsRef<str>>(&self, ids: &[S]) -> SfResult<Chord> {
        let mut chord = Chord::EMPTY;
        for id in ids {
            let id = id.as_ref();
            let k = self.key_index(id).ok_or_else(|| {
                StenoForgeError::Validation(format!(
                    "Unknown key '{}' on keyboard '{}'",
                    id, self.name
                ))
            })?;
            chord = chord.union(Chord::from_keys(&[k]));
        }
        Ok(chord)
    }

    pub fn chord_ids(&self, chord: Chord) -> Vec<String> {
        chord
            .keys()
            .filter_map(|k| self.keys.get(k))
            .map(|k| k.id.clone())
            .collect()
    }

    /// `a+b+c` label built from key ids.
    pub fn chord_label(&self, chord: Chord) -> String {
        self.chord_ids(chord).join("+")
    }

    /// Number of keys each finger holds in `chord`.
    pub fn finger_presses(&self, chord: Chord) -> [u32; Finger::COUNT] {
        let mut out = [0; Finger::COUNT];
        for k in chord.keys() {
            if let Some(key) = self.keys.get(k) {
                out[key.finger.index()] += 1;
            }
        }
        out
    }

    fn finger_mask(&self, chord: Chord, finger: Finger) -> Chord {
        Chord(
            chord
                .keys()
                .filter(|&k| self.keys.get(k).is_some_and(|key| key.finger == finger))
                .fold(0u64, |acc, k| acc | (1u64 << k)),
        )
    }

    /// A chord is playable unless some finger must hold an unlisted key set.
    pub fn is_feasible(&self, chord: Chord) -> bool {
        let presses = self.finger_presses(chord);
        Finger::iter().all(|f| {
            presses[f.index()] < 2
                || !self.restricted[f.index()]
                || self.combos.contains_key(&self.finger_mask(chord, f))
        })
    }

    /// Physical cost of a chord: per finger, the combo strain when listed,
    /// otherwise key strains plus `surcharge` per extra key.
    pub fn chord_strain(&self, chord: Chord, surcharge: f64) -> f64 {
        let presses = self.finger_presses(chord);
        let mut total = 0.0;
        for f in Finger::iter() {
            let n = presses[f.index()];
            if n == 0 {
                continue;
            }
            let mask = self.finger_mask(chord, f);
            if let Some(&s) = self.combos.get(&mask) {
                total += s;
            } else {
                let base: f64 = mask.keys().map(|k| self.keys[k].strain).sum();
                total += base + surcharge * (n - 1) as f64;
            }
        }
        total
    }

    /// Non-reserved keys allowed to encode `group`.
    pub fn zone_keys(&self, group: PositionGroup) -> Vec<usize> {
        self.keys
            .iter()
            .enumerate()
            .filter(|(_, k)| !k.reserved && k.zones.contains(&group))
            .map(|(i, _)| i)
            .collect()
    }

    /// Every feasible chord of 1..=`max_keys` zone keys, easiest first.
    pub fn chord_pool(&self, group: PositionGroup, max_keys: usize, surcharge: f64) -> Vec<Chord> {
        let zone = self.zone_keys(group);
        let mut pool: Vec<(f64, Chord)> = (1..=max_keys.min(zone.len()))
            .flat_map(|size| zone.iter().copied().combinations(size))
            .map(|keys| Chord::from_keys(&keys))
            .filter(|&c| self.is_feasible(c))
            .map(|c| (self.chord_strain(c, surcharge), c))
            .collect();
        pool.sort_by(|a, b| {
            a.1.len()
                .cmp(&b.1.len())
                .then_with(|| a.0.total_cmp(&b.0))
                .then_with(|| a.1.cmp(&b.1))
        });
        pool.into_iter().map(|(_, c)| c).collect()
    }

    pub fn to_json(&self) -> SfResult<String> {
        let mut combos: Vec<FingerCombo> = self
            .combos
            .iter()
            .map(|(c, &strain)| FingerCombo {
                keys: self.chord_ids(*c),
                strain,
            })
            .collect();
        combos.sort_by(|a, b| a.keys.cmp(&b.keys));
        let file = KeyboardFile {
            name: self.name.clone(),
            keys: self.keys.clone(),
            combos,
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// The 26-key Starboard: left hand for onsets, thumbs for nuclei,
    /// right hand for codas.
    ///
    /// ```text
    /// |  0 |  2 |  4 |  6 |  8 |    |       |    | 16 | 18 | 20 | 22 | 24 |
    /// |------------------------- 10 -       | 15 |----|----|----|----|----|
    /// |  1 |  3 |  5 |  7 |  9 |    |       |    | 17 | 19 | 21 | 23 | 25 |
    ///                        | 11 | 12 | | 13 | 14 |
    /// ```
    pub fn starboard() -> Self {
        use Finger::*;
        use PositionGroup::*;

        let layout: [(Finger, f64); 26] = [
            (LeftPinky, 1.5),
            (LeftPinky, 1.5),
            (LeftPinky, 1.25),
            (LeftPinky, 1.25),
            (LeftRing, 1.25),
            (LeftRing, 1.25),
            (LeftMiddle, 1.25),
            (LeftMiddle, 1.25),
            (LeftIndex, 1.0),
            (LeftIndex, 1.0),
            (LeftIndex, 1.25),
            (LeftThumb, 1.0),
            (LeftThumb, 1.0),
            (RightThumb, 1.0),
            (RightThumb, 1.0),
            (RightIndex, 1.25),
            (RightIndex, 1.0),
            (RightIndex, 1.0),
            (RightMiddle, 1.25),
            (RightMiddle, 1.25),
            (RightRing, 1.25),
            (RightRing, 1.25),
            (RightPinky, 1.25),
            (RightPinky, 1.25),
            (RightPinky, 1.5),
            (RightPinky, 1.5),
        ];
        let keys = layout
            .iter()
            .enumerate()
            .map(|(i, &(finger, strain))| Key {
                id: i.to_string(),
                finger,
                strain,
                zones: match i {
                    0..=10 => vec![Onset],
                    11..=14 => vec![Nucleus],
                    _ => vec![Coda],
                },
                reserved: matches!(i, 0 | 1 | 10 | 15),
            })
            .collect();

        let combo = |keys: &[usize], strain: f64| FingerCombo {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            strain,
        };
        let combos = vec![
            combo(&[0, 1], 2.0),
            combo(&[2, 3], 1.75),
            combo(&[0, 2], 2.75),
            combo(&[1, 3], 2.5),
            combo(&[4, 5], 1.75),
            combo(&[6, 7], 1.75),
            combo(&[8, 9], 1.5),
            combo(&[8, 10], 1.75),
            combo(&[9, 10], 1.75),
            combo(&[8, 9, 10], 2.0),
            combo(&[11, 12], 1.5),
            combo(&[13, 14], 1.5),
            combo(&[16, 17], 1.5),
            combo(&[15, 16], 1.75),
            combo(&[15, 17], 1.75),
            combo(&[15, 16, 17], 2.0),
            combo(&[18, 19], 1.75),
            combo(&[20, 21], 1.75),
            combo(&[22, 23], 1.75),
            combo(&[24, 25], 2.0),
            combo(&[22, 24], 2.75),
            combo(&[23, 25], 2.5),
        ];

        Self::new("starboard", keys, combos)
            .unwrap_or_else(|e| unreachable!("built-in starboard is valid: {}", e))
    }
}
