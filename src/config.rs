use crate::error::{SfResult, StenoForgeError};
use crate::ordering::OrdererKind;
use crate::phonology::NucleusPolicy;
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    #[command(flatten)]
    pub search: SearchParams,
    #[command(flatten)]
    pub weights: FitnessWeights,
    #[command(flatten)]
    pub strain: StrainParams,
    #[command(flatten)]
    pub phonotactics: PhonotacticParams,
    #[command(flatten)]
    pub lexicon: LexiconColumns,
    #[command(flatten)]
    pub ordering: OrderingParams,
    #[command(flatten)]
    pub keymap: KeymapParams,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    #[arg(long, default_value_t = 48)]
    pub population_size: usize,
    #[arg(long, default_value_t = 400)]
    pub generations: usize,
    #[arg(long, default_value_t = 60)]
    pub search_patience: usize,
    #[arg(long, default_value_t = 1e-4)]
    pub search_patience_threshold: f64,
    #[arg(long, default_value_t = 3)]
    pub tournament_size: usize,
    #[arg(long, default_value_t = 2)]
    pub elitism: usize,
    #[arg(long, default_value_t = 0.8)]
    pub crossover_rate: f64,
    #[arg(long, default_value_t = 0.2)]
    pub mutation_rate: f64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            population_size: 48,
            generations: 400,
            search_patience: 60,
            search_patience_threshold: 1e-4,
            tournament_size: 3,
            elitism: 2,
            crossover_rate: 0.8,
            mutation_rate: 0.2,
        }
    }
}

/// Coefficients of the scalar fitness. Lower fitness is better.
///
/// ```text
/// fitness = keystrokes     * avg_keystrokes
///         + chords         * avg_chords
///         + strain         * avg_strain
///         + peak_finger    * peak_finger_share
///         + uncovered      * uncovered_ratio
///         + multi_rep      * multi_representation_count
///         + variation      * variation_count
///         + exception      * exception_count
///         + disorder       * out_of_order_ratio
///         + misread        * misread_ratio
///         + ambiguity      * ambiguity_ratio
/// ```
#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessWeights {
    #[arg(long, default_value_t = 1.0)]
    pub weight_keystrokes: f64,
    #[arg(long, default_value_t = 2.0)]
    pub weight_chords: f64,
    #[arg(long, default_value_t = 1.0)]
    pub weight_strain: f64,
    #[arg(long, default_value_t = 5.0)]
    pub weight_peak_finger: f64,
    #[arg(long, default_value_t = 100.0)]
    pub weight_uncovered: f64,
    #[arg(long, default_value_t = 0.5)]
    pub weight_multi_rep: f64,
    #[arg(long, default_value_t = 0.01)]
    pub weight_variation: f64,
    #[arg(long, default_value_t = 0.05)]
    pub weight_exception: f64,
    #[arg(long, default_value_t = 1.0)]
    pub weight_disorder: f64,
    #[arg(long, default_value_t = 10.0)]
    pub weight_misread: f64,
    #[arg(long, default_value_t = 20.0)]
    pub weight_ambiguity: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            weight_keystrokes: 1.0,
            weight_chords: 2.0,
            weight_strain: 1.0,
            weight_peak_finger: 5.0,
            weight_uncovered: 100.0,
            weight_multi_rep: 0.5,
            weight_variation: 0.01,
            weight_exception: 0.05,
            weight_disorder: 1.0,
            weight_misread: 10.0,
            weight_ambiguity: 20.0,
        }
    }
}

impl FitnessWeights {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> SfResult<Self> {
        let content = fs::read_to_string(path)?;
        let weights: Self = serde_json::from_str(&content)?;
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> SfResult<()> {
        let all = [
            ("weight_keystrokes", self.weight_keystrokes),
            ("weight_chords", self.weight_chords),
            ("weight_strain", self.weight_strain),
            ("weight_peak_finger", self.weight_peak_finger),
            ("weight_uncovered", self.weight_uncovered),
            ("weight_multi_rep", self.weight_multi_rep),
            ("weight_variation", self.weight_variation),
            ("weight_exception", self.weight_exception),
            ("weight_disorder", self.weight_disorder),
            ("weight_misread", self.weight_misread),
            ("weight_ambiguity", self.weight_ambiguity),
        ];
        for (name, value) in all {
            if !value.is_finite() || value < 0.0 {
                return Err(StenoForgeError::Configuration(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Applies only the flags the user actually typed on top of `self`.
    pub fn merge_from_cli(&mut self, cli_weights: &FitnessWeights, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($field:ident, $arg_name:expr) => {
                if matches.value_source($arg_name) == Some(ValueSource::CommandLine) {
                    self.$field = cli_weights.$field;
                }
            };
        }

        update_if_present!(weight_keystrokes, "weight_keystrokes");
        update_if_present!(weight_chords, "weight_chords");
        update_if_present!(weight_strain, "weight_strain");
        update_if_present!(weight_peak_finger, "weight_peak_finger");
        update_if_present!(weight_uncovered, "weight_uncovered");
        update_if_present!(weight_multi_rep, "weight_multi_rep");
        update_if_present!(weight_variation, "weight_variation");
        update_if_present!(weight_exception, "weight_exception");
        update_if_present!(weight_disorder, "weight_disorder");
        update_if_present!(weight_misread, "weight_misread");
        update_if_present!(weight_ambiguity, "weight_ambiguity");
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrainParams {
    /// Extra strain for every additional key a single finger holds in one chord.
    #[arg(long, default_value_t = 0.5)]
    pub same_finger_surcharge: f64,
}

impl Default for StrainParams {
    fn default() -> Self {
        Self {
            same_finger_surcharge: 0.5,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PhonotacticParams {
    #[arg(long, value_enum, default_value_t = NucleusPolicy::Reject)]
    pub nucleus_policy: NucleusPolicy,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconColumns {
    #[arg(long, default_value = "ortho")]
    pub col_ortho: String,
    #[arg(long, default_value = "syll_cv")]
    pub col_syllables: String,
    #[arg(long, default_value = "orthosyll_cv")]
    pub col_graphemes: String,
    #[arg(long, default_value = "lemme")]
    pub col_lemma: String,
    #[arg(long, default_value = "freqfilms2,freqlivres")]
    pub frequency_columns: String,
    #[arg(long, default_value = "1.0,1.0")]
    pub frequency_mix: String,
}

impl Default for LexiconColumns {
    fn default() -> Self {
        Self {
            col_ortho: "ortho".to_string(),
            col_syllables: "syll_cv".to_string(),
            col_graphemes: "orthosyll_cv".to_string(),
            col_lemma: "lemme".to_string(),
            frequency_columns: "freqfilms2,freqlivres".to_string(),
            frequency_mix: "1.0,1.0".to_string(),
        }
    }
}

impl LexiconColumns {
    pub fn get_frequency_columns(&self) -> Vec<String> {
        self.frequency_columns
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Mix weights, one per frequency column.
    pub fn get_frequency_mix(&self) -> SfResult<Vec<f64>> {
        let columns = self.get_frequency_columns();
        let mix = parse_f64_list(&self.frequency_mix, "frequency_mix")?;
        if mix.len() != columns.len() {
            return Err(StenoForgeError::Configuration(format!(
                "--frequency-mix has {} values for {} frequency columns",
                mix.len(),
                columns.len()
            )));
        }
        Ok(mix)
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingParams {
    #[arg(long, value_enum, default_value_t = OrdererKind::Auto)]
    pub orderer: OrdererKind,
    /// Largest alphabet solved exactly by the subset DP.
    #[arg(long, default_value_t = 16)]
    pub exact_limit: usize,
}

impl Default for OrderingParams {
    fn default() -> Self {
        Self {
            orderer: OrdererKind::Auto,
            exact_limit: 16,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeymapParams {
    /// Largest chord (in keys) used for a single phoneme.
    #[arg(long, default_value_t = 3)]
    pub max_chord_keys: usize,
    /// How many multi-key chords may reuse the same key.
    #[arg(long, default_value_t = 2)]
    pub max_key_overuse: usize,
}

impl Default for KeymapParams {
    fn default() -> Self {
        Self {
            max_chord_keys: 3,
            max_key_overuse: 2,
        }
    }
}

pub fn parse_f64_list(s: &str, name: &str) -> SfResult<Vec<f64>> {
    s.split(',')
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| {
            p.parse::<f64>().map_err(|_| {
                StenoForgeError::Configuration(format!("Invalid number '{}' in --{}", p, name))
            })
        })
        .collect()
}
