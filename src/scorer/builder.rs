use crate::biphoneme::{split_record, BiphonemeTable};
use crate::config::{OrderingParams, StrainParams};
use crate::error::SfResult;
use crate::keyboard::Keyboard;
use crate::lexicon::Lexicon;
use crate::ordering::{build_orderer, CanonicalOrder};
use crate::phonology::{LanguageConfig, PositionGroup, SyllableRuns};
use crate::scorer::{PreparedWord, Scorer};
use std::sync::Arc;
use tracing::debug;
use typed_builder::TypedBuilder;

#[derive(TypedBuilder)]
pub struct ScorerBuildParams {
    pub lexicon: Arc<Lexicon>,
    pub language: LanguageConfig,
    pub keyboard: Keyboard,
    /// Computed from the lexicon when absent.
    #[builder(default)]
    pub order: Option<CanonicalOrder>,
    #[builder(default)]
    pub ordering: OrderingParams,
    #[builder(default)]
    pub strain: StrainParams,
    #[builder(default = false)]
    pub debug: bool,
}

impl ScorerBuildParams {
    pub fn build_scorer(self) -> SfResult<Scorer> {
        let lexicon = self.lexicon;
        let language = self.language;
        let debug = self.debug;

        let order = match self.order {
            Some(order) => order,
            None => {
                let table = BiphonemeTable::build(&lexicon, &language)?;
                let orderer = build_orderer(self.ordering.orderer, self.ordering.exact_limit);
                CanonicalOrder::compute(&table, orderer.as_ref())
            }
        };

        let mut words = Vec::with_capacity(lexicon.len());
        let mut unusable_words = 0;
        let mut unusable_mass = 0.0;
        let mut group_mass = [0.0; 3];

        for record in lexicon.iter() {
            let frequency = lexicon.frequency(record);
            let Some(syllables) = split_record(&record.syllables, &language)? else {
                unusable_words += 1;
                unusable_mass += frequency;
                continue;
            };

            for runs in &syllables {
                for (group, run) in runs.runs() {
                    group_mass[group.index()] += run.len() as f64 * frequency;
                }
            }
            let (in_order_pairs, out_of_order_pairs) = count_order_pairs(&order, &syllables);

            words.push(PreparedWord {
                ortho: record.ortho.clone(),
                lemma: record.lemma.clone(),
                pronunciation: record.pronunciation(),
                syllable_names: record.syllable_names(),
                spellings: record.syllable_spellings().map(<[String]>::to_vec),
                frequency,
                syllables,
                in_order_pairs,
                out_of_order_pairs,
            });
        }

        let required_groups: Vec<PositionGroup> = PositionGroup::ALL
            .into_iter()
            .filter(|g| group_mass[g.index()] > 0.0)
            .collect();

        if debug {
            debug!(
                "Prepared {} words ({} unusable, mass {:.1})",
                words.len(),
                unusable_words,
                unusable_mass
            );
            debug!("Required groups: {:?}", required_groups);
        }

        Ok(Scorer {
            keyboard: self.keyboard,
            language,
            order,
            strain: self.strain,
            words,
            required_groups,
            unusable_words,
            unusable_mass,
            debug,
        })
    }
}

/// Adjacent pairs inside each group run, split by whether they follow the
/// canonical order. Pairs involving unranked phonemes or repeats are skipped.
pub(crate) fn count_order_pairs(order: &CanonicalOrder, syllables: &[SyllableRuns]) -> (u32, u32) {
    let mut in_order = 0;
    let mut out_of_order = 0;
    for runs in syllables {
        for (group, run) in runs.runs() {
            for pair in run.windows(2) {
                if pair[0] == pair[1] {
                    continue;
                }
                let ranks = (order.rank(group, &pair[0]), order.rank(group, &pair[1]));
                if let (Some(a), Some(b)) = ranks {
                    if a < b {
                        in_order += 1;
                    } else {
                        out_of_order += 1;
                    }
                }
            }
        }
    }
    (in_order, out_of_order)
}
