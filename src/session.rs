use crate::ambiguity::MergeAmbiguity;
use crate::biphoneme::BiphonemeTable;
use crate::config::Config;
use crate::error::SfResult;
use crate::keyboard::Keyboard;
use crate::keymap::{generate_base_keymap, Keymap};
use crate::lexicon::Lexicon;
use crate::ordering::{build_orderer, CanonicalOrder};
use crate::optimizer::SearchSpace;
use crate::phonology::LanguageConfig;
use crate::scorer::{Scorer, ScorerBuildParams};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Lexicon, phonology and keyboard loaded once, with the statistics and
/// canonical order derived from them.
pub struct Session {
    pub config: Config,
    pub lexicon: Arc<Lexicon>,
    pub language: LanguageConfig,
    pub keyboard: Keyboard,
    pub table: BiphonemeTable,
    pub ambiguity: MergeAmbiguity,
    pub order: CanonicalOrder,
}

impl Session {
    /// Without a groups file the built-in French inventory is used, and
    /// without a keyboard file the Starboard.
    pub fn load<P: AsRef<Path>>(
        lexicon_path: P,
        groups_path: Option<&str>,
        keyboard_path: Option<&str>,
        config: &Config,
    ) -> SfResult<Self> {
        let policy = config.phonotactics.nucleus_policy;
        let language = match groups_path {
            Some(path) => LanguageConfig::load_from_file(path, policy)?,
            None => LanguageConfig::french(policy),
        };
        let keyboard = match keyboard_path {
            Some(path) => Keyboard::load_from_file(path)?,
            None => Keyboard::starboard(),
        };
        let lexicon = Lexicon::load_from_file(lexicon_path, &config.lexicon)?;
        Self::from_parts(lexicon, language, keyboard, config)
    }

    pub fn from_parts(
        lexicon: Lexicon,
        language: LanguageConfig,
        keyboard: Keyboard,
        config: &Config,
    ) -> SfResult<Self> {
        let table = BiphonemeTable::build(&lexicon, &language)?;
        info!(
            "{} usable records ({:.1}), {} unusable ({:.1})",
            table.usable_records,
            table.usable_frequency,
            table.unusable_records,
            table.unusable_frequency
        );
        let orderer = build_orderer(config.ordering.orderer, config.ordering.exact_limit);
        let order = CanonicalOrder::compute(&table, orderer.as_ref());
        let ambiguity = MergeAmbiguity::build(&lexicon, &language)?;
        Ok(Self {
            config: config.clone(),
            lexicon: Arc::new(lexicon),
            language,
            keyboard,
            table,
            ambiguity,
            order,
        })
    }

    pub fn scorer(&self, debug: bool) -> SfResult<Scorer> {
        ScorerBuildParams::builder()
            .lexicon(self.lexicon.clone())
            .language(self.language.clone())
            .keyboard(self.keyboard.clone())
            .order(Some(self.order.clone()))
            .strain(self.config.strain.clone())
            .debug(debug)
            .build()
            .build_scorer()
    }

    pub fn base_keymap(&self) -> Keymap {
        generate_base_keymap(
            &self.table,
            &self.ambiguity,
            &self.order,
            &self.keyboard,
            &self.config.keymap,
            self.config.strain.same_finger_surcharge,
        )
    }

    pub fn search_space(&self) -> SfResult<SearchSpace> {
        SearchSpace::new(
            &self.table,
            &self.keyboard,
            &self.config.keymap,
            self.config.strain.same_finger_surcharge,
        )
    }
}
