pub mod ambiguity;
pub mod biphoneme;
pub mod config;
pub mod error;
pub mod fitness;
pub mod keyboard;
pub mod keymap;
pub mod lexicon;
pub mod optimizer;
pub mod ordering;
pub mod phonology;
pub mod scorer;
pub mod session;
pub mod theory;
