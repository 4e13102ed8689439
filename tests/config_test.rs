use clap::{CommandFactory, FromArgMatches, Parser};
use std::io::Write;
use stenoforge::config::{parse_f64_list, Config, FitnessWeights, LexiconColumns};
use stenoforge::error::StenoForgeError;
use tempfile::NamedTempFile;

#[derive(Parser, Debug)]
struct TestCli {
    #[command(flatten)]
    weights: FitnessWeights,
}

#[test]
fn test_default_weights_are_valid() {
    let config = Config::default();
    assert!(config.weights.validate().is_ok());
    assert_eq!(config.search.population_size, 48);
    assert_eq!(config.ordering.exact_limit, 16);
}

#[test]
fn test_negative_weight_is_rejected() {
    let weights = FitnessWeights {
        weight_ambiguity: -1.0,
        ..FitnessWeights::default()
    };
    let err = weights.validate().unwrap_err();
    assert!(matches!(err, StenoForgeError::Configuration(_)));
    assert!(err.to_string().contains("weight_ambiguity"));

    let nan = FitnessWeights {
        weight_strain: f64::NAN,
        ..FitnessWeights::default()
    };
    assert!(nan.validate().is_err());
}

#[test]
fn test_weights_file_fills_missing_fields() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"{{ "weight_uncovered": 250.0, "weight_misread": 0.0 }}"#).unwrap();

    let weights = FitnessWeights::load_from_file(file.path()).unwrap();
    assert_eq!(weights.weight_uncovered, 250.0);
    assert_eq!(weights.weight_misread, 0.0);
    assert_eq!(weights.weight_chords, FitnessWeights::default().weight_chords);
}

#[test]
fn test_weights_file_with_negative_value_fails() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"{{ "weight_chords": -2.0 }}"#).unwrap();
    assert!(FitnessWeights::load_from_file(file.path()).is_err());
}

#[test]
fn test_cli_flags_override_file_values() {
    let matches = TestCli::command().get_matches_from(["test", "--weight-strain", "3.5"]);
    let cli = TestCli::from_arg_matches(&matches).unwrap();

    let mut from_file = FitnessWeights {
        weight_strain: 9.0,
        weight_chords: 7.0,
        ..FitnessWeights::default()
    };
    from_file.merge_from_cli(&cli.weights, &matches);

    // Typed flag wins, untouched flags keep the file value.
    assert_eq!(from_file.weight_strain, 3.5);
    assert_eq!(from_file.weight_chords, 7.0);
}

#[test]
fn test_frequency_columns_and_mix() {
    let columns = LexiconColumns {
        frequency_columns: "a, b ,c".to_string(),
        frequency_mix: "1,0.5,2".to_string(),
        ..LexiconColumns::default()
    };
    assert_eq!(columns.get_frequency_columns(), vec!["a", "b", "c"]);
    assert_eq!(columns.get_frequency_mix().unwrap(), vec![1.0, 0.5, 2.0]);
}

#[test]
fn test_parse_f64_list_rejects_garbage() {
    let err = parse_f64_list("1.0,bad", "frequency_mix").unwrap_err();
    assert!(err.to_string().contains("Invalid number"));
}
