use std::time::Duration;

use mela_core::duration::days;
use mela_markov::{Format, MarkovConfig, MarkovGenerator};

#[test]
fn defaults() {
    let config = MarkovConfig::default();
    assert_eq!(config.max_size, 65535);
    assert_eq!(config.max_age, days(30));
    assert_eq!(MarkovGenerator::new().config(), config);
}

#[test]
fn durations_serialize_as_seconds() {
    let config = MarkovConfig::default()
        .with_max_size(128)
        .with_max_age(Duration::from_secs(90));
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(json, r#"{"max_size":128,"max_age":90}"#);
    let back: MarkovConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}

#[test]
fn missing_fields_fall_back_to_defaults() {
    let config: MarkovConfig = serde_json::from_str(r#"{"max_size":10}"#).unwrap();
    assert_eq!(config.max_size, 10);
    assert_eq!(config.max_age, MarkovConfig::DEFAULT_MAX_AGE);

    let err = serde_json::from_str::<MarkovConfig>(r#"{"max_age":-1}"#);
    assert!(err.is_err());
}

#[test]
fn formats_use_snake_case_names() {
    assert_eq!(serde_json::to_string(&Format::TextPlain).unwrap(), r#""text_plain""#);
    let format: Format = serde_json::from_str(r#""binary""#).unwrap();
    assert_eq!(format, Format::Binary);
    assert_eq!(Format::Dot.to_string(), "dot");
}

#[test]
fn stats_serialize_for_reporting() {
    let generator = MarkovGenerator::new();
    generator.add_text("hello world");
    let json = serde_json::to_value(generator.stats()).unwrap();
    assert_eq!(json["transitions"], 2);
    assert_eq!(json["most_common_word"], "hello");
}
