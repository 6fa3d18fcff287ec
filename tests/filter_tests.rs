/// Suggestion filtering integration tests: fixture suggestions through
/// the default policy, the quota allocator and configured engines.

use schema_curator::core::config::CuratorConfig;
use schema_curator::core::filter::{Criteria, FilterPolicy};
use schema_curator::core::pipeline::CuratorEngine;
use schema_curator::core::quota::allocate;
use schema_curator::schema::document::load_first_schema;
use schema_curator::schema::recommendation::SuggestionGroups;
use std::collections::BTreeSet;
use std::path::Path;

fn raw_suggestions() -> SuggestionGroups {
    let text = std::fs::read_to_string("tests/fixtures/raw_suggestions.json").unwrap();
    serde_json::from_str(&text).unwrap()
}

fn existing_steps() -> BTreeSet<String> {
    let schema = load_first_schema(Path::new("tests/fixtures/arson_schema.yaml")).unwrap();
    schema.steps().iter().map(|s| s.id.clone()).collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn fixture_keeps_insertion_order() {
    let raw = raw_suggestions();
    assert_eq!(
        raw.keys().collect::<Vec<_>>(),
        vec!["obtain fuel", "set fire", "prepare device", "flee"]
    );
    assert_eq!(raw.total(), 14);
}

#[test]
fn default_policy_filters_each_group() {
    let kept = FilterPolicy::default().filter_groups(raw_suggestions(), &existing_steps());

    assert_eq!(
        kept.get("obtain fuel"),
        Some(
            &strings(&[
                "drive to the target building",
                "buy a gas can",
                "steal gasoline from a station",
            ])[..]
        )
    );
    assert_eq!(
        kept.get("set fire"),
        Some(&strings(&["flee the scene", "firefighters arrive", "flee the scene quickly"])[..])
    );
    // Already offered under "obtain fuel".
    assert_eq!(kept.get("prepare device"), Some(&strings(&["test the device"])[..]));
    assert_eq!(kept.get("flee"), Some(&strings(&["hide from the police"])[..]));
    assert_eq!(allocate(kept.clone(), 12), kept);
}

#[test]
fn configured_engine_filters_and_budgets() {
    let engine = CuratorEngine::builder()
        .config_file("tests/fixtures/test_config.ron")
        .build()
        .unwrap();
    assert_eq!(engine.config().budget, 3);
    assert_eq!(engine.config().interactive_keep, 5);

    let kept = engine.filter_suggestions(raw_suggestions(), &existing_steps());
    assert_eq!(
        kept.get("set fire"),
        Some(&strings(&["flee the scene", "firefighters arrive"])[..])
    );

    let budgeted = engine.allocate(kept);
    assert_eq!(budgeted.total(), 3);
    assert_eq!(
        budgeted.keys().collect::<Vec<_>>(),
        vec!["obtain fuel", "set fire", "flee"]
    );
    assert_eq!(
        budgeted.get("obtain fuel"),
        Some(&strings(&["drive to the target building"])[..])
    );
}

#[test]
fn filtered_output_is_stable_under_refiltering() {
    let policy = FilterPolicy::default();
    let existing = existing_steps();
    let chain = policy.criteria(&existing);
    for (_, suggestions) in raw_suggestions() {
        let once = chain.apply(suggestions);
        let twice = chain.apply(once.clone());
        assert_eq!(once, twice);
    }
}

#[test]
fn stricter_threshold_drops_near_duplicates() {
    let loose = FilterPolicy::default();
    let strict = FilterPolicy {
        similarity_threshold: 0.75,
        ..FilterPolicy::default()
    };
    let input = strings(&["flee the scene", "flee the scene quickly"]);
    let reference = BTreeSet::new();
    assert_eq!(loose.criteria(&reference).apply(input.clone()).len(), 2);
    assert_eq!(
        strict.criteria(&reference).apply(input),
        strings(&["flee the scene"])
    );
}

#[test]
fn filtered_groups_serialize_in_order() {
    let config = CuratorConfig {
        budget: 4,
        ..CuratorConfig::default()
    };
    let engine = CuratorEngine::builder().with_config(config).build().unwrap();
    let groups = engine.allocate(engine.filter_suggestions(raw_suggestions(), &existing_steps()));
    let json = serde_json::to_string(&groups).unwrap();
    assert!(json.starts_with(r#"{"obtain fuel":"#));
    let back: SuggestionGroups = serde_json::from_str(&json).unwrap();
    assert_eq!(back, groups);
    assert_eq!(groups.total(), 4);
}
