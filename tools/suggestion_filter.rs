/// Suggestion Filter: filters and budgets grouped suggestions.
///
/// Usage: suggestion_filter --input <suggestions.json> [--schema <schema.yaml>]
///        [--output <recommendations.json>] [--config <curator.ron>] [--clean]
///
/// The input maps each step to candidate suggestions. With `--schema`, the
/// schema's steps count as already used and the output is a full
/// recommendation document; otherwise the filtered groups are written.
/// `--clean` treats the candidates as raw generator output.
use schema_curator::core::cleanup::clean_generated;
use schema_curator::core::pipeline::CuratorEngine;
use schema_curator::schema::document::load_first_schema;
use schema_curator::schema::recommendation::SuggestionGroups;
use std::collections::BTreeSet;
use std::env;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: suggestion_filter --input <suggestions.json> [--schema <schema.yaml>] \
                     [--output <recommendations.json>] [--config <curator.ron>] [--clean]";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut input = None;
    let mut schema_path = None;
    let mut output = None;
    let mut config = None;
    let mut clean = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--input" | "--schema" | "--output" | "--config" if i + 1 >= args.len() => {
                eprintln!("Error: {} needs a value", args[i]);
                process::exit(1);
            }
            "--input" => {
                i += 1;
                input = Some(args[i].clone());
            }
            "--schema" => {
                i += 1;
                schema_path = Some(args[i].clone());
            }
            "--output" => {
                i += 1;
                output = Some(args[i].clone());
            }
            "--config" => {
                i += 1;
                config = Some(args[i].clone());
            }
            "--clean" => clean = true,
            "--help" | "-h" => {
                println!("{}", USAGE);
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let input_path = input.unwrap_or_else(|| {
        eprintln!("Error: --input is required");
        eprintln!("{}", USAGE);
        process::exit(1);
    });

    let mut builder = CuratorEngine::builder();
    if let Some(ref path) = config {
        builder = builder.config_file(path);
    }
    let engine = builder.build().unwrap_or_else(|e| {
        eprintln!("Error building engine: {}", e);
        process::exit(1);
    });

    let text = std::fs::read_to_string(&input_path).unwrap_or_else(|e| {
        eprintln!("Error reading input file '{}': {}", input_path, e);
        process::exit(1);
    });
    let mut suggestions: SuggestionGroups = serde_json::from_str(&text).unwrap_or_else(|e| {
        eprintln!("Error parsing suggestions in '{}': {}", input_path, e);
        process::exit(1);
    });

    if clean {
        suggestions = suggestions
            .into_iter()
            .map(|(step, raw)| (step, raw.iter().map(|r| clean_generated(r)).collect::<Vec<_>>()))
            .collect();
    }

    let before = suggestions.total();
    let json = match schema_path {
        Some(ref path) => {
            let schema = load_first_schema(Path::new(path)).unwrap_or_else(|e| {
                eprintln!("Error reading schema file '{}': {}", path, e);
                process::exit(1);
            });
            let recs = engine.recommend_from_suggestions(&schema, suggestions);
            eprintln!(
                "Kept {} of {} suggestions across {} steps",
                recs.events.total(),
                before,
                recs.events.len()
            );
            serde_json::to_string_pretty(&recs)
        }
        None => {
            let kept = engine.allocate(engine.filter_suggestions(suggestions, &BTreeSet::new()));
            eprintln!(
                "Kept {} of {} suggestions across {} steps",
                kept.total(),
                before,
                kept.len()
            );
            serde_json::to_string_pretty(&kept)
        }
    }
    .unwrap_or_else(|e| {
        eprintln!("Error serializing output: {}", e);
        process::exit(1);
    });

    match output {
        Some(path) => {
            std::fs::write(&path, json).unwrap_or_else(|e| {
                eprintln!("Error writing output file '{}': {}", path, e);
                process::exit(1);
            });
            eprintln!("Output written to '{}'", path);
        }
        None => println!("{}", json),
    }
}
