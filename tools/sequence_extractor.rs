/// Sequence Extractor: writes the step sequences of a schema as JSON.
///
/// Usage: sequence_extractor --input <schema.yaml> [--output <sequences.json>]
///        [--config <curator.ron>] [--all-starts] [--prompts]
use schema_curator::core::pipeline::CuratorEngine;
use schema_curator::core::sequence::sequence_to_prompt;
use schema_curator::schema::document::load_first_schema;
use std::env;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: sequence_extractor --input <schema.yaml> [--output <sequences.json>] \
                     [--config <curator.ron>] [--all-starts] [--prompts]";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut input = None;
    let mut output = None;
    let mut config = None;
    let mut all_starts = false;
    let mut prompts = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--input" | "--output" | "--config" if i + 1 >= args.len() => {
                eprintln!("Error: {} needs a value", args[i]);
                process::exit(1);
            }
            "--input" => {
                i += 1;
                input = Some(args[i].clone());
            }
            "--output" => {
                i += 1;
                output = Some(args[i].clone());
            }
            "--config" => {
                i += 1;
                config = Some(args[i].clone());
            }
            "--all-starts" => all_starts = true,
            "--prompts" => prompts = true,
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

    let schema = load_first_schema(Path::new(&input_path)).unwrap_or_else(|e| {
        eprintln!("Error reading schema file '{}': {}", input_path, e);
        process::exit(1);
    });

    let mut options = engine.config().sequence_options();
    if all_starts {
        options.starting_steps_only = false;
    }
    let sequences = schema_curator::core::sequence::extract_sequences(&schema, &options);

    eprintln!(
        "Extracted {} sequences from '{}' ({} steps)",
        sequences.sequences.len(),
        schema.id(),
        schema.steps().len()
    );

    if prompts {
        for sequence in &sequences.sequences {
            println!(
                "{}",
                sequence_to_prompt(&sequences.name, &sequences.description, sequence)
            );
        }
    }

    let json = serde_json::to_string_pretty(&sequences).unwrap_or_else(|e| {
        eprintln!("Error serializing sequences: {}", e);
        process::exit(1);
    });

    match output {
        Some(path) => {
            std::fs::write(&path, json).unwrap_or_else(|e| {
                eprintln!("Error writing output file '{}': {}", path, e);
                process::exit(1);
            });
            eprintln!("Sequences written to '{}'", path);
        }
        None => println!("{}", json),
    }
}
