/// Schema Linter: validates curated schema files.
///
/// Usage: schema_linter <schema.yaml|schema_dir>

use schema_curator::core::validate::validate;
use schema_curator::schema::document::{load_schemas_from_file, Schema};
use schema_curator::schema::step::Edge;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: schema_linter <schema.yaml|schema_dir>");
        process::exit(0);
    }

    let target = Path::new(&args[1]);
    let mut files = Vec::new();
    if target.is_file() {
        files.push(target.to_path_buf());
    } else if target.is_dir() {
        collect_yaml_recursive(target, &mut files);
        files.sort();
    } else {
        eprintln!("ERROR: Path '{}' does not exist", target.display());
        process::exit(1);
    }

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut schema_count = 0usize;

    for path in &files {
        match load_schemas_from_file(path) {
            Ok(schemas) => {
                println!("  Loaded: {} ({} schemas)", path.display(), schemas.len());
                for schema in &schemas {
                    schema_count += 1;
                    lint_schema(schema, &mut errors, &mut warnings);
                }
            }
            Err(e) => errors.push(format!("{}: {}", path.display(), e)),
        }
    }

    println!("Loaded {} schemas from {} files", schema_count, files.len());

    println!("\n=== Schema Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn collect_yaml_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                collect_yaml_recursive(&path, files);
            } else if matches!(
                path.extension().and_then(|s| s.to_str()),
                Some("yaml") | Some("yml")
            ) {
                files.push(path);
            }
        }
    }
}

fn lint_schema(schema: &Schema, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    let id = schema.id();
    let edges: Vec<Edge> = schema.before_edges().cloned().collect();

    if let Err(e) = validate(schema.steps(), &edges) {
        errors.push(format!("{}: {} ({})", id, e.user_message(), e));
    }

    if schema.steps().is_empty() {
        warnings.push(format!("{}: schema has no steps", id));
        return;
    }

    // Steps outside the ordering never end a sequence, so they get no
    // suggestions.
    let ordered: HashSet<&str> = edges
        .iter()
        .flat_map(|e| [e.before.as_str(), e.after.as_str()])
        .collect();
    if schema.steps().len() > 1 {
        for step in schema.steps() {
            if !ordered.contains(step.id.as_str()) {
                warnings.push(format!("{}: step '{}' is not ordered", id, step.id));
            }
        }
    }

    for step in schema.steps() {
        for arg in &step.slots {
            if arg.refvar().is_some() && arg.constraints.is_empty() {
                warnings.push(format!(
                    "{}: step '{}' role '{}' has a refvar but no constraints",
                    id, step.id, arg.role
                ));
            }
        }
    }

    let used: HashSet<&str> = schema.steps().iter().flat_map(|s| s.refvars()).collect();
    for slot in schema.slots() {
        if let Some(refvar) = slot.refvar.as_deref() {
            if !used.contains(refvar) {
                warnings.push(format!(
                    "{}: slot '{}' names refvar '{}' that no step uses",
                    id, slot.role, refvar
                ));
            }
        }
    }

    if schema.version_display().is_none() {
        warnings.push(format!(
            "{}: version '{}' is not a save timestamp",
            id,
            schema.version()
        ));
    }
}
