/// Curate Schema example: walks one schema through the curation loop.
///
/// A curator submits an arson schema, it is validated and saved, its step
/// sequences become prompts, and a canned generator stands in for the
/// language model so the cleanup, filtering and quota stages can be seen.
///
/// Run with: cargo run --example curate_schema

use chrono::NaiveDate;
use schema_curator::core::pipeline::{CuratorEngine, CuratorError};
use schema_curator::core::sequence::sequence_to_prompt;
use schema_curator::schema::input::{ArgInput, EventInput, LinkInput, Submission};

fn arg(role: &str, refvar: &str, constraints: &[&str]) -> ArgInput {
    ArgInput {
        role: Some(role.to_string()),
        refvar: Some(refvar.to_string()),
        constraints: Some(constraints.iter().map(|c| c.to_string()).collect()),
        ..ArgInput::default()
    }
}

fn event(text: &str, primitive: &str, args: Vec<ArgInput>) -> EventInput {
    EventInput {
        event_text: Some(text.to_string()),
        event_primitive: Some(primitive.to_string()),
        args: Some(args),
        ..EventInput::default()
    }
}

fn link(source: &str, target: &str) -> LinkInput {
    LinkInput {
        source: source.to_string(),
        target: target.to_string(),
    }
}

/// Stands in for a text generator: continuations keyed on the last
/// numbered step of the prompt, with the noise a real model produces.
fn canned_generator(prompt: &str) -> Result<Vec<String>, CuratorError> {
    let raw: &[&str] = if prompt.contains("set fire. 3.") || prompt.contains("set fire. 4.") {
        &[
            "The arsonist flees the scene. Police arrive later.",
            "Firefighters are called to the building!",
            "**Watch the building burn**.",
            "set the fire.",
            "the fire spreads to nearby homes",
        ]
    } else if prompt.contains("obtain fuel. 2.") {
        &[
            "Drive to the target building. He waits.",
            "Obtain fuel.",
            "\u{201c}Prepare\u{201d} the incendiary device.",
            "???",
        ]
    } else {
        &["Hide the evidence.", "Leave town quickly."]
    };
    Ok(raw.iter().map(|s| s.to_string()).collect())
}

fn main() {
    let engine = CuratorEngine::builder()
        .build()
        .expect("Failed to build engine");

    // --- The curator's submission ---
    let submission = Submission {
        schema_id: "arson".to_string(),
        schema_name: "arson_attack".to_string(),
        schema_dscpt: "An arsonist sets fire to a building.".to_string(),
        events: vec![
            event(
                "obtain fuel",
                "Transaction.TransferOwnership",
                vec![arg("Recipient", "arsonist", &["PER"]), arg("Artifact", "fuel", &["WEA"])],
            ),
            event(
                "set fire",
                "Conflict.Attack",
                vec![arg("Attacker", "arsonist", &["PER"]), arg("Target", "building", &["FAC"])],
            ),
            event(
                "flee",
                "Movement.Transportation",
                vec![arg("PassengerArtifact", "arsonist", &["PER"])],
            ),
        ],
        links: vec![link("obtain fuel", "set fire"), link("set fire", "flee")],
        author: Some("demo".to_string()),
        ..Submission::default()
    };

    let saved_at = NaiveDate::from_ymd_opt(2021, 6, 1)
        .and_then(|d| d.and_hms_opt(12, 30, 0))
        .expect("valid timestamp");

    let schema = engine
        .save_schema(submission, saved_at)
        .expect("Failed to save schema");

    println!("=== Saved schema: {}.yaml ===", schema.file_stem());
    println!(
        "Version {}, {} steps, {} slots\n",
        schema.version_display().unwrap_or_default(),
        schema.steps().len(),
        schema.slots().len()
    );
    println!("{}", schema.to_yaml().expect("Failed to serialize schema"));

    // --- Sequences and prompts ---
    let sequences = engine.extract_sequences(&schema);
    println!("=== {} sequences ===\n", sequences.sequences.len());
    for sequence in &sequences.sequences {
        println!("{}", sequence.join(" -> "));
        println!(
            "  prompt: {}",
            sequence_to_prompt(schema.name(), schema.description(), sequence)
        );
    }

    // --- Recommendations ---
    let recs = engine
        .recommend(&schema, &canned_generator)
        .expect("Failed to recommend");
    println!("\n=== Recommendations (format {}) ===\n", recs.format_version);
    for row in recs.rows() {
        println!("after '{}': {}", row[0], row[1..].join("; "));
    }

    // --- An unsaved, interactive request ---
    let events = vec!["obtain fuel".to_string(), "set fire".to_string()];
    let next = engine
        .suggest_next(schema.name(), schema.description(), &events, &canned_generator)
        .expect("Failed to suggest");
    println!("\n=== Next after '{}' ===\n", events.join(", "));
    for suggestion in next {
        println!("  - {}", suggestion);
    }
}
