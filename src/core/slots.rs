/// Slot derivation: promotes refvars shared between steps into
/// schema-level slots.

use rustc_hash::FxHashMap;

use crate::schema::document::Slot;
use crate::schema::step::Step;

#[derive(Debug, Default)]
struct RefvarUse<'a> {
    count: usize,
    constraints: &'a [String],
    reference: Option<&'a str>,
}

/// Derive schema-level slots from the refvars used by `steps`.
///
/// - If any refvar is used at least twice, each such refvar gets a slot.
/// - Otherwise every refvar used once gets a slot.
/// - Role names are the refvar in PascalCase; constraints come from the
///   first use (the steps are assumed validated) and are sorted.
///
/// Slots are returned sorted by refvar.
pub fn derive_slots(steps: &[Step]) -> Vec<Slot> {
    let mut uses: FxHashMap<&str, RefvarUse<'_>> = FxHashMap::default();

    for arg in steps.iter().flat_map(|s| &s.slots) {
        let Some(refvar) = arg.refvar() else {
            continue;
        };
        let entry = uses.entry(refvar).or_insert_with(|| RefvarUse {
            count: 0,
            constraints: &arg.constraints,
            reference: None,
        });
        entry.count += 1;
        // First use that carries a reference; uses without one are skipped.
        if entry.reference.is_none() {
            entry.reference = arg.reference.as_deref();
        }
    }

    let shared = uses.values().any(|u| u.count >= 2);
    let mut kept: Vec<(&str, RefvarUse<'_>)> = uses
        .into_iter()
        .filter(|(_, u)| !shared || u.count >= 2)
        .collect();
    kept.sort_unstable_by(|a, b| a.0.cmp(b.0));

    kept.into_iter()
        .map(|(refvar, used)| {
            let mut constraints = used.constraints.to_vec();
            constraints.sort();
            Slot {
                role: pascal_case(refvar),
                refvar: Some(refvar.to_string()),
                constraints,
                reference: used.reference.map(str::to_string),
                comment: None,
            }
        })
        .collect()
}

/// `"bad guy"` → `"BadGuy"`. Each word is capitalized (first letter
/// upper, rest lower) and the words are joined.
pub fn pascal_case(refvar: &str) -> String {
    refvar.split_whitespace().map(capitalize).collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
