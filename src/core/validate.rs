/// Graph validation: cycle detection and refvar constraint consistency.

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

use crate::core::graph::StepGraph;
use crate::schema::step::{Edge, Step};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("ordering contains a cycle through step '{step}'")]
    CycleDetected { step: String },
    #[error("refvar '{refvar}' is used with different constraints")]
    InconsistentRefvar { refvar: String },
    #[error("duplicate step id: {0}")]
    DuplicateStep(String),
    #[error("ordering refers to unknown step: {0}")]
    UnknownStep(String),
    #[error("missing field '{field}' on step '{step}'")]
    MissingField { step: String, field: &'static str },
}

impl ValidationError {
    /// True for structural problems with the submitted payload, as opposed
    /// to rule violations in an otherwise well-formed graph.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::DuplicateStep(_) | Self::UnknownStep(_) | Self::MissingField { .. }
        )
    }

    /// Short message naming the rule that failed, suitable for showing to
    /// a curator.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::CycleDetected { .. } => "cycle in graph",
            Self::InconsistentRefvar { .. } => "refvar constraints not consistent",
            _ => "malformed input",
        }
    }
}

/// Check that the ordering is acyclic and that refvars are used
/// consistently. The cycle check runs first.
pub fn validate(steps: &[Step], edges: &[Edge]) -> Result<(), ValidationError> {
    let graph = StepGraph::from_steps(steps, edges)?;
    if let Some(node) = graph.find_cycle() {
        debug!(step = graph.id(node), "cycle detected");
        return Err(ValidationError::CycleDetected {
            step: graph.id(node).to_string(),
        });
    }
    check_refvars(steps)
}

/// Every arg that names a refvar must carry the same constraint set as
/// the first arg that named it. Constraint order is irrelevant.
pub fn check_refvars(steps: &[Step]) -> Result<(), ValidationError> {
    let mut first_seen: FxHashMap<&str, BTreeSet<&str>> = FxHashMap::default();

    for step in steps {
        for arg in &step.slots {
            let Some(refvar) = arg.refvar() else {
                continue;
            };
            let constraints = arg.constraint_set();
            match first_seen.get(refvar) {
                Some(expected) if *expected != constraints => {
                    debug!(refvar, step = step.id.as_str(), "inconsistent refvar");
                    return Err(ValidationError::InconsistentRefvar {
                        refvar: refvar.to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    first_seen.insert(refvar, constraints);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::step::Arg;

    fn arg(refvar: &str, constraints: &[&str]) -> Arg {
        Arg {
            role: "Participant".to_string(),
            refvar: Some(refvar.to_string()),
            constraints: constraints.iter().map(|c| c.to_string()).collect(),
            reference: None,
            comment: None,
        }
    }

    fn step(id: &str, slots: Vec<Arg>) -> Step {
        Step {
            id: id.to_string(),
            primitive: "Movement.Transportation".to_string(),
            slots,
            comment: None,
            required: None,
            reference: None,
        }
    }

    fn chain(ids: &[&str]) -> Vec<Step> {
        ids.iter().map(|id| step(id, Vec::new())).collect()
    }

    #[test]
    fn dag_passes() {
        let steps = chain(&["a", "b", "c"]);
        let edges = vec![Edge::new("a", "b"), Edge::new("b", "c"), Edge::new("a", "c")];
        assert_eq!(validate(&steps, &edges), Ok(()));
    }

    #[test]
    fn no_edges_passes() {
        assert_eq!(validate(&chain(&["a", "b"]), &[]), Ok(()));
        assert_eq!(validate(&[], &[]), Ok(()));
    }

    #[test]
    fn two_cycle_detected() {
        let steps = chain(&["a", "b"]);
        let edges = vec![Edge::new("a", "b"), Edge::new("b", "a")];
        let err = validate(&steps, &edges).unwrap_err();
        assert!(matches!(err, ValidationError::CycleDetected { .. }));
        assert_eq!(err.user_message(), "cycle in graph");
    }

    #[test]
    fn self_loop_detected() {
        let steps = chain(&["a"]);
        let edges = vec![Edge::new("a", "a")];
        assert_eq!(
            validate(&steps, &edges),
            Err(ValidationError::CycleDetected {
                step: "a".to_string()
            })
        );
    }

    #[test]
    fn cycle_detected_regardless_of_step_order() {
        let edges = vec![Edge::new("a", "b"), Edge::new("b", "c"), Edge::new("c", "a")];
        for ids in [["a", "b", "c"], ["c", "b", "a"], ["b", "a", "c"]] {
            assert!(matches!(
                validate(&chain(&ids), &edges),
                Err(ValidationError::CycleDetected { .. })
            ));
        }
    }

    #[test]
    fn cycle_reports_first_step_in_input_order() {
        let edges = vec![Edge::new("a", "b"), Edge::new("b", "c"), Edge::new("c", "a")];
        for (ids, expected) in [
            (["a", "b", "c"], "a"),
            (["c", "b", "a"], "c"),
            (["b", "a", "c"], "b"),
        ] {
            assert_eq!(
                validate(&chain(&ids), &edges),
                Err(ValidationError::CycleDetected {
                    step: expected.to_string()
                }),
                "steps {:?}",
                ids
            );
        }

        // The search starts at "x", which is not on the cycle.
        let steps = chain(&["x", "b", "c"]);
        let edges = vec![Edge::new("x", "b"), Edge::new("b", "c"), Edge::new("c", "b")];
        assert_eq!(
            validate(&steps, &edges),
            Err(ValidationError::CycleDetected {
                step: "b".to_string()
            })
        );
    }

    #[test]
    fn unknown_and_duplicate_steps_are_malformed() {
        let err = validate(&chain(&["a"]), &[Edge::new("a", "z")]).unwrap_err();
        assert_eq!(err, ValidationError::UnknownStep("z".to_string()));
        assert!(err.is_malformed());

        let err = validate(&chain(&["a", "a"]), &[]).unwrap_err();
        assert_eq!(err, ValidationError::DuplicateStep("a".to_string()));
    }

    #[test]
    fn inconsistent_refvar_detected() {
        let steps = vec![
            step("a", vec![arg("bad guy", &["PER"])]),
            step("b", vec![arg("bad guy", &["PER", "ORG"])]),
        ];
        let err = validate(&steps, &[Edge::new("a", "b")]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InconsistentRefvar {
                refvar: "bad guy".to_string()
            }
        );
        assert_eq!(err.user_message(), "refvar constraints not consistent");
        assert!(!err.is_malformed());
    }

    #[test]
    fn refvar_constraint_order_ignored() {
        let steps = vec![
            step("a", vec![arg("bad guy", &["PER", "ORG"])]),
            step("b", vec![arg("bad guy", &["ORG", "PER"])]),
        ];
        assert_eq!(check_refvars(&steps), Ok(()));
    }

    #[test]
    fn empty_refvars_ignored() {
        let steps = vec![
            step("a", vec![arg("", &["PER"])]),
            step("b", vec![arg("", &["LOC"])]),
        ];
        assert_eq!(check_refvars(&steps), Ok(()));
    }

    #[test]
    fn cycle_reported_before_refvar() {
        let steps = vec![
            step("a", vec![arg("x", &["PER"])]),
            step("b", vec![arg("x", &["LOC"])]),
        ];
        let edges = vec![Edge::new("a", "b"), Edge::new("b", "a")];
        assert!(matches!(
            validate(&steps, &edges),
            Err(ValidationError::CycleDetected { .. })
        ));
    }
}
