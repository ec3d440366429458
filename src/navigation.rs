use crate::definition::WorkflowDefinition;

/// The current step key is not declared in the workflow. This indicates
/// corrupted user state or a definition change, never a user action; the
/// engine recovers by resetting the user's state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("step `{step}` is not declared in workflow `{workflow}`")]
pub struct UnknownStepError {
    pub workflow: String,
    pub step: String,
}

fn unknown_step(definition: &WorkflowDefinition, step: &str) -> UnknownStepError {
    UnknownStepError {
        workflow: definition.name().to_string(),
        step: step.to_string(),
    }
}

/// Step key at `current + 1 + skip` in declaration order, or `None` at the
/// end of the workflow. The single source of truth for end-of-workflow
/// detection across the skip, auto-advance, and manual-done paths.
pub fn next_step_key<'a>(
    definition: &'a WorkflowDefinition,
    current: &str,
    skip: usize,
) -> Result<Option<&'a str>, UnknownStepError> {
    let index = definition
        .step_index(current)
        .ok_or_else(|| unknown_step(definition, current))?;
    Ok(definition.step_key_at(index + 1 + skip))
}

pub fn previous_step_key<'a>(
    definition: &'a WorkflowDefinition,
    current: &str,
) -> Result<Option<&'a str>, UnknownStepError> {
    let index = definition
        .step_index(current)
        .ok_or_else(|| unknown_step(definition, current))?;
    match index.checked_sub(1) {
        Some(previous) => Ok(definition.step_key_at(previous)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::WorkflowDefinition;

    fn four_steps() -> WorkflowDefinition {
        WorkflowDefinition::from_json_str(
            r#"{"wf": {"a": {}, "b": {}, "c": {}, "d": {}}}"#,
        )
        .expect("definition")
    }

    #[test]
    fn next_walks_declaration_order() {
        let definition = four_steps();
        assert_eq!(next_step_key(&definition, "a", 0), Ok(Some("b")));
        assert_eq!(next_step_key(&definition, "c", 0), Ok(Some("d")));
        assert_eq!(next_step_key(&definition, "d", 0), Ok(None));
    }

    #[test]
    fn next_with_skip_bypasses_steps() {
        let definition = four_steps();
        assert_eq!(next_step_key(&definition, "a", 1), Ok(Some("c")));
        assert_eq!(next_step_key(&definition, "a", 2), Ok(Some("d")));
        assert_eq!(next_step_key(&definition, "a", 3), Ok(None));
        assert_eq!(next_step_key(&definition, "c", 5), Ok(None));
    }

    #[test]
    fn previous_stops_at_the_first_step() {
        let definition = four_steps();
        assert_eq!(previous_step_key(&definition, "b"), Ok(Some("a")));
        assert_eq!(previous_step_key(&definition, "a"), Ok(None));
    }

    #[test]
    fn next_and_previous_are_inverse_along_the_order() {
        let definition = four_steps();
        let keys: Vec<String> = definition.step_keys().map(str::to_string).collect();
        for key in &keys {
            if let Ok(Some(next)) = next_step_key(&definition, key, 0) {
                assert_eq!(previous_step_key(&definition, next), Ok(Some(key.as_str())));
            }
        }
    }

    #[test]
    fn unknown_step_is_an_error_not_an_end() {
        let definition = four_steps();
        let err = next_step_key(&definition, "nope", 0).expect_err("unknown");
        assert_eq!(err.step, "nope");
        assert_eq!(err.workflow, "wf");
        assert!(previous_step_key(&definition, "nope").is_err());
    }
}
