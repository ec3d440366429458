use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_STEP_DESCRIPTION: &str = "Please make a selection:";

#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    #[error("failed to read workflow definition {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json in workflow definition {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("workflow definition root must be a json object")]
    NotAnObject,
    #[error("workflow definition contains no workflows")]
    Empty,
    #[error("workflow `{workflow}` must map step keys to step objects")]
    StepsNotAnObject { workflow: String },
    #[error("step `{step}` in workflow `{workflow}` is malformed: {source}")]
    Step {
        workflow: String,
        step: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonKind {
    #[default]
    Plain,
    Radio,
    Checkbox,
    Toggle,
    Skip,
    Finish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionMode {
    #[default]
    Auto,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonConfig {
    pub label: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub kind: ButtonKind,
    #[serde(default)]
    pub radio_group: Option<String>,
    #[serde(default)]
    pub skip_count: usize,
    #[serde(default)]
    pub initial_toggle_state: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepConfig {
    #[serde(default = "default_step_description")]
    pub description: String,
    #[serde(default)]
    pub completion_mode: CompletionMode,
    #[serde(default)]
    pub options: Vec<Vec<ButtonConfig>>,
    #[serde(default)]
    pub has_back_control: bool,
}

fn default_step_description() -> String {
    DEFAULT_STEP_DESCRIPTION.to_string()
}

/// Immutable step graph for one workflow. Step declaration order is the
/// traversal order; radio groups per step are computed once at construction.
#[derive(Debug, Clone)]
pub struct WorkflowDefinition {
    name: String,
    steps: Vec<(String, StepConfig)>,
    radio_groups_by_step: BTreeMap<String, Vec<String>>,
}

impl WorkflowDefinition {
    pub fn load(path: &Path) -> Result<Self, DefinitionError> {
        let raw = fs::read_to_string(path).map_err(|source| DefinitionError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let value: Value =
            serde_json::from_str(&raw).map_err(|source| DefinitionError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_value(value)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, DefinitionError> {
        let value: Value = serde_json::from_str(raw).map_err(|source| DefinitionError::Parse {
            path: "<inline>".to_string(),
            source,
        })?;
        Self::from_value(value)
    }

    /// Builds a definition from a parsed `{ name: { stepKey: step, ... } }`
    /// structure. An empty top-level mapping is rejected; extra top-level
    /// workflows beyond the first are ignored with a warning.
    pub fn from_value(value: Value) -> Result<Self, DefinitionError> {
        let Value::Object(workflows) = value else {
            return Err(DefinitionError::NotAnObject);
        };
        let mut entries = workflows.into_iter();
        let Some((name, steps_value)) = entries.next() else {
            return Err(DefinitionError::Empty);
        };
        if entries.next().is_some() {
            warn!(
                workflow = %name,
                "definition has multiple top-level workflows; using the first"
            );
        }

        let Value::Object(step_map) = steps_value else {
            return Err(DefinitionError::StepsNotAnObject { workflow: name });
        };

        let mut steps = Vec::with_capacity(step_map.len());
        for (step_key, step_value) in step_map {
            let config: StepConfig =
                serde_json::from_value(step_value).map_err(|source| DefinitionError::Step {
                    workflow: name.clone(),
                    step: step_key.clone(),
                    source,
                })?;
            steps.push((step_key, config));
        }

        let radio_groups_by_step = compute_radio_groups(&name, &steps);
        info!(
            workflow = %name,
            steps = steps.len(),
            "workflow definition constructed"
        );
        Ok(Self {
            name,
            steps,
            radio_groups_by_step,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn step(&self, key: &str) -> Option<&StepConfig> {
        self.steps
            .iter()
            .find(|(step_key, _)| step_key == key)
            .map(|(_, config)| config)
    }

    pub fn step_keys(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|(key, _)| key.as_str())
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn first_step_key(&self) -> Option<&str> {
        self.steps.first().map(|(key, _)| key.as_str())
    }

    pub fn step_index(&self, key: &str) -> Option<usize> {
        self.steps.iter().position(|(step_key, _)| step_key == key)
    }

    pub fn step_key_at(&self, index: usize) -> Option<&str> {
        self.steps.get(index).map(|(key, _)| key.as_str())
    }

    /// Distinct radio groups declared by the step's buttons, in first
    /// declaration order. Empty for steps without radio buttons.
    pub fn radio_groups_for(&self, step_key: &str) -> &[String] {
        self.radio_groups_by_step
            .get(step_key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn compute_radio_groups(
    workflow: &str,
    steps: &[(String, StepConfig)],
) -> BTreeMap<String, Vec<String>> {
    let mut by_step = BTreeMap::new();
    for (step_key, config) in steps {
        let mut groups: Vec<String> = Vec::new();
        for row in &config.options {
            for button in row {
                if button.kind != ButtonKind::Radio {
                    continue;
                }
                match button.radio_group.as_ref() {
                    Some(group) => {
                        if !groups.iter().any(|existing| existing == group) {
                            groups.push(group.clone());
                        }
                    }
                    None => warn!(
                        workflow,
                        step = %step_key,
                        label = %button.label,
                        "radio button declared without a radio group; its activations will be ignored"
                    ),
                }
            }
        }
        if !groups.is_empty() {
            by_step.insert(step_key.clone(), groups);
        }
    }
    by_step
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_json() -> &'static str {
        r#"{
            "onboarding": {
                "intro": {
                    "description": "Welcome!",
                    "options": [[
                        {"label": "Begin", "value": "begin"},
                        {"label": "Later", "value": "later"}
                    ]]
                },
                "color": {
                    "description": "Pick a color",
                    "completionMode": "manual",
                    "hasBackControl": true,
                    "options": [[
                        {"label": "Red", "value": "red", "kind": "radio", "radioGroup": "g"},
                        {"label": "Blue", "value": "blue", "kind": "radio", "radioGroup": "g"}
                    ]]
                },
                "done": {
                    "options": [[
                        {"label": "Finish", "value": "confirmed", "kind": "finish"}
                    ]]
                }
            }
        }"#
    }

    #[test]
    fn from_json_preserves_step_declaration_order() {
        let definition = WorkflowDefinition::from_json_str(sample_json()).expect("definition");
        assert_eq!(definition.name(), "onboarding");
        let keys: Vec<&str> = definition.step_keys().collect();
        assert_eq!(keys, vec!["intro", "color", "done"]);
        assert_eq!(definition.first_step_key(), Some("intro"));
        assert_eq!(definition.step_index("color"), Some(1));
        assert_eq!(definition.step_key_at(2), Some("done"));
    }

    #[test]
    fn button_and_step_defaults_apply() {
        let definition = WorkflowDefinition::from_json_str(sample_json()).expect("definition");
        let intro = definition.step("intro").expect("intro");
        assert_eq!(intro.completion_mode, CompletionMode::Auto);
        assert!(!intro.has_back_control);
        assert_eq!(intro.options[0][0].kind, ButtonKind::Plain);
        assert_eq!(intro.options[0][0].skip_count, 0);

        let done = definition.step("done").expect("done");
        assert_eq!(done.description, DEFAULT_STEP_DESCRIPTION);
    }

    #[test]
    fn radio_groups_are_exactly_the_declared_groups() {
        let definition = WorkflowDefinition::from_json_str(sample_json()).expect("definition");
        assert_eq!(definition.radio_groups_for("color"), ["g".to_string()]);
        assert!(definition.radio_groups_for("intro").is_empty());
        assert!(definition.radio_groups_for("missing").is_empty());
    }

    #[test]
    fn radio_groups_keep_first_declaration_order() {
        let definition = WorkflowDefinition::from_json_str(
            r#"{
                "wf": {
                    "pick": {
                        "completionMode": "manual",
                        "options": [
                            [{"label": "A", "value": "a", "kind": "radio", "radioGroup": "zeta"}],
                            [{"label": "B", "value": "b", "kind": "radio", "radioGroup": "alpha"}],
                            [{"label": "C", "value": "c", "kind": "radio", "radioGroup": "zeta"}]
                        ]
                    }
                }
            }"#,
        )
        .expect("definition");
        assert_eq!(
            definition.radio_groups_for("pick"),
            ["zeta".to_string(), "alpha".to_string()]
        );
    }

    #[test]
    fn empty_top_level_mapping_is_rejected() {
        let err = WorkflowDefinition::from_json_str("{}").expect_err("empty");
        assert!(matches!(err, DefinitionError::Empty));
    }

    #[test]
    fn non_object_root_is_rejected() {
        let err = WorkflowDefinition::from_json_str("[1, 2]").expect_err("array root");
        assert!(matches!(err, DefinitionError::NotAnObject));
    }

    #[test]
    fn multiple_top_level_workflows_use_the_first() {
        let definition = WorkflowDefinition::from_json_str(
            r#"{"first": {"a": {"options": []}}, "second": {"b": {"options": []}}}"#,
        )
        .expect("definition");
        assert_eq!(definition.name(), "first");
        assert_eq!(definition.step_keys().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn malformed_step_reports_workflow_and_step() {
        let err = WorkflowDefinition::from_json_str(
            r#"{"wf": {"bad": {"options": [[{"value": "missing label"}]]}}}"#,
        )
        .expect_err("missing label");
        match err {
            DefinitionError::Step { workflow, step, .. } => {
                assert_eq!(workflow, "wf");
                assert_eq!(step, "bad");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_reads_definition_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("workflow.json");
        let mut file = std::fs::File::create(&path).expect("create");
        file.write_all(sample_json().as_bytes()).expect("write");

        let definition = WorkflowDefinition::load(&path).expect("definition");
        assert_eq!(definition.step_count(), 3);

        let err = WorkflowDefinition::load(&dir.path().join("absent.json")).expect_err("absent");
        assert!(matches!(err, DefinitionError::Read { .. }));
    }
}
