use crate::activation::{back_token, done_token, option_token};
use crate::definition::{ButtonConfig, ButtonKind, CompletionMode, WorkflowDefinition};
use crate::navigation::previous_step_key;
use crate::state::{SelectionValue, UserWorkflowState};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const RADIO_UNSELECTED: &str = "🔘";
pub const RADIO_SELECTED: &str = "🟢";
pub const CHECKBOX_UNSELECTED: &str = "⬜";
pub const CHECKBOX_SELECTED: &str = "✅";
pub const TOGGLE_OFF: &str = "🔴";
pub const TOGGLE_ON: &str = "🟢";
pub const BACK_GLYPH: &str = "⬅️";
pub const DONE_GLYPH: &str = "✅";

pub const COMPLETED_TEXT: &str = "Workflow completed! Here are your selections:";
pub const STATE_LOST_TEXT: &str = "Your workflow state was lost. Please start again.";
pub const INTERNAL_ERROR_TEXT: &str = "An internal error occurred while processing your request.";
pub const MISSING_STEP_TEXT: &str =
    "An internal error occurred (step configuration missing). Please restart.";
pub const VALIDATION_WARNING_TEXT: &str =
    "⚠️ Please make all required selections before proceeding.";

/// One addressable control: a display label (already annotated with a
/// selection glyph where the button kind is stateful) and the activation
/// token the transport must send back when it is pressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UiButton {
    pub label: String,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepView {
    pub step_key: String,
    pub text: String,
    pub rows: Vec<Vec<UiButton>>,
    pub done_control: Option<UiButton>,
    pub back_control: Option<UiButton>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerminalView {
    pub text: String,
    pub selections: BTreeMap<String, SelectionValue>,
}

/// Abstract UI descriptor handed to the transport collaborator. Contains no
/// transport-specific markup; any display-dialect escaping happens outside
/// the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UiResponse {
    Step(StepView),
    Terminal(TerminalView),
}

impl UiResponse {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(_))
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Step(view) => &view.text,
            Self::Terminal(view) => &view.text,
        }
    }
}

/// Ensures a manual radio step has a recorded value for every declared
/// group before it is shown, defaulting each group to its first declared
/// button. This writes through real selection state, so a user who presses
/// done without touching a radio completes with the first option's value.
/// Idempotent: re-rendering without intervening activations changes nothing.
pub fn materialize_radio_defaults(
    definition: &WorkflowDefinition,
    state: &mut UserWorkflowState,
    step_key: &str,
) {
    let Some(step) = definition.step(step_key) else {
        return;
    };
    if step.completion_mode != CompletionMode::Manual {
        return;
    }
    if definition.radio_groups_for(step_key).is_empty() {
        return;
    }

    if !matches!(
        state.selections.get(step_key),
        Some(SelectionValue::Radio(_))
    ) {
        state
            .selections
            .insert(step_key.to_string(), SelectionValue::Radio(BTreeMap::new()));
    }

    let mut defaults: Vec<(String, String)> = Vec::new();
    if let Some(SelectionValue::Radio(selected)) = state.selections.get(step_key) {
        for row in &step.options {
            for button in row {
                if button.kind != ButtonKind::Radio {
                    continue;
                }
                let (Some(group), Some(value)) = (&button.radio_group, &button.value) else {
                    continue;
                };
                if selected.contains_key(group)
                    || defaults.iter().any(|(existing, _)| existing == group)
                {
                    continue;
                }
                defaults.push((group.clone(), value.clone()));
            }
        }
    }
    if defaults.is_empty() {
        return;
    }
    if let Some(SelectionValue::Radio(selected)) = state.selections.get_mut(step_key) {
        for (group, value) in defaults {
            debug!(step = step_key, group = %group, value = %value, "pre-selected radio default");
            selected.insert(group, value);
        }
    }
}

/// Projects the step at `step_key` into a UI descriptor, materializing
/// radio defaults first so state and view never diverge. `override_text`
/// replaces the step description (validation warnings, error notices).
pub fn render(
    definition: &WorkflowDefinition,
    state: &mut UserWorkflowState,
    step_key: &str,
    override_text: Option<&str>,
) -> UiResponse {
    let Some(step) = definition.step(step_key) else {
        warn!(step = step_key, "no configuration for current step");
        return UiResponse::Terminal(TerminalView {
            text: MISSING_STEP_TEXT.to_string(),
            selections: BTreeMap::new(),
        });
    };

    materialize_radio_defaults(definition, state, step_key);
    let selection = state.selections.get(step_key);

    let mut rows = Vec::with_capacity(step.options.len());
    for (row_index, row) in step.options.iter().enumerate() {
        let mut buttons = Vec::with_capacity(row.len());
        for (column, button) in row.iter().enumerate() {
            buttons.push(UiButton {
                label: decorated_label(button, selection),
                action: option_token(step_key, row_index, column),
            });
        }
        rows.push(buttons);
    }

    let done_control = (step.completion_mode == CompletionMode::Manual).then(|| UiButton {
        label: format!("{DONE_GLYPH} Done / Next"),
        action: done_token(step_key),
    });
    // Suppressed entirely, not disabled, when there is no previous step.
    let back_control = (step.has_back_control
        && matches!(previous_step_key(definition, step_key), Ok(Some(_))))
    .then(|| UiButton {
        label: format!("{BACK_GLYPH} Go Back"),
        action: back_token(step_key),
    });

    let text = override_text
        .map(str::to_string)
        .unwrap_or_else(|| step.description.clone());
    UiResponse::Step(StepView {
        step_key: step_key.to_string(),
        text,
        rows,
        done_control,
        back_control,
    })
}

fn decorated_label(button: &ButtonConfig, selection: Option<&SelectionValue>) -> String {
    match button.kind {
        ButtonKind::Radio => {
            let selected = match (selection.and_then(SelectionValue::as_radio), &button.radio_group)
            {
                (Some(groups), Some(group)) => button
                    .value
                    .as_ref()
                    .is_some_and(|value| groups.get(group) == Some(value)),
                _ => false,
            };
            let glyph = if selected {
                RADIO_SELECTED
            } else {
                RADIO_UNSELECTED
            };
            format!("{glyph} {}", button.label)
        }
        ButtonKind::Checkbox => {
            let selected = match (selection.and_then(SelectionValue::as_checkboxes), &button.value)
            {
                (Some(values), Some(value)) => values.contains(value),
                _ => false,
            };
            let glyph = if selected {
                CHECKBOX_SELECTED
            } else {
                CHECKBOX_UNSELECTED
            };
            format!("{glyph} {}", button.label)
        }
        ButtonKind::Toggle => {
            let on = match (selection.and_then(SelectionValue::as_toggles), &button.value) {
                (Some(states), Some(value)) => states
                    .get(value)
                    .copied()
                    .unwrap_or(button.initial_toggle_state),
                _ => button.initial_toggle_state,
            };
            let glyph = if on { TOGGLE_ON } else { TOGGLE_OFF };
            format!("{glyph} {}", button.label)
        }
        ButtonKind::Plain | ButtonKind::Skip | ButtonKind::Finish => button.label.clone(),
    }
}
