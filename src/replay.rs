//! Scripted wizard sessions.
//!
//! A session script drives a wizard mounted in a [`MemoryTab`] through a list
//! of user actions and records a [`Frame`] after each one, so a whole Back /
//! Forward / close-tab interaction can be checked without a browser.
//!
//! ```yaml
//! actions:
//!   - action: advance
//!     step: delivery
//!   - action: back
//!   - action: close_tab
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::WizardConfig;
use crate::memory::MemoryTab;
use crate::sync::{NavigationIntent, WizardHistory, WizardHistoryOptions};
use crate::unload::UnloadDecision;

/// Errors raised while loading or running a session script
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("failed to read session script {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse session script: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse session script: {0}")]
    Json(#[from] serde_json::Error),

    #[error("step '{step}' is not one of the configured steps ({known})")]
    UnknownStep { step: String, known: String },

    #[error("action {index} ({action}) needs a mounted wizard")]
    NotMounted { index: usize, action: String },
}

/// One user action in a session script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// The wizard UI completed a step and moves to `step`
    Advance { step: String },
    /// Host Back button
    Back,
    /// Host Forward button
    Forward,
    /// Move several entries at once
    Go { delta: isize },
    /// Close or reload the tab
    CloseTab,
    /// The form gained or lost unsaved input
    SetUnsaved { value: bool },
    /// The wizard page goes away
    Unmount,
}

impl Action {
    fn label(&self) -> String {
        match self {
            Action::Advance { step } => format!("advance {step}"),
            Action::Back => "back".to_string(),
            Action::Forward => "forward".to_string(),
            Action::Go { delta } => format!("go {delta}"),
            Action::CloseTab => "close_tab".to_string(),
            Action::SetUnsaved { value } => format!("set_unsaved {value}"),
            Action::Unmount => "unmount".to_string(),
        }
    }
}

/// A session script; unset fields fall back to the wizard configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionScript {
    #[serde(default)]
    pub initial_step: Option<String>,
    #[serde(default)]
    pub parent_path: Option<String>,
    #[serde(default)]
    pub has_unsaved_data: Option<bool>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl SessionScript {
    /// Load a script; `.json` files are read as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let content = std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ScriptError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ScriptError> {
        Ok(serde_json::from_str(content)?)
    }
}

/// Observable state after one action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    /// What was done ("mount" for the initial frame)
    pub action: String,
    pub mounted: bool,
    /// `None` once the wizard is unmounted
    pub current_step: Option<String>,
    pub stack: Vec<String>,
    pub intent: Option<NavigationIntent>,
    pub history_cursor: usize,
    pub history_len: usize,
    pub pushes: usize,
    pub navigations: Vec<String>,
    /// Only set for `close_tab`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unload: Option<UnloadDecision>,
}

/// Everything recorded while running a script
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcript {
    pub parent_path: String,
    pub frames: Vec<Frame>,
}

impl Transcript {
    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }
}

/// Runs session scripts against a fresh in-memory tab.
pub struct SessionRunner<'a> {
    wizard_config: &'a WizardConfig,
}

impl<'a> SessionRunner<'a> {
    pub fn new(wizard_config: &'a WizardConfig) -> Self {
        Self { wizard_config }
    }

    pub fn run(&self, script: &SessionScript) -> Result<Transcript, ScriptError> {
        let initial_step = script
            .initial_step
            .clone()
            .unwrap_or_else(|| self.wizard_config.initial_step.clone());
        self.check_step(&initial_step)?;

        let parent_path = script
            .parent_path
            .clone()
            .unwrap_or_else(|| self.wizard_config.parent_path.clone());
        let has_unsaved_data = script
            .has_unsaved_data
            .unwrap_or(self.wizard_config.has_unsaved_data);

        let tab = MemoryTab::new();
        let mut wizard = Some(WizardHistory::mount(
            WizardHistoryOptions::new(initial_step, parent_path.clone())
                .with_unsaved_data(has_unsaved_data),
            tab.ports(),
        ));

        let mut frames = vec![capture(&tab, wizard.as_ref(), "mount".to_string(), None)];

        for (index, action) in script.actions.iter().enumerate() {
            let mut unload = None;
            match action {
                Action::Advance { step } => {
                    self.check_step(step)?;
                    mounted(wizard.as_ref(), index, action)?.advance_to(step.clone());
                }
                Action::Back => {
                    tab.history.back();
                }
                Action::Forward => {
                    tab.history.forward();
                }
                Action::Go { delta } => {
                    tab.history.go(*delta);
                }
                Action::CloseTab => {
                    unload = Some(tab.window.request_unload());
                }
                Action::SetUnsaved { value } => {
                    let Some(wizard) = wizard.as_mut() else {
                        return Err(not_mounted(index, action));
                    };
                    wizard.set_unsaved_data(*value);
                }
                Action::Unmount => {
                    if let Some(wizard) = wizard.take() {
                        wizard.unmount();
                    }
                }
            }
            tracing::debug!(index, action = %action.label(), "Replayed action");
            frames.push(capture(&tab, wizard.as_ref(), action.label(), unload));
        }

        Ok(Transcript {
            parent_path,
            frames,
        })
    }

    fn check_step(&self, step: &str) -> Result<(), ScriptError> {
        if self.wizard_config.contains_step(step) {
            Ok(())
        } else {
            Err(ScriptError::UnknownStep {
                step: step.to_string(),
                known: self.wizard_config.steps.join(", "),
            })
        }
    }
}

fn not_mounted(index: usize, action: &Action) -> ScriptError {
    ScriptError::NotMounted {
        index,
        action: action.label(),
    }
}

fn mounted<'w>(
    wizard: Option<&'w WizardHistory<String>>,
    index: usize,
    action: &Action,
) -> Result<&'w WizardHistory<String>, ScriptError> {
    wizard.ok_or_else(|| not_mounted(index, action))
}

fn capture(
    tab: &MemoryTab,
    wizard: Option<&WizardHistory<String>>,
    action: String,
    unload: Option<UnloadDecision>,
) -> Frame {
    Frame {
        action,
        mounted: wizard.is_some(),
        current_step: wizard.map(WizardHistory::current_step),
        stack: wizard.map(WizardHistory::stack).unwrap_or_default(),
        intent: wizard.map(WizardHistory::intent),
        history_cursor: tab.history.cursor(),
        history_len: tab.history.len(),
        pushes: tab.history.pushes().len(),
        navigations: tab.navigator.navigations(),
        unload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn wizard_config() -> WizardConfig {
        Config::default().wizard
    }

    #[test]
    fn test_parse_yaml_script() {
        let script = SessionScript::from_yaml_str(
            r#"
parent_path: /broker/loads
actions:
  - action: advance
    step: delivery
  - action: back
  - action: go
    delta: -1
  - action: set_unsaved
    value: false
  - action: close_tab
  - action: unmount
"#,
        )
        .unwrap();

        assert_eq!(script.parent_path.as_deref(), Some("/broker/loads"));
        assert_eq!(
            script.actions,
            vec![
                Action::Advance {
                    step: "delivery".to_string()
                },
                Action::Back,
                Action::Go { delta: -1 },
                Action::SetUnsaved { value: false },
                Action::CloseTab,
                Action::Unmount,
            ]
        );
    }

    #[test]
    fn test_parse_json_script() {
        let script = SessionScript::from_json_str(
            r#"{"actions": [{"action": "advance", "step": "freight"}, {"action": "forward"}]}"#,
        )
        .unwrap();
        assert_eq!(script.actions.len(), 2);
        assert!(script.initial_step.is_none());
    }

    #[test]
    fn test_parse_rejects_unknown_action() {
        let err = SessionScript::from_yaml_str("actions:\n  - action: teleport\n").unwrap_err();
        assert!(matches!(err, ScriptError::Yaml(_)));
    }

    #[test]
    fn test_run_advance_and_back() {
        let config = wizard_config();
        let script = SessionScript::from_yaml_str(
            r#"
actions:
  - action: advance
    step: delivery
  - action: advance
    step: freight
  - action: back
"#,
        )
        .unwrap();

        let transcript = SessionRunner::new(&config).run(&script).unwrap();
        assert_eq!(transcript.frames.len(), 4);
        assert_eq!(transcript.frames[0].action, "mount");

        let last = transcript.last().unwrap();
        assert_eq!(last.current_step.as_deref(), Some("delivery"));
        assert_eq!(last.stack, vec!["pickup", "delivery"]);
        assert_eq!(last.intent, Some(NavigationIntent::ReactingToPop));
        assert_eq!(last.pushes, 2);
        assert!(last.navigations.is_empty());
    }

    #[test]
    fn test_run_back_out_navigates_to_script_parent() {
        let config = wizard_config();
        let script = SessionScript {
            parent_path: Some("/broker/loads".to_string()),
            actions: vec![Action::Back],
            ..SessionScript::default()
        };

        let transcript = SessionRunner::new(&config).run(&script).unwrap();
        assert_eq!(transcript.parent_path, "/broker/loads");
        assert_eq!(
            transcript.last().unwrap().navigations,
            vec!["/broker/loads".to_string()]
        );
    }

    #[test]
    fn test_run_close_tab_records_decision() {
        let config = wizard_config();
        let script = SessionScript {
            actions: vec![
                Action::CloseTab,
                Action::SetUnsaved { value: false },
                Action::CloseTab,
            ],
            ..SessionScript::default()
        };

        let transcript = SessionRunner::new(&config).run(&script).unwrap();
        assert_eq!(transcript.frames[1].unload, Some(UnloadDecision::Prompt));
        assert_eq!(transcript.frames[2].unload, None);
        assert_eq!(transcript.frames[3].unload, Some(UnloadDecision::Proceed));
    }

    #[test]
    fn test_run_after_unmount_nothing_reacts() {
        let config = wizard_config();
        let script = SessionScript {
            actions: vec![
                Action::Advance {
                    step: "delivery".to_string(),
                },
                Action::Unmount,
                Action::Back,
                Action::Back,
                Action::CloseTab,
            ],
            ..SessionScript::default()
        };

        let transcript = SessionRunner::new(&config).run(&script).unwrap();
        let last = transcript.last().unwrap();
        assert!(!last.mounted);
        assert!(last.current_step.is_none());
        assert!(last.navigations.is_empty());
        assert_eq!(last.unload, Some(UnloadDecision::Proceed));
    }

    #[test]
    fn test_run_rejects_unknown_step() {
        let config = wizard_config();
        let script = SessionScript {
            actions: vec![Action::Advance {
                step: "invoice".to_string(),
            }],
            ..SessionScript::default()
        };

        let err = SessionRunner::new(&config).run(&script).unwrap_err();
        assert!(matches!(err, ScriptError::UnknownStep { ref step, .. } if step == "invoice"));
    }

    #[test]
    fn test_run_rejects_advance_after_unmount() {
        let config = wizard_config();
        let script = SessionScript {
            actions: vec![
                Action::Unmount,
                Action::Advance {
                    step: "delivery".to_string(),
                },
            ],
            ..SessionScript::default()
        };

        let err = SessionRunner::new(&config).run(&script).unwrap_err();
        assert!(matches!(err, ScriptError::NotMounted { index: 1, .. }));
    }

    #[test]
    fn test_load_reads_json_by_extension() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");
        std::fs::write(&path, r#"{"actions": [{"action": "back"}]}"#).unwrap();

        let script = SessionScript::load(&path).unwrap();
        assert_eq!(script.actions, vec![Action::Back]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = SessionScript::load(Path::new("/nonexistent/session.yaml")).unwrap_err();
        assert!(matches!(err, ScriptError::Read { .. }));
    }
}
