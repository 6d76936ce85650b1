//! Integration tests for the wizard/history sync against an in-memory tab
//!
//! Every test mounts a wizard through the public API only, drives the tab the
//! way a user would (Back, Forward, closing the tab) and checks what the host
//! saw.
//!
//! ```bash
//! cargo test --test wizard_history_integration
//! ```

use serde::{Deserialize, Serialize};
use serde_json::json;
use wizard_history::config::Config;
use wizard_history::memory::{HistoryOp, MemoryTab};
use wizard_history::replay::{Action, ScriptError, SessionRunner, SessionScript};
use wizard_history::{NavigationIntent, UnloadDecision, WizardHistory, WizardHistoryOptions};

const PARENT: &str = "/shipper/loads";

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn mount_letters(tab: &MemoryTab) -> WizardHistory<String> {
    WizardHistory::mount(
        WizardHistoryOptions::new("A".to_string(), PARENT),
        tab.ports(),
    )
}

fn entry(step: &str, index: usize) -> serde_json::Value {
    json!({ "step": step, "index": index })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CarrierStep {
    Company,
    Insurance,
    Banking,
}

// ─── Mount and advance ───────────────────────────────────────────────────────

#[test]
fn test_initial_step_is_current_after_mount() {
    let tab = MemoryTab::new();
    let wizard = mount_letters(&tab);

    assert_eq!(wizard.current_step(), "A");
    assert_eq!(tab.history.ops(), vec![HistoryOp::Replace(entry("A", 0))]);
    assert_eq!(tab.history.state(), Some(entry("A", 0)));
}

#[test]
fn test_linear_advance_pushes_one_entry_per_step() {
    let tab = MemoryTab::new();
    let wizard = mount_letters(&tab);

    wizard.advance_to("B".to_string());
    wizard.advance_to("C".to_string());

    assert_eq!(wizard.current_step(), "C");
    assert_eq!(
        tab.history.ops(),
        vec![
            HistoryOp::Replace(entry("A", 0)),
            HistoryOp::Push(entry("B", 1)),
            HistoryOp::Push(entry("C", 2)),
        ]
    );
    assert_eq!(wizard.stack(), vec!["A", "B", "C"]);
}

// ─── Back button ─────────────────────────────────────────────────────────────

#[test]
fn test_back_restores_previous_step() {
    let tab = MemoryTab::new();
    let wizard = mount_letters(&tab);
    wizard.advance_to("B".to_string());
    wizard.advance_to("C".to_string());

    assert!(tab.history.back());

    assert_eq!(wizard.current_step(), "B");
    assert_eq!(wizard.stack(), vec!["A", "B"]);
    assert_eq!(wizard.intent(), NavigationIntent::ReactingToPop);
    assert!(tab.navigator.navigations().is_empty());
}

#[test]
fn test_back_past_first_step_navigates_to_parent_once() {
    let tab = MemoryTab::new();
    let wizard = mount_letters(&tab);

    assert!(tab.history.back());

    assert_eq!(tab.navigator.navigations(), vec![PARENT.to_string()]);
    assert_eq!(wizard.current_step(), "A");
    assert_eq!(wizard.intent(), NavigationIntent::Idle);
}

#[test]
fn test_advance_after_back_is_absorbed_once() {
    let tab = MemoryTab::new();
    let wizard = mount_letters(&tab);
    wizard.advance_to("B".to_string());
    wizard.advance_to("C".to_string());
    tab.history.back();
    let pushes_before = tab.history.pushes().len();

    // The form re-announces the restored step; nothing may be pushed
    wizard.advance_to("B".to_string());
    assert_eq!(tab.history.pushes().len(), pushes_before);
    assert_eq!(wizard.intent(), NavigationIntent::Idle);

    wizard.advance_to("D".to_string());
    assert_eq!(tab.history.pushes().last(), Some(&entry("D", 2)));
    assert_eq!(wizard.stack().len(), 3);
    assert_eq!(wizard.current_step(), "D");
}

#[test]
fn test_forward_after_back_returns_to_later_step() {
    let tab = MemoryTab::new();
    let wizard = mount_letters(&tab);
    wizard.advance_to("B".to_string());
    wizard.advance_to("C".to_string());

    tab.history.back();
    wizard.advance_to("B".to_string());
    assert!(tab.history.forward());

    assert_eq!(wizard.current_step(), "C");
    assert_eq!(wizard.stack(), vec!["A", "B", "C"]);
}

#[test]
fn test_go_jumps_several_steps_back() {
    let tab = MemoryTab::new();
    let wizard = mount_letters(&tab);
    for step in ["B", "C", "D"] {
        wizard.advance_to(step.to_string());
    }

    assert!(tab.history.go(-3));

    assert_eq!(wizard.current_step(), "A");
    assert_eq!(wizard.stack(), vec!["A"]);
    assert!(!wizard.can_go_back());
}

#[test]
fn test_foreign_history_state_counts_as_leaving() {
    let tab = MemoryTab::new();
    let wizard = mount_letters(&tab);
    wizard.advance_to("B".to_string());

    tab.history
        .simulate_pop(Some(json!({ "scrollY": 120, "key": "x1" })));

    assert_eq!(tab.navigator.navigations(), vec![PARENT.to_string()]);
    assert_eq!(wizard.current_step(), "B");
}

#[test]
fn test_well_typed_payload_with_wild_index_counts_as_leaving() {
    let tab = MemoryTab::new();
    let wizard = mount_letters(&tab);
    wizard.advance_to("B".to_string());

    tab.history
        .simulate_pop(Some(json!({ "step": "A", "index": u64::MAX })));
    tab.history
        .simulate_pop(Some(json!({ "step": "A", "index": 1u64 << 40 })));

    assert_eq!(
        tab.navigator.navigations(),
        vec![PARENT.to_string(), PARENT.to_string()]
    );
    assert_eq!(wizard.current_step(), "B");
    assert_eq!(wizard.stack(), vec!["A", "B"]);
}

#[test]
fn test_forward_jump_within_gap_restores_step() {
    let tab = MemoryTab::new();
    let wizard = mount_letters(&tab);

    tab.history.simulate_pop(Some(entry("E", 4)));

    assert_eq!(wizard.current_step(), "E");
    assert_eq!(wizard.stack().len(), 5);
    assert!(tab.navigator.navigations().is_empty());
}

// ─── Unload guard ────────────────────────────────────────────────────────────

#[test]
fn test_unload_prompts_by_default() {
    let tab = MemoryTab::new();
    let _wizard = mount_letters(&tab);

    assert_eq!(tab.window.request_unload(), UnloadDecision::Prompt);
}

#[test]
fn test_unload_proceeds_without_unsaved_data() {
    let tab = MemoryTab::new();
    let _wizard = WizardHistory::mount(
        WizardHistoryOptions::new("A".to_string(), PARENT).with_unsaved_data(false),
        tab.ports(),
    );

    assert_eq!(tab.window.request_unload(), UnloadDecision::Proceed);
    assert_eq!(tab.window.listener_count(), 0);
}

#[test]
fn test_reconfigure_toggles_guard_and_parent() {
    let tab = MemoryTab::new();
    let mut wizard = mount_letters(&tab);

    wizard.reconfigure("/carrier/onboarding", false);
    assert_eq!(tab.window.request_unload(), UnloadDecision::Proceed);

    tab.history.back();
    assert_eq!(
        tab.navigator.navigations(),
        vec!["/carrier/onboarding".to_string()]
    );
    // Reconfiguring does not rewrite the mount entry
    assert_eq!(tab.history.ops().len(), 1);
}

// ─── Cleanup ─────────────────────────────────────────────────────────────────

#[test]
fn test_unmounted_wizard_ignores_host_events() {
    let tab = MemoryTab::new();
    let wizard = mount_letters(&tab);
    wizard.advance_to("B".to_string());

    wizard.unmount();

    assert_eq!(tab.history.listener_count(), 0);
    assert_eq!(tab.window.listener_count(), 0);
    tab.history.back();
    tab.history.simulate_pop(None);
    assert_eq!(tab.window.request_unload(), UnloadDecision::Proceed);
    assert!(tab.navigator.navigations().is_empty());
}

#[test]
fn test_dropping_wizard_releases_listeners() {
    let tab = MemoryTab::new();
    {
        let _wizard = mount_letters(&tab);
        assert_eq!(tab.history.listener_count(), 1);
    }
    assert_eq!(tab.history.listener_count(), 0);
    tab.history.simulate_pop(None);
    assert_eq!(tab.navigator.count(), 0);
}

// ─── Typed steps ─────────────────────────────────────────────────────────────

#[test]
fn test_enum_steps_round_trip_through_history() {
    let tab = MemoryTab::new();
    let wizard = WizardHistory::mount(
        WizardHistoryOptions::new(CarrierStep::Company, "/carriers"),
        tab.ports(),
    );
    wizard.advance_to(CarrierStep::Insurance);
    wizard.advance_to(CarrierStep::Banking);

    assert_eq!(
        tab.history.pushes().last(),
        Some(&json!({ "step": "banking", "index": 2 }))
    );

    tab.history.back();
    assert_eq!(wizard.current_step(), CarrierStep::Insurance);
}

// ─── Session replay ──────────────────────────────────────────────────────────

#[test]
fn test_replay_back_and_close_tab() {
    let config = Config::default();
    let script = SessionScript::from_yaml_str(
        r"
actions:
  - action: advance
    step: delivery
  - action: advance
    step: freight
  - action: back
  - action: advance
    step: delivery
  - action: set_unsaved
    value: false
  - action: close_tab
",
    )
    .unwrap();

    let transcript = SessionRunner::new(&config.wizard).run(&script).unwrap();

    assert_eq!(transcript.frames.len(), 7);
    let after_back = &transcript.frames[3];
    assert_eq!(after_back.current_step.as_deref(), Some("delivery"));
    assert_eq!(after_back.intent, Some(NavigationIntent::ReactingToPop));

    let last = transcript.last().unwrap();
    assert_eq!(last.pushes, 2);
    assert_eq!(last.unload, Some(UnloadDecision::Proceed));
    assert!(last.navigations.is_empty());
}

#[test]
fn test_replay_rejects_unknown_step() {
    let config = Config::default();
    let script = SessionScript {
        actions: vec![Action::Advance {
            step: "customs".to_string(),
        }],
        ..SessionScript::default()
    };

    let err = SessionRunner::new(&config.wizard).run(&script).unwrap_err();
    assert!(matches!(err, ScriptError::UnknownStep { ref step, .. } if step == "customs"));
}

#[test]
fn test_replay_action_after_unmount_fails() {
    let config = Config::default();
    let script = SessionScript {
        actions: vec![
            Action::Unmount,
            Action::Advance {
                step: "delivery".to_string(),
            },
        ],
        ..SessionScript::default()
    };

    let err = SessionRunner::new(&config.wizard).run(&script).unwrap_err();
    assert!(matches!(err, ScriptError::NotMounted { index: 1, .. }));
}
