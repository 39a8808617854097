//! Workflow engine behaviour against the in-memory store.

mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use common::{engine, engine_with, MemoryStore, RecordingMailer, SCREENING};
use dealflow_automation::actions::ActionFailure;
use dealflow_automation::{AutomationStore, EngineConfig};
use dealflow_core::attributes::StartupAttribute;
use dealflow_core::workflow::{ExecutionStatus, TriggerType};
use dealflow_db::models::task::CreateTask;
use serde_json::json;

fn welcome_email() -> serde_json::Value {
    json!({
        "recipient_field": "contact_email",
        "subject": "Welcome {name}",
        "body": "Hello {{ name }}, your sector is {sector}.",
    })
}

// ---------------------------------------------------------------------------
// Status-change triggers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_change_with_matching_condition_sends_email() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let startup = store.add_startup(
        "Acme",
        json!({"sector": "tech", "contact_email": "ceo@acme.io"}),
    );
    let workflow_id = store.add_workflow(
        "Welcome to screening",
        TriggerType::StatusChange,
        json!({"status_id": SCREENING}),
        &[("sector", "equals", "tech")],
        &[("email", welcome_email())],
    );

    let summaries = engine(&store, &mailer)
        .on_status_changed(startup.id, SCREENING, Some(7))
        .await;

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].workflow_id, workflow_id);
    assert_eq!(summaries[0].status, ExecutionStatus::Success);

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to.as_deref(), Some("ceo@acme.io"));
    assert_eq!(sent[0].subject, "Welcome Acme");
    assert_eq!(sent[0].text_body, "Hello Acme, your sector is tech.");

    let logs = store.logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, "success");
    assert_eq!(logs[0].entity_type, "startup");
    assert_eq!(logs[0].entity_id, startup.id);
    assert_eq!(summaries[0].log_id, Some(logs[0].id));
}

#[tokio::test]
async fn other_statuses_do_not_match() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let startup = store.add_startup("Acme", json!({"contact_email": "ceo@acme.io"}));
    store.add_workflow(
        "Screening only",
        TriggerType::StatusChange,
        json!({"status_ids": [SCREENING]}),
        &[],
        &[("email", welcome_email())],
    );

    let summaries = engine(&store, &mailer)
        .on_status_changed(startup.id, common::DUE_DILIGENCE, None)
        .await;

    assert!(summaries.is_empty());
    assert!(store.logs().is_empty());
}

#[tokio::test]
async fn failed_condition_logs_skipped_run() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let startup = store.add_startup(
        "BioCo",
        json!({"sector": "bio", "contact_email": "ceo@bio.co"}),
    );
    store.add_workflow(
        "Tech only",
        TriggerType::StatusChange,
        json!({"status_id": SCREENING}),
        &[("sector", "equals", "tech")],
        &[("email", welcome_email())],
    );

    let summaries = engine(&store, &mailer)
        .on_status_changed(startup.id, SCREENING, None)
        .await;

    assert_eq!(summaries[0].status, ExecutionStatus::Skipped);
    assert!(summaries[0].results.is_empty());
    assert!(mailer.sent().is_empty());

    let logs = store.logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, "skipped");
    assert!(logs[0]
        .error_message
        .as_deref()
        .is_some_and(|m| m.contains("sector")));
}

#[tokio::test]
async fn skipped_runs_are_not_logged_when_disabled() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let startup = store.add_startup("BioCo", json!({"sector": "bio"}));
    store.add_workflow(
        "Tech only",
        TriggerType::StatusChange,
        json!({"status_id": SCREENING}),
        &[("sector", "equals", "tech")],
        &[("status_query", json!({}))],
    );
    let config = EngineConfig {
        log_skipped: false,
        ..EngineConfig::default()
    };

    let summaries = engine_with(&store, &mailer, config)
        .on_status_changed(startup.id, SCREENING, None)
        .await;

    assert_eq!(summaries[0].status, ExecutionStatus::Skipped);
    assert_eq!(summaries[0].log_id, None);
    assert!(store.logs().is_empty());
}

#[tokio::test]
async fn unknown_operator_blocks_the_workflow() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let startup = store.add_startup("Acme", json!({"sector": "tech"}));
    store.add_workflow(
        "Regex condition",
        TriggerType::StatusChange,
        json!({"status_id": SCREENING}),
        &[("sector", "matches", "t.*")],
        &[("status_query", json!({}))],
    );

    let summaries = engine(&store, &mailer)
        .on_status_changed(startup.id, SCREENING, None)
        .await;

    assert_eq!(summaries[0].status, ExecutionStatus::Skipped);
}

#[tokio::test]
async fn workflow_without_conditions_always_runs() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let startup = store.add_startup("Acme", json!({}));
    store.add_workflow(
        "Report status",
        TriggerType::StatusChange,
        json!({"status_id": SCREENING}),
        &[],
        &[("status_query", json!({}))],
    );

    let summaries = engine(&store, &mailer)
        .on_status_changed(startup.id, SCREENING, None)
        .await;

    assert_eq!(summaries[0].status, ExecutionStatus::Success);
    let data = summaries[0].results[0].data.clone().unwrap();
    // The startup still holds its old status: only the tracker moves it.
    assert_eq!(data["status_name"], "Lead");
}

#[tokio::test]
async fn inactive_and_malformed_workflows_are_ignored() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let startup = store.add_startup("Acme", json!({}));
    let inactive = store.add_workflow(
        "Inactive",
        TriggerType::StatusChange,
        json!({"status_id": SCREENING}),
        &[],
        &[("status_query", json!({}))],
    );
    store.set_workflow_active(inactive, false);
    store.add_workflow(
        "Malformed",
        TriggerType::StatusChange,
        json!({"status_id": "abc"}),
        &[],
        &[("status_query", json!({}))],
    );

    let summaries = engine(&store, &mailer)
        .on_status_changed(startup.id, SCREENING, None)
        .await;

    assert!(summaries.is_empty());
}

#[tokio::test]
async fn missing_startup_runs_nothing() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    store.add_workflow(
        "Any",
        TriggerType::StatusChange,
        json!({"status_id": SCREENING}),
        &[],
        &[("status_query", json!({}))],
    );

    let summaries = engine(&store, &mailer)
        .on_status_changed(404, SCREENING, None)
        .await;

    assert!(summaries.is_empty());
    assert!(store.logs().is_empty());
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn attribute_change_normalizes_priority_and_audits() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let startup = store.add_startup("Acme", json!({"priority": "medium"}));
    store.add_workflow(
        "Escalate",
        TriggerType::StatusChange,
        json!({"status_id": SCREENING}),
        &[],
        &[("attribute_change", json!({"attribute": "priority", "value": "alta"}))],
    );

    let summaries = engine(&store, &mailer)
        .on_status_changed(startup.id, SCREENING, Some(7))
        .await;

    assert_eq!(summaries[0].status, ExecutionStatus::Success);
    assert_eq!(store.startup(startup.id).priority, "high");

    let history = store.history(startup.id);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].field_name, "priority");
    assert_eq!(history[0].old_value, "medium");
    assert_eq!(history[0].new_value, "high");
    assert_eq!(history[0].changed_by, Some(7));

    let change = &summaries[0].results[0].data.clone().unwrap()["changes"][0];
    assert_eq!(change["old_value"], "medium");
    assert_eq!(change["new_value"], "high");
}

#[tokio::test]
async fn rejected_value_leaves_no_audit_record() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let startup = store.add_startup("Acme", json!({"mrr": 100.0}));
    store.add_workflow(
        "Bad mrr",
        TriggerType::StatusChange,
        json!({"status_id": SCREENING}),
        &[],
        &[("attribute_change", json!({"attribute": "mrr", "value": "n/a"}))],
    );

    let summaries = engine(&store, &mailer)
        .on_status_changed(startup.id, SCREENING, None)
        .await;

    assert_eq!(summaries[0].status, ExecutionStatus::Error);
    assert!(store.history(startup.id).is_empty());
    assert_eq!(store.startup(startup.id).mrr, Some(100.0));
}

#[tokio::test]
async fn task_creation_substitutes_placeholders() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let startup = store.add_startup("Acme", json!({"city": "Recife"}));
    store.add_workflow(
        "Follow up",
        TriggerType::StatusChange,
        json!({"status_id": SCREENING}),
        &[],
        &[(
            "task_creation",
            json!({
                "title": "Call {name} in {city}",
                "description": "Ask about {unknown_field}",
                "priority": "alta",
                "due_in_days": 3,
            }),
        )],
    );

    let engine = engine(&store, &mailer);
    engine.on_status_changed(startup.id, SCREENING, Some(7)).await;

    let tasks = store.tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Call Acme in Recife");
    assert_eq!(tasks[0].description.as_deref(), Some("Ask about {unknown_field}"));
    assert_eq!(tasks[0].priority, "high");
    assert_eq!(tasks[0].status, "todo");
    assert_eq!(tasks[0].startup_id, startup.id);
    assert_eq!(tasks[0].created_by, Some(7));
    assert!(tasks[0].due_date.is_some());
}

#[tokio::test]
async fn created_tasks_do_not_cascade() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let startup = store.add_startup("Acme", json!({}));
    store.add_workflow(
        "Create task",
        TriggerType::StatusChange,
        json!({"status_id": SCREENING}),
        &[],
        &[("task_creation", json!({"title": "Review {name}"}))],
    );
    store.add_workflow(
        "On any task",
        TriggerType::TaskCreation,
        json!({}),
        &[],
        &[("email", json!({"recipient": "ops@dealflow.io", "subject": "s", "body": "b"}))],
    );

    let summaries = engine(&store, &mailer)
        .on_status_changed(startup.id, SCREENING, None)
        .await;

    assert_eq!(summaries.len(), 1);
    assert_eq!(store.tasks().len(), 1);
    assert!(mailer.sent().is_empty());
    assert_eq!(store.logs().len(), 1);
}

#[tokio::test]
async fn failing_action_does_not_stop_the_rest() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    // No contact_email: the email action cannot resolve its recipient.
    let startup = store.add_startup("Acme", json!({}));
    store.add_workflow(
        "Mixed",
        TriggerType::StatusChange,
        json!({"status_id": SCREENING}),
        &[],
        &[
            ("email", welcome_email()),
            ("task_creation", json!({"title": "Find a contact for {name}"})),
            ("status_query", json!({})),
        ],
    );

    let summaries = engine(&store, &mailer)
        .on_status_changed(startup.id, SCREENING, None)
        .await;

    let summary = &summaries[0];
    assert_eq!(summary.status, ExecutionStatus::PartialSuccess);
    let kinds: Vec<_> = summary.results.iter().map(|r| r.action_type.as_str()).collect();
    assert_eq!(kinds, ["email", "task_creation", "status_query"]);
    assert!(!summary.results[0].success);
    assert!(summary.results[0].message.contains("contact_email"));
    assert!(summary.results[1].success);
    assert!(summary.results[2].success);
    assert_eq!(store.logs()[0].status, "partial_success");
}

#[tokio::test]
async fn all_actions_failing_is_an_error() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::failing();
    let startup = store.add_startup("Acme", json!({"contact_email": "ceo@acme.io"}));
    store.add_workflow(
        "Mail",
        TriggerType::StatusChange,
        json!({"status_id": SCREENING}),
        &[],
        &[("email", welcome_email())],
    );

    let summaries = engine(&store, &mailer)
        .on_status_changed(startup.id, SCREENING, None)
        .await;

    assert_eq!(summaries[0].status, ExecutionStatus::Error);
    assert!(summaries[0].results[0].message.contains("connection refused"));
}

#[tokio::test]
async fn slow_action_times_out() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::slow(Duration::from_millis(500));
    let startup = store.add_startup("Acme", json!({"contact_email": "ceo@acme.io"}));
    store.add_workflow(
        "Slow mail",
        TriggerType::StatusChange,
        json!({"status_id": SCREENING}),
        &[],
        &[("email", welcome_email()), ("status_query", json!({}))],
    );
    let config = EngineConfig {
        action_timeout: Duration::from_millis(20),
        ..EngineConfig::default()
    };

    let summaries = engine_with(&store, &mailer, config)
        .on_status_changed(startup.id, SCREENING, None)
        .await;

    let results = &summaries[0].results;
    assert!(!results[0].success);
    assert!(results[0].message.contains("timed out"));
    assert!(results[1].success);
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn misconfigured_action_is_recorded() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let startup = store.add_startup("Acme", json!({}));
    store.add_workflow(
        "Broken",
        TriggerType::StatusChange,
        json!({"status_id": SCREENING}),
        &[],
        &[("webhook", json!({"url": "http://example.test"}))],
    );

    let summaries = engine(&store, &mailer)
        .on_status_changed(startup.id, SCREENING, None)
        .await;

    assert_eq!(summaries[0].status, ExecutionStatus::Error);
    assert!(summaries[0].results[0].message.starts_with("Misconfigured action"));
}

#[tokio::test]
async fn out_of_range_due_date_fails_the_action_only() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let startup = store.add_startup("Acme", json!({}));
    store.add_workflow(
        "Far future task",
        TriggerType::StatusChange,
        json!({"status_id": SCREENING}),
        &[],
        &[
            ("task_creation", json!({"title": "Someday", "due_in_days": 1_000_000_000u64})),
            ("status_query", json!({})),
        ],
    );

    let summaries = engine(&store, &mailer)
        .on_status_changed(startup.id, SCREENING, None)
        .await;

    let summary = &summaries[0];
    assert_eq!(summary.status, ExecutionStatus::PartialSuccess);
    assert!(!summary.results[0].success);
    assert!(summary.results[0].message.contains("due_in_days"));
    assert!(summary.results[1].success);
    assert!(store.tasks().is_empty());
    assert_eq!(store.logs()[0].status, "partial_success");
}

#[tokio::test]
async fn action_load_failure_is_logged_as_error() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let startup = store.add_startup("Acme", json!({}));
    store.add_workflow(
        "Any",
        TriggerType::StatusChange,
        json!({"status_id": SCREENING}),
        &[],
        &[("status_query", json!({}))],
    );
    store.fail_list_actions();

    let summaries = engine(&store, &mailer)
        .on_status_changed(startup.id, SCREENING, None)
        .await;

    assert_eq!(summaries[0].status, ExecutionStatus::Error);
    let logs = store.logs();
    assert_eq!(logs[0].status, "error");
    assert!(logs[0]
        .error_message
        .as_deref()
        .is_some_and(|m| m.starts_with("Failed to load actions")));
}

#[tokio::test]
async fn workflows_run_in_storage_order() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let startup = store.add_startup("Acme", json!({}));
    let first = store.add_workflow(
        "First",
        TriggerType::StatusChange,
        json!({"status_id": SCREENING}),
        &[],
        &[("status_query", json!({}))],
    );
    let second = store.add_workflow(
        "Second",
        TriggerType::StatusChange,
        json!({"status_ids": [SCREENING, common::DUE_DILIGENCE]}),
        &[],
        &[("status_query", json!({}))],
    );

    let summaries = engine(&store, &mailer)
        .on_status_changed(startup.id, SCREENING, None)
        .await;

    let ids: Vec<_> = summaries.iter().map(|s| s.workflow_id).collect();
    assert_eq!(ids, [first, second]);
}

// ---------------------------------------------------------------------------
// Attribute-change triggers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn set_attribute_writes_then_triggers() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let startup = store.add_startup("Acme", json!({"sector": "bio"}));
    store.add_workflow(
        "Became tech",
        TriggerType::AttributeChange,
        json!({"field_name": "sector", "old_value": "bio", "new_value": "tech"}),
        &[],
        &[("task_creation", json!({"title": "Re-evaluate {name} as {sector}"}))],
    );

    let (update, summaries) = engine(&store, &mailer)
        .set_attribute(startup.id, StartupAttribute::Sector, &json!("tech"), Some(3))
        .await
        .unwrap();

    assert_eq!(update.startup.sector.as_deref(), Some("tech"));
    assert_eq!(update.history.old_value, "bio");
    assert_eq!(update.history.new_value, "tech");
    assert_eq!(summaries.len(), 1);
    assert_eq!(store.tasks()[0].title, "Re-evaluate Acme as tech");
}

#[tokio::test]
async fn attribute_trigger_checks_field_and_values() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let startup = store.add_startup("Acme", json!({"sector": "bio"}));
    store.add_workflow(
        "Only to tech",
        TriggerType::AttributeChange,
        json!({"field_name": "sector", "new_value": "tech"}),
        &[],
        &[("status_query", json!({}))],
    );
    let engine = engine(&store, &mailer);

    let other_value = engine
        .on_attribute_changed(startup.id, "sector", json!("fintech"), None, None)
        .await;
    let other_field = engine
        .on_attribute_changed(startup.id, "city", json!("tech"), None, None)
        .await;

    assert!(other_value.is_empty());
    assert!(other_field.is_empty());
}

#[tokio::test]
async fn attribute_trigger_with_synonym_matches_normalized_write() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let startup = store.add_startup("Acme", json!({"priority": "medium"}));
    store.add_workflow(
        "Escalated",
        TriggerType::AttributeChange,
        json!({"field_name": "priority", "new_value": "alta"}),
        &[],
        &[("status_query", json!({}))],
    );

    let (update, summaries) = engine(&store, &mailer)
        .set_attribute(startup.id, StartupAttribute::Priority, &json!("Alta"), None)
        .await
        .unwrap();

    assert_eq!(update.startup.priority, "high");
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].status, ExecutionStatus::Success);
}

#[tokio::test]
async fn set_attribute_rejects_bad_boolean() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let startup = store.add_startup("Acme", json!({}));

    let result = engine(&store, &mailer)
        .set_attribute(
            startup.id,
            StartupAttribute::HasInvestment,
            &json!("maybe"),
            None,
        )
        .await;

    assert_matches!(result, Err(ActionFailure::InvalidValue(_)));
    assert!(store.history(startup.id).is_empty());
}

#[tokio::test]
async fn set_attribute_on_missing_startup_is_not_found() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();

    let result = engine(&store, &mailer)
        .set_attribute(404, StartupAttribute::City, &json!("Recife"), None)
        .await;

    assert_matches!(result, Err(ActionFailure::NotFound { id: 404, .. }));
}

// ---------------------------------------------------------------------------
// Task-creation triggers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn task_trigger_targets_the_task() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let startup = store.add_startup("Acme", json!({}));
    store.add_workflow(
        "New task",
        TriggerType::TaskCreation,
        json!(null),
        &[("priority", "equals", "high")],
        &[
            (
                "email",
                json!({"recipient": "ops@dealflow.io", "subject": "New task: {title}", "body": "{description}"}),
            ),
            ("attribute_change", json!({"attribute": "city", "value": "Recife"})),
        ],
    );

    let engine = engine(&store, &mailer);
    let task = store
        .insert_task(&CreateTask {
            startup_id: startup.id,
            title: "Due diligence call".to_string(),
            description: Some("Prepare questions".to_string()),
            status: None,
            priority: Some("alta".to_string()),
            due_date: None,
            assignee_id: None,
            created_by: Some(11),
        })
        .await
        .unwrap();

    let summaries = engine.on_task_created(task.id).await;

    let summary = &summaries[0];
    assert_eq!(summary.status, ExecutionStatus::PartialSuccess);
    assert!(summary.results[0].success);
    assert!(summary.results[1].message.contains("only supported for startups"));

    let sent = mailer.sent();
    assert_eq!(sent[0].subject, "New task: Due diligence call");
    assert_eq!(sent[0].text_body, "Prepare questions");

    let logs = store.logs();
    assert_eq!(logs[0].entity_type, "task");
    assert_eq!(logs[0].entity_id, task.id);
    assert_eq!(store.startup(startup.id).city, None);
}
