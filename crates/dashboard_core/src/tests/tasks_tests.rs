use super::*;
use crate::{
    fakes::{remote_task, remote_tasks, FakeTaskGateway, GatewayCall, ScriptedConfirm},
    AutoConfirm, Severity,
};
use chrono::TimeDelta;
use shared::domain::OwnerId;
use tokio::sync::Notify;

async fn loaded_with(tasks: Vec<RemoteTask>) -> (Arc<FakeTaskGateway>, TaskSynchronizer) {
    let gateway = FakeTaskGateway::with_tasks(tasks);
    let sync = TaskSynchronizer::new(gateway.clone(), Arc::new(AutoConfirm));
    sync.fetch_all().await.expect("fetch");
    (gateway, sync)
}

async fn loaded(count: usize) -> (Arc<FakeTaskGateway>, TaskSynchronizer) {
    loaded_with(remote_tasks(count)).await
}

fn titles(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|task| task.title.as_str()).collect()
}

#[tokio::test]
async fn fetch_keeps_at_most_twenty_tasks() {
    let (_, sync) = loaded(25).await;
    let state = sync.snapshot().await;
    assert_eq!(state.tasks.len(), TASK_FETCH_LIMIT);
    assert_eq!(state.tasks[0].id, TaskId(1));
    assert_eq!(state.tasks[19].id, TaskId(20));
    assert!(!state.loading);
    assert!(state.error.is_none());

    let (_, small) = loaded(3).await;
    assert_eq!(small.tasks().await.len(), 3);
}

#[tokio::test]
async fn fetch_backfills_missing_descriptions_with_the_title() {
    let mut described = remote_task(2, "write report");
    described.description = Some("due friday".to_string());
    let mut blank = remote_task(3, "call bank");
    blank.description = Some(String::new());
    let (_, sync) = loaded_with(vec![remote_task(1, "water plants"), described, blank]).await;

    let tasks = sync.tasks().await;
    assert_eq!(
        tasks[0].description,
        "Task details for \"water plants\". This is a placeholder description."
    );
    assert_eq!(tasks[1].description, "due friday");
    assert!(tasks[2].description.contains("call bank"));
}

#[tokio::test]
async fn fetch_failure_keeps_collection_and_retry_recovers() {
    let (gateway, sync) = loaded(4).await;
    gateway.fail_with("connection refused").await;

    let err = sync.fetch_all().await.expect_err("must fail");
    assert!(matches!(err, SyncError::Gateway(_)));
    let state = sync.snapshot().await;
    assert_eq!(state.tasks.len(), 4);
    assert_eq!(state.error.as_deref(), Some(LOAD_FAILED_MESSAGE));
    assert!(!state.loading);

    gateway.recover().await;
    assert_eq!(sync.retry().await.expect("retry"), 4);
    assert!(sync.snapshot().await.error.is_none());
}

#[tokio::test]
async fn create_prepends_one_task_with_the_local_description() {
    let (gateway, sync) = loaded(3).await;

    let created = sync
        .create(
            TaskForm::new("Buy milk")
                .with_description("two litres")
                .with_completed(true),
        )
        .await
        .expect("create");

    let tasks = sync.tasks().await;
    assert_eq!(tasks.len(), 4);
    assert_eq!(tasks[0], created);
    assert_eq!(tasks[0].title, "Buy milk");
    assert_eq!(tasks[0].description, "two litres");
    assert_eq!(tasks[0].id, TaskId(4));
    assert_eq!(
        gateway.calls.lock().await.last(),
        Some(&GatewayCall::Create(CreateTaskRequest {
            user_id: OwnerId(1),
            title: "Buy milk".to_string(),
            completed: false,
        }))
    );
    let notification = sync.notification().await.expect("notification");
    assert_eq!(notification.message, "Task created successfully");
    assert_eq!(notification.severity, Severity::Success);
}

#[tokio::test]
async fn create_failure_leaves_collection_unchanged() {
    let (gateway, sync) = loaded(3).await;
    gateway.fail_with("503").await;

    sync.create(TaskForm::new("Buy milk"))
        .await
        .expect_err("must fail");

    assert_eq!(sync.tasks().await.len(), 3);
    let notification = sync.notification().await.expect("notification");
    assert_eq!(notification.message, SAVE_FAILED_MESSAGE);
    assert_eq!(notification.severity, Severity::Error);
}

#[tokio::test]
async fn create_rejects_blank_title_without_calling_gateway() {
    let (gateway, sync) = loaded(1).await;
    let calls_before = gateway.call_count().await;

    let err = sync
        .create(TaskForm::new("   "))
        .await
        .expect_err("must fail");

    assert!(matches!(err, SyncError::Validation(_)));
    assert_eq!(gateway.call_count().await, calls_before);
    assert_eq!(sync.tasks().await.len(), 1);
}

#[tokio::test]
async fn update_merges_form_over_record_and_ignores_echo() {
    let (gateway, sync) = loaded(3).await;

    let merged = sync
        .update(
            TaskId(2),
            TaskForm::new("renamed")
                .with_description("new notes")
                .with_completed(true),
        )
        .await
        .expect("update");

    assert_eq!(merged.title, "renamed");
    assert_eq!(merged.description, "new notes");
    assert!(merged.completed);
    assert_eq!(merged.user_id, OwnerId(1));
    assert_eq!(sync.task(TaskId(2)).await, Some(merged));
    assert_eq!(
        gateway.calls.lock().await.last(),
        Some(&GatewayCall::Update(
            TaskId(2),
            UpdateTaskRequest::new(TaskId(2), "renamed", true)
        ))
    );
}

#[tokio::test]
async fn update_failure_leaves_record_untouched() {
    let (gateway, sync) = loaded(3).await;
    let before = sync.tasks().await;
    gateway.fail_with("500").await;

    sync.update(TaskId(2), TaskForm::new("renamed"))
        .await
        .expect_err("must fail");

    assert_eq!(sync.tasks().await, before);
    assert_eq!(
        sync.notification().await.map(|n| n.message),
        Some(SAVE_FAILED_MESSAGE.to_string())
    );
}

#[tokio::test]
async fn update_of_unknown_task_is_not_sent() {
    let (gateway, sync) = loaded(2).await;
    let calls_before = gateway.call_count().await;

    let err = sync
        .update(TaskId(99), TaskForm::new("ghost"))
        .await
        .expect_err("must fail");

    assert!(matches!(err, SyncError::NotFound(TaskId(99))));
    assert_eq!(gateway.call_count().await, calls_before);
}

#[tokio::test]
async fn toggle_flips_only_the_target_record() {
    let (_, sync) = loaded(4).await;
    let before = sync.tasks().await;
    let target = before[1].clone();

    let toggled = sync.toggle_status(&target).await.expect("toggle");

    let after = sync.tasks().await;
    assert_eq!(toggled, target.with_completed(true));
    assert_eq!(after[1], toggled);
    for index in [0, 2, 3] {
        assert_eq!(after[index], before[index]);
    }
    assert_eq!(
        sync.notification().await.map(|n| n.message),
        Some("Task marked as completed".to_string())
    );

    sync.toggle_status(&toggled).await.expect("toggle back");
    assert_eq!(sync.tasks().await, before);
    assert_eq!(
        sync.notification().await.map(|n| n.message),
        Some("Task marked as pending".to_string())
    );
}

#[tokio::test]
async fn toggle_failure_leaves_record_untouched() {
    let (gateway, sync) = loaded(2).await;
    let before = sync.tasks().await;
    gateway.fail_with("timeout").await;

    sync.toggle_status(&before[0])
        .await
        .expect_err("must fail");

    assert_eq!(sync.tasks().await, before);
    assert_eq!(
        sync.notification().await.map(|n| n.message),
        Some(STATUS_FAILED_MESSAGE.to_string())
    );
}

#[tokio::test]
async fn confirmed_remove_drops_exactly_one_record() {
    let gateway = FakeTaskGateway::with_tasks(remote_tasks(5));
    let confirm = ScriptedConfirm::answering(true);
    let sync = TaskSynchronizer::new(gateway.clone(), confirm.clone());
    sync.fetch_all().await.expect("fetch");

    let outcome = sync.remove(TaskId(3)).await.expect("remove");

    assert_eq!(outcome, RemovalOutcome::Removed);
    let tasks = sync.tasks().await;
    assert_eq!(tasks.len(), 4);
    assert!(tasks.iter().all(|task| task.id != TaskId(3)));
    assert_eq!(
        confirm.prompts.lock().await.as_slice(),
        [DELETE_CONFIRMATION_PROMPT.to_string()]
    );
    assert_eq!(
        gateway.calls.lock().await.last(),
        Some(&GatewayCall::Delete(TaskId(3)))
    );
}

#[tokio::test]
async fn declined_remove_never_reaches_the_gateway() {
    let gateway = FakeTaskGateway::with_tasks(remote_tasks(2));
    let sync = TaskSynchronizer::new(gateway.clone(), ScriptedConfirm::answering(false));
    sync.fetch_all().await.expect("fetch");
    let calls_before = gateway.call_count().await;

    let outcome = sync.remove(TaskId(1)).await.expect("remove");

    assert_eq!(outcome, RemovalOutcome::Declined);
    assert_eq!(gateway.call_count().await, calls_before);
    assert_eq!(sync.tasks().await.len(), 2);
}

#[tokio::test]
async fn remove_failure_keeps_collection() {
    let (gateway, sync) = loaded(3).await;
    gateway.fail_with("connection reset").await;

    sync.remove(TaskId(1)).await.expect_err("must fail");

    assert_eq!(sync.tasks().await.len(), 3);
    assert_eq!(
        sync.notification().await.map(|n| n.message),
        Some(DELETE_FAILED_MESSAGE.to_string())
    );
}

#[tokio::test]
async fn sort_orders_titles_and_is_idempotent() {
    let (_, sync) = loaded_with(vec![
        remote_task(1, "delta"),
        remote_task(2, "alpha"),
        remote_task(3, "charlie"),
        remote_task(4, "bravo"),
    ])
    .await;

    sync.sort(SortDirection::Ascending).await;
    let once = sync.tasks().await;
    assert_eq!(titles(&once), ["alpha", "bravo", "charlie", "delta"]);
    sync.sort(SortDirection::Ascending).await;
    assert_eq!(sync.tasks().await, once);

    sync.sort(SortDirection::Descending).await;
    let state = sync.snapshot().await;
    assert_eq!(titles(&state.tasks), ["delta", "charlie", "bravo", "alpha"]);
    assert_eq!(state.sort_direction, SortDirection::Descending);
}

#[tokio::test]
async fn sort_is_case_respecting_and_stable() {
    let (_, sync) = loaded_with(vec![
        remote_task(1, "b"),
        remote_task(2, "apple"),
        remote_task(3, "b"),
        remote_task(4, "Banana"),
        remote_task(5, "apple"),
    ])
    .await;

    sync.sort(SortDirection::Ascending).await;
    let ids: Vec<i64> = sync.tasks().await.iter().map(|task| task.id.0).collect();
    assert_eq!(ids, [4, 2, 5, 1, 3]);

    sync.sort(SortDirection::Descending).await;
    let ids: Vec<i64> = sync.tasks().await.iter().map(|task| task.id.0).collect();
    assert_eq!(ids, [1, 3, 2, 5, 4]);
}

#[tokio::test]
async fn toggle_sort_alternates_starting_with_descending() {
    let (_, sync) = loaded(6).await;

    assert_eq!(sync.toggle_sort().await, SortDirection::Descending);
    let desc = sync.tasks().await;
    assert!(desc.windows(2).all(|pair| pair[0].title >= pair[1].title));

    assert_eq!(sync.toggle_sort().await, SortDirection::Ascending);
    let asc = sync.tasks().await;
    assert!(asc.windows(2).all(|pair| pair[0].title <= pair[1].title));

    assert_eq!(sync.toggle_sort().await, SortDirection::Descending);
    assert_eq!(sync.tasks().await, desc);
}

#[tokio::test]
async fn overlapping_changes_to_the_same_task_are_rejected() {
    let (gateway, sync) = loaded(3).await;
    let target = sync.task(TaskId(1)).await.expect("task");
    let gate = Arc::new(Notify::new());
    gateway.hold_on(gate.clone()).await;

    let (first, second) = tokio::join!(sync.update(TaskId(1), TaskForm::new("renamed")), async {
        let second = sync.toggle_status(&target).await;
        gate.notify_one();
        second
    });

    first.expect("first change applies");
    assert!(matches!(second, Err(SyncError::MutationInFlight(TaskId(1)))));
    let task = sync.task(TaskId(1)).await.expect("task");
    assert_eq!(task.title, "renamed");
    assert!(!task.completed);
}

#[tokio::test]
async fn changes_to_different_tasks_run_independently() {
    let (gateway, sync) = loaded(3).await;
    let gate = Arc::new(Notify::new());
    gateway.hold_on(gate.clone()).await;

    let (first, second, _) = tokio::join!(
        sync.update(TaskId(1), TaskForm::new("one")),
        sync.update(TaskId(2), TaskForm::new("two")),
        async {
            gate.notify_one();
            gate.notify_one();
        }
    );

    first.expect("first");
    second.expect("second");
    let tasks = sync.tasks().await;
    assert_eq!(titles(&tasks[..2]), ["one", "two"]);
}

#[tokio::test]
async fn claim_is_released_after_a_failed_change() {
    let (gateway, sync) = loaded(2).await;
    gateway.fail_with("boom").await;
    sync.update(TaskId(1), TaskForm::new("x"))
        .await
        .expect_err("must fail");

    gateway.recover().await;
    sync.update(TaskId(1), TaskForm::new("y"))
        .await
        .expect("second attempt is not blocked");
}

#[tokio::test]
async fn teardown_discards_an_in_flight_fetch() {
    let gateway = FakeTaskGateway::with_tasks(remote_tasks(3));
    let sync = TaskSynchronizer::new(gateway.clone(), Arc::new(AutoConfirm));
    let gate = Arc::new(Notify::new());
    gateway.hold_on(gate.clone()).await;

    let (result, _) = tokio::join!(sync.fetch_all(), async {
        sync.teardown();
        gate.notify_one();
    });

    assert!(matches!(result, Err(SyncError::Cancelled(_))));
    assert!(sync.tasks().await.is_empty());
    assert!(sync.is_torn_down());
}

#[tokio::test]
async fn mutations_after_teardown_do_not_touch_state() {
    let (_, sync) = loaded(2).await;
    let before = sync.snapshot().await;
    sync.teardown();

    let err = sync
        .create(TaskForm::new("late"))
        .await
        .expect_err("cancelled");
    assert!(err.is_cancelled());
    assert_eq!(sync.snapshot().await, before);
}

#[tokio::test]
async fn editor_creates_and_closes_on_success() {
    let (_, sync) = loaded(1).await;

    sync.open_editor(None).await;
    sync.edit_form(|form| {
        form.title = "Plan sprint".to_string();
        form.description = "Monday".to_string();
    })
    .await
    .expect("editor open");
    let slot = sync.editor().await.expect("slot");
    assert!(!slot.is_edit());

    let created = sync.submit_editor().await.expect("submit");
    assert_eq!(created.title, "Plan sprint");
    assert!(sync.editor().await.is_none());
    assert_eq!(sync.tasks().await[0], created);
}

#[tokio::test]
async fn editor_prefills_from_task_and_updates_it() {
    let (_, sync) = loaded(2).await;
    let task = sync.task(TaskId(2)).await.expect("task");

    sync.open_editor(Some(&task)).await;
    let slot = sync.editor().await.expect("slot");
    assert_eq!(slot.target, Some(TaskId(2)));
    assert_eq!(slot.form, TaskForm::from_task(&task));

    sync.edit_form(|form| form.completed = true)
        .await
        .expect("editor open");
    let saved = sync.submit_editor().await.expect("submit");
    assert!(saved.completed);
    assert_eq!(saved.title, task.title);
}

#[tokio::test]
async fn editor_stays_open_when_save_fails() {
    let (gateway, sync) = loaded(1).await;
    gateway.fail_with("offline").await;

    sync.open_editor(None).await;
    sync.edit_form(|form| form.title = "Keep me".to_string())
        .await
        .expect("editor open");
    sync.submit_editor().await.expect_err("must fail");

    let slot = sync.editor().await.expect("still open");
    assert_eq!(slot.form.title, "Keep me");

    sync.close_editor().await;
    assert!(matches!(
        sync.edit_form(|_| {}).await,
        Err(SyncError::EditorClosed)
    ));
}

#[tokio::test]
async fn notifications_expire_and_can_be_dismissed() {
    let (_, sync) = loaded(1).await;
    sync.create(TaskForm::new("note")).await.expect("create");
    let notification = sync.notification().await.expect("notification");

    let early = notification.raised_at + TimeDelta::milliseconds(3_999);
    assert!(!sync.expire_notification(early).await);
    let late = notification.raised_at + TimeDelta::milliseconds(4_000);
    assert!(sync.expire_notification(late).await);
    assert!(sync.notification().await.is_none());

    sync.create(TaskForm::new("again")).await.expect("create");
    sync.dismiss_notification().await;
    assert!(sync.notification().await.is_none());
}

#[tokio::test]
async fn mutations_are_published_as_events() {
    let (_, sync) = loaded(1).await;
    let mut events = sync.subscribe_events();

    let created = sync.create(TaskForm::new("evented")).await.expect("create");
    sync.remove(created.id).await.expect("remove");

    assert_eq!(
        events.recv().await.expect("event"),
        SyncEvent::TaskCreated(created.clone())
    );
    assert!(matches!(
        events.recv().await.expect("event"),
        SyncEvent::Notified(_)
    ));
    assert_eq!(
        events.recv().await.expect("event"),
        SyncEvent::TaskRemoved(created.id)
    );
}
