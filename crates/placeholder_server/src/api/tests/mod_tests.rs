use super::*;

fn context() -> ApiContext {
    ApiContext::new(45, Some(11))
}

#[test]
fn catalog_ids_are_sequential_and_grouped_by_owner() {
    let ctx = context();
    let tasks = list_tasks(&ctx);

    assert_eq!(tasks.len(), 45);
    assert_eq!(tasks[0].id, TaskId(1));
    assert_eq!(tasks[44].id, TaskId(45));
    assert_eq!(tasks[19].user_id, OwnerId(1));
    assert_eq!(tasks[20].user_id, OwnerId(2));
    assert_eq!(tasks[44].user_id, OwnerId(3));
    assert!(tasks.iter().all(|task| !task.title.is_empty()));
    assert!(tasks.iter().all(|task| task.description.is_none()));
}

#[test]
fn same_seed_builds_same_catalog() {
    assert_eq!(context().catalog(), context().catalog());
}

#[test]
fn get_reports_unknown_ids_as_not_found() {
    let ctx = context();
    assert_eq!(get_task(&ctx, TaskId(3)).expect("task").id, TaskId(3));

    let err = get_task(&ctx, TaskId(46)).expect_err("missing");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[test]
fn create_echoes_next_id_without_retaining() {
    let ctx = context();

    let first = create_task(&ctx, CreateTaskRequest::new("Buy milk"));
    let second = create_task(&ctx, CreateTaskRequest::new("Buy bread"));

    assert_eq!(first.id, TaskId(46));
    assert_eq!(second.id, TaskId(46));
    assert_eq!(first.title, "Buy milk");
    assert!(!first.completed);
    assert_eq!(list_tasks(&ctx).len(), 45);
}

#[test]
fn update_echoes_known_ids_and_rejects_unknown_ones() {
    let ctx = context();
    let before = get_task(&ctx, TaskId(2)).expect("task");

    let echoed = update_task(
        &ctx,
        TaskId(2),
        UpdateTaskRequest::new(TaskId(2), "renamed", !before.completed),
    )
    .expect("update");
    assert_eq!(echoed.title, "renamed");
    assert_eq!(echoed.completed, !before.completed);
    assert_eq!(get_task(&ctx, TaskId(2)).expect("task"), before);

    let err = update_task(
        &ctx,
        TaskId(46),
        UpdateTaskRequest::new(TaskId(46), "created locally", false),
    )
    .expect_err("unknown id");
    assert_eq!(err.code, ErrorCode::Internal);
}

#[test]
fn result_count_is_clamped() {
    assert_eq!(result_count(None), 1);
    assert_eq!(result_count(Some(0)), 1);
    assert_eq!(result_count(Some(5)), 5);
    assert_eq!(result_count(Some(1_000_000)), MAX_RESULTS);
}

#[test]
fn random_users_are_complete_identities() {
    let ctx = context();
    let users = random_users(&ctx, 6);

    assert_eq!(users.len(), 6);
    for user in &users {
        assert_eq!(user.login.uuid.len(), 36);
        assert!(user.email.ends_with("@example.com"));
        assert!(user.picture.medium.starts_with("https://"));
        assert!(!user.location.city.is_empty());
        assert!(!user.phone.is_empty());
    }
    assert_ne!(users[0].login.uuid, users[1].login.uuid);
}
