//! Plain-text views of the dashboard state.

use dashboard_core::{
    directory::DirectoryState,
    tasks::EMPTY_LIST_MESSAGE,
    Notification, Severity, TaskBoardState,
};
use shared::domain::{Task, TeamMember};

pub const CRASH_TITLE: &str = "Something went wrong";
pub const CRASH_DETAIL: &str =
    "The application encountered an error. Please try restarting the dashboard.";

pub fn task_line(task: &Task) -> String {
    let mark = if task.completed { 'x' } else { ' ' };
    format!(
        "{:>4}  [{mark}] {:<9} {}",
        task.id.0,
        task.status_label(),
        task.title
    )
}

pub fn task_board(state: &TaskBoardState) -> String {
    if state.loading {
        return "Loading tasks...".to_string();
    }
    if let Some(error) = &state.error {
        return format!("{error}\nType `retry` to load the list again.");
    }
    if state.tasks.is_empty() {
        return EMPTY_LIST_MESSAGE.to_string();
    }

    let mut out = format!("Tasks ({}, by title {})\n", state.tasks.len(), state.sort_direction);
    for task in &state.tasks {
        out.push_str(&task_line(task));
        out.push('\n');
        out.push_str(&format!("            {}\n", task.description));
    }
    out
}

pub fn member_line(member: &TeamMember) -> String {
    let presence = if member.online { "online" } else { "away" };
    format!(
        "{} ({}) [{presence}] {}, {}",
        member.name,
        member.role_label(),
        member.location,
        member.email
    )
}

/// Team panel limited to `limit` members.
pub fn team_panel(state: &DirectoryState, limit: usize) -> String {
    if state.loading {
        return "Loading team members...".to_string();
    }
    let mut out = String::from("Team members\n");
    if let Some(error) = &state.error {
        out.push_str(error);
        out.push('\n');
    }
    for member in state.members.iter().take(limit) {
        out.push_str("  ");
        out.push_str(&member_line(member));
        out.push('\n');
    }
    if state.members.len() > limit {
        out.push_str(&format!(
            "  ...and {} more (`team --all`)\n",
            state.members.len() - limit
        ));
    }
    out
}

pub fn notification(notification: &Notification) -> String {
    let tag = match notification.severity {
        Severity::Success => "ok",
        Severity::Error => "error",
    };
    format!("[{tag}] {}", notification.message)
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
