use std::{process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use dashboard_core::{
    session::INVALID_CREDENTIALS_MESSAGE, AutoConfirm, ConfirmationPrompt, Credentials,
    Dashboard, DirectoryGateway, HttpDirectoryGateway, HttpTaskGateway, Notification,
    RemovalOutcome, SessionGuard, SyncError, TaskGateway, SIDEBAR_LIMIT,
};
use shared::domain::{TaskForm, TaskId};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod prompt;
mod render;
mod repl;

use config::{load_settings, Overrides, Settings};
use prompt::{PromptConfirm, StdinReader};
use repl::Command;

#[derive(Parser, Debug)]
#[command(name = "taskboard", about = "Task dashboard in the terminal")]
struct Args {
    #[arg(long)]
    task_api_url: Option<String>,
    #[arg(long)]
    directory_api_url: Option<String>,
    #[arg(long)]
    team_size: Option<usize>,
    #[arg(long)]
    log: Option<String>,
    #[arg(long, short)]
    username: Option<String>,
    #[arg(long, short)]
    password: Option<String>,
    /// Delete tasks without asking first.
    #[arg(long)]
    assume_yes: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            task_api_url: self.task_api_url.clone(),
            directory_api_url: self.directory_api_url.clone(),
            team_size: self.team_size,
            log_filter: self.log.clone(),
        }
    }

    fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(Credentials::new(username, password)),
            _ => None,
        }
    }
}

enum Exit {
    Logout,
    Quit,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let mut settings = load_settings();
    settings.apply_overrides(args.overrides());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let reader = Arc::new(StdinReader::stdin());
    let session = tokio::spawn(run(settings, args, reader));
    match session.await {
        Ok(result) => result.map(|()| ExitCode::SUCCESS),
        Err(err) if err.is_panic() => {
            error!("dashboard session crashed: {err}");
            println!("{}", render::CRASH_TITLE);
            println!("{}", render::CRASH_DETAIL);
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err).context("dashboard session was aborted"),
    }
}

async fn run(settings: Settings, args: Args, reader: Arc<StdinReader>) -> Result<()> {
    let task_gateway: Arc<dyn TaskGateway> = Arc::new(
        HttpTaskGateway::new(&settings.task_api_url)
            .with_context(|| format!("invalid task api url '{}'", settings.task_api_url))?,
    );
    let directory_gateway: Arc<dyn DirectoryGateway> = Arc::new(
        HttpDirectoryGateway::new(&settings.directory_api_url).with_context(|| {
            format!("invalid directory api url '{}'", settings.directory_api_url)
        })?,
    );
    let confirm: Arc<dyn ConfirmationPrompt> = if args.assume_yes {
        Arc::new(AutoConfirm)
    } else {
        Arc::new(PromptConfirm::new(reader.clone()))
    };
    info!(
        task_api = %settings.task_api_url,
        directory_api = %settings.directory_api_url,
        "dashboard starting"
    );

    let session = Arc::new(SessionGuard::default());
    let mut preset = args.credentials();
    loop {
        let Some(username) = sign_in(&session, &reader, preset.take()).await? else {
            return Ok(());
        };
        println!("Welcome, {username}.");

        // A fresh view per sign-in: teardown on logout cancels the previous one for good.
        let dashboard = Dashboard::new(
            session.clone(),
            task_gateway.clone(),
            directory_gateway.clone(),
            confirm.clone(),
        )
        .with_team_size(settings.team_size);

        let exit = drive(&dashboard, &reader).await;
        dashboard.sign_out().await;
        match exit? {
            Exit::Logout => println!("Signed out."),
            Exit::Quit => return Ok(()),
        }
    }
}

/// Returns the signed-in username, or `None` when input runs out.
async fn sign_in(
    session: &SessionGuard,
    reader: &StdinReader,
    preset: Option<Credentials>,
) -> Result<Option<String>> {
    if let Some(credentials) = preset {
        if session.attempt(&credentials).await {
            return Ok(Some(credentials.username));
        }
        println!("{INVALID_CREDENTIALS_MESSAGE}");
    }

    loop {
        let Some(username) = reader.read_line("Username: ").await? else {
            return Ok(None);
        };
        let Some(password) = reader.read_line("Password: ").await? else {
            return Ok(None);
        };
        let credentials = Credentials::new(username, password);
        if session.attempt(&credentials).await {
            return Ok(Some(credentials.username));
        }
        println!("{INVALID_CREDENTIALS_MESSAGE}");
    }
}

async fn drive(dashboard: &Dashboard, reader: &StdinReader) -> Result<Exit> {
    dashboard.mount().await?;
    println!("{}", render::task_board(&dashboard.tasks().snapshot().await));
    println!(
        "{}",
        render::team_panel(&dashboard.directory().snapshot().await, SIDEBAR_LIMIT)
    );
    println!("Type `help` for commands.");

    let mut shown: Option<Notification> = None;
    loop {
        dashboard.tasks().expire_notification(Utc::now()).await;
        let Some(line) = reader.read_line("> ").await? else {
            return Ok(Exit::Quit);
        };
        let command = match repl::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(usage) => {
                println!("{usage}");
                continue;
            }
        };
        if let Some(exit) = execute(dashboard, command).await {
            return Ok(exit);
        }

        let current = dashboard.tasks().notification().await;
        if let Some(notification) = &current {
            if shown.as_ref() != Some(notification) {
                println!("{}", render::notification(notification));
            }
        }
        shown = current;
    }
}

async fn execute(dashboard: &Dashboard, command: Command) -> Option<Exit> {
    let tasks = dashboard.tasks();
    match command {
        Command::List => println!("{}", render::task_board(&tasks.snapshot().await)),
        Command::Add { title, description } => {
            tasks.open_editor(None).await;
            let form = TaskForm::new(title.join(" "))
                .with_description(description.unwrap_or_default());
            save_editor(dashboard, form).await;
        }
        Command::Edit {
            id,
            title,
            description,
            completed,
        } => {
            let Some(task) = tasks.task(TaskId(id)).await else {
                println!("No task with id {id}.");
                return None;
            };
            tasks.open_editor(Some(&task)).await;
            let mut form = TaskForm::from_task(&task);
            if let Some(title) = title {
                form.title = title;
            }
            if let Some(description) = description {
                form.description = description;
            }
            if let Some(completed) = completed {
                form.completed = completed;
            }
            save_editor(dashboard, form).await;
        }
        Command::Toggle { id } => match tasks.task(TaskId(id)).await {
            Some(task) => {
                if let Err(err) = tasks.toggle_status(&task).await {
                    report(&err);
                }
            }
            None => println!("No task with id {id}."),
        },
        Command::Delete { id } => match tasks.remove(TaskId(id)).await {
            Ok(RemovalOutcome::Removed) => {}
            Ok(RemovalOutcome::Declined) => println!("Kept task {id}."),
            Err(err) => report(&err),
        },
        Command::Sort => {
            tasks.toggle_sort().await;
            println!("{}", render::task_board(&tasks.snapshot().await));
        }
        Command::Retry => {
            if let Err(err) = tasks.retry().await {
                report(&err);
            }
            println!("{}", render::task_board(&tasks.snapshot().await));
        }
        Command::Team { all, refresh } => {
            let directory = dashboard.directory();
            if refresh {
                if let Err(err) = directory.fetch_all(dashboard.team_size()).await {
                    report(&err);
                }
            }
            let state = directory.snapshot().await;
            let limit = if all { state.members.len() } else { SIDEBAR_LIMIT };
            println!("{}", render::team_panel(&state, limit));
        }
        Command::Dismiss => tasks.dismiss_notification().await,
        Command::Logout => return Some(Exit::Logout),
        Command::Quit => return Some(Exit::Quit),
    }
    None
}

/// Fills the open editor with `form` and submits it. The terminal has no
/// lingering form, so a failed save closes the editor too.
async fn save_editor(dashboard: &Dashboard, form: TaskForm) {
    let tasks = dashboard.tasks();
    let filled = tasks.edit_form(|slot| *slot = form).await;
    let saved = match filled {
        Ok(()) => tasks.submit_editor().await,
        Err(err) => Err(err),
    };
    match saved {
        Ok(task) => println!("{}", render::task_line(&task)),
        Err(err) => {
            report(&err);
            tasks.close_editor().await;
        }
    }
}

/// Errors already surfaced through a notification or error slot are only logged.
fn report(err: &SyncError) {
    match err {
        SyncError::Gateway(_) | SyncError::Validation(_) | SyncError::MutationInFlight(_) => {
            debug!("command failed: {err}");
        }
        SyncError::Cancelled(_) => {}
        other => println!("{other}"),
    }
}
