use std::{collections::HashMap, fs};

use dashboard_core::{DEFAULT_DIRECTORY_API_URL, DEFAULT_TASK_API_URL, DEFAULT_TEAM_SIZE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub task_api_url: String,
    pub directory_api_url: String,
    pub team_size: usize,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            task_api_url: DEFAULT_TASK_API_URL.into(),
            directory_api_url: DEFAULT_DIRECTORY_API_URL.into(),
            team_size: DEFAULT_TEAM_SIZE,
            log_filter: "info".into(),
        }
    }
}

/// Values given on the command line; they win over file and environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub task_api_url: Option<String>,
    pub directory_api_url: Option<String>,
    pub team_size: Option<usize>,
    pub log_filter: Option<String>,
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("dashboard.toml") {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings
}

impl Settings {
    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(v) = overrides.task_api_url {
            self.task_api_url = v;
        }
        if let Some(v) = overrides.directory_api_url {
            self.directory_api_url = v;
        }
        if let Some(v) = overrides.team_size.filter(|size| *size > 0) {
            self.team_size = v;
        }
        if let Some(v) = overrides.log_filter {
            self.log_filter = v;
        }
    }
}

fn parse_team_size(raw: &str) -> Option<usize> {
    raw.trim().parse().ok().filter(|size| *size > 0)
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
        return;
    };
    if let Some(v) = file_cfg.get("task_api_url") {
        settings.task_api_url = v.clone();
    }
    if let Some(v) = file_cfg.get("directory_api_url") {
        settings.directory_api_url = v.clone();
    }
    if let Some(v) = file_cfg.get("team_size").and_then(|v| parse_team_size(v)) {
        settings.team_size = v;
    }
    if let Some(v) = file_cfg.get("log") {
        settings.log_filter = v.clone();
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("TASKBOARD_TASK_API_URL") {
        settings.task_api_url = v;
    }
    if let Some(v) = var("APP__TASK_API_URL") {
        settings.task_api_url = v;
    }

    if let Some(v) = var("TASKBOARD_DIRECTORY_API_URL") {
        settings.directory_api_url = v;
    }
    if let Some(v) = var("APP__DIRECTORY_API_URL") {
        settings.directory_api_url = v;
    }

    if let Some(v) = var("TASKBOARD_TEAM_SIZE").and_then(|v| parse_team_size(&v)) {
        settings.team_size = v;
    }
    if let Some(v) = var("TASKBOARD_LOG") {
        settings.log_filter = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
