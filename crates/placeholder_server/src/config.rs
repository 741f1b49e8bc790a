use std::fs;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: String,
    pub seed_tasks: usize,
    /// Fixes the generator so catalogs and identities repeat across runs.
    pub rng_seed: Option<u64>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3030".into(),
            seed_tasks: 200,
            rng_seed: None,
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    seed_tasks: Option<usize>,
    rng_seed: Option<u64>,
    log: Option<String>,
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("placeholder.toml") {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<FileSettings>(raw) else {
        return;
    };
    if let Some(v) = file_cfg.bind_addr {
        settings.bind_addr = v;
    }
    if let Some(v) = file_cfg.seed_tasks {
        settings.seed_tasks = v;
    }
    if let Some(v) = file_cfg.rng_seed {
        settings.rng_seed = Some(v);
    }
    if let Some(v) = file_cfg.log {
        settings.log_filter = v;
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("PLACEHOLDER_BIND") {
        settings.bind_addr = v;
    }
    if let Some(v) = var("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }

    if let Some(parsed) = var("PLACEHOLDER_SEED_TASKS").and_then(|v| v.parse().ok()) {
        settings.seed_tasks = parsed;
    }
    if let Some(parsed) = var("PLACEHOLDER_RNG_SEED").and_then(|v| v.parse().ok()) {
        settings.rng_seed = Some(parsed);
    }

    if let Some(v) = var("PLACEHOLDER_LOG") {
        settings.log_filter = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
