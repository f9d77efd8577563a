use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_ENV: &str = "MESHTAB_CONFIG";
const LOCAL_CONFIG_NAMES: [&str; 3] = ["meshtab.yaml", "meshtab.yml", ".meshtab.yaml"];
const HOME_CONFIG_PATHS: [&str; 3] = [
    ".config/meshtab/config.yaml",
    ".config/meshtab/config.yml",
    ".meshtab.yaml",
];

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct RuntimeConfig {
    pub source: Option<String>,
    pub grafana_url: String,
    pub jaeger_url: String,
    pub path_prefix: String,
    pub namespace: Option<String>,
    pub resource: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct MeshtabConfigFile {
    #[serde(default, alias = "grafanaUrl")]
    grafana: String,
    #[serde(default, alias = "jaegerUrl")]
    jaeger: String,
    #[serde(default, alias = "prefix")]
    path_prefix: String,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    resource: Option<String>,
}

pub fn load(explicit: Option<&Path>) -> Result<RuntimeConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config_path(),
    };
    let Some(path) = path else {
        return Ok(RuntimeConfig::default());
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let mut config = parse(&raw)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    config.source = Some(path.display().to_string());
    Ok(config)
}

pub fn parse(raw: &str) -> Result<RuntimeConfig> {
    if raw.trim().is_empty() {
        return Ok(RuntimeConfig::default());
    }

    let parsed: MeshtabConfigFile = serde_yaml::from_str(raw).context("invalid config yaml")?;
    Ok(RuntimeConfig {
        source: None,
        grafana_url: parsed.grafana.trim().to_string(),
        jaeger_url: parsed.jaeger.trim().to_string(),
        path_prefix: parsed.path_prefix.trim().to_string(),
        namespace: non_blank(parsed.namespace),
        resource: non_blank(parsed.resource),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn discover_config_path() -> Option<PathBuf> {
    let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let home = std::env::var_os("HOME").map(PathBuf::from);
    config_candidates(explicit, home.as_deref())
        .into_iter()
        .find(|candidate| candidate.is_file())
}

fn config_candidates(explicit: Option<PathBuf>, home: Option<&Path>) -> Vec<PathBuf> {
    if let Some(path) = explicit.filter(|path| !path.as_os_str().is_empty()) {
        return vec![path];
    }

    let mut candidates = LOCAL_CONFIG_NAMES
        .iter()
        .map(PathBuf::from)
        .collect::<Vec<_>>();
    if let Some(home) = home {
        candidates.extend(HOME_CONFIG_PATHS.iter().map(|relative| home.join(relative)));
    }
    candidates
}
