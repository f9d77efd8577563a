use crate::model::MetricRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub generated_at: Option<DateTime<Utc>>,
    pub metrics: Vec<MetricRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SnapshotFile {
    Bare(Vec<MetricRecord>),
    Envelope {
        #[serde(default, rename = "generatedAt")]
        generated_at: Option<DateTime<Utc>>,
        #[serde(default)]
        metrics: Vec<MetricRecord>,
    },
}

impl From<SnapshotFile> for Snapshot {
    fn from(file: SnapshotFile) -> Self {
        match file {
            SnapshotFile::Bare(metrics) => Self {
                generated_at: None,
                metrics,
            },
            SnapshotFile::Envelope {
                generated_at,
                metrics,
            } => Self {
                generated_at,
                metrics,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum SnapshotFormat {
    Json,
    Yaml,
}

pub fn load(source: &str) -> Result<Snapshot> {
    let (raw, format) = if source == "-" {
        let mut raw = String::new();
        io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read snapshot from stdin")?;
        (raw, SnapshotFormat::Json)
    } else {
        let path = Path::new(source);
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        (raw, format_for(path))
    };

    parse(&raw, format).with_context(|| format!("failed to parse snapshot {source}"))
}

fn format_for(path: &Path) -> SnapshotFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            SnapshotFormat::Yaml
        }
        _ => SnapshotFormat::Json,
    }
}

fn parse(raw: &str, format: SnapshotFormat) -> Result<Snapshot> {
    let file: SnapshotFile = match format {
        SnapshotFormat::Yaml => serde_yaml::from_str(raw).context("invalid snapshot yaml")?,
        SnapshotFormat::Json => match serde_json::from_str(raw) {
            Ok(file) => file,
            Err(json_error) => serde_yaml::from_str(raw)
                .with_context(|| format!("not valid json ({json_error}) nor yaml"))?,
        },
    };
    Ok(file.into())
}
