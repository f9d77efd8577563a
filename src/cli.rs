use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "meshtab",
    version,
    about = "Render service-mesh telemetry snapshots as resource tables."
)]
pub struct CliArgs {
    /// Metric snapshot (JSON or YAML); `-` reads stdin
    #[arg(default_value = "-")]
    pub snapshot: String,

    /// Resource kind listed by the table (deployment, pod, authority, trafficsplit, namespace, multi_resource, ...)
    #[arg(short, long)]
    pub resource: Option<String>,

    /// Selected namespace; `_all` shows every namespace
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Select all namespaces
    #[arg(short = 'A', long)]
    pub all_namespaces: bool,

    /// Show TCP connection and byte-rate columns instead of HTTP stats
    #[arg(long)]
    pub tcp: bool,

    /// Hide the namespace column
    #[arg(long)]
    pub hide_namespace_column: bool,

    /// Hide the name column (traffic splits only)
    #[arg(long)]
    pub hide_name: bool,

    /// Grafana base URL; enables the Grafana column
    #[arg(long)]
    pub grafana: Option<String>,

    /// Jaeger base URL; enables the Jaeger column
    #[arg(long)]
    pub jaeger: Option<String>,

    /// Prefix for dashboard navigation links
    #[arg(long)]
    pub path_prefix: Option<String>,

    /// Only show rows whose filterable columns contain this text
    #[arg(short, long, default_value = "")]
    pub filter: String,

    /// Column key to sort by (defaults to the table's default sort key)
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort descending
    #[arg(long)]
    pub desc: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Config file (defaults to MESHTAB_CONFIG or meshtab.yaml discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long, default_value = "warn")]
    pub log_filter: String,
}
