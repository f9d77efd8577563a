mod cli;
mod columns;
mod config;
mod format;
mod links;
mod model;
mod rows;
mod snapshot;
mod table;
mod ui;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use cli::{CliArgs, OutputFormat};
use config::RuntimeConfig;
use links::{LinkFactory, PrefixedLinks};
use model::{NamespaceScope, ResourceKind};
use std::io::IsTerminal;
use std::sync::Arc;
use table::{SortDirection, SortSpec, TableOptions};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_RESOURCE: &str = "deployment";
const LOG_ENV: &str = "MESHTAB_LOG";

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_filter)?;

    let config = config::load(args.config.as_deref())?;
    if let Some(source) = &config.source {
        debug!("loaded config from {source}");
    }
    if args.all_namespaces && args.namespace.is_some() {
        warn!("both --all-namespaces and --namespace were provided, using all namespaces");
    }

    let snapshot = snapshot::load(&args.snapshot)?;
    debug!(
        "loaded {} metric records from {}",
        snapshot.metrics.len(),
        args.snapshot
    );

    let options = table_options(&args, &config);
    let links: Arc<dyn LinkFactory> = Arc::new(PrefixedLinks::new(
        args.path_prefix
            .clone()
            .unwrap_or_else(|| config.path_prefix.clone()),
    ));
    let spec = table::render(&snapshot.metrics, &options, &links);

    let sort = SortSpec {
        key: args.sort.clone(),
        direction: if args.desc {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        },
    };
    if let Some(key) = &sort.key
        && spec.column(key).is_none()
    {
        warn!("no column with key {key:?}, keeping snapshot order");
    }
    let rows = spec.visible_rows(&args.filter, &sort);

    match args.output {
        OutputFormat::Table => {
            let title = ui::table_title(&options.resource, rows.len(), snapshot.generated_at);
            let color = !args.no_color && std::io::stdout().is_terminal();
            ui::draw(&spec, &rows, &title, color).context("failed to write table")?;
        }
        OutputFormat::Json => {
            let view = ui::json_view(&spec, &rows);
            let rendered =
                serde_json::to_string_pretty(&view).context("failed to encode table as json")?;
            println!("{rendered}");
        }
    }

    Ok(())
}

fn init_tracing(flag: &str) -> Result<()> {
    let filter = log_filter(flag, std::env::var(LOG_ENV).ok())?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .compact()
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!("failed to install tracing subscriber: {error}"))
}

fn log_filter(flag: &str, env: Option<String>) -> Result<EnvFilter> {
    match env.filter(|directives| !directives.trim().is_empty()) {
        Some(directives) => EnvFilter::try_new(&directives)
            .with_context(|| format!("invalid {LOG_ENV} filter {directives:?}")),
        None => EnvFilter::try_new(flag)
            .with_context(|| format!("invalid --log-filter {flag:?}")),
    }
}

fn resolve_namespace_scope(args: &CliArgs, config: &RuntimeConfig) -> NamespaceScope {
    if args.all_namespaces {
        NamespaceScope::All
    } else if let Some(namespace) = &args.namespace {
        NamespaceScope::from_selection(namespace)
    } else if let Some(namespace) = &config.namespace {
        NamespaceScope::from_selection(namespace)
    } else {
        NamespaceScope::All
    }
}

fn table_options(args: &CliArgs, config: &RuntimeConfig) -> TableOptions {
    let resource = args
        .resource
        .as_deref()
        .or(config.resource.as_deref())
        .unwrap_or(DEFAULT_RESOURCE);

    let mut options = TableOptions::new(
        ResourceKind::from_token(resource),
        resolve_namespace_scope(args, config),
    );
    options.show_namespace_column = !args.hide_namespace_column;
    options.show_name = !args.hide_name;
    options.is_tcp_table = args.tcp;
    options.grafana_base_url = args
        .grafana
        .clone()
        .unwrap_or_else(|| config.grafana_url.clone());
    options.jaeger_base_url = args
        .jaeger
        .clone()
        .unwrap_or_else(|| config.jaeger_url.clone());
    options
}

#[cfg(test)]
mod tests {
    use super::{log_filter, resolve_namespace_scope, table_options};
    use crate::cli::CliArgs;
    use crate::config::RuntimeConfig;
    use crate::model::{NamespaceScope, ResourceKind};
    use clap::Parser;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn flags_override_config_values() {
        let config = RuntimeConfig {
            grafana_url: "https://grafana.config".to_string(),
            jaeger_url: "https://jaeger.config".to_string(),
            namespace: Some("linkerd".to_string()),
            resource: Some("pod".to_string()),
            ..RuntimeConfig::default()
        };
        let args = CliArgs::parse_from([
            "meshtab",
            "-r",
            "authority",
            "-n",
            "emojivoto",
            "--grafana",
            "https://grafana.flag",
        ]);

        let options = table_options(&args, &config);
        assert_eq!(options.resource, ResourceKind::Authority);
        assert_eq!(
            options.selected_namespace,
            NamespaceScope::Named("emojivoto".to_string())
        );
        assert_eq!(options.grafana_base_url, "https://grafana.flag");
        assert_eq!(options.jaeger_base_url, "https://jaeger.config");
    }

    #[test]
    fn config_fills_missing_flags() {
        let config = RuntimeConfig {
            namespace: Some("linkerd".to_string()),
            resource: Some("pod".to_string()),
            ..RuntimeConfig::default()
        };
        let args = CliArgs::parse_from(["meshtab", "--tcp", "--hide-namespace-column"]);

        let options = table_options(&args, &config);
        assert_eq!(options.resource, ResourceKind::from_token("pod"));
        assert_eq!(
            options.selected_namespace,
            NamespaceScope::Named("linkerd".to_string())
        );
        assert!(options.is_tcp_table);
        assert!(!options.show_namespace_column);
        assert!(options.grafana_base_url.is_empty());
    }

    #[test]
    fn all_namespaces_wins_over_named_namespace() {
        let args = CliArgs::parse_from(["meshtab", "-A", "-n", "emojivoto"]);
        assert_eq!(
            resolve_namespace_scope(&args, &RuntimeConfig::default()),
            NamespaceScope::All
        );

        let defaults = CliArgs::parse_from(["meshtab"]);
        let options = table_options(&defaults, &RuntimeConfig::default());
        assert_eq!(options.selected_namespace, NamespaceScope::All);
        assert_eq!(options.resource, ResourceKind::from_token("deployment"));
    }

    #[test]
    fn log_filter_prefers_environment_and_rejects_bad_directives() {
        let from_env = log_filter("warn", Some("meshtab=debug".to_string())).unwrap();
        assert_eq!(from_env.max_level_hint(), Some(LevelFilter::DEBUG));

        let from_flag = log_filter("info", Some("  ".to_string())).unwrap();
        assert_eq!(from_flag.max_level_hint(), Some(LevelFilter::INFO));

        let error = log_filter("meshtab=loud", None).unwrap_err();
        assert!(format!("{error:#}").contains("invalid --log-filter"));
    }
}
