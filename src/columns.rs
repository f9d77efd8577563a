use crate::format::{
    PLACEHOLDER, format_byte_rate, format_count, format_latency, format_success_rate,
};
use crate::links::{DashboardTarget, Link, LinkFactory, grafana_link, jaeger_link};
use crate::model::{ErrorMap, ResourceKind, Row, TcpStats, TrafficSplitStats, Weight};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::debug;

pub type RenderFn = Arc<dyn Fn(&Row) -> Cell + Send + Sync>;
pub type SortFn = Arc<dyn Fn(&Row) -> SortKey + Send + Sync>;
pub type FilterFn = Arc<dyn Fn(&Row) -> Option<String> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorIndicator {
    pub resource_name: String,
    pub resource_type: String,
    pub errors: ErrorMap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Cell {
    Empty,
    Text { text: String },
    Link(Link),
    SuccessRate { value: Option<f64> },
    Flagged {
        content: Box<Cell>,
        errors: ErrorIndicator,
    },
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn plain_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text { text } => text.clone(),
            Self::Link(link) => link.label.clone(),
            Self::SuccessRate { value } => format_success_rate(*value),
            Self::Flagged { content, .. } => format!("{} (!)", content.plain_text()),
        }
    }
}

// Ordered Missing < Text < Number.
#[derive(Debug, Clone)]
pub enum SortKey {
    Missing,
    Text(String),
    Number(f64),
}

impl SortKey {
    fn rank(&self) -> u8 {
        match self {
            Self::Missing => 0,
            Self::Text(_) => 1,
            Self::Number(_) => 2,
        }
    }
}

impl From<Option<f64>> for SortKey {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Missing, Self::Number)
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(left), Self::Text(right)) => left.cmp(right),
            (Self::Number(left), Self::Number(right)) => left.total_cmp(right),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}

#[derive(Clone)]
pub struct ColumnDescriptor {
    pub title: String,
    pub key: &'static str,
    pub data_index: Option<&'static str>,
    pub is_numeric: bool,
    render: RenderFn,
    sorter: Option<SortFn>,
    filter: Option<FilterFn>,
}

impl ColumnDescriptor {
    pub fn render(&self, row: &Row) -> Cell {
        (self.render)(row)
    }

    pub fn sort_key(&self, row: &Row) -> Option<SortKey> {
        self.sorter.as_ref().map(|sorter| sorter(row))
    }

    pub fn filter_value(&self, row: &Row) -> Option<String> {
        self.filter.as_ref().and_then(|filter| filter(row))
    }

    pub fn is_sortable(&self) -> bool {
        self.sorter.is_some()
    }
}

impl Debug for ColumnDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("title", &self.title)
            .field("key", &self.key)
            .field("data_index", &self.data_index)
            .field("is_numeric", &self.is_numeric)
            .field("sortable", &self.sorter.is_some())
            .field("filterable", &self.filter.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ColumnOptions {
    pub show_namespace_column: bool,
    pub show_name_column: bool,
    pub is_tcp_table: bool,
    pub grafana_base_url: String,
    pub jaeger_base_url: String,
}

struct StatColumn {
    title: &'static str,
    data_index: &'static str,
    render: fn(&Row) -> Cell,
    sorter: fn(&Row) -> SortKey,
}

impl StatColumn {
    fn descriptor(&self) -> ColumnDescriptor {
        ColumnDescriptor {
            title: self.title.to_string(),
            key: self.data_index,
            data_index: Some(self.data_index),
            is_numeric: true,
            render: Arc::new(self.render),
            sorter: Some(Arc::new(self.sorter)),
            filter: None,
        }
    }
}

static TCP_STAT_COLUMNS: [StatColumn; 3] = [
    StatColumn {
        title: "Connections",
        data_index: "tcp.openConnections",
        render: render_open_connections,
        sorter: sort_open_connections,
    },
    StatColumn {
        title: "Read Bytes / sec",
        data_index: "tcp.readRate",
        render: render_read_rate,
        sorter: sort_read_rate,
    },
    StatColumn {
        title: "Write Bytes / sec",
        data_index: "tcp.writeRate",
        render: render_write_rate,
        sorter: sort_write_rate,
    },
];

static HTTP_STAT_COLUMNS: [StatColumn; 5] = [
    StatColumn {
        title: "Success Rate",
        data_index: "successRate",
        render: render_success_rate,
        sorter: sort_success_rate,
    },
    StatColumn {
        title: "RPS",
        data_index: "requestRate",
        render: render_request_rate,
        sorter: sort_request_rate,
    },
    StatColumn {
        title: "P50 Latency",
        data_index: "P50",
        render: render_p50,
        sorter: sort_p50,
    },
    StatColumn {
        title: "P95 Latency",
        data_index: "P95",
        render: render_p95,
        sorter: sort_p95,
    },
    StatColumn {
        title: "P99 Latency",
        data_index: "P99",
        render: render_p99,
        sorter: sort_p99,
    },
];

fn tcp_value(row: &Row, pick: fn(&TcpStats) -> Option<f64>) -> Option<f64> {
    row.record.tcp.as_ref().and_then(pick)
}

fn render_open_connections(row: &Row) -> Cell {
    Cell::text(format_count(tcp_value(row, |tcp| tcp.open_connections)))
}

fn sort_open_connections(row: &Row) -> SortKey {
    tcp_value(row, |tcp| tcp.open_connections).into()
}

fn render_read_rate(row: &Row) -> Cell {
    Cell::text(format_byte_rate(tcp_value(row, |tcp| tcp.read_rate)))
}

fn sort_read_rate(row: &Row) -> SortKey {
    tcp_value(row, |tcp| tcp.read_rate).into()
}

fn render_write_rate(row: &Row) -> Cell {
    Cell::text(format_byte_rate(tcp_value(row, |tcp| tcp.write_rate)))
}

fn sort_write_rate(row: &Row) -> SortKey {
    tcp_value(row, |tcp| tcp.write_rate).into()
}

fn render_success_rate(row: &Row) -> Cell {
    Cell::SuccessRate {
        value: row.record.success_rate,
    }
}

fn sort_success_rate(row: &Row) -> SortKey {
    row.record.success_rate.into()
}

fn render_request_rate(row: &Row) -> Cell {
    Cell::text(format_count(row.record.request_rate))
}

fn sort_request_rate(row: &Row) -> SortKey {
    row.record.request_rate.into()
}

fn render_p50(row: &Row) -> Cell {
    Cell::text(format_latency(row.quantile("P50")))
}

fn sort_p50(row: &Row) -> SortKey {
    row.quantile("P50").into()
}

fn render_p95(row: &Row) -> Cell {
    Cell::text(format_latency(row.quantile("P95")))
}

fn sort_p95(row: &Row) -> SortKey {
    row.quantile("P95").into()
}

fn render_p99(row: &Row) -> Cell {
    Cell::text(format_latency(row.quantile("P99")))
}

fn sort_p99(row: &Row) -> SortKey {
    row.quantile("P99").into()
}

pub fn weight_sort_key(weight: Option<&Weight>) -> SortKey {
    match weight {
        None => SortKey::Missing,
        Some(Weight::Number(value)) => SortKey::Number(value.trunc()),
        Some(Weight::Text(text)) => match leading_integer(text) {
            Some(value) => SortKey::Number(value),
            None => SortKey::Text(text.clone()),
        },
    }
}

fn leading_integer(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, text.strip_prefix('+').unwrap_or(text)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<f64>().ok().map(|value| sign * value)
}

fn namespace_column(links: &Arc<dyn LinkFactory>) -> ColumnDescriptor {
    let links = Arc::clone(links);
    ColumnDescriptor {
        title: "Namespace".to_string(),
        key: "namespace",
        data_index: Some("namespace"),
        is_numeric: false,
        render: Arc::new(move |row: &Row| match row.record.namespace.as_deref() {
            None | Some("") => Cell::text(PLACEHOLDER),
            Some(namespace) => {
                Cell::Link(links.link(&format!("/namespaces/{namespace}"), namespace))
            }
        }),
        sorter: Some(Arc::new(|row: &Row| match row.record.namespace.as_deref() {
            None | Some("") => SortKey::Text(PLACEHOLDER.to_string()),
            Some(namespace) => SortKey::Text(namespace.to_string()),
        })),
        filter: Some(Arc::new(|row: &Row| row.record.namespace.clone())),
    }
}

fn meshed_column() -> ColumnDescriptor {
    ColumnDescriptor {
        title: "Meshed".to_string(),
        key: "pods.totalPods",
        data_index: Some("pods.totalPods"),
        is_numeric: true,
        render: Arc::new(|row: &Row| match row.record.pods {
            Some(pods) => Cell::text(format!("{}/{}", pods.meshed_pods, pods.total_pods)),
            None => Cell::Empty,
        }),
        sorter: Some(Arc::new(|row: &Row| match row.record.pods {
            Some(pods) => SortKey::Number(pods.total_pods as f64),
            None => SortKey::Missing,
        })),
        filter: None,
    }
}

fn display_name(kind: &ResourceKind, row: &Row) -> String {
    match kind {
        ResourceKind::MultiResource => {
            let row_kind = row.record.resource_kind();
            format!("{}/{}", row_kind.short_name(), row.record.name)
        }
        _ => row.record.name.clone(),
    }
}

fn name_column(kind: &ResourceKind, links: &Arc<dyn LinkFactory>) -> ColumnDescriptor {
    let render_kind = kind.clone();
    let sort_kind = kind.clone();
    let links = Arc::clone(links);

    ColumnDescriptor {
        title: kind.singular_title(),
        key: "name",
        data_index: Some("name"),
        is_numeric: false,
        render: Arc::new(move |row: &Row| {
            let record = &row.record;
            let label = display_name(&render_kind, row);
            let content = match &render_kind {
                ResourceKind::Namespace => {
                    Cell::Link(links.link(&format!("/namespaces/{}", record.name), &label))
                }
                ResourceKind::TrafficSplit => Cell::Link(links.link(&resource_path(row), &label)),
                _ if !record.added => Cell::text(label),
                _ => Cell::Link(links.link(&resource_path(row), &label)),
            };

            if record.has_errors() {
                Cell::Flagged {
                    content: Box::new(content),
                    errors: ErrorIndicator {
                        resource_name: record.name.clone(),
                        resource_type: record.kind.clone(),
                        errors: record.errors.clone(),
                    },
                }
            } else {
                content
            }
        }),
        sorter: Some(Arc::new(move |row: &Row| {
            let label = display_name(&sort_kind, row);
            if label.is_empty() {
                SortKey::Missing
            } else {
                SortKey::Text(label)
            }
        })),
        filter: Some(Arc::new(|row: &Row| Some(row.record.name.clone()))),
    }
}

fn resource_path(row: &Row) -> String {
    let record = &row.record;
    format!(
        "/namespaces/{}/{}s/{}",
        record.namespace.as_deref().unwrap_or_default(),
        record.kind,
        record.name
    )
}

fn traffic_split_columns() -> [ColumnDescriptor; 3] {
    fn text_column(
        title: &str,
        key: &'static str,
        pick: fn(&TrafficSplitStats) -> String,
    ) -> ColumnDescriptor {
        ColumnDescriptor {
            title: title.to_string(),
            key,
            data_index: Some(key),
            is_numeric: false,
            render: Arc::new(move |row: &Row| match &row.record.ts_stats {
                Some(stats) => Cell::text(pick(stats)),
                None => Cell::Empty,
            }),
            sorter: Some(Arc::new(move |row: &Row| match &row.record.ts_stats {
                Some(stats) => SortKey::Text(pick(stats)),
                None => SortKey::Missing,
            })),
            filter: Some(Arc::new(move |row: &Row| {
                row.record.ts_stats.as_ref().map(pick)
            })),
        }
    }

    let weight = ColumnDescriptor {
        title: "Weight".to_string(),
        key: "weight",
        data_index: Some("weight"),
        is_numeric: true,
        render: Arc::new(|row: &Row| match &row.record.ts_stats {
            Some(stats) => Cell::text(stats.weight.to_string()),
            None => Cell::Empty,
        }),
        sorter: Some(Arc::new(|row: &Row| {
            weight_sort_key(row.record.ts_stats.as_ref().map(|stats| &stats.weight))
        })),
        filter: Some(Arc::new(|row: &Row| {
            row.record
                .ts_stats
                .as_ref()
                .map(|stats| stats.weight.to_string())
        })),
    };

    [
        text_column("Apex Service", "apex", |stats| stats.apex.clone()),
        text_column("Leaf Service", "leaf", |stats| stats.leaf.clone()),
        weight,
    ]
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Dashboard {
    Grafana,
    Jaeger,
}

fn dashboard_column(
    dashboard: Dashboard,
    kind: &ResourceKind,
    base_url: &str,
    links: &Arc<dyn LinkFactory>,
) -> ColumnDescriptor {
    let is_authority = matches!(kind, ResourceKind::Authority);
    let base_url = base_url.to_string();
    let links = Arc::clone(links);
    let (title, key) = match dashboard {
        Dashboard::Grafana => ("Grafana", "grafanaDashboard"),
        Dashboard::Jaeger => ("Jaeger", "JaegerDashboard"),
    };

    ColumnDescriptor {
        title: title.to_string(),
        key,
        data_index: None,
        is_numeric: true,
        render: Arc::new(move |row: &Row| {
            let record = &row.record;
            let has_no_pods = record.pods.is_some_and(|pods| pods.total_pods == 0);
            if !is_authority && (!record.added || has_no_pods) {
                return Cell::Empty;
            }

            let target = DashboardTarget {
                name: &record.name,
                namespace: record.namespace.as_deref(),
                resource_kind: &record.kind,
            };
            let link = match dashboard {
                Dashboard::Grafana => grafana_link(&base_url, &target, links.as_ref()),
                Dashboard::Jaeger => jaeger_link(&base_url, &target, links.as_ref()),
            };
            Cell::Link(link)
        }),
        sorter: None,
        filter: None,
    }
}

fn shows_traffic_split_detail(kind: &ResourceKind) -> bool {
    matches!(kind, ResourceKind::TrafficSplit)
}

fn shows_meshed_column(kind: &ResourceKind) -> bool {
    !matches!(kind, ResourceKind::Authority | ResourceKind::TrafficSplit)
}

fn shows_dashboard_links(kind: &ResourceKind) -> bool {
    !matches!(kind, ResourceKind::TrafficSplit)
}

fn shows_namespace_column(kind: &ResourceKind, options: &ColumnOptions) -> bool {
    options.show_namespace_column && !matches!(kind, ResourceKind::Namespace)
}

pub fn build_columns(
    kind: &ResourceKind,
    options: &ColumnOptions,
    links: &Arc<dyn LinkFactory>,
) -> Vec<ColumnDescriptor> {
    let mut columns = Vec::new();

    if options.show_name_column {
        columns.push(name_column(kind, links));
    }

    if shows_traffic_split_detail(kind) {
        columns.extend(traffic_split_columns());
    }

    let stat_columns: &[StatColumn] = if options.is_tcp_table {
        &TCP_STAT_COLUMNS
    } else {
        &HTTP_STAT_COLUMNS
    };
    columns.extend(stat_columns.iter().map(StatColumn::descriptor));

    if shows_meshed_column(kind) {
        // Second column overall, even when there is no name column.
        columns.insert(1.min(columns.len()), meshed_column());
    }

    if shows_dashboard_links(kind) {
        if !options.grafana_base_url.is_empty() {
            columns.push(dashboard_column(
                Dashboard::Grafana,
                kind,
                &options.grafana_base_url,
                links,
            ));
        }
        if !options.jaeger_base_url.is_empty() {
            columns.push(dashboard_column(
                Dashboard::Jaeger,
                kind,
                &options.jaeger_base_url,
                links,
            ));
        }
    }

    if shows_namespace_column(kind, options) {
        columns.insert(0, namespace_column(links));
    }

    debug!(
        "built {} columns for {kind} (tcp={})",
        columns.len(),
        options.is_tcp_table
    );
    columns
}
