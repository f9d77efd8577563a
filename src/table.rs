use crate::columns::{ColumnDescriptor, ColumnOptions, build_columns};
use crate::links::LinkFactory;
use crate::model::{MetricRecord, NamespaceScope, ResourceKind, Row};
use crate::rows::normalize;
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TableOptions {
    pub resource: ResourceKind,
    pub show_namespace_column: bool,
    pub show_name: bool,
    pub selected_namespace: NamespaceScope,
    pub is_tcp_table: bool,
    pub grafana_base_url: String,
    pub jaeger_base_url: String,
}

impl TableOptions {
    pub fn new(resource: ResourceKind, selected_namespace: NamespaceScope) -> Self {
        Self {
            resource,
            show_namespace_column: true,
            show_name: true,
            selected_namespace,
            is_tcp_table: false,
            grafana_base_url: String::new(),
            jaeger_base_url: String::new(),
        }
    }

    pub fn effective_namespace_column(&self) -> bool {
        if matches!(self.resource, ResourceKind::Namespace) || !self.selected_namespace.is_all() {
            return false;
        }
        self.show_namespace_column
    }

    pub fn effective_name_column(&self) -> bool {
        match self.resource {
            ResourceKind::TrafficSplit => self.show_name,
            _ => true,
        }
    }

    pub fn default_sort_key(&self) -> &'static str {
        if matches!(self.resource, ResourceKind::TrafficSplit) && !self.effective_name_column() {
            "leaf"
        } else {
            "name"
        }
    }

    fn column_options(&self) -> ColumnOptions {
        ColumnOptions {
            show_namespace_column: self.effective_namespace_column(),
            show_name_column: self.effective_name_column(),
            is_tcp_table: self.is_tcp_table,
            grafana_base_url: self.grafana_base_url.clone(),
            jaeger_base_url: self.jaeger_base_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct SortSpec {
    pub key: Option<String>,
    pub direction: SortDirection,
}

#[derive(Debug, Clone)]
pub struct TableSpec {
    pub rows: Vec<Row>,
    pub columns: Vec<ColumnDescriptor>,
    pub default_sort_key: &'static str,
}

impl TableSpec {
    pub fn column(&self, key: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|column| column.key == key)
    }

    // Unknown or unsortable sort keys keep input order.
    pub fn visible_rows(&self, filter: &str, sort: &SortSpec) -> Vec<&Row> {
        let query = filter.trim().to_ascii_lowercase();
        let mut rows = self
            .rows
            .iter()
            .filter(|row| query.is_empty() || self.row_matches(row, &query))
            .collect::<Vec<_>>();

        let key = sort.key.as_deref().unwrap_or(self.default_sort_key);
        if let Some(column) = self.column(key)
            && column.is_sortable()
        {
            rows.sort_by(|left, right| {
                sort.direction
                    .apply(column.sort_key(left).cmp(&column.sort_key(right)))
            });
        }

        rows
    }

    fn row_matches(&self, row: &Row, query: &str) -> bool {
        self.columns.iter().any(|column| {
            column
                .filter_value(row)
                .is_some_and(|value| value.to_ascii_lowercase().contains(query))
        })
    }
}

impl SortDirection {
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

pub fn render(
    metrics: &[MetricRecord],
    options: &TableOptions,
    links: &Arc<dyn LinkFactory>,
) -> TableSpec {
    let columns = build_columns(&options.resource, &options.column_options(), links);
    let rows = normalize(metrics);

    TableSpec {
        rows,
        columns,
        default_sort_key: options.default_sort_key(),
    }
}

#[cfg(test)]
mod tests {
    use super::{SortDirection, SortSpec, TableOptions, render};
    use crate::links::{LinkFactory, PrefixedLinks};
    use crate::model::{MetricRecord, NamespaceScope, ResourceKind};
    use serde_json::json;
    use std::sync::Arc;

    fn links() -> Arc<dyn LinkFactory> {
        Arc::new(PrefixedLinks::default())
    }

    fn records(value: serde_json::Value) -> Vec<MetricRecord> {
        serde_json::from_value(value).unwrap()
    }

    fn titles(options: &TableOptions) -> Vec<String> {
        render(&[], options, &links())
            .columns
            .into_iter()
            .map(|column| column.title)
            .collect()
    }

    #[test]
    fn namespace_kind_suppresses_namespace_column() {
        let mut options = TableOptions::new(ResourceKind::Namespace, NamespaceScope::All);
        options.show_namespace_column = true;

        assert!(!options.effective_namespace_column());
        assert_eq!(titles(&options).first().map(String::as_str), Some("Namespace"));
        assert_eq!(titles(&options).get(1).map(String::as_str), Some("Meshed"));
    }

    #[test]
    fn single_namespace_selection_suppresses_namespace_column() {
        let options = TableOptions::new(
            ResourceKind::from_token("deployment"),
            NamespaceScope::Named("emojivoto".to_string()),
        );

        assert!(!options.effective_namespace_column());
        assert_eq!(titles(&options)[0], "Deployment");
    }

    #[test]
    fn all_namespaces_follows_caller_flag() {
        let mut options = TableOptions::new(ResourceKind::from_token("deployment"), NamespaceScope::All);
        assert!(options.effective_namespace_column());
        assert_eq!(titles(&options)[0], "Namespace");

        options.show_namespace_column = false;
        assert!(!options.effective_namespace_column());
    }

    #[test]
    fn name_column_only_optional_for_traffic_splits() {
        let mut options = TableOptions::new(ResourceKind::from_token("pod"), NamespaceScope::All);
        options.show_name = false;
        assert!(options.effective_name_column());
        assert_eq!(options.default_sort_key(), "name");

        let mut split = TableOptions::new(ResourceKind::TrafficSplit, NamespaceScope::All);
        split.show_name = false;
        assert!(!split.effective_name_column());
        assert_eq!(split.default_sort_key(), "leaf");

        split.show_name = true;
        assert_eq!(split.default_sort_key(), "name");
    }

    #[test]
    fn render_combines_columns_rows_and_sort_key() {
        let metrics = records(json!([
            {"name": "web", "namespace": "emojivoto", "type": "deployment", "latency": {"P50": 3.0}},
            {"name": "emoji", "namespace": "emojivoto", "type": "deployment"}
        ]));
        let options = TableOptions::new(ResourceKind::from_token("deployment"), NamespaceScope::All);

        let spec = render(&metrics, &options, &links());
        assert_eq!(spec.rows.len(), 2);
        assert_eq!(spec.rows[0].quantile("P50"), Some(3.0));
        assert_eq!(spec.default_sort_key, "name");
        assert_eq!(spec.columns.len(), 8);
        assert!(spec.column("name").is_some());
    }

    #[test]
    fn visible_rows_sort_by_default_key_and_filter() {
        let metrics = records(json!([
            {"name": "web", "namespace": "emojivoto", "type": "deployment"},
            {"name": "emoji", "namespace": "emojivoto", "type": "deployment"},
            {"name": "prometheus", "namespace": "linkerd", "type": "deployment"}
        ]));
        let options = TableOptions::new(ResourceKind::from_token("deployment"), NamespaceScope::All);
        let spec = render(&metrics, &options, &links());

        let names = |rows: Vec<&crate::model::Row>| {
            rows.into_iter()
                .map(|row| row.record.name.clone())
                .collect::<Vec<_>>()
        };

        assert_eq!(
            names(spec.visible_rows("", &SortSpec::default())),
            vec!["emoji", "prometheus", "web"]
        );
        assert_eq!(
            names(spec.visible_rows("EMOJIVOTO", &SortSpec::default())),
            vec!["emoji", "web"]
        );
        assert_eq!(
            names(spec.visible_rows(
                "",
                &SortSpec {
                    key: Some("name".to_string()),
                    direction: SortDirection::Descending,
                }
            )),
            vec!["web", "prometheus", "emoji"]
        );
        assert_eq!(
            names(spec.visible_rows(
                "",
                &SortSpec {
                    key: Some("unknown".to_string()),
                    direction: SortDirection::Ascending,
                }
            )),
            vec!["web", "emoji", "prometheus"]
        );
    }

    #[test]
    fn traffic_split_rows_sort_by_weight_total_order() {
        let metrics = records(json!([
            {"name": "a", "type": "trafficsplit", "tsStats": {"apex": "web", "leaf": "web-v1", "weight": "100"}},
            {"name": "b", "type": "trafficsplit"},
            {"name": "c", "type": "trafficsplit", "tsStats": {"apex": "web", "leaf": "web-v2", "weight": "primary"}},
            {"name": "d", "type": "trafficsplit", "tsStats": {"apex": "web", "leaf": "web-v3", "weight": 20}}
        ]));
        let mut options = TableOptions::new(ResourceKind::TrafficSplit, NamespaceScope::All);
        options.show_name = false;
        let spec = render(&metrics, &options, &links());

        let order = spec
            .visible_rows(
                "",
                &SortSpec {
                    key: Some("weight".to_string()),
                    direction: SortDirection::Ascending,
                },
            )
            .into_iter()
            .map(|row| row.record.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(order, vec!["b", "c", "d", "a"]);

        let by_leaf = spec
            .visible_rows("", &SortSpec::default())
            .into_iter()
            .map(|row| row.record.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(by_leaf, vec!["b", "a", "c", "d"]);
    }
}
