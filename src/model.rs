use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

pub const ALL_NAMESPACES: &str = "_all";

pub type ErrorMap = BTreeMap<String, Vec<Value>>;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum WorkloadKind {
    CronJob,
    DaemonSet,
    Deployment,
    Job,
    Pod,
    ReplicaSet,
    ReplicationController,
    Service,
    StatefulSet,
}

impl WorkloadKind {
    pub fn token(self) -> &'static str {
        match self {
            Self::CronJob => "cronjob",
            Self::DaemonSet => "daemonset",
            Self::Deployment => "deployment",
            Self::Job => "job",
            Self::Pod => "pod",
            Self::ReplicaSet => "replicaset",
            Self::ReplicationController => "replicationcontroller",
            Self::Service => "service",
            Self::StatefulSet => "statefulset",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::CronJob => "Cron Job",
            Self::DaemonSet => "Daemon Set",
            Self::Deployment => "Deployment",
            Self::Job => "Job",
            Self::Pod => "Pod",
            Self::ReplicaSet => "Replica Set",
            Self::ReplicationController => "Replication Controller",
            Self::Service => "Service",
            Self::StatefulSet => "Stateful Set",
        }
    }

    pub fn short_token(self) -> &'static str {
        match self {
            Self::CronJob => "cj",
            Self::DaemonSet => "ds",
            Self::Deployment => "deploy",
            Self::Job => "job",
            Self::Pod => "po",
            Self::ReplicaSet => "rs",
            Self::ReplicationController => "rc",
            Self::Service => "svc",
            Self::StatefulSet => "sts",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "cj" | "cronjob" | "cronjobs" | "cron-job" | "cron-jobs" => Some(Self::CronJob),
            "ds" | "daemonset" | "daemonsets" | "daemon-set" | "daemon-sets" => {
                Some(Self::DaemonSet)
            }
            "deploy" | "deployment" | "deployments" | "dp" => Some(Self::Deployment),
            "job" | "jobs" => Some(Self::Job),
            "po" | "pod" | "pods" => Some(Self::Pod),
            "rs" | "replicaset" | "replicasets" | "replica-set" | "replica-sets" => {
                Some(Self::ReplicaSet)
            }
            "rc"
            | "replicationcontroller"
            | "replicationcontrollers"
            | "replication-controller"
            | "replication-controllers" => Some(Self::ReplicationController),
            "svc" | "service" | "services" => Some(Self::Service),
            "sts" | "statefulset" | "statefulsets" | "stateful-set" | "stateful-sets" => {
                Some(Self::StatefulSet)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    Namespace,
    Authority,
    TrafficSplit,
    MultiResource,
    Workload(WorkloadKind),
    Other(String),
}

impl ResourceKind {
    pub fn from_token(token: &str) -> Self {
        let token = token.trim().to_ascii_lowercase();
        match token.as_str() {
            "ns" | "namespace" | "namespaces" => Self::Namespace,
            "au" | "authority" | "authorities" => Self::Authority,
            "ts" | "trafficsplit" | "trafficsplits" | "traffic-split" | "traffic-splits" => {
                Self::TrafficSplit
            }
            "multi_resource" | "multi-resource" | "all" => Self::MultiResource,
            other => match WorkloadKind::from_token(other) {
                Some(workload) => Self::Workload(workload),
                None => Self::Other(other.to_string()),
            },
        }
    }

    pub fn token(&self) -> &str {
        match self {
            Self::Namespace => "namespace",
            Self::Authority => "authority",
            Self::TrafficSplit => "trafficsplit",
            Self::MultiResource => "multi_resource",
            Self::Workload(workload) => workload.token(),
            Self::Other(token) => token,
        }
    }

    pub fn singular_title(&self) -> String {
        match self {
            Self::Namespace => "Namespace".to_string(),
            Self::Authority => "Authority".to_string(),
            Self::TrafficSplit => "Traffic Split".to_string(),
            Self::MultiResource => "Resource".to_string(),
            Self::Workload(workload) => workload.title().to_string(),
            Self::Other(token) => start_case(token),
        }
    }

    pub fn plural_title(&self) -> String {
        match self {
            Self::Authority => "Authorities".to_string(),
            _ => format!("{}s", self.singular_title()),
        }
    }

    pub fn short_name(&self) -> &str {
        match self {
            Self::Namespace => "ns",
            Self::Authority => "au",
            Self::TrafficSplit => "ts",
            Self::MultiResource => "all",
            Self::Workload(workload) => workload.short_token(),
            Self::Other(token) => token,
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

fn start_case(token: &str) -> String {
    token
        .split(|c: char| c == '-' || c == '_' || c == '.' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum NamespaceScope {
    All,
    Named(String),
}

impl NamespaceScope {
    pub fn from_selection(selection: &str) -> Self {
        let selection = selection.trim();
        if selection == ALL_NAMESPACES {
            Self::All
        } else {
            Self::Named(selection.to_string())
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl Display for NamespaceScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "{ALL_NAMESPACES}"),
            Self::Named(namespace) => write!(f, "{namespace}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodStats {
    #[serde(deserialize_with = "u64_from_number_or_string")]
    pub meshed_pods: u64,
    #[serde(deserialize_with = "u64_from_number_or_string")]
    pub total_pods: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcpStats {
    #[serde(default)]
    pub open_connections: Option<f64>,
    #[serde(default)]
    pub read_rate: Option<f64>,
    #[serde(default)]
    pub write_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_bytes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_bytes: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Weight {
    Number(f64),
    Text(String),
}

impl Display for Weight {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(value) if value.fract() == 0.0 => write!(f, "{value:.0}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficSplitStats {
    #[serde(default)]
    pub apex: String,
    #[serde(default)]
    pub leaf: String,
    pub weight: Weight,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub added: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pods: Option<PodStats>,
    #[serde(default)]
    pub success_rate: Option<f64>,
    #[serde(default)]
    pub request_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_requests: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<BTreeMap<String, Option<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp: Option<TcpStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts_stats: Option<TrafficSplitStats>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: ErrorMap,
}

impl MetricRecord {
    pub fn resource_kind(&self) -> ResourceKind {
        ResourceKind::from_token(&self.kind)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Row {
    #[serde(flatten)]
    pub record: MetricRecord,
    #[serde(rename = "P50", skip_serializing_if = "Option::is_none")]
    pub p50: Option<Option<f64>>,
    #[serde(rename = "P95", skip_serializing_if = "Option::is_none")]
    pub p95: Option<Option<f64>>,
    #[serde(rename = "P99", skip_serializing_if = "Option::is_none")]
    pub p99: Option<Option<f64>>,
    #[serde(flatten)]
    pub quantiles: BTreeMap<String, Option<f64>>,
}

impl Row {
    pub fn new(record: MetricRecord) -> Self {
        Self {
            record,
            ..Self::default()
        }
    }

    pub fn set_quantile(&mut self, label: &str, value: Option<f64>) {
        match label {
            "P50" => self.p50 = Some(value),
            "P95" => self.p95 = Some(value),
            "P99" => self.p99 = Some(value),
            _ => {
                self.quantiles.insert(label.to_string(), value);
            }
        }
    }

    pub fn quantile_field(&self, label: &str) -> Option<Option<f64>> {
        match label {
            "P50" => self.p50,
            "P95" => self.p95,
            "P99" => self.p99,
            _ => self.quantiles.get(label).copied(),
        }
    }

    pub fn quantile(&self, label: &str) -> Option<f64> {
        self.quantile_field(label).flatten()
    }
}

fn u64_from_number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Counter {
        Number(u64),
        Text(String),
    }

    match Counter::deserialize(deserializer)? {
        Counter::Number(value) => Ok(value),
        Counter::Text(value) => value
            .trim()
            .parse::<u64>()
            .map_err(|error| serde::de::Error::custom(format!("invalid counter {value:?}: {error}"))),
    }
}
