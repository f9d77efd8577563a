use serde::Serialize;
use serde_json::{Map, Value};
use url::{Url, form_urlencoded};

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Link {
    pub label: String,
    pub href: String,
}

pub trait LinkFactory: Send + Sync {
    fn link(&self, path: &str, label: &str) -> Link;
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct PrefixedLinks {
    prefix: String,
}

impl PrefixedLinks {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim().trim_end_matches('/').to_string(),
        }
    }
}

impl LinkFactory for PrefixedLinks {
    fn link(&self, path: &str, label: &str) -> Link {
        let href = if Url::parse(path).is_ok() {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{path}", self.prefix)
        } else {
            format!("{}/{path}", self.prefix)
        };

        Link {
            label: label.to_string(),
            href,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct DashboardTarget<'a> {
    pub name: &'a str,
    pub namespace: Option<&'a str>,
    pub resource_kind: &'a str,
}

pub fn grafana_link(base_url: &str, target: &DashboardTarget<'_>, links: &dyn LinkFactory) -> Link {
    let kind = target.resource_kind;
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(namespace) = target.namespace {
        query.append_pair("var-namespace", namespace);
    }
    query.append_pair(&format!("var-{kind}"), target.name);

    let href = format!(
        "{}/d/linkerd-{kind}?{}",
        base_url.trim_end_matches('/'),
        query.finish()
    );
    links.link(&href, "grafana")
}

pub fn jaeger_link(base_url: &str, target: &DashboardTarget<'_>, links: &dyn LinkFactory) -> Link {
    let mut tags = Map::new();
    if let Some(namespace) = target.namespace {
        tags.insert(
            "linkerd.io/workload-ns".to_string(),
            Value::String(namespace.to_string()),
        );
    }
    tags.insert(
        format!("linkerd.io/proxy-{}", target.resource_kind),
        Value::String(target.name.to_string()),
    );

    let service = match target.namespace {
        Some(namespace) => format!("{}.{namespace}", target.name),
        None => target.name.to_string(),
    };
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("service", &service)
        .append_pair("tags", &Value::Object(tags).to_string())
        .finish();

    let href = format!("{}/search?{query}", base_url.trim_end_matches('/'));
    links.link(&href, "jaeger")
}

#[cfg(test)]
mod tests {
    use super::{DashboardTarget, LinkFactory, PrefixedLinks, grafana_link, jaeger_link};

    #[test]
    fn prefixed_links_join_internal_paths() {
        let links = PrefixedLinks::new("/proxy/");
        let link = links.link("/namespaces/emojivoto", "emojivoto");
        assert_eq!(link.href, "/proxy/namespaces/emojivoto");
        assert_eq!(link.label, "emojivoto");

        let bare = PrefixedLinks::default();
        assert_eq!(bare.link("/namespaces/a", "a").href, "/namespaces/a");
    }

    #[test]
    fn prefixed_links_keep_absolute_urls() {
        let links = PrefixedLinks::new("/proxy");
        let link = links.link("https://grafana.example/d/x", "grafana");
        assert_eq!(link.href, "https://grafana.example/d/x");
    }

    #[test]
    fn grafana_link_targets_kind_dashboard() {
        let links = PrefixedLinks::default();
        let target = DashboardTarget {
            name: "web",
            namespace: Some("emojivoto"),
            resource_kind: "deployment",
        };
        let link = grafana_link("https://grafana.example/", &target, &links);
        assert_eq!(
            link.href,
            "https://grafana.example/d/linkerd-deployment?var-namespace=emojivoto&var-deployment=web"
        );
    }

    #[test]
    fn relative_grafana_base_goes_through_prefix() {
        let links = PrefixedLinks::new("/proxy");
        let target = DashboardTarget {
            name: "web.emojivoto.svc.cluster.local:80",
            namespace: None,
            resource_kind: "authority",
        };
        let link = grafana_link("/grafana", &target, &links);
        assert_eq!(
            link.href,
            "/proxy/grafana/d/linkerd-authority?var-authority=web.emojivoto.svc.cluster.local%3A80"
        );
    }

    #[test]
    fn jaeger_link_encodes_proxy_tags() {
        let links = PrefixedLinks::default();
        let target = DashboardTarget {
            name: "web",
            namespace: Some("emojivoto"),
            resource_kind: "deployment",
        };
        let link = jaeger_link("http://jaeger:16686", &target, &links);
        assert!(link.href.starts_with("http://jaeger:16686/search?service=web.emojivoto&tags="));
        assert!(link.href.contains("linkerd.io%2Fproxy-deployment"));
        assert_eq!(link.label, "jaeger");
    }
}
