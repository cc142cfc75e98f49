//! Rule-based request redirection.
//!
//! Rules are evaluated in declaration order and the first match wins. A rule
//! either rewrites the port (producing an absolute `https://` URL on the
//! gateway's listen address) or substitutes a path prefix.

use crate::models::gateway::{RedirectAction, RedirectRule, RedirectionSettings};
use log::info;
use url::form_urlencoded;

/// Evaluates ordered redirection rules against path and port.
#[derive(Debug, Clone)]
pub struct Redirector {
    enabled: bool,
    listen_address: String,
    rules: Vec<RedirectRule>,
}

impl Redirector {
    pub fn new(settings: &RedirectionSettings, listen_address: &str) -> Self {
        Self {
            enabled: settings.enabled,
            listen_address: listen_address.to_string(),
            rules: settings.rules.clone(),
        }
    }

    /// Returns the redirect target for a request, if any rule matches.
    ///
    /// Port rules produce `https://{listen_address}:{destination_port}{path}`
    /// with the path unchanged. Path rules strip a single trailing `*` from
    /// the source pattern and replace its first occurrence in the request
    /// path with the destination. A non-empty query string is re-encoded and
    /// appended to either form.
    pub fn redirect(&self, path: &str, port: u16, query: &[(String, String)]) -> Option<String> {
        if !self.enabled {
            return None;
        }

        for rule in &self.rules {
            if rule.action != RedirectAction::Redirect {
                continue;
            }

            if let (Some(source_port), Some(destination_port)) =
                (rule.source_port, rule.destination_port)
            {
                if port == source_port {
                    let url = format!(
                        "https://{}:{}{}",
                        self.listen_address, destination_port, path
                    );
                    let url = append_query(url, query);
                    info!(
                        "Redirecting from port {} to {} with URL {}",
                        port, destination_port, url
                    );
                    return Some(url);
                }
            }

            if let (Some(source_path), Some(destination_path)) =
                (rule.source_path.as_deref(), rule.destination_path.as_deref())
            {
                let source = strip_trailing_star(source_path);
                if !source.is_empty() && path.contains(source) {
                    let url = path.replacen(source, destination_path, 1);
                    let url = append_query(url, query);
                    info!("Redirecting path {} to {}", path, url);
                    return Some(url);
                }
            }
        }

        None
    }
}

/// Strips a single terminal `*` if present. `/api/**` keeps its inner star.
fn strip_trailing_star(pattern: &str) -> &str {
    pattern.strip_suffix('*').unwrap_or(pattern)
}

fn append_query(url: String, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return url;
    }

    let encoded = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish();
    format!("{}?{}", url, encoded)
}
