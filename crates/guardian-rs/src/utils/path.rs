/// Builds the upstream dispatch URL for a request path.
///
/// Upstreams are plain HTTP origins; `path` is the inbound request path and
/// keeps its leading slash.
pub fn format_upstream_url(address: &str, port: u16, path: &str) -> String {
    format!("http://{}:{}{}", address, port, path)
}
