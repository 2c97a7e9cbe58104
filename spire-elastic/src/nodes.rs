//! Node address resolution
//!
//! Node entries come straight from configuration and may each hold several
//! comma-separated hosts (`"es-1, es-2"`). Resolution is purely textual; no
//! DNS lookups happen here.

/// Flatten raw node entries into a trimmed, order-preserving host list
pub fn resolve_nodes<S: AsRef<str>>(entries: &[S]) -> Vec<String> {
    entries
        .iter()
        .flat_map(|entry| entry.as_ref().split(','))
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(str::to_string)
        .collect()
}

/// Base URL for a node's REST endpoint
///
/// Entries that already carry a scheme are used as-is, `host:port` entries
/// get an `http://` prefix, and bare hosts get the default port.
pub fn node_base_url(node: &str, default_port: u16) -> String {
    let node = node.trim_end_matches('/');
    if node.contains("://") {
        node.to_string()
    } else if has_port(node) {
        format!("http://{}", node)
    } else {
        format!("http://{}:{}", node, default_port)
    }
}

fn has_port(node: &str) -> bool {
    // Bracketed IPv6 literals: "[::1]:9200"
    if let Some(rest) = node.strip_prefix('[') {
        return rest.contains("]:");
    }
    match node.rsplit_once(':') {
        Some((host, port)) => !host.contains(':') && port.parse::<u16>().is_ok(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_flattens_and_trims() {
        assert_eq!(resolve_nodes(&["a, b", " c"]), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_resolve_drops_empty() {
        assert_eq!(
            resolve_nodes(&[" , ,es-1,, ", "", "es-2 "]),
            vec!["es-1", "es-2"]
        );
    }

    #[test]
    fn test_resolve_empty_input() {
        let empty: Vec<String> = Vec::new();
        assert!(resolve_nodes(&empty).is_empty());
        assert!(resolve_nodes(&["  ", ","]).is_empty());
    }

    #[test]
    fn test_resolve_preserves_order() {
        assert_eq!(
            resolve_nodes(&["z,y", "x"]),
            vec!["z", "y", "x"]
        );
    }

    #[test]
    fn test_base_url_default_port() {
        assert_eq!(node_base_url("es-1", 9200), "http://es-1:9200");
    }

    #[test]
    fn test_base_url_explicit_port() {
        assert_eq!(node_base_url("es-1:9201", 9200), "http://es-1:9201");
        assert_eq!(node_base_url("[::1]:9201", 9200), "http://[::1]:9201");
    }

    #[test]
    fn test_base_url_scheme() {
        assert_eq!(
            node_base_url("https://search.example.com/", 9200),
            "https://search.example.com"
        );
    }
}
