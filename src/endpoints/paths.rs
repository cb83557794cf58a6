//! Route path normalization and concatenation.

/// Normalize a route path: empty becomes `/`, a leading slash is enforced and
/// repeated slashes collapse.
pub fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    out.push('/');
    for c in path.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Join a base path and a suffix.
///
/// ```
/// use apiscope::endpoints::combine;
///
/// assert_eq!(combine("/api", "/v1"), "/api/v1");
/// assert_eq!(combine("/", "/v1"), "/v1");
/// assert_eq!(combine("/api", "/"), "/api");
/// ```
pub fn combine(base: &str, suffix: &str) -> String {
    let base = normalize(base);
    let suffix = normalize(suffix);

    if base == "/" {
        return suffix;
    }
    if suffix == "/" {
        return base;
    }

    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        suffix.trim_start_matches('/')
    )
}

/// Parameter names declared by `:name`, `*name` and `{name}` segments.
pub fn path_params(path: &str) -> Vec<String> {
    let mut params = Vec::new();
    for segment in path.split('/') {
        let name = if let Some(rest) = segment.strip_prefix(':') {
            rest
        } else if let Some(rest) = segment.strip_prefix('*') {
            rest
        } else if segment.starts_with('{') && segment.ends_with('}') && segment.len() > 2 {
            // `{id:[0-9]+}` carries a pattern after the name.
            let inner = &segment[1..segment.len() - 1];
            inner.split(':').next().unwrap_or(inner)
        } else {
            continue;
        };
        if !name.is_empty() && !params.iter().any(|p| p == name) {
            params.push(name.to_string());
        }
    }
    params
}

/// First path segment with its leading slash, e.g. `/api` for `/api/v1/users`.
pub fn top_level(path: &str) -> Option<String> {
    path.split('/')
        .find(|s| !s.is_empty())
        .map(|s| format!("/{}", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("users"), "/users");
        assert_eq!(normalize("//api///v1/"), "/api/v1/");
        assert_eq!(normalize("/"), "/");
    }

    #[test]
    fn test_combine() {
        assert_eq!(combine("/api", "/v1"), "/api/v1");
        assert_eq!(combine("/", "/v1"), "/v1");
        assert_eq!(combine("/api", "/"), "/api");
        assert_eq!(combine("", "users"), "/users");
        assert_eq!(combine("/api/", "/v1"), "/api/v1");
        assert_eq!(combine("api", "v1/users"), "/api/v1/users");
        assert_eq!(combine("", ""), "/");
    }

    #[test]
    fn test_path_params() {
        assert_eq!(path_params("/users/:id/posts/:post_id"), vec!["id", "post_id"]);
        assert_eq!(path_params("/static/*filepath"), vec!["filepath"]);
        assert_eq!(path_params("/items/{id:[0-9]+}"), vec!["id"]);
        assert!(path_params("/health").is_empty());
    }

    #[test]
    fn test_top_level() {
        assert_eq!(top_level("/api/v1/users").as_deref(), Some("/api"));
        assert_eq!(top_level("/"), None);
    }
}
