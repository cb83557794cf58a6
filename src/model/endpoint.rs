//! HTTP endpoints discovered in routing code.

use serde::Serialize;
use std::fmt;

/// HTTP method of an endpoint. `Any` matches every method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Any,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Any => "ANY",
        }
    }

    /// Parse a method name, ignoring case. `Any` and `*` map to [`HttpMethod::Any`].
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "DELETE" => Some(HttpMethod::Delete),
            "PATCH" => Some(HttpMethod::Patch),
            "OPTIONS" => Some(HttpMethod::Options),
            "HEAD" => Some(HttpMethod::Head),
            "ANY" | "*" => Some(HttpMethod::Any),
            _ => None,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub id: String,
    pub method: HttpMethod,
    /// Full path after group resolution.
    pub path: String,
    /// Best-effort handler expression, empty when unknown.
    pub handler: String,
    pub file: String,
    pub package: String,
    /// 1-indexed line of the registration call.
    pub line: usize,
    pub middlewares: Vec<String>,
    pub path_params: Vec<String>,
    pub query_params: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<String>,
}

impl Endpoint {
    /// Deduplication key.
    pub fn key(&self) -> (HttpMethod, &str) {
        (self.method, self.path.as_str())
    }
}
