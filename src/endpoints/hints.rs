//! Request/response hints read from handler bodies.

use lazy_static::lazy_static;
use regex::Regex;

use crate::model::{Endpoint, Function, ProjectAnalysis};

lazy_static! {
    static ref QUERY_PARAM: Regex = Regex::new(
        r#"(?:\.(?:Query|DefaultQuery|GetQuery|QueryArray|QueryParam)|URL\.Query\(\)\.Get)\(\s*"([^"]+)""#
    )
    .unwrap();

    static ref BIND_TARGET: Regex =
        Regex::new(r"\.(?:ShouldBind\w*|Bind\w*|Decode)\(\s*&(\w+)\s*\)").unwrap();

    static ref JSON_RESPONSE: Regex =
        Regex::new(r"\.(?:JSON|IndentedJSON|PureJSON|XML)\(").unwrap();
}

/// Fill query parameters and request/response types of `endpoint` from its
/// handler, when the handler is a function declared in the project.
pub fn apply(endpoint: &mut Endpoint, analysis: &ProjectAnalysis) {
    let Some(function) = find_handler(&endpoint.handler, &endpoint.package, analysis) else {
        return;
    };

    for caps in QUERY_PARAM.captures_iter(&function.body) {
        let name = caps[1].to_string();
        if !endpoint.query_params.contains(&name) {
            endpoint.query_params.push(name);
        }
    }

    endpoint.request_type = BIND_TARGET
        .captures(&function.body)
        .map(|caps| variable_type(&function.body, &caps[1]).unwrap_or_else(|| caps[1].to_string()));

    endpoint.response_type = response_payload(&function.body)
        .map(|payload| payload_type(&function.body, &payload));
}

/// Resolve a handler expression like `h.GetUser` or `handlers.GetUser(svc)`
/// to a declared function, preferring the endpoint's package.
fn find_handler<'a>(
    handler: &str,
    package: &str,
    analysis: &'a ProjectAnalysis,
) -> Option<&'a Function> {
    let handler = handler.trim();
    if handler.is_empty() || handler.starts_with("func") {
        return None;
    }
    let callee = handler.split('(').next().unwrap_or(handler);
    let name = callee.rsplit('.').next().unwrap_or(callee).trim();
    if name.is_empty() {
        return None;
    }

    let mut fallback = None;
    for file in analysis.files.values() {
        for function in file.functions.iter().filter(|f| f.name == name) {
            if file.package == package {
                return Some(function);
            }
            fallback.get_or_insert(function);
        }
    }
    fallback
}

/// Second argument of the first `c.JSON(status, payload)` call.
fn response_payload(body: &str) -> Option<String> {
    let m = JSON_RESPONSE.find(body)?;
    let (args, _) = super::text::call_arguments(body, m.end() - 1)?;
    args.get(1).cloned()
}

/// Type named by a payload expression.
fn payload_type(body: &str, payload: &str) -> String {
    let payload = payload.trim().trim_start_matches('&');
    if let Some(idx) = payload.find('{') {
        return payload[..idx].trim().to_string();
    }
    if payload.chars().all(|c| c.is_alphanumeric() || c == '_') {
        if let Some(ty) = variable_type(body, payload) {
            return ty;
        }
    }
    payload.to_string()
}

/// Declared or constructed type of local variable `var` in `body`.
fn variable_type(body: &str, var: &str) -> Option<String> {
    let var = regex::escape(var);
    let declared = Regex::new(&format!(r"\bvar\s+{}\s+([\w\.\*\[\]]+)", var)).ok()?;
    if let Some(caps) = declared.captures(body) {
        return Some(caps[1].to_string());
    }
    let constructed = Regex::new(&format!(r"\b{}\s*:=\s*&?([\w\.\[\]]+)\s*\{{", var)).ok()?;
    constructed.captures(body).map(|caps| caps[1].to_string())
}
