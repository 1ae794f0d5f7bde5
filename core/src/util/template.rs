//! `<%= name %>` interpolation used for task ids and store keys.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::error::EngineError;

use super::path::get_path;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"<%=\s*([A-Za-z_$][\w$.]*)\s*%>").unwrap())
}

/// Render `template` substituting each `<%= path %>` with the value found at
/// `path` in `vars`. Strings are inserted verbatim, `null` as an empty string,
/// other values as their JSON text.
pub fn render(template: &str, vars: &Value) -> Result<String, EngineError> {
    let mut missing: Option<String> = None;
    let rendered = placeholder().replace_all(template, |caps: &Captures| {
        let name = &caps[1];
        match get_path(vars, name) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) => String::new(),
            Some(other) => other.to_string(),
            None => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(name) => Err(EngineError::validation(format!(
            "template '{template}' references unknown variable '{name}'"
        ))),
        None => Ok(rendered.into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn substitutes_job_and_task_ids() {
        let out = render(
            "<%= jobId %>-<%= taskId %>.tif",
            &json!({ "jobId": "dem", "taskId": 12 }),
        )
        .unwrap();
        assert_eq!(out, "dem-12.tif");
    }

    #[test]
    fn supports_dotted_paths_and_whitespace() {
        let out = render("<%=id%>/<%=  meta.name  %>", &json!({ "id": "a", "meta": { "name": "b" } }))
            .unwrap();
        assert_eq!(out, "a/b");
    }

    #[test]
    fn unknown_variable_is_a_validation_error() {
        let err = render("<%= nope %>", &json!({})).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(render("static.csv", &json!({})).unwrap(), "static.csv");
    }
}
