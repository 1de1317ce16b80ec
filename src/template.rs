//! Recursive placeholder substitution over JSON trees.
//!
//! Request templates are arbitrary JSON values whose string leaves may carry
//! `{{.Name}}` placeholders. A leaf that is exactly one placeholder is
//! replaced by the bound value verbatim, whatever its type, so templates can
//! splice whole objects and arrays into the payload. Placeholders embedded in
//! longer strings substitute the value's textual form. Unresolved
//! placeholders pass through unchanged; partial templates are valid.

use serde_json::{Map, Value};

/// Flat binding of placeholder names to values, assembled fresh per request.
pub type TemplateVariables = Map<String, Value>;

/// Renders `node` against `vars`, producing a new tree. Pure; never mutates
/// the template, which is shared across calls.
pub fn render(node: &Value, vars: &TemplateVariables) -> Value {
    match node {
        Value::String(text) => render_string(text, vars),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), render(value, vars)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|item| render(item, vars)).collect()),
        other => other.clone(),
    }
}

fn render_string(text: &str, vars: &TemplateVariables) -> Value {
    // Whole-value placeholder: substitute verbatim, preserving the type.
    let trimmed = text.trim();
    if let Some(name) = trimmed
        .strip_prefix("{{.")
        .and_then(|rest| rest.strip_suffix("}}"))
    {
        if let Some(value) = vars.get(name) {
            return value.clone();
        }
    }

    let mut out = text.to_string();
    for (name, value) in vars {
        let placeholder = format!("{{{{.{name}}}}}");
        if out.contains(&placeholder) {
            out = out.replace(&placeholder, &textual(value));
        }
    }
    Value::String(out)
}

/// Textual form used for inline substitution: strings stay raw, everything
/// else uses its JSON rendering.
fn textual(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(pairs: &[(&str, Value)]) -> TemplateVariables {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn inline_placeholder_renders_textually() {
        let template = json!({ "text": "Size: {{.Size}}" });
        let rendered = render(&template, &vars(&[("Size", json!("1:1"))]));
        assert_eq!(rendered, json!({ "text": "Size: 1:1" }));
    }

    #[test]
    fn whole_value_placeholder_preserves_type() {
        let template = json!({ "parts": "{{.ContentParts}}" });
        let parts = json!([{ "text": "a cat" }, { "inlineData": { "data": "AQID" } }]);
        let rendered = render(&template, &vars(&[("ContentParts", parts.clone())]));
        assert_eq!(rendered, json!({ "parts": parts }));
    }

    #[test]
    fn whole_value_placeholder_tolerates_surrounding_whitespace() {
        let template = json!("  {{.N}} ");
        let rendered = render(&template, &vars(&[("N", json!(4))]));
        assert_eq!(rendered, json!(4));
    }

    #[test]
    fn unresolved_placeholders_pass_through() {
        let template = json!({ "model": "{{.Model}}", "note": "by {{.Author}}" });
        let rendered = render(&template, &vars(&[("Model", json!("m1"))]));
        assert_eq!(rendered, json!({ "model": "m1", "note": "by {{.Author}}" }));
    }

    #[test]
    fn inline_non_string_values_use_json_text() {
        let template = json!("n={{.N}} flag={{.Flag}}");
        let rendered = render(&template, &vars(&[("N", json!(2)), ("Flag", json!(true))]));
        assert_eq!(rendered, json!("n=2 flag=true"));
    }

    #[test]
    fn arrays_keep_order_and_length() {
        let template = json!(["{{.A}}", 7, "{{.Missing}}", { "b": "{{.A}}" }]);
        let rendered = render(&template, &vars(&[("A", json!("x"))]));
        assert_eq!(rendered, json!(["x", 7, "{{.Missing}}", { "b": "x" }]));
    }

    #[test]
    fn rendering_is_idempotent_once_resolved() {
        let template = json!({ "input": { "prompt": "{{.Prompt}}" }, "n": 1 });
        let bindings = vars(&[("Prompt", json!("a red fox"))]);
        let once = render(&template, &bindings);
        let twice = render(&once, &bindings);
        assert_eq!(once, twice);
    }

    #[test]
    fn template_is_not_mutated_between_calls() {
        let template = json!({ "prompt": "{{.Prompt}}" });
        let first = render(&template, &vars(&[("Prompt", json!("first"))]));
        let second = render(&template, &vars(&[("Prompt", json!("second"))]));
        assert_eq!(first, json!({ "prompt": "first" }));
        assert_eq!(second, json!({ "prompt": "second" }));
        assert_eq!(template, json!({ "prompt": "{{.Prompt}}" }));
    }

    #[test]
    fn scalars_pass_through_unchanged() {
        let bindings = vars(&[("X", json!("y"))]);
        assert_eq!(render(&json!(3.5), &bindings), json!(3.5));
        assert_eq!(render(&json!(null), &bindings), json!(null));
        assert_eq!(render(&json!(false), &bindings), json!(false));
    }
}
