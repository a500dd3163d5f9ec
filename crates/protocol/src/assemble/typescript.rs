//! TypeScript-like rendering of JSON schemas for tool namespaces

use pcore::ToolCatalogEntry;
use serde_json::{Map, Value};

/// Render a tool namespace
///
/// ```text
/// namespace functions {
///
/// // Gets the weather
/// type get_weather = (_: {
/// location: string,
/// }) => any;
///
/// } // namespace functions
/// ```
pub(crate) fn namespace(name: &str, tools: &[ToolCatalogEntry]) -> String {
    let mut output = format!("namespace {name} {{\n\n");
    for tool in tools {
        for line in tool.description.lines().filter(|l| !l.trim().is_empty()) {
            output.push_str(&format!("// {}\n", line.trim()));
        }
        output.push_str(&format!(
            "type {} = {} => any;\n\n",
            tool.name,
            signature(tool.parameters.as_value())
        ));
    }
    output.push_str(&format!("}} // namespace {name}"));
    output
}

/// The argument list of a function type
fn signature(schema: &Value) -> String {
    let Some(properties) = properties(schema) else {
        return "()".to_owned();
    };

    let required = required(schema);
    let mut output = String::from("(_: {\n");
    for (name, property) in properties {
        if let Some(description) = property.get("description").and_then(Value::as_str) {
            for line in description.lines().filter(|l| !l.trim().is_empty()) {
                output.push_str(&format!("// {}\n", line.trim()));
            }
        }

        let optional = if required.contains(&name.as_str()) { "" } else { "?" };
        output.push_str(&format!("{name}{optional}: {},", type_of(property)));
        if let Some(default) = property.get("default") {
            output.push_str(&format!(" // default: {}", literal(default)));
        }
        output.push('\n');
    }
    output.push_str("})");
    output
}

/// The TypeScript type of a schema
fn type_of(schema: &Value) -> String {
    if let Some(values) = schema.get("enum").and_then(Value::as_array) {
        return values
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(" | ");
    }
    if let Some(value) = schema.get("const") {
        return value.to_string();
    }
    for key in ["anyOf", "oneOf"] {
        if let Some(variants) = schema.get(key).and_then(Value::as_array) {
            return variants.iter().map(type_of).collect::<Vec<_>>().join(" | ");
        }
    }

    match schema.get("type") {
        Some(Value::String(ty)) => primitive(ty, schema),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .map(|ty| primitive(ty, schema))
            .collect::<Vec<_>>()
            .join(" | "),
        _ => "any".to_owned(),
    }
}

fn primitive(ty: &str, schema: &Value) -> String {
    match ty {
        "string" => "string".to_owned(),
        "number" | "integer" => "number".to_owned(),
        "boolean" => "boolean".to_owned(),
        "null" => "null".to_owned(),
        "array" => match schema.get("items") {
            Some(items) => format!("{}[]", wrap_union(type_of(items))),
            None => "any[]".to_owned(),
        },
        "object" => match properties(schema) {
            Some(properties) => {
                let required = required(schema);
                let fields = properties
                    .iter()
                    .map(|(name, property)| {
                        let optional = if required.contains(&name.as_str()) { "" } else { "?" };
                        format!("{name}{optional}: {}", type_of(property))
                    })
                    .collect::<Vec<_>>();
                format!("{{ {} }}", fields.join(", "))
            }
            None => "object".to_owned(),
        },
        _ => "any".to_owned(),
    }
}

fn properties(schema: &Value) -> Option<&Map<String, Value>> {
    schema
        .get("properties")
        .and_then(Value::as_object)
        .filter(|properties| !properties.is_empty())
}

fn required(schema: &Value) -> Vec<&str> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn wrap_union(ty: String) -> String {
    if ty.contains(" | ") { format!("({ty})") } else { ty }
}

/// Defaults are shown bare when they are strings
fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{signature, type_of};
    use serde_json::json;

    #[test]
    fn enum_renders_as_union() {
        let schema = json!({ "type": "string", "enum": ["celsius", "fahrenheit"] });
        assert_eq!(type_of(&schema), r#""celsius" | "fahrenheit""#);
    }

    #[test]
    fn arrays_of_unions_are_parenthesised() {
        let schema = json!({ "type": "array", "items": { "type": ["string", "null"] } });
        assert_eq!(type_of(&schema), "(string | null)[]");
    }

    #[test]
    fn optional_fields_and_defaults() {
        let schema = json!({
            "type": "object",
            "properties": {
                "location": { "type": "string", "description": "The city" },
                "unit": { "type": "string", "default": "celsius" }
            },
            "required": ["location"]
        });
        assert_eq!(
            signature(&schema),
            "(_: {\n// The city\nlocation: string,\nunit?: string, // default: celsius\n})"
        );
    }

    #[test]
    fn no_properties_is_empty_argument_list() {
        assert_eq!(signature(&json!({ "type": "object" })), "()");
    }
}
