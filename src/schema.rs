//! Tool argument schemas.
//!
//! Every tool declares a `SchemaDescriptor`: a structural contract over its
//! input mapping. Validation is total — every field of the incoming mapping
//! is checked, unknown fields are rejected, types are matched strictly
//! (numeric strings are not coerced), declared defaults are applied to
//! missing optional fields, and wire aliases are resolved to their canonical
//! names before the handler sees the arguments.
//!
//! Alias precedence: when both the canonical key and its alias are present
//! in one request, the alias wins. The alias exists for cross-version wire
//! compatibility, so the compatibility spelling is taken as authoritative.

use serde::Serialize;
use serde_json::{Map, Value, json};

/// JSON value kinds accepted by a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Boolean,
    Integer,
    Number,
    Object,
    /// Array of strings.
    StringArray,
    /// Array of objects, optionally with a nested element schema.
    ObjectArray,
    /// Any JSON value.
    Any,
}

impl FieldKind {
    /// JSON Schema type name for tool listings.
    fn type_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Object => "object",
            Self::StringArray | Self::ObjectArray => "array",
            Self::Any => "",
        }
    }
}

/// A single field contract inside a `SchemaDescriptor`.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
    required: bool,
    default: Option<Value>,
    allowed: Option<Vec<String>>,
    alias: Option<String>,
    description: Option<String>,
    /// Element contract for `ObjectArray` fields.
    elements: Option<SchemaDescriptor>,
}

impl FieldSpec {
    /// A field the caller must provide.
    pub fn required(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            default: None,
            allowed: None,
            alias: None,
            description: None,
            elements: None,
        }
    }

    /// A field the caller may omit.
    pub fn optional(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind)
        }
    }

    /// Attach a human-readable description for the tool listing.
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Declare a default applied when the field is absent. Implies optional.
    pub fn default_value(mut self, value: Value) -> Self {
        self.required = false;
        self.default = Some(value);
        self
    }

    /// Restrict a string field to a fixed set of values.
    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.allowed = Some(values.iter().map(|v| (*v).to_string()).collect());
        self
    }

    /// Declare an alternate wire name resolving to this field.
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.alias = Some(name.into());
        self
    }

    /// Declare the element contract for an `ObjectArray` field.
    pub fn elements(mut self, schema: SchemaDescriptor) -> Self {
        self.elements = Some(schema);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn matches_kind(&self, value: &Value) -> bool {
        match self.kind {
            FieldKind::String => value.is_string(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Integer => value.as_i64().is_some() || value.as_u64().is_some(),
            FieldKind::Number => value.is_number(),
            FieldKind::Object => value.is_object(),
            FieldKind::StringArray | FieldKind::ObjectArray => value.is_array(),
            FieldKind::Any => true,
        }
    }

    /// JSON Schema property entry for this field.
    fn property(&self) -> Value {
        let mut prop = Map::new();
        let type_name = self.kind.type_name();
        if !type_name.is_empty() {
            prop.insert("type".to_string(), json!(type_name));
        }
        match self.kind {
            FieldKind::StringArray => {
                prop.insert("items".to_string(), json!({"type": "string"}));
            }
            FieldKind::ObjectArray => {
                let items = match &self.elements {
                    Some(schema) => Value::Object(schema.json_schema()),
                    None => json!({"type": "object"}),
                };
                prop.insert("items".to_string(), items);
            }
            _ => {}
        }
        if let Some(desc) = &self.description {
            prop.insert("description".to_string(), json!(desc));
        }
        if let Some(allowed) = &self.allowed {
            prop.insert("enum".to_string(), json!(allowed));
        }
        if let Some(default) = &self.default {
            prop.insert("default".to_string(), default.clone());
        }
        Value::Object(prop)
    }
}

/// A structural violation found during validation.
///
/// Serialized into the `details` list of a `ValidationError` failure.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Violation {
    /// Field path, e.g. `collection` or `edge_definitions[0].edge_collection`.
    pub field: String,
    /// Stable violation code: `missing`, `type`, `enum`, or `unknown_field`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl Violation {
    fn new(field: impl Into<String>, code: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Per-tool input contract: an ordered set of field specs.
#[derive(Debug, Clone, Default)]
pub struct SchemaDescriptor {
    fields: Vec<FieldSpec>,
}

impl SchemaDescriptor {
    /// An empty contract (tool takes no arguments).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field contract.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Validate a raw argument mapping against this contract.
    ///
    /// Returns the normalized mapping on success: aliases resolved to
    /// canonical names, defaults filled in, optional absent fields omitted.
    /// On failure returns every violation found, not just the first.
    pub fn validate(&self, raw: &Map<String, Value>) -> Result<Map<String, Value>, Vec<Violation>> {
        let mut violations = Vec::new();
        let mut normalized = Map::new();

        for key in raw.keys() {
            let known = self
                .fields
                .iter()
                .any(|f| f.name == *key || f.alias.as_deref() == Some(key.as_str()));
            if !known {
                violations.push(Violation::new(
                    key.clone(),
                    "unknown_field",
                    format!("Unknown field '{key}'"),
                ));
            }
        }

        for spec in &self.fields {
            // Alias wins over the canonical key when both are present.
            let value = spec
                .alias
                .as_deref()
                .and_then(|alias| raw.get(alias))
                .or_else(|| raw.get(&spec.name));

            match value {
                Some(Value::Null) | None => {
                    if spec.required {
                        violations.push(Violation::new(
                            spec.name.clone(),
                            "missing",
                            format!("Field '{}' is required", spec.name),
                        ));
                    } else if let Some(default) = &spec.default {
                        normalized.insert(spec.name.clone(), default.clone());
                    }
                }
                Some(value) => {
                    self.check_value(spec, value, &spec.name, &mut violations);
                    normalized.insert(spec.name.clone(), value.clone());
                }
            }
        }

        if violations.is_empty() {
            Ok(normalized)
        } else {
            Err(violations)
        }
    }

    fn check_value(&self, spec: &FieldSpec, value: &Value, path: &str, out: &mut Vec<Violation>) {
        if !spec.matches_kind(value) {
            out.push(Violation::new(
                path,
                "type",
                format!(
                    "Field '{}' must be of type {}",
                    path,
                    spec.kind.type_name()
                ),
            ));
            return;
        }
        if let (Some(allowed), Some(s)) = (&spec.allowed, value.as_str()) {
            if !allowed.iter().any(|a| a == s) {
                out.push(Violation::new(
                    path,
                    "enum",
                    format!("Field '{}' must be one of: {}", path, allowed.join(", ")),
                ));
            }
        }
        match spec.kind {
            FieldKind::StringArray => {
                for (i, item) in value.as_array().into_iter().flatten().enumerate() {
                    if !item.is_string() {
                        out.push(Violation::new(
                            format!("{path}[{i}]"),
                            "type",
                            format!("Element {i} of '{path}' must be a string"),
                        ));
                    }
                }
            }
            FieldKind::ObjectArray => {
                for (i, item) in value.as_array().into_iter().flatten().enumerate() {
                    match item.as_object() {
                        Some(map) => {
                            if let Some(elements) = &spec.elements {
                                if let Err(nested) = elements.validate(map) {
                                    for v in nested {
                                        out.push(Violation::new(
                                            format!("{path}[{i}].{}", v.field),
                                            &v.code,
                                            v.message,
                                        ));
                                    }
                                }
                            }
                        }
                        None => out.push(Violation::new(
                            format!("{path}[{i}]"),
                            "type",
                            format!("Element {i} of '{path}' must be an object"),
                        )),
                    }
                }
            }
            _ => {}
        }
    }

    /// Render this contract as a JSON Schema object for the tool listing.
    pub fn json_schema(&self) -> Map<String, Value> {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for spec in &self.fields {
            properties.insert(spec.name.clone(), spec.property());
            if spec.required {
                required.push(json!(spec.name));
            }
        }
        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), Value::Array(required));
        }
        schema.insert("additionalProperties".to_string(), json!(false));
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert_schema() -> SchemaDescriptor {
        SchemaDescriptor::new()
            .field(FieldSpec::required("collection", FieldKind::String))
            .field(FieldSpec::required("document", FieldKind::Object))
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn test_valid_arguments_pass_through() {
        let schema = insert_schema();
        let out = schema
            .validate(&args(json!({"collection": "users", "document": {"a": 1}})))
            .unwrap();
        assert_eq!(out["collection"], json!("users"));
        assert_eq!(out["document"], json!({"a": 1}));
    }

    #[test]
    fn test_missing_required_field_is_reported() {
        let schema = insert_schema();
        let violations = schema.validate(&args(json!({"document": {}}))).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "collection");
        assert_eq!(violations[0].code, "missing");
    }

    #[test]
    fn test_strict_typing_rejects_numeric_strings() {
        let schema = SchemaDescriptor::new()
            .field(FieldSpec::optional("max_depth", FieldKind::Integer));
        let violations = schema
            .validate(&args(json!({"max_depth": "3"})))
            .unwrap_err();
        assert_eq!(violations[0].code, "type");
    }

    #[test]
    fn test_integer_rejects_float() {
        let schema = SchemaDescriptor::new()
            .field(FieldSpec::optional("batch_size", FieldKind::Integer));
        assert!(schema.validate(&args(json!({"batch_size": 1.5}))).is_err());
        assert!(schema.validate(&args(json!({"batch_size": 1000}))).is_ok());
    }

    #[test]
    fn test_default_applied_when_absent() {
        let schema = SchemaDescriptor::new().field(
            FieldSpec::optional("type", FieldKind::String)
                .default_value(json!("document"))
                .one_of(&["document", "edge"]),
        );
        let out = schema.validate(&Map::new()).unwrap();
        assert_eq!(out["type"], json!("document"));
    }

    #[test]
    fn test_enum_violation() {
        let schema = SchemaDescriptor::new().field(
            FieldSpec::optional("direction", FieldKind::String)
                .default_value(json!("OUTBOUND"))
                .one_of(&["OUTBOUND", "INBOUND", "ANY"]),
        );
        let violations = schema
            .validate(&args(json!({"direction": "SIDEWAYS"})))
            .unwrap_err();
        assert_eq!(violations[0].code, "enum");
    }

    #[test]
    fn test_alias_resolves_to_canonical_name() {
        let schema = SchemaDescriptor::new().field(
            FieldSpec::optional("output_dir", FieldKind::String).alias("outputDir"),
        );
        let out = schema
            .validate(&args(json!({"outputDir": "backups/x"})))
            .unwrap();
        assert_eq!(out["output_dir"], json!("backups/x"));
        assert!(!out.contains_key("outputDir"));
    }

    #[test]
    fn test_alias_wins_over_canonical_key() {
        let schema = SchemaDescriptor::new().field(
            FieldSpec::optional("doc_limit", FieldKind::Integer).alias("docLimit"),
        );
        let out = schema
            .validate(&args(json!({"doc_limit": 1, "docLimit": 2})))
            .unwrap();
        assert_eq!(out["doc_limit"], json!(2));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let schema = insert_schema();
        let violations = schema
            .validate(&args(json!({
                "collection": "users",
                "document": {},
                "bogus": true
            })))
            .unwrap_err();
        assert_eq!(violations[0].code, "unknown_field");
        assert_eq!(violations[0].field, "bogus");
    }

    #[test]
    fn test_null_treated_as_absent() {
        let schema = insert_schema();
        let violations = schema
            .validate(&args(json!({"collection": null, "document": {}})))
            .unwrap_err();
        assert_eq!(violations[0].code, "missing");
    }

    #[test]
    fn test_optional_absent_field_omitted_from_normalized() {
        let schema = SchemaDescriptor::new()
            .field(FieldSpec::required("query", FieldKind::String))
            .field(FieldSpec::optional("bind_vars", FieldKind::Object));
        let out = schema.validate(&args(json!({"query": "RETURN 1"}))).unwrap();
        assert!(!out.contains_key("bind_vars"));
    }

    #[test]
    fn test_nested_object_array_validation() {
        let edge_def = SchemaDescriptor::new()
            .field(FieldSpec::required("edge_collection", FieldKind::String))
            .field(FieldSpec::required("from_collections", FieldKind::StringArray))
            .field(FieldSpec::required("to_collections", FieldKind::StringArray));
        let schema = SchemaDescriptor::new()
            .field(FieldSpec::required("name", FieldKind::String))
            .field(
                FieldSpec::required("edge_definitions", FieldKind::ObjectArray)
                    .elements(edge_def),
            );
        let violations = schema
            .validate(&args(json!({
                "name": "social",
                "edge_definitions": [{"edge_collection": "knows"}]
            })))
            .unwrap_err();
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert!(fields.contains(&"edge_definitions[0].from_collections"));
        assert!(fields.contains(&"edge_definitions[0].to_collections"));
    }

    #[test]
    fn test_string_array_element_type_checked() {
        let schema = SchemaDescriptor::new()
            .field(FieldSpec::required("fields", FieldKind::StringArray));
        let violations = schema
            .validate(&args(json!({"fields": ["name", 42]})))
            .unwrap_err();
        assert_eq!(violations[0].field, "fields[1]");
    }

    #[test]
    fn test_json_schema_rendering() {
        let schema = SchemaDescriptor::new()
            .field(
                FieldSpec::required("query", FieldKind::String).describe("AQL query string"),
            )
            .field(FieldSpec::optional("bind_vars", FieldKind::Object));
        let rendered = schema.json_schema();
        assert_eq!(rendered["type"], json!("object"));
        assert_eq!(
            rendered["properties"]["query"]["description"],
            json!("AQL query string")
        );
        assert_eq!(rendered["required"], json!(["query"]));
    }
}
