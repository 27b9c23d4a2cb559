//! Named-parameter binding for function-call arguments.
//!
//! The model sends arguments as a JSON object encoded in a string. Handlers
//! never see the raw string: the executor parses it, checks it against the
//! tool's declared [`Parameters`], and hands the handler a [`ToolArguments`]
//! it can query by name.

use log::debug;
use serde_json::{Map, Value};
use thiserror::Error;

use folio_common::tools::Parameters;

#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("arguments are not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("arguments must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("missing required argument '{0}'")]
    Missing(String),
}

/// Arguments of a single function call, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments {
    values: Map<String, Value>,
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl ToolArguments {
    /// Parses a JSON-encoded argument object.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` is not valid JSON or is not an object.
    pub fn parse(raw: &str) -> Result<Self, ArgumentError> {
        match serde_json::from_str::<Value>(raw)? {
            Value::Object(values) => Ok(Self { values }),
            other => Err(ArgumentError::NotAnObject(type_name(&other))),
        }
    }

    /// Binds the arguments to a parameter schema.
    ///
    /// Every required parameter must be present and non-null. Keys the schema
    /// does not declare are dropped.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentError::Missing` naming the first absent required parameter.
    pub fn bind(mut self, parameters: &Parameters) -> Result<Self, ArgumentError> {
        for name in &parameters.required {
            if self.values.get(name).is_none_or(Value::is_null) {
                return Err(ArgumentError::Missing(name.clone()));
            }
        }

        self.values.retain(|key, _| {
            let declared = parameters.properties.contains_key(key);
            if !declared {
                debug!("Dropping undeclared argument '{key}'");
            }
            declared
        });

        Ok(self)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns a string argument.
    ///
    /// # Errors
    ///
    /// Returns an error if the argument is absent or not a string.
    pub fn str(&self, name: &str) -> anyhow::Result<&str> {
        match self.values.get(name) {
            Some(Value::String(s)) => Ok(s),
            Some(other) => anyhow::bail!(
                "Argument '{name}' must be a string, got {}",
                type_name(other)
            ),
            None => anyhow::bail!("Missing '{name}' argument"),
        }
    }

    /// Returns an array-of-strings argument.
    ///
    /// # Errors
    ///
    /// Returns an error if the argument is absent, not an array, or contains
    /// a non-string element.
    pub fn string_list(&self, name: &str) -> anyhow::Result<Vec<String>> {
        let items = match self.values.get(name) {
            Some(Value::Array(items)) => items,
            Some(other) => anyhow::bail!(
                "Argument '{name}' must be an array of strings, got {}",
                type_name(other)
            ),
            None => anyhow::bail!("Missing '{name}' argument"),
        };

        items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(anyhow::anyhow!(
                    "Argument '{name}' must only contain strings, found {}",
                    type_name(other)
                )),
            })
            .collect()
    }
}

impl From<Map<String, Value>> for ToolArguments {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use folio_common::tools::Property;
    use serde_json::json;

    fn title_schema() -> Parameters {
        Parameters::from_properties([("card_title", Property::string("Title"), true)])
    }

    #[test]
    fn test_parse_object() {
        let args = ToolArguments::parse(r#"{"card_title": "Raytracer"}"#).unwrap();
        assert_eq!(args.str("card_title").unwrap(), "Raytracer");
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        let err = ToolArguments::parse(r#"{"card_title": "#).unwrap_err();
        assert!(matches!(err, ArgumentError::Malformed(_)));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        let err = ToolArguments::parse(r#"["Raytracer"]"#).unwrap_err();
        assert!(matches!(err, ArgumentError::NotAnObject("array")));
    }

    #[test]
    fn test_bind_is_by_name_not_position() {
        let schema = Parameters::from_properties([
            ("card_title", Property::string("Title"), true),
            ("message", Property::string("Message"), true),
        ]);
        let args = ToolArguments::parse(r#"{"message": "hi", "card_title": "A"}"#)
            .unwrap()
            .bind(&schema)
            .unwrap();

        assert_eq!(args.str("card_title").unwrap(), "A");
        assert_eq!(args.str("message").unwrap(), "hi");
    }

    #[test]
    fn test_bind_missing_required() {
        let err = ToolArguments::parse(r#"{"title": "A"}"#)
            .unwrap()
            .bind(&title_schema())
            .unwrap_err();
        assert!(matches!(err, ArgumentError::Missing(ref name) if name == "card_title"));
    }

    #[test]
    fn test_bind_null_counts_as_missing() {
        let err = ToolArguments::parse(r#"{"card_title": null}"#)
            .unwrap()
            .bind(&title_schema())
            .unwrap_err();
        assert!(matches!(err, ArgumentError::Missing(_)));
    }

    #[test]
    fn test_bind_drops_undeclared() {
        let args = ToolArguments::parse(r#"{"card_title": "A", "extra": 1}"#)
            .unwrap()
            .bind(&title_schema())
            .unwrap();
        assert!(args.get("extra").is_none());
    }

    #[test]
    fn test_string_list() {
        let args = ToolArguments::from(
            json!({"order": ["B", "A"], "bad": ["B", 1], "scalar": "B"})
                .as_object()
                .cloned()
                .unwrap(),
        );

        assert_eq!(args.string_list("order").unwrap(), vec!["B", "A"]);
        assert!(args.string_list("bad").is_err());
        assert!(args.string_list("scalar").is_err());
        assert!(args.string_list("absent").is_err());
    }

    #[test]
    fn test_str_type_mismatch() {
        let args = ToolArguments::parse(r#"{"card_title": 42}"#).unwrap();
        let err = args.str("card_title").unwrap_err();
        assert!(err.to_string().contains("must be a string"));
    }
}
