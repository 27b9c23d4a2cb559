//! Tool schemas and function-call types.
//!
//! A [`Tool`] is the machine-readable description of a function the model is
//! allowed to request. A [`FunctionCall`] is the model's request to run one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Describes a single parameter in a function schema.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Property {
    /// The JSON type (e.g., "string", "array").
    #[serde(rename = "type")]
    pub prop_type: String,
    /// Human-readable description of this parameter.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Schema for array items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Self>>,
}

impl Property {
    /// Creates a string property.
    #[must_use]
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            prop_type: "string".to_string(),
            description: description.into(),
            items: None,
        }
    }

    /// Creates a boolean property.
    #[must_use]
    pub fn boolean(description: impl Into<String>) -> Self {
        Self {
            prop_type: "boolean".to_string(),
            description: description.into(),
            items: None,
        }
    }

    /// Creates an array property with the given item schema.
    #[must_use]
    pub fn array(description: impl Into<String>, items: Self) -> Self {
        Self {
            prop_type: "array".to_string(),
            description: description.into(),
            items: Some(Box::new(items)),
        }
    }

    /// Creates an array-of-strings property.
    #[must_use]
    pub fn string_array(description: impl Into<String>) -> Self {
        Self::array(description, Self::string(""))
    }
}

/// Defines the parameter schema for a function using JSON Schema conventions.
///
/// Properties are kept in a sorted map so the serialized schema is identical
/// from one request to the next.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Parameters {
    /// The JSON type, always "object".
    #[serde(rename = "type")]
    pub param_type: String,
    /// Map of parameter names to their property definitions.
    pub properties: BTreeMap<String, Property>,
    /// List of required parameter names.
    pub required: Vec<String>,
}

impl Parameters {
    /// Creates a new `Parameters` with type "object".
    #[must_use]
    pub fn new(properties: BTreeMap<String, Property>, required: Vec<String>) -> Self {
        Self {
            param_type: "object".to_string(),
            properties,
            required,
        }
    }

    /// A schema accepting no parameters.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(BTreeMap::new(), Vec::new())
    }

    /// Builds a schema from `(name, property, required)` triples.
    #[must_use]
    pub fn from_properties(
        properties: impl IntoIterator<Item = (&'static str, Property, bool)>,
    ) -> Self {
        let mut map = BTreeMap::new();
        let mut required = Vec::new();
        for (name, property, is_required) in properties {
            if is_required {
                required.push(name.to_string());
            }
            map.insert(name.to_string(), property);
        }
        Self::new(map, required)
    }

    #[must_use]
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Iterates over declared parameter names in schema order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::empty()
    }
}

/// Describes a function that can be called by the model.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Function {
    /// The name of the function. Unique within a registry.
    pub name: String,
    /// Human-readable description of what the function does.
    pub description: String,
    /// Schema of the accepted parameters.
    pub parameters: Parameters,
}

/// A tool available to the model, wrapping a function definition.
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder, Eq, PartialEq)]
pub struct Tool {
    /// The type of tool (defaults to "function").
    #[serde(rename = "type")]
    #[builder(default = "function".to_string())]
    pub r#type: String,
    /// The function definition.
    pub function: Function,
}

impl Tool {
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Parameters,
    ) -> Self {
        Self {
            r#type: "function".to_string(),
            function: Function {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// The model's request to run a function.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    /// The name of the function being called.
    pub name: String,
    /// The arguments as a single JSON string.
    #[serde(default)]
    pub arguments: String,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Returns the arguments as a JSON string slice.
    ///
    /// Returns `"{}"` if the arguments string is blank.
    #[must_use]
    pub fn arguments_json(&self) -> &str {
        if self.arguments.trim().is_empty() {
            "{}"
        } else {
            &self.arguments
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn test_property_serialization() {
        let prop = Property::string("The title of the card. Case sensitive.");

        let json = serde_json::to_value(&prop).expect("Failed to serialize");
        assert_eq!(json["type"], "string");
        assert_eq!(json["description"], "The title of the card. Case sensitive.");
        assert!(json.get("items").is_none());
    }

    #[test]
    fn test_string_array_property() {
        let prop = Property::string_array("Ordered list of card titles");

        let json = serde_json::to_value(&prop).expect("Failed to serialize");
        assert_eq!(json["type"], "array");
        assert_eq!(json["items"], serde_json::json!({"type": "string"}));

        let deserialized: Property = serde_json::from_value(json).expect("Failed to deserialize");
        assert_eq!(prop, deserialized);
    }

    #[test]
    fn test_parameters_from_properties() {
        let params = Parameters::from_properties([
            ("card_title", Property::string("Title"), true),
            ("verbose", Property::boolean("Verbose output"), false),
        ]);

        assert_eq!(params.param_type, "object");
        assert!(params.is_required("card_title"));
        assert!(!params.is_required("verbose"));
        assert_eq!(params.names().collect::<Vec<_>>(), vec!["card_title", "verbose"]);
    }

    #[test]
    fn test_empty_parameters_serialization() {
        let json = serde_json::to_value(Parameters::empty()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "object", "properties": {}, "required": []})
        );
    }

    #[test]
    fn test_tool_builder() {
        let tool = Tool::builder()
            .function(Function {
                name: "get_cards_layout".to_string(),
                description: "Returns the layout".to_string(),
                parameters: Parameters::empty(),
            })
            .build();

        assert_eq!(tool.r#type, "function");
        assert_eq!(tool.name(), "get_cards_layout");
    }

    #[test]
    fn test_function_call_blank_arguments() {
        assert_eq!(FunctionCall::new("f", "").arguments_json(), "{}");
        assert_eq!(FunctionCall::new("f", "   ").arguments_json(), "{}");
        assert_eq!(
            FunctionCall::new("f", r#"{"a":1}"#).arguments_json(),
            r#"{"a":1}"#
        );
    }

    #[test]
    fn test_function_call_missing_arguments_deserializes() {
        let call: FunctionCall = serde_json::from_str(r#"{"name":"get_cards_layout"}"#).unwrap();
        assert_eq!(call.name, "get_cards_layout");
        assert!(call.arguments.is_empty());
    }
}
