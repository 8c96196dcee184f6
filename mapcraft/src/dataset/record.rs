//! Records, attribute values and the schema describing them.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use ahash::AHashMap;
use mapcraft_types::geo::GeoPoint2d;
use mapcraft_types::Geom;
use serde::{Deserialize, Serialize};

/// Geometry of a record. Coordinates are latitude and longitude in degrees.
pub type RecordGeometry = Geom<GeoPoint2d>;

/// Scalar attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Numeric value.
    Number(f64),
    /// Text value.
    Text(String),
    /// Boolean flag.
    Bool(bool),
}

impl Value {
    /// Type of the value.
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            Value::Number(_) => AttributeType::Number,
            Value::Text(_) => AttributeType::Text,
            Value::Bool(_) => AttributeType::Bool,
        }
    }

    /// Returns the number if the value is numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string if the value is a text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the flag if the value is boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Tries to convert the value into the given type. Only text values are converted: into a
    /// number if the text parses as one, into a flag if it is `true` or `false`.
    pub(crate) fn coerce(self, target: AttributeType) -> Result<Value, Value> {
        if self.attribute_type() == target {
            return Ok(self);
        }

        match (&self, target) {
            (Value::Text(s), AttributeType::Number) => {
                s.trim().parse::<f64>().map(Value::Number).map_err(|_| self)
            }
            (Value::Text(s), AttributeType::Bool) => match s.trim() {
                "true" | "TRUE" | "True" => Ok(Value::Bool(true)),
                "false" | "FALSE" | "False" => Ok(Value::Bool(false)),
                _ => Err(self),
            },
            _ => Err(self),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Type of an attribute.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    /// Numeric attribute.
    Number,
    /// Text attribute.
    Text,
    /// Boolean attribute.
    Bool,
}

impl Display for AttributeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AttributeType::Number => "number",
            AttributeType::Text => "text",
            AttributeType::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// Names and types of the attributes of a dataset, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(BTreeMap<String, AttributeType>);

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an attribute to the schema.
    pub fn with(mut self, name: impl Into<String>, attribute_type: AttributeType) -> Self {
        self.0.insert(name.into(), attribute_type);
        self
    }

    /// Type of the attribute, if the schema has it.
    pub fn get(&self, name: &str) -> Option<AttributeType> {
        self.0.get(name).copied()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no attributes in the schema.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, AttributeType)> + '_ {
        self.0.iter().map(|(name, t)| (name.as_str(), *t))
    }

    pub(crate) fn insert(&mut self, name: String, attribute_type: AttributeType) {
        self.0.insert(name, attribute_type);
    }
}

/// A single validated data item: a geometry and a set of named attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    geometry: RecordGeometry,
    attributes: AHashMap<String, Value>,
}

impl Record {
    pub(crate) fn new(geometry: RecordGeometry, attributes: AHashMap<String, Value>) -> Self {
        Self {
            geometry,
            attributes,
        }
    }

    /// Geometry of the record.
    pub fn geometry(&self) -> &RecordGeometry {
        &self.geometry
    }

    /// Value of the attribute, if the record has it.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Iterates over attributes of the record in arbitrary order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.attributes.iter().map(|(name, v)| (name.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coercion() {
        assert_eq!(
            Value::from("12.5").coerce(AttributeType::Number),
            Ok(Value::Number(12.5))
        );
        assert_eq!(
            Value::from(" true").coerce(AttributeType::Bool),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            Value::from("abc").coerce(AttributeType::Number),
            Err(Value::from("abc"))
        );
        assert_eq!(
            Value::from(1.0).coerce(AttributeType::Text),
            Err(Value::Number(1.0))
        );
    }

    #[test]
    fn schema_is_ordered_by_name() {
        let schema = Schema::new()
            .with("value", AttributeType::Number)
            .with("name", AttributeType::Text)
            .with("active", AttributeType::Bool);
        let names: Vec<_> = schema.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["active", "name", "value"]);

        let json = serde_json::to_string(&schema).unwrap();
        assert_eq!(json, r#"{"active":"bool","name":"text","value":"number"}"#);
    }
}
