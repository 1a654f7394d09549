//! Entity instances

use crate::kind::TypeName;
use crate::value::Value;
use indexmap::IndexMap;
use serde::Serialize;

/// Instance of an entity type with field values in declaration order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instance {
    #[serde(rename = "$entity")]
    entity: TypeName,
    #[serde(flatten)]
    values: IndexMap<String, Value>,
}

impl Instance {
    /// Create instance with every field unset
    #[must_use]
    pub fn new<I, S>(entity: TypeName, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entity,
            values: fields
                .into_iter()
                .map(|name| (name.into(), Value::Null))
                .collect(),
        }
    }

    /// Entity type
    #[inline]
    #[must_use]
    pub fn entity(&self) -> &TypeName {
        &self.entity
    }

    /// Field value, `None` when the field does not exist
    #[inline]
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Iterate `(field, value)` pairs
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether the instance declares a field
    #[inline]
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// Mutable slot for a declared field; writes go through the schema
    /// provider so types are checked
    pub(crate) fn slot_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.values.get_mut(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_instance_has_unset_fields() {
        let instance = Instance::new(TypeName::new("Person"), ["id", "name"]);
        assert_eq!(instance.get("id"), Some(&Value::Null));
        assert_eq!(instance.get("missing"), None);
        let names: Vec<_> = instance.values().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn serializes_with_entity_tag() {
        let mut instance = Instance::new(TypeName::new("Person"), ["id"]);
        *instance.slot_mut("id").unwrap() = Value::Int(4);
        let json = serde_json::to_value(&instance).unwrap();
        assert_eq!(json, serde_json::json!({"$entity": "Person", "id": 4}));
    }
}
