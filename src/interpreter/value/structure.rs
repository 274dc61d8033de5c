use std::collections::BTreeMap;

use crate::interpreter::value::core::Value;

/// A mapping from field name to value.
///
/// Field names are unique and insertion order is not observable; a sorted
/// map keeps unparsing deterministic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Structure {
    fields: BTreeMap<String, Value>,
}

impl Structure {
    /// Creates an empty structure.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the structure has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Reads one field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Writes one field, replacing any previous value.
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Removes one field.
    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Walks a field path, failing with the name of the first missing step.
    ///
    /// # Errors
    /// Returns the missing or non-structure field name.
    pub fn get_path(&self, path: &[String]) -> Result<&Value, String> {
        let (first, rest) = path.split_first().ok_or_else(String::new)?;
        let value = self.fields.get(first).ok_or_else(|| first.clone())?;
        if rest.is_empty() {
            return Ok(value);
        }
        match value {
            Value::Struct(inner) => inner.get_path(rest),
            _ => Err(first.clone()),
        }
    }

    /// Walks a field path, creating empty structures at each missing
    /// intermediate, and sets the leaf.
    ///
    /// # Errors
    /// Returns the name of an intermediate field that exists but is not a
    /// structure.
    pub fn set_path(&mut self, path: &[String], value: Value) -> Result<(), String> {
        let (first, rest) = path.split_first().ok_or_else(String::new)?;
        if rest.is_empty() {
            self.fields.insert(first.clone(), value);
            return Ok(());
        }

        let entry = self.fields
                        .entry(first.clone())
                        .or_insert_with(|| Value::Struct(Self::new()));
        match entry {
            Value::Struct(inner) => inner.set_path(rest, value),
            _ => Err(first.clone()),
        }
    }

    /// Iterates the fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::value::scalar::Scalar;

    #[test]
    fn nested_paths_create_intermediates() {
        let mut s = Structure::new();
        let path = vec!["a".to_string(), "b".to_string()];

        s.set_path(&path, Value::Scalar(Scalar::from_i64(5))).unwrap();

        assert_eq!(s.get_path(&path).unwrap(),
                   &Value::Scalar(Scalar::from_i64(5)));
        assert!(matches!(s.field("a"), Some(Value::Struct(_))));
    }

    #[test]
    fn non_structure_intermediates_are_rejected() {
        let mut s = Structure::new();
        s.set_field("a", Value::Scalar(Scalar::one()));

        let path = vec!["a".to_string(), "b".to_string()];
        assert!(s.set_path(&path, Value::Scalar(Scalar::one())).is_err());
        assert!(s.get_path(&path).is_err());
    }
}
