//! Generic operator records.

use crate::attr::AttributeValue;
use std::collections::HashMap;

/// Failure to read an attribute from an operator record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AttrError {
    #[error("Missing attribute: {0}")]
    Missing(String),

    #[error("Attribute '{name}' has the wrong type: {message}")]
    TypeMismatch { name: String, message: String },
}

/// A framework-agnostic operator instance.
///
/// The attribute set is written once by the parameter translator and only
/// read by later stages, which receive the record by shared reference.
#[derive(Debug, Clone, PartialEq)]
pub struct OpRecord {
    /// Operator instance name (e.g. the source layer name).
    pub name: String,

    /// Operator type in the generic model (e.g. "custom_reduction_param").
    pub op_type: String,

    /// Operator attributes.
    pub attributes: HashMap<String, AttributeValue>,
}

impl OpRecord {
    /// Create a record with no attributes.
    pub fn new(name: impl Into<String>, op_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            op_type: op_type.into(),
            attributes: HashMap::new(),
        }
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Get a typed attribute value.
    pub fn attr<T>(&self, name: &str) -> Result<T, AttrError>
    where
        T: TryFrom<AttributeValue, Error = String>,
    {
        let value = self
            .attributes
            .get(name)
            .ok_or_else(|| AttrError::Missing(name.to_string()))?;

        T::try_from(value.clone()).map_err(|message| AttrError::TypeMismatch {
            name: name.to_string(),
            message,
        })
    }

    /// Check if an attribute exists.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }
}
