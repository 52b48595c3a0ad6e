//! Values as seen through a model-object handle.

use std::fmt;

use docmodel_types::StoredKind;

use crate::collection::ModelCollection;
use crate::individual::Individual;
use crate::object::ModelObject;

/// Closed set of values a model property can hold.
///
/// `List` is only used to pass multiple values at once; a property read
/// never yields one (collections come back as [`PropertyValue::Collection`]).
#[derive(Clone, Debug, PartialEq)]
pub enum ModelValue {
    String(String),
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Object(ModelObject),
    Individual(Individual),
    List(Vec<ModelValue>),
}

impl ModelValue {
    /// Short description of the value's kind, for error messages.
    pub fn kind_name(&self) -> String {
        match self {
            ModelValue::String(_) => "String".to_string(),
            ModelValue::Boolean(_) => "Boolean".to_string(),
            ModelValue::Integer(_) => "Integer".to_string(),
            ModelValue::Double(_) => "Double".to_string(),
            ModelValue::Object(o) => o.type_name().to_string(),
            ModelValue::Individual(i) => match i.type_name() {
                Some(t) => t.to_string(),
                None => "Individual".to_string(),
            },
            ModelValue::List(_) => "List".to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ModelValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ModelObject> {
        match self {
            ModelValue::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_individual(&self) -> Option<&Individual> {
        match self {
            ModelValue::Individual(i) => Some(i),
            _ => None,
        }
    }
}

impl From<&str> for ModelValue {
    fn from(s: &str) -> Self {
        ModelValue::String(s.to_string())
    }
}

impl From<String> for ModelValue {
    fn from(s: String) -> Self {
        ModelValue::String(s)
    }
}

impl From<bool> for ModelValue {
    fn from(b: bool) -> Self {
        ModelValue::Boolean(b)
    }
}

impl From<i64> for ModelValue {
    fn from(i: i64) -> Self {
        ModelValue::Integer(i)
    }
}

impl From<f64> for ModelValue {
    fn from(d: f64) -> Self {
        ModelValue::Double(d)
    }
}

impl From<ModelObject> for ModelValue {
    fn from(o: ModelObject) -> Self {
        ModelValue::Object(o)
    }
}

impl From<Individual> for ModelValue {
    fn from(i: Individual) -> Self {
        ModelValue::Individual(i)
    }
}

impl From<Vec<ModelValue>> for ModelValue {
    fn from(values: Vec<ModelValue>) -> Self {
        ModelValue::List(values)
    }
}

/// Result of reading a property: a single value or a live collection view.
#[derive(Clone, Debug)]
pub enum PropertyValue {
    Single(ModelValue),
    Collection(ModelCollection),
}

impl PropertyValue {
    pub fn as_single(&self) -> Option<&ModelValue> {
        match self {
            PropertyValue::Single(v) => Some(v),
            PropertyValue::Collection(_) => None,
        }
    }

    pub fn into_single(self) -> Option<ModelValue> {
        match self {
            PropertyValue::Single(v) => Some(v),
            PropertyValue::Collection(_) => None,
        }
    }

    pub fn as_collection(&self) -> Option<&ModelCollection> {
        match self {
            PropertyValue::Collection(c) => Some(c),
            PropertyValue::Single(_) => None,
        }
    }
}

/// Permitted element kind of a collection view.
///
/// `Object` and `Individual` carry the model type or vocabulary name the
/// elements must belong to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    String,
    Boolean,
    Integer,
    Double,
    Individual(String),
    Object(String),
}

impl ElementType {
    /// The kind the elements must have in stored form.
    pub fn stored_kind(&self) -> StoredKind {
        match self {
            ElementType::String => StoredKind::String,
            ElementType::Boolean => StoredKind::Boolean,
            ElementType::Integer => StoredKind::Integer,
            ElementType::Double => StoredKind::Double,
            ElementType::Individual(_) => StoredKind::Individual,
            ElementType::Object(_) => StoredKind::Reference,
        }
    }

    /// Type name used to resolve individual URIs, if any.
    pub fn type_hint(&self) -> Option<&str> {
        match self {
            ElementType::Individual(t) | ElementType::Object(t) => Some(t),
            _ => None,
        }
    }

    /// Whether a converted value is an acceptable element.
    pub fn accepts(&self, value: &ModelValue) -> bool {
        match (self, value) {
            (ElementType::String, ModelValue::String(_))
            | (ElementType::Boolean, ModelValue::Boolean(_))
            | (ElementType::Integer, ModelValue::Integer(_))
            | (ElementType::Double, ModelValue::Double(_)) => true,
            (ElementType::Individual(t), ModelValue::Individual(i)) => i.type_name() == Some(t),
            (ElementType::Object(t), ModelValue::Object(o)) => o.model_type().is_assignable_to(t),
            _ => false,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::String => f.write_str("String"),
            ElementType::Boolean => f.write_str("Boolean"),
            ElementType::Integer => f.write_str("Integer"),
            ElementType::Double => f.write_str("Double"),
            ElementType::Individual(t) | ElementType::Object(t) => f.write_str(t),
        }
    }
}
