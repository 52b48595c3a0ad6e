//! Value-level comparison of model objects.
//!
//! Two handles are equivalent when they have the same type and every
//! property present on either side holds equivalent values, with absence
//! matching an empty collection or the model's absent sentinel. Collections
//! compare without regard to order: same length, and every element on each
//! side has an equal or equivalent partner on the other. Element counts are
//! not matched, so `[x, x, y]` and `[x, y, y]` are equivalent. Properties
//! the model type flags as related elements are compared without following
//! their own related elements, which keeps relationship cycles from
//! recursing forever.

use std::fmt;

use docmodel_types::PropertyDescriptor;

use crate::binding::same_store;
use crate::error::CoreResult;
use crate::object::ModelObject;
use crate::value::{ModelValue, PropertyValue};

/// Kind of the first mismatch found by an equivalence check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NotEquivalent {
    /// The objects have different types.
    DifferentType,
    /// The compared object has a value this object lacks.
    MissingProperty,
    /// Both have the property but the values differ.
    PropertyNotEquivalent,
    /// This object has a value the compared object lacks.
    ComparePropertyMissing,
}

/// Diagnostic recorded when [`ModelObject::equivalent`] returns `false`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotEquivalentReason {
    pub reason: NotEquivalent,
    pub property: Option<PropertyDescriptor>,
}

impl NotEquivalentReason {
    pub fn new(reason: NotEquivalent, property: Option<PropertyDescriptor>) -> Self {
        Self { reason, property }
    }
}

impl fmt::Display for NotEquivalentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.property {
            Some(property) => write!(f, "{:?} ({property})", self.reason),
            None => write!(f, "{:?}", self.reason),
        }
    }
}

fn normalize(s: &str) -> String {
    s.replace("\r\n", "\n").trim().to_string()
}

impl ModelObject {
    /// Whether `compare` holds equivalent values for every property.
    pub fn equivalent(&self, compare: &ModelObject) -> CoreResult<bool> {
        self.equivalent_with(compare, false)
    }

    /// As [`equivalent`](Self::equivalent); with `ignore_related_elements`
    /// set, related-element properties are skipped entirely.
    pub fn equivalent_with(
        &self,
        compare: &ModelObject,
        ignore_related_elements: bool,
    ) -> CoreResult<bool> {
        let mismatch = self.first_mismatch(compare, ignore_related_elements)?;
        let equivalent = mismatch.is_none();
        self.record_not_equivalent(mismatch);
        Ok(equivalent)
    }

    fn first_mismatch(
        &self,
        compare: &ModelObject,
        ignore_related: bool,
    ) -> CoreResult<Option<NotEquivalentReason>> {
        if self.type_name() != compare.type_name() {
            return Ok(Some(NotEquivalentReason::new(NotEquivalent::DifferentType, None)));
        }
        if self.is_external() || compare.is_external() {
            if self.object_uri() == compare.object_uri() {
                return Ok(None);
            }
            return Ok(Some(NotEquivalentReason::new(
                NotEquivalent::PropertyNotEquivalent,
                None,
            )));
        }
        // The same stored entry trivially matches itself.
        if self == compare && same_store(self.store(), compare.store()) {
            return Ok(None);
        }

        let mine = self.property_descriptors()?;
        let mut theirs = compare.property_descriptors()?;
        for property in &mine {
            if ignore_related && self.model_type().is_related_element(property) {
                continue;
            }
            let my_value = self.get_object_property_value(property)?;
            if let Some(pos) = theirs.iter().position(|p| p == property) {
                theirs.swap_remove(pos);
                let their_value = compare.get_object_property_value(property)?;
                if !self.property_values_equivalent(property, my_value, their_value, ignore_related)? {
                    return Ok(Some(NotEquivalentReason::new(
                        NotEquivalent::PropertyNotEquivalent,
                        Some(property.clone()),
                    )));
                }
            } else if let Some(value) = my_value {
                if !self.is_equivalent_to_absent(&value)? {
                    return Ok(Some(NotEquivalentReason::new(
                        NotEquivalent::ComparePropertyMissing,
                        Some(property.clone()),
                    )));
                }
            }
        }
        for property in &theirs {
            if ignore_related && self.model_type().is_related_element(property) {
                continue;
            }
            let Some(value) = compare.get_object_property_value(property)? else {
                continue;
            };
            if !compare.is_equivalent_to_absent(&value)? {
                return Ok(Some(NotEquivalentReason::new(
                    NotEquivalent::MissingProperty,
                    Some(property.clone()),
                )));
            }
        }
        Ok(None)
    }

    /// Empty collections and the model's absent sentinel stand for "no
    /// value".
    fn is_equivalent_to_absent(&self, value: &PropertyValue) -> CoreResult<bool> {
        let uri = match value {
            PropertyValue::Collection(collection) => return collection.is_empty(),
            PropertyValue::Single(ModelValue::Individual(individual)) => individual.uri(),
            PropertyValue::Single(ModelValue::Object(object)) if object.is_external() => {
                object.object_uri()
            }
            PropertyValue::Single(_) => return Ok(false),
        };
        Ok(self.registry().is_absent_sentinel(uri, self.spec_version()))
    }

    fn property_values_equivalent(
        &self,
        property: &PropertyDescriptor,
        a: Option<PropertyValue>,
        b: Option<PropertyValue>,
        ignore_related: bool,
    ) -> CoreResult<bool> {
        let nested_ignore = ignore_related || self.model_type().is_related_element(property);
        match (a, b) {
            (None, None) => Ok(true),
            (None, Some(value)) | (Some(value), None) => self.is_equivalent_to_absent(&value),
            (Some(PropertyValue::Collection(x)), Some(PropertyValue::Collection(y))) => {
                self.lists_equivalent(&x.to_vec()?, &y.to_vec()?, nested_ignore)
            }
            (Some(PropertyValue::Single(x)), Some(PropertyValue::Single(y))) => {
                self.values_equivalent(&x, &y, nested_ignore)
            }
            (Some(x), Some(y)) => {
                Ok(self.is_equivalent_to_absent(&x)? && self.is_equivalent_to_absent(&y)?)
            }
        }
    }

    fn values_equivalent(&self, a: &ModelValue, b: &ModelValue, ignore_related: bool) -> CoreResult<bool> {
        match (a, b) {
            // Individuals are matched by URI before any object comparison.
            (ModelValue::Individual(x), ModelValue::Individual(y)) => Ok(x.uri() == y.uri()),
            (ModelValue::Individual(i), ModelValue::Object(o))
            | (ModelValue::Object(o), ModelValue::Individual(i)) => {
                Ok(o.is_external() && o.object_uri() == i.uri())
            }
            (ModelValue::Object(x), ModelValue::Object(y)) => {
                if x.is_external() || y.is_external() {
                    return Ok(x.object_uri() == y.object_uri());
                }
                x.equivalent_with(y, ignore_related)
            }
            (ModelValue::List(x), ModelValue::List(y)) => self.lists_equivalent(x, y, ignore_related),
            (ModelValue::String(x), ModelValue::String(y)) => Ok(normalize(x) == normalize(y)),
            _ => Ok(a == b),
        }
    }

    /// Equal sizes and mutual containment. Duplicates are not counted.
    fn lists_equivalent(&self, a: &[ModelValue], b: &[ModelValue], ignore_related: bool) -> CoreResult<bool> {
        if a.len() != b.len() {
            return Ok(false);
        }
        for item in a {
            if !self.contains_equal_or_equivalent(b, item, ignore_related)? {
                return Ok(false);
            }
        }
        for item in b {
            if !self.contains_equal_or_equivalent(a, item, ignore_related)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn contains_equal_or_equivalent(
        &self,
        list: &[ModelValue],
        item: &ModelValue,
        ignore_related: bool,
    ) -> CoreResult<bool> {
        // Handles equal by URI may still hold different values in different
        // stores, so objects always take the equivalence path.
        if list.contains(item) && !matches!(item, ModelValue::Object(_)) {
            return Ok(true);
        }
        for candidate in list {
            if self.values_equivalent(item, candidate, ignore_related)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
