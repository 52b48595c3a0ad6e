//! Conversion between model values and stored values.
//!
//! Stored values have exactly two non-scalar forms: typed references for
//! composite objects and individual URIs for individuals. [`to_stored`]
//! produces them; [`to_model`] resolves them back through the registry.

use docmodel_types::{IndividualUri, PropertyDescriptor, StoredValue};

use crate::binding::{same_store, StoreBinding};
use crate::error::{CoreError, CoreResult};
use crate::value::ModelValue;

/// Convert a model value into its stored form.
///
/// Handles from another store are copied in through the binding's copy
/// manager; without one the conversion fails with
/// [`CoreError::NotInStore`].
pub fn to_stored(value: &ModelValue, binding: &StoreBinding) -> CoreResult<StoredValue> {
    match value {
        ModelValue::List(items) => {
            let stored = items
                .iter()
                .map(|item| element_to_stored(item, binding))
                .collect::<CoreResult<Vec<_>>>()?;
            Ok(StoredValue::List(stored))
        }
        other => element_to_stored(other, binding),
    }
}

/// Convert a single, non-container value into its stored form.
pub fn element_to_stored(value: &ModelValue, binding: &StoreBinding) -> CoreResult<StoredValue> {
    match value {
        ModelValue::String(s) => Ok(StoredValue::String(s.clone())),
        ModelValue::Boolean(b) => Ok(StoredValue::Boolean(*b)),
        ModelValue::Integer(i) => Ok(StoredValue::Integer(*i)),
        ModelValue::Double(d) => Ok(StoredValue::Double(*d)),
        ModelValue::Individual(individual) => Ok(StoredValue::Individual(individual.to_uri_value())),
        ModelValue::Object(object) if object.is_external() => {
            Ok(StoredValue::Individual(IndividualUri::new(object.object_uri())))
        }
        ModelValue::Object(object) => {
            if same_store(object.store(), binding.store()) {
                return Ok(StoredValue::Reference(object.to_typed_value()?));
            }
            let Some(copy_manager) = binding.copy_manager() else {
                return Err(CoreError::NotInStore(format!(
                    "can not store a reference to {object}: it belongs to a different model store"
                )));
            };
            let copied = copy_manager.copy(
                binding.store(),
                object.store(),
                object.object_uri(),
                object.type_name(),
                binding.spec_version(),
                binding.id_prefix(),
            )?;
            Ok(StoredValue::Reference(copied))
        }
        ModelValue::List(_) => Err(CoreError::InvalidType(
            "collections can not contain other collections".into(),
        )),
    }
}

/// Convert a stored value into a model value.
///
/// Individual URIs resolve, in order, to an enumeration constant, a named
/// individual, or an external element. Typed references inflate to handles
/// on the binding's store; their targets must exist.
pub fn to_model(
    value: StoredValue,
    binding: &StoreBinding,
    type_hint: Option<&str>,
) -> CoreResult<ModelValue> {
    match value {
        // Individuals first: an individual must never be taken for a
        // composite object.
        StoredValue::Individual(uri) => individual_to_model(uri.as_str(), binding, type_hint),
        StoredValue::Reference(typed) => {
            let object = binding.registry().inflate(
                binding.store().clone(),
                typed.object_uri(),
                typed.type_name(),
                binding.copy_manager().cloned(),
                binding.spec_version(),
                false,
                binding.id_prefix(),
            )?;
            Ok(ModelValue::Object(object))
        }
        StoredValue::List(items) => items
            .into_iter()
            .map(|item| to_model(item, binding, type_hint))
            .collect::<CoreResult<Vec<_>>>()
            .map(ModelValue::List),
        StoredValue::String(s) => Ok(ModelValue::String(s)),
        StoredValue::Boolean(b) => Ok(ModelValue::Boolean(b)),
        StoredValue::Integer(i) => Ok(ModelValue::Integer(i)),
        StoredValue::Double(d) => Ok(ModelValue::Double(d)),
    }
}

fn individual_to_model(
    uri: &str,
    binding: &StoreBinding,
    type_hint: Option<&str>,
) -> CoreResult<ModelValue> {
    let registry = binding.registry();
    let spec_version = binding.spec_version();
    if let Some(constant) = registry.uri_to_enum(uri, spec_version)? {
        return Ok(ModelValue::Individual(constant));
    }
    if let Some(individual) = registry.uri_to_individual(uri, spec_version, type_hint)? {
        return Ok(ModelValue::Individual(individual));
    }
    let external = registry.external_element(
        binding.store().clone(),
        uri,
        binding.copy_manager().cloned(),
        spec_version,
    )?;
    Ok(ModelValue::Object(external))
}

// ---- store writes shared by handles and deferred updates -------------------

pub(crate) fn set_property(
    binding: &StoreBinding,
    object_uri: &str,
    property: &PropertyDescriptor,
    value: ModelValue,
) -> CoreResult<()> {
    let stored = to_stored(&value, binding)?;
    Ok(binding.store().set_value(object_uri, property, stored)?)
}

pub(crate) fn add_to_collection(
    binding: &StoreBinding,
    object_uri: &str,
    property: &PropertyDescriptor,
    value: &ModelValue,
) -> CoreResult<bool> {
    let stored = element_to_stored(value, binding)?;
    Ok(binding
        .store()
        .add_value_to_collection(object_uri, property, stored)?)
}

/// Remove an element. A handle from another store can not be an element,
/// so nothing is copied and the result is `false`.
pub(crate) fn remove_from_collection(
    binding: &StoreBinding,
    object_uri: &str,
    property: &PropertyDescriptor,
    value: &ModelValue,
) -> CoreResult<bool> {
    let lookup = binding.clone().with_copy_manager(None);
    let stored = match element_to_stored(value, &lookup) {
        Ok(stored) => stored,
        Err(CoreError::NotInStore(_)) => return Ok(false),
        Err(e) => return Err(e),
    };
    Ok(binding
        .store()
        .remove_value_from_collection(object_uri, property, &stored)?)
}
