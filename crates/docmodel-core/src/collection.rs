//! Live, write-through views over collection-valued properties.
//!
//! Neither view caches elements. Every call reads from or writes to the
//! store, so concurrent modification through another view or handle is
//! visible immediately.

use std::fmt;
use std::vec;

use docmodel_types::{PropertyDescriptor, StoredValue};

use tracing::warn;

use crate::binding::{SharedStore, StoreBinding};
use crate::convert;
use crate::error::{CoreError, CoreResult};
use crate::value::{ElementType, ModelValue};

/// Collection view over one property of one object.
#[derive(Clone)]
pub struct ModelCollection {
    binding: StoreBinding,
    object_uri: String,
    property: PropertyDescriptor,
    element_type: Option<ElementType>,
    external: bool,
}

impl ModelCollection {
    /// Open a view. The object must exist, and with an element type every
    /// current member must be assignable to it.
    pub fn new(
        binding: StoreBinding,
        object_uri: impl Into<String>,
        property: PropertyDescriptor,
        element_type: Option<ElementType>,
    ) -> CoreResult<Self> {
        let object_uri = object_uri.into();
        if !binding.store().exists(&object_uri) {
            return Err(CoreError::IdNotFound(object_uri));
        }
        if let Some(element_type) = &element_type {
            let assignable = binding.store().is_collection_members_assignable_to(
                &object_uri,
                &property,
                element_type.stored_kind(),
            )?;
            if !assignable {
                return Err(CoreError::InvalidType(format!(
                    "incompatible type for property {property}: {element_type}"
                )));
            }
        }
        Ok(Self {
            binding,
            object_uri,
            property,
            element_type,
            external: false,
        })
    }

    /// View over a property of an element held outside the store. It
    /// always reads as empty and ignores writes.
    pub fn external(
        binding: StoreBinding,
        object_uri: impl Into<String>,
        property: PropertyDescriptor,
        element_type: Option<ElementType>,
    ) -> Self {
        Self {
            binding,
            object_uri: object_uri.into(),
            property,
            element_type,
            external: true,
        }
    }

    pub fn is_external(&self) -> bool {
        self.external
    }

    fn ignore_external(&self, operation: &str) -> bool {
        if self.external {
            warn!(uri = %self.object_uri, property = %self.property, operation, "ignoring mutation of an external element");
        }
        self.external
    }

    pub fn object_uri(&self) -> &str {
        &self.object_uri
    }

    pub fn property(&self) -> &PropertyDescriptor {
        &self.property
    }

    pub fn element_type(&self) -> Option<&ElementType> {
        self.element_type.as_ref()
    }

    pub fn store(&self) -> &SharedStore {
        self.binding.store()
    }

    pub fn len(&self) -> CoreResult<usize> {
        if self.external {
            return Ok(0);
        }
        Ok(self.store().collection_size(&self.object_uri, &self.property)?)
    }

    pub fn is_empty(&self) -> CoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Whether an equal element is present. A handle from another store
    /// that can not be brought into this one is never contained.
    pub fn contains(&self, element: &ModelValue) -> CoreResult<bool> {
        if self.external {
            return Ok(false);
        }
        let stored = match convert::element_to_stored(element, &self.binding) {
            Ok(stored) => stored,
            Err(CoreError::NotInStore(_)) => return Ok(false),
            Err(e) => return Err(e),
        };
        Ok(self
            .store()
            .collection_contains(&self.object_uri, &self.property, &stored)?)
    }

    pub fn contains_all(&self, elements: &[ModelValue]) -> CoreResult<bool> {
        for element in elements {
            if !self.contains(element)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Iterate over the elements present now. Each element is converted
    /// and type-checked as it is yielded.
    pub fn iter(&self) -> CoreResult<ModelCollectionIter<'_>> {
        let values = if self.external {
            Vec::new()
        } else {
            self.store().list_values(&self.object_uri, &self.property)?
        };
        Ok(ModelCollectionIter {
            collection: self,
            values: values.into_iter(),
        })
    }

    /// Snapshot of the converted elements.
    pub fn to_vec(&self) -> CoreResult<Vec<ModelValue>> {
        self.iter()?.collect()
    }

    pub fn add(&self, element: ModelValue) -> CoreResult<bool> {
        if self.ignore_external("add") {
            return Ok(false);
        }
        convert::add_to_collection(&self.binding, &self.object_uri, &self.property, &element)
    }

    /// Add every element. Returns `true` if any was added.
    pub fn add_all<I>(&self, elements: I) -> CoreResult<bool>
    where
        I: IntoIterator<Item = ModelValue>,
    {
        let mut changed = false;
        for element in elements {
            changed |= self.add(element)?;
        }
        Ok(changed)
    }

    pub fn remove(&self, element: &ModelValue) -> CoreResult<bool> {
        if self.ignore_external("remove") {
            return Ok(false);
        }
        convert::remove_from_collection(&self.binding, &self.object_uri, &self.property, element)
    }

    /// Remove every occurrence of each element. Returns `true` if anything
    /// was removed.
    pub fn remove_all(&self, elements: &[ModelValue]) -> CoreResult<bool> {
        let mut changed = false;
        for element in elements {
            while self.remove(element)? {
                changed = true;
            }
        }
        Ok(changed)
    }

    /// Keep only elements equal to one of `elements`.
    pub fn retain_all(&self, elements: &[ModelValue]) -> CoreResult<bool> {
        let mut changed = false;
        for existing in self.to_vec()? {
            if !elements.contains(&existing) && self.remove(&existing)? {
                changed = true;
            }
        }
        Ok(changed)
    }

    pub fn clear(&self) -> CoreResult<()> {
        if self.ignore_external("clear") {
            return Ok(());
        }
        Ok(self
            .store()
            .clear_value_collection(&self.object_uri, &self.property)?)
    }

    fn convert(&self, stored: StoredValue) -> CoreResult<ModelValue> {
        let from_individual = matches!(stored, StoredValue::Individual(_));
        let uri = match &stored {
            StoredValue::Individual(uri) => uri.as_str().to_string(),
            _ => String::new(),
        };
        let hint = self.element_type.as_ref().and_then(ElementType::type_hint);
        let value = convert::to_model(stored, &self.binding, hint)?;
        match &self.element_type {
            Some(element_type) if !element_type.accepts(&value) => {
                if from_individual {
                    Err(CoreError::InvalidType(format!(
                        "no enumeration, external element or individual of type {element_type} was found for URI {uri}"
                    )))
                } else {
                    Err(CoreError::InvalidType(format!(
                        "a collection element of type {} was found in a collection of type {element_type}",
                        value.kind_name()
                    )))
                }
            }
            _ => Ok(value),
        }
    }
}

impl fmt::Debug for ModelCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelCollection")
            .field("object_uri", &self.object_uri)
            .field("property", &self.property)
            .field("element_type", &self.element_type)
            .field("external", &self.external)
            .finish()
    }
}

/// Iterator over a [`ModelCollection`].
pub struct ModelCollectionIter<'a> {
    collection: &'a ModelCollection,
    values: vec::IntoIter<StoredValue>,
}

impl Iterator for ModelCollectionIter<'_> {
    type Item = CoreResult<ModelValue>;

    fn next(&mut self) -> Option<Self::Item> {
        let stored = self.values.next()?;
        Some(self.collection.convert(stored))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.values.size_hint()
    }
}

/// Set view: a [`ModelCollection`] that refuses duplicates.
///
/// The presence check and the insert run inside one exclusive critical
/// section, so concurrent adds of the same element store it once.
#[derive(Clone, Debug)]
pub struct ModelSet {
    inner: ModelCollection,
}

impl ModelSet {
    pub fn new(
        binding: StoreBinding,
        object_uri: impl Into<String>,
        property: PropertyDescriptor,
        element_type: Option<ElementType>,
    ) -> CoreResult<Self> {
        Ok(Self {
            inner: ModelCollection::new(binding, object_uri, property, element_type)?,
        })
    }

    /// Set view over a property of an external element; see
    /// [`ModelCollection::external`].
    pub fn external(
        binding: StoreBinding,
        object_uri: impl Into<String>,
        property: PropertyDescriptor,
        element_type: Option<ElementType>,
    ) -> Self {
        Self {
            inner: ModelCollection::external(binding, object_uri, property, element_type),
        }
    }

    pub fn as_collection(&self) -> &ModelCollection {
        &self.inner
    }

    /// Add an element unless an equal one is present.
    pub fn add(&self, element: ModelValue) -> CoreResult<bool> {
        let _lock = self.inner.store().enter_critical_section(false)?;
        if self.inner.contains(&element)? {
            return Ok(false);
        }
        self.inner.add(element)
    }

    pub fn add_all<I>(&self, elements: I) -> CoreResult<bool>
    where
        I: IntoIterator<Item = ModelValue>,
    {
        let _lock = self.inner.store().enter_critical_section(false)?;
        let mut changed = false;
        for element in elements {
            changed |= self.add(element)?;
        }
        Ok(changed)
    }

    pub fn len(&self) -> CoreResult<usize> {
        self.inner.len()
    }

    pub fn is_empty(&self) -> CoreResult<bool> {
        self.inner.is_empty()
    }

    pub fn contains(&self, element: &ModelValue) -> CoreResult<bool> {
        self.inner.contains(element)
    }

    pub fn contains_all(&self, elements: &[ModelValue]) -> CoreResult<bool> {
        self.inner.contains_all(elements)
    }

    pub fn iter(&self) -> CoreResult<ModelCollectionIter<'_>> {
        self.inner.iter()
    }

    pub fn to_vec(&self) -> CoreResult<Vec<ModelValue>> {
        self.inner.to_vec()
    }

    pub fn remove(&self, element: &ModelValue) -> CoreResult<bool> {
        self.inner.remove(element)
    }

    pub fn remove_all(&self, elements: &[ModelValue]) -> CoreResult<bool> {
        self.inner.remove_all(elements)
    }

    pub fn retain_all(&self, elements: &[ModelValue]) -> CoreResult<bool> {
        self.inner.retain_all(elements)
    }

    pub fn clear(&self) -> CoreResult<()> {
        self.inner.clear()
    }
}
