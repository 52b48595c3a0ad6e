//! Recursive validation of model objects.
//!
//! Verification reports data problems as warning strings and only returns
//! `Err` for structural or store-access failures. Every object URI is
//! visited at most once per pass, which breaks reference cycles.

use std::collections::HashSet;

use tracing::debug;

use crate::error::CoreResult;
use crate::object::ModelObject;
use crate::value::{ModelValue, PropertyValue};

impl ModelObject {
    /// Verify against the handle's own spec version.
    pub fn verify(&self) -> CoreResult<Vec<String>> {
        let spec_version = self.spec_version().to_string();
        self.verify_with(&mut HashSet::new(), &spec_version)
    }

    /// Verify against another spec version.
    pub fn verify_for_version(&self, spec_version: &str) -> CoreResult<Vec<String>> {
        self.verify_with(&mut HashSet::new(), spec_version)
    }

    /// Verify this object and everything reachable from it that is not
    /// already in `verified`.
    pub fn verify_with(
        &self,
        verified: &mut HashSet<String>,
        spec_version: &str,
    ) -> CoreResult<Vec<String>> {
        if self.is_external() || !verified.insert(self.object_uri().to_string()) {
            return Ok(Vec::new());
        }
        debug!(uri = %self.object_uri(), spec_version, "verifying");
        let mut warnings = Vec::new();
        if !self.registry().contains_spec_version(spec_version) {
            warnings.push(format!("{}: unknown spec version {spec_version}", self.object_uri()));
        }
        match self.store().typed_value(self.object_uri())? {
            None => {
                warnings.push(format!("{} does not exist in the model store", self.object_uri()));
                return Ok(warnings);
            }
            Some(existing) if existing.type_name() != self.type_name() => {
                warnings.push(format!(
                    "{} is stored as {} but accessed as {}",
                    self.object_uri(),
                    existing.type_name(),
                    self.type_name()
                ));
            }
            Some(_) => {}
        }

        for property in self.property_descriptors()? {
            let prefix = format!("in {property} of {}: ", self.object_uri());
            match self.get_object_property_value(&property) {
                Ok(Some(PropertyValue::Single(ModelValue::Object(object)))) => {
                    let nested = object.verify_with(verified, spec_version)?;
                    warnings.extend(nested.into_iter().map(|w| format!("{prefix}{w}")));
                }
                Ok(Some(PropertyValue::Collection(collection))) => {
                    let mut objects = Vec::new();
                    for element in collection.iter()? {
                        match element {
                            Ok(ModelValue::Object(object)) => objects.push(object),
                            Ok(_) => {}
                            Err(e) if e.is_structural() => return Err(e),
                            Err(e) => warnings.push(format!("{prefix}{e}")),
                        }
                    }
                    warnings.extend(verify_collection(
                        &objects,
                        Some(prefix.as_str()),
                        verified,
                        spec_version,
                    )?);
                }
                Ok(_) => {}
                Err(e) if e.is_structural() => return Err(e),
                Err(e) => warnings.push(format!("{prefix}{e}")),
            }
        }

        match self.model_type().verify(self, verified, spec_version) {
            Ok(type_warnings) => warnings.extend(type_warnings),
            Err(e) if e.is_structural() => return Err(e),
            Err(e) => warnings.push(format!("{}: {e}", self.object_uri())),
        }
        Ok(warnings)
    }
}

/// Verify each object, prefixing every warning with `warning_prefix`.
pub fn verify_collection<'a, I>(
    objects: I,
    warning_prefix: Option<&str>,
    verified: &mut HashSet<String>,
    spec_version: &str,
) -> CoreResult<Vec<String>>
where
    I: IntoIterator<Item = &'a ModelObject>,
{
    let mut warnings = Vec::new();
    for object in objects {
        for warning in object.verify_with(verified, spec_version)? {
            match warning_prefix {
                Some(prefix) => warnings.push(format!("{prefix}{warning}")),
                None => warnings.push(warning),
            }
        }
    }
    Ok(warnings)
}
