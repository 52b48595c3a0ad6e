//! Identity primitives for docmodel.
//!
//! Every other docmodel crate depends on `docmodel-types`. Nothing here knows
//! about stores or registries; these are the plain values that cross the
//! store boundary.
//!
//! # Key Types
//!
//! - [`PropertyDescriptor`] -- (name, namespace) key of a property slot
//! - [`TypedValue`] -- persisted form of a reference to a composite object
//! - [`IndividualUri`] -- persisted form of an individual (URI only)
//! - [`StoredValue`] -- closed set of values a store may hold
//! - [`IdType`] / [`IdScheme`] -- id-kind classification from string shape

pub mod error;
pub mod id;
pub mod property;
pub mod typed_value;
pub mod value;

pub use error::TypeError;
pub use id::{local_part, IdScheme, IdType};
pub use property::PropertyDescriptor;
pub use typed_value::TypedValue;
pub use value::{IndividualUri, StoredKind, StoredValue};
