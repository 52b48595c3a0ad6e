//! Object-store abstraction layer for versioned document models.
//!
//! Concrete, spec-versioned model types plug into a [`ModelRegistry`]
//! through the [`ModelInfo`] contract. Every object they produce is a
//! [`ModelObject`]: a stateless handle onto an entry in a
//! [`ModelStore`](docmodel_store::ModelStore). Handles never cache property
//! values; reads and writes go through the conversion layer ([`convert`]) to
//! the store, and multi-valued properties are exposed as live, write-through
//! [`ModelCollection`] / [`ModelSet`] views.
//!
//! # Modules
//!
//! - [`registry`] -- spec version → model info dispatch table
//! - [`model_info`] -- contracts for type packages, [`StaticModelInfo`]
//! - [`object`] -- the model-object handle and its builder
//! - [`equivalence`] -- value-level comparison of handles
//! - [`verify`] -- cycle-safe recursive validation
//! - [`convert`] -- model values to stored values and back
//! - [`collection`] -- store-backed collection and set views
//! - [`copy`] -- cross-store copy contract and reference implementation
//! - [`context`] -- explicit default store / copy manager context
//!
//! # Design Rules
//!
//! 1. One type per object URI for the lifetime of its store entry.
//! 2. Composite values are stored as typed references, individuals as bare
//!    URIs; nothing else is ever inlined.
//! 3. Missing entries are only created when the builder asks for it, under
//!    the store's exclusive critical section, re-checked after locking.
//! 4. Handles from another store are only persisted through a copy manager.
//! 5. `verify` reports bad data as warnings; only store failures are errors.

pub mod binding;
pub mod collection;
pub mod context;
pub mod convert;
pub mod copy;
pub mod equivalence;
pub mod error;
pub mod individual;
pub mod model_info;
pub mod object;
pub mod registry;
pub mod value;
pub mod verify;

#[cfg(test)]
pub(crate) mod testing;

pub use binding::{same_store, SharedStore, StoreBinding};
pub use collection::{ModelCollection, ModelCollectionIter, ModelSet};
pub use context::ModelContext;
pub use copy::{CopyManager, ModelCopyManager, SharedCopyManager};
pub use equivalence::{NotEquivalent, NotEquivalentReason};
pub use error::{CoreError, CoreResult};
pub use individual::Individual;
pub use model_info::{ExternalElementType, ModelInfo, ModelType, ObjectFactory, StaticModelInfo};
pub use object::{ModelObject, ModelObjectBuilder, ModelUpdate};
pub use registry::ModelRegistry;
pub use value::{ElementType, ModelValue, PropertyValue};
pub use verify::verify_collection;

pub use docmodel_store::{CriticalSection, InMemoryModelStore, ModelStore, NullModelStore};
pub use docmodel_types::{IdType, IndividualUri, PropertyDescriptor, StoredValue, TypedValue};
