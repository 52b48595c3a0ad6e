//! Store contract and reference backends for docmodel.
//!
//! A store exclusively owns all persisted state of a document graph. Model
//! object handles and collection views in `docmodel-core` cache nothing and
//! route every read and write through a [`ModelStore`].
//!
//! # Storage Backends
//!
//! All backends implement the [`ModelStore`] trait:
//!
//! - [`InMemoryModelStore`] -- `HashMap`-based store for tests and embedding
//! - [`NullModelStore`] -- holds nothing; only usable with constants and
//!   individuals
//!
//! # Contract
//!
//! 1. Operations on a non-existent object fail explicitly. Creation is
//!    always an opt-in caller decision.
//! 2. Collection operations are valid only once the owning object exists.
//! 3. One type per object URI for the lifetime of the entry.
//! 4. Critical sections are advisory: the backend provides the exclusion,
//!    callers decide which sequences need it.

pub mod config;
pub mod error;
pub mod lock;
pub mod memory;
pub mod null;
pub mod traits;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use lock::CriticalSection;
pub use memory::InMemoryModelStore;
pub use null::NullModelStore;
pub use traits::ModelStore;
