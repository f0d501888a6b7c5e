//! `PropertySet` for pass communication.
//!
//! Passes share results through a type-keyed store: an analysis pass
//! inserts a value of its own type and later passes (or the caller) look
//! it up by type.
//!
//! ```
//! use circopt_passes::{DynamicCircuit, PropertySet};
//!
//! let mut props = PropertySet::new();
//! props.insert(DynamicCircuit(true));
//!
//! assert_eq!(props.get::<DynamicCircuit>(), Some(&DynamicCircuit(true)));
//! assert_eq!(props.remove::<DynamicCircuit>(), Some(DynamicCircuit(true)));
//! assert!(props.is_empty());
//! ```

use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};
use std::fmt;

/// Result of the dynamic-circuit analysis.
///
/// `true` when the circuit contains resets, classical control, or
/// operations after a measurement on the same qubit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicCircuit(pub bool);

/// Shared state passed through all passes of a pipeline.
#[derive(Default)]
pub struct PropertySet {
    /// Custom properties storage (type-erased).
    custom: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl PropertySet {
    /// Create a new empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a custom property.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.custom.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Get a custom property.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.custom
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Get a mutable custom property.
    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.custom
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut())
    }

    /// Remove a custom property.
    pub fn remove<T: Any>(&mut self) -> Option<T> {
        self.custom
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|v| *v)
    }

    /// Number of stored properties.
    pub fn len(&self) -> usize {
        self.custom.len()
    }

    /// Whether no property is stored.
    pub fn is_empty(&self) -> bool {
        self.custom.is_empty()
    }
}

impl fmt::Debug for PropertySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySet")
            .field("custom", &self.custom.len())
            .finish()
    }
}
