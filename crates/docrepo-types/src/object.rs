//! Registered business objects.
//!
//! A business object is any application type mapped to and from the wire by
//! a marshaller the application registers. The client carries it as a
//! type-erased value tagged with its adapter entity type; callers get the
//! concrete type back with [`EntityObject::downcast_ref`].

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Type-erased, shareable business object
#[derive(Clone)]
pub struct EntityObject {
    entity_type: String,
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl EntityObject {
    pub fn new<T: Any + Send + Sync>(entity_type: impl Into<String>, value: T) -> Self {
        Self {
            entity_type: entity_type.into(),
            type_name: std::any::type_name::<T>(),
            value: Arc::new(value),
        }
    }

    /// Adapter entity type this object is exchanged as
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Rust type name of the wrapped value
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type id of the wrapped value, used to find its encoder
    pub fn value_type_id(&self) -> TypeId {
        (*self.value).type_id()
    }

    pub fn value(&self) -> &(dyn Any + Send + Sync) {
        &*self.value
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }
}

impl fmt::Debug for EntityObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityObject")
            .field("entity_type", &self.entity_type)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
