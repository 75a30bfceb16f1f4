//! The component factory and value codec registry.
//!
//! A [`Registry`] maps value type tags to [`ValueCodec`]s and component names to
//! [`ComponentShape`]s, and holds the timezone resolver used while decoding.
//! It is read-mostly: lookups take a read lock, registration a write lock.
//! Parsers borrow a registry for their whole run; [`global()`] is the
//! process-wide instance used when none is given.

use lazy_static::lazy_static;
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use crate::{
    codec::{ValueCodec, builtin_codecs},
    component,
    property::{PropertyType, property_type},
    types::{TzResolver, default_resolver},
};

/// What a component name stands for: per-property type overrides and the
/// properties a canonical ordering puts first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentShape {
    pub name: String,
    /// Registered up front, as opposed to synthesized for an unknown name.
    pub known: bool,
    property_types: HashMap<String, PropertyType>,
    pub sort_first: &'static [&'static str],
}

impl ComponentShape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            known: true,
            property_types: HashMap::new(),
            sort_first: &[],
        }
    }

    /// Shape of a vendor or unrecognized IANA component.
    pub fn generic(name: impl Into<String>) -> Self {
        Self {
            known: false,
            ..Self::new(name)
        }
    }

    pub fn with_property(mut self, name: &str, property_type: PropertyType) -> Self {
        self.property_types
            .insert(name.to_ascii_uppercase(), property_type);
        self
    }

    pub fn with_sort_first(mut self, names: &'static [&'static str]) -> Self {
        self.sort_first = names;
        self
    }

    /// Declaration of `name` inside this component: the shape's own entry, else
    /// the global property table.
    pub fn property_type(&self, name: &str) -> Option<PropertyType> {
        let base = name.rsplit_once('.').map_or(name, |(_, name)| name);
        self.property_types
            .get(&base.to_ascii_uppercase())
            .copied()
            .or_else(|| property_type(base))
    }
}

pub struct Registry {
    codecs: RwLock<HashMap<String, Arc<dyn ValueCodec>>>,
    shapes: RwLock<HashMap<String, Arc<ComponentShape>>>,
    resolver: RwLock<Arc<dyn TzResolver>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// A registry with every built-in codec and component shape.
    pub fn new() -> Self {
        let codecs = builtin_codecs()
            .into_iter()
            .map(|(tag, codec)| (tag.to_owned(), codec))
            .collect();
        let shapes = component::ical::shapes()
            .into_iter()
            .chain(component::vcard::shapes())
            .map(|shape| (shape.name.clone(), Arc::new(shape)))
            .collect();
        Self {
            codecs: RwLock::new(codecs),
            shapes: RwLock::new(shapes),
            resolver: RwLock::new(default_resolver()),
        }
    }

    /// Register or replace the codec for `tag`.
    pub fn register_value_type(&self, tag: &str, codec: Arc<dyn ValueCodec>) {
        tracing::debug!(tag, "registering value type");
        self.codecs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(tag.to_ascii_uppercase(), codec);
    }

    /// Register or replace a component with its property type declarations.
    pub fn register_component(
        &self,
        name: &str,
        property_types: &[(&str, PropertyType)],
    ) -> Arc<ComponentShape> {
        let shape = property_types
            .iter()
            .fold(ComponentShape::new(name), |shape, (prop, property_type)| {
                shape.with_property(prop, *property_type)
            });
        self.register_shape(shape)
    }

    pub fn register_shape(&self, shape: ComponentShape) -> Arc<ComponentShape> {
        tracing::debug!(component = %shape.name, "registering component");
        let shape = Arc::new(shape);
        self.shapes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(shape.name.clone(), shape.clone());
        shape
    }

    pub fn set_resolver(&self, resolver: Arc<dyn TzResolver>) {
        *self.resolver.write().unwrap_or_else(PoisonError::into_inner) = resolver;
    }

    pub fn resolver(&self) -> Arc<dyn TzResolver> {
        self.resolver
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn codec(&self, tag: &str) -> Option<Arc<dyn ValueCodec>> {
        self.codecs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&tag.to_ascii_uppercase())
            .cloned()
    }

    /// Shape for a component name. Unknown names get a generic shape that is
    /// created once and reused afterwards.
    pub fn shape(&self, name: &str) -> Arc<ComponentShape> {
        let key = name.to_ascii_uppercase();
        if let Some(shape) = self
            .shapes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return shape.clone();
        }
        let mut shapes = self.shapes.write().unwrap_or_else(PoisonError::into_inner);
        shapes
            .entry(key)
            .or_insert_with_key(|key| {
                tracing::debug!(component = %key, "synthesizing generic component shape");
                Arc::new(ComponentShape::generic(key.as_str()))
            })
            .clone()
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.shapes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&name.to_ascii_uppercase())
            .is_some_and(|shape| shape.known)
    }

    /// Number of shapes, synthesized ones included.
    pub fn shape_count(&self) -> usize {
        self.shapes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

lazy_static! {
    static ref GLOBAL: Registry = Registry::new();
}

/// The process-wide registry.
pub fn global() -> &'static Registry {
    &GLOBAL
}
