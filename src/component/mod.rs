//! The component tree.
//!
//! Every component, known or not, is a [`Component`]: a name, its properties
//! in arrival order, its subcomponents and what went wrong while building it.
//! Names map to a [`crate::registry::ComponentShape`] that declares property
//! types; the tree itself carries no per-type structure.

pub mod ical;
pub use ical::timezone::VTimezone;
pub mod vcard;

use std::collections::HashSet;

use crate::{parser::Diagnostic, property::Property};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Component {
    /// Name as read from `BEGIN:`.
    pub name: String,
    pub properties: Vec<Property>,
    pub components: Vec<Component>,
    /// Diagnostics recorded while this component was built.
    pub errors: Vec<Diagnostic>,
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[inline]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn get_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|prop| prop.is_named(name))
    }

    pub fn get_property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|prop| prop.is_named(name))
    }

    pub fn get_properties<'c>(&'c self, name: &'c str) -> impl Iterator<Item = &'c Property> {
        self.properties.iter().filter(move |prop| prop.is_named(name))
    }

    /// Append a property. Properties keep the order they were added in.
    #[inline]
    pub fn add_property(&mut self, property: Property) {
        self.properties.push(property);
    }

    pub fn remove_property(&mut self, name: &str) {
        self.properties.retain(|prop| !prop.is_named(name));
    }

    #[inline]
    pub fn add_component(&mut self, component: Component) {
        self.components.push(component);
    }

    pub fn get_components<'c>(&'c self, name: &'c str) -> impl Iterator<Item = &'c Component> {
        self.components.iter().filter(move |comp| comp.is_named(name))
    }

    /// Whether this component or any below it recorded a diagnostic.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || self.components.iter().any(Component::has_errors)
    }

    /// Every `TZID` referenced by a property parameter in this subtree.
    pub fn timezone_ids(&self) -> HashSet<&str> {
        let mut ids: HashSet<&str> = self
            .properties
            .iter()
            .filter_map(|prop| prop.params.get_tzid())
            .collect();
        for comp in &self.components {
            ids.extend(comp.timezone_ids());
        }
        ids
    }

    /// `VTIMEZONE` children.
    pub fn timezones(&self) -> impl Iterator<Item = VTimezone<'_>> {
        self.components.iter().filter_map(VTimezone::new)
    }
}
