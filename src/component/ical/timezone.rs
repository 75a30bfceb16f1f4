use crate::{
    component::Component,
    types::{TzResolver, TzRules},
};

/// Read-only view of a `VTIMEZONE` component.
#[derive(Debug, Clone, Copy)]
pub struct VTimezone<'c>(&'c Component);

impl<'c> VTimezone<'c> {
    /// `None` unless `component` is a `VTIMEZONE`.
    pub fn new(component: &'c Component) -> Option<Self> {
        component.is_named("VTIMEZONE").then_some(Self(component))
    }

    #[inline]
    pub fn component(&self) -> &'c Component {
        self.0
    }

    fn text(&self, name: &str) -> Option<&'c str> {
        self.0
            .get_property(name)
            .and_then(|prop| prop.value.as_str())
    }

    pub fn tzid(&self) -> Option<&'c str> {
        self.text("TZID")
    }

    /// This is a common property containing a timezone identifier from the IANA TZDB
    pub fn lic_location(&self) -> Option<&'c str> {
        self.text("X-LIC-LOCATION")
    }

    /// `STANDARD` and `DAYLIGHT` subcomponents.
    pub fn transitions(&self) -> impl Iterator<Item = &'c Component> {
        self.0
            .components
            .iter()
            .filter(|comp| comp.is_named("STANDARD") || comp.is_named("DAYLIGHT"))
    }

    /// Rules for this timezone, tried by `X-LIC-LOCATION` first and `TZID` second.
    pub fn resolve_with(&self, resolver: &dyn TzResolver) -> Option<TzRules> {
        self.lic_location()
            .and_then(|location| resolver.resolve(location))
            .or_else(|| self.tzid().and_then(|tzid| resolver.resolve(tzid)))
    }
}
