//! vCard (RFC 6350, and the RFC 2426 3.0 dialect as far as it reads the same).
//!
//! `N`, `ADR` and `ORG` decode into the named records of [`crate::types`].
//! Group prefixes (`item1.TEL`) are kept in the property name.

use crate::{
    property::PropertyType,
    registry::ComponentShape,
    types::tag,
};

const TEXT: PropertyType = PropertyType::new(tag::TEXT);
const URI: PropertyType = PropertyType::new(tag::URI);

pub(crate) fn shapes() -> Vec<ComponentShape> {
    vec![
        ComponentShape::new("VCARD")
            .with_sort_first(&["VERSION", "FN", "N"])
            // geo: URI instead of the iCalendar float pair
            .with_property("GEO", URI)
            .with_property("TEL", TEXT)
            .with_property("TZ", TEXT)
            .with_property("LANG", TEXT)
            .with_property("IMPP", URI)
            .with_property("MEMBER", URI)
            .with_property("FBURL", URI)
            .with_property("CALURI", URI)
            .with_property("CALADRURI", URI)
            .with_property("CATEGORIES", PropertyType::new(tag::TEXT).list(',')),
    ]
}
