//! iCalendar components.
//!
//! Every RFC 5545 component plus `VAVAILABILITY` (RFC 7953) is registered with
//! its own shape. Most of them only differ from the global property table in
//! the order canonical output puts properties in.
//!
//! # Examples
//!
//! ```rust
//! use std::fs::read_to_string;
//!
//! let buf = read_to_string("./tests/resources/ical_events.ics").unwrap();
//! let calendar = calcodec::parse(buf.as_bytes()).unwrap();
//!
//! for event in calendar.get_components("VEVENT") {
//!     println!("{:?}", event.get_property("SUMMARY"));
//! }
//! ```

pub mod timezone;

use crate::{
    property::PropertyType,
    registry::ComponentShape,
    types::tag,
};

const TEXT: PropertyType = PropertyType::new(tag::TEXT);

const SCHEDULED: &[&str] = &["UID", "DTSTAMP", "DTSTART"];

pub(crate) fn shapes() -> Vec<ComponentShape> {
    vec![
        ComponentShape::new("VCALENDAR")
            .with_sort_first(&["VERSION", "PRODID", "CALSCALE", "METHOD"])
            // widespread vendor extensions
            .with_property("X-WR-CALNAME", TEXT)
            .with_property("X-WR-CALDESC", TEXT)
            .with_property("X-WR-TIMEZONE", TEXT),
        ComponentShape::new("VEVENT").with_sort_first(SCHEDULED),
        ComponentShape::new("VTODO").with_sort_first(SCHEDULED),
        ComponentShape::new("VJOURNAL").with_sort_first(SCHEDULED),
        ComponentShape::new("VFREEBUSY").with_sort_first(SCHEDULED),
        ComponentShape::new("VAVAILABILITY").with_sort_first(SCHEDULED),
        ComponentShape::new("AVAILABLE").with_sort_first(SCHEDULED),
        ComponentShape::new("VALARM").with_sort_first(&["ACTION", "TRIGGER"]),
        ComponentShape::new("VTIMEZONE")
            .with_sort_first(&["TZID"])
            .with_property("X-LIC-LOCATION", TEXT),
        transition("STANDARD"),
        transition("DAYLIGHT"),
    ]
}

fn transition(name: &str) -> ComponentShape {
    ComponentShape::new(name).with_sort_first(&["DTSTART", "TZOFFSETFROM", "TZOFFSETTO"])
}
