use crate::{property::Property, types::Value};

/// The `RANGE` parameter of `RECURRENCE-ID`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecurIdRange {
    #[default]
    This,
    ThisAndFuture,
}

impl RecurIdRange {
    /// Range of a `RECURRENCE-ID` property. `None` for other properties and unknown ranges.
    pub fn of(prop: &Property) -> Option<Self> {
        if !prop.is_named("RECURRENCE-ID") {
            return None;
        }
        match prop.params.get_param("RANGE") {
            None => Some(Self::This),
            Some(range) if range.eq_ignore_ascii_case("THISANDFUTURE") => Some(Self::ThisAndFuture),
            Some(_) => None,
        }
    }

    /// Set the range on `prop`. `This` is the default and is written by leaving `RANGE` out.
    pub fn apply(self, prop: &mut Property) {
        match self {
            Self::This => prop.params.remove("RANGE"),
            Self::ThisAndFuture => prop
                .params
                .replace_param("RANGE".to_owned(), "THISANDFUTURE".to_owned()),
        }
    }
}

impl Property {
    /// Whether this `RECURRENCE-ID` and `dtstart` agree on being dates or
    /// date-times and on their zone.
    pub fn matches_dtstart(&self, dtstart: &Property) -> bool {
        match (&self.value, &dtstart.value) {
            (Value::Date(_), Value::Date(_)) => true,
            (Value::DateTime(a), Value::DateTime(b)) => a.zone.is_consistent_with(&b.zone),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{generator::Emitter, parser::parse};
    use rstest::rstest;

    fn first_property(input: &str) -> Property {
        let comp = parse(format!("BEGIN:VEVENT\r\n{input}END:VEVENT\r\n").as_bytes()).unwrap();
        comp.properties.into_iter().next().unwrap()
    }

    #[rstest]
    #[case("RECURRENCE-ID;VALUE=DATE:19960401\r\n", RecurIdRange::This)]
    #[case("RECURRENCE-ID;RANGE=THISANDFUTURE:19960120T120000Z\r\n", RecurIdRange::ThisAndFuture)]
    fn roundtrip(#[case] input: &str, #[case] range: RecurIdRange) {
        let prop = first_property(input);
        assert_eq!(RecurIdRange::of(&prop), Some(range));
        similar_asserts::assert_eq!(prop.generate(), input);
    }

    #[test]
    fn apply_range() {
        let mut prop = first_property("RECURRENCE-ID:19960120T120000Z\r\n");
        RecurIdRange::ThisAndFuture.apply(&mut prop);
        assert_eq!(
            prop.generate(),
            "RECURRENCE-ID;RANGE=THISANDFUTURE:19960120T120000Z\r\n"
        );
        RecurIdRange::This.apply(&mut prop);
        assert_eq!(prop.generate(), "RECURRENCE-ID:19960120T120000Z\r\n");
    }

    #[test]
    fn dtstart_must_match() {
        let recurid = first_property("RECURRENCE-ID;TZID=Europe/Berlin:20240101T100000\r\n");
        let same_zone = first_property("DTSTART;TZID=Europe/Berlin:20240101T090000\r\n");
        let utc = first_property("DTSTART:20240101T090000Z\r\n");
        let date = first_property("DTSTART;VALUE=DATE:20240101\r\n");
        assert!(recurid.matches_dtstart(&same_zone));
        assert!(!recurid.matches_dtstart(&utc));
        assert!(!recurid.matches_dtstart(&date));
    }
}
