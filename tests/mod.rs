use calcodec::LineReader;
use std::borrow::Cow;

// Simple function for sorting properties and components
// to allow for order-invariant comparison of Emitter outputs
pub fn lines_normalise_prop_order<'a>(
    line_iter: &mut impl Iterator<Item = Cow<'a, str>>,
    header: Option<Cow<'a, str>>,
) -> Vec<Cow<'a, str>> {
    let mut props = vec![];
    let mut comps = vec![];
    let mut end = None;
    while let Some(line) = line_iter.next() {
        if line.to_uppercase().starts_with("BEGIN:") {
            comps.push(lines_normalise_prop_order(line_iter, Some(line)));
        } else if line.to_uppercase().starts_with("END:") {
            end = Some(line);
            break;
        } else {
            props.push(line);
        }
    }
    assert_eq!(header.is_some(), end.is_some());
    props.sort();

    [
        header.map(|hdr| vec![hdr]).unwrap_or_default(),
        props,
        comps.into_iter().flatten().collect(),
        end.map(|end| vec![end]).unwrap_or_default(),
    ]
    .concat()
}

pub fn str_normalise_prop_order(input: &str) -> String {
    let mut lines = LineReader::from_slice(input.as_bytes()).map(|line| line.unwrap().inner);
    let sorted = lines_normalise_prop_order(&mut lines, None);
    sorted.join("\r\n") + "\r\n"
}

pub mod sort_lines {
    use crate::lines_normalise_prop_order;
    use calcodec::LineReader;
    use itertools::Itertools;

    #[test]
    fn test_sort_output_lines() {
        let lines = vec![
            "a",
            "c",
            "b",
            "begin:event",
            "d",
            "a",
            "begin:alarm",
            "g",
            "f",
            "end:alarm",
            "end:event",
            "begin:event",
            "p",
            "a",
            "end:event",
            "d",
        ];
        let input = lines.join("\r\n") + "\r\n";
        let mut lines = LineReader::from_slice(input.as_bytes()).map(|line| line.unwrap().inner);
        let sorted = lines_normalise_prop_order(&mut lines, None);
        assert_eq!(
            sorted.iter().collect_vec(),
            vec![
                "a",
                "b",
                "c",
                "d",
                "begin:event",
                "a",
                "d",
                "begin:alarm",
                "f",
                "g",
                "end:alarm",
                "end:event",
                "begin:event",
                "a",
                "p",
                "end:event",
            ]
        );
    }
}

pub mod property {
    use calcodec::ContentLineParser;
    use itertools::Itertools;
    use rstest::rstest;

    #[rstest]
    #[case(include_str!("./resources/ical_events.ics"))]
    #[case(include_str!("./resources/ical_everything.ics"))]
    #[case(include_str!("./resources/vcard_input.vcf"))]
    fn tokenizes(#[case] input: &str) {
        let reader = ContentLineParser::from_slice(input.as_bytes());
        for res in reader {
            res.unwrap();
        }
    }

    #[test]
    fn errors() {
        let input = include_str!("./resources/property_error.vcf");
        let errors = ContentLineParser::from_slice(input.as_bytes())
            .map(|res| res.unwrap_err().to_string())
            .join("\n");
        insta::assert_snapshot!(errors, @r#"
        Line 1: Missing property name.
        Line 2: Missing a parameter key.
        Line 3: Missing a closing quote.
        Line 4: Invalid character ' ' in property name.
        Line 5: Missing a ":" delimiter.
        "#);
    }
}

pub mod line {
    use calcodec::LineReader;
    use rstest::rstest;

    #[test]
    fn multioctet_line_wrapping() {
        let input = b"\xc3\r\n \xbc";
        let line = LineReader::from_slice(input.as_slice())
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(line.as_str(), "ü");
    }

    #[rstest]
    #[case(b"\xc3\r\n \x00")]
    #[case(b"\xc3\r\n ")]
    #[case(b"\xc3 \r\n \xbc")]
    fn invalid_lines(#[case] input: &[u8]) {
        assert!(LineReader::from_slice(input).next().unwrap().is_err());
    }

    #[test]
    fn byte_order_mark_and_bare_lf() {
        let input = b"\xef\xbb\xbfBEGIN:VCALENDAR\nSUMMARY:a\n b\nEND:VCALENDAR\n";
        let lines: Vec<_> = LineReader::from_slice(input)
            .map(|line| line.unwrap().inner.into_owned())
            .collect();
        assert_eq!(lines, ["BEGIN:VCALENDAR", "SUMMARY:ab", "END:VCALENDAR"]);
    }
}

pub mod parser {
    use calcodec::{
        Emitter, LexErrorPolicy, ParserOptions, Value, parse, parse_document,
        parser::{ComponentParser, DiagnosticKind, StructuralError},
        types::tag,
    };
    use rstest::rstest;

    #[rstest]
    #[case(include_str!("./resources/ical_events.ics"))]
    #[case(include_str!("./resources/ical_everything.ics"))]
    #[case(include_str!("./resources/ical_vendor.ics"))]
    fn lossless_roundtrip(#[case] input: &str) {
        let cal = parse(input.as_bytes()).unwrap();
        assert!(!cal.has_errors(), "{:#?}", cal);
        similar_asserts::assert_eq!(cal.generate(), input);
    }

    #[test]
    fn vcards_roundtrip() {
        let input = include_str!("./resources/vcard_input.vcf");
        let doc = ComponentParser::from_slice(input.as_bytes())
            .into_document()
            .unwrap();
        assert_eq!(doc.components.len(), 2);
        assert!(doc.is_clean());
        similar_asserts::assert_eq!(doc.generate(), input);
    }

    #[test]
    fn custom_component_is_preserved() {
        let input = "BEGIN:VCALENDAR\r\nBEGIN:X-VENDOR\r\nX-PROP:v\r\nEND:X-VENDOR\r\nEND:VCALENDAR\r\n";
        let cal = parse(input.as_bytes()).unwrap();
        let vendor = &cal.components[0];
        assert_eq!(vendor.name, "X-VENDOR");
        assert_eq!(vendor.properties[0].value_type, tag::UNKNOWN);
        assert_eq!(cal.generate(), input);
    }

    #[test]
    fn escaped_comma_stays_in_one_category() {
        let input = include_str!("./resources/ical_events.ics");
        let cal = parse(input.as_bytes()).unwrap();
        let event = cal.get_components("VEVENT").next().unwrap();
        let categories = event.get_property("CATEGORIES").unwrap();
        assert_eq!(
            categories.value,
            Value::List(vec![
                Value::Text("Meeting, John".to_owned()),
                Value::Text("Work".to_owned()),
            ])
        );
    }

    #[test]
    fn lone_end_is_a_diagnostic() {
        let doc = parse_document(b"END:VEVENT\r\n");
        assert!(doc.components.is_empty());
        assert_eq!(doc.diagnostics.len(), 1);
        assert_eq!(doc.diagnostics[0].to_string(), "Line 1: END:VEVENT without a matching BEGIN");
        assert_eq!(
            parse(b"END:VEVENT\r\n").unwrap_err(),
            calcodec::ParserError::EmptyInput
        );
    }

    #[test]
    fn parameter_spelling_survives() {
        let input = "BEGIN:VCARD\r\n\
            VERSION:2.1\r\n\
            TEL;WORK;VOICE:+1-555-123-4567\r\n\
            EMAIL;TYPE=\"internet\":john@example.com\r\n\
            END:VCARD\r\n";
        let card = parse(input.as_bytes()).unwrap();
        assert_eq!(
            card.get_property("TEL").unwrap().params.get_values("type"),
            Some(["WORK".to_owned()].as_slice())
        );
        similar_asserts::assert_eq!(card.generate(), input);
    }

    #[test]
    fn address_keeps_empty_fields() {
        let input = "BEGIN:VCARD\r\nVERSION:4.0\r\nADR:Street 1;;City;;12345\r\nEND:VCARD\r\n";
        let card = parse(input.as_bytes()).unwrap();
        let Value::Address(address) = &card.get_property("ADR").unwrap().value else {
            panic!("ADR is not an address");
        };
        assert_eq!(address.len(), 5);
        assert_eq!(address.po_box(), "Street 1");
        assert_eq!(address.extended(), "");
        assert_eq!(address.street(), "City");
        assert_eq!(address.region(), "12345");
        similar_asserts::assert_eq!(card.generate(), input);
    }

    #[test]
    fn everything_decodes() {
        let input = include_str!("./resources/ical_everything.ics");
        let cal = parse(input.as_bytes()).unwrap();
        let event = cal.get_components("VEVENT").next().unwrap();

        let rdate = event.get_property("RDATE").unwrap();
        assert_eq!(rdate.value_type, tag::PERIOD);
        assert!(matches!(rdate.value.as_list(), [Value::Period(_), Value::Period(_)]));

        let attachments: Vec<_> = event.get_properties("ATTACH").collect();
        assert_eq!(attachments[0].value_type, tag::BINARY);
        let Value::Binary(data) = &attachments[0].value else {
            panic!("inline attachment is not binary");
        };
        assert!(data.starts_with(b"calcodec test attachment"));
        assert_eq!(attachments[1].value_type, tag::URI);

        assert_eq!(
            event.get_property("RESOURCES").unwrap().value.as_list().len(),
            3
        );
        assert_eq!(
            event.get_property("COMMENT").unwrap().as_text().unwrap(),
            "Bring a friend; or two"
        );
        assert_eq!(
            event.get_property("X-CUSTOM").unwrap().as_text().unwrap(),
            "raw value, untouched"
        );

        let freebusy = cal.get_components("VFREEBUSY").next().unwrap();
        let periods: Vec<_> = freebusy.get_properties("FREEBUSY").collect();
        assert_eq!(periods[0].param_or_default("FBTYPE"), Some("BUSY"));
        assert_eq!(periods[1].param_or_default("FBTYPE"), Some("BUSY-TENTATIVE"));

        let widget = cal.get_components("X-VENDOR-WIDGET").next().unwrap();
        assert_eq!(widget.get_property("X-SIZE").unwrap().value, Value::Unknown("12".to_owned()));
    }

    #[test_log::test]
    fn malformed_input_recovers() {
        let input = include_str!("./resources/ical_malformed.ics");
        let doc = parse_document(input.as_bytes());
        assert_eq!(doc.components.len(), 1);
        assert_eq!(doc.diagnostics.len(), 1);
        assert_eq!(
            doc.diagnostics[0].kind,
            DiagnosticKind::Structure(StructuralError::UnmatchedEnd("VCALENDAR".to_owned()))
        );

        let cal = &doc.components[0];
        assert!(cal.errors.is_empty());
        let event = &cal.components[0];
        let report: Vec<_> = event.errors.iter().map(ToString::to_string).collect();
        similar_asserts::assert_eq!(
            report,
            [
                "Line 5 (DTSTART): invalid DATE-TIME: \"NOT-A-DATE\"",
                "Line 7 (PRIORITY): invalid INTEGER: \"high\"",
                "Line 8: Missing a \":\" delimiter.",
                "Line 9: END:VTODO does not close the open VEVENT",
            ]
        );
        assert_eq!(
            event.get_property("SUMMARY").unwrap().value,
            Value::Text("Hello".to_owned())
        );
        let alarm = &event.components[0];
        assert_eq!(alarm.errors.len(), 1);
        assert_eq!(alarm.errors[0].to_string(), "Line 12: VALARM was never closed");

        similar_asserts::assert_eq!(
            doc.generate(),
            "BEGIN:VCALENDAR\r\n\
            VERSION:2.0\r\n\
            BEGIN:VEVENT\r\n\
            UID:bad-1\r\n\
            DTSTART:NOT-A-DATE\r\n\
            SUMMARY:Hello\r\n\
            PRIORITY:high\r\n\
            BEGIN:VALARM\r\n\
            ACTION:AUDIO\r\n\
            END:VALARM\r\n\
            END:VEVENT\r\n\
            END:VCALENDAR\r\n"
        );
    }

    #[test]
    fn abort_on_lex_error() {
        let input = include_str!("./resources/ical_malformed.ics");
        let result = ComponentParser::from_slice(input.as_bytes())
            .with_options(ParserOptions::default().with_lex_errors(LexErrorPolicy::Abort))
            .expect_one();
        insta::assert_snapshot!(result.unwrap_err(), @r#"content line error: Line 8: Missing a ":" delimiter."#);
    }
}

pub mod ordering {
    use crate::str_normalise_prop_order;
    use calcodec::{
        Generator, GeneratorOptions, generator::Ordering, parse, registry::global,
    };
    use rstest::rstest;

    #[rstest]
    #[case(include_str!("./resources/ical_events.ics"))]
    #[case(include_str!("./resources/ical_everything.ics"))]
    fn canonical_order_keeps_content(#[case] input: &str) {
        let cal = parse(input.as_bytes()).unwrap();
        let generator = Generator::new(global())
            .with_options(GeneratorOptions::default().with_ordering(Ordering::Canonical));
        let canonical = generator.component(&cal);
        similar_asserts::assert_eq!(
            str_normalise_prop_order(&canonical),
            str_normalise_prop_order(input)
        );
        // stable: a second pass changes nothing
        let reparsed = parse(canonical.as_bytes()).unwrap();
        similar_asserts::assert_eq!(generator.component(&reparsed), canonical);
    }
}

pub mod timezones {
    use calcodec::parse;
    use chrono::TimeZone;
    use std::collections::HashSet;

    #[test]
    fn referenced_and_defined_timezones() {
        let input = include_str!("./resources/ical_events.ics");
        let cal = parse(input.as_bytes()).unwrap();
        assert_eq!(cal.timezone_ids(), HashSet::from(["Europe/Berlin"]));
        let defined: Vec<_> = cal.timezones().filter_map(|tz| tz.tzid()).collect();
        assert_eq!(defined, ["Europe/Berlin"]);
    }

    #[cfg(feature = "chrono-tz")]
    #[test]
    fn zoned_start_to_utc() {
        let input = include_str!("./resources/ical_events.ics");
        let cal = parse(input.as_bytes()).unwrap();
        let event = cal.get_components("VEVENT").next().unwrap();
        let dtstart = event.get_property("DTSTART").unwrap();
        assert_eq!(
            dtstart.value.as_date_time().unwrap().to_utc(),
            Some(chrono::Utc.with_ymd_and_hms(2024, 1, 5, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn expand_recurrence() {
        let input = include_str!("./resources/ical_events.ics");
        let cal = parse(input.as_bytes()).unwrap();
        let event = cal.get_components("VEVENT").next().unwrap();
        let calcodec::Value::Recur(rule) = &event.get_property("RRULE").unwrap().value else {
            panic!("RRULE is not a recurrence rule");
        };
        let dtstart = rrule::Tz::UTC.with_ymd_and_hms(2024, 1, 5, 8, 0, 0).unwrap();
        let occurrences = rule.expand(dtstart, 100).unwrap();
        assert_eq!(occurrences.len(), 13);
        assert_eq!(occurrences[12], rrule::Tz::UTC.with_ymd_and_hms(2024, 3, 29, 8, 0, 0).unwrap());
    }
}

pub mod registry {
    use calcodec::{
        ComponentParser, Emitter, Registry,
        property::PropertyType,
        registry::global,
        types::{Value, tag},
    };

    #[test]
    fn concurrent_parses_share_the_registry() {
        let input = include_str!("./resources/ical_vendor.ics");
        std::thread::scope(|scope| {
            for i in 0..8 {
                scope.spawn(move || {
                    global().register_component(
                        &format!("X-THREAD-{i}"),
                        &[("X-N", PropertyType::new(tag::INTEGER))],
                    );
                    for _ in 0..20 {
                        let cal = ComponentParser::from_slice(input.as_bytes())
                            .expect_one()
                            .unwrap();
                        assert_eq!(cal.generate(), input);
                    }
                });
            }
        });
        for i in 0..8 {
            assert!(global().is_known(&format!("x-thread-{i}")));
        }
    }

    #[test]
    fn registered_component_types_apply() {
        let registry = Registry::new();
        registry.register_component("X-VENDOR", &[("X-PROP", PropertyType::new(tag::TEXT))]);
        let input = include_str!("./resources/ical_vendor.ics");
        let cal = ComponentParser::from_slice(input.as_bytes())
            .with_registry(&registry)
            .expect_one()
            .unwrap();
        let vendor = &cal.components[0];
        assert_eq!(vendor.get_property("X-PROP").unwrap().value, Value::Text("v".to_owned()));
        // still written back unchanged
        assert_eq!(
            calcodec::Generator::new(&registry).component(&cal),
            input
        );
    }
}
