use itertools::Itertools;

use crate::{
    component::Component,
    generator::{Emitter, Generator, Ordering},
    parser::{ContentLine, ContentLineParams},
    property::{Property, PropertyType},
    registry::{ComponentShape, Registry},
    types::{Value, tag},
};

/// Encode `prop` as it appears inside a component of the given shape.
///
/// Broken and untyped values keep their raw text and parameters. Everything
/// else is written by the codec for the property's `value_type`, and the
/// `VALUE` parameter is brought in line with it.
pub fn encode_property(prop: &Property, shape: &ComponentShape, registry: &Registry) -> ContentLine {
    let mut params = prop.params.clone();
    let value = match &prop.value {
        Value::Broken(broken) => broken.raw.clone(),
        Value::Unknown(raw) => raw.clone(),
        value => {
            let declared = shape.property_type(&prop.name);
            let had_encoding = params.has_param("ENCODING");
            let codec = registry.codec(&prop.value_type);
            let separator = declared
                .and_then(|declared| declared.separator)
                .unwrap_or(',')
                .to_string();
            let text = value
                .as_list()
                .iter()
                .map(|item| match &codec {
                    Some(codec) => codec.encode(item, &mut params),
                    None => item.to_string(),
                })
                .join(&separator);
            sync_value_type(&prop.value_type, declared, had_encoding, &mut params);
            text
        }
    };
    ContentLine {
        name: prop.name.clone(),
        params,
        value,
    }
}

/// Rewrite an existing `VALUE` in place, add one only where the type is not the implied one.
fn sync_value_type(
    value_type: &str,
    declared: Option<PropertyType>,
    had_encoding: bool,
    params: &mut ContentLineParams,
) {
    if let Some(current) = params.get_value_type() {
        if !current.eq_ignore_ascii_case(value_type) {
            params.replace_param("VALUE".to_owned(), value_type.to_owned());
        }
        return;
    }
    let implied = match declared {
        // vCard 3 inline data is BINARY by virtue of its ENCODING
        _ if had_encoding && value_type == tag::BINARY => true,
        Some(declared) => declared.default_type.eq_ignore_ascii_case(value_type),
        None => value_type == tag::TEXT,
    };
    if !implied {
        params.push("VALUE".to_owned(), vec![value_type.to_owned()]);
    }
}

fn sort_key(shape: &ComponentShape, name: &str) -> (usize, String) {
    let base = name.rsplit_once('.').map_or(name, |(_, base)| base);
    let rank = shape
        .sort_first
        .iter()
        .position(|first| first.eq_ignore_ascii_case(base))
        .unwrap_or(shape.sort_first.len());
    (rank, name.to_ascii_uppercase())
}

impl Generator<'_> {
    pub(crate) fn write_component(&self, comp: &Component, out: &mut String) {
        let shape = self.registry.shape(&comp.name);
        out.push_str(&format!("BEGIN:{}\r\n", comp.name));

        let mut properties: Vec<&Property> = comp.properties.iter().collect();
        let mut components: Vec<&Component> = comp.components.iter().collect();
        if self.ordering == Ordering::Canonical {
            // sort_by_key is stable, equal keys keep arrival order
            properties.sort_by_key(|prop| sort_key(&shape, &prop.name));
            components.sort_by_key(|sub| (!sub.is_named("VTIMEZONE"), sub.name.to_ascii_uppercase()));
        }

        for prop in properties {
            out.push_str(&encode_property(prop, &shape, self.registry).generate());
        }
        for sub in components {
            self.write_component(sub, out);
        }
        out.push_str(&format!("END:{}\r\n", comp.name));
    }
}
