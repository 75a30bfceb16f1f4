use crate::{
    codec::DecodeContext,
    escape::split_unescaped,
    parser::ContentLine,
    property::Property,
    registry::{ComponentShape, Registry},
    types::{BrokenValue, TzResolver, Value, tag},
};

/// Value type tag that applies to `line` inside `shape`.
///
/// An explicit `VALUE=` wins, then `ENCODING=B`/`BASE64` (vCard 3 inline data),
/// then the declared default. Properties nobody declares stay `UNKNOWN`.
pub fn resolve_value_type(line: &ContentLine, shape: &ComponentShape) -> String {
    if let Some(value_type) = line.params.get_value_type() {
        return value_type.to_ascii_uppercase();
    }
    if line
        .params
        .get_param("ENCODING")
        .is_some_and(|encoding| encoding.eq_ignore_ascii_case("B") || encoding.eq_ignore_ascii_case("BASE64"))
    {
        return tag::BINARY.to_owned();
    }
    shape
        .property_type(&line.name)
        .map_or_else(|| tag::UNKNOWN.to_owned(), |declared| declared.default_type.to_owned())
}

/// Decode a content line into a property.
///
/// Never fails: text the codec rejects is kept as a [`Value::Broken`] and the
/// remaining properties of the component are unaffected.
pub fn decode_property(
    line: ContentLine,
    shape: &ComponentShape,
    registry: &Registry,
    resolver: &dyn TzResolver,
) -> Property {
    let value_type = resolve_value_type(&line, shape);
    let ContentLine { name, params, value: raw } = line;

    let Some(codec) = registry.codec(&value_type) else {
        return Property {
            name,
            params,
            value_type,
            value: Value::Unknown(raw),
        };
    };

    let ctx = DecodeContext {
        property: &name,
        params: &params,
        resolver,
    };
    let separator = shape.property_type(&name).and_then(|declared| declared.separator);
    let decoded = match separator {
        Some(separator) => split_unescaped(&raw, separator)
            .into_iter()
            .map(|item| codec.decode(item, &ctx))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        None => codec.decode(&raw, &ctx),
    };

    match decoded {
        Ok(value) => {
            // A built-in codec may legitimately produce a sibling type
            // (DATE-TIME holding a bare date), custom tags are kept as given.
            let value_type = match value.value_type() {
                Some(actual) if tag::is_builtin(&value_type) && actual != value_type => actual.to_owned(),
                _ => value_type,
            };
            Property {
                name,
                params,
                value_type,
                value,
            }
        }
        Err(error) => {
            tracing::warn!(property = %name, value_type = %value_type, %error, "keeping undecodable value as broken");
            let broken = BrokenValue {
                property: name.clone(),
                raw,
                expected_type: value_type.clone(),
                error,
            };
            Property {
                name,
                params,
                value_type,
                value: Value::Broken(broken),
            }
        }
    }
}
