// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

//! The single boundary where domain values become GraphQL values.
//!
//! A wire node is serialized once into an `async_graphql::Value::Object`;
//! the fields of its GraphQL object type only read their entry back out of
//! the parent value.

use async_graphql::dynamic::Field;
use async_graphql::dynamic::FieldFuture;
use async_graphql::dynamic::FieldValue;
use async_graphql::dynamic::Object;
use async_graphql::dynamic::TypeRef;
use async_graphql::Name;
use async_graphql::Value;
use serde::Serialize;

use super::error::QueryError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WireKind {
    Plain,
    Enum,
}

pub struct WireField {
    name: &'static str,
    ty: TypeRef,
    kind: WireKind,
}

pub fn wire_field(name: &'static str, ty: TypeRef) -> WireField {
    WireField { name, ty, kind: WireKind::Plain }
}

/// Field whose serialized string is a member of a GraphQL enum.
pub fn wire_enum_field(name: &'static str, ty: TypeRef) -> WireField {
    WireField { name, ty, kind: WireKind::Enum }
}

impl WireField {
    pub fn into_field(self) -> Field {
        let WireField { name, ty, kind } = self;
        Field::new(name, ty, move |ctx| {
            let value = ctx.parent_value.as_value().and_then(|parent| match parent {
                Value::Object(map) => map.get(name),
                _ => None,
            });
            let value = value.and_then(|value| field_value(value, kind));
            FieldFuture::new(async move { Ok::<_, async_graphql::Error>(value) })
        })
    }
}

fn field_value<'a>(value: &Value, kind: WireKind) -> Option<FieldValue<'a>> {
    match value {
        Value::Null => None,
        Value::List(items) => Some(FieldValue::list(
            items.iter().filter_map(|item| field_value(item, kind)).collect::<Vec<_>>(),
        )),
        Value::String(s) if kind == WireKind::Enum => {
            Some(FieldValue::value(Value::Enum(Name::new(s))))
        }
        other => Some(FieldValue::value(other.clone())),
    }
}

/// Domain entity exposed as a GraphQL object type.
pub trait WireObject: Serialize {
    const TYPE_NAME: &'static str;

    fn describe() -> Vec<WireField>;

    fn object() -> Object {
        Self::describe()
            .into_iter()
            .fold(Object::new(Self::TYPE_NAME), |object, field| object.field(field.into_field()))
    }
}

pub fn wire_value<'a, T: Serialize>(value: &T) -> Result<FieldValue<'a>, QueryError> {
    async_graphql::to_value(value).map(FieldValue::value).map_err(|err| QueryError::Encode {
        type_name: std::any::type_name::<T>(),
        reason: err.to_string(),
    })
}

/// Non-null result of a resolver.
pub fn wire_some<'a, T: Serialize>(value: &T) -> Result<Option<FieldValue<'a>>, QueryError> {
    wire_value(value).map(Some)
}

pub fn wire_list<'a, T: Serialize>(values: &[T]) -> Result<Option<FieldValue<'a>>, QueryError> {
    let items = values.iter().map(|value| wire_value(value)).collect::<Result<Vec<_>, _>>()?;
    Ok(Some(FieldValue::list(items)))
}

/// `serialize_with` helpers rendering numbers as base-10 strings.
pub mod decimal {
    use std::fmt::Display;

    use serde::Serializer;

    pub fn serialize<T: Display, S: Serializer>(
        value: &T,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub mod option {
        use std::fmt::Display;

        use serde::Serializer;

        pub fn serialize<T: Display, S: Serializer>(
            value: &Option<T>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => serializer.collect_str(value),
                None => serializer.serialize_none(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Sample {
        #[serde(serialize_with = "decimal::serialize")]
        big_number: u64,
        #[serde(serialize_with = "decimal::option::serialize")]
        maybe: Option<u64>,
        tags: Vec<&'static str>,
    }

    #[test]
    fn test_wire_value_shapes_object() {
        let sample = Sample { big_number: u64::MAX, maybe: None, tags: vec!["a"] };
        let value = async_graphql::to_value(&sample).unwrap();
        let Value::Object(map) = value else { panic!("expected object") };
        assert_eq!(map.get("bigNumber"), Some(&Value::from("18446744073709551615")));
        assert_eq!(map.get("maybe"), Some(&Value::Null));
        assert!(matches!(map.get("tags"), Some(Value::List(_))));
    }

    #[test]
    fn test_field_value_maps_enum_and_null() {
        assert!(field_value(&Value::Null, WireKind::Plain).is_none());
        let enum_value = field_value(&Value::from("VOTING"), WireKind::Enum).unwrap();
        assert_eq!(enum_value.as_value(), Some(&Value::Enum(Name::new("VOTING"))));
        let plain = field_value(&Value::from("VOTING"), WireKind::Plain).unwrap();
        assert_eq!(plain.as_value(), Some(&Value::from("VOTING")));
    }
}
