// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use async_graphql::dynamic::Object;
use async_graphql::dynamic::TypeRef;
use serde::Serialize;
use serde::Serializer;

use super::wire::wire_field;
use super::wire::WireField;
use super::wire::WireObject;
use crate::storage::Page;

/// Offset paging only: cursors are always `None`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

impl WireObject for PageInfo {
    const TYPE_NAME: &'static str = "PageInfo";

    fn describe() -> Vec<WireField> {
        vec![
            wire_field("hasNextPage", TypeRef::named_nn(TypeRef::BOOLEAN)),
            wire_field("hasPreviousPage", TypeRef::named_nn(TypeRef::BOOLEAN)),
            wire_field("startCursor", TypeRef::named(TypeRef::STRING)),
            wire_field("endCursor", TypeRef::named(TypeRef::STRING)),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub nodes: Vec<T>,
    #[serde(serialize_with = "saturating_int")]
    pub total_count: u64,
    pub page_info: PageInfo,
}

impl<T> Connection<T> {
    /// `nodes` is the page found at `offset`. Without a total the count
    /// degrades to `nodes.len()`, which also reports no next page.
    pub fn new(nodes: Vec<T>, offset: u64, total_count: Option<u64>) -> Self {
        let seen = offset.saturating_add(nodes.len() as u64);
        let total_count = total_count.unwrap_or(nodes.len() as u64);
        let page_info = PageInfo {
            has_next_page: seen < total_count,
            has_previous_page: offset > 0,
            start_cursor: None,
            end_cursor: None,
        };
        Self { nodes, total_count, page_info }
    }

    pub fn empty(offset: u64, total_count: u64) -> Self {
        Self::new(Vec::new(), offset, Some(total_count))
    }

    pub fn from_page<M>(page: Page<M>, offset: u64) -> Self
    where
        T: From<M>,
    {
        let nodes = page.items.into_iter().map(T::from).collect();
        Self::new(nodes, offset, page.total_count)
    }
}

/// `totalCount` is a GraphQL `Int`; larger counts report `i32::MAX`.
fn saturating_int<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i32(i32::try_from(*value).unwrap_or(i32::MAX))
}

pub fn connection_type_name(node_type: &str) -> String {
    format!("{node_type}Connection")
}

/// `{Node}Connection { nodes, totalCount, pageInfo }`.
pub fn connection_object<T: WireObject>() -> Object {
    let fields = vec![
        wire_field("nodes", TypeRef::named_nn_list_nn(T::TYPE_NAME)),
        wire_field("totalCount", TypeRef::named_nn(TypeRef::INT)),
        wire_field("pageInfo", TypeRef::named_nn(PageInfo::TYPE_NAME)),
    ];
    fields.into_iter().fold(Object::new(connection_type_name(T::TYPE_NAME)), |object, field| {
        object.field(field.into_field())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_info_flags() {
        let first = Connection::new(vec!["a", "b"], 0, Some(2));
        assert!(!first.page_info.has_next_page);
        assert!(!first.page_info.has_previous_page);

        let second = Connection::new(vec!["b"], 1, Some(2));
        assert!(!second.page_info.has_next_page);
        assert!(second.page_info.has_previous_page);

        let middle = Connection::new(vec!["b", "c"], 1, Some(10));
        assert!(middle.page_info.has_next_page);
        assert!(middle.page_info.has_previous_page);
        assert_eq!(middle.page_info.start_cursor, None);
        assert_eq!(middle.page_info.end_cursor, None);
    }

    #[test]
    fn test_missing_total_degrades_to_page_length() {
        let connection = Connection::new(vec![1, 2, 3], 20, None);
        assert_eq!(connection.total_count, 3);
        assert!(!connection.page_info.has_next_page);
        assert!(connection.page_info.has_previous_page);
    }

    #[test]
    fn test_total_count_saturates_at_graphql_int() {
        let connection = Connection::<u64>::empty(0, 5_000_000_001);
        assert_eq!(connection.total_count, 5_000_000_001);
        let value = async_graphql::to_value(&connection).unwrap();
        let async_graphql::Value::Object(map) = value else { panic!("expected object") };
        assert_eq!(map.get("totalCount"), Some(&async_graphql::Value::from(i32::MAX)));

        let value = async_graphql::to_value(&Connection::<u64>::empty(0, 101)).unwrap();
        let async_graphql::Value::Object(map) = value else { panic!("expected object") };
        assert_eq!(map.get("totalCount"), Some(&async_graphql::Value::from(101)));
    }

    #[test]
    fn test_from_page() {
        let page = Page { items: vec![1u8, 2], total_count: Some(5) };
        let connection: Connection<u64> = Connection::from_page(page, 0);
        assert_eq!(connection.nodes, vec![1, 2]);
        assert!(connection.page_info.has_next_page);
    }

    #[test]
    fn test_empty_page_past_the_end() {
        let connection = Connection::<u64>::empty(40, 21);
        assert!(connection.nodes.is_empty());
        assert_eq!(connection.total_count, 21);
        assert!(!connection.page_info.has_next_page);
        assert!(connection.page_info.has_previous_page);
    }
}
