// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use async_graphql::dynamic::InputValue;
use async_graphql::dynamic::ObjectAccessor;
use async_graphql::dynamic::TypeRef;
use async_graphql::Value;

use super::error::QueryError;
use crate::block_range::forward_window;
use crate::block_range::reverse_window;
use crate::block_range::BlockRange;
use crate::defaults::MAX_PAGE_SIZE;
use crate::helpers::parse_decimal_u64;
use crate::storage::Address;
use crate::storage::Hash;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginationArgs {
    pub limit: i32,
    pub offset: i32,
}

impl PaginationArgs {
    pub fn new(limit: i32, offset: i32) -> Result<Self, QueryError> {
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            let reason = format!("must be between 1 and {MAX_PAGE_SIZE}");
            return Err(QueryError::invalid("limit", reason));
        }
        if offset < 0 {
            return Err(QueryError::invalid("offset", "must not be negative"));
        }
        Ok(Self { limit, offset })
    }

    /// Reads `limit` and `offset`, applying `default_limit` and `0`.
    pub fn parse(args: &ObjectAccessor<'_>, default_limit: i32) -> Result<Self, QueryError> {
        let limit = int_arg(args, "limit")?.unwrap_or(default_limit as i64);
        let offset = int_arg(args, "offset")?.unwrap_or(0);
        let limit = i32::try_from(limit).map_err(|_| QueryError::invalid("limit", "out of range"))?;
        let offset =
            i32::try_from(offset).map_err(|_| QueryError::invalid("offset", "out of range"))?;
        Self::new(limit, offset)
    }

    pub fn inputs(default_limit: i32) -> [InputValue; 2] {
        [
            InputValue::new("limit", TypeRef::named(TypeRef::INT))
                .default_value(Value::from(default_limit)),
            InputValue::new("offset", TypeRef::named(TypeRef::INT)).default_value(Value::from(0)),
        ]
    }

    pub fn limit(&self) -> usize {
        self.limit as usize
    }

    pub fn offset(&self) -> usize {
        self.offset as usize
    }

    pub fn reverse_window(&self, latest_height: u64) -> Option<BlockRange> {
        reverse_window(latest_height, self.offset, self.limit)
    }

    pub fn forward_window(&self, number_from: u64, number_to: u64) -> Option<BlockRange> {
        forward_window(number_from, number_to, self.offset, self.limit)
    }
}

/// `null` and absent arguments both read as `None`.
pub fn string_arg(
    args: &ObjectAccessor<'_>,
    name: &'static str,
) -> Result<Option<String>, QueryError> {
    match args.get(name) {
        Some(value) if !value.is_null() => value
            .string()
            .map(|s| Some(s.to_string()))
            .map_err(|_| QueryError::invalid(name, "expected a string")),
        _ => Ok(None),
    }
}

pub fn int_arg(args: &ObjectAccessor<'_>, name: &'static str) -> Result<Option<i64>, QueryError> {
    match args.get(name) {
        Some(value) if !value.is_null() => {
            value.i64().map(Some).map_err(|_| QueryError::invalid(name, "expected an integer"))
        }
        _ => Ok(None),
    }
}

pub fn bool_arg(args: &ObjectAccessor<'_>, name: &'static str) -> Result<Option<bool>, QueryError> {
    match args.get(name) {
        Some(value) if !value.is_null() => {
            value.boolean().map(Some).map_err(|_| QueryError::invalid(name, "expected a boolean"))
        }
        _ => Ok(None),
    }
}

pub fn enum_arg(
    args: &ObjectAccessor<'_>,
    name: &'static str,
) -> Result<Option<String>, QueryError> {
    match args.get(name) {
        Some(value) if !value.is_null() => value
            .enum_name()
            .map(|s| Some(s.to_string()))
            .map_err(|_| QueryError::invalid(name, "expected an enum value")),
        _ => Ok(None),
    }
}

pub fn required<T>(name: &'static str, value: Option<T>) -> Result<T, QueryError> {
    value.ok_or_else(|| QueryError::invalid(name, "is required"))
}

pub fn parse_address(name: &'static str, value: &str) -> Result<Address, QueryError> {
    value.parse().map_err(|err| QueryError::invalid(name, format!("not an address: {err}")))
}

pub fn parse_hash(name: &'static str, value: &str) -> Result<Hash, QueryError> {
    value.parse().map_err(|err| QueryError::invalid(name, format!("not a hash: {err}")))
}

pub fn parse_block_number(name: &'static str, value: &str) -> Result<u64, QueryError> {
    parse_decimal_u64(value)
        .ok_or_else(|| QueryError::invalid(name, "expected a base-10 unsigned integer"))
}

pub fn address_arg(args: &ObjectAccessor<'_>, name: &'static str) -> Result<Address, QueryError> {
    parse_address(name, &required(name, string_arg(args, name)?)?)
}

pub fn number_arg(
    args: &ObjectAccessor<'_>,
    name: &'static str,
) -> Result<Option<u64>, QueryError> {
    string_arg(args, name)?.map(|value| parse_block_number(name, &value)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_bounds() {
        assert_eq!(PaginationArgs::new(20, 0).unwrap(), PaginationArgs { limit: 20, offset: 0 });
        assert!(PaginationArgs::new(MAX_PAGE_SIZE, 5).is_ok());

        for (limit, offset, name) in
            [(0, 0, "limit"), (-3, 0, "limit"), (MAX_PAGE_SIZE + 1, 0, "limit"), (20, -1, "offset")]
        {
            match PaginationArgs::new(limit, offset) {
                Err(QueryError::InvalidArgument { name: got, .. }) => assert_eq!(got, name),
                other => panic!("expected invalid {name}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_pagination_windows() {
        let paging = PaginationArgs::new(20, 20).unwrap();
        assert_eq!(paging.reverse_window(100), BlockRange::new(61, 80));
        assert_eq!(paging.forward_window(50, 150), BlockRange::new(70, 89));
        assert_eq!(paging.forward_window(50, 60), None);
    }

    #[test]
    fn test_scalar_parsers() {
        assert!(parse_address("address", "0x00000000000000000000000000000000000000aa").is_ok());
        assert!(parse_address("address", "0xaa").is_err());
        assert!(parse_hash("hash", &format!("0x{}", "ab".repeat(32))).is_ok());
        assert!(parse_hash("hash", "0x<script>").is_err());
        assert_eq!(parse_block_number("number", "42").unwrap(), 42);
        assert!(parse_block_number("number", "-1").is_err());
        assert!(parse_block_number("number", "1e3").is_err());

        let err = required::<u64>("numberFrom", None).unwrap_err();
        assert_eq!(err.to_string(), "Invalid argument `numberFrom`: is required");
    }
}
