// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use chrono::DateTime;
use chrono::SecondsFormat;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Strict base-10 `u64`: ASCII digits only, no sign, no whitespace.
pub fn parse_decimal_u64(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Unix seconds as an RFC 3339 UTC string.
pub fn rfc3339(timestamp: u64) -> Option<String> {
    let seconds = i64::try_from(timestamp).ok()?;
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

pub fn init_tracing() {
    // Init tracing
    let filter = match std::env::var("GQL_VERBOSE") {
        Ok(v) if !v.is_empty() => tracing_subscriber::filter::Targets::new()
            .with_target("indexer_gql", LevelFilter::TRACE)
            .with_target("resolver", LevelFilter::TRACE)
            .with_target("sqlx", LevelFilter::OFF),
        _ => tracing_subscriber::filter::Targets::new()
            .with_target("indexer_gql", LevelFilter::INFO)
            .with_target("resolver", LevelFilter::WARN)
            .with_target("sqlx", LevelFilter::OFF),
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_thread_ids(true)
                .with_ansi(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_u64() {
        assert_eq!(parse_decimal_u64("0"), Some(0));
        assert_eq!(parse_decimal_u64("18446744073709551615"), Some(u64::MAX));
        assert_eq!(parse_decimal_u64("18446744073709551616"), None);
        assert_eq!(parse_decimal_u64("+5"), None);
        assert_eq!(parse_decimal_u64("-5"), None);
        assert_eq!(parse_decimal_u64(" 5"), None);
        assert_eq!(parse_decimal_u64("0x10"), None);
        assert_eq!(parse_decimal_u64(""), None);
    }

    #[test]
    fn test_rfc3339() {
        assert_eq!(rfc3339(0).as_deref(), Some("1970-01-01T00:00:00Z"));
        assert_eq!(rfc3339(1_700_000_000).as_deref(), Some("2023-11-14T22:13:20Z"));
        assert_eq!(rfc3339(u64::MAX), None);
    }
}
