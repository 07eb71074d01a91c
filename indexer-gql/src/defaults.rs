// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//
pub const PATH_TO_DB: &str = "sqlite://data/indexer.db";
pub const LISTEN: &str = "127.0.0.1:3000";
pub const REQUEST_TIMEOUT: u64 = 30; // in seconds

pub const DB_OPEN_ATTEMPTS: u16 = 3;
pub const DB_OPEN_INTERVAL: u64 = 3; // in seconds
pub const MAX_POOL_CONNECTIONS: u32 = 16;

pub const PAGE_SIZE: i32 = 20;
pub const LARGE_PAGE_SIZE: i32 = 100;
pub const MAX_PAGE_SIZE: i32 = 1000;
pub const ACTIVITY_WINDOW: i32 = 100;

pub const MAX_QUERY_DEPTH: usize = 15;
pub const MAX_QUERY_COMPLEXITY: usize = 500;
pub const MAX_LABEL_LENGTH: usize = 64;
