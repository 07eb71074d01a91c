// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//
pub mod block_range;
pub mod defaults;
pub mod helpers;
pub mod schema;
pub mod storage;
pub mod web;
