// SPDX-License-Identifier: Apache-2.0

//! Built-in drivers

pub mod duckdb;
