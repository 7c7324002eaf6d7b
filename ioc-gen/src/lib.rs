/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! ioc-gen – StreamDevice IOC record generator
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── config/      – YAML IOC description
//! ├── module/      – support module registry (init-once)
//! ├── port/        – asyn IP port + simulated serial device
//! ├── protocol/    – protocol file bound to a port
//! ├── record/      – record types, SCAN policy, stream links
//! ├── database/    – name-unique, FLNK-checked record store
//! ├── generator/   – record generator, record-type dispatch, errors
//! └── ioc/         – assembles a description into a generated IOC
//! ```

pub mod config;
pub mod database;
pub mod generator;
pub mod ioc;
pub mod module;
pub mod port;
pub mod protocol;
pub mod record;
