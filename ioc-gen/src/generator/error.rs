/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error type for IOC assembly and record generation.
//!
//! A single enum, [`ConfigError`], covers every failure that can happen while
//! turning an IOC description into a record database.  Three variants are the
//! record-generation failures proper:
//!
//! * [`ConfigError::EmptyVariable`] / [`ConfigError::InvalidVariable`]:
//!   `generate()` was given no variable, or one that is not an identifier.
//! * [`ConfigError::UndefinedLink`]: a FLNK points at a record that has not
//!   been registered.
//! * [`ConfigError::UnknownRecordType`]: the dynamic record-type dispatch was
//!   asked for a key outside the closed record-type set.
//!
//! The remaining variants describe setup mistakes (modules, ports, scan
//! strings) and are raised by the module registry, the port model and the
//! IOC builder.
//!
//! **Do not** replace these with `anyhow::Error` inside the library: callers
//! match on the variants.  `anyhow` is reserved for file loading and the
//! binaries.

use thiserror::Error;

/// Top-level error type for the library.
///
/// | Variant | Raised by |
/// |---|---|
/// | `EmptyPrefix` / `EmptyVariable` / `InvalidVariable` | `RecordGenerator::generate` |
/// | `ProtocolNotInitialized` | `RecordGenerator::generate` / `create` |
/// | `UndefinedLink` / `DuplicateRecord` / `ReservedField` | `RecordDatabase::insert` |
/// | `UnknownRecordType` | `RecordGenerator::create`, `RecordType::from_key` |
/// | `DuplicateModule` / `UnknownModule` / `RegistrySealed` | `ModuleRegistry`, `ProtocolFile` |
/// | `InvalidPort` | `AsynIpPort::new` |
/// | `InvalidScan` | `Scan::parse` |
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `generate()` was called with an empty prefix.
    #[error("record name prefix is empty")]
    EmptyPrefix,

    /// `generate()` was called with an empty variable name.
    #[error("protocol variable name is empty")]
    EmptyVariable,

    /// The variable name is used verbatim in record names and protocol
    /// arguments, so only ASCII letters, digits and `_` are accepted.
    #[error("invalid protocol variable name: '{0}'")]
    InvalidVariable(String),

    /// Records were requested before a stream protocol was attached to the
    /// generator.
    #[error("stream protocol is not initialized: attach a protocol before generating records")]
    ProtocolNotInitialized,

    /// A forward link targets a record that is not (yet) in the database.
    #[error("record '{record}' has FLNK to undefined record '{target}'")]
    UndefinedLink { record: String, target: String },

    /// The record-type key is not one of the StreamDevice record types.
    #[error("unknown record type: '{0}'")]
    UnknownRecordType(String),

    /// A record with this name is already registered in the IOC.
    #[error("record '{0}' is already defined")]
    DuplicateRecord(String),

    /// An extra field overrides one the generator writes itself.
    #[error("record '{record}' sets reserved field {field}")]
    ReservedField { record: String, field: String },

    /// A module with this name was registered twice.
    #[error("module '{0}' is already registered")]
    DuplicateModule(String),

    /// A protocol file references a module that was never registered.
    #[error("module '{0}' is not registered")]
    UnknownModule(String),

    /// `register()` was called after the registry was sealed.
    #[error("cannot register module '{module}': registry is sealed")]
    RegistrySealed { module: String },

    /// The asyn port name or address is malformed.
    #[error("invalid asyn port '{port}': {reason}")]
    InvalidPort { port: String, reason: String },

    /// A SCAN string is not one of the EPICS scan menu choices.
    #[error("invalid SCAN value: '{0}'")]
    InvalidScan(String),
}
