/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Record-type dispatch table.
//!
//! Records can be requested by a record-type name chosen at runtime (for
//! example from the IOC description).  The table maps each EPICS record type
//! name to the constructor for that type and is validated against
//! [`RecordType::ALL`] when it is built, so a lookup either finds a constructor
//! for a real StreamDevice record type or fails with
//! [`ConfigError::UnknownRecordType`].

use std::collections::HashMap;

use crate::generator::ConfigError;
use crate::record::{Record, RecordType, StreamLink};

/// Builds records of one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordConstructor {
    record_type: RecordType,
}

impl RecordConstructor {
    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn build(&self, name: impl Into<String>, link: StreamLink) -> Record {
        Record::new(name, self.record_type, link)
    }
}

/// Record-type name → constructor.
#[derive(Debug, Clone)]
pub struct ConstructorTable {
    entries: HashMap<&'static str, RecordConstructor>,
}

impl ConstructorTable {
    /// Build the table for every supported record type.
    ///
    /// Key consistency of [`RecordType`] (unique keys that parse back to
    /// their own type) is checked in debug builds only.
    pub fn new() -> Self {
        let mut entries = HashMap::with_capacity(RecordType::ALL.len());
        for record_type in RecordType::ALL {
            let key = record_type.key();
            debug_assert_eq!(
                RecordType::from_key(key),
                Ok(record_type),
                "record type key '{}' does not round-trip",
                key
            );
            let previous = entries.insert(key, RecordConstructor { record_type });
            debug_assert!(previous.is_none(), "duplicate record type key '{}'", key);
        }
        Self { entries }
    }

    /// Look up the constructor for `key`.
    pub fn get(&self, key: &str) -> Result<&RecordConstructor, ConfigError> {
        self.entries
            .get(key)
            .ok_or_else(|| ConfigError::UnknownRecordType(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ConstructorTable {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn link() -> StreamLink {
        StreamLink {
            protocol_file: "test.proto".into(),
            protocol: "reseed".into(),
            args: vec![],
            port: "port".into(),
        }
    }

    #[test]
    fn table_covers_every_record_type() {
        let table = ConstructorTable::new();
        assert_eq!(table.len(), RecordType::ALL.len());
        for t in RecordType::ALL {
            assert_eq!(table.get(t.key()).unwrap().record_type(), t);
        }
    }

    #[test]
    fn constructor_builds_record_of_its_type() {
        let table = ConstructorTable::new();
        let rec = table.get("stringout").unwrap().build("P:stringout", link());
        assert_eq!(rec.record_type, RecordType::Stringout);
        assert_eq!(rec.name, "P:stringout");
        assert!(rec.flnk.is_none());
    }

    #[test]
    fn unknown_key_fails() {
        let table = ConstructorTable::new();
        assert_eq!(
            table.get("unknowntype").unwrap_err(),
            ConfigError::UnknownRecordType("unknowntype".into())
        );
        assert!(!table.contains("calc"), "calc has no stream device support");
    }

    #[test]
    fn default_table_is_complete_and_consistent() {
        let table = ConstructorTable::default();
        assert_eq!(table.len(), RecordType::ALL.len());
        for t in RecordType::ALL {
            assert_eq!(RecordType::from_key(t.key()), Ok(t));
            assert!(table.contains(t.key()));
        }
        assert!(table.contains("mbboDirect"));
        assert!(!table.is_empty());
    }
}
