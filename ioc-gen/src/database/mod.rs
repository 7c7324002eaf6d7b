/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Ordered, name-unique store of the records making up one IOC.
//!
//! Two invariants are enforced on every insertion:
//!
//! 1. Record names are unique within the database.
//! 2. A record's FLNK must name a record that is already present: forward
//!    references to records defined later are rejected.
//!
//! Extra fields may not override the fields a record renders itself
//! ([`RESERVED_FIELDS`](crate::record::RESERVED_FIELDS)).
//!
//! Records keep their insertion order so the rendered `.db` file is
//! deterministic and reads in the order the records were generated.

use std::collections::HashMap;

use tracing::debug;

use crate::generator::ConfigError;
use crate::record::Record;

#[derive(Debug, Default)]
pub struct RecordDatabase {
    records: Vec<Record>,
    /// Record name → index into `records`.
    index: HashMap<String, usize>,
}

impl RecordDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `record` to the database.
    ///
    /// # Errors
    /// * [`ConfigError::DuplicateRecord`] if the name is already taken.
    /// * [`ConfigError::UndefinedLink`] if the FLNK target is not present.
    /// * [`ConfigError::ReservedField`] if an extra field is a reserved one.
    ///
    /// The database is unchanged when an error is returned.
    pub fn insert(&mut self, record: Record) -> Result<(), ConfigError> {
        self.check_insertable(&record)?;

        debug!(
            record = %record.name,
            record_type = %record.record_type,
            scan = %record.scan,
            flnk = ?record.flnk,
            "Registered record"
        );

        self.index.insert(record.name.clone(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    /// Run the insertion checks for `record` without inserting it.
    pub fn check_insertable(&self, record: &Record) -> Result<(), ConfigError> {
        if self.contains(&record.name) {
            return Err(ConfigError::DuplicateRecord(record.name.clone()));
        }
        if let Some(field) = record.reserved_field() {
            return Err(ConfigError::ReservedField {
                record: record.name.clone(),
                field: field.to_string(),
            });
        }
        if let Some(target) = &record.flnk {
            if !self.contains(target) {
                return Err(ConfigError::UndefinedLink {
                    record: record.name.clone(),
                    target: target.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Record> {
        self.index.get(name).map(|&i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Record names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.name.as_str())
    }

    /// Render the whole database as EPICS `.db` text.
    pub fn render(&self) -> String {
        self.records
            .iter()
            .map(Record::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RecordType, StreamLink};

    fn rec(name: &str, record_type: RecordType) -> Record {
        Record::new(
            name,
            record_type,
            StreamLink {
                protocol_file: "test.proto".into(),
                protocol: "readint".into(),
                args: vec!["A".into()],
                port: "port".into(),
            },
        )
    }

    #[test]
    fn insert_and_lookup() {
        let mut db = RecordDatabase::new();
        assert!(db.is_empty());

        db.insert(rec("P:A:RBV", RecordType::Ai)).unwrap();
        db.insert(rec("P:A", RecordType::Ao).with_flnk("P:A:RBV"))
            .unwrap();

        assert_eq!(db.len(), 2);
        assert!(db.contains("P:A"));
        assert_eq!(db.get("P:A").unwrap().flnk.as_deref(), Some("P:A:RBV"));
        assert!(db.get("P:B").is_none());
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut db = RecordDatabase::new();
        db.insert(rec("P:A", RecordType::Ai)).unwrap();

        let err = db.insert(rec("P:A", RecordType::Ao)).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateRecord("P:A".into()));
        assert_eq!(db.len(), 1);
        assert_eq!(db.get("P:A").unwrap().record_type, RecordType::Ai);
    }

    #[test]
    fn flnk_to_undefined_record_is_rejected() {
        let mut db = RecordDatabase::new();
        let err = db
            .insert(rec("P:A", RecordType::Ao).with_flnk("P:A:RBV"))
            .unwrap_err();

        assert_eq!(
            err,
            ConfigError::UndefinedLink {
                record: "P:A".into(),
                target: "P:A:RBV".into(),
            }
        );
        assert!(db.is_empty(), "failed insert must not leave a record behind");
    }

    #[test]
    fn reserved_extra_field_is_rejected() {
        let mut db = RecordDatabase::new();
        let err = db
            .insert(rec("P:A", RecordType::Ai).with_field("SCAN", "Event"))
            .unwrap_err();

        assert_eq!(
            err,
            ConfigError::ReservedField {
                record: "P:A".into(),
                field: "SCAN".into(),
            }
        );
        assert!(db.is_empty());

        db.insert(rec("P:A", RecordType::Ai).with_field("EGU", "mm"))
            .unwrap();
        assert_eq!(db.get("P:A").unwrap().fields["EGU"], "mm");
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut db = RecordDatabase::new();
        for name in ["c", "a", "b"] {
            db.insert(rec(name, RecordType::Ai)).unwrap();
        }
        assert_eq!(db.names().collect::<Vec<_>>(), vec!["c", "a", "b"]);
    }

    #[test]
    fn render_joins_records_in_order() {
        let mut db = RecordDatabase::new();
        db.insert(rec("first", RecordType::Ai)).unwrap();
        db.insert(rec("second", RecordType::Ai)).unwrap();

        let text = db.render();
        let first = text.find("record(ai, \"first\")").unwrap();
        let second = text.find("record(ai, \"second\")").unwrap();
        assert!(first < second);
        assert!(text.contains("}\n\nrecord"), "records separated by a blank line");
    }

    #[test]
    fn empty_database_renders_empty_text() {
        assert_eq!(RecordDatabase::new().render(), "");
    }
}
