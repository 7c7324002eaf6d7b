/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! IOC assembly.
//!
//! [`IocBuilder`] turns a parsed [`IocConfig`] into an [`Ioc`] by running the
//! same steps a hand-written StreamDevice IOC script performs, in order:
//!
//! ```text
//! register modules ─► seal registry ─► asyn port (+ simulation)
//!        ─► protocol file bound to port ─► generate(prefix, var) per variable
//!        ─► create(record_type, …) + extra fields per extra record
//! ```
//!
//! Every step fails with a [`ConfigError`]; nothing is partially returned.

use tracing::{info, warn};

use crate::config::IocConfig;
use crate::database::RecordDatabase;
use crate::generator::{ConfigError, RecordGenerator};
use crate::module::ModuleRegistry;
use crate::port::AsynIpPort;
use crate::protocol::{ProtocolFile, StreamProtocol};
use crate::record::Scan;

// ── Ioc ───────────────────────────────────────────────────────────────────────

/// A fully generated IOC.
#[derive(Debug)]
pub struct Ioc {
    name: String,
    architecture: String,
    simulation: bool,
    registry: ModuleRegistry,
    port: AsynIpPort,
    protocol: StreamProtocol,
    database: RecordDatabase,
}

impl Ioc {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn architecture(&self) -> &str {
        &self.architecture
    }

    /// Whether the IOC was built to talk to the simulated device.
    pub fn is_simulation(&self) -> bool {
        self.simulation
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn port(&self) -> &AsynIpPort {
        &self.port
    }

    pub fn protocol(&self) -> &StreamProtocol {
        &self.protocol
    }

    pub fn database(&self) -> &RecordDatabase {
        &self.database
    }

    /// Address the asyn port connects to for this build.
    pub fn port_address(&self) -> String {
        self.port.effective_address(self.simulation)
    }

    /// Render the record database as `.db` text, preceded by a comment
    /// header naming the IOC, its port and the protocol search path the
    /// stream links rely on.
    pub fn render_database(&self) -> String {
        let mut out = format!(
            "# {} ({}) – {} record(s)\n# asyn port {} -> {}\n# STREAM_PROTOCOL_PATH {}\n\n",
            self.name,
            self.architecture,
            self.database.len(),
            self.port.name(),
            self.port_address(),
            self.protocol.file().directory().display(),
        );
        out.push_str(&self.database.render());
        out
    }
}

// ── IocBuilder ────────────────────────────────────────────────────────────────

pub struct IocBuilder<'a> {
    config: &'a IocConfig,
    simulation: bool,
}

impl<'a> IocBuilder<'a> {
    pub fn new(config: &'a IocConfig) -> Self {
        Self {
            config,
            simulation: false,
        }
    }

    /// Build for the simulated device attached to the port (if any).
    pub fn simulation(mut self, simulation: bool) -> Self {
        self.simulation = simulation;
        self
    }

    /// Build the IOC.
    ///
    /// # Errors
    /// The first [`ConfigError`] raised by any step.
    pub fn build(&self) -> Result<Ioc, ConfigError> {
        let cfg = self.config;

        info!(
            ioc = %cfg.name,
            arch = %cfg.architecture,
            simulation = self.simulation,
            "=== Building IOC ==="
        );

        // ── Modules ───────────────────────────────────────────────────────────
        let mut registry = ModuleRegistry::new();
        for module in &cfg.modules {
            registry.register(module.clone())?;
        }
        registry.seal();

        // ── Port ──────────────────────────────────────────────────────────────
        let mut port = AsynIpPort::new(cfg.port.name.clone(), cfg.port.address.clone())?;
        if let Some(sim) = &cfg.port.simulation {
            port = port.with_simulation(sim.clone());
        } else if self.simulation {
            warn!(
                port = %port.name(),
                "Simulation requested but port has no simulated device; using real address"
            );
        }

        // ── Protocol ──────────────────────────────────────────────────────────
        let file = ProtocolFile::new(
            cfg.protocol.file.clone(),
            cfg.protocol.module.clone(),
            &registry,
        )?;
        let protocol = StreamProtocol::new(port.handle(), file);

        // ── Records ───────────────────────────────────────────────────────────
        let mut generator = RecordGenerator::with_protocol(protocol.clone());

        for var in &cfg.variables {
            generator.generate(&cfg.prefix, var)?;
        }

        for extra in &cfg.extra_records {
            let scan = extra
                .scan
                .as_deref()
                .map(Scan::parse)
                .transpose()?
                .unwrap_or_default();
            let mut record = generator
                .build(
                    &extra.record_type,
                    &format!("{}{}", cfg.prefix, extra.name),
                    &extra.protocol,
                    &extra.args,
                )?
                .with_scan(scan);
            for (field, value) in &extra.fields {
                record = record.with_field(field.clone(), value.clone());
            }
            generator.insert(record)?;
        }

        let database = generator.into_database();

        info!(
            ioc = %cfg.name,
            modules = registry.len(),
            records = database.len(),
            port_address = %port.effective_address(self.simulation),
            "=== IOC build complete ==="
        );

        Ok(Ioc {
            name: cfg.name.clone(),
            architecture: cfg.architecture.clone(),
            simulation: self.simulation,
            registry,
            port,
            protocol,
            database,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const EXAMPLE: &str = r#"
ioc:
  name: TESTSTREAM
modules:
  - { name: asyn, version: "4-10", home: /dls_sw/prod/R3.14.8.2/support }
  - { name: pyDrv, version: "1-2", home: /dls_sw/prod/R3.14.8.2/support }
  - { name: streamDevice, home: ../.., use_name: false }
port:
  name: streamDeviceAsyn
  address: "172.23.111.180:7001"
  simulation:
    name: streamDeviceSim
    py_class: streamDevice
    module: streamDevice_sim
    ip_port: 8100
    rpc: 9001
    debug: 9010
protocol:
  file: data/test.proto
  module: streamDevice
prefix: "TESTSTREAM:"
variables: [A, B]
extra_records:
  - { record_type: ao, protocol: reseed }
  - { record_type: stringout, protocol: reseed }
  - { record_type: bo, protocol: reseed }
  - { record_type: longout, protocol: reseed }
"#;

    fn example() -> IocConfig {
        IocConfig::from_yaml_str(EXAMPLE).unwrap()
    }

    #[test]
    fn example_builds_expected_records() {
        let cfg = example();
        let ioc = IocBuilder::new(&cfg).build().unwrap();
        let db = ioc.database();

        assert_eq!(db.len(), cfg.expected_record_count());
        assert_eq!(
            db.names().collect::<Vec<_>>(),
            vec![
                "TESTSTREAM:A:RBV",
                "TESTSTREAM:A",
                "TESTSTREAM:A:RBVA",
                "TESTSTREAM:B:RBV",
                "TESTSTREAM:B",
                "TESTSTREAM:B:RBVA",
                "TESTSTREAM:ao",
                "TESTSTREAM:stringout",
                "TESTSTREAM:bo",
                "TESTSTREAM:longout",
            ]
        );
        assert_eq!(ioc.registry().len(), 3);
        assert!(ioc.registry().is_sealed());
        assert_eq!(
            ioc.protocol().file().resolved(),
            Path::new("../../data/test.proto")
        );
    }

    #[test]
    fn demo_description_builds() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../demos/teststream.yaml");
        let cfg = IocConfig::load_from_file(&path).unwrap();
        let ioc = IocBuilder::new(&cfg).simulation(true).build().unwrap();

        assert_eq!(ioc.name(), "TESTSTREAM");
        assert_eq!(ioc.database().len(), 10);
        assert_eq!(ioc.port_address(), "localhost:8100");
        assert_eq!(ioc.protocol().file().file_name(), "test.proto");
        let bo = ioc.database().get("TESTSTREAM:bo").unwrap();
        assert_eq!(bo.fields["ONAM"], "Reseed");
    }

    #[test]
    fn port_address_follows_simulation_flag() {
        let cfg = example();

        let real = IocBuilder::new(&cfg).build().unwrap();
        assert!(!real.is_simulation());
        assert_eq!(real.port_address(), "172.23.111.180:7001");

        let sim = IocBuilder::new(&cfg).simulation(true).build().unwrap();
        assert!(sim.is_simulation());
        assert_eq!(sim.port_address(), "localhost:8100");
    }

    #[test]
    fn render_database_has_header_and_records() {
        let cfg = example();
        let text = IocBuilder::new(&cfg).build().unwrap().render_database();

        assert!(text.starts_with("# TESTSTREAM (linux-x86) – 10 record(s)\n"));
        assert!(text.contains("record(ao, \"TESTSTREAM:A\")"));
        assert!(text.contains("field(FLNK, \"TESTSTREAM:A:RBV\")"));
        assert!(text.contains("field(SCAN, \"I/O Intr\")"));
        assert!(text.contains("record(stringout, \"TESTSTREAM:stringout\")"));
        assert!(text.contains("field(OUT, \"@test.proto reseed streamDeviceAsyn\")"));
        assert!(text.contains("# STREAM_PROTOCOL_PATH ../../data\n"));
    }

    #[test]
    fn extra_record_fields_are_rendered() {
        let mut cfg = example();
        cfg.extra_records[2].fields.insert("ZNAM".into(), "Idle".into());
        cfg.extra_records[2].fields.insert("ONAM".into(), "Reseed".into());

        let ioc = IocBuilder::new(&cfg).build().unwrap();
        let bo = ioc.database().get("TESTSTREAM:bo").unwrap();
        assert_eq!(bo.fields["ZNAM"], "Idle");

        let text = bo.render();
        assert!(text.contains("field(ONAM, \"Reseed\")"));
        assert!(text.contains("field(ZNAM, \"Idle\")"));
    }

    #[test]
    fn extra_record_reserved_field_fails_build() {
        let mut cfg = example();
        cfg.extra_records[0].fields.insert("DTYP".into(), "asynInt32".into());

        let err = IocBuilder::new(&cfg).build().unwrap_err();
        assert_eq!(
            err,
            ConfigError::ReservedField {
                record: "TESTSTREAM:ao".into(),
                field: "DTYP".into(),
            }
        );
    }

    #[test]
    fn non_identifier_variable_fails_build() {
        let mut cfg = example();
        cfg.variables = vec!["A,B".into()];

        let err = IocBuilder::new(&cfg).build().unwrap_err();
        assert_eq!(err, ConfigError::InvalidVariable("A,B".into()));
    }

    #[test]
    fn unknown_record_type_fails_build() {
        let mut cfg = example();
        cfg.extra_records[1].record_type = "unknowntype".into();

        let err = IocBuilder::new(&cfg).build().unwrap_err();
        assert_eq!(err, ConfigError::UnknownRecordType("unknowntype".into()));
    }

    #[test]
    fn empty_variable_fails_build() {
        let mut cfg = example();
        cfg.variables.push(String::new());

        let err = IocBuilder::new(&cfg).build().unwrap_err();
        assert_eq!(err, ConfigError::EmptyVariable);
    }

    #[test]
    fn repeated_variable_fails_build() {
        let mut cfg = example();
        cfg.variables = vec!["A".into(), "A".into()];

        let err = IocBuilder::new(&cfg).build().unwrap_err();
        assert_eq!(err, ConfigError::DuplicateRecord("TESTSTREAM:A:RBV".into()));
    }

    #[test]
    fn extra_record_clashing_with_generated_name_fails_build() {
        let mut cfg = example();
        // "TESTSTREAM:" + "A" is the write record of variable A
        cfg.extra_records[0].name = "A".into();

        let err = IocBuilder::new(&cfg).build().unwrap_err();
        assert_eq!(err, ConfigError::DuplicateRecord("TESTSTREAM:A".into()));
    }

    #[test]
    fn protocol_module_must_be_registered() {
        let mut cfg = example();
        cfg.protocol.module = "missing".into();

        let err = IocBuilder::new(&cfg).build().unwrap_err();
        assert_eq!(err, ConfigError::UnknownModule("missing".into()));
    }

    #[test]
    fn duplicate_module_fails_build() {
        let mut cfg = example();
        let asyn = cfg.modules[0].clone();
        cfg.modules.push(asyn);

        let err = IocBuilder::new(&cfg).build().unwrap_err();
        assert_eq!(err, ConfigError::DuplicateModule("asyn".into()));
    }

    #[test]
    fn invalid_port_address_fails_build() {
        let mut cfg = example();
        cfg.port.address = "no-port-here".into();

        let err = IocBuilder::new(&cfg).build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { .. }));
    }

    #[test]
    fn extra_record_scan_is_parsed() {
        let mut cfg = example();
        cfg.extra_records[0].scan = Some(".5 second".into());
        let ioc = IocBuilder::new(&cfg).build().unwrap();
        assert_eq!(
            ioc.database().get("TESTSTREAM:ao").unwrap().scan.as_str(),
            ".5 second"
        );

        cfg.extra_records[0].scan = Some("sometimes".into());
        let err = IocBuilder::new(&cfg).build().unwrap_err();
        assert_eq!(err, ConfigError::InvalidScan("sometimes".into()));
    }
}
