/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! device-sim – simulated serial device for manual IOC testing.
//!
//! Listens on TCP and speaks a CR LF terminated line protocol over a set of
//! integer registers, one per protocol variable:
//!
//! | Request | Reply |
//! |---|---|
//! | `A?` | current value of `A` |
//! | `A=42` | `OK` |
//! | `reseed` | `OK` (all registers get new random values) |
//! | `subscribe` | `OK` (this connection starts receiving pushes) |
//! | anything else | `ERR` |
//!
//! Every `--push-interval-ms` the current value of each register is pushed as
//! `A:<value>`, which is what the IOC's `"I/O Intr"` records consume.  Pushes
//! only go to connections that sent `subscribe`, so a push can never be read
//! in place of a request's reply.  I/O Intr records therefore need their own
//! asyn port connected to the simulator.
//!
//! Example:
//!   device-sim --config demos/teststream.yaml
//!   device-sim --port 8100 --vars A,B

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use ioc_gen::config::IocConfig;

/// Port used when neither `--port` nor the IOC description names one.
const DEFAULT_PORT: u16 = 8100;

/// Upper bound (exclusive) of reseeded register values.
const RESEED_MAX: i64 = 1000;

/// Connection-level request that turns on pushed updates.
const SUBSCRIBE: &str = "subscribe";

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "device-sim", about = "Simulated StreamDevice serial device")]
struct Cli {
    /// IOC description to take the simulator port and variables from.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// TCP port to listen on (overrides the IOC description).
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,

    /// Comma-separated register names (overrides the IOC description).
    #[arg(long = "vars", value_delimiter = ',')]
    vars: Option<Vec<String>>,

    /// Interval between unsolicited register pushes; 0 disables pushing.
    #[arg(long = "push-interval-ms", default_value_t = 1000)]
    push_interval_ms: u64,
}

// ── Device model ──────────────────────────────────────────────────────────────

struct Device {
    registers: BTreeMap<String, i64>,
    rng: StdRng,
}

impl Device {
    fn new(vars: &[String]) -> Self {
        Self::with_rng(vars, StdRng::from_entropy())
    }

    fn with_rng(vars: &[String], rng: StdRng) -> Self {
        Self {
            registers: vars.iter().map(|v| (v.clone(), 0)).collect(),
            rng,
        }
    }

    /// Handle one request line and return the reply (without terminator).
    fn handle(&mut self, line: &str) -> String {
        let line = line.trim();

        if line == "reseed" {
            self.reseed();
            return "OK".to_string();
        }
        if let Some(var) = line.strip_suffix('?') {
            return match self.registers.get(var) {
                Some(value) => value.to_string(),
                None => "ERR".to_string(),
            };
        }
        if let Some((var, value)) = line.split_once('=') {
            let parsed = value.trim().parse::<i64>();
            return match (self.registers.get_mut(var.trim()), parsed) {
                (Some(slot), Ok(v)) => {
                    *slot = v;
                    "OK".to_string()
                }
                _ => "ERR".to_string(),
            };
        }
        "ERR".to_string()
    }

    fn reseed(&mut self) {
        for value in self.registers.values_mut() {
            *value = self.rng.gen_range(0..RESEED_MAX);
        }
        debug!(registers = ?self.registers, "Reseeded registers");
    }

    /// Push messages for every register.
    fn updates(&self) -> Vec<String> {
        self.registers
            .iter()
            .map(|(var, value)| format!("{}:{}", var, value))
            .collect()
    }
}

// ── Server ────────────────────────────────────────────────────────────────────

async fn serve(
    listener: TcpListener,
    device: Arc<Mutex<Device>>,
    updates: broadcast::Sender<String>,
) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await.context("accept failed")?;
        info!(%peer, "Client connected");

        let device = Arc::clone(&device);
        let rx = updates.subscribe();
        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, device, rx).await {
                warn!(%peer, "Client error: {:#}", e);
            }
            info!(%peer, "Client disconnected");
        });
    }
}

async fn handle_client(
    stream: TcpStream,
    device: Arc<Mutex<Device>>,
    mut updates: broadcast::Receiver<String>,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    let mut subscribed = false;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let reply = if line.trim() == SUBSCRIBE {
                    // Skip whatever was pushed before the subscription.
                    updates = updates.resubscribe();
                    subscribed = true;
                    "OK".to_string()
                } else {
                    device.lock().await.handle(&line)
                };
                debug!(request = %line, reply = %reply, "Handled request");
                writer.write_all(format!("{}\r\n", reply).as_bytes()).await?;
            }
            update = updates.recv(), if subscribed => match update {
                Ok(msg) => writer.write_all(format!("{}\r\n", msg).as_bytes()).await?,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "Client is slow, dropped pushed updates");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
    Ok(())
}

/// Periodically broadcast every register value.
async fn push_updates(device: Arc<Mutex<Device>>, tx: broadcast::Sender<String>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        let messages = device.lock().await.updates();
        for msg in messages {
            // No subscribers is fine: nobody is connected yet.
            let _ = tx.send(msg);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Resolve the listen port and register names from the CLI and the optional
/// IOC description.
fn resolve_settings(cli: &Cli) -> Result<(u16, Vec<String>)> {
    let config = cli
        .config
        .as_deref()
        .map(IocConfig::load_from_file)
        .transpose()?;

    let config_port = config
        .as_ref()
        .and_then(|c| c.port.simulation.as_ref())
        .map(|s| s.ip_port);
    let port = cli.port.or(config_port).unwrap_or(DEFAULT_PORT);

    let vars = match (&cli.vars, &config) {
        (Some(vars), _) => vars.clone(),
        (None, Some(c)) if !c.variables.is_empty() => c.variables.clone(),
        _ => vec!["A".to_string(), "B".to_string()],
    };

    Ok((port, vars))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let (port, vars) = resolve_settings(&cli)?;

    let device = Arc::new(Mutex::new(Device::new(&vars)));
    let (tx, _) = broadcast::channel(64);

    if cli.push_interval_ms > 0 {
        tokio::spawn(push_updates(
            Arc::clone(&device),
            tx.clone(),
            Duration::from_millis(cli.push_interval_ms),
        ));
    }

    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Cannot listen on port {}", port))?;
    info!(port, vars = ?vars, "device-sim listening");

    serve(listener, device, tx).await
}

// ── Tests ─────────────────────────────────────────────────────────────────────
