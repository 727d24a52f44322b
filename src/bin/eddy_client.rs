//! Eddy Client - round-trip latency terhadap echo server
//!
//! Kirim `--count` pesan satu per satu, tunggu echo-nya, lalu laporkan
//! latency round-trip.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin eddy_client -- --host 127.0.0.1:7171 --count 10000
//! ```
//!
//! # Options
//!
//! - `--host ADDR` - Server address (default: 127.0.0.1:7171)
//! - `--count N` - Number of round trips (default: 10000)
//! - `--size BYTES` - Payload size (default: 32)
//! - `--framing NAME` - length | null (default: length)

use std::time::{Duration, Instant};

use eddy::network::{Client, NetError};
use eddy::protocol::{Framing, DEFAULT_MAX_FRAME_LENGTH};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

struct ClientConfig {
    host: String,
    count: usize,
    payload_size: usize,
    framing: Framing,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1:7171".to_string(),
            count: 10_000,
            payload_size: 32,
            framing: Framing::LengthPrefixed,
        }
    }
}

/// Round-trip samples in nanoseconds
struct LatencyReport {
    samples: Vec<u64>,
    mismatches: u64,
}

impl LatencyReport {
    fn with_capacity(count: usize) -> Self {
        Self {
            samples: Vec::with_capacity(count),
            mismatches: 0,
        }
    }

    fn record(&mut self, latency: Duration) {
        self.samples.push(latency.as_nanos() as u64);
    }

    fn percentile(sorted: &[u64], p: f64) -> u64 {
        if sorted.is_empty() {
            return 0;
        }
        let idx = ((sorted.len() as f64 * p / 100.0) as usize).min(sorted.len() - 1);
        sorted[idx]
    }

    fn print_report(&mut self, elapsed: Duration) {
        if self.samples.is_empty() {
            warn!("no samples collected");
            return;
        }

        self.samples.sort_unstable();
        let count = self.samples.len() as u64;
        let sum: u64 = self.samples.iter().sum();
        let us = |ns: u64| ns as f64 / 1000.0;

        info!(
            samples = count,
            mismatches = self.mismatches,
            rate = format_args!("{:.1}/sec", count as f64 / elapsed.as_secs_f64()),
            "round trips complete"
        );
        info!(
            min_us = us(self.samples[0]),
            avg_us = us(sum / count),
            max_us = us(self.samples[self.samples.len() - 1]),
            p50_us = us(Self::percentile(&self.samples, 50.0)),
            p99_us = us(Self::percentile(&self.samples, 99.0)),
            "latency"
        );
    }
}

fn print_help() {
    println!("Eddy Client - round-trip latency\n");
    println!("Usage: eddy_client [--host ADDR] [--count N] [--size BYTES] [--framing length|null]");
}

fn parse_args() -> ClientConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = ClientConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--host" => {
                if i + 1 < args.len() {
                    config.host = args[i + 1].clone();
                    i += 1;
                }
            }
            "--count" => {
                if i + 1 < args.len() {
                    config.count = args[i + 1].parse().unwrap_or(config.count);
                    i += 1;
                }
            }
            "--size" => {
                if i + 1 < args.len() {
                    config.payload_size = args[i + 1].parse().unwrap_or(config.payload_size);
                    i += 1;
                }
            }
            "--framing" => {
                if i + 1 < args.len() {
                    match Framing::from_name(&args[i + 1]) {
                        Some(framing) => config.framing = framing,
                        None => {
                            eprintln!("Unknown framing: {}\n", args[i + 1]);
                            print_help();
                            std::process::exit(2);
                        }
                    }
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    config
}

fn run(config: &ClientConfig) -> Result<(), NetError> {
    let mut client = Client::connect(&config.host, config.framing, DEFAULT_MAX_FRAME_LENGTH)?;
    client.set_read_timeout(Some(Duration::from_secs(5)))?;
    info!(host = %config.host, framing = config.framing.name(), "connected");

    // Payload printable supaya valid untuk kedua framing
    let payload: Vec<u8> = (0..config.payload_size)
        .map(|i| b'a' + (i % 26) as u8)
        .collect();

    let mut report = LatencyReport::with_capacity(config.count);
    let start = Instant::now();

    for _ in 0..config.count {
        let sent_at = Instant::now();
        let echo = client.request(&payload)?;
        report.record(sent_at.elapsed());
        if echo != payload {
            report.mismatches += 1;
        }
    }

    report.print_report(start.elapsed());
    Ok(())
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = parse_args();
    if let Err(e) = run(&config) {
        error!(error = %e, "client error");
        std::process::exit(1);
    }
}
