//! Eddy Echo Server
//!
//! Setiap frame yang diterima dikirim balik ke session yang sama.
//!
//! Usage:
//!   cargo run --release --bin eddy_echo_server [OPTIONS]

use std::net::SocketAddr;

use eddy::network::{Server, ServerConfig, SessionHandler, Token};
use eddy::protocol::Framing;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Echo handler with simple counters
#[derive(Default)]
struct EchoHandler {
    connections_total: u64,
    messages_echoed: u64,
    bytes_echoed: u64,
}

impl SessionHandler for EchoHandler {
    fn on_connected(&mut self, token: Token, peer: SocketAddr) {
        self.connections_total += 1;
        debug!(session = token.0, %peer, total = self.connections_total, "echo session opened");
    }

    fn on_message(&mut self, _token: Token, message: Vec<u8>) -> Option<Vec<u8>> {
        self.messages_echoed += 1;
        self.bytes_echoed += message.len() as u64;
        Some(message)
    }

    fn on_disconnected(&mut self, token: Token) {
        debug!(
            session = token.0,
            echoed = self.messages_echoed,
            bytes = self.bytes_echoed,
            "echo session closed"
        );
    }
}

fn print_help() {
    println!("Eddy Echo Server\n");
    println!("Usage: eddy_echo_server [OPTIONS]\n");
    println!("Options:");
    println!("  -b, --bind <ADDR>          Bind address (default: 0.0.0.0:7171)");
    println!("  -f, --framing <NAME>       length | null (default: length)");
    println!("      --max-frame <BYTES>    Max frame length (default: 1048576)");
    println!("      --max-conn <N>         Max concurrent sessions (default: 1024)");
    println!("  -v, --verbose              Verbose output");
    println!("  -h, --help                 Show this help");
}

fn parse_args() -> ServerConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = ServerConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" | "-b" => {
                if i + 1 < args.len() {
                    config.bind_addr = args[i + 1].clone();
                    i += 1;
                }
            }
            "--framing" | "-f" => {
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
            "--max-frame" => {
                if i + 1 < args.len() {
                    config.max_frame_length =
                        args[i + 1].parse().unwrap_or(config.max_frame_length);
                    i += 1;
                }
            }
            "--max-conn" => {
                if i + 1 < args.len() {
                    config.max_connections = args[i + 1].parse().unwrap_or(config.max_connections);
                    i += 1;
                }
            }
            "--verbose" | "-v" => {
                config.verbose = true;
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

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() {
    let config = parse_args();
    init_tracing(config.verbose);

    let mut server = match Server::bind(config, EchoHandler::default()) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        error!(error = %e, "server error");
        std::process::exit(1);
    }

    let handler = server.handler();
    info!(
        connections = handler.connections_total,
        messages = handler.messages_echoed,
        bytes = handler.bytes_echoed,
        "server stopped"
    );
}
