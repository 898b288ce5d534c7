//! Audit one device: startup vs running drift and the hardening baseline.
//!
//! # Usage
//!
//! Over SSH:
//! ```bash
//! cargo run --example audit_device -- --host 192.0.2.10 --user admin --password cisco --secret class
//! ```
//!
//! Over Telnet, against an Arista switch:
//! ```bash
//! cargo run --example audit_device -- --host 192.0.2.11 --telnet --platform arista_eos --user admin --password arista
//! ```

use std::env;
use std::time::Duration;

use netaudit::audit::{self, Policy};
use netaudit::{DeviceCredentials, HostKeyVerification, Session, TransportKind};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG=debug to watch the negotiation
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut builder = DeviceCredentials::builder(&args.host, &args.host)
        .username(&args.user)
        .password(&args.password)
        .platform(&args.platform)
        .transport(args.transport)
        .timeout(Duration::from_secs(args.timeout));

    if let Some(secret) = &args.secret {
        builder = builder.secret(secret);
    }
    if let Some(port) = args.port {
        builder = builder.port(port);
    }
    if args.no_host_key_check {
        builder = builder.host_key_verification(HostKeyVerification::Disabled);
    }

    let credentials = builder.build()?;

    println!(
        "Connecting to {}:{} over {}...",
        credentials.host(),
        credentials.port(),
        credentials.transport()
    );
    let mut session = Session::connect(credentials).await?;
    println!("Connected, session is {}", session.state());

    println!("\nStartup vs running");
    println!("{}", "-".repeat(50));
    match audit::compare_running_vs_startup(&mut session).await? {
        audit::DiffOutcome::NoDifferences => println!("No differences"),
        audit::DiffOutcome::Differences(diff) => {
            print!("{}", diff.to_unified("startup-config", "running-config"));
            let stats = diff.stats();
            println!("{} added, {} removed", stats.added, stats.removed);
        }
    }

    println!("\nHardening baseline");
    println!("{}", "-".repeat(50));
    let report = audit::evaluate_running_policy(&mut session, &Policy::hardening_baseline()).await?;
    if report.is_compliant() {
        println!("Compliant");
    } else {
        print!("{report}");
    }

    session.disconnect().await;
    println!("\nDone!");

    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: Option<u16>,
    user: String,
    password: String,
    secret: Option<String>,
    platform: String,
    transport: TransportKind,
    timeout: u64,
    no_host_key_check: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut parsed = Self {
            host: "192.0.2.10".to_string(),
            port: None,
            user: env::var("USER").unwrap_or_else(|_| "admin".to_string()),
            password: String::new(),
            secret: None,
            platform: "cisco_ios".to_string(),
            transport: TransportKind::Ssh,
            timeout: 30,
            no_host_key_check: false,
        };

        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1).cloned();
            match args[i].as_str() {
                "--host" | "-h" => {
                    parsed.host = value.unwrap_or(parsed.host);
                    i += 1;
                }
                "--port" | "-p" => {
                    parsed.port = value.and_then(|v| v.parse().ok());
                    i += 1;
                }
                "--user" | "-u" => {
                    parsed.user = value.unwrap_or(parsed.user);
                    i += 1;
                }
                "--password" | "-P" => {
                    parsed.password = value.unwrap_or_default();
                    i += 1;
                }
                "--secret" | "-s" => {
                    parsed.secret = value;
                    i += 1;
                }
                "--platform" => {
                    parsed.platform = value.unwrap_or(parsed.platform);
                    i += 1;
                }
                "--timeout" | "-t" => {
                    parsed.timeout = value.and_then(|v| v.parse().ok()).unwrap_or(30);
                    i += 1;
                }
                "--telnet" => parsed.transport = TransportKind::Telnet,
                "--no-host-key-check" => parsed.no_host_key_check = true,
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                other => eprintln!("Unknown argument: {other}"),
            }
            i += 1;
        }

        parsed
    }

    fn print_help() {
        println!(
            r#"netaudit audit_device example

USAGE:
    cargo run --example audit_device -- [OPTIONS]

OPTIONS:
    -h, --host <HOST>          Device address [default: 192.0.2.10]
    -p, --port <PORT>          Port [default: 22, or 23 with --telnet]
    -u, --user <USER>          Username [default: $USER]
    -P, --password <PASS>      Login password
    -s, --secret <SECRET>      Enable secret
        --platform <NAME>      cisco_ios or arista_eos [default: cisco_ios]
        --telnet               Connect over Telnet instead of SSH
        --no-host-key-check    Accept any SSH host key (lab use)
    -t, --timeout <SECS>       Per-operation timeout [default: 30]
        --help                 Print this help message
"#
        );
    }
}
