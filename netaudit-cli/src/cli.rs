use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use netaudit::audit::{AclAction, AclRule, OspfNetwork, Remediation};
use netaudit::fleet::DEFAULT_CONCURRENCY;

#[derive(Parser)]
#[command(name = "netaudit")]
#[command(version)]
#[command(about = "Audit and remediate network device configuration", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Inventory file (YAML or JSON)
    #[arg(
        short,
        long,
        global = true,
        env = "NETAUDIT_INVENTORY",
        default_value = "inventory.yaml"
    )]
    pub inventory: PathBuf,

    /// Only work on these devices (repeatable)
    #[arg(short, long = "device", global = true, value_name = "NAME")]
    pub devices: Vec<String>,

    /// Number of devices worked on at once
    #[arg(short = 'j', long, global = true, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Per-operation timeout in seconds, overriding the inventory
    #[arg(short, long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Diff startup-config against running-config
    DiffStartup,

    /// Diff a local reference config against running-config
    DiffFile {
        /// Reference file, or a directory holding <device>_running-config.txt files
        path: PathBuf,
    },

    /// Check running-config against a policy
    CheckPolicy {
        /// Policy file, one required line per line; the hardening baseline when omitted
        #[arg(short, long)]
        policy: Option<PathBuf>,
    },

    /// Save running-config of each device to a local file
    Backup {
        /// Directory to write <device>_running-config.txt into
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    /// Push a configuration change
    #[command(subcommand)]
    Remediate(Intent),
}

#[derive(Subcommand)]
pub enum Intent {
    /// Address an interface and bring it up
    InterfaceAddress {
        #[arg(long)]
        interface: String,
        #[arg(long)]
        address: Ipv4Addr,
        #[arg(long)]
        mask: Ipv4Addr,
    },

    /// Enable OSPF and advertise networks
    Ospf {
        #[arg(long, default_value_t = 1)]
        process_id: u16,
        /// NETWORK,WILDCARD,AREA (repeatable)
        #[arg(long = "network", value_parser = parse_ospf_network, required = true)]
        networks: Vec<OspfNetwork>,
    },

    /// Create a numbered ACL and apply it inbound
    AccessList {
        #[arg(long)]
        number: u16,
        /// permit|deny,SOURCE,WILDCARD (repeatable)
        #[arg(long = "rule", value_parser = parse_acl_rule)]
        rules: Vec<AclRule>,
        #[arg(long)]
        interface: String,
    },

    /// Send syslog to a collector
    SyslogHost {
        #[arg(long)]
        host: IpAddr,
    },

    /// Pre-shared-key IPsec tunnel to a peer
    SiteToSiteVpn {
        #[arg(long)]
        peer: Ipv4Addr,
        #[arg(long, env = "NETAUDIT_VPN_PSK", hide_env_values = true)]
        pre_shared_key: String,
        #[arg(long, default_value = "VPN-TS")]
        transform_set: String,
        #[arg(long, default_value = "VPN-MAP")]
        crypto_map: String,
        #[arg(long)]
        match_acl: u16,
        #[arg(long)]
        interface: String,
    },

    /// Set the hostname
    Hostname {
        #[arg(long)]
        name: String,
    },

    /// Load a remediation from a YAML or JSON file
    FromFile { path: PathBuf },
}

impl Intent {
    pub fn into_remediation(self) -> Result<Remediation> {
        let remediation = match self {
            Intent::InterfaceAddress {
                interface,
                address,
                mask,
            } => Remediation::InterfaceAddress {
                interface,
                address,
                mask,
            },
            Intent::Ospf {
                process_id,
                networks,
            } => Remediation::Ospf {
                process_id,
                networks,
            },
            Intent::AccessList {
                number,
                rules,
                interface,
            } => Remediation::AccessList {
                number,
                rules,
                interface,
            },
            Intent::SyslogHost { host } => Remediation::SyslogHost { host },
            Intent::SiteToSiteVpn {
                peer,
                pre_shared_key,
                transform_set,
                crypto_map,
                match_acl,
                interface,
            } => Remediation::SiteToSiteVpn {
                peer,
                pre_shared_key,
                transform_set,
                crypto_map,
                match_acl,
                interface,
            },
            Intent::Hostname { name } => Remediation::Hostname { name },
            Intent::FromFile { path } => load_remediation(&path)?,
        };
        Ok(remediation)
    }
}

fn load_remediation(path: &Path) -> Result<Remediation> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read remediation file {}", path.display()))?;
    let remediation = if is_json(path) {
        serde_json::from_str(&text)?
    } else {
        serde_yaml::from_str(&text)?
    };
    Ok(remediation)
}

pub fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn split_fields<const N: usize>(value: &str) -> Result<[&str; N], String> {
    let fields: Vec<&str> = value.split(',').map(str::trim).collect();
    fields
        .try_into()
        .map_err(|_| format!("expected {N} comma-separated fields, got '{value}'"))
}

fn parse_ospf_network(value: &str) -> Result<OspfNetwork, String> {
    let [network, wildcard, area] = split_fields::<3>(value)?;
    Ok(OspfNetwork {
        network: network.parse().map_err(|e| format!("network: {e}"))?,
        wildcard: wildcard.parse().map_err(|e| format!("wildcard: {e}"))?,
        area: area.parse().map_err(|e| format!("area: {e}"))?,
    })
}

fn parse_acl_rule(value: &str) -> Result<AclRule, String> {
    let [action, source, wildcard] = split_fields::<3>(value)?;
    let action = match action.to_ascii_lowercase().as_str() {
        "permit" => AclAction::Permit,
        "deny" => AclAction::Deny,
        other => return Err(format!("action must be permit or deny, got '{other}'")),
    };
    Ok(AclRule {
        action,
        source: source.parse().map_err(|e| format!("source: {e}"))?,
        wildcard: wildcard.parse().map_err(|e| format!("wildcard: {e}"))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ospf_network() {
        let network = parse_ospf_network("192.168.56.0, 0.0.0.255, 0").unwrap();
        assert_eq!(network.network, Ipv4Addr::new(192, 168, 56, 0));
        assert_eq!(network.wildcard, Ipv4Addr::new(0, 0, 0, 255));
        assert_eq!(network.area, 0);

        assert!(parse_ospf_network("192.168.56.0,0.0.0.255").is_err());
    }

    #[test]
    fn test_parse_acl_rule() {
        let rule = parse_acl_rule("Deny,192.0.2.0,0.0.0.255").unwrap();
        assert_eq!(rule.action, AclAction::Deny);

        assert!(parse_acl_rule("drop,192.0.2.0,0.0.0.255").is_err());
    }

    #[test]
    fn test_remediate_args() {
        let cli = Cli::try_parse_from([
            "netaudit",
            "-d",
            "r1",
            "remediate",
            "access-list",
            "--number",
            "101",
            "--rule",
            "deny,192.0.2.0,0.0.0.255",
            "--rule",
            "permit,0.0.0.0,255.255.255.255",
            "--interface",
            "GigabitEthernet1",
        ])
        .unwrap();

        assert_eq!(cli.devices, vec!["r1"]);
        let Command::Remediate(intent) = cli.command else {
            panic!("expected remediate");
        };
        let remediation = intent.into_remediation().unwrap();
        assert_eq!(remediation.commands().len(), 4);
    }

    #[test]
    fn test_ospf_requires_a_network() {
        assert!(Cli::try_parse_from(["netaudit", "remediate", "ospf"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["netaudit", "diff-startup", "--json", "-vv"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.concurrency, DEFAULT_CONCURRENCY);
    }
}
