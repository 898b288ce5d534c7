//! Remediation intents and the configuration commands they expand to.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::session::CommandBatch;

/// One `network … area …` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OspfNetwork {
    pub network: Ipv4Addr,
    pub wildcard: Ipv4Addr,
    pub area: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AclAction {
    Permit,
    Deny,
}

impl fmt::Display for AclAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AclAction::Permit => f.write_str("permit"),
            AclAction::Deny => f.write_str("deny"),
        }
    }
}

/// One numbered ACL entry matching IP traffic from a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclRule {
    pub action: AclAction,
    pub source: Ipv4Addr,
    pub wildcard: Ipv4Addr,
}

/// A configuration change the operator can push to a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Remediation {
    /// Address an interface and bring it up.
    InterfaceAddress {
        interface: String,
        address: Ipv4Addr,
        mask: Ipv4Addr,
    },

    /// Enable an OSPF process and advertise networks.
    Ospf {
        process_id: u16,
        networks: Vec<OspfNetwork>,
    },

    /// Create a numbered ACL and apply it inbound on an interface.
    AccessList {
        number: u16,
        rules: Vec<AclRule>,
        interface: String,
    },

    /// Send syslog to a collector.
    SyslogHost { host: IpAddr },

    /// Pre-shared-key IPsec tunnel to one peer.
    SiteToSiteVpn {
        peer: Ipv4Addr,
        pre_shared_key: String,
        transform_set: String,
        crypto_map: String,
        match_acl: u16,
        interface: String,
    },

    /// Set the device hostname.
    Hostname { name: String },
}

impl Remediation {
    /// Configuration commands in the order they must be sent.
    ///
    /// Empty for an access list without rules.
    pub fn commands(&self) -> Vec<String> {
        match self {
            Remediation::InterfaceAddress {
                interface,
                address,
                mask,
            } => vec![
                format!("interface {interface}"),
                format!("ip address {address} {mask}"),
                "no shutdown".to_string(),
            ],

            Remediation::Ospf {
                process_id,
                networks,
            } => std::iter::once(format!("router ospf {process_id}"))
                .chain(networks.iter().map(|n| {
                    format!("network {} {} area {}", n.network, n.wildcard, n.area)
                }))
                .collect(),

            Remediation::AccessList {
                number,
                rules,
                interface,
            } => {
                if rules.is_empty() {
                    return Vec::new();
                }
                rules
                    .iter()
                    .map(|rule| {
                        format!(
                            "access-list {number} {} ip {} {} any",
                            rule.action, rule.source, rule.wildcard
                        )
                    })
                    .chain([
                        format!("interface {interface}"),
                        format!("ip access-group {number} in"),
                    ])
                    .collect()
            }

            Remediation::SyslogHost { host } => vec![format!("logging host {host}")],

            Remediation::SiteToSiteVpn {
                peer,
                pre_shared_key,
                transform_set,
                crypto_map,
                match_acl,
                interface,
            } => vec![
                "crypto isakmp policy 10".to_string(),
                "encr aes".to_string(),
                "hash sha".to_string(),
                "authentication pre-share".to_string(),
                "group 2".to_string(),
                format!("crypto isakmp key {pre_shared_key} address {peer}"),
                format!("crypto ipsec transform-set {transform_set} esp-aes esp-sha-hmac"),
                format!("crypto map {crypto_map} 10 ipsec-isakmp"),
                format!("set peer {peer}"),
                format!("set transform-set {transform_set}"),
                format!("match address {match_acl}"),
                format!("interface {interface}"),
                format!("crypto map {crypto_map}"),
            ],

            Remediation::Hostname { name } => vec![format!("hostname {name}")],
        }
    }

    /// The commands as a batch.
    pub fn batch(&self) -> CommandBatch {
        CommandBatch::new(self.commands())
    }

    /// Whether there is nothing to send.
    pub fn is_noop(&self) -> bool {
        self.commands().is_empty()
    }
}

impl fmt::Display for Remediation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Remediation::InterfaceAddress {
                interface,
                address,
                mask,
            } => write!(f, "address {interface} as {address} {mask}"),
            Remediation::Ospf {
                process_id,
                networks,
            } => write!(f, "OSPF process {process_id} with {} network(s)", networks.len()),
            Remediation::AccessList {
                number,
                rules,
                interface,
            } => write!(f, "ACL {number} ({} rule(s)) inbound on {interface}", rules.len()),
            Remediation::SyslogHost { host } => write!(f, "syslog to {host}"),
            Remediation::SiteToSiteVpn { peer, crypto_map, .. } => {
                write!(f, "IPsec tunnel to {peer} via crypto map {crypto_map}")
            }
            Remediation::Hostname { name } => write!(f, "hostname {name}"),
        }
    }
}
