// ── Update classification ──
//
// An ordered rule table over the local names of a decoded path. The first
// matching rule decides which part of the device cache an update feeds.

use crate::decode::{DecodedPath, TelemetryValue};

/// Where an update's interface data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceSource {
    /// `/interface[...]` subtree: state, counters, addresses.
    Interface,
    /// `/network-instance[...]/interface[...]`: addresses only.
    NetworkInstance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BgpKind {
    Peer,
    Statistics,
}

/// Cache domain an update belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Interface(InterfaceSource),
    System,
    Bgp(BgpKind),
    Route,
    Unclassified,
}

struct Rule {
    domain: Domain,
    matches: fn(&DecodedPath) -> bool,
}

const RULES: [Rule; 5] = [
    Rule {
        domain: Domain::Interface(InterfaceSource::NetworkInstance),
        matches: network_instance_interface,
    },
    Rule {
        domain: Domain::Interface(InterfaceSource::Interface),
        matches: interface_root,
    },
    Rule {
        domain: Domain::System,
        matches: platform,
    },
    Rule {
        domain: Domain::Bgp(BgpKind::Statistics),
        matches: bgp,
    },
    Rule {
        domain: Domain::Route,
        matches: route_table,
    },
];

/// Classify one update. BGP updates are split into peer and aggregate
/// updates using both the path and the value.
pub fn classify(path: &DecodedPath, value: &TelemetryValue) -> Domain {
    let Some(rule) = RULES.iter().find(|rule| (rule.matches)(path)) else {
        return Domain::Unclassified;
    };
    match rule.domain {
        Domain::Bgp(_) if path.contains("neighbor") || value.get("neighbor").is_some() => {
            Domain::Bgp(BgpKind::Peer)
        }
        domain => domain,
    }
}

fn network_instance_interface(path: &DecodedPath) -> bool {
    path.root() == Some("network-instance")
        && path.contains("interface")
        && !path.contains("protocols")
}

fn interface_root(path: &DecodedPath) -> bool {
    path.root() == Some("interface")
}

fn platform(path: &DecodedPath) -> bool {
    path.root() == Some("platform") || path.contains("cpu") || path.contains("memory")
}

fn bgp(path: &DecodedPath) -> bool {
    path.root() == Some("network-instance") && path.contains("bgp")
}

fn route_table(path: &DecodedPath) -> bool {
    path.root() == Some("network-instance") && path.contains("route-table") && path.contains("route")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn domain_of(path: &str) -> Domain {
        classify(&DecodedPath::parse(path).unwrap(), &TelemetryValue::Null)
    }

    #[test]
    fn rule_table_order() {
        let cases = [
            (
                "/network-instance[name=default]/interface[name=ethernet-1/1.0]",
                Domain::Interface(InterfaceSource::NetworkInstance),
            ),
            (
                "/interface[name=ethernet-1/1]/statistics/in-octets",
                Domain::Interface(InterfaceSource::Interface),
            ),
            (
                "/srl_nokia-interfaces:interface[name=mgmt0]/subinterface[index=0]/ipv4/address[ip-prefix=172.20.20.5/24]",
                Domain::Interface(InterfaceSource::Interface),
            ),
            (
                "/platform/control[slot=A]/cpu[index=all]/total",
                Domain::System,
            ),
            ("/system/memory/physical", Domain::System),
            (
                "/network-instance[name=default]/protocols/bgp/statistics/total-peers",
                Domain::Bgp(BgpKind::Statistics),
            ),
            (
                "/network-instance[name=default]/protocols/bgp/neighbor[peer-address=10.0.0.1]",
                Domain::Bgp(BgpKind::Peer),
            ),
            (
                "/network-instance[name=default]/route-table/ipv4-unicast/route[ipv4-prefix=10.1.0.0/24][route-type=bgp]",
                Domain::Route,
            ),
            ("/acl/ipv4-filter", Domain::Unclassified),
            ("/network-instance[name=default]/protocols/ospf", Domain::Unclassified),
        ];

        for (path, expected) in cases {
            assert_eq!(domain_of(path), expected, "{path}");
        }
    }

    #[test]
    fn bgp_interface_under_protocols_is_not_an_interface_update() {
        assert_eq!(
            domain_of("/network-instance[name=default]/protocols/bgp/neighbor[peer-address=10.0.0.1]/interface"),
            Domain::Bgp(BgpKind::Peer)
        );
    }

    #[test]
    fn neighbor_list_in_value_makes_a_peer_update() {
        let path = DecodedPath::parse("/network-instance[name=default]/protocols/bgp").unwrap();
        let value = TelemetryValue::from(serde_json::json!({
            "neighbor": [{"peer-address": "10.0.0.1", "session-state": "established"}]
        }));
        assert_eq!(classify(&path, &value), Domain::Bgp(BgpKind::Peer));
    }
}
