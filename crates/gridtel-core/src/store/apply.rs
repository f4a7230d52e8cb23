// ── Domain update application ──
//
// Folds one classified update into a device cache. Each function is a
// pure mutation of `DeviceCache`; the store wraps the call in a single
// copy-on-write swap.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::classify::{BgpKind, Domain, InterfaceSource, classify};
use super::fields::{Fields, list_entries};
use crate::decode::{DecodedPath, PathSegment, TelemetryValue, local_name};
use crate::model::{BgpSummary, DeviceCache, OperState};

const MANAGEMENT_INTERFACES: [&str; 2] = ["system0", "mgmt0"];

pub(crate) fn apply_update(
    cache: &mut DeviceCache,
    path: &DecodedPath,
    value: &TelemetryValue,
    at: DateTime<Utc>,
) -> Domain {
    let domain = classify(path, value);
    match domain {
        Domain::Interface(source) => apply_interface(cache, path, value, source, at),
        Domain::System => apply_system(cache, path, value),
        Domain::Bgp(kind) => apply_bgp(&mut cache.bgp, path, value, kind),
        Domain::Route => apply_route(cache, path, value),
        Domain::Unclassified => {}
    }
    domain
}

// ── Interfaces ───────────────────────────────────────────────────────

fn apply_interface(
    cache: &mut DeviceCache,
    path: &DecodedPath,
    value: &TelemetryValue,
    source: InterfaceSource,
    at: DateTime<Utc>,
) {
    let Some(segment) = path.find("interface") else {
        return;
    };
    let tail = path.after("interface");
    let path_ips: Vec<&str> = path
        .segments()
        .iter()
        .filter(|s| s.name == "address")
        .filter_map(|s| s.selector("ip-prefix"))
        .collect();

    if let Some(name) = segment.selector("name") {
        merge_interface(cache, name, tail, value, &path_ips, source, at);
        return;
    }

    for entry in list_entries(value, "interface") {
        match entry.get("name").and_then(TelemetryValue::as_str) {
            Some(name) => merge_interface(cache, name, tail, entry, &path_ips, source, at),
            None => debug!(path = %path, "interface entry without a name"),
        }
    }
}

fn merge_interface(
    cache: &mut DeviceCache,
    name: &str,
    tail: &[PathSegment],
    value: &TelemetryValue,
    path_ips: &[&str],
    source: InterfaceSource,
    at: DateTime<Utc>,
) {
    let base = base_interface_name(name);
    let fields = Fields::collect(tail, value);
    let ips: Vec<&str> = path_ips
        .iter()
        .copied()
        .chain(fields.all_suffix("ip-prefix").filter_map(TelemetryValue::as_str))
        .collect();

    let iface = cache.interface_mut(base);
    for ip in &ips {
        if iface.add_ip(ip) {
            debug!(interface = base, ip, "learned interface address");
        }
    }

    if source == InterfaceSource::Interface {
        if let Some(state) = fields.get("oper-state").and_then(TelemetryValue::as_str) {
            iface.oper_state = OperState::from_wire(state);
        }
        if let Some(octets) = counter(&fields, "in-octets") {
            iface.observe_in_octets(octets, at);
        }
        if let Some(octets) = counter(&fields, "out-octets") {
            iface.observe_out_octets(octets, at);
        }
        if let Some(errors) = counter(&fields, "in-errors") {
            iface.in_errors = errors;
        }
        if let Some(errors) = counter(&fields, "out-errors") {
            iface.out_errors = errors;
        }
    }

    if MANAGEMENT_INTERFACES.contains(&base) {
        if let Some(ip) = ips.last() {
            let address = ip.split_once('/').map_or(*ip, |(addr, _)| addr);
            if cache.system.management_ip.as_deref() != Some(address) {
                debug!(interface = base, address, "management address detected");
                cache.system.management_ip = Some(address.to_owned());
            }
        }
    }
}

/// Interface-level counters, either under `statistics` or directly on the
/// interface container.
fn counter(fields: &Fields<'_>, leaf: &str) -> Option<u64> {
    fields
        .get(&format!("statistics/{leaf}"))
        .or_else(|| fields.get(leaf))
        .and_then(TelemetryValue::as_u64)
}

/// `ethernet-1/1.10` → `ethernet-1/1`. Only a numeric suffix is stripped.
pub(crate) fn base_interface_name(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((base, index))
            if !base.is_empty() && !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) =>
        {
            base
        }
        _ => name,
    }
}

// ── System ───────────────────────────────────────────────────────────

const CPU_KEYS: [&str; 4] = [
    "cpu/total/instant",
    "cpu/total/average-1",
    "cpu/total",
    "cpu/average",
];

fn apply_system(cache: &mut DeviceCache, path: &DecodedPath, value: &TelemetryValue) {
    let fields = Fields::collect(path.segments(), value);
    let sys = &mut cache.system;

    // Per-core entries carry the same leaves; only the aggregate counts.
    let per_core = path
        .selector("cpu", "index")
        .is_some_and(|index| index != "all");
    if !per_core {
        if let Some(cpu) = CPU_KEYS
            .iter()
            .find_map(|key| fields.find_suffix(key).and_then(TelemetryValue::as_f64))
        {
            sys.cpu_percent = Some(cpu);
        }
    }

    let bytes = |key: &str| fields.find_suffix(key).and_then(TelemetryValue::as_u64);
    let physical = bytes("memory/physical");
    let used = bytes("memory/reserved").or_else(|| bytes("memory/used"));
    let free = bytes("memory/free");

    if physical.is_some() {
        sys.memory_physical_bytes = physical;
    }
    if used.is_some() {
        sys.memory_used_bytes = used;
    }
    if free.is_some() {
        sys.memory_free_bytes = free;
    }

    let reported = fields
        .find_suffix("memory/utilization")
        .and_then(TelemetryValue::as_f64);
    if reported.is_some() {
        sys.memory_utilization_percent = reported;
    } else if physical.is_some() || used.is_some() {
        if let Some(derived) = sys.derived_memory_utilization() {
            sys.memory_utilization_percent = Some(derived);
        }
    }
}

// ── BGP ──────────────────────────────────────────────────────────────

fn apply_bgp(bgp: &mut BgpSummary, path: &DecodedPath, value: &TelemetryValue, kind: BgpKind) {
    match kind {
        BgpKind::Statistics => {
            let fields = Fields::collect(path.after("bgp"), value);
            if let Some(total) = fields.find_suffix("total-peers").and_then(TelemetryValue::as_u64) {
                bgp.reported_total_peers = Some(total);
            }
            if let Some(active) = fields.find_suffix("active-peers").and_then(TelemetryValue::as_u64) {
                bgp.reported_active_peers = Some(active);
            }
        }
        BgpKind::Peer => match path.find("neighbor") {
            Some(segment) => {
                let tail = path.after("neighbor");
                if let Some(address) = segment.selector("peer-address") {
                    merge_peer(bgp, address, tail, value);
                } else {
                    merge_peer_entries(bgp, value, tail);
                }
            }
            None => merge_peer_entries(bgp, value, &[]),
        },
    }
}

fn merge_peer_entries(bgp: &mut BgpSummary, value: &TelemetryValue, tail: &[PathSegment]) {
    for entry in list_entries(value, "neighbor") {
        match entry.get("peer-address").and_then(TelemetryValue::as_str) {
            Some(address) => merge_peer(bgp, address, tail, entry),
            None => debug!("BGP neighbor entry without peer-address"),
        }
    }
}

fn merge_peer(bgp: &mut BgpSummary, address: &str, tail: &[PathSegment], value: &TelemetryValue) {
    let fields = Fields::collect(tail, value);
    let state = fields
        .get("session-state")
        .and_then(TelemetryValue::as_str)
        .map(local_name);
    let routes = fields
        .get("received-routes")
        .and_then(TelemetryValue::as_u64)
        .or_else(|| {
            let per_afi: Vec<u64> = fields
                .all_suffix("afi-safi/received-routes")
                .filter_map(TelemetryValue::as_u64)
                .collect();
            (!per_afi.is_empty()).then(|| per_afi.iter().sum())
        });

    bgp.update_peer(address, |peer| {
        if let Some(state) = state {
            peer.session_state = state.to_owned();
        }
        if let Some(routes) = routes {
            peer.routes_received = routes;
        }
    });
}

// ── Routes ───────────────────────────────────────────────────────────

const PREFIX_KEYS: [&str; 2] = ["ipv4-prefix", "ipv6-prefix"];

fn apply_route(cache: &mut DeviceCache, path: &DecodedPath, value: &TelemetryValue) {
    let Some(segment) = path.find("route") else {
        return;
    };
    let tail = path.after("route");

    let keyed = PREFIX_KEYS.iter().find_map(|key| segment.selector(key));
    let candidates: Vec<(Option<&str>, &TelemetryValue)> = match keyed {
        Some(prefix) => vec![(Some(prefix), value)],
        None => list_entries(value, "route")
            .into_iter()
            .map(|entry| {
                let prefix = PREFIX_KEYS
                    .iter()
                    .find_map(|key| entry.get(key).and_then(TelemetryValue::as_str));
                (prefix, entry)
            })
            .collect(),
    };

    for (prefix, entry) in candidates {
        let Some(prefix) = prefix else {
            continue;
        };
        if !is_bgp_route(segment, tail, entry) {
            continue;
        }
        if cache.routes.insert(prefix.to_owned()) {
            debug!(prefix, "BGP route learned");
        }
    }
}

fn is_bgp_route(segment: &PathSegment, tail: &[PathSegment], value: &TelemetryValue) -> bool {
    let fields = Fields::collect(tail, value);
    let field = |key: &str| fields.get(key).and_then(TelemetryValue::as_str).map(local_name);

    let route_type = segment.selector("route-type").or_else(|| field("route-type"));
    let route_owner = segment.selector("route-owner").or_else(|| field("route-owner"));
    route_type == Some("bgp") || route_owner == Some("bgp_mgr")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn cache() -> DeviceCache {
        DeviceCache::new("leaf1", DateTime::UNIX_EPOCH)
    }

    fn apply(cache: &mut DeviceCache, path: &str, value: serde_json::Value) -> Domain {
        let path = DecodedPath::parse(path).unwrap();
        apply_update(cache, &path, &TelemetryValue::from(value), DateTime::UNIX_EPOCH)
    }

    #[test]
    fn base_name_strips_numeric_subinterface_suffix() {
        assert_eq!(base_interface_name("ethernet-1/1.10"), "ethernet-1/1");
        assert_eq!(base_interface_name("ethernet-1/1"), "ethernet-1/1");
        assert_eq!(base_interface_name("lo0.x"), "lo0.x");
    }

    #[test]
    fn interface_container_sets_state_and_counters() {
        let mut c = cache();
        apply(
            &mut c,
            "/interface[name=ethernet-1/1]",
            serde_json::json!({
                "oper-state": "up",
                "statistics": {"in-octets": "1000", "out-octets": "2000", "in-errors": "3"}
            }),
        );
        let iface = c.interface("ethernet-1/1").unwrap();
        assert_eq!(iface.oper_state, OperState::Up);
        assert_eq!((iface.in_octets, iface.out_octets, iface.in_errors), (1000, 2000, 3));
    }

    #[test]
    fn subinterface_state_does_not_override_interface_state() {
        let mut c = cache();
        apply(&mut c, "/interface[name=ethernet-1/1]/oper-state", serde_json::json!("up"));
        apply(
            &mut c,
            "/interface[name=ethernet-1/1]/subinterface[index=0]",
            serde_json::json!({"oper-state": "down"}),
        );
        assert_eq!(c.interface("ethernet-1/1").unwrap().oper_state, OperState::Up);
    }

    #[test]
    fn addresses_from_selectors_and_nested_lists() {
        let mut c = cache();
        apply(
            &mut c,
            "/interface[name=ethernet-1/1]/subinterface[index=0]/ipv4/address[ip-prefix=10.0.0.0/31]",
            serde_json::json!({"status": "preferred"}),
        );
        apply(
            &mut c,
            "/network-instance[name=default]/interface[name=ethernet-1/1.0]",
            serde_json::json!({"ipv4": {"address": [{"ip-prefix": "10.0.0.0/31"}, {"ip-prefix": "10.9.0.0/31"}]}}),
        );
        let iface = c.interface("ethernet-1/1").unwrap();
        assert_eq!(
            iface.ip_addresses.iter().collect::<Vec<_>>(),
            ["10.0.0.0/31", "10.9.0.0/31"]
        );
    }

    #[test]
    fn network_instance_variant_ignores_state() {
        let mut c = cache();
        apply(
            &mut c,
            "/network-instance[name=default]/interface[name=ethernet-1/2.0]",
            serde_json::json!({"oper-state": "up", "ip-prefix": "10.1.0.0/31"}),
        );
        let iface = c.interface("ethernet-1/2").unwrap();
        assert_eq!(iface.oper_state, OperState::Unknown);
        assert!(iface.ip_addresses.contains("10.1.0.0/31"));
    }

    #[test]
    fn system0_address_becomes_management_ip() {
        let mut c = cache();
        apply(
            &mut c,
            "/interface[name=system0]/subinterface[index=0]/ipv4/address[ip-prefix=10.255.0.1/32]",
            serde_json::json!({}),
        );
        assert_eq!(c.system.management_ip.as_deref(), Some("10.255.0.1"));
    }

    #[test]
    fn keyless_interface_list_is_split_by_name() {
        let mut c = cache();
        apply(
            &mut c,
            "/interface",
            serde_json::json!([
                {"name": "ethernet-1/1", "oper-state": "up"},
                {"name": "ethernet-1/2", "oper-state": "down"}
            ]),
        );
        assert_eq!(c.interface("ethernet-1/1").unwrap().oper_state, OperState::Up);
        assert_eq!(c.interface("ethernet-1/2").unwrap().oper_state, OperState::Down);
    }

    #[test]
    fn cpu_prefers_instant_then_average() {
        let mut c = cache();
        apply(
            &mut c,
            "/platform/control[slot=A]/srl_nokia-platform-cpu:cpu[index=all]/total",
            serde_json::json!({"instant": 4, "average-1": 7}),
        );
        assert_eq!(c.system.cpu_percent, Some(4.0));

        apply(
            &mut c,
            "/platform/control[slot=A]/cpu[index=all]/total",
            serde_json::json!({"average-1": 9}),
        );
        assert_eq!(c.system.cpu_percent, Some(9.0));
    }

    #[test]
    fn per_core_cpu_entries_are_ignored() {
        let mut c = cache();
        apply(
            &mut c,
            "/platform/control[slot=A]/cpu[index=0]/total",
            serde_json::json!({"instant": 99}),
        );
        assert_eq!(c.system.cpu_percent, None);
    }

    #[test]
    fn memory_block_uses_reserved_as_used() {
        let mut c = cache();
        apply(
            &mut c,
            "/platform/control[slot=A]/memory",
            serde_json::json!({"physical": "1000", "reserved": "790", "free": "210", "utilization": 79}),
        );
        assert_eq!(c.system.memory_physical_bytes, Some(1000));
        assert_eq!(c.system.memory_used_bytes, Some(790));
        assert_eq!(c.system.memory_free_bytes, Some(210));
        assert_eq!(c.system.memory_utilization_percent, Some(79.0));
    }

    #[test]
    fn memory_utilization_derived_when_not_reported() {
        let mut c = cache();
        apply(
            &mut c,
            "/platform",
            serde_json::json!({"memory": {"physical": 200, "used": 50}}),
        );
        assert_eq!(c.system.memory_utilization_percent, Some(25.0));
    }

    #[test]
    fn neighbor_updates_upsert_and_recount() {
        let mut c = cache();
        apply(
            &mut c,
            "/network-instance[name=default]/protocols/bgp/neighbor[peer-address=10.0.0.1]",
            serde_json::json!({"session-state": "established", "received-routes": 12}),
        );
        apply(
            &mut c,
            "/network-instance[name=default]/protocols/bgp/neighbor[peer-address=10.0.0.3]/session-state",
            serde_json::json!("active"),
        );
        assert_eq!((c.bgp.total_peers(), c.bgp.active_peers()), (2, 1));
        assert_eq!(c.bgp.peer("10.0.0.1").unwrap().routes_received, 12);
        assert_eq!(c.bgp.peer("10.0.0.3").unwrap().session_state, "active");
    }

    #[test]
    fn afi_safi_routes_are_summed() {
        let mut c = cache();
        apply(
            &mut c,
            "/network-instance[name=default]/protocols/bgp/neighbor[peer-address=10.0.0.1]",
            serde_json::json!({
                "session-state": "established",
                "afi-safi": [
                    {"afi-safi-name": "ipv4-unicast", "received-routes": 3},
                    {"afi-safi-name": "ipv6-unicast", "received-routes": 4}
                ]
            }),
        );
        assert_eq!(c.bgp.peer("10.0.0.1").unwrap().routes_received, 7);

        // Replaying the same update is idempotent.
        apply(
            &mut c,
            "/network-instance[name=default]/protocols/bgp/neighbor[peer-address=10.0.0.1]",
            serde_json::json!({"afi-safi": [{"received-routes": 3}, {"received-routes": 4}]}),
        );
        assert_eq!(c.bgp.peer("10.0.0.1").unwrap().routes_received, 7);
    }

    #[test]
    fn neighbor_list_in_value() {
        let mut c = cache();
        let domain = apply(
            &mut c,
            "/network-instance[name=default]/protocols/bgp",
            serde_json::json!({"neighbor": [
                {"peer-address": "10.0.0.1", "session-state": "established"},
                {"peer-address": "10.0.0.5", "session-state": "srl_nokia-bgp:established"}
            ]}),
        );
        assert_eq!(domain, Domain::Bgp(BgpKind::Peer));
        assert_eq!((c.bgp.total_peers(), c.bgp.active_peers()), (2, 2));
    }

    #[test]
    fn statistics_only_record_reported_figures() {
        let mut c = cache();
        apply(
            &mut c,
            "/network-instance[name=default]/protocols/bgp/statistics",
            serde_json::json!({"total-peers": 4, "active-peers": 3}),
        );
        assert_eq!(c.bgp.reported_total_peers, Some(4));
        assert_eq!(c.bgp.reported_active_peers, Some(3));
        assert_eq!(c.bgp.total_peers(), 0);
    }

    #[test]
    fn only_bgp_routes_are_kept() {
        let mut c = cache();
        let base = "/network-instance[name=default]/route-table/ipv4-unicast";
        apply(&mut c, &format!("{base}/route[ipv4-prefix=10.1.0.0/24][route-type=bgp]"), serde_json::json!({}));
        apply(&mut c, &format!("{base}/route[ipv4-prefix=10.2.0.0/24]"), serde_json::json!({"route-owner": "bgp_mgr"}));
        apply(&mut c, &format!("{base}/route[ipv4-prefix=10.3.0.0/24]"), serde_json::json!({"route-type": "srl_nokia-common:local"}));
        apply(&mut c, &format!("{base}/route[ipv4-prefix=10.1.0.0/24][route-type=bgp]"), serde_json::json!({}));

        assert_eq!(c.routes.iter().collect::<Vec<_>>(), ["10.1.0.0/24", "10.2.0.0/24"]);
    }

    #[test]
    fn unclassified_updates_leave_cache_untouched() {
        let mut c = cache();
        let before = c.clone();
        let domain = apply(&mut c, "/acl/ipv4-filter[name=f]", serde_json::json!({"x": 1}));
        assert_eq!(domain, Domain::Unclassified);
        assert_eq!(c, before);
    }
}
