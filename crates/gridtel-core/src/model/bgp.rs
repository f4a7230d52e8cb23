// ── BGP session summary ──

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// Session state that counts a peer as active.
pub const ESTABLISHED: &str = "established";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BgpPeer {
    pub peer_address: String,
    pub session_state: String,
    pub routes_received: u64,
}

impl BgpPeer {
    pub fn new(peer_address: impl Into<String>) -> Self {
        Self {
            peer_address: peer_address.into(),
            session_state: "unknown".into(),
            routes_received: 0,
        }
    }

    pub fn is_established(&self) -> bool {
        self.session_state == ESTABLISHED
    }
}

/// Per-device BGP view.
///
/// `total_peers` and `active_peers` are derived from `peers` after every
/// mutation and cannot be set directly. The device's own aggregate
/// counters are kept alongside for reference only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BgpSummary {
    total_peers: usize,
    active_peers: usize,
    #[serde(rename = "neighbors", serialize_with = "serialize_peers")]
    peers: IndexMap<String, BgpPeer>,
    pub reported_total_peers: Option<u64>,
    pub reported_active_peers: Option<u64>,
}

impl BgpSummary {
    pub fn total_peers(&self) -> usize {
        self.total_peers
    }

    pub fn active_peers(&self) -> usize {
        self.active_peers
    }

    pub fn peer(&self, address: &str) -> Option<&BgpPeer> {
        self.peers.get(address)
    }

    pub fn peers(&self) -> impl Iterator<Item = &BgpPeer> {
        self.peers.values()
    }

    /// Upsert the peer at `address`, apply `f`, then recount.
    pub fn update_peer(&mut self, address: &str, f: impl FnOnce(&mut BgpPeer)) {
        let peer = self
            .peers
            .entry(address.to_owned())
            .or_insert_with(|| BgpPeer::new(address));
        f(peer);
        self.recount();
    }

    fn recount(&mut self) {
        self.total_peers = self.peers.len();
        self.active_peers = self.peers.values().filter(|p| p.is_established()).count();
    }
}

fn serialize_peers<S: Serializer>(
    peers: &IndexMap<String, BgpPeer>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(peers.values())
}
