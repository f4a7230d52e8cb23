// ── Subscription profile ──
//
// The fixed set of paths every device is asked to stream. Bump
// `PROFILE_VERSION` whenever the list changes.

use std::time::Duration;

use gridtel_api::proto::{
    Encoding, SubscribeRequest, Subscription, SubscriptionList, SubscriptionListMode,
    SubscriptionMode, subscribe_request,
};

use crate::decode::{DecodeError, DecodedPath};

pub const PROFILE_VERSION: u32 = 1;

pub const SUBSCRIPTION_PATHS: [&str; 9] = [
    "interface",
    "interface/subinterface/ipv4/address",
    "interface[name=system0]/subinterface[index=0]/ipv4/address",
    "interface[name=mgmt0]/subinterface[index=0]/ipv4/address",
    "network-instance[name=default]/interface",
    "platform/control",
    "network-instance[name=default]/protocols/bgp/statistics",
    "network-instance[name=default]/protocols/bgp/neighbor",
    "network-instance[name=default]/route-table/ipv4-unicast/route",
];

/// Build the STREAM/SAMPLE subscribe request for the profile.
pub fn subscribe_request(sample_interval: Duration) -> Result<SubscribeRequest, DecodeError> {
    let interval_ns = u64::try_from(sample_interval.as_nanos()).unwrap_or(u64::MAX);
    let subscription = SUBSCRIPTION_PATHS
        .iter()
        .map(|raw| {
            Ok(Subscription {
                path: Some(DecodedPath::parse(raw)?.to_proto()),
                mode: SubscriptionMode::Sample.into(),
                sample_interval: interval_ns,
                ..Subscription::default()
            })
        })
        .collect::<Result<Vec<_>, DecodeError>>()?;

    Ok(SubscribeRequest {
        request: Some(subscribe_request::Request::Subscribe(SubscriptionList {
            subscription,
            mode: SubscriptionListMode::Stream.into(),
            encoding: Encoding::JsonIetf.into(),
            ..SubscriptionList::default()
        })),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn request_covers_profile_in_order() {
        let request = subscribe_request(Duration::from_secs(5)).unwrap();
        let Some(subscribe_request::Request::Subscribe(list)) = request.request else {
            panic!("expected a subscription list");
        };

        assert_eq!(list.mode, i32::from(SubscriptionListMode::Stream));
        assert_eq!(list.encoding, i32::from(Encoding::JsonIetf));
        assert_eq!(list.subscription.len(), SUBSCRIPTION_PATHS.len());

        for (sub, raw) in list.subscription.iter().zip(SUBSCRIPTION_PATHS) {
            assert_eq!(sub.mode, i32::from(SubscriptionMode::Sample));
            assert_eq!(sub.sample_interval, 5_000_000_000);
            let path = DecodedPath::from_proto(None, sub.path.as_ref());
            assert_eq!(path, DecodedPath::parse(raw).unwrap());
        }
    }

    #[test]
    fn keyed_elements_carry_selectors() {
        let request = subscribe_request(Duration::from_secs(1)).unwrap();
        let Some(subscribe_request::Request::Subscribe(list)) = request.request else {
            panic!("expected a subscription list");
        };
        let system0 = list.subscription[2].path.as_ref().unwrap();
        assert_eq!(system0.elem[0].name, "interface");
        assert_eq!(system0.elem[0].key.get("name").map(String::as_str), Some("system0"));
        assert_eq!(system0.elem[1].key.get("index").map(String::as_str), Some("0"));
    }
}
