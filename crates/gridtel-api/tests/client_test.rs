#![allow(clippy::unwrap_used)]

use std::time::Duration;

use gridtel_api::{Error, GnmiClient, TransportConfig};

fn quick_transport() -> TransportConfig {
    TransportConfig {
        connect_timeout: Duration::from_secs(2),
        request_timeout: Duration::from_secs(2),
        ..TransportConfig::default()
    }
}

#[tokio::test]
async fn connect_to_closed_port_is_transient_failure() {
    // Reserve a port, then release it so nothing is listening there.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let err = GnmiClient::connect("127.0.0.1", port, quick_transport())
        .await
        .unwrap_err();

    assert!(
        matches!(err, Error::Transport(_) | Error::Timeout { .. }),
        "unexpected error: {err:?}"
    );
    assert!(err.is_transient());
}

#[tokio::test]
async fn connect_rejects_malformed_host_before_dialing() {
    let err = GnmiClient::connect("leaf 1", 57400, quick_transport())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidEndpoint { .. }));
    assert!(!err.is_transient());
}
