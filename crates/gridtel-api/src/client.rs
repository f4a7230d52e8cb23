// gNMI client over a tonic channel.
//
// Hand-rolled equivalent of the tonic-generated client for the two RPCs
// the collector uses. Paths follow the `gnmi.gNMI` service definition.

use tokio_stream::StreamExt as _;
use tonic::client::Grpc;
use tonic::codec::{ProstCodec, Streaming};
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;

use crate::error::Error;
use crate::proto::{CapabilityRequest, CapabilityResponse, SubscribeRequest, SubscribeResponse};
use crate::transport::TransportConfig;

const SUBSCRIBE_PATH: &str = "/gnmi.gNMI/Subscribe";
const CAPABILITIES_PATH: &str = "/gnmi.gNMI/Capabilities";

/// Inbound half of a Subscribe call.
pub type SubscribeStream = Streaming<SubscribeResponse>;

/// Client for a single gNMI target.
///
/// Cheap to clone: clones share the underlying HTTP/2 channel.
#[derive(Debug, Clone)]
pub struct GnmiClient {
    inner: Grpc<Channel>,
    transport: TransportConfig,
}

impl GnmiClient {
    /// Connect to `host:port`, bounded by the transport's connect timeout.
    pub async fn connect(host: &str, port: u16, transport: TransportConfig) -> Result<Self, Error> {
        tracing::debug!(host, port, "opening gNMI channel");
        let channel = transport.connect(host, port).await?;
        Ok(Self::with_channel(channel, transport))
    }

    /// Wrap an existing channel.
    pub fn with_channel(channel: Channel, transport: TransportConfig) -> Self {
        Self {
            inner: Grpc::new(channel),
            transport,
        }
    }

    /// Issue a `Capabilities` call, bounded by the request timeout.
    ///
    /// Used as the per-call health check for a device.
    pub async fn capabilities(&mut self) -> Result<CapabilityResponse, Error> {
        let timeout = self.transport.request_timeout;
        let call = async {
            self.ready().await?;
            let mut request = tonic::Request::new(CapabilityRequest {});
            self.transport.apply_credentials(request.metadata_mut())?;
            let codec: ProstCodec<CapabilityRequest, CapabilityResponse> = ProstCodec::default();
            let response = self
                .inner
                .unary(request, PathAndQuery::from_static(CAPABILITIES_PATH), codec)
                .await?;
            Ok::<_, Error>(response.into_inner())
        };

        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::timeout("capabilities", timeout)),
        }
    }

    /// Open a Subscribe stream with a single subscription request.
    ///
    /// The outbound half stays open for the life of the call: closing it
    /// would signal end-of-subscription to some targets. Establishing the
    /// call is bounded by the connect timeout; reading from the returned
    /// stream is not.
    pub async fn subscribe(&mut self, request: SubscribeRequest) -> Result<SubscribeStream, Error> {
        let timeout = self.transport.connect_timeout;
        let call = async {
            self.ready().await?;
            let outbound = tokio_stream::once(request).chain(tokio_stream::pending());
            let mut request = tonic::Request::new(outbound);
            self.transport.apply_credentials(request.metadata_mut())?;
            let codec: ProstCodec<SubscribeRequest, SubscribeResponse> = ProstCodec::default();
            let response = self
                .inner
                .streaming(request, PathAndQuery::from_static(SUBSCRIBE_PATH), codec)
                .await?;
            Ok::<_, Error>(response.into_inner())
        };

        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::timeout("subscribe", timeout)),
        }
    }

    async fn ready(&mut self) -> Result<(), Error> {
        self.inner.ready().await.map_err(Error::Transport)
    }
}
