// ── Transport seam ──
//
// Sessions only need "open a subscription to this device". `Dialer`
// hides the gNMI client so the reconnect state machine can be driven by
// scripted streams.

use std::future::Future;
use std::pin::Pin;

use futures_util::Stream;
use gridtel_api::GnmiClient;
use gridtel_api::proto::{CapabilityResponse, SubscribeRequest, SubscribeResponse};

use crate::config::{CollectorConfig, Device};
use crate::error::CoreError;

/// Inbound subscription messages for one device.
pub type ResponseStream =
    Pin<Box<dyn Stream<Item = Result<SubscribeResponse, gridtel_api::Error>> + Send>>;

/// Opens subscription streams.
pub trait Dialer: Send + Sync + 'static {
    /// Connect to `device` and issue `request`, returning the inbound
    /// half of the call.
    fn dial(
        &self,
        device: &Device,
        request: SubscribeRequest,
    ) -> impl Future<Output = Result<ResponseStream, gridtel_api::Error>> + Send;
}

/// Production dialer backed by [`GnmiClient`].
#[derive(Debug, Clone)]
pub struct GnmiDialer {
    config: CollectorConfig,
}

impl GnmiDialer {
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    /// One time-bounded `Capabilities` call against `device`.
    pub async fn probe(&self, device: &Device) -> Result<CapabilityResponse, CoreError> {
        let transport = self.config.transport(device.credentials.clone());
        let mut client = GnmiClient::connect(&device.host, device.port, transport).await?;
        Ok(client.capabilities().await?)
    }
}

impl Dialer for GnmiDialer {
    async fn dial(
        &self,
        device: &Device,
        request: SubscribeRequest,
    ) -> Result<ResponseStream, gridtel_api::Error> {
        let transport = self.config.transport(device.credentials.clone());
        let mut client = GnmiClient::connect(&device.host, device.port, transport).await?;
        let inbound = client.subscribe(request).await?;

        // The client rides along in the stream state so the channel lives
        // exactly as long as the subscription.
        let stream = futures_util::stream::unfold((client, inbound), |(client, mut inbound)| async move {
            let item = inbound
                .message()
                .await
                .map_err(gridtel_api::Error::from)
                .transpose()?;
            Some((item, (client, inbound)))
        });
        Ok(Box::pin(stream))
    }
}
