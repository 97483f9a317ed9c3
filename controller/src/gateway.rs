use std::future::Future;

use rumqttc::{AsyncClient, QoS};
use tracing::{debug, warn};

use sleepfade_common::{target_set_topic, DeviceCommand};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("failed to publish device command")]
    Publish(#[source] rumqttc::ClientError),

    #[cfg(test)]
    #[error("device rejected the command")]
    Rejected,
}

/// Sends single device commands. Implementations carry no timer state.
pub trait DeviceGateway: Send + Sync {
    fn send(
        &self,
        command: DeviceCommand,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

#[derive(Clone)]
pub struct MqttGateway {
    client: AsyncClient,
}

impl MqttGateway {
    pub fn new(client: AsyncClient) -> Self {
        Self { client }
    }
}

impl DeviceGateway for MqttGateway {
    async fn send(&self, command: DeviceCommand) -> Result<(), GatewayError> {
        self.client
            .publish(
                target_set_topic(command.target),
                QoS::AtLeastOnce,
                false,
                command.payload(),
            )
            .await
            .map_err(GatewayError::Publish)
    }
}

/// Sends a command, retrying once. A second failure is logged and accepted.
pub async fn send_with_retry<G: DeviceGateway>(gateway: &G, command: DeviceCommand) -> bool {
    match gateway.send(command).await {
        Ok(()) => return true,
        Err(err) => debug!("device command {command} failed, retrying: {err}"),
    }

    match gateway.send(command).await {
        Ok(()) => true,
        Err(err) => {
            warn!("device command {command} failed twice, giving up: {err}");
            false
        }
    }
}
