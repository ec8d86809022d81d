//! One-shot MQTT publisher.
//!
//! Every event opens a fresh connection, publishes a single QoS 0 message,
//! disconnects, and returns. There is no background connection and no retry:
//! a failed publish is reported to the caller and the next fire of the publish
//! gate is the next attempt.

use std::time::{Duration, Instant, SystemTime};

use rumqttc::v5::mqttbytes::QoS;
use rumqttc::v5::{Client, Event, MqttOptions};
use rumqttc::{Outgoing, Transport};

use super::endpoint::MqttEndpoint;
use crate::error::PublishError;
use crate::sink::EventPublisher;

pub const DEFAULT_CLIENT_ID: &str = "roomwatch";
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);
const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Connection parameters for `MqttPublisher`.
#[derive(Clone, Debug)]
pub struct MqttSettings {
    pub endpoint: MqttEndpoint,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Upper bound for connect + publish + disconnect.
    pub timeout: Duration,
}

pub struct MqttPublisher {
    settings: MqttSettings,
    transport: Transport,
}

impl MqttPublisher {
    pub fn new(settings: MqttSettings, transport: Transport) -> Self {
        Self {
            settings,
            transport,
        }
    }

    pub fn settings(&self) -> &MqttSettings {
        &self.settings
    }

    fn options(&self) -> MqttOptions {
        let endpoint = &self.settings.endpoint;
        let mut options =
            MqttOptions::new(&self.settings.client_id, &endpoint.host, endpoint.port);
        options.set_keep_alive(KEEP_ALIVE);
        options.set_clean_start(true);
        if let Some(user) = self.settings.username.as_deref() {
            options.set_credentials(user, self.settings.password.as_deref().unwrap_or_default());
        }
        options.set_transport(self.transport.clone());
        options
    }
}

impl EventPublisher for MqttPublisher {
    fn publish_event(
        &mut self,
        topic: &str,
        payload: &str,
        _at: SystemTime,
    ) -> Result<(), PublishError> {
        let (client, mut connection) = Client::new(self.options(), 10);
        client.publish(topic, QoS::AtMostOnce, false, payload.as_bytes().to_vec())?;

        let deadline = Instant::now() + self.settings.timeout;
        let mut sent = false;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(PublishError::Timeout(self.settings.timeout));
            }
            match connection.recv_timeout(remaining) {
                Ok(Ok(Event::Outgoing(Outgoing::Publish(_)))) => {
                    sent = true;
                    client.disconnect()?;
                }
                Ok(Ok(Event::Outgoing(Outgoing::Disconnect))) if sent => return Ok(()),
                Ok(Ok(_)) => {}
                // The broker may drop the socket right after our disconnect.
                Ok(Err(_)) if sent => return Ok(()),
                Ok(Err(e)) => return Err(PublishError::Connection(e)),
                Err(_) if sent => return Ok(()),
                Err(_) if Instant::now() >= deadline => {
                    return Err(PublishError::Timeout(self.settings.timeout))
                }
                Err(_) => return Err(PublishError::Disconnected),
            }
        }
    }
}
