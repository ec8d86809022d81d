//! Notification transport.
//!
//! Broker endpoint parsing, TLS transport selection and the one-shot MQTT
//! publisher used by the publish gate.

mod endpoint;
mod mqtt;

pub use endpoint::{
    parse_mqtt_endpoint, MqttEndpoint, TlsMaterials, DEFAULT_MQTTS_PORT, DEFAULT_MQTT_PORT,
};
pub use mqtt::{MqttPublisher, MqttSettings, DEFAULT_CLIENT_ID, DEFAULT_PUBLISH_TIMEOUT};
