//! Broker session, reconnect policy, and the publish capability trait.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, LastWill, MqttOptions, Packet, QoS};
use tokio::sync::mpsc;
use tokio::time;
use tracing::{info, warn};

/// Availability payload published after every connect.
pub const PAYLOAD_ONLINE: &str = "online";
/// Availability payload the broker publishes for us via the last will.
pub const PAYLOAD_OFFLINE: &str = "offline";

const BACKOFF_BASE: Duration = Duration::from_secs(1);
const BACKOFF_CAP: Duration = Duration::from_secs(300);
const KEEP_ALIVE: Duration = Duration::from_secs(30);

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while publishing to the broker.
pub enum SinkError {
    /// The MQTT client rejected the request.
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),
    /// A discovery payload could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[async_trait]
/// Retained-publish capability the sink depends on.
pub trait BrokerPort: Send + Sync {
    /// Publish a payload, optionally retained, at-least-once.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] when the client rejects the publish.
    async fn publish(&self, topic: &str, payload: &str, retain: bool) -> Result<(), SinkError>;
}

/// Connection parameters for the broker session.
#[derive(Debug, Clone)]
pub struct SessionOpts {
    /// Broker host name or address.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Optional username.
    pub username: Option<String>,
    /// Optional password.
    pub password: Option<String>,
    /// Topic the last-will `offline` payload is retained on.
    pub availability_topic: String,
}

/// Notifications emitted by the session driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The broker acknowledged a (re)connect; availability and discovery
    /// should be re-announced.
    Connected,
}

/// Thin wrapper around the rumqttc client with reconnect backoff.
pub struct Session {
    client: AsyncClient,
}

impl Session {
    /// Start the session and its event-loop driver task.
    ///
    /// The returned receiver yields one [`SessionEvent::Connected`] per
    /// broker acknowledgement; the driver reconnects forever with
    /// exponential backoff and stops once the receiver is dropped.
    #[must_use]
    pub fn start(opts: SessionOpts) -> (Self, mpsc::Receiver<SessionEvent>) {
        let mut mqtt_opts = MqttOptions::new(opts.client_id, opts.host, opts.port);
        mqtt_opts.set_keep_alive(KEEP_ALIVE);
        mqtt_opts.set_last_will(LastWill::new(
            &opts.availability_topic,
            PAYLOAD_OFFLINE,
            QoS::AtLeastOnce,
            true,
        ));
        if let (Some(username), Some(password)) = (opts.username, opts.password) {
            mqtt_opts.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_opts, 64);
        let (events_sender, events_receiver) = mpsc::channel(4);
        tokio::spawn(drive(event_loop, events_sender));

        (Self { client }, events_receiver)
    }
}

#[async_trait]
impl BrokerPort for Session {
    async fn publish(&self, topic: &str, payload: &str, retain: bool) -> Result<(), SinkError> {
        self.client
            .publish(topic, QoS::AtLeastOnce, retain, payload)
            .await
            .map_err(SinkError::from)
    }
}

/// Poll the event loop forever, backing off on connection failures.
///
/// The delay starts at the base, doubles per failed attempt, and wraps
/// back to the base once doubling would exceed the cap.
async fn drive(mut event_loop: EventLoop, events: mpsc::Sender<SessionEvent>) {
    let mut delay = BACKOFF_BASE;
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("connected to MQTT");
                delay = BACKOFF_BASE;
                if events.send(SessionEvent::Connected).await.is_err() {
                    return;
                }
            }
            Ok(_) => {}
            Err(err) => {
                if events.is_closed() {
                    return;
                }
                warn!(%err, retry_in = ?delay, "MQTT connection lost; reconnecting");
                time::sleep(delay).await;
                delay = next_backoff(delay);
            }
        }
    }
}

fn next_backoff(delay: Duration) -> Duration {
    let doubled = delay.saturating_mul(2);
    if doubled > BACKOFF_CAP { BACKOFF_BASE } else { doubled }
}
