//! The record-to-MQTT publishing sink.
//!
//! Consumes records from the poller and connect notifications from the
//! broker session. State topics are de-duplicated against the last
//! published payload; the availability topic is exempt and re-announced on
//! every connect.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Local, TimeDelta};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use wastecast_core::model::{AddressBook, Record};
use wastecast_core::schema::FIELDS;

use crate::discovery::Descriptor;
use crate::session::{BrokerPort, PAYLOAD_ONLINE, SessionEvent, SinkError};
use crate::topic::TopicScheme;

/// Configuration for the publishing sink.
#[derive(Debug, Clone)]
pub struct SinkOpts {
    /// Address registry used to route records to device names.
    pub book: AddressBook,
    /// Whether Home Assistant discovery is published.
    pub discovery: bool,
    /// Discovery prefix, usually `homeassistant`.
    pub discovery_prefix: String,
    /// Name prefix for discovered entities and the device block.
    pub discovery_name: String,
    /// State topic prefix.
    pub topic_prefix: String,
    /// Window within which a pickup sets the `status` sensor.
    pub alert_within: TimeDelta,
}

/// Maps records to MQTT publishes and owns the de-duplication cache.
pub struct Sink {
    broker: Arc<dyn BrokerPort>,
    opts: SinkOpts,
    scheme: TopicScheme,
    last_published: HashMap<String, String>,
}

impl Sink {
    /// Create a sink publishing through the given broker capability.
    #[must_use]
    pub fn new(broker: Arc<dyn BrokerPort>, opts: SinkOpts) -> Self {
        let scheme = TopicScheme::new(opts.topic_prefix.clone(), opts.discovery_prefix.clone());
        Self {
            broker,
            opts,
            scheme,
            last_published: HashMap::new(),
        }
    }

    /// Consume records and session events until either channel closes.
    pub async fn run(
        mut self,
        mut records: mpsc::Receiver<Record>,
        mut session: mpsc::Receiver<SessionEvent>,
    ) {
        loop {
            tokio::select! {
                event = session.recv() => match event {
                    Some(SessionEvent::Connected) => {
                        if let Err(err) = self.announce().await {
                            warn!(%err, "failed to announce after connect");
                        }
                    }
                    None => {
                        warn!("session driver stopped; stopping sink");
                        return;
                    }
                },
                record = records.recv() => match record {
                    Some(record) => {
                        if let Err(err) = self.publish_record(record).await {
                            warn!(%err, "failed to publish record");
                        }
                    }
                    None => {
                        info!("record channel closed; stopping sink");
                        return;
                    }
                },
            }
        }
    }

    /// Availability first, then discovery; runs on every (re)connect.
    async fn announce(&mut self) -> Result<(), SinkError> {
        self.publish_availability().await?;
        if self.opts.discovery {
            self.publish_discovery().await?;
        }
        Ok(())
    }

    /// Always republished; the availability topic bypasses the cache.
    async fn publish_availability(&self) -> Result<(), SinkError> {
        let topic = self.scheme.availability();
        info!(topic, payload = PAYLOAD_ONLINE, "publishing availability");
        self.broker.publish(&topic, PAYLOAD_ONLINE, true).await
    }

    /// One retained descriptor per (device, discoverable field) pair.
    async fn publish_discovery(&self) -> Result<(), SinkError> {
        for (_, device) in self.opts.book.iter() {
            for field in FIELDS.iter().filter(|field| !field.ignore_discovery) {
                let descriptor =
                    Descriptor::build(&self.opts.discovery_name, device, field, &self.scheme);
                let topic = self.scheme.discovery(field.component, device, field.name);
                let payload = serde_json::to_string(&descriptor)?;
                info!(topic, "publishing discovery");
                self.broker.publish(&topic, &payload, true).await?;
            }
        }
        Ok(())
    }

    async fn publish_record(&mut self, record: Record) -> Result<(), SinkError> {
        self.publish_record_at(record, Local::now()).await
    }

    /// Publish all non-ignored fields; `status` is recomputed from `now`
    /// rather than trusted from the lookup.
    async fn publish_record_at(
        &mut self,
        record: Record,
        now: DateTime<Local>,
    ) -> Result<(), SinkError> {
        let record = record.with_status(now, self.opts.alert_within);
        let device = self.opts.book.name_for(&record.address).to_owned();

        for field in FIELDS.iter().filter(|field| !field.ignore_mqtt) {
            let payload = (field.accessor)(&record).payload();
            if payload.is_empty() {
                continue;
            }
            let topic = self.scheme.state(&device, field.name);
            self.publish_state(&topic, &payload).await?;
        }
        Ok(())
    }

    /// Suppress the publish when the payload matches the cached last value.
    async fn publish_state(&mut self, topic: &str, payload: &str) -> Result<(), SinkError> {
        if self
            .last_published
            .get(topic)
            .is_some_and(|last| last == payload)
        {
            debug!(topic, payload, "duplicate payload suppressed");
            return Ok(());
        }

        info!(topic, payload, "publishing");
        self.broker.publish(topic, payload, true).await?;
        self.last_published
            .insert(topic.to_owned(), payload.to_owned());
        Ok(())
    }
}
