//! Headless daemon that polls the collection calendar and republishes the
//! next pickup as per-field MQTT state.

mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::TimeDelta;
use clap::Parser;
use reqwest::Client;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wastecast_core::{lookup::LookupClient, model::AddressBook, poll::Poller};
use wastecast_mqtt::{
    session::{Session, SessionOpts},
    sink::{Sink, SinkOpts},
    topic::TopicScheme,
};
use wastecast_source_seattle::SeattleWastePort;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.log_settings();

    let book = AddressBook::from_spec(&config.address);
    anyhow::ensure!(
        !book.is_empty(),
        "no addresses configured; set WASTECAST_ADDRESS"
    );

    // HTTP + lookup setup
    let client = Client::builder().user_agent("wastecast/0.1").build()?;
    let port = Arc::new(SeattleWastePort::new(client));
    let lookup = LookupClient::new(port, TimeDelta::seconds(config.alert_within));

    // Broker session, with the last will retained on the availability topic
    let scheme = TopicScheme::new(config.topic_prefix.clone(), config.discovery_prefix.clone());
    let (session, session_events) = Session::start(SessionOpts {
        host: config.mqtt_host.clone(),
        port: config.mqtt_port,
        client_id: config.mqtt_client_id.clone(),
        username: config.mqtt_username.clone(),
        password: config.mqtt_password.clone(),
        availability_topic: scheme.availability(),
    });

    // Poller feeds the sink through a bounded channel
    let (records_sender, records_receiver) = mpsc::channel(16);
    let poller = Poller::new(
        book.clone(),
        lookup,
        Duration::from_secs(config.lookup_interval),
        records_sender,
    );

    let sink = Sink::new(
        Arc::new(session),
        SinkOpts {
            book,
            discovery: config.discovery,
            discovery_prefix: config.discovery_prefix.clone(),
            discovery_name: config.discovery_name.clone(),
            topic_prefix: config.topic_prefix.clone(),
            alert_within: TimeDelta::seconds(config.alert_within),
        },
    );

    tokio::spawn(poller.run());

    tokio::select! {
        () = sink.run(records_receiver, session_events) => {
            info!("sink stopped");
        }
        result = signal::ctrl_c() => {
            result?;
            info!("shutting down");
        }
    }

    Ok(())
}
