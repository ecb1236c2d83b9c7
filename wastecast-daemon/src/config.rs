//! Environment-driven daemon configuration.

use clap::Parser;
use tracing::info;

/// Runtime settings, loaded from flags or environment variables.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Bridge municipal waste pickup schedules to MQTT"
)]
pub struct Config {
    /// Addresses to watch, as comma-separated "address:name" pairs.
    #[arg(long, env = "WASTECAST_ADDRESS")]
    pub address: String,

    /// Alert window in seconds; a pickup inside it turns the status sensor on.
    #[arg(long, env = "WASTECAST_ALERT_WITHIN", default_value_t = 86_400)]
    pub alert_within: i64,

    /// Seconds between lookup cycles.
    #[arg(long, env = "WASTECAST_LOOKUP_INTERVAL", default_value_t = 28_800)]
    pub lookup_interval: u64,

    /// MQTT broker host.
    #[arg(long, env = "MQTT_HOST", default_value = "127.0.0.1")]
    pub mqtt_host: String,

    /// MQTT broker port.
    #[arg(long, env = "MQTT_PORT", default_value_t = 1883)]
    pub mqtt_port: u16,

    /// MQTT username.
    #[arg(long, env = "MQTT_USERNAME")]
    pub mqtt_username: Option<String>,

    /// MQTT password.
    #[arg(long, env = "MQTT_PASSWORD")]
    pub mqtt_password: Option<String>,

    /// MQTT client identifier.
    #[arg(long, env = "MQTT_CLIENT_ID", default_value = "wastecast")]
    pub mqtt_client_id: String,

    /// Prefix for state and availability topics.
    #[arg(long, env = "MQTT_TOPIC_PREFIX", default_value = "home/wastecast")]
    pub topic_prefix: String,

    /// Publish Home Assistant discovery metadata.
    #[arg(long, env = "MQTT_DISCOVERY")]
    pub discovery: bool,

    /// Home Assistant discovery prefix.
    #[arg(long, env = "MQTT_DISCOVERY_PREFIX", default_value = "homeassistant")]
    pub discovery_prefix: String,

    /// Device name used in discovery metadata.
    #[arg(long, env = "MQTT_DISCOVERY_NAME", default_value = "wastecast")]
    pub discovery_name: String,
}

impl Config {
    /// Log the effective settings, with the password redacted.
    pub fn log_settings(&self) {
        let password = if self.mqtt_password.is_some() {
            "<REDACTED>"
        } else {
            ""
        };
        info!(
            address = %self.address,
            alert_within = self.alert_within,
            lookup_interval = self.lookup_interval,
            mqtt_host = %self.mqtt_host,
            mqtt_port = self.mqtt_port,
            mqtt_username = self.mqtt_username.as_deref().unwrap_or(""),
            mqtt_password = password,
            mqtt_client_id = %self.mqtt_client_id,
            topic_prefix = %self.topic_prefix,
            discovery = self.discovery,
            discovery_prefix = %self.discovery_prefix,
            discovery_name = %self.discovery_name,
            "environmental settings"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_flags() {
        let config = Config::try_parse_from(["wastecast", "--address", "2133 N 61ST ST:home"])
            .expect("parses");

        assert_eq!(config.alert_within, 86_400);
        assert_eq!(config.lookup_interval, 28_800);
        assert_eq!(config.mqtt_port, 1883);
        assert_eq!(config.topic_prefix, "home/wastecast");
        assert_eq!(config.discovery_prefix, "homeassistant");
        assert!(!config.discovery);
        assert!(config.mqtt_username.is_none());
    }

    #[test]
    fn address_is_required() {
        assert!(Config::try_parse_from(["wastecast"]).is_err());
    }
}
