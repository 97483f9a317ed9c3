use std::time::Duration;

use anyhow::Context;
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use tracing::{debug, info, warn};

use sleepfade_common::{
    parse_target_topic, parse_value_payload, target_value_topic, TargetRef,
    TOPIC_TARGET_SET_FILTER,
};

use crate::player::Player;

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mqtt_host = std::env::var("MQTT_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let mqtt_port = std::env::var("MQTT_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(1883);

    let mut mqtt_options = MqttOptions::new("sleepfade-device", mqtt_host, mqtt_port);

    if let Ok(user) = std::env::var("MQTT_USER") {
        let pass = std::env::var("MQTT_PASS").unwrap_or_default();
        mqtt_options.set_credentials(user, pass);
    }

    let mut player = Player::new(
        target_from_env("DEVICE_POWER_ID", 10)?,
        target_from_env("DEVICE_VOLUME_ID", 11)?,
        target_from_env("DEVICE_PRESET_ID", 12)?,
    );

    let (mqtt, mut eventloop) = AsyncClient::new(mqtt_options, 32);

    mqtt.subscribe(TOPIC_TARGET_SET_FILTER, QoS::AtLeastOnce)
        .await
        .context("failed to subscribe to device commands")?;
    for (target, value) in player.values() {
        mqtt.publish(target_value_topic(target), QoS::AtLeastOnce, true, value.to_string())
            .await
            .context("failed to publish initial device value")?;
    }

    info!(
        "simulated player started (power {}, volume {}, preset {})",
        player.power, player.volume, player.preset
    );

    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Incoming::Publish(message))) => {
                let Some(target) = parse_target_topic(&message.topic, "set") else {
                    continue;
                };
                let Some(value) = std::str::from_utf8(&message.payload)
                    .ok()
                    .and_then(parse_value_payload)
                else {
                    debug!("ignoring unreadable command for {target}");
                    continue;
                };

                for (target, value) in player.apply(target, value) {
                    info!("{target} -> {value}");
                    // The event loop is this task, so publishing must not wait on it.
                    if let Err(err) = mqtt.try_publish(
                        target_value_topic(target),
                        QoS::AtLeastOnce,
                        true,
                        value.to_string(),
                    ) {
                        warn!("device value publish failed: {err}");
                    }
                }
            }
            Ok(_) => {}
            Err(err) => {
                warn!("device mqtt poll error: {err}");
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}

fn target_from_env(name: &str, default: u32) -> anyhow::Result<TargetRef> {
    let id = match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u32>()
            .with_context(|| format!("{name} must be a number"))?,
        Err(_) => default,
    };
    TargetRef::new(id).with_context(|| format!("{name} must not be zero"))
}
