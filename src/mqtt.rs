// mqtt.rs

use crate::*;

/// At-most-once publish client. `start` must reuse a client that is already running.
pub trait Publisher: Send + Sync {
    fn start(&self) -> anyhow::Result<()>;
    fn publish(&self, topic: &str, payload: &[u8]) -> anyhow::Result<()>;
}

#[derive(Debug, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    Offline,
    Failed,
}

/// Connectivity is checked for every reading; a reading that cannot go out is dropped.
pub fn publish_reading(
    state: &StationState,
    conn: &Connectivity,
    publisher: &dyn Publisher,
    reading: &Reading,
) -> PublishOutcome {
    if !conn.is_connected() {
        let n = Stats::bump(&state.stats.offline_dropped);
        warn!(
            "Not connected, dropping reading from {} ({n} dropped so far)",
            reading.timestamp()
        );
        return PublishOutcome::Offline;
    }

    let topic = &state.config.mqtt_topic;
    let res = reading
        .to_json()
        .and_then(|payload| publisher.publish(topic, &payload));
    match res {
        Ok(()) => {
            Stats::bump(&state.stats.published);
            info!("MQTT sent {topic}: {}", reading.timestamp());
            PublishOutcome::Published
        }
        Err(e) => {
            Stats::bump(&state.stats.publish_errors);
            error!("MQTT send error: {e:?}");
            PublishOutcome::Failed
        }
    }
}

pub async fn run_publish(
    state: Arc<StationState>,
    mut rx: QueueReceiver,
    conn: Connectivity,
    publisher: Arc<dyn Publisher>,
) -> anyhow::Result<()> {
    info!("MQTT consumer waiting for connectivity...");
    conn.wait_connected().await?;
    match conn.status().ip {
        Some(ip) => info!("MQTT consumer running on queue {} via {ip}", rx.name()),
        None => info!("MQTT consumer running on queue {}", rx.name()),
    }

    let diag = state.config.recv_diag();
    let pause = state.config.yield_delay();
    loop {
        match rx.recv_within(diag).await {
            RecvOutcome::Item(reading) => {
                publish_reading(&state, &conn, publisher.as_ref(), &reading);
            }
            RecvOutcome::Timeout => info!("No reading for MQTT within {diag:?}"),
            RecvOutcome::Closed => {
                error!("Network queue closed.");
                return Ok(());
            }
        }
        sleep(pause).await;
    }
}

#[cfg(target_os = "espidf")]
pub use esp::EspPublisher;

#[cfg(target_os = "espidf")]
mod esp {
    use std::sync::Mutex;

    use anyhow::anyhow;
    use esp_idf_svc::mqtt::client::{EspMqttClient, MqttClientConfiguration, QoS};

    use crate::*;

    pub struct EspPublisher {
        url: String,
        client_id: String,
        client: Mutex<Option<EspMqttClient<'static>>>,
    }

    impl EspPublisher {
        pub fn new(url: &str, client_id: &str) -> Self {
            EspPublisher {
                url: url.into(),
                client_id: client_id.into(),
                client: Mutex::new(None),
            }
        }
    }

    impl Publisher for EspPublisher {
        fn start(&self) -> anyhow::Result<()> {
            let mut slot = self
                .client
                .lock()
                .map_err(|_| anyhow!("MQTT client lock poisoned"))?;
            if slot.is_some() {
                info!("MQTT client already running.");
                return Ok(());
            }

            info!("MQTT connecting to {}...", self.url);
            let client = EspMqttClient::new_cb(
                &self.url,
                &MqttClientConfiguration {
                    client_id: Some(&self.client_id),
                    keep_alive_interval: Some(Duration::from_secs(25)),
                    ..Default::default()
                },
                |event| info!("MQTT event: {:?}", event.payload()),
            )?;
            *slot = Some(client);
            Ok(())
        }

        fn publish(&self, topic: &str, payload: &[u8]) -> anyhow::Result<()> {
            let mut slot = self
                .client
                .lock()
                .map_err(|_| anyhow!("MQTT client lock poisoned"))?;
            match slot.as_mut() {
                Some(client) => {
                    client.enqueue(topic, QoS::AtMostOnce, false, payload)?;
                    Ok(())
                }
                None => bail!("MQTT client not started"),
            }
        }
    }
}


// EOF
