// config.rs

use anyhow::bail;
use crc::{Crc, CRC_32_ISCSI};
use log::*;
use serde::{Deserialize, Serialize};
use tokio::time::Duration;

pub const NVS_BUF_SIZE: usize = 256;

const DEFAULT_SAMPLE_PERIOD_MS: u64 = 60_000;
const DEFAULT_SEND_TIMEOUT_MS: u64 = 100;
const DEFAULT_WATCHDOG_MS: u64 = 60_000;
const DEFAULT_RETRY_DELAY_MS: u64 = 5_000;
const DEFAULT_YIELD_MS: u64 = 100;
const DEFAULT_QUEUE_CAPACITY: u32 = 10;

#[cfg(target_os = "espidf")]
const CONFIG_NAME: &str = "cfg";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    pub sample_period_ms: u64,
    pub send_timeout_ms: u64,
    pub watchdog_ms: u64,
    pub retry_delay_ms: u64,
    pub yield_ms: u64,
    pub queue_capacity: u32,
    pub recv_diag_ms: Option<u64>,

    pub wifi_ssid: String,
    pub wifi_pass: String,

    pub mqtt_url: String,
    pub mqtt_topic: String,
    pub mqtt_client_id: String,

    pub sntp_server: String,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            sample_period_ms: DEFAULT_SAMPLE_PERIOD_MS,
            send_timeout_ms: DEFAULT_SEND_TIMEOUT_MS,
            watchdog_ms: DEFAULT_WATCHDOG_MS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            yield_ms: DEFAULT_YIELD_MS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            recv_diag_ms: None,

            wifi_ssid: option_env!("WIFI_SSID").unwrap_or("internet").into(),
            wifi_pass: option_env!("WIFI_PASS").unwrap_or("password").into(),

            mqtt_url: option_env!("MQTT_URL")
                .unwrap_or("mqtt://mqtt.local:1883")
                .into(),
            mqtt_topic: option_env!("MQTT_TOPIC")
                .unwrap_or("/home/office/dht")
                .into(),
            mqtt_client_id: "envstation".into(),

            sntp_server: "pool.ntp.org".into(),
        }
    }
}

impl StationConfig {
    pub fn sample_period(&self) -> Duration {
        Duration::from_millis(self.sample_period_ms)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_millis(self.watchdog_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn yield_delay(&self) -> Duration {
        Duration::from_millis(self.yield_ms)
    }

    pub fn recv_diag(&self) -> Option<Duration> {
        self.recv_diag_ms.map(Duration::from_millis)
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity as usize
    }

    pub fn from_bytes(b: &[u8]) -> Option<Self> {
        let crc = Crc::<u32>::new(&CRC_32_ISCSI);
        let digest = crc.digest();
        match postcard::from_bytes_crc32::<StationConfig>(b, digest) {
            Ok(c) => {
                info!("Successfully parsed config.");
                Some(c)
            }
            Err(e) => {
                error!("Cannot parse config: {e:?}");
                None
            }
        }
    }

    pub fn to_bytes<'a>(&self, buf: &'a mut [u8]) -> anyhow::Result<&'a mut [u8]> {
        let crc = Crc::<u32>::new(&CRC_32_ISCSI);
        let digest = crc.digest();
        match postcard::to_slice_crc32(self, buf, digest) {
            Ok(d) => Ok(d),
            Err(e) => {
                let estr = format!("Cannot encode config to buffer {e:?}");
                bail!("{estr}");
            }
        }
    }
}

#[cfg(target_os = "espidf")]
impl StationConfig {
    pub fn from_nvs(nvs: &mut esp_idf_svc::nvs::EspNvs<esp_idf_svc::nvs::NvsDefault>) -> Option<Self> {
        let mut nvsbuf = [0u8; NVS_BUF_SIZE];
        info!("Reading up to {sz} bytes from nvs...", sz = NVS_BUF_SIZE);
        let b = match nvs.get_raw(CONFIG_NAME, &mut nvsbuf) {
            Err(e) => {
                error!("Nvs read error {e:?}");
                return None;
            }
            Ok(Some(b)) => b,
            _ => {
                error!("Nvs key not found");
                return None;
            }
        };
        info!("Got {sz} bytes from nvs. Parsing config...", sz = b.len());
        Self::from_bytes(b)
    }

    pub fn to_nvs(&self, nvs: &mut esp_idf_svc::nvs::EspNvs<esp_idf_svc::nvs::NvsDefault>) -> anyhow::Result<()> {
        let mut nvsbuf = [0u8; NVS_BUF_SIZE];
        let nvsdata = self.to_bytes(&mut nvsbuf)?;
        info!(
            "Encoded config to {sz} bytes. Saving to nvs...",
            sz = nvsdata.len()
        );

        match nvs.set_raw(CONFIG_NAME, nvsdata) {
            Ok(_) => {
                info!("Config saved.");
                Ok(())
            }
            Err(e) => {
                let estr = format!("Cannot save to nvs: {e:?}");
                bail!("{estr}");
            }
        }
    }
}


// EOF
