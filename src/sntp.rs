// sntp.rs

use std::{sync::Mutex, thread};

use anyhow::anyhow;
use esp_idf_svc::sntp::{EspSntp, SntpConf};

use crate::*;

const SYNC_POLLS: u32 = 10;
const SYNC_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub struct EspTimeSync {
    server: String,
    sntp: Mutex<Option<EspSntp<'static>>>,
}

impl EspTimeSync {
    pub fn new(server: &str) -> Self {
        EspTimeSync {
            server: server.into(),
            sntp: Mutex::new(None),
        }
    }
}

impl TimeSync for EspTimeSync {
    fn init(&self) -> anyhow::Result<()> {
        let mut slot = self
            .sntp
            .lock()
            .map_err(|_| anyhow!("SNTP lock poisoned"))?;
        if slot.is_some() {
            return Ok(());
        }
        let mut conf = SntpConf::default();
        conf.servers[0] = self.server.as_str();
        info!("SNTP polling {}", self.server);
        *slot = Some(EspSntp::new(&conf)?);

        // bounded wait for the first sync, off the event loop
        thread::Builder::new()
            .name("sntp-wait".into())
            .stack_size(8192)
            .spawn(wait_for_time)?;
        Ok(())
    }
}

fn wait_for_time() {
    for poll in 1..=SYNC_POLLS {
        let now = Utc::now();
        if clock_is_set(&now) {
            info!("System time set: {}", format_timestamp(&now));
            return;
        }
        info!("Waiting for system time to be set... ({poll}/{SYNC_POLLS})");
        thread::sleep(SYNC_POLL_INTERVAL);
    }
    warn!("System time still not set after {SYNC_POLLS} polls, samples are skipped until it is.");
}

// EOF
