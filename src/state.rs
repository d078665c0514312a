// state.rs

use crate::*;

#[derive(Debug, Default)]
pub struct Stats {
    pub samples: AtomicU32,
    pub clock_unset: AtomicU32,
    pub sensor_errors: AtomicU32,
    pub display_dropped: AtomicU32,
    pub network_dropped: AtomicU32,
    pub rendered: AtomicU32,
    pub published: AtomicU32,
    pub publish_errors: AtomicU32,
    pub offline_dropped: AtomicU32,
    pub associations: AtomicU32,
    pub startups: AtomicU32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub samples: u32,
    pub clock_unset: u32,
    pub sensor_errors: u32,
    pub display_dropped: u32,
    pub network_dropped: u32,
    pub rendered: u32,
    pub published: u32,
    pub publish_errors: u32,
    pub offline_dropped: u32,
    pub associations: u32,
    pub startups: u32,
}

impl Stats {
    pub fn bump(counter: &AtomicU32) -> u32 {
        counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            samples: self.samples.load(Ordering::Relaxed),
            clock_unset: self.clock_unset.load(Ordering::Relaxed),
            sensor_errors: self.sensor_errors.load(Ordering::Relaxed),
            display_dropped: self.display_dropped.load(Ordering::Relaxed),
            network_dropped: self.network_dropped.load(Ordering::Relaxed),
            rendered: self.rendered.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            publish_errors: self.publish_errors.load(Ordering::Relaxed),
            offline_dropped: self.offline_dropped.load(Ordering::Relaxed),
            associations: self.associations.load(Ordering::Relaxed),
            startups: self.startups.load(Ordering::Relaxed),
        }
    }
}

pub struct StationState {
    pub config: StationConfig,
    pub myid: RwLock<String>,
    pub stats: Stats,
}

impl StationState {
    pub fn new(config: StationConfig) -> Self {
        let myid = config.mqtt_client_id.clone();
        StationState {
            config,
            myid: RwLock::new(myid),
            stats: Stats::default(),
        }
    }
}


// EOF
