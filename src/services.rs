// services.rs

use crate::*;

pub trait TimeSync: Send + Sync {
    fn init(&self) -> anyhow::Result<()>;
}

pub struct NetworkServices {
    time: Arc<dyn TimeSync>,
    publisher: Arc<dyn Publisher>,
    time_started: AtomicBool,
}

impl NetworkServices {
    pub fn new(time: Arc<dyn TimeSync>, publisher: Arc<dyn Publisher>) -> Self {
        NetworkServices {
            time,
            publisher,
            time_started: AtomicBool::new(false),
        }
    }

    pub fn time_started(&self) -> bool {
        self.time_started.load(Ordering::Acquire)
    }
}

impl DependentStartup for NetworkServices {
    fn on_connected(&self) {
        if !self.time_started.swap(true, Ordering::AcqRel) {
            info!("Initializing SNTP");
            if let Err(e) = self.time.init() {
                error!("SNTP init failed: {e:?}");
                // next connected edge tries again
                self.time_started.store(false, Ordering::Release);
            }
        }

        info!("MQTT starting...");
        if let Err(e) = self.publisher.start() {
            error!("MQTT start failed: {e:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlakyTime {
        calls: AtomicU32,
        fail_first: bool,
    }

    impl TimeSync for FlakyTime {
        fn init(&self) -> anyhow::Result<()> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_first && n == 0 {
                bail!("no route to pool.ntp.org");
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct StartCounter(AtomicU32);

    impl Publisher for StartCounter {
        fn start(&self) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn publish(&self, _topic: &str, _payload: &[u8]) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn time_sync_once_publisher_every_edge() {
        let time = Arc::new(FlakyTime {
            calls: AtomicU32::new(0),
            fail_first: false,
        });
        let publisher = Arc::new(StartCounter::default());
        let s = NetworkServices::new(time.clone(), publisher.clone());
        for _ in 0..4 {
            s.on_connected();
        }
        assert!(s.time_started());
        assert_eq!(time.calls.load(Ordering::SeqCst), 1);
        assert_eq!(publisher.0.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn failed_time_sync_is_retried_on_next_edge() {
        let time = Arc::new(FlakyTime {
            calls: AtomicU32::new(0),
            fail_first: true,
        });
        let s = NetworkServices::new(time.clone(), Arc::new(StartCounter::default()));
        s.on_connected();
        assert!(!s.time_started());
        s.on_connected();
        s.on_connected();
        assert!(s.time_started());
        assert_eq!(time.calls.load(Ordering::SeqCst), 2);
    }
}

// EOF
