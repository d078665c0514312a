// measure.rs

use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::*;

pub trait Sensor {
    fn read(&mut self) -> Result<Measurement, SensorError>;
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SampleOutcome {
    pub display: Option<SendOutcome>,
    pub network: Option<SendOutcome>,
}

pub struct Sampler<S, C> {
    state: Arc<StationState>,
    sensor: S,
    clock: C,
    display_tx: QueueSender,
    network_tx: QueueSender,
}

impl<S: Sensor, C: Clock> Sampler<S, C> {
    pub fn new(
        state: Arc<StationState>,
        sensor: S,
        clock: C,
        display_tx: QueueSender,
        network_tx: QueueSender,
    ) -> Self {
        Sampler {
            state,
            sensor,
            clock,
            display_tx,
            network_tx,
        }
    }

    pub async fn sample_once(&mut self) -> SampleOutcome {
        let now = self.clock.now();
        if !clock_is_set(&now) {
            let n = Stats::bump(&self.state.stats.clock_unset);
            warn!("System time not set yet ({now}), skipping sample (#{n})");
            return SampleOutcome::default();
        }
        let m = match self.sensor.read().and_then(Measurement::check_range) {
            Ok(m) => m,
            Err(e) => {
                let n = Stats::bump(&self.state.stats.sensor_errors);
                error!("Sensor read failed (#{n}): {e}");
                return SampleOutcome::default();
            }
        };
        let reading = Reading::new(m, &now);
        Stats::bump(&self.state.stats.samples);
        info!(
            "Sampled {t:.2} C {h:.2} % at {ts}",
            t = reading.temperature(),
            h = reading.humidity(),
            ts = reading.timestamp()
        );

        let wait = self.state.config.send_timeout();
        let display = self.enqueue(&self.display_tx, reading.clone(), wait).await;
        Self::count_drop(&display, &self.state.stats.display_dropped);
        let network = self.enqueue(&self.network_tx, reading, wait).await;
        Self::count_drop(&network, &self.state.stats.network_dropped);

        SampleOutcome {
            display: Some(display),
            network: Some(network),
        }
    }

    async fn enqueue(&self, q: &QueueSender, reading: Reading, wait: Duration) -> SendOutcome {
        let res = q.send_bounded(reading, wait).await;
        match res {
            SendOutcome::Queued => debug!("Queued reading to {}", q.name()),
            SendOutcome::Full => warn!("Queue {} full, reading dropped", q.name()),
            SendOutcome::Closed => error!("Queue {} closed, reading dropped", q.name()),
        }
        res
    }

    fn count_drop(res: &SendOutcome, counter: &AtomicU32) {
        if *res != SendOutcome::Queued {
            Stats::bump(counter);
        }
    }

    // Auto-reload timer: the first sample comes one period after start.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let period = self.state.config.sample_period();
        if period.is_zero() {
            return Err(PipelineError::TimerPeriod { name: "sampler" }.into());
        }
        let mut timer = interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Sampler running every {period:?}");

        loop {
            timer.tick().await;
            self.sample_once().await;
            let id = self.state.myid.read().await;
            info!("{id} Stats: {:?}", self.state.stats.snapshot());
        }
    }
}


// EOF
