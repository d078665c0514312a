// station.rs

use crate::*;

pub struct Collaborators<S, C, D> {
    pub sensor: S,
    pub clock: C,
    pub display: D,
    pub link: Arc<dyn LinkDriver>,
    pub time: Arc<dyn TimeSync>,
    pub publisher: Arc<dyn Publisher>,
}

/// Builds the queues and tasks, then runs until one of the tasks ends.
/// Resource creation errors come back before anything is started.
pub async fn run_station<S, C, D>(
    state: Arc<StationState>,
    parts: Collaborators<S, C, D>,
    link_events: mpsc::Receiver<LinkEvent>,
) -> anyhow::Result<()>
where
    S: Sensor,
    C: Clock,
    D: Display,
{
    let capacity = state.config.queue_capacity();
    let (display_tx, display_rx) = bounded_queue(DISPLAY_QUEUE, capacity)?;
    let (network_tx, network_rx) = bounded_queue(NETWORK_QUEUE, capacity)?;
    if state.config.sample_period().is_zero() {
        return Err(PipelineError::TimerPeriod { name: "sampler" }.into());
    }
    if state.config.watchdog_interval().is_zero() {
        return Err(PipelineError::TimerPeriod { name: "watchdog" }.into());
    }

    let services = Arc::new(NetworkServices::new(parts.time, parts.publisher.clone()));
    let manager = ConnectivityManager::new(state.clone(), parts.link, services);
    let conn = manager.connectivity();
    let sampler = Sampler::new(
        state.clone(),
        parts.sensor,
        parts.clock,
        display_tx,
        network_tx,
    );

    manager.start();

    info!("Entering main loop...");
    tokio::select! {
        r = Box::pin(sampler.run()) => { error!("sampler.run() ended."); r }
        r = Box::pin(run_render(state.clone(), display_rx, parts.display)) => { error!("run_render() ended."); r }
        r = Box::pin(run_publish(state.clone(), network_rx, conn, parts.publisher)) => { error!("run_publish() ended."); r }
        r = Box::pin(manager.run_events(link_events)) => { error!("manager.run_events() ended."); r }
        r = Box::pin(manager.watchdog()) => { error!("manager.watchdog() ended."); r }
    }
}

// EOF
