// render.rs

use crate::*;

pub trait Display {
    fn render(&mut self, date: &str, time: &str, temperature: &str, humidity: &str);
}

pub fn render_reading<D: Display>(display: &mut D, reading: &Reading) -> anyhow::Result<()> {
    let f = reading.display_fields()?;
    display.render(&f.date, &f.time, &f.temperature, &f.humidity);
    Ok(())
}

pub async fn run_render<D: Display>(
    state: Arc<StationState>,
    mut rx: QueueReceiver,
    mut display: D,
) -> anyhow::Result<()> {
    let diag = state.config.recv_diag();
    let pause = state.config.yield_delay();
    info!("Render consumer waiting on queue {}", rx.name());

    loop {
        match rx.recv_within(diag).await {
            RecvOutcome::Item(reading) => match render_reading(&mut display, &reading) {
                Ok(()) => {
                    Stats::bump(&state.stats.rendered);
                    debug!("Rendered reading from {}", reading.timestamp());
                }
                Err(e) => error!("Cannot render reading {reading:?}: {e}"),
            },
            RecvOutcome::Timeout => info!("No reading for display within {diag:?}"),
            RecvOutcome::Closed => {
                error!("Display queue closed.");
                return Ok(());
            }
        }
        sleep(pause).await;
    }
}


// EOF
