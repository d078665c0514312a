// sim.rs
//
// Stand-ins for the board peripherals so the station runs on a desktop.

use std::net::Ipv4Addr;

use crate::*;

#[derive(Debug, Default)]
pub struct SimSensor {
    n: u32,
}

impl Sensor for SimSensor {
    fn read(&mut self) -> Result<Measurement, SensorError> {
        self.n = self.n.wrapping_add(1);
        let step = (self.n % 20) as f32;
        let wave = if step < 10.0 { step } else { 20.0 - step };
        Ok(Measurement::new(21.0 + wave * 0.15, 45.0 + wave * 0.5))
    }
}

#[derive(Debug, Default)]
pub struct LogDisplay;

impl Display for LogDisplay {
    fn render(&mut self, date: &str, time: &str, temperature: &str, humidity: &str) {
        info!("[screen] {date} | {time} | {temperature} | {humidity}");
    }
}

/// Associates at once and hands out a loopback address.
pub struct SimLink {
    events: LinkEventSender,
}

impl SimLink {
    pub fn new(events: LinkEventSender) -> Self {
        SimLink { events }
    }
}

impl LinkDriver for SimLink {
    fn associate(&self) -> anyhow::Result<()> {
        self.events.notify(LinkEvent::Associated);
        self.events.notify(LinkEvent::GotIp(Ipv4Addr::LOCALHOST));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct SimTimeSync;

impl TimeSync for SimTimeSync {
    fn init(&self) -> anyhow::Result<()> {
        info!("Host clock is already synchronized.");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct LogPublisher {
    started: AtomicBool,
}

impl Publisher for LogPublisher {
    fn start(&self) -> anyhow::Result<()> {
        if self.started.swap(true, Ordering::AcqRel) {
            info!("Publisher already running.");
        } else {
            info!("Publisher started.");
        }
        Ok(())
    }

    fn publish(&self, topic: &str, payload: &[u8]) -> anyhow::Result<()> {
        if !self.started.load(Ordering::Acquire) {
            bail!("publisher not started");
        }
        info!("[mqtt] {topic} {}", String::from_utf8_lossy(payload));
        Ok(())
    }
}


// EOF
