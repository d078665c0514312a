// lib.rs
#![warn(clippy::large_futures)]

pub use std::{
    net,
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Arc,
    },
};

pub use anyhow::bail;
pub use chrono::{DateTime, NaiveDateTime, Utc};
pub use log::{debug, error, info, trace, warn};
pub use serde::{Deserialize, Serialize};
pub use tokio::{
    sync::{mpsc, watch, RwLock},
    time::{sleep, timeout, Duration},
};

mod error;
pub use error::*;

mod config;
pub use config::*;

mod state;
pub use state::*;

mod reading;
pub use reading::*;

mod queue;
pub use queue::*;

mod measure;
pub use measure::*;

mod render;
pub use render::*;

mod icons;
pub use icons::*;

mod connectivity;
pub use connectivity::*;

mod services;
pub use services::*;

mod mqtt;
pub use mqtt::*;

mod station;
pub use station::*;

#[cfg(not(target_os = "espidf"))]
pub mod sim;

#[cfg(target_os = "espidf")]
mod wifi;
#[cfg(target_os = "espidf")]
pub use wifi::*;

#[cfg(target_os = "espidf")]
mod hw;
#[cfg(target_os = "espidf")]
pub use hw::*;

#[cfg(target_os = "espidf")]
mod sntp;
#[cfg(target_os = "espidf")]
pub use sntp::*;

pub const FW_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const TEMP_RANGE: std::ops::RangeInclusive<f32> = -40.0..=80.0;
pub const HUMIDITY_RANGE: std::ops::RangeInclusive<f32> = 0.0..=100.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    pub temperature: f32,
    pub humidity: f32,
}

impl Measurement {
    pub fn new(temperature: f32, humidity: f32) -> Self {
        Measurement {
            temperature,
            humidity,
        }
    }

    pub fn check_range(self) -> Result<Self, SensorError> {
        if TEMP_RANGE.contains(&self.temperature) && HUMIDITY_RANGE.contains(&self.humidity) {
            Ok(self)
        } else {
            Err(SensorError::OutOfRange {
                temperature: self.temperature,
                humidity: self.humidity,
            })
        }
    }
}

// EOF
