// error.rs

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("queue {name} cannot be created with zero capacity")]
    QueueCapacity { name: &'static str },
    #[error("timer {name} cannot be created with a zero period")]
    TimerPeriod { name: &'static str },
}

// Sensor errors are transient: the sampler logs them and waits for the next period.
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("sensor bus error: {0}")]
    Bus(String),
    #[error("sensor value out of range: {temperature} C, {humidity} %")]
    OutOfRange { temperature: f32, humidity: f32 },
}

// EOF
