// reading.rs

use std::fmt::Write;

use chrono::Datelike;
use heapless::String as HString;

use crate::*;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
pub const TIMESTAMP_LEN: usize = 20;
const TIMESTAMP_BUF: usize = 24;

const DATE_BUF: usize = 20;
const TIME_BUF: usize = 16;
const VALUE_BUF: usize = 20;
const WIRE_VALUE_BUF: usize = 12;

pub type Timestamp = HString<TIMESTAMP_BUF>;

/// Anything earlier means SNTP has not set the RTC yet.
pub const CLOCK_VALID_YEAR: i32 = 2020;

pub fn clock_is_set(t: &DateTime<Utc>) -> bool {
    t.year() >= CLOCK_VALID_YEAR
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub fn format_timestamp(t: &DateTime<Utc>) -> Timestamp {
    let mut s = Timestamp::new();
    // 20 characters always fit the buffer for years 0..=9999
    let _ = write!(s, "{}", t.format(TIMESTAMP_FORMAT));
    s
}

#[derive(Clone, Debug, PartialEq)]
pub struct Reading {
    temperature: f32,
    humidity: f32,
    timestamp: Timestamp,
}

/// Wire form published to the broker. Field order is part of the format.
#[derive(Debug, Serialize)]
pub struct WirePayload<'a> {
    pub temperature: HString<WIRE_VALUE_BUF>,
    pub humidity: HString<WIRE_VALUE_BUF>,
    pub timestamp: &'a str,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayFields {
    pub date: HString<DATE_BUF>,
    pub time: HString<TIME_BUF>,
    pub temperature: HString<VALUE_BUF>,
    pub humidity: HString<VALUE_BUF>,
}

impl Reading {
    pub fn new(m: Measurement, at: &DateTime<Utc>) -> Self {
        Reading {
            temperature: m.temperature,
            humidity: m.humidity,
            timestamp: format_timestamp(at),
        }
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn humidity(&self) -> f32 {
        self.humidity
    }

    pub fn timestamp(&self) -> &str {
        self.timestamp.as_str()
    }

    pub fn wire_payload(&self) -> anyhow::Result<WirePayload<'_>> {
        let mut temperature = HString::new();
        let mut humidity = HString::new();
        if write!(temperature, "{:.2}", self.temperature).is_err()
            || write!(humidity, "{:.2}", self.humidity).is_err()
        {
            bail!("Reading does not fit the wire format: {self:?}");
        }
        Ok(WirePayload {
            temperature,
            humidity,
            timestamp: self.timestamp(),
        })
    }

    pub fn to_json(&self) -> anyhow::Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.wire_payload()?)?)
    }

    pub fn display_fields(&self) -> anyhow::Result<DisplayFields> {
        let t = NaiveDateTime::parse_from_str(self.timestamp(), TIMESTAMP_FORMAT)?;
        let mut f = DisplayFields::default();
        if write!(f.date, "Date: {}", t.format("%d/%m/%Y")).is_err()
            || write!(f.time, "Time: {}", t.format("%H:%M")).is_err()
            || write!(f.temperature, "Temp: {:.1} C", self.temperature).is_err()
            || write!(f.humidity, "Hum: {:.1} %", self.humidity).is_err()
        {
            bail!("Display fields overflow for {self:?}");
        }
        Ok(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn timestamp_is_fixed_width_utc() {
        let ts = format_timestamp(&at(2024, 3, 1, 10, 15, 30));
        assert_eq!(ts.as_str(), "2024-03-01T10:15:30Z");
        assert_eq!(ts.len(), TIMESTAMP_LEN);
    }

    #[test]
    fn payload_rounds_to_two_decimals() {
        let r = Reading::new(Measurement::new(23.456, 61.2), &at(2024, 3, 1, 10, 15, 30));
        let v: serde_json::Value = serde_json::from_slice(&r.to_json().unwrap()).unwrap();
        assert_eq!(v["temperature"], "23.46");
        assert_eq!(v["humidity"], "61.20");
        assert_eq!(v["timestamp"], "2024-03-01T10:15:30Z");
        assert_eq!(v.as_object().unwrap().len(), 3);
    }

    #[test]
    fn payload_keeps_key_order() {
        let r = Reading::new(Measurement::new(-5.0, 100.0), &at(2024, 12, 31, 23, 59, 59));
        let s = String::from_utf8(r.to_json().unwrap()).unwrap();
        assert_eq!(
            s,
            r#"{"temperature":"-5.00","humidity":"100.00","timestamp":"2024-12-31T23:59:59Z"}"#
        );
    }

    #[test]
    fn display_fields_come_from_timestamp() {
        let r = Reading::new(Measurement::new(23.456, 61.2), &at(2024, 3, 1, 9, 5, 30));
        let f = r.display_fields().unwrap();
        assert_eq!(f.date.as_str(), "Date: 01/03/2024");
        assert_eq!(f.time.as_str(), "Time: 09:05");
        assert_eq!(f.temperature.as_str(), "Temp: 23.5 C");
        assert_eq!(f.humidity.as_str(), "Hum: 61.2 %");
    }

    #[test]
    fn epoch_clock_is_not_set() {
        assert!(!clock_is_set(&at(1970, 1, 1, 0, 0, 12)));
        assert!(!clock_is_set(&at(2019, 12, 31, 23, 59, 59)));
        assert!(clock_is_set(&at(2020, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn out_of_range_measurement_is_rejected() {
        assert!(Measurement::new(21.0, 40.0).check_range().is_ok());
        assert!(Measurement::new(-41.0, 40.0).check_range().is_err());
        assert!(Measurement::new(21.0, 100.5).check_range().is_err());
        assert!(Measurement::new(f32::NAN, 40.0).check_range().is_err());
    }
}

// EOF
