// hw.rs

use std::sync::Mutex;

use anyhow::anyhow;
use bme280::i2c::BME280;
use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use embedded_hal_bus::i2c::MutexDevice;
use esp_idf_hal::{delay::FreeRtos, i2c::I2cDriver};
use ssd1306::{mode::BufferedGraphicsMode, prelude::*, I2CDisplayInterface, Ssd1306};

use crate::*;

const LINE_Y: [i32; 4] = [12, 28, 46, 62];
const SUN_AT: Point = Point::new(116, 41);
const UMBRELLA_AT: Point = Point::new(116, 56);

// Sensor and OLED share one bus.
pub type SharedI2c = &'static Mutex<I2cDriver<'static>>;
type BusDevice = MutexDevice<'static, I2cDriver<'static>>;

pub struct Bme280Sensor {
    dev: BME280<BusDevice>,
}

impl Bme280Sensor {
    pub fn new(bus: SharedI2c) -> anyhow::Result<Self> {
        let mut dev = BME280::new_primary(MutexDevice::new(bus));
        dev.init(&mut FreeRtos)
            .map_err(|e| anyhow!("BME280 init failed: {e:?}"))?;
        info!("BME280 ready.");
        Ok(Bme280Sensor { dev })
    }
}

impl Sensor for Bme280Sensor {
    fn read(&mut self) -> Result<Measurement, SensorError> {
        let m = self
            .dev
            .measure(&mut FreeRtos)
            .map_err(|e| SensorError::Bus(format!("{e:?}")))?;
        Ok(Measurement::new(m.temperature, m.humidity))
    }
}

type Oled = Ssd1306<I2CInterface<BusDevice>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

pub struct OledDisplay {
    oled: Oled,
}

impl OledDisplay {
    pub fn new(bus: SharedI2c) -> anyhow::Result<Self> {
        let iface = I2CDisplayInterface::new(MutexDevice::new(bus));
        let mut oled = Ssd1306::new(iface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        oled.init().map_err(|e| anyhow!("OLED init failed: {e:?}"))?;
        oled.clear_buffer();
        oled.flush().map_err(|e| anyhow!("OLED flush failed: {e:?}"))?;
        info!("OLED ready.");
        Ok(OledDisplay { oled })
    }

    fn draw(&mut self, lines: [&str; 4]) -> anyhow::Result<()> {
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        self.oled.clear_buffer();
        for (line, y) in lines.iter().zip(LINE_Y) {
            Text::with_baseline(line, Point::new(0, y), style, Baseline::Alphabetic)
                .draw(&mut self.oled)
                .map_err(|e| anyhow!("OLED draw failed: {e:?}"))?;
        }
        draw_sun(&mut self.oled, SUN_AT).map_err(|e| anyhow!("OLED draw failed: {e:?}"))?;
        draw_umbrella(&mut self.oled, UMBRELLA_AT)
            .map_err(|e| anyhow!("OLED draw failed: {e:?}"))?;
        self.oled
            .flush()
            .map_err(|e| anyhow!("OLED flush failed: {e:?}"))?;
        Ok(())
    }
}

impl Display for OledDisplay {
    fn render(&mut self, date: &str, time: &str, temperature: &str, humidity: &str) {
        if let Err(e) = self.draw([date, time, temperature, humidity]) {
            error!("{e:?}");
        }
    }
}

// EOF
