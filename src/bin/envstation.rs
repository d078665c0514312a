// bin/envstation.rs

#![warn(clippy::large_futures)]

use envstation::*;

#[cfg(target_os = "espidf")]
esp_idf_sys::esp_app_desc!();

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use esp_idf_hal::{delay::FreeRtos, i2c, peripherals::Peripherals, prelude::*};
    use esp_idf_svc::{eventloop::EspSystemEventLoop, nvs, wifi::EspWifi};
    use std::sync::Mutex;

    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("Hello, envstation {FW_VERSION}.");
    info!("Starting up.");

    let sysloop = EspSystemEventLoop::take()?;
    let nvs_default_partition = nvs::EspDefaultNvsPartition::take()?;

    let ns = env!("CARGO_BIN_NAME");
    let mut nvs = nvs::EspNvs::new(nvs_default_partition.clone(), ns, true)?;
    info!("Got namespace {ns:?} from default partition");

    #[cfg(feature = "reset_settings")]
    let config = {
        let c = StationConfig::default();
        c.to_nvs(&mut nvs)?;
        c
    };

    #[cfg(not(feature = "reset_settings"))]
    let config = match StationConfig::from_nvs(&mut nvs) {
        None => {
            error!("Could not read nvs config, using defaults");
            let c = StationConfig::default();
            c.to_nvs(&mut nvs)?;
            info!("Successfully saved default config to nvs.");
            c
        }

        // using settings saved on nvs if we could find them
        Some(c) => c,
    };
    info!("My config:\n{config:#?}");

    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    #[cfg(feature = "esp32c3")]
    let (sda, scl) = (pins.gpio8, pins.gpio9);
    #[cfg(feature = "esp32s")]
    let (sda, scl) = (pins.gpio21, pins.gpio22);

    let i2c_drv = i2c::I2cDriver::new(
        peripherals.i2c0,
        sda,
        scl,
        &i2c::I2cConfig::new().baudrate(400.kHz().into()),
    )?;
    let bus: SharedI2c = Box::leak(Box::new(Mutex::new(i2c_drv)));
    let sensor = Bme280Sensor::new(bus)?;
    let display = OledDisplay::new(bus)?;

    let (event_tx, event_rx) = link_events();
    let wifi = EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs_default_partition))?;
    let link = Arc::new(EspLink::new(wifi, &sysloop, &config, event_tx)?);

    let client_id = match link.station_id() {
        Ok(id) => id,
        Err(e) => {
            error!("Cannot read MAC: {e:?}");
            config.mqtt_client_id.clone()
        }
    };
    info!("Station id {client_id}");
    let publisher = Arc::new(EspPublisher::new(&config.mqtt_url, &client_id));
    let time = Arc::new(EspTimeSync::new(&config.sntp_server));

    let state = Arc::new(StationState::new(config));
    *state.myid.blocking_write() = client_id;

    let res = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(Box::pin(run_station(
            state,
            Collaborators {
                sensor,
                clock: SystemClock,
                display,
                link,
                time,
                publisher,
            },
            event_rx,
        )));

    // not actually returning from main() but we reboot instead
    error!("Station stopped: {res:?}");
    info!("main() finished, reboot.");
    FreeRtos::delay_ms(3000);
    esp_idf_hal::reset::restart();
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    use envstation::sim::*;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Hello, envstation {FW_VERSION} (host simulation).");

    let config = StationConfig::default();
    info!("My config:\n{config:#?}");
    let state = Arc::new(StationState::new(config));

    let (event_tx, event_rx) = link_events();
    let parts = Collaborators {
        sensor: SimSensor::default(),
        clock: SystemClock,
        display: LogDisplay,
        link: Arc::new(SimLink::new(event_tx)),
        time: Arc::new(SimTimeSync),
        publisher: Arc::new(LogPublisher::default()),
    };

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(Box::pin(run_station(state, parts, event_rx)))
}

// EOF
