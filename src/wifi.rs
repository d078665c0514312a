// wifi.rs

use std::sync::Mutex;

use anyhow::anyhow;
use embedded_svc::wifi::{ClientConfiguration, Configuration};
use esp_idf_svc::{
    eventloop::{EspSubscription, EspSystemEventLoop, System},
    netif::IpEvent,
    wifi::{EspWifi, WifiEvent},
};

use crate::*;

pub struct EspLink {
    wifi: Mutex<EspWifi<'static>>,
    _wifi_sub: EspSubscription<'static, System>,
    _ip_sub: EspSubscription<'static, System>,
}

impl EspLink {
    pub fn new(
        mut wifi: EspWifi<'static>,
        sysloop: &EspSystemEventLoop,
        config: &StationConfig,
        events: LinkEventSender,
    ) -> anyhow::Result<Self> {
        info!("WiFi setting credentials...");
        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: config
                .wifi_ssid
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("WiFi SSID too long"))?,
            password: config
                .wifi_pass
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("WiFi password too long"))?,
            ..Default::default()
        }))?;

        let tx = events.clone();
        let wifi_sub = sysloop.subscribe::<WifiEvent, _>(move |event| match event {
            WifiEvent::StaConnected(_) => tx.notify(LinkEvent::Associated),
            WifiEvent::StaDisconnected(_) => tx.notify(LinkEvent::Disconnected),
            _ => {}
        })?;
        let ip_sub = sysloop.subscribe::<IpEvent, _>(move |event| match event {
            IpEvent::DhcpIpAssigned(a) => events.notify(LinkEvent::GotIp(a.ip())),
            IpEvent::DhcpIpDeassigned(_) => events.notify(LinkEvent::LostIp),
            _ => {}
        })?;

        info!("WiFi driver starting...");
        wifi.start()?;

        Ok(EspLink {
            wifi: Mutex::new(wifi),
            _wifi_sub: wifi_sub,
            _ip_sub: ip_sub,
        })
    }

    pub fn station_id(&self) -> anyhow::Result<String> {
        let wifi = self
            .wifi
            .lock()
            .map_err(|_| anyhow!("WiFi lock poisoned"))?;
        let mac = wifi.sta_netif().get_mac()?;
        Ok(format!(
            "envstation-{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            mac[0], mac[1], mac[2], mac[3], mac[4], mac[5],
        ))
    }
}

impl LinkDriver for EspLink {
    fn associate(&self) -> anyhow::Result<()> {
        let mut wifi = self
            .wifi
            .lock()
            .map_err(|_| anyhow!("WiFi lock poisoned"))?;
        // connect() only kicks off association, the outcome arrives on the event loop
        wifi.connect()?;
        Ok(())
    }
}

// EOF
