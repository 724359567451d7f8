//! Real BLE transport on top of `bluest`.
//!
//! Discovery filters advertisements by the configured name prefix plus the
//! custom buzzer service UUID, with the standard battery service treated as
//! optional. Scanning runs until a match appears or the cancellation token
//! fires; cancelling maps to the distinguished cancelled outcome so the UI
//! can offer an abort button that behaves like dismissing a pairing dialog.

use async_trait::async_trait;
use bluest::{Adapter, Characteristic, Device};
use buzzer_proto::{
    battery_level_from_wire, ButtonState, BuzzerId, Rgb, UUID_BATTERY_LEVEL, UUID_BATTERY_SERVICE,
    UUID_BUTTON_STATE, UUID_BUZZER_SERVICE, UUID_DEVICE_IDENTITY, UUID_ILLUMINATION_CONTROL,
};
use futures_util::StreamExt;
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

use crate::config::HostConfig;
use crate::error::{ConnectError, LinkError};
use crate::transport::{BuzzerLink, LinkEvent, Transport};

/// Capacity of the per-link event channel. Presses are rare; this only has
/// to absorb a burst while the manager's event loop is busy.
const LINK_EVENT_BUFFER: usize = 16;

impl From<bluest::Error> for LinkError {
    fn from(err: bluest::Error) -> Self {
        LinkError::Io(err.to_string())
    }
}

/// Does an advertised name belong to the requested buzzer?
fn name_matches(prefix: &str, identity: BuzzerId, name: &str) -> bool {
    name.starts_with(prefix) && name.to_lowercase().contains(identity.color_name())
}

/// `bluest`-backed [`Transport`].
pub struct BleTransport {
    adapter: Adapter,
    config: HostConfig,
    cancel: CancellationToken,
}

impl BleTransport {
    /// Acquire the default adapter and wait for it to become available.
    pub async fn new(config: HostConfig) -> Result<Self, ConnectError> {
        let adapter = Adapter::default().await.ok_or(ConnectError::NoAdapter)?;
        adapter
            .wait_available()
            .await
            .map_err(|err| ConnectError::Failed(err.to_string()))?;
        info!("bluetooth adapter available");
        Ok(Self {
            adapter,
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Token the embedding UI can trigger to abort an in-flight discovery;
    /// the pending `connect` then resolves to the cancelled outcome.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    async fn find_device(&self, identity: BuzzerId) -> Result<Device, ConnectError> {
        // A buzzer the OS still holds a connection to never advertises, so
        // check connected devices before scanning.
        if let Ok(devices) = self.adapter.connected_devices().await {
            for device in devices {
                if self.is_requested_buzzer(identity, &device) {
                    info!("found already-connected buzzer {:?}", identity);
                    return Ok(device);
                }
            }
        }

        info!("scanning for buzzer {:?}", identity);
        let mut scan = self
            .adapter
            .scan(&[UUID_BUZZER_SERVICE])
            .await
            .map_err(|err| ConnectError::Failed(err.to_string()))?;

        loop {
            tokio::select! {
                next = scan.next() => match next {
                    Some(adv) => {
                        debug!("advertisement: {:?} rssi {:?}", adv.device, adv.rssi);
                        if let Some(rssi) = adv.rssi {
                            if rssi < self.config.min_rssi {
                                continue;
                            }
                        }
                        if self.is_requested_buzzer(identity, &adv.device) {
                            return Ok(adv.device);
                        }
                    }
                    None => return Err(ConnectError::NotFound(identity)),
                },
                _ = self.cancel.cancelled() => {
                    info!("discovery of {:?} cancelled", identity);
                    return Err(ConnectError::Cancelled);
                }
            }
        }
    }

    fn is_requested_buzzer(&self, identity: BuzzerId, device: &Device) -> bool {
        device
            .name()
            .map(|name| name_matches(&self.config.name_prefix, identity, &name))
            .unwrap_or(false)
    }

    async fn try_connect(&self, device: &Device) -> Result<BleLink, ConnectError> {
        if !device.is_connected().await {
            self.adapter
                .connect_device(device)
                .await
                .map_err(|err| ConnectError::Failed(err.to_string()))?;
        }

        let services = device.services().await.map_err(LinkError::from)?;
        let buzzer_service = services
            .iter()
            .find(|s| s.uuid() == UUID_BUZZER_SERVICE)
            .ok_or(ConnectError::MissingCharacteristic("buzzer service"))?;

        let mut button = None;
        let mut illumination = None;
        let mut identity_char = None;
        for characteristic in buzzer_service.characteristics().await.map_err(LinkError::from)? {
            match characteristic.uuid() {
                uuid if uuid == UUID_BUTTON_STATE => button = Some(characteristic),
                uuid if uuid == UUID_ILLUMINATION_CONTROL => illumination = Some(characteristic),
                uuid if uuid == UUID_DEVICE_IDENTITY => identity_char = Some(characteristic),
                _ => {}
            }
        }

        // The battery service is optional; a legacy board without voltage
        // sensing must still connect.
        let battery = match services.iter().find(|s| s.uuid() == UUID_BATTERY_SERVICE) {
            Some(service) => match service.characteristics().await {
                Ok(characteristics) => characteristics
                    .into_iter()
                    .find(|c| c.uuid() == UUID_BATTERY_LEVEL),
                Err(err) => {
                    warn!("battery service discovery failed, continuing without: {err}");
                    None
                }
            },
            None => None,
        };

        Ok(BleLink {
            adapter: self.adapter.clone(),
            device: device.clone(),
            button: button.ok_or(ConnectError::MissingCharacteristic("button state"))?,
            illumination: illumination
                .ok_or(ConnectError::MissingCharacteristic("illumination control"))?,
            identity: identity_char
                .ok_or(ConnectError::MissingCharacteristic("device identity"))?,
            battery,
        })
    }
}

#[async_trait]
impl Transport for BleTransport {
    async fn discover(&self, identity: BuzzerId) -> Result<Box<dyn BuzzerLink>, ConnectError> {
        let device = self.find_device(identity).await?;

        let mut last_error = None;
        for attempt in 1..=self.config.connect_retries {
            match self.try_connect(&device).await {
                Ok(link) => {
                    info!("connected to {:?} on attempt {attempt}", identity);
                    return Ok(Box::new(link));
                }
                Err(err @ ConnectError::MissingCharacteristic(_)) => {
                    // The device is the wrong kind; retrying will not grow
                    // it a characteristic.
                    return Err(err);
                }
                Err(err) => {
                    warn!("connection attempt {attempt} to {:?} failed: {err}", identity);
                    last_error = Some(err);
                    if attempt < self.config.connect_retries {
                        sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                    }
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| ConnectError::Failed("no connection attempts made".into())))
    }
}

/// One live `bluest` connection.
pub struct BleLink {
    adapter: Adapter,
    device: Device,
    button: Characteristic,
    illumination: Characteristic,
    identity: Characteristic,
    battery: Option<Characteristic>,
}

#[async_trait]
impl BuzzerLink for BleLink {
    async fn read_identity(&self) -> Result<BuzzerId, LinkError> {
        let data = self.identity.read().await?;
        Ok(BuzzerId::from_wire_bytes(&data)?)
    }

    async fn read_battery(&self) -> Result<Option<u8>, LinkError> {
        match &self.battery {
            None => Ok(None),
            Some(characteristic) => {
                let data = characteristic.read().await?;
                Ok(Some(battery_level_from_wire(&data)?))
            }
        }
    }

    async fn write_illumination(&self, color: Rgb) -> Result<(), LinkError> {
        self.illumination.write(&color.to_wire()).await?;
        Ok(())
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<LinkEvent>, LinkError> {
        let (tx, rx) = mpsc::channel(LINK_EVENT_BUFFER);

        // Button notifications are the link's liveness signal: when the
        // stream ends the connection is gone and Dropped terminates the
        // channel.
        let button = self.button.clone();
        let button_tx = tx.clone();
        tokio::spawn(async move {
            match button.notify().await {
                Ok(mut stream) => {
                    while let Some(result) = stream.next().await {
                        match result {
                            Ok(value) => match ButtonState::from_wire_bytes(&value) {
                                Ok(state) => {
                                    if button_tx.send(LinkEvent::Button(state)).await.is_err() {
                                        return;
                                    }
                                }
                                Err(err) => warn!("malformed button notification: {err:?}"),
                            },
                            Err(err) => {
                                debug!("button notification stream error: {err}");
                                break;
                            }
                        }
                    }
                }
                Err(err) => warn!("button subscription failed: {err}"),
            }
            let _ = button_tx.send(LinkEvent::Dropped).await;
        });

        if let Some(battery) = self.battery.clone() {
            tokio::spawn(async move {
                let Ok(mut stream) = battery.notify().await else {
                    warn!("battery subscription failed, continuing without updates");
                    return;
                };
                while let Some(result) = stream.next().await {
                    match result {
                        Ok(value) => match battery_level_from_wire(&value) {
                            Ok(level) => {
                                if tx.send(LinkEvent::Battery(level)).await.is_err() {
                                    return;
                                }
                            }
                            Err(err) => warn!("malformed battery notification: {err:?}"),
                        },
                        // Battery stream ending is not a link loss; the
                        // button stream owns that verdict.
                        Err(_) => return,
                    }
                }
            });
        }

        Ok(rx)
    }

    async fn disconnect(&self) -> Result<(), LinkError> {
        if self.device.is_connected().await {
            self.adapter.disconnect_device(&self.device).await?;
            info!("disconnected from {:?}", self.device.id());
        }
        Ok(())
    }
}
