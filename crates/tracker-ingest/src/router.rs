/// Frame router and alert policy engine.
///
/// Classifies each inbound event by decoded bit width, runs the matching
/// parser, persists the reading, and evaluates the alert rules. External
/// collaborators (the key-value store and the notification service) are
/// injected behind traits so the policy runs without process-wide state.
use std::collections::HashMap;

use serde_json::json;
use tracing::{error, info, warn};

use crate::{
    bits::BitString,
    event::{InboundEvent, RawFrame},
    frame::{
        classify, geoloc,
        status::{self, Movement, Status},
        FrameKind, GEOLOC_FRAME_BITS, STATUS_FRAME_BITS,
    },
    Error, TIResult,
};

//  _____
// |_   _|   _ _ __   ___  ___
//   | || | | | '_ \ / _ \/ __|
//   | || |_| | |_) |  __/\__ \
//   |_| \__, | .__/ \___||___/
//       |___/|_|

/// Key-value storage collaborator, one record per decoded reading.
pub trait TelemetryStore {
    fn put(&mut self, table: &str, item: serde_json::Value) -> TIResult<()>;
}

/// Outbound notification collaborator. Calls are fire-and-forget on success;
/// there is no retry or idempotency key, so a duplicate inbound event
/// produces a duplicate notification.
pub trait Notifier {
    fn place_call(&mut self, destination: &str, script_url: &str) -> TIResult<()>;
    fn send_email(
        &mut self,
        source: &str,
        destination: &str,
        subject: &str,
        html_body: &str,
    ) -> TIResult<()>;
}

pub const BATTERY_TABLE: &str = "battery";
pub const POSITION_TABLE: &str = "position";

/// Voltage at or below which the low-battery email fires.
pub const DEFAULT_BATTERY_LOW_VOLTS: f64 = 3.63;

/// Policy configuration, read-only for the lifetime of the router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub battery_low: f64,
    /// Device id to call destination (phone number). Static, unique keys.
    pub devices: HashMap<String, String>,
    pub call_script_url: String,
    pub email_source: String,
    pub email_destination: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            battery_low: DEFAULT_BATTERY_LOW_VOLTS,
            devices: HashMap::new(),
            call_script_url: String::new(),
            email_source: String::new(),
            email_destination: String::new(),
        }
    }
}

/// Terminal state of one event's processing. The inbound transport ignores
/// this; outcomes are otherwise observable only through logs and side
/// effects.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Status(status::StatusReading),
    Geolocation(geoloc::GeolocationReading),
    /// A known frame shape that failed to decode; logged, nothing persisted.
    NotParsed,
    /// A bit width matching no known frame shape; logged and dropped.
    Unsupported,
}

pub struct Router<S, N> {
    config: RouterConfig,
    store: S,
    notifier: N,
}

impl<S, N> Router<S, N>
where
    S: TelemetryStore,
    N: Notifier,
{
    pub fn new(config: RouterConfig, store: S, notifier: N) -> Self {
        Self {
            config,
            store,
            notifier,
        }
    }

    /// Entry point for the raw transport body (`{device, time, data}` JSON).
    pub fn handle_json(&mut self, body: &str) -> TIResult<Outcome> {
        let event: InboundEvent =
            serde_json::from_str(body).map_err(|e| Error::MalformedEvent(e.to_string()))?;
        self.handle_event(&event)
    }

    /// Process one inbound event through decode, dispatch, persistence, and
    /// the alert rules.
    ///
    /// Invalid hex fails fast with [`Error::MalformedPayload`] before any
    /// side effect. Parse failures on a known frame shape are contained:
    /// logged and reported as [`Outcome::NotParsed`] with no persistence and
    /// no notification, so one bad frame never blocks later events.
    pub fn handle_event(&mut self, event: &InboundEvent) -> TIResult<Outcome> {
        let frame = RawFrame::try_from(event)?;
        info!(
            "received frame from device {} at {}",
            frame.device_id,
            frame.received_at()
        );

        let bits = BitString::from_hex(&frame.hex_payload, STATUS_FRAME_BITS)?;
        match classify(&bits) {
            FrameKind::Status => self.handle_status(&frame, &bits),
            FrameKind::Geolocation => self.handle_geoloc(&frame),
            FrameKind::Unsupported => {
                warn!("payload type not supported: {bits}");
                Ok(Outcome::Unsupported)
            }
        }
    }

    fn handle_status(&mut self, frame: &RawFrame, bits: &BitString) -> TIResult<Outcome> {
        let reading = match status::parse(bits) {
            Ok(reading) => reading,
            Err(e) => {
                error!("could not parse binary {bits}: {e}");
                return Ok(Outcome::NotParsed);
            }
        };
        info!("parsed status reading: {reading:?}");

        log_downstream(
            "battery store put",
            self.store.put(
                BATTERY_TABLE,
                json!({
                    "device_id": frame.device_id,
                    "timestamp": frame.timestamp,
                    "time": frame.received_at(),
                    "voltage": reading.battery_voltage,
                }),
            ),
        );

        // The two alert rules are independent; both may fire for one frame.
        if reading.status == Status::Alarm && reading.movement == Movement::Moving {
            match self.config.devices.get(&frame.device_id) {
                Some(destination) => log_downstream(
                    "alarm call",
                    self.notifier
                        .place_call(destination, &self.config.call_script_url),
                ),
                None => warn!(
                    "no call destination registered for device {}",
                    frame.device_id
                ),
            }
        }
        if reading.battery_voltage <= self.config.battery_low {
            let body = format!(
                "Battery level ({}) is lower than {}. Please recharge as soon as possible.",
                reading.battery_voltage, self.config.battery_low
            );
            log_downstream(
                "low battery email",
                self.notifier.send_email(
                    &self.config.email_source,
                    &self.config.email_destination,
                    "[Car Tracker] Low battery",
                    &body,
                ),
            );
        }
        Ok(Outcome::Status(reading))
    }

    fn handle_geoloc(&mut self, frame: &RawFrame) -> TIResult<Outcome> {
        let bits = BitString::from_hex(&frame.hex_payload, GEOLOC_FRAME_BITS)?;
        let reading = match geoloc::parse(&bits) {
            Ok(reading) => reading,
            Err(e) => {
                error!("could not parse binary {bits}: {e}");
                return Ok(Outcome::NotParsed);
            }
        };
        info!("parsed geolocation reading: {reading:?}");

        log_downstream(
            "position store put",
            self.store.put(
                POSITION_TABLE,
                json!({
                    "device_id": frame.device_id,
                    "timestamp": frame.timestamp,
                    "time": frame.received_at(),
                    "source": "gps",
                    "lat": reading.latitude_deg,
                    "lng": reading.longitude_deg,
                }),
            ),
        );

        let url = format!(
            "https://www.google.com/maps/place/{}+{}",
            reading.latitude_dms, reading.longitude_dms
        );
        let body = format!(
            "New position received from device {}. You will find it <a href={url}>here</a>.",
            frame.device_id
        );
        log_downstream(
            "position email",
            self.notifier.send_email(
                &self.config.email_source,
                &self.config.email_destination,
                "[Car Tracker] New position",
                &body,
            ),
        );
        Ok(Outcome::Geolocation(reading))
    }
}

/// Downstream calls are best-effort within an event: a failure is logged and
/// the remaining rules still run.
fn log_downstream(what: &str, res: TIResult<()>) {
    if let Err(e) = res {
        error!("{what}: {e}");
    }
}
