/// Inbound event model: the trigger payload and the raw frame built from it.
use chrono::DateTime;
use serde::Deserialize;

use crate::{Error, TIResult};

/// Payload delivered by the inbound event transport, one per frame.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEvent {
    pub device: String,
    pub time: String,
    pub data: String,
}

/// One telemetry frame as received; source of truth for derived readings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub device_id: String,
    pub timestamp: i64,
    pub hex_payload: String,
}

impl RawFrame {
    /// UTC receive time formatted for logs and storage records.
    pub fn received_at(&self) -> String {
        match DateTime::from_timestamp(self.timestamp, 0) {
            Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => format!("@{}", self.timestamp),
        }
    }
}

impl TryFrom<&InboundEvent> for RawFrame {
    type Error = Error;

    fn try_from(event: &InboundEvent) -> TIResult<Self> {
        let timestamp = event
            .time
            .parse::<i64>()
            .map_err(|e| Error::MalformedEvent(format!("timestamp {:?}: {e}", event.time)))?;
        Ok(Self {
            device_id: event.device.clone(),
            timestamp,
            hex_payload: event.data.clone(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lazy_init_tracing;

    #[test]
    fn test_event_to_frame() {
        lazy_init_tracing();
        let event = InboundEvent {
            device: "224720".to_string(),
            time: "1553260256".to_string(),
            data: "2b82ee3901793f7100df21".to_string(),
        };
        let frame = RawFrame::try_from(&event).unwrap();
        assert_eq!(frame.device_id, "224720");
        assert_eq!(frame.timestamp, 1553260256);
        assert_eq!(frame.received_at(), "2019-03-22 13:10:56");
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        lazy_init_tracing();
        let event = InboundEvent {
            device: "224720".to_string(),
            time: "soon".to_string(),
            data: "cfd2".to_string(),
        };
        assert!(matches!(
            RawFrame::try_from(&event),
            Err(Error::MalformedEvent(_))
        ));
    }

    #[test]
    fn test_event_deserializes_from_json() {
        lazy_init_tracing();
        let event: InboundEvent = serde_json::from_str(
            r#"{"device": "224720", "time": "1552137233", "data": "cfd2"}"#,
        )
        .unwrap();
        assert_eq!(event.data, "cfd2");
        let frame = RawFrame::try_from(&event).unwrap();
        assert_eq!(frame.received_at(), "2019-03-09 13:13:53");
    }
}
