//! Clock-in records carried in the `data` parameter of a response link.
//!
//! The payload is a JSON array of objects. Fields this crate does not know
//! about are kept in [`ClockIn::extra`] so that records produced by either
//! generation of the clock-in app survive a decode/encode cycle untouched.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::{LinkError, Result};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockIn {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "coordinates_or_text"
    )]
    pub clockin_coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clockin_datetime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clockin_datetime_str: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clockin_mode: Option<i32>,
    #[serde(
        rename = "clockinNSRNumber",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub clockin_nsr_number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_person_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor_person_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_code: Option<String>,
    /// Base64 snapshot taken at clock-in time, if the device captured one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clockin_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms_sent_on_date_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub long: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
}

// Older producers stringify the coordinates object.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawCoordinates {
    Object(Coordinates),
    Text(String),
}

fn coordinates_or_text<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Coordinates>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawCoordinates>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawCoordinates::Object(coordinates)) => Ok(Some(coordinates)),
        Some(RawCoordinates::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(RawCoordinates::Text(text)) => serde_json::from_str(&text)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Serialize records into the JSON array carried by a response link.
///
/// Order is preserved and an empty slice yields `[]`.
pub fn encode(records: &[ClockIn]) -> Result<String> {
    Ok(serde_json::to_string(records)?)
}

/// Parse the payload string received from the clock-in app.
///
/// `None` in gives `None` out. Anything that is not a JSON array of objects
/// is reported as [`LinkError::MalformedPayload`]; callers are expected to
/// degrade it to an empty state rather than surface it.
pub fn decode(payload: Option<&str>) -> Result<Option<Vec<ClockIn>>> {
    let payload = match payload {
        Some(payload) => payload,
        None => return Ok(None),
    };

    serde_json::from_str::<Vec<ClockIn>>(payload)
        .map(Some)
        .map_err(|err| LinkError::MalformedPayload(err.to_string()))
}

/// Number of records in a payload, `0` when it is absent or malformed.
pub fn count(payload: Option<&str>) -> usize {
    match decode(payload) {
        Ok(Some(records)) => records.len(),
        Ok(None) => 0,
        Err(err) => {
            log::debug!("counting malformed payload as empty: {}", err);
            0
        }
    }
}
