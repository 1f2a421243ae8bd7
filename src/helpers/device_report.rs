use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::helpers::ingest::IngestError;

#[derive(Deserialize, Debug)]
struct IotNode {
    #[serde(deserialize_with = "device_name")]
    name: String,
    #[serde(rename = "reportedAt")]
    reported_at: String,
}

// Yggio sends names as strings, but numeric names are rendered rather than refused.
fn device_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(name) => Ok(name),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!(
            "iotnode name must be a string or number, got {}",
            other
        ))),
    }
}

#[derive(Deserialize, Debug)]
struct Payload {
    iotnode: IotNode,
}

#[derive(Deserialize, Debug)]
struct Envelope {
    payload: Payload,
}

/// Byte encoding used when a report is written to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentEncoding {
    #[default]
    Utf8,
    /// Legacy single-byte encoding. Every UTF-16 code unit outside ASCII is
    /// written as `?`, so characters beyond the BMP become `??`.
    Ascii,
}

impl FromStr for ContentEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(ContentEncoding::Utf8),
            "ascii" => Ok(ContentEncoding::Ascii),
            other => Err(format!("unknown content encoding {:?}, expected utf8 or ascii", other)),
        }
    }
}

/// A device report as posted by Yggio: the whole document is kept verbatim,
/// only the iotnode name and report time are read out of it.
#[derive(Debug)]
pub struct DeviceReport {
    document: Value,
    iotnode: IotNode,
}

impl DeviceReport {
    pub fn parse(body: &[u8]) -> Result<Self, IngestError> {
        let document: Value = serde_json::from_slice(body).map_err(IngestError::MalformedJson)?;
        if !document.is_object() {
            return Err(IngestError::NotAnObject);
        }
        let envelope = Envelope::deserialize(&document).map_err(IngestError::MissingField)?;

        Ok(DeviceReport {
            document,
            iotnode: envelope.payload.iotnode,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.iotnode.name
    }

    pub fn reported_at(&self) -> &str {
        &self.iotnode.reported_at
    }

    pub fn to_bytes(&self, encoding: ContentEncoding) -> Result<Vec<u8>, IngestError> {
        let data = serde_json::to_string_pretty(&self.document).map_err(IngestError::Serialize)?;

        let bytes = match encoding {
            ContentEncoding::Utf8 => data.into_bytes(),
            ContentEncoding::Ascii => {
                let mut bytes = Vec::with_capacity(data.len());
                for c in data.chars() {
                    if c.is_ascii() {
                        bytes.push(c as u8);
                    } else {
                        bytes.extend(std::iter::repeat(b'?').take(c.len_utf16()));
                    }
                }
                bytes
            }
        };
        Ok(bytes)
    }
}
