//! Base64 (standard alphabet, padded) encoding for byte payloads.
//!
//! Use with `#[serde(with = "tessera_protocol::bytes")]` on `Vec<u8>` fields,
//! or `bytes::option` on `Option<Vec<u8>>`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(data))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    STANDARD
        .decode(encoded.as_bytes())
        .map_err(serde::de::Error::custom)
}

pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(
        data: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match data {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded = Option::<String>::deserialize(deserializer)?;
        encoded
            .map(|s| STANDARD.decode(s.as_bytes()))
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Blob {
        #[serde(with = "crate::bytes")]
        data: Vec<u8>,
        #[serde(default, with = "crate::bytes::option")]
        extra: Option<Vec<u8>>,
    }

    #[test]
    fn bytes_travel_as_base64_strings() {
        let blob = Blob {
            data: vec![0x89, b'P', b'N', b'G'],
            extra: None,
        };
        let json = serde_json::to_string(&blob).unwrap();
        assert_eq!(json, r#"{"data":"iVBORw==","extra":null}"#);
    }

    #[test]
    fn missing_optional_bytes_default_to_none() {
        let blob: Blob = serde_json::from_str(r#"{"data":""}"#).unwrap();
        assert!(blob.data.is_empty());
        assert!(blob.extra.is_none());
    }

    #[test]
    fn invalid_base64_is_rejected() {
        let result: Result<Blob, _> = serde_json::from_str(r#"{"data":"***"}"#);
        assert!(result.is_err());
    }
}
