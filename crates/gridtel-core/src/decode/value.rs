use std::collections::BTreeMap;

use gridtel_api::proto::{Decimal64, TypedValue, typed_value};

use super::DecodeError;

/// A normalized telemetry value: a scalar, a sequence, or a nested mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryValue {
    Null,
    String(String),
    Int(i64),
    Uint(u64),
    Bool(bool),
    Float(f64),
    Bytes(Vec<u8>),
    List(Vec<TelemetryValue>),
    Map(BTreeMap<String, TelemetryValue>),
}

impl TelemetryValue {
    /// Decode a wire `TypedValue`.
    ///
    /// JSON payloads that are valid UTF-8 but not valid JSON are kept as
    /// plain strings; some firmware emits bare words in `json_ietf_val`.
    pub fn from_typed(value: Option<&TypedValue>) -> Result<Self, DecodeError> {
        use typed_value::Value as V;

        let Some(inner) = value.and_then(|v| v.value.as_ref()) else {
            return Err(DecodeError::EmptyValue);
        };

        Ok(match inner {
            V::StringVal(s) | V::AsciiVal(s) => Self::String(s.clone()),
            V::IntVal(i) => Self::Int(*i),
            V::UintVal(u) => Self::Uint(*u),
            V::BoolVal(b) => Self::Bool(*b),
            V::FloatVal(f) => Self::Float(f64::from(*f)),
            V::DoubleVal(d) => Self::Float(*d),
            V::DecimalVal(d) => Self::Float(decimal_to_f64(*d)),
            V::BytesVal(b) => Self::Bytes(b.clone()),
            V::LeaflistVal(array) => Self::List(
                array
                    .element
                    .iter()
                    .map(|e| Self::from_typed(Some(e)))
                    .collect::<Result<_, _>>()?,
            ),
            V::JsonVal(raw) | V::JsonIetfVal(raw) => Self::from_json_bytes(raw)?,
            V::AnyVal(_) => return Err(DecodeError::Unsupported("any")),
            V::ProtoBytes(_) => return Err(DecodeError::Unsupported("proto_bytes")),
        })
    }

    fn from_json_bytes(raw: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(raw).map_err(|_| DecodeError::InvalidUtf8)?;
        Ok(serde_json::from_str::<serde_json::Value>(text)
            .map_or_else(|_| Self::String(text.to_owned()), Self::from))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Coerce to an unsigned integer. Numeric strings are accepted since
    /// JSON_IETF carries 64-bit counters as strings.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::as_conversions
    )]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Uint(u) => Some(*u),
            Self::Int(i) => u64::try_from(*i).ok(),
            Self::Float(f) if f.is_finite() && *f >= 0.0 => Some(f.round() as u64),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Uint(u) => Some(*u as f64),
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, TelemetryValue>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[TelemetryValue]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    /// Member lookup on a mapping, ignoring module qualifiers on keys.
    pub fn get(&self, key: &str) -> Option<&TelemetryValue> {
        let map = self.as_map()?;
        map.get(key).or_else(|| {
            map.iter()
                .find(|(k, _)| local_name(k) == key)
                .map(|(_, v)| v)
        })
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::List(_) | Self::Map(_))
    }
}

impl From<serde_json::Value> for TelemetryValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as J;
        match value {
            J::Null => Self::Null,
            J::Bool(b) => Self::Bool(b),
            J::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_u64().map(Self::Uint))
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            J::String(s) => Self::String(s),
            J::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            J::Object(members) => {
                Self::Map(members.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

/// Strip a `module:` qualifier from a JSON member name or enum value.
pub(crate) fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn decimal_to_f64(d: Decimal64) -> f64 {
    let exponent = i32::try_from(d.precision).unwrap_or(i32::MAX);
    d.digits as f64 / 10f64.powi(exponent)
}
