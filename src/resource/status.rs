use serde::{Deserialize, Serialize};
use std::fmt;

/// Status value as reported by the remote host, before decoding.
///
/// Depending on the API version a state is sent either as its numeric code
/// or as its name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawStatus {
    Code(i64),
    Name(String),
}

impl fmt::Display for RawStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawStatus::Code(code) => write!(f, "{}", code),
            RawStatus::Name(name) => write!(f, "{:?}", name),
        }
    }
}

impl From<i64> for RawStatus {
    fn from(code: i64) -> Self {
        RawStatus::Code(code)
    }
}

impl From<&str> for RawStatus {
    fn from(name: &str) -> Self {
        RawStatus::Name(name.to_string())
    }
}

/// A status value outside the known set was decoded
#[derive(Clone, Debug, PartialEq)]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub raw: RawStatus,
}

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} value: {}", self.kind, self.raw)
    }
}

impl std::error::Error for UnknownStatus {}

/// Closed enumeration decoded from a `RawStatus`.
///
/// Decoding never coerces: a code or name missing from `VALUES` is an
/// `UnknownStatus` error.
pub trait StatusEnum: Copy + PartialEq + 'static {
    /// Name used in `UnknownStatus` ("pool status", "disk type", ...)
    const KIND: &'static str;

    /// Known values as `(numeric code, remote name, variant)`
    const VALUES: &'static [(Option<i64>, &'static str, Self)];

    fn decode(raw: &RawStatus) -> Result<Self, UnknownStatus> {
        Self::VALUES
            .iter()
            .find(|(code, name, _)| match raw {
                RawStatus::Code(c) => *code == Some(*c),
                RawStatus::Name(n) => n == name,
            })
            .map(|(_, _, value)| *value)
            .ok_or_else(|| UnknownStatus {
                kind: Self::KIND,
                raw: raw.clone(),
            })
    }

    /// Name the remote host uses for this value
    fn remote_name(self) -> &'static str {
        Self::VALUES
            .iter()
            .find(|(_, _, value)| *value == self)
            .map(|(_, name, _)| *name)
            .unwrap_or("UNKNOWN")
    }
}
