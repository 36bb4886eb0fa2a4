//! Identity claims carried inside a verified bearer token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Decoded token payload.
///
/// The subject is read from `sub`, or from `id` when `sub` is absent. A payload
/// carrying both keeps `sub`. Encoding always writes `sub`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawClaims")]
pub struct Claims {
    pub sub: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

#[derive(Deserialize)]
struct RawClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
    exp: i64,
    #[serde(default)]
    iat: Option<i64>,
}

impl TryFrom<RawClaims> for Claims {
    type Error = String;

    fn try_from(raw: RawClaims) -> Result<Self, Self::Error> {
        let sub = raw
            .sub
            .or(raw.id)
            .ok_or_else(|| "token carries neither `sub` nor `id`".to_string())?;

        Ok(Self {
            sub,
            name: raw.name,
            email: raw.email,
            role: raw.role,
            exp: raw.exp,
            iat: raw.iat,
        })
    }
}

impl Claims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Identity headers injected into the forwarded request.
    pub fn identity_headers(&self) -> Vec<(&'static str, &str)> {
        let mut headers = vec![("x-user-id", self.sub.as_str())];
        if let Some(email) = &self.email {
            headers.push(("x-user-email", email));
        }
        if let Some(role) = &self.role {
            headers.push(("x-user-role", role));
        }
        if let Some(name) = &self.name {
            headers.push(("x-user-name", name));
        }
        headers
    }
}
