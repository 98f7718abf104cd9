//! Wire types for the panel API
//!
//! Only the fields the bot reads are modelled; everything else in the panel's
//! payloads is ignored by serde.

use serde::Deserialize;
use serde_json::Value;

use super::PanelError;

/// A panel account, as returned by the user lookup endpoints
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelUser {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub telegram_id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
}

impl PanelUser {
    /// The identity to link, if the panel supplied a usable one
    pub fn identity(&self) -> Option<&str> {
        self.uuid.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

/// Usage, expiry and status for a linked account
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelStats {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub traffic_limit_bytes: Option<u64>,
    #[serde(default)]
    pub expire_at: Option<String>,
    #[serde(default)]
    pub user_traffic: Option<UserTraffic>,
}

impl PanelStats {
    pub fn used_bytes(&self) -> u64 {
        self.user_traffic
            .as_ref()
            .and_then(|t| t.used_traffic_bytes)
            .unwrap_or(0)
    }

    pub fn limit_bytes(&self) -> u64 {
        self.traffic_limit_bytes.unwrap_or(0)
    }

    pub fn online_at(&self) -> Option<&str> {
        self.user_traffic.as_ref().and_then(|t| t.online_at.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTraffic {
    #[serde(default)]
    pub used_traffic_bytes: Option<u64>,
    #[serde(default)]
    pub online_at: Option<String>,
}

/// One subscription entry from `subscription-info`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServiceEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
}

// ============================================================================
// Envelope handling
// ============================================================================

/// Strip the `{"response": ...}` envelope, falling back to the body itself
pub fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("response") => {
            map.remove("response").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Pick exactly one user out of a lookup response.
///
/// The panel answers with a list (by-telegram-id), a paged `{users: [...]}`
/// object (the full listing), or a single object. An empty collection is a
/// miss, not an error.
pub fn pick_user(response: Value, telegram_id: i64) -> Result<Option<PanelUser>, PanelError> {
    match response {
        Value::Null => Ok(None),
        Value::Array(items) => items.into_iter().next().map(parse_user).transpose(),
        Value::Object(mut map) if map.contains_key("users") => {
            let users = match map.remove("users") {
                Some(Value::Array(users)) => users,
                _ => return Err(PanelError::decode("`users` is not a list")),
            };
            let users = users
                .into_iter()
                .map(parse_user)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(users
                .into_iter()
                .find(|u| u.telegram_id == Some(telegram_id)))
        }
        obj @ Value::Object(_) => parse_user(obj).map(Some),
        other => Err(PanelError::decode(format!(
            "unexpected user lookup payload: {other}"
        ))),
    }
}

fn parse_user(value: Value) -> Result<PanelUser, PanelError> {
    serde_json::from_value(value).map_err(|e| PanelError::decode(format!("bad user object: {e}")))
}

pub fn parse_stats(body: Value) -> Result<Option<PanelStats>, PanelError> {
    match unwrap_envelope(body) {
        Value::Null => Ok(None),
        value @ Value::Object(_) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| PanelError::decode(format!("bad stats object: {e}"))),
        other => Err(PanelError::decode(format!("unexpected stats payload: {other}"))),
    }
}

pub fn parse_services(body: Value) -> Result<Vec<ServiceEntry>, PanelError> {
    match unwrap_envelope(body) {
        Value::Object(mut map) => match map.remove("items") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(items) => serde_json::from_value(items)
                .map_err(|e| PanelError::decode(format!("bad subscription items: {e}"))),
        },
        other => Err(PanelError::decode(format!(
            "unexpected subscription payload: {other}"
        ))),
    }
}
