//! Inbound Command Decoding
//!
//! ## Overview
//!
//! Commands reach the beacon as MQTT payloads on its command topic. Two
//! dialects exist in the field:
//!
//! - **Structured**: a JSON envelope naming the target beacon and a command
//!   tag, used by the dashboard:
//!   ```text
//!   {"beacon_id":"BEACON_001","command":"activate_alarm"}
//!   ```
//! - **Free text**: the first-generation beacons matched keywords anywhere in
//!   the body (`ativar_beacon`, `desativar_beacon`, `localizar`,
//!   `testar_buzzer`). Those devices only listen on their own topic, so there
//!   is no addressing.
//!
//! Both dialects decode once into the closed [`Command`] enum. Anything that is
//! not recognized becomes [`Command::Unknown`], which the beacon treats as a
//! no-op.
//!
//! ## Keyword Overlap
//!
//! `ativar_beacon` is a substring of `desativar_beacon`. Free-text decoding
//! checks the longer keyword first, so a deactivate request is never read as
//! an activate request.

use alloc::string::String;
use serde::Deserialize;

use crate::errors::DecodeError;

/// Decoded command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Switch the alarm (and siren) on
    ActivateAlarm,
    /// Switch the alarm off and silence the buzzer
    DeactivateAlarm,
    /// Publish the history snapshot now
    GetHistory,
    /// Play the locate chirp pattern
    Locate,
    /// Play the buzzer self-test pattern
    TestBuzzer,
    /// Unrecognized tag, ignored
    Unknown,
}

impl Command {
    /// Map a structured command tag
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "activate_alarm" => Command::ActivateAlarm,
            "deactivate_alarm" => Command::DeactivateAlarm,
            "get_history" => Command::GetHistory,
            "locate" => Command::Locate,
            "test_buzzer" => Command::TestBuzzer,
            _ => Command::Unknown,
        }
    }

    /// Structured tag for this command, `None` for `Unknown`
    pub const fn tag(&self) -> Option<&'static str> {
        match self {
            Command::ActivateAlarm => Some("activate_alarm"),
            Command::DeactivateAlarm => Some("deactivate_alarm"),
            Command::GetHistory => Some("get_history"),
            Command::Locate => Some("locate"),
            Command::TestBuzzer => Some("test_buzzer"),
            Command::Unknown => None,
        }
    }
}

/// Payload dialect understood by a beacon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandDialect {
    /// JSON envelope with `beacon_id` and `command`
    #[default]
    Structured,
    /// Keyword match on the raw body
    FreeText,
}

/// Free-text keywords, longest-overlap first
const FREE_TEXT_KEYWORDS: [(&str, Command); 4] = [
    ("desativar_beacon", Command::DeactivateAlarm),
    ("ativar_beacon", Command::ActivateAlarm),
    ("localizar", Command::Locate),
    ("testar_buzzer", Command::TestBuzzer),
];

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    beacon_id: String,
    #[serde(default)]
    command: String,
}

/// Decode a payload for the beacon `local_id`
pub fn decode(dialect: CommandDialect, payload: &[u8], local_id: &str) -> Result<Command, DecodeError> {
    match dialect {
        CommandDialect::Structured => decode_structured(payload, local_id),
        CommandDialect::FreeText => decode_free_text(payload),
    }
}

/// Decode a JSON envelope, rejecting commands for other beacons
pub fn decode_structured(payload: &[u8], local_id: &str) -> Result<Command, DecodeError> {
    let envelope: Envelope = serde_json::from_slice(payload).map_err(|_| DecodeError::Malformed)?;

    if envelope.beacon_id != local_id {
        return Err(DecodeError::NotAddressed);
    }

    Ok(Command::from_tag(&envelope.command))
}

/// Decode a legacy keyword message
pub fn decode_free_text(payload: &[u8]) -> Result<Command, DecodeError> {
    let text = core::str::from_utf8(payload).map_err(|_| DecodeError::InvalidUtf8)?;

    Ok(FREE_TEXT_KEYWORDS
        .iter()
        .find(|(keyword, _)| text.contains(keyword))
        .map(|(_, command)| *command)
        .unwrap_or(Command::Unknown))
}
