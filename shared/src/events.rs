use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Raid primary key. The push channel sends it as a number, the page markup as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RaidId(pub String);

impl RaidId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RaidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RaidId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Str(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(id) => RaidId(id.to_string()),
            Raw::Str(id) => RaidId(id),
        })
    }
}

/// Accepts `null`, an integer, or a numeric string. Anything else reads as no choice.
fn lenient_choice<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Str(String),
        Other(serde_json::Value),
    }

    let raw = Option::<Raw>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Raw::Int(choice)) => usize::try_from(choice).ok(),
        Some(Raw::Str(choice)) => choice.trim().parse().ok(),
        Some(Raw::Other(_)) | None => None,
    })
}

/// Someone (possibly the local trainer) changed their attendance for a raid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceUpdate {
    pub raid: RaidId,
    #[serde(default)]
    pub submitter: Option<String>,
    #[serde(default, deserialize_with = "lenient_choice")]
    pub choice: Option<usize>,
    /// Chosen start time as `HH:MM`, absent when the submitter cancelled.
    #[serde(default)]
    pub time: Option<String>,
    /// Server-rendered raid snippet, present when the server inlines it.
    #[serde(default)]
    pub snippet: Option<String>,
}

impl AttendanceUpdate {
    pub fn submitted_by(&self, nickname: &str) -> bool {
        self.submitter.as_deref() == Some(nickname)
    }
}

/// A raid was reported or edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaidAnnouncement {
    pub raid: RaidId,
    /// `false` when an existing raid was edited.
    #[serde(default)]
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    Attendance(AttendanceUpdate),
    Raid(RaidAnnouncement),
    /// Unknown event name, or a known one whose payload is missing required fields.
    Unrecognized(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
    pub event: PushEvent,
    /// Human-readable summary written by the server, used for console logging.
    pub message: String,
    /// Raid the message refers to, read independently of the typed payload.
    pub raid: Option<RaidId>,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    event: serde_json::Value,
    #[serde(default)]
    message: serde_json::Value,
    #[serde(default)]
    data: serde_json::Value,
}

/// Strings as-is, `null` as empty, anything else in its JSON form.
fn loose_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Parse one push-channel frame.
///
/// Only malformed JSON is an error. Missing or mistyped fields degrade to
/// [`PushEvent::Unrecognized`] so the message can still be logged.
pub fn parse_push(text: &str) -> Result<PushMessage, serde_json::Error> {
    let envelope: Envelope = serde_json::from_str(text)?;
    let event_name = loose_text(envelope.event);

    let raid = envelope
        .data
        .get("raid")
        .and_then(|raw| RaidId::deserialize(raw).ok());

    let event = match event_name.as_str() {
        "attendance" => AttendanceUpdate::deserialize(&envelope.data)
            .map(PushEvent::Attendance)
            .ok(),
        "raid" => RaidAnnouncement::deserialize(&envelope.data)
            .map(PushEvent::Raid)
            .ok(),
        _ => None,
    }
    .unwrap_or(PushEvent::Unrecognized(event_name));

    Ok(PushMessage {
        event,
        message: loose_text(envelope.message),
        raid,
    })
}
