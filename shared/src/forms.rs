use crate::events::RaidId;

pub const CSRF_HEADER: &str = "X-CSRFToken";

/// A form post the raid list page sends back to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    SetNickname { nickname: String },
    /// `choice` is the raw value of the changed input: a choice index or the cancel value.
    SetAttendance { raid: RaidId, choice: String },
}

impl FormAction {
    pub fn action(&self) -> &'static str {
        match self {
            FormAction::SetNickname { .. } => "set-nickname",
            FormAction::SetAttendance { .. } => "set-attendance",
        }
    }

    /// Multipart fields in the order the server reads them.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![("action", self.action())];
        match self {
            FormAction::SetNickname { nickname } => fields.push(("nickname", nickname.as_str())),
            FormAction::SetAttendance { raid, choice } => {
                fields.push(("raid", raid.as_str()));
                fields.push(("choice", choice.as_str()));
            }
        }
        fields
    }
}
