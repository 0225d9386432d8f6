use crate::events::AttendanceUpdate;

pub const SNIPPET_PATH_PREFIX: &str = "/api/1/raid-snippet/";

/// Where the reconciler gets a raid's fresh markup from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnippetSource {
    /// Use the snippet the server embeds in the push payload.
    #[default]
    Inline,
    /// Always fetch the snippet separately.
    Fetch,
}

impl SnippetSource {
    pub fn from_setting(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "fetch" => SnippetSource::Fetch,
            _ => SnippetSource::Inline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentPlan<'a> {
    Inline(&'a str),
    Fetch(String),
}

/// Pick the markup for an update. Inline mode falls back to fetching when the
/// payload carries no snippet.
pub fn plan_fragment(
    source: SnippetSource,
    update: &AttendanceUpdate,
    cache_buster: u64,
) -> FragmentPlan<'_> {
    match (source, update.snippet.as_deref()) {
        (SnippetSource::Inline, Some(snippet)) => FragmentPlan::Inline(snippet),
        _ => FragmentPlan::Fetch(snippet_url(update.raid.as_str(), cache_buster)),
    }
}

pub fn snippet_url(raid: &str, cache_buster: u64) -> String {
    format!("{SNIPPET_PATH_PREFIX}{raid}/?t={cache_buster}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RaidId;

    fn update(snippet: Option<&str>) -> AttendanceUpdate {
        AttendanceUpdate {
            raid: RaidId::new("12"),
            submitter: Some("Ash".to_string()),
            choice: Some(0),
            time: None,
            snippet: snippet.map(str::to_string),
        }
    }

    #[test]
    fn inline_uses_payload_snippet() {
        let update = update(Some("<div class=\"raid\" data-id=\"12\"></div>"));
        assert_eq!(
            plan_fragment(SnippetSource::Inline, &update, 1),
            FragmentPlan::Inline("<div class=\"raid\" data-id=\"12\"></div>")
        );
    }

    #[test]
    fn inline_without_snippet_fetches() {
        assert_eq!(
            plan_fragment(SnippetSource::Inline, &update(None), 99),
            FragmentPlan::Fetch("/api/1/raid-snippet/12/?t=99".to_string())
        );
    }

    #[test]
    fn fetch_ignores_payload_snippet() {
        assert_eq!(
            plan_fragment(SnippetSource::Fetch, &update(Some("<div></div>")), 1_700_000_000_000),
            FragmentPlan::Fetch("/api/1/raid-snippet/12/?t=1700000000000".to_string())
        );
    }

    #[test]
    fn setting_parsing() {
        assert_eq!(SnippetSource::from_setting(Some(" Fetch ")), SnippetSource::Fetch);
        assert_eq!(SnippetSource::from_setting(Some("inline")), SnippetSource::Inline);
        assert_eq!(SnippetSource::from_setting(None), SnippetSource::Inline);
    }
}
