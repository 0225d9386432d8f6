/// What a `#raid-<id>` URL hash points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashLink<'a> {
    /// No hash; leave the page alone.
    Empty,
    Raid(&'a str),
    /// A hash that names no raid; the page shows its unknown-raid notice.
    Unknown,
}

pub fn parse_hash(hash: &str) -> HashLink<'_> {
    let hash = hash.strip_prefix('#').unwrap_or(hash);
    if hash.is_empty() {
        return HashLink::Empty;
    }
    match hash.split('-').nth(1) {
        Some(id) if !id.is_empty() => HashLink::Raid(id),
        _ => HashLink::Unknown,
    }
}

pub fn toggle_element_id(raid: &str) -> String {
    format!("raid-toggle-{raid}")
}
