use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Change,
    Click,
}

/// The parts of a DOM event target that decide whether it is tracked.
#[derive(Debug, Clone, Copy)]
pub struct Interaction<'a> {
    pub kind: InteractionKind,
    pub target_id: &'a str,
    pub checked: bool,
    pub value: &'a str,
    /// Raw `class` attribute.
    pub class_name: &'a str,
    /// `data-id` of the nearest enclosing `.raid`.
    pub enclosing_raid: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedEvent {
    /// Raid panel opened.
    Details,
    /// Start time picked.
    Participation,
    Location,
    Directions,
}

impl TrackedEvent {
    pub fn name(self) -> &'static str {
        match self {
            TrackedEvent::Details => "details",
            TrackedEvent::Participation => "participation",
            TrackedEvent::Location => "location",
            TrackedEvent::Directions => "directions",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tracked {
    pub event: TrackedEvent,
    pub raid: String,
    pub choice: Option<String>,
}

fn has_class(class_name: &str, class: &str) -> bool {
    class_name.split_whitespace().any(|c| c == class)
}

pub fn classify(interaction: &Interaction<'_>) -> Option<Tracked> {
    let id = interaction.target_id;
    let change = interaction.kind == InteractionKind::Change && interaction.checked;

    let (event, raid, choice) = if change && id.starts_with("raid-toggle-") {
        (TrackedEvent::Details, id.split('-').nth(2)?, None)
    } else if change && id.starts_with("rac-") {
        (
            TrackedEvent::Participation,
            id.split('-').nth(1)?,
            Some(interaction.value.to_string()),
        )
    } else if has_class(interaction.class_name, "raid-map-link") {
        (TrackedEvent::Location, interaction.enclosing_raid?, None)
    } else if has_class(interaction.class_name, "raid-directions-link") {
        (TrackedEvent::Directions, interaction.enclosing_raid?, None)
    } else {
        return None;
    };

    if raid.is_empty() {
        return None;
    }

    Some(Tracked {
        event,
        raid: raid.to_string(),
        choice,
    })
}

/// `data-monster`, `data-tier` and `data-gym` of a raid element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RaidMeta {
    pub monster: Option<String>,
    pub tier: Option<String>,
    pub gym: Option<String>,
}

/// Parameters of a `gtag('event', …)` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventParams {
    pub monster: Option<String>,
    pub tier: Option<String>,
    pub gym: Option<String>,
    pub event_action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starttimechoice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starttimeint: Option<i64>,
}

impl EventParams {
    pub fn new(tracked: &Tracked, meta: RaidMeta) -> Self {
        Self {
            monster: meta.monster,
            tier: meta.tier,
            gym: meta.gym,
            event_action: tracked.event.name(),
            starttimeint: tracked.choice.as_deref().and_then(|c| c.trim().parse().ok()),
            starttimechoice: tracked.choice.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomMap {
    pub dimension1: &'static str,
    pub dimension2: &'static str,
    pub dimension3: &'static str,
    pub dimension4: &'static str,
    pub metric1: &'static str,
}

/// Third argument of `gtag('config', id, …)`.
#[derive(Debug, Clone, Serialize)]
pub struct GtagConfig {
    pub custom_map: CustomMap,
}

impl Default for GtagConfig {
    fn default() -> Self {
        Self {
            custom_map: CustomMap {
                dimension1: "monster",
                dimension2: "tier",
                dimension3: "gym",
                dimension4: "starttimechoice",
                metric1: "starttimeint",
            },
        }
    }
}
