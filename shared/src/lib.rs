pub mod analytics;
pub mod countdown;
pub mod events;
pub mod forms;
pub mod fragment;
pub mod linking;
pub mod view;

pub use events::*;
pub use view::{RaidDom, ReconcileOutcome, reconcile};
