use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen_futures::spawn_local;

use raidikalu_shared::fragment::{FragmentPlan, plan_fragment};
use raidikalu_shared::{AttendanceUpdate, RaidId, ReconcileOutcome, reconcile};

use crate::config::PageConfig;
use crate::dom::PageDom;
use crate::snippet::fetch_snippet;

/// Page-lifetime state, built once at load and shared by every listener.
pub struct Session {
    config: PageConfig,
    dom: RefCell<PageDom>,
}

impl Session {
    pub fn new(config: PageConfig, dom: PageDom) -> Rc<Self> {
        Rc::new(Self {
            config,
            dom: RefCell::new(dom),
        })
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn nickname(&self) -> &str {
        &self.config.nickname
    }

    pub fn tick(&self, now_secs: i64) {
        self.dom.borrow().tick_timers(now_secs);
    }

    pub fn raid_name(&self, raid: &RaidId) -> Option<String> {
        self.dom.borrow().raid_name(raid)
    }

    pub fn bind_page(&self) {
        self.dom.borrow().bind_page_attendance();
    }

    pub fn apply_attendance(&self, update: &AttendanceUpdate, fragment: &str) -> ReconcileOutcome {
        let outcome = reconcile(
            &mut *self.dom.borrow_mut(),
            self.nickname(),
            update,
            fragment,
        );
        match outcome {
            ReconcileOutcome::Applied { .. } => {
                if let Some(time) = &update.time {
                    web_sys::console::info_1(
                        &format!("raid {} refreshed, start {time}", update.raid).into(),
                    );
                }
            }
            ReconcileOutcome::MissingView => {
                web_sys::console::info_1(
                    &format!("raid {} is not on this page; update skipped", update.raid).into(),
                );
            }
            ReconcileOutcome::SwapFailed => {
                web_sys::console::warn_1(&format!("raid {} view swap failed", update.raid).into());
            }
            ReconcileOutcome::UnparsableFragment => {
                web_sys::console::warn_1(
                    &format!("raid {} snippet did not contain a raid view", update.raid).into(),
                );
            }
        }
        outcome
    }

    /// Get fresh markup for the raid and reconcile it. Fetch failures abandon
    /// the update; the next push for the raid repairs the view.
    pub fn handle_attendance(self: &Rc<Self>, update: AttendanceUpdate) {
        let cache_buster = js_sys::Date::now() as u64;
        let url = match plan_fragment(self.config.snippet_source, &update, cache_buster) {
            FragmentPlan::Inline(html) => {
                self.apply_attendance(&update, html);
                return;
            }
            FragmentPlan::Fetch(url) => url,
        };

        let session = Rc::clone(self);
        spawn_local(async move {
            match fetch_snippet(&url).await {
                Ok(html) => {
                    session.apply_attendance(&update, &html);
                }
                Err(e) => {
                    web_sys::console::warn_1(
                        &format!("raid {} snippet fetch failed: {e}", update.raid).into(),
                    );
                }
            }
        });
    }
}
