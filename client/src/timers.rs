use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Interval;

use raidikalu_shared::countdown::secs_from_millis;

use crate::config::TIMER_TICK_MS;
use crate::session::Session;

thread_local! {
    static TICK_INTERVAL: RefCell<Option<Interval>> = const { RefCell::new(None) };
}

fn now_secs() -> i64 {
    secs_from_millis(chrono::Utc::now().timestamp_millis())
}

/// Refresh every countdown once a second. Restarting replaces the old interval.
pub fn start(session: Rc<Session>) {
    session.tick(now_secs());
    let interval = Interval::new(TIMER_TICK_MS, move || {
        session.tick(now_secs());
    });
    TICK_INTERVAL.with(|slot| {
        // Dropping the previous Interval clears it.
        *slot.borrow_mut() = Some(interval);
    });
}
