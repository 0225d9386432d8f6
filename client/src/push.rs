use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CloseEvent, MessageEvent, WebSocket};

use raidikalu_shared::{PushEvent, parse_push};

use crate::config::{RECONNECT_BASE_MS, RECONNECT_MAX_MS, push_url};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Live,
    Reconnecting,
}

struct PushConnection {
    ws: WebSocket,
    // Held so the handlers outlive `connect`; dropped after `close` unhooks them.
    _on_open: Closure<dyn Fn()>,
    _on_close: Closure<dyn Fn(CloseEvent)>,
    _on_message: Closure<dyn Fn(MessageEvent)>,
}

impl PushConnection {
    fn close(self) {
        self.ws.set_onopen(None);
        self.ws.set_onclose(None);
        self.ws.set_onmessage(None);
        self.ws.close().ok();
    }
}

struct ReconnectState {
    status: ConnectionStatus,
    consecutive_failures: u32,
    pending: Option<Timeout>,
}

impl ReconnectState {
    const fn new() -> Self {
        Self {
            status: ConnectionStatus::Connecting,
            consecutive_failures: 0,
            pending: None,
        }
    }
}

thread_local! {
    static PUSH_CONNECTION: RefCell<Option<PushConnection>> = const { RefCell::new(None) };
    static RECONNECT: RefCell<ReconnectState> = const { RefCell::new(ReconnectState::new()) };
}

fn reconnect_backoff_ms(consecutive_failures: u32) -> u32 {
    let exponent = consecutive_failures.saturating_sub(1).min(6);
    let factor = 1u32 << exponent;
    RECONNECT_BASE_MS.saturating_mul(factor).min(RECONNECT_MAX_MS)
}

fn set_status(status: ConnectionStatus) {
    let changed = RECONNECT.with(|state| {
        let mut state = state.borrow_mut();
        let changed = state.status != status;
        state.status = status;
        changed
    });
    if changed {
        web_sys::console::info_1(&format!("push channel {status:?}").into());
    }
}

fn schedule_reconnect(session: Rc<Session>) {
    set_status(ConnectionStatus::Reconnecting);
    let (attempt, delay_ms) = RECONNECT.with(|state| {
        let mut state = state.borrow_mut();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        (
            state.consecutive_failures,
            reconnect_backoff_ms(state.consecutive_failures),
        )
    });
    web_sys::console::warn_1(
        &format!("push channel closed (attempt {attempt}); reconnecting in {delay_ms}ms").into(),
    );
    let timeout = Timeout::new(delay_ms, move || connect(session));
    RECONNECT.with(|state| {
        state.borrow_mut().pending = Some(timeout);
    });
}

/// `[HH:MM:SS] <raid name>: <message>`
pub fn log_line(clock: &str, raid_name: Option<&str>, message: &str) -> String {
    format!("[{clock}] {}: {message}", raid_name.unwrap_or("unknown"))
}

fn handle_message(session: &Rc<Session>, text: &str) {
    let msg = match parse_push(text) {
        Ok(msg) => msg,
        Err(e) => {
            web_sys::console::warn_1(&format!("unreadable push message: {e}").into());
            return;
        }
    };

    match &msg.event {
        PushEvent::Attendance(update) => session.handle_attendance(update.clone()),
        PushEvent::Raid(announcement) => {
            let verb = if announcement.created { "reported" } else { "updated" };
            web_sys::console::info_1(&format!("raid {} {verb}", announcement.raid).into());
        }
        PushEvent::Unrecognized(_) => {}
    }

    let raid_name = msg.raid.as_ref().and_then(|raid| session.raid_name(raid));
    let clock = chrono::Local::now().format("%H:%M:%S").to_string();
    web_sys::console::log_1(&log_line(&clock, raid_name.as_deref(), &msg.message).into());
}

/// Open the push channel and feed attendance updates to the session.
/// Closed sockets are reopened with exponential backoff.
pub fn connect(session: Rc<Session>) {
    set_status(ConnectionStatus::Connecting);

    let Some(location) = web_sys::window().map(|window| window.location()) else {
        return;
    };
    let (Ok(protocol), Ok(host)) = (location.protocol(), location.host()) else {
        return;
    };

    let ws = match WebSocket::new(&push_url(&protocol, &host)) {
        Ok(ws) => ws,
        Err(_) => {
            schedule_reconnect(session);
            return;
        }
    };

    let on_open = Closure::<dyn Fn()>::new(move || {
        RECONNECT.with(|state| {
            let mut state = state.borrow_mut();
            state.consecutive_failures = 0;
            state.pending = None;
        });
        set_status(ConnectionStatus::Live);
    });
    ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));

    let message_session = Rc::clone(&session);
    let on_message = Closure::<dyn Fn(MessageEvent)>::new(move |e: MessageEvent| {
        let Some(text) = e.data().as_string() else {
            return;
        };
        handle_message(&message_session, &text);
    });
    ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

    let close_session = Rc::clone(&session);
    let on_close = Closure::<dyn Fn(CloseEvent)>::new(move |_: CloseEvent| {
        schedule_reconnect(Rc::clone(&close_session));
    });
    ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));

    // Replace any existing connection, ensuring handlers are unregistered cleanly.
    PUSH_CONNECTION.with(|slot| {
        let mut slot = slot.borrow_mut();
        if let Some(old) = slot.take() {
            old.close();
        }
        *slot = Some(PushConnection {
            ws,
            _on_open: on_open,
            _on_close: on_close,
            _on_message: on_message,
        });
    });
}
