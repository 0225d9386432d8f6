use js_sys::Reflect;
use wasm_bindgen::JsValue;

use raidikalu_shared::fragment::SnippetSource;

pub const PUSH_PATH: &str = "/ws/";
pub const TIMER_TICK_MS: u32 = 1_000;
pub const RECONNECT_BASE_MS: u32 = 500;
pub const RECONNECT_MAX_MS: u32 = 10_000;

/// Values the server template writes into page globals.
#[derive(Debug, Clone, Default)]
pub struct PageConfig {
    pub nickname: String,
    pub csrf_token: String,
    pub analytics_id: Option<String>,
    pub snippet_source: SnippetSource,
}

fn page_global(window: &web_sys::Window, name: &str) -> Option<String> {
    Reflect::get(window.as_ref(), &JsValue::from_str(name))
        .ok()
        .and_then(|value| value.as_string())
}

impl PageConfig {
    pub fn from_window(window: &web_sys::Window) -> Self {
        let nickname = page_global(window, "NICKNAME").unwrap_or_default();
        let csrf_token = page_global(window, "CSRFTOKEN").unwrap_or_default();
        if csrf_token.is_empty() {
            web_sys::console::warn_1(&"CSRFTOKEN missing; form posts will be rejected".into());
        }
        let analytics_id =
            page_global(window, "GOOGLE_ANALYTICS_ID").filter(|id| !id.trim().is_empty());
        let snippet_source =
            SnippetSource::from_setting(page_global(window, "RAID_SNIPPET_SOURCE").as_deref());

        Self {
            nickname,
            csrf_token,
            analytics_id,
            snippet_source,
        }
    }
}

/// Push channel address for a page served from `protocol//host`.
pub fn push_url(protocol: &str, host: &str) -> String {
    let scheme = if protocol == "https:" { "wss" } else { "ws" };
    format!("{scheme}://{host}{PUSH_PATH}")
}
