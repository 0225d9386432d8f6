use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, FormData, HtmlInputElement};

use raidikalu_shared::RaidId;
use raidikalu_shared::forms::{CSRF_HEADER, FormAction};

/// POST `action` to the current page. Fire-and-forget; failures only reach the console.
pub fn submit(action: FormAction, csrf_token: &str) {
    let csrf_token = csrf_token.to_string();
    spawn_local(async move {
        if let Err(e) = post(&action, &csrf_token).await {
            web_sys::console::warn_1(&format!("{} failed: {e}", action.action()).into());
        }
    });
}

async fn post(action: &FormAction, csrf_token: &str) -> Result<(), String> {
    let form = FormData::new().map_err(|_| "FormData unavailable".to_string())?;
    for (name, value) in action.fields() {
        form.append_with_str(name, value)
            .map_err(|_| format!("cannot append {name}"))?;
    }

    let url = web_sys::window()
        .and_then(|window| window.location().href().ok())
        .ok_or("no page location")?;

    let resp = gloo_net::http::Request::post(&url)
        .header(CSRF_HEADER, csrf_token)
        .body(form)
        .map_err(|e| format!("request error: {e}"))?
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }
    Ok(())
}

/// `change` handler bound on each `.raider-attendance-choices` container.
pub fn submit_attendance_change(event: &Event, csrf_token: &str) {
    let Some(container) = event
        .current_target()
        .and_then(|target| target.dyn_into::<Element>().ok())
    else {
        return;
    };
    let Some(raid) = container.get_attribute("data-raid-id") else {
        return;
    };
    let Some(choice) = event
        .target()
        .and_then(|target| target.dyn_into::<HtmlInputElement>().ok())
    else {
        return;
    };

    submit(
        FormAction::SetAttendance {
            raid: RaidId::new(raid),
            choice: choice.value(),
        },
        csrf_token,
    );
}

/// Post the trainer nickname whenever the nickname field changes.
/// Pages without the field get no listener.
pub fn bind_nickname(document: &Document, csrf_token: &str) {
    let Some(field) = document
        .query_selector(".trainer-nickname-input")
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
    else {
        return;
    };

    let csrf_token = csrf_token.to_string();
    let input = field.clone();
    let on_change = Closure::<dyn Fn()>::new(move || {
        submit(
            FormAction::SetNickname {
                nickname: input.value(),
            },
            &csrf_token,
        );
    });
    field
        .add_event_listener_with_callback("change", on_change.as_ref().unchecked_ref())
        .ok();
    on_change.forget();
}
