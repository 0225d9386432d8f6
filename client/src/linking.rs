use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement, HtmlInputElement};

use raidikalu_shared::linking::{HashLink, parse_hash, toggle_element_id};

fn set_warning_visible(document: &Document, visible: bool) {
    let Some(warning) = document
        .query_selector(".unknown-raid")
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    else {
        return;
    };
    let display = if visible { "" } else { "none" };
    warning.style().set_property("display", display).ok();
}

/// Expand the raid named by the URL hash, or show the unknown-raid notice.
fn open_linked_raid(window: &web_sys::Window, document: &Document) {
    let hash = window.location().hash().unwrap_or_default();
    match parse_hash(&hash) {
        HashLink::Empty => {}
        HashLink::Raid(raid) => {
            let toggle = document
                .get_element_by_id(&toggle_element_id(raid))
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok());
            match toggle {
                Some(toggle) => {
                    toggle.set_checked(true);
                    set_warning_visible(document, false);
                }
                None => set_warning_visible(document, true),
            }
        }
        HashLink::Unknown => set_warning_visible(document, true),
    }
}

pub fn init(window: &web_sys::Window, document: &Document) {
    open_linked_raid(window, document);

    let listener_window = window.clone();
    let document = document.clone();
    let on_hash_change = Closure::<dyn Fn()>::new(move || {
        open_linked_raid(&listener_window, &document);
    });
    window
        .add_event_listener_with_callback("hashchange", on_hash_change.as_ref().unchecked_ref())
        .ok();
    on_hash_change.forget();
}
