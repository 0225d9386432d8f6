use js_sys::{Function, Reflect};
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, HtmlInputElement};

use raidikalu_shared::analytics::{
    EventParams, GtagConfig, Interaction, InteractionKind, RaidMeta, classify,
};

use crate::dom::raid_selector;

fn gtag_function(window: &web_sys::Window) -> Option<Function> {
    Reflect::get(window.as_ref(), &JsValue::from_str("gtag"))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok())
}

fn to_js<T: Serialize>(value: &T) -> Option<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .ok()
}

/// Configure gtag and report raid interactions through delegated body listeners.
/// Does nothing when the page has no gtag or no analytics id.
pub fn init(window: &web_sys::Window, document: &Document, analytics_id: Option<&str>) {
    let (Some(gtag), Some(analytics_id)) = (gtag_function(window), analytics_id) else {
        web_sys::console::info_1(&"analytics disabled".into());
        return;
    };
    let Some(body) = document.body() else {
        return;
    };

    if let Some(config) = to_js(&GtagConfig::default()) {
        gtag.call3(
            &JsValue::NULL,
            &JsValue::from_str("config"),
            &JsValue::from_str(analytics_id),
            &config,
        )
        .ok();
    }

    let document = document.clone();
    let handler = Closure::<dyn Fn(Event)>::new(move |e: Event| {
        report(&e, &gtag, &document);
    });
    for event_type in ["change", "click"] {
        body.add_event_listener_with_callback(event_type, handler.as_ref().unchecked_ref())
            .ok();
    }
    handler.forget();
}

fn report(event: &Event, gtag: &Function, document: &Document) {
    let kind = match event.type_().as_str() {
        "change" => InteractionKind::Change,
        "click" => InteractionKind::Click,
        _ => return,
    };
    let Some(target) = event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok())
    else {
        return;
    };

    let input = target.dyn_ref::<HtmlInputElement>();
    let checked = input.is_some_and(|input| input.checked());
    let value = input.map(|input| input.value()).unwrap_or_default();
    let id = target.id();
    let class_name = target.class_name();
    let enclosing_raid = target
        .closest(".raid[data-id]")
        .ok()
        .flatten()
        .and_then(|raid| raid.get_attribute("data-id"));

    let Some(tracked) = classify(&Interaction {
        kind,
        target_id: &id,
        checked,
        value: &value,
        class_name: &class_name,
        enclosing_raid: enclosing_raid.as_deref(),
    }) else {
        return;
    };

    let Some(raid) = document
        .query_selector(&raid_selector(&tracked.raid))
        .ok()
        .flatten()
    else {
        return;
    };
    let meta = RaidMeta {
        monster: raid.get_attribute("data-monster"),
        tier: raid.get_attribute("data-tier"),
        gym: raid.get_attribute("data-gym"),
    };

    let Some(params) = to_js(&EventParams::new(&tracked, meta)) else {
        return;
    };
    gtag.call3(
        &JsValue::NULL,
        &JsValue::from_str("event"),
        &JsValue::from_str(tracked.event.name()),
        &params,
    )
    .ok();
}
