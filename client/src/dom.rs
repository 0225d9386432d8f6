use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, HtmlInputElement, NodeList};

use raidikalu_shared::countdown::{countdown_text, parse_target};
use raidikalu_shared::{RaidDom, RaidId};

use crate::forms;

const TOGGLE_SELECTOR: &str = ".raid-toggle";
const CHOICE_SELECTOR: &str = ".raid-attendance-choice";
// Spelled the way the server templates spell it.
const CANCEL_SELECTOR: &str = ".raid-attandance-cancel";
const CHOICES_CONTAINER_SELECTOR: &str = ".raider-attendance-choices";
const TIMER_SELECTOR: &str = "[data-time]";

pub fn raid_selector(raid: &str) -> String {
    format!(".raid[data-id=\"{raid}\"]")
}

fn elements(list: NodeList) -> impl Iterator<Item = Element> {
    (0..list.length()).filter_map(move |i| list.item(i)?.dyn_into::<Element>().ok())
}

fn input(view: &Element, selector: &str) -> Option<HtmlInputElement> {
    view.query_selector(selector)
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
}

fn inputs(view: &Element, selector: &str) -> Vec<HtmlInputElement> {
    view.query_selector_all(selector)
        .map(|list| {
            elements(list)
                .filter_map(|el| el.dyn_into::<HtmlInputElement>().ok())
                .collect()
        })
        .unwrap_or_default()
}

/// The live raid list document plus the state that has to follow it across
/// snippet swaps: the countdown elements and the attendance listener.
pub struct PageDom {
    document: Document,
    timers: Vec<Element>,
    on_attendance_change: Closure<dyn Fn(Event)>,
}

impl PageDom {
    pub fn new(document: Document, csrf_token: String) -> Self {
        let on_attendance_change = Closure::<dyn Fn(Event)>::new(move |e: Event| {
            forms::submit_attendance_change(&e, &csrf_token);
        });
        let mut dom = Self {
            document,
            timers: Vec::new(),
            on_attendance_change,
        };
        dom.refresh_timers();
        dom
    }

    /// Attach the attendance listener to every choice group on the page.
    pub fn bind_page_attendance(&self) {
        if let Ok(list) = self.document.query_selector_all(CHOICES_CONTAINER_SELECTOR) {
            self.bind_containers(list);
        }
    }

    fn bind_containers(&self, list: NodeList) {
        for container in elements(list) {
            container
                .add_event_listener_with_callback(
                    "change",
                    self.on_attendance_change.as_ref().unchecked_ref(),
                )
                .ok();
        }
    }

    pub fn tick_timers(&self, now_secs: i64) {
        for el in &self.timers {
            let Some(target) = el
                .get_attribute("data-time")
                .and_then(|raw| parse_target(&raw))
            else {
                continue;
            };
            if let Some(text) = countdown_text(target, now_secs) {
                el.set_text_content(Some(&text));
            }
        }
    }

    pub fn raid_name(&self, raid: &RaidId) -> Option<String> {
        let selector = format!("{} .raid-name", raid_selector(raid.as_str()));
        self.document
            .query_selector(&selector)
            .ok()
            .flatten()
            .and_then(|el| el.text_content())
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
    }
}

impl RaidDom for PageDom {
    type View = Element;

    fn find_raid(&self, raid: &RaidId) -> Option<Element> {
        self.document
            .query_selector(&raid_selector(raid.as_str()))
            .ok()
            .flatten()
    }

    fn parse_fragment(&self, html: &str) -> Option<Element> {
        let wrapper = self.document.create_element("div").ok()?;
        wrapper.set_inner_html(html);
        wrapper
            .first_element_child()
            .filter(|el| el.class_list().contains("raid"))
    }

    fn is_expanded(&self, view: &Element) -> bool {
        input(view, TOGGLE_SELECTOR).is_some_and(|toggle| toggle.checked())
    }

    fn set_expanded(&self, view: &Element, expanded: bool) {
        if let Some(toggle) = input(view, TOGGLE_SELECTOR) {
            toggle.set_checked(expanded);
        }
    }

    fn checked_choice(&self, view: &Element) -> Option<usize> {
        let choices = inputs(view, CHOICE_SELECTOR);
        let position = choices.iter().position(|choice| choice.checked())?;
        // Choice inputs carry their index as value; fall back to document order.
        Some(choices[position].value().trim().parse().unwrap_or(position))
    }

    fn choice_count(&self, view: &Element) -> usize {
        inputs(view, CHOICE_SELECTOR).len()
    }

    fn check_choice(&self, view: &Element, index: usize) {
        for (i, choice) in inputs(view, CHOICE_SELECTOR).iter().enumerate() {
            choice.set_checked(i == index);
        }
    }

    fn set_cancel_checked(&self, view: &Element, checked: bool) {
        if let Some(cancel) = input(view, CANCEL_SELECTOR) {
            cancel.set_checked(checked);
        }
    }

    fn replace(&mut self, old: &Element, new: &Element) -> bool {
        old.replace_with_with_node_1(new).is_ok()
    }

    fn bind_attendance(&mut self, view: &Element) {
        if let Ok(list) = view.query_selector_all(CHOICES_CONTAINER_SELECTOR) {
            self.bind_containers(list);
        }
    }

    fn refresh_timers(&mut self) {
        self.timers = self
            .document
            .query_selector_all(TIMER_SELECTOR)
            .map(|list| elements(list).collect())
            .unwrap_or_default();
    }
}
