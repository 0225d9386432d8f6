mod analytics;
mod config;
mod dom;
mod forms;
mod linking;
mod push;
mod session;
mod snippet;
mod timers;

use std::rc::Rc;

use config::PageConfig;
use dom::PageDom;
use session::Session;

fn main() {
    console_error_panic_hook::set_once();
    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };

    let config = PageConfig::from_window(&window);
    let dom = PageDom::new(document.clone(), config.csrf_token.clone());
    let session = Session::new(config, dom);

    timers::start(Rc::clone(&session));
    forms::bind_nickname(&document, &session.config().csrf_token);
    session.bind_page();
    linking::init(&window, &document);
    analytics::init(&window, &document, session.config().analytics_id.as_deref());
    push::connect(session);
}
