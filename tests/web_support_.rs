#![cfg(target_arch = "wasm32")]
#![allow(dead_code)]

use std::sync::Once;
use twig_dom::{NodeId, Runtime, WebDom, WindowMicrotasks};
use wasm_bindgen::JsCast;
use web_sys::{window, HtmlBodyElement, HtmlElement};

static LOG_INIT: Once = Once::new();

pub fn init_logging() {
	LOG_INIT.call_once(|| {
		//TODO: Fail on Warning or Error where a test doesn't expect them.
		tracing_wasm::set_as_global_default();
	})
}

/// A fresh `<div>` appended to the body, with a runtime that renders into it.
pub fn mount_point() -> (Runtime<WebDom>, NodeId, HtmlElement) {
	init_logging();
	let document = window().unwrap().document().unwrap();
	let body = document.body().unwrap().dyn_into::<HtmlBodyElement>().unwrap();
	let div: HtmlElement = document.create_element("div").unwrap().dyn_into().unwrap();
	body.append_child(&div).unwrap();

	let mut dom = WebDom::new(document);
	let container = dom.register(&div);
	(Runtime::new(dom, WindowMicrotasks::from_window().unwrap()), container, div)
}
