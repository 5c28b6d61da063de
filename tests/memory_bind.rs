use twig_dom::{bind::Binder, AttrValue, Attributes, Dom, EventCategory, Handler, MemoryDom, StyleMap};

mod memory_support_;
use memory_support_::init_logging;

fn attributes(entries: &[(&str, AttrValue)]) -> Attributes {
	entries.iter().map(|(name, value)| ((*name).to_owned(), value.clone())).collect()
}

#[test]
fn binding_twice_is_idempotent() {
	init_logging();
	let mut dom = MemoryDom::new();
	let button = dom.create_element("button");
	let mut binder = Binder::new();
	let handler = Handler::new(|_| ());
	let attributes = attributes(&[("onclick", handler.clone().into()), ("title", "t".into())]);

	binder.apply_attributes(&mut dom, button, "button", &attributes);
	binder.apply_attributes(&mut dom, button, "button", &attributes);

	assert_eq!(dom.listener_count(button, EventCategory::Click), 1);
	assert_eq!(binder.listener_count(), 1);
	assert!(binder.listener(button, EventCategory::Click).unwrap().ptr_eq(&handler));
	assert_eq!(dom.attribute(button, "title").as_deref(), Some("t"));
}

#[test]
fn event_names_are_case_insensitive() {
	init_logging();
	let mut dom = MemoryDom::new();
	let input = dom.create_element("input");
	let mut binder = Binder::new();

	binder.apply_attributes(&mut dom, input, "input", &attributes(&[("onInput", Handler::new(|_| ()).into()), ("ONCHANGE", Handler::new(|_| ()).into())]));
	assert_eq!(dom.listener_count(input, EventCategory::Input), 1);
	assert_eq!(dom.listener_count(input, EventCategory::Change), 1);
}

#[test]
fn unsupported_event_is_skipped() {
	init_logging();
	let mut dom = MemoryDom::new();
	let div = dom.create_element("div");
	let mut binder = Binder::new();

	binder.apply_attributes(&mut dom, div, "div", &attributes(&[("onwheel", Handler::new(|_| ()).into()), ("onclick", Handler::new(|_| ()).into())]));
	assert_eq!(binder.listener_count(), 1);
	assert_eq!(dom.listener_count(div, EventCategory::Click), 1);
	assert_eq!(dom.attribute(div, "onwheel"), None);
}

#[test]
fn handler_on_plain_attribute_is_skipped() {
	init_logging();
	let mut dom = MemoryDom::new();
	let div = dom.create_element("div");
	let mut binder = Binder::new();

	binder.apply_attributes(&mut dom, div, "div", &attributes(&[("title", Handler::new(|_| ()).into())]));
	assert_eq!(binder.listener_count(), 0);
	assert_eq!(dom.attribute(div, "title"), None);
}

#[test]
fn stale_bindings_are_removed() {
	init_logging();
	let mut dom = MemoryDom::new();
	let div = dom.create_element("div");
	let mut binder = Binder::new();
	let mut style = StyleMap::new();
	style.insert("color".to_owned(), "red".to_owned());
	style.insert("margin".to_owned(), "0".to_owned());

	binder.apply_attributes(
		&mut dom,
		div,
		"div",
		&attributes(&[("class", "a".into()), ("id", "x".into()), ("style", style.into()), ("onclick", Handler::new(|_| ()).into())]),
	);
	assert_eq!(dom.to_html(div), "<div class=\"a\" id=\"x\" style=\"color: red; margin: 0;\"></div>");

	let mut style = StyleMap::new();
	style.insert("color".to_owned(), "blue".to_owned());
	binder.apply_attributes(&mut dom, div, "div", &attributes(&[("class", "b".into()), ("style", style.into())]));
	assert_eq!(dom.to_html(div), "<div class=\"b\" style=\"color: blue;\"></div>");
	assert_eq!(dom.listener_count(div, EventCategory::Click), 0);
	assert_eq!(binder.listener_count(), 0);
}

#[test]
fn style_switches_between_text_and_map() {
	init_logging();
	let mut dom = MemoryDom::new();
	let div = dom.create_element("div");
	let mut binder = Binder::new();
	let mut style = StyleMap::new();
	style.insert("margin".to_owned(), "0".to_owned());

	binder.apply_attributes(&mut dom, div, "div", &attributes(&[("style", "color: red".into())]));
	assert_eq!(dom.style(div, "color").as_deref(), Some("red"));

	binder.apply_attributes(&mut dom, div, "div", &attributes(&[("style", style.clone().into())]));
	assert_eq!(dom.style(div, "margin").as_deref(), Some("0"));
	assert_eq!(dom.style(div, "color"), None);
	assert_eq!(dom.to_html(div), "<div style=\"margin: 0;\"></div>");

	binder.apply_attributes(&mut dom, div, "div", &attributes(&[("style", "margin: 1px".into())]));
	assert_eq!(dom.style(div, "margin").as_deref(), Some("1px"), "the text wins over the property it replaces");
	assert_eq!(dom.to_html(div), "<div style=\"margin: 1px;\"></div>");

	binder.apply_attributes(&mut dom, div, "div", &attributes(&[]));
	assert_eq!(dom.attribute(div, "style"), None);
}

#[test]
fn booleans_toggle_presence() {
	init_logging();
	let mut dom = MemoryDom::new();
	let input = dom.create_element("input");
	let mut binder = Binder::new();

	binder.apply_attributes(&mut dom, input, "input", &attributes(&[("disabled", true.into())]));
	assert_eq!(dom.to_html(input), "<input disabled>");

	binder.apply_attributes(&mut dom, input, "input", &attributes(&[("disabled", false.into())]));
	assert_eq!(dom.to_html(input), "<input>");
}

#[test]
fn style_map_under_other_name_becomes_css_text() {
	init_logging();
	let mut dom = MemoryDom::new();
	let div = dom.create_element("div");
	let mut binder = Binder::new();
	let mut style = StyleMap::new();
	style.insert("color".to_owned(), "red".to_owned());

	binder.apply_attributes(&mut dom, div, "div", &attributes(&[("data-style", style.into())]));
	assert_eq!(dom.attribute(div, "data-style").as_deref(), Some("color: red;"));
	assert_eq!(dom.style(div, "color"), None);
}

#[test]
fn form_value_goes_to_the_property() {
	init_logging();
	let mut dom = MemoryDom::new();
	let select = dom.create_element("select");
	let mut binder = Binder::new();

	binder.apply_attributes(&mut dom, select, "select", &attributes(&[("value", "2".into())]));
	assert_eq!(dom.value(select).as_deref(), Some("2"));
	assert_eq!(dom.attribute(select, "value"), None);
}

#[test]
fn forget_detaches_listeners() {
	init_logging();
	let mut dom = MemoryDom::new();
	let button = dom.create_element("button");
	let mut binder = Binder::new();

	binder.apply_attributes(&mut dom, button, "button", &attributes(&[("onclick", Handler::new(|_| ()).into())]));
	binder.forget(&mut dom, button);
	assert_eq!(dom.listener_count(button, EventCategory::Click), 0);
	assert!(binder.listener(button, EventCategory::Click).is_none());
}
