//! Applies [`Attributes`] to live elements.

use crate::{
	content,
	dom::{is_form_control, Dom, NodeId},
	event::{EventCategory, Handler},
	tree::{AttrValue, Attributes, StyleMap},
};
use hashbrown::{HashMap, HashSet};
use tracing::{instrument, trace, warn};

/// What was applied to one live element, tracked apart from the [`Attributes`] it came from.
#[derive(Debug, Default)]
struct NodeBindings {
	attributes: HashSet<String>,
	styles: HashSet<String>,
	listeners: HashMap<EventCategory, Handler>,
}

/// Out-of-band binding bookkeeping, keyed by live node.
///
/// [`apply_attributes`](`Binder::apply_attributes`) is idempotent: applying the same [`Attributes`] twice
/// leaves exactly one listener per [`EventCategory`] and changes nothing on the second call.
/// Anything applied before that is missing from the next call's [`Attributes`] is removed again.
#[derive(Debug, Default)]
pub struct Binder {
	bindings: HashMap<NodeId, NodeBindings>,
}

impl Binder {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[instrument(skip(self, dom, attributes))]
	pub fn apply_attributes<D: Dom + ?Sized>(&mut self, dom: &mut D, node: NodeId, tag: &str, attributes: &Attributes) {
		let bindings = self.bindings.entry(node).or_default();

		let mut attribute_names = HashSet::new();
		let mut style_names = HashSet::new();
		for (name, value) in attributes {
			match value {
				AttrValue::Handler(_) | AttrValue::Bool(false) => (),
				_ if name == "value" && is_form_control(tag) => (),
				AttrValue::Style(style) if name == "style" => style_names.extend(style.keys().cloned()),
				AttrValue::Bool(true) | AttrValue::Text(_) | AttrValue::Style(_) => {
					attribute_names.insert(name.clone());
				}
			}
		}

		// Stale entries go before anything is written: `style` text and style properties share one declaration.
		for stale in bindings.attributes.difference(&attribute_names) {
			trace!(name = %stale, "Removing stale attribute");
			dom.remove_attribute(node, stale)
		}
		for stale in bindings.styles.difference(&style_names) {
			trace!(property = %stale, "Removing stale style");
			dom.remove_style(node, stale)
		}

		let mut categories = HashSet::new();
		for (name, value) in attributes {
			match value {
				AttrValue::Handler(handler) => match EventCategory::from_attribute_name(name) {
					Some(Ok(category)) => {
						if !categories.insert(category) {
							warn!("Multiple handlers for {:?} on <{}>; The last one ({:?}) wins.", category, tag, name);
						}
						bind_listener(dom, node, bindings, category, handler)
					}
					Some(Err(error)) => warn!("Skipping event binding {:?} on <{}>: {}", name, tag, error),
					None => warn!("Handlers can only be bound to event attributes, but {:?} on <{}> isn't one. Skipping.", name, tag),
				},

				_ if name == "value" && is_form_control(tag) => {
					let text = stringify(value);
					if dom.value(node).as_deref() != Some(text.as_str()) {
						trace!(value = ?content(&text), "Updating form control value");
						dom.set_value(node, &text)
					}
				}

				AttrValue::Style(style) if name == "style" => {
					for (property, value) in style {
						trace!(property = %property, value = ?content(value), "Setting style");
						dom.set_style(node, property, value);
					}
				}

				AttrValue::Bool(false) => {
					if dom.attribute(node, name).is_some() {
						trace!(name = %name, "Removing boolean attribute");
						dom.remove_attribute(node, name)
					}
				}

				AttrValue::Bool(true) | AttrValue::Text(_) | AttrValue::Style(_) => {
					let text = stringify(value);
					if dom.attribute(node, name).as_deref() != Some(text.as_str()) {
						trace!(name = %name, value = ?content(&text), "Setting attribute");
						dom.set_attribute(node, name, &text)
					}
				}
			}
		}

		bindings.listeners.retain(|category, handler| {
			let keep = categories.contains(category);
			if !keep {
				trace!(?category, "Removing stale listener");
				dom.remove_listener(node, *category, handler)
			}
			keep
		});

		bindings.attributes = attribute_names;
		bindings.styles = style_names;
	}

	/// Detaches all listeners from `node` and drops its bookkeeping.
	///
	/// Attributes and styles are left alone, since the node is about to be discarded.
	#[instrument(skip(self, dom))]
	pub fn forget<D: Dom + ?Sized>(&mut self, dom: &mut D, node: NodeId) {
		if let Some(bindings) = self.bindings.remove(&node) {
			for (category, handler) in bindings.listeners {
				dom.remove_listener(node, category, &handler)
			}
		}
	}

	/// The handler currently bound to `node` for `category`.
	#[must_use]
	pub fn listener(&self, node: NodeId, category: EventCategory) -> Option<&Handler> {
		self.bindings.get(&node)?.listeners.get(&category)
	}

	/// How many listeners are bound across all nodes.
	#[must_use]
	pub fn listener_count(&self) -> usize {
		self.bindings.values().map(|bindings| bindings.listeners.len()).sum()
	}
}

fn bind_listener<D: Dom + ?Sized>(dom: &mut D, node: NodeId, bindings: &mut NodeBindings, category: EventCategory, handler: &Handler) {
	if let Some(previous) = bindings.listeners.get(&category) {
		if previous.ptr_eq(handler) {
			return;
		}
		trace!(?category, "Replacing listener");
		dom.remove_listener(node, category, previous);
	} else {
		trace!(?category, "Adding listener");
	}
	dom.add_listener(node, category, handler);
	bindings.listeners.insert(category, handler.clone());
}

/// Plain attribute text for a non-handler value.
fn stringify(value: &AttrValue) -> String {
	match value {
		AttrValue::Text(text) => text.clone(),
		AttrValue::Bool(true) => String::new(),
		AttrValue::Bool(false) => "false".to_owned(),
		AttrValue::Style(style) => css_text(style),
		AttrValue::Handler(_) => String::new(),
	}
}

fn css_text(style: &StyleMap) -> String {
	style.iter().map(|(property, value)| format!("{}: {};", property, value)).collect::<Vec<_>>().join(" ")
}
