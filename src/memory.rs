//! An in-memory [`Dom`] for headless rendering and tests.

use crate::{
	diff::Runtime,
	dom::{is_form_control, Dom, NodeId},
	event::{Event, EventCategory, Handler},
	template::VOID_ELEMENTS,
	tree::RawNode,
};
use hashbrown::HashMap;
use std::collections::BTreeMap;
use tracing::{error, instrument, trace, warn};

#[derive(Debug)]
enum Data {
	Element {
		tag: String,
		attributes: BTreeMap<String, String>,
		styles: BTreeMap<String, String>,
		value: Option<String>,
		listeners: Vec<(EventCategory, Handler)>,
	},
	Text(String),
}

#[derive(Debug)]
struct MemoryNode {
	data: Data,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
}

/// An arena of elements and text nodes.
///
/// Listeners only run through [`Runtime::dispatch`], which bubbles from the target to its ancestors.
/// Raw nodes are adopted if they wrap a [`NodeId`] of this arena.
/// As in a browser, the `style` attribute and the style properties are one declaration.
#[derive(Debug, Default)]
pub struct MemoryDom {
	nodes: HashMap<NodeId, MemoryNode>,
	next_id: u32,
}

impl MemoryDom {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a detached `<div>` to render into.
	pub fn create_container(&mut self) -> NodeId {
		self.create_element("div")
	}

	/// How many nodes are alive, whether attached or not.
	#[must_use]
	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	#[must_use]
	pub fn contains(&self, node: NodeId) -> bool {
		self.nodes.contains_key(&node)
	}

	#[must_use]
	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.nodes.get(&node)?.parent
	}

	#[must_use]
	pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
		match &self.nodes.get(&node)?.data {
			Data::Element { styles, .. } => styles.get(property).cloned(),
			Data::Text(_) => None,
		}
	}

	/// How many listeners for `category` are attached directly to `node`.
	#[must_use]
	pub fn listener_count(&self, node: NodeId, category: EventCategory) -> usize {
		match self.nodes.get(&node).map(|node| &node.data) {
			Some(Data::Element { listeners, .. }) => listeners.iter().filter(|(c, _)| *c == category).count(),
			_ => 0,
		}
	}

	/// The handlers an event of `category` dispatched at `target` reaches, innermost first.
	#[must_use]
	pub fn propagation_path_handlers(&self, target: NodeId, category: EventCategory) -> Vec<Handler> {
		let mut handlers = Vec::new();
		let mut current = Some(target);
		while let Some(node) = current.and_then(|id| self.nodes.get(&id)) {
			if let Data::Element { listeners, .. } = &node.data {
				handlers.extend(listeners.iter().filter(|(c, _)| *c == category).map(|(_, handler)| handler.clone()));
			}
			current = node.parent;
		}
		handlers
	}

	/// Serialises `node` and its descendants.
	#[must_use]
	pub fn to_html(&self, node: NodeId) -> String {
		let mut html = String::new();
		self.write_html(node, &mut html);
		html
	}

	/// Serialises the children of `node`.
	#[must_use]
	pub fn inner_html(&self, node: NodeId) -> String {
		let mut html = String::new();
		for child in self.child_nodes(node) {
			self.write_html(child, &mut html)
		}
		html
	}

	fn write_html(&self, node: NodeId, html: &mut String) {
		let node = match self.nodes.get(&node) {
			Some(node) => node,
			None => return error!("Tried to serialise missing node {}.", node),
		};
		match &node.data {
			Data::Text(text) => escape(text, false, html),
			Data::Element { tag, attributes, styles, .. } => {
				html.push('<');
				html.push_str(tag);
				for (name, value) in attributes {
					write_attribute(name, value, html);
				}
				if !styles.is_empty() {
					write_attribute("style", &css_text(styles), html);
				}
				html.push('>');
				if VOID_ELEMENTS.contains(&tag.as_str()) {
					return;
				}
				for &child in &node.children {
					self.write_html(child, html)
				}
				html.push_str("</");
				html.push_str(tag);
				html.push('>');
			}
		}
	}

	fn insert(&mut self, data: Data) -> NodeId {
		self.next_id += 1;
		let id = NodeId(self.next_id);
		self.nodes.insert(
			id,
			MemoryNode {
				data,
				parent: None,
				children: Vec::new(),
			},
		);
		id
	}

	fn element_mut(&mut self, node: NodeId) -> Option<&mut Data> {
		match self.nodes.get_mut(&node) {
			Some(MemoryNode { data: data @ Data::Element { .. }, .. }) => Some(data),
			Some(_) => {
				error!("Expected an element at {} but found a text node.", node);
				None
			}
			None => {
				error!("Missing node {}.", node);
				None
			}
		}
	}

	fn detach(&mut self, child: NodeId) {
		let parent = self.nodes.get_mut(&child).and_then(|node| node.parent.take());
		if let Some(parent) = parent.and_then(|parent| self.nodes.get_mut(&parent)) {
			parent.children.retain(|&c| c != child)
		}
	}
}

fn css_text(styles: &BTreeMap<String, String>) -> String {
	styles.iter().map(|(property, value)| format!("{}: {};", property, value)).collect::<Vec<_>>().join(" ")
}

/// Lenient `property: value;` parsing. Declarations without a colon are dropped.
fn parse_declarations(css: &str) -> BTreeMap<String, String> {
	css.split(';')
		.filter_map(|declaration| declaration.split_once(':'))
		.map(|(property, value)| (property.trim().to_owned(), value.trim().to_owned()))
		.filter(|(property, _)| !property.is_empty())
		.collect()
}

fn write_attribute(name: &str, value: &str, html: &mut String) {
	html.push(' ');
	html.push_str(name);
	if !value.is_empty() {
		html.push_str("=\"");
		escape(value, true, html);
		html.push('"');
	}
}

fn escape(text: &str, attribute: bool, html: &mut String) {
	for c in text.chars() {
		match c {
			'&' => html.push_str("&amp;"),
			'<' => html.push_str("&lt;"),
			'>' => html.push_str("&gt;"),
			'"' if attribute => html.push_str("&quot;"),
			c => html.push(c),
		}
	}
}

impl Dom for MemoryDom {
	fn create_element(&mut self, tag: &str) -> NodeId {
		self.insert(Data::Element {
			tag: tag.to_ascii_lowercase(),
			attributes: BTreeMap::new(),
			styles: BTreeMap::new(),
			value: None,
			listeners: Vec::new(),
		})
	}

	fn create_text_node(&mut self, text: &str) -> NodeId {
		self.insert(Data::Text(text.to_owned()))
	}

	fn adopt(&mut self, raw: &RawNode) -> Option<NodeId> {
		raw.downcast_ref::<NodeId>().copied().filter(|node| self.nodes.contains_key(node))
	}

	fn release(&mut self, node: NodeId) {
		self.detach(node);
		if self.nodes.remove(&node).is_none() {
			warn!("Released unknown node {}.", node)
		}
	}

	fn tag_name(&self, node: NodeId) -> Option<String> {
		match &self.nodes.get(&node)?.data {
			Data::Element { tag, .. } => Some(tag.clone()),
			Data::Text(_) => None,
		}
	}

	fn text(&self, node: NodeId) -> Option<String> {
		match &self.nodes.get(&node)?.data {
			Data::Text(text) => Some(text.clone()),
			Data::Element { .. } => None,
		}
	}

	fn set_text(&mut self, node: NodeId, text: &str) {
		match self.nodes.get_mut(&node).map(|node| &mut node.data) {
			Some(Data::Text(data)) => *data = text.to_owned(),
			_ => error!("Expected a text node at {}.", node),
		}
	}

	fn child_nodes(&self, parent: NodeId) -> Vec<NodeId> {
		self.nodes.get(&parent).map(|node| node.children.clone()).unwrap_or_default()
	}

	fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
		let parent = self.nodes.get(&self.nodes.get(&node)?.parent?)?;
		let index = parent.children.iter().position(|&c| c == node)?;
		parent.children.get(index + 1).copied()
	}

	#[instrument(skip(self))]
	fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
		if !self.nodes.contains_key(&child) {
			return error!("Tried to insert missing node {}.", child);
		}
		if self.element_mut(parent).is_none() {
			return;
		}
		self.detach(child);

		let children = match self.nodes.get_mut(&parent) {
			Some(node) => &mut node.children,
			None => return,
		};
		let index = match reference {
			None => children.len(),
			Some(reference) => match children.iter().position(|&c| c == reference) {
				Some(index) => index,
				None => {
					error!("Reference node {} is not a child of {}; Appending instead.", reference, parent);
					children.len()
				}
			},
		};
		children.insert(index, child);
		if let Some(child) = self.nodes.get_mut(&child) {
			child.parent = Some(parent)
		}
		trace!("Inserted.");
	}

	fn remove_child(&mut self, parent: NodeId, child: NodeId) {
		if self.parent(child) != Some(parent) {
			return error!("Tried to remove {} from {}, which is not its parent.", child, parent);
		}
		self.detach(child)
	}

	fn attribute_names(&self, node: NodeId) -> Vec<String> {
		match self.nodes.get(&node).map(|node| &node.data) {
			Some(Data::Element { attributes, styles, .. }) => {
				let mut names: Vec<_> = attributes.keys().cloned().collect();
				if !styles.is_empty() {
					names.push("style".to_owned())
				}
				names
			}
			_ => Vec::new(),
		}
	}

	fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
		match &self.nodes.get(&node)?.data {
			Data::Element { styles, .. } if name == "style" => (!styles.is_empty()).then(|| css_text(styles)),
			Data::Element { attributes, .. } => attributes.get(name).cloned(),
			Data::Text(_) => None,
		}
	}

	fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
		match self.element_mut(node) {
			Some(Data::Element { styles, .. }) if name == "style" => *styles = parse_declarations(value),
			Some(Data::Element { attributes, .. }) => {
				attributes.insert(name.to_owned(), value.to_owned());
			}
			_ => (),
		}
	}

	fn remove_attribute(&mut self, node: NodeId, name: &str) {
		match self.element_mut(node) {
			Some(Data::Element { styles, .. }) if name == "style" => styles.clear(),
			Some(Data::Element { attributes, .. }) => {
				attributes.remove(name);
			}
			_ => (),
		}
	}

	fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
		if let Some(Data::Element { styles, .. }) = self.element_mut(node) {
			styles.insert(property.to_owned(), value.to_owned());
		}
	}

	fn remove_style(&mut self, node: NodeId, property: &str) {
		if let Some(Data::Element { styles, .. }) = self.element_mut(node) {
			styles.remove(property);
		}
	}

	/// Falls back to the `value` attribute until the property is set, like an untouched `<input>`.
	fn value(&self, node: NodeId) -> Option<String> {
		match &self.nodes.get(&node)?.data {
			Data::Element { tag, attributes, value, .. } if is_form_control(tag) => {
				Some(value.clone().or_else(|| attributes.get("value").cloned()).unwrap_or_default())
			}
			_ => None,
		}
	}

	fn set_value(&mut self, node: NodeId, new_value: &str) {
		match self.element_mut(node) {
			Some(Data::Element { tag, value, .. }) if is_form_control(tag) => *value = Some(new_value.to_owned()),
			Some(Data::Element { tag, .. }) => error!("<{}> at {} has no value property.", tag, node),
			_ => (),
		}
	}

	fn add_listener(&mut self, node: NodeId, category: EventCategory, handler: &Handler) {
		if let Some(Data::Element { listeners, .. }) = self.element_mut(node) {
			listeners.push((category, handler.clone()))
		}
	}

	fn remove_listener(&mut self, node: NodeId, category: EventCategory, handler: &Handler) {
		if let Some(Data::Element { listeners, .. }) = self.element_mut(node) {
			match listeners.iter().position(|(c, h)| *c == category && h.ptr_eq(handler)) {
				Some(index) => drop(listeners.remove(index)),
				None => warn!("Tried to remove a {:?} listener from {} that isn't attached.", category, node),
			}
		}
	}
}

impl Runtime<MemoryDom> {
	/// Simulates an event at `target`, bubbling to its ancestors.
	///
	/// For [`EventCategory::Input`] and [`EventCategory::Change`], `value` is first written to the target's value property, as if the user had typed it.
	/// Handlers run without any borrow of this runtime, so they may render or flush.
	///
	/// Returns `false` iff a handler called [`Event::prevent_default`].
	#[instrument(skip(self))]
	pub fn dispatch(&self, target: NodeId, category: EventCategory, value: Option<&str>) -> bool {
		let (handlers, value) = {
			let mut dom = self.dom_mut();
			if let Some(value) = value {
				dom.set_value(target, value)
			}
			(dom.propagation_path_handlers(target, category), dom.value(target))
		};
		trace!("Calling {} handler(s).", handlers.len());

		let event = Event::new(category, target, value);
		for handler in handlers {
			handler.call(&event)
		}
		!event.default_prevented()
	}
}
