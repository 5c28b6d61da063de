//! The browser backend.

use crate::{
	dom::{Dom, NodeId},
	event::{Event, EventCategory, Handler},
	scheduler::Microtasks,
	tree::RawNode,
};
use core::fmt::{self, Debug, Formatter};
use hashbrown::HashMap;
use js_sys::{Function, Reflect};
use tracing::{error, instrument, trace, trace_span, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};

/// The expando property that links a live node back to its [`NodeId`].
const NODE_ID_PROPERTY: &str = "__twigDomNodeId";

type Listener = Closure<dyn Fn(web_sys::Event)>;

/// A [`Dom`] over a [`web_sys::Document`].
///
/// Each handle maps to one [`web_sys::Node`], and each such node remembers its handle in an expando property,
/// so nodes found by walking the document (for example through [`child_nodes`](`Dom::child_nodes`)) resolve to stable handles.
///
/// # Panics
///
/// Listeners hold their [`Handler`] until they are removed or this instance is dropped.
/// Events that reach them after that throw into JavaScript.
pub struct WebDom {
	document: web_sys::Document,
	nodes: HashMap<NodeId, web_sys::Node>,
	listeners: HashMap<(NodeId, EventCategory), Vec<(Handler, Listener)>>,
	next_id: u32,
}

impl WebDom {
	#[must_use]
	pub fn new(document: web_sys::Document) -> Self {
		Self {
			document,
			nodes: HashMap::new(),
			listeners: HashMap::new(),
			next_id: 0,
		}
	}

	/// Uses the document of the current window, if there is one.
	#[must_use]
	pub fn from_window() -> Option<Self> {
		Some(Self::new(web_sys::window()?.document()?))
	}

	#[must_use]
	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}

	/// Returns the handle of an existing node, typically the container to render into.
	pub fn register(&mut self, node: &web_sys::Node) -> NodeId {
		if let Some(id) = node_id(node.as_ref()).filter(|id| self.nodes.contains_key(id)) {
			return id;
		}

		self.next_id += 1;
		let id = NodeId(self.next_id);
		if let Err(error) = Reflect::set(node.as_ref(), &JsValue::from_str(NODE_ID_PROPERTY), &JsValue::from(id.0)) {
			error!("Could not tag {:?} with its node id: {:?}", node, error)
		}
		self.nodes.insert(id, node.clone());
		id
	}

	/// The live node behind `id`.
	#[must_use]
	pub fn node(&self, id: NodeId) -> Option<&web_sys::Node> {
		self.nodes.get(&id)
	}

	fn get(&self, id: NodeId) -> Option<&web_sys::Node> {
		let node = self.nodes.get(&id);
		if node.is_none() {
			error!("Unknown node {}.", id)
		}
		node
	}

	fn element(&self, id: NodeId) -> Option<&web_sys::Element> {
		let element = self.get(id)?.dyn_ref::<web_sys::Element>();
		if element.is_none() {
			error!("Expected an element at {}.", id)
		}
		element
	}
}

fn node_id(node: &JsValue) -> Option<NodeId> {
	let id = Reflect::get(node, &JsValue::from_str(NODE_ID_PROPERTY)).ok()?.as_f64()?;
	#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
	Some(NodeId(id as u32))
}

fn form_value(node: &JsValue) -> Option<String> {
	if let Some(input) = node.dyn_ref::<web_sys::HtmlInputElement>() {
		Some(input.value())
	} else if let Some(select) = node.dyn_ref::<web_sys::HtmlSelectElement>() {
		Some(select.value())
	} else {
		node.dyn_ref::<web_sys::HtmlTextAreaElement>().map(web_sys::HtmlTextAreaElement::value)
	}
}

impl Dom for WebDom {
	fn create_element(&mut self, tag: &str) -> NodeId {
		match self.document.create_element(tag) {
			Ok(element) => self.register(element.as_ref()),
			Err(error) => {
				error!("Failed to create <{}>: {:?}; Substituting an empty text node.", tag, error);
				self.create_text_node("")
			}
		}
	}

	fn create_text_node(&mut self, text: &str) -> NodeId {
		let text = self.document.create_text_node(text);
		self.register(text.as_ref())
	}

	fn adopt(&mut self, raw: &RawNode) -> Option<NodeId> {
		let node: web_sys::Node = if let Some(node) = raw.downcast_ref::<web_sys::Node>() {
			node.clone()
		} else if let Some(element) = raw.downcast_ref::<web_sys::Element>() {
			element.clone().into()
		} else if let Some(element) = raw.downcast_ref::<web_sys::HtmlElement>() {
			element.clone().into()
		} else {
			raw.downcast_ref::<web_sys::Text>()?.clone().into()
		};
		Some(self.register(&node))
	}

	fn release(&mut self, id: NodeId) {
		match self.nodes.remove(&id) {
			Some(node) => {
				if let Err(error) = Reflect::delete_property(node.unchecked_ref::<js_sys::Object>(), &JsValue::from_str(NODE_ID_PROPERTY)) {
					warn!("Could not untag {:?}: {:?}", node, error)
				}
			}
			None => warn!("Released unknown node {}.", id),
		}
		self.listeners.retain(|(node, _), _| *node != id);
	}

	fn tag_name(&self, id: NodeId) -> Option<String> {
		Some(self.nodes.get(&id)?.dyn_ref::<web_sys::Element>()?.tag_name().to_ascii_lowercase())
	}

	fn text(&self, id: NodeId) -> Option<String> {
		Some(self.nodes.get(&id)?.dyn_ref::<web_sys::Text>()?.data())
	}

	fn set_text(&mut self, id: NodeId, text: &str) {
		match self.get(id).and_then(|node| node.dyn_ref::<web_sys::Text>()) {
			Some(node) => node.set_data(text),
			None => error!("Expected a text node at {}.", id),
		}
	}

	fn child_nodes(&self, parent: NodeId) -> Vec<NodeId> {
		let child_nodes = match self.get(parent) {
			Some(parent) => parent.child_nodes(),
			None => return Vec::new(),
		};
		(0..child_nodes.length())
			.filter_map(|i| child_nodes.item(i))
			.filter_map(|child| {
				let id = node_id(child.as_ref()).filter(|id| self.nodes.contains_key(id));
				if id.is_none() {
					warn!("Skipping unregistered child node {:?}.", child)
				}
				id
			})
			.collect()
	}

	fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
		let sibling = self.nodes.get(&id)?.next_sibling()?;
		node_id(sibling.as_ref()).filter(|id| self.nodes.contains_key(id))
	}

	#[instrument(skip(self))]
	fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
		let (parent, child) = match (self.get(parent), self.get(child)) {
			(Some(parent), Some(child)) => (parent, child),
			_ => return,
		};
		let reference = reference.and_then(|reference| self.get(reference));
		if let Err(error) = parent.insert_before(child, reference) {
			error!("Failed to insert node: {:?}", error)
		}
	}

	fn remove_child(&mut self, parent: NodeId, child: NodeId) {
		if let (Some(parent), Some(child)) = (self.get(parent), self.get(child)) {
			if let Err(error) = parent.remove_child(child) {
				error!("Failed to remove node: {:?}", error)
			}
		}
	}

	fn attribute_names(&self, id: NodeId) -> Vec<String> {
		match self.element(id) {
			Some(element) => element.get_attribute_names().iter().filter_map(|name| name.as_string()).collect(),
			None => Vec::new(),
		}
	}

	fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
		self.nodes.get(&id)?.dyn_ref::<web_sys::Element>()?.get_attribute(name)
	}

	fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
		if let Some(element) = self.element(id) {
			if let Err(error) = element.set_attribute(name, value) {
				error!("Could not set attribute {:?}: {:?}", name, error)
			}
		}
	}

	fn remove_attribute(&mut self, id: NodeId, name: &str) {
		if let Some(element) = self.element(id) {
			if let Err(error) = element.remove_attribute(name) {
				warn!("Could not remove attribute {:?}: {:?}", name, error)
			}
		}
	}

	fn set_style(&mut self, id: NodeId, property: &str, value: &str) {
		match self.get(id).and_then(|node| node.dyn_ref::<web_sys::HtmlElement>()) {
			Some(element) => {
				if let Err(error) = element.style().set_property(property, value) {
					error!("Could not set style property {:?}: {:?}", property, error)
				}
			}
			None => error!("Expected an HTML element at {} to style.", id),
		}
	}

	fn remove_style(&mut self, id: NodeId, property: &str) {
		if let Some(element) = self.get(id).and_then(|node| node.dyn_ref::<web_sys::HtmlElement>()) {
			if let Err(error) = element.style().remove_property(property) {
				warn!("Could not remove style property {:?}: {:?}", property, error)
			}
		}
	}

	fn value(&self, id: NodeId) -> Option<String> {
		form_value(self.nodes.get(&id)?.as_ref())
	}

	fn set_value(&mut self, id: NodeId, value: &str) {
		let node = match self.get(id) {
			Some(node) => node,
			None => return,
		};
		if let Some(input) = node.dyn_ref::<web_sys::HtmlInputElement>() {
			input.set_value(value)
		} else if let Some(select) = node.dyn_ref::<web_sys::HtmlSelectElement>() {
			select.set_value(value)
		} else if let Some(text_area) = node.dyn_ref::<web_sys::HtmlTextAreaElement>() {
			text_area.set_value(value)
		} else {
			error!("{:?} has no value property.", node)
		}
	}

	#[instrument(skip(self))]
	fn add_listener(&mut self, id: NodeId, category: EventCategory, handler: &Handler) {
		let element = match self.element(id) {
			Some(element) => element.clone(),
			None => return,
		};

		let listener: Listener = {
			let handler = handler.clone();
			Closure::wrap(Box::new(move |web_event: web_sys::Event| {
				let span = trace_span!("Handling event", ?category, current_target = %id);
				let _enter = span.enter();

				let target = web_event.target().map(JsValue::from);
				let event = Event::new(
					category,
					target.as_ref().and_then(node_id).unwrap_or(id),
					target.as_ref().and_then(form_value),
				);
				handler.call(&event);
				if event.default_prevented() {
					trace!("Preventing default.");
					web_event.prevent_default()
				}
			}) as Box<dyn Fn(web_sys::Event)>)
		};

		if let Err(error) = element.add_event_listener_with_callback(category.as_str(), listener.as_ref().unchecked_ref()) {
			return error!("Failed to add {:?} listener: {:?}", category, error);
		}
		self.listeners.entry((id, category)).or_default().push((handler.clone(), listener));
	}

	#[instrument(skip(self))]
	fn remove_listener(&mut self, id: NodeId, category: EventCategory, handler: &Handler) {
		let listeners = match self.listeners.get_mut(&(id, category)) {
			Some(listeners) => listeners,
			None => return warn!("No {:?} listeners to remove from {}.", category, id),
		};
		let (_, listener) = match listeners.iter().position(|(h, _)| h.ptr_eq(handler)) {
			Some(index) => listeners.remove(index),
			None => return warn!("Tried to remove a {:?} listener from {} that isn't attached.", category, id),
		};
		if listeners.is_empty() {
			self.listeners.remove(&(id, category));
		}

		if let Some(node) = self.nodes.get(&id) {
			if let Err(error) = node.remove_event_listener_with_callback(category.as_str(), listener.as_ref().unchecked_ref()) {
				error!("Failed to remove {:?} listener: {:?}", category, error)
			}
		}
	}
}

impl Debug for WebDom {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("WebDom")
			.field("nodes", &self.nodes.len())
			.field("listeners", &self.listeners.values().map(Vec::len).sum::<usize>())
			.finish_non_exhaustive()
	}
}

/// [`Microtasks`] through [`queueMicrotask`](https://developer.mozilla.org/en-US/docs/Web/API/queueMicrotask).
#[derive(Debug, Clone)]
pub struct WindowMicrotasks {
	window: web_sys::Window,
}

impl WindowMicrotasks {
	#[must_use]
	pub fn new(window: web_sys::Window) -> Self {
		Self { window }
	}

	/// Uses the current window, if there is one.
	#[must_use]
	pub fn from_window() -> Option<Self> {
		web_sys::window().map(Self::new)
	}
}

impl Microtasks for WindowMicrotasks {
	fn queue_microtask(&self, task: Box<dyn FnOnce()>) {
		let callback = Closure::once_into_js(move || task());
		self.window.queue_microtask(callback.unchecked_ref::<Function>())
	}
}
