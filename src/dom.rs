//! The live presentation layer the reconciler writes to.

use crate::{
	event::{EventCategory, Handler},
	tree::RawNode,
};
use core::fmt::{self, Display, Formatter};

/// An opaque handle to a live node, unique within one [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl Display for NodeId {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// A live presentation tree.
///
/// Operations that can fail in a backend (for example because a handle went stale) are
/// expected to log and carry on, the way a differ recovers from unexpected live content.
/// The reconciler verifies what it patches through the read accessors.
pub trait Dom {
	fn create_element(&mut self, tag: &str) -> NodeId;
	fn create_text_node(&mut self, text: &str) -> NodeId;

	/// Returns a handle for a node that was created outside of this crate, if `raw` wraps one of this backend's node types.
	fn adopt(&mut self, raw: &RawNode) -> Option<NodeId>;

	/// Forgets a node that is no longer in use. The node must already be detached (or be inside a detached subtree).
	fn release(&mut self, node: NodeId);

	/// The lowercase tag name, or [`None`] for text nodes.
	fn tag_name(&self, node: NodeId) -> Option<String>;
	/// The text content of a text node, or [`None`] for elements.
	fn text(&self, node: NodeId) -> Option<String>;
	fn set_text(&mut self, node: NodeId, text: &str);

	fn child_nodes(&self, parent: NodeId) -> Vec<NodeId>;
	fn next_sibling(&self, node: NodeId) -> Option<NodeId>;
	/// Inserts (or moves) `child` into `parent` before `reference`, or at the end if `reference` is [`None`].
	fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>);
	fn remove_child(&mut self, parent: NodeId, child: NodeId);

	/// The names of all plain attributes currently set on an element, in no particular order.
	fn attribute_names(&self, node: NodeId) -> Vec<String>;
	fn attribute(&self, node: NodeId, name: &str) -> Option<String>;
	fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);
	fn remove_attribute(&mut self, node: NodeId, name: &str);

	fn set_style(&mut self, node: NodeId, property: &str, value: &str);
	fn remove_style(&mut self, node: NodeId, property: &str);

	/// The live value property of a form control, or [`None`] for other nodes.
	fn value(&self, node: NodeId) -> Option<String>;
	fn set_value(&mut self, node: NodeId, value: &str);

	fn add_listener(&mut self, node: NodeId, category: EventCategory, handler: &Handler);
	fn remove_listener(&mut self, node: NodeId, category: EventCategory, handler: &Handler);
}

/// Elements whose `value` is a live property rather than (only) an attribute.
#[must_use]
pub fn is_form_control(tag: &str) -> bool {
	matches!(tag, "input" | "select" | "textarea")
}
