//! Reads live content back into [`Child`] trees, for example to compare a rendered container against an expected tree.
//!
//! Attributes are loaded as text. Listeners, style properties and form values aren't part of the result.

use crate::{
	diff::Runtime,
	dom::{Dom, NodeId},
	tree::{AttrValue, Child, Primitive, TreeNode},
};

pub fn load_child_nodes<D: Dom + ?Sized>(dom: &D, parent: NodeId) -> Vec<Child> {
	dom.child_nodes(parent).into_iter().filter_map(|child| load_node(dom, child)).collect()
}

/// Returns [`None`] if `node` is unknown to `dom`.
pub fn load_node<D: Dom + ?Sized>(dom: &D, node: NodeId) -> Option<Child> {
	if let Some(tag) = dom.tag_name(node) {
		Some(Child::Node(load_element(dom, node, tag)))
	} else {
		dom.text(node).map(|text| Child::Text(Primitive::Str(text)))
	}
}

fn load_element<D: Dom + ?Sized>(dom: &D, node: NodeId, tag: String) -> TreeNode {
	let mut element = TreeNode::element(tag);
	for name in dom.attribute_names(node) {
		if let Some(value) = dom.attribute(node, &name) {
			element.attributes.insert(name, AttrValue::Text(value));
		}
	}
	element.children = load_child_nodes(dom, node);
	element
}

impl<D: Dom + 'static> Runtime<D> {
	/// The current live content of `container`.
	#[must_use]
	pub fn snapshot(&self, container: NodeId) -> Vec<Child> {
		load_child_nodes(&*self.dom(), container)
	}
}
