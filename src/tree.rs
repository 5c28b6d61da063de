//! The presentation-tree model.
//!
//! Trees are created fresh on every render and never mutated by the reconciler,
//! which only ever changes the live side (see [`Dom`](`crate::dom::Dom`)).

use crate::{component::ComponentRef, event::Handler};
use core::{
	any::Any,
	fmt::{self, Debug, Display, Formatter},
};
use std::{collections::BTreeMap, rc::Rc};

/// Attribute name to value. Keys are unique; order is irrelevant.
pub type Attributes = BTreeMap<String, AttrValue>;

/// Style property to value, merged onto a node's style surface.
pub type StyleMap = BTreeMap<String, String>;

/// What a [`TreeNode`] describes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
	/// An element with the given (lowercase) tag name.
	Element(String),
	/// A groupless multi-root result. Its children are spliced into the parent.
	Fragment,
}

impl Kind {
	#[must_use]
	pub fn tag(&self) -> Option<&str> {
		match self {
			Kind::Element(tag) => Some(tag),
			Kind::Fragment => None,
		}
	}
}

impl Display for Kind {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Kind::Element(tag) => f.write_str(tag),
			Kind::Fragment => f.write_str("#fragment"),
		}
	}
}

/// An immutable leaf value, rendered as text.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
	Str(String),
	Number(f64),
	Bool(bool),
}

impl Display for Primitive {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Primitive::Str(str) => f.write_str(str),
			Primitive::Bool(bool) => Display::fmt(bool, f),
			Primitive::Number(n) if n.is_nan() => f.write_str("NaN"),
			Primitive::Number(n) if n.is_infinite() => f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" }),
			// Covers negative zero too.
			Primitive::Number(n) if *n == 0.0 => f.write_str("0"),
			Primitive::Number(n) if n.fract() == 0.0 && n.abs() < 1e21 => write!(f, "{:.0}", n),
			Primitive::Number(n) if n.abs() < 1e-6 || n.abs() >= 1e21 => {
				let exponential = format!("{:e}", n);
				match exponential.split_once('e') {
					Some((mantissa, exponent)) if !exponent.starts_with('-') => write!(f, "{}e+{}", mantissa, exponent),
					_ => f.write_str(&exponential),
				}
			}
			Primitive::Number(n) => Display::fmt(n, f),
		}
	}
}

macro_rules! primitive_from_number {
	($($number:ty),*$(,)?) => {$(
		impl From<$number> for Primitive {
			#[allow(clippy::cast_lossless, clippy::cast_precision_loss)]
			fn from(n: $number) -> Self {
				Primitive::Number(n as f64)
			}
		}
	)*};
}
primitive_from_number!(f64, f32, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<bool> for Primitive {
	fn from(bool: bool) -> Self {
		Primitive::Bool(bool)
	}
}

impl From<&str> for Primitive {
	fn from(str: &str) -> Self {
		Primitive::Str(str.to_owned())
	}
}

impl From<String> for Primitive {
	fn from(string: String) -> Self {
		Primitive::Str(string)
	}
}

/// An attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
	Text(String),
	/// Presence-only: set with empty content if `true`, removed if `false`.
	Bool(bool),
	Style(StyleMap),
	/// Bound as a listener if the attribute name carries the `on` prefix.
	Handler(Handler),
}

impl From<&str> for AttrValue {
	fn from(text: &str) -> Self {
		AttrValue::Text(text.to_owned())
	}
}

impl From<String> for AttrValue {
	fn from(text: String) -> Self {
		AttrValue::Text(text)
	}
}

impl From<bool> for AttrValue {
	fn from(bool: bool) -> Self {
		AttrValue::Bool(bool)
	}
}

impl From<StyleMap> for AttrValue {
	fn from(style: StyleMap) -> Self {
		AttrValue::Style(style)
	}
}

impl From<Handler> for AttrValue {
	fn from(handler: Handler) -> Self {
		AttrValue::Handler(handler)
	}
}

/// The structural unit of a presentation tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
	pub kind: Kind,
	pub attributes: Attributes,
	pub children: Vec<Child>,
}

impl TreeNode {
	#[must_use]
	pub fn element(tag: impl Into<String>) -> Self {
		Self {
			kind: Kind::Element(tag.into()),
			attributes: Attributes::new(),
			children: Vec::new(),
		}
	}

	#[must_use]
	pub fn fragment(children: Vec<Child>) -> Self {
		Self {
			kind: Kind::Fragment,
			attributes: Attributes::new(),
			children,
		}
	}

	#[must_use]
	pub fn attribute(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
		self.attributes.insert(name.into(), value.into());
		self
	}

	#[must_use]
	pub fn child(mut self, child: impl Into<Child>) -> Self {
		self.children.push(child.into());
		self
	}

	#[must_use]
	pub fn is_fragment(&self) -> bool {
		self.kind == Kind::Fragment
	}
}

/// A node handle owned by the presentation layer, passed through a tree unchanged.
///
/// Backends recognise their own handle types through [`Dom::adopt`](`crate::dom::Dom::adopt`).
#[derive(Clone)]
pub struct RawNode(Rc<dyn Any>);

impl RawNode {
	pub fn new<T: 'static>(node: T) -> Self {
		Self(Rc::new(node))
	}

	#[must_use]
	pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
		self.0.downcast_ref()
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl Debug for RawNode {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("RawNode").field(&Rc::as_ptr(&self.0).cast::<()>()).finish()
	}
}

impl PartialEq for RawNode {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

/// Anything that can appear in a child list.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
	Node(TreeNode),
	Text(Primitive),
	/// A deferred, not yet invoked component, rendered with its own activation.
	Component(ComponentRef),
	Raw(RawNode),
}

impl Child {
	#[must_use]
	pub fn is_tree_node(&self) -> bool {
		matches!(self, Child::Node(_))
	}

	#[must_use]
	pub fn is_primitive(&self) -> bool {
		matches!(self, Child::Text(_))
	}

	#[must_use]
	pub fn is_component(&self) -> bool {
		matches!(self, Child::Component(_))
	}

	#[must_use]
	pub fn as_node(&self) -> Option<&TreeNode> {
		match self {
			Child::Node(node) => Some(node),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_text(&self) -> Option<&Primitive> {
		match self {
			Child::Text(text) => Some(text),
			_ => None,
		}
	}
}

impl From<TreeNode> for Child {
	fn from(node: TreeNode) -> Self {
		Child::Node(node)
	}
}

impl From<ComponentRef> for Child {
	fn from(component: ComponentRef) -> Self {
		Child::Component(component)
	}
}

impl From<RawNode> for Child {
	fn from(raw: RawNode) -> Self {
		Child::Raw(raw)
	}
}

impl From<Primitive> for Child {
	fn from(primitive: Primitive) -> Self {
		Child::Text(primitive)
	}
}

macro_rules! child_from_primitive {
	($($primitive:ty),*$(,)?) => {$(
		impl From<$primitive> for Child {
			fn from(primitive: $primitive) -> Self {
				Child::Text(primitive.into())
			}
		}
	)*};
}
child_from_primitive!(&str, String, bool, f64, f32, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// A multi-root result, as a single child.
impl From<Vec<Child>> for Child {
	fn from(children: Vec<Child>) -> Self {
		Child::Node(TreeNode::fragment(children))
	}
}
