use crate::{
	component::{Component, ComponentRef},
	error::Error,
	event::Handler,
	tree::{Child, Primitive, RawNode, StyleMap, TreeNode},
};

/// A value interpolated into a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	/// Produces nothing, neither a child nor attribute text.
	Null,
	Primitive(Primitive),
	Child(Child),
	/// Flattened into the surrounding child list.
	List(Vec<Value>),
	Handler(Handler),
	Style(StyleMap),
}

impl Value {
	#[must_use]
	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	#[must_use]
	pub fn is_primitive(&self) -> bool {
		matches!(self, Value::Primitive(_) | Value::Child(Child::Text(_)))
	}

	#[must_use]
	pub fn is_tree_node(&self) -> bool {
		matches!(self, Value::Child(Child::Node(_)))
	}

	#[must_use]
	pub fn is_component(&self) -> bool {
		matches!(self, Value::Child(Child::Component(_)))
	}

	/// A short description for diagnostics.
	#[must_use]
	pub fn describe(&self) -> &'static str {
		match self {
			Value::Null => "null",
			Value::Primitive(_) | Value::Child(Child::Text(_)) => "a primitive",
			Value::Child(Child::Node(_)) => "a tree node",
			Value::Child(Child::Component(_)) => "a component reference",
			Value::Child(Child::Raw(_)) => "a raw node",
			Value::List(_) => "a list",
			Value::Handler(_) => "an event handler",
			Value::Style(_) => "a style mapping",
		}
	}
}

impl TryFrom<Value> for Child {
	type Error = Error;

	fn try_from(value: Value) -> Result<Self, Self::Error> {
		match value {
			Value::Null => Ok(Child::Node(TreeNode::fragment(Vec::new()))),
			Value::Primitive(primitive) => Ok(Child::Text(primitive)),
			Value::Child(child) => Ok(child),
			Value::List(values) => values
				.into_iter()
				.filter(|value| !value.is_null())
				.map(Child::try_from)
				.collect::<Result<Vec<_>, _>>()
				.map(|children| Child::Node(TreeNode::fragment(children))),
			Value::Handler(_) | Value::Style(_) => Err(Error::MalformedTree { found: value.describe() }),
		}
	}
}

macro_rules! value_from_primitive {
	($($primitive:ty),*$(,)?) => {$(
		impl From<$primitive> for Value {
			fn from(primitive: $primitive) -> Self {
				Value::Primitive(primitive.into())
			}
		}
	)*};
}
value_from_primitive!(&str, String, bool, f64, f32, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<&String> for Value {
	fn from(string: &String) -> Self {
		Value::Primitive(Primitive::Str(string.clone()))
	}
}

impl From<Primitive> for Value {
	fn from(primitive: Primitive) -> Self {
		Value::Primitive(primitive)
	}
}

impl From<Child> for Value {
	fn from(child: Child) -> Self {
		Value::Child(child)
	}
}

impl From<TreeNode> for Value {
	fn from(node: TreeNode) -> Self {
		Value::Child(Child::Node(node))
	}
}

impl From<ComponentRef> for Value {
	fn from(component: ComponentRef) -> Self {
		Value::Child(Child::Component(component))
	}
}

impl From<Component> for Value {
	fn from(component: Component) -> Self {
		Value::Child(Child::Component(component.reference()))
	}
}

impl From<&Component> for Value {
	fn from(component: &Component) -> Self {
		Value::Child(Child::Component(component.reference()))
	}
}

impl From<RawNode> for Value {
	fn from(raw: RawNode) -> Self {
		Value::Child(Child::Raw(raw))
	}
}

impl From<Handler> for Value {
	fn from(handler: Handler) -> Self {
		Value::Handler(handler)
	}
}

impl From<&Handler> for Value {
	fn from(handler: &Handler) -> Self {
		Value::Handler(handler.clone())
	}
}

impl From<StyleMap> for Value {
	fn from(style: StyleMap) -> Self {
		Value::Style(style)
	}
}

impl From<()> for Value {
	fn from((): ()) -> Self {
		Value::Null
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map_or(Value::Null, Into::into)
	}
}

impl<T: Into<Value>> From<Vec<T>> for Value {
	fn from(values: Vec<T>) -> Self {
		Value::List(values.into_iter().map(Into::into).collect())
	}
}
