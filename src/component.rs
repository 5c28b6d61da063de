//! Component functions and their (type-erased) props.

use crate::{error::Error, tree::Child};
use core::{
	any::{type_name, Any, TypeId},
	fmt::{self, Debug, Formatter},
};
use std::rc::Rc;

/// The last-supplied argument of a component.
#[derive(Clone, Default)]
pub struct Props(Option<Rc<dyn Any>>);

impl Props {
	pub fn new<P: 'static>(props: P) -> Self {
		Self(Some(Rc::new(props)))
	}

	#[must_use]
	pub fn none() -> Self {
		Self(None)
	}

	#[must_use]
	pub fn is_none(&self) -> bool {
		self.0.is_none()
	}

	#[must_use]
	pub fn get<P: 'static>(&self) -> Option<&P> {
		self.0.as_ref()?.downcast_ref()
	}

	/// Like [`get`](`Props::get`), but fails with [`Error::Component`] if the props are absent or of another type.
	pub fn require<P: 'static>(&self) -> Result<&P, Error> {
		self.get().ok_or_else(|| Error::component(format!("expected props of type `{}`", type_name::<P>())))
	}
}

impl Debug for Props {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match &self.0 {
			Some(props) => f.debug_tuple("Props").field(&Rc::as_ptr(props).cast::<()>()).finish(),
			None => f.write_str("Props(None)"),
		}
	}
}

impl PartialEq for Props {
	fn eq(&self, other: &Self) -> bool {
		match (&self.0, &other.0) {
			(Some(a), Some(b)) => Rc::ptr_eq(a, b),
			(None, None) => true,
			_ => false,
		}
	}
}

type RenderFn = dyn Fn(&Props) -> Result<Child, Error>;

/// A component function.
///
/// Its identity is the type of the wrapped function, which is stable across renders
/// (every `fn` item and every closure expression has its own type).
#[derive(Clone)]
pub struct Component {
	id: TypeId,
	name: &'static str,
	render: Rc<RenderFn>,
}

impl Component {
	pub fn new<F>(render: F) -> Self
	where
		F: 'static + Fn(&Props) -> Result<Child, Error>,
	{
		Self {
			id: TypeId::of::<F>(),
			name: type_name::<F>(),
			render: Rc::new(render),
		}
	}

	#[must_use]
	pub fn id(&self) -> TypeId {
		self.id
	}

	#[must_use]
	pub fn name(&self) -> &'static str {
		self.name
	}

	/// A deferred reference without props.
	#[must_use]
	pub fn reference(&self) -> ComponentRef {
		ComponentRef {
			component: self.clone(),
			props: Props::none(),
		}
	}

	/// A deferred reference that will be rendered with `props`.
	#[must_use]
	pub fn with<P: 'static>(&self, props: P) -> ComponentRef {
		ComponentRef {
			component: self.clone(),
			props: Props::new(props),
		}
	}

	pub(crate) fn invoke(&self, props: &Props) -> Result<Child, Error> {
		(self.render)(props)
	}
}

impl Debug for Component {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Component").field(&self.name).finish()
	}
}

impl PartialEq for Component {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

/// A component together with the props its parent supplied, not yet invoked.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentRef {
	pub component: Component,
	pub props: Props,
}

impl From<Component> for ComponentRef {
	fn from(component: Component) -> Self {
		component.reference()
	}
}

/// Invokes `component` with `props` right away and returns its output.
///
/// Any hooks the component calls belong to the activation that is currently rendering,
/// so they keep their identity across renders of the caller.
pub fn with_props<P: 'static>(component: &Component, props: P) -> Result<Child, Error> {
	component.invoke(&Props::new(props))
}
