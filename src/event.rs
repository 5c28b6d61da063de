use crate::{dom::NodeId, error::UnsupportedEventCategory};
use core::{
	cell::Cell,
	fmt::{self, Debug, Formatter},
	str::FromStr,
};
use std::rc::Rc;

/// The attribute prefix that marks an event binding, as in `onclick`.
pub const EVENT_PREFIX: &str = "on";

/// The events that can be bound through `on*` attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventCategory {
	Click,
	Input,
	Submit,
	Change,
	Focus,
	Blur,
	KeyDown,
	KeyUp,
	MouseOver,
	MouseOut,
}

impl EventCategory {
	pub const ALL: [EventCategory; 10] = [
		EventCategory::Click,
		EventCategory::Input,
		EventCategory::Submit,
		EventCategory::Change,
		EventCategory::Focus,
		EventCategory::Blur,
		EventCategory::KeyDown,
		EventCategory::KeyUp,
		EventCategory::MouseOver,
		EventCategory::MouseOut,
	];

	/// The DOM event type name.
	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			EventCategory::Click => "click",
			EventCategory::Input => "input",
			EventCategory::Submit => "submit",
			EventCategory::Change => "change",
			EventCategory::Focus => "focus",
			EventCategory::Blur => "blur",
			EventCategory::KeyDown => "keydown",
			EventCategory::KeyUp => "keyup",
			EventCategory::MouseOver => "mouseover",
			EventCategory::MouseOut => "mouseout",
		}
	}

	/// Resolves an attribute name like `onClick` to its category.
	///
	/// Returns [`None`] if the name doesn't carry the event prefix at all.
	pub fn from_attribute_name(name: &str) -> Option<Result<Self, UnsupportedEventCategory>> {
		let prefix = name.get(..EVENT_PREFIX.len())?;
		if !prefix.eq_ignore_ascii_case(EVENT_PREFIX) {
			return None;
		}
		Some(name[EVENT_PREFIX.len()..].parse())
	}
}

impl FromStr for EventCategory {
	type Err = UnsupportedEventCategory;

	/// Case-insensitive.
	fn from_str(name: &str) -> Result<Self, Self::Err> {
		EventCategory::ALL
			.iter()
			.copied()
			.find(|category| category.as_str().eq_ignore_ascii_case(name))
			.ok_or_else(|| UnsupportedEventCategory(name.to_ascii_lowercase()))
	}
}

/// What a [`Handler`] receives.
#[derive(Debug)]
pub struct Event {
	pub category: EventCategory,
	pub target: NodeId,
	/// The live value of the target, if it is a form control.
	pub value: Option<String>,
	default_prevented: Cell<bool>,
}

impl Event {
	#[must_use]
	pub fn new(category: EventCategory, target: NodeId, value: Option<String>) -> Self {
		Self {
			category,
			target,
			value,
			default_prevented: Cell::new(false),
		}
	}

	/// Asks the presentation layer to skip the default action (e.g. form submission navigation).
	pub fn prevent_default(&self) {
		self.default_prevented.set(true)
	}

	#[must_use]
	pub fn default_prevented(&self) -> bool {
		self.default_prevented.get()
	}
}

/// An event handler, compared by identity.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&Event)>);

impl Handler {
	pub fn new(handler: impl 'static + Fn(&Event)) -> Self {
		Self(Rc::new(handler))
	}

	pub fn call(&self, event: &Event) {
		(self.0)(event)
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::as_ptr(&self.0).cast::<()>() == Rc::as_ptr(&other.0).cast::<()>()
	}
}

impl Debug for Handler {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Handler").field(&Rc::as_ptr(&self.0).cast::<()>()).finish()
	}
}

impl PartialEq for Handler {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}
