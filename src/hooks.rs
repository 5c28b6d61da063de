//! Positional state cells for component activations.
//!
//! Hooks find their activation through a thread-local slot that the reconciler sets around each component invocation.
//! The slot is restored on every exit path, including errors and panics, so nested component renders can't corrupt each other's cursor.
//!
//! The `n`th hook call of a render always maps to the `n`th cell.
//! Calling hooks conditionally or in a different order between renders mixes up their state.

use crate::error::Error;
use core::{
	any::{type_name, Any},
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
};
use std::rc::Rc;
use tracing::{trace, warn};

thread_local! {
	static CURRENT: RefCell<Option<Rc<HookScope>>> = RefCell::new(None);
}

/// The state cells of one component activation.
pub(crate) struct HookScope {
	label: String,
	cells: RefCell<Vec<Rc<dyn Any>>>,
	cursor: Cell<usize>,
	previous_count: Cell<Option<usize>>,
	request_update: Rc<dyn Fn()>,
}

impl HookScope {
	pub(crate) fn new(label: String, request_update: Rc<dyn Fn()>) -> Self {
		Self {
			label,
			cells: RefCell::default(),
			cursor: Cell::new(0),
			previous_count: Cell::new(None),
			request_update,
		}
	}

	/// Makes this scope current for the duration of `render`, with the cursor reset to the first cell.
	pub(crate) fn render<R>(self: &Rc<Self>, render: impl FnOnce() -> Result<R, Error>) -> Result<R, Error> {
		self.cursor.set(0);
		let result = {
			let _guard = ScopeGuard::enter(Rc::clone(self));
			render()
		};
		if result.is_ok() {
			self.check_cell_count();
		}
		result
	}

	fn check_cell_count(&self) {
		let count = self.cursor.get();
		if let Some(previous) = self.previous_count.replace(Some(count)) {
			if previous != count {
				warn!(
					"{} read {} state cell(s), but {} during its previous render. Hooks must be called unconditionally and in the same order.",
					self.label, count, previous
				)
			}
		}
	}

	pub(crate) fn cell_count(&self) -> usize {
		self.cells.borrow().len()
	}
}

impl Debug for HookScope {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("HookScope")
			.field("label", &self.label)
			.field("cells", &self.cells.borrow().len())
			.field("cursor", &self.cursor.get())
			.finish()
	}
}

/// Restores the previously current scope when dropped.
struct ScopeGuard {
	previous: Option<Rc<HookScope>>,
}

impl ScopeGuard {
	fn enter(scope: Rc<HookScope>) -> Self {
		Self {
			previous: CURRENT.with(|current| current.replace(Some(scope))),
		}
	}
}

impl Drop for ScopeGuard {
	fn drop(&mut self) {
		let previous = self.previous.take();
		CURRENT.with(|current| *current.borrow_mut() = previous);
	}
}

struct StateCell<T> {
	value: RefCell<T>,
	request_update: Rc<dyn Fn()>,
}

/// Returns the current value of the next state cell and its setter.
///
/// On the first render of an activation, the cell is created with `initial`.
/// Afterwards, `initial` is ignored and the committed value is returned instead.
///
/// # Errors
///
/// - [`Error::InvalidHookCall`] if no component is rendering.
/// - [`Error::HookTypeMismatch`] if this cell was created with a different type (hooks were called out of order).
pub fn use_state<T: Clone + PartialEq + 'static>(initial: T) -> Result<(T, Setter<T>), Error> {
	use_state_with(move || initial)
}

/// Like [`use_state`], but only computes the initial value when the cell is first created.
///
/// # Errors
///
/// See [`use_state`].
pub fn use_state_with<T: Clone + PartialEq + 'static>(initial: impl FnOnce() -> T) -> Result<(T, Setter<T>), Error> {
	let scope = CURRENT
		.with(|current| current.borrow().clone())
		.ok_or(Error::InvalidHookCall { hook: "use_state" })?;

	let index = scope.cursor.get();
	scope.cursor.set(index + 1);

	let existing = scope.cells.borrow().get(index).cloned();
	let cell = if let Some(cell) = existing {
		cell.downcast::<StateCell<T>>().map_err(|_| Error::HookTypeMismatch {
			index,
			expected: type_name::<T>(),
		})?
	} else {
		trace!(index, "Creating state cell");
		let cell = Rc::new(StateCell {
			value: RefCell::new(initial()),
			request_update: Rc::clone(&scope.request_update),
		});
		scope.cells.borrow_mut().push(Rc::clone(&cell) as Rc<dyn Any>);
		cell
	};

	let value = cell.value.borrow().clone();
	Ok((value, Setter(cell)))
}

/// Updates one state cell and schedules a re-render of its activation.
///
/// All setters returned for the same cell are the same setter (see [`ptr_eq`](`Setter::ptr_eq`)).
/// Once the activation is unmounted, setting a new value no longer schedules anything.
pub struct Setter<T>(Rc<StateCell<T>>);

impl<T: Clone + PartialEq> Setter<T> {
	/// Commits `value` and requests a re-render, unless `value` equals the current value.
	pub fn set(&self, value: T) {
		self.update(move |_| value)
	}

	/// Like [`set`](`Setter::set`), with the next value computed from the current one.
	pub fn update(&self, next: impl FnOnce(&T) -> T) {
		let previous = self.0.value.borrow().clone();
		let next = next(&previous);
		if next == previous {
			return trace!("State unchanged; Not scheduling an update.");
		}
		*self.0.value.borrow_mut() = next;
		(self.0.request_update)()
	}

	/// The current (possibly not yet rendered) value.
	#[must_use]
	pub fn get(&self) -> T {
		self.0.value.borrow().clone()
	}
}

impl<T> Setter<T> {
	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl<T> Clone for Setter<T> {
	fn clone(&self) -> Self {
		Self(Rc::clone(&self.0))
	}
}

impl<T> Debug for Setter<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Setter").field(&Rc::as_ptr(&self.0)).finish()
	}
}
