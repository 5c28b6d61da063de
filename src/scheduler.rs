//! Coalesces update requests into one deferred flush.

use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
	hash::Hash,
};
use hashbrown::HashSet;
use std::{collections::VecDeque, rc::Rc};
use tracing::{instrument, trace};

/// The deferral boundary: a task queued here runs after the current synchronous turn, before any other event.
pub trait Microtasks {
	fn queue_microtask(&self, task: Box<dyn FnOnce()>);
}

/// A [`Microtasks`] queue that only runs when asked to.
///
/// Clones share the same queue.
#[derive(Clone, Default)]
pub struct ManualMicrotasks(Rc<RefCell<VecDeque<Box<dyn FnOnce()>>>>);

impl ManualMicrotasks {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// How many tasks are waiting.
	#[must_use]
	pub fn pending(&self) -> usize {
		self.0.borrow().len()
	}

	/// Runs queued tasks in FIFO order, including any they queue themselves, until none are left.
	///
	/// Returns how many tasks ran.
	#[instrument(skip(self))]
	pub fn run_until_idle(&self) -> usize {
		let mut count = 0;
		loop {
			let task = self.0.borrow_mut().pop_front();
			match task {
				Some(task) => task(),
				None => break,
			}
			count += 1;
		}
		trace!("Ran {} microtask(s).", count);
		count
	}
}

impl Microtasks for ManualMicrotasks {
	fn queue_microtask(&self, task: Box<dyn FnOnce()>) {
		self.0.borrow_mut().push_back(task)
	}
}

impl Debug for ManualMicrotasks {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ManualMicrotasks").field("pending", &self.pending()).finish()
	}
}

/// A deduplicating pending set with a single armed flush.
///
/// The first request in an idle period queues one microtask.
/// Further requests before that microtask runs are absorbed, each key at most once, in insertion order.
pub struct Scheduler<K> {
	microtasks: Box<dyn Microtasks>,
	queue: RefCell<Vec<K>>,
	pending: RefCell<HashSet<K>>,
	armed: Cell<bool>,
}

impl<K: Copy + Eq + Hash + Debug> Scheduler<K> {
	pub fn new(microtasks: impl 'static + Microtasks) -> Self {
		Self {
			microtasks: Box::new(microtasks),
			queue: RefCell::default(),
			pending: RefCell::default(),
			armed: Cell::new(false),
		}
	}

	/// Marks `key` as pending.
	///
	/// If no flush is armed yet, `flush` is called to create the task that is then queued as a microtask.
	/// Returns whether `key` was newly added.
	#[instrument(skip(self, flush))]
	pub fn schedule(&self, key: K, flush: impl FnOnce() -> Box<dyn FnOnce()>) -> bool {
		if !self.pending.borrow_mut().insert(key) {
			trace!("Already pending.");
			return false;
		}
		self.queue.borrow_mut().push(key);

		if !self.armed.replace(true) {
			trace!("Arming flush.");
			self.microtasks.queue_microtask(flush());
		}
		true
	}

	/// Takes the pending keys in insertion order and disarms.
	///
	/// Requests made after this call arm a new flush.
	pub fn take_pending(&self) -> Vec<K> {
		self.armed.set(false);
		self.pending.borrow_mut().clear();
		self.queue.take()
	}

	#[must_use]
	pub fn is_pending(&self, key: K) -> bool {
		self.pending.borrow().contains(&key)
	}

	#[must_use]
	pub fn is_armed(&self) -> bool {
		self.armed.get()
	}
}

impl<K: Debug> Debug for Scheduler<K> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Scheduler")
			.field("queue", &self.queue.borrow())
			.field("armed", &self.armed.get())
			.finish_non_exhaustive()
	}
}
