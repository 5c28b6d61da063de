//! The reconciler.
//!
//! Every container and every component activation keeps an ordered list of [`Mounted`] entries that mirrors the live nodes it owns.
//! A new tree is flattened (fragments are spliced into their parent) and paired with that list by position:
//!
//! - text against text updates the text in place,
//! - an element against an element with the same tag is patched in place (children first, then attributes),
//! - a component against an activation of the same component re-renders that activation with the new props,
//! - the same raw node is kept,
//! - anything else is replaced: the new subtree is built detached and only spliced in once it is complete.
//!
//! Extra old entries are removed and unmounted, extra new entries are inserted after the last paired one.
//!
//! Live nodes are verified before they are patched. Unexpected live content is logged as an error and recreated.
//!
//! Each render runs in two passes. The first pairs the lists and invokes every component that will render, without touching live nodes.
//! Only if all of them succeed does the second pass apply the result, which can't fail, so a failing component leaves the presentation as it was.

use crate::{
	bind::Binder,
	component::{Component, ComponentRef, Props},
	content,
	dom::{Dom, NodeId},
	error::{Error, FlushError},
	hooks::HookScope,
	scheduler::{Microtasks, Scheduler},
	tree::{Attributes, Child, Kind, RawNode, TreeNode},
};
use core::{
	any::TypeId,
	cell::{Cell, Ref, RefCell, RefMut},
	fmt::{self, Debug, Display, Formatter},
	mem, slice,
};
use hashbrown::HashMap;
use std::rc::{Rc, Weak};
use tracing::{error, info, instrument, trace, trace_span};

/// Identifies one component activation of a [`Runtime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActivationId(u64);

impl Display for ActivationId {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "activation {}", self.0)
	}
}

/// One mounted instance of a component.
///
/// Its identity is structural: the same component at the same flattened position under the same parent node (and owning activation)
/// keeps its activation, and thereby its state, across renders.
struct Activation {
	id: ActivationId,
	owner: Option<ActivationId>,
	component_id: TypeId,
	component: RefCell<Component>,
	props: RefCell<Props>,
	hooks: Rc<HookScope>,
	/// Set once its output is placed.
	parent: Cell<Option<NodeId>>,
	/// Never empty once mounted.
	output: RefCell<Vec<Mounted>>,
	last_committed: RefCell<Option<Child>>,
	rendered_in: Cell<u64>,
	unmounted: Cell<bool>,
}

impl Activation {
	fn first_node(&self) -> Option<NodeId> {
		self.output.borrow().first()?.first_node()
	}

	fn last_node(&self) -> Option<NodeId> {
		self.output.borrow().last()?.last_node()
	}
}

impl Debug for Activation {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Activation")
			.field("id", &self.id)
			.field("owner", &self.owner)
			.field("component", &self.component.borrow().name())
			.field("parent", &self.parent)
			.field("state_cells", &self.hooks.cell_count())
			.field("unmounted", &self.unmounted.get())
			.finish()
	}
}

/// Committed bookkeeping for one flattened position.
#[derive(Debug)]
enum Mounted {
	Text { node: NodeId },
	Element { node: NodeId, tag: String, children: Vec<Mounted> },
	Component(Rc<Activation>),
	/// Adopted, so detached on removal but never released.
	Raw { node: NodeId, raw: RawNode },
}

impl Mounted {
	fn first_node(&self) -> Option<NodeId> {
		match self {
			Mounted::Text { node } | Mounted::Element { node, .. } | Mounted::Raw { node, .. } => Some(*node),
			Mounted::Component(activation) => activation.first_node(),
		}
	}

	fn last_node(&self) -> Option<NodeId> {
		match self {
			Mounted::Text { node } | Mounted::Element { node, .. } | Mounted::Raw { node, .. } => Some(*node),
			Mounted::Component(activation) => activation.last_node(),
		}
	}

	/// The live nodes this entry places directly into its parent.
	fn top_level_nodes(&self, nodes: &mut Vec<NodeId>) {
		match self {
			Mounted::Text { node } | Mounted::Element { node, .. } | Mounted::Raw { node, .. } => nodes.push(*node),
			Mounted::Component(activation) => {
				for entry in activation.output.borrow().iter() {
					entry.top_level_nodes(nodes)
				}
			}
		}
	}
}

/// A child list entry after fragments were spliced in.
enum Flat<'a> {
	Text(String),
	Element { tag: &'a str, tree: &'a TreeNode },
	Component(&'a ComponentRef),
	Raw(&'a RawNode),
}

fn flatten<'a>(children: &'a [Child], flat: &mut Vec<Flat<'a>>) {
	for child in children {
		match child {
			Child::Node(tree) => match &tree.kind {
				Kind::Fragment => flatten(&tree.children, flat),
				Kind::Element(tag) => flat.push(Flat::Element { tag, tree }),
			},
			Child::Text(primitive) => flat.push(Flat::Text(primitive.to_string())),
			Child::Component(reference) => flat.push(Flat::Component(reference)),
			Child::Raw(raw) => flat.push(Flat::Raw(raw)),
		}
	}
}

/// A flattened position after pairing, with its components already invoked.
#[derive(Debug)]
enum Resolved {
	Text { text: String, reuse: bool },
	Element { tag: String, attributes: Attributes, children: Vec<Resolved>, reuse: bool },
	Component(Box<Rendered>),
	Raw { raw: RawNode, reuse: bool },
}

/// Output of one activation that isn't committed yet.
#[derive(Debug)]
struct Rendered {
	activation: Rc<Activation>,
	fresh: bool,
	component: Component,
	props: Props,
	child: Child,
	output: Vec<Resolved>,
}

/// A component's output always places at least one node, which anchors it in its parent.
fn flatten_output(output: &Child) -> Vec<Flat<'_>> {
	let mut flat = Vec::new();
	flatten(slice::from_ref(output), &mut flat);
	if flat.is_empty() {
		flat.push(Flat::Text(String::new()))
	}
	flat
}

/// Renders trees into containers of a [`Dom`] and keeps them updated.
///
/// Clones share the same state.
pub struct Runtime<D: Dom + 'static>(Rc<RuntimeInner<D>>);

impl<D: Dom + 'static> Clone for Runtime<D> {
	fn clone(&self) -> Self {
		Self(Rc::clone(&self.0))
	}
}

struct RuntimeInner<D: Dom + 'static> {
	this: Weak<RuntimeInner<D>>,
	dom: RefCell<D>,
	binder: RefCell<Binder>,
	activations: RefCell<HashMap<ActivationId, Weak<Activation>>>,
	roots: RefCell<HashMap<NodeId, Vec<Mounted>>>,
	scheduler: Scheduler<ActivationId>,
	next_activation: Cell<u64>,
	flush_epoch: Cell<u64>,
}

impl<D: Dom + 'static> Runtime<D> {
	/// Creates a runtime that renders into `dom` and defers scheduled re-renders to `microtasks`.
	pub fn new(dom: D, microtasks: impl 'static + Microtasks) -> Self {
		Self(Rc::new_cyclic(|this| RuntimeInner {
			this: this.clone(),
			dom: RefCell::new(dom),
			binder: RefCell::default(),
			activations: RefCell::default(),
			roots: RefCell::default(),
			scheduler: Scheduler::new(microtasks),
			next_activation: Cell::new(1),
			flush_epoch: Cell::new(0),
		}))
	}

	/// Mounts `child` into `container`, or updates what a previous call mounted there.
	///
	/// Multi-root results are placed as direct children of `container`, after any content that was there before the first call.
	///
	/// # Errors
	///
	/// Iff a component fails to render, in which case nothing in `container` changes.
	#[instrument(skip(self, child))]
	pub fn render(&self, child: impl Into<Child>, container: NodeId) -> Result<(), Error> {
		let child = child.into();
		let mut flat = Vec::new();
		flatten(slice::from_ref(&child), &mut flat);

		let mut mounted = self.0.roots.borrow_mut().remove(&container).unwrap_or_default();
		let mut fresh = Vec::new();
		let result = self
			.0
			.resolve_list(&mounted, &flat, None, &mut fresh)
			.map(|resolved| self.0.apply_list(container, &mut mounted, resolved, None));
		if result.is_err() {
			self.0.discard(fresh)
		}
		drop(flat);
		if !mounted.is_empty() {
			self.0.roots.borrow_mut().insert(container, mounted);
		}

		info!("Bound event listener count: {}", self.0.binder.borrow().listener_count());
		result
	}

	/// Renders `component` with `props` as the sole content of `container`.
	///
	/// # Errors
	///
	/// See [`render`](`Runtime::render`).
	pub fn render_component(&self, component: &Component, container: NodeId, props: Props) -> Result<(), Error> {
		self.render(
			ComponentRef {
				component: component.clone(),
				props,
			},
			container,
		)
	}

	/// Removes everything rendered into `container`, destroying its activations and detaching their listeners.
	///
	/// Setters of the destroyed activations become no-ops.
	/// Returns whether anything was mounted there.
	#[instrument(skip(self))]
	pub fn unmount(&self, container: NodeId) -> bool {
		let mounted = self.0.roots.borrow_mut().remove(&container);
		match mounted {
			Some(mounted) => {
				for entry in mounted {
					self.0.detach(container, &entry);
					self.0.unmount_entry(entry);
				}
				true
			}
			None => false,
		}
	}

	/// Runs all pending re-renders now instead of waiting for the armed microtask.
	///
	/// Returns how many activations were rendered.
	///
	/// # Errors
	///
	/// Lists every activation that failed to render. All other pending activations are rendered regardless.
	pub fn flush(&self) -> Result<usize, FlushError> {
		self.0.flush()
	}

	/// Whether a flush is currently armed.
	#[must_use]
	pub fn has_pending_updates(&self) -> bool {
		self.0.scheduler.is_armed()
	}

	/// Borrows the presentation layer.
	///
	/// # Panics
	///
	/// Iff the presentation layer is currently mutably borrowed, which is the case while rendering.
	#[must_use]
	pub fn dom(&self) -> Ref<'_, D> {
		self.0.dom.borrow()
	}

	/// Mutably borrows the presentation layer.
	///
	/// Don't change nodes that this runtime mounted, as that would make their bookkeeping go stale.
	///
	/// # Panics
	///
	/// Iff the presentation layer is currently borrowed.
	#[must_use]
	pub fn dom_mut(&self) -> RefMut<'_, D> {
		self.0.dom.borrow_mut()
	}

	/// The live activations, in creation order.
	#[must_use]
	pub fn activations(&self) -> Vec<ActivationId> {
		let mut ids: Vec<_> = self.0.activations.borrow().keys().copied().collect();
		ids.sort_unstable();
		ids
	}

	/// The tree `activation` produced during its last successful render.
	#[must_use]
	pub fn committed(&self, activation: ActivationId) -> Option<Child> {
		let activation = self.0.activations.borrow().get(&activation).and_then(Weak::upgrade)?;
		let committed = activation.last_committed.borrow().clone();
		committed
	}

	/// How many event listeners are currently bound.
	#[must_use]
	pub fn listener_count(&self) -> usize {
		self.0.binder.borrow().listener_count()
	}
}

impl<D: Dom + 'static> Debug for Runtime<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Runtime")
			.field("roots", &self.0.roots.borrow().len())
			.field("activations", &self.0.activations.borrow().len())
			.field("scheduler", &self.0.scheduler)
			.finish_non_exhaustive()
	}
}

impl<D: Dom + 'static> RuntimeInner<D> {
	fn schedule_update(&self, id: ActivationId) {
		if !self.activations.borrow().contains_key(&id) {
			return trace!("{} is unmounted; Ignoring update request.", id);
		}
		let this = self.this.clone();
		self.scheduler.schedule(id, move || {
			Box::new(move || {
				if let Some(this) = this.upgrade() {
					if let Err(error) = this.flush() {
						error!("{}", error)
					}
				}
			}) as Box<dyn FnOnce()>
		});
	}

	#[instrument(skip(self))]
	fn flush(&self) -> Result<usize, FlushError> {
		let pending = self.scheduler.take_pending();
		let epoch = self.flush_epoch.get() + 1;
		self.flush_epoch.set(epoch);

		let mut rendered = 0;
		let mut failures = Vec::new();
		for id in pending {
			let activation = self.activations.borrow().get(&id).and_then(Weak::upgrade);
			let activation = match activation {
				Some(activation) if !activation.unmounted.get() => activation,
				_ => {
					trace!("{} was unmounted before the flush reached it.", id);
					continue;
				}
			};
			if activation.rendered_in.get() == epoch {
				trace!("{} was already rendered during this flush.", id);
				continue;
			}

			match self.render_activation(&activation) {
				Ok(()) => rendered += 1,
				Err(error) => {
					error!("Failed to re-render {} ({}): {}", id, activation.component.borrow().name(), error);
					failures.push((id, error));
				}
			}
		}

		info!("Flushed {} activation(s).", rendered);
		if failures.is_empty() {
			Ok(rendered)
		} else {
			Err(FlushError { failures })
		}
	}

	/// Pairs `mounted` (the committed entries of one list) with `next` by position and invokes every component that will be rendered.
	///
	/// Nothing live is touched. Activations created on the way are collected into `fresh` so that they can be discarded if a later position fails.
	fn resolve_list(&self, mounted: &[Mounted], next: &[Flat<'_>], owner: Option<ActivationId>, fresh: &mut Vec<Rc<Activation>>) -> Result<Vec<Resolved>, Error> {
		next.iter()
			.enumerate()
			.map(|(i, next)| self.resolve(mounted.get(i), next, owner, fresh))
			.collect()
	}

	fn resolve(&self, entry: Option<&Mounted>, next: &Flat<'_>, owner: Option<ActivationId>, fresh: &mut Vec<Rc<Activation>>) -> Result<Resolved, Error> {
		match (entry, next) {
			(Some(Mounted::Text { node }), Flat::Text(text)) => {
				let reuse = self.dom.borrow().text(*node).is_some();
				if !reuse {
					error!("Expected to update a text node but found an element at {}; Recreating the node.", node)
				}
				Ok(Resolved::Text { text: text.clone(), reuse })
			}

			(Some(Mounted::Element { node, tag, children }), Flat::Element { tag: next_tag, tree }) if tag.as_str() == *next_tag => {
				let live = self.dom.borrow().tag_name(*node);
				if live.as_deref().map_or(false, |live| live.eq_ignore_ascii_case(tag)) {
					return self.resolve_element(tag, tree, children, true, owner, fresh);
				}
				error!("Expected to update <{}> but found {:?} at {}; Recreating the element.", tag, live, node);
				self.resolve_element(tag, tree, &[], false, owner, fresh)
			}

			(Some(Mounted::Component(activation)), Flat::Component(reference)) if activation.component_id == reference.component.id() => {
				let rendered = self.render_output(activation, reference.component.clone(), reference.props.clone(), false, fresh)?;
				Ok(Resolved::Component(Box::new(rendered)))
			}

			(Some(Mounted::Raw { raw, .. }), Flat::Raw(next_raw)) => Ok(Resolved::Raw {
				raw: (*next_raw).clone(),
				reuse: raw.ptr_eq(next_raw),
			}),

			(_, Flat::Text(text)) => Ok(Resolved::Text { text: text.clone(), reuse: false }),
			(_, Flat::Element { tag, tree }) => self.resolve_element(tag, tree, &[], false, owner, fresh),
			(_, Flat::Component(reference)) => {
				let activation = self.create_activation(reference, owner);
				fresh.push(Rc::clone(&activation));
				let rendered = self.render_output(&activation, reference.component.clone(), reference.props.clone(), true, fresh)?;
				Ok(Resolved::Component(Box::new(rendered)))
			}
			(_, Flat::Raw(raw)) => Ok(Resolved::Raw { raw: (*raw).clone(), reuse: false }),
		}
	}

	fn resolve_element(&self, tag: &str, tree: &TreeNode, mounted: &[Mounted], reuse: bool, owner: Option<ActivationId>, fresh: &mut Vec<Rc<Activation>>) -> Result<Resolved, Error> {
		let mut flat = Vec::new();
		flatten(&tree.children, &mut flat);
		let children = self.resolve_list(mounted, &flat, owner, fresh)?;
		Ok(Resolved::Element {
			tag: tag.to_owned(),
			attributes: tree.attributes.clone(),
			children,
			reuse,
		})
	}

	/// Invokes `activation` with `component` and `props` and resolves its output against what it currently has mounted.
	fn render_output(&self, activation: &Rc<Activation>, component: Component, props: Props, is_fresh: bool, fresh: &mut Vec<Rc<Activation>>) -> Result<Rendered, Error> {
		let span = trace_span!("Rendering activation", id = %activation.id, component = component.name());
		let _enter = span.enter();

		let child = activation.hooks.render(|| component.invoke(&props))?;
		let flat = flatten_output(&child);
		let output = {
			let mounted = activation.output.borrow();
			self.resolve_list(&mounted, &flat, Some(activation.id), fresh)?
		};
		drop(flat);

		Ok(Rendered {
			activation: Rc::clone(activation),
			fresh: is_fresh,
			component,
			props,
			child,
			output,
		})
	}

	fn create_activation(&self, reference: &ComponentRef, owner: Option<ActivationId>) -> Rc<Activation> {
		let id = ActivationId(self.next_activation.get());
		self.next_activation.set(id.0 + 1);
		trace!("Creating {} ({}).", id, reference.component.name());

		let this = self.this.clone();
		let request_update: Rc<dyn Fn()> = Rc::new(move || {
			if let Some(this) = this.upgrade() {
				this.schedule_update(id)
			}
		});
		let activation = Rc::new(Activation {
			id,
			owner,
			component_id: reference.component.id(),
			component: RefCell::new(reference.component.clone()),
			props: RefCell::new(reference.props.clone()),
			hooks: Rc::new(HookScope::new(format!("{} ({})", reference.component.name(), id), request_update)),
			parent: Cell::new(None),
			output: RefCell::default(),
			last_committed: RefCell::default(),
			rendered_in: Cell::new(self.flush_epoch.get()),
			unmounted: Cell::new(false),
		});
		self.activations.borrow_mut().insert(id, Rc::downgrade(&activation));
		activation
	}

	/// Destroys activations that were created for a render that failed before anything was committed.
	fn discard(&self, fresh: Vec<Rc<Activation>>) {
		for activation in fresh {
			self.unmount_activation(&activation)
		}
	}

	/// Re-renders a mounted activation in place, or leaves it entirely as it was if any part of its output fails.
	fn render_activation(&self, activation: &Rc<Activation>) -> Result<(), Error> {
		let component = activation.component.borrow().clone();
		let props = activation.props.borrow().clone();

		let mut fresh = Vec::new();
		match self.render_output(activation, component, props, false, &mut fresh) {
			Ok(rendered) => {
				self.commit(rendered);
				Ok(())
			}
			Err(error) => {
				self.discard(fresh);
				Err(error)
			}
		}
	}

	/// Applies `next` to `mounted` (one list under `parent`).
	///
	/// `tail` is the live node that follows the list, if any.
	fn apply_list(&self, parent: NodeId, mounted: &mut Vec<Mounted>, mut next: Vec<Resolved>, tail: Option<NodeId>) {
		let common = mounted.len().min(next.len());
		let added = next.split_off(common);
		for (entry, next) in mounted.iter_mut().zip(next) {
			self.apply(parent, entry, next)
		}

		for removed in mounted.drain(common..) {
			let span = trace_span!("Removing", ?removed);
			let _enter = span.enter();
			self.detach(parent, &removed);
			self.unmount_entry(removed);
		}

		for next in added {
			let added = self.build(parent, next);
			self.insert(parent, &added, tail);
			mounted.push(added);
		}
	}

	fn apply(&self, parent: NodeId, entry: &mut Mounted, next: Resolved) {
		let next = match (&mut *entry, next) {
			(Mounted::Text { node }, Resolved::Text { text, reuse: true }) => {
				let span = trace_span!("Diffing text", %node, text = ?content(&text));
				let _enter = span.enter();
				if self.dom.borrow().text(*node).as_deref() != Some(text.as_str()) {
					trace!("Updating text.");
					self.dom.borrow_mut().set_text(*node, &text)
				}
				return;
			}

			(
				Mounted::Element { node, tag, children },
				Resolved::Element {
					attributes,
					children: next_children,
					reuse: true,
					..
				},
			) => {
				let span = trace_span!("Diffing element", %node, tag = %tag);
				let _enter = span.enter();
				self.apply_list(*node, children, next_children, None);
				self.binder.borrow_mut().apply_attributes(&mut *self.dom.borrow_mut(), *node, tag, &attributes);
				return;
			}

			(Mounted::Component(activation), Resolved::Component(rendered)) if !rendered.fresh && Rc::ptr_eq(activation, &rendered.activation) => {
				let span = trace_span!("Diffing component", id = %activation.id);
				let _enter = span.enter();
				return self.commit(*rendered);
			}

			(Mounted::Raw { .. }, Resolved::Raw { reuse: true, .. }) => return,

			(_, next) => next,
		};
		self.replace(parent, entry, next)
	}

	fn replace(&self, parent: NodeId, entry: &mut Mounted, next: Resolved) {
		let span = trace_span!("Replacing", ?entry);
		let _enter = span.enter();
		let replacement = self.build(parent, next);
		self.insert(parent, &replacement, entry.first_node());
		let replaced = mem::replace(entry, replacement);
		self.detach(parent, &replaced);
		self.unmount_entry(replaced);
	}

	/// Applies the output of an activation that is already mounted.
	fn commit(&self, rendered: Rendered) {
		let Rendered {
			activation,
			component,
			props,
			child,
			output,
			..
		} = rendered;
		let parent = match activation.parent.get() {
			Some(parent) => parent,
			None => return error!("{} was never placed; Skipping its commit.", activation.id),
		};

		let tail = activation.last_node().and_then(|last| self.dom.borrow().next_sibling(last));
		*activation.component.borrow_mut() = component;
		*activation.props.borrow_mut() = props;

		let mut mounted = activation.output.take();
		self.apply_list(parent, &mut mounted, output, tail);
		*activation.output.borrow_mut() = mounted;

		*activation.last_committed.borrow_mut() = Some(child);
		activation.rendered_in.set(self.flush_epoch.get());
	}

	/// Builds a detached subtree for `next`, which will be placed under `parent`.
	fn build(&self, parent: NodeId, next: Resolved) -> Mounted {
		match next {
			Resolved::Text { text, .. } => {
				let span = trace_span!("Creating text node", text = ?content(&text));
				let _enter = span.enter();
				let node = self.dom.borrow_mut().create_text_node(&text);
				Mounted::Text { node }
			}

			Resolved::Element { tag, attributes, children, .. } => {
				let span = trace_span!("Creating element", tag = %tag);
				let _enter = span.enter();
				let node = self.dom.borrow_mut().create_element(&tag);

				let mut mounted = Vec::with_capacity(children.len());
				for next in children {
					let child = self.build(node, next);
					self.insert(node, &child, None);
					mounted.push(child);
				}

				self.binder.borrow_mut().apply_attributes(&mut *self.dom.borrow_mut(), node, &tag, &attributes);
				Mounted::Element { node, tag, children: mounted }
			}

			Resolved::Component(rendered) => {
				let Rendered { activation, child, output, .. } = *rendered;
				let span = trace_span!("Placing activation", id = %activation.id);
				let _enter = span.enter();

				activation.parent.set(Some(parent));
				let mounted = output.into_iter().map(|next| self.build(parent, next)).collect();
				*activation.output.borrow_mut() = mounted;
				*activation.last_committed.borrow_mut() = Some(child);
				Mounted::Component(activation)
			}

			Resolved::Raw { raw, .. } => {
				let node = self.dom.borrow_mut().adopt(&raw);
				match node {
					Some(node) => Mounted::Raw { node, raw },
					None => {
						error!("Could not adopt {:?}; Substituting an empty text node.", raw);
						let node = self.dom.borrow_mut().create_text_node("");
						Mounted::Text { node }
					}
				}
			}
		}
	}
	fn insert(&self, parent: NodeId, entry: &Mounted, before: Option<NodeId>) {
		let mut nodes = Vec::new();
		entry.top_level_nodes(&mut nodes);
		let mut dom = self.dom.borrow_mut();
		for node in nodes {
			dom.insert_before(parent, node, before)
		}
	}

	fn detach(&self, parent: NodeId, entry: &Mounted) {
		let mut nodes = Vec::new();
		entry.top_level_nodes(&mut nodes);
		let mut dom = self.dom.borrow_mut();
		for node in nodes {
			dom.remove_child(parent, node)
		}
	}

	/// Releases a detached entry and everything beneath it.
	fn unmount_entry(&self, entry: Mounted) {
		match entry {
			Mounted::Text { node } => self.dom.borrow_mut().release(node),
			Mounted::Element { node, children, .. } => {
				for child in children {
					self.unmount_entry(child)
				}
				self.binder.borrow_mut().forget(&mut *self.dom.borrow_mut(), node);
				self.dom.borrow_mut().release(node)
			}
			Mounted::Component(activation) => self.unmount_activation(&activation),
			Mounted::Raw { .. } => (),
		}
	}

	fn unmount_activation(&self, activation: &Rc<Activation>) {
		trace!("Unmounting {}.", activation.id);
		activation.unmounted.set(true);
		self.activations.borrow_mut().remove(&activation.id);
		for entry in activation.output.take() {
			self.unmount_entry(entry)
		}
	}
}
