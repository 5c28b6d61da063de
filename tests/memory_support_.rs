#![allow(dead_code)]

use std::sync::Once;
use twig_dom::{Dom, ManualMicrotasks, MemoryDom, NodeId, Runtime};

static LOG_INIT: Once = Once::new();

pub fn init_logging() {
	LOG_INIT.call_once(|| {
		//TODO: Fail on Warning or Error where a test doesn't expect them.
		let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::TRACE).try_init();
	})
}

pub struct Harness {
	pub runtime: Runtime<MemoryDom>,
	pub microtasks: ManualMicrotasks,
	pub container: NodeId,
}

impl Harness {
	pub fn new() -> Self {
		init_logging();
		let mut dom = MemoryDom::new();
		let container = dom.create_container();
		let microtasks = ManualMicrotasks::new();
		Self {
			runtime: Runtime::new(dom, microtasks.clone()),
			microtasks,
			container,
		}
	}

	pub fn html(&self) -> String {
		self.runtime.dom().inner_html(self.container)
	}

	/// The first element with `tag` under the container, in document order.
	pub fn find(&self, tag: &str) -> NodeId {
		find(&*self.runtime.dom(), self.container, tag).unwrap_or_else(|| panic!("no <{}> in {}", tag, self.html()))
	}

	pub fn children(&self, node: NodeId) -> Vec<NodeId> {
		self.runtime.dom().child_nodes(node)
	}
}

pub fn find(dom: &MemoryDom, root: NodeId, tag: &str) -> Option<NodeId> {
	dom.child_nodes(root).into_iter().find_map(|child| {
		if dom.tag_name(child).as_deref() == Some(tag) {
			Some(child)
		} else {
			find(dom, child, tag)
		}
	})
}
