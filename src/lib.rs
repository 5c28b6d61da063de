#![doc(html_root_url = "https://docs.rs/twig-dom/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! A tiny component renderer.
//!
//! Components are plain functions that describe their output with [`template!`] markup,
//! keep state through [`use_state`], and are mounted with [`Runtime::render`].
//! State changes are batched and re-rendered on the next microtask, patching the live tree in place.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod bind;
pub mod component;
pub mod diff;
pub mod dom;
pub mod error;
pub mod event;
pub mod hooks;
pub mod load;
pub mod memory;
pub mod scheduler;
pub mod template;
pub mod tree;
pub mod value;
pub mod web;

pub use crate::{
	component::{with_props, Component, ComponentRef, Props},
	diff::{ActivationId, Runtime},
	dom::{Dom, NodeId},
	error::{Error, FlushError, UnsupportedEventCategory},
	event::{Event, EventCategory, Handler},
	hooks::{use_state, use_state_with, Setter},
	memory::MemoryDom,
	scheduler::{ManualMicrotasks, Microtasks},
	tree::{AttrValue, Attributes, Child, Kind, Primitive, RawNode, StyleMap, TreeNode},
	value::Value,
	web::{WebDom, WindowMicrotasks},
};

use core::fmt::{self, Debug, Formatter};

/// Page content as it should appear in log messages.
///
/// Without the `"dangerous-logging"` feature, only its length is shown.
pub(crate) struct Content<'a>(&'a str);

pub(crate) fn content(text: &str) -> Content<'_> {
	Content(text)
}

impl Debug for Content<'_> {
	#[cfg(feature = "dangerous-logging")]
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		Debug::fmt(self.0, f)
	}

	#[cfg(not(feature = "dangerous-logging"))]
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "<{} bytes redacted>", self.0.len())
	}
}
