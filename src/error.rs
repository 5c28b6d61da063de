use crate::diff::ActivationId;

/// Errors that abort a render pass.
///
/// Structural mismatches between a previous and a next tree are never errors:
/// the reconciler resolves them by patching or replacing live nodes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// A hook was called while no component activation was rendering.
	#[error("`{hook}` must be called while a component is rendering")]
	InvalidHookCall { hook: &'static str },

	/// The state cell at `index` was created with a different type than requested.
	///
	/// This happens when hooks are called in a different order than during a previous render.
	#[error("state cell {index} does not hold a `{expected}` (were hooks called in a different order?)")]
	HookTypeMismatch { index: usize, expected: &'static str },

	/// A value that cannot be rendered was encountered where a child was expected.
	#[error("malformed tree: {found} cannot be rendered as a child")]
	MalformedTree { found: &'static str },

	/// The number of interpolation sites in a template didn't match the number of values.
	#[error("template has {placeholders} interpolation site(s) but {values} value(s) were supplied")]
	TemplateArity { placeholders: usize, values: usize },

	/// Raised by application component code.
	#[error("component failed: {message}")]
	Component { message: String },
}

impl Error {
	/// Creates an [`Error::Component`] from application code.
	pub fn component(message: impl Into<String>) -> Self {
		Self::Component { message: message.into() }
	}
}

/// An event-prefixed attribute named an event this crate can't bind.
///
/// This is recovered from locally: the binding is skipped with a warning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported event category {0:?}")]
pub struct UnsupportedEventCategory(pub String);

/// Re-renders that failed during one scheduler flush.
///
/// Each failing activation keeps its previously committed presentation;
/// the other activations of the same batch are rendered regardless.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{} scheduled re-render(s) failed{}", .failures.len(), list_failures(.failures))]
pub struct FlushError {
	pub failures: Vec<(ActivationId, Error)>,
}

fn list_failures(failures: &[(ActivationId, Error)]) -> String {
	failures.iter().map(|(activation, error)| format!("\n  {}: {}", activation, error)).collect()
}
