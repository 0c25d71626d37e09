//! Error taxonomy for the template compiler and the render/hydration pipeline.
//!
//! Every failure the render side of the runtime can report is a named kind in
//! [`RenderError`]. The textual form of each kind is stable within a release;
//! callers that need to branch should match on the variant, not the message.

use thiserror::Error;

/// Result type for template and render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors reported by the template compiler, the program builder, and the
/// mount/hydrate interpreters.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
	/// The number of dynamic values does not match the program's slot count.
	#[error("mismatched dynamic values: expected {expected}, found {found}")]
	MismatchedValues {
		/// Slots the template or program declares.
		expected: usize,
		/// Values the caller supplied.
		found: usize,
	},

	/// Template or render structure violation: unclosed tag, bad close
	/// order, stray placeholder braces, or a non-empty stack at end of
	/// input.
	#[error("invalid markup: {0}")]
	InvalidMarkup(String),

	/// A close op arrived without a matching open.
	#[error("stack underflow: {0}")]
	StackUnderflow(String),

	/// A portal target did not resolve, or hydration ran out of children.
	#[error("missing node: {0}")]
	MissingNode(String),

	/// Hydration found a node of the wrong kind.
	#[error("unexpected node: {0}")]
	UnexpectedNode(String),

	/// Hydration found a tag, hydration id, text, or marker payload that
	/// does not match the render program.
	#[error("hydration mismatch: {0}")]
	HydrationMismatch(String),

	/// The underlying allocator refused a request.
	///
	/// Rust's global allocator aborts instead of returning, so the core
	/// never constructs this variant itself; it exists so embedders
	/// surfacing host-side allocation failures have a stable kind to map
	/// onto.
	#[error("allocation failed")]
	AllocationFailed,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_mismatched_values_display() {
		let err = RenderError::MismatchedValues {
			expected: 2,
			found: 3,
		};
		assert_eq!(
			err.to_string(),
			"mismatched dynamic values: expected 2, found 3"
		);
	}

	#[test]
	fn test_invalid_markup_display() {
		let err = RenderError::InvalidMarkup("unclosed <div>".to_string());
		assert_eq!(err.to_string(), "invalid markup: unclosed <div>");
	}

	#[test]
	fn test_kinds_are_comparable() {
		assert_eq!(RenderError::AllocationFailed, RenderError::AllocationFailed);
		assert_ne!(
			RenderError::MissingNode("a".to_string()),
			RenderError::UnexpectedNode("a".to_string())
		);
	}
}
