//! Signal - Fine-grained Reactive Primitive
//!
//! `Signal<T>` is the core reactive primitive: a value cell that records
//! who reads it and notifies those readers when it is written.
//!
//! ## Key Features
//!
//! - **Automatic Dependency Tracking**: A `get()` inside a running effect
//!   subscribes that effect to the signal.
//! - **Synchronous Notification**: A `set()` outside a batch re-runs the
//!   subscribed effects before it returns; inside a batch the runs are
//!   deferred to the outermost batch end and coalesced.
//! - **No Equality Short-circuit**: Every write notifies, even when the new
//!   value equals the old one.
//! - **Cheap Handles**: Clones share one value cell; the last clone to drop
//!   removes the signal from the runtime.
//!
//! ## Example
//!
//! ```ignore
//! use ripple_core::reactive::Signal;
//!
//! let count = Signal::new(0);
//! assert_eq!(count.get(), 0);
//!
//! count.set(42);
//! assert_eq!(count.get(), 42);
//!
//! count.update(|n| *n += 1);
//! assert_eq!(count.get(), 43);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::effect::EffectError;
use super::runtime::{NodeId, try_with_runtime, with_runtime};

/// A reactive value cell with subscriber tracking.
///
/// ## Cloning
///
/// `Signal<T>` is a handle: clones share the same `Rc<RefCell<T>>` value
/// and the same runtime node. Read and write sides are not split; any
/// clone may do either.
pub struct Signal<T: 'static> {
	/// Unique identifier for this signal within the runtime.
	id: NodeId,
	/// The value, shared between clones.
	value: Rc<RefCell<T>>,
}

impl<T: 'static> Signal<T> {
	/// Creates a new signal holding `value`.
	pub fn new(value: T) -> Self {
		Self {
			id: NodeId::new(),
			value: Rc::new(RefCell::new(value)),
		}
	}

	/// Returns the current value, subscribing the running effect (if any).
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		with_runtime(|rt| rt.track_dependency(self.id));
		self.peek()
	}

	/// Returns the current value without tracking a dependency.
	pub fn peek(&self) -> T
	where
		T: Clone,
	{
		self.value.borrow().clone()
	}

	/// Alias for [`peek`](Self::peek), under the name the hook-style API
	/// uses.
	pub fn get_untracked(&self) -> T
	where
		T: Clone,
	{
		self.peek()
	}

	/// Runs a closure against a borrow of the current value, subscribing
	/// the running effect (if any). Useful when `T` is expensive to clone.
	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		with_runtime(|rt| rt.track_dependency(self.id));
		f(&self.value.borrow())
	}

	/// Replaces the value and notifies subscribers.
	///
	/// Outside a batch the subscribed effects run before `set` returns. An
	/// effect failure that no error boundary absorbs is logged and
	/// dropped; use [`try_set`](Self::try_set) to observe it.
	pub fn set(&self, value: T) {
		if let Err(err) = self.try_set(value) {
			crate::error_log!("uncaught {} after signal write", err);
		}
	}

	/// Replaces the value and notifies subscribers, surfacing the first
	/// uncaught effect failure.
	pub fn try_set(&self, value: T) -> Result<(), EffectError> {
		*self.value.borrow_mut() = value;
		with_runtime(|rt| rt.notify_signal_change(self.id))
	}

	/// Mutates the value in place and notifies subscribers once.
	pub fn update<F>(&self, f: F)
	where
		F: FnOnce(&mut T),
	{
		if let Err(err) = self.try_update(f) {
			crate::error_log!("uncaught {} after signal update", err);
		}
	}

	/// Mutates the value in place and notifies subscribers once, surfacing
	/// the first uncaught effect failure.
	pub fn try_update<F>(&self, f: F) -> Result<(), EffectError>
	where
		F: FnOnce(&mut T),
	{
		f(&mut self.value.borrow_mut());
		with_runtime(|rt| rt.notify_signal_change(self.id))
	}

	/// The signal's node id. Mainly for the runtime and tests.
	pub fn id(&self) -> NodeId {
		self.id
	}
}

impl<T: 'static> Clone for Signal<T> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			value: Rc::clone(&self.value),
		}
	}
}

impl<T: 'static> Drop for Signal<T> {
	fn drop(&mut self) {
		// Only the last clone removes the node from the runtime.
		if Rc::strong_count(&self.value) == 1 {
			let _ = try_with_runtime(|rt| rt.remove_node(self.id));
		}
	}
}

impl<T: fmt::Debug + 'static> fmt::Debug for Signal<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Signal")
			.field("id", &self.id)
			.field("value", &*self.value.borrow())
			.finish()
	}
}
