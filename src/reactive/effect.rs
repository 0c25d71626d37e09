//! Effect - Reactive Side Effects
//!
//! An `Effect` is a computation that re-runs automatically whenever one of
//! the signals it read during its previous run changes.
//!
//! ## Key Features
//!
//! - **Automatic Dependency Tracking**: Any `Signal::get` inside the
//!   callback records a dependency; the dependency set is rebuilt from
//!   scratch on every run, so stale dependencies are dropped.
//! - **Immediate First Run**: The callback runs once at creation time to
//!   capture its initial dependencies.
//! - **Convergent Self-Writes**: An effect that writes to one of its own
//!   dependencies is not re-entered; it is re-run exactly once after the
//!   current run returns.
//! - **Fallible Callbacks**: [`Effect::try_new`] accepts a callback that
//!   returns `Result`; failures are delivered to the topmost error
//!   boundary, or propagate out of the triggering write when no boundary is
//!   installed.
//!
//! ## Example
//!
//! ```ignore
//! use ripple_core::reactive::{Effect, Signal};
//!
//! let count = Signal::new(0);
//! let tracked = count.clone();
//! let _effect = Effect::new(move || {
//!     println!("count is now {}", tracked.get());
//! });
//!
//! count.set(1); // the effect re-runs synchronously
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::runtime::{NodeId, try_with_runtime, with_runtime};

/// An error produced by a failing effect callback.
///
/// Effect errors are user errors: the runtime never constructs them itself.
/// They are routed to the topmost error boundary, and bubble out of the
/// scheduler flush when no boundary is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectError {
	message: String,
}

impl EffectError {
	/// Creates an effect error with the given message.
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}

	/// The error message.
	pub fn message(&self) -> &str {
		&self.message
	}
}

impl fmt::Display for EffectError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "effect failed: {}", self.message)
	}
}

impl std::error::Error for EffectError {}

/// Result type for fallible effect callbacks.
pub type EffectResult = Result<(), EffectError>;

pub(crate) type EffectCallback = Box<dyn FnMut() -> EffectResult>;

/// Shared per-effect state. The runtime and the `Effect` handle both hold
/// an `Rc` to this.
pub(crate) struct EffectState {
	pub(crate) id: NodeId,
	pub(crate) callback: RefCell<EffectCallback>,
	/// Signals this effect subscribed to during its last run.
	pub(crate) subscriptions: RefCell<Vec<NodeId>>,
	pub(crate) is_running: Cell<bool>,
	pub(crate) needs_rerun: Cell<bool>,
	pub(crate) disposed: Cell<bool>,
}

/// A reactive side effect.
///
/// The handle owns the effect: dropping it disposes the effect, detaching
/// it from every signal and removing it from the scheduler queue.
pub struct Effect {
	state: Rc<EffectState>,
}

impl Effect {
	/// Creates an effect from an infallible callback and runs it once
	/// immediately.
	pub fn new<F>(mut f: F) -> Self
	where
		F: FnMut() + 'static,
	{
		Self::try_new(move || {
			f();
			Ok(())
		})
	}

	/// Creates an effect from a fallible callback and runs it once
	/// immediately.
	///
	/// If the initial run fails and no error boundary absorbs the failure,
	/// the error is logged and dropped; install a boundary first when the
	/// initial run can fail.
	pub fn try_new<F>(f: F) -> Self
	where
		F: FnMut() -> EffectResult + 'static,
	{
		let state = Rc::new(EffectState {
			id: NodeId::new(),
			callback: RefCell::new(Box::new(f)),
			subscriptions: RefCell::new(Vec::new()),
			is_running: Cell::new(false),
			needs_rerun: Cell::new(false),
			disposed: Cell::new(false),
		});
		with_runtime(|rt| rt.register_effect(Rc::clone(&state)));
		let effect = Self { state };
		effect.trigger();
		effect
	}

	/// Re-runs the effect now, logging an uncaught failure.
	pub fn trigger(&self) {
		if let Err(err) = self.try_trigger() {
			crate::error_log!("uncaught {}", err);
		}
	}

	/// Re-runs the effect now, surfacing an uncaught failure.
	///
	/// Calling this from inside the effect's own callback does not
	/// re-enter it; the effect runs once more after the current run
	/// returns.
	pub fn try_trigger(&self) -> EffectResult {
		with_runtime(|rt| rt.run_effect(&self.state))
	}

	/// Disposes the effect: no further callback runs, all subscriptions
	/// are cleared, and any queued trigger is skipped. Idempotent.
	pub fn dispose(&self) {
		with_runtime(|rt| rt.dispose_effect(self.state.id));
	}

	/// Whether the effect has been disposed.
	pub fn is_disposed(&self) -> bool {
		self.state.disposed.get()
	}

	/// The effect's node id. Mainly for the runtime and tests.
	pub fn id(&self) -> NodeId {
		self.state.id
	}
}

impl Drop for Effect {
	fn drop(&mut self) {
		if !self.state.disposed.get() {
			let _ = try_with_runtime(|rt| rt.dispose_effect(self.state.id));
		}
	}
}

impl fmt::Debug for Effect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Effect")
			.field("id", &self.state.id)
			.field("disposed", &self.state.disposed.get())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::reactive::Signal;
	use serial_test::serial;
	use std::cell::RefCell;
	use std::rc::Rc;

	#[test]
	#[serial]
	fn test_effect_runs_immediately() {
		let ran = Rc::new(Cell::new(false));
		let ran_clone = Rc::clone(&ran);
		let _effect = Effect::new(move || ran_clone.set(true));
		assert!(ran.get());
	}

	#[test]
	#[serial]
	fn test_effect_reruns_on_write() {
		let count = Signal::new(0);
		let seen = Rc::new(RefCell::new(Vec::new()));

		let tracked = count.clone();
		let log = Rc::clone(&seen);
		let _effect = Effect::new(move || {
			log.borrow_mut().push(tracked.get());
		});

		count.set(1);
		count.set(2);
		assert_eq!(*seen.borrow(), vec![0, 1, 2]);
	}

	#[test]
	#[serial]
	fn test_disposed_effect_does_not_run() {
		let count = Signal::new(0);
		let runs = Rc::new(Cell::new(0));

		let tracked = count.clone();
		let counter = Rc::clone(&runs);
		let effect = Effect::new(move || {
			let _ = tracked.get();
			counter.set(counter.get() + 1);
		});
		assert_eq!(runs.get(), 1);

		effect.dispose();
		assert!(effect.is_disposed());
		count.set(5);
		assert_eq!(runs.get(), 1);
	}

	#[test]
	#[serial]
	fn test_self_write_converges_in_one_extra_run() {
		let count = Signal::new(0);
		let runs = Rc::new(Cell::new(0));

		let inner = count.clone();
		let counter = Rc::clone(&runs);
		let _effect = Effect::new(move || {
			let value = inner.get();
			counter.set(counter.get() + 1);
			if value == 0 {
				inner.set(1);
			}
		});

		// Initial run writes 1, which requests exactly one more run.
		assert_eq!(runs.get(), 2);
		assert_eq!(count.peek(), 1);
	}

	#[test]
	#[serial]
	fn test_stale_dependencies_are_dropped() {
		let toggle = Signal::new(true);
		let left = Signal::new(0);
		let right = Signal::new(0);
		let runs = Rc::new(Cell::new(0));

		let toggle_in = toggle.clone();
		let left_in = left.clone();
		let right_in = right.clone();
		let counter = Rc::clone(&runs);
		let _effect = Effect::new(move || {
			counter.set(counter.get() + 1);
			if toggle_in.get() {
				let _ = left_in.get();
			} else {
				let _ = right_in.get();
			}
		});
		assert_eq!(runs.get(), 1);

		toggle.set(false);
		assert_eq!(runs.get(), 2);

		// The effect no longer reads `left`.
		left.set(42);
		assert_eq!(runs.get(), 2);

		right.set(7);
		assert_eq!(runs.get(), 3);
	}

	#[test]
	#[serial]
	fn test_effect_error_display() {
		let err = EffectError::new("fetch exploded");
		assert_eq!(err.to_string(), "effect failed: fetch exploded");
		assert_eq!(err.message(), "fetch exploded");
	}
}
