//! Memo - Derived Reactive Values
//!
//! A `Memo<T>` pairs an owned signal with an owned effect: the effect runs
//! the compute closure and writes the result into the signal. Reading the
//! memo reads (and tracks) that signal, so effects depending on a memo
//! re-run when the memo's inputs change.

use std::fmt;
use std::rc::Rc;

use super::effect::Effect;
use super::signal::Signal;

/// A derived value that recomputes when its dependencies change.
///
/// ## Cloning
///
/// `Memo<T>` is a shared handle; the compute effect is disposed when the
/// last clone drops.
pub struct Memo<T: 'static> {
	value: Signal<Option<T>>,
	effect: Rc<Effect>,
}

impl<T: Clone + 'static> Memo<T> {
	/// Creates a memo from a compute closure.
	///
	/// The closure runs once immediately; any signal it reads becomes a
	/// dependency, and later writes to those signals recompute the memo.
	pub fn new<F>(mut compute: F) -> Self
	where
		F: FnMut() -> T + 'static,
	{
		let value = Signal::new(None::<T>);
		let writer = value.clone();
		let effect = Effect::new(move || {
			let next = compute();
			writer.set(Some(next));
		});
		Self {
			value,
			effect: Rc::new(effect),
		}
	}

	/// Returns the current value, subscribing the running effect (if any).
	///
	/// If the initial compute has somehow not produced a value yet, it is
	/// triggered first, so no reader can observe an uninitialized memo.
	pub fn get(&self) -> T {
		if let Some(current) = self.value.get() {
			return current;
		}
		self.effect.trigger();
		self.value
			.peek()
			.expect("memo value is written by the compute run")
	}

	/// Returns the current value without tracking a dependency.
	pub fn peek(&self) -> T {
		match self.value.peek() {
			Some(current) => current,
			None => {
				self.effect.trigger();
				self.value
					.peek()
					.expect("memo value is written by the compute run")
			}
		}
	}

	/// The node id of the memo's inner signal. Mainly for tests.
	pub fn id(&self) -> super::runtime::NodeId {
		self.value.id()
	}
}

impl<T: 'static> Clone for Memo<T> {
	fn clone(&self) -> Self {
		Self {
			value: self.value.clone(),
			effect: Rc::clone(&self.effect),
		}
	}
}

impl<T: fmt::Debug + Clone + 'static> fmt::Debug for Memo<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Memo")
			.field("id", &self.value.id())
			.field("value", &self.value.peek())
			.finish()
	}
}
