//! Resource - Effect-driven Async State Machine
//!
//! A `Resource<T>` drives a `{idle, pending, ready, failed}` state machine
//! from a source signal and a fetcher. The fetcher runs synchronously
//! inside the resource's effect; asynchrony is modeled by the embedder
//! re-driving the source signal.
//!
//! Resources cooperate with [`SuspenseBoundary`]: a resource created while
//! a boundary is entered registers its in-flight fetches against the
//! boundary's pending counter, which is itself a signal, so UI code can
//! react to "anything still loading here?".

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use super::context::{ContextGuard, provide_context_rc, use_context};
use super::effect::Effect;
use super::signal::Signal;

/// The observable state of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState<T> {
	/// No fetch has started yet.
	Idle,
	/// A fetch is in flight.
	Pending,
	/// The last fetch succeeded.
	Ready(T),
	/// The last fetch failed; carries the error's display form.
	Failed(String),
}

impl<T> ResourceState<T> {
	/// Whether no fetch has started yet.
	pub fn is_idle(&self) -> bool {
		matches!(self, Self::Idle)
	}

	/// Whether a fetch is in flight.
	pub fn is_pending(&self) -> bool {
		matches!(self, Self::Pending)
	}

	/// Whether the last fetch succeeded.
	pub fn is_ready(&self) -> bool {
		matches!(self, Self::Ready(_))
	}

	/// Whether the last fetch failed.
	pub fn is_failed(&self) -> bool {
		matches!(self, Self::Failed(_))
	}

	/// The fetched value, if ready.
	pub fn value(&self) -> Option<&T> {
		match self {
			Self::Ready(value) => Some(value),
			_ => None,
		}
	}

	/// The failure message, if failed.
	pub fn error(&self) -> Option<&str> {
		match self {
			Self::Failed(message) => Some(message),
			_ => None,
		}
	}
}

/// Ambient handle a resource uses to account its in-flight fetches against
/// the innermost suspense boundary.
pub struct SuspenseContext {
	pending: Signal<usize>,
}

impl SuspenseContext {
	pub(crate) fn increment(&self) {
		self.pending.update(|n| *n += 1);
	}

	pub(crate) fn decrement(&self) {
		self.pending.update(|n| *n = n.saturating_sub(1));
	}
}

/// A counter of in-flight resource fetches within a lexical scope.
///
/// # Example
///
/// ```ignore
/// use ripple_core::reactive::{SuspenseBoundary, Signal, create_resource};
///
/// let boundary = SuspenseBoundary::new();
/// let guard = boundary.enter();
/// let id = Signal::new(1u32);
/// let user = create_resource(&id, |id| Ok::<_, String>(format!("user {id}")));
/// drop(guard);
///
/// assert_eq!(boundary.pending_count(), 0); // fetches are synchronous
/// ```
pub struct SuspenseBoundary {
	pending: Signal<usize>,
}

impl SuspenseBoundary {
	/// Creates a boundary with an empty pending counter.
	pub fn new() -> Self {
		Self {
			pending: Signal::new(0),
		}
	}

	/// Pushes this boundary onto the context stack. Resources created
	/// while the guard is alive attach to it.
	pub fn enter(&self) -> ContextGuard {
		provide_context_rc(Rc::new(SuspenseContext {
			pending: self.pending.clone(),
		}))
	}

	/// The read side of the pending counter.
	pub fn pending_signal(&self) -> Signal<usize> {
		self.pending.clone()
	}

	/// The current pending count, untracked.
	pub fn pending_count(&self) -> usize {
		self.pending.peek()
	}
}

impl Default for SuspenseBoundary {
	fn default() -> Self {
		Self::new()
	}
}

/// A handle to a resource's state signal and driving effect.
///
/// Dropping the last handle disposes the effect, cancels any suspense
/// registration, and tears down the state signal.
pub struct Resource<T: 'static> {
	state: Signal<ResourceState<T>>,
	effect: Rc<Effect>,
	suspense: Option<Rc<SuspenseContext>>,
	registered: Rc<Cell<bool>>,
}

/// Creates a resource driven by `source`.
///
/// The resource's effect reads `source` (so source writes re-fetch),
/// registers against the innermost suspense boundary if one is entered,
/// writes `Pending`, invokes `fetcher`, and writes `Ready` or `Failed`.
/// Fetcher failures become `Failed(message)`; they never reach the error
/// boundary stack.
pub fn create_resource<S, T, E, F>(source: &Signal<S>, fetcher: F) -> Resource<T>
where
	S: Clone + 'static,
	T: 'static,
	E: fmt::Display,
	F: Fn(&S) -> Result<T, E> + 'static,
{
	let state = Signal::new(ResourceState::Idle);
	let suspense = use_context::<SuspenseContext>();
	let registered = Rc::new(Cell::new(false));

	let source = source.clone();
	let writer = state.clone();
	let boundary = suspense.clone();
	let in_flight = Rc::clone(&registered);
	let effect = Effect::new(move || {
		let input = source.get();
		if let Some(ctx) = &boundary {
			if !in_flight.get() {
				ctx.increment();
				in_flight.set(true);
			}
		}
		writer.set(ResourceState::Pending);
		match fetcher(&input) {
			Ok(value) => writer.set(ResourceState::Ready(value)),
			Err(err) => writer.set(ResourceState::Failed(err.to_string())),
		}
		if in_flight.get() {
			if let Some(ctx) = &boundary {
				ctx.decrement();
			}
			in_flight.set(false);
		}
	});

	Resource {
		state,
		effect: Rc::new(effect),
		suspense,
		registered,
	}
}

impl<T: 'static> Resource<T> {
	/// Returns the current state, subscribing the running effect (if any).
	pub fn get(&self) -> ResourceState<T>
	where
		T: Clone,
	{
		self.state.get()
	}

	/// Returns the current state without tracking a dependency.
	pub fn peek(&self) -> ResourceState<T>
	where
		T: Clone,
	{
		self.state.peek()
	}

	/// Re-runs the fetch with the current source value.
	pub fn refetch(&self) {
		self.effect.trigger();
	}
}

impl<T: 'static> Clone for Resource<T> {
	fn clone(&self) -> Self {
		Self {
			state: self.state.clone(),
			effect: Rc::clone(&self.effect),
			suspense: self.suspense.clone(),
			registered: Rc::clone(&self.registered),
		}
	}
}

impl<T: 'static> Drop for Resource<T> {
	fn drop(&mut self) {
		// The last handle cancels a still-open suspense registration
		// before the effect and state signal tear down.
		if Rc::strong_count(&self.effect) == 1 && self.registered.get() {
			if let Some(ctx) = &self.suspense {
				ctx.decrement();
			}
			self.registered.set(false);
		}
	}
}
