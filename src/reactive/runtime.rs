//! Thread-local reactive runtime.
//!
//! The runtime owns everything the fine-grained reactive system shares
//! across primitives: the signal dependency graph, the effect table, the
//! observer stack used for automatic dependency tracking, the batched
//! effect scheduler, the typed context stack, and the error-boundary stack.
//!
//! The runtime is strictly single-threaded and cooperative. All state lives
//! in a `thread_local!` slot accessed through [`with_runtime`]; nothing in
//! this module blocks, suspends, or takes a lock. A second thread gets its
//! own empty runtime.
//!
//! ## Scheduling model
//!
//! A signal write enqueues every subscriber into a deduplicated FIFO queue
//! and then flushes it, unless a batch is open or a flush is already
//! draining. Effects triggered during a flush extend the same flush; they
//! never start a nested one. Within a single flush an effect runs at most
//! once, even if several of its dependencies were written.

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

use super::context::ContextEntry;
use super::effect::{EffectError, EffectState};

/// Unique identifier for a reactive node (signal or effect).
///
/// Ids are allocated from a monotonically increasing per-thread counter and
/// are never reused, so a stale id held after disposal simply fails lookup
/// instead of aliasing a newer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

thread_local! {
	static NEXT_NODE_ID: Cell<u64> = const { Cell::new(1) };
}

impl NodeId {
	/// Allocates a fresh id.
	pub fn new() -> Self {
		NEXT_NODE_ID.with(|next| {
			let id = next.get();
			next.set(id + 1);
			NodeId(id)
		})
	}
}

impl Default for NodeId {
	fn default() -> Self {
		Self::new()
	}
}

/// Error returned by an explicit [`flush`](crate::reactive::flush) call.
#[derive(Debug, Error)]
pub enum FlushError {
	/// Flush was called while a flush was already draining the queue.
	#[error("scheduler flush re-entered")]
	Reentrant,

	/// An effect callback failed and no error boundary absorbed it.
	#[error(transparent)]
	Effect(#[from] EffectError),
}

/// The per-thread reactive runtime.
///
/// Exposed publicly (through [`with_runtime`]) mainly for tests and
/// advanced embedders; application code normally goes through `Signal`,
/// `Effect`, `Memo`, and the context/boundary helpers instead.
pub struct Runtime {
	/// Signal id -> subscribed effect ids, in subscription order.
	subscribers: RefCell<HashMap<NodeId, Vec<NodeId>>>,
	/// Live effects by id.
	effects: RefCell<HashMap<NodeId, Rc<EffectState>>>,
	/// Stack of currently running observers. `None` marks an untracked
	/// region opened by `untrack`.
	observers: RefCell<Vec<Option<NodeId>>>,
	/// Deduplicated FIFO of effects awaiting a run.
	queue: RefCell<Vec<NodeId>>,
	/// Open batch nesting depth.
	batch_depth: Cell<usize>,
	/// Whether a flush is currently draining the queue.
	is_flushing: Cell<bool>,
	/// Typed LIFO context stack.
	contexts: RefCell<Vec<ContextEntry>>,
	/// LIFO stack of error-boundary handlers.
	boundaries: RefCell<Vec<Rc<dyn Fn(&EffectError)>>>,
}

thread_local! {
	static RUNTIME: Runtime = Runtime::new();
}

/// Runs a closure with the current thread's runtime.
pub fn with_runtime<R>(f: impl FnOnce(&Runtime) -> R) -> R {
	RUNTIME.with(|rt| f(rt))
}

/// Runs a closure with the current thread's runtime, returning `None` if
/// the runtime has already been torn down (thread exit).
pub fn try_with_runtime<R>(f: impl FnOnce(&Runtime) -> R) -> Option<R> {
	RUNTIME.try_with(|rt| f(rt)).ok()
}

impl Runtime {
	fn new() -> Self {
		Self {
			subscribers: RefCell::new(HashMap::new()),
			effects: RefCell::new(HashMap::new()),
			observers: RefCell::new(Vec::new()),
			queue: RefCell::new(Vec::new()),
			batch_depth: Cell::new(0),
			is_flushing: Cell::new(false),
			contexts: RefCell::new(Vec::new()),
			boundaries: RefCell::new(Vec::new()),
		}
	}

	// --- observer stack -------------------------------------------------

	/// The effect currently capturing dependencies, if any.
	pub fn current_observer(&self) -> Option<NodeId> {
		self.observers.borrow().last().copied().flatten()
	}

	pub(crate) fn push_observer(&self, id: NodeId) {
		self.observers.borrow_mut().push(Some(id));
	}

	pub(crate) fn push_untracked(&self) {
		self.observers.borrow_mut().push(None);
	}

	pub(crate) fn pop_observer(&self) {
		self.observers.borrow_mut().pop();
	}

	// --- dependency graph -----------------------------------------------

	/// Records the currently running effect as a subscriber of `signal`,
	/// and `signal` as a subscription of the effect. Both sides are
	/// idempotent.
	pub fn track_dependency(&self, signal: NodeId) {
		let Some(observer) = self.current_observer() else {
			return;
		};
		let Some(effect) = self.effects.borrow().get(&observer).cloned() else {
			return;
		};
		if effect.disposed.get() {
			return;
		}
		{
			let mut subscribers = self.subscribers.borrow_mut();
			let list = subscribers.entry(signal).or_default();
			if !list.contains(&observer) {
				list.push(observer);
			}
		}
		let mut subscriptions = effect.subscriptions.borrow_mut();
		if !subscriptions.contains(&signal) {
			subscriptions.push(signal);
		}
	}

	/// Enqueues every subscriber of `signal` and flushes if idle.
	///
	/// Returns the first uncaught effect error, if the write triggered an
	/// immediate flush and an effect failed with no boundary installed.
	pub fn notify_signal_change(&self, signal: NodeId) -> Result<(), EffectError> {
		let subscribers = self
			.subscribers
			.borrow()
			.get(&signal)
			.cloned()
			.unwrap_or_default();
		for effect_id in subscribers {
			self.enqueue(effect_id);
		}
		self.flush_if_idle()
	}

	/// Drops a signal's subscriber list. Called when the last clone of a
	/// signal handle is dropped.
	pub fn remove_node(&self, id: NodeId) {
		self.subscribers.borrow_mut().remove(&id);
	}

	/// Whether the runtime still tracks `id` as a signal or an effect.
	pub fn has_node(&self, id: NodeId) -> bool {
		self.subscribers.borrow().contains_key(&id) || self.effects.borrow().contains_key(&id)
	}

	// --- scheduler ------------------------------------------------------

	/// Opens a batch. Writes inside a batch defer effect runs until the
	/// outermost [`end_batch`](Self::end_batch).
	pub fn begin_batch(&self) {
		self.batch_depth.set(self.batch_depth.get() + 1);
	}

	/// Closes a batch; flushes when the outermost batch closes.
	pub fn end_batch(&self) -> Result<(), EffectError> {
		let depth = self.batch_depth.get();
		debug_assert!(depth > 0, "end_batch without begin_batch");
		let depth = depth.saturating_sub(1);
		self.batch_depth.set(depth);
		if depth == 0 {
			self.flush_if_idle()
		} else {
			Ok(())
		}
	}

	/// Current batch nesting depth.
	pub fn batch_depth(&self) -> usize {
		self.batch_depth.get()
	}

	/// Whether a flush is currently draining the queue.
	pub fn is_flushing(&self) -> bool {
		self.is_flushing.get()
	}

	/// Appends an effect to the pending queue unless it is disposed or
	/// already present.
	pub fn enqueue(&self, effect_id: NodeId) {
		let disposed = self
			.effects
			.borrow()
			.get(&effect_id)
			.map_or(true, |e| e.disposed.get());
		if disposed {
			return;
		}
		let mut queue = self.queue.borrow_mut();
		if !queue.contains(&effect_id) {
			queue.push(effect_id);
		}
	}

	/// Purges an effect from the pending queue.
	pub fn remove_from_queue(&self, effect_id: NodeId) {
		self.queue.borrow_mut().retain(|id| *id != effect_id);
	}

	/// Number of effects currently queued.
	pub fn pending_count(&self) -> usize {
		self.queue.borrow().len()
	}

	/// Flushes the queue unless a batch is open or a flush is already
	/// running. Writes during an active flush land in the same flush, so
	/// the re-entrant case is a silent no-op here.
	pub fn flush_if_idle(&self) -> Result<(), EffectError> {
		if self.batch_depth.get() > 0 || self.is_flushing.get() {
			return Ok(());
		}
		self.flush_queue()
	}

	/// Drains the queue in FIFO order, running each live effect once.
	///
	/// Effects enqueued while the flush is running extend the queue and are
	/// drained by the same call. An uncaught effect error aborts the drain;
	/// the already-processed prefix is discarded and later entries stay
	/// queued.
	pub(crate) fn flush_queue(&self) -> Result<(), EffectError> {
		self.is_flushing.set(true);
		let mut index = 0;
		let result = loop {
			let next = self.queue.borrow().get(index).copied();
			let Some(effect_id) = next else {
				break Ok(());
			};
			index += 1;
			let effect = self.effects.borrow().get(&effect_id).cloned();
			if let Some(effect) = effect {
				if let Err(err) = self.run_effect(&effect) {
					break Err(err);
				}
			}
		};
		self.queue.borrow_mut().drain(..index);
		self.is_flushing.set(false);
		result
	}

	// --- effects --------------------------------------------------------

	pub(crate) fn register_effect(&self, effect: Rc<EffectState>) {
		self.effects.borrow_mut().insert(effect.id, effect);
	}

	/// Triggers an effect.
	///
	/// A disposed effect is skipped. An effect that is already running is
	/// not re-entered; it is marked for exactly one additional run after
	/// the current one returns. Otherwise the effect enters its run loop:
	/// it re-runs until no self-write has requested another pass.
	pub(crate) fn run_effect(&self, effect: &Rc<EffectState>) -> Result<(), EffectError> {
		if effect.disposed.get() {
			return Ok(());
		}
		if effect.is_running.get() {
			effect.needs_rerun.set(true);
			return Ok(());
		}
		effect.is_running.set(true);
		let result = loop {
			effect.needs_rerun.set(false);
			if let Err(err) = self.run_effect_once(effect) {
				break Err(err);
			}
			if !effect.needs_rerun.get() || effect.disposed.get() {
				break Ok(());
			}
		};
		effect.is_running.set(false);
		result
	}

	/// One run: clear stale subscriptions, re-run the callback under the
	/// observer stack, and route a failure to the topmost error boundary.
	fn run_effect_once(&self, effect: &Rc<EffectState>) -> Result<(), EffectError> {
		struct ObserverGuard<'a>(&'a Runtime);
		impl Drop for ObserverGuard<'_> {
			fn drop(&mut self) {
				self.0.pop_observer();
			}
		}

		self.clear_subscriptions(effect);
		self.push_observer(effect.id);
		let guard = ObserverGuard(self);
		let result = (effect.callback.borrow_mut())();
		drop(guard);
		match result {
			Ok(()) => Ok(()),
			Err(err) => {
				if self.dispatch_error(&err) {
					Ok(())
				} else {
					Err(err)
				}
			}
		}
	}

	/// Removes the effect from every signal it subscribed to and clears
	/// its subscription list.
	fn clear_subscriptions(&self, effect: &Rc<EffectState>) {
		let signals: Vec<NodeId> = effect.subscriptions.borrow_mut().drain(..).collect();
		let mut subscribers = self.subscribers.borrow_mut();
		for signal in signals {
			if let Some(list) = subscribers.get_mut(&signal) {
				list.retain(|id| *id != effect.id);
			}
		}
	}

	/// Marks an effect disposed, detaches it from all signals, and purges
	/// it from the queue. Idempotent.
	pub(crate) fn dispose_effect(&self, effect_id: NodeId) {
		let Some(effect) = self.effects.borrow_mut().remove(&effect_id) else {
			return;
		};
		effect.disposed.set(true);
		self.clear_subscriptions(&effect);
		self.remove_from_queue(effect_id);
	}

	// --- context stack --------------------------------------------------

	pub(crate) fn push_context(&self, key: TypeId, value: Rc<dyn Any>) -> usize {
		let mut contexts = self.contexts.borrow_mut();
		contexts.push(ContextEntry { key, value });
		contexts.len() - 1
	}

	pub(crate) fn pop_context(&self, index: usize) {
		let mut contexts = self.contexts.borrow_mut();
		debug_assert_eq!(
			contexts.len().checked_sub(1),
			Some(index),
			"context guards released out of order"
		);
		if contexts.len() == index + 1 {
			contexts.pop();
		}
	}

	/// Scans the context stack top-to-bottom for the first entry with the
	/// given type key.
	pub(crate) fn find_context(&self, key: TypeId) -> Option<Rc<dyn Any>> {
		self.contexts
			.borrow()
			.iter()
			.rev()
			.find(|entry| entry.key == key)
			.map(|entry| entry.value.clone())
	}

	// --- error boundaries -----------------------------------------------

	pub(crate) fn push_boundary(&self, handler: Rc<dyn Fn(&EffectError)>) -> usize {
		let mut boundaries = self.boundaries.borrow_mut();
		boundaries.push(handler);
		boundaries.len() - 1
	}

	pub(crate) fn pop_boundary(&self, index: usize) {
		let mut boundaries = self.boundaries.borrow_mut();
		debug_assert_eq!(
			boundaries.len().checked_sub(1),
			Some(index),
			"error boundary guards released out of order"
		);
		if boundaries.len() == index + 1 {
			boundaries.pop();
		}
	}

	/// Delivers an effect error to the topmost boundary handler. Returns
	/// whether a handler absorbed it. Handlers stay installed after
	/// firing.
	pub(crate) fn dispatch_error(&self, err: &EffectError) -> bool {
		let handler = self.boundaries.borrow().last().cloned();
		match handler {
			Some(handler) => {
				handler(err);
				true
			}
			None => false,
		}
	}
}
