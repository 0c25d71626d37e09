//! Fine-grained reactivity engine.
//!
//! Signals hold values and track their readers; effects re-run when their
//! tracked signals change; memos are effects whose output is itself a
//! signal; resources drive an async-style state machine from a source
//! signal and a fetcher. Scheduling is batched, deduplicated, and FIFO.
//!
//! Everything here is single-threaded and cooperative: state lives in a
//! thread-local [`Runtime`] and nothing blocks or suspends.

pub mod context;
pub mod effect;
pub mod error_boundary;
pub mod memo;
pub mod resource;
pub mod runtime;
pub mod signal;

pub use context::{ContextGuard, provide_context, provide_context_rc, use_context, with_context};
pub use effect::{Effect, EffectError, EffectResult};
pub use error_boundary::{ErrorBoundaryGuard, catch_effect_errors, push_error_boundary};
pub use memo::Memo;
pub use resource::{Resource, ResourceState, SuspenseBoundary, SuspenseContext, create_resource};
pub use runtime::{FlushError, NodeId, Runtime, try_with_runtime, with_runtime};
pub use signal::Signal;

/// Guard for an open batch. The batch closes (and flushes, if outermost)
/// when the guard is dropped or [`end`](BatchGuard::end) is called.
#[must_use = "dropping the guard immediately closes the batch"]
pub struct BatchGuard {
	active: bool,
}

impl BatchGuard {
	/// Closes the batch, surfacing the first uncaught effect failure from
	/// the flush it triggers.
	pub fn end(mut self) -> Result<(), EffectError> {
		self.active = false;
		with_runtime(|rt| rt.end_batch())
	}
}

impl Drop for BatchGuard {
	fn drop(&mut self) {
		if self.active {
			let result = try_with_runtime(|rt| rt.end_batch());
			if let Some(Err(err)) = result {
				crate::error_log!("uncaught {} at batch end", err);
			}
		}
	}
}

/// Opens a batch. Signal writes made while the guard is alive defer their
/// effect runs to the moment the outermost batch closes, and runs are
/// coalesced: an effect runs at most once per flush no matter how many of
/// its dependencies were written.
pub fn begin_batch() -> BatchGuard {
	with_runtime(|rt| rt.begin_batch());
	BatchGuard { active: true }
}

/// Runs `f` inside a batch. Uncaught effect failures from the closing
/// flush are logged and dropped; use [`try_batch`] to observe them.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
	let _guard = begin_batch();
	f()
}

/// Runs `f` inside a batch, surfacing the first uncaught effect failure
/// from the closing flush.
pub fn try_batch<R>(f: impl FnOnce() -> R) -> Result<R, EffectError> {
	let guard = begin_batch();
	let result = f();
	guard.end()?;
	Ok(result)
}

/// Drains the pending effect queue now.
///
/// Fails with [`FlushError::Reentrant`] when called from inside a running
/// flush, and with [`FlushError::Effect`] when an effect fails with no
/// boundary installed. Pending work enqueued inside an open batch is
/// drained immediately by this call.
pub fn flush() -> Result<(), FlushError> {
	with_runtime(|rt| {
		if rt.is_flushing() {
			return Err(FlushError::Reentrant);
		}
		rt.flush_queue().map_err(FlushError::from)
	})
}

struct UntrackGuard;

impl Drop for UntrackGuard {
	fn drop(&mut self) {
		let _ = try_with_runtime(|rt| rt.pop_observer());
	}
}

/// Runs `f` with dependency tracking suspended: signal reads inside it do
/// not subscribe the surrounding effect.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
	with_runtime(|rt| rt.push_untracked());
	let _guard = UntrackGuard;
	f()
}
