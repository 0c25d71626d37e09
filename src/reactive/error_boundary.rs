//! Error boundaries for effect failures.
//!
//! A strictly LIFO stack of handlers. When an effect callback fails, the
//! topmost handler (if any) absorbs the error; with no handler installed
//! the error propagates out of the scheduler flush and surfaces from the
//! write that triggered it. Handlers stay installed after firing.

use std::rc::Rc;

use super::effect::EffectError;
use super::runtime::{try_with_runtime, with_runtime};

/// Guard for an installed error boundary. Dropping it removes the handler;
/// guards must be released in reverse order of creation.
#[must_use = "dropping the guard immediately removes the boundary"]
pub struct ErrorBoundaryGuard {
	index: usize,
}

impl Drop for ErrorBoundaryGuard {
	fn drop(&mut self) {
		let _ = try_with_runtime(|rt| rt.pop_boundary(self.index));
	}
}

/// Installs `handler` as the topmost error boundary for the lifetime of
/// the returned guard.
///
/// Handlers are infallible: they must absorb the error.
pub fn push_error_boundary<F>(handler: F) -> ErrorBoundaryGuard
where
	F: Fn(&EffectError) + 'static,
{
	let index = with_runtime(|rt| rt.push_boundary(Rc::new(handler)));
	ErrorBoundaryGuard { index }
}

/// Runs `f` with `handler` installed as the topmost error boundary.
pub fn catch_effect_errors<F, G, R>(handler: F, f: G) -> R
where
	F: Fn(&EffectError) + 'static,
	G: FnOnce() -> R,
{
	let _guard = push_error_boundary(handler);
	f()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::reactive::{Effect, Signal};
	use serial_test::serial;
	use std::cell::RefCell;
	use std::rc::Rc;

	#[test]
	#[serial]
	fn test_boundary_absorbs_effect_failure() {
		let caught = Rc::new(RefCell::new(Vec::new()));
		let sink = Rc::clone(&caught);
		let _guard = push_error_boundary(move |err| {
			sink.borrow_mut().push(err.message().to_string());
		});

		let source = Signal::new(0);
		let tracked = source.clone();
		let _effect = Effect::try_new(move || {
			if tracked.get() > 0 {
				return Err(EffectError::new("bad value"));
			}
			Ok(())
		});
		assert!(caught.borrow().is_empty());

		source.try_set(1).unwrap();
		assert_eq!(*caught.borrow(), vec!["bad value".to_string()]);
	}

	#[test]
	#[serial]
	fn test_uncaught_failure_surfaces_from_write() {
		let source = Signal::new(0);
		let tracked = source.clone();
		let _effect = Effect::try_new(move || {
			if tracked.get() > 0 {
				return Err(EffectError::new("boom"));
			}
			Ok(())
		});

		let err = source.try_set(1).unwrap_err();
		assert_eq!(err.message(), "boom");
	}

	#[test]
	#[serial]
	fn test_topmost_boundary_wins() {
		let outer_hits = Rc::new(RefCell::new(0));
		let inner_hits = Rc::new(RefCell::new(0));

		let outer_sink = Rc::clone(&outer_hits);
		let _outer = push_error_boundary(move |_| *outer_sink.borrow_mut() += 1);

		{
			let inner_sink = Rc::clone(&inner_hits);
			let _inner = push_error_boundary(move |_| *inner_sink.borrow_mut() += 1);

			let source = Signal::new(0);
			let tracked = source.clone();
			let _effect = Effect::try_new(move || {
				if tracked.get() > 0 {
					return Err(EffectError::new("boom"));
				}
				Ok(())
			});
			source.set(1);
		}

		assert_eq!(*inner_hits.borrow(), 1);
		assert_eq!(*outer_hits.borrow(), 0);
	}

	#[test]
	#[serial]
	fn test_handler_fires_repeatedly() {
		let hits = Rc::new(RefCell::new(0));
		let sink = Rc::clone(&hits);
		catch_effect_errors(
			move |_| *sink.borrow_mut() += 1,
			|| {
				let source = Signal::new(0);
				let tracked = source.clone();
				let _effect = Effect::try_new(move || {
					if tracked.get() > 0 {
						return Err(EffectError::new("again"));
					}
					Ok(())
				});
				source.set(1);
				source.set(2);
			},
		);
		assert_eq!(*hits.borrow(), 2);
	}
}
