//! Typed ambient context.
//!
//! A strictly LIFO stack of `{type key, value}` entries, scoped by guards.
//! Looking a type up walks the stack top-to-bottom and returns the first
//! match, so inner scopes shadow outer ones. Type keys are `TypeId`s,
//! which are stable within a process.

use std::any::{Any, TypeId};
use std::rc::Rc;

use super::runtime::{try_with_runtime, with_runtime};

/// One entry on the runtime's context stack.
pub(crate) struct ContextEntry {
	pub(crate) key: TypeId,
	pub(crate) value: Rc<dyn Any>,
}

/// Guard for a provided context value. Dropping it pops the entry; guards
/// must be released in reverse order of creation.
#[must_use = "dropping the guard immediately removes the context"]
pub struct ContextGuard {
	index: usize,
}

impl Drop for ContextGuard {
	fn drop(&mut self) {
		let _ = try_with_runtime(|rt| rt.pop_context(self.index));
	}
}

/// Pushes `value` onto the context stack for the lifetime of the returned
/// guard.
pub fn provide_context<T: 'static>(value: T) -> ContextGuard {
	provide_context_rc(Rc::new(value))
}

/// Pushes an already shared value onto the context stack for the lifetime
/// of the returned guard.
pub fn provide_context_rc<T: 'static>(value: Rc<T>) -> ContextGuard {
	let index = with_runtime(|rt| rt.push_context(TypeId::of::<T>(), value));
	ContextGuard { index }
}

/// Returns the innermost provided value of type `T`, if any.
pub fn use_context<T: 'static>() -> Option<Rc<T>> {
	with_runtime(|rt| rt.find_context(TypeId::of::<T>()))
		.and_then(|value| value.downcast::<T>().ok())
}

/// Runs `f` with `value` provided as context.
pub fn with_context<T: 'static, R>(value: T, f: impl FnOnce() -> R) -> R {
	let _guard = provide_context(value);
	f()
}

#[cfg(test)]
mod tests {
	use super::*;
	use serial_test::serial;

	#[derive(Debug, PartialEq)]
	struct Theme(&'static str);

	#[derive(Debug, PartialEq)]
	struct Locale(&'static str);

	#[test]
	#[serial]
	fn test_use_context_empty() {
		assert!(use_context::<Theme>().is_none());
	}

	#[test]
	#[serial]
	fn test_provide_and_use() {
		let guard = provide_context(Theme("dark"));
		let theme = use_context::<Theme>().unwrap();
		assert_eq!(*theme, Theme("dark"));
		drop(guard);
		assert!(use_context::<Theme>().is_none());
	}

	#[test]
	#[serial]
	fn test_inner_scope_shadows_outer() {
		with_context(Theme("dark"), || {
			with_context(Theme("light"), || {
				assert_eq!(*use_context::<Theme>().unwrap(), Theme("light"));
			});
			assert_eq!(*use_context::<Theme>().unwrap(), Theme("dark"));
		});
	}

	#[test]
	#[serial]
	fn test_lookup_is_keyed_by_type() {
		with_context(Theme("dark"), || {
			with_context(Locale("fr"), || {
				assert_eq!(*use_context::<Theme>().unwrap(), Theme("dark"));
				assert_eq!(*use_context::<Locale>().unwrap(), Locale("fr"));
			});
		});
	}

	#[test]
	#[serial]
	fn test_provide_context_rc_shares_value() {
		let shared = Rc::new(Theme("dark"));
		let _guard = provide_context_rc(Rc::clone(&shared));
		let looked_up = use_context::<Theme>().unwrap();
		assert!(Rc::ptr_eq(&shared, &looked_up));
	}
}
