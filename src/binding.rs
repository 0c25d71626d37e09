//! Text bindings: connect a signal to a host text node.
//!
//! A binding is a single-purpose effect that reads the signal and calls
//! `set_text` on the host. The effect's dedup in the scheduler guarantees
//! the host is told the latest value at most once per flush per binding.

use std::fmt::Display;

use crate::host::{HostNode, with_mount_host};
use crate::reactive::{Effect, Signal};

/// A live connection between a signal and a host text node. Dropping the
/// binding disposes its effect and stops the updates.
pub struct TextBinding {
	effect: Effect,
}

impl TextBinding {
	/// Detaches the binding now.
	pub fn dispose(&self) {
		self.effect.dispose();
	}

	/// Whether the binding has been detached.
	pub fn is_disposed(&self) -> bool {
		self.effect.is_disposed()
	}
}

/// Binds `signal` to the text node `node`: the node's content is set to
/// the signal's display form now and after every signal change.
pub fn bind_text<T>(node: HostNode, signal: &Signal<T>) -> TextBinding
where
	T: Clone + Display + 'static,
{
	let signal = signal.clone();
	let effect = Effect::new(move || {
		let value = signal.get().to_string();
		with_mount_host(|host| host.set_text(node, &value));
	});
	TextBinding { effect }
}
