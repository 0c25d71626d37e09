//! Event delegation.
//!
//! Handlers are not attached to individual host nodes. Instead the runtime
//! keeps one registry per event name and asks the host (once per name) to
//! forward that event at the document level. The embedder then calls
//! [`dispatch`] with the target node and its ancestor path, and the
//! registry walks the path firing matching listeners into a
//! [`SyntheticEvent`].
//!
//! ## Ordering
//!
//! Listeners on the same node fire in registration order. The path is
//! visited in the order given (target first); when `bubbles` is false only
//! the first path element is visited.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::host::{HostNode, with_mount_host};

/// A handler invoked with a mutable synthetic event.
///
/// The handler's identity (used for deduplication and removal) is the
/// underlying `Rc` allocation, which covers both the callback and any
/// context it captured.
#[derive(Clone)]
pub struct EventHandler {
	inner: Rc<dyn Fn(&mut SyntheticEvent)>,
}

impl EventHandler {
	/// Wraps a callback.
	pub fn new(f: impl Fn(&mut SyntheticEvent) + 'static) -> Self {
		Self { inner: Rc::new(f) }
	}

	fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}
}

impl fmt::Debug for EventHandler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "EventHandler({:p})", Rc::as_ptr(&self.inner))
	}
}

/// Options for [`add_listener`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ListenerOptions {
	/// Remove the listener after it fires once.
	pub once: bool,
}

impl ListenerOptions {
	/// Creates default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the once flag.
	pub fn once(mut self, once: bool) -> Self {
		self.once = once;
		self
	}
}

struct Listener {
	node: HostNode,
	handler: EventHandler,
	once: bool,
}

#[derive(Default)]
struct EventEntry {
	listeners: Vec<Listener>,
	host_registered: bool,
}

thread_local! {
	static REGISTRY: RefCell<HashMap<String, EventEntry>> = RefCell::new(HashMap::new());
}

/// The event passed by mutable reference into handlers.
#[derive(Debug, Clone)]
pub struct SyntheticEvent {
	/// The event name ("click", "input", ...).
	pub event_type: String,
	/// The node the event originated on.
	pub target: HostNode,
	/// The node whose listeners are currently firing.
	pub current_target: HostNode,
	/// Whether the event propagates along the path.
	pub bubbles: bool,
	/// Optional string payload supplied by the dispatcher.
	pub detail: Option<String>,
	/// Optional structured payload supplied by the dispatcher.
	pub detail_data: Option<serde_json::Value>,
	default_prevented: bool,
	propagation_stopped: bool,
}

impl SyntheticEvent {
	/// Marks the default host behavior as prevented.
	pub fn prevent_default(&mut self) {
		self.default_prevented = true;
	}

	/// Stops the walk along the propagation path after the current node's
	/// listeners have fired.
	pub fn stop_propagation(&mut self) {
		self.propagation_stopped = true;
	}

	/// Whether a handler called [`prevent_default`](Self::prevent_default).
	pub fn default_prevented(&self) -> bool {
		self.default_prevented
	}

	/// Whether a handler called
	/// [`stop_propagation`](Self::stop_propagation).
	pub fn propagation_stopped(&self) -> bool {
		self.propagation_stopped
	}
}

/// Options for [`dispatch`].
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions<'a> {
	/// The propagation path: the target node followed by its ancestors.
	pub path: &'a [HostNode],
	/// Whether to walk past the first path element.
	pub bubbles: bool,
	/// Optional string payload exposed on the synthetic event.
	pub detail: Option<String>,
	/// Optional structured payload exposed on the synthetic event.
	pub detail_data: Option<serde_json::Value>,
}

/// Registers a handler for `event_name` on `node`.
///
/// Re-adding the same handler (same `Rc` allocation) for the same node
/// only updates its `once` flag. The first listener for a given event name
/// registers that name with the host.
pub fn add_listener(
	node: HostNode,
	event_name: &str,
	handler: &EventHandler,
	options: ListenerOptions,
) {
	let register_with_host = REGISTRY.with(|registry| {
		let mut registry = registry.borrow_mut();
		let entry = registry.entry(event_name.to_string()).or_default();
		if let Some(existing) = entry
			.listeners
			.iter_mut()
			.find(|l| l.node == node && l.handler.ptr_eq(handler))
		{
			existing.once = options.once;
		} else {
			entry.listeners.push(Listener {
				node,
				handler: handler.clone(),
				once: options.once,
			});
		}
		if entry.host_registered {
			false
		} else {
			entry.host_registered = true;
			true
		}
	});
	if register_with_host {
		with_mount_host(|host| host.register_event(event_name));
	}
}

/// Removes a handler previously registered for `event_name` on `node`.
pub fn remove_listener(node: HostNode, event_name: &str, handler: &EventHandler) {
	REGISTRY.with(|registry| {
		if let Some(entry) = registry.borrow_mut().get_mut(event_name) {
			entry
				.listeners
				.retain(|l| !(l.node == node && l.handler.ptr_eq(handler)));
		}
	});
}

/// Tears down the whole registry. Host-side registrations are not
/// reverted; the next [`add_listener`] per name re-registers.
pub fn reset_events() {
	REGISTRY.with(|registry| registry.borrow_mut().clear());
}

/// Number of listeners currently registered for `event_name`.
pub fn listener_count(event_name: &str) -> usize {
	REGISTRY.with(|registry| {
		registry
			.borrow()
			.get(event_name)
			.map_or(0, |entry| entry.listeners.len())
	})
}

/// Dispatches an event along a propagation path.
///
/// For each visited node the synthetic event's `current_target` is set and
/// every listener registered for that node fires in registration order;
/// `once` listeners are removed after firing. A handler calling
/// `stop_propagation` ends the walk after its node. Returns whether any
/// handler called `prevent_default`.
pub fn dispatch(event_name: &str, target: HostNode, options: DispatchOptions<'_>) -> bool {
	let mut event = SyntheticEvent {
		event_type: event_name.to_string(),
		target,
		current_target: target,
		bubbles: options.bubbles,
		detail: options.detail,
		detail_data: options.detail_data,
		default_prevented: false,
		propagation_stopped: false,
	};

	let walked: &[HostNode] = if options.bubbles {
		options.path
	} else {
		options.path.get(..1).unwrap_or(options.path)
	};

	for &node in walked {
		event.current_target = node;
		// Snapshot the matching handlers so listeners may mutate the
		// registry while firing.
		let matching: Vec<(EventHandler, bool)> = REGISTRY.with(|registry| {
			registry
				.borrow()
				.get(event_name)
				.map(|entry| {
					entry
						.listeners
						.iter()
						.filter(|l| l.node == node)
						.map(|l| (l.handler.clone(), l.once))
						.collect()
				})
				.unwrap_or_default()
		});
		for (handler, once) in matching {
			(handler.inner)(&mut event);
			if once {
				remove_listener(node, event_name, &handler);
			}
		}
		if event.propagation_stopped() {
			break;
		}
	}

	event.default_prevented()
}
