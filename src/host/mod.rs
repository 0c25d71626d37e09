//! Host interface - the narrow callback surface through which the runtime
//! touches the host tree.
//!
//! The core never owns the DOM. Mounting goes through [`MountHost`] (seven
//! operations) and hydration reads the existing tree through
//! [`HydrationHost`] (seven readers). Both tables are installed
//! thread-locally and come with safe defaults: on wasm32 the imported
//! `ripple_dom_*` bridge, off-wasm a stderr printer (mount side) and a
//! panicking reader (hydration side). Tests install recording fixtures via
//! [`set_mount_host`] / [`set_hydration_host`].
//!
//! Node ids are opaque `u32` handles owned by the embedder; `0` is
//! reserved as "not found".

use std::cell::RefCell;
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
pub mod dom;
#[cfg(target_arch = "wasm32")]
pub mod imported;

/// An opaque host node handle. `0` is reserved as "not found".
pub type HostNode = u32;

/// The reserved "not found" node handle.
pub const NULL_NODE: HostNode = 0;

/// Classification of a host node during hydration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostNodeType {
	/// An element node.
	Element,
	/// A text node.
	Text,
	/// A comment node.
	Comment,
	/// Anything else (document, processing instruction, ...).
	Other,
}

/// Mount-side host operations.
pub trait MountHost {
	/// Creates an element with the given tag and returns its handle.
	fn create_element(&self, tag: &str) -> HostNode;
	/// Creates a text node with the given content and returns its handle.
	fn create_text(&self, value: &str) -> HostNode;
	/// Appends `child` to `parent`.
	fn append_child(&self, parent: HostNode, child: HostNode);
	/// Sets an attribute on an element.
	fn set_attribute(&self, node: HostNode, name: &str, value: &str);
	/// Replaces the text content of a text node.
	fn set_text(&self, node: HostNode, value: &str);
	/// Called once per distinct event name the runtime wants delegated.
	fn register_event(&self, name: &str);
	/// Resolves a portal target to a node handle; `0` means not found.
	fn resolve_portal(&self, target: &str) -> HostNode;
}

/// Hydration-side host readers.
pub trait HydrationHost {
	/// First child of `node`, if any.
	fn first_child(&self, node: HostNode) -> Option<HostNode>;
	/// Next sibling of `node`, if any.
	fn next_sibling(&self, node: HostNode) -> Option<HostNode>;
	/// Classifies `node`.
	fn node_type(&self, node: HostNode) -> HostNodeType;
	/// Tag name of an element node, lowercased.
	fn tag_name(&self, node: HostNode) -> String;
	/// Content of a text node.
	fn text_content(&self, node: HostNode) -> String;
	/// Attribute value of an element node, if present.
	fn get_attribute(&self, node: HostNode, name: &str) -> Option<String>;
	/// Body of a comment node.
	fn comment_text(&self, node: HostNode) -> String;
}

thread_local! {
	static MOUNT_HOST: RefCell<Rc<dyn MountHost>> = RefCell::new(default_mount_host());
	static HYDRATION_HOST: RefCell<Rc<dyn HydrationHost>> = RefCell::new(default_hydration_host());
}

/// Installs the mount-side host table for this thread.
pub fn set_mount_host(host: Rc<dyn MountHost>) {
	MOUNT_HOST.with(|slot| *slot.borrow_mut() = host);
}

/// Installs the hydration-side host table for this thread.
pub fn set_hydration_host(host: Rc<dyn HydrationHost>) {
	HYDRATION_HOST.with(|slot| *slot.borrow_mut() = host);
}

/// Restores both host tables to their defaults.
pub fn reset_hosts() {
	MOUNT_HOST.with(|slot| *slot.borrow_mut() = default_mount_host());
	HYDRATION_HOST.with(|slot| *slot.borrow_mut() = default_hydration_host());
}

/// Runs a closure against the installed mount host.
///
/// The table is cloned out of its slot first, so host implementations may
/// re-enter the runtime (for example from `register_event`).
pub fn with_mount_host<R>(f: impl FnOnce(&dyn MountHost) -> R) -> R {
	let host = MOUNT_HOST.with(|slot| slot.borrow().clone());
	f(host.as_ref())
}

/// Runs a closure against the installed hydration host.
pub fn with_hydration_host<R>(f: impl FnOnce(&dyn HydrationHost) -> R) -> R {
	let host = HYDRATION_HOST.with(|slot| slot.borrow().clone());
	f(host.as_ref())
}

#[cfg(target_arch = "wasm32")]
fn default_mount_host() -> Rc<dyn MountHost> {
	Rc::new(imported::ImportedHost::new())
}

#[cfg(target_arch = "wasm32")]
fn default_hydration_host() -> Rc<dyn HydrationHost> {
	Rc::new(imported::ImportedHost::new())
}

#[cfg(not(target_arch = "wasm32"))]
fn default_mount_host() -> Rc<dyn MountHost> {
	Rc::new(StderrHost::new())
}

#[cfg(not(target_arch = "wasm32"))]
fn default_hydration_host() -> Rc<dyn HydrationHost> {
	Rc::new(UnavailableHydrationHost)
}

/// Default off-wasm mount host: prints every operation to stderr and hands
/// out sequential node ids. Useful for smoke-testing render programs from
/// a native binary.
#[cfg(not(target_arch = "wasm32"))]
pub struct StderrHost {
	next_id: std::cell::Cell<HostNode>,
}

#[cfg(not(target_arch = "wasm32"))]
impl StderrHost {
	/// Creates a stderr host whose first allocated node id is 1.
	pub fn new() -> Self {
		Self {
			next_id: std::cell::Cell::new(1),
		}
	}

	fn allocate(&self) -> HostNode {
		let id = self.next_id.get();
		self.next_id.set(id + 1);
		id
	}
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for StderrHost {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(not(target_arch = "wasm32"))]
impl MountHost for StderrHost {
	fn create_element(&self, tag: &str) -> HostNode {
		let id = self.allocate();
		eprintln!("[host] create_element <{tag}> -> {id}");
		id
	}

	fn create_text(&self, value: &str) -> HostNode {
		let id = self.allocate();
		eprintln!("[host] create_text {value:?} -> {id}");
		id
	}

	fn append_child(&self, parent: HostNode, child: HostNode) {
		eprintln!("[host] append_child {parent} <- {child}");
	}

	fn set_attribute(&self, node: HostNode, name: &str, value: &str) {
		eprintln!("[host] set_attribute {node} {name}={value:?}");
	}

	fn set_text(&self, node: HostNode, value: &str) {
		eprintln!("[host] set_text {node} {value:?}");
	}

	fn register_event(&self, name: &str) {
		eprintln!("[host] register_event {name}");
	}

	fn resolve_portal(&self, target: &str) -> HostNode {
		eprintln!("[host] resolve_portal {target:?} -> 0");
		NULL_NODE
	}
}

/// Default off-wasm hydration host. There is no host tree to read, so
/// every call panics; install a real table before hydrating.
#[cfg(not(target_arch = "wasm32"))]
pub struct UnavailableHydrationHost;

#[cfg(not(target_arch = "wasm32"))]
impl HydrationHost for UnavailableHydrationHost {
	fn first_child(&self, _node: HostNode) -> Option<HostNode> {
		panic!("no hydration host installed");
	}

	fn next_sibling(&self, _node: HostNode) -> Option<HostNode> {
		panic!("no hydration host installed");
	}

	fn node_type(&self, _node: HostNode) -> HostNodeType {
		panic!("no hydration host installed");
	}

	fn tag_name(&self, _node: HostNode) -> String {
		panic!("no hydration host installed");
	}

	fn text_content(&self, _node: HostNode) -> String {
		panic!("no hydration host installed");
	}

	fn get_attribute(&self, _node: HostNode, _name: &str) -> Option<String> {
		panic!("no hydration host installed");
	}

	fn comment_text(&self, _node: HostNode) -> String {
		panic!("no hydration host installed");
	}
}
