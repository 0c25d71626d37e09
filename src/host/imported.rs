//! Imported host bridge for WebAssembly embedders.
//!
//! The embedder exports the `ripple_dom_*` functions as module imports;
//! this host forwards every table operation to them. Strings cross the
//! boundary as `(pointer, length)` pairs with no null termination. Reads
//! that return strings use a two-call probe: the first call with a null
//! buffer reports the needed length, the second fills a buffer of that
//! size. `get_attribute` returns a negative length for a missing
//! attribute.

use super::{HostNode, HostNodeType, HydrationHost, MountHost, NULL_NODE};

extern "C" {
	fn ripple_dom_create_element(tag_ptr: *const u8, tag_len: usize) -> u32;
	fn ripple_dom_create_text(value_ptr: *const u8, value_len: usize) -> u32;
	fn ripple_dom_append_child(parent: u32, child: u32);
	fn ripple_dom_set_attribute(
		node: u32,
		name_ptr: *const u8,
		name_len: usize,
		value_ptr: *const u8,
		value_len: usize,
	);
	fn ripple_dom_set_text(node: u32, value_ptr: *const u8, value_len: usize);
	fn ripple_dom_register_event(name_ptr: *const u8, name_len: usize);
	fn ripple_dom_resolve_portal(target_ptr: *const u8, target_len: usize) -> u32;

	fn ripple_dom_first_child(node: u32) -> u32;
	fn ripple_dom_next_sibling(node: u32) -> u32;
	fn ripple_dom_node_type(node: u32) -> u32;
	fn ripple_dom_tag_name(node: u32, buf: *mut u8, cap: usize) -> usize;
	fn ripple_dom_text_content(node: u32, buf: *mut u8, cap: usize) -> usize;
	fn ripple_dom_comment_text(node: u32, buf: *mut u8, cap: usize) -> usize;
	fn ripple_dom_get_attribute(
		node: u32,
		name_ptr: *const u8,
		name_len: usize,
		buf: *mut u8,
		cap: usize,
	) -> isize;
}

/// Reads a host string through the probe-then-fill protocol.
fn read_host_string(read: impl Fn(*mut u8, usize) -> usize) -> String {
	let needed = read(std::ptr::null_mut(), 0);
	if needed == 0 {
		return String::new();
	}
	let mut buf = vec![0u8; needed];
	let written = read(buf.as_mut_ptr(), buf.len());
	buf.truncate(written.min(needed));
	String::from_utf8_lossy(&buf).into_owned()
}

/// Host table backed by the embedder's `ripple_dom_*` imports. This is the
/// default table on wasm32.
pub struct ImportedHost;

impl ImportedHost {
	/// Creates the imported bridge.
	pub fn new() -> Self {
		Self
	}
}

impl Default for ImportedHost {
	fn default() -> Self {
		Self::new()
	}
}

impl MountHost for ImportedHost {
	fn create_element(&self, tag: &str) -> HostNode {
		unsafe { ripple_dom_create_element(tag.as_ptr(), tag.len()) }
	}

	fn create_text(&self, value: &str) -> HostNode {
		unsafe { ripple_dom_create_text(value.as_ptr(), value.len()) }
	}

	fn append_child(&self, parent: HostNode, child: HostNode) {
		unsafe { ripple_dom_append_child(parent, child) }
	}

	fn set_attribute(&self, node: HostNode, name: &str, value: &str) {
		unsafe {
			ripple_dom_set_attribute(node, name.as_ptr(), name.len(), value.as_ptr(), value.len())
		}
	}

	fn set_text(&self, node: HostNode, value: &str) {
		unsafe { ripple_dom_set_text(node, value.as_ptr(), value.len()) }
	}

	fn register_event(&self, name: &str) {
		unsafe { ripple_dom_register_event(name.as_ptr(), name.len()) }
	}

	fn resolve_portal(&self, target: &str) -> HostNode {
		unsafe { ripple_dom_resolve_portal(target.as_ptr(), target.len()) }
	}
}

impl HydrationHost for ImportedHost {
	fn first_child(&self, node: HostNode) -> Option<HostNode> {
		let child = unsafe { ripple_dom_first_child(node) };
		(child != NULL_NODE).then_some(child)
	}

	fn next_sibling(&self, node: HostNode) -> Option<HostNode> {
		let sibling = unsafe { ripple_dom_next_sibling(node) };
		(sibling != NULL_NODE).then_some(sibling)
	}

	fn node_type(&self, node: HostNode) -> HostNodeType {
		match unsafe { ripple_dom_node_type(node) } {
			1 => HostNodeType::Element,
			2 => HostNodeType::Text,
			3 => HostNodeType::Comment,
			_ => HostNodeType::Other,
		}
	}

	fn tag_name(&self, node: HostNode) -> String {
		read_host_string(|buf, cap| unsafe { ripple_dom_tag_name(node, buf, cap) })
	}

	fn text_content(&self, node: HostNode) -> String {
		read_host_string(|buf, cap| unsafe { ripple_dom_text_content(node, buf, cap) })
	}

	fn get_attribute(&self, node: HostNode, name: &str) -> Option<String> {
		let needed = unsafe {
			ripple_dom_get_attribute(node, name.as_ptr(), name.len(), std::ptr::null_mut(), 0)
		};
		if needed < 0 {
			return None;
		}
		let needed = needed as usize;
		if needed == 0 {
			return Some(String::new());
		}
		let mut buf = vec![0u8; needed];
		let written = unsafe {
			ripple_dom_get_attribute(node, name.as_ptr(), name.len(), buf.as_mut_ptr(), buf.len())
		};
		let written = written.max(0) as usize;
		buf.truncate(written.min(needed));
		Some(String::from_utf8_lossy(&buf).into_owned())
	}

	fn comment_text(&self, node: HostNode) -> String {
		read_host_string(|buf, cap| unsafe { ripple_dom_comment_text(node, buf, cap) })
	}
}
