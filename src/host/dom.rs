//! web-sys backed host for embedders running under wasm-bindgen.
//!
//! `DomHost` implements both host tables directly against the browser DOM,
//! interning every node it touches so the rest of the runtime can keep
//! working with plain `u32` handles. `register_event` installs one
//! document-level listener per event name and feeds browser events into
//! the runtime's delegation registry.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use super::{HostNode, HostNodeType, HydrationHost, MountHost, NULL_NODE};
use crate::events::{self, DispatchOptions};

struct DomHostInner {
	document: web_sys::Document,
	/// Interned nodes; a handle is its index + 1.
	nodes: RefCell<Vec<web_sys::Node>>,
}

impl DomHostInner {
	fn intern(&self, node: web_sys::Node) -> HostNode {
		if let Some(id) = self.id_of(&node) {
			return id;
		}
		let mut nodes = self.nodes.borrow_mut();
		nodes.push(node);
		nodes.len() as HostNode
	}

	fn id_of(&self, node: &web_sys::Node) -> Option<HostNode> {
		self.nodes
			.borrow()
			.iter()
			.position(|known| known.is_same_node(Some(node)))
			.map(|index| (index + 1) as HostNode)
	}

	fn node(&self, id: HostNode) -> Option<web_sys::Node> {
		self.nodes.borrow().get(id.checked_sub(1)? as usize).cloned()
	}
}

/// A host table backed by the live browser document.
#[derive(Clone)]
pub struct DomHost {
	inner: Rc<DomHostInner>,
}

impl DomHost {
	/// Creates a host bound to the window's document.
	pub fn new() -> Self {
		let document = web_sys::window()
			.expect("window should be available")
			.document()
			.expect("document should be available");
		Self {
			inner: Rc::new(DomHostInner {
				document,
				nodes: RefCell::new(Vec::new()),
			}),
		}
	}

	/// Interns an existing element (typically the mount/hydration root)
	/// and returns its handle.
	pub fn register_root(&self, element: &web_sys::Element) -> HostNode {
		self.inner.intern(element.clone().into())
	}

	/// The handle previously assigned to `node`, if this host has seen it.
	pub fn lookup(&self, node: &web_sys::Node) -> Option<HostNode> {
		self.inner.id_of(node)
	}
}

impl Default for DomHost {
	fn default() -> Self {
		Self::new()
	}
}

impl MountHost for DomHost {
	fn create_element(&self, tag: &str) -> HostNode {
		match self.inner.document.create_element(tag) {
			Ok(element) => self.inner.intern(element.into()),
			Err(_) => NULL_NODE,
		}
	}

	fn create_text(&self, value: &str) -> HostNode {
		let text = self.inner.document.create_text_node(value);
		self.inner.intern(text.into())
	}

	fn append_child(&self, parent: HostNode, child: HostNode) {
		let (Some(parent), Some(child)) = (self.inner.node(parent), self.inner.node(child)) else {
			return;
		};
		if parent.append_child(&child).is_err() {
			crate::warn_log!("append_child rejected by the DOM");
		}
	}

	fn set_attribute(&self, node: HostNode, name: &str, value: &str) {
		let Some(node) = self.inner.node(node) else {
			return;
		};
		if let Some(element) = node.dyn_ref::<web_sys::Element>() {
			if element.set_attribute(name, value).is_err() {
				crate::warn_log!("set_attribute({name}) rejected by the DOM");
			}
		}
	}

	fn set_text(&self, node: HostNode, value: &str) {
		if let Some(node) = self.inner.node(node) {
			node.set_text_content(Some(value));
		}
	}

	fn register_event(&self, name: &str) {
		let host = self.clone();
		let event_name = name.to_string();
		let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
			let Some(target) = event
				.target()
				.and_then(|t| t.dyn_into::<web_sys::Node>().ok())
			else {
				return;
			};
			// Build the propagation path out of nodes this host has
			// handed to the runtime, target first.
			let mut path = Vec::new();
			let mut cursor = Some(target);
			while let Some(node) = cursor {
				if let Some(id) = host.inner.id_of(&node) {
					path.push(id);
				}
				cursor = node.parent_node();
			}
			let Some(&target_id) = path.first() else {
				return;
			};
			// CustomEvent detail, if present, crosses as JSON.
			let detail = js_sys::Reflect::get(event.as_ref(), &"detail".into())
				.ok()
				.filter(|value| !value.is_undefined() && !value.is_null())
				.and_then(|value| js_sys::JSON::stringify(&value).ok())
				.and_then(|json| json.as_string());
			let detail_data = detail
				.as_deref()
				.and_then(|json| serde_json::from_str(json).ok());
			let prevented = events::dispatch(
				&event_name,
				target_id,
				DispatchOptions {
					path: &path,
					bubbles: true,
					detail,
					detail_data,
				},
			);
			if prevented {
				event.prevent_default();
			}
		});
		if self
			.inner
			.document
			.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
			.is_err()
		{
			crate::warn_log!("failed to register document listener for {name}");
		}
		// The listener lives for the rest of the page.
		closure.forget();
	}

	fn resolve_portal(&self, target: &str) -> HostNode {
		match self.inner.document.query_selector(target) {
			Ok(Some(element)) => self.inner.intern(element.into()),
			_ => NULL_NODE,
		}
	}
}

impl HydrationHost for DomHost {
	fn first_child(&self, node: HostNode) -> Option<HostNode> {
		let child = self.inner.node(node)?.first_child()?;
		Some(self.inner.intern(child))
	}

	fn next_sibling(&self, node: HostNode) -> Option<HostNode> {
		let sibling = self.inner.node(node)?.next_sibling()?;
		Some(self.inner.intern(sibling))
	}

	fn node_type(&self, node: HostNode) -> HostNodeType {
		match self.inner.node(node).map(|n| n.node_type()) {
			Some(web_sys::Node::ELEMENT_NODE) => HostNodeType::Element,
			Some(web_sys::Node::TEXT_NODE) => HostNodeType::Text,
			Some(web_sys::Node::COMMENT_NODE) => HostNodeType::Comment,
			_ => HostNodeType::Other,
		}
	}

	fn tag_name(&self, node: HostNode) -> String {
		self.inner
			.node(node)
			.and_then(|n| n.dyn_into::<web_sys::Element>().ok())
			.map(|element| element.tag_name().to_ascii_lowercase())
			.unwrap_or_default()
	}

	fn text_content(&self, node: HostNode) -> String {
		self.inner
			.node(node)
			.and_then(|n| n.text_content())
			.unwrap_or_default()
	}

	fn get_attribute(&self, node: HostNode, name: &str) -> Option<String> {
		self.inner
			.node(node)?
			.dyn_into::<web_sys::Element>()
			.ok()?
			.get_attribute(name)
	}

	fn comment_text(&self, node: HostNode) -> String {
		self.inner
			.node(node)
			.and_then(|n| n.text_content())
			.unwrap_or_default()
	}
}
