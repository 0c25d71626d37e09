#![allow(dead_code)] // not every suite uses every fixture helper

//! Shared host fixtures for integration tests.
//!
//! `TreeHost` is an in-memory host tree implementing both host tables: the
//! mount side records every call (so tests can assert exact host-call
//! sequences) and builds real parent/child structure; the hydration side
//! walks that structure back. Tests build SSR-like trees with the
//! `new_element`/`new_text`/`new_comment`/`append` helpers.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use ripple_core::host::{
	HostNode, HostNodeType, HydrationHost, MountHost, NULL_NODE, set_hydration_host,
	set_mount_host,
};

/// One node in the fake host tree.
#[derive(Debug, Clone)]
pub enum TreeNode {
	Element {
		tag: String,
		attrs: Vec<(String, String)>,
		children: Vec<HostNode>,
	},
	Text(String),
	Comment(String),
}

/// An in-memory host tree. The pre-created root element has id 1; nodes
/// created through the mount table get ids from 100 upwards.
pub struct TreeHost {
	nodes: RefCell<HashMap<HostNode, TreeNode>>,
	parents: RefCell<HashMap<HostNode, HostNode>>,
	next_id: Cell<HostNode>,
	portals: RefCell<HashMap<String, HostNode>>,
	pub calls: RefCell<Vec<String>>,
	pub registered_events: RefCell<Vec<String>>,
}

impl TreeHost {
	pub fn new() -> Rc<Self> {
		let host = Rc::new(Self {
			nodes: RefCell::new(HashMap::new()),
			parents: RefCell::new(HashMap::new()),
			next_id: Cell::new(100),
			portals: RefCell::new(HashMap::new()),
			calls: RefCell::new(Vec::new()),
			registered_events: RefCell::new(Vec::new()),
		});
		host.nodes.borrow_mut().insert(
			1,
			TreeNode::Element {
				tag: "root".to_string(),
				attrs: Vec::new(),
				children: Vec::new(),
			},
		);
		host
	}

	/// Installs this host as both the mount and hydration table.
	pub fn install(self: &Rc<Self>) {
		set_mount_host(Rc::clone(self) as Rc<dyn MountHost>);
		set_hydration_host(Rc::clone(self) as Rc<dyn HydrationHost>);
	}

	pub fn root(&self) -> HostNode {
		1
	}

	fn allocate(&self, node: TreeNode) -> HostNode {
		let id = self.next_id.get();
		self.next_id.set(id + 1);
		self.nodes.borrow_mut().insert(id, node);
		id
	}

	// --- tree builders (for SSR-like fixtures) --------------------------

	pub fn new_element(&self, tag: &str, attrs: &[(&str, &str)]) -> HostNode {
		self.allocate(TreeNode::Element {
			tag: tag.to_string(),
			attrs: attrs
				.iter()
				.map(|(k, v)| (k.to_string(), v.to_string()))
				.collect(),
			children: Vec::new(),
		})
	}

	pub fn new_text(&self, value: &str) -> HostNode {
		self.allocate(TreeNode::Text(value.to_string()))
	}

	pub fn new_comment(&self, body: &str) -> HostNode {
		self.allocate(TreeNode::Comment(body.to_string()))
	}

	pub fn append(&self, parent: HostNode, child: HostNode) {
		if let Some(TreeNode::Element { children, .. }) = self.nodes.borrow_mut().get_mut(&parent)
		{
			children.push(child);
		}
		self.parents.borrow_mut().insert(child, parent);
	}

	pub fn define_portal(&self, target: &str, node: HostNode) {
		self.portals.borrow_mut().insert(target.to_string(), node);
	}

	// --- inspection -----------------------------------------------------

	pub fn tag_of(&self, node: HostNode) -> Option<String> {
		match self.nodes.borrow().get(&node) {
			Some(TreeNode::Element { tag, .. }) => Some(tag.clone()),
			_ => None,
		}
	}

	pub fn attr_of(&self, node: HostNode, name: &str) -> Option<String> {
		match self.nodes.borrow().get(&node) {
			Some(TreeNode::Element { attrs, .. }) => attrs
				.iter()
				.rev()
				.find(|(k, _)| k == name)
				.map(|(_, v)| v.clone()),
			_ => None,
		}
	}

	pub fn text_of(&self, node: HostNode) -> Option<String> {
		match self.nodes.borrow().get(&node) {
			Some(TreeNode::Text(value)) => Some(value.clone()),
			_ => None,
		}
	}

	pub fn children_of(&self, node: HostNode) -> Vec<HostNode> {
		match self.nodes.borrow().get(&node) {
			Some(TreeNode::Element { children, .. }) => children.clone(),
			_ => Vec::new(),
		}
	}

	pub fn call_log(&self) -> Vec<String> {
		self.calls.borrow().clone()
	}
}

impl MountHost for TreeHost {
	fn create_element(&self, tag: &str) -> HostNode {
		let id = self.new_element(tag, &[]);
		self.calls
			.borrow_mut()
			.push(format!("create_element({tag}) -> {id}"));
		id
	}

	fn create_text(&self, value: &str) -> HostNode {
		let id = self.new_text(value);
		self.calls
			.borrow_mut()
			.push(format!("create_text({value:?}) -> {id}"));
		id
	}

	fn append_child(&self, parent: HostNode, child: HostNode) {
		self.append(parent, child);
		self.calls
			.borrow_mut()
			.push(format!("append_child({parent}, {child})"));
	}

	fn set_attribute(&self, node: HostNode, name: &str, value: &str) {
		if let Some(TreeNode::Element { attrs, .. }) = self.nodes.borrow_mut().get_mut(&node) {
			attrs.push((name.to_string(), value.to_string()));
		}
		self.calls
			.borrow_mut()
			.push(format!("set_attribute({node}, {name}, {value})"));
	}

	fn set_text(&self, node: HostNode, value: &str) {
		if let Some(TreeNode::Text(current)) = self.nodes.borrow_mut().get_mut(&node) {
			*current = value.to_string();
		}
		self.calls
			.borrow_mut()
			.push(format!("set_text({node}, {value:?})"));
	}

	fn register_event(&self, name: &str) {
		self.registered_events.borrow_mut().push(name.to_string());
	}

	fn resolve_portal(&self, target: &str) -> HostNode {
		self.portals
			.borrow()
			.get(target)
			.copied()
			.unwrap_or(NULL_NODE)
	}
}

impl HydrationHost for TreeHost {
	fn first_child(&self, node: HostNode) -> Option<HostNode> {
		self.children_of(node).first().copied()
	}

	fn next_sibling(&self, node: HostNode) -> Option<HostNode> {
		let parent = self.parents.borrow().get(&node).copied()?;
		let siblings = self.children_of(parent);
		let index = siblings.iter().position(|&id| id == node)?;
		siblings.get(index + 1).copied()
	}

	fn node_type(&self, node: HostNode) -> HostNodeType {
		match self.nodes.borrow().get(&node) {
			Some(TreeNode::Element { .. }) => HostNodeType::Element,
			Some(TreeNode::Text(_)) => HostNodeType::Text,
			Some(TreeNode::Comment(_)) => HostNodeType::Comment,
			None => HostNodeType::Other,
		}
	}

	fn tag_name(&self, node: HostNode) -> String {
		self.tag_of(node).unwrap_or_default()
	}

	fn text_content(&self, node: HostNode) -> String {
		self.text_of(node).unwrap_or_default()
	}

	fn get_attribute(&self, node: HostNode, name: &str) -> Option<String> {
		self.attr_of(node, name)
	}

	fn comment_text(&self, node: HostNode) -> String {
		match self.nodes.borrow().get(&node) {
			Some(TreeNode::Comment(body)) => body.clone(),
			_ => String::new(),
		}
	}
}
