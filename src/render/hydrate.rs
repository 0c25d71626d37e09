//! Hydrate interpreter.
//!
//! Walks a server-rendered host tree through the hydration host table,
//! matching it op-by-op against a render program. No nodes are created;
//! the interpreter verifies tags, `data-hid` attributes, static text, and
//! marker comments, and records the real node ids so bindings and event
//! wiring attach to what the server emitted.
//!
//! Non-marker comments in the tree are skipped. Every structural
//! disagreement is an error: the server and client must have rendered the
//! same program.

use crate::error::{RenderError, RenderResult};
use crate::host::{HostNode, HostNodeType, NULL_NODE, with_hydration_host, with_mount_host};

use super::markers::{Marker, parse_marker};
use super::program::{RenderOp, RenderProgram};
use super::{IslandRecord, MountResult, PortalRecord, SuspenseRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
	Root,
	Element,
	Portal,
}

struct Frame {
	node: HostNode,
	tag: String,
	kind: FrameKind,
	/// Next child to consume under `node`.
	cursor: Option<HostNode>,
}

struct IslandFrame {
	name: String,
	parent: HostNode,
	start_slot: usize,
}

struct PortalFrame {
	target: String,
	node: HostNode,
	start_slot: usize,
}

struct SuspenseFrame {
	name: String,
	main_start: usize,
	main_end: usize,
	fallback_start: usize,
	has_fallback: bool,
}

/// Hydrates `program` against the children of `parent`.
///
/// The tree must have been produced by a server rendering of the same
/// program: every element carries `data-hid` in document order, each
/// dynamic slot is a single text node, and region markers appear as
/// comments. Any disagreement fails with
/// [`RenderError::HydrationMismatch`], [`RenderError::UnexpectedNode`], or
/// [`RenderError::MissingNode`].
pub fn hydrate(program: &RenderProgram, parent: HostNode) -> RenderResult<MountResult> {
	let mut hydrator = Hydrator::new(program, parent);
	for op in program.ops() {
		hydrator.step(op)?;
	}
	hydrator.finish()
}

struct Hydrator {
	frames: Vec<Frame>,
	islands: Vec<IslandFrame>,
	portals: Vec<PortalFrame>,
	suspense: Vec<SuspenseFrame>,
	result: MountResult,
}

impl Hydrator {
	fn new(program: &RenderProgram, parent: HostNode) -> Self {
		let cursor = with_hydration_host(|host| host.first_child(parent));
		Self {
			frames: vec![Frame {
				node: parent,
				tag: String::new(),
				kind: FrameKind::Root,
				cursor,
			}],
			islands: Vec::new(),
			portals: Vec::new(),
			suspense: Vec::new(),
			result: MountResult {
				hydration_nodes: vec![NULL_NODE; program.max_hydration_id() as usize + 1],
				..Default::default()
			},
		}
	}

	fn step(&mut self, op: &RenderOp) -> RenderResult<()> {
		match op {
			RenderOp::OpenElement { tag, hydration_id } => {
				let node = self.match_element(tag, *hydration_id)?;
				let cursor = with_hydration_host(|host| host.first_child(node));
				self.frames.push(Frame {
					node,
					tag: tag.clone(),
					kind: FrameKind::Element,
					cursor,
				});
			}
			RenderOp::SelfElement { tag, hydration_id } => {
				self.match_element(tag, *hydration_id)?;
			}
			RenderOp::CloseElement { tag } => {
				let frame = self.frames.pop().ok_or_else(|| {
					RenderError::StackUnderflow(format!("</{tag}> with no open element"))
				})?;
				if frame.kind != FrameKind::Element {
					return Err(RenderError::StackUnderflow(format!(
						"</{tag}> with no open element"
					)));
				}
				if frame.tag != *tag {
					return Err(RenderError::HydrationMismatch(format!(
						"</{tag}> closes <{}>",
						frame.tag
					)));
				}
			}
			RenderOp::Text { literal } => {
				if literal.is_empty() {
					return Ok(());
				}
				let node = self.next_structural_child()?;
				self.expect_node_type(node, HostNodeType::Text)?;
				let content = with_hydration_host(|host| host.text_content(node));
				if content != *literal {
					return Err(RenderError::HydrationMismatch(format!(
						"static text {literal:?} found {content:?}"
					)));
				}
			}
			RenderOp::DynamicText { .. } => {
				let node = self.next_structural_child()?;
				self.expect_node_type(node, HostNodeType::Text)?;
				// The server rendered the value; it is not compared.
				self.result.dynamic_nodes.push(node);
			}
			RenderOp::IslandStart { name } => {
				self.expect_marker(&Marker::IslandStart(name.clone()))?;
				self.islands.push(IslandFrame {
					name: name.clone(),
					parent: self.current_node(),
					start_slot: self.result.dynamic_nodes.len(),
				});
			}
			RenderOp::IslandEnd => {
				self.expect_marker(&Marker::IslandEnd)?;
				let frame = self.islands.pop().ok_or_else(|| {
					RenderError::StackUnderflow("island end without start".to_string())
				})?;
				let end_slot = self.result.dynamic_nodes.len();
				self.result.islands.push(IslandRecord {
					name: frame.name,
					parent: frame.parent,
					start_slot: frame.start_slot,
					end_slot,
				});
			}
			RenderOp::PortalStart { target } => {
				self.expect_marker(&Marker::PortalStart(target.clone()))?;
				let node = with_mount_host(|host| host.resolve_portal(target));
				if node == NULL_NODE {
					return Err(RenderError::MissingNode(format!(
						"portal target {target:?} not found"
					)));
				}
				let cursor = with_hydration_host(|host| host.first_child(node));
				self.portals.push(PortalFrame {
					target: target.clone(),
					node,
					start_slot: self.result.dynamic_nodes.len(),
				});
				self.frames.push(Frame {
					node,
					tag: String::new(),
					kind: FrameKind::Portal,
					cursor,
				});
			}
			RenderOp::PortalEnd => {
				let frame = self.frames.pop().ok_or_else(|| {
					RenderError::StackUnderflow("portal end without start".to_string())
				})?;
				if frame.kind != FrameKind::Portal {
					return Err(RenderError::InvalidMarkup(
						"element left open inside portal".to_string(),
					));
				}
				// The "/portal" marker sits back on the outer frame.
				self.expect_marker(&Marker::PortalEnd)?;
				let portal = self.portals.pop().ok_or_else(|| {
					RenderError::StackUnderflow("portal end without start".to_string())
				})?;
				let end_slot = self.result.dynamic_nodes.len();
				self.result.portals.push(PortalRecord {
					target: portal.target,
					node: portal.node,
					start_slot: portal.start_slot,
					end_slot,
				});
			}
			RenderOp::SuspenseStart { name } => {
				self.expect_marker(&Marker::SuspenseStart(name.clone()))?;
				let slot = self.result.dynamic_nodes.len();
				self.suspense.push(SuspenseFrame {
					name: name.clone(),
					main_start: slot,
					main_end: slot,
					fallback_start: slot,
					has_fallback: false,
				});
			}
			RenderOp::SuspenseFallback => {
				self.expect_marker(&Marker::SuspenseFallback)?;
				let slot = self.result.dynamic_nodes.len();
				let frame = self.suspense.last_mut().ok_or_else(|| {
					RenderError::StackUnderflow("suspense fallback without start".to_string())
				})?;
				frame.main_end = slot;
				frame.fallback_start = slot;
				frame.has_fallback = true;
			}
			RenderOp::SuspenseEnd => {
				self.expect_marker(&Marker::SuspenseEnd)?;
				let frame = self.suspense.pop().ok_or_else(|| {
					RenderError::StackUnderflow("suspense end without start".to_string())
				})?;
				let slot = self.result.dynamic_nodes.len();
				let record = if frame.has_fallback {
					SuspenseRecord {
						name: frame.name,
						main_start_slot: frame.main_start,
						main_end_slot: frame.main_end,
						fallback_start_slot: frame.fallback_start,
						fallback_end_slot: slot,
					}
				} else {
					SuspenseRecord {
						name: frame.name,
						main_start_slot: frame.main_start,
						main_end_slot: slot,
						fallback_start_slot: slot,
						fallback_end_slot: slot,
					}
				};
				self.result.suspense.push(record);
			}
		}
		Ok(())
	}

	fn finish(self) -> RenderResult<MountResult> {
		if self.frames.len() != 1 {
			return Err(RenderError::InvalidMarkup(
				"element left open at end of program".to_string(),
			));
		}
		if !self.islands.is_empty() || !self.portals.is_empty() || !self.suspense.is_empty() {
			return Err(RenderError::InvalidMarkup(
				"region left open at end of program".to_string(),
			));
		}
		Ok(self.result)
	}

	fn current_node(&self) -> HostNode {
		self.frames.last().map_or(NULL_NODE, |frame| frame.node)
	}

	fn current_frame_mut(&mut self) -> &mut Frame {
		// A frame always exists: the root frame is only popped by a
		// malformed program, which errors before reaching here.
		self.frames
			.last_mut()
			.expect("hydrator root frame is never popped")
	}

	/// Matches the next child against an element op: right node type,
	/// right tag, right `data-hid`.
	fn match_element(&mut self, tag: &str, hydration_id: u32) -> RenderResult<HostNode> {
		let node = self.next_structural_child()?;
		self.expect_node_type(node, HostNodeType::Element)?;
		let found_tag = with_hydration_host(|host| host.tag_name(node));
		if found_tag != tag {
			return Err(RenderError::HydrationMismatch(format!(
				"expected <{tag}>, found <{found_tag}>"
			)));
		}
		let found_hid = with_hydration_host(|host| host.get_attribute(node, "data-hid"));
		if found_hid.as_deref() != Some(hydration_id.to_string().as_str()) {
			return Err(RenderError::HydrationMismatch(format!(
				"<{tag}> expected data-hid={hydration_id}, found {found_hid:?}"
			)));
		}
		if let Some(slot) = self.result.hydration_nodes.get_mut(hydration_id as usize) {
			*slot = node;
		}
		Ok(node)
	}

	/// Consumes the next non-comment child of the current frame.
	fn next_structural_child(&mut self) -> RenderResult<HostNode> {
		loop {
			let frame = self.current_frame_mut();
			let Some(node) = frame.cursor else {
				let tag = if frame.tag.is_empty() {
					"root".to_string()
				} else {
					format!("<{}>", frame.tag)
				};
				return Err(RenderError::MissingNode(format!(
					"ran out of children under {tag}"
				)));
			};
			frame.cursor = with_hydration_host(|host| host.next_sibling(node));
			let kind = with_hydration_host(|host| host.node_type(node));
			if kind != HostNodeType::Comment {
				return Ok(node);
			}
		}
	}

	/// Consumes children until a marker comment is found and verifies it
	/// matches `expected`. Non-marker comments are skipped; anything else
	/// is an error.
	fn expect_marker(&mut self, expected: &Marker) -> RenderResult<()> {
		loop {
			let frame = self.current_frame_mut();
			let Some(node) = frame.cursor else {
				return Err(RenderError::MissingNode(format!(
					"expected marker {expected:?}"
				)));
			};
			frame.cursor = with_hydration_host(|host| host.next_sibling(node));
			let kind = with_hydration_host(|host| host.node_type(node));
			if kind != HostNodeType::Comment {
				return Err(RenderError::UnexpectedNode(format!(
					"expected marker {expected:?}, found {kind:?} node"
				)));
			}
			let body = with_hydration_host(|host| host.comment_text(node));
			match parse_marker(&body) {
				Some(found) if found == *expected => return Ok(()),
				Some(found) => {
					return Err(RenderError::HydrationMismatch(format!(
						"expected marker {expected:?}, found {found:?}"
					)));
				}
				None => continue,
			}
		}
	}

	fn expect_node_type(&self, node: HostNode, expected: HostNodeType) -> RenderResult<()> {
		let found = with_hydration_host(|host| host.node_type(node));
		if found != expected {
			return Err(RenderError::UnexpectedNode(format!(
				"expected {expected:?} node, found {found:?}"
			)));
		}
		Ok(())
	}
}
