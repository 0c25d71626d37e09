//! Mount interpreter.
//!
//! Executes a render program against the installed mount host, creating
//! elements and text nodes under a parent, stamping every element with a
//! `data-hid` attribute, and recording island, portal, and suspense
//! regions as it goes.

use crate::error::{RenderError, RenderResult};
use crate::host::{HostNode, NULL_NODE, with_mount_host};

use super::program::{RenderOp, RenderProgram};
use super::{IslandRecord, MountResult, PortalRecord, SuspenseRecord};

struct IslandFrame {
	name: String,
	parent: HostNode,
	start_slot: usize,
}

struct PortalFrame {
	target: String,
	node: HostNode,
	saved_parent: HostNode,
	saved_stack_len: usize,
	start_slot: usize,
}

struct SuspenseFrame {
	name: String,
	main_start: usize,
	main_end: usize,
	fallback_start: usize,
	has_fallback: bool,
}

/// Mounts `program` under `parent`, filling each dynamic slot with the
/// corresponding entry of `values`.
///
/// Fails with [`RenderError::MismatchedValues`] when the value count does
/// not match the program's slot count, [`RenderError::MissingNode`] when a
/// portal target does not resolve, [`RenderError::StackUnderflow`] on a
/// close op without a matching open, and [`RenderError::InvalidMarkup`]
/// when a region is left open at end of program.
pub fn mount(program: &RenderProgram, parent: HostNode, values: &[&str]) -> RenderResult<MountResult> {
	let expected = program.dynamic_slot_count();
	if values.len() != expected {
		return Err(RenderError::MismatchedValues {
			expected,
			found: values.len(),
		});
	}

	let mut result = MountResult {
		hydration_nodes: vec![NULL_NODE; program.max_hydration_id() as usize + 1],
		..Default::default()
	};
	let mut parent_stack: Vec<HostNode> = Vec::new();
	let mut current_parent = parent;
	let mut islands: Vec<IslandFrame> = Vec::new();
	let mut portals: Vec<PortalFrame> = Vec::new();
	let mut suspense: Vec<SuspenseFrame> = Vec::new();

	for op in program.ops() {
		match op {
			RenderOp::OpenElement { tag, hydration_id } => {
				let node = create_element(tag, current_parent, *hydration_id, &mut result);
				parent_stack.push(current_parent);
				current_parent = node;
			}
			RenderOp::CloseElement { tag } => {
				current_parent = parent_stack.pop().ok_or_else(|| {
					RenderError::StackUnderflow(format!("</{tag}> with no open element"))
				})?;
			}
			RenderOp::SelfElement { tag, hydration_id } => {
				create_element(tag, current_parent, *hydration_id, &mut result);
			}
			RenderOp::Text { literal } => {
				if !literal.is_empty() {
					with_mount_host(|host| {
						let node = host.create_text(literal);
						host.append_child(current_parent, node);
					});
				}
			}
			RenderOp::DynamicText { slot } => {
				let node = with_mount_host(|host| {
					let node = host.create_text(values[*slot]);
					host.append_child(current_parent, node);
					node
				});
				result.dynamic_nodes.push(node);
			}
			RenderOp::IslandStart { name } => {
				islands.push(IslandFrame {
					name: name.clone(),
					parent: current_parent,
					start_slot: result.dynamic_nodes.len(),
				});
			}
			RenderOp::IslandEnd => {
				let frame = islands.pop().ok_or_else(|| {
					RenderError::StackUnderflow("island end without start".to_string())
				})?;
				result.islands.push(IslandRecord {
					name: frame.name,
					parent: frame.parent,
					start_slot: frame.start_slot,
					end_slot: result.dynamic_nodes.len(),
				});
			}
			RenderOp::PortalStart { target } => {
				let node = with_mount_host(|host| host.resolve_portal(target));
				if node == NULL_NODE {
					return Err(RenderError::MissingNode(format!(
						"portal target {target:?} not found"
					)));
				}
				portals.push(PortalFrame {
					target: target.clone(),
					node,
					saved_parent: current_parent,
					saved_stack_len: parent_stack.len(),
					start_slot: result.dynamic_nodes.len(),
				});
				current_parent = node;
			}
			RenderOp::PortalEnd => {
				let frame = portals.pop().ok_or_else(|| {
					RenderError::StackUnderflow("portal end without start".to_string())
				})?;
				if parent_stack.len() != frame.saved_stack_len {
					return Err(RenderError::InvalidMarkup(
						"element left open inside portal".to_string(),
					));
				}
				current_parent = frame.saved_parent;
				result.portals.push(PortalRecord {
					target: frame.target,
					node: frame.node,
					start_slot: frame.start_slot,
					end_slot: result.dynamic_nodes.len(),
				});
			}
			RenderOp::SuspenseStart { name } => {
				let slot = result.dynamic_nodes.len();
				suspense.push(SuspenseFrame {
					name: name.clone(),
					main_start: slot,
					main_end: slot,
					fallback_start: slot,
					has_fallback: false,
				});
			}
			RenderOp::SuspenseFallback => {
				let slot = result.dynamic_nodes.len();
				let frame = suspense.last_mut().ok_or_else(|| {
					RenderError::StackUnderflow("suspense fallback without start".to_string())
				})?;
				frame.main_end = slot;
				frame.fallback_start = slot;
				frame.has_fallback = true;
			}
			RenderOp::SuspenseEnd => {
				let frame = suspense.pop().ok_or_else(|| {
					RenderError::StackUnderflow("suspense end without start".to_string())
				})?;
				let slot = result.dynamic_nodes.len();
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
				result.suspense.push(record);
			}
		}
	}

	if !parent_stack.is_empty() {
		return Err(RenderError::InvalidMarkup(
			"element left open at end of program".to_string(),
		));
	}
	if !islands.is_empty() || !portals.is_empty() || !suspense.is_empty() {
		return Err(RenderError::InvalidMarkup(
			"region left open at end of program".to_string(),
		));
	}

	Ok(result)
}

fn create_element(
	tag: &str,
	parent: HostNode,
	hydration_id: u32,
	result: &mut MountResult,
) -> HostNode {
	with_mount_host(|host| {
		let node = host.create_element(tag);
		host.append_child(parent, node);
		host.set_attribute(node, "data-hid", &hydration_id.to_string());
		if let Some(slot) = result.hydration_nodes.get_mut(hydration_id as usize) {
			*slot = node;
		}
		node
	})
}
