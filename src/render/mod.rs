//! Render engine: program building, mounting, and hydration.
//!
//! A compiled [`TemplatePlan`](crate::template::TemplatePlan) becomes a
//! [`RenderProgram`], a linear op vector. [`mount`] executes the program
//! against the installed mount host, creating nodes; [`hydrate`] walks an
//! existing server-rendered tree through the hydration host and attaches
//! to it. Both produce the same [`MountResult`] shape, so downstream
//! bindings and event wiring do not care which path ran.

pub mod hydrate;
pub mod markers;
pub mod mount;
pub mod program;

pub use hydrate::hydrate;
pub use mount::mount;
pub use program::{RenderOp, RenderProgram};

use crate::host::{HostNode, NULL_NODE};

/// An island region found while interpreting a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IslandRecord {
	/// The island name.
	pub name: String,
	/// The parent node the island's content was appended under.
	pub parent: HostNode,
	/// First dynamic slot inside the island.
	pub start_slot: usize,
	/// One past the last dynamic slot inside the island.
	pub end_slot: usize,
}

/// A portal region found while interpreting a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalRecord {
	/// The portal target selector.
	pub target: String,
	/// The resolved portal node.
	pub node: HostNode,
	/// First dynamic slot rendered into the portal.
	pub start_slot: usize,
	/// One past the last dynamic slot rendered into the portal.
	pub end_slot: usize,
}

/// A suspense region found while interpreting a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuspenseRecord {
	/// The suspense region name.
	pub name: String,
	/// First dynamic slot of the main content.
	pub main_start_slot: usize,
	/// One past the last dynamic slot of the main content.
	pub main_end_slot: usize,
	/// First dynamic slot of the fallback content.
	pub fallback_start_slot: usize,
	/// One past the last dynamic slot of the fallback content.
	pub fallback_end_slot: usize,
}

/// The output of [`mount`] or [`hydrate`].
///
/// All strings are owned by the result and freed with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountResult {
	/// Dynamic text nodes, indexed by slot.
	pub dynamic_nodes: Vec<HostNode>,
	/// Element nodes indexed by hydration id; index 0 is unused.
	pub hydration_nodes: Vec<HostNode>,
	/// Island regions, in document order.
	pub islands: Vec<IslandRecord>,
	/// Portal regions, in document order.
	pub portals: Vec<PortalRecord>,
	/// Suspense regions, in document order.
	pub suspense: Vec<SuspenseRecord>,
}

impl MountResult {
	/// The element recorded for a hydration id, or `None` when the id is
	/// out of range or unassigned.
	pub fn node_for_hydration_id(&self, hydration_id: u32) -> Option<HostNode> {
		match self.hydration_nodes.get(hydration_id as usize) {
			Some(&node) if node != NULL_NODE => Some(node),
			_ => None,
		}
	}
}
