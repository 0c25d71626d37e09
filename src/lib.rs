//! Ripple Core - Reactive Runtime for WebAssembly Hosts
//!
//! The core of a fine-grained reactive user-interface runtime: a signal
//! graph with batched scheduling, and a render/hydration pipeline that
//! turns templates into host-tree operations.
//!
//! ## Features
//!
//! - **Fine-grained Reactivity**: Signals, effects, memos, and resources
//!   with automatic dependency tracking and FIFO, deduplicated scheduling
//! - **Templates to Programs**: `{{ name }}` templates compile to a plan;
//!   plans build into a linear op program
//! - **Mount or Hydrate**: The same program either creates host nodes or
//!   attaches to a server-rendered tree, tracking islands, portals, and
//!   suspense regions either way
//! - **Narrow Host Surface**: All host manipulation goes through a small
//!   pluggable callback table; the core never owns the DOM
//! - **Single-threaded by Design**: No locks, no atomics; one runtime per
//!   thread
//!
//! ## Architecture
//!
//! - [`reactive`]: signal graph, scheduler, context, error boundaries
//! - [`template`]: template string to `TemplatePlan`
//! - [`render`]: plan to `RenderProgram`; mount and hydrate interpreters
//! - [`host`]: the mount/hydration callback tables and their defaults
//! - [`events`]: per-event-name delegation registry and synthetic events
//! - [`binding`]: signal-to-text-node bindings
//!
//! ## Example
//!
//! ```ignore
//! use ripple_core::prelude::*;
//!
//! let plan = TemplatePlan::compile("<div>Hello {{ name }}</div>")?;
//! let program = RenderProgram::build(&plan)?;
//! let mounted = mount(&program, root, &["Ripple"])?;
//!
//! let name = Signal::new("Ripple".to_string());
//! let _binding = bind_text(mounted.dynamic_nodes[0], &name);
//! name.set("Wave".to_string()); // host text updates synchronously
//! ```

#![warn(missing_docs)]

pub mod binding;
pub mod error;
pub mod events;
pub mod host;
pub mod logging;
pub mod reactive;
pub mod render;
pub mod template;

pub use binding::{TextBinding, bind_text};
pub use error::{RenderError, RenderResult};
pub use events::{DispatchOptions, EventHandler, ListenerOptions, SyntheticEvent};
pub use host::{HostNode, HostNodeType, HydrationHost, MountHost, NULL_NODE};
pub use reactive::{
	Effect, EffectError, Memo, Resource, ResourceState, Signal, SuspenseBoundary, batch,
	create_resource, provide_context, use_context,
};
pub use render::{
	IslandRecord, MountResult, PortalRecord, RenderOp, RenderProgram, SuspenseRecord, hydrate,
	mount,
};
pub use template::TemplatePlan;

/// Commonly used types, for glob import.
pub mod prelude {
	pub use crate::binding::{TextBinding, bind_text};
	pub use crate::error::{RenderError, RenderResult};
	pub use crate::events::{
		DispatchOptions, EventHandler, ListenerOptions, SyntheticEvent, add_listener, dispatch,
		remove_listener,
	};
	pub use crate::host::{
		HostNode, HostNodeType, HydrationHost, MountHost, set_hydration_host, set_mount_host,
	};
	pub use crate::reactive::{
		Effect, EffectError, Memo, Resource, ResourceState, Signal, SuspenseBoundary, batch,
		begin_batch, create_resource, provide_context, push_error_boundary, untrack, use_context,
		with_context,
	};
	pub use crate::render::{MountResult, RenderProgram, hydrate, mount};
	pub use crate::template::TemplatePlan;
}
