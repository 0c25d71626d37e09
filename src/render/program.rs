//! Render program builder.
//!
//! A [`RenderProgram`] is the linear op vector both interpreters execute.
//! Building one walks the template plan's static parts in document order,
//! parsing minimal markup: elements (open / close / self-closing),
//! metadata comments, and raw text runs. A `DynamicText` op is emitted
//! between consecutive static parts for each placeholder. Hydration ids
//! are assigned to elements in document order, starting at 1.

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};
use crate::template::TemplatePlan;

use super::markers::{Marker, parse_marker};

/// One operation in a render program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderOp {
	/// Create an element and make it the current parent.
	OpenElement {
		/// The element tag.
		tag: String,
		/// Document-order hydration id (1-based).
		hydration_id: u32,
	},
	/// Close the current element.
	CloseElement {
		/// The tag being closed (for mismatch diagnostics).
		tag: String,
	},
	/// Create a self-closing element.
	SelfElement {
		/// The element tag.
		tag: String,
		/// Document-order hydration id (1-based).
		hydration_id: u32,
	},
	/// Static text content.
	Text {
		/// The raw text slice, whitespace included.
		literal: String,
	},
	/// A dynamic text slot.
	DynamicText {
		/// Index into the dynamic value list.
		slot: usize,
	},
	/// Opens an island region.
	IslandStart {
		/// The island name.
		name: String,
	},
	/// Closes the innermost island region.
	IslandEnd,
	/// Redirects output to a portal target.
	PortalStart {
		/// The portal target selector.
		target: String,
	},
	/// Returns output to the pre-portal parent.
	PortalEnd,
	/// Opens a suspense region.
	SuspenseStart {
		/// The suspense region name.
		name: String,
	},
	/// Separates suspense main content from its fallback.
	SuspenseFallback,
	/// Closes the innermost suspense region.
	SuspenseEnd,
}

/// An immutable program of render ops plus the highest hydration id it
/// assigns.
///
/// Programs serialize alongside [`TemplatePlan`], so pre-built programs
/// can be emitted at build time and loaded as constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderProgram {
	ops: Vec<RenderOp>,
	max_hydration_id: u32,
}

impl RenderProgram {
	/// Builds a program from a compiled template plan.
	pub fn build(plan: &TemplatePlan) -> RenderResult<Self> {
		let mut builder = ProgramBuilder::default();
		let placeholder_count = plan.placeholder_count();
		for (i, part) in plan.static_parts().iter().enumerate() {
			builder.scan_static(part)?;
			if i < placeholder_count {
				builder.ops.push(RenderOp::DynamicText { slot: i });
			}
		}
		builder.finish()
	}

	/// The ops, in execution order.
	pub fn ops(&self) -> &[RenderOp] {
		&self.ops
	}

	/// The highest hydration id assigned, or 0 for a program with no
	/// elements.
	pub fn max_hydration_id(&self) -> u32 {
		self.max_hydration_id
	}

	/// Number of dynamic text slots.
	pub fn dynamic_slot_count(&self) -> usize {
		self.ops
			.iter()
			.filter(|op| matches!(op, RenderOp::DynamicText { .. }))
			.count()
	}
}

#[derive(Default)]
struct ProgramBuilder {
	ops: Vec<RenderOp>,
	tag_stack: Vec<String>,
	next_hydration_id: u32,
}

impl ProgramBuilder {
	fn allocate_hydration_id(&mut self) -> u32 {
		self.next_hydration_id += 1;
		self.next_hydration_id
	}

	fn finish(self) -> RenderResult<RenderProgram> {
		if let Some(open) = self.tag_stack.last() {
			return Err(RenderError::InvalidMarkup(format!(
				"unclosed <{open}> at end of template"
			)));
		}
		Ok(RenderProgram {
			ops: self.ops,
			max_hydration_id: self.next_hydration_id,
		})
	}

	fn scan_static(&mut self, part: &str) -> RenderResult<()> {
		let bytes = part.as_bytes();
		let mut i = 0;
		while i < bytes.len() {
			if part[i..].starts_with("<!--") {
				let body_start = i + 4;
				let Some(end) = find_from(part, body_start, "-->") else {
					return Err(RenderError::InvalidMarkup("unclosed comment".to_string()));
				};
				if let Some(marker) = parse_marker(&part[body_start..end]) {
					self.ops.push(marker_op(marker));
				}
				i = end + 3;
			} else if bytes[i] == b'<' {
				i = self.scan_tag(part, i)?;
			} else {
				let next_tag = find_from(part, i, "<").unwrap_or(part.len());
				let literal = &part[i..next_tag];
				if !literal.is_empty() {
					self.ops.push(RenderOp::Text {
						literal: literal.to_string(),
					});
				}
				i = next_tag;
			}
		}
		Ok(())
	}

	/// Scans one `<...>` construct starting at `start`; returns the index
	/// just past its closing `>`.
	fn scan_tag(&mut self, part: &str, start: usize) -> RenderResult<usize> {
		let bytes = part.as_bytes();
		let closing = bytes.get(start + 1) == Some(&b'/');
		let name_start = if closing { start + 2 } else { start + 1 };

		let mut name_end = name_start;
		while name_end < bytes.len() && is_tag_char(bytes[name_end]) {
			name_end += 1;
		}
		if name_end == name_start {
			return Err(RenderError::InvalidMarkup(format!(
				"malformed tag at byte {start}"
			)));
		}
		let tag = part[name_start..name_end].to_string();

		// Scan the rest of the tag, toggling quote state so '>' inside
		// attribute values does not terminate it.
		let mut in_quote: Option<u8> = None;
		let mut i = name_end;
		let end = loop {
			let Some(&byte) = bytes.get(i) else {
				return Err(RenderError::InvalidMarkup(format!("unclosed <{tag}>")));
			};
			match (byte, in_quote) {
				(b'"' | b'\'', None) => in_quote = Some(byte),
				(byte, Some(quote)) if byte == quote => in_quote = None,
				(b'>', None) => break i,
				_ => {}
			}
			i += 1;
		};

		if closing {
			match self.tag_stack.pop() {
				Some(open) if open == tag => {}
				Some(open) => {
					return Err(RenderError::InvalidMarkup(format!(
						"</{tag}> closes <{open}>"
					)));
				}
				None => {
					return Err(RenderError::InvalidMarkup(format!(
						"</{tag}> without open tag"
					)));
				}
			}
			self.ops.push(RenderOp::CloseElement { tag });
		} else {
			let self_closing = part[name_end..end].trim_end().ends_with('/');
			let hydration_id = self.allocate_hydration_id();
			if self_closing {
				self.ops.push(RenderOp::SelfElement { tag, hydration_id });
			} else {
				self.tag_stack.push(tag.clone());
				self.ops.push(RenderOp::OpenElement { tag, hydration_id });
			}
		}
		Ok(end + 1)
	}
}

fn marker_op(marker: Marker) -> RenderOp {
	match marker {
		Marker::IslandStart(name) => RenderOp::IslandStart { name },
		Marker::IslandEnd => RenderOp::IslandEnd,
		Marker::PortalStart(target) => RenderOp::PortalStart { target },
		Marker::PortalEnd => RenderOp::PortalEnd,
		Marker::SuspenseStart(name) => RenderOp::SuspenseStart { name },
		Marker::SuspenseFallback => RenderOp::SuspenseFallback,
		Marker::SuspenseEnd => RenderOp::SuspenseEnd,
	}
}

fn is_tag_char(byte: u8) -> bool {
	byte.is_ascii_alphanumeric() || byte == b'-' || byte == b':'
}

fn find_from(haystack: &str, start: usize, needle: &str) -> Option<usize> {
	haystack
		.get(start..)
		.and_then(|rest| rest.find(needle))
		.map(|offset| start + offset)
}
