//! Template compiler.
//!
//! A template is a string of static markup interleaved with `{{ name }}`
//! placeholders. Compiling splits it into `static_parts` (always one more
//! than the placeholder count) and the trimmed placeholder names. The plan
//! is pure data: the render program builder consumes it at runtime, and
//! [`TemplatePlan::render`] concatenates it with a value list for
//! server-side output.
//!
//! Plans are cheap to clone; [`compiled`] additionally caches them by
//! template content so a template parsed once per process stays parsed.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};

/// A compiled template: static parts and placeholder names.
///
/// Invariant: `static_parts.len() == placeholders.len() + 1`.
///
/// Plans serialize, so a build step can compile templates ahead of time
/// and ship the constant plan instead of the source string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatePlan {
	static_parts: Vec<String>,
	placeholders: Vec<String>,
}

impl TemplatePlan {
	/// Compiles a template string.
	///
	/// Placeholders are `{{ name }}`; ASCII whitespace around the name is
	/// stripped. An unclosed `{{`, a lone `{`, or a `}}` outside a
	/// placeholder fails with [`RenderError::InvalidMarkup`].
	pub fn compile(source: &str) -> RenderResult<Self> {
		let mut static_parts = Vec::new();
		let mut placeholders = Vec::new();
		let mut part = String::new();
		let bytes = source.as_bytes();
		let mut i = 0;

		while i < bytes.len() {
			match bytes[i] {
				b'{' => {
					if bytes.get(i + 1) == Some(&b'{') {
						let body_start = i + 2;
						let Some(close) = find_from(source, body_start, "}}") else {
							return Err(RenderError::InvalidMarkup(
								"unclosed placeholder".to_string(),
							));
						};
						let name = source[body_start..close]
							.trim_matches(|c: char| c.is_ascii_whitespace());
						placeholders.push(name.to_string());
						static_parts.push(std::mem::take(&mut part));
						i = close + 2;
					} else {
						return Err(RenderError::InvalidMarkup(
							"lone '{' outside placeholder".to_string(),
						));
					}
				}
				b'}' if bytes.get(i + 1) == Some(&b'}') => {
					return Err(RenderError::InvalidMarkup(
						"'}}' without preceding '{{'".to_string(),
					));
				}
				_ => {
					let ch_len = utf8_len(bytes[i]);
					part.push_str(&source[i..i + ch_len]);
					i += ch_len;
				}
			}
		}
		static_parts.push(part);

		Ok(Self {
			static_parts,
			placeholders,
		})
	}

	/// The static parts, in order.
	pub fn static_parts(&self) -> &[String] {
		&self.static_parts
	}

	/// The placeholder names, in order.
	pub fn placeholders(&self) -> &[String] {
		&self.placeholders
	}

	/// Number of placeholders.
	pub fn placeholder_count(&self) -> usize {
		self.placeholders.len()
	}

	/// Concatenates static parts and `values` in order.
	///
	/// Fails with [`RenderError::MismatchedValues`] when `values.len()`
	/// differs from the placeholder count.
	pub fn render(&self, values: &[&str]) -> RenderResult<String> {
		if values.len() != self.placeholders.len() {
			return Err(RenderError::MismatchedValues {
				expected: self.placeholders.len(),
				found: values.len(),
			});
		}
		let capacity = self.static_parts.iter().map(String::len).sum::<usize>()
			+ values.iter().map(|v| v.len()).sum::<usize>();
		let mut out = String::with_capacity(capacity);
		for (i, part) in self.static_parts.iter().enumerate() {
			out.push_str(part);
			if let Some(value) = values.get(i) {
				out.push_str(value);
			}
		}
		Ok(out)
	}
}

fn find_from(haystack: &str, start: usize, needle: &str) -> Option<usize> {
	haystack
		.get(start..)
		.and_then(|rest| rest.find(needle))
		.map(|offset| start + offset)
}

fn utf8_len(first_byte: u8) -> usize {
	match first_byte {
		b if b < 0x80 => 1,
		b if b < 0xE0 => 2,
		b if b < 0xF0 => 3,
		_ => 4,
	}
}

thread_local! {
	static PLAN_CACHE: RefCell<HashMap<String, Rc<TemplatePlan>>> = RefCell::new(HashMap::new());
}

/// Compiles `source`, caching the plan by content so repeated calls with
/// the same template parse only once per thread.
pub fn compiled(source: &str) -> RenderResult<Rc<TemplatePlan>> {
	if let Some(plan) = PLAN_CACHE.with(|cache| cache.borrow().get(source).cloned()) {
		return Ok(plan);
	}
	let plan = Rc::new(TemplatePlan::compile(source)?);
	PLAN_CACHE.with(|cache| {
		cache
			.borrow_mut()
			.insert(source.to_string(), Rc::clone(&plan));
	});
	Ok(plan)
}
