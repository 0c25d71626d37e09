//! Integration tests for the render program builder.

use ripple_core::error::RenderError;
use ripple_core::render::{RenderOp, RenderProgram};
use ripple_core::template::TemplatePlan;
use rstest::rstest;

fn build(template: &str) -> Result<RenderProgram, RenderError> {
	RenderProgram::build(&TemplatePlan::compile(template).unwrap())
}

#[test]
fn test_dynamic_slots_sit_between_parts() {
	let program = build("<p>{{a}} and {{b}}</p>").unwrap();
	assert_eq!(
		program.ops(),
		[
			RenderOp::OpenElement {
				tag: "p".to_string(),
				hydration_id: 1
			},
			RenderOp::DynamicText { slot: 0 },
			RenderOp::Text {
				literal: " and ".to_string()
			},
			RenderOp::DynamicText { slot: 1 },
			RenderOp::CloseElement {
				tag: "p".to_string()
			},
		]
	);
	assert_eq!(program.dynamic_slot_count(), 2);
}

#[test]
fn test_no_trailing_dynamic_op() {
	let program = build("{{only}}").unwrap();
	assert_eq!(program.ops(), [RenderOp::DynamicText { slot: 0 }]);
}

#[test]
fn test_hydration_ids_count_all_elements() {
	let program = build("<div><br/><span>x</span></div><img/>").unwrap();
	assert_eq!(program.max_hydration_id(), 4);
	assert_eq!(
		program.ops()[1],
		RenderOp::SelfElement {
			tag: "br".to_string(),
			hydration_id: 2
		}
	);
}

#[test]
fn test_marker_comments_emit_region_ops() {
	let program = build(
		"<!--island:hero--><div>x</div><!--/island-->\
		 <!--portal:#modal--><span>y</span><!--/portal-->",
	)
	.unwrap();
	let region_ops: Vec<&RenderOp> = program
		.ops()
		.iter()
		.filter(|op| {
			matches!(
				op,
				RenderOp::IslandStart { .. }
					| RenderOp::IslandEnd
					| RenderOp::PortalStart { .. }
					| RenderOp::PortalEnd
			)
		})
		.collect();
	assert_eq!(region_ops.len(), 4);
	assert_eq!(
		region_ops[2],
		&RenderOp::PortalStart {
			target: "#modal".to_string()
		}
	);
}

#[test]
fn test_non_marker_comment_emits_nothing() {
	let program = build("<!-- build: 2024 --><div>x</div>").unwrap();
	assert!(matches!(&program.ops()[0], RenderOp::OpenElement { .. }));
}

#[test]
fn test_whitespace_preserved_in_text_ops() {
	let program = build("<pre>  two  spaces  </pre>").unwrap();
	assert_eq!(
		program.ops()[1],
		RenderOp::Text {
			literal: "  two  spaces  ".to_string()
		}
	);
}

#[rstest]
#[case::wrong_close("<div></p>")]
#[case::unclosed("<div>")]
#[case::only_close("</div>")]
#[case::unclosed_comment("<!-- never ends")]
#[case::unclosed_tag_body("<div class=\"x\"")]
fn test_invalid_markup_cases(#[case] template: &str) {
	let err = build(template).unwrap_err();
	assert!(matches!(err, RenderError::InvalidMarkup(_)));
}

#[test]
fn test_attribute_quote_toggling() {
	// '>' and '/' inside quoted attributes must not close the tag or make
	// it self-closing.
	let program = build("<a href=\"/x?a>b\" title='5 > 4'>link</a>").unwrap();
	assert_eq!(
		program.ops()[0],
		RenderOp::OpenElement {
			tag: "a".to_string(),
			hydration_id: 1
		}
	);
	assert_eq!(
		program.ops()[1],
		RenderOp::Text {
			literal: "link".to_string()
		}
	);
}
