//! Integration tests for the hydrate interpreter.

mod common;

use common::TreeHost;
use ripple_core::error::RenderError;
use ripple_core::host::HostNode;
use ripple_core::render::{RenderProgram, hydrate, mount};
use ripple_core::template::TemplatePlan;
use serial_test::serial;
use std::rc::Rc;

fn program(template: &str) -> RenderProgram {
	RenderProgram::build(&TemplatePlan::compile(template).unwrap()).unwrap()
}

/// Builds the SSR tree a server would emit for the island greeting
/// template: markers as comments, elements stamped with data-hid, dynamic
/// text as its own node.
fn build_island_tree(host: &Rc<TreeHost>, dynamic_value: &str) -> (HostNode, HostNode) {
	let root = host.root();
	host.append(root, host.new_comment("island:hero"));
	let div = host.new_element("div", &[("data-hid", "1")]);
	host.append(root, div);
	host.append(div, host.new_text("Hello "));
	let dynamic = host.new_text(dynamic_value);
	host.append(div, dynamic);
	host.append(root, host.new_comment("/island"));
	(div, dynamic)
}

/// Hydration attaches to the server-emitted nodes: the dynamic slot maps
/// to the real text node and hydration ids map to the real elements.
#[test]
#[serial]
fn test_hydrate_island_greeting() {
	let host = TreeHost::new();
	host.install();
	let (div, dynamic) = build_island_tree(&host, "Ripple");

	let program = program("<!--island:hero--><div>Hello {{name}}</div><!--/island-->");
	let result = hydrate(&program, host.root()).unwrap();

	assert_eq!(result.dynamic_nodes, vec![dynamic]);
	assert_eq!(result.node_for_hydration_id(1), Some(div));
	assert_eq!(result.islands.len(), 1);
	assert_eq!(result.islands[0].name, "hero");
	assert_eq!(result.islands[0].parent, host.root());
	assert_eq!(result.islands[0].start_slot, 0);
	assert_eq!(result.islands[0].end_slot, 1);

	// No nodes were created while hydrating.
	assert!(host.call_log().is_empty());
}

/// The dynamic slot's server-rendered value is not compared.
#[test]
#[serial]
fn test_hydrate_ignores_dynamic_text_content() {
	let host = TreeHost::new();
	host.install();
	build_island_tree(&host, "completely different value");

	let program = program("<!--island:hero--><div>Hello {{name}}</div><!--/island-->");
	assert!(hydrate(&program, host.root()).is_ok());
}

/// Mounting and hydrating the same program produce the same result shape.
#[test]
#[serial]
fn test_mount_hydrate_equivalence() {
	let template = "<!--suspense:start feed--><section><p>{{headline}}</p></section>\
	 <!--suspense:fallback--><p>{{placeholder}}</p><!--/suspense-->";
	let program = program(template);

	// Mount into one host.
	let mount_host = TreeHost::new();
	mount_host.install();
	let mounted = mount(&program, mount_host.root(), &["News", "..."]).unwrap();

	// Build the server tree the mount implies (plus marker comments) in a
	// second host and hydrate it.
	let ssr = TreeHost::new();
	let root = ssr.root();
	ssr.append(root, ssr.new_comment("suspense:start feed"));
	let section = ssr.new_element("section", &[("data-hid", "1")]);
	ssr.append(root, section);
	let p_main = ssr.new_element("p", &[("data-hid", "2")]);
	ssr.append(section, p_main);
	ssr.append(p_main, ssr.new_text("News"));
	ssr.append(root, ssr.new_comment("suspense:fallback"));
	let p_fallback = ssr.new_element("p", &[("data-hid", "3")]);
	ssr.append(root, p_fallback);
	ssr.append(p_fallback, ssr.new_text("..."));
	ssr.append(root, ssr.new_comment("/suspense"));
	ssr.install();

	let hydrated = hydrate(&program, ssr.root()).unwrap();

	assert_eq!(hydrated.dynamic_nodes.len(), mounted.dynamic_nodes.len());
	assert_eq!(hydrated.suspense, mounted.suspense);
	assert_eq!(hydrated.islands, mounted.islands);
	assert_eq!(
		hydrated.hydration_nodes.len(),
		mounted.hydration_nodes.len()
	);
	// Same hydration-id -> element relationship, against each host's ids.
	assert_eq!(hydrated.node_for_hydration_id(1), Some(section));
	assert_eq!(hydrated.node_for_hydration_id(2), Some(p_main));
	assert_eq!(hydrated.node_for_hydration_id(3), Some(p_fallback));
}

#[test]
#[serial]
fn test_hydrate_wrong_tag_fails() {
	let host = TreeHost::new();
	host.install();
	let span = host.new_element("span", &[("data-hid", "1")]);
	host.append(host.root(), span);

	let program = program("<div></div>");
	let err = hydrate(&program, host.root()).unwrap_err();
	assert!(matches!(err, RenderError::HydrationMismatch(_)));
}

#[test]
#[serial]
fn test_hydrate_wrong_hydration_id_fails() {
	let host = TreeHost::new();
	host.install();
	let div = host.new_element("div", &[("data-hid", "7")]);
	host.append(host.root(), div);

	let program = program("<div></div>");
	let err = hydrate(&program, host.root()).unwrap_err();
	assert!(matches!(err, RenderError::HydrationMismatch(_)));
}

#[test]
#[serial]
fn test_hydrate_missing_hid_attribute_fails() {
	let host = TreeHost::new();
	host.install();
	let div = host.new_element("div", &[]);
	host.append(host.root(), div);

	let program = program("<div></div>");
	let err = hydrate(&program, host.root()).unwrap_err();
	assert!(matches!(err, RenderError::HydrationMismatch(_)));
}

#[test]
#[serial]
fn test_hydrate_static_text_mismatch_fails() {
	let host = TreeHost::new();
	host.install();
	let div = host.new_element("div", &[("data-hid", "1")]);
	host.append(host.root(), div);
	host.append(div, host.new_text("goodbye"));

	let program = program("<div>hello</div>");
	let err = hydrate(&program, host.root()).unwrap_err();
	assert!(matches!(err, RenderError::HydrationMismatch(_)));
}

#[test]
#[serial]
fn test_hydrate_out_of_children_fails() {
	let host = TreeHost::new();
	host.install();

	let program = program("<div></div>");
	let err = hydrate(&program, host.root()).unwrap_err();
	assert!(matches!(err, RenderError::MissingNode(_)));
}

#[test]
#[serial]
fn test_hydrate_element_where_text_expected_fails() {
	let host = TreeHost::new();
	host.install();
	let div = host.new_element("div", &[("data-hid", "1")]);
	host.append(host.root(), div);
	let stray = host.new_element("b", &[]);
	host.append(div, stray);

	let program = program("<div>hello</div>");
	let err = hydrate(&program, host.root()).unwrap_err();
	assert!(matches!(err, RenderError::UnexpectedNode(_)));
}

#[test]
#[serial]
fn test_hydrate_marker_name_mismatch_fails() {
	let host = TreeHost::new();
	host.install();
	host.append(host.root(), host.new_comment("island:other"));
	let div = host.new_element("div", &[("data-hid", "1")]);
	host.append(host.root(), div);
	host.append(host.root(), host.new_comment("/island"));

	let program = program("<!--island:hero--><div></div><!--/island-->");
	let err = hydrate(&program, host.root()).unwrap_err();
	assert!(matches!(err, RenderError::HydrationMismatch(_)));
}

/// Stray non-marker comments in the SSR output are skipped everywhere.
#[test]
#[serial]
fn test_hydrate_skips_plain_comments() {
	let host = TreeHost::new();
	host.install();
	let root = host.root();
	host.append(root, host.new_comment("server: rendered at 12:00"));
	let div = host.new_element("div", &[("data-hid", "1")]);
	host.append(root, div);
	host.append(div, host.new_comment("inner note"));
	host.append(div, host.new_text("hello"));

	let program = program("<div>hello</div>");
	assert!(hydrate(&program, root).is_ok());
}

/// Portals hydrate their content from the portal target and pick the
/// stream back up after the closing marker.
#[test]
#[serial]
fn test_hydrate_portal_content() {
	let host = TreeHost::new();
	host.install();
	let root = host.root();

	// Portal target with the server-rendered span inside.
	let modal_root = host.new_element("aside", &[]);
	host.define_portal("#modal", modal_root);
	let span = host.new_element("span", &[("data-hid", "1")]);
	host.append(modal_root, span);
	let span_text = host.new_text("hi");
	host.append(span, span_text);

	// Main stream: markers and the trailing element.
	host.append(root, host.new_comment("portal:#modal"));
	host.append(root, host.new_comment("/portal"));
	let after = host.new_element("div", &[("data-hid", "2")]);
	host.append(root, after);

	let program = program("<!--portal:#modal--><span>{{msg}}</span><!--/portal--><div></div>");
	let result = hydrate(&program, root).unwrap();

	assert_eq!(result.dynamic_nodes, vec![span_text]);
	assert_eq!(result.node_for_hydration_id(1), Some(span));
	assert_eq!(result.node_for_hydration_id(2), Some(after));
	assert_eq!(result.portals.len(), 1);
	assert_eq!(result.portals[0].node, modal_root);
}

#[test]
#[serial]
fn test_hydrate_unresolved_portal_fails() {
	let host = TreeHost::new();
	host.install();
	host.append(host.root(), host.new_comment("portal:#missing"));

	let program = program("<!--portal:#missing--><div></div><!--/portal-->");
	let err = hydrate(&program, host.root()).unwrap_err();
	assert!(matches!(err, RenderError::MissingNode(_)));
}
