//! Integration tests for event delegation.

mod common;

use common::TreeHost;
use ripple_core::events::{
	DispatchOptions, EventHandler, ListenerOptions, add_listener, dispatch, remove_listener,
	reset_events,
};
use serial_test::serial;
use std::cell::RefCell;
use std::rc::Rc;

/// Registering the same handler twice keeps one entry, and dispatch fires
/// it once per node occurrence on the path.
#[test]
#[serial]
fn test_listener_dedup_across_adds() {
	let host = TreeHost::new();
	host.install();
	reset_events();

	let hits = Rc::new(RefCell::new(0));
	let counter = Rc::clone(&hits);
	let handler = EventHandler::new(move |_| *counter.borrow_mut() += 1);

	add_listener(10, "click", &handler, ListenerOptions::new());
	add_listener(10, "click", &handler, ListenerOptions::new());

	dispatch(
		"click",
		10,
		DispatchOptions {
			path: &[10, 11],
			bubbles: true,
			..Default::default()
		},
	);
	assert_eq!(*hits.borrow(), 1);
	reset_events();
}

/// The host learns about each event name exactly once, no matter how many
/// listeners are added for it.
#[test]
#[serial]
fn test_host_registration_once_per_name() {
	let host = TreeHost::new();
	host.install();
	reset_events();

	for node in [1u32, 2, 3] {
		let handler = EventHandler::new(|_| {});
		add_listener(node, "click", &handler, ListenerOptions::new());
	}
	let handler = EventHandler::new(|_| {});
	add_listener(1, "input", &handler, ListenerOptions::new());

	assert_eq!(
		*host.registered_events.borrow(),
		vec!["click".to_string(), "input".to_string()]
	);
	reset_events();
}

/// Propagation visits the path in order; handlers see the right
/// current_target while target stays fixed.
#[test]
#[serial]
fn test_propagation_path_and_targets() {
	let host = TreeHost::new();
	host.install();
	reset_events();

	let seen = Rc::new(RefCell::new(Vec::new()));
	for node in [5u32, 6, 7] {
		let log = Rc::clone(&seen);
		let handler = EventHandler::new(move |event| {
			log.borrow_mut().push((event.current_target, event.target));
		});
		add_listener(node, "click", &handler, ListenerOptions::new());
	}

	dispatch(
		"click",
		5,
		DispatchOptions {
			path: &[5, 6, 7],
			bubbles: true,
			..Default::default()
		},
	);
	assert_eq!(*seen.borrow(), vec![(5, 5), (6, 5), (7, 5)]);
	reset_events();
}

/// remove_listener removes by (node, handler) tuple.
#[test]
#[serial]
fn test_remove_listener_by_tuple() {
	let host = TreeHost::new();
	host.install();
	reset_events();

	let hits = Rc::new(RefCell::new(0));
	let counter = Rc::clone(&hits);
	let handler = EventHandler::new(move |_| *counter.borrow_mut() += 1);

	add_listener(1, "click", &handler, ListenerOptions::new());
	add_listener(2, "click", &handler, ListenerOptions::new());
	remove_listener(1, "click", &handler);

	dispatch(
		"click",
		1,
		DispatchOptions {
			path: &[1, 2],
			bubbles: true,
			..Default::default()
		},
	);
	// Only the node-2 registration remains.
	assert_eq!(*hits.borrow(), 1);
	reset_events();
}

/// Re-adding a listener updates its once flag.
#[test]
#[serial]
fn test_re_add_updates_once_flag() {
	let host = TreeHost::new();
	host.install();
	reset_events();

	let hits = Rc::new(RefCell::new(0));
	let counter = Rc::clone(&hits);
	let handler = EventHandler::new(move |_| *counter.borrow_mut() += 1);

	add_listener(1, "click", &handler, ListenerOptions::new().once(true));
	add_listener(1, "click", &handler, ListenerOptions::new());

	let options = DispatchOptions {
		path: &[1],
		bubbles: true,
		..Default::default()
	};
	dispatch("click", 1, options.clone());
	dispatch("click", 1, options);
	// No longer once, so it fired both times.
	assert_eq!(*hits.borrow(), 2);
	reset_events();
}

/// dispatch returns whether any handler prevented the default.
#[test]
#[serial]
fn test_dispatch_reports_prevent_default() {
	let host = TreeHost::new();
	host.install();
	reset_events();

	let plain = EventHandler::new(|_| {});
	add_listener(1, "click", &plain, ListenerOptions::new());
	let options = DispatchOptions {
		path: &[1],
		bubbles: true,
		..Default::default()
	};
	assert!(!dispatch("click", 1, options.clone()));

	let preventing = EventHandler::new(|event| event.prevent_default());
	add_listener(1, "click", &preventing, ListenerOptions::new());
	assert!(dispatch("click", 1, options));
	reset_events();
}
