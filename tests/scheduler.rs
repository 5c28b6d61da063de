use std::{cell::RefCell, rc::Rc};
use twig_dom::{scheduler::Scheduler, ManualMicrotasks, Microtasks};

fn flush_into(log: &Rc<RefCell<Vec<&'static str>>>) -> impl FnOnce() -> Box<dyn FnOnce()> {
	let log = Rc::clone(log);
	move || Box::new(move || log.borrow_mut().push("flush")) as Box<dyn FnOnce()>
}

#[test]
fn requests_are_deduplicated_in_order() {
	let microtasks = ManualMicrotasks::new();
	let scheduler = Scheduler::<u32>::new(microtasks.clone());
	let log = Rc::new(RefCell::new(Vec::new()));

	assert!(scheduler.schedule(3, flush_into(&log)));
	assert!(scheduler.schedule(1, flush_into(&log)));
	assert!(!scheduler.schedule(3, flush_into(&log)));
	assert!(scheduler.schedule(2, flush_into(&log)));

	assert!(scheduler.is_armed());
	assert!(scheduler.is_pending(1));
	assert_eq!(microtasks.pending(), 1);

	assert_eq!(scheduler.take_pending(), vec![3, 1, 2]);
	assert!(!scheduler.is_armed());
	assert!(!scheduler.is_pending(1));

	assert_eq!(microtasks.run_until_idle(), 1);
	assert_eq!(*log.borrow(), vec!["flush"]);
}

#[test]
fn requests_during_a_flush_arm_again() {
	let microtasks = ManualMicrotasks::new();
	let scheduler = Scheduler::<u32>::new(microtasks.clone());
	let log = Rc::new(RefCell::new(Vec::new()));

	scheduler.schedule(1, flush_into(&log));
	assert_eq!(scheduler.take_pending(), vec![1]);

	assert!(scheduler.schedule(1, flush_into(&log)));
	assert_eq!(microtasks.pending(), 2);
	assert_eq!(scheduler.take_pending(), vec![1]);
	assert!(scheduler.take_pending().is_empty());
}

#[test]
fn manual_microtasks_run_nested_tasks() {
	let microtasks = ManualMicrotasks::new();
	let log = Rc::new(RefCell::new(Vec::new()));

	microtasks.queue_microtask(Box::new({
		let microtasks = microtasks.clone();
		let log = Rc::clone(&log);
		move || {
			log.borrow_mut().push(1);
			let log = Rc::clone(&log);
			microtasks.queue_microtask(Box::new(move || log.borrow_mut().push(3)));
		}
	}));
	microtasks.queue_microtask(Box::new({
		let log = Rc::clone(&log);
		move || log.borrow_mut().push(2)
	}));

	assert_eq!(microtasks.run_until_idle(), 3);
	assert_eq!(*log.borrow(), vec![1, 2, 3]);
	assert_eq!(microtasks.pending(), 0);
}
