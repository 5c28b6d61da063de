use std::{
	cell::{Cell, RefCell},
	rc::Rc,
};
use twig_dom::{template, use_state, with_props, Child, Component, Error, EventCategory, Handler, Props, Setter};

mod memory_support_;
use memory_support_::Harness;

fn counter(_: &Props) -> Result<Child, Error> {
	let (count, set_count) = use_state(0)?;
	template!("<button onclick={}>{}</button>", Handler::new(move |_| set_count.update(|count| count + 1)), count)
}

#[test]
fn counter_increments_after_flush() {
	let harness = Harness::new();
	harness.runtime.render_component(&Component::new(counter), harness.container, Props::none()).unwrap();
	assert_eq!(harness.html(), "<button>0</button>");

	let button = harness.find("button");
	assert!(harness.runtime.dispatch(button, EventCategory::Click, None));
	assert!(harness.runtime.has_pending_updates());
	assert_eq!(harness.html(), "<button>0</button>", "updates are deferred");

	assert_eq!(harness.microtasks.run_until_idle(), 1);
	assert!(!harness.runtime.has_pending_updates());
	assert_eq!(harness.html(), "<button>1</button>");
	assert_eq!(harness.find("button"), button);

	let committed = harness.runtime.committed(harness.runtime.activations()[0]).unwrap();
	assert_eq!(committed.as_node().unwrap().children, vec![Child::from("1")]);
}

#[test]
fn committed_tree_follows_state() {
	let harness = Harness::new();
	let setter = Rc::new(RefCell::new(None::<Setter<i32>>));
	let component = Component::new({
		let setter = Rc::clone(&setter);
		move |_| {
			let (count, set_count) = use_state(0)?;
			*setter.borrow_mut() = Some(set_count);
			template!("<span>{}</span>", count)
		}
	});
	harness.runtime.render(component.reference(), harness.container).unwrap();

	let activation = harness.runtime.activations()[0];
	assert_eq!(harness.runtime.committed(activation), Some(template!("<span>0</span>").unwrap()));

	setter.borrow().as_ref().unwrap().set(1);
	harness.microtasks.run_until_idle();
	assert_eq!(harness.runtime.committed(activation), Some(template!("<span>1</span>").unwrap()));
}

#[test]
fn updates_are_batched() {
	let harness = Harness::new();
	let renders = Rc::new(Cell::new(0));
	let component = Component::new({
		let renders = Rc::clone(&renders);
		move |_| {
			renders.set(renders.get() + 1);
			let (a, set_a) = use_state(0)?;
			let (b, set_b) = use_state(String::new())?;
			let handler = Handler::new(move |_| {
				set_a.set(1);
				set_a.update(|a| a + 1);
				set_b.set("x".to_owned());
			});
			template!("<button onclick={}>{} {}</button>", handler, a, b)
		}
	});
	harness.runtime.render(component.reference(), harness.container).unwrap();
	assert_eq!(renders.get(), 1);

	harness.runtime.dispatch(harness.find("button"), EventCategory::Click, None);
	assert_eq!(harness.microtasks.pending(), 1);
	harness.microtasks.run_until_idle();
	assert_eq!(renders.get(), 2);
	assert_eq!(harness.html(), "<button>2 x</button>");
}

#[test]
fn unchanged_state_schedules_nothing() {
	let harness = Harness::new();
	let setter = Rc::new(RefCell::new(None::<Setter<&'static str>>));
	let component = Component::new({
		let setter = Rc::clone(&setter);
		move |_| {
			let (text, set_text) = use_state("same")?;
			*setter.borrow_mut() = Some(set_text);
			template!("<p>{}</p>", text)
		}
	});
	harness.runtime.render(component.reference(), harness.container).unwrap();

	setter.borrow().as_ref().unwrap().set("same");
	assert!(!harness.runtime.has_pending_updates());
	assert_eq!(harness.microtasks.pending(), 0);
}

#[test]
fn state_and_setters_persist_across_renders() {
	let harness = Harness::new();
	let setters = Rc::new(RefCell::new(Vec::<Setter<u8>>::new()));
	let component = Component::new({
		let setters = Rc::clone(&setters);
		move |_| {
			let (value, set_value) = use_state(7_u8)?;
			setters.borrow_mut().push(set_value);
			template!("<i>{}</i>", value)
		}
	});

	harness.runtime.render(component.reference(), harness.container).unwrap();
	setters.borrow()[0].set(8);
	harness.microtasks.run_until_idle();
	harness.runtime.render(component.reference(), harness.container).unwrap();

	let setters = setters.borrow();
	assert_eq!(setters.len(), 3);
	assert!(setters[0].ptr_eq(&setters[1]));
	assert!(setters[1].ptr_eq(&setters[2]));
	assert_eq!(setters[2].get(), 8);
	assert_eq!(harness.html(), "<i>8</i>");
	assert_eq!(harness.runtime.activations().len(), 1);
}

#[test]
fn use_state_outside_render_is_invalid() {
	assert!(matches!(use_state(0), Err(Error::InvalidHookCall { hook: "use_state" })));
}

#[test]
fn reordered_hooks_are_detected() {
	let harness = Harness::new();
	let flip = Rc::new(Cell::new(false));
	let component = Component::new({
		let flip = Rc::clone(&flip);
		move |_| {
			if flip.get() {
				let (text, _) = use_state(String::new())?;
				template!("<p>{}</p>", text)
			} else {
				let (number, _) = use_state(0_i32)?;
				template!("<p>{}</p>", number)
			}
		}
	});
	harness.runtime.render(component.reference(), harness.container).unwrap();

	flip.set(true);
	let result = harness.runtime.render(component.reference(), harness.container);
	assert!(matches!(result, Err(Error::HookTypeMismatch { index: 0, .. })));
	assert_eq!(harness.html(), "<p>0</p>", "a failed render keeps the previous presentation");
}

fn child(_: &Props) -> Result<Child, Error> {
	let (count, set_count) = use_state(0)?;
	template!("<button onclick={}>{}</button>", Handler::new(move |_| set_count.update(|count| count + 1)), count)
}

#[test]
fn nested_state_survives_parent_renders() {
	let harness = Harness::new();
	let label_setter = Rc::new(RefCell::new(None::<Setter<String>>));
	let parent = Component::new({
		let label_setter = Rc::clone(&label_setter);
		move |_| {
			let (label, set_label) = use_state("a".to_owned())?;
			*label_setter.borrow_mut() = Some(set_label);
			template!("<p>{}</p>{}", label, Component::new(child))
		}
	});
	harness.runtime.render(parent.reference(), harness.container).unwrap();
	let activations = harness.runtime.activations();
	assert_eq!(activations.len(), 2);

	harness.runtime.dispatch(harness.find("button"), EventCategory::Click, None);
	harness.microtasks.run_until_idle();
	assert_eq!(harness.html(), "<p>a</p><button>1</button>");

	label_setter.borrow().as_ref().unwrap().set("b".to_owned());
	harness.microtasks.run_until_idle();
	assert_eq!(harness.html(), "<p>b</p><button>1</button>");
	assert_eq!(harness.runtime.activations(), activations);
}

fn greeting(props: &Props) -> Result<Child, Error> {
	let name = props.require::<String>()?;
	template!("<b>Hello, {}!</b>", name)
}

#[test]
fn with_props_renders_inline() {
	let harness = Harness::new();
	let page = Component::new(|_: &Props| {
		let greeting = with_props(&Component::new(greeting), "you".to_owned())?;
		template!("<div>{}</div>", greeting)
	});
	harness.runtime.render(page.reference(), harness.container).unwrap();
	assert_eq!(harness.html(), "<div><b>Hello, you!</b></div>");
	assert_eq!(harness.runtime.activations().len(), 1);

	let result = harness.runtime.render(Component::new(greeting).reference(), harness.container);
	assert!(matches!(result, Err(Error::Component { .. })));
}

#[test]
fn failing_activation_does_not_stop_the_flush() {
	let harness = Harness::new();
	let setters = Rc::new(RefCell::new(Vec::<Setter<i32>>::new()));
	let failing = Component::new({
		let setters = Rc::clone(&setters);
		move |_| {
			let (n, set_n) = use_state(0)?;
			setters.borrow_mut().push(set_n);
			if n > 0 {
				return Err(Error::component("boom"));
			}
			template!("<i>{}</i>", n)
		}
	});
	let working = Component::new({
		let setters = Rc::clone(&setters);
		move |_| {
			let (n, set_n) = use_state(0)?;
			setters.borrow_mut().push(set_n);
			template!("<b>{}</b>", n)
		}
	});
	harness.runtime.render(template!("{}{}", &failing, &working).unwrap(), harness.container).unwrap();
	let activations = harness.runtime.activations();

	{
		let setters = setters.borrow();
		setters[0].set(1);
		setters[1].set(1);
	}
	let error = harness.runtime.flush().unwrap_err();
	assert_eq!(error.failures.len(), 1);
	assert_eq!(error.failures[0].0, activations[0]);
	assert!(matches!(error.failures[0].1, Error::Component { .. }));
	assert_eq!(error.to_string(), "1 scheduled re-render(s) failed\n  activation 1: component failed: boom");
	assert_eq!(harness.html(), "<i>0</i><b>1</b>");

	assert!(!harness.runtime.has_pending_updates());
	harness.microtasks.run_until_idle();
	assert_eq!(harness.html(), "<i>0</i><b>1</b>");
}

#[test]
fn unmounted_setters_are_inert() {
	let harness = Harness::new();
	let setter = Rc::new(RefCell::new(None::<Setter<i32>>));
	let component = Component::new({
		let setter = Rc::clone(&setter);
		move |_| {
			let (n, set_n) = use_state(0)?;
			*setter.borrow_mut() = Some(set_n);
			template!("<i>{}</i>", n)
		}
	});
	harness.runtime.render(component.reference(), harness.container).unwrap();
	assert!(harness.runtime.unmount(harness.container));
	assert!(harness.runtime.activations().is_empty());

	setter.borrow().as_ref().unwrap().set(1);
	assert!(!harness.runtime.has_pending_updates());
	assert_eq!(harness.microtasks.pending(), 0);
	assert_eq!(harness.html(), "");
}

#[test]
fn replaced_components_are_destroyed() {
	let harness = Harness::new();
	harness.runtime.render(Component::new(counter).reference(), harness.container).unwrap();
	let first = harness.runtime.activations();
	assert_eq!(first.len(), 1);

	harness.runtime.render(Component::new(child).reference(), harness.container).unwrap();
	let second = harness.runtime.activations();
	assert_eq!(second.len(), 1);
	assert_ne!(first, second);
	assert!(harness.runtime.committed(first[0]).is_none());
}

#[test]
fn empty_output_keeps_an_anchor() {
	let harness = Harness::new();
	let setter = Rc::new(RefCell::new(None::<Setter<bool>>));
	let component = Component::new({
		let setter = Rc::clone(&setter);
		move |_| {
			let (shown, set_shown) = use_state(false)?;
			*setter.borrow_mut() = Some(set_shown);
			if shown {
				template!("<em>shown</em>")
			} else {
				template!("{}", ())
			}
		}
	});
	harness.runtime.render(template!("<div>{}<hr></div>", component.reference()).unwrap(), harness.container).unwrap();
	assert_eq!(harness.html(), "<div><hr></div>");

	setter.borrow().as_ref().unwrap().set(true);
	harness.microtasks.run_until_idle();
	assert_eq!(harness.html(), "<div><em>shown</em><hr></div>");
}

fn picky(props: &Props) -> Result<Child, Error> {
	let (_, _) = use_state(0_u32)?;
	let label = props.require::<String>()?;
	if label.as_str() == "b" {
		return Err(Error::component("child fails on b"));
	}
	template!("<i>{}</i>", label)
}

fn labelled_parent(label_setter: &Rc<RefCell<Option<Setter<String>>>>) -> Component {
	Component::new({
		let label_setter = Rc::clone(label_setter);
		move |_| {
			let (label, set_label) = use_state("a".to_owned())?;
			*label_setter.borrow_mut() = Some(set_label);
			template!("<p>{}</p>{}", label.clone(), Component::new(picky).with(label))
		}
	})
}

#[test]
fn nested_failure_commits_nothing() {
	let harness = Harness::new();
	let label_setter = Rc::new(RefCell::new(None));
	harness.runtime.render(labelled_parent(&label_setter).reference(), harness.container).unwrap();
	assert_eq!(harness.html(), "<p>a</p><i>a</i>");
	let parent = harness.runtime.activations()[0];
	let p = harness.find("p");

	label_setter.borrow().as_ref().unwrap().set("b".to_owned());
	let error = harness.runtime.flush().unwrap_err();
	assert_eq!(error.failures.len(), 1);
	assert_eq!(error.failures[0].0, parent);
	assert!(matches!(error.failures[0].1, Error::Component { .. }));

	assert_eq!(harness.html(), "<p>a</p><i>a</i>");
	assert_eq!(harness.find("p"), p);
	let committed = harness.runtime.committed(parent).unwrap();
	assert_eq!(committed.as_node().unwrap().children[0], template!("<p>a</p>").unwrap());
}

#[test]
fn parent_keeps_its_cells_after_a_nested_failure() {
	let harness = Harness::new();
	let label_setter = Rc::new(RefCell::new(None));
	harness.runtime.render(labelled_parent(&label_setter).reference(), harness.container).unwrap();
	let activations = harness.runtime.activations();

	label_setter.borrow().as_ref().unwrap().set("b".to_owned());
	assert!(harness.runtime.flush().is_err());
	assert!(matches!(use_state(0), Err(Error::InvalidHookCall { hook: "use_state" })));

	label_setter.borrow().as_ref().unwrap().set("c".to_owned());
	harness.microtasks.run_until_idle();
	assert_eq!(harness.html(), "<p>c</p><i>c</i>");
	assert_eq!(harness.runtime.activations(), activations, "both activations survive the failed flush");
	assert_eq!(label_setter.borrow().as_ref().unwrap().get(), "c");
}

#[test]
fn failed_render_restores_the_hook_scope() {
	let harness = Harness::new();
	let component = Component::new(|_: &Props| {
		let (_, _) = use_state(0)?;
		Err::<Child, _>(Error::component("fails after its hooks ran"))
	});

	let result = harness.runtime.render(component.reference(), harness.container);
	assert!(matches!(result, Err(Error::Component { .. })));
	assert!(matches!(use_state(0), Err(Error::InvalidHookCall { hook: "use_state" })));
	assert!(harness.runtime.activations().is_empty(), "nothing is left mounted");
	assert_eq!(harness.html(), "");
}

#[test]
fn failed_sibling_discards_new_activations() {
	let harness = Harness::new();
	harness.runtime.render(template!("<p>x</p>").unwrap(), harness.container).unwrap();
	let p = harness.find("p");

	let result = harness.runtime.render(
		template!("<p>y</p>{}{}", Component::new(child).reference(), Component::new(picky).with("b".to_owned())).unwrap(),
		harness.container,
	);
	assert!(matches!(result, Err(Error::Component { .. })));
	assert_eq!(harness.html(), "<p>x</p>");
	assert_eq!(harness.find("p"), p);
	assert!(harness.runtime.activations().is_empty());
}
