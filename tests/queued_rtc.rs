//! Queued-mode run-to-completion: a nested fire from inside an entry action
//! is observed only after the outer transition's own completion observer.

use std::cell::RefCell;
use std::rc::Rc;

use hsmcore::{Engine, FiringMode, Stateful};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Step {
    A,
    B,
    C,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Go {
    Next,
}

struct Ctx {
    state: Step,
}

impl Stateful<Step> for Ctx {
    fn state(&self) -> &Step {
        &self.state
    }
    fn set_state(&mut self, state: Step) {
        self.state = state;
    }
}

#[test]
fn nested_fire_is_deferred_until_outer_completion_under_queued_mode() -> eyre::Result<()> {
    let log = Rc::new(RefCell::new(Vec::<String>::new()));

    let engine = Engine::<Step, Go, Ctx>::new();
    engine.set_firing_mode(FiringMode::Queued);

    {
        let log = Rc::clone(&log);
        engine.on_transitioned(move |t| log.borrow_mut().push(format!("transitioned {:?}->{:?}", t.source, t.destination)));
    }
    {
        let log = Rc::clone(&log);
        engine.on_transition_completed(move |t| log.borrow_mut().push(format!("completed {:?}->{:?}", t.source, t.destination)));
    }

    engine.configure(Step::A).permit(Go::Next, Step::B)?;

    {
        let log = Rc::clone(&log);
        engine
            .configure(Step::B)
            .on_entry(
                move |_t, ctx: &mut Ctx, recur| {
                    log.borrow_mut().push("entry(B)".to_string());
                    recur.fire(ctx, Go::Next, hsmcore::Args::none()).unwrap();
                },
                "enter B, fire Next",
            )
            .permit(Go::Next, Step::C)?;
    }

    engine.configure(Step::C);

    let handle = engine.create_handle(Ctx { state: Step::A }, Step::A);
    handle.fire(Go::Next)?;

    assert!(handle.is_in_state(&Step::C));
    assert_eq!(
        *log.borrow(),
        vec![
            "transitioned A->B".to_string(),
            "entry(B)".to_string(),
            "completed A->B".to_string(),
            "transitioned B->C".to_string(),
            "completed B->C".to_string(),
        ]
    );

    Ok(())
}
