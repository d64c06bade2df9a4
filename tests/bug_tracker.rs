//! The bug-tracker scenario from the testable-properties scenarios: a
//! substate reentry that has to distinguish "picked up cold" from
//! "reassigned while already owned".

use hsmcore::{Engine, FiringMode, Stateful};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TicketState {
    Open,
    Assigned,
    Deferred,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TicketTrigger {
    Assign,
    Defer,
    Close,
}

#[derive(Default)]
struct Ticket {
    state: TicketState,
    assignee: Option<String>,
    log: Vec<String>,
}

impl Default for TicketState {
    fn default() -> Self {
        TicketState::Open
    }
}

impl Stateful<TicketState> for Ticket {
    fn state(&self) -> &TicketState {
        &self.state
    }
    fn set_state(&mut self, state: TicketState) {
        self.state = state;
    }
}

#[test]
fn reentry_and_ancestor_transitions() -> eyre::Result<()> {
    let engine = Engine::<TicketState, TicketTrigger, Ticket>::new();
    engine.set_firing_mode(FiringMode::Queued);

    engine
        .configure(TicketState::Open)
        .permit(TicketTrigger::Assign, TicketState::Assigned)?
        .permit(TicketTrigger::Defer, TicketState::Deferred)?
        .permit(TicketTrigger::Close, TicketState::Closed)?;

    engine
        .configure(TicketState::Assigned)
        .substate_of(TicketState::Open)?
        .permit_reentry(TicketTrigger::Assign)?
        .on_exit(
            |_transition, ctx: &mut Ticket, _recur| ctx.log.push("off the hook".to_string()),
            "off the hook",
        )
        .on_entry_from(
            TicketTrigger::Assign,
            |transition, ctx: &mut Ticket, _recur| {
                if transition.is_reentry() {
                    ctx.log.push("help the new employee".to_string());
                }
                let assignee = transition.args.get::<String>(0).cloned().unwrap_or_default();
                ctx.assignee = Some(assignee);
                ctx.log.push("you own it".to_string());
            },
            "record assignee",
        );

    engine
        .configure(TicketState::Deferred)
        .on_entry(|_transition, ctx: &mut Ticket, _recur| ctx.assignee = None, "clear assignee")
        .permit(TicketTrigger::Assign, TicketState::Assigned)?;

    let handle = engine.create_handle(Ticket::default(), TicketState::Open);

    handle.fire1(TicketTrigger::Assign, "alice".to_string())?;
    assert!(handle.is_in_state(&TicketState::Assigned));
    assert_eq!(handle.with_context(|c| c.assignee.clone()), Some("alice".to_string()));

    handle.fire1(TicketTrigger::Assign, "bob".to_string())?;
    assert_eq!(handle.with_context(|c| c.assignee.clone()), Some("bob".to_string()));
    assert_eq!(
        handle.with_context(|c| c.log.clone()),
        vec![
            "you own it".to_string(),
            "off the hook".to_string(),
            "help the new employee".to_string(),
            "you own it".to_string(),
        ]
    );

    handle.fire(TicketTrigger::Defer)?;
    assert!(handle.is_in_state(&TicketState::Deferred));
    assert_eq!(handle.with_context(|c| c.assignee.clone()), None);

    handle.fire1(TicketTrigger::Assign, "carol".to_string())?;
    assert!(handle.is_in_state(&TicketState::Assigned));
    assert_eq!(handle.with_context(|c| c.assignee.clone()), Some("carol".to_string()));

    Ok(())
}
