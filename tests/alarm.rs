//! The alarm scenario: a linear chain of states, most carrying a timer that
//! must start exactly once on entry and stop exactly once on exit.

use hsmcore::{Engine, FiringMode, Stateful};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum AlarmState {
    Undefined,
    Startup,
    Disarmed,
    Prearmed,
    Armed,
    PreTriggered,
    Triggered,
    Acknowledged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum AlarmTrigger {
    Boot,
    Disarm,
    Arm,
    TimeOut,
    Trigger,
    Acknowledge,
}

struct Panel {
    state: AlarmState,
    running_timers: Vec<AlarmState>,
    timer_starts: Vec<AlarmState>,
    timer_stops: Vec<AlarmState>,
}

impl Stateful<AlarmState> for Panel {
    fn state(&self) -> &AlarmState {
        &self.state
    }
    fn set_state(&mut self, state: AlarmState) {
        self.state = state;
    }
}

fn with_timer(config: hsmcore::StateConfiguration<'_, AlarmState, AlarmTrigger, Panel>, state: AlarmState) -> hsmcore::StateConfiguration<'_, AlarmState, AlarmTrigger, Panel> {
    config
        .on_entry(
            move |_t, ctx: &mut Panel, _recur| {
                ctx.timer_starts.push(state);
                ctx.running_timers.push(state);
            },
            "start timer",
        )
        .on_exit(
            move |_t, ctx: &mut Panel, _recur| {
                ctx.timer_stops.push(state);
                ctx.running_timers.retain(|s| *s != state);
            },
            "stop timer",
        )
}

#[test]
fn each_timed_state_starts_and_stops_its_timer_exactly_once() -> eyre::Result<()> {
    let engine = Engine::<AlarmState, AlarmTrigger, Panel>::new();
    engine.set_firing_mode(FiringMode::Queued);

    engine
        .configure(AlarmState::Undefined)
        .permit(AlarmTrigger::Boot, AlarmState::Startup)?;

    with_timer(engine.configure(AlarmState::Startup), AlarmState::Startup)
        .permit(AlarmTrigger::TimeOut, AlarmState::Disarmed)?;

    engine
        .configure(AlarmState::Disarmed)
        .permit(AlarmTrigger::Arm, AlarmState::Prearmed)?;

    with_timer(engine.configure(AlarmState::Prearmed), AlarmState::Prearmed)
        .permit(AlarmTrigger::TimeOut, AlarmState::Armed)?;

    engine
        .configure(AlarmState::Armed)
        .permit(AlarmTrigger::Trigger, AlarmState::PreTriggered)?;

    with_timer(engine.configure(AlarmState::PreTriggered), AlarmState::PreTriggered)
        .permit(AlarmTrigger::TimeOut, AlarmState::Triggered)?;

    engine
        .configure(AlarmState::Triggered)
        .permit(AlarmTrigger::Acknowledge, AlarmState::Acknowledged)?;

    engine
        .configure(AlarmState::Acknowledged)
        .permit(AlarmTrigger::Disarm, AlarmState::Disarmed)?;

    let handle = engine.create_handle(
        Panel {
            state: AlarmState::Undefined,
            running_timers: Vec::new(),
            timer_starts: Vec::new(),
            timer_stops: Vec::new(),
        },
        AlarmState::Undefined,
    );

    handle.fire(AlarmTrigger::Boot)?;
    handle.fire(AlarmTrigger::TimeOut)?;
    handle.fire(AlarmTrigger::Arm)?;
    handle.fire(AlarmTrigger::TimeOut)?;
    handle.fire(AlarmTrigger::Trigger)?;
    handle.fire(AlarmTrigger::TimeOut)?;
    handle.fire(AlarmTrigger::Acknowledge)?;
    handle.fire(AlarmTrigger::Disarm)?;

    assert!(handle.is_in_state(&AlarmState::Disarmed));
    handle.with_context(|c| {
        assert!(c.running_timers.is_empty(), "no timer should still be running in Disarmed");
        for state in [AlarmState::Startup, AlarmState::Prearmed, AlarmState::PreTriggered] {
            assert_eq!(c.timer_starts.iter().filter(|s| **s == state).count(), 1);
            assert_eq!(c.timer_stops.iter().filter(|s| **s == state).count(), 1);
        }
    });

    Ok(())
}
