//! The shell loop: draw the current state, pull the next event, hand it
//! to the orchestrator, repeat until the state stops running.

use anyhow::Result;

use crate::usecases::contracts::{AppEventSource, ShellOrchestrator};

use super::{terminal::TerminalSession, view};
use crate::domain::shell_state::ShellState;

pub fn start(
    events: &mut dyn AppEventSource,
    orchestrator: &mut dyn ShellOrchestrator,
) -> Result<()> {
    let mut session = TerminalSession::start()?;
    run_loop(events, orchestrator, |state| {
        session
            .terminal_mut()
            .draw(|frame| view::render(frame, state))
            .map(|_frame| ())
            .map_err(Into::into)
    })
}

fn run_loop<F>(
    events: &mut dyn AppEventSource,
    orchestrator: &mut dyn ShellOrchestrator,
    mut draw: F,
) -> Result<()>
where
    F: FnMut(&ShellState) -> Result<()>,
{
    while orchestrator.state().is_running() {
        draw(orchestrator.state())?;
        if let Some(event) = events.next_event()? {
            orchestrator.handle_event(event)?;
        }
    }
    // One last frame so the final state (e.g. a farewell note) is drawn.
    draw(orchestrator.state())
}
