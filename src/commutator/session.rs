// One streaming session: orientation samples in, command lines out
//
// Samples are processed in order on the calling task. The link is driven on
// a blocking worker so a slow serial write never holds up sampling; if the
// link falls behind far enough to fill the command queue the session fails
// rather than dropping samples (a skipped sample breaks unwrap continuity).
//
// The session ends when:
// - the orientation stream ends: queued commands are written, then the link closes
// - shutdown resolves or the link stalls: queued commands are discarded
// - the link worker exits (write failure): its error ends the session at once

use std::future::Future;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tracing::{debug, error, info};

use super::command::{encode, Command};
use super::link::{CommandSink, LinkGuard, TransportError};
use super::mux::CommandMultiplexer;
use super::unwrap::TurnTracker;
use crate::config::{ConfigError, SessionConfig};
use crate::messages::Orientation;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("Command link stalled with {0} commands queued")]
    Stalled(usize),

    #[error("Link worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Sources feeding a session
pub struct SessionInputs {
    pub orientations: mpsc::Receiver<Orientation>,
    mux: CommandMultiplexer,
    turns: mpsc::Sender<Command>,
}

impl SessionInputs {
    /// Inputs for one session, plus the sender that enable and indicator
    /// changes go through. Clone it once per control source.
    pub fn new(
        config: &SessionConfig,
        orientations: mpsc::Receiver<Orientation>,
    ) -> (Self, mpsc::Sender<Command>) {
        let (turns, mux) =
            CommandMultiplexer::channel(config.turn_queue_depth, config.enable, config.led);
        let controls = turns.clone();
        let inputs = Self {
            orientations,
            mux,
            turns,
        };
        (inputs, controls)
    }
}

/// What a finished session did
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionReport {
    pub samples: u64,
    pub turns_queued: u64,
    pub degenerate: u64,
    pub lines_written: u64,
    pub total_turns: f64,
}

/// What the link worker should do once it stops waiting for commands
#[derive(Debug, Clone, Copy, PartialEq)]
enum LinkControl {
    Run,
    /// Write whatever is already queued, then close
    Drain,
    /// Close without writing anything else
    Cancel,
}

/// Run a session until the orientation stream ends, `shutdown` resolves, or
/// the link fails.
///
/// The sink is closed exactly once before this returns, on every path.
pub async fn run_session<S, F>(
    config: &SessionConfig,
    sink: S,
    inputs: SessionInputs,
    shutdown: F,
) -> Result<SessionReport, SessionError>
where
    S: CommandSink + 'static,
    F: Future<Output = ()>,
{
    let link = LinkGuard::new(sink);
    let axis = config.validate()?;

    let SessionInputs {
        mut orientations,
        mux,
        turns,
    } = inputs;

    let (control_tx, control_rx) = watch::channel(LinkControl::Run);
    let handle = Handle::current();
    let mut worker = tokio::task::spawn_blocking(move || drive_link(handle, mux, link, control_rx));

    info!(
        "Session started: axis {:?}, enable={}, led={}",
        axis.as_array(),
        config.enable,
        config.led
    );

    let mut tracker = TurnTracker::new(axis);
    let mut report = SessionReport::default();
    let mut joined = None;
    tokio::pin!(shutdown);

    let outcome = loop {
        tokio::select! {
            result = &mut worker => {
                joined = Some(result);
                break Ok(());
            }
            _ = &mut shutdown => {
                info!("Shutdown requested");
                control_tx.send_replace(LinkControl::Cancel);
                break Ok(());
            }
            sample = orientations.recv() => {
                let Some(orientation) = sample else {
                    info!("Orientation stream ended");
                    control_tx.send_replace(LinkControl::Drain);
                    break Ok(());
                };
                report.samples += 1;

                let increment = tracker.update(&orientation);
                if !increment.is_finite() {
                    report.degenerate += 1;
                    debug!("Degenerate sample {:?}, turn suppressed", orientation);
                    continue;
                }
                let command = Command::Turn(increment);
                if !command.is_transmittable() {
                    continue;
                }

                match turns.try_send(command) {
                    Ok(()) => report.turns_queued += 1,
                    Err(TrySendError::Full(_)) => {
                        error!("Link is not keeping up, stopping session");
                        control_tx.send_replace(LinkControl::Cancel);
                        break Err(SessionError::Stalled(config.turn_queue_depth));
                    }
                    // The worker is gone; its result carries the cause
                    Err(TrySendError::Closed(_)) => break Ok(()),
                }
            }
        }
    };

    // Sampling has stopped; the unwrap state goes with this session
    drop(orientations);
    drop(turns);
    report.total_turns = tracker.total_turns();

    let result = match joined {
        Some(result) => result,
        None => worker.await,
    };
    report.lines_written = result??;
    outcome?;

    info!(
        "Session finished: {} samples, {} lines, {:.3} turns",
        report.samples, report.lines_written, report.total_turns
    );
    Ok(report)
}

/// Pull commands from the multiplexer and write them, one whole line at a time.
fn drive_link<S: CommandSink>(
    handle: Handle,
    mut mux: CommandMultiplexer,
    mut link: LinkGuard<S>,
    mut control: watch::Receiver<LinkControl>,
) -> Result<u64, TransportError> {
    let mut written = 0;
    loop {
        let next = handle.block_on(async {
            tokio::select! {
                biased;
                _ = control.wait_for(|c| *c != LinkControl::Run) => None,
                command = mux.next() => command,
            }
        });
        let Some(command) = next else {
            break;
        };
        write_command(&mut link, &command, &mut written)?;
    }

    let mode = *control.borrow();
    if mode == LinkControl::Drain {
        while let Some(command) = mux.try_next() {
            write_command(&mut link, &command, &mut written)?;
        }
    } else {
        debug!("Link stopping in {:?} mode", mode);
    }
    link.close()?;
    Ok(written)
}

fn write_command<S: CommandSink>(
    link: &mut LinkGuard<S>,
    command: &Command,
    written: &mut u64,
) -> Result<(), TransportError> {
    let Some(line) = encode(command) else {
        return Ok(());
    };
    if let Err(e) = link.send_line(&line) {
        error!("Link write failed: {}", e);
        return Err(e);
    }
    *written += 1;
    Ok(())
}
