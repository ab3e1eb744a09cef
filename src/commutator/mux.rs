// Command multiplexer
//
// Turn increments, enable changes and indicator changes are produced
// independently, each through its own clone of one command sender. The
// shared channel is the merge: commands come out in the order they were
// sent, whichever source sent them.
//
// - turns are edge-triggered: every transmittable increment is emitted
// - enable and indicator are level-triggered: seeded with the session's
//   initial state, then emitted only when the level changes

use std::collections::VecDeque;

use tokio::sync::mpsc;
use tracing::debug;

use super::command::Command;

/// Arrival-ordered merge of turn, enable and indicator commands.
///
/// `next` ends once every sender has been dropped.
#[derive(Debug)]
pub struct CommandMultiplexer {
    rx: mpsc::Receiver<Command>,
    enable: bool,
    indicator: bool,
    seeds: VecDeque<Command>,
}

impl CommandMultiplexer {
    /// Create the merge and the sender every source clones.
    ///
    /// `depth` bounds how many commands may wait for the link.
    pub fn channel(depth: usize, enable: bool, indicator: bool) -> (mpsc::Sender<Command>, Self) {
        let (tx, rx) = mpsc::channel(depth.max(1));
        // A freshly opened link gets the current state before anything else
        let seeds = VecDeque::from([Command::Enable(enable), Command::Indicator(indicator)]);
        let mux = Self {
            rx,
            enable,
            indicator,
            seeds,
        };
        (tx, mux)
    }

    /// Next command to send, or `None` once all sources are gone.
    pub async fn next(&mut self) -> Option<Command> {
        if let Some(seed) = self.seeds.pop_front() {
            return Some(seed);
        }
        while let Some(command) = self.rx.recv().await {
            if let Some(command) = self.accept(command) {
                return Some(command);
            }
        }
        None
    }

    /// Like `next`, but only returns what is already queued.
    pub fn try_next(&mut self) -> Option<Command> {
        if let Some(seed) = self.seeds.pop_front() {
            return Some(seed);
        }
        while let Ok(command) = self.rx.try_recv() {
            if let Some(command) = self.accept(command) {
                return Some(command);
            }
        }
        None
    }

    fn accept(&mut self, command: Command) -> Option<Command> {
        match command {
            Command::Enable(on) if on == self.enable => {
                debug!("Enable already {}, ignoring", on);
                None
            }
            Command::Indicator(on) if on == self.indicator => {
                debug!("Indicator already {}, ignoring", on);
                None
            }
            Command::Enable(on) => {
                self.enable = on;
                Some(command)
            }
            Command::Indicator(on) => {
                self.indicator = on;
                Some(command)
            }
            Command::Turn(_) => command.is_transmittable().then_some(command),
        }
    }

    /// Current enable level as last emitted
    pub fn enable_level(&self) -> bool {
        self.enable
    }

    /// Current indicator level as last emitted
    pub fn indicator_level(&self) -> bool {
        self.indicator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn drain(mut mux: CommandMultiplexer) -> Vec<Command> {
        let mut out = Vec::new();
        while let Some(cmd) = mux.next().await {
            out.push(cmd);
        }
        out
    }

    #[tokio::test]
    async fn test_seeds_then_toggles_then_turn() {
        let (tx, mux) = CommandMultiplexer::channel(16, true, true);
        tx.send(Command::Indicator(false)).await.unwrap();
        tx.send(Command::Indicator(true)).await.unwrap();
        tx.send(Command::Turn(0.25)).await.unwrap();
        drop(tx);

        let out = drain(mux).await;
        assert_eq!(
            out,
            vec![
                Command::Enable(true),
                Command::Indicator(true),
                Command::Indicator(false),
                Command::Indicator(true),
                Command::Turn(0.25),
            ]
        );
    }

    #[tokio::test]
    async fn test_turn_sent_first_comes_out_first() {
        let (tx, mut mux) = CommandMultiplexer::channel(16, true, true);
        let turns = tx.clone();
        let enable = tx;
        mux.next().await;
        mux.next().await;

        turns.send(Command::Turn(0.25)).await.unwrap();
        enable.send(Command::Enable(false)).await.unwrap();

        assert_eq!(mux.next().await, Some(Command::Turn(0.25)));
        assert_eq!(mux.next().await, Some(Command::Enable(false)));
        assert!(!mux.enable_level());
        assert!(mux.indicator_level());
    }

    #[tokio::test]
    async fn test_repeated_level_does_not_hold_back_turns() {
        let (tx, mut mux) = CommandMultiplexer::channel(256, true, true);
        mux.next().await;
        mux.next().await;

        for _ in 0..100 {
            tx.send(Command::Enable(true)).await.unwrap();
        }
        tx.send(Command::Turn(-0.1)).await.unwrap();
        for _ in 0..100 {
            tx.send(Command::Enable(true)).await.unwrap();
        }
        drop(tx);

        assert_eq!(mux.next().await, Some(Command::Turn(-0.1)));
        assert_eq!(mux.next().await, None);
    }

    #[tokio::test]
    async fn test_repeated_level_is_not_reemitted() {
        let (tx, mux) = CommandMultiplexer::channel(16, true, false);
        for cmd in [
            Command::Enable(true),
            Command::Enable(false),
            Command::Enable(false),
            Command::Indicator(false),
        ] {
            tx.send(cmd).await.unwrap();
        }
        drop(tx);

        let out = drain(mux).await;
        assert_eq!(
            out,
            vec![
                Command::Enable(true),
                Command::Indicator(false),
                Command::Enable(false),
            ]
        );
    }

    #[tokio::test]
    async fn test_interleaved_sources_keep_send_order() {
        let (tx, mux) = CommandMultiplexer::channel(16, false, false);
        let sent = [
            Command::Turn(0.1),
            Command::Indicator(true),
            Command::Turn(-0.2),
            Command::Enable(true),
            Command::Turn(0.3),
        ];
        for cmd in sent {
            tx.send(cmd).await.unwrap();
        }
        drop(tx);

        let out: Vec<Command> = drain(mux).await.into_iter().skip(2).collect();
        assert_eq!(out, sent.to_vec());
    }

    #[tokio::test]
    async fn test_degenerate_turns_dropped() {
        let (tx, mut mux) = CommandMultiplexer::channel(16, true, true);
        tx.send(Command::Turn(0.0)).await.unwrap();
        tx.send(Command::Turn(f64::NAN)).await.unwrap();
        tx.send(Command::Turn(0.5)).await.unwrap();
        assert_eq!(mux.try_next(), Some(Command::Enable(true)));
        assert_eq!(mux.try_next(), Some(Command::Indicator(true)));
        assert_eq!(mux.try_next(), Some(Command::Turn(0.5)));
        // Sender still open, nothing queued
        assert_eq!(mux.try_next(), None);
    }
}
