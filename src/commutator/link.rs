// Line-oriented link to the commutator controller
//
// The device reads newline-terminated command lines from a serial port.
// `LinkGuard` owns whatever sink is in use and closes it exactly once,
// whether the session ends normally, fails, or is torn down early.

use serialport::{self, SerialPort};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_WRITE_TIMEOUT_MS, LINE_TERMINATOR};

/// Error types for the device link
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Link already closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Something that accepts one encoded command line at a time.
pub trait CommandSink: Send {
    /// Write one line; the sink adds the terminator.
    fn send_line(&mut self, line: &str) -> Result<()>;

    /// Flush and release the underlying connection.
    fn close(&mut self) -> Result<()>;
}

impl CommandSink for Box<dyn CommandSink> {
    fn send_line(&mut self, line: &str) -> Result<()> {
        (**self).send_line(line)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Serial connection to the commutator controller
pub struct SerialLink {
    port_name: String,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialLink {
    pub fn open(port_name: &str, baudrate: u32) -> Result<Self> {
        info!("Opening commutator link on {} at {} baud", port_name, baudrate);
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_WRITE_TIMEOUT_MS))
            .open()
            .map_err(|source| TransportError::Open {
                port: port_name.to_string(),
                source,
            })?;

        Ok(Self {
            port_name: port_name.to_string(),
            port: Some(port),
        })
    }
}

impl CommandSink for SerialLink {
    fn send_line(&mut self, line: &str) -> Result<()> {
        let port = self.port.as_mut().ok_or(TransportError::Closed)?;
        port.write_all(line.as_bytes())?;
        port.write_all(LINE_TERMINATOR.as_bytes())?;
        port.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            info!("Closing commutator link on {}", self.port_name);
            port.flush()?;
        }
        Ok(())
    }
}

/// Simulation link: logs every line instead of writing to hardware
#[derive(Debug, Default)]
pub struct LogLink {
    lines_sent: usize,
    closed: bool,
}

impl LogLink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CommandSink for LogLink {
    fn send_line(&mut self, line: &str) -> Result<()> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.lines_sent += 1;
        info!("[sim] {}", line);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        info!("[sim] link closed after {} lines", self.lines_sent);
        Ok(())
    }
}

/// Owns an open sink for the lifetime of a session.
pub struct LinkGuard<S: CommandSink> {
    sink: Option<S>,
}

impl<S: CommandSink> LinkGuard<S> {
    pub fn new(sink: S) -> Self {
        Self { sink: Some(sink) }
    }

    pub fn send_line(&mut self, line: &str) -> Result<()> {
        let sink = self.sink.as_mut().ok_or(TransportError::Closed)?;
        debug!("-> {}", line);
        sink.send_line(line)
    }

    /// Close the sink now. Later calls are no-ops.
    pub fn close(&mut self) -> Result<()> {
        match self.sink.take() {
            Some(mut sink) => sink.close(),
            None => Ok(()),
        }
    }

    pub fn is_open(&self) -> bool {
        self.sink.is_some()
    }
}

impl<S: CommandSink> Drop for LinkGuard<S> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close link on drop: {}", e);
        }
    }
}
