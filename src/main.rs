use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use commutator_runtime::config::{
    SessionConfig, DEFAULT_AXIS, DEFAULT_BAUDRATE, DEFAULT_PORT, TURN_QUEUE_DEPTH,
};

/// Drive a motorized cable commutator from an orientation stream
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Serial port of the commutator controller
    #[arg(long, default_value = DEFAULT_PORT)]
    port: String,

    /// Log commands instead of writing to a serial port
    #[arg(long)]
    simulate: bool,

    #[arg(long, default_value_t = DEFAULT_BAUDRATE)]
    baudrate: u32,

    /// Rotation axis in sensor coordinates, e.g. `--axis 0 0 1`
    #[arg(long, num_args = 3, allow_negative_numbers = true, value_names = ["X", "Y", "Z"])]
    axis: Option<Vec<f64>>,

    /// Start with the motor disabled
    #[arg(long)]
    disabled: bool,

    /// Start with the indicator LED off
    #[arg(long)]
    led_off: bool,

    #[arg(long, default_value_t = TURN_QUEUE_DEPTH)]
    queue_depth: usize,
}

impl Args {
    fn into_config(self) -> SessionConfig {
        let axis = match self.axis.as_deref() {
            Some(&[x, y, z]) => [x, y, z],
            _ => DEFAULT_AXIS,
        };
        SessionConfig {
            axis,
            port: (!self.simulate).then_some(self.port),
            baudrate: self.baudrate,
            enable: !self.disabled,
            led: !self.led_off,
            turn_queue_depth: self.queue_depth,
        }
    }
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Args::parse().into_config();

    if let Err(e) = commutator_runtime::runtime::run(config).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
