// Orientation simulator: publishes a spinning, slightly wobbling sensor
//
// Usage: cargo run --example orientation_sim -- [turns_per_second]
// Example: cargo run --example orientation_sim -- 0.25

use commutator_runtime::config::TOPIC_ORIENTATION;
use commutator_runtime::messages::Orientation;
use std::f64::consts::TAU;
use std::time::Duration;
use tokio::time::interval;
use tracing::info;

const RATE_HZ: u64 = 50;
const WOBBLE_RAD: f64 = 0.15; // tilt of the spin axis
const WOBBLE_HZ: f64 = 0.3;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let turns_per_second: f64 = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => 0.25,
    };
    // Keep well under half a turn per sample or the runtime will alias
    let max = RATE_HZ as f64 / 2.0;
    if turns_per_second.abs() >= max {
        return Err(format!("{} turns/s aliases at {} Hz (limit {})", turns_per_second, RATE_HZ, max).into());
    }

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_ORIENTATION).await?;

    info!(
        "Publishing {} turns/s at {} Hz on {} (Ctrl-C to stop)",
        turns_per_second, RATE_HZ, TOPIC_ORIENTATION
    );

    let dt = 1.0 / RATE_HZ as f64;
    let mut tick = interval(Duration::from_millis(1000 / RATE_HZ));
    let mut t = 0.0;

    loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }

        let spin = Orientation::from_axis_angle([0.0, 0.0, 1.0], TAU * turns_per_second * t);
        let tilt_axis = [(TAU * WOBBLE_HZ * t).cos(), (TAU * WOBBLE_HZ * t).sin(), 0.0];
        let tilt = Orientation::from_axis_angle(tilt_axis, WOBBLE_RAD);
        let sample = tilt.compose(&spin);

        publisher.put(serde_json::to_string(&sample)?).await?;
        t += dt;
    }

    info!("Published {:.2} s of orientation", t);
    Ok(())
}
