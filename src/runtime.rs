// Session runtime: zenoh inputs -> commutator session -> device link
//
// Orientation samples and enable/led changes arrive as JSON over zenoh.
// Each run is one fresh session; stopping and starting again begins from a
// new unwrap baseline.

use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tracing::{info, warn};
use zenoh::handlers::FifoChannelHandler;
use zenoh::pubsub::Subscriber;
use zenoh::sample::Sample;

// local imports
use crate::commutator::{run_session, Command, CommandSink, LogLink, SerialLink, SessionInputs};
use crate::config::{SessionConfig, TOPIC_CMD_ENABLE, TOPIC_CMD_LED, TOPIC_HEALTH, TOPIC_ORIENTATION};
use crate::messages::{Orientation, SessionHealth, StateChange};

// Orientation samples buffered between zenoh and the session
const ORIENTATION_BUFFER: usize = 256;

/// Forward parsed messages from a zenoh subscriber into a channel
fn spawn_forwarder<T, U>(
    subscriber: Subscriber<FifoChannelHandler<Sample>>,
    tx: mpsc::Sender<U>,
    convert: fn(T) -> U,
) -> tokio::task::JoinHandle<()>
where
    T: DeserializeOwned + Send + 'static,
    U: Send + 'static,
{
    tokio::spawn(async move {
        let topic = subscriber.key_expr().to_string();
        while let Ok(sample) = subscriber.recv_async().await {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<T>(&payload) {
                Ok(msg) => {
                    if tx.send(convert(msg)).await.is_err() {
                        break; // session is gone
                    }
                }
                Err(e) => {
                    warn!("Failed to parse message on {}: {}", topic, e);
                }
            }
        }
    })
}

fn open_link(config: &SessionConfig) -> Result<Box<dyn CommandSink>, Box<dyn std::error::Error + Send + Sync>> {
    match &config.port {
        Some(port) => Ok(Box::new(SerialLink::open(port, config.baudrate)?)),
        None => {
            info!("No serial port configured, running with simulated link");
            Ok(Box::new(LogLink::new()))
        }
    }
}

pub async fn run(config: SessionConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Refuse to touch the device with a bad configuration
    config.validate()?;
    let link = open_link(&config)?;

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let sub_orientation = session.declare_subscriber(TOPIC_ORIENTATION).await?;
    let sub_enable = session.declare_subscriber(TOPIC_CMD_ENABLE).await?;
    let sub_led = session.declare_subscriber(TOPIC_CMD_LED).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    let (orientation_tx, orientation_rx) = mpsc::channel(ORIENTATION_BUFFER);
    // Enable and led changes share the turn queue, so the link sees them in arrival order
    let (inputs, controls) = SessionInputs::new(&config, orientation_rx);

    let forwarders = [
        spawn_forwarder(sub_orientation, orientation_tx, |q: Orientation| q),
        spawn_forwarder(sub_enable, controls.clone(), |s: StateChange| Command::Enable(s.on)),
        spawn_forwarder(sub_led, controls, |s: StateChange| Command::Indicator(s.on)),
    ];

    info!("Subscribed to: {}, {}, {}", TOPIC_ORIENTATION, TOPIC_CMD_ENABLE, TOPIC_CMD_LED);
    info!("Publishing to: {}", TOPIC_HEALTH);

    pub_health
        .put(serde_json::to_string(&SessionHealth::Streaming)?)
        .await?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    let result = run_session(&config, link, inputs, shutdown).await;

    for forwarder in forwarders {
        forwarder.abort();
    }

    let health = match &result {
        Ok(report) => {
            info!("Session report: {:?}", report);
            SessionHealth::Stopped
        }
        Err(_) => SessionHealth::Failed,
    };
    pub_health.put(serde_json::to_string(&health)?).await?;

    result?;
    Ok(())
}
