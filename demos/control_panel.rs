// Keyboard control surface: E toggles motor enable, L toggles LED, Q quits
use commutator_runtime::config::{DEFAULT_ENABLE, DEFAULT_LED, TOPIC_CMD_ENABLE, TOPIC_CMD_LED};
use commutator_runtime::messages::StateChange;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let pub_enable = session.declare_publisher(TOPIC_CMD_ENABLE).await?;
    let pub_led = session.declare_publisher(TOPIC_CMD_LED).await?;

    info!("Controls: E=toggle enable, L=toggle LED, Q=quit");

    enable_raw_mode()?;
    let result = run_panel(&pub_enable, &pub_led).await;
    disable_raw_mode()?;

    result
}

async fn run_panel(
    pub_enable: &zenoh::pubsub::Publisher<'_>,
    pub_led: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut enabled = DEFAULT_ENABLE;
    let mut led = DEFAULT_LED;

    loop {
        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let Event::Key(KeyEvent { code, kind, .. }) = event::read()? else {
            continue;
        };
        if kind != KeyEventKind::Press {
            continue;
        }

        match code {
            KeyCode::Char('e') => {
                enabled = !enabled;
                pub_enable
                    .put(serde_json::to_string(&StateChange { on: enabled })?)
                    .await?;
                info!("Enable: {}", enabled);
            }
            KeyCode::Char('l') => {
                led = !led;
                pub_led
                    .put(serde_json::to_string(&StateChange { on: led })?)
                    .await?;
                info!("LED: {}", led);
            }
            KeyCode::Char('q') | KeyCode::Esc => break,
            _ => {}
        }
    }

    Ok(())
}
