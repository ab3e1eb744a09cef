// Link check: step-by-step test of the serial link to the commutator
//
// Usage: cargo run --example link_check -- [port]
// Example: cargo run --example link_check -- /dev/ttyACM0
//
// Sends the enable/led handshake, then a small turn each way.

use commutator_runtime::commutator::{encode, Command, CommandSink, LinkGuard, SerialLink};
use commutator_runtime::config::{DEFAULT_BAUDRATE, DEFAULT_PORT};
use std::io::{self, Write};
use std::thread::sleep;
use std::time::Duration;

const TEST_TURNS: f64 = 0.05;

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N]: ", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn send<S: CommandSink>(link: &mut LinkGuard<S>, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(line) = encode(&command) {
        link.send_line(&line)?;
        println!("  -> {}", line);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::DEBUG.into())
                .from_env_lossy(),
        )
        .init();

    let port = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_PORT.to_string());

    println!("Commutator link check");
    println!("Serial port: {}", port);
    println!();

    println!("Step 1: Opening serial port...");
    let link = match SerialLink::open(&port, DEFAULT_BAUDRATE) {
        Ok(link) => {
            println!("  ok: serial port opened");
            link
        }
        Err(e) => {
            println!("  failed: {}", e);
            println!();
            println!("Troubleshooting:");
            println!("  - Check the port path is correct");
            println!("  - Verify the USB cable is connected");
            println!("  - Make sure no other program holds the port");
            return Err(e.into());
        }
    };
    let mut link = LinkGuard::new(link);
    println!();

    println!("Step 2: Handshake (LED on, motor enabled)");
    if !confirm("Send handshake?")? {
        return Ok(());
    }
    send(&mut link, Command::Indicator(true))?;
    send(&mut link, Command::Enable(true))?;
    println!();

    println!("Step 3: Turn {} turns forward, then back", TEST_TURNS);
    if confirm("Is the tether free to rotate?")? {
        send(&mut link, Command::Turn(TEST_TURNS))?;
        sleep(Duration::from_millis(1000));
        send(&mut link, Command::Turn(-TEST_TURNS))?;
        sleep(Duration::from_millis(1000));
    }
    println!();

    println!("Step 4: Disable motor and close");
    send(&mut link, Command::Enable(false))?;
    link.close()?;
    println!("  ok: link closed");

    Ok(())
}
