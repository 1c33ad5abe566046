//! Read-only Twitch chat client.
//!
//! Joins the given channels anonymously and prints every line until Ctrl-C.
//!
//! ```text
//! cargo run --example twitch_client -- forsen xqc
//! RUST_LOG=tmi_ircon=debug cargo run --example twitch_client -- --server ircs://irc.chat.twitch.tv forsen
//! ```

use std::sync::Arc;

use tmi_ircon::config::DEFAULT_SERVER;
use tmi_ircon::{Config, Event, IrCon, IrcHandshake};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut server = DEFAULT_SERVER.to_owned();
    let mut channels = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--server" => server = args.next().ok_or("--server needs a value")?,
            name => channels.push(format!("#{}", name.trim_start_matches('#'))),
        }
    }

    let irc = Arc::new(IrCon::with_config(
        Config::with_server(server),
        IrcHandshake::anonymous(),
    )?);
    let (tx, mut events) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let task = irc.background(cancel.clone(), tx);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Some(Event::Connected) => {
                    println!("# connected");
                    if !channels.is_empty() {
                        if let Err(e) = irc.send(&format!("JOIN {}", channels.join(","))).await {
                            eprintln!("# join failed: {e}");
                        }
                    }
                }
                Some(Event::Disconnected(err)) => println!("# disconnected: {err}"),
                Some(Event::Message(msg)) => println!("{}", msg.raw()),
                None => break,
            },
        }
    }

    cancel.cancel();
    task.await?;
    Ok(())
}
