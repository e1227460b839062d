//! fragsend: an interactive TCP stream fragmentation tester
//!
//! Binds one listening socket, accepts one chat client connection, and on
//! each operator keypress writes the next payload of a scripted sequence to
//! the peer. The payloads use deliberately odd casing and split line
//! boundaries so the client's stream parser can be exercised by hand.
//!
//! Flow:
//! - Bind and listen (fatal on failure, no retry)
//! - Accept exactly one connection
//! - For each payload: prompt with an escaped preview, wait for enter, send
//! - Final prompt, then bidirectional shutdown and close

mod config;
mod script;
mod session;

use config::Config;
use script::Script;
use session::Session;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let script = match &config.script {
        Some(path) => Script::from_file(path)?,
        None => Script::builtin(),
    };

    info!(
        listen = %config.listen,
        payloads = script.len(),
        script = ?config.script,
        "Starting fragsend"
    );

    let mut session = Session::bind(config.listen)?;
    session.accept_one()?;

    let mut input = std::io::stdin().lock();
    let mut output = std::io::stdout();

    session::run_script(session, &script, &mut input, &mut output)?;
    Ok(())
}
