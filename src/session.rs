//! Socket lifecycle for the manual fragment sender.
//!
//! A `Session` owns the listening socket and, once accepted, the single peer
//! connection. The socket state lives in one value passed explicitly through
//! the steps; there is no global socket state. Everything is blocking and
//! single-threaded: progress is controlled entirely by the operator (stdin
//! confirmations) and the peer (connecting).

use crate::script::{Payload, Script};
use std::io::{self, BufRead, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use thiserror::Error;
use tracing::{debug, info};

/// Listening socket plus, after `accept_one`, the accepted connection.
pub struct Session {
    listener: TcpListener,
    conn: Option<TcpStream>,
}

impl Session {
    /// Bind and listen on `addr`. Fatal on failure; no retry.
    ///
    /// Backlog of 1: the tool talks to exactly one peer.
    pub fn bind(addr: SocketAddr) -> Result<Self, SessionError> {
        let listener = create_listener(addr).map_err(|e| SessionError::Bind { addr, source: e })?;
        info!(address = %addr, "socket is bound and listening");

        Ok(Session {
            listener,
            conn: None,
        })
    }

    /// The actual bound address (differs from the requested one for port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Block until exactly one peer connects. No timeout.
    pub fn accept_one(&mut self) -> Result<SocketAddr, SessionError> {
        let (stream, peer) = self.listener.accept().map_err(SessionError::Accept)?;
        info!(peer = %peer, "connected");
        self.conn = Some(stream);
        Ok(peer)
    }

    /// Write `payload` verbatim to the accepted connection as one write call.
    ///
    /// Payloads are short, so `write_all` here is a single TCP send in
    /// practice; the split points the script encodes are the write
    /// boundaries the peer observes.
    pub fn send_payload(&mut self, payload: &Payload) -> Result<(), SessionError> {
        let conn = self.conn.as_mut().ok_or(SessionError::NotConnected)?;
        conn.write_all(payload.as_bytes())
            .map_err(SessionError::Send)?;
        debug!(bytes = payload.as_bytes().len(), "payload written");
        Ok(())
    }

    /// Gracefully shut down the connection in both directions, then close it
    /// and the listener. Consumes the session; there is no second call.
    pub fn shutdown_all(self) -> Result<(), SessionError> {
        let conn = self.conn.ok_or(SessionError::NotConnected)?;
        conn.shutdown(Shutdown::Both)
            .map_err(SessionError::Shutdown)?;
        drop(conn);
        drop(self.listener);
        info!("sockets closed");
        Ok(())
    }
}

/// Create a blocking TCP listener with SO_REUSEADDR so quick re-runs of the
/// tool don't trip over TIME_WAIT from the previous run.
fn create_listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = socket2::Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1)?;

    Ok(socket.into())
}

/// Run the confirmation-gated send loop over `script`, then shut down.
///
/// For each payload: print the escaped preview prompt, block for one line on
/// `input` (value ignored), write the payload, print `sent`. After the last
/// payload, one final confirmation gates the shutdown. Generic over the
/// console streams so tests can drive it with in-memory buffers.
pub fn run_script<R: BufRead, W: Write>(
    mut session: Session,
    script: &Script,
    input: &mut R,
    output: &mut W,
) -> Result<(), SessionError> {
    for payload in script.payloads() {
        write!(output, "Press enter to send \"{}\": ", payload.preview())
            .map_err(SessionError::Console)?;
        output.flush().map_err(SessionError::Console)?;

        wait_for_line(input)?;
        session.send_payload(payload)?;

        writeln!(output, "sent").map_err(SessionError::Console)?;
    }

    write!(output, "Press enter to shut down the socket: ").map_err(SessionError::Console)?;
    output.flush().map_err(SessionError::Console)?;

    wait_for_line(input)?;
    session.shutdown_all()?;

    writeln!(output).map_err(SessionError::Console)?;
    Ok(())
}

/// Block for one confirmation line; the contents are discarded.
fn wait_for_line<R: BufRead>(input: &mut R) -> Result<(), SessionError> {
    let mut line = String::new();
    let n = input.read_line(&mut line).map_err(SessionError::Console)?;
    if n == 0 {
        return Err(SessionError::InputClosed);
    }
    Ok(())
}

/// Session errors. All of them are terminal: the tool aborts with a
/// diagnostic rather than retrying.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to bind {addr}")]
    Bind {
        addr: SocketAddr,
        source: io::Error,
    },

    #[error("failed to accept a connection")]
    Accept(#[source] io::Error),

    #[error("failed to send payload (peer closed the connection?)")]
    Send(#[source] io::Error),

    #[error("failed to shut down the connection")]
    Shutdown(#[source] io::Error),

    #[error("no connection accepted yet")]
    NotConnected,

    #[error("console I/O failed")]
    Console(#[source] io::Error),

    #[error("stdin closed before a confirmation was given")]
    InputClosed,
}
