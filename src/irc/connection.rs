//! Chat server transport.
//!
//! Owns the TCP connection, performs the login handshake, answers keep-alives
//! and feeds every other server line to the [`ConnectionEventHandler`] in
//! arrival order. Actions returned by the handler are written before the next
//! line is read, so at most one generation cycle is ever in flight.
//!
//! # Lifecycle
//!
//! ```text
//!   connect ─► PASS/NICK ─► 001 ─► Connected ─► CAP REQ, JOIN
//!      ▲                                           │
//!      │                                   PRIVMSG/JOIN/NOTICE ─► handler
//!      │                                           │
//!      └── RECONNECT_DELAY ◄── Disconnected ◄── EOF / error / RECONNECT
//! ```
//!
//! Reconnects use a fixed delay; the handler and its corpus live across
//! connections.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::watch;

use super::event::{ConnectionEvent, ServerLine};
use super::framing::{MessageFramer, OutboundFrame};
use super::message::IrcMessage;
use crate::constants::{CONNECT_TIMEOUT, MAX_INBOUND_LINE_BYTES, RECONNECT_DELAY};
use crate::generator::TextGenerator;
use crate::handler::{Action, ConnectionEventHandler};
use crate::identity::ConnectionIdentity;

/// Server address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    /// Host name or IP.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl std::fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// One live connection to the chat server.
#[derive(Debug)]
pub struct IrcConnection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    framer: MessageFramer,
}

impl IrcConnection {
    /// Open a TCP connection to `address`.
    pub async fn connect(address: &ServerAddress, framer: MessageFramer) -> Result<Self> {
        let stream = tokio::time::timeout(
            CONNECT_TIMEOUT,
            TcpStream::connect((address.host.as_str(), address.port)),
        )
        .await
        .with_context(|| format!("connect to {address} timed out"))?
        .with_context(|| format!("connect to {address} failed"))?;
        stream.set_nodelay(true)?;

        let (read_half, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer,
            framer,
        })
    }

    /// Frame and write one raw protocol line.
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        let frame = self
            .framer
            .frame(line)
            .with_context(|| format!("refusing to send malformed line ({} bytes)", line.len()))?;
        self.write_frame(&frame).await
    }

    async fn write_frame(&mut self, frame: &OutboundFrame) -> Result<()> {
        self.writer
            .write_all(frame.as_bytes())
            .await
            .context("write to server failed")?;
        self.writer.flush().await.context("flush to server failed")
    }

    /// Authenticate with `PASS` and `NICK`.
    pub async fn login(&mut self, identity: &ConnectionIdentity) -> Result<()> {
        self.send_line(&format!("PASS {}", identity.token())).await?;
        self.send_line(&format!("NICK {}", identity.login())).await
    }

    /// Read the next line, `None` at end of stream.
    ///
    /// Invalid UTF-8 is replaced rather than treated as an error. A line
    /// longer than [`MAX_INBOUND_LINE_BYTES`] is discarded and returned as an
    /// empty string.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        read_bounded_line(&mut self.reader).await
    }

    /// Write the handler's actions in order.
    async fn perform(&mut self, actions: Vec<Action>) -> Result<()> {
        for action in actions {
            match action {
                Action::RequestCapabilities(caps) => {
                    self.send_line(&format!("CAP REQ :{}", caps.join(" "))).await?;
                }
                Action::Join(channel) => {
                    self.send_line(&format!("JOIN {channel}")).await?;
                }
                Action::Send { channel, frame } => {
                    // A channel name can push a valid message over the line limit.
                    let line = format!("PRIVMSG {} :{}", channel, frame.text());
                    match self.framer.frame(&line) {
                        Ok(line) => self.write_frame(&line).await?,
                        Err(e) => log::warn!("[IRC] Dropping generated message: {e}"),
                    }
                }
            }
        }
        Ok(())
    }
}

async fn read_bounded_line<R>(reader: &mut R) -> Result<Option<String>>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let read = (&mut *reader)
        .take(MAX_INBOUND_LINE_BYTES as u64)
        .read_until(b'\n', &mut buf)
        .await
        .context("read from server failed")?;
    if read == 0 {
        return Ok(None);
    }

    if !buf.ends_with(b"\n") && read == MAX_INBOUND_LINE_BYTES {
        skip_rest_of_line(reader).await?;
        log::warn!("[IRC] Skipping line longer than {MAX_INBOUND_LINE_BYTES} bytes");
        return Ok(Some(String::new()));
    }

    let line = String::from_utf8_lossy(&buf);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

async fn skip_rest_of_line<R>(reader: &mut R) -> Result<()>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    loop {
        let (consumed, found) = {
            let available = reader.fill_buf().await.context("read from server failed")?;
            if available.is_empty() {
                return Ok(());
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(i) => (i + 1, true),
                None => (available.len(), false),
            }
        };
        reader.consume(consumed);
        if found {
            return Ok(());
        }
    }
}

/// Why a single connection ended.
enum SessionExit {
    Shutdown,
    Disconnected,
}

/// Run the bot until `shutdown` flips to `true`.
///
/// Connection failures and disconnects are logged and retried after
/// [`RECONNECT_DELAY`]; they never end the loop.
pub async fn run<G: TextGenerator>(
    address: &ServerAddress,
    handler: &mut ConnectionEventHandler<G>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let framer = MessageFramer::new(handler.controller().config().byte_ceiling());

    loop {
        if *shutdown.borrow() {
            break;
        }

        log::info!("[IRC] Connecting to {}", address);
        let exit = match IrcConnection::connect(address, framer).await {
            Ok(mut conn) => run_session(address, &mut conn, handler, &mut shutdown).await,
            Err(e) => {
                log::warn!("[IRC] {e:#}");
                SessionExit::Disconnected
            }
        };

        if let SessionExit::Shutdown = exit {
            break;
        }

        log::info!("[IRC] Reconnecting in {}s", RECONNECT_DELAY.as_secs());
        tokio::select! {
            () = tokio::time::sleep(RECONNECT_DELAY) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    log::info!("[IRC] Connection loop exiting");
    Ok(())
}

/// Drive one connection until it drops or shutdown is requested.
async fn run_session<G: TextGenerator>(
    address: &ServerAddress,
    conn: &mut IrcConnection,
    handler: &mut ConnectionEventHandler<G>,
    shutdown: &mut watch::Receiver<bool>,
) -> SessionExit {
    if let Err(e) = conn.login(handler.identity()).await {
        log::warn!("[IRC] Login failed: {e:#}");
        handler.handle(ConnectionEvent::Disconnected);
        return SessionExit::Disconnected;
    }

    loop {
        let line = tokio::select! {
            line = conn.next_line() => line,
            _ = shutdown.changed() => {
                log::info!("[IRC] Shutdown requested, closing connection");
                let _ = conn.send_line("QUIT").await;
                return SessionExit::Shutdown;
            }
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                log::debug!("[IRC] Server closed the connection");
                break;
            }
            Err(e) => {
                log::warn!("[IRC] {e:#}");
                break;
            }
        };
        log::trace!("[IRC] <- {}", line);

        let msg = match IrcMessage::parse(&line) {
            Ok(msg) => msg,
            Err(e) => {
                log::debug!("[IRC] Skipping unparseable line ({e}): {line}");
                continue;
            }
        };

        let actions = match ServerLine::classify(&msg) {
            ServerLine::Ping(token) => {
                if let Err(e) = conn.send_line(&format!("PONG :{token}")).await {
                    log::warn!("[IRC] {e:#}");
                    break;
                }
                continue;
            }
            ServerLine::Reconnect => {
                log::info!("[IRC] Server requested reconnect");
                break;
            }
            ServerLine::Welcome => handler.handle(ConnectionEvent::Connected {
                server: address.host.clone(),
                port: address.port,
            }),
            ServerLine::Event(event) => handler.handle(event),
            ServerLine::Ignored => continue,
        };

        if let Err(e) = conn.perform(actions).await {
            log::warn!("[IRC] {e:#}");
            break;
        }
    }

    handler.handle(ConnectionEvent::Disconnected);
    SessionExit::Disconnected
}
