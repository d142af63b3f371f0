//! TCP link transport: one persistent duplex stream per session.
//!
//! Connection establishment is the only asymmetry between the two
//! endpoints: the host accepts a single inbound connection, the peer
//! dials out. Once the stream exists both sides speak the same protocol.
//!
//! ```text
//! send_object() ──► mpsc ──► writer task ──► TcpStream ──► peer
//!                              (frames never interleave)
//!
//! peer ──► TcpStream ──► Inbound::run ──► Message ──► SyncSession
//!            (read_exact header, read_exact payload, decode)
//! ```
//!
//! All senders funnel through one writer task, so two concurrent sends
//! can never interleave their frames. The receive loop is the session's
//! only suspension point; `shutdown()` wakes it and it exits within one
//! read call.

use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Notify};
use uuid::Uuid;

use crate::protocol::{Message, WireError, HEADER_LEN, MAX_FRAME_LEN};
use crate::session::SyncSession;

/// Which side of the link this endpoint plays during establishment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRole {
    /// Bind and accept exactly one inbound connection.
    Host,
    /// Actively connect to a known address.
    Peer,
}

/// Link configuration.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub role: LinkRole,
    /// Bind address (host) or target address (peer).
    pub addr: String,
    /// Frames with a larger declared payload are treated as stream
    /// corruption.
    pub max_frame_len: usize,
    /// Outbound channel capacity before senders back-pressure.
    pub send_capacity: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            role: LinkRole::Host,
            addr: "127.0.0.1:9696".to_string(),
            max_frame_len: MAX_FRAME_LEN,
            send_capacity: 256,
        }
    }
}

/// Transport-level failures.
#[derive(Debug)]
pub enum LinkError {
    Io(std::io::Error),
    Wire(WireError),
    /// The link was closed locally or by the peer.
    Closed,
}

impl std::fmt::Display for LinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Link I/O error: {e}"),
            Self::Wire(e) => write!(f, "Link wire error: {e}"),
            Self::Closed => write!(f, "Link closed"),
        }
    }
}

impl std::error::Error for LinkError {}

impl From<std::io::Error> for LinkError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Outbound half of an established link.
///
/// Cheap handle: cloneable senders feed the writer task.
pub struct LinkTransport {
    outbound_tx: mpsc::Sender<Message>,
    // One Notify per loop: notify_one stores a permit, so a shutdown
    // signaled while a loop is between reads is not lost.
    reader_shutdown: Arc<Notify>,
    writer_shutdown: Arc<Notify>,
    conn_id: Uuid,
}

/// Inbound half of an established link; consumed by [`Inbound::run`].
pub struct Inbound {
    reader: OwnedReadHalf,
    shutdown: Arc<Notify>,
    max_frame_len: usize,
    conn_id: Uuid,
}

impl LinkTransport {
    /// Establish the link per the configured role.
    ///
    /// The host call blocks until a peer connects; both calls return the
    /// symmetric transport + inbound pair.
    pub async fn establish(config: LinkConfig) -> Result<(Self, Inbound), LinkError> {
        let stream = match config.role {
            LinkRole::Host => {
                let listener = TcpListener::bind(&config.addr).await?;
                log::info!("Listening for a peer on {}", config.addr);
                let (stream, peer_addr) = listener.accept().await?;
                log::info!("Peer connected from {peer_addr}");
                stream
            }
            LinkRole::Peer => {
                let stream = TcpStream::connect(&config.addr).await?;
                log::info!("Connected to host at {}", config.addr);
                stream
            }
        };
        stream.set_nodelay(true)?;
        Ok(Self::from_stream(stream, &config))
    }

    /// Wrap an already-connected stream (shared by both roles and tests).
    pub fn from_stream(stream: TcpStream, config: &LinkConfig) -> (Self, Inbound) {
        let conn_id = Uuid::new_v4();
        let (reader, writer) = stream.into_split();
        let reader_shutdown = Arc::new(Notify::new());
        let writer_shutdown = Arc::new(Notify::new());
        let (outbound_tx, outbound_rx) = mpsc::channel(config.send_capacity);

        tokio::spawn(write_loop(writer, outbound_rx, writer_shutdown.clone(), conn_id));

        let transport = Self {
            outbound_tx,
            reader_shutdown: reader_shutdown.clone(),
            writer_shutdown,
            conn_id,
        };
        let inbound = Inbound {
            reader,
            shutdown: reader_shutdown,
            max_frame_len: config.max_frame_len,
            conn_id,
        };
        (transport, inbound)
    }

    /// Queue one message for the writer task.
    pub async fn send(&self, msg: Message) -> Result<(), LinkError> {
        self.outbound_tx.send(msg).await.map_err(|_| LinkError::Closed)
    }

    /// A sender handle for the session's reply and broadcast traffic.
    pub fn sender(&self) -> mpsc::Sender<Message> {
        self.outbound_tx.clone()
    }

    /// Close the link: wakes the receive loop and stops the writer.
    pub fn shutdown(&self) {
        log::info!("Link {} shutting down", self.conn_id);
        self.reader_shutdown.notify_one();
        self.writer_shutdown.notify_one();
    }

    /// Connection identity used in log lines.
    pub fn conn_id(&self) -> Uuid {
        self.conn_id
    }
}

async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut outbound_rx: mpsc::Receiver<Message>,
    shutdown: Arc<Notify>,
    conn_id: Uuid,
) {
    loop {
        tokio::select! {
            _ = shutdown.notified() => break,
            msg = outbound_rx.recv() => {
                let Some(msg) = msg else { break };
                let frame = match msg.encode() {
                    Ok(frame) => frame,
                    Err(e) => {
                        log::warn!("Link {conn_id}: dropping unencodable message: {e}");
                        continue;
                    }
                };
                if let Err(e) = writer.write_all(&frame).await {
                    log::error!("Link {conn_id}: write failed: {e}");
                    break;
                }
            }
        }
    }
    let _ = writer.shutdown().await;
    log::debug!("Link {conn_id}: writer stopped");
}

/// Read one length-prefixed frame payload. `Ok(None)` is a clean close.
async fn read_frame<R>(reader: &mut R, max_frame_len: usize) -> Result<Option<Vec<u8>>, LinkError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(LinkError::Io(e)),
    }
    let declared = u32::from_be_bytes(header) as usize;
    if declared == 0 || declared > max_frame_len {
        return Err(LinkError::Wire(WireError::Framing(format!(
            "length header {declared} outside 1..={max_frame_len}"
        ))));
    }
    let mut payload = vec![0u8; declared];
    reader.read_exact(&mut payload).await?;
    Ok(Some(payload))
}

impl Inbound {
    /// The receive loop: block for frames, decode, dispatch to the session.
    ///
    /// Per-message decode failures are logged and skipped; framing errors,
    /// I/O errors, peer close, and local shutdown all terminate the loop,
    /// after which the session is told the link is gone.
    pub async fn run(mut self, session: &SyncSession) {
        loop {
            tokio::select! {
                _ = self.shutdown.notified() => {
                    log::info!("Link {}: receive loop shut down", self.conn_id);
                    break;
                }
                frame = read_frame(&mut self.reader, self.max_frame_len) => {
                    match frame {
                        Ok(Some(payload)) => match Message::decode_payload(&payload) {
                            Ok(msg) => session.handle(msg).await,
                            Err(e @ (WireError::UnknownVariant(_) | WireError::Body(_))) => {
                                log::warn!("Link {}: skipping message: {e}", self.conn_id);
                            }
                            Err(e) => {
                                log::error!("Link {}: stream desynchronized: {e}", self.conn_id);
                                break;
                            }
                        },
                        Ok(None) => {
                            log::info!("Link {}: closed by peer", self.conn_id);
                            break;
                        }
                        Err(e) => {
                            log::error!("Link {}: receive failed: {e}", self.conn_id);
                            break;
                        }
                    }
                }
            }
        }
        session.link_closed().await;
    }
}
