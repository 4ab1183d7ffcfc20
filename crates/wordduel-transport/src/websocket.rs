//! `tokio-tungstenite` backed transport.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Upper bound on the HTTP upgrade exchange for one client.
const UPGRADE_TIMEOUT: Duration = Duration::from_secs(10);

type Socket = WebSocketStream<TcpStream>;

/// Listens on a TCP port and upgrades every client to a WebSocket.
pub struct WebSocketTransport {
    listener: TcpListener,
    upgrade_timeout: Duration,
}

impl WebSocketTransport {
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: addr.to_owned(),
                source,
            })?;
        tracing::info!(addr, "listening for websocket clients");
        Ok(Self {
            listener,
            upgrade_timeout: UPGRADE_TIMEOUT,
        })
    }

    /// Overrides how long a client may take to finish the upgrade.
    pub fn with_upgrade_timeout(mut self, timeout: Duration) -> Self {
        self.upgrade_timeout = timeout;
        self
    }

    async fn upgrade(
        &self,
        tcp: TcpStream,
        peer: SocketAddr,
    ) -> Result<Socket, TransportError> {
        match tokio::time::timeout(self.upgrade_timeout, tokio_tungstenite::accept_async(tcp))
            .await
        {
            Ok(Ok(socket)) => Ok(socket),
            Ok(Err(e)) => Err(TransportError::Handshake {
                peer,
                reason: e.to_string(),
            }),
            Err(_) => Err(TransportError::Handshake {
                peer,
                reason: format!("no upgrade within {:?}", self.upgrade_timeout),
            }),
        }
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (tcp, peer) = self.listener.accept().await.map_err(TransportError::Accept)?;
        if let Err(e) = tcp.set_nodelay(true) {
            tracing::debug!(%peer, error = %e, "could not disable nagle");
        }

        let socket = self.upgrade(tcp, peer).await?;
        let id = ConnectionId::next();
        tracing::debug!(%id, %peer, "client upgraded");

        let (sink, stream) = socket.split();
        Ok(WebSocketConnection {
            id,
            peer,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        })
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// One upgraded client socket.
///
/// Reads and writes go through separate halves with separate locks, so a
/// push to this client never waits on a pending read.
pub struct WebSocketConnection {
    id: ConnectionId,
    peer: SocketAddr,
    sink: Mutex<SplitSink<Socket, Message>>,
    stream: Mutex<SplitStream<Socket>>,
}

impl WebSocketConnection {
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, text: &str) -> Result<(), Self::Error> {
        let mut sink = self.sink.lock().await;
        sink.send(Message::text(text))
            .await
            .map_err(|e| TransportError::Send(self.id, e.to_string()))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut stream = self.stream.lock().await;
        while let Some(frame) = stream.next().await {
            match frame.map_err(|e| TransportError::Receive(self.id, e.to_string()))? {
                Message::Text(text) => return Ok(Some(text.as_bytes().to_vec())),
                Message::Binary(data) => return Ok(Some(data.to_vec())),
                Message::Close(_) => return Ok(None),
                // tungstenite queues pong replies itself
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
        Ok(None)
    }

    async fn close(&self) -> Result<(), Self::Error> {
        let mut sink = self.sink.lock().await;
        sink.close()
            .await
            .map_err(|e| TransportError::Closed(self.id, e.to_string()))
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
