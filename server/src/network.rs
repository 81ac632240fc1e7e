//! Server network layer handling WebSocket connections and event dispatch

use crate::connection::Connection;
use crate::dictionary::Dictionary;
use crate::registry::{ConnectParams, GameRegistry};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{ClientId, ServerMessage};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::interval;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;

pub const WEBSOCKET_PATH: &str = "/ws";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: String,
    pub max_games: usize,
    /// Interval between liveness pings; a client silent for a whole
    /// interval is dropped
    pub heartbeat: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3050".to_string(),
            max_games: 4,
            heartbeat: Duration::from_secs(5),
        }
    }
}

/// Frames queued for a connection's writer
#[derive(Debug)]
enum Outgoing {
    Text(String),
    Close,
}

/// Handle the game logic uses to reach one WebSocket client
#[derive(Debug, Clone)]
pub struct ClientHandle {
    id: ClientId,
    sender: mpsc::UnboundedSender<Outgoing>,
}

impl Connection for ClientHandle {
    fn id(&self) -> ClientId {
        self.id
    }

    fn send(&self, message: &ServerMessage) {
        if self.sender.send(Outgoing::Text(message.to_json())).is_err() {
            debug!("Client {} already gone, dropping message", self.id);
        }
    }

    fn close(&self) {
        let _ = self.sender.send(Outgoing::Close);
    }
}

/// Messages sent from connection tasks to the main server loop
#[derive(Debug)]
pub enum ServerEvent {
    Connected {
        handle: ClientHandle,
        params: ConnectParams,
    },
    Message {
        client_id: ClientId,
        text: String,
    },
    Disconnected {
        client_id: ClientId,
    },
}

/// Main server owning the registry and processing events one at a time
pub struct Server {
    listener: TcpListener,
    registry: GameRegistry<ClientHandle>,
    heartbeat: Duration,

    event_tx: mpsc::UnboundedSender<ServerEvent>,
    event_rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl Server {
    pub async fn new(
        config: ServerConfig,
        dictionary: Arc<Dictionary>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(&config.address).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            registry: GameRegistry::new(dictionary, config.max_games),
            heartbeat: config.heartbeat,
            event_tx,
            event_rx,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Spawns the task accepting TCP connections and assigning client ids
    fn spawn_acceptor(
        listener: TcpListener,
        event_tx: mpsc::UnboundedSender<ServerEvent>,
        heartbeat: Duration,
    ) {
        tokio::spawn(async move {
            let mut next_client_id: ClientId = 1;

            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        let client_id = next_client_id;
                        next_client_id += 1;

                        tokio::spawn(handle_connection(
                            stream,
                            addr,
                            client_id,
                            event_tx.clone(),
                            heartbeat,
                        ));
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Main server loop; runs until the process is stopped
    pub async fn run(self) -> io::Result<()> {
        let Server {
            listener,
            registry,
            heartbeat,
            event_tx,
            event_rx,
        } = self;

        Self::spawn_acceptor(listener, event_tx.clone(), heartbeat);

        let mut dispatcher = Dispatcher { registry };
        let mut event_rx = event_rx;
        // Keep a sender alive so the loop only ends on shutdown
        let _event_tx = event_tx;

        info!("Server started successfully");

        while let Some(event) = event_rx.recv().await {
            dispatcher.handle_event(event);
        }

        info!("Server shutting down");
        Ok(())
    }
}

/// Owns the registry inside the running event loop
struct Dispatcher {
    registry: GameRegistry<ClientHandle>,
}

impl Dispatcher {
    fn handle_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Connected { handle, params } => {
                let client_id = handle.id;
                if let Err(e) = self.registry.connect(handle, params) {
                    debug!("Client {} not admitted: {}", client_id, e);
                }
            }
            ServerEvent::Message { client_id, text } => {
                self.registry.handle_message(client_id, &text);
            }
            ServerEvent::Disconnected { client_id } => {
                debug!("Client {} disconnected", client_id);
                self.registry.disconnect(client_id);
            }
        }
    }
}

fn not_found() -> ErrorResponse {
    let mut response = ErrorResponse::new(Some("Not found".to_string()));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

/// Drives one client connection from handshake to close
///
/// Text frames are forwarded to the server loop, queued outbound frames are
/// written back, and a ping goes out every heartbeat. A client that has not
/// answered the previous ping by the next one is dropped.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    client_id: ClientId,
    event_tx: mpsc::UnboundedSender<ServerEvent>,
    heartbeat: Duration,
) {
    let mut query = None;
    let callback = |request: &Request, response: Response| {
        if request.uri().path() != WEBSOCKET_PATH {
            return Err(not_found());
        }
        query = request.uri().query().map(str::to_string);
        Ok(response)
    };

    let websocket = match tokio_tungstenite::accept_hdr_async(stream, callback).await {
        Ok(websocket) => websocket,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };

    info!("Client {} connected from {}", client_id, addr);

    let (mut sink, mut frames) = websocket.split();
    let (sender, mut outgoing) = mpsc::unbounded_channel();

    let connected = ServerEvent::Connected {
        handle: ClientHandle {
            id: client_id,
            sender,
        },
        params: ConnectParams::from_query(query.as_deref()),
    };
    if event_tx.send(connected).is_err() {
        error!("Server loop stopped, dropping client {}", client_id);
        return;
    }

    let mut ping_timer = interval(heartbeat);
    // The first tick fires immediately
    ping_timer.tick().await;
    let mut alive = true;

    loop {
        tokio::select! {
            frame = frames.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if event_tx.send(ServerEvent::Message { client_id, text }).is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Pong(_))) => alive = true,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("Error reading from client {}: {}", client_id, e);
                    break;
                }
            },

            queued = outgoing.recv() => match queued {
                Some(Outgoing::Text(text)) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        debug!("Failed to send to client {}: {}", client_id, e);
                        break;
                    }
                }
                Some(Outgoing::Close) | None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },

            _ = ping_timer.tick() => {
                if !alive {
                    info!("Client {} timed out", client_id);
                    break;
                }
                alive = false;
                if sink.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    let _ = event_tx.send(ServerEvent::Disconnected { client_id });
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ErrorCode;

    fn test_handle(id: ClientId) -> (ClientHandle, mpsc::UnboundedReceiver<Outgoing>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (ClientHandle { id, sender }, receiver)
    }

    #[test]
    fn test_client_handle_serializes_messages() {
        let (handle, mut receiver) = test_handle(3);

        handle.send(&ServerMessage::error(ErrorCode::InvalidCode, "Invalid code"));

        match receiver.try_recv().unwrap() {
            Outgoing::Text(text) => {
                assert_eq!(text, r#"{"type":"error","data":{"code":11,"msg":"Invalid code"}}"#)
            }
            other => panic!("Unexpected frame {:?}", other),
        }
    }

    #[test]
    fn test_client_handle_close_after_messages() {
        let (handle, mut receiver) = test_handle(3);

        handle.send(&ServerMessage::RoundEnd {});
        handle.close();

        assert!(matches!(receiver.try_recv().unwrap(), Outgoing::Text(_)));
        assert!(matches!(receiver.try_recv().unwrap(), Outgoing::Close));
    }

    #[test]
    fn test_send_to_dropped_client() {
        let (handle, receiver) = test_handle(3);
        drop(receiver);

        handle.send(&ServerMessage::RoundEnd {});
        handle.close();
        assert_eq!(handle.id(), 3);
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.max_games, 4);
        assert_eq!(config.heartbeat, Duration::from_secs(5));
        assert!(config.address.parse::<SocketAddr>().is_ok());
    }

    #[test]
    fn test_not_found_response() {
        let response = not_found();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_dispatcher_routes_events() {
        let dictionary = Arc::new(Dictionary::from_words(["cat"]));
        let mut dispatcher = Dispatcher {
            registry: GameRegistry::new(dictionary, 1),
        };

        let (host, mut host_rx) = test_handle(1);
        dispatcher.handle_event(ServerEvent::Connected {
            handle: host,
            params: ConnectParams::host(),
        });
        assert_eq!(dispatcher.registry.game_count(), 1);
        assert!(matches!(host_rx.try_recv().unwrap(), Outgoing::Text(_)));

        dispatcher.handle_event(ServerEvent::Message {
            client_id: 1,
            text: r#"{"type":"game_start"}"#.to_string(),
        });
        match host_rx.try_recv().unwrap() {
            Outgoing::Text(text) => assert!(text.contains(r#""code":20"#)),
            other => panic!("Unexpected frame {:?}", other),
        }

        dispatcher.handle_event(ServerEvent::Disconnected { client_id: 1 });
        assert_eq!(dispatcher.registry.game_count(), 0);
    }

    #[tokio::test]
    async fn test_server_binds_ephemeral_port() {
        let config = ServerConfig {
            address: "127.0.0.1:0".to_string(),
            ..ServerConfig::default()
        };
        let server = tokio_test::assert_ok!(Server::new(config, Arc::new(Dictionary::default())).await);

        assert_ne!(server.local_addr().unwrap().port(), 0);
    }
}
