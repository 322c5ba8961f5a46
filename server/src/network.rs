//! Server network layer: UDP transport between clients and the arcade

use crate::arcade::Arcade;
use crate::client_manager::ClientManager;
use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{Packet, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, RwLock};

/// Receive buffer size; large enough for any single datagram.
pub const RECV_BUFFER_SIZE: usize = 64 * 1024;
/// Largest UDP payload deliverable over IPv4.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { packet: Packet, addr: SocketAddr },
    ClientTimeout { client_id: u32 },
}

/// Replies addressed to a single client, outside the snapshot broadcast
#[derive(Debug)]
pub enum GameMessage {
    SendPacket { packet: Packet, addr: SocketAddr },
}

/// Owns the socket and routes datagrams to the arcade
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    arcade: Arc<Arcade>,
    config: ServerConfig,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: Option<mpsc::UnboundedReceiver<GameMessage>>,
}

impl Server {
    pub async fn new(config: ServerConfig) -> Result<Self> {
        let socket = UdpSocket::bind(&config.bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: config.bind_addr.clone(),
                source,
            })?;
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket: Arc::new(socket),
            clients: Arc::new(RwLock::new(ClientManager::new(
                config.max_clients,
                config.client_timeout,
            ))),
            arcade: Arc::new(Arcade::new(&config)),
            config,
            server_tx,
            server_rx,
            game_tx,
            game_rx: Some(game_rx),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Handle to the hosted games, e.g. for shutting them down.
    pub fn arcade(&self) -> Arc<Arcade> {
        Arc::clone(&self.arcade)
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = vec![0u8; RECV_BUFFER_SIZE];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => match deserialize::<Packet>(&buffer[..len]) {
                        Ok(packet) => {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        }
                        Err(e) => warn!("Failed to deserialize packet from {}: {}", addr, e),
                    },
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that fans game snapshots out to every client and
    /// delivers direct replies
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let mut snapshots = self.arcade.subscribe();
        let mut game_rx = match self.game_rx.take() {
            Some(rx) => rx,
            None => {
                warn!("Network sender already running");
                return;
            }
        };

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    message = game_rx.recv() => match message {
                        Some(GameMessage::SendPacket { packet, addr }) => {
                            if let Err(e) = send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send packet to {}: {}", addr, e);
                            }
                        }
                        None => break,
                    },

                    snapshot = snapshots.recv() => match snapshot {
                        Ok(packet) => {
                            let client_addrs = {
                                let clients_guard = clients.read().await;
                                clients_guard.get_client_addrs()
                            };
                            if client_addrs.is_empty() {
                                continue;
                            }
                            let data = match encode(&packet) {
                                Ok(data) => data,
                                Err(e) => {
                                    error!("Failed to encode snapshot: {}", e);
                                    continue;
                                }
                            };
                            for (client_id, addr) in client_addrs {
                                if let Err(e) = send_bytes(&socket, &data, addr).await {
                                    error!("Failed to send to client {}: {}", client_id, e);
                                }
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("Network sender lagged, skipped {} snapshots", skipped);
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            debug!("Network sender exited");
        });
    }

    /// Spawns task that monitors client timeouts
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts()
                };

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        return;
                    }
                }
            }
        });
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    /// Processes one incoming packet
    async fn handle_packet(&self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Connect { client_version } => {
                info!(
                    "Client connecting from {} (version: {})",
                    addr, client_version
                );
                if client_version != PROTOCOL_VERSION {
                    warn!(
                        "Client {} speaks protocol {}, server speaks {}",
                        addr, client_version, PROTOCOL_VERSION
                    );
                }

                let client_id = {
                    let mut clients = self.clients.write().await;
                    // Reconnects from the same address replace the old entry
                    if let Some(existing_id) = clients.find_client_by_addr(addr) {
                        info!("Removing existing client {} from {}", existing_id, addr);
                        clients.remove_client(&existing_id);
                    }
                    clients.add_client(addr)
                };

                match client_id {
                    Some(client_id) => {
                        self.send_packet(Packet::Connected { client_id }, addr);
                        // Late joiners see the running match without waiting a tick
                        if self.arcade.tank.is_running() {
                            self.send_packet(self.arcade.tank.snapshot().await, addr);
                        }
                    }
                    None => {
                        let reason = "Server full".to_string();
                        self.send_packet(Packet::Disconnected { reason }, addr);
                    }
                }
            }

            Packet::Heartbeat => {
                self.clients.write().await.touch(addr);
            }

            Packet::Disconnect => {
                let mut clients = self.clients.write().await;
                if let Some(client_id) = clients.find_client_by_addr(addr) {
                    clients.remove_client(&client_id);
                }
            }

            game_packet => {
                let known = self.clients.write().await.touch(addr);
                if !known {
                    warn!("Ignoring packet from unregistered sender {}", addr);
                    return;
                }
                self.arcade.dispatch(game_packet).await;
            }
        }
    }

    /// Main server loop: serves packets until every producer is gone
    pub async fn run(&mut self) -> Result<()> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        info!(
            "Server started (tank tick {:?}, snake tick {:?}, max {} clients)",
            self.config.tank_tick, self.config.snake_tick, self.config.max_clients
        );

        while let Some(message) = self.server_rx.recv().await {
            match message {
                ServerMessage::PacketReceived { packet, addr } => {
                    self.handle_packet(packet, addr).await;
                }
                ServerMessage::ClientTimeout { client_id } => {
                    debug!("Client {} dropped from broadcasts", client_id);
                }
            }
        }

        info!("Server shutting down");
        Ok(())
    }
}

fn encode(packet: &Packet) -> Result<Vec<u8>> {
    Ok(serialize(packet)?)
}

async fn send_bytes(socket: &UdpSocket, data: &[u8], addr: SocketAddr) -> Result<()> {
    if data.len() > MAX_DATAGRAM_SIZE {
        return Err(ServerError::Oversized {
            addr,
            size: data.len(),
        });
    }
    socket.send_to(data, addr).await?;
    Ok(())
}

async fn send_packet_impl(socket: &UdpSocket, packet: &Packet, addr: SocketAddr) -> Result<()> {
    let data = encode(packet)?;
    send_bytes(socket, &data, addr).await
}
