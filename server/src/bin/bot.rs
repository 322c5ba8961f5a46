//! Headless tank player.
//!
//! Connects to a running server, starts a tank match and plays a scripted
//! pattern of turns, moves and shots while logging what it sees.

use bincode::{deserialize, serialize};
use clap::Parser;
use log::{debug, info, warn};
use shared::{Packet, TankSnapshot, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{interval, timeout, MissedTickBehavior};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// How long to play before disconnecting, in seconds
    #[arg(short = 'd', long, default_value = "30")]
    duration_secs: u64,

    /// Delay between commands in milliseconds
    #[arg(long, default_value = "100")]
    command_ms: u64,
}

/// One step of the scripted pattern, cycled forever.
const SCRIPT: [(&str, Option<&str>); 8] = [
    ("shoot", None),
    ("rotate", Some("left")),
    ("rotate", Some("left")),
    ("move", Some("forward")),
    ("shoot", None),
    ("rotate", Some("right")),
    ("move", Some("backward")),
    ("move", Some("forward")),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let server_addr: SocketAddr = args.server.parse()?;
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    info!("Bot bound to {}", socket.local_addr()?);

    send(
        &socket,
        server_addr,
        &Packet::Connect {
            client_version: PROTOCOL_VERSION,
        },
    )
    .await?;

    let mut buf = vec![0u8; 64 * 1024];
    let (len, _) = timeout(Duration::from_secs(5), socket.recv_from(&mut buf)).await??;
    match deserialize::<Packet>(&buf[..len])? {
        Packet::Connected { client_id } => info!("Connected as client {}", client_id),
        Packet::Disconnected { reason } => {
            warn!("Server refused connection: {}", reason);
            return Ok(());
        }
        other => {
            warn!("Expected Connected but got {:?}", other);
            return Ok(());
        }
    }

    send(&socket, server_addr, &Packet::TankStart).await?;

    let mut commands = interval(Duration::from_millis(args.command_ms.max(1)));
    commands.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut heartbeat = interval(Duration::from_secs(1));
    let deadline = tokio::time::sleep(Duration::from_secs(args.duration_secs));
    tokio::pin!(deadline);

    let mut step = 0usize;
    let mut last_level = 0;

    loop {
        tokio::select! {
            _ = &mut deadline => break,

            _ = heartbeat.tick() => {
                send(&socket, server_addr, &Packet::Heartbeat).await?;
            }

            _ = commands.tick() => {
                let (action, direction) = SCRIPT[step % SCRIPT.len()];
                step += 1;
                let input = Packet::TankInput {
                    action: action.to_string(),
                    direction: direction.map(str::to_string),
                };
                send(&socket, server_addr, &input).await?;
            }

            received = socket.recv_from(&mut buf) => {
                let (len, _) = received?;
                match deserialize::<Packet>(&buf[..len]) {
                    Ok(Packet::TankState(snapshot)) => {
                        if snapshot.level != last_level {
                            last_level = snapshot.level;
                            info!("Reached level {}", last_level);
                        }
                        log_snapshot(&snapshot);
                        if snapshot.is_over {
                            info!("Destroyed with score {}, restarting", snapshot.score);
                            send(&socket, server_addr, &Packet::TankRestart).await?;
                        }
                    }
                    Ok(other) => debug!("Ignoring {:?}", other),
                    Err(e) => warn!("Failed to deserialize packet: {}", e),
                }
            }
        }
    }

    send(&socket, server_addr, &Packet::Disconnect).await?;
    info!("Bot finished");
    Ok(())
}

fn log_snapshot(snapshot: &TankSnapshot) {
    debug!(
        "score {} level {} high {} | {} AI, {} bullets, {} targets up",
        snapshot.score,
        snapshot.level,
        snapshot.high_score,
        snapshot.ai_tanks.len(),
        snapshot.bullets.len(),
        snapshot.targets.iter().filter(|t| t.is_active()).count()
    );
    if let Some(event) = snapshot.events.first() {
        debug!("latest event: {}", event);
    }
}

async fn send(
    socket: &UdpSocket,
    addr: SocketAddr,
    packet: &Packet,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = serialize(packet)?;
    socket.send_to(&data, addr).await?;
    Ok(())
}
