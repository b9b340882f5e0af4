// Socket - world service framing loop
//
// Wire format per packet: [u16 size, big-endian][opcode][payload].
// The size counts the opcode bytes. Client headers are 6 bytes (u32
// opcode), server headers 4 bytes (u16 opcode). Once the auth session
// verifies, both header directions run through the cipher; payloads are
// never encrypted.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use ashemu_shared::store::Store;
use ashemu_shared::Expansion;

use crate::session::{OutPacket, WorldSession, WorldState};

/// Client header: u16 size + u32 opcode
const CLIENT_HEADER_SIZE: usize = 6;

/// Largest client packet we accept
const MAX_CLIENT_PACKET: usize = 10 * 1024;

/// Handle a single world connection until it closes.
pub async fn handle_client(mut stream: TcpStream, addr: SocketAddr, store: Store, expansion: Expansion) {
    tracing::info!("World connection from {}", addr);

    let mut session = WorldSession::new(store, expansion);

    // Greeting goes out before any input, in the clear
    let greeting = session.auth_challenge_packet();
    if send_packet(&mut stream, &mut session, greeting).await.is_err() {
        return;
    }

    loop {
        let mut header = [0u8; CLIENT_HEADER_SIZE];
        if stream.read_exact(&mut header).await.is_err() {
            break;
        }
        session.decrypt_header(&mut header);

        let size = u16::from_be_bytes([header[0], header[1]]) as usize;
        let opcode_raw = u32::from_le_bytes([header[2], header[3], header[4], header[5]]);
        let opcode = opcode_raw as u16;

        // The size field counts the 4 opcode bytes
        let payload_size = size.saturating_sub(4);
        if payload_size > MAX_CLIENT_PACKET {
            tracing::warn!("Oversized packet ({} bytes) from {}", payload_size, addr);
            break;
        }

        let mut payload = vec![0u8; payload_size];
        if stream.read_exact(&mut payload).await.is_err() {
            break;
        }

        match session.handle_packet(opcode, &payload).await {
            Ok(packets) => {
                let mut write_failed = false;
                for packet in packets {
                    if send_packet(&mut stream, &mut session, packet).await.is_err() {
                        write_failed = true;
                        break;
                    }
                }
                if write_failed {
                    break;
                }
            }
            Err(err) => {
                // Terminal for the operation, not for the connection
                tracing::debug!("Opcode 0x{:03X} from {} failed: {}", opcode, addr, err);
            }
        }

        if session.close_requested() {
            break;
        }
    }

    // A session dropped from the world still saves its position
    if session.state() == WorldState::InWorld {
        session.persist_position().await;
    }

    tracing::info!("World connection from {} closed", addr);
}

/// Frame, encrypt and send one packet
async fn send_packet(
    stream: &mut TcpStream,
    session: &mut WorldSession,
    packet: OutPacket,
) -> std::io::Result<()> {
    if packet.payload.overflowed() {
        tracing::error!("Dropping oversized SMSG 0x{:03X}", packet.opcode);
        return Ok(());
    }

    let size = (packet.payload.size() + 2) as u16;
    let mut header = [0u8; 4];
    header[0] = (size >> 8) as u8;
    header[1] = (size & 0xFF) as u8;
    header[2] = (packet.opcode & 0xFF) as u8;
    header[3] = (packet.opcode >> 8) as u8;

    session.encrypt_header(&mut header);

    stream.write_all(&header).await?;
    if !packet.payload.is_empty() {
        stream.write_all(packet.payload.contents()).await?;
    }
    Ok(())
}
