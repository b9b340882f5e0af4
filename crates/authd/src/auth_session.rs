// AuthSession - login service session handling
//
// Drives a client through the SRP6 handshake:
// 1. LOGON_CHALLENGE -> account lookup, SRP6 challenge reply
// 2. LOGON_PROOF -> proof verification, session key persisted
// 3. REALM_LIST -> realm advertisement (valid in any state)
//
// A malformed packet aborts the operation, not the connection; only
// socket errors end the session.

use std::net::SocketAddr;

use anyhow::{anyhow, bail};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};

use ashemu_shared::auth::srp6::{self, Srp6};
use ashemu_shared::store::{Store, StoreError};
use ashemu_shared::util::ByteBuffer;
use ashemu_shared::MAX_USERNAME;

use crate::auth_codes::{AuthCmd, AuthResult};
use crate::protocol::{LogonChallengeBody, LogonProofBody};
use crate::realm_list::{realm_list_packet, RealmInfo};

/// Session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Init,
    Challenged,
    Authenticated,
}

/// Login service behavior toggles
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Auto-create unknown accounts with the username as password.
    /// A development convenience; gate it off for real deployments.
    pub auto_create_accounts: bool,
}

/// Per-connection login session.
pub struct AuthSession {
    store: Store,
    realm: RealmInfo,
    settings: AuthSettings,
    state: SessionState,
    srp: Option<Srp6>,
    username: String,
    account_id: i64,
}

impl AuthSession {
    pub fn new(store: Store, realm: RealmInfo, settings: AuthSettings) -> Self {
        AuthSession {
            store,
            realm,
            settings,
            state: SessionState::Init,
            srp: None,
            username: String::new(),
            account_id: 0,
        }
    }

    /// Handle LOGON_CHALLENGE. Returns the reply packet.
    pub async fn handle_logon_challenge(&mut self, body: &[u8]) -> anyhow::Result<ByteBuffer> {
        let challenge =
            LogonChallengeBody::from_bytes(body).ok_or_else(|| anyhow!("malformed logon challenge"))?;

        if challenge.username.len() > MAX_USERNAME {
            bail!("username too long ({} bytes)", challenge.username.len());
        }

        let username = challenge.username.to_uppercase();
        tracing::info!("Logon challenge from '{}' (build {})", username, challenge.build);

        let mut pkt = ByteBuffer::new();
        pkt.write_u8(AuthCmd::LogonChallenge as u8);
        pkt.write_u8(0x00);

        let account = match self.store.get_account(&username).await {
            Ok(account) => account,
            Err(StoreError::NotFound) if self.settings.auto_create_accounts => {
                let (salt, verifier) = srp6::compute_verifier(&username, &username);
                let account = self.store.create_account(&username, &salt, &verifier).await?;
                tracing::info!("Auto-created account for '{}'", username);
                account
            }
            Err(StoreError::NotFound) => {
                pkt.write_u8(AuthResult::FailedUnknownAccount as u8);
                return Ok(pkt);
            }
            Err(err) => return Err(err.into()),
        };

        let srp = Srp6::new(&username, &account.salt, &account.verifier);

        pkt.write_u8(AuthResult::Success as u8);
        pkt.append(&srp.public_ephemeral());
        pkt.write_u8(1); // g length
        pkt.write_u8(srp6::GENERATOR);
        pkt.write_u8(32); // N length
        pkt.append(&srp6::N_BYTES);
        pkt.append(&account.salt);
        pkt.write_zeros(16); // CRC placeholder
        pkt.write_u8(0); // security flags

        self.username = username;
        self.account_id = account.id;
        self.srp = Some(srp);
        self.state = SessionState::Challenged;
        Ok(pkt)
    }

    /// Handle LOGON_PROOF. Returns the reply packet.
    pub async fn handle_logon_proof(&mut self, body: &[u8]) -> anyhow::Result<ByteBuffer> {
        let proof = LogonProofBody::from_bytes(body).ok_or_else(|| anyhow!("malformed logon proof"))?;

        if self.state != SessionState::Challenged {
            bail!("logon proof without a prior challenge");
        }
        // A failed proof invalidates the challenge either way
        let srp = self.srp.take().ok_or_else(|| anyhow!("missing SRP state"))?;
        self.state = SessionState::Init;

        let mut pkt = ByteBuffer::new();
        pkt.write_u8(AuthCmd::LogonProof as u8);

        match srp.verify_proof(&proof.client_public, &proof.client_proof) {
            Some(outcome) => {
                self.store
                    .update_session_key(self.account_id, &outcome.session_key)
                    .await?;
                tracing::info!("Login successful for '{}'", self.username);

                pkt.write_u8(AuthResult::Success as u8);
                pkt.append(&outcome.server_proof);
                pkt.write_u32(0);
                self.state = SessionState::Authenticated;
            }
            None => {
                tracing::info!("Invalid proof from '{}'", self.username);
                pkt.write_u8(AuthResult::FailedIncorrectPassword as u8);
            }
        }

        Ok(pkt)
    }

    /// Handle REALM_LIST. The client queries this before logging in too,
    /// so it is answered in every state.
    pub fn handle_realm_list(&self) -> ByteBuffer {
        tracing::debug!("Realm list requested by '{}'", self.username);
        realm_list_packet(&self.realm)
    }
}

/// Handle a single login connection until it closes.
pub async fn handle_client(
    mut stream: TcpStream,
    addr: SocketAddr,
    store: Store,
    realm: RealmInfo,
    settings: AuthSettings,
) {
    tracing::debug!("Login connection from {}", addr);

    let mut session = AuthSession::new(store, realm, settings);
    let read_timeout = Duration::from_secs(30);

    loop {
        let cmd_byte = match timeout(read_timeout, stream.read_u8()).await {
            Ok(Ok(byte)) => byte,
            Ok(Err(_)) => break,
            Err(_) => {
                tracing::debug!("Login connection from {} timed out", addr);
                break;
            }
        };

        let reply = match AuthCmd::from_u8(cmd_byte) {
            Some(AuthCmd::LogonChallenge) => {
                match read_challenge_body(&mut stream).await {
                    Ok(body) => match session.handle_logon_challenge(&body).await {
                        Ok(reply) => reply,
                        Err(err) => {
                            tracing::debug!("Logon challenge from {} failed: {}", addr, err);
                            continue;
                        }
                    },
                    Err(_) => break,
                }
            }
            Some(AuthCmd::LogonProof) => {
                let mut body = [0u8; LogonProofBody::SIZE];
                if stream.read_exact(&mut body).await.is_err() {
                    break;
                }
                match session.handle_logon_proof(&body).await {
                    Ok(reply) => reply,
                    Err(err) => {
                        tracing::debug!("Logon proof from {} failed: {}", addr, err);
                        continue;
                    }
                }
            }
            Some(AuthCmd::RealmList) => {
                // Trailing u32 the client sends with the request
                let mut padding = [0u8; 4];
                if stream.read_exact(&mut padding).await.is_err() {
                    break;
                }
                session.handle_realm_list()
            }
            None => {
                tracing::debug!("Unknown login opcode 0x{:02X} from {}", cmd_byte, addr);
                continue;
            }
        };

        if stream.write_all(reply.contents()).await.is_err() {
            break;
        }
    }

    tracing::debug!("Login connection from {} closed", addr);
}

/// Read the challenge's error/size header and its body
async fn read_challenge_body(stream: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let mut header = [0u8; 3];
    stream.read_exact(&mut header).await?;
    let size = u16::from_le_bytes([header[1], header[2]]) as usize;

    // The body is a fixed prefix plus a <= 255 byte username
    let size = size.min(LogonChallengeBody::MIN_SIZE + 255);
    let mut body = vec![0u8; size];
    stream.read_exact(&mut body).await?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ashemu_shared::auth::srp6::client::ClientSession;
    use ashemu_shared::auth::srp6::{verifier_with_salt, KEY_SIZE, PROOF_SIZE, SALT_SIZE};

    fn challenge_body(username: &str) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"WoW\0");
        data.extend_from_slice(&[1, 12, 1]);
        data.extend_from_slice(&5875u16.to_le_bytes());
        data.extend_from_slice(b"68x\0");
        data.extend_from_slice(b"niW\0");
        data.extend_from_slice(b"SUne");
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&0x0100007Fu32.to_le_bytes());
        data.push(username.len() as u8);
        data.extend_from_slice(username.as_bytes());
        data
    }

    fn proof_body(client_public: &[u8; KEY_SIZE], client_proof: &[u8; PROOF_SIZE]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(client_public);
        data.extend_from_slice(client_proof);
        data.extend_from_slice(&[0u8; PROOF_SIZE]); // CRC, ignored
        data.push(0); // key count
        data.push(0); // security flags
        data
    }

    fn test_session(store: Store) -> AuthSession {
        AuthSession::new(
            store,
            RealmInfo {
                name: "AshEmu".to_string(),
                address: "127.0.0.1:8085".to_string(),
                id: 1,
            },
            AuthSettings {
                auto_create_accounts: true,
            },
        )
    }

    /// Parse the challenge reply into (B, salt)
    fn parse_challenge_reply(reply: &ByteBuffer) -> ([u8; KEY_SIZE], [u8; SALT_SIZE]) {
        let mut buf = ByteBuffer::from_bytes(reply.contents());
        assert_eq!(buf.read_u8(), AuthCmd::LogonChallenge as u8);
        assert_eq!(buf.read_u8(), 0x00);
        assert_eq!(buf.read_u8(), AuthResult::Success as u8);

        let mut server_public = [0u8; KEY_SIZE];
        server_public.copy_from_slice(&buf.read_bytes(KEY_SIZE));

        assert_eq!(buf.read_u8(), 1);
        assert_eq!(buf.read_u8(), srp6::GENERATOR);
        assert_eq!(buf.read_u8(), 32);
        assert_eq!(buf.read_bytes(32), srp6::N_BYTES);

        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&buf.read_bytes(SALT_SIZE));

        assert_eq!(buf.read_bytes(16), vec![0u8; 16]); // CRC placeholder
        assert_eq!(buf.read_u8(), 0); // security flags
        assert_eq!(buf.remaining(), 0);

        (server_public, salt)
    }

    #[tokio::test]
    async fn test_first_time_login_full_flow() {
        let store = Store::open_in_memory().await.unwrap();
        let mut session = test_session(store.clone());

        let reply = session.handle_logon_challenge(&challenge_body("Alice")).await.unwrap();
        let (server_public, salt) = parse_challenge_reply(&reply);

        // The account was auto-created with the username as password
        let account = store.get_account("ALICE").await.unwrap();
        assert!(account.session_key.is_none());

        let client = ClientSession::new();
        let (m1, client_key) = client.proof("ALICE", "ALICE", &salt, &server_public);

        let reply = session
            .handle_logon_proof(&proof_body(&client.public_ephemeral(), &m1))
            .await
            .unwrap();

        let mut buf = ByteBuffer::from_bytes(reply.contents());
        assert_eq!(buf.read_u8(), AuthCmd::LogonProof as u8);
        assert_eq!(buf.read_u8(), AuthResult::Success as u8);
        let server_proof = buf.read_bytes(PROOF_SIZE);
        assert_eq!(buf.read_u32(), 0);
        assert_eq!(buf.remaining(), 0);
        assert_ne!(server_proof, vec![0u8; PROOF_SIZE]);

        // Stored key matches the client-side derivation
        let account = store.get_account("ALICE").await.unwrap();
        assert_eq!(account.session_key, Some(client_key));
    }

    #[tokio::test]
    async fn test_wrong_password_writes_no_key() {
        let store = Store::open_in_memory().await.unwrap();

        let salt = [7u8; SALT_SIZE];
        let verifier = verifier_with_salt("BOB", "SECRET", &salt);
        store.create_account("BOB", &salt, &verifier).await.unwrap();

        let mut session = test_session(store.clone());
        let reply = session.handle_logon_challenge(&challenge_body("BOB")).await.unwrap();
        let (server_public, salt) = parse_challenge_reply(&reply);

        let client = ClientSession::new();
        let (m1, _) = client.proof("BOB", "NOPE", &salt, &server_public);

        let reply = session
            .handle_logon_proof(&proof_body(&client.public_ephemeral(), &m1))
            .await
            .unwrap();

        assert_eq!(
            reply.contents(),
            &[AuthCmd::LogonProof as u8, AuthResult::FailedIncorrectPassword as u8]
        );

        let account = store.get_account("BOB").await.unwrap();
        assert!(account.session_key.is_none());
        assert_eq!(account.salt, [7u8; SALT_SIZE]);
        assert_eq!(account.verifier, verifier);
    }

    #[tokio::test]
    async fn test_unknown_account_without_auto_create() {
        let store = Store::open_in_memory().await.unwrap();
        let mut session = test_session(store.clone());
        session.settings.auto_create_accounts = false;

        let reply = session.handle_logon_challenge(&challenge_body("GHOST")).await.unwrap();
        assert_eq!(
            reply.contents(),
            &[
                AuthCmd::LogonChallenge as u8,
                0x00,
                AuthResult::FailedUnknownAccount as u8
            ]
        );
        assert!(store.get_account("GHOST").await.is_err());
    }

    #[tokio::test]
    async fn test_overlong_username_rejected() {
        let store = Store::open_in_memory().await.unwrap();
        let mut session = test_session(store.clone());

        let result = session
            .handle_logon_challenge(&challenge_body("SEVENTEENCHARSSSS"))
            .await;
        assert!(result.is_err());
        assert!(store.get_account("SEVENTEENCHARSSSS").await.is_err());
    }

    #[tokio::test]
    async fn test_proof_without_challenge_rejected() {
        let store = Store::open_in_memory().await.unwrap();
        let mut session = test_session(store);

        let body = proof_body(&[1u8; KEY_SIZE], &[2u8; PROOF_SIZE]);
        assert!(session.handle_logon_proof(&body).await.is_err());
    }

    #[tokio::test]
    async fn test_realm_list_before_authentication() {
        let store = Store::open_in_memory().await.unwrap();
        let session = test_session(store);

        // Valid straight away, before any challenge
        let reply = session.handle_realm_list();
        assert_eq!(reply.contents()[0], AuthCmd::RealmList as u8);
    }
}
