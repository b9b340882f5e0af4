// WorldSession - world service packet handlers
//
// One session per connection, strictly sequential: a packet comes in,
// zero or more packets go out. The socket layer owns framing and the
// header cipher stepping; everything here works on opcode + payload.

use anyhow::anyhow;
use subtle::ConstantTimeEq;

use ashemu_shared::auth::crypto_hash::Sha1Hash;
use ashemu_shared::auth::world_crypt::WorldCrypt;
use ashemu_shared::store::{Account, NewCharacter, Store, StoreError};
use ashemu_shared::util::ByteBuffer;
use ashemu_shared::Expansion;

use crate::game_time;
use crate::opcodes::*;
use crate::player::Player;
use crate::positions::start_position;
use crate::update;

/// Session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldState {
    Init,
    Authed,
    CharSelect,
    InWorld,
}

/// An outbound packet: opcode plus payload, framed by the socket layer.
pub struct OutPacket {
    pub opcode: u16,
    pub payload: ByteBuffer,
}

fn out(opcode: u16, payload: ByteBuffer) -> OutPacket {
    OutPacket { opcode, payload }
}

/// Character result codes differ between the two builds
struct CharResultCodes {
    create_success: u8,
    create_failed: u8,
    name_in_use: u8,
    delete_success: u8,
}

fn char_codes(expansion: Expansion) -> CharResultCodes {
    match expansion {
        Expansion::Vanilla => CharResultCodes {
            create_success: 0x2E,
            create_failed: 0x30,
            name_in_use: 0x31,
            delete_success: 0x39,
        },
        Expansion::Tbc => CharResultCodes {
            create_success: 0x2F,
            create_failed: 0x31,
            name_in_use: 0x32,
            delete_success: 0x3A,
        },
    }
}

/// Per-connection world session.
pub struct WorldSession {
    store: Store,
    expansion: Expansion,
    state: WorldState,
    crypt: Option<WorldCrypt>,
    account: Option<Account>,
    player: Option<Player>,
    server_seed: u32,
    time_sync_counter: u32,
    close_requested: bool,
}

impl WorldSession {
    pub fn new(store: Store, expansion: Expansion) -> Self {
        WorldSession {
            store,
            expansion,
            state: WorldState::Init,
            crypt: None,
            account: None,
            player: None,
            server_seed: rand::random(),
            time_sync_counter: 0,
            close_requested: false,
        }
    }

    pub fn state(&self) -> WorldState {
        self.state
    }

    /// The handshake failed; the socket should stop after flushing
    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    /// Header cipher goes live once the auth session verifies; before
    /// that, headers travel in the clear.
    pub fn encryption_enabled(&self) -> bool {
        self.crypt.is_some()
    }

    pub fn encrypt_header(&mut self, header: &mut [u8]) {
        if let Some(crypt) = &mut self.crypt {
            crypt.encrypt(header);
        }
    }

    pub fn decrypt_header(&mut self, header: &mut [u8]) {
        if let Some(crypt) = &mut self.crypt {
            crypt.decrypt(header);
        }
    }

    /// The greeting the server sends on connect, before any input
    pub fn auth_challenge_packet(&self) -> OutPacket {
        let mut payload = ByteBuffer::new();
        payload.write_u32(self.server_seed);
        out(SMSG_AUTH_CHALLENGE, payload)
    }

    /// Dispatch one decoded packet.
    pub async fn handle_packet(
        &mut self,
        opcode: u16,
        payload: &[u8],
    ) -> anyhow::Result<Vec<OutPacket>> {
        match opcode {
            CMSG_AUTH_SESSION => self.handle_auth_session(payload).await,
            CMSG_CHAR_ENUM => self.handle_char_enum().await,
            CMSG_CHAR_CREATE => self.handle_char_create(payload).await,
            CMSG_CHAR_DELETE => self.handle_char_delete(payload).await,
            CMSG_PLAYER_LOGIN => self.handle_player_login(payload).await,
            CMSG_PING => Ok(self.handle_ping(payload)),
            CMSG_NAME_QUERY => self.handle_name_query(payload).await,
            CMSG_LOGOUT_REQUEST => self.handle_logout_request().await,
            CMSG_TIME_SYNC_RESP | CMSG_STANDSTATECHANGE | CMSG_SET_SELECTION => Ok(vec![]),
            _ if is_movement_opcode(opcode) => {
                self.handle_movement(payload);
                Ok(vec![])
            }
            _ => {
                tracing::debug!("Ignoring unhandled opcode 0x{:03X}", opcode);
                Ok(vec![])
            }
        }
    }

    async fn handle_auth_session(&mut self, payload: &[u8]) -> anyhow::Result<Vec<OutPacket>> {
        if self.state != WorldState::Init {
            tracing::debug!("Duplicate CMSG_AUTH_SESSION ignored");
            return Ok(vec![]);
        }

        let mut reader = ByteBuffer::from_bytes(payload);
        let build = reader.read_u32();
        let _server_id = reader.read_u32();
        let username = reader.read_cstring().to_uppercase();
        let client_seed = reader.read_u32();
        let client_digest = reader.read_bytes(20);

        tracing::info!("Auth session from '{}' (build {})", username, build);

        let account = match self.store.get_account(&username).await {
            Ok(account) => account,
            Err(StoreError::NotFound) => {
                tracing::warn!("Auth session for unknown account '{}'", username);
                return Ok(self.reject_auth_session(AUTH_UNKNOWN_ACCOUNT));
            }
            Err(err) => return Err(err.into()),
        };

        let Some(session_key) = account.session_key else {
            tracing::warn!("No session key on record for '{}'", username);
            return Ok(self.reject_auth_session(AUTH_UNKNOWN_ACCOUNT));
        };

        // digest = SHA1(username || 0u32 || client_seed || server_seed || K)
        let mut sha = Sha1Hash::new();
        sha.update_str(&username);
        sha.update_u32(0);
        sha.update_u32(client_seed);
        sha.update_u32(self.server_seed);
        sha.update_bytes(&session_key);
        sha.finalize();

        if !bool::from(sha.digest().ct_eq(&client_digest[..])) {
            tracing::warn!("Bad session digest for '{}'", username);
            return Ok(self.reject_auth_session(AUTH_FAILED));
        }

        // All traffic from here on runs through the header cipher
        self.crypt = Some(WorldCrypt::new(self.expansion, &session_key));
        self.account = Some(account);
        self.state = WorldState::Authed;

        tracing::info!("World auth successful for '{}'", username);

        let mut payload = ByteBuffer::new();
        payload.write_u8(AUTH_OK);
        payload.write_u32(0); // billing time remaining
        payload.write_u8(0); // billing plan flags
        payload.write_u32(0); // billing time rested
        Ok(vec![out(SMSG_AUTH_RESPONSE, payload)])
    }

    fn reject_auth_session(&mut self, code: u8) -> Vec<OutPacket> {
        self.close_requested = true;
        let mut payload = ByteBuffer::new();
        payload.write_u8(code);
        vec![out(SMSG_AUTH_RESPONSE, payload)]
    }

    fn require_account(&self) -> anyhow::Result<&Account> {
        self.account
            .as_ref()
            .ok_or_else(|| anyhow!("packet requires an authenticated session"))
    }

    async fn handle_char_enum(&mut self) -> anyhow::Result<Vec<OutPacket>> {
        let account_id = self.require_account()?.id;
        let characters = self.store.get_characters(account_id).await?;

        let mut payload = ByteBuffer::new();
        payload.write_u8(characters.len() as u8);

        for character in &characters {
            payload.write_u64(character.id as u64); // GUID
            payload.write_cstring(&character.name);
            payload.write_u8(character.race);
            payload.write_u8(character.class);
            payload.write_u8(character.gender);
            payload.write_u8(character.skin);
            payload.write_u8(character.face);
            payload.write_u8(character.hair_style);
            payload.write_u8(character.hair_color);
            payload.write_u8(character.facial_hair);
            payload.write_u8(character.level);
            payload.write_u32(start_position(character.race).zone_id);
            payload.write_u32(character.map as u32);
            payload.write_f32(character.x);
            payload.write_f32(character.y);
            payload.write_f32(character.z);
            payload.write_u32(0); // guild id
            payload.write_u32(0); // character flags
            payload.write_u8(0); // first login
            payload.write_u32(0); // pet display id
            payload.write_u32(0); // pet level
            payload.write_u32(0); // pet family

            // 20 equipment slots: display id + inventory type
            for _ in 0..20 {
                payload.write_u32(0);
                payload.write_u8(0);
            }
        }

        self.state = WorldState::CharSelect;
        Ok(vec![out(SMSG_CHAR_ENUM, payload)])
    }

    async fn handle_char_create(&mut self, data: &[u8]) -> anyhow::Result<Vec<OutPacket>> {
        let account_id = self.require_account()?.id;
        let codes = char_codes(self.expansion);

        let mut reader = ByteBuffer::from_bytes(data);
        let name = reader.read_cstring();
        let race = reader.read_u8();
        let class = reader.read_u8();
        let gender = reader.read_u8();
        let skin = reader.read_u8();
        let face = reader.read_u8();
        let hair_style = reader.read_u8();
        let hair_color = reader.read_u8();
        let facial_hair = reader.read_u8();

        tracing::info!("Character create '{}' (race {}, class {})", name, race, class);

        if name.is_empty() || name.len() > ashemu_shared::MAX_CHARACTER_NAME {
            let mut payload = ByteBuffer::new();
            payload.write_u8(codes.create_failed);
            return Ok(vec![out(SMSG_CHAR_CREATE, payload)]);
        }

        let start = start_position(race);
        let character = NewCharacter {
            account_id,
            name,
            race,
            class,
            gender,
            skin,
            face,
            hair_style,
            hair_color,
            facial_hair,
            level: 1,
            map: start.map,
            x: start.x,
            y: start.y,
            z: start.z,
            orientation: start.orientation,
        };

        let code = match self.store.create_character(&character).await {
            Ok(_) => codes.create_success,
            Err(StoreError::AlreadyExists) => codes.name_in_use,
            Err(err) => {
                tracing::error!("Character create failed: {}", err);
                codes.create_failed
            }
        };

        let mut payload = ByteBuffer::new();
        payload.write_u8(code);
        Ok(vec![out(SMSG_CHAR_CREATE, payload)])
    }

    async fn handle_char_delete(&mut self, data: &[u8]) -> anyhow::Result<Vec<OutPacket>> {
        self.require_account()?;
        let codes = char_codes(self.expansion);

        let mut reader = ByteBuffer::from_bytes(data);
        let guid = reader.read_u64();

        self.store.delete_character(guid as i64).await?;

        let mut payload = ByteBuffer::new();
        payload.write_u8(codes.delete_success);
        Ok(vec![out(SMSG_CHAR_DELETE, payload)])
    }

    async fn handle_player_login(&mut self, data: &[u8]) -> anyhow::Result<Vec<OutPacket>> {
        let account_id = self.require_account()?.id;

        let mut reader = ByteBuffer::from_bytes(data);
        let guid = reader.read_u64();

        let character = match self.store.get_character(guid as i64).await {
            Ok(character) if character.account_id == account_id => character,
            Ok(_) | Err(StoreError::NotFound) => {
                // No create payload goes out; the state stays put
                tracing::warn!("Player login for unknown character {}", guid);
                return Ok(vec![]);
            }
            Err(err) => return Err(err.into()),
        };

        tracing::info!("Player login: '{}'", character.name);
        let player = Player::new(character);

        let mut packets = Vec::new();

        // LOGIN_VERIFY_WORLD
        let mut payload = ByteBuffer::new();
        payload.write_u32(player.map as u32);
        payload.write_f32(player.x);
        payload.write_f32(player.y);
        payload.write_f32(player.z);
        payload.write_f32(player.orientation);
        packets.push(out(SMSG_LOGIN_VERIFY_WORLD, payload));

        // ACCOUNT_DATA_TIMES: 32 cache timestamps, none stored
        let mut payload = ByteBuffer::new();
        payload.write_zeros(32 * 4);
        packets.push(out(SMSG_ACCOUNT_DATA_TIMES, payload));

        // TUTORIAL_FLAGS: everything seen
        let mut payload = ByteBuffer::new();
        for _ in 0..8 {
            payload.write_u32(0xFFFF_FFFF);
        }
        packets.push(out(SMSG_TUTORIAL_FLAGS, payload));

        // LOGIN_SETTIMESPEED
        let mut payload = ByteBuffer::new();
        payload.write_u32(game_time::packed_now());
        payload.write_f32(game_time::GAME_SPEED);
        packets.push(out(SMSG_LOGIN_SETTIMESPEED, payload));

        // INITIAL_SPELLS: empty spell and cooldown lists
        let mut payload = ByteBuffer::new();
        payload.write_u8(0);
        payload.write_u16(0);
        payload.write_u16(0);
        packets.push(out(SMSG_INITIAL_SPELLS, payload));

        // ACTION_BUTTONS: 120 empty slots
        let mut payload = ByteBuffer::new();
        payload.write_zeros(120 * 4);
        packets.push(out(SMSG_ACTION_BUTTONS, payload));

        // INITIALIZE_FACTIONS: 64 neutral standings
        let mut payload = ByteBuffer::new();
        payload.write_u32(0x0000_0040);
        for _ in 0..64 {
            payload.write_u8(0);
            payload.write_u32(0);
        }
        packets.push(out(SMSG_INITIALIZE_FACTIONS, payload));

        // UPDATE_OBJECT: the create-self block
        packets.push(out(
            SMSG_UPDATE_OBJECT,
            update::build_create_packet(self.expansion, &player, true),
        ));

        // TIME_SYNC_REQ
        let mut payload = ByteBuffer::new();
        payload.write_u32(self.time_sync_counter);
        self.time_sync_counter += 1;
        packets.push(out(SMSG_TIME_SYNC_REQ, payload));

        self.player = Some(player);
        self.state = WorldState::InWorld;
        Ok(packets)
    }

    fn handle_ping(&mut self, data: &[u8]) -> Vec<OutPacket> {
        let mut reader = ByteBuffer::from_bytes(data);
        let nonce = reader.read_u32();
        let _latency = reader.read_u32();

        let mut payload = ByteBuffer::new();
        payload.write_u32(nonce);
        vec![out(SMSG_PONG, payload)]
    }

    async fn handle_name_query(&mut self, data: &[u8]) -> anyhow::Result<Vec<OutPacket>> {
        self.require_account()?;

        let mut reader = ByteBuffer::from_bytes(data);
        let guid = reader.read_u64();

        let mut payload = ByteBuffer::new();
        payload.write_u64(guid);

        match self.store.get_character(guid as i64).await {
            Ok(character) => {
                payload.write_cstring(&character.name);
                payload.write_u8(0); // realm name, empty = same realm
                payload.write_u32(character.race as u32);
                payload.write_u32(character.gender as u32);
                payload.write_u32(character.class as u32);
            }
            Err(_) => {
                payload.write_cstring("Unknown");
                payload.write_u8(0);
                payload.write_u32(0);
                payload.write_u32(0);
                payload.write_u32(0);
            }
        }

        Ok(vec![out(SMSG_NAME_QUERY_RESPONSE, payload)])
    }

    async fn handle_logout_request(&mut self) -> anyhow::Result<Vec<OutPacket>> {
        // Persist the last cached position before dropping the player
        self.persist_position().await;
        self.player = None;
        if self.state == WorldState::InWorld {
            self.state = WorldState::CharSelect;
        }

        let mut response = ByteBuffer::new();
        response.write_u32(0); // reason: accepted
        response.write_u8(1); // instant logout

        Ok(vec![
            out(SMSG_LOGOUT_RESPONSE, response),
            out(SMSG_LOGOUT_COMPLETE, ByteBuffer::new()),
        ])
    }

    /// Movement packets are not acknowledged; they only refresh the cache
    fn handle_movement(&mut self, data: &[u8]) {
        let Some(player) = &mut self.player else {
            return;
        };

        // MovementInfo: flags u32, (2.4.3: extra u8), time u32, position
        let prelude = match self.expansion {
            Expansion::Vanilla => 8,
            Expansion::Tbc => 9,
        };
        if data.len() < prelude + 16 {
            return;
        }

        let mut reader = ByteBuffer::from_bytes(data);
        reader.read_skip(prelude);
        player.x = reader.read_f32();
        player.y = reader.read_f32();
        player.z = reader.read_f32();
        player.orientation = reader.read_f32();
    }

    /// Write the player's cached position back to the store. Called on
    /// graceful logout and on connection loss from the world.
    pub async fn persist_position(&self) {
        let Some(player) = &self.player else {
            return;
        };

        if let Err(err) = self
            .store
            .update_character_position(
                player.character.id,
                player.map,
                player.x,
                player.y,
                player.z,
                player.orientation,
            )
            .await
        {
            tracing::error!("Failed to persist position for '{}': {}", player.character.name, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ashemu_shared::auth::srp6::{SALT_SIZE, SESSION_KEY_SIZE, VERIFIER_SIZE};

    const TEST_KEY: [u8; SESSION_KEY_SIZE] = [0x5A; SESSION_KEY_SIZE];

    async fn store_with_account() -> (Store, i64) {
        let store = Store::open_in_memory().await.unwrap();
        let account = store
            .create_account("ALICE", &[1u8; SALT_SIZE], &[2u8; VERIFIER_SIZE])
            .await
            .unwrap();
        store.update_session_key(account.id, &TEST_KEY).await.unwrap();
        (store, account.id)
    }

    fn auth_session_payload(username: &str, client_seed: u32, server_seed: u32) -> Vec<u8> {
        let mut sha = Sha1Hash::new();
        sha.update_str(username);
        sha.update_u32(0);
        sha.update_u32(client_seed);
        sha.update_u32(server_seed);
        sha.update_bytes(&TEST_KEY);
        sha.finalize();

        let mut payload = ByteBuffer::new();
        payload.write_u32(5875);
        payload.write_u32(0); // server id
        payload.write_cstring(username);
        payload.write_u32(client_seed);
        payload.append(sha.digest());
        payload.contents().to_vec()
    }

    async fn authed_session(expansion: Expansion) -> (WorldSession, Store) {
        let (store, _) = store_with_account().await;
        let mut session = WorldSession::new(store.clone(), expansion);

        let payload = auth_session_payload("ALICE", 0x11223344, session.server_seed);
        let replies = session.handle_packet(CMSG_AUTH_SESSION, &payload).await.unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].payload.contents()[0], AUTH_OK);
        (session, store)
    }

    fn char_create_payload(name: &str, race: u8, class: u8) -> Vec<u8> {
        let mut payload = ByteBuffer::new();
        payload.write_cstring(name);
        payload.write_u8(race);
        payload.write_u8(class);
        payload.write_u8(0); // gender
        payload.write_u8(1); // skin
        payload.write_u8(2); // face
        payload.write_u8(3); // hair style
        payload.write_u8(4); // hair color
        payload.write_u8(5); // facial hair
        payload.write_u8(0); // outfit id
        payload.contents().to_vec()
    }

    #[tokio::test]
    async fn test_auth_session_enables_cipher() {
        let (session, _) = authed_session(Expansion::Vanilla).await;
        assert!(session.encryption_enabled());
        assert_eq!(session.state(), WorldState::Authed);
        assert!(!session.close_requested());
    }

    #[tokio::test]
    async fn test_auth_session_bad_digest_closes() {
        let (store, _) = store_with_account().await;
        let mut session = WorldSession::new(store, Expansion::Vanilla);

        // Digest computed against the wrong server seed
        let payload = auth_session_payload("ALICE", 1, session.server_seed.wrapping_add(1));
        let replies = session.handle_packet(CMSG_AUTH_SESSION, &payload).await.unwrap();

        assert_eq!(replies[0].payload.contents(), &[AUTH_FAILED]);
        assert!(session.close_requested());
        assert!(!session.encryption_enabled());
        assert_eq!(session.state(), WorldState::Init);
    }

    #[tokio::test]
    async fn test_auth_session_requires_session_key() {
        let store = Store::open_in_memory().await.unwrap();
        store
            .create_account("KEYLESS", &[0u8; SALT_SIZE], &[0u8; VERIFIER_SIZE])
            .await
            .unwrap();

        let mut session = WorldSession::new(store, Expansion::Vanilla);
        let payload = auth_session_payload("KEYLESS", 1, session.server_seed);
        let replies = session.handle_packet(CMSG_AUTH_SESSION, &payload).await.unwrap();

        assert_eq!(replies[0].payload.contents(), &[AUTH_UNKNOWN_ACCOUNT]);
        assert!(session.close_requested());
    }

    #[tokio::test]
    async fn test_char_create_then_enum() {
        let (mut session, store) = authed_session(Expansion::Vanilla).await;

        let replies = session
            .handle_packet(CMSG_CHAR_CREATE, &char_create_payload("Carol", 1, 1))
            .await
            .unwrap();
        assert_eq!(replies[0].opcode, SMSG_CHAR_CREATE);
        assert_eq!(replies[0].payload.contents(), &[0x2E]); // created

        let characters = store.get_characters(session.account.as_ref().unwrap().id).await.unwrap();
        assert_eq!(characters.len(), 1);
        let expected_id = characters[0].id as u64;

        let replies = session.handle_packet(CMSG_CHAR_ENUM, &[]).await.unwrap();
        assert_eq!(replies[0].opcode, SMSG_CHAR_ENUM);
        assert_eq!(session.state(), WorldState::CharSelect);

        let mut buf = ByteBuffer::from_bytes(replies[0].payload.contents());
        assert_eq!(buf.read_u8(), 1); // one character
        assert_eq!(buf.read_u64(), expected_id);
        assert_eq!(buf.read_cstring(), "Carol");
        assert_eq!(buf.read_u8(), 1); // race
        assert_eq!(buf.read_u8(), 1); // class
        buf.read_skip(6); // gender + appearance
        assert_eq!(buf.read_u8(), 1); // level
        assert_eq!(buf.read_u32(), 12); // zone: Elwynn Forest
        assert_eq!(buf.read_u32(), 0); // map: Eastern Kingdoms
        assert_eq!(buf.read_f32(), -8949.95); // Human start position
        assert_eq!(buf.read_f32(), -132.493);
        assert_eq!(buf.read_f32(), 83.5312);
    }

    #[tokio::test]
    async fn test_char_create_duplicate_name() {
        let (mut session, _) = authed_session(Expansion::Vanilla).await;

        session
            .handle_packet(CMSG_CHAR_CREATE, &char_create_payload("Carol", 1, 1))
            .await
            .unwrap();
        let replies = session
            .handle_packet(CMSG_CHAR_CREATE, &char_create_payload("carol", 2, 1))
            .await
            .unwrap();

        assert_eq!(replies[0].payload.contents(), &[0x31]); // name in use
    }

    #[tokio::test]
    async fn test_char_delete() {
        let (mut session, store) = authed_session(Expansion::Vanilla).await;
        session
            .handle_packet(CMSG_CHAR_CREATE, &char_create_payload("Carol", 1, 1))
            .await
            .unwrap();
        let id = store.get_characters(session.account.as_ref().unwrap().id).await.unwrap()[0].id;

        let replies = session
            .handle_packet(CMSG_CHAR_DELETE, &(id as u64).to_le_bytes())
            .await
            .unwrap();
        assert_eq!(replies[0].opcode, SMSG_CHAR_DELETE);
        assert_eq!(replies[0].payload.contents(), &[0x39]);
        assert!(store.get_character(id).await.is_err());
    }

    #[tokio::test]
    async fn test_player_login_sequence_order() {
        let (mut session, store) = authed_session(Expansion::Vanilla).await;
        session
            .handle_packet(CMSG_CHAR_CREATE, &char_create_payload("Carol", 1, 1))
            .await
            .unwrap();
        session.handle_packet(CMSG_CHAR_ENUM, &[]).await.unwrap();
        let id = store.get_characters(session.account.as_ref().unwrap().id).await.unwrap()[0].id;

        let replies = session
            .handle_packet(CMSG_PLAYER_LOGIN, &(id as u64).to_le_bytes())
            .await
            .unwrap();

        let opcodes: Vec<u16> = replies.iter().map(|p| p.opcode).collect();
        assert_eq!(
            opcodes,
            vec![
                SMSG_LOGIN_VERIFY_WORLD,
                SMSG_ACCOUNT_DATA_TIMES,
                SMSG_TUTORIAL_FLAGS,
                SMSG_LOGIN_SETTIMESPEED,
                SMSG_INITIAL_SPELLS,
                SMSG_ACTION_BUTTONS,
                SMSG_INITIALIZE_FACTIONS,
                SMSG_UPDATE_OBJECT,
                SMSG_TIME_SYNC_REQ,
            ]
        );
        assert_eq!(session.state(), WorldState::InWorld);

        // Fixed-size payload checks
        assert_eq!(replies[1].payload.size(), 128); // 32 account data slots
        assert_eq!(replies[2].payload.size(), 32); // 8 tutorial words
        assert_eq!(replies[5].payload.size(), 480); // 120 action buttons
        assert_eq!(replies[6].payload.size(), 4 + 64 * 5); // faction block

        // Time sync counter increases monotonically
        let mut buf = ByteBuffer::from_bytes(replies[8].payload.contents());
        assert_eq!(buf.read_u32(), 0);
    }

    #[tokio::test]
    async fn test_player_login_unknown_character() {
        let (mut session, _) = authed_session(Expansion::Vanilla).await;
        session.handle_packet(CMSG_CHAR_ENUM, &[]).await.unwrap();

        let replies = session
            .handle_packet(CMSG_PLAYER_LOGIN, &999u64.to_le_bytes())
            .await
            .unwrap();

        assert!(replies.is_empty());
        assert_eq!(session.state(), WorldState::CharSelect);
    }

    #[tokio::test]
    async fn test_player_login_foreign_character_rejected() {
        let (mut session, store) = authed_session(Expansion::Vanilla).await;

        // A character owned by some other account
        let other = store
            .create_account("MALLORY", &[0u8; SALT_SIZE], &[0u8; VERIFIER_SIZE])
            .await
            .unwrap();
        let foreign = NewCharacter {
            account_id: other.id,
            name: "Mal".to_string(),
            race: 1,
            class: 1,
            gender: 0,
            skin: 0,
            face: 0,
            hair_style: 0,
            hair_color: 0,
            facial_hair: 0,
            level: 1,
            map: 0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            orientation: 0.0,
        };
        let foreign_id = store.create_character(&foreign).await.unwrap();

        let replies = session
            .handle_packet(CMSG_PLAYER_LOGIN, &(foreign_id as u64).to_le_bytes())
            .await
            .unwrap();
        assert!(replies.is_empty());
        assert_eq!(session.state(), WorldState::Authed);
    }

    #[tokio::test]
    async fn test_ping_echoes_nonce() {
        let (store, _) = store_with_account().await;
        let mut session = WorldSession::new(store, Expansion::Vanilla);

        let mut payload = ByteBuffer::new();
        payload.write_u32(0xCAFEBABE);
        payload.write_u32(42);

        let replies = session.handle_packet(CMSG_PING, payload.contents()).await.unwrap();
        assert_eq!(replies[0].opcode, SMSG_PONG);
        let mut buf = ByteBuffer::from_bytes(replies[0].payload.contents());
        assert_eq!(buf.read_u32(), 0xCAFEBABE);
    }

    #[tokio::test]
    async fn test_logout_returns_to_char_select_and_saves() {
        let (mut session, store) = authed_session(Expansion::Vanilla).await;
        session
            .handle_packet(CMSG_CHAR_CREATE, &char_create_payload("Carol", 1, 1))
            .await
            .unwrap();
        let id = store.get_characters(session.account.as_ref().unwrap().id).await.unwrap()[0].id;
        session
            .handle_packet(CMSG_PLAYER_LOGIN, &(id as u64).to_le_bytes())
            .await
            .unwrap();

        // Move, then log out gracefully
        let mut movement = ByteBuffer::new();
        movement.write_u32(0); // flags
        movement.write_u32(1000); // time
        movement.write_f32(-8900.0);
        movement.write_f32(-100.0);
        movement.write_f32(84.0);
        movement.write_f32(1.25);
        session
            .handle_packet(MSG_MOVE_HEARTBEAT, movement.contents())
            .await
            .unwrap();

        let replies = session.handle_packet(CMSG_LOGOUT_REQUEST, &[]).await.unwrap();
        assert_eq!(replies[0].opcode, SMSG_LOGOUT_RESPONSE);
        let mut buf = ByteBuffer::from_bytes(replies[0].payload.contents());
        assert_eq!(buf.read_u32(), 0);
        assert_eq!(buf.read_u8(), 1);
        assert_eq!(replies[1].opcode, SMSG_LOGOUT_COMPLETE);
        assert!(replies[1].payload.is_empty());
        assert_eq!(session.state(), WorldState::CharSelect);

        // The moved-to position reached the store
        let saved = store.get_character(id).await.unwrap();
        assert_eq!(saved.x, -8900.0);
        assert_eq!(saved.orientation, 1.25);
    }

    #[tokio::test]
    async fn test_movement_ignored_without_player() {
        let (mut session, _) = authed_session(Expansion::Vanilla).await;

        let mut movement = ByteBuffer::new();
        movement.write_u32(0);
        movement.write_u32(0);
        movement.write_f32(1.0);
        movement.write_f32(2.0);
        movement.write_f32(3.0);
        movement.write_f32(4.0);

        let replies = session
            .handle_packet(MSG_MOVE_HEARTBEAT, movement.contents())
            .await
            .unwrap();
        assert!(replies.is_empty());
    }

    #[tokio::test]
    async fn test_name_query() {
        let (mut session, store) = authed_session(Expansion::Vanilla).await;
        session
            .handle_packet(CMSG_CHAR_CREATE, &char_create_payload("Carol", 1, 1))
            .await
            .unwrap();
        let id = store.get_characters(session.account.as_ref().unwrap().id).await.unwrap()[0].id;

        let replies = session
            .handle_packet(CMSG_NAME_QUERY, &(id as u64).to_le_bytes())
            .await
            .unwrap();
        let mut buf = ByteBuffer::from_bytes(replies[0].payload.contents());
        assert_eq!(buf.read_u64(), id as u64);
        assert_eq!(buf.read_cstring(), "Carol");

        // Unknown GUIDs answer too, with a placeholder
        let replies = session
            .handle_packet(CMSG_NAME_QUERY, &12345u64.to_le_bytes())
            .await
            .unwrap();
        let mut buf = ByteBuffer::from_bytes(replies[0].payload.contents());
        assert_eq!(buf.read_u64(), 12345);
        assert_eq!(buf.read_cstring(), "Unknown");
    }

    #[tokio::test]
    async fn test_tbc_char_codes() {
        let (mut session, _) = authed_session(Expansion::Tbc).await;
        let replies = session
            .handle_packet(CMSG_CHAR_CREATE, &char_create_payload("Thrall", 2, 1))
            .await
            .unwrap();
        assert_eq!(replies[0].payload.contents(), &[0x2F]); // TBC create success
    }
}
