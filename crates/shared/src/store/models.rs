// Store models

use crate::auth::srp6::{SALT_SIZE, SESSION_KEY_SIZE, VERIFIER_SIZE};

/// An account row. Salt and verifier never change after creation; the
/// session key is rewritten by every successful login and read back by
/// the world handshake.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub salt: [u8; SALT_SIZE],
    pub verifier: [u8; VERIFIER_SIZE],
    pub session_key: Option<[u8; SESSION_KEY_SIZE]>,
}

/// A character row. The row id doubles as the character's low GUID.
#[derive(Debug, Clone)]
pub struct Character {
    pub id: i64,
    pub account_id: i64,
    pub name: String,
    pub race: u8,
    pub class: u8,
    pub gender: u8,
    pub skin: u8,
    pub face: u8,
    pub hair_style: u8,
    pub hair_color: u8,
    pub facial_hair: u8,
    pub level: u8,
    pub map: i32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub orientation: f32,
}

/// Payload for a character insert; the id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewCharacter {
    pub account_id: i64,
    pub name: String,
    pub race: u8,
    pub class: u8,
    pub gender: u8,
    pub skin: u8,
    pub face: u8,
    pub hair_style: u8,
    pub hair_color: u8,
    pub facial_hair: u8,
    pub level: u8,
    pub map: i32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub orientation: f32,
}
