// Update - SMSG_UPDATE_OBJECT payload assembly
//
// The create-self payload is a movement prelude followed by a sparse
// field update: a bitmask marking which schema slots are present, then
// the marked 32-bit values in ascending slot order.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use ashemu_shared::util::ByteBuffer;
use ashemu_shared::Expansion;

use crate::player::Player;
use crate::update_fields::*;

/// Sparse field table with a high-water mark, used once per emission.
#[derive(Debug, Default)]
pub struct UpdateBuilder {
    fields: BTreeMap<u16, u32>,
}

impl UpdateBuilder {
    pub fn new() -> Self {
        UpdateBuilder::default()
    }

    pub fn set_u32(&mut self, index: u16, value: u32) {
        self.fields.insert(index, value);
    }

    pub fn set_i32(&mut self, index: u16, value: i32) {
        self.set_u32(index, value as u32);
    }

    pub fn set_f32(&mut self, index: u16, value: f32) {
        self.set_u32(index, value.to_bits());
    }

    /// A GUID occupies two adjacent slots, low half first
    pub fn set_guid(&mut self, index: u16, value: u64) {
        self.set_u32(index, value as u32);
        self.set_u32(index + 1, (value >> 32) as u32);
    }

    /// Set one byte inside a 32-bit slot (byte_index 0..=3)
    pub fn set_byte(&mut self, index: u16, byte_index: u8, value: u8) {
        let shift = (byte_index as u32 % 4) * 8;
        let slot = self.fields.entry(index).or_insert(0);
        *slot = (*slot & !(0xFFu32 << shift)) | ((value as u32) << shift);
    }

    /// Emit `u8 block_count`, the bitmask words and the set values.
    pub fn write_fields(&self, packet: &mut ByteBuffer) {
        let max_index = match self.fields.keys().next_back() {
            Some(&index) => index as usize,
            None => {
                packet.write_u8(0);
                return;
            }
        };

        let block_count = (max_index + 1).div_ceil(32);
        packet.write_u8(block_count as u8);

        let mut mask = vec![0u32; block_count];
        for &index in self.fields.keys() {
            mask[index as usize / 32] |= 1 << (index % 32);
        }
        for word in &mask {
            packet.write_u32(*word);
        }

        for value in self.fields.values() {
            packet.write_u32(*value);
        }
    }
}

/// Millisecond tick for the movement timestamp
fn tick_count() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u32)
        .unwrap_or(0)
}

fn write_movement_block(packet: &mut ByteBuffer, expansion: Expansion, player: &Player) {
    packet.write_u32(0); // movement flags
    if expansion == Expansion::Tbc {
        packet.write_u8(0); // extra movement flags
    }
    packet.write_u32(tick_count());

    packet.write_f32(player.x);
    packet.write_f32(player.y);
    packet.write_f32(player.z);
    packet.write_f32(player.orientation);

    packet.write_u32(0); // fall time

    packet.write_f32(2.5); // walk speed
    packet.write_f32(7.0); // run speed
    packet.write_f32(4.5); // run back speed
    packet.write_f32(4.722222); // swim speed
    packet.write_f32(2.5); // swim back speed
    if expansion == Expansion::Tbc {
        packet.write_f32(7.0); // flight speed
        packet.write_f32(4.5); // flight back speed
    }
    packet.write_f32(std::f32::consts::PI); // turn rate
}

/// The minimum field set a level-1 player needs to render and take input
fn populate_create_fields(builder: &mut UpdateBuilder, expansion: Expansion, player: &Player) {
    match expansion {
        Expansion::Vanilla => populate_vanilla(builder, player),
        Expansion::Tbc => populate_tbc(builder, player),
    }
}

fn populate_vanilla(builder: &mut UpdateBuilder, player: &Player) {
    use vanilla::*;

    builder.set_guid(OBJECT_FIELD_GUID, player.guid);
    builder.set_u32(OBJECT_FIELD_TYPE, TYPE_OBJECT | TYPE_UNIT | TYPE_PLAYER);
    builder.set_f32(OBJECT_FIELD_SCALE_X, 1.0);

    builder.set_u32(UNIT_FIELD_HEALTH, player.health());
    builder.set_u32(UNIT_FIELD_MAXHEALTH, player.max_health());
    builder.set_u32(UNIT_FIELD_POWER1, player.power());
    builder.set_u32(UNIT_FIELD_MAXPOWER1, player.max_power());
    builder.set_u32(UNIT_FIELD_LEVEL, player.character.level as u32);
    builder.set_u32(UNIT_FIELD_FACTIONTEMPLATE, player.faction_template());

    builder.set_byte(UNIT_FIELD_BYTES_0, 0, player.character.race);
    builder.set_byte(UNIT_FIELD_BYTES_0, 1, player.character.class);
    builder.set_byte(UNIT_FIELD_BYTES_0, 2, player.character.gender);
    builder.set_byte(UNIT_FIELD_BYTES_0, 3, player.power_type());

    builder.set_u32(UNIT_FIELD_DISPLAYID, player.display_id());
    builder.set_u32(UNIT_FIELD_NATIVEDISPLAYID, player.display_id());

    builder.set_f32(UNIT_FIELD_BOUNDINGRADIUS, 0.389);
    builder.set_f32(UNIT_FIELD_COMBATREACH, 1.5);

    builder.set_f32(UNIT_FIELD_MINDAMAGE, 1.0);
    builder.set_f32(UNIT_FIELD_MAXDAMAGE, 2.0);
    builder.set_u32(UNIT_FIELD_BASEATTACKTIME, 2000);
    builder.set_u32(UNIT_FIELD_BASEATTACKTIME + 1, 2000);

    builder.set_f32(UNIT_MOD_CAST_SPEED, 1.0);

    for i in 0..5 {
        builder.set_u32(UNIT_FIELD_STAT0 + i, 20);
    }

    builder.set_u32(UNIT_FIELD_BASE_HEALTH, player.max_health());
    builder.set_u32(UNIT_FIELD_BASE_MANA, player.max_power());

    builder.set_byte(UNIT_FIELD_BYTES_1, 0, 0); // standstate

    builder.set_u32(PLAYER_FLAGS, 0);
    builder.set_byte(PLAYER_BYTES, 0, player.character.skin);
    builder.set_byte(PLAYER_BYTES, 1, player.character.face);
    builder.set_byte(PLAYER_BYTES, 2, player.character.hair_style);
    builder.set_byte(PLAYER_BYTES, 3, player.character.hair_color);
    builder.set_byte(PLAYER_BYTES_2, 0, player.character.facial_hair);
    builder.set_byte(PLAYER_BYTES_3, 0, player.character.gender);
}

fn populate_tbc(builder: &mut UpdateBuilder, player: &Player) {
    use tbc::*;

    builder.set_guid(OBJECT_FIELD_GUID, player.guid);
    builder.set_u32(OBJECT_FIELD_TYPE, TYPE_OBJECT | TYPE_UNIT | TYPE_PLAYER);
    builder.set_f32(OBJECT_FIELD_SCALE_X, 1.0);

    builder.set_u32(UNIT_FIELD_HEALTH, player.health());
    builder.set_u32(UNIT_FIELD_MAXHEALTH, player.max_health());
    builder.set_u32(UNIT_FIELD_POWER1, player.power());
    builder.set_u32(UNIT_FIELD_MAXPOWER1, player.max_power());
    builder.set_u32(UNIT_FIELD_LEVEL, player.character.level as u32);
    builder.set_u32(UNIT_FIELD_FACTIONTEMPLATE, player.faction_template());

    builder.set_byte(UNIT_FIELD_BYTES_0, 0, player.character.race);
    builder.set_byte(UNIT_FIELD_BYTES_0, 1, player.character.class);
    builder.set_byte(UNIT_FIELD_BYTES_0, 2, player.character.gender);
    builder.set_byte(UNIT_FIELD_BYTES_0, 3, player.power_type());

    builder.set_u32(UNIT_FIELD_FLAGS, UNIT_FLAG_PLAYER_CONTROLLED);

    builder.set_u32(UNIT_FIELD_DISPLAYID, player.display_id());
    builder.set_u32(UNIT_FIELD_NATIVEDISPLAYID, player.display_id());
    builder.set_u32(UNIT_FIELD_MOUNTDISPLAYID, 0);

    builder.set_f32(UNIT_FIELD_BOUNDINGRADIUS, 0.389);
    builder.set_f32(UNIT_FIELD_COMBATREACH, 1.5);

    builder.set_f32(UNIT_FIELD_MINDAMAGE, 1.0);
    builder.set_f32(UNIT_FIELD_MAXDAMAGE, 2.0);
    builder.set_f32(UNIT_FIELD_MINOFFHANDDAMAGE, 0.0);
    builder.set_f32(UNIT_FIELD_MAXOFFHANDDAMAGE, 0.0);
    builder.set_u32(UNIT_FIELD_BASEATTACKTIME, 2000);
    builder.set_u32(UNIT_FIELD_BASEATTACKTIME + 1, 2000);
    builder.set_u32(UNIT_FIELD_RANGEDATTACKTIME, 0);

    builder.set_f32(UNIT_MOD_CAST_SPEED, 1.0);

    for i in 0..5 {
        builder.set_u32(UNIT_FIELD_STAT0 + i, 20);
    }

    // Armor and the six magic schools
    for i in 0..7 {
        builder.set_u32(UNIT_FIELD_RESISTANCES + i, 0);
    }

    builder.set_u32(UNIT_FIELD_BASE_HEALTH, player.max_health());
    builder.set_u32(UNIT_FIELD_BASE_MANA, player.max_power());

    builder.set_byte(UNIT_FIELD_BYTES_1, 0, 0); // standstate
    builder.set_byte(UNIT_FIELD_BYTES_2, 0, 0); // sheath state
    builder.set_byte(UNIT_FIELD_BYTES_2, 1, 0x28); // pvp flags

    builder.set_u32(UNIT_FIELD_ATTACK_POWER, 0);
    builder.set_u32(UNIT_FIELD_ATTACK_POWER_MODS, 0);
    builder.set_f32(UNIT_FIELD_ATTACK_POWER_MULTIPLIER, 1.0);
    builder.set_u32(UNIT_FIELD_RANGED_ATTACK_POWER, 0);
    builder.set_u32(UNIT_FIELD_RANGED_ATTACK_POWER_MODS, 0);
    builder.set_f32(UNIT_FIELD_RANGED_ATTACK_POWER_MULT, 1.0);
    builder.set_f32(UNIT_FIELD_MINRANGEDDAMAGE, 0.0);
    builder.set_f32(UNIT_FIELD_MAXRANGEDDAMAGE, 0.0);

    builder.set_u32(PLAYER_FLAGS, 0);
    builder.set_byte(PLAYER_BYTES, 0, player.character.skin);
    builder.set_byte(PLAYER_BYTES, 1, player.character.face);
    builder.set_byte(PLAYER_BYTES, 2, player.character.hair_style);
    builder.set_byte(PLAYER_BYTES, 3, player.character.hair_color);
    builder.set_byte(PLAYER_BYTES_2, 0, player.character.facial_hair);
    builder.set_byte(PLAYER_BYTES_3, 0, player.character.gender);

    builder.set_u32(PLAYER_XP, 0);
    builder.set_u32(PLAYER_NEXT_LEVEL_XP, 400);
    builder.set_u32(PLAYER_CHARACTER_POINTS1, 0); // talent points
    builder.set_u32(PLAYER_CHARACTER_POINTS2, 2); // profession slots

    builder.set_f32(PLAYER_BLOCK_PERCENTAGE, 0.0);
    builder.set_f32(PLAYER_DODGE_PERCENTAGE, 0.0);
    builder.set_f32(PLAYER_PARRY_PERCENTAGE, 0.0);
    builder.set_f32(PLAYER_CRIT_PERCENTAGE, 0.0);
    builder.set_f32(PLAYER_RANGED_CRIT_PERCENTAGE, 0.0);

    builder.set_u32(PLAYER_REST_STATE_EXPERIENCE, 0);
    builder.set_u32(PLAYER_FIELD_COINAGE, 0);

    for i in 0..7 {
        builder.set_f32(PLAYER_FIELD_MOD_DAMAGE_DONE_PCT + i, 1.0);
    }

    builder.set_i32(PLAYER_FIELD_WATCHED_FACTION_INDEX, -1);
    builder.set_u32(PLAYER_FIELD_MAX_LEVEL, 70);
}

/// Build the full create-object payload for SMSG_UPDATE_OBJECT.
pub fn build_create_packet(expansion: Expansion, player: &Player, is_self: bool) -> ByteBuffer {
    let mut builder = UpdateBuilder::new();
    populate_create_fields(&mut builder, expansion, player);

    let mut packet = ByteBuffer::new();
    packet.write_u32(1); // block count
    packet.write_u8(0); // has transport
    if expansion == Expansion::Tbc {
        packet.write_u8(0);
    }

    packet.write_u8(UPDATETYPE_CREATE_OBJECT2);
    packet.write_packed_guid(player.guid);
    packet.write_u8(TYPEID_PLAYER);

    let mut update_flags = UPDATEFLAG_LIVING | UPDATEFLAG_HAS_POSITION;
    if expansion == Expansion::Tbc {
        update_flags |= UPDATEFLAG_HIGHGUID;
    }
    if is_self {
        update_flags |= UPDATEFLAG_SELF;
    }
    packet.write_u8(update_flags);

    write_movement_block(&mut packet, expansion, player);

    if expansion == Expansion::Tbc {
        packet.write_u32(0); // high GUID part, always 0 for players
    }

    builder.write_fields(&mut packet);
    packet
}
