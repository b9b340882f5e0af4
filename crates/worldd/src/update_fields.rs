// Update fields - object schema indices for both client builds
//
// The client addresses unit and player state as a dense array of 32-bit
// fields; the indices are fixed per build. Only the slice of each schema
// that the create-self payload touches is reproduced here.

#![allow(dead_code)]

/// Object type flags (OBJECT_FIELD_TYPE bitmask)
pub const TYPE_OBJECT: u32 = 0x0001;
pub const TYPE_UNIT: u32 = 0x0008;
pub const TYPE_PLAYER: u32 = 0x0010;

/// Type id written into the create block
pub const TYPEID_PLAYER: u8 = 4;

/// Update block type
pub const UPDATETYPE_CREATE_OBJECT2: u8 = 3;

/// Update flags
pub const UPDATEFLAG_SELF: u8 = 0x01;
pub const UPDATEFLAG_HIGHGUID: u8 = 0x10;
pub const UPDATEFLAG_LIVING: u8 = 0x20;
pub const UPDATEFLAG_HAS_POSITION: u8 = 0x40;

/// UNIT_FIELD_FLAGS: controlled by a player
pub const UNIT_FLAG_PLAYER_CONTROLLED: u32 = 0x0008;

/// Build 5875 (1.12.1) field indices
pub mod vanilla {
    pub const OBJECT_FIELD_GUID: u16 = 0x0000; // 2 slots
    pub const OBJECT_FIELD_TYPE: u16 = 0x0002;
    pub const OBJECT_FIELD_ENTRY: u16 = 0x0003;
    pub const OBJECT_FIELD_SCALE_X: u16 = 0x0004;
    pub const OBJECT_END: u16 = 0x0006;

    pub const UNIT_FIELD_HEALTH: u16 = 0x0016;
    pub const UNIT_FIELD_POWER1: u16 = 0x0017;
    pub const UNIT_FIELD_MAXHEALTH: u16 = 0x001C;
    pub const UNIT_FIELD_MAXPOWER1: u16 = 0x001D;
    pub const UNIT_FIELD_LEVEL: u16 = 0x0022;
    pub const UNIT_FIELD_FACTIONTEMPLATE: u16 = 0x0023;
    pub const UNIT_FIELD_BYTES_0: u16 = 0x0024;
    pub const UNIT_FIELD_FLAGS: u16 = 0x002E;
    pub const UNIT_FIELD_BASEATTACKTIME: u16 = 0x007E; // 2 slots
    pub const UNIT_FIELD_BOUNDINGRADIUS: u16 = 0x0081;
    pub const UNIT_FIELD_COMBATREACH: u16 = 0x0082;
    pub const UNIT_FIELD_DISPLAYID: u16 = 0x0083;
    pub const UNIT_FIELD_NATIVEDISPLAYID: u16 = 0x0084;
    pub const UNIT_FIELD_MINDAMAGE: u16 = 0x0086;
    pub const UNIT_FIELD_MAXDAMAGE: u16 = 0x0087;
    pub const UNIT_FIELD_BYTES_1: u16 = 0x008A;
    pub const UNIT_MOD_CAST_SPEED: u16 = 0x0091;
    pub const UNIT_FIELD_STAT0: u16 = 0x0096; // Str, Agi, Sta, Int, Spi
    pub const UNIT_FIELD_BASE_MANA: u16 = 0x00A2;
    pub const UNIT_FIELD_BASE_HEALTH: u16 = 0x00A3;
    pub const UNIT_END: u16 = 0x00BC;

    pub const PLAYER_FLAGS: u16 = 0x00BE;
    pub const PLAYER_BYTES: u16 = 0x00C1; // skin, face, hair style, hair color
    pub const PLAYER_BYTES_2: u16 = 0x00C2; // facial hair, .., rest state
    pub const PLAYER_BYTES_3: u16 = 0x00C3; // gender, drunk state
}

/// Build 8606 (2.4.3) field indices
pub mod tbc {
    pub const OBJECT_FIELD_GUID: u16 = 0x0000; // 2 slots
    pub const OBJECT_FIELD_TYPE: u16 = 0x0002;
    pub const OBJECT_FIELD_ENTRY: u16 = 0x0003;
    pub const OBJECT_FIELD_SCALE_X: u16 = 0x0004;
    pub const OBJECT_END: u16 = 0x0006;

    pub const UNIT_FIELD_HEALTH: u16 = 0x0016;
    pub const UNIT_FIELD_POWER1: u16 = 0x0017;
    pub const UNIT_FIELD_MAXHEALTH: u16 = 0x001C;
    pub const UNIT_FIELD_MAXPOWER1: u16 = 0x001D;
    pub const UNIT_FIELD_LEVEL: u16 = 0x0022;
    pub const UNIT_FIELD_FACTIONTEMPLATE: u16 = 0x0023;
    pub const UNIT_FIELD_BYTES_0: u16 = 0x0024;
    pub const UNIT_FIELD_FLAGS: u16 = 0x002E;
    pub const UNIT_FIELD_BASEATTACKTIME: u16 = 0x0093; // 2 slots
    pub const UNIT_FIELD_RANGEDATTACKTIME: u16 = 0x0095;
    pub const UNIT_FIELD_BOUNDINGRADIUS: u16 = 0x0096;
    pub const UNIT_FIELD_COMBATREACH: u16 = 0x0097;
    pub const UNIT_FIELD_DISPLAYID: u16 = 0x0098;
    pub const UNIT_FIELD_NATIVEDISPLAYID: u16 = 0x0099;
    pub const UNIT_FIELD_MOUNTDISPLAYID: u16 = 0x009A;
    pub const UNIT_FIELD_MINDAMAGE: u16 = 0x009B;
    pub const UNIT_FIELD_MAXDAMAGE: u16 = 0x009C;
    pub const UNIT_FIELD_MINOFFHANDDAMAGE: u16 = 0x009D;
    pub const UNIT_FIELD_MAXOFFHANDDAMAGE: u16 = 0x009E;
    pub const UNIT_FIELD_BYTES_1: u16 = 0x009F;
    pub const UNIT_MOD_CAST_SPEED: u16 = 0x00A6;
    pub const UNIT_FIELD_STAT0: u16 = 0x00AB; // Str, Agi, Sta, Int, Spi
    pub const UNIT_FIELD_RESISTANCES: u16 = 0x00BA; // 7 slots
    pub const UNIT_FIELD_BASE_MANA: u16 = 0x00CF;
    pub const UNIT_FIELD_BASE_HEALTH: u16 = 0x00D0;
    pub const UNIT_FIELD_BYTES_2: u16 = 0x00D1;
    pub const UNIT_FIELD_ATTACK_POWER: u16 = 0x00D2;
    pub const UNIT_FIELD_ATTACK_POWER_MODS: u16 = 0x00D3;
    pub const UNIT_FIELD_ATTACK_POWER_MULTIPLIER: u16 = 0x00D4;
    pub const UNIT_FIELD_RANGED_ATTACK_POWER: u16 = 0x00D5;
    pub const UNIT_FIELD_RANGED_ATTACK_POWER_MODS: u16 = 0x00D6;
    pub const UNIT_FIELD_RANGED_ATTACK_POWER_MULT: u16 = 0x00D7;
    pub const UNIT_FIELD_MINRANGEDDAMAGE: u16 = 0x00D8;
    pub const UNIT_FIELD_MAXRANGEDDAMAGE: u16 = 0x00D9;
    pub const UNIT_END: u16 = 0x00E9;

    pub const PLAYER_FLAGS: u16 = 0x00EB;
    pub const PLAYER_BYTES: u16 = 0x00EE; // skin, face, hair style, hair color
    pub const PLAYER_BYTES_2: u16 = 0x00EF; // facial hair, .., rest state
    pub const PLAYER_BYTES_3: u16 = 0x00F0; // gender, drunk state
    pub const PLAYER_XP: u16 = 0x0387;
    pub const PLAYER_NEXT_LEVEL_XP: u16 = 0x0388;
    pub const PLAYER_CHARACTER_POINTS1: u16 = 0x0509;
    pub const PLAYER_CHARACTER_POINTS2: u16 = 0x050A;
    pub const PLAYER_BLOCK_PERCENTAGE: u16 = 0x050D;
    pub const PLAYER_DODGE_PERCENTAGE: u16 = 0x050E;
    pub const PLAYER_PARRY_PERCENTAGE: u16 = 0x050F;
    pub const PLAYER_CRIT_PERCENTAGE: u16 = 0x0512;
    pub const PLAYER_RANGED_CRIT_PERCENTAGE: u16 = 0x0513;
    pub const PLAYER_REST_STATE_EXPERIENCE: u16 = 0x059D;
    pub const PLAYER_FIELD_COINAGE: u16 = 0x059E;
    pub const PLAYER_FIELD_MOD_DAMAGE_DONE_PCT: u16 = 0x05AD; // 7 slots
    pub const PLAYER_FIELD_WATCHED_FACTION_INDEX: u16 = 0x05D8;
    pub const PLAYER_FIELD_MAX_LEVEL: u16 = 0x0607;
}
