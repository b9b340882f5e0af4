// Player - in-world player state and race/class reference data

use ashemu_shared::store::Character;

use crate::positions::start_position;

/// The character currently driven by a session, with its live position.
#[derive(Debug, Clone)]
pub struct Player {
    pub character: Character,
    pub guid: u64,
    pub zone_id: u32,
    pub map: i32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub orientation: f32,
}

impl Player {
    pub fn new(character: Character) -> Self {
        let start = start_position(character.race);
        Player {
            guid: character.id as u64, // high GUID part of a player is 0
            zone_id: start.zone_id,
            map: character.map,
            x: character.x,
            y: character.y,
            z: character.z,
            orientation: character.orientation,
            character,
        }
    }

    /// Display id for the race/gender combination
    pub fn display_id(&self) -> u32 {
        let male = self.character.gender == 0;
        match self.character.race {
            1 => if male { 49 } else { 50 },       // Human
            2 => if male { 51 } else { 52 },       // Orc
            3 => if male { 53 } else { 54 },       // Dwarf
            4 => if male { 55 } else { 56 },       // Night Elf
            5 => if male { 57 } else { 58 },       // Undead
            6 => if male { 59 } else { 60 },       // Tauren
            7 => if male { 1563 } else { 1564 },   // Gnome
            8 => if male { 1478 } else { 1479 },   // Troll
            10 => if male { 15476 } else { 15475 }, // Blood Elf
            11 => if male { 16125 } else { 16126 }, // Draenei
            _ => 49,
        }
    }

    /// Faction template for the race
    pub fn faction_template(&self) -> u32 {
        match self.character.race {
            1 => 1,     // Human - Stormwind
            2 => 2,     // Orc - Orgrimmar
            3 => 3,     // Dwarf - Ironforge
            4 => 4,     // Night Elf - Darnassus
            5 => 5,     // Undead - Undercity
            6 => 6,     // Tauren - Thunder Bluff
            7 => 115,   // Gnome - Gnomeregan
            8 => 116,   // Troll - Darkspear
            10 => 1610, // Blood Elf - Silvermoon
            11 => 1629, // Draenei - Exodar
            _ => 1,
        }
    }

    /// Power type for the class: 0=Mana, 1=Rage, 3=Energy
    pub fn power_type(&self) -> u8 {
        match self.character.class {
            1 => 1, // Warrior - Rage
            4 => 3, // Rogue - Energy
            _ => 0, // Everyone else - Mana
        }
    }

    pub fn health(&self) -> u32 {
        100
    }

    pub fn max_health(&self) -> u32 {
        100
    }

    /// Rage starts empty; mana and energy start full
    pub fn power(&self) -> u32 {
        if self.character.class == 1 { 0 } else { 100 }
    }

    /// Rage max is 1000 (the client displays it /10)
    pub fn max_power(&self) -> u32 {
        if self.character.class == 1 { 1000 } else { 100 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character(race: u8, class: u8, gender: u8) -> Character {
        Character {
            id: 7,
            account_id: 1,
            name: "Carol".to_string(),
            race,
            class,
            gender,
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
        }
    }

    #[test]
    fn test_guid_is_character_id() {
        let player = Player::new(character(1, 1, 0));
        assert_eq!(player.guid, 7);
    }

    #[test]
    fn test_display_ids() {
        assert_eq!(Player::new(character(1, 1, 0)).display_id(), 49);
        assert_eq!(Player::new(character(1, 1, 1)).display_id(), 50);
        assert_eq!(Player::new(character(8, 1, 0)).display_id(), 1478);
    }

    #[test]
    fn test_warrior_uses_rage() {
        let warrior = Player::new(character(1, 1, 0));
        assert_eq!(warrior.power_type(), 1);
        assert_eq!(warrior.power(), 0);
        assert_eq!(warrior.max_power(), 1000);

        let mage = Player::new(character(1, 8, 0));
        assert_eq!(mage.power_type(), 0);
        assert_eq!(mage.power(), 100);
    }
}
