// Positions - race starting positions
//
// Static reference data consulted at character creation. Race ids:
// 1=Human 2=Orc 3=Dwarf 4=NightElf 5=Undead 6=Tauren 7=Gnome 8=Troll,
// 10=BloodElf 11=Draenei (9 is unused).

/// Starting position row
#[derive(Debug, Clone, Copy)]
pub struct StartPosition {
    pub map: i32,
    pub zone_id: u32,
    pub area_id: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub orientation: f32,
}

const HUMAN_START: StartPosition = StartPosition {
    map: 0,
    zone_id: 12,
    area_id: 9,
    x: -8949.95,
    y: -132.493,
    z: 83.5312,
    orientation: 0.0,
};

static START_POSITIONS: [(u8, StartPosition); 10] = [
    // Human - Northshire Valley
    (1, HUMAN_START),
    // Orc - Valley of Trials
    (2, StartPosition { map: 1, zone_id: 14, area_id: 363, x: -618.518, y: -4251.67, z: 38.718, orientation: 0.0 }),
    // Dwarf - Coldridge Valley
    (3, StartPosition { map: 0, zone_id: 1, area_id: 132, x: -6240.32, y: 331.033, z: 382.758, orientation: 6.17716 }),
    // Night Elf - Shadowglen
    (4, StartPosition { map: 1, zone_id: 141, area_id: 188, x: 10311.3, y: 832.463, z: 1326.41, orientation: 5.69632 }),
    // Undead - Deathknell
    (5, StartPosition { map: 0, zone_id: 85, area_id: 154, x: 1676.71, y: 1678.31, z: 121.67, orientation: 2.70526 }),
    // Tauren - Camp Narache
    (6, StartPosition { map: 1, zone_id: 215, area_id: 222, x: -2917.58, y: -257.98, z: 52.9968, orientation: 0.0 }),
    // Gnome - Coldridge Valley, same as Dwarf
    (7, StartPosition { map: 0, zone_id: 1, area_id: 132, x: -6240.32, y: 331.033, z: 382.758, orientation: 6.17716 }),
    // Troll - Valley of Trials, same as Orc
    (8, StartPosition { map: 1, zone_id: 14, area_id: 363, x: -618.518, y: -4251.67, z: 38.718, orientation: 0.0 }),
    // Blood Elf - Sunstrider Isle
    (10, StartPosition { map: 530, zone_id: 3430, area_id: 3431, x: 10349.6, y: -6357.29, z: 33.4026, orientation: 5.31605 }),
    // Draenei - Ammen Vale
    (11, StartPosition { map: 530, zone_id: 3524, area_id: 3526, x: -3961.64, y: -13931.2, z: 100.615, orientation: 2.08364 }),
];

/// Look up the starting position for a race; unknown races fall back to
/// the Human row.
pub fn start_position(race: u8) -> &'static StartPosition {
    START_POSITIONS
        .iter()
        .find(|(id, _)| *id == race)
        .map(|(_, pos)| pos)
        .unwrap_or(&HUMAN_START)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_start() {
        let pos = start_position(1);
        assert_eq!(pos.map, 0);
        assert_eq!(pos.zone_id, 12);
        assert_eq!(pos.x, -8949.95);
    }

    #[test]
    fn test_unknown_race_falls_back_to_human() {
        assert_eq!(start_position(9).zone_id, 12);
        assert_eq!(start_position(42).zone_id, 12);
    }

    #[test]
    fn test_tbc_races_present() {
        assert_eq!(start_position(10).map, 530);
        assert_eq!(start_position(11).map, 530);
    }
}
