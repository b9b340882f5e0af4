// Game time packing for SMSG_LOGIN_SETTIMESPEED

use chrono::{Datelike, Local, Timelike};

/// Game speed: one game minute per real second
pub const GAME_SPEED: f32 = 0.016_666_67;

/// Pack a timestamp into the client's bitfield:
/// minutes | hours<<6 | weekday<<11 | (day-1)<<14 | month<<20 | (year-2000)<<24
pub fn packed_game_time(time: &impl GameTimeFields) -> u32 {
    time.minute()
        | (time.hour() << 6)
        | (time.weekday_from_sunday() << 11)
        | ((time.day() - 1) << 14)
        | (time.month0() << 20)
        | ((time.year() - 2000) << 24)
}

/// Current local time in packed form
pub fn packed_now() -> u32 {
    packed_game_time(&Local::now())
}

/// Calendar fields needed by the packing; implemented for chrono types
/// so tests can feed fixed dates.
pub trait GameTimeFields {
    fn minute(&self) -> u32;
    fn hour(&self) -> u32;
    fn weekday_from_sunday(&self) -> u32;
    fn day(&self) -> u32;
    fn month0(&self) -> u32;
    fn year(&self) -> u32;
}

impl<T: Datelike + Timelike> GameTimeFields for T {
    fn minute(&self) -> u32 {
        Timelike::minute(self)
    }

    fn hour(&self) -> u32 {
        Timelike::hour(self)
    }

    fn weekday_from_sunday(&self) -> u32 {
        self.weekday().num_days_from_sunday()
    }

    fn day(&self) -> u32 {
        Datelike::day(self)
    }

    fn month0(&self) -> u32 {
        Datelike::month0(self)
    }

    fn year(&self) -> u32 {
        Datelike::year(self) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_packing_layout() {
        // 2000-01-01 was a Saturday (weekday 6 counting from Sunday)
        let time = NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_opt(1, 2, 0)
            .unwrap();

        let packed = packed_game_time(&time);
        assert_eq!(packed, 2 | (1 << 6) | (6 << 11));
    }

    #[test]
    fn test_packing_fields() {
        // 2026-08-01, 23:59, a Saturday
        let time = NaiveDate::from_ymd_opt(2026, 8, 1)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();

        let packed = packed_game_time(&time);
        assert_eq!(packed & 0x3F, 59); // minutes
        assert_eq!((packed >> 6) & 0x1F, 23); // hours
        assert_eq!((packed >> 11) & 0x7, 6); // weekday
        assert_eq!((packed >> 14) & 0x3F, 0); // day - 1
        assert_eq!((packed >> 20) & 0xF, 7); // month (0-based)
        assert_eq!(packed >> 24, 26); // year - 2000
    }
}
