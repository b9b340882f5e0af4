// Protocol - Wire structures for the login service
//
// The logon challenge and proof arrive as packed structs; these parse
// them out of the raw body bytes.

use ashemu_shared::auth::srp6::{KEY_SIZE, PROOF_SIZE};

/// Logon challenge body (received from client, after cmd/error/size)
#[derive(Debug, Clone)]
pub struct LogonChallengeBody {
    pub gamename: [u8; 4],
    pub version: [u8; 3],
    pub build: u16,
    pub platform: [u8; 4],
    pub os: [u8; 4],
    pub locale: [u8; 4],
    pub timezone_bias: u32,
    pub ip: u32,
    pub username: String,
}

impl LogonChallengeBody {
    /// Fixed prefix before the variable-length username
    pub const MIN_SIZE: usize = 4 + 3 + 2 + 4 + 4 + 4 + 4 + 4 + 1; // = 30

    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < Self::MIN_SIZE {
            return None;
        }

        let mut gamename = [0u8; 4];
        gamename.copy_from_slice(&data[0..4]);

        let mut version = [0u8; 3];
        version.copy_from_slice(&data[4..7]);

        let build = u16::from_le_bytes([data[7], data[8]]);

        let mut platform = [0u8; 4];
        platform.copy_from_slice(&data[9..13]);

        let mut os = [0u8; 4];
        os.copy_from_slice(&data[13..17]);

        let mut locale = [0u8; 4];
        locale.copy_from_slice(&data[17..21]);

        let timezone_bias = u32::from_le_bytes([data[21], data[22], data[23], data[24]]);
        let ip = u32::from_le_bytes([data[25], data[26], data[27], data[28]]);
        let username_len = data[29] as usize;

        let username_end = Self::MIN_SIZE + username_len;
        if data.len() < username_end {
            return None;
        }

        let username = String::from_utf8_lossy(&data[Self::MIN_SIZE..username_end]).into_owned();

        Some(LogonChallengeBody {
            gamename,
            version,
            build,
            platform,
            os,
            locale,
            timezone_bias,
            ip,
            username,
        })
    }
}

/// Logon proof body (received from client, after cmd)
#[derive(Debug, Clone)]
pub struct LogonProofBody {
    pub client_public: [u8; KEY_SIZE],
    pub client_proof: [u8; PROOF_SIZE],
    pub crc_hash: [u8; PROOF_SIZE],
    pub number_of_keys: u8,
    pub security_flags: u8,
}

impl LogonProofBody {
    pub const SIZE: usize = KEY_SIZE + PROOF_SIZE + PROOF_SIZE + 1 + 1; // = 74

    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }

        let mut client_public = [0u8; KEY_SIZE];
        client_public.copy_from_slice(&data[0..32]);

        let mut client_proof = [0u8; PROOF_SIZE];
        client_proof.copy_from_slice(&data[32..52]);

        let mut crc_hash = [0u8; PROOF_SIZE];
        crc_hash.copy_from_slice(&data[52..72]);

        Some(LogonProofBody {
            client_public,
            client_proof,
            crc_hash,
            number_of_keys: data[72],
            security_flags: data[73],
        })
    }
}
