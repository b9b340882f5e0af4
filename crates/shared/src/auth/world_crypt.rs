// WorldCrypt - world-side header encryption
//
// Keyed byte-stream cipher applied to packet headers only: 6 incoming
// bytes, 4 outgoing bytes, payloads in the clear. Send and receive keep
// independent (i, j) state and must never share a step.
//
// 1.12.1 keys the cipher with the raw 40-byte session key; 2.4.3 first
// derives a 20-byte key as HMAC-SHA1(seed, K) with a fixed seed.

use crate::auth::hmac_sha1::hmac_sha1;
use crate::auth::srp6::SESSION_KEY_SIZE;
use crate::expansion::Expansion;

/// HMAC seed for the 2.4.3 key derivation
const TBC_ENCRYPTION_SEED: [u8; 16] = [
    0x38, 0xA7, 0x83, 0x15, 0xF8, 0x92, 0x25, 0x30, 0x71, 0x98, 0x67, 0xB1, 0x8C, 0x04, 0xE2,
    0xAA,
];

#[derive(Debug, Clone, Copy, Default)]
struct CipherState {
    i: usize,
    j: u8,
}

/// Per-connection header cipher.
pub struct WorldCrypt {
    key: Vec<u8>,
    send: CipherState,
    recv: CipherState,
}

impl WorldCrypt {
    /// Key the cipher from the SRP6 session key, flavor-specific.
    pub fn new(expansion: Expansion, session_key: &[u8; SESSION_KEY_SIZE]) -> Self {
        let key = match expansion {
            Expansion::Vanilla => session_key.to_vec(),
            Expansion::Tbc => hmac_sha1(&TBC_ENCRYPTION_SEED, session_key).to_vec(),
        };

        WorldCrypt {
            key,
            send: CipherState::default(),
            recv: CipherState::default(),
        }
    }

    /// Encrypt an outgoing header in place
    pub fn encrypt(&mut self, header: &mut [u8]) {
        for byte in header.iter_mut() {
            self.send.i %= self.key.len();
            let x = (*byte ^ self.key[self.send.i]).wrapping_add(self.send.j);
            *byte = x;
            self.send.j = x;
            self.send.i += 1;
        }
    }

    /// Decrypt an incoming header in place
    pub fn decrypt(&mut self, header: &mut [u8]) {
        for byte in header.iter_mut() {
            self.recv.i %= self.key.len();
            let cipher_byte = *byte;
            *byte = byte.wrapping_sub(self.recv.j) ^ self.key[self.recv.i];
            self.recv.j = cipher_byte;
            self.recv.i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> [u8; SESSION_KEY_SIZE] {
        let mut key = [0u8; SESSION_KEY_SIZE];
        for (i, b) in key.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(7).wrapping_add(3);
        }
        key
    }

    #[test]
    fn test_roundtrip_vanilla() {
        let key = test_key();
        let mut sender = WorldCrypt::new(Expansion::Vanilla, &key);
        let mut receiver = WorldCrypt::new(Expansion::Vanilla, &key);

        // Stream of successive headers, stepped in lockstep
        for n in 0u8..80 {
            let plain = [n, n.wrapping_add(1), 0xFE, n ^ 0x55];
            let mut buf = plain;
            sender.encrypt(&mut buf);
            receiver.decrypt(&mut buf);
            assert_eq!(buf, plain);
        }
    }

    #[test]
    fn test_roundtrip_tbc() {
        let key = test_key();
        let mut sender = WorldCrypt::new(Expansion::Tbc, &key);
        let mut receiver = WorldCrypt::new(Expansion::Tbc, &key);

        for n in 0u8..50 {
            let plain = [0, 8, n, 0, n, 1];
            let mut buf = plain;
            sender.encrypt(&mut buf);
            receiver.decrypt(&mut buf);
            assert_eq!(buf, plain);
        }
    }

    #[test]
    fn test_directions_do_not_interleave() {
        let key = test_key();
        let mut a = WorldCrypt::new(Expansion::Vanilla, &key);
        let mut b = WorldCrypt::new(Expansion::Vanilla, &key);

        let outgoing = [0x00, 0x10, 0x2A, 0x01];
        let incoming = [0x00, 0x06, 0xED, 0x01, 0x00, 0x00];

        // a encrypts two headers while also decrypting traffic from b;
        // the send stream must be unaffected by the receive stream.
        let mut first = outgoing;
        a.encrypt(&mut first);

        let mut relay = incoming;
        b.encrypt(&mut relay);
        a.decrypt(&mut relay);
        assert_eq!(relay, incoming);

        let mut second = outgoing;
        a.encrypt(&mut second);

        // A cipher that never decrypted anything produces the same stream
        let mut reference = WorldCrypt::new(Expansion::Vanilla, &key);
        let mut expect_first = outgoing;
        let mut expect_second = outgoing;
        reference.encrypt(&mut expect_first);
        reference.encrypt(&mut expect_second);

        assert_eq!(first, expect_first);
        assert_eq!(second, expect_second);
    }

    #[test]
    fn test_tbc_key_is_derived() {
        let key = test_key();
        let derived = hmac_sha1(&TBC_ENCRYPTION_SEED, &key);

        // First byte of an all-zero header encrypted with the derived key
        let mut crypt = WorldCrypt::new(Expansion::Tbc, &key);
        let mut header = [0u8; 4];
        crypt.encrypt(&mut header);
        assert_eq!(header[0], derived[0]);
    }
}
