// HMAC-SHA1 helper

use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Compute HMAC-SHA1 in one shot. Used to derive the 2.4.3 header
/// cipher key from the SRP6 session key.
pub fn hmac_sha1(key: &[u8], data: &[u8]) -> [u8; 20] {
    let mut mac = HmacSha1::new_from_slice(key).expect("HMAC-SHA1 key can be any length");
    mac.update(data);
    let result = mac.finalize();
    let mut digest = [0u8; 20];
    digest.copy_from_slice(&result.into_bytes());
    digest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hmac_sha1_rfc2202() {
        // RFC 2202 test case 2
        let result = hmac_sha1(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            result,
            [
                0xef, 0xfc, 0xdf, 0x6a, 0xe5, 0xeb, 0x2f, 0xa2, 0xd2, 0x74, 0x16, 0xd5, 0xf1,
                0x84, 0xdf, 0x9c, 0x25, 0x9a, 0x7c, 0x79,
            ]
        );
    }
}
