// BigNumber - Large integer arithmetic wrapper using num-bigint
//
// The wire protocol transfers big integers in little-endian byte order.
// `from_le_bytes` / `to_le_bytes` carry that convention so the SRP6 code
// never touches a big-endian representation.

use num_bigint::BigUint;
use num_traits::Zero;
use rand::RngCore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigNumber {
    bn: BigUint,
}

impl Default for BigNumber {
    fn default() -> Self {
        Self::new()
    }
}

impl BigNumber {
    /// Create a new BigNumber initialized to zero
    pub fn new() -> Self {
        BigNumber { bn: BigUint::zero() }
    }

    /// Create from a u32 value
    pub fn from_u32(val: u32) -> Self {
        BigNumber { bn: BigUint::from(val) }
    }

    /// Create from binary data in little-endian order
    pub fn from_le_bytes(bytes: &[u8]) -> Self {
        BigNumber {
            bn: BigUint::from_bytes_le(bytes),
        }
    }

    /// Create from `num_bytes` fresh random bytes (little-endian)
    pub fn random(num_bytes: usize) -> Self {
        let mut buf = vec![0u8; num_bytes];
        rand::thread_rng().fill_bytes(&mut buf);
        Self::from_le_bytes(&buf)
    }

    /// Check if the number is zero
    pub fn is_zero(&self) -> bool {
        self.bn.is_zero()
    }

    /// Modular exponentiation: self^exp mod modulus
    pub fn mod_exp(&self, exp: &BigNumber, modulus: &BigNumber) -> BigNumber {
        BigNumber {
            bn: self.bn.modpow(&exp.bn, &modulus.bn),
        }
    }

    /// Get the number of bytes needed to represent this number
    pub fn num_bytes(&self) -> usize {
        (self.bn.bits() as usize).div_ceil(8)
    }

    /// Get as a u32 value (truncating)
    pub fn as_u32(&self) -> u32 {
        use num_traits::ToPrimitive;
        self.bn.to_u32().unwrap_or(0)
    }

    /// Convert to a little-endian byte array, zero-padded to at least
    /// `min_size` bytes. The protocol sends N, B, v and S as fixed-width
    /// 32-byte values regardless of leading zeros.
    pub fn to_le_bytes(&self, min_size: usize) -> Vec<u8> {
        let mut bytes = self.bn.to_bytes_le();
        if bytes.len() < min_size {
            bytes.resize(min_size, 0);
        }
        bytes
    }
}

// Arithmetic operator implementations

impl std::ops::Add for &BigNumber {
    type Output = BigNumber;
    fn add(self, rhs: &BigNumber) -> BigNumber {
        BigNumber {
            bn: &self.bn + &rhs.bn,
        }
    }
}

impl std::ops::Sub for &BigNumber {
    type Output = BigNumber;
    fn sub(self, rhs: &BigNumber) -> BigNumber {
        BigNumber {
            bn: if self.bn >= rhs.bn {
                &self.bn - &rhs.bn
            } else {
                BigUint::zero()
            },
        }
    }
}

impl std::ops::Mul for &BigNumber {
    type Output = BigNumber;
    fn mul(self, rhs: &BigNumber) -> BigNumber {
        BigNumber {
            bn: &self.bn * &rhs.bn,
        }
    }
}

impl std::ops::Mul<u32> for &BigNumber {
    type Output = BigNumber;
    fn mul(self, rhs: u32) -> BigNumber {
        BigNumber {
            bn: &self.bn * BigUint::from(rhs),
        }
    }
}

impl std::ops::Rem for &BigNumber {
    type Output = BigNumber;
    fn rem(self, rhs: &BigNumber) -> BigNumber {
        BigNumber {
            bn: &self.bn % &rhs.bn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_arithmetic() {
        let a = BigNumber::from_u32(10);
        let b = BigNumber::from_u32(5);
        let sum = &a + &b;
        assert_eq!(sum.as_u32(), 15);
    }

    #[test]
    fn test_le_roundtrip() {
        let bn = BigNumber::from_le_bytes(&[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(bn.as_u32(), 0x01020304);
        assert_eq!(bn.to_le_bytes(4), vec![0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_le_padding() {
        let bn = BigNumber::from_u32(0x0102);
        // Leading zeros in big-endian become trailing zeros in little-endian
        assert_eq!(bn.to_le_bytes(4), vec![0x02, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_mod_exp() {
        let base = BigNumber::from_u32(4);
        let exp = BigNumber::from_u32(13);
        let modulus = BigNumber::from_u32(497);
        let result = base.mod_exp(&exp, &modulus);
        assert_eq!(result.as_u32(), 445);
    }

    #[test]
    fn test_random_size() {
        let bn = BigNumber::random(19);
        assert!(bn.num_bytes() <= 19);
    }
}
