//! 256-bit unsigned stack word with wrapping arithmetic.

use evmhost_abi::{Address, Word};

/// 256-bit unsigned integer, stored as little-endian 64-bit limbs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct U256([u64; 4]);

impl U256 {
    pub const ZERO: U256 = U256([0; 4]);
    pub const ONE: U256 = U256([1, 0, 0, 0]);

    pub const fn from_u64(value: u64) -> Self {
        U256([value, 0, 0, 0])
    }

    pub fn from_be_bytes(bytes: &Word) -> Self {
        let mut limbs = [0u64; 4];
        for (i, limb) in limbs.iter_mut().enumerate() {
            let end = 32 - 8 * i;
            let mut chunk = [0u8; 8];
            chunk.copy_from_slice(&bytes[end - 8..end]);
            *limb = u64::from_be_bytes(chunk);
        }
        U256(limbs)
    }

    /// Interprets up to 32 big-endian bytes as a right-aligned value.
    pub fn from_be_slice(bytes: &[u8]) -> Self {
        let mut word = [0u8; 32];
        let take = bytes.len().min(32);
        word[32 - take..].copy_from_slice(&bytes[bytes.len() - take..]);
        Self::from_be_bytes(&word)
    }

    pub fn from_address(address: &Address) -> Self {
        Self::from_be_slice(address.as_bytes())
    }

    pub fn to_be_bytes(&self) -> Word {
        let mut bytes = [0u8; 32];
        for (i, limb) in self.0.iter().enumerate() {
            let end = 32 - 8 * i;
            bytes[end - 8..end].copy_from_slice(&limb.to_be_bytes());
        }
        bytes
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; 4]
    }

    /// Returns the value as `usize` if it fits.
    pub fn to_usize(&self) -> Option<usize> {
        if self.0[1] != 0 || self.0[2] != 0 || self.0[3] != 0 {
            return None;
        }
        usize::try_from(self.0[0]).ok()
    }

    /// Lowest byte.
    pub fn low_u8(&self) -> u8 {
        self.0[0] as u8
    }

    pub fn wrapping_add(self, rhs: U256) -> U256 {
        let mut out = [0u64; 4];
        let mut carry = false;
        for (i, limb) in out.iter_mut().enumerate() {
            let (sum, c1) = self.0[i].overflowing_add(rhs.0[i]);
            let (sum, c2) = sum.overflowing_add(carry as u64);
            *limb = sum;
            carry = c1 || c2;
        }
        U256(out)
    }

    pub fn wrapping_sub(self, rhs: U256) -> U256 {
        let mut out = [0u64; 4];
        let mut borrow = false;
        for (i, limb) in out.iter_mut().enumerate() {
            let (diff, b1) = self.0[i].overflowing_sub(rhs.0[i]);
            let (diff, b2) = diff.overflowing_sub(borrow as u64);
            *limb = diff;
            borrow = b1 || b2;
        }
        U256(out)
    }

    pub fn wrapping_mul(self, rhs: U256) -> U256 {
        let mut out = [0u64; 4];
        for i in 0..4 {
            let mut carry: u128 = 0;
            for j in 0..(4 - i) {
                let t = (self.0[i] as u128) * (rhs.0[j] as u128) + out[i + j] as u128 + carry;
                out[i + j] = t as u64;
                carry = t >> 64;
            }
        }
        U256(out)
    }

    /// Logical left shift; shifts of 256 or more yield zero.
    pub fn shl(self, shift: U256) -> U256 {
        let Some(shift) = shift.to_usize().filter(|s| *s < 256) else {
            return U256::ZERO;
        };
        let (limbs, bits) = (shift / 64, shift % 64);
        let mut out = [0u64; 4];
        for i in limbs..4 {
            out[i] = self.0[i - limbs] << bits;
            if bits > 0 && i > limbs {
                out[i] |= self.0[i - limbs - 1] >> (64 - bits);
            }
        }
        U256(out)
    }

    /// Logical right shift; shifts of 256 or more yield zero.
    pub fn shr(self, shift: U256) -> U256 {
        let Some(shift) = shift.to_usize().filter(|s| *s < 256) else {
            return U256::ZERO;
        };
        let (limbs, bits) = (shift / 64, shift % 64);
        let mut out = [0u64; 4];
        for i in 0..(4 - limbs) {
            out[i] = self.0[i + limbs] >> bits;
            if bits > 0 && i + limbs + 1 < 4 {
                out[i] |= self.0[i + limbs + 1] << (64 - bits);
            }
        }
        U256(out)
    }
}

impl PartialOrd for U256 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for U256 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.iter().rev().cmp(other.0.iter().rev())
    }
}

impl std::ops::BitAnd for U256 {
    type Output = U256;

    fn bitand(self, rhs: U256) -> U256 {
        U256(std::array::from_fn(|i| self.0[i] & rhs.0[i]))
    }
}

impl std::ops::BitOr for U256 {
    type Output = U256;

    fn bitor(self, rhs: U256) -> U256 {
        U256(std::array::from_fn(|i| self.0[i] | rhs.0[i]))
    }
}

impl std::ops::BitXor for U256 {
    type Output = U256;

    fn bitxor(self, rhs: U256) -> U256 {
        U256(std::array::from_fn(|i| self.0[i] ^ rhs.0[i]))
    }
}

impl std::ops::Not for U256 {
    type Output = U256;

    fn not(self) -> U256 {
        U256(self.0.map(|limb| !limb))
    }
}

impl From<bool> for U256 {
    fn from(value: bool) -> Self {
        if value {
            U256::ONE
        } else {
            U256::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MAX: U256 = U256([u64::MAX; 4]);

    #[test]
    fn test_bytes_layout() {
        let value = U256::from_u64(0x0102);
        let bytes = value.to_be_bytes();
        assert_eq!(bytes[30], 0x01);
        assert_eq!(bytes[31], 0x02);
        assert_eq!(U256::from_be_bytes(&bytes), value);
        assert_eq!(U256::from_be_slice(&[0xaa, 0xbb]), U256::from_u64(0xaabb));
    }

    #[test]
    fn test_wrapping() {
        assert_eq!(MAX.wrapping_add(U256::ONE), U256::ZERO);
        assert_eq!(U256::ZERO.wrapping_sub(U256::ONE), MAX);
        assert_eq!(MAX.wrapping_mul(MAX), U256::ONE);
        assert_eq!(
            U256::from_u64(u64::MAX).wrapping_mul(U256::from_u64(2)),
            U256([u64::MAX - 1, 1, 0, 0])
        );
    }

    #[test]
    fn test_shifts() {
        assert_eq!(U256::ONE.shl(U256::from_u64(64)), U256([0, 1, 0, 0]));
        assert_eq!(U256::ONE.shl(U256::from_u64(255)).shr(U256::from_u64(255)), U256::ONE);
        assert_eq!(U256::ONE.shl(U256::from_u64(256)), U256::ZERO);
        assert_eq!(MAX.shr(U256::from_u64(192)), U256::from_u64(u64::MAX));
        assert_eq!(U256::from_u64(0xf0).shr(U256::from_u64(4)), U256::from_u64(0x0f));
    }

    #[test]
    fn test_ordering() {
        assert!(U256([0, 0, 0, 1]) > U256([u64::MAX, u64::MAX, u64::MAX, 0]));
        assert!(U256::from_u64(3) < U256::from_u64(4));
    }

    #[test]
    fn test_to_usize() {
        assert_eq!(U256::from_u64(42).to_usize(), Some(42));
        assert_eq!(U256([0, 1, 0, 0]).to_usize(), None);
    }

    proptest! {
        #[test]
        fn small_values_match_u128(a in any::<u64>(), b in any::<u64>()) {
            let (x, y) = (U256::from_u64(a), U256::from_u64(b));
            let sum = a as u128 + b as u128;
            prop_assert_eq!(x.wrapping_add(y), U256([sum as u64, (sum >> 64) as u64, 0, 0]));
            let product = a as u128 * b as u128;
            prop_assert_eq!(x.wrapping_mul(y), U256([product as u64, (product >> 64) as u64, 0, 0]));
            prop_assert_eq!(x.wrapping_add(y).wrapping_sub(y), x);
            prop_assert_eq!(x < y, a < b);
        }
    }
}
