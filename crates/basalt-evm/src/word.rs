//! 256-bit machine word arithmetic
//!
//! All operations wrap modulo 2^256. Signed variants interpret their
//! operands in two's complement. Division and modulo by zero yield zero
//! rather than trapping.

use basalt_primitives::{U256, U512};

/// Convert a word to usize, returning None when it does not fit.
pub fn to_usize(value: U256) -> Option<usize> {
    if value > U256::from(usize::MAX) {
        return None;
    }
    Some(value.as_usize())
}

/// Convert a boolean to the word 1 or 0.
pub fn from_bool(value: bool) -> U256 {
    if value {
        U256::one()
    } else {
        U256::zero()
    }
}

/// Unsigned division; division by zero yields zero.
pub fn div(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        U256::zero()
    } else {
        a / b
    }
}

/// Unsigned modulo; modulo by zero yields zero.
pub fn rem(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        U256::zero()
    } else {
        a % b
    }
}

/// Signed division in two's complement; division by zero yields zero.
pub fn sdiv(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }
    let a_neg = is_negative(a);
    let b_neg = is_negative(b);
    let quotient = abs(a) / abs(b);
    if a_neg != b_neg {
        twos_complement(quotient)
    } else {
        quotient
    }
}

/// Signed modulo in two's complement; the result takes the dividend's sign.
pub fn smod(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }
    let remainder = abs(a) % abs(b);
    if is_negative(a) {
        twos_complement(remainder)
    } else {
        remainder
    }
}

/// (a + b) % n with a 512-bit intermediate sum; n == 0 yields zero.
pub fn addmod(a: U256, b: U256, n: U256) -> U256 {
    if n.is_zero() {
        return U256::zero();
    }
    let sum = U512::from(a) + U512::from(b);
    let reduced = sum % U512::from(n);
    // The modulus fits in 256 bits, so the remainder does too.
    U256::try_from(reduced).unwrap_or_default()
}

/// (a * b) % n with a 512-bit intermediate product; n == 0 yields zero.
pub fn mulmod(a: U256, b: U256, n: U256) -> U256 {
    if n.is_zero() {
        return U256::zero();
    }
    let product = U512::from(a) * U512::from(b);
    let reduced = product % U512::from(n);
    U256::try_from(reduced).unwrap_or_default()
}

/// base^exponent modulo 2^256.
pub fn exp(base: U256, exponent: U256) -> U256 {
    base.overflowing_pow(exponent).0
}

/// Sign-extend `x` from byte position `b` (0 = least significant byte).
pub fn signextend(b: U256, x: U256) -> U256 {
    if b >= U256::from(31) {
        return x;
    }
    let bit = b.as_usize() * 8 + 7;
    let mask = (U256::one() << (bit + 1)) - U256::one();
    if x.bit(bit) {
        x | !mask
    } else {
        x & mask
    }
}

/// Extract byte `i` of `x`, where byte 0 is the most significant.
pub fn byte(i: U256, x: U256) -> U256 {
    if i >= U256::from(32) {
        return U256::zero();
    }
    U256::from(x.byte(31 - i.as_usize()))
}

/// Shift left; shifts of 256 or more yield zero.
pub fn shl(shift: U256, value: U256) -> U256 {
    if shift >= U256::from(256) {
        U256::zero()
    } else {
        value << shift.as_usize()
    }
}

/// Logical shift right; shifts of 256 or more yield zero.
pub fn shr(shift: U256, value: U256) -> U256 {
    if shift >= U256::from(256) {
        U256::zero()
    } else {
        value >> shift.as_usize()
    }
}

/// Arithmetic shift right, preserving the sign bit.
pub fn sar(shift: U256, value: U256) -> U256 {
    let negative = is_negative(value);
    if shift >= U256::from(256) {
        return if negative { U256::MAX } else { U256::zero() };
    }
    let n = shift.as_usize();
    let shifted = value >> n;
    if negative && n > 0 {
        shifted | (U256::MAX << (256 - n))
    } else {
        shifted
    }
}

/// Signed less-than in two's complement.
pub fn slt(a: U256, b: U256) -> bool {
    match (is_negative(a), is_negative(b)) {
        (true, false) => true,
        (false, true) => false,
        _ => a < b,
    }
}

/// Signed greater-than in two's complement.
pub fn sgt(a: U256, b: U256) -> bool {
    slt(b, a)
}

fn is_negative(v: U256) -> bool {
    v.bit(255)
}

fn abs(v: U256) -> U256 {
    if is_negative(v) {
        twos_complement(v)
    } else {
        v
    }
}

fn twos_complement(v: U256) -> U256 {
    (!v).overflowing_add(U256::one()).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn neg(v: u64) -> U256 {
        twos_complement(U256::from(v))
    }

    #[test]
    fn division_by_zero_is_zero() {
        assert_eq!(div(U256::from(10), U256::zero()), U256::zero());
        assert_eq!(rem(U256::from(10), U256::zero()), U256::zero());
        assert_eq!(sdiv(U256::from(10), U256::zero()), U256::zero());
        assert_eq!(smod(U256::from(10), U256::zero()), U256::zero());
    }

    #[test]
    fn signed_division() {
        // -10 / 3 = -3
        assert_eq!(sdiv(neg(10), U256::from(3)), neg(3));
        // 10 / -3 = -3
        assert_eq!(sdiv(U256::from(10), neg(3)), neg(3));
        // -10 / -3 = 3
        assert_eq!(sdiv(neg(10), neg(3)), U256::from(3));
    }

    #[test]
    fn signed_modulo_takes_dividend_sign() {
        // -10 % 3 = -1
        assert_eq!(smod(neg(10), U256::from(3)), neg(1));
        // 10 % -3 = 1
        assert_eq!(smod(U256::from(10), neg(3)), U256::from(1));
    }

    #[test]
    fn sdiv_min_by_minus_one_wraps() {
        // MIN / -1 overflows and wraps back to MIN
        let min = U256::one() << 255;
        assert_eq!(sdiv(min, U256::MAX), min);
    }

    #[test]
    fn addmod_survives_256_bit_overflow() {
        // (MAX + 2) % 3, intermediate exceeds 2^256
        let expected = (U512::from(U256::MAX) + U512::from(2u64)) % U512::from(3u64);
        assert_eq!(
            addmod(U256::MAX, U256::from(2), U256::from(3)),
            U256::try_from(expected).unwrap()
        );
    }

    #[test]
    fn mulmod_survives_256_bit_overflow() {
        // MAX * MAX % MAX = 0
        assert_eq!(mulmod(U256::MAX, U256::MAX, U256::MAX), U256::zero());
        // MAX * MAX % (MAX - 1): MAX = 1 mod (MAX - 1), so result is 1
        assert_eq!(
            mulmod(U256::MAX, U256::MAX, U256::MAX - U256::one()),
            U256::one()
        );
    }

    #[test]
    fn exp_wraps() {
        assert_eq!(exp(U256::from(2), U256::from(8)), U256::from(256));
        assert_eq!(exp(U256::from(2), U256::from(256)), U256::zero());
        assert_eq!(exp(U256::from(10), U256::zero()), U256::one());
    }

    #[test]
    fn signextend_behaviour() {
        // 0xff at byte 0 extends to -1
        assert_eq!(signextend(U256::zero(), U256::from(0xff)), U256::MAX);
        // 0x7f at byte 0 stays positive
        assert_eq!(signextend(U256::zero(), U256::from(0x7f)), U256::from(0x7f));
        // b >= 31 leaves the value untouched
        assert_eq!(signextend(U256::from(31), U256::MAX), U256::MAX);
        // high garbage above the extended byte is cleared
        assert_eq!(
            signextend(U256::zero(), U256::from(0x1234u64)),
            U256::from(0x34)
        );
    }

    #[test]
    fn byte_extraction() {
        let x = U256::from_big_endian(&{
            let mut buf = [0u8; 32];
            buf[0] = 0xaa;
            buf[31] = 0xbb;
            buf
        });
        assert_eq!(byte(U256::zero(), x), U256::from(0xaa));
        assert_eq!(byte(U256::from(31), x), U256::from(0xbb));
        assert_eq!(byte(U256::from(32), x), U256::zero());
    }

    #[test]
    fn shifts() {
        assert_eq!(shl(U256::from(4), U256::one()), U256::from(16));
        assert_eq!(shr(U256::from(4), U256::from(16)), U256::one());
        assert_eq!(shl(U256::from(256), U256::MAX), U256::zero());
        assert_eq!(shr(U256::from(256), U256::MAX), U256::zero());
        // SAR on -16 by 2 gives -4
        assert_eq!(sar(U256::from(2), neg(16)), neg(4));
        // SAR of a negative value by >= 256 saturates to -1
        assert_eq!(sar(U256::from(256), neg(1)), U256::MAX);
        assert_eq!(sar(U256::from(256), U256::from(5)), U256::zero());
    }

    #[test]
    fn signed_comparison() {
        assert!(slt(neg(1), U256::zero()));
        assert!(!slt(U256::zero(), neg(1)));
        assert!(sgt(U256::one(), neg(1)));
        assert!(slt(neg(2), neg(1)));
    }

    #[test]
    fn usize_conversion_bounds() {
        assert_eq!(to_usize(U256::from(42)), Some(42));
        assert_eq!(to_usize(U256::MAX), None);
    }

    proptest! {
        #[test]
        fn add_wraps_like_modular_arithmetic(a in any::<u128>(), b in any::<u128>()) {
            let wide = U512::from(U256::from(a)) + U512::from(U256::from(b));
            let wrapped = U256::from(a).overflowing_add(U256::from(b)).0;
            prop_assert_eq!(U512::from(wrapped), wide % (U512::one() << 256));
        }

        #[test]
        fn sdiv_smod_reconstruct(a in any::<i64>(), b in any::<i64>()) {
            prop_assume!(b != 0);
            let wa = if a < 0 { twos_complement(U256::from(a.unsigned_abs())) } else { U256::from(a as u64) };
            let wb = if b < 0 { twos_complement(U256::from(b.unsigned_abs())) } else { U256::from(b as u64) };
            // a == sdiv(a,b) * b + smod(a,b), all modulo 2^256
            let q = sdiv(wa, wb);
            let r = smod(wa, wb);
            let back = q.overflowing_mul(wb).0.overflowing_add(r).0;
            prop_assert_eq!(back, wa);
        }
    }
}
