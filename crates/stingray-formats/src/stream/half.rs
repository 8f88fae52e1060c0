//! IEEE 754 binary16 conversion
//!
//! Widening is exact. Narrowing rounds to nearest-even, saturates to infinity
//! on overflow and keeps NaN payloads that fit in 10 bits, so any half value
//! survives `f16 -> f32 -> f16` unchanged.

/// Widen a binary16 bit pattern to `f32`
pub fn f16_to_f32(half: u16) -> f32 {
    let sign = u32::from(half & 0x8000) << 16;
    let exponent = (half >> 10) & 0x1f;
    let mantissa = u32::from(half & 0x03ff);

    let bits = match exponent {
        0 if mantissa == 0 => sign,
        0 => {
            let mut exp: i32 = -14;
            let mut man = mantissa;
            while man & 0x0400 == 0 {
                man <<= 1;
                exp -= 1;
            }
            sign | (((exp + 127) as u32) << 23) | ((man & 0x03ff) << 13)
        }
        0x1f => sign | 0x7f80_0000 | (mantissa << 13),
        _ => sign | ((u32::from(exponent) + 112) << 23) | (mantissa << 13),
    };
    f32::from_bits(bits)
}

/// Narrow an `f32` to a binary16 bit pattern
pub fn f32_to_f16(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exponent = ((bits >> 23) & 0xff) as i32;
    let mantissa = bits & 0x007f_ffff;

    if exponent == 0xff {
        if mantissa == 0 {
            return sign | 0x7c00;
        }
        let payload = (mantissa >> 13) as u16;
        return sign | 0x7c00 | if payload == 0 { 0x0200 } else { payload };
    }

    let half_exp = exponent - 127 + 15;
    if half_exp >= 0x1f {
        return sign | 0x7c00;
    }

    if half_exp <= 0 {
        if half_exp < -10 {
            return sign;
        }
        let full = mantissa | 0x0080_0000;
        let shift = (14 - half_exp) as u32;
        let truncated = full >> shift;
        let remainder = full & ((1 << shift) - 1);
        let halfway = 1 << (shift - 1);
        let rounded = if remainder > halfway || (remainder == halfway && truncated & 1 == 1) {
            truncated + 1
        } else {
            truncated
        };
        return sign | rounded as u16;
    }

    let mut out = ((half_exp as u32) << 10) | (mantissa >> 13);
    let remainder = mantissa & 0x1fff;
    // carry into the exponent is correct, up to and including infinity
    if remainder > 0x1000 || (remainder == 0x1000 && out & 1 == 1) {
        out += 1;
    }
    sign | out as u16
}
