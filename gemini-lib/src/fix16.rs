//! Signed 16.16 fixed point, the format the firmware stores its tuning values in.

/// One in 16.16 representation.
pub const ONE: i32 = 0x0001_0000;

/// Convert to 16.16, rounding half away from zero. Out-of-range values saturate.
pub const fn from_f64(value: f64) -> i32 {
    if value >= 0.0 {
        (value * 65536.0 + 0.5) as i32
    } else {
        (value * 65536.0 - 0.5) as i32
    }
}

pub fn to_f64(value: i32) -> f64 {
    value as f64 / 65536.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_f64() {
        assert_eq!(from_f64(1.0), ONE);
        assert_eq!(from_f64(-1.0), -ONE);
        assert_eq!(from_f64(1.01), 66191);
        assert_eq!(from_f64(-1.01), -66191);
        assert_eq!(from_f64(0.05), 3277);
        assert_eq!(from_f64(20.0), 1_310_720);
    }

    #[test]
    fn test_saturates() {
        assert_eq!(from_f64(1.0e9), i32::MAX);
        assert_eq!(from_f64(-1.0e9), i32::MIN);
    }

    #[test]
    fn test_to_f64() {
        assert_eq!(to_f64(ONE), 1.0);
        assert_eq!(to_f64(-ONE / 2), -0.5);
        assert!((to_f64(from_f64(0.2)) - 0.2).abs() < 1.0 / 65536.0);
    }
}
