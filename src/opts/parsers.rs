use std::str::FromStr;

use crate::prelude::*;

pub fn non_zero_usize(value: &str) -> Result<usize> {
    match FromStr::from_str(value)? {
        value if value >= 1 => Ok(value),
        _ => Err(anyhow!("expected a positive number")),
    }
}

pub fn non_negative_f64(value: &str) -> Result<f64> {
    match f64::from_str(value)? {
        value if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(anyhow!("expected a finite non-negative number")),
    }
}

pub fn positive_f64(value: &str) -> Result<f64> {
    match f64::from_str(value)? {
        value if value.is_finite() && value > 0.0 => Ok(value),
        _ => Err(anyhow!("expected a finite positive number")),
    }
}

/// Ratio in `(0, 1]`.
pub fn ratio(value: &str) -> Result<f64> {
    match f64::from_str(value)? {
        value if value > 0.0 && value <= 1.0 => Ok(value),
        _ => Err(anyhow!("expected a number in (0, 1]")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_zero_usize_ok() -> crate::Result {
        assert_eq!(non_zero_usize("5")?, 5);
        assert!(non_zero_usize("0").is_err());
        assert!(non_zero_usize("-1").is_err());
        Ok(())
    }

    #[test]
    fn non_negative_f64_ok() -> crate::Result {
        assert_eq!(non_negative_f64("0")?, 0.0);
        assert_eq!(non_negative_f64("1e-5")?, 1e-5);
        assert!(non_negative_f64("-0.1").is_err());
        assert!(non_negative_f64("inf").is_err());
        assert!(non_negative_f64("NaN").is_err());
        Ok(())
    }

    #[test]
    fn ratio_ok() -> crate::Result {
        assert_eq!(ratio("1")?, 1.0);
        assert!(ratio("0").is_err());
        assert!(ratio("1.5").is_err());
        Ok(())
    }
}
