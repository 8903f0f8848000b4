use std::collections::BTreeMap;

use clap::ValueEnum;

/// Turns byte counts of a repository into observation matrix values.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ValueTransform {
    /// Language bytes divided by the repository total
    #[default]
    Fraction,

    /// Logarithm of language bytes divided by the sum of the logarithms
    LogFraction,

    /// Logarithm of language bytes
    LogBytes,
}

impl ValueTransform {
    /// Values of the languages with positive byte counts.
    ///
    /// Zero-byte entries never reach the logarithm. A degenerate row, which total is zero,
    /// yields zeros instead of dividing by zero.
    #[must_use]
    pub fn apply(self, languages: &BTreeMap<String, u64>) -> Vec<(&str, f64)> {
        let n_bytes = languages
            .iter()
            .filter(|(_, n_bytes)| **n_bytes != 0)
            .map(|(name, n_bytes)| (name.as_str(), *n_bytes as f64));
        match self {
            Self::Fraction => normalize(n_bytes.collect()),
            Self::LogFraction => normalize(n_bytes.map(|(name, n)| (name, n.ln())).collect()),
            Self::LogBytes => n_bytes.map(|(name, n)| (name, n.ln())).collect(),
        }
    }
}

fn normalize(values: Vec<(&str, f64)>) -> Vec<(&str, f64)> {
    let total: f64 = values.iter().map(|(_, value)| value).sum();
    if total > 0.0 {
        values
            .into_iter()
            .map(|(name, value)| (name, value / total))
            .collect()
    } else {
        values.into_iter().map(|(name, _)| (name, 0.0)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn languages(pairs: &[(&str, u64)]) -> BTreeMap<String, u64> {
        pairs
            .iter()
            .map(|(name, n_bytes)| (name.to_string(), *n_bytes))
            .collect()
    }

    #[test]
    fn fraction_ok() {
        let input = languages(&[("C", 300), ("Rust", 100)]);
        let values = ValueTransform::Fraction.apply(&input);
        assert_eq!(values, [("C", 0.75), ("Rust", 0.25)]);
    }

    #[test]
    fn fraction_skips_zero_bytes() {
        let input = languages(&[("C", 0), ("Rust", 100)]);
        let values = ValueTransform::Fraction.apply(&input);
        assert_eq!(values, [("Rust", 1.0)]);
    }

    #[test]
    fn log_fraction_ok() {
        let input = languages(&[("C", 1000), ("Rust", 10)]);
        let values = ValueTransform::LogFraction.apply(&input);
        assert_eq!(values.len(), 2);
        assert!((values[0].1 - 0.75).abs() < 1e-12);
        assert!((values[1].1 - 0.25).abs() < 1e-12);
    }

    #[test]
    fn log_fraction_degenerate_row_is_zero() {
        let input = languages(&[("C", 1), ("Rust", 1)]);
        let values = ValueTransform::LogFraction.apply(&input);
        assert_eq!(values, [("C", 0.0), ("Rust", 0.0)]);
    }

    #[test]
    fn log_bytes_ok() {
        let input = languages(&[("C", 0), ("Rust", 100)]);
        let values = ValueTransform::LogBytes.apply(&input);
        assert_eq!(values.len(), 1);
        assert!((values[0].1 - 100.0_f64.ln()).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_repository_ok() {
        assert!(ValueTransform::Fraction.apply(&BTreeMap::new()).is_empty());
    }
}
