/// Entropy at or below this is treated as low (sparse or padded data)
pub const LOW_ENTROPY: f64 = 1.0;
/// Entropy at or above this is treated as high (packed or encrypted data)
pub const HIGH_ENTROPY: f64 = 7.0;

/// Calculate Shannon entropy of a byte slice
///
/// Returns value between 0.0 (no entropy) and 8.0 (maximum entropy)
pub fn calculate_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut freq = [0usize; 256];
    for &byte in data {
        freq[byte as usize] += 1;
    }

    let len = data.len() as f64;
    let mut entropy = 0.0;

    for &count in freq.iter().filter(|&&c| c > 0) {
        let p = count as f64 / len;
        entropy -= p * p.log2();
    }

    entropy
}

/// Classify entropy level against a pair of thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntropyLevel {
    Low,
    Normal,
    High,
}

impl EntropyLevel {
    /// Classify with the default thresholds
    pub fn from_value(entropy: f64) -> Self {
        Self::with_thresholds(entropy, LOW_ENTROPY, HIGH_ENTROPY)
    }

    pub fn with_thresholds(entropy: f64, low: f64, high: f64) -> Self {
        if entropy <= low {
            EntropyLevel::Low
        } else if entropy >= high {
            EntropyLevel::High
        } else {
            EntropyLevel::Normal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_entropy() {
        let data = vec![0u8; 100];
        let entropy = calculate_entropy(&data);
        assert_eq!(entropy, 0.0);
    }

    #[test]
    fn test_empty_entropy() {
        assert_eq!(calculate_entropy(&[]), 0.0);
    }

    #[test]
    fn test_max_entropy() {
        let data: Vec<u8> = (0..=255).collect();
        let entropy = calculate_entropy(&data);
        assert!((entropy - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_two_symbol_entropy() {
        // Two equally likely bytes carry exactly one bit
        let data: Vec<u8> = (0..64).map(|i| (i % 2) as u8).collect();
        assert!((calculate_entropy(&data) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_entropy_classification() {
        assert_eq!(EntropyLevel::from_value(0.5), EntropyLevel::Low);
        assert_eq!(EntropyLevel::from_value(1.0), EntropyLevel::Low);
        assert_eq!(EntropyLevel::from_value(5.0), EntropyLevel::Normal);
        assert_eq!(EntropyLevel::from_value(7.0), EntropyLevel::High);
        assert_eq!(EntropyLevel::from_value(7.9), EntropyLevel::High);
    }

    #[test]
    fn test_custom_thresholds() {
        assert_eq!(EntropyLevel::with_thresholds(2.0, 2.5, 6.0), EntropyLevel::Low);
        assert_eq!(EntropyLevel::with_thresholds(6.5, 2.5, 6.0), EntropyLevel::High);
        assert_eq!(EntropyLevel::with_thresholds(4.0, 2.5, 6.0), EntropyLevel::Normal);
    }
}
