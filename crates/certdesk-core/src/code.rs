// Unique certificate codes
//
// Format: CERT-<last 6 digits of epoch millis>-<6 random base36 chars, uppercase>

use chrono::Utc;
use rand::Rng;

/// Prefix shared by every certificate code.
pub const CODE_PREFIX: &str = "CERT";

/// Number of random base36 characters in the suffix.
const SUFFIX_LEN: usize = 6;

/// Generates a new human-readable certificate code from the current time.
///
/// There is no collision detection: two codes can only collide when the
/// millisecond component wraps to the same value and the random suffix
/// also matches.
pub fn generate_unique_code() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    unique_code_at(millis, &mut rand::thread_rng())
}

/// Builds a code for a given epoch-millisecond timestamp.
pub fn unique_code_at<R: Rng + ?Sized>(epoch_millis: u64, rng: &mut R) -> String {
    let stamp = epoch_millis % 1_000_000;
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| {
            let digit = rng.gen_range(0..36u32);
            std::char::from_digit(digit, 36)
                .unwrap_or('0')
                .to_ascii_uppercase()
        })
        .collect();

    format!("{}-{:06}-{}", CODE_PREFIX, stamp, suffix)
}

/// Returns true if `code` has the shape `CERT-dddddd-XXXXXX`.
pub fn is_valid_code(code: &str) -> bool {
    let mut parts = code.split('-');
    let (Some(prefix), Some(stamp), Some(suffix), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    prefix == CODE_PREFIX
        && stamp.len() == 6
        && stamp.bytes().all(|b| b.is_ascii_digit())
        && suffix.len() == SUFFIX_LEN
        && suffix
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_code_format() {
        for _ in 0..200 {
            let code = generate_unique_code();
            assert!(is_valid_code(&code), "bad code: {}", code);
        }
    }

    #[test]
    fn test_timestamp_component_is_last_six_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        let code = unique_code_at(1_718_000_123_456, &mut rng);
        assert!(code.starts_with("CERT-123456-"));
    }

    #[test]
    fn test_timestamp_component_is_zero_padded() {
        let mut rng = StdRng::seed_from_u64(7);
        let code = unique_code_at(1_000_000_000_042, &mut rng);
        assert!(code.starts_with("CERT-000042-"));
        assert!(is_valid_code(&code));
    }

    #[test]
    fn test_codes_one_millisecond_apart_differ() {
        // Same RNG state on both calls isolates the timestamp component
        let a = unique_code_at(1_718_000_000_000, &mut StdRng::seed_from_u64(1));
        let b = unique_code_at(1_718_000_000_001, &mut StdRng::seed_from_u64(1));
        assert_ne!(a, b);
    }

    #[test]
    fn test_suffix_uses_uppercase_base36() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..100 {
            let code = unique_code_at(0, &mut rng);
            let suffix = code.rsplit('-').next().unwrap();
            assert_eq!(suffix.len(), 6);
            assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_is_valid_code_rejects_malformed() {
        assert!(is_valid_code("CERT-123456-ABC12Z"));
        assert!(!is_valid_code("CERT-12345-ABC12Z"));
        assert!(!is_valid_code("CERT-123456-abc12z"));
        assert!(!is_valid_code("CRT-123456-ABC12Z"));
        assert!(!is_valid_code("CERT-123456-ABC12Z-1"));
        assert!(!is_valid_code(""));
    }
}
