//! Callback secret generation.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of a job callback secret.
const SECRET_LEN: usize = 32;

/// Generate a fresh alphanumeric callback secret for one job.
pub fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SECRET_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_has_expected_length_and_charset() {
        let secret = generate_secret();
        assert_eq!(secret.len(), SECRET_LEN);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn secrets_are_not_repeated() {
        assert_ne!(generate_secret(), generate_secret());
    }
}
