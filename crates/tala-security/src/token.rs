//! Random opaque tokens for invites, assessment links and password resets

use rand::{distr::Alphanumeric, rng, Rng};

/// URL-safe random token of `len` alphanumeric characters.
pub fn generate_token(len: usize) -> String {
    rng()
        .sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tala_shared::constants::ACCESS_TOKEN_LENGTH;

    #[test]
    fn tokens_have_requested_length_and_charset() {
        let token = generate_token(ACCESS_TOKEN_LENGTH);
        assert_eq!(token.len(), ACCESS_TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(generate_token(32), generate_token(32));
    }
}
