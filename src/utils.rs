use rand::{distr::Alphanumeric, Rng};

/// Random ASCII alphanumeric string of exactly `len` characters.
///
/// Used for record ids, captcha session ids and captcha codes. Uniqueness is
/// not guaranteed, only a low collision probability.
pub fn random_string(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_string_has_requested_length() {
        assert_eq!(random_string(6).len(), 6);
        assert_eq!(random_string(16).len(), 16);
        assert!(random_string(0).is_empty());
    }

    #[test]
    fn random_string_is_alphanumeric() {
        assert!(random_string(64).chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
