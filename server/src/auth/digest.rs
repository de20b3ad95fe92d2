use sha2::{Digest, Sha256};

/// One-way deterministic password digest: hex-encoded SHA-256 of the
/// plaintext concatenated with a process-wide salt.
///
/// The single shared salt and fast hash are a preserved compatibility
/// contract with the existing stored digests — the same transform runs at
/// signup (to store) and at login (to compare), so swapping in a per-user
/// salt or a memory-hard KDF is a data migration, not a drop-in change.
#[derive(Clone)]
pub struct PasswordDigest {
    salt: String,
}

impl std::fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The salt stays out of logs.
        f.debug_struct("PasswordDigest").finish_non_exhaustive()
    }
}

impl PasswordDigest {
    pub fn new(salt: &str) -> Self {
        Self {
            salt: salt.to_string(),
        }
    }

    /// Digest a plaintext password. Deterministic: equal inputs produce
    /// equal output, byte for byte.
    pub fn digest(&self, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        hasher.update(self.salt.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn digest_is_deterministic() {
        let d = PasswordDigest::new("pepper");
        assert_eq!(d.digest("pw123456"), d.digest("pw123456"));
    }

    #[test]
    fn different_passwords_produce_different_digests() {
        let d = PasswordDigest::new("pepper");
        assert_ne!(d.digest("pw123456"), d.digest("pw123457"));
    }

    #[test]
    fn different_salts_produce_different_digests() {
        let a = PasswordDigest::new("pepper");
        let b = PasswordDigest::new("paprika");
        assert_ne!(a.digest("pw123456"), b.digest("pw123456"));
    }

    #[test]
    fn digest_is_lowercase_hex_of_fixed_length() {
        let d = PasswordDigest::new("pepper");
        let out = d.digest("pw123456");
        assert_eq!(out.len(), 64);
        assert!(out.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    proptest! {
        #[test]
        fn any_password_digests_deterministically(password in ".*") {
            let d = PasswordDigest::new("pepper");
            prop_assert_eq!(d.digest(&password), d.digest(&password));
        }

        #[test]
        fn digest_length_is_stable(password in ".*") {
            let d = PasswordDigest::new("pepper");
            prop_assert_eq!(d.digest(&password).len(), 64);
        }
    }
}
