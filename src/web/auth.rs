use argon2::Argon2;
use argon2::password_hash::{PasswordHasher, SaltString};
use rand_core::OsRng;

/// Salted argon2 hash in PHC string form. The confirmation page shows it; nothing stores it.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    #[test]
    fn hash_is_salted_and_verifiable() {
        let first = hash_password("correct horse").expect("hash");
        let second = hash_password("correct horse").expect("hash");

        assert!(first.starts_with("$argon2id$"));
        assert!(!first.contains("correct horse"));
        assert_ne!(first, second);

        let parsed = PasswordHash::new(&first).expect("parse hash");
        assert!(
            Argon2::default()
                .verify_password(b"correct horse", &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password(b"wrong horse", &parsed)
                .is_err()
        );
    }
}
