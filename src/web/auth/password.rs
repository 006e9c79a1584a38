//! Password hashing.
//!
//! Hashes use the `pbkdf2:sha256:<rounds>$<salt>$<hex digest>` format so
//! accounts created by the previous deployment keep working unchanged.

use pbkdf2::pbkdf2_hmac;
use rand::Rng;
use rand::distr::Alphanumeric;
use sha2::Sha256;

const ROUNDS: u32 = 600_000;
const SALT_LEN: usize = 16;
const DIGEST_LEN: usize = 32;

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

fn derive(password: &str, salt: &str, rounds: u32) -> String {
    let mut digest = [0u8; DIGEST_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), rounds, &mut digest);
    hex_encode(&digest)
}

/// Hash a password with a fresh random salt.
pub fn generate_password_hash(password: &str) -> String {
    let salt: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LEN)
        .map(char::from)
        .collect();
    let digest = derive(password, &salt, ROUNDS);
    format!("pbkdf2:sha256:{ROUNDS}${salt}${digest}")
}

/// Check a password against a stored hash. Malformed hashes never verify.
pub fn check_password_hash(stored: &str, password: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(method), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    let rounds = match method.strip_prefix("pbkdf2:sha256:") {
        Some(rounds) => match rounds.parse::<u32>() {
            Ok(rounds) if rounds > 0 => rounds,
            _ => return false,
        },
        None => return false,
    };

    let digest = derive(password, salt, rounds);

    // Constant-time comparison over the hex digests.
    if digest.len() != expected.len() {
        return false;
    }
    digest
        .bytes()
        .zip(expected.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let hash = generate_password_hash("s3cret!");
        assert!(hash.starts_with("pbkdf2:sha256:600000$"));
        assert!(check_password_hash(&hash, "s3cret!"));
        assert!(!check_password_hash(&hash, "s3cret"));
    }

    #[test]
    fn test_known_vector() {
        // pbkdf2:sha256 with 1 round over "password" / salt "salt".
        let expected = derive("password", "salt", 1);
        assert_eq!(
            expected,
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );
        let stored = format!("pbkdf2:sha256:1$salt${expected}");
        assert!(check_password_hash(&stored, "password"));
    }

    #[test]
    fn test_malformed_hashes_never_verify() {
        assert!(!check_password_hash("", "password"));
        assert!(!check_password_hash("plaintext", "password"));
        assert!(!check_password_hash("pbkdf2:sha256:0$salt$aa", "password"));
        assert!(!check_password_hash("scrypt:32768$salt$aa", "password"));
    }

    #[test]
    fn test_salts_differ_between_hashes() {
        assert_ne!(
            generate_password_hash("same"),
            generate_password_hash("same")
        );
    }
}
