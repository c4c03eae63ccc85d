//! PBKDF2 password hashes stored as `pbkdf2$<iterations>$<digest>$<salt>$<hash>`,
//! with standard base64 for the salt and the derived key.

use base64::{Engine, engine::general_purpose::STANDARD};
use password_hash::{
    Output,
    rand_core::{OsRng, RngCore},
};
use pbkdf2::pbkdf2_hmac;
use sha2::{Sha256, Sha512};

const SCHEME: &str = "pbkdf2";
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;
const MAX_ITERATIONS: u32 = 10_000_000;

pub fn hash_password(password: &str, iterations: u32) -> String {
    let iterations = iterations.max(1);
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut key);

    format!(
        "{SCHEME}${iterations}$sha256${}${}",
        STANDARD.encode(salt),
        STANDARD.encode(key)
    )
}

/// Returns false for a wrong password and for any malformed stored value.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let parts: Vec<&str> = stored.split('$').collect();
    let [scheme, iterations, digest, salt, hash] = parts.as_slice() else {
        return false;
    };
    if *scheme != SCHEME {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    if iterations == 0 || iterations > MAX_ITERATIONS {
        return false;
    }
    let (Ok(salt), Ok(expected)) = (STANDARD.decode(salt), STANDARD.decode(hash)) else {
        return false;
    };
    let Ok(expected) = Output::new(&expected) else {
        return false;
    };

    let mut derived = vec![0u8; expected.len()];
    match *digest {
        "sha256" => pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut derived),
        "sha512" => pbkdf2_hmac::<Sha512>(password.as_bytes(), &salt, iterations, &mut derived),
        _ => return false,
    }

    // Output's equality is constant time.
    Output::new(&derived).is_ok_and(|derived| derived == expected)
}
