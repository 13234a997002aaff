//! Password hashing

use anyhow::{bail, Result};
use std::str::FromStr;

mod argon2_hasher {
    use anyhow::{anyhow, Result};
    use argon2::{
        password_hash::{
            rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        },
        Argon2,
    };

    pub fn hash(plain: &[u8]) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash_string = Argon2::default()
            .hash_password(plain, &salt)
            .map_err(|err| anyhow!("{}", err))?
            .to_string();
        Ok(hash_string)
    }

    pub fn verify<T: AsRef<str>>(plain_pw: &[u8], target_hash: T) -> Result<bool> {
        let password_hash =
            PasswordHash::new(target_hash.as_ref()).map_err(|err| anyhow!("{}", err))?;
        Ok(Argon2::default()
            .verify_password(plain_pw, &password_hash)
            .is_ok())
    }
}

/// Hashing scheme for stored passwords. Hashes are PHC strings, salt included.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PasswordHasherKind {
    #[default]
    Argon2,
}

impl FromStr for PasswordHasherKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "argon2" => Ok(PasswordHasherKind::Argon2),
            _ => bail!("Unknown hasher {}", s),
        }
    }
}

impl PasswordHasherKind {
    pub fn hash<T: AsRef<str>>(&self, plain: T) -> Result<String> {
        match self {
            PasswordHasherKind::Argon2 => argon2_hasher::hash(plain.as_ref().as_bytes()),
        }
    }

    pub fn verify<T: AsRef<str>, H: AsRef<str>>(&self, plain_pw: T, target_hash: H) -> Result<bool> {
        match self {
            PasswordHasherKind::Argon2 => {
                argon2_hasher::verify(plain_pw.as_ref().as_bytes(), target_hash)
            }
        }
    }
}
