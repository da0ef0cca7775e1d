use anyhow::{bail, Result};
use std::fmt;
use std::str::FromStr;

mod clipnest_argon2 {
    use anyhow::{anyhow, Result};
    use argon2::{
        password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
        Argon2,
    };

    pub fn generate_b64_salt() -> Result<String> {
        let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
            .map_err(|err| anyhow!("{}", err))?;
        Ok(salt.to_string())
    }

    pub fn hash<T: AsRef<str>>(plain: &[u8], b64_salt: T) -> Result<String> {
        let salt = SaltString::from_b64(b64_salt.as_ref()).map_err(|err| anyhow!("{}", err))?;
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

/// Password hashing scheme, persisted by name next to each hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialHasher {
    Argon2,
}

impl FromStr for CredentialHasher {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "argon2" => Ok(CredentialHasher::Argon2),
            _ => bail!("Unknown hasher {}", s),
        }
    }
}

impl fmt::Display for CredentialHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialHasher::Argon2 => write!(f, "argon2"),
        }
    }
}

impl CredentialHasher {
    pub fn generate_b64_salt(&self) -> Result<String> {
        match self {
            CredentialHasher::Argon2 => clipnest_argon2::generate_b64_salt(),
        }
    }

    pub fn hash<T: AsRef<str>>(&self, plain: &[u8], b64_salt: T) -> Result<String> {
        match self {
            CredentialHasher::Argon2 => clipnest_argon2::hash(plain, b64_salt),
        }
    }

    /// Argon2 hashes embed their salt, so only the hash is needed here.
    pub fn verify<T: AsRef<str>>(&self, plain_pw: &str, target_hash: T) -> Result<bool> {
        match self {
            CredentialHasher::Argon2 => clipnest_argon2::verify(plain_pw.as_bytes(), target_hash),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argon2_hash() {
        let pw = "123mypw";
        let b64_salt = CredentialHasher::Argon2.generate_b64_salt().unwrap();

        let hash1 = CredentialHasher::Argon2.hash(pw.as_bytes(), &b64_salt).unwrap();
        let hash2 = CredentialHasher::Argon2.hash(b"123mypw", &b64_salt).unwrap();
        assert_eq!(hash1, hash2);

        assert!(CredentialHasher::Argon2.verify("123mypw", &hash1).unwrap());
        assert!(!CredentialHasher::Argon2.verify("not the pw", &hash1).unwrap());
    }

    #[test]
    fn salts_are_fresh_and_valid_b64() {
        let first = CredentialHasher::Argon2.generate_b64_salt().unwrap();
        let second = CredentialHasher::Argon2.generate_b64_salt().unwrap();
        assert_ne!(first, second);
        assert!(CredentialHasher::Argon2.hash(b"pw", &first).is_ok());
    }

    #[test]
    fn hasher_name_round_trips() {
        let name = CredentialHasher::Argon2.to_string();
        assert_eq!(name, "argon2");
        assert_eq!(
            CredentialHasher::from_str(&name).unwrap(),
            CredentialHasher::Argon2
        );
        assert!(CredentialHasher::from_str("md5").is_err());
    }
}
