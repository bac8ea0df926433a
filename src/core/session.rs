//! Short shareable session codes.
//!
//! The host's iroh key pair is derived from the code, so a joiner who only
//! knows the six characters can compute the host's [`EndpointId`] and dial it.
//! Both sides must run the same build: the derivation goes through
//! [`StdRng`], whose algorithm is tied to the `rand` version.
use iroh::{EndpointId, SecretKey};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::str::FromStr;

pub const SESSION_ID_LEN: usize = 6;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const KEY_DOMAIN: &[u8] = b"rpsterm/session/v1:";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionIdError {
    Length(usize),
    Character(char),
}

impl fmt::Display for SessionIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length(n) => write!(f, "session code must be {} characters, got {}", SESSION_ID_LEN, n),
            Self::Character(c) => write!(f, "session code may only contain A-Z and 0-9, got '{}'", c),
        }
    }
}

impl std::error::Error for SessionIdError {}

impl SessionId {
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let code = (0..SESSION_ID_LEN)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn secret_key(&self) -> SecretKey {
        let mut seed = [0u8; 32];
        seed[..KEY_DOMAIN.len()].copy_from_slice(KEY_DOMAIN);
        seed[KEY_DOMAIN.len()..KEY_DOMAIN.len() + SESSION_ID_LEN].copy_from_slice(self.0.as_bytes());
        let mut rng = StdRng::from_seed(seed);
        SecretKey::generate(&mut rng)
    }

    pub fn endpoint_id(&self) -> EndpointId {
        self.secret_key().public()
    }
}

impl FromStr for SessionId {
    type Err = SessionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        let len = code.chars().count();
        if len != SESSION_ID_LEN {
            return Err(SessionIdError::Length(len));
        }
        if let Some(bad) = code.chars().find(|c| !(c.is_ascii_uppercase() || c.is_ascii_digit())) {
            return Err(SessionIdError::Character(bad));
        }
        Ok(Self(code))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_six_uppercase_alphanumerics() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..32 {
            let id = SessionId::generate(&mut rng);
            assert_eq!(id.as_str().len(), SESSION_ID_LEN);
            assert!(id.as_str().chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
            assert_eq!(id.as_str().parse::<SessionId>().unwrap(), id);
        }
    }

    #[test]
    fn parsing_normalises_case_and_whitespace() {
        let id: SessionId = "  ab12cd\n".parse().unwrap();
        assert_eq!(id.to_string(), "AB12CD");
    }

    #[test]
    fn parsing_rejects_bad_codes() {
        assert_eq!("ABC".parse::<SessionId>(), Err(SessionIdError::Length(3)));
        assert_eq!("ABC-12".parse::<SessionId>(), Err(SessionIdError::Character('-')));
        assert_eq!("ABCDEFG".parse::<SessionId>(), Err(SessionIdError::Length(7)));
    }

    #[test]
    fn endpoint_is_derived_from_the_code() {
        let a: SessionId = "K3Q9ZT".parse().unwrap();
        let b: SessionId = "k3q9zt".parse().unwrap();
        let c: SessionId = "K3Q9ZU".parse().unwrap();
        assert_eq!(a.endpoint_id(), b.endpoint_id());
        assert_ne!(a.endpoint_id(), c.endpoint_id());
    }
}
