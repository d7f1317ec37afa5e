//! `X-Hub-Signature` / `X-Hub-Signature-256` verification.
//!
//! The digest is always taken over the raw request body as it came off the
//! wire. Never feed this a re-serialized payload: key order, whitespace and
//! number formatting would all change the bytes.

use hmac::{Hmac, Mac as _, NewMac as _};
use subtle::ConstantTimeEq as _;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("`{0}` header isn't found")]
    HeaderNotFound(&'static str),
    #[error("HMAC key has invalid length")]
    InvalidKeyLength,
    #[error("`{header}` doesn't match: expected {expected}, got {received}")]
    Mismatch {
        header: &'static str,
        expected: String,
        received: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Sha1,
    Sha256,
}

impl Algorithm {
    pub fn header(self) -> &'static str {
        match self {
            Algorithm::Sha1 => "X-Hub-Signature",
            Algorithm::Sha256 => "X-Hub-Signature-256",
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Algorithm::Sha1 => "sha1=",
            Algorithm::Sha256 => "sha256=",
        }
    }

    fn digest(self, key: &[u8], body: &[u8]) -> Result<Vec<u8>, Error> {
        match self {
            Algorithm::Sha1 => {
                let mut mac = Hmac::<sha1::Sha1>::new_varkey(key)
                    .map_err(|_| Error::InvalidKeyLength)?;
                mac.update(body);
                Ok(mac.finalize().into_bytes().to_vec())
            }
            Algorithm::Sha256 => {
                let mut mac = Hmac::<sha2::Sha256>::new_varkey(key)
                    .map_err(|_| Error::InvalidKeyLength)?;
                mac.update(body);
                Ok(mac.finalize().into_bytes().to_vec())
            }
        }
    }
}

/// Header value GitHub would send for `body` signed with `key`, e.g.
/// `sha1=<40 hex digits>`.
pub fn sign(algorithm: Algorithm, key: &[u8], body: &[u8]) -> Result<String, Error> {
    let digest = algorithm.digest(key, body)?;
    Ok(format!("{}{}", algorithm.prefix(), hex::encode(digest)))
}

/// Length check first, then a constant-time comparison of the bytes.
pub fn constant_time_eq(expected: &[u8], received: &[u8]) -> bool {
    expected.len() == received.len() && bool::from(expected.ct_eq(received))
}

pub fn verify(
    algorithm: Algorithm,
    key: &[u8],
    body: &[u8],
    received: Option<&str>,
) -> Result<(), Error> {
    let received = match received {
        Some(r) if !r.is_empty() => r,
        _ => return Err(Error::HeaderNotFound(algorithm.header())),
    };
    let expected = sign(algorithm, key, body)?;

    if constant_time_eq(expected.as_bytes(), received.as_bytes()) {
        Ok(())
    } else {
        Err(Error::Mismatch {
            header: algorithm.header(),
            expected,
            received: received.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = br#"{"ref":"refs/heads/main"}"#;
    const SHA1_SIGNATURE: &str = "sha1=e208d0f1a9b7fd037cc70a7fe57eb222a15f1131";
    const SHA256_SIGNATURE: &str =
        "sha256=a8b8de78d67a8b3dc5aec2b2729609a8ad2c48f38f2b7af0135b233949928b72";

    #[test]
    fn signs_like_github() {
        assert_eq!(sign(Algorithm::Sha1, b"idunno", BODY).unwrap(), SHA1_SIGNATURE);
        assert_eq!(
            sign(Algorithm::Sha256, b"idunno", BODY).unwrap(),
            SHA256_SIGNATURE
        );
        assert_eq!(
            sign(
                Algorithm::Sha1,
                b"key",
                b"The quick brown fox jumps over the lazy dog"
            )
            .unwrap(),
            "sha1=de7c9b85b8b78aa6bc8a7a36f70a90701c9db4d9"
        );
    }

    #[test]
    fn accepts_valid_signature() {
        assert_eq!(
            verify(Algorithm::Sha1, b"idunno", BODY, Some(SHA1_SIGNATURE)),
            Ok(())
        );
        assert_eq!(
            verify(Algorithm::Sha256, b"idunno", BODY, Some(SHA256_SIGNATURE)),
            Ok(())
        );
    }

    #[test]
    fn any_flipped_byte_fails() {
        for i in 0..SHA1_SIGNATURE.len() {
            let mut tampered = SHA1_SIGNATURE.as_bytes().to_vec();
            tampered[i] ^= 0x01;
            let tampered = String::from_utf8(tampered).unwrap();

            assert!(
                verify(Algorithm::Sha1, b"idunno", BODY, Some(&tampered)).is_err(),
                "byte {} flipped but signature still verified",
                i
            );
        }
    }

    #[test]
    fn length_mismatch_fails() {
        let short = &SHA1_SIGNATURE[..SHA1_SIGNATURE.len() - 1];
        let long = format!("{}0", SHA1_SIGNATURE);

        assert!(verify(Algorithm::Sha1, b"idunno", BODY, Some(short)).is_err());
        assert!(verify(Algorithm::Sha1, b"idunno", BODY, Some(&long)).is_err());
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"abcd", b"abcd"));
    }

    #[test]
    fn wrong_key_or_body_fails() {
        let other_body = br#"{"ref": "refs/heads/main"}"#;

        assert!(verify(Algorithm::Sha1, b"other", BODY, Some(SHA1_SIGNATURE)).is_err());
        assert!(verify(Algorithm::Sha1, b"idunno", other_body, Some(SHA1_SIGNATURE)).is_err());
    }

    #[test]
    fn missing_header_fails() {
        assert_eq!(
            verify(Algorithm::Sha1, b"idunno", BODY, None),
            Err(Error::HeaderNotFound("X-Hub-Signature"))
        );
        assert_eq!(
            verify(Algorithm::Sha1, b"idunno", BODY, Some("")),
            Err(Error::HeaderNotFound("X-Hub-Signature"))
        );
    }

    #[test]
    fn mismatch_reports_both_values() {
        let err = verify(Algorithm::Sha1, b"idunno", BODY, Some("sha1=nope")).unwrap_err();

        assert_eq!(
            err,
            Error::Mismatch {
                header: "X-Hub-Signature",
                expected: SHA1_SIGNATURE.into(),
                received: "sha1=nope".into(),
            }
        );
    }
}
