//! Stateless signed tokens for deep links.
//!
//! Wire format: `base64url(zlib(json) || hmac_sha256(zlib(json))[..SIGNATURE_LEN])`
//! without padding, so the token can be used verbatim as a `/start` parameter.

use std::io::{Read, Write};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use flate2::{Compression, read::ZlibDecoder, write::ZlibEncoder};
use hmac::{Hmac, Mac};
use serde::{Serialize, de::DeserializeOwned};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Deep-link parameters are capped at 64 characters by the transport.
pub const MAX_TOKEN_LEN: usize = 64;
pub const MIN_TOKEN_LEN: usize = 4;
pub const SIGNATURE_LEN: usize = 8;
const MAX_PAYLOAD_LEN: u64 = 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token too short ({0} characters)")]
    TooShort(usize),

    #[error("token too large ({0} characters)")]
    TooLarge(usize),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid signing key")]
    InvalidKey,

    #[error("cannot encode token payload: {0}")]
    Encode(String),
}

#[derive(Clone)]
pub struct TokenCodec {
    mac: HmacSha256,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, TokenError> {
        let mac =
            HmacSha256::new_from_slice(secret.as_ref()).map_err(|_| TokenError::InvalidKey)?;

        Ok(Self { mac })
    }

    pub fn encode<T: Serialize>(&self, payload: &T) -> Result<String, TokenError> {
        let json = serde_json::to_vec(payload).map_err(|e| TokenError::Encode(e.to_string()))?;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
        encoder
            .write_all(&json)
            .map_err(|e| TokenError::Encode(e.to_string()))?;
        let mut data = encoder
            .finish()
            .map_err(|e| TokenError::Encode(e.to_string()))?;

        let signature = self.sign(&data);
        data.extend_from_slice(&signature);

        let token = URL_SAFE_NO_PAD.encode(&data);
        if token.len() >= MAX_TOKEN_LEN {
            return Err(TokenError::TooLarge(token.len()));
        }

        Ok(token)
    }

    /// Every failure past the length gate is reported as [`TokenError::InvalidSignature`].
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        if token.len() < MIN_TOKEN_LEN {
            return Err(TokenError::TooShort(token.len()));
        }

        if token.len() > MAX_TOKEN_LEN {
            return Err(TokenError::TooLarge(token.len()));
        }

        let data = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| TokenError::InvalidSignature)?;

        let Some(split) = data.len().checked_sub(SIGNATURE_LEN) else {
            return Err(TokenError::InvalidSignature);
        };
        let (compressed, signature) = data.split_at(split);

        let mut mac = self.mac.clone();
        mac.update(compressed);
        mac.verify_truncated_left(signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let mut json = Vec::new();
        ZlibDecoder::new(compressed)
            .take(MAX_PAYLOAD_LEN)
            .read_to_end(&mut json)
            .map_err(|_| TokenError::InvalidSignature)?;

        serde_json::from_slice(&json).map_err(|_| TokenError::InvalidSignature)
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(data);
        let digest = mac.finalize().into_bytes();

        digest.iter().take(SIGNATURE_LEN).copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::user::ApproveToken;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Message {
        message: String,
    }

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET).unwrap()
    }

    #[test]
    fn approve_token_round_trip() {
        let payload = ApproveToken {
            user_id: 5_000_000_000,
            approve_code: "3A2CX".to_owned(),
        };
        let token = codec().encode(&payload).unwrap();

        assert!(token.len() < MAX_TOKEN_LEN);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_eq!(codec().decode::<ApproveToken>(&token).unwrap(), payload);
    }

    #[test]
    fn approve_tokens_fit_thirteen_digit_user_ids() {
        let payload = ApproveToken {
            user_id: 7_318_264_905_172,
            approve_code: "3A2CX".to_owned(),
        };
        let token = codec().encode(&payload).unwrap();
        assert!(token.len() < MAX_TOKEN_LEN, "{}", token.len());
        assert_eq!(codec().decode::<ApproveToken>(&token).unwrap(), payload);

        let payload = ApproveToken {
            user_id: 4_103_592_627_870_415,
            approve_code: "3A2CX".to_owned(),
        };
        assert!(matches!(
            codec().encode(&payload),
            Err(TokenError::TooLarge(_))
        ));
    }

    #[test]
    fn short_payloads_round_trip() {
        for text in ["", "a", "Hello world"] {
            let payload = Message {
                message: text.to_owned(),
            };
            let token = codec().encode(&payload).unwrap();
            assert_eq!(codec().decode::<Message>(&token).unwrap(), payload);
        }
    }

    #[test]
    fn oversized_payload_is_rejected_on_encode() {
        let payload = Message {
            message: "The quick brown fox jumps over the lazy dog".to_owned(),
        };
        assert!(matches!(
            codec().encode(&payload),
            Err(TokenError::TooLarge(_))
        ));
    }

    #[test]
    fn length_gates_run_before_verification() {
        assert_eq!(
            codec().decode::<Message>("abc").unwrap_err(),
            TokenError::TooShort(3)
        );
        let long = "A".repeat(MAX_TOKEN_LEN + 1);
        assert_eq!(
            codec().decode::<Message>(&long).unwrap_err(),
            TokenError::TooLarge(MAX_TOKEN_LEN + 1)
        );
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let token = codec()
            .encode(&ApproveToken {
                user_id: 42,
                approve_code: "3A2CX".to_owned(),
            })
            .unwrap();

        let suffix_start = token.len() - 10;
        for index in suffix_start..token.len() {
            let mut chars: Vec<char> = token.chars().collect();
            chars[index] = if chars[index] == 'A' { 'B' } else { 'A' };
            let tampered: String = chars.into_iter().collect();
            if tampered == token {
                continue;
            }

            assert_eq!(
                codec().decode::<ApproveToken>(&tampered).unwrap_err(),
                TokenError::InvalidSignature,
                "index {index}"
            );
        }
    }

    #[test]
    fn other_key_is_rejected() {
        let token = codec()
            .encode(&Message {
                message: "hi".to_owned(),
            })
            .unwrap();
        let other = TokenCodec::new("another-secret-another-secret-xx").unwrap();

        assert_eq!(
            other.decode::<Message>(&token).unwrap_err(),
            TokenError::InvalidSignature
        );
    }

    #[test]
    fn garbage_is_invalid_not_a_panic() {
        for input in ["!!!!!!!!", "AAAA", "AAAAAAAAAAAAAAAAAAAA", "zzzz-zzzz_zzzz"] {
            assert_eq!(
                codec().decode::<Message>(input).unwrap_err(),
                TokenError::InvalidSignature,
                "{input}"
            );
        }
    }
}
