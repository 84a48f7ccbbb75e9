//! PKCE verifier/challenge generation for the OAuth code flow.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// 64 random bytes encode to an 86-char verifier, inside RFC 7636's 43..=128.
const VERIFIER_BYTES: usize = 64;
const STATE_BYTES: usize = 32;

/// One authorization attempt's secrets.
///
/// Keep it until the redirect comes back; the verifier must be sent with
/// the matching code and the state must match the callback's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
    pub state: String,
}

impl PkceChallenge {
    pub fn generate() -> Self {
        Self::with_state(random_url_safe(STATE_BYTES))
    }

    pub fn with_state(state: impl Into<String>) -> Self {
        let verifier = random_url_safe(VERIFIER_BYTES);
        let challenge = code_challenge_s256(&verifier);
        Self {
            verifier,
            challenge,
            state: state.into(),
        }
    }
}

/// `base64url(sha256(verifier))` without padding.
pub fn code_challenge_s256(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Constant-time comparison of the expected and returned `state`.
pub fn states_match(expected: &str, returned: &str) -> bool {
    expected.as_bytes().ct_eq(returned.as_bytes()).into()
}

fn random_url_safe(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_challenge_matches_verifier_digest() {
        for _ in 0..32 {
            let pkce = PkceChallenge::generate();
            assert_eq!(pkce.challenge, code_challenge_s256(&pkce.verifier));
            assert!(!pkce.challenge.ends_with('='));
        }
    }

    #[test]
    fn verifier_is_url_safe_and_within_rfc_length() {
        let pkce = PkceChallenge::generate();
        assert!((43..=128).contains(&pkce.verifier.len()));
        assert!(pkce
            .verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn challenge_matches_rfc7636_appendix_b() {
        assert_eq!(
            code_challenge_s256("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn each_attempt_gets_fresh_secrets() {
        let a = PkceChallenge::generate();
        let b = PkceChallenge::generate();
        assert_ne!(a.verifier, b.verifier);
        assert_ne!(a.state, b.state);
    }

    #[test]
    fn state_comparison_is_exact() {
        assert!(states_match("abc", "abc"));
        assert!(!states_match("abc", "abd"));
        assert!(!states_match("abc", "abcd"));
        assert!(!states_match("abc", ""));
    }
}
