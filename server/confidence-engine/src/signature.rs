//! Webhook signature gate (`X-Hub-Signature-256`).
//!
//! HMAC-SHA256 over the raw request body, hex-encoded behind a `sha256=`
//! prefix. Comparison goes through `ring::hmac::verify`, which is constant-time.
//! Every failure path rejects: no secret, no header, wrong prefix, bad hex,
//! or a digest that does not match.

use ring::hmac;

use crate::error::EngineError;

pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Produce the header value a sender would attach to `raw`.
pub fn sign(raw: &[u8], secret: &str) -> String {
  let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
  let tag = hmac::sign(&key, raw);
  format!("{}{}", SIGNATURE_PREFIX, hex::encode(tag.as_ref()))
}

/// Check `header` against `raw`, reporting why a delivery was rejected.
pub fn check(raw: &[u8], header: &str, secret: &str) -> Result<(), EngineError> {
  if secret.is_empty() {
    return Err(EngineError::signature("webhook secret is not configured"));
  }

  let header = header.trim();
  if header.is_empty() {
    return Err(EngineError::signature("missing signature header"));
  }

  let digest_hex = header
    .strip_prefix(SIGNATURE_PREFIX)
    .ok_or_else(|| EngineError::signature("expected sha256=<hex> signature"))?;
  let claimed = hex::decode(digest_hex)
    .map_err(|_| EngineError::signature("signature is not valid hex"))?;

  let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
  hmac::verify(&key, raw, &claimed).map_err(|_| EngineError::signature("signature mismatch"))
}

/// Boolean form of [`check`]: true only for a matching signature.
pub fn verify(raw: &[u8], header: &str, secret: &str) -> bool {
  check(raw, header, secret).is_ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  const SECRET: &str = "It's a Secret to Everybody";
  const BODY: &[u8] = b"Hello, World!";

  #[test]
  fn matches_github_reference_vector() {
    let expected = "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17";
    assert_eq!(sign(BODY, SECRET), expected);
    assert!(verify(BODY, expected, SECRET));
  }

  #[test]
  fn tampered_body_rejected() {
    let header = sign(BODY, SECRET);
    assert!(!verify(b"Hello, World?", &header, SECRET));
  }

  #[test]
  fn wrong_secret_rejected() {
    let header = sign(BODY, SECRET);
    assert!(!verify(BODY, &header, "another secret"));
  }

  #[test]
  fn empty_secret_fails_closed() {
    let header = sign(BODY, "");
    let err = check(BODY, &header, "").unwrap_err();
    assert!(err.to_string().contains("secret"));
  }

  #[test]
  fn missing_header_rejected() {
    assert!(!verify(BODY, "", SECRET));
    assert!(!verify(BODY, "   ", SECRET));
  }

  #[test]
  fn missing_prefix_rejected() {
    let header = sign(BODY, SECRET);
    let bare = header.trim_start_matches(SIGNATURE_PREFIX);
    assert!(!verify(BODY, bare, SECRET));
    assert!(!verify(BODY, &format!("sha1={}", bare), SECRET));
  }

  #[test]
  fn malformed_hex_rejected() {
    let err = check(BODY, "sha256=zz-not-hex", SECRET).unwrap_err();
    assert!(err.to_string().contains("hex"));
  }

  #[test]
  fn truncated_digest_rejected() {
    let header = sign(BODY, SECRET);
    assert!(!verify(BODY, &header[..header.len() - 2], SECRET));
  }
}
