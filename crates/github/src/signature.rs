use buildhook_core::{AuthFailure, Error, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;

pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";
const PREFIX: &str = "sha256=";

fn mac(secret: &[u8], body: &[u8]) -> Hmac<Sha256> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(body);
    mac
}

/// Render the `X-Hub-Signature-256` value for `body`.
pub fn sign(secret: &[u8], body: &[u8]) -> String {
    format!("{PREFIX}{}", hex::encode(mac(secret, body).finalize().into_bytes()))
}

/// Check `header` against the HMAC-SHA256 of the raw, unparsed body.
/// The digest comparison is constant-time.
pub fn verify(secret: &[u8], body: &[u8], header: Option<&str>) -> Result<()> {
    let header = header
        .filter(|v| !v.is_empty())
        .ok_or(Error::Authentication(AuthFailure::Missing))?;
    let signature = header
        .strip_prefix(PREFIX)
        .and_then(|hex_digest| hex::decode(hex_digest).ok())
        .ok_or(Error::Authentication(AuthFailure::Malformed))?;
    mac(secret, body)
        .verify_slice(&signature)
        .map_err(|_| Error::Authentication(AuthFailure::Mismatch))
}
