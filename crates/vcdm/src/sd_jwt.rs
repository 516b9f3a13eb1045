//! # IETF SD-JWT-based Credential Format
//!
//! Decodes the compact serialization of a Selective Disclosure JWT
//! (`<jwt>~<disclosure>~…~[<kb-jwt>]`), matches each disclosure to the
//! digest the issuer embedded in the payload, and reconstructs the disclosed
//! claim set. The signature is carried but not verified.
//!
//! See [draft-ietf-oauth-selective-disclosure-jwt].
//!
//! [draft-ietf-oauth-selective-disclosure-jwt]: https://datatracker.ietf.org/doc/draft-ietf-oauth-selective-disclosure-jwt/

mod credential;
mod presentation;
mod reveal;

use std::fmt;

use base64ct::{Base64UrlUnpadded, Encoding};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256, Sha384, Sha512};
use tracing::instrument;

pub use self::credential::{SdJwtVerifiableCredential, VC_SD_JWT_PREFIX};
pub use self::presentation::{SdJwtVerifiablePresentation, VP_SD_JWT_PREFIX};
use crate::error::{Error, Result, malformed};

/// Digest algorithm assumed when the payload does not declare `_sd_alg`.
pub const DEFAULT_SD_ALG: &str = "sha-256";

/// Payload claim holding the digests of object property disclosures.
pub const SD_CLAIM: &str = "_sd";

/// Payload claim naming the digest algorithm.
pub const SD_ALG_CLAIM: &str = "_sd_alg";

/// Key of the single-entry object standing in for an undisclosed array
/// element.
pub const ARRAY_ELEMENT_CLAIM: &str = "...";

/// Computes disclosure digests.
///
/// `alg` is an IANA "Named Information Hash Algorithm" name, e.g. `sha-256`.
/// Any `Fn(&[u8], &str) -> Result<Vec<u8>>` closure is a `Hasher`.
pub trait Hasher {
    /// Hash `data` with the named algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedAlgorithm`] if the algorithm is not
    /// supported.
    fn hash(&self, data: &[u8], alg: &str) -> Result<Vec<u8>>;
}

impl<F> Hasher for F
where
    F: Fn(&[u8], &str) -> Result<Vec<u8>>,
{
    fn hash(&self, data: &[u8], alg: &str) -> Result<Vec<u8>> {
        self(data, alg)
    }
}

/// The default [`Hasher`], backed by the SHA-2 family.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha2Hasher;

impl Hasher for Sha2Hasher {
    fn hash(&self, data: &[u8], alg: &str) -> Result<Vec<u8>> {
        match alg {
            "sha-256" => Ok(Sha256::digest(data).to_vec()),
            "sha-384" => Ok(Sha384::digest(data).to_vec()),
            "sha-512" => Ok(Sha512::digest(data).to_vec()),
            _ => Err(Error::UnsupportedAlgorithm(alg.to_string())),
        }
    }
}

/// Claim formats for SD-JWT secured W3C documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClaimFormat {
    /// An SD-JWT secured verifiable credential.
    VcSdJwt,

    /// An SD-JWT secured verifiable presentation.
    VpSdJwt,
}

impl ClaimFormat {
    /// The format identifier, also used as the JWT `typ` header.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::VcSdJwt => "vc+sd-jwt",
            Self::VpSdJwt => "vp+sd-jwt",
        }
    }

    /// The media type used in a data URI.
    #[must_use]
    pub const fn media_type(&self) -> &'static str {
        match self {
            Self::VcSdJwt => "application/vc+sd-jwt",
            Self::VpSdJwt => "application/vp+sd-jwt",
        }
    }
}

impl fmt::Display for ClaimFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a disclosure reveals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisclosureKind {
    /// `[salt, name, value]`: an object property.
    ObjectProperty {
        /// The claim name.
        name: String,

        /// The claim value.
        value: Value,
    },

    /// `[salt, value]`: an array element.
    ArrayElement(Value),
}

/// A decoded disclosure. The encoded form is kept verbatim because the
/// digest is computed over it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Disclosure {
    encoded: String,

    /// The disclosure salt.
    pub salt: String,

    /// The disclosed claim.
    pub kind: DisclosureKind,
}

impl Disclosure {
    /// Unpack a base64url-encoded disclosure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedSdJwt`] if the decoding fails or if the
    /// disclosure is not a JSON array of length 2 or 3.
    pub fn parse(encoded: &str) -> Result<Self> {
        let decoded = Base64UrlUnpadded::decode_vec(encoded)
            .map_err(|e| malformed!("disclosure is not base64url: {e}"))?;
        let parts = serde_json::from_slice::<Value>(&decoded)
            .map_err(|e| malformed!("disclosure is not JSON: {e}"))?;
        let Value::Array(mut parts) = parts else {
            return Err(malformed!("disclosure must be a JSON array"));
        };

        let kind = match parts.len() {
            3 => {
                let value = parts.pop().unwrap_or_default();
                let Some(Value::String(name)) = parts.pop() else {
                    return Err(malformed!("disclosure claim name must be a string"));
                };
                if name == SD_CLAIM || name == ARRAY_ELEMENT_CLAIM {
                    return Err(malformed!("disclosure claim name `{name}` is reserved"));
                }
                DisclosureKind::ObjectProperty { name, value }
            }
            2 => DisclosureKind::ArrayElement(parts.pop().unwrap_or_default()),
            n => return Err(malformed!("disclosure must have 2 or 3 elements, found {n}")),
        };
        let Some(Value::String(salt)) = parts.pop() else {
            return Err(malformed!("disclosure salt must be a string"));
        };

        Ok(Self {
            encoded: encoded.to_string(),
            salt,
            kind,
        })
    }

    /// The base64url-encoded disclosure, as it appeared in the token.
    #[must_use]
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// The claim name, for an object property disclosure.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            DisclosureKind::ObjectProperty { name, .. } => Some(name),
            DisclosureKind::ArrayElement(_) => None,
        }
    }

    /// The disclosed value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        match &self.kind {
            DisclosureKind::ObjectProperty { value, .. } | DisclosureKind::ArrayElement(value) => {
                value
            }
        }
    }

    /// The disclosure digest: the base64url-encoded hash of the ASCII bytes
    /// of the encoded disclosure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedAlgorithm`] if the hasher does not support
    /// `alg`.
    pub fn digest(&self, alg: &str, hasher: &dyn Hasher) -> Result<String> {
        Ok(Base64UrlUnpadded::encode_string(&hasher.hash(self.encoded.as_bytes(), alg)?))
    }
}

/// A decoded SD-JWT with its disclosed claims reconstructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedSdJwt {
    compact: String,

    /// The JOSE header.
    pub header: Map<String, Value>,

    /// The issuer-signed payload, digests and all.
    pub payload: Map<String, Value>,

    /// The base64url-encoded signature. Not verified.
    pub signature: String,

    /// Disclosures, in token order.
    pub disclosures: Vec<Disclosure>,

    /// The trailing Key Binding JWT, if any. Not verified.
    pub key_binding: Option<String>,

    /// The payload with every matched digest replaced by its disclosed
    /// claim and `_sd_alg` removed.
    pub claims: Map<String, Value>,
}

impl DecodedSdJwt {
    /// The compact serialization the SD-JWT was decoded from.
    #[must_use]
    pub fn compact(&self) -> &str {
        &self.compact
    }

    /// The digest algorithm declared by the payload.
    #[must_use]
    pub fn sd_alg(&self) -> &str {
        self.payload.get(SD_ALG_CLAIM).and_then(Value::as_str).unwrap_or(DEFAULT_SD_ALG)
    }
}

/// Decode a compact SD-JWT and reveal its disclosed claims.
///
/// Digests without a matching disclosure are left in place: they stand for
/// claims the holder chose not to disclose.
///
/// # Errors
///
/// Returns [`Error::MalformedSdJwt`] if the token or a disclosure is
/// malformed, [`Error::UnsupportedAlgorithm`] if the digest algorithm is not
/// supported by `hasher`, or [`Error::DigestResolution`] if a disclosure
/// cannot be applied to the payload.
#[instrument(level = "debug", skip_all)]
pub fn decode(compact: &str, hasher: &dyn Hasher) -> Result<DecodedSdJwt> {
    let parts = split(compact)?;

    let mut segments = parts.jwt.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return Err(malformed!("JWT must have three `.`-separated segments"));
    };
    let header = decode_segment(header, "header")?;
    let payload = decode_segment(payload, "payload")?;

    let disclosures =
        parts.disclosures.iter().map(|d| Disclosure::parse(d)).collect::<Result<Vec<_>>>()?;

    let alg = match payload.get(SD_ALG_CLAIM) {
        None => DEFAULT_SD_ALG,
        Some(Value::String(alg)) => alg.as_str(),
        Some(_) => return Err(malformed!("`{SD_ALG_CLAIM}` must be a string")),
    };
    tracing::trace!(alg, disclosures = disclosures.len(), "revealing SD-JWT claims");
    let claims = reveal::reveal(&payload, &disclosures, alg, hasher)?;

    Ok(DecodedSdJwt {
        compact: compact.to_string(),
        header,
        payload,
        signature: signature.to_string(),
        disclosures,
        key_binding: parts.key_binding.map(ToString::to_string),
        claims,
    })
}

/// The `~`-separated parts of a compact SD-JWT.
struct Parts<'a> {
    jwt: &'a str,
    disclosures: Vec<&'a str>,
    key_binding: Option<&'a str>,
}

fn split(compact: &str) -> Result<Parts<'_>> {
    let mut segments = compact.split('~').collect::<Vec<_>>();
    let jwt = segments.remove(0);
    if jwt.is_empty() {
        return Err(malformed!("missing issuer-signed JWT"));
    }

    // the final segment is empty (`…~`) or a key binding JWT (`…~<kb-jwt>`)
    let key_binding = match segments.last() {
        Some(last) if last.is_empty() => {
            segments.pop();
            None
        }
        Some(last) if last.contains('.') => segments.pop(),
        _ => None,
    };
    if segments.iter().any(|s| s.is_empty()) {
        return Err(malformed!("empty disclosure"));
    }

    Ok(Parts {
        jwt,
        disclosures: segments,
        key_binding,
    })
}

fn decode_segment(segment: &str, name: &str) -> Result<Map<String, Value>> {
    let bytes = Base64UrlUnpadded::decode_vec(segment)
        .map_err(|e| malformed!("JWT {name} is not base64url: {e}"))?;
    let value = serde_json::from_slice::<Value>(&bytes)
        .map_err(|e| malformed!("JWT {name} is not JSON: {e}"))?;
    match value {
        Value::Object(object) => Ok(object),
        _ => Err(malformed!("JWT {name} must be a JSON object")),
    }
}

/// A header claim, if present, must equal `expected`.
pub(crate) fn assert_header(
    header: &Map<String, Value>, name: &'static str, expected: &'static str,
) -> Result<()> {
    match header.get(name) {
        None => Ok(()),
        Some(Value::String(found)) if found == expected => Ok(()),
        Some(found) => Err(Error::InvalidHeaderAssertion {
            header: name,
            expected,
            found: found.as_str().map_or_else(|| found.to_string(), ToString::to_string),
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn b64(value: &Value) -> String {
        Base64UrlUnpadded::encode_string(value.to_string().as_bytes())
    }

    fn jwt(header: &Value, payload: &Value) -> String {
        format!("{}.{}.c2ln", b64(header), b64(payload))
    }

    #[test]
    fn sha2_algorithms() {
        assert_eq!(Sha2Hasher.hash(b"abc", "sha-256").expect("should hash").len(), 32);
        assert_eq!(Sha2Hasher.hash(b"abc", "sha-384").expect("should hash").len(), 48);
        assert_eq!(Sha2Hasher.hash(b"abc", "sha-512").expect("should hash").len(), 64);

        let err = Sha2Hasher.hash(b"abc", "md5").expect_err("should fail");
        assert!(matches!(err, Error::UnsupportedAlgorithm(ref alg) if alg == "md5"));
    }

    // Example disclosure from draft-ietf-oauth-selective-disclosure-jwt.
    #[test]
    fn disclosure_digest() {
        let encoded = "WyJfMjZiYzRMVC1hYzZxMktJNmNCVzVlcyIsICJmYW1pbHlfbmFtZSIsICJNw7ZiaXVzIl0";
        let disclosure = Disclosure::parse(encoded).expect("should parse");
        assert_eq!(disclosure.salt, "_26bc4LT-ac6q2KI6cBW5es");
        assert_eq!(disclosure.name(), Some("family_name"));
        assert_eq!(disclosure.value(), &json!("Möbius"));
        assert_eq!(
            disclosure.digest(DEFAULT_SD_ALG, &Sha2Hasher).expect("should digest"),
            "X9yH0Ajrdm1Oij4tWso9UzzKJvPoDxwmuEcO3XAdRC0"
        );
    }

    #[test]
    fn array_disclosure() {
        let encoded = b64(&json!(["lklxF5jMYlGTPUovMNIvCA", "FR"]));
        let disclosure = Disclosure::parse(&encoded).expect("should parse");
        assert_eq!(disclosure.kind, DisclosureKind::ArrayElement(json!("FR")));
        assert_eq!(disclosure.name(), None);
    }

    #[test]
    fn bad_disclosures() {
        Disclosure::parse("not base64!").expect_err("should fail");
        Disclosure::parse(&b64(&json!({"a": 1}))).expect_err("should fail");
        Disclosure::parse(&b64(&json!(["salt"]))).expect_err("should fail");
        Disclosure::parse(&b64(&json!(["salt", 1, "value"]))).expect_err("should fail");
        Disclosure::parse(&b64(&json!(["salt", "_sd", "value"]))).expect_err("should fail");
    }

    #[test]
    fn disclosure_not_json() {
        let truncated = Base64UrlUnpadded::encode_string(br#"["salt", "x""#);
        let err = Disclosure::parse(&truncated).expect_err("should fail");
        let Error::MalformedSdJwt(message) = err else {
            panic!("should be a malformed SD-JWT error");
        };
        assert!(message.starts_with("disclosure is not JSON"));
    }

    #[test]
    fn segments_not_json() {
        let header = b64(&json!({"alg": "none"}));
        let payload = b64(&json!({"iss": "https://example.com"}));
        let not_json = Base64UrlUnpadded::encode_string(b"not json");
        let not_utf8 = Base64UrlUnpadded::encode_string(&[0xff, 0xfe]);

        for (token, expected) in [
            (format!("{not_json}.{payload}.c2ln~"), "JWT header is not JSON"),
            (format!("{not_utf8}.{payload}.c2ln~"), "JWT header is not JSON"),
            (format!("{header}.{not_json}.c2ln~"), "JWT payload is not JSON"),
        ] {
            let err = decode(&token, &Sha2Hasher).expect_err("should fail");
            let Error::MalformedSdJwt(message) = err else {
                panic!("should be a malformed SD-JWT error");
            };
            assert!(message.starts_with(expected), "{message}");
        }
    }

    #[test]
    fn compact_parts() {
        let token = jwt(&json!({"alg": "none"}), &json!({"iss": "https://example.com"}));

        let decoded = decode(&token, &Sha2Hasher).expect("should decode");
        assert!(decoded.disclosures.is_empty());
        assert_eq!(decoded.signature, "c2ln");

        let with_kb = format!("{token}~{token}");
        let decoded = decode(&with_kb, &Sha2Hasher).expect("should decode");
        assert_eq!(decoded.key_binding.as_deref(), Some(token.as_str()));
        assert_eq!(decoded.compact(), with_kb);

        decode("a.b~", &Sha2Hasher).expect_err("two segments should fail");
        decode("~", &Sha2Hasher).expect_err("empty jwt should fail");
        decode(&format!("{token}~~"), &Sha2Hasher).expect_err("empty disclosure should fail");
    }

    #[test]
    fn custom_hasher() {
        let disclosure = b64(&json!(["salt", "given_name", "Erika"]));
        let token = format!(
            "{}~{disclosure}~",
            jwt(&json!({"alg": "none"}), &json!({"_sd": ["cGxhaW4"], "_sd_alg": "identity"}))
        );

        // every disclosure digests to base64url("plain")
        let hasher = |_: &[u8], alg: &str| -> Result<Vec<u8>> {
            assert_eq!(alg, "identity");
            Ok(b"plain".to_vec())
        };
        let decoded = decode(&token, &hasher).expect("should decode");
        assert_eq!(decoded.sd_alg(), "identity");
        assert_eq!(Value::Object(decoded.claims), json!({"given_name": "Erika"}));
    }

    #[test]
    fn header_assertions() {
        let header = json!({"typ": "vc+sd-jwt", "cyt": 1});
        let Value::Object(header) = header else { unreachable!() };

        assert_header(&header, "typ", "vc+sd-jwt").expect("should match");
        assert_header(&header, "kid", "anything").expect("absent should pass");
        let err = assert_header(&header, "cyt", "vc").expect_err("should fail");
        assert!(matches!(err, Error::InvalidHeaderAssertion { header: "cyt", ref found, .. } if found == "1"));
    }
}
