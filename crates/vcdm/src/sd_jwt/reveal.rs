//! # Claim Reconstruction
//!
//! Walks the issuer-signed payload, replacing each `_sd` digest and each
//! `{"...": digest}` array element with the claim its disclosure reveals.
//! Revealed values are walked in turn, so nested disclosures resolve.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::{ARRAY_ELEMENT_CLAIM, Disclosure, DisclosureKind, Hasher, SD_ALG_CLAIM, SD_CLAIM};
use crate::error::{Error, Result, malformed};

/// Reveal the claims of `payload`. Digests with no matching disclosure are
/// left in place.
pub(super) fn reveal(
    payload: &Map<String, Value>, disclosures: &[Disclosure], alg: &str, hasher: &dyn Hasher,
) -> Result<Map<String, Value>> {
    let mut revealer = Revealer::new(disclosures, alg, hasher)?;
    let mut claims = revealer.reveal_object(payload)?;
    claims.remove(SD_ALG_CLAIM);

    for (disclosure, used) in disclosures.iter().zip(&revealer.used) {
        if !used {
            tracing::debug!(disclosure = disclosure.encoded(), "disclosure not referenced by payload");
        }
    }
    Ok(claims)
}

struct Revealer<'a> {
    disclosures: &'a [Disclosure],
    by_digest: HashMap<String, usize>,
    used: Vec<bool>,
}

impl<'a> Revealer<'a> {
    fn new(disclosures: &'a [Disclosure], alg: &str, hasher: &dyn Hasher) -> Result<Self> {
        let mut by_digest = HashMap::with_capacity(disclosures.len());
        for (i, disclosure) in disclosures.iter().enumerate() {
            if by_digest.insert(disclosure.digest(alg, hasher)?, i).is_some() {
                return Err(Error::DigestResolution(format!(
                    "disclosure `{}` appears more than once",
                    disclosure.encoded()
                )));
            }
        }

        Ok(Self {
            disclosures,
            used: vec![false; disclosures.len()],
            by_digest,
        })
    }

    /// Find the disclosure for `digest`, marking it used.
    fn take(&mut self, digest: &str) -> Result<Option<&'a Disclosure>> {
        let Some(&i) = self.by_digest.get(digest) else {
            tracing::debug!(digest, "claim not disclosed");
            return Ok(None);
        };
        if self.used[i] {
            return Err(Error::DigestResolution(format!("digest `{digest}` is referenced more than once")));
        }
        self.used[i] = true;
        Ok(Some(&self.disclosures[i]))
    }

    fn reveal_value(&mut self, value: &Value) -> Result<Value> {
        match value {
            Value::Object(object) => self.reveal_object(object).map(Value::Object),
            Value::Array(array) => self.reveal_array(array).map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    fn reveal_object(&mut self, object: &Map<String, Value>) -> Result<Map<String, Value>> {
        let mut revealed = Map::with_capacity(object.len());
        for (key, value) in object {
            if key != SD_CLAIM {
                revealed.insert(key.clone(), self.reveal_value(value)?);
            }
        }

        let Some(digests) = object.get(SD_CLAIM) else {
            return Ok(revealed);
        };
        let Value::Array(digests) = digests else {
            return Err(malformed!("`{SD_CLAIM}` must be an array"));
        };

        let mut undisclosed = vec![];
        for digest in digests {
            let Value::String(digest) = digest else {
                return Err(malformed!("`{SD_CLAIM}` entries must be strings"));
            };
            match self.take(digest)?.map(|d| &d.kind) {
                Some(DisclosureKind::ObjectProperty { name, value }) => {
                    if revealed.contains_key(name) {
                        return Err(Error::DigestResolution(format!(
                            "disclosed claim `{name}` already exists"
                        )));
                    }
                    let value = self.reveal_value(value)?;
                    revealed.insert(name.clone(), value);
                }
                Some(DisclosureKind::ArrayElement(_)) => {
                    return Err(Error::DigestResolution(format!(
                        "digest `{digest}` in `{SD_CLAIM}` refers to an array element disclosure"
                    )));
                }
                None => undisclosed.push(Value::String(digest.clone())),
            }
        }

        if !undisclosed.is_empty() {
            revealed.insert(SD_CLAIM.to_string(), Value::Array(undisclosed));
        }
        Ok(revealed)
    }

    fn reveal_array(&mut self, array: &[Value]) -> Result<Vec<Value>> {
        let mut revealed = Vec::with_capacity(array.len());
        for item in array {
            let Some(digest) = element_digest(item) else {
                revealed.push(self.reveal_value(item)?);
                continue;
            };
            let Value::String(digest) = digest else {
                return Err(malformed!("`{ARRAY_ELEMENT_CLAIM}` must be a string"));
            };

            match self.take(digest)?.map(|d| &d.kind) {
                Some(DisclosureKind::ArrayElement(value)) => {
                    revealed.push(self.reveal_value(value)?);
                }
                Some(DisclosureKind::ObjectProperty { name, .. }) => {
                    return Err(Error::DigestResolution(format!(
                        "array element digest `{digest}` refers to object property `{name}`"
                    )));
                }
                None => revealed.push(item.clone()),
            }
        }
        Ok(revealed)
    }
}

/// The digest of an array element placeholder: `{"...": "<digest>"}`.
fn element_digest(item: &Value) -> Option<&Value> {
    match item {
        Value::Object(object) if object.len() == 1 => object.get(ARRAY_ELEMENT_CLAIM),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use base64ct::{Base64UrlUnpadded, Encoding};
    use serde_json::json;

    use super::*;
    use crate::sd_jwt::{DEFAULT_SD_ALG, Sha2Hasher};

    fn disclosure(parts: &Value) -> (Disclosure, String) {
        let encoded = Base64UrlUnpadded::encode_string(parts.to_string().as_bytes());
        let disclosure = Disclosure::parse(&encoded).expect("should parse");
        let digest = disclosure.digest(DEFAULT_SD_ALG, &Sha2Hasher).expect("should digest");
        (disclosure, digest)
    }

    fn object(value: Value) -> Map<String, Value> {
        let Value::Object(object) = value else { unreachable!() };
        object
    }

    #[test]
    fn nested_and_array_disclosures() {
        let (locality, locality_sd) = disclosure(&json!(["s1", "locality", "Anytown"]));
        let (address, address_sd) =
            disclosure(&json!(["s2", "address", {"country": "US", "_sd": [locality_sd]}]));
        let (fr, fr_sd) = disclosure(&json!(["s3", "FR"]));

        let payload = object(json!({
            "iss": "https://example.com/issuer",
            "_sd_alg": "sha-256",
            "_sd": [address_sd],
            "nationalities": ["DE", {"...": fr_sd}, {"...": "undisclosed"}]
        }));

        let claims = reveal(&payload, &[fr, address, locality], DEFAULT_SD_ALG, &Sha2Hasher)
            .expect("should reveal");
        assert_eq!(
            Value::Object(claims),
            json!({
                "iss": "https://example.com/issuer",
                "address": {"country": "US", "locality": "Anytown"},
                "nationalities": ["DE", "FR", {"...": "undisclosed"}]
            })
        );
    }

    #[test]
    fn undisclosed_digests_remain() {
        let (name, name_sd) = disclosure(&json!(["s1", "given_name", "Alice"]));
        let (_, unreferenced_sd) = disclosure(&json!(["s2", "family_name", "Smith"]));
        let (unreferenced, _) = disclosure(&json!(["s3", "email", "alice@example.com"]));

        let payload = object(json!({"_sd": [name_sd, unreferenced_sd]}));
        let claims = reveal(&payload, &[name, unreferenced], DEFAULT_SD_ALG, &Sha2Hasher)
            .expect("should reveal");
        assert_eq!(Value::Object(claims), json!({"given_name": "Alice", "_sd": [unreferenced_sd]}));
    }

    #[test]
    fn resolution_errors() {
        let (name, name_sd) = disclosure(&json!(["s1", "given_name", "Alice"]));
        let (element, element_sd) = disclosure(&json!(["s2", "Alice"]));

        let twice = object(json!({"_sd": [name_sd], "nested": {"_sd": [name_sd]}}));
        let err = reveal(&twice, &[name.clone()], DEFAULT_SD_ALG, &Sha2Hasher)
            .expect_err("should fail");
        assert!(matches!(err, Error::DigestResolution(_)));

        let collision = object(json!({"given_name": "Bob", "_sd": [name_sd]}));
        let err = reveal(&collision, &[name.clone()], DEFAULT_SD_ALG, &Sha2Hasher)
            .expect_err("should fail");
        assert!(matches!(err, Error::DigestResolution(_)));

        let mismatch = object(json!({"_sd": [element_sd]}));
        let err = reveal(&mismatch, &[element], DEFAULT_SD_ALG, &Sha2Hasher)
            .expect_err("should fail");
        assert!(matches!(err, Error::DigestResolution(_)));

        let not_array = object(json!({"_sd": "digest"}));
        let err = reveal(&not_array, &[], DEFAULT_SD_ALG, &Sha2Hasher).expect_err("should fail");
        assert!(matches!(err, Error::MalformedSdJwt(_)));

        let duplicate = object(json!({}));
        let err = reveal(&duplicate, &[name.clone(), name], DEFAULT_SD_ALG, &Sha2Hasher)
            .expect_err("should fail");
        assert!(matches!(err, Error::DigestResolution(_)));
    }
}
