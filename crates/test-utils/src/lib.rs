//! # Test Issuer
//!
//! Issues SD-JWT compact tokens the way an issuer does: claims are concealed
//! behind salted disclosures and their digests embedded in the payload. The
//! signature is random bytes; nothing under test verifies it.

use anyhow::{Result, anyhow, bail};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{Rng, rng};
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256, Sha384, Sha512};

/// A W3C VC 2.0 university degree credential.
#[must_use]
pub fn degree_credential() -> Value {
    json!({
        "@context": [
            "https://www.w3.org/ns/credentials/v2",
            "https://www.w3.org/ns/credentials/examples/v2"
        ],
        "id": "http://university.example/credentials/1872",
        "type": ["VerifiableCredential", "ExampleAlumniCredential"],
        "issuer": "https://university.example/issuers/565049",
        "validFrom": "2010-01-01T19:23:24Z",
        "credentialSubject": {
            "id": "did:example:ebfeb1f712ebc6f1c276e12ec21",
            "alumniOf": {
                "name": "Example University",
                "locations": ["Sydney", "Auckland"]
            }
        }
    })
}

/// A W3C VC 2.0 presentation with no credentials.
#[must_use]
pub fn presentation() -> Value {
    json!({
        "@context": ["https://www.w3.org/ns/credentials/v2"],
        "type": ["VerifiablePresentation"],
        "holder": "did:example:ebfeb1f712ebc6f1c276e12ec21"
    })
}

/// Issue an SD-JWT over a set of claims.
#[derive(Clone, Debug)]
pub struct SdJwtIssuer {
    header: Map<String, Value>,
    payload: Map<String, Value>,
    disclosures: Vec<String>,
    sd_alg: String,
    key_binding: Option<String>,
    media_type: &'static str,
}

impl SdJwtIssuer {
    /// Issue a `vc+sd-jwt` over `claims`.
    ///
    /// # Errors
    ///
    /// Returns an error if `claims` is not a JSON object.
    pub fn credential(claims: Value) -> Result<Self> {
        Self::new(claims, "vc+sd-jwt", "vc", "application/vc+sd-jwt")
    }

    /// Issue a `vp+sd-jwt` over `claims`.
    ///
    /// # Errors
    ///
    /// Returns an error if `claims` is not a JSON object.
    pub fn presentation(claims: Value) -> Result<Self> {
        Self::new(claims, "vp+sd-jwt", "vp", "application/vp+sd-jwt")
    }

    fn new(claims: Value, typ: &str, cyt: &str, media_type: &'static str) -> Result<Self> {
        let Value::Object(payload) = claims else {
            bail!("claims must be a JSON object");
        };
        let header = json!({"alg": "ES256", "typ": typ, "cyt": cyt});
        let Value::Object(header) = header else {
            bail!("header must be a JSON object");
        };

        Ok(Self {
            header,
            payload,
            disclosures: vec![],
            sd_alg: "sha-256".to_string(),
            key_binding: None,
            media_type,
        })
    }

    /// Set a header claim.
    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.header.insert(name.to_string(), value.into());
        self
    }

    /// Remove a header claim.
    #[must_use]
    pub fn without_header(mut self, name: &str) -> Self {
        self.header.remove(name);
        self
    }

    /// Use `sd_alg` for digests and declare it in `_sd_alg`. Call before
    /// concealing any claims.
    #[must_use]
    pub fn sd_alg(mut self, sd_alg: &str) -> Self {
        self.sd_alg = sd_alg.to_string();
        self
    }

    /// Conceal the claim at the JSON pointer `pointer`. An object property is
    /// replaced by a digest in its parent's `_sd` array; an array element by
    /// a `{"...": digest}` placeholder.
    ///
    /// Conceal nested claims before their parents.
    ///
    /// # Errors
    ///
    /// Returns an error if `pointer` does not resolve to a claim.
    pub fn conceal(mut self, pointer: &str) -> Result<Self> {
        let (parent, key) = pointer.rsplit_once('/').ok_or_else(|| anyhow!("invalid pointer"))?;
        let key = key.replace("~1", "/").replace("~0", "~");
        let salt = Base64UrlUnpadded::encode_string(&rng().random::<[u8; 16]>());

        let mut payload = Value::Object(std::mem::take(&mut self.payload));
        let target = payload.pointer_mut(parent).ok_or_else(|| anyhow!("no claim at `{parent}`"))?;

        let encoded = match target {
            Value::Object(object) => {
                let value = object.remove(&key).ok_or_else(|| anyhow!("no claim at `{pointer}`"))?;
                let encoded = encode(&json!([salt, key, value]))?;
                push_digest(object, digest(&self.sd_alg, &encoded)?)?;
                encoded
            }
            Value::Array(array) => {
                let index: usize = key.parse()?;
                let slot = array.get_mut(index).ok_or_else(|| anyhow!("no claim at `{pointer}`"))?;
                let encoded = encode(&json!([salt, slot.take()]))?;
                *slot = json!({"...": digest(&self.sd_alg, &encoded)?});
                encoded
            }
            _ => bail!("`{parent}` is not an object or an array"),
        };

        let Value::Object(payload) = payload else {
            bail!("payload must be a JSON object");
        };
        self.payload = payload;
        self.disclosures.push(encoded);
        Ok(self)
    }

    /// Add a digest that matches no disclosure.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload's `_sd` claim is not an array.
    pub fn decoy(mut self) -> Result<Self> {
        let salt = Base64UrlUnpadded::encode_string(&rng().random::<[u8; 16]>());
        push_digest(&mut self.payload, digest(&self.sd_alg, &salt)?)?;
        Ok(self)
    }

    /// Append a Key Binding JWT.
    #[must_use]
    pub fn key_binding(mut self, nonce: &str) -> Self {
        let header = json!({"alg": "ES256", "typ": "kb+jwt"});
        let claims = json!({"nonce": nonce, "aud": "https://verifier.example", "iat": 1_700_000_000});
        self.key_binding = Some(jwt(&header, &claims));
        self
    }

    /// Drop the disclosure at `index`, leaving its digest in the payload.
    #[must_use]
    pub fn withhold(mut self, index: usize) -> Self {
        if index < self.disclosures.len() {
            self.disclosures.remove(index);
        }
        self
    }

    /// Encoded disclosures, in issue order.
    #[must_use]
    pub fn disclosures(&self) -> &[String] {
        &self.disclosures
    }

    /// The compact SD-JWT: `<jwt>~<disclosure>~…~[<kb-jwt>]`.
    #[must_use]
    pub fn compact(&self) -> String {
        let mut payload = self.payload.clone();
        if self.sd_alg != "sha-256" {
            payload.insert("_sd_alg".to_string(), Value::String(self.sd_alg.clone()));
        }
        let jwt = jwt(&Value::Object(self.header.clone()), &Value::Object(payload));

        let mut compact = jwt;
        for disclosure in &self.disclosures {
            compact.push('~');
            compact.push_str(disclosure);
        }
        compact.push('~');
        if let Some(kb) = &self.key_binding {
            compact.push_str(kb);
        }
        compact
    }

    /// The compact SD-JWT as a `data:` URI.
    #[must_use]
    pub fn data_uri(&self) -> String {
        format!("data:{},{}", self.media_type, self.compact())
    }

    /// An `EnvelopedVerifiableCredential` object wrapping the SD-JWT.
    #[must_use]
    pub fn envelope(&self) -> Value {
        json!({
            "@context": "https://www.w3.org/ns/credentials/v2",
            "id": self.data_uri(),
            "type": "EnvelopedVerifiableCredential"
        })
    }
}

fn jwt(header: &Value, claims: &Value) -> String {
    let signature = rng().random::<[u8; 32]>();
    format!(
        "{}.{}.{}",
        Base64UrlUnpadded::encode_string(header.to_string().as_bytes()),
        Base64UrlUnpadded::encode_string(claims.to_string().as_bytes()),
        Base64UrlUnpadded::encode_string(&signature)
    )
}

fn encode(disclosure: &Value) -> Result<String> {
    Ok(Base64UrlUnpadded::encode_string(&serde_json::to_vec(disclosure)?))
}

fn digest(sd_alg: &str, encoded: &str) -> Result<String> {
    let hash = match sd_alg {
        "sha-256" => Sha256::digest(encoded).to_vec(),
        "sha-384" => Sha384::digest(encoded).to_vec(),
        "sha-512" => Sha512::digest(encoded).to_vec(),
        _ => bail!("unsupported digest algorithm `{sd_alg}`"),
    };
    Ok(Base64UrlUnpadded::encode_string(&hash))
}

fn push_digest(object: &mut Map<String, Value>, digest: String) -> Result<()> {
    let sd = object.entry("_sd").or_insert_with(|| Value::Array(vec![]));
    let Value::Array(sd) = sd else {
        bail!("`_sd` must be an array");
    };
    sd.push(Value::String(digest));
    Ok(())
}
