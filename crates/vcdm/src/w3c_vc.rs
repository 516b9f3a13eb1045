//! # W3C Verifiable Credentials 2.0
//!
//! This module provides a strongly-typed model of the [W3C Verifiable
//! Credentials Data Model v2.0](https://www.w3.org/TR/vc-data-model-2.0/).
//!
//! Every model decodes from, and encodes back to, its JSON-LD wire shape.
//! Properties the model does not recognize are kept verbatim in a
//! `properties` map so that encoding a decoded value reproduces the input.
//! Decoding is structural; the W3C rules (base context, required types,
//! URI and date-time syntax) are applied by a separate validation pass that
//! reports every offending field at once.

mod builder;
mod credential;
mod enveloped;
mod lang;
mod party;
mod presentation;
mod types;

use serde_json::{Map, Value};

pub use self::builder::{CredentialBuilder, HasIssuer, HasSubject, NoIssuer, NoSubject};
pub use self::credential::Credential;
pub use self::enveloped::{EnvelopedVerifiableCredential, SecuredCredential, resolve_data_uri};
pub use self::lang::{Direction, LangString, LocalizedValue};
pub use self::party::{Holder, Issuer};
pub use self::presentation::Presentation;
pub use self::types::{
    CredentialSchema, CredentialStatus, CredentialSubject, Evidence, RefreshService, TermsOfUse,
};
use crate::core::{Kind, OneMany};
use crate::error::{ValidationErrors, join};

/// The base context every W3C VC 2.0 document must list first.
pub const CREDENTIALS_CONTEXT_V2: &str = "https://www.w3.org/ns/credentials/v2";

/// The base credential type.
pub const VERIFIABLE_CREDENTIAL_TYPE: &str = "VerifiableCredential";

/// The base presentation type.
pub const VERIFIABLE_PRESENTATION_TYPE: &str = "VerifiablePresentation";

/// The type of a credential secured by an enveloping proof.
pub const ENVELOPED_VERIFIABLE_CREDENTIAL_TYPE: &str = "EnvelopedVerifiableCredential";

/// A JSON-LD context entry: a URI or an embedded context object.
pub type Context = Kind<Map<String, Value>>;

/// The default `@context`: a one-element array holding the base context.
#[must_use]
pub fn base_context() -> OneMany<Context> {
    OneMany::Many(vec![Kind::String(CREDENTIALS_CONTEXT_V2.to_string())])
}

/// `@context` must be non-empty and start with the base VC 2.0 context.
fn validate_context(context: &OneMany<Context>, path: &str, errors: &mut ValidationErrors) {
    let field = join(path, "@context");
    match context.iter().next() {
        Some(Kind::String(first)) if first == CREDENTIALS_CONTEXT_V2 => {}
        Some(_) => errors.push(field, format!("first entry must be `{CREDENTIALS_CONTEXT_V2}`")),
        None => errors.push(field, "must contain at least one entry"),
    }
}

/// `type` must be non-empty and include `required`.
fn validate_type(type_: &OneMany<String>, required: &str, path: &str, errors: &mut ValidationErrors) {
    let field = join(path, "type");
    if type_.is_empty() {
        errors.push(field, "must contain at least one entry");
    } else if !type_.iter().any(|t| t == required) {
        errors.push(field, format!("must include `{required}`"));
    }
}

/// Push a violation if `value` is present and not a URI.
fn validate_uri(value: Option<&str>, path: &str, field: &str, errors: &mut ValidationErrors) {
    if let Some(value) = value
        && !crate::core::syntax::is_uri(value)
    {
        errors.push(join(path, field), "must be a URI");
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn context_rules() {
        let mut errors = ValidationErrors::default();
        validate_context(&base_context(), "", &mut errors);
        assert!(errors.is_empty());

        let wrong = OneMany::Many(vec![
            Kind::String("https://www.w3.org/2018/credentials/v1".to_string()),
            Kind::String(CREDENTIALS_CONTEXT_V2.to_string()),
        ]);
        validate_context(&wrong, "", &mut errors);

        let object_first = OneMany::One(Kind::Object(
            json!({"@vocab": "https://example.com#"}).as_object().cloned().unwrap_or_default(),
        ));
        validate_context(&object_first, "verifiableCredential[0]", &mut errors);

        validate_context(&OneMany::Many(vec![]), "", &mut errors);
        assert_eq!(
            errors.fields(),
            vec!["@context", "verifiableCredential[0].@context", "@context"]
        );
    }

    #[test]
    fn type_rules() {
        let mut errors = ValidationErrors::default();
        let types = OneMany::Many(vec!["VerifiableCredential".to_string(), "X".to_string()]);
        validate_type(&types, VERIFIABLE_CREDENTIAL_TYPE, "", &mut errors);
        assert!(errors.is_empty());

        validate_type(&OneMany::One("X".to_string()), VERIFIABLE_CREDENTIAL_TYPE, "", &mut errors);
        validate_type(&OneMany::Many(vec![]), VERIFIABLE_CREDENTIAL_TYPE, "", &mut errors);
        assert_eq!(errors.len(), 2);
    }
}
