//! # W3C Verifiable Credentials Data Model
//!
//! A strongly-typed model of [W3C Verifiable Credentials 2.0] with decoders
//! for credentials secured by an enveloping proof: data-URI envelopes and
//! [SD-JWT] compact tokens.
//!
//! Decoding is lossless. Every model keeps the keys it does not recognize and
//! writes them back on encode, and single values stay single while arrays
//! stay arrays.
//!
//! ```rust,ignore
//! use credibil_vcdm::VerifiableCredential;
//!
//! let vc = VerifiableCredential::from_enveloped(envelope_json)?;
//! println!("issued by {}", vc.credential().issuer_id());
//! ```
//!
//! Signatures are not verified: the crate decodes and restructures claims
//! only.
//!
//! [W3C Verifiable Credentials 2.0]: https://www.w3.org/TR/vc-data-model-2.0/
//! [SD-JWT]: https://datatracker.ietf.org/doc/draft-ietf-oauth-selective-disclosure-jwt/

pub mod core;
pub mod sd_jwt;
pub mod w3c_vc;

mod error;
mod verifiable;

pub use crate::core::{Cardinality, Decode, Encode, Field, Kind, OneMany, Validate, coerce};
pub use crate::error::{Error, FieldError, Result, ValidationErrors};
pub use crate::sd_jwt::{
    ClaimFormat, Hasher, SdJwtVerifiableCredential, SdJwtVerifiablePresentation, Sha2Hasher,
};
pub use crate::verifiable::VerifiableCredential;
pub use crate::w3c_vc::{
    Credential, EnvelopedVerifiableCredential, Holder, Issuer, Presentation, SecuredCredential,
};
