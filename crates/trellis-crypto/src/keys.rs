use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};

use trellis_core::{KeyMaterial, VerificationMethod, VerificationMethodType};

use crate::error::CryptoError;

/// Multicodec varint prefix for an Ed25519 public key.
pub const ED25519_MULTICODEC: [u8; 2] = [0xed, 0x01];
/// Multicodec varint prefix for a compressed secp256k1 public key.
pub const SECP256K1_MULTICODEC: [u8; 2] = [0xe7, 0x01];

/// Signature algorithm family of a public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFamily {
    Ed25519,
    Secp256k1,
}

impl KeyFamily {
    /// Family implied by a verification method type, if it implies one.
    pub fn for_method_type(method_type: VerificationMethodType) -> Option<Self> {
        match method_type {
            VerificationMethodType::Ed25519VerificationKey2020
            | VerificationMethodType::Ed25519VerificationKey2018 => Some(Self::Ed25519),
            VerificationMethodType::EcdsaSecp256k1VerificationKey2019 => Some(Self::Secp256k1),
            VerificationMethodType::JsonWebKey2020 | VerificationMethodType::Multikey => None,
        }
    }
}

/// A decoded, validated verification key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    family: KeyFamily,
    bytes: Vec<u8>,
}

impl PublicKey {
    /// Validate raw key bytes for `family`.
    ///
    /// Ed25519 keys are 32 bytes; secp256k1 keys are SEC1, compressed or not.
    pub fn from_bytes(family: KeyFamily, bytes: &[u8]) -> Result<Self, CryptoError> {
        match family {
            KeyFamily::Ed25519 => {
                let arr: [u8; 32] =
                    bytes
                        .try_into()
                        .map_err(|_| CryptoError::InvalidKeyLength {
                            expected: 32,
                            actual: bytes.len(),
                        })?;
                ed25519_dalek::VerifyingKey::from_bytes(&arr)
                    .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
            }
            KeyFamily::Secp256k1 => {
                k256::ecdsa::VerifyingKey::from_sec1_bytes(bytes)
                    .map_err(|e| CryptoError::InvalidKey(format!("secp256k1: {e}")))?;
            }
        }
        Ok(Self {
            family,
            bytes: bytes.to_vec(),
        })
    }

    /// Decode multicodec-prefixed key bytes (`0xed01` or `0xe701`).
    pub fn from_multicodec(bytes: &[u8]) -> Result<Self, CryptoError> {
        if let Some(raw) = bytes.strip_prefix(&ED25519_MULTICODEC) {
            Self::from_bytes(KeyFamily::Ed25519, raw)
        } else if let Some(raw) = bytes.strip_prefix(&SECP256K1_MULTICODEC) {
            Self::from_bytes(KeyFamily::Secp256k1, raw)
        } else {
            Err(CryptoError::InvalidKey(format!(
                "unknown multicodec prefix {}",
                hex::encode(bytes.get(..2).unwrap_or(bytes))
            )))
        }
    }

    pub fn family(&self) -> KeyFamily {
        self.family
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Multicodec-prefixed bytes, secp256k1 keys compressed.
    pub fn to_multicodec(&self) -> Result<Vec<u8>, CryptoError> {
        let (prefix, raw) = match self.family {
            KeyFamily::Ed25519 => (ED25519_MULTICODEC, self.bytes.clone()),
            KeyFamily::Secp256k1 => {
                let key = k256::ecdsa::VerifyingKey::from_sec1_bytes(&self.bytes)
                    .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
                (
                    SECP256K1_MULTICODEC,
                    key.to_encoded_point(true).as_bytes().to_vec(),
                )
            }
        };
        let mut out = prefix.to_vec();
        out.extend_from_slice(&raw);
        Ok(out)
    }

    /// base58btc multibase of the multicodec bytes (`z6Mk...`, `zQ3s...`).
    pub fn to_multibase(&self) -> Result<String, CryptoError> {
        Ok(multibase::encode(
            multibase::Base::Base58Btc,
            self.to_multicodec()?,
        ))
    }

    pub(crate) fn ed25519(&self) -> Result<ed25519_dalek::VerifyingKey, CryptoError> {
        let arr: [u8; 32] = self
            .bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: 32,
                actual: self.bytes.len(),
            })?;
        ed25519_dalek::VerifyingKey::from_bytes(&arr).map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }

    pub(crate) fn secp256k1(&self) -> Result<k256::ecdsa::VerifyingKey, CryptoError> {
        k256::ecdsa::VerifyingKey::from_sec1_bytes(&self.bytes)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }
}

/// Decode the key carried by a verification method.
///
/// Exactly the populated key-material variant is decoded. The method type
/// must name a known family, and the decoded key must belong to it.
pub fn decode_verification_method(vm: &VerificationMethod) -> Result<PublicKey, CryptoError> {
    let method_type: VerificationMethodType = vm
        .method_type
        .parse()
        .map_err(|_| CryptoError::UnsupportedKeyType(vm.method_type.clone()))?;
    let expected = KeyFamily::for_method_type(method_type);

    let material = vm
        .key_material
        .as_ref()
        .ok_or_else(|| CryptoError::UnsupportedKeyMaterial(vm.id.clone()))?;

    let key = match material {
        KeyMaterial::Base58(encoded) => {
            let family = expected.ok_or_else(|| {
                CryptoError::UnsupportedKeyMaterial(format!(
                    "{} ({} cannot use publicKeyBase58)",
                    vm.id, method_type
                ))
            })?;
            let bytes = bs58::decode(encoded)
                .into_vec()
                .map_err(|e| CryptoError::InvalidKey(format!("base58: {e}")))?;
            PublicKey::from_bytes(family, &bytes)?
        }
        KeyMaterial::Multibase(encoded) => decode_multibase(encoded, expected)?,
        KeyMaterial::Jwk(jwk) => decode_jwk(jwk)?,
    };

    if let Some(family) = expected {
        if key.family() != family {
            return Err(CryptoError::InvalidKey(format!(
                "{} declares {} but carries a {:?} key",
                vm.id, method_type, key.family()
            )));
        }
    }

    tracing::trace!(vm = %vm.id, family = ?key.family(), encoding = material.field_name(), "decoded verification key");
    Ok(key)
}

fn decode_multibase(encoded: &str, expected: Option<KeyFamily>) -> Result<PublicKey, CryptoError> {
    let (_, bytes) =
        multibase::decode(encoded).map_err(|e| CryptoError::InvalidKey(format!("multibase: {e}")))?;
    if let Some(family) = expected.filter(|f| is_raw_key_length(*f, bytes.len())) {
        return PublicKey::from_bytes(family, &bytes);
    }
    if bytes.starts_with(&ED25519_MULTICODEC) || bytes.starts_with(&SECP256K1_MULTICODEC) {
        return PublicKey::from_multicodec(&bytes);
    }
    match expected {
        Some(family) => PublicKey::from_bytes(family, &bytes),
        None => Err(CryptoError::InvalidKey(
            "multibase key without multicodec prefix".into(),
        )),
    }
}

fn is_raw_key_length(family: KeyFamily, len: usize) -> bool {
    match family {
        KeyFamily::Ed25519 => len == 32,
        KeyFamily::Secp256k1 => len == 33 || len == 65,
    }
}

/// Decode an `OKP/Ed25519` or `EC/secp256k1` public JWK.
pub fn decode_jwk(jwk: &Map<String, Value>) -> Result<PublicKey, CryptoError> {
    let member = |name: &str| -> Result<Vec<u8>, CryptoError> {
        let value = jwk
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| CryptoError::InvalidKey(format!("JWK is missing \"{name}\"")))?;
        URL_SAFE_NO_PAD
            .decode(value)
            .map_err(|e| CryptoError::InvalidKey(format!("JWK \"{name}\": {e}")))
    };

    let kty = jwk.get("kty").and_then(Value::as_str).unwrap_or_default();
    let crv = jwk.get("crv").and_then(Value::as_str).unwrap_or_default();

    match (kty, crv) {
        ("OKP", "Ed25519") => PublicKey::from_bytes(KeyFamily::Ed25519, &member("x")?),
        ("EC", "secp256k1") => {
            let x = member("x")?;
            let y = member("y")?;
            if x.len() != 32 || y.len() != 32 {
                return Err(CryptoError::InvalidKey(
                    "secp256k1 JWK coordinates must be 32 bytes".into(),
                ));
            }
            let mut sec1 = Vec::with_capacity(65);
            sec1.push(0x04);
            sec1.extend_from_slice(&x);
            sec1.extend_from_slice(&y);
            PublicKey::from_bytes(KeyFamily::Secp256k1, &sec1)
        }
        _ => Err(CryptoError::UnsupportedKeyType(format!(
            "JWK kty={kty} crv={crv}"
        ))),
    }
}
