/// Arweave JWK wallet signer
///
/// Implements RSA-PSS (SHA-256, 32 byte salt) signing of ANS-104 data items
/// with a 4096 bit Arweave keyfile.
use crate::{
    error::{UploadError, UploadResult},
    wallet::{
        data_item::{PreparedItem, SignedDataItem, UnsignedDataItem, ARWEAVE_OWNER_LENGTH},
        DataItemSigner,
    },
};
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rsa::{
    pss::{BlindedSigningKey, Signature},
    signature::{RandomizedSigner, SignatureEncoding},
    BigUint, RsaPrivateKey,
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Arweave keyfile contents
#[derive(Debug, Clone, Deserialize)]
pub struct ArweaveJwk {
    pub kty: String,
    pub n: String,
    pub e: String,
    pub d: String,
    pub p: String,
    pub q: String,
}

/// Wallet signer backed by an Arweave JWK
pub struct ArweaveJwkSigner {
    signing_key: BlindedSigningKey<Sha256>,
    owner: Vec<u8>,
    address: String,
}

impl ArweaveJwkSigner {
    /// Load a keyfile from disk
    pub async fn from_keyfile(path: &Path) -> UploadResult<Self> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            UploadError::Wallet(format!("Failed to read keyfile {}: {}", path.display(), e))
        })?;
        let jwk: ArweaveJwk = serde_json::from_str(&contents)
            .map_err(|e| UploadError::Wallet(format!("Invalid keyfile: {}", e)))?;
        Self::from_jwk(&jwk)
    }

    pub fn from_jwk(jwk: &ArweaveJwk) -> UploadResult<Self> {
        if jwk.kty != "RSA" {
            return Err(UploadError::Wallet(format!("Unsupported key type: {}", jwk.kty)));
        }

        let n = decode_component("n", &jwk.n)?;
        let key = RsaPrivateKey::from_components(
            BigUint::from_bytes_be(&n),
            BigUint::from_bytes_be(&decode_component("e", &jwk.e)?),
            BigUint::from_bytes_be(&decode_component("d", &jwk.d)?),
            vec![
                BigUint::from_bytes_be(&decode_component("p", &jwk.p)?),
                BigUint::from_bytes_be(&decode_component("q", &jwk.q)?),
            ],
        )
        .map_err(|e| UploadError::Wallet(format!("Invalid RSA key: {}", e)))?;

        let owner = left_pad(&n, ARWEAVE_OWNER_LENGTH)?;

        Ok(Self {
            signing_key: BlindedSigningKey::<Sha256>::new(key),
            address: wallet_address(&n),
            owner,
        })
    }
}

#[async_trait]
impl DataItemSigner for ArweaveJwkSigner {
    fn owner_address(&self) -> String {
        self.address.clone()
    }

    async fn sign_data_item(&self, item: UnsignedDataItem) -> UploadResult<SignedDataItem> {
        let prepared = PreparedItem::new(self.owner.clone(), item)?;
        let message = prepared.signature_data();
        let signature: Signature = self
            .signing_key
            .try_sign_with_rng(&mut rand::thread_rng(), &message)
            .map_err(|e| UploadError::Signing(format!("RSA-PSS signing failed: {}", e)))?;
        let signature = left_pad(&signature.to_bytes(), ARWEAVE_OWNER_LENGTH)?;
        prepared.into_signed(signature)
    }
}

/// Address derived from the raw RSA modulus
pub fn wallet_address(modulus: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(modulus))
}

fn decode_component(name: &str, value: &str) -> UploadResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(value.trim_end_matches('=').as_bytes())
        .map_err(|e| UploadError::Wallet(format!("Invalid JWK component {}: {}", name, e)))
}

fn left_pad(bytes: &[u8], len: usize) -> UploadResult<Vec<u8>> {
    if bytes.len() > len {
        return Err(UploadError::Wallet(format!(
            "Key material is {} bytes, expected at most {}",
            bytes.len(),
            len
        )));
    }
    let mut out = vec![0u8; len - bytes.len()];
    out.extend_from_slice(bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{tags::Tag, wallet::data_item::ARWEAVE_SIGNATURE_TYPE};
    use rsa::{
        pss::VerifyingKey,
        signature::Verifier,
        traits::{PrivateKeyParts, PublicKeyParts},
        RsaPublicKey,
    };

    fn encode(value: &BigUint) -> String {
        URL_SAFE_NO_PAD.encode(value.to_bytes_be())
    }

    #[tokio::test]
    async fn test_signs_items_verifiable_with_the_public_key() {
        let key = RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        let primes = key.primes();
        let jwk = ArweaveJwk {
            kty: "RSA".to_string(),
            n: encode(key.n()),
            e: encode(key.e()),
            d: encode(key.d()),
            p: encode(&primes[0]),
            q: encode(&primes[1]),
        };
        let signer = ArweaveJwkSigner::from_jwk(&jwk).unwrap();
        assert_eq!(signer.owner_address(), wallet_address(&key.n().to_bytes_be()));

        let item = UnsignedDataItem {
            target: None,
            anchor: Some(vec![7u8; 32]),
            tags: vec![Tag::new("Content-Type", "text/plain")],
            data: b"hello".to_vec(),
        };
        let owner = left_pad(&key.n().to_bytes_be(), ARWEAVE_OWNER_LENGTH).unwrap();
        let message = PreparedItem::new(owner, item.clone()).unwrap().signature_data();

        let signed = signer.sign_data_item(item).await.unwrap();
        let signature_field = &signed.raw[2..2 + ARWEAVE_OWNER_LENGTH];

        // a 2048 bit signature sits right-aligned in the 512 byte field
        let padding = ARWEAVE_OWNER_LENGTH - key.size();
        assert!(signature_field[..padding].iter().all(|b| *b == 0));
        let signature = Signature::try_from(&signature_field[padding..]).unwrap();
        let verifying_key = VerifyingKey::<Sha256>::new(RsaPublicKey::from(&key));
        verifying_key.verify(&message, &signature).unwrap();

        assert_eq!(signed.id, URL_SAFE_NO_PAD.encode(Sha256::digest(signature_field)));
        assert_eq!(signed.raw[..2], ARWEAVE_SIGNATURE_TYPE.to_le_bytes());
    }

    #[test]
    fn test_left_pad() {
        assert_eq!(left_pad(&[1, 2], 4).unwrap(), vec![0, 0, 1, 2]);
        assert!(left_pad(&[1, 2, 3], 2).is_err());
    }

    #[test]
    fn test_wallet_address_is_base64url_sha256() {
        let address = wallet_address(b"modulus");
        assert_eq!(address.len(), 43);
        assert!(!address.contains('='));
    }

    #[test]
    fn test_rejects_non_rsa_keys() {
        let jwk = ArweaveJwk {
            kty: "EC".to_string(),
            n: String::new(),
            e: String::new(),
            d: String::new(),
            p: String::new(),
            q: String::new(),
        };
        assert!(matches!(ArweaveJwkSigner::from_jwk(&jwk), Err(UploadError::Wallet(_))));
    }
}
