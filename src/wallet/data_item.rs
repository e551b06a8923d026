/// ANS-104 data item encoding
///
/// Layout of a signed item:
/// `sig_type(u16 LE) | signature | owner | target? | anchor? | tag_count(u64 LE)
///  | tag_bytes_len(u64 LE) | avro(tags) | data`
use crate::{
    error::{UploadError, UploadResult},
    tags::Tag,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use sha2::{Digest, Sha256, Sha384};

/// Arweave (RSA-PSS 4096) signature type
pub const ARWEAVE_SIGNATURE_TYPE: u16 = 1;
pub const ARWEAVE_SIGNATURE_LENGTH: usize = 512;
pub const ARWEAVE_OWNER_LENGTH: usize = 512;

const MAX_TAGS: usize = 128;
const MAX_TAG_NAME_BYTES: usize = 1024;
const MAX_TAG_VALUE_BYTES: usize = 3072;

/// Data item fields prior to signing
#[derive(Debug, Clone, Default)]
pub struct UnsignedDataItem {
    /// Base64url id of the target process or wallet
    pub target: Option<String>,
    /// 32 byte anchor
    pub anchor: Option<Vec<u8>>,
    pub tags: Vec<Tag>,
    pub data: Vec<u8>,
}

/// Fully encoded, signed data item
#[derive(Debug, Clone)]
pub struct SignedDataItem {
    pub id: String,
    pub raw: Vec<u8>,
}

/// Fields in their binary form, ready to hash and serialize
pub(crate) struct PreparedItem {
    pub owner: Vec<u8>,
    pub target: Option<Vec<u8>>,
    pub anchor: Option<Vec<u8>>,
    pub tags: Vec<u8>,
    pub tag_count: usize,
    pub data: Vec<u8>,
}

impl PreparedItem {
    pub fn new(owner: Vec<u8>, item: UnsignedDataItem) -> UploadResult<Self> {
        if owner.len() != ARWEAVE_OWNER_LENGTH {
            return Err(UploadError::Signing(format!(
                "Owner must be {} bytes, got {}",
                ARWEAVE_OWNER_LENGTH,
                owner.len()
            )));
        }

        let target = match item.target {
            Some(target) => {
                let bytes = URL_SAFE_NO_PAD
                    .decode(target.as_bytes())
                    .map_err(|e| UploadError::Signing(format!("Invalid target {}: {}", target, e)))?;
                if bytes.len() != 32 {
                    return Err(UploadError::Signing(format!("Target {} is not 32 bytes", target)));
                }
                Some(bytes)
            }
            None => None,
        };

        if let Some(anchor) = &item.anchor {
            if anchor.len() != 32 {
                return Err(UploadError::Signing("Anchor must be 32 bytes".to_string()));
            }
        }

        let tags = encode_tags(&item.tags)?;

        Ok(Self {
            owner,
            target,
            anchor: item.anchor,
            tags,
            tag_count: item.tags.len(),
            data: item.data,
        })
    }

    /// Message that gets signed
    pub fn signature_data(&self) -> Vec<u8> {
        let sig_type = ARWEAVE_SIGNATURE_TYPE.to_string();
        deep_hash(&DeepHashChunk::List(vec![
            DeepHashChunk::Blob(b"dataitem"),
            DeepHashChunk::Blob(b"1"),
            DeepHashChunk::Blob(sig_type.as_bytes()),
            DeepHashChunk::Blob(&self.owner),
            DeepHashChunk::Blob(self.target.as_deref().unwrap_or(&[])),
            DeepHashChunk::Blob(self.anchor.as_deref().unwrap_or(&[])),
            DeepHashChunk::Blob(&self.tags),
            DeepHashChunk::Blob(&self.data),
        ]))
        .to_vec()
    }

    /// Serialize with the given signature
    pub fn into_signed(self, signature: Vec<u8>) -> UploadResult<SignedDataItem> {
        if signature.len() != ARWEAVE_SIGNATURE_LENGTH {
            return Err(UploadError::Signing(format!(
                "Signature must be {} bytes, got {}",
                ARWEAVE_SIGNATURE_LENGTH,
                signature.len()
            )));
        }

        let id = URL_SAFE_NO_PAD.encode(Sha256::digest(&signature));

        let mut raw = Vec::with_capacity(
            2 + signature.len() + self.owner.len() + 66 + 16 + self.tags.len() + self.data.len(),
        );
        raw.extend_from_slice(&ARWEAVE_SIGNATURE_TYPE.to_le_bytes());
        raw.extend_from_slice(&signature);
        raw.extend_from_slice(&self.owner);
        push_optional(&mut raw, self.target.as_deref());
        push_optional(&mut raw, self.anchor.as_deref());
        raw.extend_from_slice(&(self.tag_count as u64).to_le_bytes());
        raw.extend_from_slice(&(self.tags.len() as u64).to_le_bytes());
        raw.extend_from_slice(&self.tags);
        raw.extend_from_slice(&self.data);

        Ok(SignedDataItem { id, raw })
    }
}

fn push_optional(raw: &mut Vec<u8>, field: Option<&[u8]>) {
    match field {
        Some(bytes) => {
            raw.push(1);
            raw.extend_from_slice(bytes);
        }
        None => raw.push(0),
    }
}

/// Avro-encode tags as an array of `{name: bytes, value: bytes}` records
pub fn encode_tags(tags: &[Tag]) -> UploadResult<Vec<u8>> {
    if tags.is_empty() {
        return Ok(Vec::new());
    }
    if tags.len() > MAX_TAGS {
        return Err(UploadError::Signing(format!("Too many tags: {}", tags.len())));
    }

    let mut out = Vec::new();
    write_long(&mut out, tags.len() as i64);
    for tag in tags {
        if tag.name.is_empty() || tag.name.len() > MAX_TAG_NAME_BYTES {
            return Err(UploadError::Signing(format!("Invalid tag name length: {}", tag.name.len())));
        }
        if tag.value.is_empty() || tag.value.len() > MAX_TAG_VALUE_BYTES {
            return Err(UploadError::Signing(format!(
                "Invalid value length for tag {}: {}",
                tag.name,
                tag.value.len()
            )));
        }
        write_bytes(&mut out, tag.name.as_bytes());
        write_bytes(&mut out, tag.value.as_bytes());
    }
    write_long(&mut out, 0);
    Ok(out)
}

fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    write_long(out, bytes.len() as i64);
    out.extend_from_slice(bytes);
}

/// Zigzag varint
fn write_long(out: &mut Vec<u8>, value: i64) {
    let mut n = ((value << 1) ^ (value >> 63)) as u64;
    while n & !0x7f != 0 {
        out.push(((n & 0x7f) | 0x80) as u8);
        n >>= 7;
    }
    out.push(n as u8);
}

pub(crate) enum DeepHashChunk<'a> {
    Blob(&'a [u8]),
    List(Vec<DeepHashChunk<'a>>),
}

/// Arweave deep hash (SHA-384)
pub(crate) fn deep_hash(chunk: &DeepHashChunk<'_>) -> [u8; 48] {
    match chunk {
        DeepHashChunk::Blob(data) => {
            let tag = sha384(&[format!("blob{}", data.len()).as_bytes()]);
            let body = sha384(&[*data]);
            sha384(&[tag.as_slice(), body.as_slice()])
        }
        DeepHashChunk::List(items) => {
            let mut acc = sha384(&[format!("list{}", items.len()).as_bytes()]);
            for item in items {
                let child = deep_hash(item);
                acc = sha384(&[acc.as_slice(), child.as_slice()]);
            }
            acc
        }
    }
}

fn sha384(parts: &[&[u8]]) -> [u8; 48] {
    let mut hasher = Sha384::new();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; 48];
    out.copy_from_slice(&hasher.finalize());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tags_encode_to_nothing() {
        assert!(encode_tags(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_tag_avro_layout() {
        let encoded = encode_tags(&[Tag::new("a", "bc")]).unwrap();
        // count=1 -> 2, len 1 -> 2, 'a', len 2 -> 4, 'b','c', terminator 0
        assert_eq!(encoded, vec![2, 2, b'a', 4, b'b', b'c', 0]);
    }

    #[test]
    fn test_zigzag_multibyte() {
        let mut out = Vec::new();
        write_long(&mut out, 64);
        assert_eq!(out, vec![0x80, 0x01]);
    }

    #[test]
    fn test_empty_tag_value_rejected() {
        assert!(encode_tags(&[Tag::new("Title", "")]).is_err());
    }

    #[test]
    fn test_signed_layout_and_id() {
        let item = UnsignedDataItem {
            target: None,
            anchor: Some(vec![7u8; 32]),
            tags: vec![Tag::new("Type", "Message")],
            data: b"hello".to_vec(),
        };
        let prepared = PreparedItem::new(vec![1u8; ARWEAVE_OWNER_LENGTH], item).unwrap();
        let signature = vec![9u8; ARWEAVE_SIGNATURE_LENGTH];
        let signed = prepared.into_signed(signature.clone()).unwrap();

        assert_eq!(&signed.raw[0..2], &[1, 0]);
        assert_eq!(&signed.raw[2..514], signature.as_slice());
        // no target, then anchor present
        assert_eq!(signed.raw[1026], 0);
        assert_eq!(signed.raw[1027], 1);
        assert!(signed.raw.ends_with(b"hello"));
        assert_eq!(signed.id, URL_SAFE_NO_PAD.encode(Sha256::digest(&signature)));
    }

    #[test]
    fn test_short_owner_rejected() {
        let result = PreparedItem::new(vec![0u8; 10], UnsignedDataItem::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_deep_hash_distinguishes_structure() {
        let flat = deep_hash(&DeepHashChunk::Blob(b"ab"));
        let nested = deep_hash(&DeepHashChunk::List(vec![DeepHashChunk::Blob(b"ab")]));
        assert_ne!(flat, nested);
    }
}
