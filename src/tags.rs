/// Arweave tag names, well-known values and tag set builders
use serde::{Deserialize, Serialize};

/// A single name/value tag attached to a transaction or data item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Tag names
pub mod keys {
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const TITLE: &str = "Title";
    pub const DESCRIPTION: &str = "Description";
    pub const TYPE: &str = "Type";
    pub const IMPLEMENTS: &str = "Implements";
    pub const DATE_CREATED: &str = "Date-Created";
    pub const LICENSE: &str = "License";
    pub const COLLECTION_CODE: &str = "Collection-Code";
    pub const INIT_STATE: &str = "Init-State";
    pub const CREATOR: &str = "Creator";
    pub const PROFILE_CREATOR: &str = "Profile-Creator";
    pub const DATA_PROTOCOL: &str = "Data-Protocol";
    pub const NAME: &str = "Name";
    pub const BANNER: &str = "Banner";
    pub const THUMBNAIL: &str = "Thumbnail";
    pub const ACTION: &str = "Action";
    pub const ACCESS_FEE: &str = "Access-Fee";
    pub const DERIVATIONS: &str = "Derivations";
    pub const COMMERCIAL_USE: &str = "Commercial-Use";
    pub const DATA_MODEL_TRAINING: &str = "Data-Model-Training";
    pub const PAYMENT_MODE: &str = "Payment-Mode";
    pub const PAYMENT_ADDRESS: &str = "Payment-Address";

    /// Per-topic tag name, e.g. `Topic:music`
    pub fn topic(topic: &str) -> String {
        format!("Topic:{}", topic)
    }
}

/// Well-known tag values
pub mod values {
    pub const ANS_VERSION: &str = "ANS-110";
    pub const COLLECTION: &str = "Collection";
    pub const DOCUMENT: &str = "Document";
    /// Universal Data License transaction
    pub const LICENSE: &str = "dE0rmDfl9_OWjkDznNEXHaSO_JohJkRolvMzaCroUdw";
    pub const JSON: &str = "application/json";
    pub const EVAL: &str = "Eval";
    pub const ADD_UPLOADED_ASSET: &str = "Add-Uploaded-Asset";
}

/// Look up the first tag value by name
pub fn tag_value<'a>(tags: &'a [Tag], name: &str) -> Option<&'a str> {
    tags.iter().find(|t| t.name == name).map(|t| t.value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_value_returns_first_match() {
        let tags = vec![
            Tag::new("Title", "first"),
            Tag::new("Title", "second"),
            Tag::new("Type", "image/png"),
        ];
        assert_eq!(tag_value(&tags, "Title"), Some("first"));
        assert_eq!(tag_value(&tags, "Missing"), None);
    }

    #[test]
    fn test_topic_key() {
        assert_eq!(keys::topic("art"), "Topic:art");
    }
}
