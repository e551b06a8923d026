/// Per-asset titles and tag sets
use crate::{
    tags::{keys, values, Tag},
    upload::{License, UploadContentItem, UploadSessionState, UploadType},
};

/// Item override, else the session title with a 1-based ordinal, else the
/// file name
pub fn resolve_title(item: &UploadContentItem, session: &UploadSessionState, ordinal: usize) -> String {
    if let Some(title) = item.title.as_deref().filter(|t| !t.is_empty()) {
        return title.to_string();
    }
    match session.data.title.as_deref().filter(|t| !t.is_empty()) {
        Some(title) => format!("{} #{}", title, ordinal),
        None => item.file_name(),
    }
}

/// Item override, else the session description, else the file name
pub fn resolve_description(item: &UploadContentItem, session: &UploadSessionState) -> String {
    item.description
        .as_deref()
        .filter(|d| !d.is_empty())
        .or_else(|| session.data.description.as_deref().filter(|d| !d.is_empty()))
        .map(String::from)
        .unwrap_or_else(|| item.file_name())
}

/// Tags attached to a spawned asset process
pub fn asset_tags(
    session: &UploadSessionState,
    content_type: &str,
    title: &str,
    description: &str,
    date_created: &str,
) -> Vec<Tag> {
    let mut tags = vec![
        Tag::new(keys::CONTENT_TYPE, content_type),
        Tag::new(keys::TITLE, title),
        Tag::new(keys::DESCRIPTION, description),
        Tag::new(keys::TYPE, content_type),
        Tag::new(keys::IMPLEMENTS, values::ANS_VERSION),
        Tag::new(keys::DATE_CREATED, date_created),
    ];

    for topic in &session.data.topics {
        tags.push(Tag::new(keys::topic(topic), topic.as_str()));
    }

    if session.data.has_license {
        if let Some(license) = &session.data.license {
            tags.extend(license_tags(license));
        }
    }

    if session.upload_type == UploadType::Collection {
        if let Some(code) = session.data.collection_code.as_deref().filter(|c| !c.is_empty()) {
            tags.push(Tag::new(keys::COLLECTION_CODE, code));
        }
    }

    tags
}

fn with_amount(value: &str, amount: Option<&str>) -> String {
    match amount {
        Some(amount) => format!("{}-{}", value, amount),
        None => value.to_string(),
    }
}

/// Universal Data License tags
pub fn license_tags(license: &License) -> Vec<Tag> {
    let mut tags = vec![Tag::new(keys::LICENSE, values::LICENSE)];

    if let Some(fee) = license.access_fee.as_ref().filter(|f| !f.value.is_empty()) {
        let value = if fee.value != "None" {
            with_amount(&fee.value, fee.amount.as_deref())
        } else {
            fee.value.clone()
        };
        tags.push(Tag::new(keys::ACCESS_FEE, value));
    }

    let termed = [
        (keys::DERIVATIONS, &license.derivations),
        (keys::COMMERCIAL_USE, &license.commercial_use),
        (keys::DATA_MODEL_TRAINING, &license.data_model_training),
    ];
    for (name, option) in termed {
        if let Some(option) = option.as_ref().filter(|o| !o.value.is_empty()) {
            let value = match (&option.terms, option.value.as_str()) {
                (_, "Disallowed") | (None, _) => option.value.clone(),
                (Some(terms), _) => format!(
                    "{}-{}",
                    option.value,
                    with_amount(&terms.value, terms.amount.as_deref())
                ),
            };
            tags.push(Tag::new(name, value));
        }
    }

    if let Some(mode) = &license.payment_mode {
        if !mode.value.is_empty() {
            tags.push(Tag::new(keys::PAYMENT_MODE, mode.value.as_str()));
        }
        if let Some(recipient) = mode.recipient.as_deref().filter(|r| !r.is_empty()) {
            tags.push(Tag::new(keys::PAYMENT_ADDRESS, recipient));
        }
    }

    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::tag_value;
    use crate::upload::{LicenseAmount, LicenseTerms, PaymentMode, UploadData};

    fn session(title: Option<&str>) -> UploadSessionState {
        UploadSessionState::new(
            UploadType::Assets,
            UploadData {
                title: title.map(String::from),
                topics: vec!["art".to_string(), "music".to_string()],
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_title_ordinal_from_session_title() {
        let session = session(Some("T"));
        let items: Vec<UploadContentItem> = (1..=3)
            .map(|i| UploadContentItem::new(format!("/tmp/file{}.png", i)))
            .collect();
        assert_eq!(resolve_title(&items[1], &session, 2), "T #2");
    }

    #[test]
    fn test_title_override_and_file_name_fallback() {
        let mut item = UploadContentItem::new("/tmp/photo.jpg");
        assert_eq!(resolve_title(&item, &session(None), 1), "photo.jpg");

        item.title = Some("Custom".to_string());
        assert_eq!(resolve_title(&item, &session(Some("T")), 1), "Custom");
    }

    #[test]
    fn test_description_fallbacks() {
        let item = UploadContentItem::new("/tmp/photo.jpg");
        let mut session = session(None);
        assert_eq!(resolve_description(&item, &session), "photo.jpg");

        session.data.description = Some("Shared".to_string());
        assert_eq!(resolve_description(&item, &session), "Shared");
    }

    #[test]
    fn test_asset_tags_include_topics() {
        let tags = asset_tags(&session(Some("T")), "image/png", "T #1", "desc", "1700000000000");
        assert_eq!(tag_value(&tags, "Content-Type"), Some("image/png"));
        assert_eq!(tag_value(&tags, "Type"), Some("image/png"));
        assert_eq!(tag_value(&tags, "Implements"), Some("ANS-110"));
        assert_eq!(tag_value(&tags, "Topic:art"), Some("art"));
        assert_eq!(tag_value(&tags, "Topic:music"), Some("music"));
        assert_eq!(tag_value(&tags, "License"), None);
    }

    #[test]
    fn test_collection_code_only_in_collection_mode() {
        let mut session = session(Some("T"));
        session.data.collection_code = Some("code-1".to_string());
        let tags = asset_tags(&session, "image/png", "t", "d", "0");
        assert_eq!(tag_value(&tags, "Collection-Code"), None);

        let session = session.with_upload_type(UploadType::Collection);
        let tags = asset_tags(&session, "image/png", "t", "d", "0");
        assert_eq!(tag_value(&tags, "Collection-Code"), Some("code-1"));
    }

    #[test]
    fn test_license_tag_encoding() {
        let license = License {
            access_fee: Some(LicenseAmount {
                value: "One-Time".to_string(),
                amount: Some("0.1".to_string()),
            }),
            derivations: Some(LicenseTerms {
                value: "Allowed".to_string(),
                terms: Some(LicenseAmount {
                    value: "Revenue-Share".to_string(),
                    amount: Some("5".to_string()),
                }),
            }),
            commercial_use: Some(LicenseTerms {
                value: "Disallowed".to_string(),
                terms: None,
            }),
            data_model_training: None,
            payment_mode: Some(PaymentMode {
                value: "Single".to_string(),
                recipient: Some("wallet".to_string()),
            }),
        };
        let tags = license_tags(&license);
        assert_eq!(tag_value(&tags, "License"), Some(values::LICENSE));
        assert_eq!(tag_value(&tags, "Access-Fee"), Some("One-Time-0.1"));
        assert_eq!(tag_value(&tags, "Derivations"), Some("Allowed-Revenue-Share-5"));
        assert_eq!(tag_value(&tags, "Commercial-Use"), Some("Disallowed"));
        assert_eq!(tag_value(&tags, "Data-Model-Training"), None);
        assert_eq!(tag_value(&tags, "Payment-Mode"), Some("Single"));
        assert_eq!(tag_value(&tags, "Payment-Address"), Some("wallet"));
    }

    #[test]
    fn test_license_requires_flag() {
        let mut session = session(Some("T"));
        session.data.license = Some(License::default());
        let tags = asset_tags(&session, "image/png", "t", "d", "0");
        assert_eq!(tag_value(&tags, "License"), None);

        session.data.has_license = true;
        let tags = asset_tags(&session, "image/png", "t", "d", "0");
        assert_eq!(tag_value(&tags, "License"), Some(values::LICENSE));
    }
}
