//! Client-side application of [`ExcludeParams`] over fetched message pages
//! (§4.4.4: exclusion predicates are applied per page after retrieval rather
//! than folded into the server-side `$filter`, since Graph's `ne`/`not` OData
//! support for nested properties like `from/emailAddress/address` is
//! inconsistent across mailbox backends).

use outlook_core::domain::ExcludeParams;
use serde_json::Value;

fn text_field<'a>(message: &'a Value, pointer: &str) -> Option<&'a str> {
    message.pointer(pointer).and_then(Value::as_str)
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn matches_any(values: &[String], predicate: impl Fn(&str) -> bool) -> bool {
    values.iter().any(|v| predicate(v))
}

/// Returns `true` if `message` should be dropped because it matches one of
/// `exclude`'s predicates.
fn is_excluded(message: &Value, exclude: &ExcludeParams) -> bool {
    if let Some(addresses) = &exclude.exclude_from_address {
        if let Some(address) = text_field(message, "/from/emailAddress/address") {
            if matches_any(&addresses.as_slice_owned(), |v| v.eq_ignore_ascii_case(address)) {
                return true;
            }
        }
    }
    if let Some(addresses) = &exclude.exclude_sender_address {
        if let Some(address) = text_field(message, "/sender/emailAddress/address") {
            if matches_any(&addresses.as_slice_owned(), |v| v.eq_ignore_ascii_case(address)) {
                return true;
            }
        }
    }
    if let Some(subjects) = &exclude.exclude_subject {
        if let Some(subject) = text_field(message, "/subject") {
            if matches_any(&subjects.as_slice_owned(), |v| contains_ci(subject, v)) {
                return true;
            }
        }
    }
    if let Some(fragments) = &exclude.exclude_body_content {
        if let Some(content) = text_field(message, "/body/content") {
            if matches_any(&fragments.as_slice_owned(), |v| contains_ci(content, v)) {
                return true;
            }
        }
    }
    if let Some(fragments) = &exclude.exclude_body_preview {
        if let Some(preview) = text_field(message, "/bodyPreview") {
            if matches_any(&fragments.as_slice_owned(), |v| contains_ci(preview, v)) {
                return true;
            }
        }
    }
    if let Some(importance) = exclude.exclude_importance {
        if text_field(message, "/importance") == Some(importance.as_graph_str()) {
            return true;
        }
    }
    if let Some(sensitivity) = &exclude.exclude_sensitivity {
        if text_field(message, "/sensitivity") == Some(sensitivity.as_str()) {
            return true;
        }
    }
    if let Some(classification) = &exclude.exclude_classification {
        if text_field(message, "/inferenceClassification") == Some(classification.as_str()) {
            return true;
        }
    }
    if let Some(is_read) = exclude.exclude_is_read {
        if message.pointer("/isRead").and_then(Value::as_bool) == Some(is_read) {
            return true;
        }
    }
    if let Some(is_draft) = exclude.exclude_is_draft {
        if message.pointer("/isDraft").and_then(Value::as_bool) == Some(is_draft) {
            return true;
        }
    }
    if let Some(has_attachments) = exclude.exclude_has_attachments {
        if message.pointer("/hasAttachments").and_then(Value::as_bool) == Some(has_attachments) {
            return true;
        }
    }
    if let Some(flag) = exclude.exclude_is_delivery_receipt_requested {
        if message
            .pointer("/isDeliveryReceiptRequested")
            .and_then(Value::as_bool)
            == Some(flag)
        {
            return true;
        }
    }
    if let Some(flag) = exclude.exclude_is_read_receipt_requested {
        if message.pointer("/isReadReceiptRequested").and_then(Value::as_bool) == Some(flag) {
            return true;
        }
    }
    if let Some(categories) = &exclude.exclude_categories {
        if let Some(message_categories) = message.pointer("/categories").and_then(Value::as_array) {
            let message_categories: Vec<&str> = message_categories.iter().filter_map(Value::as_str).collect();
            if categories.iter().any(|c| message_categories.contains(&c.as_str())) {
                return true;
            }
        }
    }
    if let Some(id) = &exclude.exclude_id {
        if text_field(message, "/id") == Some(id.as_str()) {
            return true;
        }
    }

    false
}

/// Drops every message matching `exclude` from `messages`, preserving order
/// of survivors.
pub fn apply_exclude(messages: Vec<Value>, exclude: &ExcludeParams) -> Vec<Value> {
    if exclude.is_empty() {
        return messages;
    }
    messages.into_iter().filter(|m| !is_excluded(m, exclude)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use outlook_core::domain::OneOrMany;
    use serde_json::json;

    #[test]
    fn no_predicates_keeps_everything() {
        let messages = vec![json!({"subject": "hello"})];
        let out = apply_exclude(messages.clone(), &ExcludeParams::default());
        assert_eq!(out, messages);
    }

    #[test]
    fn excludes_by_subject_substring_case_insensitively() {
        let mut exclude = ExcludeParams::default();
        exclude.exclude_subject = Some(OneOrMany::One("NEWSLETTER".into()));
        let messages = vec![json!({"subject": "Weekly Newsletter"}), json!({"subject": "Invoice"})];
        let out = apply_exclude(messages, &exclude);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["subject"], "Invoice");
    }

    #[test]
    fn excludes_by_sender_address() {
        let mut exclude = ExcludeParams::default();
        exclude.exclude_from_address = Some(OneOrMany::One("spam@example.com".into()));
        let messages = vec![
            json!({"from": {"emailAddress": {"address": "spam@example.com"}}}),
            json!({"from": {"emailAddress": {"address": "boss@example.com"}}}),
        ];
        let out = apply_exclude(messages, &exclude);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn excludes_by_has_attachments_flag() {
        let mut exclude = ExcludeParams::default();
        exclude.exclude_has_attachments = Some(true);
        let messages = vec![json!({"hasAttachments": true}), json!({"hasAttachments": false})];
        let out = apply_exclude(messages, &exclude);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["hasAttachments"], false);
    }
}
