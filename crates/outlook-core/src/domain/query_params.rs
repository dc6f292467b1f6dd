//! `FilterParams` / `ExcludeParams` / `SelectParams` — structured query
//! intent value objects (§3, §4.4.1, §4.4.4, §8).
//!
//! These are modeled as tagged records with explicit optional fields per the
//! §9 Design Notes strategy for "polymorphic parameter bags" — no mapping
//! semantics are exposed beyond the read-only iteration helpers each type
//! provides for code that needs to walk known field names.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a list-valued predicate combines its members (default `Or`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListCombine {
    #[default]
    Or,
    And,
}

/// Either a single string value or a list of them; lists OR/AND-combine
/// depending on the owning field's [`ListCombine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn as_slice_owned(&self) -> Vec<String> {
        match self {
            OneOrMany::One(v) => vec![v.clone()],
            OneOrMany::Many(v) => v.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            OneOrMany::One(v) => v.is_empty(),
            OneOrMany::Many(v) => v.is_empty(),
        }
    }
}

/// A single endpoint date or an inclusive `from`/`to` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateConstraint {
    /// Implicit `ge` when set alone.
    pub at_or_after: Option<DateTime<Utc>>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateConstraint {
    pub fn is_empty(&self) -> bool {
        self.at_or_after.is_none() && self.from.is_none() && self.to.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    Normal,
    High,
}

impl Importance {
    pub fn as_graph_str(self) -> &'static str {
        match self {
            Importance::Low => "low",
            Importance::Normal => "normal",
            Importance::High => "high",
        }
    }
}

/// Server-side inclusion predicates, serialized to an OData `$filter`
/// fragment by `outlook-graph`'s `FilterBuilder`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterParams {
    pub is_read: Option<bool>,
    pub has_attachments: Option<bool>,
    pub importance: Option<Importance>,
    pub from_address: Option<OneOrMany>,
    pub sender_address: Option<OneOrMany>,
    pub subject: Option<OneOrMany>,
    #[serde(default)]
    pub subject_combine: ListCombine,
    pub body_content: Option<OneOrMany>,
    #[serde(default)]
    pub body_content_combine: ListCombine,
    pub body_preview: Option<OneOrMany>,
    #[serde(default)]
    pub body_preview_combine: ListCombine,
    #[serde(default)]
    pub received_date: DateConstraint,
    #[serde(default)]
    pub sent_date: DateConstraint,
    #[serde(default)]
    pub created_date: DateConstraint,
    pub categories: Option<Vec<String>>,
    pub flag_status: Option<String>,
    pub id_equals: Option<String>,
    pub conversation_id: Option<String>,
    pub parent_folder_id: Option<String>,
    /// Caller-supplied raw `$filter` fragment, AND-joined with the rest.
    pub raw: Option<String>,
}

impl FilterParams {
    pub fn is_empty(&self) -> bool {
        self.is_read.is_none()
            && self.has_attachments.is_none()
            && self.importance.is_none()
            && self.from_address.is_none()
            && self.sender_address.is_none()
            && self.subject.is_none()
            && self.body_content.is_none()
            && self.body_preview.is_none()
            && self.received_date.is_empty()
            && self.sent_date.is_empty()
            && self.created_date.is_empty()
            && self.categories.is_none()
            && self.flag_status.is_none()
            && self.id_equals.is_none()
            && self.conversation_id.is_none()
            && self.parent_folder_id.is_none()
            && self.raw.is_none()
    }
}

/// Exclusion predicates, applicable both server-side (`ne`/`not contains`
/// OData fragments) and client-side (post-filter over fetched pages).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeParams {
    pub exclude_from_address: Option<OneOrMany>,
    pub exclude_sender_address: Option<OneOrMany>,
    pub exclude_subject: Option<OneOrMany>,
    pub exclude_body_content: Option<OneOrMany>,
    pub exclude_body_preview: Option<OneOrMany>,
    pub exclude_importance: Option<Importance>,
    pub exclude_sensitivity: Option<String>,
    pub exclude_classification: Option<String>,
    pub exclude_is_read: Option<bool>,
    pub exclude_is_draft: Option<bool>,
    pub exclude_has_attachments: Option<bool>,
    pub exclude_is_delivery_receipt_requested: Option<bool>,
    pub exclude_is_read_receipt_requested: Option<bool>,
    pub exclude_categories: Option<Vec<String>>,
    pub exclude_id: Option<String>,
}

impl ExcludeParams {
    pub fn is_empty(&self) -> bool {
        self.exclude_from_address.is_none()
            && self.exclude_sender_address.is_none()
            && self.exclude_subject.is_none()
            && self.exclude_body_content.is_none()
            && self.exclude_body_preview.is_none()
            && self.exclude_importance.is_none()
            && self.exclude_sensitivity.is_none()
            && self.exclude_classification.is_none()
            && self.exclude_is_read.is_none()
            && self.exclude_is_draft.is_none()
            && self.exclude_has_attachments.is_none()
            && self.exclude_is_delivery_receipt_requested.is_none()
            && self.exclude_is_read_receipt_requested.is_none()
            && self.exclude_categories.is_none()
            && self.exclude_id.is_none()
    }
}

/// One projectable Graph message field. The `snake_case` variant name maps
/// to a fixed Graph camelCase field name via [`SelectField::graph_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectField {
    Id,
    Subject,
    Body,
    BodyPreview,
    From,
    Sender,
    ToRecipients,
    CcRecipients,
    BccRecipients,
    ReplyTo,
    ReceivedDateTime,
    SentDateTime,
    CreatedDateTime,
    LastModifiedDateTime,
    HasAttachments,
    Importance,
    IsRead,
    IsDraft,
    ConversationId,
    ParentFolderId,
    Categories,
    Flag,
    InternetMessageId,
    InternetMessageHeaders,
    UniqueBody,
    WebLink,
    InferenceClassification,
    ChangeKey,
    ConversationIndex,
    IsDeliveryReceiptRequested,
    IsReadReceiptRequested,
}

impl SelectField {
    /// The fixed snake_case -> Graph camelCase mapping from §3.
    ///
    /// `from_recipient` is the one flag whose snake_case name diverges from
    /// its Graph field (`from`); it is handled by [`SelectParams::from_recipient`]
    /// rather than as a distinct enum variant, since it denotes the same
    /// underlying field as [`SelectField::From`].
    pub fn graph_name(self) -> &'static str {
        match self {
            SelectField::Id => "id",
            SelectField::Subject => "subject",
            SelectField::Body => "body",
            SelectField::BodyPreview => "bodyPreview",
            SelectField::From => "from",
            SelectField::Sender => "sender",
            SelectField::ToRecipients => "toRecipients",
            SelectField::CcRecipients => "ccRecipients",
            SelectField::BccRecipients => "bccRecipients",
            SelectField::ReplyTo => "replyTo",
            SelectField::ReceivedDateTime => "receivedDateTime",
            SelectField::SentDateTime => "sentDateTime",
            SelectField::CreatedDateTime => "createdDateTime",
            SelectField::LastModifiedDateTime => "lastModifiedDateTime",
            SelectField::HasAttachments => "hasAttachments",
            SelectField::Importance => "importance",
            SelectField::IsRead => "isRead",
            SelectField::IsDraft => "isDraft",
            SelectField::ConversationId => "conversationId",
            SelectField::ParentFolderId => "parentFolderId",
            SelectField::Categories => "categories",
            SelectField::Flag => "flag",
            SelectField::InternetMessageId => "internetMessageId",
            SelectField::InternetMessageHeaders => "internetMessageHeaders",
            SelectField::UniqueBody => "uniqueBody",
            SelectField::WebLink => "webLink",
            SelectField::InferenceClassification => "inferenceClassification",
            SelectField::ChangeKey => "changeKey",
            SelectField::ConversationIndex => "conversationIndex",
            SelectField::IsDeliveryReceiptRequested => "isDeliveryReceiptRequested",
            SelectField::IsReadReceiptRequested => "isReadReceiptRequested",
        }
    }
}

/// A set of boolean field flags projecting into Graph `$select` field names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectParams(BTreeSet<SelectField>);

impl SelectParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: SelectField) -> Self {
        self.0.insert(field);
        self
    }

    /// Convenience alias: `from_recipient` sets the same underlying Graph
    /// field as [`SelectField::From`] (see §3: "`from_recipient` -> `from`").
    pub fn from_recipient(self) -> Self {
        self.with(SelectField::From)
    }

    pub fn fields(&self) -> impl Iterator<Item = SelectField> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Deterministic, comma-joined Graph field name list (BTreeSet ordering
    /// makes repeated calls byte-identical, satisfying §8's determinism
    /// property).
    pub fn to_select_query(&self) -> String {
        self.0
            .iter()
            .map(|f| f.graph_name())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_params_serialization_is_deterministic() {
        let a = SelectParams::new()
            .with(SelectField::Subject)
            .with(SelectField::Id)
            .with(SelectField::From);
        let b = SelectParams::new()
            .with(SelectField::From)
            .with(SelectField::Id)
            .with(SelectField::Subject);
        assert_eq!(a.to_select_query(), b.to_select_query());
        assert_eq!(a.to_select_query(), "id,subject,from");
    }

    #[test]
    fn from_recipient_maps_to_from_field() {
        let select = SelectParams::new().from_recipient();
        assert_eq!(select.to_select_query(), "from");
    }

    #[test]
    fn one_or_many_flattens_single_value() {
        let one = OneOrMany::One("a@example.com".into());
        assert_eq!(one.as_slice_owned(), vec!["a@example.com".to_string()]);
    }

    #[test]
    fn filter_params_is_empty_true_for_default() {
        assert!(FilterParams::default().is_empty());
    }

    #[test]
    fn filter_params_is_empty_false_when_set() {
        let mut params = FilterParams::default();
        params.is_read = Some(false);
        assert!(!params.is_empty());
    }
}
