//! `$filter` fragment construction, ported from
//! `original_source/mcp_outlook/graph_mail_url.py`'s `FilterBuilder`.

use outlook_core::domain::{FilterParams, ListCombine, OneOrMany};

/// Doubles embedded single quotes per OData string literal escaping.
fn odata_quote(value: &str) -> String {
    value.replace('\'', "''")
}

fn combine_terms(terms: &[String], combine: ListCombine) -> Option<String> {
    if terms.is_empty() {
        return None;
    }
    let joiner = match combine {
        ListCombine::Or => " or ",
        ListCombine::And => " and ",
    };
    let joined = terms.join(joiner);
    Some(if terms.len() > 1 {
        format!("({joined})")
    } else {
        joined
    })
}

fn one_or_many_terms(value: &OneOrMany, make_term: impl Fn(&str) -> String) -> Vec<String> {
    value.as_slice_owned().iter().map(|v| make_term(v)).collect()
}

/// Builds the `$filter` query fragment for a [`FilterParams`]. Returns an
/// empty string if no predicates are set, matching the source's
/// `FilterBuilder.build()` empty-list behavior.
pub fn build_filter(params: &FilterParams) -> String {
    let mut clauses = Vec::new();

    if let Some(is_read) = params.is_read {
        clauses.push(format!("isRead eq {is_read}"));
    }
    if let Some(has_attachments) = params.has_attachments {
        clauses.push(format!("hasAttachments eq {has_attachments}"));
    }
    if let Some(importance) = params.importance {
        clauses.push(format!("importance eq '{}'", importance.as_graph_str()));
    }
    if let Some(from_address) = &params.from_address {
        let terms = one_or_many_terms(from_address, |email| {
            format!("from/emailAddress/address eq '{}'", odata_quote(email))
        });
        if let Some(clause) = combine_terms(&terms, ListCombine::Or) {
            clauses.push(clause);
        }
    }
    if let Some(sender_address) = &params.sender_address {
        let terms = one_or_many_terms(sender_address, |email| {
            format!("sender/emailAddress/address eq '{}'", odata_quote(email))
        });
        if let Some(clause) = combine_terms(&terms, ListCombine::Or) {
            clauses.push(clause);
        }
    }
    if let Some(subject) = &params.subject {
        let terms = one_or_many_terms(subject, |text| {
            format!("contains(subject,'{}')", odata_quote(text))
        });
        if let Some(clause) = combine_terms(&terms, params.subject_combine) {
            clauses.push(clause);
        }
    }
    if let Some(body_content) = &params.body_content {
        let terms = one_or_many_terms(body_content, |text| {
            format!("contains(body/content,'{}')", odata_quote(text))
        });
        if let Some(clause) = combine_terms(&terms, params.body_content_combine) {
            clauses.push(clause);
        }
    }
    if let Some(body_preview) = &params.body_preview {
        let terms = one_or_many_terms(body_preview, |text| {
            format!("contains(bodyPreview,'{}')", odata_quote(text))
        });
        if let Some(clause) = combine_terms(&terms, params.body_preview_combine) {
            clauses.push(clause);
        }
    }
    if let Some(at_or_after) = params.received_date.at_or_after {
        clauses.push(format!("receivedDateTime ge {}", at_or_after.to_rfc3339()));
    }
    if let Some(from) = params.received_date.from {
        clauses.push(format!("receivedDateTime ge {}", from.to_rfc3339()));
    }
    if let Some(to) = params.received_date.to {
        clauses.push(format!("receivedDateTime le {}", to.to_rfc3339()));
    }
    if let Some(at_or_after) = params.sent_date.at_or_after {
        clauses.push(format!("sentDateTime ge {}", at_or_after.to_rfc3339()));
    }
    if let Some(from) = params.sent_date.from {
        clauses.push(format!("sentDateTime ge {}", from.to_rfc3339()));
    }
    if let Some(to) = params.sent_date.to {
        clauses.push(format!("sentDateTime le {}", to.to_rfc3339()));
    }
    if let Some(at_or_after) = params.created_date.at_or_after {
        clauses.push(format!("createdDateTime ge {}", at_or_after.to_rfc3339()));
    }
    if let Some(from) = params.created_date.from {
        clauses.push(format!("createdDateTime ge {}", from.to_rfc3339()));
    }
    if let Some(to) = params.created_date.to {
        clauses.push(format!("createdDateTime le {}", to.to_rfc3339()));
    }
    if let Some(categories) = &params.categories {
        let terms: Vec<String> = categories
            .iter()
            .map(|c| format!("categories/any(c:c eq '{}')", odata_quote(c)))
            .collect();
        if let Some(clause) = combine_terms(&terms, ListCombine::Or) {
            clauses.push(clause);
        }
    }
    if let Some(flag_status) = &params.flag_status {
        clauses.push(format!("flag/flagStatus eq '{}'", odata_quote(flag_status)));
    }
    if let Some(id) = &params.id_equals {
        clauses.push(format!("id eq '{}'", odata_quote(id)));
    }
    if let Some(conversation_id) = &params.conversation_id {
        clauses.push(format!("conversationId eq '{}'", odata_quote(conversation_id)));
    }
    if let Some(parent_folder_id) = &params.parent_folder_id {
        clauses.push(format!("parentFolderId eq '{}'", odata_quote(parent_folder_id)));
    }
    if let Some(raw) = &params.raw {
        clauses.push(raw.clone());
    }

    clauses.join(" and ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use outlook_core::domain::Importance;

    #[test]
    fn empty_params_build_empty_filter() {
        assert_eq!(build_filter(&FilterParams::default()), "");
    }

    #[test]
    fn single_predicate_has_no_parens() {
        let mut params = FilterParams::default();
        params.is_read = Some(false);
        assert_eq!(build_filter(&params), "isRead eq false");
    }

    #[test]
    fn multiple_subjects_or_combine_wraps_in_parens() {
        let mut params = FilterParams::default();
        params.subject = Some(OneOrMany::Many(vec!["foo".into(), "bar".into()]));
        assert_eq!(
            build_filter(&params),
            "(contains(subject,'foo') or contains(subject,'bar'))"
        );
    }

    #[test]
    fn subject_and_combine_joins_with_and() {
        let mut params = FilterParams::default();
        params.subject = Some(OneOrMany::Many(vec!["foo".into(), "bar".into()]));
        params.subject_combine = ListCombine::And;
        assert_eq!(
            build_filter(&params),
            "(contains(subject,'foo') and contains(subject,'bar'))"
        );
    }

    #[test]
    fn multiple_predicates_join_with_and() {
        let mut params = FilterParams::default();
        params.is_read = Some(false);
        params.importance = Some(Importance::High);
        assert_eq!(build_filter(&params), "isRead eq false and importance eq 'high'");
    }

    #[test]
    fn embedded_quote_is_escaped() {
        let mut params = FilterParams::default();
        params.subject = Some(OneOrMany::One("O'Brien".into()));
        assert_eq!(build_filter(&params), "contains(subject,'O''Brien')");
    }
}
