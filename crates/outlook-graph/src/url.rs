//! `GraphMailUrlBuilder` — assembles Graph v1.0 mail endpoint URLs, ported
//! from `graph_mail_url.py`'s `GraphMailUrlBuilder` class.

use serde_json::{json, Value};

use outlook_core::domain::SelectParams;

pub const BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Graph's hard cap on `$top` for `$search` queries (§4.4.2).
pub const SEARCH_TOP_CEILING: u32 = 250;

pub struct GraphMailUrlBuilder {
    base_url: String,
}

impl Default for GraphMailUrlBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphMailUrlBuilder {
    pub fn new() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
        }
    }

    /// Overridable for tests, pointing at a wiremock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn messages_url(&self, user_email: &str) -> String {
        format!("{}/users/{}/messages", self.base_url, urlencoding::encode(user_email))
    }

    pub fn message_url(&self, user_email: &str, message_id: &str) -> String {
        format!("{}/{}", self.messages_url(user_email), urlencoding::encode(message_id))
    }

    pub fn attachments_url(&self, user_email: &str, message_id: &str) -> String {
        format!("{}/attachments", self.message_url(user_email, message_id))
    }

    pub fn attachment_url(&self, user_email: &str, message_id: &str, attachment_id: &str) -> String {
        format!(
            "{}/{}",
            self.attachments_url(user_email, message_id),
            urlencoding::encode(attachment_id)
        )
    }

    /// Builds a `$filter`-query URL with optional `$select`/`$orderby`/
    /// `$top`/`$skip`.
    pub fn build_filter_url(
        &self,
        user_email: &str,
        filter_query: &str,
        select: &SelectParams,
        order_by: Option<&str>,
        top: Option<u32>,
        skip: Option<u32>,
    ) -> String {
        let mut params: Vec<(String, String)> = Vec::new();
        if !filter_query.is_empty() {
            params.push(("$filter".to_string(), filter_query.to_string()));
        }
        if !select.is_empty() {
            params.push(("$select".to_string(), select.to_select_query()));
        }
        if let Some(order_by) = order_by {
            params.push(("$orderby".to_string(), order_by.to_string()));
        }
        if let Some(top) = top {
            params.push(("$top".to_string(), top.to_string()));
        }
        if let Some(skip) = skip {
            params.push(("$skip".to_string(), skip.to_string()));
        }
        build_url(&self.messages_url(user_email), &params)
    }

    /// Builds a `$search`-query URL, clamping `top` to
    /// [`SEARCH_TOP_CEILING`] per §4.4.2.
    pub fn build_search_url(
        &self,
        user_email: &str,
        search_query: &str,
        select: &SelectParams,
        top: Option<u32>,
    ) -> String {
        let mut params: Vec<(String, String)> = vec![("$search".to_string(), format!("\"{search_query}\""))];
        if !select.is_empty() {
            params.push(("$select".to_string(), select.to_select_query()));
        }
        let top = top.unwrap_or(SEARCH_TOP_CEILING).min(SEARCH_TOP_CEILING);
        params.push(("$top".to_string(), top.to_string()));
        build_url(&self.messages_url(user_email), &params)
    }

    pub fn build_message_get_url(&self, user_email: &str, message_id: &str, select: &SelectParams) -> String {
        let mut params: Vec<(String, String)> = Vec::new();
        if !select.is_empty() {
            params.push(("$select".to_string(), select.to_select_query()));
        }
        build_url(&self.message_url(user_email, message_id), &params)
    }

    /// Builds `$batch` sub-request objects for a `POST {base}/$batch` call.
    /// Graph caps a single batch at 20 sub-requests (§4.4.3); callers are
    /// responsible for chunking `message_ids` beforehand.
    pub fn build_batch_request(&self, user_email: &str, message_ids: &[String], select: &SelectParams) -> Value {
        let requests: Vec<Value> = message_ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let mut params: Vec<(String, String)> = Vec::new();
                if !select.is_empty() {
                    params.push(("$select".to_string(), select.to_select_query()));
                }
                let relative = build_url(&format!("/users/{}/messages/{}", user_email, id), &params);
                json!({
                    "id": (i + 1).to_string(),
                    "method": "GET",
                    "url": relative,
                })
            })
            .collect();
        json!({ "requests": requests })
    }
}

fn build_url(base: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return base.to_string();
    }
    let query: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect();
    format!("{base}?{}", query.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use outlook_core::domain::SelectField;

    #[test]
    fn messages_url_encodes_user_email() {
        let builder = GraphMailUrlBuilder::new();
        assert_eq!(
            builder.messages_url("user@example.com"),
            format!("{BASE_URL}/users/user%40example.com/messages")
        );
    }

    #[test]
    fn filter_url_includes_filter_and_select() {
        let builder = GraphMailUrlBuilder::new();
        let select = SelectParams::new().with(SelectField::Subject).with(SelectField::Id);
        let url = builder.build_filter_url("user@example.com", "isRead eq false", &select, None, Some(25), None);
        assert!(url.contains("%24filter=isRead%20eq%20false"));
        assert!(url.contains("%24select=id%2Csubject"));
        assert!(url.contains("%24top=25"));
    }

    #[test]
    fn search_url_clamps_top_to_ceiling() {
        let builder = GraphMailUrlBuilder::new();
        let url = builder.build_search_url("user@example.com", "invoice", &SelectParams::new(), Some(1000));
        assert!(url.contains("%24top=250"));
    }

    #[test]
    fn batch_request_numbers_ids_from_one() {
        let builder = GraphMailUrlBuilder::new();
        let batch = builder.build_batch_request(
            "user@example.com",
            &["id-a".to_string(), "id-b".to_string()],
            &SelectParams::new(),
        );
        let requests = batch["requests"].as_array().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0]["id"], "1");
        assert_eq!(requests[1]["id"], "2");
        assert_eq!(requests[0]["method"], "GET");
    }
}
