//! `$search` (KQL) term construction, ported from `graph_mail_url.py`'s
//! `SearchBuilder`.

/// Fluent builder for a Graph `$search` KQL query string. Unlike
/// [`crate::filter::build_filter`], terms are free-text KQL fragments joined
/// by spaces rather than OData boolean operators.
#[derive(Debug, Clone, Default)]
pub struct SearchBuilder {
    terms: Vec<String>,
}

fn kql_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "'"))
}

impl SearchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyword(mut self, text: impl Into<String>) -> Self {
        self.terms.push(kql_quote(&text.into()));
        self
    }

    pub fn from_sender(mut self, address: impl Into<String>) -> Self {
        self.terms.push(format!("from:{}", address.into()));
        self
    }

    pub fn to_recipient(mut self, address: impl Into<String>) -> Self {
        self.terms.push(format!("to:{}", address.into()));
        self
    }

    pub fn subject(mut self, text: impl Into<String>) -> Self {
        self.terms.push(format!("subject:{}", kql_quote(&text.into())));
        self
    }

    pub fn body(mut self, text: impl Into<String>) -> Self {
        self.terms.push(format!("body:{}", kql_quote(&text.into())));
        self
    }

    pub fn attachment_name(mut self, text: impl Into<String>) -> Self {
        self.terms.push(format!("attachment:{}", kql_quote(&text.into())));
        self
    }

    pub fn has_attachment(mut self, value: bool) -> Self {
        self.terms.push(format!("hasattachments:{value}"));
        self
    }

    pub fn add_raw(mut self, term: impl Into<String>) -> Self {
        self.terms.push(term.into());
        self
    }

    pub fn build(&self) -> String {
        self.terms.join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
