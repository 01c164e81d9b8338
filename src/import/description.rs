//! License descriptions: template render/parse, fragments and accumulation.
//!
//! A description is an HTML page whose body holds the accumulated
//! fragments, one per line. The page around the body is opaque; only the
//! body markers are interpreted.

use crate::db::{Gateway, now_timestamp};
use crate::error::{ImportError, ImportResult};
use crate::import::row::SourceRow;
use crate::types::License;
use tracing::info;

const BODY_OPEN: &str = r#"<body class="ck-content">"#;
const BODY_CLOSE: &str = "</body>";

const PAGE_HEAD: &str = r#"
<!DOCTYPE html>
<html>
<head>
    <meta http-equiv="Content-Type" content="text/html; charset=utf-8"/>
    <style></style>
</head>
"#;

const PAGE_TAIL: &str = "\n</html>\n";

/// Wrapper page around the fragment body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionTemplate {
    head: String,
    open: String,
    close: String,
    tail: String,
}

impl Default for DescriptionTemplate {
    fn default() -> Self {
        Self::new(PAGE_HEAD, BODY_OPEN, BODY_CLOSE, PAGE_TAIL)
    }
}

impl DescriptionTemplate {
    pub fn new(head: &str, open: &str, close: &str, tail: &str) -> Self {
        Self {
            head: head.to_string(),
            open: open.to_string(),
            close: close.to_string(),
            tail: tail.to_string(),
        }
    }

    /// Wrap body content in the page.
    pub fn render(&self, body: &str) -> String {
        let mut page = String::with_capacity(
            self.head.len() + self.open.len() + body.len() + self.close.len() + self.tail.len(),
        );
        page.push_str(&self.head);
        page.push_str(&self.open);
        page.push_str(body);
        page.push_str(&self.close);
        page.push_str(&self.tail);
        page
    }

    /// Extract the body content: everything between the first opening marker
    /// and the last closing marker.
    ///
    /// Fragments are not escaped, so the body itself may contain either
    /// marker; only the page tail is known not to.
    pub fn parse<'a>(&self, license: &str, page: &'a str) -> ImportResult<&'a str> {
        let start = page
            .find(&self.open)
            .map(|i| i + self.open.len())
            .ok_or_else(|| self.mismatch(license, &self.open))?;
        let end = page
            .rfind(&self.close)
            .filter(|&end| end >= start)
            .ok_or_else(|| self.mismatch(license, &self.close))?;
        Ok(&page[start..end])
    }

    fn mismatch(&self, license: &str, marker: &str) -> ImportError {
        ImportError::TemplateMismatch {
            license: license.to_string(),
            marker: marker.to_string(),
        }
    }
}

/// Build the fragment a License row contributes.
///
/// The key is only written when it differs from `last_seen_key`, which is
/// then updated; quantity and user are written whenever present.
pub fn build_fragment(row: &SourceRow, last_seen_key: &mut Option<String>) -> String {
    let mut fragment = String::from("<p>");
    if let Some(ref key) = row.key {
        if last_seen_key.as_deref() != Some(key.as_str()) {
            *last_seen_key = Some(key.clone());
            fragment.push_str(key);
            fragment.push_str("<br>");
        }
    }
    if let Some(ref quantity) = row.quantity {
        fragment.push_str(" Quantity ");
        fragment.push_str(quantity);
    }
    if let Some(ref user) = row.user {
        fragment.push_str(" User: ");
        fragment.push_str(user);
    }
    fragment.push_str("</p>");
    fragment
}

/// Appends fragments to the description of the License in scope.
pub struct DescriptionAccumulator<'a, G: Gateway + ?Sized> {
    gateway: &'a G,
    template: &'a DescriptionTemplate,
}

impl<'a, G: Gateway + ?Sized> DescriptionAccumulator<'a, G> {
    pub fn new(gateway: &'a G, template: &'a DescriptionTemplate) -> Self {
        Self { gateway, template }
    }

    /// Append `fragment` on a new line, re-wrap, persist and update `license`.
    pub fn append(&self, license: &mut License, fragment: &str) -> ImportResult<()> {
        let body = self.template.parse(&license.sequence_number, &license.description)?;
        let description = self.template.render(&format!("{}\n{}", body, fragment));
        let changed_at = now_timestamp();

        self.gateway
            .update_description(license, &description, changed_at)?;
        info!(license = %license.sequence_number, fragment, "Appended description fragment");

        license.description = description;
        license.changed_at = changed_at;
        Ok(())
    }
}
