use crate::errors::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Label attached to every submission; downstream tooling queries on it.
pub const PENDING_LABEL: &str = "capture/pending";

/// Number of characters of the title source kept after the prefix.
const TITLE_SOURCE_LIMIT: usize = 50;

/// An accepted payload enriched with its freshly minted capture id.
///
/// Captures live for one request only. The id is generated here and exists
/// nowhere else until the issue embedding it is created upstream.
pub struct Capture {
    id: Uuid,
    value: Value,
}

impl Capture {
    /// Merges a fresh capture id into the inbound payload.
    ///
    /// Top-level fields are kept verbatim and in order; the `capture_id` key
    /// is written last, so an inbound field of the same name is overwritten.
    pub fn new(mut payload: Map<String, Value>) -> Self {
        let id = Uuid::new_v4();
        payload.insert("capture_id".to_string(), Value::String(id.to_string()));
        Self {
            id,
            value: Value::Object(payload),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The nested `<section>.description` field, when it is a string.
    fn description(&self, section: &str) -> Option<&str> {
        self.value.get(section)?.get("description")?.as_str()
    }

    /// Renders the issue sent to the tracker.
    ///
    /// The title is the first 50 characters of `problem.description` when the
    /// field is present (an empty string counts as present), falling back to
    /// the capture id. The body lists the non-empty description sections and
    /// embeds the full capture as pretty-printed JSON; sections are joined
    /// with blank lines and absent sections leave no separator behind.
    pub fn to_submission(&self) -> Result<IssueSubmission> {
        let title_source = match self.description("problem") {
            Some(description) => truncate_chars(description, TITLE_SOURCE_LIMIT).to_string(),
            None => self.id.to_string(),
        };

        let mut sections = Vec::new();
        for label in ["problem", "solution"] {
            if let Some(description) = self.description(label)
                && !description.is_empty()
            {
                sections.push(format!("**{label}:** {description}"));
            }
        }
        sections.push("```json".to_string());
        sections.push(serde_json::to_string_pretty(&self.value)?);
        sections.push("```".to_string());

        Ok(IssueSubmission {
            title: format!("[capture] {title_source}"),
            body: sections.join("\n\n"),
            labels: vec![PENDING_LABEL.to_string()],
        })
    }
}

/// The title/body/labels object posted to the issue tracker.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IssueSubmission {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

/// Truncates on a character boundary, never splitting a multibyte scalar.
fn truncate_chars(s: &str, limit: usize) -> &str {
    match s.char_indices().nth(limit) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
