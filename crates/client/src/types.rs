use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub pdf_id: String,
    pub total_pages: u32,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfInfo {
    pub pdf_id: String,
    pub filename: String,
    pub total_pages: u32,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub message: String,
    #[serde(default)]
    pub version: Option<String>,
    pub status: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PageType {
    Title,
    #[default]
    Content,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPoint {
    pub concept: String,
    pub explanation: String,
    #[serde(default)]
    pub is_important: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PageContent {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<KeyPoint>,
    #[serde(default)]
    pub analogy: String,
    #[serde(default)]
    pub example: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageExplanation {
    pub page_number: u32,
    #[serde(default)]
    pub page_type: PageType,
    pub content: PageContent,
    #[serde(default = "default_language")]
    pub original_language: String,
}

fn default_language() -> String {
    "mixed".to_string()
}

impl PageExplanation {
    /// Plain-text rendering used by the explanation panel.
    pub fn to_display_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        match self.page_type {
            PageType::Title => lines.push("[title page]".to_string()),
            PageType::End => lines.push("[closing page]".to_string()),
            PageType::Content => {}
        }
        if !self.content.summary.is_empty() {
            lines.push(self.content.summary.clone());
            lines.push(String::new());
        }
        for point in &self.content.key_points {
            let marker = if point.is_important { "*" } else { "-" };
            lines.push(format!("{marker} {}: {}", point.concept, point.explanation));
        }
        if !self.content.analogy.is_empty() {
            lines.push(String::new());
            lines.push(format!("Analogy: {}", self.content.analogy));
        }
        if !self.content.example.is_empty() {
            lines.push(format!("Example: {}", self.content.example));
        }
        lines
    }
}

/// Credentials forwarded to the backend when the user supplied their own key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explanation_defaults_missing_fields() {
        let json = r#"{"page_number": 3, "content": {"summary": "Sorting"}}"#;
        let explanation: PageExplanation = serde_json::from_str(json).expect("parse");
        assert_eq!(explanation.page_type, PageType::Content);
        assert_eq!(explanation.original_language, "mixed");
        assert!(explanation.content.key_points.is_empty());
    }

    #[test]
    fn page_type_uses_uppercase_wire_names() {
        let parsed: PageType = serde_json::from_str("\"TITLE\"").expect("parse");
        assert_eq!(parsed, PageType::Title);
    }

    #[test]
    fn display_lines_mark_important_points() {
        let explanation = PageExplanation {
            page_number: 1,
            page_type: PageType::Content,
            content: PageContent {
                summary: "Heaps".to_string(),
                key_points: vec![
                    KeyPoint {
                        concept: "Heap property".to_string(),
                        explanation: "parent <= children".to_string(),
                        is_important: true,
                    },
                    KeyPoint {
                        concept: "Array layout".to_string(),
                        explanation: "children at 2i+1, 2i+2".to_string(),
                        is_important: false,
                    },
                ],
                analogy: String::new(),
                example: String::new(),
            },
            original_language: "en".to_string(),
        };
        let lines = explanation.to_display_lines();
        assert_eq!(lines[0], "Heaps");
        assert_eq!(lines[2], "* Heap property: parent <= children");
        assert_eq!(lines[3], "- Array layout: children at 2i+1, 2i+2");
    }

    #[test]
    fn upload_response_ignores_absent_message() {
        let json = r#"{"pdf_id": "abc", "total_pages": 12, "filename": "lec1.pdf"}"#;
        let response: UploadResponse = serde_json::from_str(json).expect("parse");
        assert_eq!(response.total_pages, 12);
        assert!(response.message.is_none());
    }
}
