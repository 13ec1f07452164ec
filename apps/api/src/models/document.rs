use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Which side of a match an uploaded document sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    Cv,
    Jd,
}

impl DocKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocKind::Cv => "cv",
            DocKind::Jd => "jd",
        }
    }

    /// Top-level folder in the object bucket.
    pub fn folder(&self) -> &'static str {
        match self {
            DocKind::Cv => "cvs",
            DocKind::Jd => "jds",
        }
    }
}

impl fmt::Display for DocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of categories a document can be filed under.
/// `Other` is the fallback for any failed or unrecognized categorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Software Engineering")]
    SoftwareEngineering,
    #[serde(rename = "Artificial Intelligence / Machine Learning")]
    ArtificialIntelligence,
    #[serde(rename = "Cybersecurity")]
    Cybersecurity,
    #[serde(rename = "Sales & Marketing")]
    SalesMarketing,
    #[serde(rename = "Finance & Accounting")]
    FinanceAccounting,
    #[serde(rename = "Human Resources")]
    HumanResources,
    #[serde(rename = "Operations & Logistics")]
    OperationsLogistics,
    #[serde(rename = "Healthcare")]
    Healthcare,
    #[serde(rename = "Legal")]
    Legal,
    #[serde(rename = "Design & Creative")]
    DesignCreative,
    #[serde(rename = "Data Science")]
    DataScience,
    #[serde(rename = "Product Management")]
    ProductManagement,
    #[serde(rename = "Other")]
    Other,
}

impl Category {
    pub const ALL: [Category; 13] = [
        Category::SoftwareEngineering,
        Category::ArtificialIntelligence,
        Category::Cybersecurity,
        Category::SalesMarketing,
        Category::FinanceAccounting,
        Category::HumanResources,
        Category::OperationsLogistics,
        Category::Healthcare,
        Category::Legal,
        Category::DesignCreative,
        Category::DataScience,
        Category::ProductManagement,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::SoftwareEngineering => "Software Engineering",
            Category::ArtificialIntelligence => "Artificial Intelligence / Machine Learning",
            Category::Cybersecurity => "Cybersecurity",
            Category::SalesMarketing => "Sales & Marketing",
            Category::FinanceAccounting => "Finance & Accounting",
            Category::HumanResources => "Human Resources",
            Category::OperationsLogistics => "Operations & Logistics",
            Category::Healthcare => "Healthcare",
            Category::Legal => "Legal",
            Category::DesignCreative => "Design & Creative",
            Category::DataScience => "Data Science",
            Category::ProductManagement => "Product Management",
            Category::Other => "Other",
        }
    }

    /// Maps a free-form model reply onto the closed set.
    ///
    /// Accepts surrounding quotes, list bullets, trailing punctuation and case
    /// differences. Anything else is `Other`.
    pub fn from_reply(reply: &str) -> Category {
        let first_line = reply.trim().lines().next().unwrap_or_default();
        let mut cleaned = first_line.trim().trim_start_matches(['-', '*', '•']);
        // Quotes and punctuation can nest in either order, e.g. `"Legal".`
        loop {
            let next = cleaned
                .trim()
                .trim_matches(['"', '\'', '`', '*'])
                .trim_end_matches(['.', '!']);
            if next == cleaned {
                break;
            }
            cleaned = next;
        }
        let cleaned = cleaned
            .strip_prefix("Category:")
            .map(str::trim)
            .unwrap_or(cleaned);

        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(cleaned))
            .unwrap_or(Category::Other)
    }

    /// Filesystem/object-key safe form, e.g. `sales-marketing`.
    pub fn slug(&self) -> String {
        let mut slug = String::new();
        for word in self
            .as_str()
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            if !slug.is_empty() {
                slug.push('-');
            }
            slug.push_str(&word.to_ascii_lowercase());
        }
        slug
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub filename: String,
    pub original_name: String,
    pub file_type: String,
    pub category: String,
    pub storage_key: String,
    pub file_size: i64,
    pub text_content: String,
    pub upload_date: DateTime<Utc>,
}

/// Client-facing document metadata. `filename` is the name the file was
/// uploaded under; the extracted text is never included.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentView {
    pub id: Uuid,
    pub filename: String,
    pub file_type: String,
    pub category: String,
    pub upload_date: DateTime<Utc>,
    pub file_size: i64,
}

impl From<DocumentRow> for DocumentView {
    fn from(row: DocumentRow) -> Self {
        DocumentView {
            id: row.id,
            filename: row.original_name,
            file_type: row.file_type,
            category: row.category,
            upload_date: row.upload_date,
            file_size: row.file_size,
        }
    }
}

/// Single-document metadata; adds where the bytes live.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentDetail {
    #[serde(flatten)]
    pub document: DocumentView,
    pub storage_key: String,
}

impl From<DocumentRow> for DocumentDetail {
    fn from(row: DocumentRow) -> Self {
        let storage_key = row.storage_key.clone();
        DocumentDetail {
            document: DocumentView::from(row),
            storage_key,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchResultRow {
    pub id: Uuid,
    pub cv_id: Uuid,
    pub jd_id: Uuid,
    pub score: i32,
    pub explanation: String,
    pub details: Value,
    pub match_date: DateTime<Utc>,
}

/// One line of match history, joined with both document names.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchHistoryRow {
    pub id: Uuid,
    pub cv_name: String,
    pub jd_name: String,
    pub score: i32,
    pub match_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CategoryCountRow {
    pub category: String,
    pub cv_count: i64,
    pub jd_count: i64,
}
