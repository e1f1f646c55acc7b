//! Criteria: structured, reviewable requirements and their lifecycle.

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CriteriaError, Result};
use crate::types::extraction::Extraction;
use crate::types::validation::ValidationVerdict;

/// Minimum criterion text length, in characters after trimming.
pub const MIN_CRITERION_LEN: usize = 10;

/// Maximum keywords kept per criterion.
pub const MAX_KEYWORDS: usize = 10;

/// Maximum requirement fragments kept per criterion.
pub const MAX_REQUIREMENTS: usize = 5;

/// Business category of a criterion.
///
/// Declaration order is significant: it breaks ties in keyword scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Technical,
    Security,
    Performance,
    Support,
    Compliance,
    Integration,
    Financial,
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Self::Technical,
        Self::Security,
        Self::Performance,
        Self::Support,
        Self::Compliance,
        Self::Integration,
        Self::Financial,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::Security => "security",
            Self::Performance => "performance",
            Self::Support => "support",
            Self::Compliance => "compliance",
            Self::Integration => "integration",
            Self::Financial => "financial",
            Self::Other => "other",
        }
    }

    /// Parse the snake_case name.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review status.
///
/// No transition graph is enforced: an explicit update may move a criterion
/// from any status to any other, including out of `Approved`/`Rejected`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Extracted,
    Pending,
    Modified,
    Approved,
    Rejected,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Self::Extracted,
        Self::Pending,
        Self::Modified,
        Self::Approved,
        Self::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Extracted => "extracted",
            Self::Pending => "pending",
            Self::Modified => "modified",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check and normalize criterion text.
///
/// Returns the trimmed text, or `InvalidCriterion` when it is shorter than
/// [`MIN_CRITERION_LEN`] characters.
pub fn validate_criterion_text(text: &str) -> Result<String> {
    let trimmed = text.trim();
    let len = trimmed.chars().count();
    if len < MIN_CRITERION_LEN {
        return Err(CriteriaError::InvalidCriterion {
            reason: format!(
                "criterion text must be at least {MIN_CRITERION_LEN} characters (got {len})"
            ),
        });
    }
    Ok(trimmed.to_string())
}

/// A structured requirement derived from one extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: Uuid,
    pub extraction_id: Uuid,
    pub document_id: Uuid,

    /// Trimmed, at least [`MIN_CRITERION_LEN`] characters
    pub text: String,

    pub category: Category,
    pub priority: Priority,
    pub status: Status,

    /// Free-form pointer back to the source (e.g. `Document <id>`)
    pub source_reference: String,

    /// Deduplicated, at most [`MAX_KEYWORDS`]
    pub keywords: Vec<String>,

    /// At most [`MAX_REQUIREMENTS`]
    pub requirements: Vec<String>,

    /// Latest research verdict, if validated
    pub validation: Option<ValidationVerdict>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub reviewed_by: Option<String>,
    pub review_notes: Option<String>,
}

impl Criterion {
    /// Create a criterion for an extraction. Fails on too-short text.
    pub fn new(extraction: &Extraction, text: &str) -> Result<Self> {
        let text = validate_criterion_text(text)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(),
            extraction_id: extraction.id,
            document_id: extraction.document_id,
            text,
            category: Category::Other,
            priority: Priority::default(),
            status: Status::default(),
            source_reference: String::new(),
            keywords: Vec::new(),
            requirements: Vec::new(),
            validation: None,
            created_at: now,
            updated_at: now,
            reviewed_by: None,
            review_notes: None,
        })
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_source_reference(mut self, reference: impl Into<String>) -> Self {
        self.source_reference = reference.into();
        self
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = dedup_capped(keywords, MAX_KEYWORDS);
        self
    }

    pub fn with_requirements(mut self, mut requirements: Vec<String>) -> Self {
        requirements.truncate(MAX_REQUIREMENTS);
        self.requirements = requirements;
        self
    }

    /// Merge a partial update, stamping `updated_at` and the reviewer.
    ///
    /// Text is validated before anything changes, so a rejected update
    /// leaves the criterion untouched.
    pub fn apply(&mut self, update: CriterionUpdate, reviewer: Option<&str>) -> Result<()> {
        let text = update
            .text
            .as_deref()
            .map(validate_criterion_text)
            .transpose()?;

        if let Some(text) = text {
            self.text = text;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(keywords) = update.keywords {
            self.keywords = dedup_capped(keywords, MAX_KEYWORDS);
        }
        if let Some(mut requirements) = update.requirements {
            requirements.truncate(MAX_REQUIREMENTS);
            self.requirements = requirements;
        }
        if let Some(notes) = update.review_notes {
            self.review_notes = Some(notes);
        }
        if let Some(reviewer) = reviewer {
            self.reviewed_by = Some(reviewer.to_string());
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Record a research verdict. Forces status to `Modified`.
    pub fn apply_verdict(&mut self, verdict: ValidationVerdict) {
        self.validation = Some(verdict);
        self.status = Status::Modified;
        self.updated_at = Utc::now();
    }
}

fn dedup_capped(values: Vec<String>, cap: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len().min(cap));
    for value in values {
        if out.len() == cap {
            break;
        }
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

/// Partial update of a criterion. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriterionUpdate {
    pub text: Option<String>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub keywords: Option<Vec<String>>,
    pub requirements: Option<Vec<String>>,
    pub review_notes: Option<String>,
}

impl CriterionUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = Some(keywords);
        self
    }

    pub fn with_requirements(mut self, requirements: Vec<String>) -> Self {
        self.requirements = Some(requirements);
        self
    }

    pub fn with_review_notes(mut self, notes: impl Into<String>) -> Self {
        self.review_notes = Some(notes.into());
        self
    }
}

/// Filter, search and window over criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaQuery {
    pub document_id: Option<Uuid>,
    pub category: Option<Category>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,

    /// Case-insensitive substring match on criterion text
    pub search: Option<String>,

    pub offset: usize,
    pub limit: usize,
}

impl Default for CriteriaQuery {
    fn default() -> Self {
        Self {
            document_id: None,
            category: None,
            status: None,
            priority: None,
            search: None,
            offset: 0,
            limit: 50,
        }
    }
}

impl CriteriaQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_document(document_id: Uuid) -> Self {
        Self {
            document_id: Some(document_id),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Whether a criterion passes every filter of this query.
    pub fn matches(&self, criterion: &Criterion) -> bool {
        if self.document_id.is_some_and(|d| d != criterion.document_id) {
            return false;
        }
        if self.category.is_some_and(|c| c != criterion.category) {
            return false;
        }
        if self.status.is_some_and(|s| s != criterion.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != criterion.priority) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => criterion
                .text
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        }
    }
}

/// Newest-created first; ties go to the newest (time-ordered) id.
pub fn newest_first(a: &Criterion, b: &Criterion) -> std::cmp::Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

/// A window of results plus whether more exist past it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
    pub offset: usize,
    pub limit: usize,
}

impl<T> Page<T> {
    /// Build a page from a result fetched with `limit + 1` items.
    pub fn from_overfetch(mut items: Vec<T>, offset: usize, limit: usize) -> Self {
        let has_more = items.len() > limit;
        items.truncate(limit);
        Self {
            items,
            has_more,
            offset,
            limit,
        }
    }
}

/// Counts over a set of criteria.
///
/// Every enum value is present as a key, zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaStatistics {
    pub total_count: usize,
    pub by_status: IndexMap<Status, usize>,
    pub by_category: IndexMap<Category, usize>,
    pub by_priority: IndexMap<Priority, usize>,
    /// approved / total, or 0.0 when there are no criteria
    pub approval_rate: f64,
}

impl CriteriaStatistics {
    pub fn from_criteria<'a>(criteria: impl IntoIterator<Item = &'a Criterion>) -> Self {
        let mut by_status: IndexMap<Status, usize> = Status::ALL.iter().map(|s| (*s, 0)).collect();
        let mut by_category: IndexMap<Category, usize> =
            Category::ALL.iter().map(|c| (*c, 0)).collect();
        let mut by_priority: IndexMap<Priority, usize> =
            Priority::ALL.iter().map(|p| (*p, 0)).collect();

        let mut total_count = 0;
        for criterion in criteria {
            total_count += 1;
            *by_status.entry(criterion.status).or_default() += 1;
            *by_category.entry(criterion.category).or_default() += 1;
            *by_priority.entry(criterion.priority).or_default() += 1;
        }

        let approved = by_status.get(&Status::Approved).copied().unwrap_or(0);
        let approval_rate = if total_count == 0 {
            0.0
        } else {
            approved as f64 / total_count as f64
        };

        Self {
            total_count,
            by_status,
            by_category,
            by_priority,
            approval_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extraction() -> Extraction {
        Extraction::new(Uuid::now_v7(), "placeholder extraction text")
    }

    #[test]
    fn test_text_length_boundary() {
        let e = extraction();
        assert!(Criterion::new(&e, "abcdefghij").is_ok());
        assert!(matches!(
            Criterion::new(&e, "abcdefghi"),
            Err(CriteriaError::InvalidCriterion { .. })
        ));
        // Surrounding whitespace does not count
        assert!(Criterion::new(&e, "   abcdefghi   ").is_err());
        assert_eq!(Criterion::new(&e, "  abcdefghij  ").unwrap().text, "abcdefghij");
    }

    #[test]
    fn test_new_criterion_defaults() {
        let e = extraction();
        let c = Criterion::new(&e, "The system must log every access").unwrap();
        assert_eq!(c.status, Status::Extracted);
        assert_eq!(c.priority, Priority::Medium);
        assert_eq!(c.extraction_id, e.id);
        assert_eq!(c.document_id, e.document_id);
        assert!(c.validation.is_none());
    }

    #[test]
    fn test_keywords_dedup_and_cap() {
        let words: Vec<String> = ["alpha", "beta", "alpha"]
            .iter()
            .chain(["k1", "k2", "k3", "k4", "k5", "k6", "k7", "k8", "k9", "k10"].iter())
            .map(|s| s.to_string())
            .collect();
        let c = Criterion::new(&extraction(), "some long criterion")
            .unwrap()
            .with_keywords(words);

        assert_eq!(c.keywords.len(), MAX_KEYWORDS);
        assert_eq!(c.keywords[0], "alpha");
        assert_eq!(c.keywords[1], "beta");
        assert_eq!(c.keywords[2], "k1");
    }

    #[test]
    fn test_invalid_text_update_leaves_criterion_untouched() {
        let mut c = Criterion::new(&extraction(), "The original requirement text").unwrap();
        let before = c.clone();

        let update = CriterionUpdate::new()
            .with_text("short")
            .with_status(Status::Approved);
        assert!(c.apply(update, Some("alice")).is_err());
        assert_eq!(c, before);
    }

    #[test]
    fn test_apply_merges_and_stamps() {
        let mut c = Criterion::new(&extraction(), "The original requirement text").unwrap();
        let before = c.updated_at;

        c.apply(
            CriterionUpdate::new()
                .with_priority(Priority::Low)
                .with_status(Status::Pending),
            Some("alice"),
        )
        .unwrap();

        assert_eq!(c.priority, Priority::Low);
        assert_eq!(c.status, Status::Pending);
        assert_eq!(c.text, "The original requirement text");
        assert_eq!(c.reviewed_by.as_deref(), Some("alice"));
        assert!(c.updated_at >= before);
    }

    #[test]
    fn test_query_matches_search_case_insensitive() {
        let c = Criterion::new(&extraction(), "Support for TLS 1.3 encryption")
            .unwrap()
            .with_category(Category::Security);

        assert!(CriteriaQuery::new().with_search("tls").matches(&c));
        assert!(CriteriaQuery::new().with_search("  ").matches(&c));
        assert!(!CriteriaQuery::new().with_search("ssh").matches(&c));
        assert!(CriteriaQuery::new()
            .with_category(Category::Security)
            .matches(&c));
        assert!(!CriteriaQuery::new()
            .with_category(Category::Financial)
            .matches(&c));
        assert!(!CriteriaQuery::for_document(Uuid::now_v7()).matches(&c));
    }

    #[test]
    fn test_page_from_overfetch() {
        let page = Page::from_overfetch(vec![1, 2, 3], 0, 2);
        assert_eq!(page.items, vec![1, 2]);
        assert!(page.has_more);

        let page = Page::from_overfetch(vec![1, 2], 2, 2);
        assert_eq!(page.items, vec![1, 2]);
        assert!(!page.has_more);
    }

    #[test]
    fn test_empty_statistics_zero_filled() {
        let stats = CriteriaStatistics::from_criteria(std::iter::empty());

        assert_eq!(stats.total_count, 0);
        assert_eq!(stats.approval_rate, 0.0);
        assert_eq!(stats.by_status.len(), 5);
        assert_eq!(stats.by_category.len(), 8);
        assert_eq!(stats.by_priority.len(), 4);
        assert!(stats.by_status.values().all(|&n| n == 0));
        assert!(stats.by_category.values().all(|&n| n == 0));
        assert!(stats.by_priority.values().all(|&n| n == 0));
    }

    #[test]
    fn test_enum_parse() {
        assert_eq!(Category::parse("Security"), Some(Category::Security));
        assert_eq!(Status::parse("approved"), Some(Status::Approved));
        assert_eq!(Priority::parse(" LOW "), Some(Priority::Low));
        assert_eq!(Category::parse("legal"), None);
    }
}
