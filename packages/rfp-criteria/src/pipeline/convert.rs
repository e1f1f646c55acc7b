//! Converting extractions into criteria with rule tables.
//!
//! - Category: keyword-overlap scoring (substring match), ties by enum order
//! - Priority: ordered rules, first whole-word match wins, default medium
//! - Keywords: significant tokens in order of first appearance
//! - Requirements: numeric fragments (percentages, durations, storage, users)

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::error::{CriteriaError, Result};
use crate::types::{
    criterion::{Category, Criterion, Priority, MAX_KEYWORDS, MAX_REQUIREMENTS},
    extraction::Extraction,
};

/// Scored keyword sets per category, in tie-break order.
pub const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Technical,
        &[
            "technical", "system", "technology", "architecture", "platform", "software",
            "hardware", "infrastructure", "network", "database", "api", "interface", "protocol",
            "standard", "specification",
        ],
    ),
    (
        Category::Security,
        &[
            "security", "secure", "encryption", "authentication", "authorization", "compliance",
            "gdpr", "privacy", "audit", "vulnerability", "firewall", "access control",
            "certificate", "ssl", "tls",
        ],
    ),
    (
        Category::Performance,
        &[
            "performance", "speed", "latency", "throughput", "scalability", "capacity", "load",
            "response time", "availability", "uptime", "reliability", "efficiency",
            "optimization", "bandwidth",
        ],
    ),
    (
        Category::Support,
        &[
            "support", "maintenance", "service", "help", "assistance", "documentation",
            "training", "backup", "recovery", "monitoring", "troubleshooting", "ticket", "sla",
            "response time",
        ],
    ),
    (
        Category::Integration,
        &[
            "integration", "interface", "compatibility", "interoperability", "connect", "sync",
            "import", "export", "migration", "third-party", "plugin", "connector", "webhook",
        ],
    ),
    (
        Category::Financial,
        &[
            "cost", "price", "pricing", "budget", "financial", "commercial", "license",
            "subscription", "payment", "billing", "invoice", "contract", "terms", "conditions",
            "warranty",
        ],
    ),
];

/// Priority rules, checked in order.
pub const PRIORITY_RULES: &[(Priority, &[&str])] = &[
    (
        Priority::Critical,
        &[
            "critical", "mandatory", "required", "must", "shall", "essential", "vital", "crucial",
            "obligatory", "zwingend", "erforderlich",
        ],
    ),
    (
        Priority::High,
        &[
            "important", "high", "priority", "significant", "key", "major", "should", "soll",
            "wichtig",
        ],
    ),
    (
        Priority::Low,
        &[
            "optional", "nice to have", "preferred", "desirable", "minor", "could", "might",
            "wünschenswert",
        ],
    ),
];

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

const FRAGMENT_PATTERNS: &[&str] = &[
    // Percentages
    r"\d+(?:[.,]\d+)?\s*%",
    // Durations
    r"\d+\s*(?:hour|minute|second|day|week|month|year)s?\b",
    // Storage sizes
    r"\d+\s*(?:kb|mb|gb|tb)\b",
    // User counts
    r"\d+\s*(?:(?:concurrent|simultaneous)\s+)?users?\b",
];

static FRAGMENTS: LazyLock<std::result::Result<Vec<Regex>, regex::Error>> =
    LazyLock::new(|| FRAGMENT_PATTERNS.iter().map(|p| Regex::new(p)).collect());

/// Best-scoring category; `Other` when no keyword occurs.
pub fn determine_category(text: &str) -> Category {
    let lower = text.to_lowercase();
    let mut best = (Category::Other, 0);

    for (category, keywords) in CATEGORY_KEYWORDS {
        let score = keywords.iter().filter(|k| lower.contains(*k)).count();
        if score > best.1 {
            best = (*category, score);
        }
    }
    best.0
}

/// First matching priority rule; `Medium` when none applies.
pub fn determine_priority(text: &str) -> Priority {
    let tokens = tokenize(text);

    PRIORITY_RULES
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|p| contains_phrase(&tokens, p)))
        .map(|(priority, _)| *priority)
        .unwrap_or_default()
}

/// Tokens longer than three characters, stopwords removed, first appearance order.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for token in tokenize(text) {
        if keywords.len() == MAX_KEYWORDS {
            break;
        }
        if token.chars().count() > 3
            && !STOPWORDS.contains(&token.as_str())
            && !keywords.contains(&token)
        {
            keywords.push(token);
        }
    }
    keywords
}

/// Numeric requirement fragments in pattern order, at most five.
pub fn extract_requirements(text: &str) -> Result<Vec<String>> {
    let fragments = FRAGMENTS.as_ref().map_err(|e| {
        CriteriaError::ExtractionFailed(format!("requirement patterns unusable: {e}"))
    })?;
    let lower = text.to_lowercase();
    Ok(fragments
        .iter()
        .flat_map(|re| re.find_iter(&lower).map(|m| m.as_str().to_string()))
        .take(MAX_REQUIREMENTS)
        .collect())
}

/// Build a criterion from an extraction using the rule tables.
pub fn to_criterion(extraction: &Extraction) -> Result<Criterion> {
    let text = extraction.text.as_str();
    Ok(Criterion::new(extraction, text)?
        .with_category(determine_category(text))
        .with_priority(determine_priority(text))
        .with_keywords(extract_keywords(text))
        .with_requirements(extract_requirements(text)?)
        .with_source_reference(format!("Document {}", extraction.document_id)))
}

/// Convert extractions, skipping (and logging) those too short to be criteria.
pub fn convert_extractions(extractions: &[Extraction]) -> Vec<Criterion> {
    extractions
        .iter()
        .filter_map(|extraction| match to_criterion(extraction) {
            Ok(criterion) => Some(criterion),
            Err(e) => {
                warn!(
                    extraction_id = %extraction.id,
                    error = %e,
                    "Skipping extraction"
                );
                None
            }
        })
        .collect()
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whole-word (or whole-phrase) match against a token stream.
fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    if words.is_empty() || words.len() > tokens.len() {
        return false;
    }
    tokens
        .windows(words.len())
        .any(|window| window.iter().zip(&words).all(|(t, w)| t == w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_tls_requirement_is_critical_security() {
        let e = Extraction::new(
            Uuid::now_v7(),
            "The system must use TLS 1.2 encryption for all data in transit",
        );
        let criteria = convert_extractions(&[e.clone()]);

        assert_eq!(criteria.len(), 1);
        let c = &criteria[0];
        assert_eq!(c.category, Category::Security);
        assert_eq!(c.priority, Priority::Critical);
        assert_eq!(c.source_reference, format!("Document {}", e.document_id));
        assert_eq!(c.extraction_id, e.id);
    }

    #[test]
    fn test_category_ties_go_to_enum_order() {
        // "interface" scores for both technical and integration
        assert_eq!(determine_category("Provide an interface"), Category::Technical);
        assert_eq!(determine_category("Nothing relevant here"), Category::Other);
        assert_eq!(
            determine_category("Pricing and license terms per contract"),
            Category::Financial
        );
    }

    #[test]
    fn test_priority_rule_order_and_whole_words() {
        assert_eq!(determine_priority("It is essential and optional"), Priority::Critical);
        assert_eq!(determine_priority("Vendors should reply"), Priority::High);
        assert_eq!(determine_priority("A dashboard would be nice to have"), Priority::Low);
        assert_eq!(determine_priority("Reports are generated weekly"), Priority::Medium);
        // "highway" is not "high", "keyboard" is not "key"
        assert_eq!(determine_priority("The highway keyboard layout"), Priority::Medium);
        assert_eq!(determine_priority("Das Angebot ist wünschenswert"), Priority::Low);
    }

    #[test]
    fn test_keywords_first_appearance_order() {
        let keywords = extract_keywords("The Backup backup service with encryption and the service");
        assert_eq!(keywords, vec!["backup", "service", "encryption"]);
    }

    #[test]
    fn test_keywords_capped() {
        let text = (0..20).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
        assert_eq!(extract_keywords(&text).len(), MAX_KEYWORDS);
    }

    #[test]
    fn test_requirement_fragments() {
        let found = extract_requirements(
            "99.9% uptime, restore within 4 hours, 500 GB storage, 100 concurrent users",
        )
        .unwrap();
        assert_eq!(found, vec!["99.9%", "4 hours", "500 gb", "100 concurrent users"]);
    }

    #[test]
    fn test_fragment_patterns_compile() {
        let fragments = FRAGMENTS.as_ref().unwrap();
        assert_eq!(fragments.len(), FRAGMENT_PATTERNS.len());
    }

    #[test]
    fn test_requirement_fragments_capped() {
        let found = extract_requirements("1% 2% 3% 4% 5% 6% 7%").unwrap();
        assert_eq!(found.len(), MAX_REQUIREMENTS);
        assert_eq!(found[0], "1%");
    }

    #[test]
    fn test_short_extractions_skipped() {
        let doc = Uuid::now_v7();
        let criteria = convert_extractions(&[
            Extraction::new(doc, "too short"),
            Extraction::new(doc, "long enough text"),
        ]);
        assert_eq!(criteria.len(), 1);
        assert_eq!(criteria[0].text, "long enough text");
    }
}
