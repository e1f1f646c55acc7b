//! Six-way AI categorization of criterion texts.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CriteriaError, Result};
use crate::pipeline::bounded;
use crate::traits::ai::AI;
use crate::types::criterion::Category;

/// Business category labels, in their fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoryLabel {
    #[serde(rename = "Technical Requirements")]
    TechnicalRequirements,
    #[serde(rename = "Security & Compliance")]
    SecurityCompliance,
    #[serde(rename = "Performance & Scalability")]
    PerformanceScalability,
    #[serde(rename = "Integration & Compatibility")]
    IntegrationCompatibility,
    #[serde(rename = "Support & Maintenance")]
    SupportMaintenance,
    #[serde(rename = "Commercial & Legal")]
    CommercialLegal,
}

impl CategoryLabel {
    pub const ALL: [CategoryLabel; 6] = [
        Self::TechnicalRequirements,
        Self::SecurityCompliance,
        Self::PerformanceScalability,
        Self::IntegrationCompatibility,
        Self::SupportMaintenance,
        Self::CommercialLegal,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::TechnicalRequirements => "Technical Requirements",
            Self::SecurityCompliance => "Security & Compliance",
            Self::PerformanceScalability => "Performance & Scalability",
            Self::IntegrationCompatibility => "Integration & Compatibility",
            Self::SupportMaintenance => "Support & Maintenance",
            Self::CommercialLegal => "Commercial & Legal",
        }
    }

    /// Internal category this label maps to.
    pub fn category(self) -> Category {
        match self {
            Self::TechnicalRequirements => Category::Technical,
            Self::SecurityCompliance => Category::Security,
            Self::PerformanceScalability => Category::Performance,
            Self::IntegrationCompatibility => Category::Integration,
            Self::SupportMaintenance => Category::Support,
            Self::CommercialLegal => Category::Financial,
        }
    }

    /// Exact label match, ignoring surrounding whitespace and case.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|l| l.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Assigns criterion texts to the six category labels.
///
/// There is no heuristic fallback here; the rule-based category set at
/// conversion time stays in place when this is not used.
pub struct Categorizer {
    ai: Option<Arc<dyn AI>>,
    timeout: Duration,
}

impl Categorizer {
    pub fn new(ai: Option<Arc<dyn AI>>, timeout: Duration) -> Self {
        Self { ai, timeout }
    }

    /// Categorize `texts`. Every text lands in exactly one bucket.
    ///
    /// The result always holds all six labels in fixed order.
    pub async fn categorize(&self, texts: &[String]) -> Result<IndexMap<CategoryLabel, Vec<String>>> {
        let labels = self.assign(texts).await?;

        let mut buckets: IndexMap<CategoryLabel, Vec<String>> = CategoryLabel::ALL
            .into_iter()
            .map(|label| (label, Vec::new()))
            .collect();
        for (text, label) in texts.iter().zip(labels) {
            buckets.entry(label).or_default().push(text.clone());
        }
        Ok(buckets)
    }

    /// The label of each text, by position.
    ///
    /// Fails unless the model assigned every text exactly once.
    pub async fn assign(&self, texts: &[String]) -> Result<Vec<CategoryLabel>> {
        let ai = self
            .ai
            .as_ref()
            .ok_or_else(|| CriteriaError::unavailable("categorization", "AI not configured"))?;

        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let assignments = bounded("categorization", self.timeout, ai.categorize(texts)).await?;

        let mut assigned: Vec<Option<CategoryLabel>> = vec![None; texts.len()];
        for assignment in assignments {
            let label = CategoryLabel::from_label(&assignment.label).ok_or_else(|| {
                CriteriaError::IncompleteCategorization {
                    reason: format!("unknown category label '{}'", assignment.label),
                }
            })?;

            for index in assignment.indices {
                let slot = index
                    .checked_sub(1)
                    .and_then(|i| assigned.get_mut(i))
                    .ok_or_else(|| CriteriaError::IncompleteCategorization {
                        reason: format!("criterion number {index} is out of range 1..={}", texts.len()),
                    })?;

                if let Some(previous) = slot {
                    return Err(CriteriaError::IncompleteCategorization {
                        reason: format!(
                            "criterion number {index} assigned to both '{previous}' and '{label}'"
                        ),
                    });
                }
                *slot = Some(label);
            }
        }

        let labels = assigned
            .into_iter()
            .enumerate()
            .map(|(i, label)| {
                label.ok_or_else(|| CriteriaError::IncompleteCategorization {
                    reason: format!("criterion number {} was not assigned", i + 1),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(count = labels.len(), "Categorized criteria");
        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockAI;
    use crate::traits::ai::LabelAssignment;

    fn texts(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("criterion number {i}")).collect()
    }

    fn categorizer(assignments: Vec<LabelAssignment>) -> Categorizer {
        let ai = Arc::new(MockAI::new().with_categorization(assignments));
        Categorizer::new(Some(ai), Duration::from_secs(5))
    }

    #[test]
    fn test_label_lookup() {
        assert_eq!(
            CategoryLabel::from_label(" security & compliance "),
            Some(CategoryLabel::SecurityCompliance)
        );
        assert_eq!(CategoryLabel::from_label("Security"), None);
        assert_eq!(CategoryLabel::CommercialLegal.category(), Category::Financial);
    }

    #[tokio::test]
    async fn test_empty_input_gives_six_empty_buckets() {
        let ai = Arc::new(MockAI::new());
        let buckets = Categorizer::new(Some(ai.clone()), Duration::from_secs(1))
            .categorize(&[])
            .await
            .unwrap();

        assert_eq!(buckets.keys().copied().collect::<Vec<_>>(), CategoryLabel::ALL);
        assert!(buckets.values().all(Vec::is_empty));
        assert!(ai.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_is_unavailable() {
        let categorizer = Categorizer::new(None, Duration::from_secs(1));

        let result = categorizer.categorize(&texts(1)).await;
        assert!(matches!(result, Err(CriteriaError::Unavailable { .. })));

        let empty = categorizer.categorize(&[]).await;
        assert!(matches!(empty, Err(CriteriaError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn test_assigns_each_text_once() {
        let buckets = categorizer(vec![
            LabelAssignment::new("Commercial & Legal", vec![3]),
            LabelAssignment::new("Technical Requirements", vec![2, 1]),
        ])
        .categorize(&texts(3))
        .await
        .unwrap();

        assert_eq!(buckets.len(), 6);
        assert_eq!(
            buckets[&CategoryLabel::TechnicalRequirements],
            vec!["criterion number 1", "criterion number 2"]
        );
        assert_eq!(buckets[&CategoryLabel::CommercialLegal], vec!["criterion number 3"]);
        assert!(buckets[&CategoryLabel::SupportMaintenance].is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_texts_are_counted_by_index() {
        let same = vec!["identical criterion".to_string(), "identical criterion".to_string()];
        let buckets = categorizer(vec![
            LabelAssignment::new("Technical Requirements", vec![1]),
            LabelAssignment::new("Support & Maintenance", vec![2]),
        ])
        .categorize(&same)
        .await
        .unwrap();

        assert_eq!(buckets[&CategoryLabel::TechnicalRequirements].len(), 1);
        assert_eq!(buckets[&CategoryLabel::SupportMaintenance].len(), 1);
    }

    #[tokio::test]
    async fn test_missing_assignment_rejected() {
        let result = categorizer(vec![LabelAssignment::new("Technical Requirements", vec![1])])
            .categorize(&texts(2))
            .await;
        assert!(matches!(result, Err(CriteriaError::IncompleteCategorization { .. })));
    }

    #[tokio::test]
    async fn test_double_assignment_rejected() {
        let result = categorizer(vec![
            LabelAssignment::new("Technical Requirements", vec![1]),
            LabelAssignment::new("Commercial & Legal", vec![1]),
        ])
        .categorize(&texts(1))
        .await;
        assert!(matches!(result, Err(CriteriaError::IncompleteCategorization { .. })));
    }

    #[tokio::test]
    async fn test_unknown_label_and_out_of_range_rejected() {
        let unknown = categorizer(vec![LabelAssignment::new("Miscellaneous", vec![1])])
            .categorize(&texts(1))
            .await;
        assert!(matches!(unknown, Err(CriteriaError::IncompleteCategorization { .. })));

        for index in [0, 2] {
            let out_of_range = categorizer(vec![LabelAssignment::new("Technical Requirements", vec![1, index])])
                .categorize(&texts(1))
                .await;
            assert!(matches!(
                out_of_range,
                Err(CriteriaError::IncompleteCategorization { .. })
            ));
        }
    }
}
