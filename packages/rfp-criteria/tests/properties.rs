//! Property tests for chunking, conversion and statistics.

use proptest::prelude::*;
use rfp_criteria::{
    split_semantic, to_criterion, Category, CriteriaStatistics, Criterion, Extraction, Priority,
    Status,
};
use uuid::Uuid;

fn strip_ws(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn line() -> impl Strategy<Value = String> {
    prop_oneof![
        "# [A-Za-z ]{1,20}",
        "## [A-Za-z ]{1,20}",
        "[A-Za-z0-9.,%]{1,12}( [A-Za-z0-9.,%]{1,12}){0,12}",
        Just(String::new()),
    ]
}

fn document() -> impl Strategy<Value = String> {
    prop::collection::vec(line(), 0..40).prop_map(|lines| lines.join("\n"))
}

fn criterion(status: Status, category: Category, priority: Priority) -> Criterion {
    let extraction = Extraction::new(Uuid::now_v7(), "The vendor shall comply");
    let mut criterion = Criterion::new(&extraction, "The vendor shall comply")
        .unwrap()
        .with_category(category)
        .with_priority(priority);
    criterion.status = status;
    criterion
}

proptest! {
    #[test]
    fn chunks_preserve_content(text in document(), budget in 20usize..400) {
        let chunks = split_semantic(&text, budget);
        prop_assert_eq!(strip_ws(&chunks.concat()), strip_ws(&text));
    }

    #[test]
    fn chunks_respect_budget(text in document(), budget in 20usize..400) {
        for chunk in split_semantic(&text, budget) {
            prop_assert!(!chunk.trim().is_empty());
            // Only a single oversized paragraph may exceed the budget
            prop_assert!(chunk.chars().count() <= budget || !chunk.contains("\n\n"));
        }
    }

    #[test]
    fn conversion_bounds_keywords_and_fragments(
        text in "[A-Za-z0-9%. ]{10,300}".prop_filter("needs ten visible chars", |t| t.trim().chars().count() >= 10)
    ) {
        let extraction = Extraction::new(Uuid::now_v7(), text);
        let criterion = to_criterion(&extraction).unwrap();

        prop_assert!(criterion.keywords.len() <= 10);
        prop_assert!(criterion.requirements.len() <= 5);
        prop_assert_eq!(criterion.text, extraction.text);
    }

    #[test]
    fn statistics_partition_sums(
        picks in prop::collection::vec((0usize..5, 0usize..8, 0usize..4), 0..60)
    ) {
        let criteria: Vec<Criterion> = picks
            .iter()
            .map(|&(s, c, p)| criterion(Status::ALL[s], Category::ALL[c], Priority::ALL[p]))
            .collect();

        let stats = CriteriaStatistics::from_criteria(&criteria);

        prop_assert_eq!(stats.total_count, criteria.len());
        prop_assert_eq!(stats.by_status.values().sum::<usize>(), criteria.len());
        prop_assert_eq!(stats.by_category.values().sum::<usize>(), criteria.len());
        prop_assert_eq!(stats.by_priority.values().sum::<usize>(), criteria.len());
        prop_assert!((0.0..=1.0).contains(&stats.approval_rate));

        let approved = criteria.iter().filter(|c| c.status == Status::Approved).count();
        if criteria.is_empty() {
            prop_assert_eq!(stats.approval_rate, 0.0);
        } else {
            let expected = approved as f64 / criteria.len() as f64;
            prop_assert!((stats.approval_rate - expected).abs() < 1e-12);
        }
    }
}
