//! Integration tests for research-backed validation.
//!
//! These tests verify the full validation workflow:
//! 1. Build document context (summary, or a degraded placeholder)
//! 2. Create or reuse the research agent
//! 3. Run one thread per criterion
//! 4. Reduce the conversation to a verdict and record it

use std::sync::Arc;
use std::time::Duration;

use rfp_criteria::{
    testing::{
        MockAI, MockAICall, MockOperation, MockResearch, MockResearchCall, MockResearchOperation,
    },
    AgentConfig, CriteriaError, CriteriaService, Criterion, DocumentClassification,
    DocumentMetadata, DocumentType, MemoryDocuments, MemoryStore, PipelineConfig, ResearchMode,
    RunOutcome, Status, ThreadMessage, ValidationReference, ValidationVerdict,
};
use uuid::Uuid;

const TENDER: &str = "# Security
The platform must support single sign-on via SAML 2.0.
All data shall be encrypted at rest with AES-256.";

struct Fixture {
    service: CriteriaService<MemoryStore, MemoryDocuments>,
    ai: Arc<MockAI>,
    research: Arc<MockResearch>,
    criteria: Vec<Criterion>,
}

/// Helper to set up a service with extracted criteria and a research backend.
async fn setup(ai: MockAI, research: MockResearch, content: Option<&str>) -> Fixture {
    let document_id = Uuid::now_v7();
    let metadata = DocumentMetadata::new(document_id, "security-rfp.pdf").with_classification(
        &DocumentClassification {
            document_type: DocumentType::RequestForProposal,
            confidence: 0.9,
            contains_criteria: true,
            reasoning: "Security requirements".to_string(),
        },
    );
    let documents = MemoryDocuments::new();
    documents
        .insert(metadata.clone(), Some(TENDER.to_string()))
        .unwrap();

    let ai = Arc::new(ai);
    let research = Arc::new(research);
    let config = AgentConfig::new("gpt-4o", "bing-conn").with_deep_research_model("o3-deep-research");
    let service = CriteriaService::new(
        MemoryStore::new(),
        documents,
        Some(ai.clone()),
        PipelineConfig::default(),
    )
    .with_research(research.clone(), config);

    let extractions = service.extract_document(document_id, None).await.unwrap();
    let ids: Vec<Uuid> = extractions.iter().map(|e| e.id).collect();
    let criteria = service.process_extractions(&ids).await.unwrap();
    assert_eq!(criteria.len(), 2);

    // Swap the document text for the validation phase
    if content != Some(TENDER) {
        service
            .documents()
            .insert(metadata, content.map(str::to_string))
            .unwrap();
    }

    ai.clear_calls();
    Fixture {
        service,
        ai,
        research,
        criteria,
    }
}

fn verdict(is_met: bool) -> ValidationVerdict {
    ValidationVerdict {
        is_met,
        summary: "SAML 2.0 single sign-on is documented".to_string(),
        references: vec![
            ValidationReference::new("SSO guide", "https://vendor.example.com/docs/sso"),
            ValidationReference::new("Sales deck", "internal/sales.pdf"),
        ],
    }
}

#[tokio::test]
async fn test_validation_records_verdict() {
    let fx = setup(
        MockAI::new().with_verdict(verdict(true)),
        MockResearch::new(),
        Some(TENDER),
    )
    .await;
    let criterion = &fx.criteria[0];

    let validated = fx
        .service
        .validate_criterion(criterion.id, "Acme Identity Cloud", ResearchMode::Standard)
        .await
        .unwrap();

    assert_eq!(validated.status, Status::Modified);
    let recorded = validated.validation.expect("verdict recorded");
    assert!(recorded.is_met);
    assert_eq!(recorded.references.len(), 1);
    assert_eq!(recorded.references[0].url, "https://vendor.example.com/docs/sso");

    let stored = fx.service.manager().get(criterion.id).await.unwrap();
    assert_eq!(stored.validation, Some(recorded));

    // One message carrying product, summary and criterion
    let posted = fx.research.posted("thread-1");
    assert_eq!(posted.len(), 1);
    assert!(posted[0].contains("Product/Service to validate: Acme Identity Cloud"));
    assert!(posted[0].contains(&criterion.text));
    assert!(posted[0].contains("Summary of: # Security"));

    // The verdict is reduced from the whole transcript
    let reduced = fx.ai.calls().into_iter().find_map(|c| match c {
        MockAICall::ReduceConversation { conversation } => Some(conversation),
        _ => None,
    });
    let conversation = reduced.expect("conversation reduced");
    assert!(conversation.contains("[USER]"));
    assert!(conversation.contains("[ASSISTANT]: Yes, the product meets the criterion."));
}

#[tokio::test]
async fn test_missing_document_text_degrades_context() {
    let fx = setup(MockAI::new(), MockResearch::new(), None).await;
    let criterion = &fx.criteria[1];

    fx.service
        .validate_criterion(criterion.id, "Acme Vault", ResearchMode::Standard)
        .await
        .unwrap();

    let posted = fx.research.posted("thread-1");
    assert!(posted[0].contains(&format!(
        "Limited context available. Evaluating criterion: {}",
        criterion.text
    )));
    assert!(!fx
        .ai
        .calls()
        .iter()
        .any(|c| matches!(c, MockAICall::SummarizeChunk { .. })));
}

#[tokio::test]
async fn test_failed_run_still_reduces_conversation() {
    let fx = setup(
        MockAI::new(),
        MockResearch::new()
            .with_outcome(RunOutcome::failed("failed", "rate limited"))
            .with_messages(vec![ThreadMessage::new(
                "assistant",
                serde_json::json!("Partial answer before the run failed"),
            )]),
        Some(TENDER),
    )
    .await;

    let validated = fx
        .service
        .validate_criterion(fx.criteria[0].id, "Acme", ResearchMode::Standard)
        .await
        .unwrap();

    assert!(validated.validation.is_some());
    let reduced = fx.ai.calls().into_iter().any(|c| {
        matches!(c, MockAICall::ReduceConversation { ref conversation } if conversation == "Partial answer before the run failed")
    });
    assert!(reduced);
}

#[tokio::test]
async fn test_research_failure_leaves_criterion_untouched() {
    let fx = setup(
        MockAI::new(),
        MockResearch::new().with_failure(MockResearchOperation::Run),
        Some(TENDER),
    )
    .await;
    let criterion = &fx.criteria[0];

    let result = fx
        .service
        .validate_criterion(criterion.id, "Acme", ResearchMode::Standard)
        .await;

    assert!(matches!(result, Err(CriteriaError::Upstream(_))));
    let stored = fx.service.manager().get(criterion.id).await.unwrap();
    assert_eq!(stored.status, Status::Extracted);
    assert!(stored.validation.is_none());
}

#[tokio::test]
async fn test_verdict_failure_leaves_criterion_untouched() {
    let fx = setup(
        MockAI::new().with_failure(MockOperation::ReduceConversation),
        MockResearch::new(),
        Some(TENDER),
    )
    .await;
    let criterion = &fx.criteria[0];

    let result = fx
        .service
        .validate_criterion(criterion.id, "Acme", ResearchMode::Standard)
        .await;

    assert!(result.is_err());
    let stored = fx.service.manager().get(criterion.id).await.unwrap();
    assert!(stored.validation.is_none());
}

#[tokio::test]
async fn test_message_listing_failure_reduces_placeholder() {
    let fx = setup(
        MockAI::new(),
        MockResearch::new().with_failure(MockResearchOperation::ListMessages),
        Some(TENDER),
    )
    .await;

    let validated = fx
        .service
        .validate_criterion(fx.criteria[0].id, "Acme", ResearchMode::Standard)
        .await
        .unwrap();
    assert!(validated.validation.is_some());

    // Listed twice before giving up
    let listings = fx
        .research
        .calls()
        .into_iter()
        .filter(|c| matches!(c, MockResearchCall::ListMessages { .. }))
        .count();
    assert_eq!(listings, 2);

    let reduced = fx.ai.calls().into_iter().find_map(|c| match c {
        MockAICall::ReduceConversation { conversation } => Some(conversation),
        _ => None,
    });
    let conversation = reduced.expect("conversation reduced");
    assert!(conversation.starts_with("Error extracting response: "));
    assert!(conversation.contains("mock ListMessages failure"));
}

#[tokio::test]
async fn test_unknown_criterion_is_not_found() {
    let fx = setup(MockAI::new(), MockResearch::new(), Some(TENDER)).await;

    let result = fx
        .service
        .validate_criterion(Uuid::now_v7(), "Acme", ResearchMode::Standard)
        .await;

    assert!(matches!(result, Err(CriteriaError::NotFound { entity: "criterion", .. })));
    assert_eq!(fx.research.agents_created(), 0);
}

#[tokio::test]
async fn test_validation_without_research_is_unavailable() {
    let document_id = Uuid::now_v7();
    let documents = MemoryDocuments::new();
    documents
        .insert(DocumentMetadata::new(document_id, "a.pdf"), Some(TENDER.to_string()))
        .unwrap();
    let service = CriteriaService::new(
        MemoryStore::new(),
        documents,
        Some(Arc::new(MockAI::new())),
        PipelineConfig::default(),
    );

    let result = service
        .validate_criterion(Uuid::now_v7(), "Acme", ResearchMode::Standard)
        .await;

    assert!(matches!(result, Err(CriteriaError::Unavailable { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_first_use_creates_one_agent() {
    let fx = setup(
        MockAI::new(),
        MockResearch::new().with_agent_delay(Duration::from_millis(50)),
        Some(TENDER),
    )
    .await;

    let (first, second) = tokio::join!(
        fx.service
            .validate_criterion(fx.criteria[0].id, "Acme", ResearchMode::Standard),
        fx.service
            .validate_criterion(fx.criteria[1].id, "Acme", ResearchMode::Standard),
    );
    first.unwrap();
    second.unwrap();

    assert_eq!(fx.research.agents_created(), 1);
    let runs: Vec<String> = fx
        .research
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            MockResearchCall::Run { agent_id, .. } => Some(agent_id),
            _ => None,
        })
        .collect();
    assert_eq!(runs, vec!["agent-1".to_string(), "agent-1".to_string()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_modes_use_separate_agents_and_cleanup_deletes_them() {
    let mut fx = setup(MockAI::new(), MockResearch::new(), Some(TENDER)).await;

    fx.service
        .validate_criterion(fx.criteria[0].id, "Acme", ResearchMode::Standard)
        .await
        .unwrap();
    fx.service
        .validate_criterion(fx.criteria[1].id, "Acme", ResearchMode::DeepResearch)
        .await
        .unwrap();
    assert_eq!(fx.research.agents_created(), 2);

    fx.service.cleanup().await;

    let deleted = fx
        .research
        .calls()
        .into_iter()
        .filter(|c| matches!(c, MockResearchCall::DeleteAgent { .. }))
        .count();
    assert_eq!(deleted, 2);
}
