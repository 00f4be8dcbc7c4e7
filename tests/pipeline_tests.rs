//! End-to-end pipeline flows with scripted mock providers.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use scholar_rag::{
    Chunk, CompletionProvider, EmbeddingProvider, InMemoryVectorStore, LlmReranker,
    PipelineConfig, RagError, RagPipeline, Reranker, Result, RetrievedChunk, RetryPolicy,
    SectionKind, VectorStore,
};

/// Embeds every text as the same fixed query vector.
struct StaticEmbeddings {
    vector: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for StaticEmbeddings {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(self.vector.clone())
    }

    fn dimensions(&self) -> usize {
        self.vector.len()
    }
}

/// Pops scripted responses in order and records every prompt it receives.
struct ScriptedCompletions {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletions {
    fn new(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn prompt(&self, index: usize) -> String {
        self.prompts.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletions {
    async fn complete(&self, prompt: &str, _max_tokens: u32, _temperature: f32) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| RagError::provider("Scripted", "no scripted response left"))
    }

    fn name(&self) -> &str {
        "Scripted"
    }
}

fn chunk(doc_id: &str, chunk_id: u32, content: &str, embedding: Vec<f32>) -> Chunk {
    Chunk {
        doc_id: doc_id.to_string(),
        chunk_id,
        content: content.to_string(),
        embedding,
        metadata: HashMap::new(),
    }
}

fn test_config(rerank_enabled: bool) -> PipelineConfig {
    PipelineConfig::builder()
        .rerank_enabled(rerank_enabled)
        .retry(RetryPolicy::no_retry())
        .build()
        .unwrap()
}

/// Store three doc1 chunks whose cosine similarity to the query vector
/// `[1, 0]` orders them chunk 1 (~0.98) > chunk 0 (~0.71) > chunk 2 (~0.20).
async fn seeded_store() -> Arc<InMemoryVectorStore> {
    let store = Arc::new(InMemoryVectorStore::new());
    store
        .upsert(&[
            chunk("doc1", 0, "Chunk zero content.", vec![1.0, 1.0]),
            chunk("doc1", 1, "Chunk one content.", vec![1.0, 0.2]),
            chunk("doc1", 2, "Chunk two content.", vec![0.2, 1.0]),
        ])
        .await
        .unwrap();
    store
}

fn build_pipeline(
    store: Arc<InMemoryVectorStore>,
    provider: Arc<ScriptedCompletions>,
    rerank_enabled: bool,
) -> RagPipeline {
    let mut builder = RagPipeline::builder()
        .config(test_config(rerank_enabled))
        .embedding_provider(Arc::new(StaticEmbeddings { vector: vec![1.0, 0.0] }))
        .vector_store(store)
        .completion_provider(provider.clone());
    if rerank_enabled {
        builder = builder.reranker(Arc::new(LlmReranker::new(provider, RetryPolicy::no_retry())));
    }
    builder.build().unwrap()
}

fn source_ids(sources: &[RetrievedChunk]) -> Vec<(String, u32)> {
    sources.iter().map(|s| (s.doc_id.clone(), s.chunk_id)).collect()
}

const RERANK_REVERSED: &str = r#"{"ranking": [
    {"doc_id": "doc1", "chunk_id": 2, "score": 0.9},
    {"doc_id": "doc1", "chunk_id": 1, "score": 0.5},
    {"doc_id": "doc1", "chunk_id": 0, "score": 0.1}
]}"#;

#[tokio::test]
async fn answer_flow_reranks_generates_and_reports_all_sources() {
    let provider = ScriptedCompletions::new(&[RERANK_REVERSED, "Generated answer [doc1#2]."]);
    let pipeline = build_pipeline(seeded_store().await, provider.clone(), true);

    let answer = pipeline.answer("What is in the chunks?").await.unwrap();

    assert_eq!(answer.text, "Generated answer [doc1#2].");
    assert_eq!(
        source_ids(&answer.sources),
        vec![
            ("doc1".to_string(), 2),
            ("doc1".to_string(), 1),
            ("doc1".to_string(), 0),
        ]
    );

    // One rerank call plus one generation call.
    assert_eq!(provider.call_count(), 2);
    assert!(provider.prompt(0).contains("ranking"));
    let answer_prompt = provider.prompt(1);
    assert!(answer_prompt.contains("[doc1#2]"));
    assert!(answer_prompt.ends_with("Question:\nWhat is in the chunks?"));
}

#[tokio::test]
async fn answer_context_is_top_three_but_sources_are_complete() {
    let store = seeded_store().await;
    store.upsert(&[chunk("doc2", 0, "Far away content.", vec![0.05, 1.0])]).await.unwrap();

    let rerank = r#"{"ranking": [
        {"doc_id": "doc1", "chunk_id": 2, "score": 0.9},
        {"doc_id": "doc1", "chunk_id": 1, "score": 0.8},
        {"doc_id": "doc1", "chunk_id": 0, "score": 0.7},
        {"doc_id": "doc2", "chunk_id": 0, "score": 0.6}
    ]}"#;
    let provider = ScriptedCompletions::new(&[rerank, "Answer."]);
    let pipeline = build_pipeline(store, provider.clone(), true);

    let answer = pipeline.answer("Question?").await.unwrap();

    assert_eq!(answer.sources.len(), 4);
    let answer_prompt = provider.prompt(1);
    assert!(answer_prompt.contains("[doc1#2]"));
    assert!(answer_prompt.contains("[doc1#1]"));
    assert!(answer_prompt.contains("[doc1#0]"));
    assert!(!answer_prompt.contains("[doc2#0]"), "fourth source leaked into the context");
}

#[tokio::test]
async fn empty_store_yields_canned_answer_without_generation() {
    let provider = ScriptedCompletions::new(&[]);
    let pipeline =
        build_pipeline(Arc::new(InMemoryVectorStore::new()), provider.clone(), true);

    let answer = pipeline.answer("anything").await.unwrap();

    assert!(answer.text.contains("No matching documents"));
    assert!(answer.sources.is_empty());
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn disabled_rerank_keeps_retrieval_order() {
    let provider = ScriptedCompletions::new(&["Answer."]);
    let pipeline = build_pipeline(seeded_store().await, provider.clone(), false);

    let answer = pipeline.answer("Question?").await.unwrap();

    // Similarity order: chunk 1, chunk 0, chunk 2.
    assert_eq!(
        source_ids(&answer.sources),
        vec![
            ("doc1".to_string(), 1),
            ("doc1".to_string(), 0),
            ("doc1".to_string(), 2),
        ]
    );
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn malformed_rerank_response_falls_back_to_retrieval_order() {
    let provider = ScriptedCompletions::new(&["definitely { not json", "Answer."]);
    let pipeline = build_pipeline(seeded_store().await, provider.clone(), true);

    let answer = pipeline.answer("Question?").await.unwrap();

    assert_eq!(
        source_ids(&answer.sources),
        vec![
            ("doc1".to_string(), 1),
            ("doc1".to_string(), 0),
            ("doc1".to_string(), 2),
        ]
    );
}

#[tokio::test]
async fn partial_rerank_output_keeps_similarity_scores_for_missing_members() {
    // Only chunk 2 is scored by the model; the others keep their similarity
    // scores (~0.98 and ~0.71), so chunk 2 moves to the front.
    let rerank = r#"{"ranking": [{"doc_id": "doc1", "chunk_id": 2, "score": 0.99}]}"#;
    let provider = ScriptedCompletions::new(&[rerank, "Answer."]);
    let pipeline = build_pipeline(seeded_store().await, provider.clone(), true);

    let answer = pipeline.answer("Question?").await.unwrap();

    assert_eq!(
        source_ids(&answer.sources),
        vec![
            ("doc1".to_string(), 2),
            ("doc1".to_string(), 1),
            ("doc1".to_string(), 0),
        ]
    );
}

#[tokio::test]
async fn reranking_an_empty_candidate_list_makes_no_provider_call() {
    let provider = ScriptedCompletions::new(&[]);
    let reranker = LlmReranker::new(provider.clone(), RetryPolicy::no_retry());

    let ranked = reranker.rerank("query", Vec::new()).await.unwrap();

    assert!(ranked.is_empty());
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn section_draft_cites_sources_and_builds_reference_list() {
    let store = Arc::new(InMemoryVectorStore::new());
    let mut cited = chunk("smith2020", 0, "A cited passage.", vec![1.0, 0.1]);
    cited.metadata.insert("authors".to_string(), "Smith, J. and Doe, A.".to_string());
    cited.metadata.insert("year".to_string(), "2020".to_string());
    let anonymous = chunk("fieldnotes", 0, "An anonymous passage.", vec![1.0, 0.4]);
    store.upsert(&[cited, anonymous]).await.unwrap();

    let rerank = r#"{"ranking": [
        {"doc_id": "smith2020", "chunk_id": 0, "score": 0.9},
        {"doc_id": "fieldnotes", "chunk_id": 0, "score": 0.4}
    ]}"#;
    let provider = ScriptedCompletions::new(&[rerank, "Drafted section (Smith, 2020)."]);
    let pipeline = build_pipeline(store, provider.clone(), true);

    let draft = pipeline
        .draft_section(SectionKind::LiteratureReview, "citation behavior", None)
        .await
        .unwrap();

    assert_eq!(draft.text, "Drafted section (Smith, 2020).");
    assert_eq!(draft.citations.len(), 2);
    assert_eq!(draft.citations[0].in_text(), "(Smith, 2020)");
    assert_eq!(draft.citations[1].in_text(), "(fieldnotes)");
    assert!(draft.reference_list.contains("**References:**"));
    assert!(draft.reference_list.contains("Smith, J. and Doe, A. (2020). smith2020"));
    assert_eq!(draft.sources.len(), 2);

    let section_prompt = provider.prompt(1);
    assert!(section_prompt.contains("[Source 1: (Smith, 2020)]"));
    assert!(section_prompt.contains("[Source 2: (fieldnotes)]"));
    assert!(section_prompt.contains("Topic: citation behavior"));
}

#[tokio::test]
async fn section_draft_limits_citations_to_requested_sources() {
    let provider = ScriptedCompletions::new(&[RERANK_REVERSED, "Section text."]);
    let pipeline = build_pipeline(seeded_store().await, provider.clone(), true);

    let draft =
        pipeline.draft_section(SectionKind::Results, "window chunks", Some(2)).await.unwrap();

    assert_eq!(draft.citations.len(), 2);
    assert_eq!(draft.sources.len(), 2);
}

#[tokio::test]
async fn empty_store_yields_canned_section_without_generation() {
    let provider = ScriptedCompletions::new(&[]);
    let pipeline =
        build_pipeline(Arc::new(InMemoryVectorStore::new()), provider.clone(), true);

    let draft =
        pipeline.draft_section(SectionKind::Abstract, "unknown topic", None).await.unwrap();

    assert!(draft.text.contains("No matching documents"));
    assert!(draft.citations.is_empty());
    assert_eq!(draft.reference_list, "");
    assert!(draft.sources.is_empty());
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn reingesting_a_document_supersedes_its_chunks() {
    let store = Arc::new(InMemoryVectorStore::new());
    let provider = ScriptedCompletions::new(&[]);
    let pipeline = build_pipeline(store.clone(), provider, true);

    pipeline.ingest("doc1", "Original short note.").await.unwrap();
    assert_eq!(pipeline.chunk_count().await.unwrap(), 1);

    pipeline.ingest("doc1", "Replacement short note.").await.unwrap();
    assert_eq!(pipeline.chunk_count().await.unwrap(), 1);

    let results = store.search(&[1.0, 0.0], 10).await.unwrap();
    assert_eq!(results[0].chunk.content, "Replacement short note.");
}

#[tokio::test]
async fn ingesting_empty_text_is_a_validation_error() {
    let provider = ScriptedCompletions::new(&[]);
    let pipeline = build_pipeline(Arc::new(InMemoryVectorStore::new()), provider, true);

    let err = pipeline.ingest("doc1", "   ").await.unwrap_err();
    assert!(matches!(err, RagError::Validation(_)));
}

#[tokio::test]
async fn ingested_metadata_reaches_citations() {
    let store = Arc::new(InMemoryVectorStore::new());
    let mut metadata = HashMap::new();
    metadata.insert("authors".to_string(), "Keller, R.".to_string());
    metadata.insert("year".to_string(), "2015".to_string());

    let rerank = r#"{"ranking": [{"doc_id": "keller2015", "chunk_id": 0, "score": 1.0}]}"#;
    let provider = ScriptedCompletions::new(&[rerank, "Text (Keller, 2015)."]);
    let pipeline = build_pipeline(store, provider, true);

    pipeline
        .ingest_with_metadata("keller2015", "A short source text.", metadata)
        .await
        .unwrap();

    let draft =
        pipeline.draft_section(SectionKind::Discussion, "keller findings", None).await.unwrap();

    assert_eq!(draft.citations[0].in_text(), "(Keller, 2015)");
    assert!(draft.reference_list.contains("Keller, R. (2015). keller2015"));
}
