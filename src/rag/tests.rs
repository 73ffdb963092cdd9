use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::*;
use crate::search::SearchEngine;

fn candidate(id: &str, score: f64) -> Candidate {
    Candidate {
        id: id.to_string(),
        title: format!("title {}", id),
        description: format!("description {}", id),
        cover_image: None,
        score,
    }
}

/// Engine fake with fixed per-primitive result lists.
struct FakeEngine {
    vector_results: Vec<Candidate>,
    lexical_results: Vec<Candidate>,
    vector_calls: AtomicUsize,
}

impl FakeEngine {
    fn new(vector_results: Vec<Candidate>, lexical_results: Vec<Candidate>) -> Self {
        Self {
            vector_results,
            lexical_results,
            vector_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SearchEngine for FakeEngine {
    async fn vector_search(
        &self,
        _index: &str,
        _vector_path: &str,
        _query_vector: &[f32],
        _num_candidates: usize,
        limit: usize,
    ) -> Result<Vec<Candidate>, RagError> {
        self.vector_calls.fetch_add(1, Ordering::SeqCst);
        let mut results = self.vector_results.clone();
        results.truncate(limit);
        Ok(results)
    }

    async fn text_search(
        &self,
        _index: &str,
        _query: &str,
        _paths: &[String],
        limit: usize,
    ) -> Result<Vec<Candidate>, RagError> {
        let mut results = self.lexical_results.clone();
        results.truncate(limit);
        Ok(results)
    }
}

/// Embedder fake that tags each vector with its input's position and records
/// every batch it receives.
struct FakeTextEmbedder {
    batches: Mutex<Vec<Vec<String>>>,
}

impl FakeTextEmbedder {
    fn new() -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextEmbedder for FakeTextEmbedder {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        self.batches.lock().unwrap().push(texts.to_vec());
        Ok(texts
            .iter()
            .enumerate()
            .map(|(i, text)| vec![i as f32, text.len() as f32])
            .collect())
    }
}

struct FakeImageEmbedder {
    vector: Option<Vec<f32>>,
}

#[async_trait]
impl ImageEmbedder for FakeImageEmbedder {
    async fn embed_image(
        &self,
        _bytes: &[u8],
        _mime_type: &str,
    ) -> Result<Option<Vec<f32>>, RagError> {
        Ok(self.vector.clone())
    }
}

/// Generator fake that echoes the query and context size.
struct FakeGenerator {
    calls: AtomicUsize,
}

impl FakeGenerator {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    async fn generate(&self, query: &str, context: &[Candidate]) -> Result<String, RagError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{} ({} chunks)", query, context.len()))
    }
}

fn pipeline_with(
    engine: Arc<FakeEngine>,
    image_vector: Option<Vec<f32>>,
) -> (RagPipeline, Arc<FakeGenerator>) {
    let config = RetrievalConfig::default();
    let generator = Arc::new(FakeGenerator::new());
    let pipeline = RagPipeline::new(
        Arc::new(FakeTextEmbedder::new()),
        Arc::new(FakeImageEmbedder {
            vector: image_vector,
        }),
        VectorRetriever::new(engine.clone(), config.clone()),
        LexicalRetriever::new(engine, config.clone()),
        RerankOrchestrator::disabled(),
        generator.clone(),
        config,
    );
    (pipeline, generator)
}

#[tokio::test]
async fn hybrid_fuses_both_signals() {
    let engine = Arc::new(FakeEngine::new(
        vec![candidate("1", 0.9), candidate("2", 0.8)],
        vec![candidate("3", 5.0), candidate("1", 4.0)],
    ));
    let (pipeline, _) = pipeline_with(engine, None);

    let answer = pipeline.answer_hybrid("red sneakers", 2).await.unwrap();

    // id 1 appears in both lists and must rank first after fusion.
    assert_eq!(answer.context_chunks.len(), 2);
    assert_eq!(answer.context_chunks[0].title, "title 1");
    assert!(answer.context_chunks[0].score > answer.context_chunks[1].score);
}

#[tokio::test]
async fn hybrid_without_lexical_results_uses_vector_ranking() {
    let engine = Arc::new(FakeEngine::new(
        vec![candidate("1", 0.9), candidate("2", 0.8)],
        vec![],
    ));
    let (pipeline, _) = pipeline_with(engine, None);

    let answer = pipeline.answer_hybrid("red sneakers", 2).await.unwrap();

    assert_eq!(answer.context_chunks.len(), 2);
    assert_eq!(answer.context_chunks[0].title, "title 1");
    // Vector scores survive untouched when no fusion happened.
    assert!((answer.context_chunks[0].score - 0.9).abs() < 1e-12);
}

#[tokio::test]
async fn text_query_answers_with_public_fields_only() {
    let mut with_image = candidate("1", 0.9);
    with_image.cover_image = Some("covers/1.jpg".to_string());
    let engine = Arc::new(FakeEngine::new(vec![with_image], vec![]));
    let (pipeline, generator) = pipeline_with(engine, None);

    let answer = pipeline.answer_text("red sneakers", 3).await.unwrap();

    assert_eq!(answer.answer, "red sneakers (1 chunks)");
    assert_eq!(answer.context_chunks.len(), 1);
    assert_eq!(
        answer.context_chunks[0].cover_image.as_deref(),
        Some("covers/1.jpg")
    );
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_image_embedding_short_circuits() {
    let engine = Arc::new(FakeEngine::new(vec![candidate("1", 0.9)], vec![]));
    let (pipeline, generator) = pipeline_with(engine.clone(), None);

    let answer = pipeline
        .answer_image(&[1, 2, 3], "image/png", None, 3)
        .await
        .unwrap();

    assert_eq!(answer.answer, COULD_NOT_EMBED_IMAGE_ANSWER);
    assert!(answer.context_chunks.is_empty());
    // No retrieval, no generation.
    assert_eq!(engine.vector_calls.load(Ordering::SeqCst), 0);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn image_query_retrieves_on_image_modality() {
    let engine = Arc::new(FakeEngine::new(vec![candidate("1", 0.9)], vec![]));
    let (pipeline, _) = pipeline_with(engine, Some(vec![0.5, 0.5]));

    let answer = pipeline
        .answer_image(&[1, 2, 3], "image/jpeg", Some("matching sofa"), 3)
        .await
        .unwrap();

    assert_eq!(answer.context_chunks.len(), 1);
    assert_eq!(answer.answer, "matching sofa (1 chunks)");
}

#[tokio::test]
async fn invalid_input_is_rejected_before_any_provider_call() {
    let engine = Arc::new(FakeEngine::new(vec![candidate("1", 0.9)], vec![]));
    let (pipeline, generator) = pipeline_with(engine.clone(), None);

    assert!(matches!(
        pipeline.answer_text("   ", 3).await,
        Err(RagError::BadRequest(_))
    ));
    assert!(matches!(
        pipeline.answer_text("query", 0).await,
        Err(RagError::BadRequest(_))
    ));
    assert!(matches!(
        pipeline.answer_text("query", 21).await,
        Err(RagError::BadRequest(_))
    ));
    assert!(matches!(
        pipeline.answer_image(&[], "image/png", None, 3).await,
        Err(RagError::BadRequest(_))
    ));

    assert_eq!(engine.vector_calls.load(Ordering::SeqCst), 0);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn batch_embedding_preserves_input_order() {
    let embedder = FakeTextEmbedder::new();
    let inputs = vec!["a".to_string(), "bb".to_string(), "ccc".to_string()];

    let vectors = embedder.embed_texts(&inputs).await.unwrap();

    assert_eq!(vectors.len(), 3);
    for (i, (vector, input)) in vectors.iter().zip(&inputs).enumerate() {
        assert_eq!(vector[0], i as f32);
        assert_eq!(vector[1], input.len() as f32);
    }

    // The single-string convenience goes through the same batch path.
    let single = embedder.embed_text("hello").await.unwrap();
    assert_eq!(single, vec![0.0, 5.0]);
    assert_eq!(embedder.batches.lock().unwrap().len(), 2);
}
