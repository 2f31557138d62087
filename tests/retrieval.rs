use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ragkb::embed::cache::EmbeddingCache;
use ragkb::embed::{Embedding, EmbeddingService};
use ragkb::{Corpus, EmbeddingProvider, Retriever, ServiceError, corpus::format_context};

/// Bag-of-keywords embedding: one dimension per keyword, 1.0 when the text mentions it.
struct KeywordService {
    keywords: Vec<&'static str>,
    calls: AtomicUsize,
}

impl KeywordService {
    fn new(keywords: Vec<&'static str>) -> Self {
        Self {
            keywords,
            calls: AtomicUsize::new(0),
        }
    }
}

impl EmbeddingService for KeywordService {
    fn embed(&self, text: &str, _model: &str) -> Result<Embedding, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let lower = text.to_lowercase();
        Ok(self
            .keywords
            .iter()
            .map(|k| if lower.contains(k) { 1.0 } else { 0.0 })
            .collect())
    }

    fn name(&self) -> &str {
        "keywords"
    }
}

fn retriever(service: Arc<KeywordService>) -> Retriever {
    let provider = EmbeddingProvider::new(
        service,
        Arc::new(EmbeddingCache::default()),
        "keyword-model",
    );
    Retriever::new(provider, Corpus::builtin().into_documents()).with_max_concurrent(2)
}

#[test]
fn rag_question_finds_the_rag_document() {
    let service = Arc::new(KeywordService::new(vec!["rag", "retrieval", "python", "벡터"]));
    let retriever = retriever(service);

    let docs = retriever.most_relevant("What is RAG retrieval?", 1).unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, "doc3");
}

#[test]
fn context_for_answer_generation() {
    let service = Arc::new(KeywordService::new(vec!["벡터", "임베딩", "데이터베이스"]));
    let retriever = retriever(service);

    let docs = retriever
        .most_relevant("임베딩 벡터를 저장하는 데이터베이스는?", 1)
        .unwrap();
    let context = format_context(&docs);
    assert!(context.starts_with("[벡터 데이터베이스]\n"));
}

#[test]
fn repeated_queries_only_embed_the_new_query() {
    let service = Arc::new(KeywordService::new(vec!["python", "fastapi"]));
    let retriever = retriever(service.clone());

    retriever.most_relevant("python", 2).unwrap();
    assert_eq!(service.calls.load(Ordering::SeqCst), 6);

    retriever.most_relevant("fastapi", 2).unwrap();
    assert_eq!(service.calls.load(Ordering::SeqCst), 7);
}

#[test]
fn scores_cover_every_document_when_top_k_saturates() {
    let service = Arc::new(KeywordService::new(vec!["python", "llm", "api"]));
    let retriever = retriever(service);

    let ranked = retriever.rank("python api", 100).unwrap();
    assert_eq!(ranked.len(), 5);

    let by_id: HashMap<_, _> = ranked
        .iter()
        .map(|s| (s.document.id.as_str(), s.score))
        .collect();
    assert!(by_id["doc2"] >= by_id["doc5"]);
    for pair in ranked.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn blank_question_retrieves_nothing() {
    let service = Arc::new(KeywordService::new(vec!["python"]));
    let retriever = retriever(service.clone());

    assert!(retriever.most_relevant("", 2).unwrap().is_empty());
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
}
