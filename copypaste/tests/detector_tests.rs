//! Behaviour of the detector over the in-memory store.

use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use copypaste::{
    CopypasteConfig, CopypasteDetector, CopypasteError, CopypasteStore, Document,
    MemoryCopypasteStore, Meta, PartialDocument, PartialShingledDocument, Preprocessor,
    ShingledDocument, SimilarDocument, SimilarStream, SimilarityThresholds,
};
use futures::{StreamExt, TryStreamExt, stream};

const JEST: &str = "Jest is a delightful JavaScript Testing Framework with a focus on simplicity.";

fn detector_with(store: Arc<MemoryCopypasteStore>) -> CopypasteDetector {
    CopypasteDetector::builder().store(store).build().unwrap()
}

async fn remembered_detector() -> (CopypasteDetector, Arc<MemoryCopypasteStore>) {
    let store = Arc::new(MemoryCopypasteStore::new());
    let detector = detector_with(store.clone());
    detector.remember_document(Document::new("1", vec![JEST.to_string()])).await.unwrap();
    (detector, store)
}

async fn check(detector: &CopypasteDetector, text: &str, limit: usize) -> Vec<SimilarDocument> {
    detector
        .check_document(PartialDocument::new(vec![text.to_string()]), limit)
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap()
}

#[tokio::test]
async fn detects_exactly_copied_text() {
    let (detector, _) = remembered_detector().await;
    let results = check(&detector, JEST, 1).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "1");
    assert_eq!(results[0].rel_similarity, 1.0);
}

#[tokio::test]
async fn detects_slightly_modified_text() {
    let (detector, _) = remembered_detector().await;
    let results =
        check(&detector, "Jests are the delightedly javascript test frameworks focused on simplicity!", 1)
            .await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "1");
    assert!(results[0].rel_similarity > 0.5);
}

#[tokio::test]
async fn ignores_unrelated_text() {
    let (detector, _) = remembered_detector().await;
    let results = check(
        &detector,
        "Tests are parallelized by running them in their own processes to maximize performance.",
        5,
    )
    .await;
    assert!(results.is_empty());
}

#[tokio::test]
async fn check_excludes_the_document_itself_when_id_is_given() {
    let (detector, _) = remembered_detector().await;
    let doc = PartialDocument::new(vec![JEST.to_string()]).with_id("1");
    let results: Vec<_> = detector.check_document(doc, 5).await.unwrap().try_collect().await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn identical_documents_under_different_ids_match() {
    let (detector, _) = remembered_detector().await;
    detector.remember_document(Document::new("2", vec![JEST.to_string()])).await.unwrap();
    let doc = PartialDocument::from(Document::new("1", vec![JEST.to_string()]));
    let results: Vec<_> = detector.check_document(doc, 5).await.unwrap().try_collect().await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "2");
    assert_eq!(results[0].rel_similarity, 1.0);
}

#[tokio::test]
async fn too_short_text_is_rejected_and_not_stored() {
    let store = Arc::new(MemoryCopypasteStore::new());
    let detector = detector_with(store.clone());

    let err = detector
        .remember_document(Document::new("short", vec!["It is what it is.".to_string()]))
        .await
        .unwrap_err();
    assert!(matches!(err, CopypasteError::TextTooShort));
    assert!(store.is_empty().await);

    let err = detector
        .check_document(PartialDocument::new(vec!["Two words".to_string()]), 1)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, CopypasteError::TextTooShort));
}

#[tokio::test]
async fn remember_overwrites_previous_content() {
    let (detector, _) = remembered_detector().await;
    let replacement = "Rust is a language empowering everyone to build reliable software.";
    detector.remember_document(Document::new("1", vec![replacement.to_string()])).await.unwrap();

    let doc = detector.fetch_document("1").await.unwrap();
    assert_eq!(doc.text_parts, vec![replacement.to_string()]);
    assert!(check(&detector, JEST, 1).await.is_empty());
}

#[tokio::test]
async fn fetch_returns_meta_and_fails_for_unknown_ids() {
    let store = Arc::new(MemoryCopypasteStore::new());
    let detector = detector_with(store);
    let meta = Meta::from([("author".to_string(), "someone".to_string())]);
    detector
        .remember_document(Document::new("1", vec![JEST.to_string()]).with_meta(meta.clone()))
        .await
        .unwrap();

    assert_eq!(detector.fetch_document("1").await.unwrap().meta, meta);
    let err = detector.fetch_document("missing").await.unwrap_err();
    assert!(matches!(err, CopypasteError::DocumentNotFound { ref id } if id == "missing"));
}

#[tokio::test]
async fn forget_is_idempotent() {
    let (detector, store) = remembered_detector().await;
    detector.forget_document("1").await.unwrap();
    detector.forget_document("1").await.unwrap();
    assert!(store.is_empty().await);
    assert!(check(&detector, JEST, 1).await.is_empty());
}

#[tokio::test]
async fn rejects_empty_ids_and_zero_limits() {
    let (detector, _) = remembered_detector().await;
    assert!(matches!(
        detector.remember_document(Document::new("", vec![JEST.to_string()])).await,
        Err(CopypasteError::InvalidArgument(_))
    ));
    assert!(matches!(detector.forget_document("").await, Err(CopypasteError::InvalidArgument(_))));
    assert!(matches!(
        detector.check_document(PartialDocument::new(vec![JEST.to_string()]), 0).await.err(),
        Some(CopypasteError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn results_are_limited_and_ranked() {
    let store = Arc::new(MemoryCopypasteStore::new());
    let detector = detector_with(store);
    let base = "alpha bravo charlie delta echo foxtrot golf hotel india juliet";
    detector.remember_document(Document::new("exact", vec![base.to_string()])).await.unwrap();
    detector
        .remember_document(Document::new("close", vec![format!("{base} kilo")]))
        .await
        .unwrap();
    detector
        .remember_document(Document::new("further", vec![format!("{base} kilo lima mike")]))
        .await
        .unwrap();

    let results = check(&detector, base, 2).await;
    let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["exact", "close"]);
    assert!(results[0].rel_similarity > results[1].rel_similarity);
}

#[tokio::test]
async fn default_limit_comes_from_config() {
    let store = Arc::new(MemoryCopypasteStore::new());
    let config = CopypasteConfig::builder().default_similar_limit(2).build().unwrap();
    let detector = CopypasteDetector::builder().config(config).store(store).build().unwrap();
    for id in ["a", "b", "c"] {
        detector.remember_document(Document::new(id, vec![JEST.to_string()])).await.unwrap();
    }

    let results: Vec<_> = detector
        .check(PartialDocument::new(vec![JEST.to_string()]))
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn abandoned_stream_leaves_the_store_usable() {
    let store = Arc::new(MemoryCopypasteStore::new());
    let detector = detector_with(store.clone());
    for id in ["a", "b", "c"] {
        detector.remember_document(Document::new(id, vec![JEST.to_string()])).await.unwrap();
    }

    let mut stream =
        detector.check_document(PartialDocument::new(vec![JEST.to_string()]), 3).await.unwrap();
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.id, "a");
    drop(stream);

    detector.forget_document("a").await.unwrap();
    assert_eq!(store.len().await, 2);
}

#[test]
fn build_fails_with_both_thresholds_disabled() {
    let config = CopypasteConfig {
        thresholds: SimilarityThresholds { abs_similarity: -1, rel_similarity: 0.0 },
        ..CopypasteConfig::default()
    };
    let result = CopypasteDetector::builder()
        .config(config)
        .store(Arc::new(MemoryCopypasteStore::new()))
        .build();
    assert!(matches!(result, Err(CopypasteError::InvalidConfiguration(_))));
}

#[test]
fn build_requires_a_store() {
    assert!(matches!(
        CopypasteDetector::builder().build(),
        Err(CopypasteError::InvalidConfiguration(_))
    ));
}

/// Emits every word of the text as its own shingle.
struct Words;

#[async_trait]
impl Preprocessor for Words {
    async fn process(&self, parts: Vec<String>, _meta: &Meta) -> copypaste::Result<Vec<String>> {
        Ok(parts.iter().flat_map(|p| p.split_whitespace().map(str::to_string)).collect())
    }
}

#[tokio::test]
async fn custom_preprocessor_and_absolute_threshold() {
    let store = Arc::new(MemoryCopypasteStore::new());
    let config = CopypasteConfig::builder()
        .thresholds(SimilarityThresholds::absolute(2).unwrap())
        .build()
        .unwrap();
    let detector = CopypasteDetector::builder()
        .config(config)
        .store(store.clone())
        .preprocessor(Arc::new(Words))
        .build()
        .unwrap();

    detector
        .remember_document(Document::new("long", vec!["a b c d e f g h".to_string()]))
        .await
        .unwrap();
    detector.remember_document(Document::new("pair", vec!["a b".to_string()])).await.unwrap();

    // Shares 3 words with "long" (rel 3/8) and 2 with "pair" (not above 2).
    let results = check(&detector, "a b c", 5).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "long");
    assert_eq!(results[0].abs_similarity, 3);

    let stored = store.get_document("long").await.unwrap().unwrap();
    assert_eq!(stored.text_parts, vec!["a b c d e f g h".to_string()]);
}

/// A store whose backend is always unavailable.
struct UnavailableStore;

fn unavailable() -> CopypasteError {
    CopypasteError::Store { backend: "unavailable".to_string(), message: "disk is gone".to_string() }
}

fn is_unavailable(err: &CopypasteError) -> bool {
    matches!(
        err,
        CopypasteError::Store { backend, message }
            if backend == "unavailable" && message == "disk is gone"
    )
}

#[async_trait]
impl CopypasteStore for UnavailableStore {
    async fn store_document(&self, _doc: &ShingledDocument) -> copypaste::Result<()> {
        Err(unavailable())
    }

    async fn delete_document(&self, _id: &str) -> copypaste::Result<()> {
        Err(unavailable())
    }

    async fn get_document(&self, _id: &str) -> copypaste::Result<Option<Document>> {
        Err(unavailable())
    }

    fn find_similar(
        &self,
        _doc: PartialShingledDocument,
        _thresholds: SimilarityThresholds,
        _limit: usize,
    ) -> SimilarStream<'_> {
        stream::once(async { Err(unavailable()) }).boxed()
    }
}

/// Collects formatted log output for assertions.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn store_failures_propagate_unchanged() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let detector = CopypasteDetector::builder().store(Arc::new(UnavailableStore)).build().unwrap();

    let err = detector.remember_document(Document::new("1", vec![JEST.to_string()])).await.unwrap_err();
    assert!(is_unavailable(&err), "{err:?}");
    let err = detector.forget_document("1").await.unwrap_err();
    assert!(is_unavailable(&err), "{err:?}");
    let err = detector.fetch_document("1").await.unwrap_err();
    assert!(is_unavailable(&err), "{err:?}");

    let results: Vec<_> =
        detector.check_document(PartialDocument::new(vec![JEST.to_string()]), 5).await.unwrap().collect().await;
    assert_eq!(results.len(), 1);
    assert!(is_unavailable(results[0].as_ref().unwrap_err()));

    let logs = logs.contents();
    assert!(logs.contains("failed to store document"), "{logs}");
    assert!(logs.contains("similarity search failed"), "{logs}");
    assert!(!logs.contains("remembered document"), "{logs}");
    assert!(!logs.contains("forgot document"), "{logs}");
}
