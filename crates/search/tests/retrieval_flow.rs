use codechat_code_chunker::{ChunkKind, Chunker, ChunkerConfig};
use codechat_indexer::{ChunkIndexer, IndexerConfig};
use codechat_search::{RetrievalRequest, Retriever};
use codechat_vector_store::{DistanceMetric, LocalVectorStore, StubEmbedder, VectorStore};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::TempDir;

const DIM: usize = 64;

const POINT_C: &str = "struct Point { int x; int y; };\nint add(int a, int b){ return a+b; }\n// adds two ints\n";

async fn pipeline(dir: &TempDir) -> (ChunkIndexer, Retriever, Arc<LocalVectorStore>) {
    let store = Arc::new(
        LocalVectorStore::open(dir.path().join("store.json"), DIM, DistanceMetric::L2)
            .await
            .unwrap(),
    );
    let embedder = Arc::new(StubEmbedder::new(DIM));
    let indexer = ChunkIndexer::with_config(
        Chunker::new(ChunkerConfig::default()).unwrap(),
        embedder.clone(),
        store.clone(),
        IndexerConfig::default().batch_size(100).concurrency(2),
    );
    let retriever = Retriever::new(embedder, store.clone());
    (indexer, retriever, store)
}

#[tokio::test]
async fn reindexing_unchanged_file_does_not_change_results() {
    let dir = TempDir::new().unwrap();
    let (indexer, retriever, _store) = pipeline(&dir).await;
    let request = RetrievalRequest::new("int add(int a, int b){ return a+b; }", 10, 4.0);

    indexer
        .index_source("point.c", "c", POINT_C.as_bytes().to_vec())
        .await
        .unwrap();
    let once = retriever.retrieve(&request).await.unwrap();

    indexer
        .index_source("point.c", "c", POINT_C.as_bytes().to_vec())
        .await
        .unwrap();
    let twice = retriever.retrieve(&request).await.unwrap();

    assert_eq!(once.len(), 3);
    assert_eq!(twice, once);
}

#[tokio::test]
async fn exact_content_comes_back_first() {
    let dir = TempDir::new().unwrap();
    let (indexer, retriever, _store) = pipeline(&dir).await;
    indexer
        .index_source("point.c", "c", POINT_C.as_bytes().to_vec())
        .await
        .unwrap();

    let chunks = retriever
        .retrieve(&RetrievalRequest::new("int add(int a, int b){ return a+b; }", 3, 4.0))
        .await
        .unwrap();
    assert_eq!(chunks[0].kind, ChunkKind::Function);
    assert_eq!(chunks[0].function_name.as_deref(), Some("add"));
    assert_eq!(chunks[0].start_line, 2);
    assert_eq!(chunks[0].distance, Some(0.0));
    assert!(chunks
        .windows(2)
        .all(|w| w[0].distance <= w[1].distance));
}

#[tokio::test]
async fn kind_filter_and_zero_threshold() {
    let dir = TempDir::new().unwrap();
    let (indexer, retriever, _store) = pipeline(&dir).await;
    indexer
        .index_source("point.c", "c", POINT_C.as_bytes().to_vec())
        .await
        .unwrap();

    let structs = retriever
        .retrieve(&RetrievalRequest::new("point", 10, 4.0).kind(ChunkKind::Struct))
        .await
        .unwrap();
    assert_eq!(structs.len(), 1);
    assert_eq!(structs[0].struct_name.as_deref(), Some("Point"));

    let none = retriever
        .retrieve(&RetrievalRequest::new("// adds two ints", 10, 0.0))
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn retrieval_runs_alongside_indexing() {
    let dir = TempDir::new().unwrap();
    let (indexer, retriever, store) = pipeline(&dir).await;

    let sources: Vec<String> = (0..8)
        .map(|i| format!("int f{i}(void) {{ return {i}; }}\n"))
        .collect();
    let indexing = {
        let indexer = indexer.clone();
        let sources = sources.clone();
        tokio::spawn(async move {
            for (i, text) in sources.into_iter().enumerate() {
                indexer
                    .index_source(&format!("f{i}.c"), "c", text.into_bytes())
                    .await
                    .unwrap();
            }
        })
    };
    for _ in 0..8 {
        retriever
            .retrieve(&RetrievalRequest::new("return", 5, 4.0))
            .await
            .unwrap();
    }
    indexing.await.unwrap();

    assert_eq!(store.count().await.unwrap(), 8);
    let all = retriever
        .retrieve(&RetrievalRequest::new("return", 100, 4.0))
        .await
        .unwrap();
    assert_eq!(all.len(), 8);
}
