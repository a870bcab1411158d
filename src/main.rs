use docquery::{
    answer::{AnswerService, AnswerSettings},
    api::{self, AppState},
    config, extract,
    embedding::OllamaClient,
    ingest::{IngestSettings, IngestionPipeline},
    logging,
    metrics::CoreMetrics,
    store::{MemoryStore, RecordStore},
    vector::{QdrantIndex, VectorIndex},
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    logging::init_tracing();
    let config = config::init_config().expect("Failed to load config from environment");

    let extractor: Arc<dyn extract::TextExtractor> = Arc::new(extract::FileExtractor::new());
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let embeddings: Arc<dyn docquery::embedding::EmbeddingClient> =
        Arc::new(OllamaClient::from_config(&config));
    let index: Arc<dyn VectorIndex> =
        Arc::new(QdrantIndex::from_config(&config).expect("Failed to connect to Qdrant"));
    index
        .ensure_ready()
        .await
        .expect("Failed to ensure vector collection exists");

    let metrics = Arc::new(CoreMetrics::new());
    let pipeline = IngestionPipeline::new(
        extractor,
        store.clone(),
        embeddings.clone(),
        index.clone(),
        IngestSettings::from_config(&config),
        metrics.clone(),
    );
    let answers = AnswerService::new(
        store,
        embeddings,
        index,
        AnswerSettings::from_config(&config),
        metrics,
    );

    let app = api::create_router(AppState {
        ingest: Arc::new(pipeline),
        answer: Arc::new(answers),
    });

    let (listener, port) = bind_listener(config.server_port)
        .await
        .expect("Failed to bind listener");
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await.unwrap();
}

async fn bind_listener(
    configured_port: Option<u16>,
) -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    if let Some(port) = configured_port {
        return TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map(|listener| (listener, port));
    }

    const PORT_RANGE: std::ops::RangeInclusive<u16> = 4200..=4299;
    for port in PORT_RANGE {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                tracing::debug!(port, "Bound server port");
                return Ok((listener, port));
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use; trying next");
                continue;
            }
            Err(err) => return Err(err),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        "No available port found in range 4200-4299",
    ))
}
