use cora::{
    api, config,
    embedding::get_embedding_client,
    engine::{EngineSettings, SupportEngine},
    llm::OllamaClient,
    logging,
    retrieval::Retriever,
    session::SessionManager,
    store::VectorStore,
    translate::TranslatorClient,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    config::init_config();
    logging::init_tracing();
    let config = config::get_config();

    let store = Arc::new(VectorStore::from_config().expect("Failed to initialize vector store"));
    store
        .ensure_collection()
        .await
        .expect("Failed to ensure knowledge collection exists");

    let engine = Arc::new(SupportEngine::new(
        Arc::new(Retriever::new(store, get_embedding_client())),
        Arc::new(SessionManager::from_config()),
        Arc::new(TranslatorClient::from_config()),
        Arc::new(OllamaClient::from_config()),
        EngineSettings::from_config(),
    ));
    let app = api::create_router(engine);

    let listener = TcpListener::bind((std::net::Ipv4Addr::UNSPECIFIED, config.server_port))
        .await
        .expect("Failed to bind listener");
    tracing::info!("Listening on http://0.0.0.0:{}", config.server_port);
    axum::serve(listener, app).await.unwrap();
}
