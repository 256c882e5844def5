//! The conversational Q&A pipeline.
//!
//! One request flows: resolve session, resolve language, retrieve context,
//! assemble the prompt, stream the answer, normalize its language, then commit
//! the exchange to the session. The question is embedded in the language the
//! customer wrote it in; the multilingual embedding model carries
//! cross-language recall, so no translate-then-search round trip happens on
//! the retrieval path.
//!
//! The session exchange is appended only after the full response has been
//! observed. A failed, cancelled, or timed-out request leaves the session
//! length unchanged.

use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Serialize;
use tokio::time::{Instant, timeout};
use uuid::Uuid;

use crate::config::get_config;
use crate::language::{DEFAULT_LANGUAGE, normalize};
use crate::llm::{GenerationOptions, LlmClient, TokenStream};
use crate::prompt::{FALLBACK_ANSWER, NO_INFORMATION_ANSWER, build_qa_prompt};
use crate::retrieval::{Hit, Retriever};
use crate::session::SessionManager;
use crate::store::QueryFilter;
use crate::translate::TranslatorClient;

use super::{EngineError, EventStream, SupportApi};

const RETRIEVAL_TIMEOUT: Duration = Duration::from_secs(2);
const STREAM_IDLE_TIMEOUT: Duration = Duration::from_secs(30);
const ASK_DEADLINE: Duration = Duration::from_secs(60);

/// One Q&A request as received from the HTTP boundary.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct AskRequest {
    /// Customer question text.
    pub question: String,
    /// Question language; detected when absent.
    #[serde(default)]
    pub language: Option<String>,
    /// Application scope filter for retrieval.
    #[serde(default)]
    pub app_name: Option<String>,
    /// Session to continue; a fresh one is allocated when absent or expired.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Coarse answer quality derived from the best hit similarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Best similarity at or above 0.8.
    High,
    /// Best similarity at or above 0.6.
    Medium,
    /// Everything else, including empty retrieval.
    Low,
}

impl Confidence {
    /// Map the best hit similarity onto a confidence label.
    pub fn from_similarity(similarity: f32) -> Self {
        if similarity >= 0.8 {
            Self::High
        } else if similarity >= 0.6 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Source attribution projected from a hit used in the prompt.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    /// Source category (`article` | `pdf`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Article identifier, when the source is an article.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_id: Option<String>,
    /// Article title, when stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Application scope tag, when stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    /// Similarity rounded to three decimal places.
    pub similarity: f32,
}

/// Complete answer to one Q&A request.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerResult {
    /// Conversational answer text.
    pub answer: String,
    /// Sources that backed the answer, best first.
    pub sources: Vec<SourceRef>,
    /// Coarse quality label.
    pub confidence: Confidence,
    /// Number of hits retrieved for the prompt.
    pub retrieved_docs: usize,
    /// Session the exchange belongs to.
    pub session_id: String,
}

/// One event in the streaming Q&A response.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StreamEvent {
    /// One token chunk, forwarded verbatim from the model.
    Chunk {
        /// Chunk text.
        chunk: String,
    },
    /// Terminal payload carrying the complete result.
    Final {
        /// The complete answer.
        #[serde(rename = "final")]
        result: AnswerResult,
    },
}

/// Tunables threaded into the engine at construction time.
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    /// Number of hits requested from retrieval.
    pub search_limit: usize,
    /// Similarity threshold applied to hits.
    pub score_threshold: f32,
    /// User/assistant pairs included in any single prompt.
    pub max_turns: usize,
    /// Ceiling applied to language detection.
    pub detect_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            search_limit: 3,
            score_threshold: 0.3,
            max_turns: 20,
            detect_timeout: Duration::from_secs(5),
        }
    }
}

impl EngineSettings {
    /// Build settings from the process configuration.
    pub fn from_config() -> Self {
        let config = get_config();
        Self {
            search_limit: config.search_default_limit,
            score_threshold: config.search_score_threshold,
            max_turns: config.max_turns,
            detect_timeout: config.translator_timeout,
        }
    }
}

/// Orchestrates Q&A and classification over the shared components.
///
/// All handles are cheap to clone; the engine itself is cloned into streaming
/// response bodies so they can outlive the handler.
#[derive(Clone)]
pub struct SupportEngine {
    pub(crate) retriever: Arc<Retriever>,
    pub(crate) sessions: Arc<SessionManager>,
    pub(crate) translator: Arc<TranslatorClient>,
    pub(crate) llm: Arc<dyn LlmClient>,
    pub(crate) settings: EngineSettings,
}

impl SupportEngine {
    /// Build an engine over explicitly constructed components.
    pub fn new(
        retriever: Arc<Retriever>,
        sessions: Arc<SessionManager>,
        translator: Arc<TranslatorClient>,
        llm: Arc<dyn LlmClient>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            retriever,
            sessions,
            translator,
            llm,
            settings,
        }
    }

    async fn ask_pipeline(
        &self,
        request: &AskRequest,
        session_id: Uuid,
    ) -> Result<AnswerResult, EngineError> {
        let language = self.resolve_language(request).await;
        let (hits, context) = self
            .retrieve_context(&request.question, request.app_name.as_deref())
            .await;

        if hits.is_empty() {
            let result = self.no_information_result(session_id);
            self.sessions
                .append_exchange(&session_id, &request.question, &result.answer);
            return Ok(result);
        }

        let confidence = Confidence::from_similarity(hits[0].similarity);
        let history = self.sessions.history(&session_id, self.settings.max_turns);
        let prompt = build_qa_prompt(&history, &context, &request.question, self.settings.max_turns);

        let stream = self
            .llm
            .stream(&prompt, &GenerationOptions::conversational())
            .await?;
        let Some(answer) = drain_stream(stream, Instant::now() + ASK_DEADLINE).await? else {
            tracing::warn!(session_id = %session_id, "Token stream stalled; returning fallback");
            return Ok(self.fallback_result(session_id));
        };

        let answer = if answer.trim().is_empty() {
            FALLBACK_ANSWER.to_string()
        } else {
            self.normalize_answer_language(answer, &language).await
        };

        self.sessions
            .append_exchange(&session_id, &request.question, &answer);

        Ok(AnswerResult {
            answer,
            sources: project_sources(&hits),
            confidence,
            retrieved_docs: hits.len(),
            session_id: session_id.to_string(),
        })
    }

    /// Resolve the question language: explicit tag first, then detection.
    async fn resolve_language(&self, request: &AskRequest) -> String {
        if let Some(language) = request.language.as_deref().and_then(normalize) {
            return language.to_string();
        }

        match timeout(
            self.settings.detect_timeout,
            self.translator.detect(&request.question),
        )
        .await
        {
            Ok(Some(language)) => language,
            Ok(None) => DEFAULT_LANGUAGE.to_string(),
            Err(_) => {
                tracing::warn!("Language detection timed out; assuming default");
                DEFAULT_LANGUAGE.to_string()
            }
        }
    }

    /// Retrieve context, degrading to the empty path on any failure.
    pub(crate) async fn retrieve_context(
        &self,
        query: &str,
        app_name: Option<&str>,
    ) -> (Vec<Hit>, String) {
        let filter = QueryFilter {
            app_name: app_name
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            ..Default::default()
        };

        match timeout(
            RETRIEVAL_TIMEOUT,
            self.retriever.retrieve_and_format(
                query,
                self.settings.search_limit,
                &filter,
                self.settings.score_threshold,
            ),
        )
        .await
        {
            Ok(Ok(pair)) => pair,
            Ok(Err(error)) => {
                tracing::warn!(error = %error, "Retrieval failed; continuing without context");
                (Vec::new(), String::new())
            }
            Err(_) => {
                tracing::warn!("Retrieval timed out; continuing without context");
                (Vec::new(), String::new())
            }
        }
    }

    /// Translate the answer back to the question language when the model
    /// drifted. Best-effort: any translator trouble keeps the original text.
    async fn normalize_answer_language(&self, answer: String, language: &str) -> String {
        match self.translator.detect(&answer).await {
            Some(detected) if detected != language => {
                self.translator
                    .translate(&answer, &detected, language)
                    .await
                    .text
            }
            _ => answer,
        }
    }

    fn no_information_result(&self, session_id: Uuid) -> AnswerResult {
        AnswerResult {
            answer: NO_INFORMATION_ANSWER.to_string(),
            sources: Vec::new(),
            confidence: Confidence::Low,
            retrieved_docs: 0,
            session_id: session_id.to_string(),
        }
    }

    fn fallback_result(&self, session_id: Uuid) -> AnswerResult {
        AnswerResult {
            answer: FALLBACK_ANSWER.to_string(),
            sources: Vec::new(),
            confidence: Confidence::Low,
            retrieved_docs: 0,
            session_id: session_id.to_string(),
        }
    }
}

#[async_trait]
impl SupportApi for SupportEngine {
    async fn ask(&self, request: AskRequest) -> Result<AnswerResult, EngineError> {
        let (session_id, _is_new) = self.sessions.get_or_create(request.session_id.as_deref());
        match timeout(ASK_DEADLINE, self.ask_pipeline(&request, session_id)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(session_id = %session_id, "Q&A deadline exceeded; returning fallback");
                Ok(self.fallback_result(session_id))
            }
        }
    }

    async fn ask_stream(&self, request: AskRequest) -> EventStream {
        let engine = self.clone();
        Box::pin(stream! {
            let deadline = Instant::now() + ASK_DEADLINE;
            let (session_id, _is_new) = engine.sessions.get_or_create(request.session_id.as_deref());
            let (hits, context) = engine
                .retrieve_context(&request.question, request.app_name.as_deref())
                .await;

            if hits.is_empty() {
                let result = engine.no_information_result(session_id);
                engine
                    .sessions
                    .append_exchange(&session_id, &request.question, &result.answer);
                yield StreamEvent::Chunk { chunk: result.answer.clone() };
                yield StreamEvent::Final { result };
                return;
            }

            let confidence = Confidence::from_similarity(hits[0].similarity);
            let history = engine.sessions.history(&session_id, engine.settings.max_turns);
            let prompt =
                build_qa_prompt(&history, &context, &request.question, engine.settings.max_turns);

            let mut tokens = match engine
                .llm
                .stream(&prompt, &GenerationOptions::conversational())
                .await
            {
                Ok(tokens) => tokens,
                Err(error) => {
                    tracing::error!(error = %error, "Failed to open token stream");
                    let result = engine.fallback_result(session_id);
                    yield StreamEvent::Chunk { chunk: result.answer.clone() };
                    yield StreamEvent::Final { result };
                    return;
                }
            };

            let mut answer = String::new();
            loop {
                let budget = STREAM_IDLE_TIMEOUT.min(deadline.saturating_duration_since(Instant::now()));
                match timeout(budget, tokens.next()).await {
                    Ok(Some(Ok(chunk))) => {
                        answer.push_str(&chunk);
                        yield StreamEvent::Chunk { chunk };
                    }
                    Ok(Some(Err(error))) => {
                        tracing::error!(error = %error, "Token stream failed mid-answer");
                        let result = engine.fallback_result(session_id);
                        yield StreamEvent::Final { result };
                        return;
                    }
                    Ok(None) => break,
                    Err(_) => {
                        tracing::warn!(session_id = %session_id, "Token stream stalled; closing");
                        let result = engine.fallback_result(session_id);
                        yield StreamEvent::Final { result };
                        return;
                    }
                }
            }

            // The exchange commits only after the stream fully drained, so a
            // disconnected client never leaves a half-turn behind.
            engine
                .sessions
                .append_exchange(&session_id, &request.question, &answer);

            yield StreamEvent::Final {
                result: AnswerResult {
                    answer,
                    sources: project_sources(&hits),
                    confidence,
                    retrieved_docs: hits.len(),
                    session_id: session_id.to_string(),
                },
            };
        })
    }

    async fn classify(
        &self,
        text: &str,
    ) -> Result<super::ClassificationResult, EngineError> {
        SupportEngine::classify(self, text).await
    }
}

/// Drain a token stream with an inactivity ceiling and an overall deadline.
///
/// Returns `None` when either ceiling is breached; the caller converts that to
/// the user-safe fallback instead of an error.
async fn drain_stream(
    mut stream: TokenStream,
    deadline: Instant,
) -> Result<Option<String>, EngineError> {
    let mut answer = String::new();
    loop {
        let budget = STREAM_IDLE_TIMEOUT.min(deadline.saturating_duration_since(Instant::now()));
        match timeout(budget, stream.next()).await {
            Ok(Some(Ok(chunk))) => answer.push_str(&chunk),
            Ok(Some(Err(error))) => return Err(EngineError::Llm(error)),
            Ok(None) => return Ok(Some(answer)),
            Err(_) => return Ok(None),
        }
    }
}

/// Project hits used in the prompt onto source attributions.
fn project_sources(hits: &[Hit]) -> Vec<SourceRef> {
    hits.iter()
        .map(|hit| SourceRef {
            kind: hit.metadata.doc_type.clone(),
            article_id: hit.metadata.article_id.clone(),
            title: hit.metadata.title.clone(),
            app: hit.metadata.app_name.clone(),
            similarity: round_3dp(hit.similarity),
        })
        .collect()
}

fn round_3dp(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbeddingClient;
    use crate::llm::LlmError;
    use crate::store::VectorStore;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;
    use std::sync::Mutex;

    /// Stub backend yielding a fixed chunk script.
    struct ScriptedLlm {
        chunks: Vec<Result<String, String>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn answering(chunks: &[&str]) -> Self {
            Self {
                chunks: chunks.iter().map(|c| Ok((*c).to_string())).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                chunks: vec![Err("backend exploded".to_string())],
                calls: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.calls.lock().expect("calls mutex").clone()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn generate_json(
            &self,
            _prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<serde_json::Value, LlmError> {
            Err(LlmError::InvalidResponse("not used".into()))
        }

        async fn stream(
            &self,
            prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<TokenStream, LlmError> {
            self.calls
                .lock()
                .expect("calls mutex")
                .push(prompt.to_string());
            let chunks = self.chunks.clone();
            Ok(Box::pin(futures_util::stream::iter(chunks.into_iter().map(
                |chunk| chunk.map_err(LlmError::InvalidResponse),
            ))))
        }
    }

    fn mock_query_response(server: &MockServer, result: serde_json::Value) {
        server.mock(|when, then| {
            when.method(POST).path("/collections/kb/points/query");
            then.status(200)
                .json_body(json!({ "status": "ok", "result": result }));
        });
    }

    fn engine_with(server: &MockServer, llm: Arc<ScriptedLlm>) -> SupportEngine {
        let store = Arc::new(VectorStore {
            client: reqwest::Client::builder()
                .user_agent("cora-test")
                .build()
                .expect("client"),
            base_url: server.base_url(),
            api_key: None,
            collection: "kb".into(),
            vector_size: 8,
            batch_size: 64,
        });
        SupportEngine::new(
            Arc::new(Retriever::new(store, Arc::new(HashEmbeddingClient::new(8)))),
            Arc::new(SessionManager::new(Duration::from_secs(1800))),
            Arc::new(TranslatorClient::new(None, Duration::from_secs(5))),
            llm,
            EngineSettings::default(),
        )
    }

    fn article_hits() -> serde_json::Value {
        json!([
            {
                "id": "r1",
                "score": 0.2,
                "payload": {
                    "type": "article",
                    "article_id": "17",
                    "app_name": "ana",
                    "title": "Reset password",
                    "language": "en",
                    "text": "[Article 17] [ana] Reset password\nOpen settings."
                }
            }
        ])
    }

    #[tokio::test]
    async fn ask_answers_with_sources_and_grows_the_session_by_two() {
        let server = MockServer::start_async().await;
        mock_query_response(&server, article_hits());
        let llm = Arc::new(ScriptedLlm::answering(&["Open ", "settings ", "first."]));
        let engine = engine_with(&server, llm);

        let result = engine
            .ask(AskRequest {
                question: "How do I reset my password?".into(),
                language: Some("en".into()),
                app_name: None,
                session_id: None,
            })
            .await
            .expect("answer");

        assert_eq!(result.answer, "Open settings first.");
        assert_eq!(result.retrieved_docs, 1);
        // distance 0.2 -> similarity 1/1.2 ~ 0.833 -> high confidence.
        assert_eq!(result.confidence, Confidence::High);
        assert_eq!(result.sources.len(), 1);
        assert_eq!(result.sources[0].article_id.as_deref(), Some("17"));
        assert_eq!(result.sources[0].kind, "article");
        assert!((result.sources[0].similarity - 0.833).abs() < 1e-6);

        let session_id = Uuid::parse_str(&result.session_id).expect("uuid");
        assert_eq!(engine.sessions.len(&session_id), 2);
    }

    #[tokio::test]
    async fn ask_short_circuits_on_empty_retrieval() {
        let server = MockServer::start_async().await;
        mock_query_response(&server, json!([]));
        let llm = Arc::new(ScriptedLlm::answering(&["never used"]));
        let engine = engine_with(&server, llm.clone());

        let result = engine
            .ask(AskRequest {
                question: "Anything indexed?".into(),
                language: Some("en".into()),
                app_name: None,
                session_id: None,
            })
            .await
            .expect("answer");

        assert_eq!(result.answer, NO_INFORMATION_ANSWER);
        assert_eq!(result.confidence, Confidence::Low);
        assert!(result.sources.is_empty());
        assert_eq!(result.retrieved_docs, 0);
        // The model is never consulted on the empty path.
        assert!(llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn ask_degrades_to_no_information_when_the_store_is_down() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/collections/kb/points/query");
            then.status(503).body("down");
        });
        let engine = engine_with(&server, Arc::new(ScriptedLlm::answering(&["unused"])));

        let result = engine
            .ask(AskRequest {
                question: "Is the store up?".into(),
                language: Some("en".into()),
                app_name: None,
                session_id: None,
            })
            .await
            .expect("degraded answer");

        assert_eq!(result.confidence, Confidence::Low);
        assert!(result.sources.is_empty());
    }

    #[tokio::test]
    async fn ask_surfaces_llm_stream_failures_as_engine_errors() {
        let server = MockServer::start_async().await;
        mock_query_response(&server, article_hits());
        let engine = engine_with(&server, Arc::new(ScriptedLlm::failing()));

        let request = AskRequest {
            question: "How do I reset my password?".into(),
            language: Some("en".into()),
            app_name: None,
            session_id: None,
        };
        let error = engine.ask(request).await.expect_err("llm error");
        assert!(matches!(error, EngineError::Llm(_)));
    }

    #[tokio::test]
    async fn failed_requests_leave_the_session_untouched() {
        let server = MockServer::start_async().await;
        mock_query_response(&server, article_hits());
        let engine = engine_with(&server, Arc::new(ScriptedLlm::failing()));

        let (session_id, _) = engine.sessions.get_or_create(None);
        let request = AskRequest {
            question: "How do I reset my password?".into(),
            language: Some("en".into()),
            app_name: None,
            session_id: Some(session_id.to_string()),
        };
        let _ = engine.ask(request).await;
        assert_eq!(engine.sessions.len(&session_id), 0);
    }

    #[tokio::test]
    async fn session_memory_flows_into_the_prompt() {
        let server = MockServer::start_async().await;
        mock_query_response(&server, article_hits());
        let llm = Arc::new(ScriptedLlm::answering(&["You tried restarting first."]));
        let engine = engine_with(&server, llm.clone());

        let (session_id, _) = engine.sessions.get_or_create(None);
        engine.sessions.append_exchange(
            &session_id,
            "My phone has no signal",
            "Try restarting your phone.",
        );
        engine.sessions.append_exchange(
            &session_id,
            "I already tried restarting",
            "Check the SIM seating next.",
        );

        let result = engine
            .ask(AskRequest {
                question: "What did I try first?".into(),
                language: Some("en".into()),
                app_name: None,
                session_id: Some(session_id.to_string()),
            })
            .await
            .expect("answer");

        assert_eq!(result.session_id, session_id.to_string());
        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Customer: My phone has no signal"));
        assert!(prompts[0].contains("You: Try restarting your phone."));
        assert!(prompts[0].ends_with("Customer: What did I try first?\nYou:"));
        assert_eq!(engine.sessions.len(&session_id), 6);
    }

    #[tokio::test]
    async fn ask_stream_emits_chunks_then_a_final_payload() {
        let server = MockServer::start_async().await;
        mock_query_response(&server, article_hits());
        let llm = Arc::new(ScriptedLlm::answering(&["Open ", "settings."]));
        let engine = engine_with(&server, llm);

        let mut events = engine
            .ask_stream(AskRequest {
                question: "How do I reset my password?".into(),
                language: Some("en".into()),
                app_name: None,
                session_id: None,
            })
            .await;

        let mut chunks = Vec::new();
        let mut finals = Vec::new();
        while let Some(event) = events.next().await {
            match event {
                StreamEvent::Chunk { chunk } => chunks.push(chunk),
                StreamEvent::Final { result } => finals.push(result),
            }
        }

        assert_eq!(chunks, vec!["Open ".to_string(), "settings.".to_string()]);
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].answer, "Open settings.");
        assert_eq!(finals[0].sources.len(), 1);

        let session_id = Uuid::parse_str(&finals[0].session_id).expect("uuid");
        assert_eq!(engine.sessions.len(&session_id), 2);
    }

    #[tokio::test]
    async fn abandoned_stream_appends_nothing() {
        let server = MockServer::start_async().await;
        mock_query_response(&server, article_hits());
        let llm = Arc::new(ScriptedLlm::answering(&["Open ", "settings."]));
        let engine = engine_with(&server, llm);

        let (session_id, _) = engine.sessions.get_or_create(None);
        let mut events = engine
            .ask_stream(AskRequest {
                question: "How do I reset my password?".into(),
                language: Some("en".into()),
                app_name: None,
                session_id: Some(session_id.to_string()),
            })
            .await;

        // Consume one chunk, then drop the stream as a disconnecting client would.
        let first = events.next().await;
        assert!(matches!(first, Some(StreamEvent::Chunk { .. })));
        drop(events);

        assert_eq!(engine.sessions.len(&session_id), 0);
    }

    #[test]
    fn confidence_bands_match_the_thresholds() {
        assert_eq!(Confidence::from_similarity(0.85), Confidence::High);
        assert_eq!(Confidence::from_similarity(0.8), Confidence::High);
        assert_eq!(Confidence::from_similarity(0.7), Confidence::Medium);
        assert_eq!(Confidence::from_similarity(0.6), Confidence::Medium);
        assert_eq!(Confidence::from_similarity(0.59), Confidence::Low);
    }

    #[test]
    fn similarity_rounds_to_three_decimals() {
        assert_eq!(round_3dp(0.833_333_3), 0.833);
        assert_eq!(round_3dp(0.999_9), 1.0);
    }
}
