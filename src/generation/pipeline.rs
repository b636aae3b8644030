//! Generation pipeline
//!
//! Runs the fixed stage sequence for one request: outline (internal) →
//! title → agenda → one stage per content slide → conclusion. Stages are
//! strictly sequential within a run; later stages receive the outline so
//! the deck stays coherent. A run either collects a complete deck (batch
//! mode) or yields slides one by one as stages complete (streaming mode).

use crate::backend::{BackendClient, StagePrompt};
use crate::error::AppError;
use crate::generation::prompts;
use crate::generation::types::{Deck, DeckRequest, Slide, SlideKind};
use async_stream::stream;
use futures_util::Stream;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One element of a streaming run
///
/// A stream ends after `Failed`; it is a terminal marker, not a retryable
/// condition. The sequence is finite, forward-only, and not restartable.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A completed slide, yielded before the next stage starts
    Slide(Slide),
    /// Terminal marker: a stage failed and no further stages will run
    Failed {
        /// Human-readable cause of the failure
        message: String,
    },
}

/// A resolved stage, ready to call the backend
struct PlannedStage {
    label: String,
    kind: SlideKind,
    prompt: StagePrompt,
    question_slide: bool,
}

/// One pipeline execution for one request
///
/// Ephemeral: owns no cross-request state and is destroyed when the run
/// finishes or is cancelled. Concurrency across runs is bounded by the
/// admission gate, not here.
pub struct PipelineRun {
    backend: Arc<BackendClient>,
    request: DeckRequest,
}

impl PipelineRun {
    /// Create a run for a validated request
    pub fn new(backend: Arc<BackendClient>, request: DeckRequest) -> Self {
        Self { backend, request }
    }

    /// Run every stage to completion and collect the deck
    ///
    /// Any stage failure fails the whole run; no partial deck is returned.
    pub async fn run_batch(self) -> Result<Deck, AppError> {
        info!(
            topic = %self.request.topic,
            slide_count = self.request.slide_count,
            "Starting batch pipeline run"
        );

        let outline = self.fetch_outline().await?;
        let stages = self.plan(&outline);

        let mut deck = Vec::with_capacity(stages.len());
        for stage in &stages {
            deck.push(self.run_stage(stage).await?);
        }

        info!(slides = deck.len(), "Batch pipeline run completed");
        Ok(deck)
    }

    /// Run the stage sequence lazily, yielding each slide as it completes
    ///
    /// The next stage does not start until the consumer has accepted the
    /// current slide, so production rate is coupled to consumption rate
    /// with one slide of buffering. On failure the stream yields a single
    /// terminal [`StreamEvent::Failed`] and ends.
    pub fn run_streaming(self) -> impl Stream<Item = StreamEvent> + Send {
        stream! {
            info!(
                topic = %self.request.topic,
                slide_count = self.request.slide_count,
                "Starting streaming pipeline run"
            );

            let outline = match self.fetch_outline().await {
                Ok(outline) => outline,
                Err(e) => {
                    warn!(error = %e, "Streaming run failed during outline stage");
                    yield StreamEvent::Failed { message: e.to_string() };
                    return;
                }
            };

            for stage in self.plan(&outline) {
                match self.run_stage(&stage).await {
                    Ok(slide) => yield StreamEvent::Slide(slide),
                    Err(e) => {
                        warn!(stage = %stage.label, error = %e, "Streaming run failed");
                        yield StreamEvent::Failed { message: e.to_string() };
                        return;
                    }
                }
            }

            info!("Streaming pipeline run completed");
        }
    }

    /// Derive the content-slide titles (internal stage, emits no slide)
    async fn fetch_outline(&self) -> Result<Vec<String>, AppError> {
        let raw = self
            .backend
            .call("outline", &prompts::outline(&self.request))
            .await?;
        Ok(parse_outline(&raw, self.request.slide_count as usize))
    }

    /// Resolve the emitting stages once the outline is known
    fn plan(&self, outline: &[String]) -> Vec<PlannedStage> {
        let question_index = self.request.question_slide_index();
        let mut stages = Vec::with_capacity(outline.len() + 3);

        stages.push(PlannedStage {
            label: "title".to_string(),
            kind: SlideKind::Title,
            prompt: prompts::title(&self.request),
            question_slide: false,
        });
        stages.push(PlannedStage {
            label: "agenda".to_string(),
            kind: SlideKind::Agenda,
            prompt: prompts::agenda(&self.request, outline),
            question_slide: false,
        });
        for (index, slide_title) in outline.iter().enumerate() {
            let question_slide = index == question_index;
            stages.push(PlannedStage {
                label: format!("content {}/{}", index + 1, outline.len()),
                kind: SlideKind::Content,
                prompt: prompts::content(&self.request, slide_title, index, question_slide),
                question_slide,
            });
        }
        stages.push(PlannedStage {
            label: "conclusion".to_string(),
            kind: SlideKind::Conclusion,
            prompt: prompts::conclusion(&self.request, outline),
            question_slide: false,
        });

        stages
    }

    /// Call the backend for one stage and shape the result into a slide
    async fn run_stage(&self, stage: &PlannedStage) -> Result<Slide, AppError> {
        let raw = self.backend.call(&stage.label, &stage.prompt).await?;
        let mut slide = parse_slide(&raw)?;

        // The stage defines the slide's position; the backend's claim is
        // advisory.
        slide.kind = stage.kind;

        match stage.kind {
            SlideKind::Content => {
                if stage.question_slide {
                    match &slide.question {
                        Some(question) if question.is_consistent() => {}
                        Some(_) => {
                            return Err(AppError::Backend(format!(
                                "stage {}: question answer is not among its options",
                                stage.label
                            )))
                        }
                        None => {
                            return Err(AppError::Backend(format!(
                                "stage {}: expected a question on this slide",
                                stage.label
                            )))
                        }
                    }
                } else if slide.question.take().is_some() {
                    debug!(
                        stage = %stage.label,
                        "Dropped question outside the designated slide"
                    );
                }
            }
            _ => {
                slide.image = None;
                slide.question = None;
            }
        }

        Ok(slide)
    }
}

/// Parse the outline response into exactly `n` content-slide titles
///
/// Takes the first `n` non-empty lines; short outlines are padded with
/// placeholder titles so the deck shape never depends on backend verbosity.
fn parse_outline(raw: &str, n: usize) -> Vec<String> {
    let mut titles: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(n)
        .map(str::to_string)
        .collect();

    while titles.len() < n {
        titles.push(format!("Point {}", titles.len() + 1));
    }

    titles
}

/// Remove a markdown code-fence wrapper if present
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    inner.trim()
}

/// Parse a backend response as a single slide
fn parse_slide(raw: &str) -> Result<Slide, AppError> {
    let stripped = strip_code_fence(raw);
    serde_json::from_str(stripped).map_err(|e| {
        AppError::Backend(format!(
            "Failed to parse slide JSON: {} - Response: {}",
            e, stripped
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CompletionApi;
    use async_trait::async_trait;
    use futures_util::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted backend: answers each stage by inspecting its system prompt.
    struct ScriptedApi {
        calls: AtomicUsize,
        question_everywhere: bool,
        omit_question: bool,
        fail_on_call: Option<usize>,
    }

    impl ScriptedApi {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                question_everywhere: false,
                omit_question: false,
                fail_on_call: None,
            }
        }

        fn slide_json(kind: &str, title: &str, question: bool) -> String {
            let question_part = if question {
                r#", "question": {"prompt": "Which step?", "options": ["A) One", "B) Two", "C) Three", "D) Four"], "answer": "B) Two"}"#
            } else {
                ""
            };
            format!(
                r#"{{"type": "{kind}", "title": "{title}", "content": "Body text."{question_part}}}"#
            )
        }
    }

    #[async_trait]
    impl CompletionApi for ScriptedApi {
        async fn complete(&self, prompt: &StagePrompt) -> Result<String, AppError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on_call == Some(call) {
                return Err(AppError::Backend("scripted failure".to_string()));
            }

            let system = &prompt.system;
            if system.contains("content slide titles") {
                return Ok("Evaporation\nCondensation\nPrecipitation\nCollection".to_string());
            }
            if system.contains("TITLE slide") {
                return Ok(Self::slide_json("title", "The Water Cycle", false));
            }
            if system.contains("AGENDA slide") {
                return Ok(Self::slide_json("agenda", "Agenda", false));
            }
            if system.contains("ONE content slide") {
                let wants_question = system.contains("Required: \"question\"");
                let question = if self.omit_question {
                    false
                } else {
                    wants_question || self.question_everywhere
                };
                return Ok(Self::slide_json("content", "Step", question));
            }
            if system.contains("CONCLUSION slide") {
                return Ok(Self::slide_json("conclusion", "Wrap-up", false));
            }
            Err(AppError::Backend(format!("unexpected prompt: {}", system)))
        }
    }

    fn run_for(api: ScriptedApi, slide_count: u32) -> PipelineRun {
        let backend = Arc::new(BackendClient::new(Arc::new(api), 5));
        PipelineRun::new(
            backend,
            DeckRequest {
                topic: "Water Cycle".to_string(),
                grade: "4th grade".to_string(),
                context: "Focus on evaporation".to_string(),
                slide_count,
            },
        )
    }

    fn assert_deck_shape(deck: &Deck, slide_count: usize) {
        assert_eq!(deck.len(), slide_count + 3);
        assert_eq!(deck[0].kind, SlideKind::Title);
        assert_eq!(deck[1].kind, SlideKind::Agenda);
        for slide in &deck[2..2 + slide_count] {
            assert_eq!(slide.kind, SlideKind::Content);
        }
        assert_eq!(deck[slide_count + 2].kind, SlideKind::Conclusion);
    }

    #[tokio::test]
    async fn test_batch_produces_fixed_deck_shape() {
        let deck = run_for(ScriptedApi::new(), 4).run_batch().await.unwrap();
        assert_deck_shape(&deck, 4);
    }

    #[tokio::test]
    async fn test_batch_places_question_on_middle_content_slide() {
        let deck = run_for(ScriptedApi::new(), 4).run_batch().await.unwrap();

        let content = &deck[2..6];
        for (index, slide) in content.iter().enumerate() {
            if index == 2 {
                let question = slide.question.as_ref().expect("middle slide has question");
                assert!(question.options.contains(&question.answer));
            } else {
                assert!(slide.question.is_none());
            }
        }
    }

    #[tokio::test]
    async fn test_batch_drops_extra_questions() {
        let mut api = ScriptedApi::new();
        api.question_everywhere = true;

        let deck = run_for(api, 4).run_batch().await.unwrap();
        let with_question = deck.iter().filter(|s| s.question.is_some()).count();
        assert_eq!(with_question, 1);
        assert!(deck[4].question.is_some());
    }

    #[tokio::test]
    async fn test_batch_fails_when_middle_question_missing() {
        let mut api = ScriptedApi::new();
        api.omit_question = true;

        let result = run_for(api, 4).run_batch().await;
        match result {
            Err(AppError::Backend(message)) => assert!(message.contains("expected a question")),
            other => panic!("Expected Backend error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_batch_single_content_slide_carries_question() {
        let deck = run_for(ScriptedApi::new(), 1).run_batch().await.unwrap();
        assert_deck_shape(&deck, 1);
        assert!(deck[2].question.is_some());
    }

    #[tokio::test]
    async fn test_batch_fails_whole_run_on_stage_failure() {
        let mut api = ScriptedApi::new();
        // Call 1 is the outline; call 4 is the first content stage.
        api.fail_on_call = Some(4);

        let result = run_for(api, 4).run_batch().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_streaming_yields_slides_in_stage_order() {
        let events: Vec<StreamEvent> = run_for(ScriptedApi::new(), 4)
            .run_streaming()
            .collect()
            .await;

        assert_eq!(events.len(), 7);
        let kinds: Vec<SlideKind> = events
            .iter()
            .map(|event| match event {
                StreamEvent::Slide(slide) => slide.kind,
                StreamEvent::Failed { message } => panic!("unexpected failure: {}", message),
            })
            .collect();
        assert_eq!(kinds[0], SlideKind::Title);
        assert_eq!(kinds[1], SlideKind::Agenda);
        assert_eq!(kinds[6], SlideKind::Conclusion);
    }

    #[tokio::test]
    async fn test_streaming_ends_with_terminal_marker_on_failure() {
        let mut api = ScriptedApi::new();
        // Outline, title, agenda, then the first content stage fails.
        api.fail_on_call = Some(4);

        let events: Vec<StreamEvent> = run_for(api, 4).run_streaming().collect().await;

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], StreamEvent::Slide(_)));
        assert!(matches!(events[1], StreamEvent::Slide(_)));
        assert!(matches!(events[2], StreamEvent::Failed { .. }));
    }

    #[tokio::test]
    async fn test_streaming_failure_on_outline_yields_only_marker() {
        let mut api = ScriptedApi::new();
        api.fail_on_call = Some(1);

        let events: Vec<StreamEvent> = run_for(api, 4).run_streaming().collect().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], StreamEvent::Failed { .. }));
    }

    #[test]
    fn test_parse_outline_pads_short_outlines() {
        let titles = parse_outline("Evaporation\nCondensation", 4);
        assert_eq!(
            titles,
            vec!["Evaporation", "Condensation", "Point 3", "Point 4"]
        );
    }

    #[test]
    fn test_parse_outline_truncates_long_outlines() {
        let titles = parse_outline("A\nB\nC\nD\nE", 3);
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_strip_code_fence_removes_wrapper() {
        let wrapped = "```json\n{\"type\": \"title\"}\n```";
        assert_eq!(strip_code_fence(wrapped), "{\"type\": \"title\"}");
    }

    #[test]
    fn test_strip_code_fence_leaves_plain_text() {
        assert_eq!(strip_code_fence("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_slide_rejects_invalid_json() {
        let result = parse_slide("not json at all");
        assert!(result.is_err());
    }
}
