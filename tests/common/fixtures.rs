use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use storyloom::pipeline::ProjectBrief;
use storyloom::synthesis::{SynthesisError, SynthesisRequest, Synthesizer};

/// Synthesizer that replays a scripted sequence of responses and records
/// every prompt it is handed.
pub struct ScriptedSynthesizer {
    responses: Mutex<VecDeque<Result<String, SynthesisError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedSynthesizer {
    pub fn new(responses: Vec<Result<String, SynthesisError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// All-success script from raw response bodies.
    pub fn replying(responses: &[String]) -> Self {
        Self::new(responses.iter().cloned().map(Ok).collect())
    }

    /// Prompts seen so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl Synthesizer for ScriptedSynthesizer {
    async fn generate(&self, request: SynthesisRequest) -> Result<String, SynthesisError> {
        self.prompts.lock().push(request.prompt);
        self.responses.lock().pop_front().unwrap_or_else(|| {
            Err(SynthesisError::Unavailable {
                reason: "script exhausted".to_string(),
            })
        })
    }
}

pub fn provider_failure() -> SynthesisError {
    SynthesisError::Provider {
        provider: "scripted",
        message: "upstream exploded".to_string(),
    }
}

pub fn brief(project_id: i64) -> ProjectBrief {
    ProjectBrief {
        project_id,
        title: "Ashes of the Clan".to_string(),
        genre: "xianxia".to_string(),
        target_words: 1_000_000,
        description: "A fallen clan's last heir climbs back.".to_string(),
    }
}

pub fn characters_json() -> String {
    r#"{"characters": [
        {"name": "Lin Shu", "description": "last heir of the clan", "content": "An ordinary youth carrying the clan seal."},
        {"name": "Elder Mo", "description": "exiled mentor", "content": "Once feared, now hiding in the outer city."},
        {"name": "Yan Hong", "description": "rival disciple", "content": "Brilliant, vicious, and sponsored by the victors."}
    ]}"#
    .to_string()
}

pub fn realms_json() -> String {
    r#"{"realms": [
        {"name": "Body Tempering", "description": "first tier", "content": "Nine layers of flesh refinement."},
        {"name": "Earth Origin", "description": "second tier", "content": "Drawing the land's breath into the meridians."}
    ]}"#
    .to_string()
}

pub fn items_json() -> String {
    r#"{"items": [
        {"name": "Ancestor Stone", "description": "the clan's hidden legacy", "content": "Purifies any elixir placed on it overnight."},
        {"name": "Withered Sword Art", "description": "forbidden technique", "content": "Trades vitality for a single unblockable cut."}
    ]}"#
    .to_string()
}

/// A single-object volume payload with deterministic chapter stubs.
pub fn volume_json(volume_no: usize, chapter_count: usize) -> String {
    let chapters: Vec<String> = (1..=chapter_count)
        .map(|chapter_no| {
            format!(
                r#"{{"title": "V{volume_no}C{chapter_no}", "summary": "Summary of volume {volume_no} chapter {chapter_no}"}}"#
            )
        })
        .collect();
    format!(
        r#"{{"volume": {{"title": "Volume {volume_no} Title", "chapters": [{}]}}}}"#,
        chapters.join(",")
    )
}

/// The same payload nested inside a list, as some providers return it.
pub fn wrapped_volume_json(volume_no: usize, chapter_count: usize) -> String {
    let single = volume_json(volume_no, chapter_count);
    let inner = single
        .strip_prefix(r#"{"volume": "#)
        .and_then(|s| s.strip_suffix('}'))
        .expect("fixture shape");
    format!(r#"{{"volumes": [{inner}]}}"#)
}
