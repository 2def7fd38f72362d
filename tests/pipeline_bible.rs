mod common;

use std::sync::Arc;
use std::time::Duration;

use common::fixtures::{
    ScriptedSynthesizer, brief, characters_json, items_json, provider_failure, realms_json,
};
use storyloom::jobs::JobRegistry;
use storyloom::pipeline::{BiblePipeline, PipelineError, draft_bible_inputs, BibleInputs};
use storyloom::store::models::LoreCategory;
use storyloom::store::{DocumentStore, MemoryStore};

const PROJECT: i64 = 7;

fn inputs() -> BibleInputs {
    BibleInputs {
        protagonist: "Lin Shu, last heir of a fallen clan".to_string(),
        cheat: "an ancestor stone that purifies elixirs".to_string(),
        power_system: "nine tempering layers, then Earth Origin".to_string(),
    }
}

fn pipeline(
    synthesizer: ScriptedSynthesizer,
) -> (BiblePipeline, Arc<MemoryStore>, Arc<JobRegistry>) {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(JobRegistry::new());
    let pipeline = BiblePipeline::new(
        Arc::new(synthesizer),
        store.clone(),
        registry.clone(),
    );
    (pipeline, store, registry)
}

#[tokio::test]
async fn full_run_commits_each_phase_and_completes() {
    let synthesizer =
        ScriptedSynthesizer::replying(&[characters_json(), realms_json(), items_json()]);
    let (pipeline, store, registry) = pipeline(synthesizer);
    let job_id = registry.create_job();

    pipeline.run(job_id, PROJECT, &inputs()).await.unwrap();

    let lore = store.lore_for_project(PROJECT).await.unwrap();
    assert_eq!(lore.len(), 7);
    assert_eq!(
        lore.iter()
            .filter(|item| item.category == LoreCategory::Character)
            .count(),
        3
    );
    assert_eq!(
        lore.iter()
            .filter(|item| item.category == LoreCategory::Realm)
            .count(),
        2
    );
    assert_eq!(
        lore.iter()
            .filter(|item| item.category == LoreCategory::Item)
            .count(),
        2
    );
    assert!(lore.iter().all(|item| item.ai_generated));

    let job = registry.get(job_id).unwrap();
    assert!(job.completed);
    assert_eq!(job.progress, 100);
    assert!(job.error.is_none());
}

#[tokio::test]
async fn failure_in_realms_keeps_committed_characters() {
    let synthesizer =
        ScriptedSynthesizer::new(vec![Ok(characters_json()), Err(provider_failure())]);
    let (pipeline, store, registry) = pipeline(synthesizer);
    let job_id = registry.create_job();

    let err = pipeline.run(job_id, PROJECT, &inputs()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Synthesis { .. }));
    assert_eq!(err.phase(), "realms");

    // Prior phases' commits stand.
    let lore = store.lore_for_project(PROJECT).await.unwrap();
    assert_eq!(lore.len(), 3);
    assert!(
        lore.iter()
            .all(|item| item.category == LoreCategory::Character)
    );

    let job = registry.get(job_id).unwrap();
    assert!(job.completed);
    assert!(job.error.is_some());
    assert!(job.message.contains("realms"));
}

#[tokio::test]
async fn malformed_response_fails_the_phase_without_writes() {
    let synthesizer = ScriptedSynthesizer::replying(&["the spirits refuse JSON".to_string()]);
    let (pipeline, store, registry) = pipeline(synthesizer);
    let job_id = registry.create_job();

    let err = pipeline.run(job_id, PROJECT, &inputs()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Decode { .. }));

    assert!(store.lore_for_project(PROJECT).await.unwrap().is_empty());
    assert!(registry.get(job_id).unwrap().error.is_some());
}

#[tokio::test]
async fn spawn_returns_immediately_and_reaches_terminal_state() {
    let synthesizer =
        ScriptedSynthesizer::replying(&[characters_json(), realms_json(), items_json()]);
    let (pipeline, store, registry) = pipeline(synthesizer);

    let job_id = pipeline.spawn(PROJECT, inputs());
    // The id is observable before the run finishes.
    assert!(registry.get(job_id).is_some());

    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if registry.get(job_id).unwrap().is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("job reaches a terminal state");

    assert!(registry.get(job_id).unwrap().completed);
    assert_eq!(store.lore_for_project(PROJECT).await.unwrap().len(), 7);
}

#[tokio::test]
async fn drafted_inputs_decode_from_structured_response() {
    let synthesizer = ScriptedSynthesizer::replying(&[
        r#"{"protagonist": "a gravekeeper's daughter", "cheat": "sees lingering souls", "power_system": "lantern grades"}"#
            .to_string(),
    ]);

    let drafted = draft_bible_inputs(&synthesizer, &brief(PROJECT)).await.unwrap();
    assert_eq!(drafted.protagonist, "a gravekeeper's daughter");
    assert_eq!(drafted.cheat, "sees lingering souls");
    assert_eq!(drafted.power_system, "lantern grades");

    let prompts = synthesizer.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Ashes of the Clan"));
}

#[tokio::test]
async fn drafted_inputs_surface_malformed_responses() {
    let synthesizer = ScriptedSynthesizer::replying(&["not json".to_string()]);
    let err = draft_bible_inputs(&synthesizer, &brief(PROJECT)).await.unwrap_err();
    assert!(matches!(err, PipelineError::Decode { .. }));
}
