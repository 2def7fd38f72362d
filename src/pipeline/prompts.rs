//! Prompt construction for the synthesis phases.
//!
//! Every structured prompt spells out the exact JSON shape expected back;
//! the decoders in `synthesis::decode` still treat the response defensively.

use crate::store::models::LoreItem;

use super::{BibleInputs, ProjectBrief};

/// System role shared by all generation calls.
pub const SYSTEM_WRITING_ASSISTANT: &str = "You are a veteran serial-fiction editor and \
worldbuilding assistant. You answer precisely in the format requested and never add \
commentary outside it.";

/// Fallback instruction when the caller gives none.
pub const DEFAULT_INSTRUCTION: &str =
    "No special instructions; follow the conventions of the genre.";

pub fn characters_prompt(inputs: &BibleInputs) -> String {
    format!(
        "Invent 3 core characters for the novel (the protagonist plus key allies or rivals).\n\
         Protagonist premise: {}\n\
         Respond with pure JSON of the form \
         {{\"characters\": [{{\"name\": \"\", \"description\": \"\", \"content\": \"\"}}]}}. \
         Use \"description\" for a one-line hook and \"content\" for the full write-up. \
         No text outside the JSON.",
        inputs.protagonist
    )
}

pub fn realms_prompt(inputs: &BibleInputs) -> String {
    format!(
        "From this power-system premise: {}, derive 5 ascending realm tiers with detailed \
         descriptions and breakthrough conditions.\n\
         Respond with pure JSON of the form \
         {{\"realms\": [{{\"name\": \"\", \"description\": \"\", \"content\": \"\"}}]}}. \
         No text outside the JSON.",
        inputs.power_system
    )
}

pub fn items_prompt(inputs: &BibleInputs) -> String {
    format!(
        "From this edge/cheat premise: {}, derive 3 signature techniques or destiny-bound \
         treasures.\n\
         Respond with pure JSON of the form \
         {{\"items\": [{{\"name\": \"\", \"description\": \"\", \"content\": \"\"}}]}}. \
         No text outside the JSON.",
        inputs.cheat
    )
}

/// Prompt for one outline volume, built over the compressed prior context.
pub fn outline_volume_prompt(
    brief: &ProjectBrief,
    lore_context: &str,
    previous_context: &str,
    volume_no: usize,
    instruction: &str,
) -> String {
    format!(
        "Plan volume {volume_no} of the serial novel \"{title}\" ({genre}, target \
         {target_words} words overall).\n\
         Synopsis: {description}\n\
         Established lore:\n{lore_context}\n\
         Outline so far:\n{previous_context}\n\
         Author instruction: {instruction}\n\
         Respond with pure JSON of the form \
         {{\"volume\": {{\"title\": \"\", \"chapters\": [{{\"title\": \"\", \"summary\": \"\"}}]}}}} \
         covering 8-15 chapters for this volume only. No text outside the JSON.",
        title = brief.title,
        genre = brief.genre,
        target_words = brief.target_words,
        description = if brief.description.is_empty() {
            "none provided"
        } else {
            &brief.description
        },
    )
}

/// Prompt that drafts the three bible inputs from project basics.
pub fn bible_inputs_prompt(brief: &ProjectBrief) -> String {
    format!(
        "Draft the three seed premises for a new serial novel.\n\
         Title: {title}\nGenre: {genre}\nTarget length: {target_words} words\n\
         Synopsis: {description}\n\
         Respond with pure JSON of the form \
         {{\"protagonist\": \"\", \"cheat\": \"\", \"power_system\": \"\"}} where \
         \"protagonist\" sketches the lead, \"cheat\" their unfair advantage, and \
         \"power_system\" the world's progression ladder. No text outside the JSON.",
        title = brief.title,
        genre = brief.genre,
        target_words = brief.target_words,
        description = if brief.description.is_empty() {
            "none provided"
        } else {
            &brief.description
        },
    )
}

/// One line per lore entry, or a placeholder when the project has none.
pub fn lore_context(items: &[LoreItem]) -> String {
    if items.is_empty() {
        return "No lore entries yet.".to_string();
    }
    items
        .iter()
        .map(|item| format!("- {}: {}: {}", item.category, item.name, item.description))
        .collect::<Vec<_>>()
        .join("\n")
}
