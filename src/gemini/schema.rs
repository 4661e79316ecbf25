//! Response schema pinned on every content request.
//!
//! Mirrors [`crate::content::GeneratedContent`] field for field.

use serde_json::{json, Value};

use crate::content::Tone;

fn string() -> Value {
    json!({ "type": "STRING" })
}

fn string_array() -> Value {
    json!({ "type": "ARRAY", "items": { "type": "STRING" } })
}

fn video_script_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "hook": string(),
            "body": string(),
            "callToAction": string(),
            "visualCues": string(),
        },
        "required": ["hook", "body", "callToAction", "visualCues"],
    })
}

fn social_content_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "twitterThread": string_array(),
            "linkedInPost": string(),
            "facebookPost": string(),
            "videoScript": video_script_schema(),
        },
        "required": ["twitterThread", "linkedInPost", "facebookPost", "videoScript"],
    })
}

fn virality_score_schema() -> Value {
    let number = json!({ "type": "NUMBER" });
    json!({
        "type": "OBJECT",
        "properties": {
            "emotion": number,
            "logic": number,
            "trendiness": number,
            "clarity": number,
            "controversy": number,
        },
        "required": ["emotion", "logic", "trendiness", "clarity", "controversy"],
    })
}

/// The JSON schema the model must answer with.
pub fn generated_content_schema() -> Value {
    let mut variations = serde_json::Map::new();
    for tone in Tone::ALL {
        variations.insert(tone.as_str().to_string(), social_content_schema());
    }
    let tone_names: Vec<&str> = Tone::ALL.iter().map(|t| t.as_str()).collect();

    json!({
        "type": "OBJECT",
        "properties": {
            "variations": {
                "type": "OBJECT",
                "properties": variations,
                "required": tone_names,
            },
            "longArticle": string(),
            "suggestedHashtags": string_array(),
            "suggestedKeywords": string_array(),
            "viralityScore": virality_score_schema(),
        },
        "required": [
            "variations",
            "longArticle",
            "suggestedHashtags",
            "suggestedKeywords",
            "viralityScore"
        ],
    })
}
