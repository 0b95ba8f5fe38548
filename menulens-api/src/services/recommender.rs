//! Ordering-plan recommendation engine
//!
//! Preference-keyed, cached generation. Model or parse failure here is a
//! synchronous, user-visible failure and is never cached or retried.

use menulens_common::{Error, Result};
use uuid::Uuid;

use crate::cache::sha256_hex;
use crate::models::{Menu, PreferenceProfile, RecommendationSet, Vibe};
use crate::services::completion::{strip_code_fence, CompletionModel, TextCompletionRequest};

/// Deterministic cache hash over (run, vibe, group size, preferences).
///
/// `PreferenceProfile` serializes with a fixed field order, so the hash is
/// independent of key insertion order in the incoming request.
pub fn preference_hash(
    run_id: Uuid,
    vibe: Vibe,
    group_size: u32,
    prefs: &PreferenceProfile,
) -> Result<String> {
    let prefs_json = serde_json::to_string(prefs)
        .map_err(|e| Error::Internal(format!("Failed to serialize preferences: {}", e)))?;
    let key = format!("{}:{}:{}:{}", run_id, vibe.as_str(), group_size, prefs_json);
    Ok(sha256_hex(&key))
}

fn build_prompt(menu_json: &str, vibe: Vibe, group_size: u32, prefs: &PreferenceProfile) -> String {
    let dietary = if prefs.dietary.is_empty() {
        "none".to_string()
    } else {
        prefs.dietary.join(", ")
    };

    format!(
        r#"You are a dining advisor helping plan what to order at a restaurant.

Menu:
{menu_json}

Context:
- Vibe: {vibe}
- Group size: {group_size}
- Dietary restrictions: {dietary}
- Adventurousness: {adventurousness} (low/medium/high)
- Budget sensitivity: {budget} (low/moderate/high)

Create an ordering plan. Return JSON:
{{
  "plan": {{
    "shareables": number,
    "mains": number,
    "dessert": number,
    "reasoning": "brief explanation of quantities"
  }},
  "recommendations": [
    {{
      "dish": "dish name",
      "category": "shareable|main|dessert",
      "reason": "why this dish fits the occasion",
      "for_whom": "optional - e.g., 'for the vegetarian'"
    }}
  ],
  "avoid": [
    {{
      "dish": "dish name",
      "reason": "why to skip"
    }}
  ]
}}

Return ONLY valid JSON, no markdown or explanations."#,
        menu_json = menu_json,
        vibe = vibe.as_str(),
        group_size = group_size,
        dietary = dietary,
        adventurousness = prefs.adventurousness.as_str(),
        budget = prefs.budget.as_str(),
    )
}

/// Generate an ordering plan for the given menu and context
pub async fn generate_recommendations(
    model: &dyn CompletionModel,
    menu: &Menu,
    vibe: Vibe,
    group_size: u32,
    prefs: &PreferenceProfile,
) -> Result<RecommendationSet> {
    let menu_json = serde_json::to_string_pretty(menu)
        .map_err(|e| Error::Internal(format!("Failed to serialize menu: {}", e)))?;

    let raw = model
        .complete_text(TextCompletionRequest {
            system: None,
            user: build_prompt(&menu_json, vibe, group_size, prefs),
            max_tokens: 2048,
            temperature: 0.7,
        })
        .await?;

    let cleaned = strip_code_fence(&raw);
    serde_json::from_str(cleaned)
        .map_err(|e| Error::Upstream(format!("Failed to parse recommendation result: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Adventurousness, Budget};

    #[test]
    fn hash_is_deterministic() {
        let run_id = Uuid::new_v4();
        let prefs = PreferenceProfile {
            dietary: vec!["no_pork".to_string()],
            adventurousness: Adventurousness::Low,
            budget: Budget::High,
        };
        let a = preference_hash(run_id, Vibe::DateNight, 2, &prefs).unwrap();
        let b = preference_hash(run_id, Vibe::DateNight, 2, &prefs).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn hash_ignores_request_key_order() {
        // Same preference object arriving with different key insertion order
        let a: PreferenceProfile = serde_json::from_str(
            r#"{"dietary":["vegetarian"],"budget":"low","adventurousness":"high"}"#,
        )
        .unwrap();
        let b: PreferenceProfile = serde_json::from_str(
            r#"{"adventurousness":"high","dietary":["vegetarian"],"budget":"low"}"#,
        )
        .unwrap();

        let run_id = Uuid::new_v4();
        assert_eq!(
            preference_hash(run_id, Vibe::Friends, 4, &a).unwrap(),
            preference_hash(run_id, Vibe::Friends, 4, &b).unwrap()
        );
    }

    #[test]
    fn hash_varies_with_each_input() {
        let run_id = Uuid::new_v4();
        let prefs = PreferenceProfile::default();
        let base = preference_hash(run_id, Vibe::Friends, 2, &prefs).unwrap();

        assert_ne!(base, preference_hash(Uuid::new_v4(), Vibe::Friends, 2, &prefs).unwrap());
        assert_ne!(base, preference_hash(run_id, Vibe::Family, 2, &prefs).unwrap());
        assert_ne!(base, preference_hash(run_id, Vibe::Friends, 3, &prefs).unwrap());

        let other_prefs = PreferenceProfile {
            dietary: vec!["vegan".to_string()],
            ..PreferenceProfile::default()
        };
        assert_ne!(base, preference_hash(run_id, Vibe::Friends, 2, &other_prefs).unwrap());
    }

    #[test]
    fn prompt_embeds_menu_and_context() {
        let prefs = PreferenceProfile::default();
        let prompt = build_prompt("{\"sections\":[]}", Vibe::Business, 6, &prefs);
        assert!(prompt.contains("{\"sections\":[]}"));
        assert!(prompt.contains("Vibe: business"));
        assert!(prompt.contains("Group size: 6"));
        assert!(prompt.contains("Dietary restrictions: none"));
    }
}
