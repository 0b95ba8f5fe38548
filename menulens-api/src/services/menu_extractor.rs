//! Menu extraction from photographed menus
//!
//! Drives the vision completion with a fixed structured-output contract and
//! parses the result. Malformed output is a hard failure here; the caller
//! records it on the run.

use menulens_common::{Error, Result};

use crate::models::Menu;
use crate::services::completion::{strip_code_fence, CompletionModel, ImageAttachment};

const MENU_EXTRACTION_PROMPT: &str = r#"You are a menu parser. Extract all dishes from this restaurant menu image.

Return JSON in this exact format:
{
  "restaurant_name": "string or null",
  "sections": [
    {
      "name": "section name",
      "dishes": [
        {
          "name": "dish name",
          "description": "description or null",
          "price": number or null,
          "dietary": ["vegetarian", "vegan", "gluten-free", "spicy", etc]
        }
      ]
    }
  ]
}

Rules:
- Extract ALL dishes visible in the image
- Preserve menu section organization
- Include prices as numbers (e.g., 12.99 not "$12.99")
- Infer dietary tags from description when obvious
- If multiple pages, process all
- Return ONLY valid JSON, no markdown or explanations"#;

/// Extract a structured menu from raw photo bytes
pub async fn extract_menu(
    model: &dyn CompletionModel,
    images: &[ImageAttachment],
) -> Result<Menu> {
    let raw = model
        .complete_vision(MENU_EXTRACTION_PROMPT, images)
        .await?;

    let cleaned = strip_code_fence(&raw);
    let menu: Menu = serde_json::from_str(cleaned)
        .map_err(|e| Error::Upstream(format!("Failed to parse menu extraction result: {}", e)))?;

    tracing::info!(
        restaurant = %menu.restaurant_name.as_deref().unwrap_or("unknown"),
        sections = menu.sections.len(),
        "Menu extracted"
    );

    Ok(menu)
}
