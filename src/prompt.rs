use serde_json::Value;
use thiserror::Error;

use crate::models::{
    ProductInput, SeoMetadata, META_DESCRIPTION_MAX_LEN, META_KEYWORDS_MAX_LEN, META_TITLE_MAX_LEN,
};
use crate::text::truncate;

pub const SYSTEM_MESSAGE: &str =
    "You are an SEO assistant specialized in e-commerce product catalog optimization.";

/// The provider answered, but not with the JSON object we asked for.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed AI response: {0}")]
pub struct MalformedAiResponse(pub String);

pub fn build_prompt(product: &ProductInput) -> String {
    let name = product.name.trim();
    let short_description = product.short_description().unwrap_or("(empty)");
    let description = product.description().unwrap_or("(empty)");
    let country = product.country().unwrap_or("(not informed)");
    let language = product.language();

    format!(
        r#"Generate SEO metadata for the following product.

Product data:
- Name: {name}
- Short Description: {short_description}
- Description: {description}
- Country: {country}
- Language: {language}

Rules:
1. Write every field in the language "{language}".
2. meta_title (max {META_TITLE_MAX_LEN} chars): a short summary of the product.
3. meta_description (max {META_DESCRIPTION_MAX_LEN} chars): the main benefit, 1-2 important features and a light call to action.
4. meta_keywords (max {META_KEYWORDS_MAX_LEN} chars): 5-10 terms separated by commas, no prices or promotional terms.
5. Respond ONLY with a JSON object containing exactly the keys "meta_title", "meta_description" and "meta_keywords":

{{
  "meta_title": "...",
  "meta_description": "...",
  "meta_keywords": "..., ..."
}}"#
    )
}

/// Parses the provider's raw text into metadata.
///
/// Tolerates prose or code fences around the object by taking the span from
/// the first `{` to the last `}`. Values are trimmed and cut to their
/// ceilings; anything else wrong is reported, never repaired.
pub fn parse_ai_response(raw: &str) -> Result<SeoMetadata, MalformedAiResponse> {
    let (start, end) = raw
        .find('{')
        .zip(raw.rfind('}'))
        .filter(|(start, end)| start < end)
        .ok_or_else(|| MalformedAiResponse("no JSON object found".into()))?;

    let value: Value = serde_json::from_str(&raw[start..=end])
        .map_err(|e| MalformedAiResponse(format!("invalid JSON: {e}")))?;
    let object = value
        .as_object()
        .ok_or_else(|| MalformedAiResponse("top-level value is not an object".into()))?;

    let field = |key: &str, max: usize| -> Result<String, MalformedAiResponse> {
        let text = match object.get(key) {
            None => return Err(MalformedAiResponse(format!("missing key `{key}`"))),
            Some(Value::String(s)) => s.trim(),
            Some(_) => return Err(MalformedAiResponse(format!("`{key}` is not a string"))),
        };
        if text.is_empty() {
            return Err(MalformedAiResponse(format!("`{key}` is empty")));
        }
        Ok(truncate(text, max))
    };

    Ok(SeoMetadata {
        meta_title: field("meta_title", META_TITLE_MAX_LEN)?,
        meta_description: field("meta_description", META_DESCRIPTION_MAX_LEN)?,
        meta_keywords: field("meta_keywords", META_KEYWORDS_MAX_LEN)?,
    })
}
