use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{serde_as, NoneAsEmptyString};

use crate::text::{non_blank, strip_html};

pub const META_TITLE_MAX_LEN: usize = 60;
pub const META_DESCRIPTION_MAX_LEN: usize = 170;
pub const META_KEYWORDS_MAX_LEN: usize = 255;

/// Locale used when a request does not name one.
pub const DEFAULT_LANGUAGE: &str = "pt-BR";

#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ProductInput {
    #[serde(default)]
    pub name: String,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub description: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub country: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub language: Option<String>,
}

impl ProductInput {
    pub fn language(&self) -> &str {
        non_blank(self.language.as_deref()).unwrap_or(DEFAULT_LANGUAGE)
    }

    pub fn country(&self) -> Option<&str> {
        non_blank(self.country.as_deref())
    }

    pub fn short_description(&self) -> Option<&str> {
        non_blank(self.short_description.as_deref())
    }

    pub fn description(&self) -> Option<&str> {
        non_blank(self.description.as_deref())
    }
}

/// The three fields search engines read. Every generation path keeps them
/// non-empty and within their ceilings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SeoMetadata {
    pub meta_title: String,
    pub meta_description: String,
    pub meta_keywords: String,
}

#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SkuInput {
    #[serde(default)]
    pub sku: String,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub language: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CustomAttribute {
    pub attribute_code: String,
    #[serde(default)]
    pub value: Value,
}

/// Product record as the catalog returns it. Unknown fields are kept so the
/// record can be handed back verbatim.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CatalogProduct {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub custom_attributes: Vec<CustomAttribute>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogProduct {
    /// String value of a custom attribute, if present and textual.
    pub fn attribute(&self, code: &str) -> Option<&str> {
        self.custom_attributes
            .iter()
            .find(|a| a.attribute_code == code)
            .and_then(|a| a.value.as_str())
    }

    pub fn existing_metadata(&self) -> Option<SeoMetadata> {
        let meta_title = non_blank(self.attribute("meta_title"))?;
        let meta_description = non_blank(self.attribute("meta_description"))?;
        let meta_keywords = non_blank(self.attribute("meta_keyword"))?;
        Some(SeoMetadata {
            meta_title: meta_title.to_string(),
            meta_description: meta_description.to_string(),
            meta_keywords: meta_keywords.to_string(),
        })
    }

    /// Maps the catalog record onto generation input. Descriptions arrive as
    /// HTML and are reduced to plain text.
    pub fn to_product_input(&self, language: Option<&str>, country: &str) -> ProductInput {
        let plain = |code: &str| {
            self.attribute(code)
                .map(strip_html)
                .filter(|s| !s.is_empty())
        };
        ProductInput {
            name: self.name.as_deref().unwrap_or_default().trim().to_string(),
            short_description: plain("short_description"),
            description: plain("description"),
            country: Some(country.to_string()),
            language: non_blank(language).map(str::to_string),
        }
    }
}
