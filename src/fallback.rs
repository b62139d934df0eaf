//! Deterministic SEO metadata, used whenever the AI path is unavailable or
//! fails. No network access; every field comes out non-empty and within its
//! ceiling.

use crate::models::{
    ProductInput, SeoMetadata, META_DESCRIPTION_MAX_LEN, META_KEYWORDS_MAX_LEN, META_TITLE_MAX_LEN,
};
use crate::text::{collapse_whitespace, truncate, ELLIPSIS};

const MAX_KEYWORD_TERMS: usize = 10;
const MIN_TOKEN_CHARS: usize = 3;

const STOP_WORDS: &[&str] = &[
    // en
    "the", "and", "for", "with", "from", "your", "this", "that", "are", "you", "our", "its",
    // pt
    "com", "para", "sua", "seu", "suas", "seus", "uma", "por", "que", "dos", "das", "nos", "nas",
    "mais", "muito",
    // es
    "con", "los", "las", "del", "una", "sus", "tus", "más", "muy",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Locale {
    Pt,
    Es,
    En,
}

struct Phrases {
    title_suffix: &'static str,
    quality: &'static str,
    call_to_action: &'static str,
    preposition: &'static str,
    placeholder_name: &'static str,
}

const PT: Phrases = Phrases {
    title_suffix: "Seleção Premium",
    quality: "com qualidade premium para suas necessidades",
    call_to_action: "Confira a loja oficial",
    preposition: "em",
    placeholder_name: "Produto Premium",
};

const ES: Phrases = Phrases {
    title_suffix: "Selección Premium",
    quality: "con calidad premium para tus necesidades",
    call_to_action: "Visita nuestra tienda oficial",
    preposition: "en",
    placeholder_name: "Producto Premium",
};

const EN: Phrases = Phrases {
    title_suffix: "Premium Selection",
    quality: "with premium quality for your needs",
    call_to_action: "Visit our official store",
    preposition: "in",
    placeholder_name: "Premium Product",
};

/// Country code → "in <country>" per locale (pt, es, en).
const COUNTRIES: &[(&str, [&str; 3])] = &[
    ("BR", ["no Brasil", "en Brasil", "in Brazil"]),
    ("PT", ["em Portugal", "en Portugal", "in Portugal"]),
    ("ES", ["na Espanha", "en España", "in Spain"]),
    ("MX", ["no México", "en México", "in Mexico"]),
    ("AR", ["na Argentina", "en Argentina", "in Argentina"]),
    ("CL", ["no Chile", "en Chile", "in Chile"]),
    ("CO", ["na Colômbia", "en Colombia", "in Colombia"]),
    ("US", ["nos Estados Unidos", "en Estados Unidos", "in the United States"]),
];

impl Locale {
    fn from_tag(tag: &str) -> Self {
        let primary = tag.split(['-', '_']).next().unwrap_or_default();
        match primary.trim().to_ascii_lowercase().as_str() {
            "pt" => Self::Pt,
            "es" => Self::Es,
            _ => Self::En,
        }
    }

    fn phrases(self) -> &'static Phrases {
        match self {
            Self::Pt => &PT,
            Self::Es => &ES,
            Self::En => &EN,
        }
    }

    fn in_country(self, code: &str) -> String {
        let column = match self {
            Self::Pt => 0,
            Self::Es => 1,
            Self::En => 2,
        };
        COUNTRIES
            .iter()
            .find(|(c, _)| c.eq_ignore_ascii_case(code))
            .map(|(_, names)| names[column].to_string())
            .unwrap_or_else(|| format!("{} {code}", self.phrases().preposition))
    }
}

pub fn generate_fallback(product: &ProductInput) -> SeoMetadata {
    let locale = Locale::from_tag(product.language());
    let phrases = locale.phrases();

    let name = match collapse_whitespace(&product.name) {
        n if n.is_empty() => phrases.placeholder_name.to_string(),
        n => n,
    };

    SeoMetadata {
        meta_title: truncate(&format!("{name} | {}", phrases.title_suffix), META_TITLE_MAX_LEN),
        meta_description: description(product, &name, locale),
        meta_keywords: keywords(product, &name),
    }
}

fn description(product: &ProductInput, name: &str, locale: Locale) -> String {
    let phrases = locale.phrases();
    let call_to_action = match product.country() {
        Some(country) => format!("{} {}.", phrases.call_to_action, locale.in_country(country)),
        None => format!("{}.", phrases.call_to_action),
    };

    let base = [product.short_description(), product.description()]
        .into_iter()
        .flatten()
        .map(|text| collapse_whitespace(text).trim_end_matches(['.', ' ']).to_string())
        .find(|text| !text.is_empty())
        .unwrap_or_else(|| format!("{name} {}", phrases.quality));

    // Keep the call to action intact when the base text is long; ". " joins them.
    let room = META_DESCRIPTION_MAX_LEN.saturating_sub(call_to_action.chars().count() + 2);
    let base = truncate(&base, room);
    let composed = if base.ends_with(ELLIPSIS) {
        format!("{base} {call_to_action}")
    } else {
        format!("{base}. {call_to_action}")
    };
    truncate(&composed, META_DESCRIPTION_MAX_LEN)
}

fn keywords(product: &ProductInput, name: &str) -> String {
    let mut terms = vec![name.to_lowercase()];
    let sources = [Some(name), product.short_description(), product.description()];
    for token in sources.into_iter().flatten().flat_map(tokens) {
        if !terms.contains(&token) {
            terms.push(token);
        }
    }
    terms.truncate(MAX_KEYWORD_TERMS);

    let mut joined = String::new();
    for term in &terms {
        let sep = if joined.is_empty() { 0 } else { 2 };
        if joined.chars().count() + sep + term.chars().count() > META_KEYWORDS_MAX_LEN {
            continue;
        }
        if sep > 0 {
            joined.push_str(", ");
        }
        joined.push_str(term);
    }
    if joined.is_empty() {
        joined = truncate(&terms[0], META_KEYWORDS_MAX_LEN);
    }
    joined
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_TOKEN_CHARS)
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_lowercase)
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
}
