//! Trilingual translation content, the static catalog and caption assembly.

use rand::RngExt;
use rand::distr::Uniform;
use serde::{Deserialize, Serialize};

use crate::constants::CAPTION_HASHTAGS;
use crate::error::LingoError;

/// A word and an example phrase in one language.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct LanguageEntry {
    /// The translated word
    pub word: String,
    /// A short example phrase using the word
    pub phrase: String,
}

impl LanguageEntry {
    fn new(word: &str, phrase: &str) -> Self {
        Self {
            word: word.to_string(),
            phrase: phrase.to_string(),
        }
    }
}

/// The languages on a card, in layout order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Language {
    /// English
    English,
    /// Spanish
    Spanish,
    /// Catalan
    Catalan,
}

impl Language {
    /// Top-to-bottom order used for layout and captions
    pub const ORDER: [Language; 3] = [Language::English, Language::Spanish, Language::Catalan];

    /// Heading drawn above the slot
    pub fn title(self) -> &'static str {
        match self {
            Language::English => "ENGLISH",
            Language::Spanish => "SPANISH",
            Language::Catalan => "CATALAN",
        }
    }

    /// Short prefix used in captions
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "EN",
            Language::Spanish => "ES",
            Language::Catalan => "CA",
        }
    }
}

/// A word with its phrase in all three languages.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct Translation {
    /// English entry
    pub english: LanguageEntry,
    /// Spanish entry
    pub spanish: LanguageEntry,
    /// Catalan entry
    pub catalan: LanguageEntry,
}

impl Translation {
    /// Returns the entry for a language.
    pub fn entry(&self, language: Language) -> &LanguageEntry {
        match language {
            Language::English => &self.english,
            Language::Spanish => &self.spanish,
            Language::Catalan => &self.catalan,
        }
    }

    /// Entries in layout order.
    pub fn entries(&self) -> impl Iterator<Item = (Language, &LanguageEntry)> {
        Language::ORDER
            .into_iter()
            .map(move |language| (language, self.entry(language)))
    }

    /// Checks that every word and phrase is non-blank.
    pub fn validate(&self) -> Result<(), LingoError> {
        for (language, entry) in self.entries() {
            if entry.word.trim().is_empty() {
                return Err(LingoError::InvalidResponseShape(format!(
                    "{} word is empty",
                    language.code()
                )));
            }
            if entry.phrase.trim().is_empty() {
                return Err(LingoError::InvalidResponseShape(format!(
                    "{} phrase is empty",
                    language.code()
                )));
            }
        }
        Ok(())
    }

    /// Builds the feed post caption: one line per language then hashtags.
    pub fn caption(&self) -> String {
        let mut lines: Vec<String> = self
            .entries()
            .map(|(language, entry)| {
                format!("{}: {} - {}", language.code(), entry.word, entry.phrase)
            })
            .collect();
        lines.push(CAPTION_HASHTAGS.to_string());
        lines.join("\n")
    }
}

fn catalog_entry(
    english: (&str, &str),
    spanish: (&str, &str),
    catalan: (&str, &str),
) -> Translation {
    Translation {
        english: LanguageEntry::new(english.0, english.1),
        spanish: LanguageEntry::new(spanish.0, spanish.1),
        catalan: LanguageEntry::new(catalan.0, catalan.1),
    }
}

/// The built-in translations used when no AI content is requested.
pub fn catalog() -> Vec<Translation> {
    vec![
        catalog_entry(
            ("Sunrise", "I wake up before sunrise."),
            ("Amanecer", "Me despierto antes del amanecer."),
            ("Sortida del sol", "Em desperto abans de la sortida del sol."),
        ),
        catalog_entry(
            ("Journey", "Every journey starts with one step."),
            ("Viaje", "Cada viaje empieza con un paso."),
            ("Viatge", "Cada viatge comenca amb un pas."),
        ),
        catalog_entry(
            ("Friendship", "Friendship grows with trust."),
            ("Amistad", "La amistad crece con confianza."),
            ("Amistat", "L'amistat creix amb confianca."),
        ),
        catalog_entry(
            ("Courage", "Courage helps us try again."),
            ("Valentia", "La valentia nos ayuda a intentarlo otra vez."),
            ("Valentia", "La valentia ens ajuda a tornar-ho a provar."),
        ),
        catalog_entry(
            ("Learning", "Learning happens every day."),
            ("Aprendizaje", "El aprendizaje ocurre cada dia."),
            ("Aprenentatge", "L'aprenentatge passa cada dia."),
        ),
        catalog_entry(
            ("Kindness", "Kindness can change a moment."),
            ("Amabilidad", "La amabilidad puede cambiar un momento."),
            ("Amabilitat", "L'amabilitat pot canviar un moment."),
        ),
        catalog_entry(
            ("Creativity", "Creativity needs curiosity."),
            ("Creatividad", "La creatividad necesita curiosidad."),
            ("Creativitat", "La creativitat necessita curiositat."),
        ),
    ]
}

/// Seed words for AI generated translations.
pub const SEED_WORDS: [&str; 9] = [
    "sunrise",
    "journey",
    "friendship",
    "courage",
    "learning",
    "kindness",
    "creativity",
    "focus",
    "balance",
];

fn random_index(len: usize) -> usize {
    Uniform::new(0, len)
        .map(|dist| rand::rng().sample(dist))
        .unwrap_or(0)
}

/// Picks a translation from the built-in catalog.
pub fn random_translation() -> Translation {
    let mut entries = catalog();
    let index = random_index(entries.len());
    entries.swap_remove(index)
}

/// Picks a seed word for AI generation.
pub fn random_seed_word() -> &'static str {
    SEED_WORDS[random_index(SEED_WORDS.len())]
}

/// Trims a seed word and caps its length, falling back to `default` when blank.
pub fn sanitize_seed(word: Option<&str>, max_chars: usize, default: &str) -> String {
    let trimmed: String = word
        .unwrap_or(default)
        .trim()
        .chars()
        .take(max_chars)
        .collect();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_follows_layout_order() {
        let translation = catalog().remove(1);
        let caption = translation.caption();
        let lines: Vec<&str> = caption.lines().collect();
        assert_eq!(
            lines,
            vec![
                "EN: Journey - Every journey starts with one step.",
                "ES: Viaje - Cada viaje empieza con un paso.",
                "CA: Viatge - Cada viatge comenca amb un pas.",
                CAPTION_HASHTAGS,
            ]
        );
    }

    #[test]
    fn catalog_is_valid() {
        for translation in catalog() {
            translation.validate().expect("catalog entry validates");
        }
        random_translation()
            .validate()
            .expect("random pick validates");
        assert!(SEED_WORDS.contains(&random_seed_word()));
    }

    #[test]
    fn validate_rejects_blank_fields() {
        let mut translation = catalog().remove(0);
        translation.catalan.phrase = "   ".to_string();
        let err = translation.validate().expect_err("blank phrase");
        assert!(matches!(err, LingoError::InvalidResponseShape(msg) if msg.contains("CA")));
    }

    #[test]
    fn seed_is_trimmed_and_capped() {
        assert_eq!(sanitize_seed(Some("  tea  "), 40, "journey"), "tea");
        assert_eq!(sanitize_seed(Some("   "), 40, "journey"), "journey");
        assert_eq!(sanitize_seed(None, 40, "journey"), "journey");
        assert_eq!(sanitize_seed(Some("abcdefgh"), 3, "journey"), "abc");
    }
}
