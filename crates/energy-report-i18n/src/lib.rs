// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use fluent::{FluentArgs, FluentResource};
use fluent_bundle::concurrent::FluentBundle;
use thiserror::Error;
use tracing::warn;
use unic_langid::LanguageIdentifier;

/// Supported report languages
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, Default,
)]
pub enum Language {
    /// French (default)
    #[default]
    #[serde(rename = "fr", alias = "french")]
    French,
    /// English
    #[serde(rename = "en", alias = "english")]
    English,
    /// Dutch
    #[serde(rename = "nl", alias = "dutch")]
    Dutch,
}

impl Language {
    /// Every language with bundled translations
    pub const ALL: [Language; 3] = [Language::French, Language::English, Language::Dutch];

    /// ISO 639-1 code, as used in file names and configuration
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::French => "fr",
            Self::English => "en",
            Self::Dutch => "nl",
        }
    }

    /// Name of the language in that language
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::French => "Français",
            Self::English => "English",
            Self::Dutch => "Nederlands",
        }
    }

    /// Accepts the ISO code or the English or native name, case-insensitive
    ///
    /// # Errors
    ///
    /// `I18nError::UnsupportedLanguage` for anything else.
    pub fn from_code(code: &str) -> Result<Self, I18nError> {
        match code.trim().to_lowercase().as_str() {
            "fr" | "french" | "français" | "francais" => Ok(Self::French),
            "en" | "english" => Ok(Self::English),
            "nl" | "dutch" | "nederlands" => Ok(Self::Dutch),
            _ => Err(I18nError::UnsupportedLanguage(code.to_owned())),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = I18nError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
    }
}

#[derive(Debug, Error)]
pub enum I18nError {
    #[error("No translation for '{0}'")]
    KeyNotFound(String),

    #[error("Broken translation bundle: {0}")]
    LoadError(String),

    #[error("Unsupported language '{0}' (expected fr, en or nl)")]
    UnsupportedLanguage(String),

    #[error("Translation arguments rejected: {0}")]
    FormatError(String),
}

/// Fluent sources compiled into the binary, per language and domain
const RESOURCES: [(Language, &str, &str); 6] = [
    (Language::French, "report", include_str!("../locales/fr/report.ftl")),
    (Language::French, "advice", include_str!("../locales/fr/advice.ftl")),
    (Language::English, "report", include_str!("../locales/en/report.ftl")),
    (Language::English, "advice", include_str!("../locales/en/advice.ftl")),
    (Language::Dutch, "report", include_str!("../locales/nl/report.ftl")),
    (Language::Dutch, "advice", include_str!("../locales/nl/advice.ftl")),
];

/// Report and advice messages of one language
pub struct I18n {
    bundles: Vec<(&'static str, FluentBundle<FluentResource>)>,
    language: Language,
}

impl std::fmt::Debug for I18n {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("I18n")
            .field("language", &self.language)
            .field("bundles", &"<FluentBundle>")
            .finish()
    }
}

impl I18n {
    /// Bundles of both domains for `language`
    ///
    /// # Errors
    ///
    /// `I18nError::LoadError` when an embedded resource does not parse.
    pub fn new(language: Language) -> Result<Self, I18nError> {
        let lang_id: LanguageIdentifier = language
            .code()
            .parse()
            .map_err(|e| I18nError::LoadError(format!("language tag {language}: {e}")))?;

        let bundles = RESOURCES
            .iter()
            .filter(|(lang, _, _)| *lang == language)
            .map(|(_, domain, source)| {
                Self::bundle(lang_id.clone(), source)
                    .map(|bundle| (*domain, bundle))
                    .map_err(|e| I18nError::LoadError(format!("{language}/{domain}.ftl: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { bundles, language })
    }

    fn bundle(
        lang_id: LanguageIdentifier,
        source: &str,
    ) -> Result<FluentBundle<FluentResource>, String> {
        let resource = FluentResource::try_new(source.to_owned())
            .map_err(|(_, errors)| format!("{errors:?}"))?;

        let mut bundle = FluentBundle::new_concurrent(vec![lang_id]);
        // Unicode isolation marks cannot be encoded by the PDF fonts
        bundle.set_use_isolating(false);
        bundle.add_resource(resource).map_err(|errors| format!("{errors:?}"))?;
        Ok(bundle)
    }

    /// Message `key` without arguments
    ///
    /// # Errors
    ///
    /// `I18nError::KeyNotFound` when no domain defines `key`.
    pub fn get(&self, key: &str) -> Result<String, I18nError> {
        self.format(key, None)
    }

    /// Message `key` with Fluent arguments; the report domain is searched first
    ///
    /// # Errors
    ///
    /// `I18nError::KeyNotFound` when no domain defines `key`, `I18nError::FormatError`
    /// when a placeable cannot be resolved.
    pub fn format(&self, key: &str, args: Option<&FluentArgs<'_>>) -> Result<String, I18nError> {
        let (bundle, pattern) = self
            .bundles
            .iter()
            .find_map(|(_, bundle)| {
                bundle.get_message(key).and_then(|msg| msg.value()).map(|p| (bundle, p))
            })
            .ok_or_else(|| I18nError::KeyNotFound(key.to_owned()))?;

        let mut errors = Vec::new();
        let value = bundle.format_pattern(pattern, args, &mut errors);
        if errors.is_empty() {
            Ok(value.into_owned())
        } else {
            Err(I18nError::FormatError(format!("{key}: {errors:?}")))
        }
    }

    /// Translated text, falling back to the key itself when the lookup fails
    #[must_use]
    pub fn text(&self, key: &str) -> String {
        self.text_with(key, &[])
    }

    /// Translated text with string arguments, falling back to the key itself
    #[must_use]
    pub fn text_with(&self, key: &str, args: &[(&str, String)]) -> String {
        let result = if args.is_empty() {
            self.get(key)
        } else {
            let mut fluent_args = FluentArgs::new();
            for (name, value) in args {
                fluent_args.set(*name, value.clone());
            }
            self.format(key, Some(&fluent_args))
        };

        result.unwrap_or_else(|e| {
            warn!("Missing translation for '{key}' ({}): {e}", self.language);
            key.to_owned()
        })
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }
}
