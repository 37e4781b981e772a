//! Localized user-facing messages.
//!
//! Messages live in Fluent files under `locales/<lang>/main.ftl` and are
//! compiled into the binary. English is the fallback for unknown locales and
//! for keys a translation does not define.

use anyhow::{anyhow, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use tracing::warn;
use unic_langid::LanguageIdentifier;

pub const FALLBACK_LOCALE: &str = "en";

const RESOURCES: [(&str, &str); 2] = [
    ("en", include_str!("../locales/en/main.ftl")),
    ("sw", include_str!("../locales/sw/main.ftl")),
];

/// Localization manager for notices and rendered documents
pub struct Localizer {
    locale: String,
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl Localizer {
    /// Create a localizer for `locale`, falling back to English when unsupported
    pub fn new(locale: &str) -> Result<Self> {
        let mut bundles = HashMap::new();
        for (code, source) in RESOURCES {
            bundles.insert(code.to_string(), Self::create_bundle(code, source)?);
        }

        let requested = locale.trim().to_lowercase();
        let locale = if bundles.contains_key(&requested) {
            requested
        } else {
            warn!(locale = %locale, "Unsupported locale, using {FALLBACK_LOCALE}");
            FALLBACK_LOCALE.to_string()
        };

        Ok(Self { locale, bundles })
    }

    /// English-only localizer
    pub fn english() -> Result<Self> {
        Self::new(FALLBACK_LOCALE)
    }

    fn create_bundle(code: &str, source: &str) -> Result<FluentBundle<FluentResource>> {
        let langid: LanguageIdentifier = code.parse()?;
        let mut bundle = FluentBundle::new_concurrent(vec![langid]);
        // Isolation marks would leak into calendar and print output
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("Invalid Fluent resource for {code}: {errors:?}"))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("Duplicate Fluent messages for {code}: {errors:?}"))?;
        Ok(bundle)
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Get a localized message
    pub fn message(&self, key: &str, args: Option<&FluentArgs>) -> String {
        let candidates = [self.locale.as_str(), FALLBACK_LOCALE];
        for code in candidates {
            let Some(bundle) = self.bundles.get(code) else {
                continue;
            };
            let Some(pattern) = bundle.get_message(key).and_then(|msg| msg.value()) else {
                continue;
            };
            let mut errors = vec![];
            let value = bundle.format_pattern(pattern, args, &mut errors);
            if !errors.is_empty() {
                warn!(key, errors = ?errors, "Fluent formatting errors");
            }
            return value.into_owned();
        }
        format!("Missing translation: {}", key)
    }

    /// Convenience function to get a localized message
    pub fn t(&self, key: &str) -> String {
        self.message(key, None)
    }

    /// Localized message with string arguments
    pub fn t_args(&self, key: &str, args: &[(&str, &str)]) -> String {
        let mut fluent_args = FluentArgs::new();
        for (name, value) in args {
            fluent_args.set(*name, FluentValue::from(*value));
        }
        self.message(key, Some(&fluent_args))
    }

    /// Localized message with a plural-selecting `$count`
    pub fn t_count(&self, key: &str, count: usize) -> String {
        let mut fluent_args = FluentArgs::new();
        fluent_args.set("count", FluentValue::from(count as i64));
        self.message(key, Some(&fluent_args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_messages() {
        let l10n = Localizer::english().unwrap();
        assert_eq!(l10n.t("notice-success"), "Success");
        assert_eq!(l10n.t_args("dish-not-found", &[("dish", "Ugali")]), "No recipe found for Ugali; it was left out.");
    }

    #[test]
    fn test_plural_selection() {
        let l10n = Localizer::english().unwrap();
        assert_eq!(l10n.t_count("shopping-list-ready", 1), "Shopping list ready with one item.");
        assert_eq!(l10n.t_count("shopping-list-ready", 3), "Shopping list ready with 3 items.");
    }

    #[test]
    fn test_swahili_messages() {
        let l10n = Localizer::new("sw").unwrap();
        assert_eq!(l10n.locale(), "sw");
        assert_eq!(l10n.t("notice-error"), "Hitilafu");
    }

    #[test]
    fn test_unknown_locale_falls_back() {
        let l10n = Localizer::new("xx").unwrap();
        assert_eq!(l10n.locale(), "en");
        assert_eq!(l10n.t("plan-new"), "Started a new meal plan.");
    }

    #[test]
    fn test_missing_key() {
        let l10n = Localizer::english().unwrap();
        assert_eq!(l10n.t("no-such-key"), "Missing translation: no-such-key");
    }
}
