use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Per-locale text, keyed by language code. Entries keep their declaration
/// order so the first declared locale is the fallback.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct LocalizedText(
    #[serde(with = "ordered_map")]
    #[schemars(with = "BTreeMap<String, String>")]
    pub Vec<(String, String)>,
);

impl LocalizedText {
    pub fn new<L, T>(entries: impl IntoIterator<Item = (L, T)>) -> Self
    where
        L: Into<String>,
        T: Into<String>,
    {
        let mut text = Self::default();
        for (locale, value) in entries {
            text.insert(locale.into(), value.into());
        }
        text
    }

    /// Sets the text for `locale`, keeping the position of an existing entry.
    pub fn insert(&mut self, locale: String, value: String) {
        match self.0.iter_mut().find(|(existing, _)| *existing == locale) {
            Some(entry) => entry.1 = value,
            None => self.0.push((locale, value)),
        }
    }

    pub fn get(&self, language: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(locale, _)| locale == language)
            .map(|(_, value)| value.as_str())
    }

    /// Text for `language`, falling back to the first declared locale.
    pub fn resolve(&self, language: &str) -> Option<&str> {
        self.get(language)
            .or_else(|| self.0.first().map(|(_, value)| value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

mod ordered_map {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(entries: &[(String, String)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(entries.iter().map(|(locale, value)| (locale, value)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(EntriesVisitor)
    }

    struct EntriesVisitor;

    impl<'de> Visitor<'de> for EntriesVisitor {
        type Value = Vec<(String, String)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of locale to text")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries: Vec<(String, String)> = Vec::new();
            while let Some((locale, value)) = map.next_entry::<String, String>()? {
                match entries.iter_mut().find(|(existing, _)| *existing == locale) {
                    Some(entry) => entry.1 = value,
                    None => entries.push((locale, value)),
                }
            }
            Ok(entries)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_falls_back_to_first_declared_locale() {
        let text = LocalizedText::new([("nl", "Hoofdpijn"), ("en", "Headache")]);
        assert_eq!(text.resolve("en"), Some("Headache"));
        assert_eq!(text.resolve("fr"), Some("Hoofdpijn"));
        assert_eq!(LocalizedText::default().resolve("en"), None);
    }

    #[test]
    fn declaration_order_survives_json() {
        let text: LocalizedText =
            serde_json::from_str(r#"{ "nl": "Hoofdpijn", "en": "Headache" }"#).unwrap();
        assert_eq!(text.resolve("de"), Some("Hoofdpijn"));
        assert_eq!(
            serde_json::to_string(&text).unwrap(),
            r#"{"nl":"Hoofdpijn","en":"Headache"}"#
        );
    }
}
