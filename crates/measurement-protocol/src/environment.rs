//! Host environment probes reported with each hit.

/// Describes the device the application runs on.
pub trait Environment: Send + Sync {
    /// User language, e.g. `en-us`.
    fn language(&self) -> Option<String>;
    /// Screen size in pixels (width, height).
    fn screen_resolution(&self) -> Option<(u32, u32)>;
    /// Application viewport in pixels (width, height).
    fn viewport(&self) -> Option<(u32, u32)>;
    /// Colour depth in bits.
    fn color_depth(&self) -> Option<u32>;
    /// Document character set, e.g. `UTF-8`.
    fn character_set(&self) -> Option<String>;
}

/// Fixed values, for hosts that know their environment up front and for tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticEnvironment {
    pub language: Option<String>,
    pub screen_resolution: Option<(u32, u32)>,
    pub viewport: Option<(u32, u32)>,
    pub color_depth: Option<u32>,
    pub character_set: Option<String>,
}

impl Environment for StaticEnvironment {
    fn language(&self) -> Option<String> {
        self.language.clone()
    }

    fn screen_resolution(&self) -> Option<(u32, u32)> {
        self.screen_resolution
    }

    fn viewport(&self) -> Option<(u32, u32)> {
        self.viewport
    }

    fn color_depth(&self) -> Option<u32> {
        self.color_depth
    }

    fn character_set(&self) -> Option<String> {
        self.character_set.clone()
    }
}

/// Reads the POSIX locale (`LC_ALL`, then `LANG`). Has no display information.
#[derive(Debug, Clone, Default)]
pub struct SystemEnvironment {
    locale: Option<String>,
}

impl SystemEnvironment {
    pub fn new() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let locale = ["LC_ALL", "LANG"]
            .into_iter()
            .filter_map(|key| lookup(key))
            .find(|value| !value.is_empty());
        Self { locale }
    }
}

impl Environment for SystemEnvironment {
    fn language(&self) -> Option<String> {
        self.locale.as_deref().and_then(locale_language)
    }

    fn screen_resolution(&self) -> Option<(u32, u32)> {
        None
    }

    fn viewport(&self) -> Option<(u32, u32)> {
        None
    }

    fn color_depth(&self) -> Option<u32> {
        None
    }

    fn character_set(&self) -> Option<String> {
        self.locale.as_deref().and_then(locale_codeset)
    }
}

/// `en_US.UTF-8@euro` -> `en-us`. `C` and `POSIX` carry no language.
fn locale_language(locale: &str) -> Option<String> {
    let name = locale.split(['.', '@']).next().unwrap_or_default();
    if name.is_empty() || name == "C" || name == "POSIX" {
        return None;
    }
    Some(name.replace('_', "-").to_ascii_lowercase())
}

/// `en_US.UTF-8@euro` -> `UTF-8`.
fn locale_codeset(locale: &str) -> Option<String> {
    let (_, rest) = locale.split_once('.')?;
    let codeset = rest.split('@').next().unwrap_or_default();
    (!codeset.is_empty()).then(|| codeset.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> SystemEnvironment {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SystemEnvironment::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn parses_language_and_codeset() {
        let env = env(&[("LANG", "en_US.UTF-8")]);
        assert_eq!(env.language().as_deref(), Some("en-us"));
        assert_eq!(env.character_set().as_deref(), Some("UTF-8"));
    }

    #[test]
    fn lc_all_wins_over_lang() {
        let env = env(&[("LC_ALL", "de_DE.ISO-8859-1@euro"), ("LANG", "en_US.UTF-8")]);
        assert_eq!(env.language().as_deref(), Some("de-de"));
        assert_eq!(env.character_set().as_deref(), Some("ISO-8859-1"));
    }

    #[test]
    fn empty_lc_all_falls_back_to_lang() {
        let env = env(&[("LC_ALL", ""), ("LANG", "fr_FR")]);
        assert_eq!(env.language().as_deref(), Some("fr-fr"));
        assert_eq!(env.character_set(), None);
    }

    #[test]
    fn c_locale_has_no_language() {
        let env = env(&[("LANG", "C.UTF-8")]);
        assert_eq!(env.language(), None);
        assert_eq!(env.character_set().as_deref(), Some("UTF-8"));
        assert_eq!(env.screen_resolution(), None);
    }

    #[test]
    fn static_environment_reports_its_fields() {
        let env = StaticEnvironment {
            language: Some("en-gb".into()),
            screen_resolution: Some((1920, 1080)),
            viewport: Some((800, 600)),
            color_depth: Some(24),
            character_set: None,
        };
        assert_eq!(env.screen_resolution(), Some((1920, 1080)));
        assert_eq!(env.color_depth(), Some(24));
        assert_eq!(env.character_set(), None);
    }
}
