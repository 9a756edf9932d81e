//! Speech locale and voice lookup.

/// Locale used when a language has no entry.
pub const DEFAULT_LOCALE: &str = "en-US";

/// Voice used when a language has no entry.
pub const DEFAULT_VOICE: &str = "en-US-JennyNeural";

/// `(language code, locale, neural voice)`.
const LANGUAGES: &[(&str, &str, &str)] = &[
    ("en", "en-US", "en-US-JennyNeural"),
    ("tr", "tr-TR", "tr-TR-EmelNeural"),
    ("de", "de-DE", "de-DE-KatjaNeural"),
    ("es", "es-ES", "es-ES-ElviraNeural"),
    ("fr", "fr-FR", "fr-FR-DeniseNeural"),
    ("it", "it-IT", "it-IT-ElsaNeural"),
    ("pt", "pt-PT", "pt-PT-RaquelNeural"),
    ("ru", "ru-RU", "ru-RU-SvetlanaNeural"),
    ("ja", "ja-JP", "ja-JP-NanamiNeural"),
    ("zh", "zh-CN", "zh-CN-XiaoxiaoNeural"),
    ("ko", "ko-KR", "ko-KR-SunHiNeural"),
    ("ar", "ar-SA", "ar-SA-ZariyahNeural"),
    ("az", "az-AZ", "az-AZ-BabekNeural"),
    ("hr", "hr-HR", "hr-HR-GabrijelaNeural"),
    ("cs", "cs-CZ", "cs-CZ-VlastaNeural"),
    ("da", "da-DK", "da-DK-ChristelNeural"),
    ("nl", "nl-NL", "nl-NL-ColetteNeural"),
    ("fi", "fi-FI", "fi-FI-NooraNeural"),
    ("el", "el-GR", "el-GR-AthinaNeural"),
    ("hi", "hi-IN", "hi-IN-SwaraNeural"),
    ("id", "id-ID", "id-ID-GadisNeural"),
    ("no", "nb-NO", "nb-NO-PernilleNeural"),
    ("pl", "pl-PL", "pl-PL-AgnieszkaNeural"),
    ("ro", "ro-RO", "ro-RO-AlinaNeural"),
    ("sv", "sv-SE", "sv-SE-SofieNeural"),
    ("th", "th-TH", "th-TH-PremwadeeNeural"),
    ("uk", "uk-UA", "uk-UA-PolinaNeural"),
    ("ur", "ur-PK", "ur-PK-UzmaNeural"),
    ("vi", "vi-VN", "vi-VN-HoaiMyNeural"),
];

fn lookup(code: &str) -> Option<&'static (&'static str, &'static str, &'static str)> {
    LANGUAGES.iter().find(|(c, _, _)| *c == code)
}

/// Speech locale for a language code, e.g. `tr` → `tr-TR`.
pub fn azure_locale(code: &str) -> &'static str {
    lookup(code).map_or(DEFAULT_LOCALE, |(_, locale, _)| *locale)
}

/// Neural voice for a language code.
pub fn azure_voice(code: &str) -> &'static str {
    lookup(code).map_or(DEFAULT_VOICE, |(_, _, voice)| *voice)
}

pub fn is_supported(code: &str) -> bool {
    lookup(code).is_some()
}
