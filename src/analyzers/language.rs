//! Windows resource language identifiers.
//!
//! A LANGID packs a 10-bit primary language and a 6-bit sub-language. Only
//! the codes below are recognised; anything else is reported as a lookup
//! failure by the resource walk.

/// Primary language codes (low 10 bits of a LANGID)
const PRIMARY_LANGUAGES: &[(u16, &str)] = &[
    (0x00, "NEUTRAL"),
    (0x01, "ARABIC"),
    (0x02, "BULGARIAN"),
    (0x03, "CATALAN"),
    (0x04, "CHINESE"),
    (0x05, "CZECH"),
    (0x06, "DANISH"),
    (0x07, "GERMAN"),
    (0x08, "GREEK"),
    (0x09, "ENGLISH"),
    (0x0a, "SPANISH"),
    (0x0b, "FINNISH"),
    (0x0c, "FRENCH"),
    (0x0d, "HEBREW"),
    (0x0e, "HUNGARIAN"),
    (0x0f, "ICELANDIC"),
    (0x10, "ITALIAN"),
    (0x11, "JAPANESE"),
    (0x12, "KOREAN"),
    (0x13, "DUTCH"),
    (0x14, "NORWEGIAN"),
    (0x15, "POLISH"),
    (0x16, "PORTUGUESE"),
    (0x17, "RHAETO_ROMANCE"),
    (0x18, "ROMANIAN"),
    (0x19, "RUSSIAN"),
    (0x1a, "SERBIAN"),
    (0x1b, "SLOVAK"),
    (0x1c, "ALBANIAN"),
    (0x1d, "SWEDISH"),
    (0x1e, "THAI"),
    (0x1f, "TURKISH"),
    (0x20, "URDU"),
    (0x21, "INDONESIAN"),
    (0x22, "UKRAINIAN"),
    (0x23, "BELARUSIAN"),
    (0x24, "SLOVENIAN"),
    (0x25, "ESTONIAN"),
    (0x26, "LATVIAN"),
    (0x27, "LITHUANIAN"),
    (0x28, "MAORI"),
    (0x29, "FARSI"),
    (0x2a, "VIETNAMESE"),
    (0x2b, "ARMENIAN"),
    (0x2c, "AZERI"),
    (0x2d, "BASQUE"),
    (0x2e, "SORBIAN"),
    (0x2f, "MACEDONIAN"),
    (0x30, "SUTU"),
    (0x31, "TSONGA"),
    (0x32, "TSWANA"),
    (0x33, "VENDA"),
    (0x34, "XHOSA"),
    (0x35, "ZULU"),
    (0x36, "AFRIKAANS"),
    (0x37, "GEORGIAN"),
    (0x38, "FAEROESE"),
    (0x39, "HINDI"),
    (0x3a, "MALTESE"),
    (0x3b, "SAAMI"),
    (0x3c, "GAELIC"),
    (0x3e, "MALAY"),
    (0x3f, "KAZAK"),
    (0x40, "KYRGYZ"),
    (0x41, "SWAHILI"),
    (0x43, "UZBEK"),
    (0x44, "TATAR"),
    (0x45, "BENGALI"),
    (0x46, "PUNJABI"),
    (0x47, "GUJARATI"),
    (0x48, "ORIYA"),
    (0x49, "TAMIL"),
    (0x4a, "TELUGU"),
    (0x4b, "KANNADA"),
    (0x4c, "MALAYALAM"),
    (0x4d, "ASSAMESE"),
    (0x4e, "MARATHI"),
    (0x4f, "SANSKRIT"),
    (0x50, "MONGOLIAN"),
    (0x56, "GALICIAN"),
    (0x57, "KONKANI"),
    (0x58, "MANIPURI"),
    (0x59, "SINDHI"),
    (0x5a, "SYRIAC"),
    (0x60, "KASHMIRI"),
    (0x61, "NEPALI"),
    (0x65, "DIVEHI"),
    (0x7f, "INVARIANT"),
    (0x8f, "ESPERANTO"),
    (0x90, "WALON"),
    (0x91, "CORNISH"),
    (0x92, "WELSH"),
    (0x93, "BRETON"),
];

/// Highest sub-language code defined for any primary language (SPANISH_PUERTO_RICO)
const MAX_SUBLANGUAGE: u16 = 0x14;

pub fn primary_language_name(code: u16) -> Option<&'static str> {
    PRIMARY_LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

pub fn is_known_sublanguage(code: u16) -> bool {
    code <= MAX_SUBLANGUAGE
}

/// Split a LANGID into (primary, sub) codes
pub fn split_langid(langid: u32) -> (u16, u16) {
    ((langid & 0x3ff) as u16, ((langid >> 10) & 0x3f) as u16)
}
