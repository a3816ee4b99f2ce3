//! Country code to language lookup
//!
//! Maps an ISO 3166-1 alpha-2 country code to the culture tag most commonly
//! used in that country. Codes not in the table (including the empty code
//! returned when a lookup has no country) map to [`DEFAULT_LANGUAGE`].

/// Culture tag returned for unknown country codes
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// (country code, culture tag), sorted by country code
static COUNTRY_LANGUAGES: &[(&str, &str)] = &[
    ("AD", "ca-AD"), ("AE", "ar-AE"), ("AF", "fa-AF"), ("AG", "en-AG"),
    ("AI", "en-AI"), ("AL", "sq-AL"), ("AM", "hy-AM"), ("AO", "pt-AO"),
    ("AQ", "en-AQ"), ("AR", "es-AR"), ("AS", "en-AS"), ("AT", "de-AT"),
    ("AU", "en-AU"), ("AW", "nl-AW"), ("AZ", "az-AZ"), ("BA", "bs-BA"),
    ("BB", "en-BB"), ("BD", "bn-BD"), ("BE", "nl-BE"), ("BF", "fr-BF"),
    ("BG", "bg-BG"), ("BH", "ar-BH"), ("BI", "fr-BI"), ("BJ", "fr-BJ"),
    ("BM", "en-BM"), ("BN", "ms-BN"), ("BO", "es-BO"), ("BR", "pt-BR"),
    ("BS", "en-BS"), ("BT", "dz-BT"), ("BW", "en-BW"), ("BY", "be-BY"),
    ("BZ", "en-BZ"), ("CA", "en-CA"), ("CF", "fr-CF"), ("CG", "fr-CG"),
    ("CH", "de-CH"), ("CL", "es-CL"), ("CM", "fr-CM"), ("CN", "zh-CN"),
    ("CO", "es-CO"), ("CR", "es-CR"), ("CU", "es-CU"), ("CV", "pt-CV"),
    ("CY", "el-CY"), ("CZ", "cs-CZ"), ("DE", "de-DE"), ("DJ", "fr-DJ"),
    ("DK", "da-DK"), ("DM", "en-DM"), ("DO", "es-DO"), ("DZ", "ar-DZ"),
    ("EC", "es-EC"), ("EE", "et-EE"), ("EG", "ar-EG"), ("ER", "ti-ER"),
    ("ES", "es-ES"), ("ET", "am-ET"), ("FI", "fi-FI"), ("FJ", "en-FJ"),
    ("FM", "en-FM"), ("FR", "fr-FR"), ("GA", "fr-GA"), ("GB", "en-GB"),
    ("GD", "en-GD"), ("GE", "ka-GE"), ("GH", "en-GH"), ("GM", "en-GM"),
    ("GN", "fr-GN"), ("GQ", "es-GQ"), ("GR", "el-GR"), ("GT", "es-GT"),
    ("GU", "en-GU"), ("GW", "pt-GW"), ("GY", "en-GY"), ("HK", "zh-HK"),
    ("HN", "es-HN"), ("HR", "hr-HR"), ("HT", "fr-HT"), ("HU", "hu-HU"),
    ("ID", "id-ID"), ("IE", "en-IE"), ("IL", "he-IL"), ("IN", "hi-IN"),
    ("IQ", "ar-IQ"), ("IR", "fa-IR"), ("IS", "is-IS"), ("IT", "it-IT"),
    ("JM", "en-JM"), ("JO", "ar-JO"), ("JP", "ja-JP"), ("KE", "sw-KE"),
    ("KG", "ky-KG"), ("KH", "km-KH"), ("KI", "en-KI"), ("KM", "ar-KM"),
    ("KN", "en-KN"), ("KP", "ko-KP"), ("KR", "ko-KR"), ("KW", "ar-KW"),
    ("KY", "en-KY"), ("KZ", "kk-KZ"), ("LA", "lo-LA"), ("LB", "ar-LB"),
    ("LC", "en-LC"), ("LI", "de-LI"), ("LK", "si-LK"), ("LR", "en-LR"),
    ("LS", "st-LS"), ("LT", "lt-LT"), ("LU", "fr-LU"), ("LV", "lv-LV"),
    ("LY", "ar-LY"), ("MA", "ar-MA"), ("MC", "fr-MC"), ("MD", "ro-MD"),
    ("ME", "sr-ME"), ("MG", "fr-MG"), ("MH", "en-MH"), ("MK", "mk-MK"),
    ("ML", "fr-ML"), ("MM", "my-MM"), ("MN", "mn-MN"), ("MO", "zh-MO"),
    ("MR", "ar-MR"), ("MT", "mt-MT"), ("MU", "mfe-MU"), ("MV", "dv-MV"),
    ("MW", "en-MW"), ("MX", "es-MX"), ("MY", "ms-MY"), ("MZ", "pt-MZ"),
    ("NA", "en-NA"), ("NE", "fr-NE"), ("NG", "en-NG"), ("NI", "es-NI"),
    ("NL", "nl-NL"), ("NO", "no-NO"), ("NP", "ne-NP"), ("NR", "en-NR"),
    ("NZ", "en-NZ"), ("OM", "ar-OM"), ("PA", "es-PA"), ("PE", "es-PE"),
    ("PG", "en-PG"), ("PH", "en-PH"), ("PK", "ur-PK"), ("PL", "pl-PL"),
    ("PR", "es-PR"), ("PS", "ar-PS"), ("PT", "pt-PT"), ("PW", "en-PW"),
    ("PY", "es-PY"), ("QA", "ar-QA"), ("RO", "ro-RO"), ("RS", "sr-RS"),
    ("RU", "ru-RU"), ("RW", "rw-RW"), ("SA", "ar-SA"), ("SB", "en-SB"),
    ("SC", "fr-SC"), ("SD", "ar-SD"), ("SE", "sv-SE"), ("SG", "en-SG"),
    ("SI", "sl-SI"), ("SK", "sk-SK"), ("SL", "en-SL"), ("SM", "it-SM"),
    ("SN", "fr-SN"), ("SO", "so-SO"), ("SR", "nl-SR"), ("SS", "en-SS"),
    ("ST", "pt-ST"), ("SV", "es-SV"), ("SY", "ar-SY"), ("SZ", "en-SZ"),
    ("TD", "fr-TD"), ("TG", "fr-TG"), ("TH", "th-TH"), ("TJ", "tg-TJ"),
    ("TL", "pt-TL"), ("TM", "tk-TM"), ("TN", "ar-TN"), ("TO", "en-TO"),
    ("TR", "tr-TR"), ("TT", "en-TT"), ("TV", "en-TV"), ("TW", "zh-TW"),
    ("TZ", "sw-TZ"), ("UA", "uk-UA"), ("UG", "en-UG"), ("US", "en-US"),
    ("UY", "es-UY"), ("UZ", "uz-UZ"), ("VC", "en-VC"), ("VE", "es-VE"),
    ("VN", "vi-VN"), ("VU", "en-VU"), ("WS", "en-WS"), ("YE", "ar-YE"),
    ("ZA", "af-ZA"), ("ZM", "en-ZM"), ("ZW", "en-ZW"),
];

/// Culture tag for a country code, e.g. `"FR"` -> `"fr-FR"`
///
/// Matching is ASCII case-insensitive.
pub fn language_for_country(country_code: &str) -> &'static str {
    if country_code.len() != 2 {
        return DEFAULT_LANGUAGE;
    }
    let code = country_code.to_ascii_uppercase();

    COUNTRY_LANGUAGES
        .binary_search_by(|(cc, _)| (*cc).cmp(code.as_str()))
        .map(|idx| COUNTRY_LANGUAGES[idx].1)
        .unwrap_or(DEFAULT_LANGUAGE)
}
