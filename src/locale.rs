//! Per-country search engine locale tables
//!
//! Maps country codes to the engine domain and the region/language query
//! parameters that domain expects. Unknown countries fall back to US.

/// Locale parameters for one target country
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryConfig {
    /// Country code this entry serves
    pub country: &'static str,
    /// Search engine host for the country (no scheme)
    pub domain: &'static str,
    /// Region query parameter (`gl`)
    pub gl: &'static str,
    /// Interface language query parameter (`hl`)
    pub hl: &'static str,
}

/// Countries with dedicated engine domains/parameters
pub const COUNTRY_CONFIGS: &[CountryConfig] = &[
    CountryConfig { country: "US", domain: "google.com", gl: "us", hl: "en" },
    CountryConfig { country: "ES", domain: "google.com", gl: "es", hl: "es" },
    CountryConfig { country: "AR", domain: "google.com.ar", gl: "ar", hl: "es" },
    CountryConfig { country: "MX", domain: "google.com.mx", gl: "mx", hl: "es" },
    CountryConfig { country: "CO", domain: "google.com.co", gl: "co", hl: "es" },
    CountryConfig { country: "CL", domain: "google.cl", gl: "cl", hl: "es" },
    CountryConfig { country: "PE", domain: "google.com.pe", gl: "pe", hl: "es" },
    CountryConfig { country: "UK", domain: "google.co.uk", gl: "uk", hl: "en" },
    CountryConfig { country: "FR", domain: "google.fr", gl: "fr", hl: "fr" },
    CountryConfig { country: "DE", domain: "google.de", gl: "de", hl: "de" },
];

/// Look up the locale table entry for a country code, falling back to US
#[must_use]
pub fn country_config(country: &str) -> &'static CountryConfig {
    let upper = country.to_ascii_uppercase();
    COUNTRY_CONFIGS
        .iter()
        .find(|c| c.country == upper)
        .unwrap_or(&COUNTRY_CONFIGS[0])
}

/// Alphabet used for suggestion expansion in a given language
#[must_use]
pub fn alphabet_for(language: &str) -> &'static str {
    match language {
        "es" => "abcdefghijklmnñopqrstuvwxyz",
        "de" => "abcdefghijklmnopqrstuvwxyzäöü",
        "pt" => "abcdefghijklmnopqrstuvwxyzç",
        _ => "abcdefghijklmnopqrstuvwxyz",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_country_resolves() {
        let config = country_config("FR");
        assert_eq!(config.domain, "google.fr");
        assert_eq!(config.hl, "fr");
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(country_config("mx").domain, "google.com.mx");
    }

    #[test]
    fn unknown_country_falls_back_to_us() {
        let config = country_config("ZZ");
        assert_eq!(config.country, "US");
        assert_eq!(config.gl, "us");
    }

    #[test]
    fn alphabets_cover_language_specific_letters() {
        assert!(alphabet_for("es").contains('ñ'));
        assert!(alphabet_for("de").contains('ü'));
        assert_eq!(alphabet_for("ja"), alphabet_for("en"));
    }
}
