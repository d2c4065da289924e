//! Date helper functions

use chrono::{DateTime, Local, Locale, TimeZone, Utc};
use chrono_tz::Tz;

/// Format a date using a Moment.js-compatible format string, localized
/// to `language` and shifted into `timezone` (IANA name; empty means the
/// machine's local zone)
///
/// # Examples
/// ```ignore
/// format_date(&date, "DD MMM YYYY", "pt-BR", "UTC") // -> "15 mar 2021"
/// ```
pub fn format_date(date: &DateTime<Utc>, format: &str, language: &str, timezone: &str) -> String {
    let chrono_format = moment_to_chrono_format(format);
    let locale = locale_for(language);

    if timezone.is_empty() {
        return render(&date.with_timezone(&Local), &chrono_format, locale);
    }

    match timezone.parse::<Tz>() {
        Ok(tz) => render(&date.with_timezone(&tz), &chrono_format, locale),
        Err(_) => {
            tracing::warn!("Unknown timezone {:?}, using local time", timezone);
            render(&date.with_timezone(&Local), &chrono_format, locale)
        }
    }
}

fn render<Z: TimeZone>(date: &DateTime<Z>, format: &str, locale: Locale) -> String
where
    Z::Offset: std::fmt::Display,
{
    date.format_localized(format, locale).to_string()
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml<Z: TimeZone>(date: &DateTime<Z>) -> String
where
    Z::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string()
}

/// Map a site language tag to a chrono locale
pub fn locale_for(language: &str) -> Locale {
    let normalized = language.replace('_', "-").to_lowercase();
    match normalized.as_str() {
        "pt-br" | "pt" => Locale::pt_BR,
        "pt-pt" => Locale::pt_PT,
        "es" | "es-es" => Locale::es_ES,
        "fr" | "fr-fr" => Locale::fr_FR,
        "de" | "de-de" => Locale::de_DE,
        "it" | "it-it" => Locale::it_IT,
        "en-gb" => Locale::en_GB,
        _ => Locale::en_US,
    }
}

/// Convert Moment.js format to chrono format
fn moment_to_chrono_format(format: &str) -> String {
    // Longest patterns first within each category
    let replacements = [
        // Year
        ("YYYY", "%Y"),
        ("YY", "%y"),
        // Month
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        // Day of month
        ("DDDD", "%j"),
        ("DD", "%d"),
        // Hour
        ("HH", "%H"),
        ("hh", "%I"),
        // Minute (after MM is gone)
        ("mm", "%M"),
        ("ss", "%S"),
        // Day of week
        ("dddd", "%A"),
        ("ddd", "%a"),
        ("ZZ", "%z"),
        ("SSS", "%3f"),
    ];

    let mut result = format.to_string();

    for (from, to) in replacements {
        result = result.replace(from, to);
    }

    result
}
