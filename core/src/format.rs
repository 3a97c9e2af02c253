//! Text formatting shared by the handlers.

use chrono::Weekday;

/// Upper-case the first letter of every word and lower-case the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

/// `$12.50`
pub fn currency(amount: f64) -> String {
    format!("${amount:.2}")
}

/// Signed whole-number percentage change for a multiplicative factor:
/// `1.2` renders as `+20%`, `0.9` as `-10%`.
pub fn signed_percent(factor: f64) -> String {
    format!("{:+.0}%", (factor - 1.0) * 100.0)
}

/// Lower-case English day name, as used for table keys.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_case_handles_words_and_punctuation() {
        assert_eq!(title_case("proteins"), "Proteins");
        assert_eq!(title_case("new restaurant"), "New Restaurant");
        assert_eq!(title_case("FARM-TO-TABLE"), "Farm-To-Table");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn currency_uses_two_decimals() {
        assert_eq!(currency(20.0), "$20.00");
        assert_eq!(currency(31.2), "$31.20");
    }

    #[test]
    fn signed_percent_rounds_to_whole_numbers() {
        assert_eq!(signed_percent(1.2), "+20%");
        assert_eq!(signed_percent(0.9), "-10%");
        assert_eq!(signed_percent(1.3), "+30%");
        assert_eq!(signed_percent(1.1), "+10%");
    }
}
