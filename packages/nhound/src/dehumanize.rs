//! Turn a human relative-time phrase into an absolute timestamp.

use chrono::{DateTime, Duration, Months, Utc};

/// Resolve phrases like `"3 weeks"` or `"a month"` to `now` minus that
/// interval. Month and year arithmetic is calendar-aware, so one month
/// before Mar 31 is the last day of February.
///
/// The input is untrusted free text typed by humans into documents, so
/// this never fails: anything unparseable logs an error and resolves to
/// `now` unchanged.
pub fn dehumanize(text: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();

    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    let [span, unit] = tokens.as_slice() else {
        tracing::error!(text, "Failed to parse humanized text");
        return now;
    };

    let value: u32 = match span.parse() {
        Ok(v) => v,
        Err(_) if *span == "a" || *span == "an" => 1,
        Err(e) => {
            tracing::error!(text, span = *span, error = %e, "Failed to cast span of humanized text");
            return now;
        }
    };

    match *unit {
        "day" | "days" => now
            .checked_sub_signed(Duration::days(i64::from(value)))
            .unwrap_or(now),
        "week" | "weeks" => now
            .checked_sub_signed(Duration::weeks(i64::from(value)))
            .unwrap_or(now),
        "month" | "months" => now.checked_sub_months(Months::new(value)).unwrap_or(now),
        "year" | "years" => value
            .checked_mul(12)
            .and_then(|months| now.checked_sub_months(Months::new(months)))
            .unwrap_or(now),
        _ => {
            tracing::error!(text, unit = *unit, "Unrecognized unit in humanized text");
            now
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2077, 5, 21, 22, 0, 0).unwrap()
    }

    #[test]
    fn unparseable_phrases_resolve_to_now() {
        for text in [
            "",
            "something wrong",
            "WrOnG",
            "a things-that-should-not-be",
            "things that should not be",
            "Now!",
            "?Now.",
            "now",
        ] {
            assert_eq!(dehumanize(text, now()), now(), "input: {text:?}");
        }
    }

    #[test]
    fn valid_phrases_subtract_their_interval() {
        let now = now();
        let cases = [
            ("a day", now - Duration::days(1)),
            ("an hour", now), // "an" parses, the unit does not
            ("3 days", now - Duration::days(3)),
            ("53 days", now - Duration::days(53)),
            ("a week", now - Duration::weeks(1)),
            ("7 weeks", now - Duration::weeks(7)),
            ("63 weeks", now - Duration::weeks(63)),
            ("a month", now.checked_sub_months(Months::new(1)).unwrap()),
            ("11 months", now.checked_sub_months(Months::new(11)).unwrap()),
            ("101 months", now.checked_sub_months(Months::new(101)).unwrap()),
            ("a year", now.checked_sub_months(Months::new(12)).unwrap()),
            ("13 years", now.checked_sub_months(Months::new(156)).unwrap()),
            ("666 years", now.checked_sub_months(Months::new(7992)).unwrap()),
        ];
        for (text, expected) in cases {
            assert_eq!(dehumanize(text, now), expected, "input: {text:?}");
        }
    }

    #[test]
    fn three_days_before_a_fixed_instant() {
        assert_eq!(
            dehumanize("3 days", now()),
            Utc.with_ymd_and_hms(2077, 5, 18, 22, 0, 0).unwrap()
        );
    }

    #[test]
    fn month_subtraction_clamps_to_month_end() {
        let end_of_march = Utc.with_ymd_and_hms(2077, 3, 31, 12, 0, 0).unwrap();
        assert_eq!(
            dehumanize("a month", end_of_march),
            Utc.with_ymd_and_hms(2077, 2, 28, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn punctuation_is_stripped_before_parsing() {
        assert_eq!(dehumanize("(3 weeks)", now()), now() - Duration::weeks(3));
    }
}
