//! Turns raw chat text into the location query.

use crate::model::LocationQuery;

const MENTION_OPEN: &str = "<at>";
const MENTION_CLOSE: &str = "</at>";
const NBSP_ENTITY: &str = "&nbsp;";
const LINE_TERMINATORS: [char; 4] = ['\n', '\r', '\u{2028}', '\u{2029}'];

/// Strip the bot mention and surrounding whitespace from `text`.
///
/// The mention spans from the first `<at>` to the last `</at>` on the same
/// line and may be followed by one `&nbsp;` entity. Whatever is left is
/// passed through without any check that it names a real place.
pub fn extract_location(text: &str) -> LocationQuery {
    LocationQuery::new(strip_mention(text).trim())
}

fn strip_mention(text: &str) -> String {
    match mention_span(text) {
        Some((start, end)) => format!("{}{}", &text[..start], &text[end..]),
        None => text.to_string(),
    }
}

/// Byte range of the first mention, including a trailing `&nbsp;`.
fn mention_span(text: &str) -> Option<(usize, usize)> {
    for (start, _) in text.match_indices(MENTION_OPEN) {
        let body_start = start + MENTION_OPEN.len();
        let line_end = text[body_start..]
            .find(LINE_TERMINATORS)
            .map_or(text.len(), |offset| body_start + offset);

        let Some(close) = text[body_start..line_end].rfind(MENTION_CLOSE) else {
            continue;
        };

        let mut end = body_start + close + MENTION_CLOSE.len();
        if text[end..].starts_with(NBSP_ENTITY) {
            end += NBSP_ENTITY.len();
        }
        return Some((start, end));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> String {
        extract_location(text).as_str().to_string()
    }

    #[test]
    fn strips_mention_and_entity() {
        assert_eq!(extract("<at>WeatherBot</at>&nbsp;Seattle"), "Seattle");
    }

    #[test]
    fn strips_mention_without_entity() {
        assert_eq!(extract("<at>WeatherBot</at> New York "), "New York");
    }

    #[test]
    fn only_one_entity_is_removed() {
        assert_eq!(extract("<at>Bot</at>&nbsp;&nbsp;Oslo"), "&nbsp;Oslo");
    }

    #[test]
    fn trims_non_breaking_spaces() {
        assert_eq!(extract("<at>Bot</at>\u{a0}London\u{a0}"), "London");
    }

    #[test]
    fn text_without_mention_is_trimmed_only() {
        assert_eq!(extract("  Paris \n"), "Paris");
    }

    #[test]
    fn mention_span_is_greedy_within_a_line() {
        assert_eq!(extract("<at>Weather</at> <at>Bot</at>&nbsp;Rome"), "Rome");
    }

    #[test]
    fn mention_does_not_span_lines() {
        assert_eq!(extract("<at>Bot\n</at>Rome"), "<at>Bot\n</at>Rome");
    }

    #[test]
    fn later_mention_is_used_when_first_is_unterminated() {
        assert_eq!(extract("<at>x\n<at>Bot</at>&nbsp;Kyiv"), "<at>x\nKyiv");
    }

    #[test]
    fn unterminated_mention_is_kept() {
        assert_eq!(extract("<at>Bot Madrid"), "<at>Bot Madrid");
    }

    #[test]
    fn mention_only_yields_empty_query() {
        let query = extract_location("<at>WeatherBot</at>&nbsp;");
        assert!(query.is_empty());
    }

    #[test]
    fn text_before_mention_is_kept() {
        assert_eq!(extract("Weather for <at>Bot</at>&nbsp;Lima"), "Weather for Lima");
    }
}
