//! Compound node labels.
//!
//! A label may concatenate a prefix (a dotted number or a document
//! identifier), a verification-team tag and a title, joined by a reserved
//! separator that is not expected in natural text:
//!
//! ```text
//! 1.2.3::Boot sequence
//! PFS-0042::SIT|FIT::Shall restart within 5 seconds
//! ```

/// The separator used unless configured otherwise.
pub const DEFAULT_SEPARATOR: &str = "::";

/// The separator between verification teams inside the team segment.
pub const TEAM_SEPARATOR: char = '|';

/// A label split on the separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompoundLabel<'a> {
    /// The first segment, if the label contains a separator.
    pub prefix: Option<&'a str>,
    /// The team segment, present only for labels with three or more segments.
    pub team: Option<&'a str>,
    /// Everything after the prefix and team segments.
    pub title: &'a str,
}

impl<'a> CompoundLabel<'a> {
    /// Splits `label` on `separator`.
    ///
    /// One segment is a bare title, two are `prefix::title`, three or more
    /// are `prefix::team::title` where the title keeps any further
    /// separators.
    #[must_use]
    pub fn parse(label: &'a str, separator: &str) -> Self {
        let Some((prefix, rest)) = label.split_once(separator) else {
            return Self {
                prefix: None,
                team: None,
                title: label,
            };
        };
        match rest.split_once(separator) {
            Some((team, title)) => Self {
                prefix: Some(prefix),
                team: Some(team),
                title,
            },
            None => Self {
                prefix: Some(prefix),
                team: None,
                title: rest,
            },
        }
    }

    /// The verification teams named by the team segment.
    pub fn teams(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.team
            .into_iter()
            .flat_map(|team| team.split(TEAM_SEPARATOR))
            .map(str::trim)
            .filter(|team| !team.is_empty())
    }
}

/// The canonical key of a label: the text before the first separator, or the
/// whole (trimmed) label when there is none.
#[must_use]
pub fn key<'a>(label: &'a str, separator: &str) -> &'a str {
    let label = label.trim();
    label
        .split_once(separator)
        .map_or(label, |(first, _)| first.trim_end())
}

/// Strips exactly one leading separator-delimited segment.
///
/// Returns `None` if the label has no separator.
#[must_use]
pub fn strip_prefix<'a>(label: &'a str, separator: &str) -> Option<&'a str> {
    label.split_once(separator).map(|(_, rest)| rest)
}

/// Puts `prefix` in front of `label`.
///
/// If the label already has a prefix segment it is replaced; everything after
/// the first separator is kept.
#[must_use]
pub fn with_prefix(label: &str, prefix: &str, separator: &str) -> String {
    let rest = strip_prefix(label, separator).unwrap_or(label);
    format!("{prefix}{separator}{rest}")
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("Title", None, None, "Title"; "bare title")]
    #[test_case("1.2::Title", Some("1.2"), None, "Title"; "prefix and title")]
    #[test_case("PFS-1::SIT|FIT::Title", Some("PFS-1"), Some("SIT|FIT"), "Title"; "with team")]
    #[test_case("A::B::C::D", Some("A"), Some("B"), "C::D"; "title keeps separators")]
    fn parses_compound_labels(
        label: &str,
        prefix: Option<&str>,
        team: Option<&str>,
        title: &str,
    ) {
        let parsed = CompoundLabel::parse(label, DEFAULT_SEPARATOR);
        assert_eq!(parsed.prefix, prefix);
        assert_eq!(parsed.team, team);
        assert_eq!(parsed.title, title);
    }

    #[test]
    fn teams_are_split_and_trimmed() {
        let parsed = CompoundLabel::parse("PFS-1:: SIT | FIT ||::Title", DEFAULT_SEPARATOR);
        assert_eq!(parsed.teams().collect::<Vec<_>>(), vec!["SIT", "FIT"]);
    }

    #[test_case("HDVB-10::Login works", "HDVB-10"; "prefixed")]
    #[test_case("  Plain label ", "Plain label"; "no separator")]
    #[test_case("", ""; "empty")]
    fn extracts_key(label: &str, expected: &str) {
        assert_eq!(key(label, DEFAULT_SEPARATOR), expected);
    }

    #[test]
    fn with_prefix_replaces_existing_prefix() {
        assert_eq!(with_prefix("Title", "1.1", "::"), "1.1::Title");
        assert_eq!(with_prefix("9.9::Title", "1.1", "::"), "1.1::Title");
        assert_eq!(with_prefix("9::SIT::Title", "2", "::"), "2::SIT::Title");
    }

    #[test]
    fn custom_separator() {
        assert_eq!(key("A##B", "##"), "A");
        assert_eq!(strip_prefix("A##B##C", "##"), Some("B##C"));
        assert_eq!(strip_prefix("ABC", "##"), None);
    }
}
