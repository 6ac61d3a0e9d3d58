use crate::model::{MissingDelimiter, Section};

pub const DEFAULT_DELIMITER: char = ':';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    pub delimiter: char,
    pub missing_delimiter: MissingDelimiter,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            missing_delimiter: MissingDelimiter::default(),
        }
    }
}

impl ParseOptions {
    pub fn with_policy(missing_delimiter: MissingDelimiter) -> Self {
        Self {
            missing_delimiter,
            ..Self::default()
        }
    }
}

/// Split lesson plan text into sections, one per line.
///
/// A line is split at the first delimiter only; anything after it, further
/// delimiters included, becomes the content. Both halves are trimmed.
/// Whitespace-only lines never produce a section.
pub fn parse_sections(text: &str, opts: &ParseOptions) -> Vec<Section> {
    text.lines()
        .filter_map(|line| parse_line(line, opts))
        .collect()
}

fn parse_line(line: &str, opts: &ParseOptions) -> Option<Section> {
    if line.trim().is_empty() {
        return None;
    }
    match line.split_once(opts.delimiter) {
        Some((name, content)) => Some(Section::new(name.trim(), content.trim())),
        None => match opts.missing_delimiter {
            MissingDelimiter::Skip => None,
            MissingDelimiter::KeepAsName => Some(Section::new(line.trim(), "")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skip() -> ParseOptions {
        ParseOptions::with_policy(MissingDelimiter::Skip)
    }

    fn keep() -> ParseOptions {
        ParseOptions::with_policy(MissingDelimiter::KeepAsName)
    }

    #[test]
    fn parses_simple_plan_in_order() {
        let text = "Title: My Lesson\nGrade: 5\nObjectives: Learn loops";
        let sections = parse_sections(text, &skip());
        assert_eq!(
            sections,
            vec![
                Section::new("Title", "My Lesson"),
                Section::new("Grade", "5"),
                Section::new("Objectives", "Learn loops"),
            ]
        );
    }

    #[test]
    fn line_without_colon_follows_policy() {
        assert!(parse_sections("Line without colon", &skip()).is_empty());
        assert_eq!(
            parse_sections("Line without colon", &keep()),
            vec![Section::new("Line without colon", "")]
        );
    }

    #[test]
    fn splits_on_first_delimiter_only() {
        let sections = parse_sections("Resources: https://example.com: free", &skip());
        assert_eq!(sections, vec![Section::new("Resources", "https://example.com: free")]);
    }

    #[test]
    fn trims_name_and_content_but_not_inner_spaces() {
        let sections = parse_sections("  Lesson stages :  Beginning  Middle  End \r\n", &skip());
        assert_eq!(sections, vec![Section::new("Lesson stages", "Beginning  Middle  End")]);
    }

    #[test]
    fn empty_and_blank_input_yield_nothing() {
        for opts in [skip(), keep()] {
            assert!(parse_sections("", &opts).is_empty());
            assert!(parse_sections("  \n\t\n\n", &opts).is_empty());
        }
    }

    #[test]
    fn duplicates_are_kept_separately() {
        let sections = parse_sections("Values: respect\nValues: teamwork", &skip());
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].content, "respect");
        assert_eq!(sections[1].content, "teamwork");
    }

    #[test]
    fn empty_name_or_content_is_kept() {
        let sections = parse_sections(":orphan\nName:", &skip());
        assert_eq!(sections, vec![Section::new("", "orphan"), Section::new("Name", "")]);
    }

    #[test]
    fn parse_is_idempotent() {
        let text = "Grade level: 7\nno colon here\nICT used: Kahoot, Padlet\n\nБағалау: сұрақтар";
        for opts in [skip(), keep()] {
            assert_eq!(parse_sections(text, &opts), parse_sections(text, &opts));
        }
    }

    #[test]
    fn keep_policy_preserves_line_order() {
        let text = "Warm-up\nObjectives: read\nPlenary";
        let names: Vec<_> = parse_sections(text, &keep())
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["Warm-up", "Objectives", "Plenary"]);
    }

    #[test]
    fn custom_delimiter() {
        let opts = ParseOptions {
            delimiter: '|',
            missing_delimiter: MissingDelimiter::Skip,
        };
        assert_eq!(
            parse_sections("Grade | 5: advanced", &opts),
            vec![Section::new("Grade", "5: advanced")]
        );
    }

    #[test]
    fn kazakh_text_is_split_on_char_boundaries() {
        let sections = parse_sections("Құндылықтар: құрмет, ынтымақ", &skip());
        assert_eq!(sections, vec![Section::new("Құндылықтар", "құрмет, ынтымақ")]);
    }
}
