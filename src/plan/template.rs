// src/plan/template.rs

//! Tag templates such as `"{arch}-{tag}"` or `"build_{c_short}"`.
//!
//! Templates are parsed once, at config load, into a closed set of
//! placeholders over [`TagSet`]. Unknown placeholders and unbalanced braces
//! are rejected with a [`TemplateError`]. `{{` and `}}` produce literal braces.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Values substituted into tag templates, resolved once per repository.
///
/// Every field defaults to the empty string; a repository without tags
/// simply yields empty `tag` / `tag_full`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    /// Host architecture, e.g. `arm64v8`.
    pub arch: String,
    /// Latest commit hash.
    pub commit_full: String,
    /// First 7 characters of `commit_full`.
    pub commit_short: String,
    /// Nearest tag, e.g. `0.7.1`.
    pub tag: String,
    /// `git describe` output, e.g. `0.7.1-1-gdc36179`.
    pub tag_full: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unknown placeholder '{{{0}}}' in tag template '{1}'")]
    UnknownPlaceholder(String, String),

    #[error("unbalanced brace in tag template '{0}'")]
    UnbalancedBrace(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Arch,
    CommitFull,
    CommitShort,
    Tag,
    TagFull,
}

impl Placeholder {
    fn lookup(name: &str) -> Option<Self> {
        match name {
            "arch" => Some(Placeholder::Arch),
            "c_full" | "commit_full" => Some(Placeholder::CommitFull),
            "c_short" | "commit_short" => Some(Placeholder::CommitShort),
            "tag" => Some(Placeholder::Tag),
            "tag_full" => Some(Placeholder::TagFull),
            _ => None,
        }
    }

    fn value<'a>(&self, tags: &'a TagSet) -> &'a str {
        match self {
            Placeholder::Arch => &tags.arch,
            Placeholder::CommitFull => &tags.commit_full,
            Placeholder::CommitShort => &tags.commit_short,
            Placeholder::Tag => &tags.tag,
            Placeholder::TagFull => &tags.tag_full,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field(Placeholder),
}

/// A parsed tag template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl TagTemplate {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    text.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    text.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for n in chars.by_ref() {
                        if n == '}' {
                            closed = true;
                            break;
                        }
                        name.push(n);
                    }
                    if !closed {
                        return Err(TemplateError::UnbalancedBrace(source.to_string()));
                    }
                    let field = Placeholder::lookup(&name).ok_or_else(|| {
                        TemplateError::UnknownPlaceholder(name.clone(), source.to_string())
                    })?;
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(Segment::Field(field));
                }
                '}' => return Err(TemplateError::UnbalancedBrace(source.to_string())),
                other => text.push(other),
            }
        }

        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The template as written in the config.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expand(&self, tags: &TagSet) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Field(field) => out.push_str(field.value(tags)),
            }
        }
        out
    }
}

impl FromStr for TagTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TagTemplate::parse(s)
    }
}

impl fmt::Display for TagTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tags() -> TagSet {
        TagSet {
            arch: "arm64v8".into(),
            commit_full: "dc361791f21a4132dcf4f385b69c4448fa9a48c1".into(),
            commit_short: "dc36179".into(),
            tag: "0.7.1".into(),
            tag_full: "0.7.1-1-gdc36179".into(),
        }
    }

    #[test]
    fn expands_known_placeholders() {
        let tags = sample_tags();
        assert_eq!(
            TagTemplate::parse("{arch}-{tag}").unwrap().expand(&tags),
            "arm64v8-0.7.1"
        );
        assert_eq!(
            TagTemplate::parse("build_{c_short}").unwrap().expand(&tags),
            "build_dc36179"
        );
        assert_eq!(
            TagTemplate::parse("{commit_short}").unwrap().expand(&tags),
            "dc36179"
        );
    }

    #[test]
    fn missing_values_expand_to_empty() {
        let tmpl = TagTemplate::parse("{tag}").unwrap();
        assert_eq!(tmpl.expand(&TagSet::default()), "");
    }

    #[test]
    fn rejects_unknown_placeholder() {
        let err = TagTemplate::parse("{branch}").unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnknownPlaceholder("branch".into(), "{branch}".into())
        );
    }

    #[test]
    fn rejects_unbalanced_braces() {
        assert!(matches!(
            TagTemplate::parse("{arch"),
            Err(TemplateError::UnbalancedBrace(_))
        ));
        assert!(matches!(
            TagTemplate::parse("arch}"),
            Err(TemplateError::UnbalancedBrace(_))
        ));
    }

    #[test]
    fn doubled_braces_are_literal() {
        let tmpl = TagTemplate::parse("{{x}}-{arch}").unwrap();
        assert_eq!(tmpl.expand(&sample_tags()), "{x}-arm64v8");
    }

    #[test]
    fn plain_text_has_no_placeholders() {
        let tmpl = TagTemplate::parse("latest").unwrap();
        assert_eq!(tmpl.expand(&TagSet::default()), "latest");
        assert_eq!(tmpl.source(), "latest");
    }
}
