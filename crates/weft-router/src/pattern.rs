//! Path templates and request-path matching.
//!
//! A template like `/users/:id/posts` is compiled once at registration
//! into a [`PathPattern`]: a sequence of literal and parameter segments.
//! Matching is segment-by-segment with no backtracking, and captured
//! values are percent-decoded.

use std::fmt;

/// One segment of a compiled path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A literal segment that must match exactly.
    Literal(String),
    /// A named capture, written `:name` in the template.
    Param(String),
}

/// A compiled path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    template: String,
    segments: Vec<Segment>,
}

/// A template failed to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// The template does not start with `/`.
    MissingLeadingSlash { template: String },
    /// The template contains an empty segment (`//`).
    EmptySegment { template: String },
    /// A `:` segment has no name.
    EmptyParamName { template: String },
    /// The same parameter name appears twice.
    DuplicateParam { template: String, name: String },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLeadingSlash { template } => {
                write!(f, "path template {template:?} must start with '/'")
            }
            Self::EmptySegment { template } => {
                write!(f, "path template {template:?} contains an empty segment")
            }
            Self::EmptyParamName { template } => {
                write!(f, "path template {template:?} has a parameter with no name")
            }
            Self::DuplicateParam { template, name } => {
                write!(f, "path template {template:?} repeats parameter `{name}`")
            }
        }
    }
}

impl std::error::Error for PatternError {}

impl PathPattern {
    /// Compile a path template.
    ///
    /// # Errors
    ///
    /// Returns a [`PatternError`] when the template is malformed: no
    /// leading slash, an empty segment, an unnamed parameter, or a
    /// duplicated parameter name.
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        if !template.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash {
                template: template.to_owned(),
            });
        }
        let mut segments = Vec::new();
        let mut names: Vec<&str> = Vec::new();
        if template != "/" {
            for raw in template[1..].split('/') {
                if raw.is_empty() {
                    return Err(PatternError::EmptySegment {
                        template: template.to_owned(),
                    });
                }
                if let Some(name) = raw.strip_prefix(':') {
                    if name.is_empty() {
                        return Err(PatternError::EmptyParamName {
                            template: template.to_owned(),
                        });
                    }
                    if names.contains(&name) {
                        return Err(PatternError::DuplicateParam {
                            template: template.to_owned(),
                            name: name.to_owned(),
                        });
                    }
                    names.push(name);
                    segments.push(Segment::Param(name.to_owned()));
                } else {
                    segments.push(Segment::Literal(raw.to_owned()));
                }
            }
        }
        Ok(Self {
            template: template.to_owned(),
            segments,
        })
    }

    /// The original template text.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The compiled segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of the capture parameters, in template order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match a request path against this pattern.
    ///
    /// Returns the captured parameters on a match. Paths must have the
    /// same number of segments; an empty segment never matches a capture,
    /// so `/users//posts` does not match `/users/:id/posts`.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<Vec<(String, String)>> {
        let path = path.strip_prefix('/')?;
        let mut captures = Vec::new();
        let given: Vec<&str> = if path.is_empty() {
            Vec::new()
        } else {
            path.split('/').collect()
        };
        if given.len() != self.segments.len() {
            return None;
        }
        for (segment, part) in self.segments.iter().zip(&given) {
            match segment {
                Segment::Literal(lit) => {
                    if lit != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    captures.push((
                        name.clone(),
                        weft_core::percent_decode(part).into_owned(),
                    ));
                }
            }
        }
        Some(captures)
    }

    /// The sort key that orders literal segments before captures.
    ///
    /// `~` sorts after every character legal in a literal segment, so a
    /// stable sort on this key puts more specific patterns first.
    #[must_use]
    pub fn sort_key(&self) -> String {
        let mut key = String::with_capacity(self.template.len());
        for segment in &self.segments {
            key.push('/');
            match segment {
                Segment::Literal(lit) => key.push_str(lit),
                Segment::Param(name) => {
                    key.push('~');
                    key.push_str(name);
                }
            }
        }
        if key.is_empty() {
            key.push('/');
        }
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_literals_and_params() {
        let p = PathPattern::compile("/users/:id/posts").unwrap();
        assert_eq!(
            p.segments(),
            &[
                Segment::Literal("users".into()),
                Segment::Param("id".into()),
                Segment::Literal("posts".into()),
            ]
        );
        assert_eq!(p.param_names().collect::<Vec<_>>(), vec!["id"]);
    }

    #[test]
    fn root_template_is_empty_segments() {
        let p = PathPattern::compile("/").unwrap();
        assert!(p.segments().is_empty());
        assert_eq!(p.match_path("/"), Some(vec![]));
        assert_eq!(p.match_path("/x"), None);
    }

    #[test]
    fn rejects_malformed_templates() {
        assert!(matches!(
            PathPattern::compile("users"),
            Err(PatternError::MissingLeadingSlash { .. })
        ));
        assert!(matches!(
            PathPattern::compile("/a//b"),
            Err(PatternError::EmptySegment { .. })
        ));
        assert!(matches!(
            PathPattern::compile("/a/:"),
            Err(PatternError::EmptyParamName { .. })
        ));
        assert!(matches!(
            PathPattern::compile("/:id/:id"),
            Err(PatternError::DuplicateParam { .. })
        ));
    }

    #[test]
    fn matches_and_captures() {
        let p = PathPattern::compile("/users/:id").unwrap();
        assert_eq!(
            p.match_path("/users/42"),
            Some(vec![("id".into(), "42".into())])
        );
        assert_eq!(p.match_path("/users"), None);
        assert_eq!(p.match_path("/users/42/posts"), None);
        assert_eq!(p.match_path("/teams/42"), None);
    }

    #[test]
    fn captures_are_percent_decoded() {
        let p = PathPattern::compile("/files/:name").unwrap();
        assert_eq!(
            p.match_path("/files/a%20b"),
            Some(vec![("name".into(), "a b".into())])
        );
    }

    #[test]
    fn empty_segment_never_matches_a_capture() {
        let p = PathPattern::compile("/users/:id/posts").unwrap();
        assert_eq!(p.match_path("/users//posts"), None);
    }

    #[test]
    fn sort_key_puts_literals_before_captures() {
        let literal = PathPattern::compile("/users/me").unwrap();
        let capture = PathPattern::compile("/users/:id").unwrap();
        assert!(literal.sort_key() < capture.sort_key());
    }
}
