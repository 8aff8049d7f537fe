//! Duck-typed markup matching
//!
//! The widget markup is rendered by a third party and changes between
//! versions and locales. A [`Matcher`] describes one accepted shape; a
//! [`Signatures`] list holds the alternatives in priority order. Adding a new
//! markup variant means appending a signature, nothing else.

use std::fmt::Write as _;

use lightbox_types::SignatureSpec;

use crate::dom::Dom;

/// One markup signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    Tag(String),
    Class(String),
    Attr {
        tag: String,
        name: String,
        value: String,
    },
    /// `target` with an `ancestor` match somewhere above it
    Within {
        ancestor: Box<Matcher>,
        target: Box<Matcher>,
    },
}

impl Matcher {
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Tag(tag.into())
    }

    pub fn class(class: impl Into<String>) -> Self {
        Self::Class(class.into())
    }

    /// Render as an equivalent CSS selector for `querySelector`.
    pub fn to_css(&self) -> String {
        match self {
            Self::Tag(tag) => tag.clone(),
            Self::Class(class) => format!(".{class}"),
            Self::Attr { tag, name, value } => {
                let mut css = format!("{tag}[{name}=\"");
                for c in value.chars() {
                    if c == '"' || c == '\\' {
                        css.push('\\');
                    }
                    css.push(c);
                }
                css.push_str("\"]");
                css
            }
            Self::Within { ancestor, target } => {
                let mut css = ancestor.to_css();
                let _ = write!(css, " {}", target.to_css());
                css
            }
        }
    }
}

impl From<&SignatureSpec> for Matcher {
    fn from(spec: &SignatureSpec) -> Self {
        match spec {
            SignatureSpec::Within { within, target } => Self::Within {
                ancestor: Box::new(within.as_ref().into()),
                target: Box::new(target.as_ref().into()),
            },
            SignatureSpec::Attr { tag, attr, value } => Self::Attr {
                tag: tag.clone(),
                name: attr.clone(),
                value: value.clone(),
            },
            SignatureSpec::Class { class } => Self::Class(class.clone()),
            SignatureSpec::Tag { tag } => Self::Tag(tag.clone()),
        }
    }
}

/// Ordered list of accepted signatures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signatures(Vec<Matcher>);

impl Signatures {
    pub fn new(matchers: Vec<Matcher>) -> Self {
        Self(matchers)
    }

    pub fn from_specs(specs: &[SignatureSpec]) -> Self {
        Self(specs.iter().map(Matcher::from).collect())
    }

    pub fn matchers(&self) -> &[Matcher] {
        &self.0
    }

    /// First signature (in list order) with any match below `root` wins.
    pub fn first_match<D: Dom>(&self, dom: &D, root: &D::Node) -> Option<D::Node> {
        self.0.iter().find_map(|matcher| dom.query(root, matcher))
    }

    /// Every match below `root`, grouped by signature, without duplicates.
    pub fn all_matches<D: Dom>(&self, dom: &D, root: &D::Node) -> Vec<D::Node> {
        let mut found: Vec<D::Node> = Vec::new();
        for matcher in &self.0 {
            for node in dom.query_all(root, matcher) {
                if !found.contains(&node) {
                    found.push(node);
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;

    #[test]
    fn test_to_css() {
        assert_eq!(Matcher::tag("img").to_css(), "img");
        assert_eq!(Matcher::class("gr-image__tool").to_css(), ".gr-image__tool");
        assert_eq!(
            Matcher::Within {
                ancestor: Box::new(Matcher::class("image-frame")),
                target: Box::new(Matcher::tag("img")),
            }
            .to_css(),
            ".image-frame img"
        );
    }

    #[test]
    fn test_to_css_escapes_attribute_value() {
        let matcher = Matcher::Attr {
            tag: "button".to_string(),
            name: "title".to_string(),
            value: r#"say "hi" \o/"#.to_string(),
        };
        assert_eq!(matcher.to_css(), r#"button[title="say \"hi\" \\o/"]"#);
    }

    #[test]
    fn test_from_spec() {
        let spec = SignatureSpec::within(SignatureSpec::class("frame"), SignatureSpec::tag("img"));
        assert_eq!(Matcher::from(&spec).to_css(), ".frame img");
    }

    #[test]
    fn test_first_match_prefers_signature_order() {
        let dom = MemoryDom::new();
        let body = dom.body_id();
        let plain = dom.build(body, "img", &[("src", "icon.svg")]);
        let frame = dom.build(body, "div", &[("class", "image-frame")]);
        let photo = dom.build(frame, "img", &[("src", "photo.png")]);

        let sigs = Signatures::new(vec![
            Matcher::Within {
                ancestor: Box::new(Matcher::class("image-frame")),
                target: Box::new(Matcher::tag("img")),
            },
            Matcher::tag("img"),
        ]);

        assert_eq!(sigs.first_match(&dom, &body), Some(photo));
        assert_ne!(sigs.first_match(&dom, &body), Some(plain));
    }

    #[test]
    fn test_all_matches_dedups() {
        let dom = MemoryDom::new();
        let body = dom.body_id();
        let both = dom.build(body, "div", &[("class", "icon-button-wrapper gr-image__tool")]);
        let legacy = dom.build(body, "div", &[("class", "gr-image__tool")]);

        let sigs = Signatures::new(vec![
            Matcher::class("icon-button-wrapper"),
            Matcher::class("gr-image__tool"),
        ]);

        assert_eq!(sigs.all_matches(&dom, &body), vec![both, legacy]);
    }
}
