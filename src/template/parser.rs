//! Scanning of raw template text for `{{ .Values.x.y }}`-style references.
//!
//! The parser is stateless and re-scans the full text on every call.

use compact_str::CompactString;
use once_cell::sync::Lazy;
use regex::Regex;

/// Well-known root objects a reference can be anchored at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateObject {
    Values,
    Chart,
    Release,
    Other,
}

/// A dotted reference found inside a template expression.
///
/// `start`/`end` are byte offsets into the scanned text covering the full
/// dotted path including the leading dot; a cursor is considered on the
/// reference when `start <= offset <= end` (both ends inclusive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateReference {
    pub object: TemplateObject,
    pub path: Vec<CompactString>,
    pub start: usize,
    pub end: usize,
}

impl TemplateReference {
    pub fn contains_offset(&self, offset: usize) -> bool {
        offset >= self.start && offset <= self.end
    }

    pub fn last_segment(&self) -> Option<&str> {
        self.path.last().map(|s| s.as_str())
    }
}

// Template expressions, including `{{-`/`-}}` trim markers, possibly
// spanning multiple lines.
static EXPRESSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{\{.*?\}\}").unwrap());

// A dotted chain rooted at an object name. Segments stop at anything that
// is not `[A-Za-z0-9_-]`, so bracket/index notation is never consumed.
static REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.([A-Za-z][A-Za-z0-9_]*)((?:\.[A-Za-z0-9_][A-Za-z0-9_-]*)*)").unwrap()
});

fn object_for(root: &str) -> TemplateObject {
    match root {
        "Values" => TemplateObject::Values,
        "Chart" => TemplateObject::Chart,
        "Release" => TemplateObject::Release,
        _ => TemplateObject::Other,
    }
}

/// Scans `text` for template expressions and extracts every dotted
/// reference inside them, in document order.
pub fn parse_template_references(text: &str) -> Vec<TemplateReference> {
    let mut references = Vec::new();

    for block in EXPRESSION.find_iter(text) {
        let body = block.as_str();
        for m in REFERENCE.captures_iter(body) {
            let whole = m.get(0).expect("capture 0 always present");
            let start = block.start() + whole.start();

            // A dot preceded by an identifier character is a continuation
            // of something else, not a rooted reference.
            if let Some(prev) = text[..start].bytes().last() {
                if prev.is_ascii_alphanumeric() || prev == b'_' {
                    continue;
                }
            }

            let root = m.get(1).expect("root group").as_str();
            let rest = m.get(2).map(|g| g.as_str()).unwrap_or("");
            let path: Vec<CompactString> = rest
                .split('.')
                .filter(|s| !s.is_empty())
                .map(CompactString::from)
                .collect();

            references.push(TemplateReference {
                object: object_for(root),
                path,
                start,
                end: block.start() + whole.end(),
            });
        }
    }

    references
}

/// Returns the reference whose span covers `offset`, if any.
pub fn reference_at_offset(
    references: &[TemplateReference],
    offset: usize,
) -> Option<&TemplateReference> {
    references.iter().find(|r| r.contains_offset(offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_values_reference() {
        let text = "image: {{ .Values.image.repository }}";
        let refs = parse_template_references(text);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].object, TemplateObject::Values);
        assert_eq!(refs[0].path, vec!["image", "repository"]);
        assert_eq!(&text[refs[0].start..refs[0].end], ".Values.image.repository");
    }

    #[test]
    fn parses_chart_and_release_roots() {
        let text = "{{ .Chart.Name }}-{{ .Release.Namespace }}";
        let refs = parse_template_references(text);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].object, TemplateObject::Chart);
        assert_eq!(refs[0].path, vec!["Name"]);
        assert_eq!(refs[1].object, TemplateObject::Release);
    }

    #[test]
    fn unknown_roots_are_other() {
        let refs = parse_template_references("{{ .Capabilities.KubeVersion }}");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].object, TemplateObject::Other);
    }

    #[test]
    fn ignores_text_outside_expressions() {
        let refs = parse_template_references("plain: .Values.not.a.reference");
        assert!(refs.is_empty());
    }

    #[test]
    fn multiline_expression() {
        let text = "{{- if\n  .Values.ingress.enabled\n-}}";
        let refs = parse_template_references(text);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].path, vec!["ingress", "enabled"]);
    }

    #[test]
    fn several_references_in_one_expression() {
        let text = "{{ default .Values.fallback .Values.primary }}";
        let refs = parse_template_references(text);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].path, vec!["fallback"]);
        assert_eq!(refs[1].path, vec!["primary"]);
    }

    #[test]
    fn bracket_notation_stops_the_path() {
        let text = "{{ .Values.servers[0].port }}";
        let refs = parse_template_references(text);
        assert_eq!(refs[0].path, vec!["servers"]);
    }

    #[test]
    fn dollar_rooted_reference() {
        let text = "{{ $.Values.image.tag }}";
        let refs = parse_template_references(text);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].object, TemplateObject::Values);
        assert_eq!(refs[0].path, vec!["image", "tag"]);
    }

    #[test]
    fn cursor_span_is_inclusive() {
        let text = "{{ .Values.a }}";
        let refs = parse_template_references(text);
        let r = &refs[0];
        assert!(reference_at_offset(&refs, r.start).is_some());
        assert!(reference_at_offset(&refs, r.end).is_some());
        assert!(reference_at_offset(&refs, r.end + 1).is_none());
        assert!(reference_at_offset(&refs, r.start.saturating_sub(1)).is_none());
    }

    #[test]
    fn bare_values_root_has_empty_path() {
        let text = "{{ toYaml .Values }}";
        let refs = parse_template_references(text);
        assert_eq!(refs.len(), 1);
        assert!(refs[0].path.is_empty());
    }
}
