//! Rendering of offset-based style annotations into HTML markup.
//!
//! Annotation offsets count UTF-16 code units, so the walk keeps a running
//! UTF-16 position alongside the UTF-8 characters it emits.

use html_escape::{encode_double_quoted_attribute, encode_text};
use tracing::debug;

use crate::domain::{Annotation, AnnotationKind};

struct OpenTag {
    closer: &'static str,
    end: usize,
}

/// Render `text` with `annotations` applied as nested HTML tags.
///
/// Annotations are ordered by start (longer first on ties) before the walk.
/// Tags close when the position reaches their end; anything still open at the
/// end of the text is closed there, so the output is always well nested.
pub fn render(text: &str, annotations: &[Annotation]) -> String {
    let units: Vec<u16> = text.encode_utf16().collect();

    let mut ordered: Vec<&Annotation> = annotations.iter().filter(|a| a.length > 0).collect();
    ordered.sort_by(|a, b| a.offset.cmp(&b.offset).then(b.end().cmp(&a.end())));
    let mut pending = ordered.into_iter().peekable();

    let mut out = String::with_capacity(text.len());
    let mut stack: Vec<OpenTag> = Vec::new();
    let mut position = 0;
    let mut buf = [0u8; 4];

    for ch in text.chars() {
        while let Some(top) = stack.last() {
            if top.end > position {
                break;
            }
            out.push_str(top.closer);
            stack.pop();
        }

        while let Some(annotation) = pending.next_if(|a| a.offset <= position) {
            if let Some(closer) = open_tag(annotation, &units, &mut out) {
                stack.push(OpenTag {
                    closer,
                    end: annotation.end(),
                });
            }
        }

        out.push_str(&encode_text(&*ch.encode_utf8(&mut buf)));
        position += ch.len_utf16();
    }

    while let Some(top) = stack.pop() {
        out.push_str(top.closer);
    }

    out
}

/// Write the opening markup and return the matching closer.
fn open_tag(annotation: &Annotation, units: &[u16], out: &mut String) -> Option<&'static str> {
    match &annotation.kind {
        AnnotationKind::Bold => {
            out.push_str("<strong>");
            Some("</strong>")
        }
        AnnotationKind::Italic => {
            out.push_str("<em>");
            Some("</em>")
        }
        AnnotationKind::Strike => {
            out.push_str("<s>");
            Some("</s>")
        }
        AnnotationKind::TextUrl { url } => {
            push_anchor(out, url);
            Some("</a>")
        }
        AnnotationKind::Url => {
            let url = spanned_text(units, annotation);
            push_anchor(out, &url);
            Some("</a>")
        }
        AnnotationKind::Unsupported => {
            debug!(
                "skipping unsupported annotation at {}+{}",
                annotation.offset, annotation.length
            );
            None
        }
    }
}

fn push_anchor(out: &mut String, url: &str) {
    out.push_str("<a href=\"");
    out.push_str(&encode_double_quoted_attribute(url));
    out.push_str("\" target=\"_blank\">");
}

/// The literal text an annotation covers, clamped to the text bounds.
fn spanned_text(units: &[u16], annotation: &Annotation) -> String {
    let start = annotation.offset.min(units.len());
    let end = annotation.end().clamp(start, units.len());
    String::from_utf16_lossy(&units[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold(offset: usize, length: usize) -> Annotation {
        Annotation::new(offset, length, AnnotationKind::Bold)
    }

    fn italic(offset: usize, length: usize) -> Annotation {
        Annotation::new(offset, length, AnnotationKind::Italic)
    }

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(render("hello world", &[]), "hello world");
    }

    #[test]
    fn test_basic_kinds() {
        let annotations = vec![
            bold(0, 4),
            italic(5, 4),
            Annotation::new(10, 6, AnnotationKind::Strike),
        ];
        assert_eq!(
            render("bold ital struck", &annotations),
            "<strong>bold</strong> <em>ital</em> <s>struck</s>"
        );
    }

    #[test]
    fn test_text_url() {
        let annotations = vec![Annotation::new(
            4,
            4,
            AnnotationKind::TextUrl {
                url: "https://example.com/?a=1&b=2".into(),
            },
        )];
        assert_eq!(
            render("see here", &annotations),
            "see <a href=\"https://example.com/?a=1&amp;b=2\" target=\"_blank\">here</a>"
        );
    }

    #[test]
    fn test_inferred_url_after_surrogate_pair() {
        // The emoji takes two UTF-16 units, so the URL starts at unit 3.
        let text = "😀 https://t.me/x done";
        let annotations = vec![Annotation::new(3, 14, AnnotationKind::Url)];
        assert_eq!(
            render(text, &annotations),
            "😀 <a href=\"https://t.me/x\" target=\"_blank\">https://t.me/x</a> done"
        );
    }

    #[test]
    fn test_offsets_are_utf16_not_bytes() {
        let text = "Привет мир";
        assert_eq!(render(text, &[italic(7, 3)]), "Привет <em>мир</em>");
    }

    #[test]
    fn test_nested_tags_close_lifo() {
        let annotations = vec![bold(0, 11), italic(6, 5)];
        assert_eq!(
            render("outer inner", &annotations),
            "<strong>outer <em>inner</em></strong>"
        );
    }

    #[test]
    fn test_same_start_longer_opens_first() {
        let annotations = vec![italic(0, 3), bold(0, 7)];
        assert_eq!(
            render("abc def", &annotations),
            "<strong><em>abc</em> def</strong>"
        );
    }

    #[test]
    fn test_out_of_order_input_is_sorted() {
        let annotations = vec![italic(4, 3), bold(0, 3)];
        assert_eq!(
            render("abc def", &annotations),
            "<strong>abc</strong> <em>def</em>"
        );
    }

    #[test]
    fn test_truncated_annotation_closed_at_end() {
        let annotations = vec![bold(2, 50)];
        assert_eq!(render("abcd", &annotations), "ab<strong>cd</strong>");
    }

    #[test]
    fn test_unsupported_and_empty_are_skipped() {
        let annotations = vec![
            Annotation::new(0, 3, AnnotationKind::Unsupported),
            bold(4, 0),
        ];
        assert_eq!(render("abc def", &annotations), "abc def");
    }

    #[test]
    fn test_malformed_lengths_do_not_panic() {
        let url = vec![Annotation::new(2, usize::MAX, AnnotationKind::Url)];
        assert_eq!(
            render("ab https://x", &url),
            "ab<a href=\" https://x\" target=\"_blank\"> https://x</a>"
        );

        let past_end = vec![Annotation::new(40, 3, AnnotationKind::Url)];
        assert_eq!(render("short", &past_end), "short");

        assert_eq!(
            render("abc", &[bold(1, usize::MAX)]),
            "a<strong>bc</strong>"
        );
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(render("a < b & c", &[bold(0, 1)]), "<strong>a</strong> &lt; b &amp; c");
    }

    #[test]
    fn test_output_is_well_nested() {
        let text = "one two three four five six";
        let annotations = vec![
            bold(0, 13),
            italic(4, 3),
            Annotation::new(14, 4, AnnotationKind::Strike),
            Annotation::new(19, 8, AnnotationKind::Url),
            italic(24, 3),
        ];
        let html = render(text, &annotations);

        let mut stack = Vec::new();
        let mut rest = html.as_str();
        while let Some(start) = rest.find('<') {
            let end = rest[start..].find('>').unwrap() + start;
            let tag = &rest[start + 1..end];
            if let Some(name) = tag.strip_prefix('/') {
                assert_eq!(stack.pop(), Some(name.to_string()), "in {}", html);
            } else {
                stack.push(tag.split_whitespace().next().unwrap().to_string());
            }
            rest = &rest[end + 1..];
        }
        assert!(stack.is_empty(), "unclosed tags in {}", html);
    }
}
