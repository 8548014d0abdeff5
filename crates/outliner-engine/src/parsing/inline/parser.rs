use super::{
    cursor::Cursor,
    kinds::{BlockRef, Emphasis, Image, Macro, MarkdownLink, Property, Tag, WikiLink, is_pdf_target},
    types::{ImageKind, LinkKind, Segment, SegmentKind},
};

/// A production tries to recognise one construct at the cursor.
///
/// On success the cursor sits just past the construct. On failure the cursor
/// may have moved; [`try_parse_construct`] restores it.
type Production = fn(&mut Cursor<'_>) -> Option<Segment>;

/// Productions in precedence order. When two constructs could start at the
/// same byte, the earlier entry wins.
const PRODUCTIONS: &[Production] = &[
    try_parse_macro,
    try_parse_block_ref,
    try_parse_strikethrough,
    try_parse_highlight,
    try_parse_tag,
    try_parse_block_id,
    try_parse_property,
    try_parse_bold,
    try_parse_italic,
    try_parse_labelled_link,
    try_parse_wikilink,
    try_parse_image,
];

/// Parses block content into an ordered, gap-free list of [`Segment`]s.
///
/// Scans left to right; the construct starting earliest wins. Text between
/// constructs, including unclosed or malformed markup, is emitted as
/// `SegmentKind::Text`. The parser is total: every input yields segments,
/// and an empty input yields none.
pub fn parse_inline(s: &str) -> Vec<Segment> {
    let mut cur = Cursor::new(s);
    let mut out = vec![];
    let mut text_start = cur.pos();

    fn flush_text(out: &mut Vec<Segment>, text: &str) {
        if !text.is_empty() {
            out.push(Segment::text(text));
        }
    }

    while !cur.eof() {
        let start = cur.pos();
        if let Some(segment) = try_parse_construct(&mut cur) {
            flush_text(&mut out, cur.slice(text_start, start));
            out.push(segment);
            text_start = cur.pos();
            continue;
        }
        cur.bump();
    }

    flush_text(&mut out, &s[text_start..]);
    out
}

fn try_parse_construct(cur: &mut Cursor<'_>) -> Option<Segment> {
    PRODUCTIONS.iter().find_map(|parse| {
        let saved = cur.clone();
        let parsed = parse(cur);
        if parsed.is_none() {
            *cur = saved;
        }
        parsed
    })
}

/// `{{query …}}` or `{{embed …}}`, kept verbatim.
fn try_parse_macro(cur: &mut Cursor<'_>) -> Option<Segment> {
    let kind = if cur.starts_with(Macro::QUERY) {
        SegmentKind::Query
    } else if cur.starts_with(Macro::EMBED) {
        SegmentKind::Embed
    } else {
        return None;
    };

    let start = cur.pos();
    cur.bump_n(Macro::QUERY.len());
    if !cur.seek(Macro::CLOSE, true) {
        return None;
    }
    cur.bump_n(Macro::CLOSE.len());
    Some(Segment::styled(kind, cur.slice(start, cur.pos())))
}

fn try_parse_block_ref(cur: &mut Cursor<'_>) -> Option<Segment> {
    if !cur.starts_with(BlockRef::OPEN) {
        return None;
    }
    cur.bump_n(BlockRef::OPEN.len());
    let id_start = cur.pos();
    if cur.eat_while(BlockRef::is_id_byte) == 0 || !cur.starts_with(BlockRef::CLOSE) {
        return None;
    }
    let id = cur.slice(id_start, cur.pos());
    cur.bump_n(BlockRef::CLOSE.len());
    Some(Segment::targeted(SegmentKind::BlockRef, id, id))
}

/// Symmetric single-line delimiters such as `~~x~~`. The inner text may be empty.
fn parse_delimited(cur: &mut Cursor<'_>, delim: &[u8], kind: SegmentKind) -> Option<Segment> {
    if !cur.starts_with(delim) {
        return None;
    }
    cur.bump_n(delim.len());
    let inner_start = cur.pos();
    if !cur.seek(delim, true) {
        return None;
    }
    let inner = cur.slice(inner_start, cur.pos());
    cur.bump_n(delim.len());
    Some(Segment::styled(kind, inner))
}

fn try_parse_strikethrough(cur: &mut Cursor<'_>) -> Option<Segment> {
    parse_delimited(cur, Emphasis::STRIKE, SegmentKind::Strikethrough)
}

fn try_parse_highlight(cur: &mut Cursor<'_>) -> Option<Segment> {
    if cur.starts_with(Emphasis::HIGHLIGHT) {
        parse_delimited(cur, Emphasis::HIGHLIGHT, SegmentKind::Highlight)
    } else {
        parse_delimited(cur, Emphasis::HIGHLIGHT_ALT, SegmentKind::Highlight)
    }
}

fn try_parse_tag(cur: &mut Cursor<'_>) -> Option<Segment> {
    if cur.peek() != Some(Tag::HASH) {
        return None;
    }
    cur.bump();
    let name_start = cur.pos();
    if cur.eat_while(Tag::is_name_byte) == 0 {
        return None;
    }
    let name = cur.slice(name_start, cur.pos());
    Some(Segment::targeted(SegmentKind::Tag, name, name))
}

/// `id:: 6530f0a8-…` pins a block's id. Must not continue a longer word.
fn try_parse_block_id(cur: &mut Cursor<'_>) -> Option<Segment> {
    if !cur.starts_with(Property::ID_KEY) || cur.prev().is_some_and(is_word_byte) {
        return None;
    }
    let start = cur.pos();
    cur.bump_n(Property::ID_KEY.len());
    cur.eat_while(|b| b.is_ascii_whitespace());
    let id_start = cur.pos();
    if cur.eat_while(BlockRef::is_id_byte) == 0 {
        return None;
    }
    let id = cur.slice(id_start, cur.pos());
    Some(Segment::targeted(
        SegmentKind::BlockId,
        cur.slice(start, cur.pos()),
        id,
    ))
}

/// `key:: value` running to the end of the line. The value must be non-empty.
fn try_parse_property(cur: &mut Cursor<'_>) -> Option<Segment> {
    if !cur.peek().is_some_and(Property::is_key_start) {
        return None;
    }
    let start = cur.pos();
    cur.eat_while(Property::is_key_byte);
    if !cur.starts_with(Property::SEPARATOR) {
        return None;
    }
    cur.bump_n(Property::SEPARATOR.len());
    cur.eat_while(|b| b == b' ' || b == b'\t');
    if cur.eat_while(|b| b != b'\n') == 0 {
        return None;
    }
    Some(Segment::styled(
        SegmentKind::Property,
        cur.slice(start, cur.pos()),
    ))
}

fn try_parse_bold(cur: &mut Cursor<'_>) -> Option<Segment> {
    parse_delimited(cur, Emphasis::BOLD, SegmentKind::Bold)
}

/// `*x*` with at least one character between the stars; may span lines.
fn try_parse_italic(cur: &mut Cursor<'_>) -> Option<Segment> {
    if cur.peek() != Some(Emphasis::ITALIC) {
        return None;
    }
    cur.bump();
    let inner_start = cur.pos();
    if cur.eat_while(|b| b != Emphasis::ITALIC) == 0 || cur.peek() != Some(Emphasis::ITALIC) {
        return None;
    }
    let inner = cur.slice(inner_start, cur.pos());
    cur.bump();
    Some(Segment::styled(SegmentKind::Italic, inner))
}

/// `[label]([[Page]])` or `[label](url)`.
fn try_parse_labelled_link(cur: &mut Cursor<'_>) -> Option<Segment> {
    if cur.peek() != Some(MarkdownLink::LABEL_OPEN) {
        return None;
    }
    cur.bump();
    let label_start = cur.pos();
    if cur.eat_while(|b| b != MarkdownLink::LABEL_CLOSE) == 0 {
        return None;
    }
    let label = cur.slice(label_start, cur.pos());
    if !cur.starts_with(MarkdownLink::TARGET_OPEN) {
        return None;
    }
    cur.bump_n(MarkdownLink::TARGET_OPEN.len());

    let target_start = cur.pos();
    let saved = cur.clone();
    if let Some(page) = parse_bracketed_page(cur) {
        let kind = if is_pdf_target(page) {
            LinkKind::Pdf
        } else {
            LinkKind::Page
        };
        return Some(Segment::targeted(SegmentKind::Link(kind), label, page));
    }
    *cur = saved;

    if cur.eat_while(|b| b != MarkdownLink::TARGET_CLOSE) == 0
        || cur.peek() != Some(MarkdownLink::TARGET_CLOSE)
    {
        return None;
    }
    let url = cur.slice(target_start, cur.pos());
    cur.bump();
    let kind = if is_pdf_target(url) {
        LinkKind::Pdf
    } else {
        LinkKind::Url
    };
    Some(Segment::targeted(SegmentKind::Link(kind), label, url))
}

/// The `[[Page]])` tail of a labelled page link.
fn parse_bracketed_page<'a>(cur: &mut Cursor<'a>) -> Option<&'a str> {
    if !cur.starts_with(WikiLink::OPEN) {
        return None;
    }
    cur.bump_n(WikiLink::OPEN.len());
    let page_start = cur.pos();
    if cur.eat_while(|b| b != b']') == 0 || !cur.starts_with(WikiLink::CLOSE) {
        return None;
    }
    let page = cur.slice(page_start, cur.pos());
    cur.bump_n(WikiLink::CLOSE.len());
    if cur.peek() != Some(MarkdownLink::TARGET_CLOSE) {
        return None;
    }
    cur.bump();
    Some(page)
}

/// `[[Name]]`; a name ending in `.pdf` links a PDF rather than a page.
fn try_parse_wikilink(cur: &mut Cursor<'_>) -> Option<Segment> {
    if !cur.starts_with(WikiLink::OPEN) {
        return None;
    }
    cur.bump_n(WikiLink::OPEN.len());
    let name_start = cur.pos();
    if !cur.seek(WikiLink::CLOSE, true) || cur.pos() == name_start {
        return None;
    }
    let name = cur.slice(name_start, cur.pos());
    cur.bump_n(WikiLink::CLOSE.len());

    let kind = if is_pdf_target(name) {
        LinkKind::Pdf
    } else {
        LinkKind::Page
    };
    Some(Segment::targeted(SegmentKind::Link(kind), name, name))
}

/// `![Alt](Target)`; a `.pdf` target is still a PDF even with image syntax.
fn try_parse_image(cur: &mut Cursor<'_>) -> Option<Segment> {
    if !cur.starts_with(Image::OPEN) {
        return None;
    }
    cur.bump_n(Image::OPEN.len());
    let alt_start = cur.pos();
    if !cur.seek(Image::TARGET_OPEN, true) {
        return None;
    }
    let alt = cur.slice(alt_start, cur.pos());
    cur.bump_n(Image::TARGET_OPEN.len());
    let target_start = cur.pos();
    if !cur.seek(Image::TARGET_CLOSE, true) {
        return None;
    }
    let target = cur.slice(target_start, cur.pos());
    cur.bump_n(Image::TARGET_CLOSE.len());

    let kind = if is_pdf_target(target) {
        ImageKind::Pdf
    } else {
        ImageKind::Plain
    };
    Some(Segment::image(kind, alt, target))
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn link(kind: LinkKind, content: &str, target: &str) -> Segment {
        Segment::targeted(SegmentKind::Link(kind), content, target)
    }

    #[test]
    fn parse_simple_text() {
        assert_eq!(parse_inline("hello world"), vec![Segment::text("hello world")]);
    }

    #[test]
    fn empty_input_has_no_segments() {
        assert!(parse_inline("").is_empty());
    }

    #[test]
    fn text_then_page_link() {
        assert_eq!(
            parse_inline("Buy milk [[Groceries]]"),
            vec![
                Segment::text("Buy milk "),
                link(LinkKind::Page, "Groceries", "Groceries"),
            ]
        );
    }

    #[test]
    fn pdf_wikilink_is_pdf_kind() {
        assert_eq!(
            parse_inline("see [[Paper.PDF]]"),
            vec![
                Segment::text("see "),
                link(LinkKind::Pdf, "Paper.PDF", "Paper.PDF"),
            ]
        );
    }

    #[test]
    fn image_with_pdf_target_is_pdf_kind() {
        assert_eq!(
            parse_inline("![Slides](../assets/deck.pdf)"),
            vec![Segment::image(ImageKind::Pdf, "Slides", "../assets/deck.pdf")]
        );
        assert_eq!(
            parse_inline("![cat](cat.png)"),
            vec![Segment::image(ImageKind::Plain, "cat", "cat.png")]
        );
    }

    #[test]
    fn image_allows_empty_alt() {
        let segments = parse_inline("![](pic.png)");
        assert_eq!(segments, vec![Segment::image(ImageKind::Plain, "", "pic.png")]);
        assert_eq!(segments[0].alt.as_deref(), Some(""));
    }

    #[test]
    fn labelled_links() {
        assert_eq!(
            parse_inline("[the docs]([[Documentation]])"),
            vec![link(LinkKind::Page, "the docs", "Documentation")]
        );
        assert_eq!(
            parse_inline("[site](https://example.com)"),
            vec![link(LinkKind::Url, "site", "https://example.com")]
        );
        assert_eq!(
            parse_inline("[paper](files/a.pdf)"),
            vec![link(LinkKind::Pdf, "paper", "files/a.pdf")]
        );
    }

    #[test]
    fn styled_spans() {
        assert_eq!(
            parse_inline("**b** *i* ~~s~~ ==h== ^^h2^^"),
            vec![
                Segment::styled(SegmentKind::Bold, "b"),
                Segment::text(" "),
                Segment::styled(SegmentKind::Italic, "i"),
                Segment::text(" "),
                Segment::styled(SegmentKind::Strikethrough, "s"),
                Segment::text(" "),
                Segment::styled(SegmentKind::Highlight, "h"),
                Segment::text(" "),
                Segment::styled(SegmentKind::Highlight, "h2"),
            ]
        );
    }

    #[test]
    fn logseq_references() {
        assert_eq!(
            parse_inline("#project ((64f3a1b2-0c1d)) {{query (todo now)}} {{embed [[Page]]}}"),
            vec![
                Segment::targeted(SegmentKind::Tag, "project", "project"),
                Segment::text(" "),
                Segment::targeted(SegmentKind::BlockRef, "64f3a1b2-0c1d", "64f3a1b2-0c1d"),
                Segment::text(" "),
                Segment::styled(SegmentKind::Query, "{{query (todo now)}}"),
                Segment::text(" "),
                Segment::styled(SegmentKind::Embed, "{{embed [[Page]]}}"),
            ]
        );
    }

    #[test]
    fn properties_and_block_ids() {
        assert_eq!(
            parse_inline("status:: active"),
            vec![Segment::styled(SegmentKind::Property, "status:: active")]
        );
        assert_eq!(
            parse_inline("id:: 6530f0a8-1b2c"),
            vec![Segment::targeted(
                SegmentKind::BlockId,
                "id:: 6530f0a8-1b2c",
                "6530f0a8-1b2c"
            )]
        );
    }

    #[test]
    fn property_runs_to_end_of_line_only() {
        assert_eq!(
            parse_inline("type:: book\nmore text"),
            vec![
                Segment::styled(SegmentKind::Property, "type:: book"),
                Segment::text("\nmore text"),
            ]
        );
    }

    #[test]
    fn earliest_match_wins_over_nested_markup() {
        assert_eq!(
            parse_inline("**see [[Page]]**"),
            vec![Segment::styled(SegmentKind::Bold, "see [[Page]]")]
        );
    }

    #[test]
    fn image_wins_over_labelled_link() {
        let segments = parse_inline("![a](b.png)");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].kind, SegmentKind::Image(ImageKind::Plain));
    }

    #[test]
    fn wikilink_does_not_span_lines() {
        assert_eq!(
            parse_inline("[[broken\nlink]]"),
            vec![Segment::text("[[broken\nlink]]")]
        );
    }

    #[test]
    fn multibyte_text_around_links() {
        assert_eq!(
            parse_inline("日本 [[ページ]] ✓"),
            vec![
                Segment::text("日本 "),
                link(LinkKind::Page, "ページ", "ページ"),
                Segment::text(" ✓"),
            ]
        );
    }

    #[rstest]
    #[case("[[unclosed link")]
    #[case("[[]]")]
    #[case("**unclosed bold")]
    #[case("*open")]
    #[case("5 * 3 = 15")]
    #[case("![alt](no close")]
    #[case("{{query unclosed")]
    #[case("(())")]
    #[case("# heading-ish")]
    #[case("key::")]
    #[case("[label] (space)")]
    fn malformed_markup_degrades_to_text(#[case] input: &str) {
        assert_eq!(parse_inline(input), vec![Segment::text(input)]);
    }

    #[rstest]
    #[case("Buy milk [[Groceries]] and **eggs**")]
    #[case("TODO [#A] Call mom")]
    #[case("*a* **b** ***c*** ~~~~ ====")]
    #[case("x#tag y:: z id:: abc ((12)) ((zz))")]
    #[case("[a]([[b]) [c](d) ![e](f) [[g]]]")]
    #[case("prefix{{embed x}}suffix\nline two **x\ny**")]
    #[case("ünïcödé *ítálic* [[páge]]")]
    fn text_runs_reparse_to_themselves(#[case] input: &str) {
        for segment in parse_inline(input).into_iter().filter(Segment::is_text) {
            assert_eq!(
                parse_inline(&segment.content),
                vec![Segment::text(segment.content.clone())],
                "text run {:?} from {input:?}",
                segment.content
            );
        }
    }

    #[test]
    fn parsing_is_deterministic() {
        let input = "TODO **a** [[b]] #c ![d](e.pdf)";
        assert_eq!(parse_inline(input), parse_inline(input));
    }

    #[test]
    fn debug_snapshot_of_mixed_content() {
        insta::assert_debug_snapshot!(parse_inline("**bold** and [[Page]]"), @r#"
        [
            Segment {
                kind: Bold,
                content: "bold",
                target: None,
                alt: None,
            },
            Segment {
                kind: Text,
                content: " and ",
                target: None,
                alt: None,
            },
            Segment {
                kind: Link(
                    Page,
                ),
                content: "Page",
                target: Some(
                    "Page",
                ),
                alt: None,
            },
        ]
        "#);
    }
}
