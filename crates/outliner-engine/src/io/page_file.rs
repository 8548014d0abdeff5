//! On-disk page format.
//!
//! ```text
//! # Page title
//! tags:: project
//!
//! - first block
//!   continuation line
//!   - child block
//! - id:: 6523a1f0-...
//! ```
//!
//! An optional `# ` title and `key:: value` page properties come before the
//! first block. Every block starts with `- `, indented two spaces per level
//! (a tab counts as one level). Further lines of a block sit two spaces
//! deeper than its dash; anything past that indent is content. A
//! continuation line that would read as a bullet is written with a leading
//! `\`.
//!
//! A block whose content has an `id:: ` line keeps that id. Other blocks get
//! an id derived from the page and their position, so an unchanged file
//! yields the same ids every time it is read.

use std::collections::{BTreeMap, HashSet};

use crate::models::{Block, BlockId, PageId};

/// Contents of one page file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageFile {
    pub title: Option<String>,
    pub properties: BTreeMap<String, String>,
    pub blocks: Vec<Block>,
}

const INDENT: &str = "  ";
const BULLET: &str = "-";
const ESCAPE: char = '\\';

pub fn parse_page_file(page: &PageId, text: &str) -> PageFile {
    let mut file = PageFile::default();
    let mut ids = HashSet::new();
    // Blocks whose children may still follow, innermost last.
    let mut open: Vec<OpenBlock> = Vec::new();
    // Empty lines seen since the last content line; they belong to the open
    // block only if more of its lines follow.
    let mut blank_run = 0;

    for raw in text.lines() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let (width, line) = split_indent(raw);

        if let Some(content) = bullet_content(line) {
            blank_run = 0;
            let level = width / INDENT.len();
            while open.last().is_some_and(|top| top.level >= level) {
                close_top(page, &mut open, &mut file.blocks, &mut ids);
            }
            let position = match open.last() {
                Some(parent) => {
                    let mut position = parent.position.clone();
                    position.push(parent.children.len());
                    position
                }
                None => vec![file.blocks.len()],
            };
            open.push(OpenBlock {
                level,
                position,
                lines: vec![content.to_string()],
                children: Vec::new(),
            });
            continue;
        }

        let Some(top) = open.last_mut() else {
            if !line.is_empty() {
                parse_preamble_line(line, &mut file);
            }
            continue;
        };
        let body_width = top.body_width();
        if line.is_empty() && width < body_width {
            blank_run += 1;
            continue;
        }
        top.lines
            .extend(std::iter::repeat_n(String::new(), blank_run));
        blank_run = 0;
        top.lines.push(continuation_line(raw, body_width));
    }
    while !open.is_empty() {
        close_top(page, &mut open, &mut file.blocks, &mut ids);
    }

    file
}

pub fn render_page_file(
    title: Option<&str>,
    properties: &BTreeMap<String, String>,
    blocks: &[Block],
) -> String {
    let mut out = String::new();
    if let Some(title) = title {
        out.push_str(&format!("# {title}\n"));
    }
    for (key, value) in properties {
        out.push_str(&format!("{key}:: {value}\n"));
    }
    if !out.is_empty() && !blocks.is_empty() {
        out.push('\n');
    }
    for block in blocks {
        render_block(block, 0, &mut out);
    }
    out
}

fn render_block(block: &Block, level: usize, out: &mut String) {
    let indent = INDENT.repeat(level);
    let mut lines = block.content().split('\n');
    match lines.next() {
        Some(first) if !first.is_empty() => out.push_str(&format!("{indent}{BULLET} {first}\n")),
        _ => out.push_str(&format!("{indent}{BULLET}\n")),
    }
    for line in lines {
        let line = escape_line(line);
        out.push_str(&format!("{indent}{INDENT}{line}\n"));
    }
    for child in block.children() {
        render_block(child, level + 1, out);
    }
}

/// Width of the leading whitespace and the rest of the line.
fn split_indent(raw: &str) -> (usize, &str) {
    let mut width = 0;
    for c in raw.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width += INDENT.len(),
            _ => break,
        }
    }
    (width, raw.trim_start_matches([' ', '\t']))
}

fn bullet_content(line: &str) -> Option<&str> {
    if line == BULLET {
        return Some("");
    }
    line.strip_prefix(BULLET)?.strip_prefix(' ')
}

/// A bullet behind any number of escapes, e.g. `- x` or `\- x`.
fn is_escaped_bullet(line: &str) -> bool {
    bullet_content(line.trim_start_matches(ESCAPE)).is_some()
}

fn escape_line(line: &str) -> String {
    let text = line.trim_start_matches([' ', '\t']);
    if !is_escaped_bullet(text) {
        return line.to_string();
    }
    let at = line.len() - text.len();
    format!("{}{ESCAPE}{text}", &line[..at])
}

/// A continuation line with `body_width` columns of indent removed and any
/// bullet escape undone.
fn continuation_line(raw: &str, body_width: usize) -> String {
    let mut column = 0;
    let mut cut = 0;
    for (i, c) in raw.char_indices() {
        if column >= body_width {
            break;
        }
        match c {
            ' ' => column += 1,
            '\t' => column += INDENT.len(),
            _ => break,
        }
        cut = i + c.len_utf8();
    }
    let line = &raw[cut..];

    let text = line.trim_start_matches([' ', '\t']);
    match text.strip_prefix(ESCAPE) {
        Some(unescaped) if is_escaped_bullet(text) => {
            format!("{}{unescaped}", &line[..line.len() - text.len()])
        }
        _ => line.to_string(),
    }
}

fn parse_preamble_line(line: &str, file: &mut PageFile) {
    if let Some(title) = line.strip_prefix("# ") {
        if file.title.is_none() {
            file.title = Some(title.trim().to_string());
        }
    } else if let Some((key, value)) = line.split_once(":: ")
        && is_property_key(key)
    {
        file.properties
            .insert(key.to_string(), value.trim().to_string());
    }
}

fn is_property_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// The id from an `id:: ` line unless it is already taken on this page,
/// otherwise one derived from the block's position.
fn block_id(
    page: &PageId,
    position: &[usize],
    content: &str,
    seen: &mut HashSet<BlockId>,
) -> BlockId {
    let explicit = content
        .lines()
        .find_map(|line| line.trim().strip_prefix("id:: "))
        .map(|id| BlockId::new(id.trim()))
        .filter(|id| !id.as_str().is_empty() && !seen.contains(id));
    let derived = || Some(BlockId::derived(page.as_str(), position)).filter(|id| !seen.contains(id));
    let id = explicit.or_else(derived).unwrap_or_else(BlockId::generate);
    seen.insert(id.clone());
    id
}

struct OpenBlock {
    level: usize,
    /// Sibling indices from the page root.
    position: Vec<usize>,
    lines: Vec<String>,
    children: Vec<Block>,
}

impl OpenBlock {
    /// Columns of indent before a continuation line's content.
    fn body_width(&self) -> usize {
        (self.level + 1) * INDENT.len()
    }
}

fn close_top(
    page: &PageId,
    open: &mut Vec<OpenBlock>,
    roots: &mut Vec<Block>,
    ids: &mut HashSet<BlockId>,
) {
    let Some(top) = open.pop() else {
        return;
    };
    let content = top.lines.join("\n");
    let id = block_id(page, &top.position, &content, ids);
    let block = Block::new(id, content).with_children(top.children);
    match open.last_mut() {
        Some(parent) => parent.children.push(block),
        None => roots.push(block),
    }
}
