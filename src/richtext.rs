//! Restricted rich-text markup: parse tree and styling transform.
//!
//! Cell editors only produce bold, italic, underline and strike inside
//! paragraphs. Everything else is parsed into [`Node::Unknown`] and reduced
//! to its text on output.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::config::PrintStyle;

lazy_static! {
    static ref TAG_REGEX: Regex =
        Regex::new(r"(?s)<!--.*?-->|<(/?)([A-Za-z][A-Za-z0-9]*)(?:\s[^<>]*?)?(/?)>").unwrap();
    static ref ENTITY_REGEX: Regex = Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[A-Za-z]+);").unwrap();
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    PlainText(String),
    LineBreak,
    Bold(Vec<Node>),
    Italic(Vec<Node>),
    Underline(Vec<Node>),
    Strike(Vec<Node>),
    Paragraph(Vec<Node>),
    Unknown { tag: String, children: Vec<Node> },
}

/// Output medium for the transform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// Interactive preview; keeps `<u>`, `<s>` and `<br>`.
    Display,
    /// Document/PDF pipeline; only `strong`, `p`, `i` and text survive.
    Print,
}

enum Kind {
    Bold,
    Italic,
    Underline,
    Strike,
    Paragraph,
    Other,
}

fn classify(tag: &str) -> Kind {
    match tag {
        "strong" | "b" => Kind::Bold,
        "i" | "em" => Kind::Italic,
        "u" | "ins" => Kind::Underline,
        "s" | "strike" | "del" => Kind::Strike,
        "p" => Kind::Paragraph,
        _ => Kind::Other,
    }
}

struct Frame {
    tag: String,
    children: Vec<Node>,
}

impl Frame {
    fn into_node(self) -> Node {
        let Frame { tag, children } = self;
        match classify(&tag) {
            Kind::Bold => Node::Bold(children),
            Kind::Italic => Node::Italic(children),
            Kind::Underline => Node::Underline(children),
            Kind::Strike => Node::Strike(children),
            Kind::Paragraph => Node::Paragraph(children),
            Kind::Other => Node::Unknown { tag, children },
        }
    }
}

/// Parse markup into a node tree.
///
/// Never fails: attributes are ignored, unclosed elements are closed at the
/// end of input, stray closing tags are skipped and a `<` that does not start
/// a tag is kept as text.
pub fn parse(content: &str) -> Vec<Node> {
    let mut stack: Vec<Frame> = vec![Frame {
        tag: String::new(),
        children: Vec::new(),
    }];
    let mut last = 0;

    for caps in TAG_REGEX.captures_iter(content) {
        let whole = caps.get(0).unwrap();
        push_text(&mut stack, &content[last..whole.start()]);
        last = whole.end();

        let Some(name) = caps.get(2) else {
            continue; // comment
        };
        let tag = name.as_str().to_ascii_lowercase();
        let closing = !caps[1].is_empty();
        let self_closing = !caps[3].is_empty();

        if tag == "br" {
            if !closing {
                top(&mut stack).push(Node::LineBreak);
            }
            continue;
        }

        if closing {
            // Close the nearest matching element, implicitly closing any
            // elements opened inside it.
            if let Some(pos) = stack.iter().skip(1).rposition(|f| f.tag == tag) {
                let depth = pos + 1;
                while stack.len() > depth {
                    close_top(&mut stack);
                }
            }
        } else if self_closing {
            let frame = Frame {
                tag,
                children: Vec::new(),
            };
            top(&mut stack).push(frame.into_node());
        } else {
            stack.push(Frame {
                tag,
                children: Vec::new(),
            });
        }
    }
    push_text(&mut stack, &content[last..]);

    while stack.len() > 1 {
        close_top(&mut stack);
    }
    stack.pop().map(|f| f.children).unwrap_or_default()
}

fn top(stack: &mut [Frame]) -> &mut Vec<Node> {
    // The root frame is never popped before the end of `parse`.
    &mut stack.last_mut().unwrap().children
}

fn close_top(stack: &mut Vec<Frame>) {
    if let Some(frame) = stack.pop() {
        let node = frame.into_node();
        top(stack).push(node);
    }
}

fn push_text(stack: &mut [Frame], raw: &str) {
    if raw.is_empty() {
        return;
    }
    let text = decode_entities(raw);
    let children = top(stack);
    if let Some(Node::PlainText(prev)) = children.last_mut() {
        prev.push_str(&text);
    } else {
        children.push(Node::PlainText(text));
    }
}

fn decode_entities(raw: &str) -> String {
    ENTITY_REGEX
        .replace_all(raw, |caps: &Captures| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x").or(body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

/// Serialize a node tree with explicit styling for `target`.
pub fn render(nodes: &[Node], target: Target, style: &PrintStyle) -> String {
    let mut out = String::new();
    for node in nodes {
        render_node(node, target, style, &mut out);
    }
    out
}

fn render_children(children: &[Node], target: Target, style: &PrintStyle, out: &mut String) {
    for child in children {
        render_node(child, target, style, out);
    }
}

fn wrap(
    open: &str,
    close: &str,
    children: &[Node],
    target: Target,
    style: &PrintStyle,
    out: &mut String,
) {
    out.push_str(open);
    render_children(children, target, style, out);
    out.push_str(close);
}

fn render_node(node: &Node, target: Target, style: &PrintStyle, out: &mut String) {
    let size = style.font_size_px;
    match node {
        Node::PlainText(text) => escape_into(text, out),
        Node::LineBreak => match target {
            Target::Display => out.push_str("<br>"),
            Target::Print => out.push('\n'),
        },
        Node::Bold(children) => {
            let open = format!(
                "<strong style=\"font-weight:bold;font-size:{}px;white-space:pre-wrap\">",
                size
            );
            wrap(&open, "</strong>", children, target, style, out);
        }
        Node::Paragraph(children) => {
            let open = format!(
                "<p style=\"font-size:{}px;white-space:pre-wrap;margin:0\">",
                size
            );
            wrap(&open, "</p>", children, target, style, out);
        }
        Node::Italic(children) => {
            let open = format!("<i style=\"font-style:italic;font-size:{}px\">", size);
            wrap(&open, "</i>", children, target, style, out);
        }
        Node::Underline(children) => match target {
            Target::Display => wrap("<u>", "</u>", children, target, style, out),
            Target::Print => render_children(children, target, style, out),
        },
        Node::Strike(children) => match target {
            Target::Display => wrap("<s>", "</s>", children, target, style, out),
            Target::Print => render_children(children, target, style, out),
        },
        Node::Unknown { tag, children } => {
            if tag != "script" && tag != "style" {
                render_children(children, target, style, out);
            }
        }
    }
}

/// Parse `content` and re-emit it styled for `target`.
///
/// Applying the transform to its own output yields the same string.
pub fn transform_rich_text(content: &str, target: Target, style: &PrintStyle) -> String {
    render(&parse(content), target, style)
}

/// Text content only, with line breaks as newlines and paragraphs separated
/// by a newline.
pub fn to_plain_text(content: &str) -> String {
    let mut out = String::new();
    plain_into(&parse(content), &mut out);
    out
}

fn plain_into(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::PlainText(text) => out.push_str(text),
            Node::LineBreak => out.push('\n'),
            Node::Paragraph(children) => {
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                plain_into(children, out);
            }
            Node::Bold(children)
            | Node::Italic(children)
            | Node::Underline(children)
            | Node::Strike(children) => plain_into(children, out),
            Node::Unknown { tag, children } => {
                if tag != "script" && tag != "style" {
                    plain_into(children, out);
                }
            }
        }
    }
}
