//! Rich-text body rendering
//!
//! A post body arrives as an array of typed blocks. Each block is decoded
//! into [`Block`] by its `_type` tag, and anything this renderer does not
//! know about is kept as [`Block::Unknown`] and rendered by the default
//! case instead of failing the page.

use serde::{de::Error as _, Deserialize, Deserializer};
use serde_json::Value;

use super::post::ImageRef;
use crate::helpers::{external_link, html_escape, image_tag, text_to_html};
use crate::sanity::ImageUrlBuilder;

/// One block of a rich-text body
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// `_type: "block"`: paragraphs, headings, quotes and list items
    Text(TextBlock),
    /// `_type: "image"`
    Image(ImageRef),
    /// Any other block type, kept verbatim
    Unknown(Value),
}

impl Block {
    /// The `_type` tag of this block
    pub fn type_name(&self) -> &str {
        match self {
            Block::Text(_) => "block",
            Block::Image(_) => "image",
            Block::Unknown(value) => value
                .get("_type")
                .and_then(Value::as_str)
                .unwrap_or("unknown"),
        }
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if !value.is_object() {
            return Err(D::Error::custom("portable text block must be an object"));
        }

        let block = match value.get("_type").and_then(Value::as_str) {
            Some("block") => TextBlock::deserialize(value.clone())
                .map(Block::Text)
                .unwrap_or(Block::Unknown(value)),
            Some("image") => ImageRef::deserialize(value.clone())
                .map(Block::Image)
                .unwrap_or(Block::Unknown(value)),
            _ => Block::Unknown(value),
        };
        Ok(block)
    }
}

/// A text block with inline spans
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub list_item: Option<String>,
    #[serde(default)]
    pub level: Option<usize>,
    #[serde(default)]
    pub children: Vec<Span>,
    #[serde(default)]
    pub mark_defs: Vec<MarkDef>,
}

impl TextBlock {
    pub fn style(&self) -> BlockStyle {
        BlockStyle::parse(self.style.as_deref().unwrap_or("normal"))
    }

    pub fn list_kind(&self) -> Option<ListKind> {
        self.list_item.as_deref().map(ListKind::parse)
    }
}

/// Inline text run
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Span {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub marks: Vec<String>,
}

/// Annotation referenced from span marks by key
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MarkDef {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_type")]
    pub kind: String,
    #[serde(default)]
    pub href: Option<String>,
}

/// Block style
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockStyle {
    Normal,
    Heading(u8),
    Blockquote,
    Other(String),
}

impl BlockStyle {
    pub fn parse(style: &str) -> Self {
        match style {
            "normal" => BlockStyle::Normal,
            "blockquote" => BlockStyle::Blockquote,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                BlockStyle::Heading(style.as_bytes()[1] - b'0')
            }
            other => BlockStyle::Other(other.to_string()),
        }
    }
}

/// List flavour of a list item block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Number,
}

impl ListKind {
    fn parse(kind: &str) -> Self {
        match kind {
            "number" => ListKind::Number,
            _ => ListKind::Bullet,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            ListKind::Bullet => "ul",
            ListKind::Number => "ol",
        }
    }
}

const LIST_ITEM_OPEN: &str = r#"<li class="ml-4 list-disc">"#;

/// Renders a block array to HTML
pub struct PortableTextRenderer<'a> {
    images: &'a ImageUrlBuilder,
}

impl<'a> PortableTextRenderer<'a> {
    pub fn new(images: &'a ImageUrlBuilder) -> Self {
        Self { images }
    }

    /// Render blocks to HTML
    pub fn render(&self, blocks: &[Block]) -> String {
        let mut out = String::new();
        // Open lists, innermost last. Each open list has an unclosed <li>.
        let mut lists: Vec<ListKind> = Vec::new();

        for block in blocks {
            match block {
                Block::Text(text) if text.list_kind().is_some() => {
                    let kind = text.list_kind().unwrap_or(ListKind::Bullet);
                    let level = text.level.unwrap_or(1).max(1);
                    self.open_list_item(&mut out, &mut lists, kind, level);
                    out.push_str(LIST_ITEM_OPEN);
                    out.push_str(&self.render_spans(text));
                }
                other => {
                    close_lists(&mut out, &mut lists, 0);
                    out.push_str(&self.render_block(other));
                }
            }
        }

        close_lists(&mut out, &mut lists, 0);
        out
    }

    fn open_list_item(
        &self,
        out: &mut String,
        lists: &mut Vec<ListKind>,
        kind: ListKind,
        level: usize,
    ) {
        close_lists(out, lists, level);

        if lists.len() == level && lists.last() != Some(&kind) {
            close_lists(out, lists, level - 1);
        }

        if lists.len() == level {
            // sibling item
            out.push_str("</li>");
        }

        // a level skipped over still needs an item to hold the deeper list
        let mut opened = false;
        while lists.len() < level {
            if opened {
                out.push_str(r#"<li class="ml-4 list-none">"#);
            }
            opened = true;
            out.push('<');
            out.push_str(kind.tag());
            out.push('>');
            lists.push(kind);
        }
    }

    fn render_block(&self, block: &Block) -> String {
        match block {
            Block::Text(text) => {
                let inner = self.render_spans(text);
                match text.style() {
                    BlockStyle::Heading(1) => {
                        format!(r#"<h1 class="text-2xl font-bold my-5">{}</h1>"#, inner)
                    }
                    BlockStyle::Heading(2) => {
                        format!(r#"<h2 class="text-xl font-bold my-5">{}</h2>"#, inner)
                    }
                    BlockStyle::Heading(n) => format!("<h{n}>{}</h{n}>", inner),
                    BlockStyle::Blockquote => format!("<blockquote>{}</blockquote>", inner),
                    BlockStyle::Normal | BlockStyle::Other(_) => format!("<p>{}</p>", inner),
                }
            }
            Block::Image(image) => match self.images.image(image).width(1200).url() {
                Ok(src) => format!(
                    "<figure>{}</figure>",
                    image_tag(&src, image.alt.as_deref().unwrap_or(""), None)
                ),
                Err(e) => {
                    tracing::warn!("Skipping body image: {}", e);
                    String::new()
                }
            },
            Block::Unknown(_) => {
                let type_name = block.type_name();
                tracing::debug!("No renderer for block type {}", type_name);
                format!("<!-- unknown block type: {} -->", html_escape(type_name))
            }
        }
    }

    fn render_spans(&self, block: &TextBlock) -> String {
        let mut out = String::new();
        for span in &block.children {
            let mut html = text_to_html(&span.text);
            for mark in &span.marks {
                html = apply_mark(html, mark, &block.mark_defs);
            }
            out.push_str(&html);
        }
        out
    }
}

/// Wrap rendered span HTML in the markup for one mark
fn apply_mark(inner: String, mark: &str, mark_defs: &[MarkDef]) -> String {
    match mark {
        "strong" => format!("<strong>{}</strong>", inner),
        "em" => format!("<em>{}</em>", inner),
        "code" => format!("<code>{}</code>", inner),
        "underline" => format!(r#"<span class="underline">{}</span>"#, inner),
        "strike-through" => format!("<del>{}</del>", inner),
        key => match mark_defs.iter().find(|def| def.key == key) {
            Some(def) if def.kind == "link" => {
                external_link(def.href.as_deref().unwrap_or("#"), &inner)
            }
            _ => inner,
        },
    }
}

/// Close open lists until only `keep` remain
fn close_lists(out: &mut String, lists: &mut Vec<ListKind>, keep: usize) {
    while lists.len() > keep {
        if let Some(kind) = lists.pop() {
            out.push_str("</li></");
            out.push_str(kind.tag());
            out.push('>');
        }
    }
}
