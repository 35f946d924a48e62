use serde::{Deserialize, Serialize};

pub const IMAGE_MIN_WIDTH: u32 = 100;
pub const IMAGE_MAX_WIDTH: u32 = 800;
pub const IMAGE_DEFAULT_WIDTH: u32 = 400;
pub const IMAGE_RESIZE_STEP: i32 = 50;

/// Separator used when several text blocks are folded into the single body block.
const BODY_JOIN: &str = "\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub i64);

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One unit of note content. Stored as an internally tagged object
/// (`{"type": "link", ...}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text {
        value: String,
    },
    Link {
        id: BlockId,
        url: String,
        text: String,
    },
    Image {
        id: BlockId,
        src: String,
        alt: String,
        width: u32,
    },
}

impl ContentBlock {
    pub fn id(&self) -> Option<BlockId> {
        match self {
            ContentBlock::Text { .. } => None,
            ContentBlock::Link { id, .. } | ContentBlock::Image { id, .. } => Some(*id),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ContentBlock::Text { .. })
    }

    pub fn is_image(&self) -> bool {
        matches!(self, ContentBlock::Image { .. })
    }
}

/// An image file that has been read and inline-encoded, ready to become an
/// [`ContentBlock::Image`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub src: String,
    pub alt: String,
}

pub fn clamp_width(width: i64) -> u32 {
    width.clamp(i64::from(IMAGE_MIN_WIDTH), i64::from(IMAGE_MAX_WIDTH)) as u32
}

/// Folds every text block into one leading block and clamps image widths.
/// The result always starts with exactly one `Text` block.
pub fn normalize(blocks: Vec<ContentBlock>) -> Vec<ContentBlock> {
    let mut texts = Vec::new();
    let mut rest = Vec::with_capacity(blocks.len());
    for block in blocks {
        match block {
            ContentBlock::Text { value } => texts.push(value),
            ContentBlock::Image {
                id,
                src,
                alt,
                width,
            } => rest.push(ContentBlock::Image {
                id,
                src,
                alt,
                width: clamp_width(i64::from(width)),
            }),
            link @ ContentBlock::Link { .. } => rest.push(link),
        }
    }
    let mut normalized = Vec::with_capacity(rest.len() + 1);
    normalized.push(ContentBlock::Text {
        value: texts.join(BODY_JOIN),
    });
    normalized.extend(rest);
    normalized
}

pub fn body_text(blocks: &[ContentBlock]) -> &str {
    match blocks.first() {
        Some(ContentBlock::Text { value }) => value,
        _ => "",
    }
}

pub fn search_text(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { value } => Some(value.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn with_body(blocks: &[ContentBlock], body: &str) -> Vec<ContentBlock> {
    let mut updated = Vec::with_capacity(blocks.len() + 1);
    updated.push(ContentBlock::Text {
        value: body.to_string(),
    });
    updated.extend(blocks.iter().filter(|block| !block.is_text()).cloned());
    updated
}

pub fn with_link(blocks: &[ContentBlock], id: BlockId, url: &str, text: &str) -> Vec<ContentBlock> {
    let text = if text.is_empty() { url } else { text };
    let mut updated = blocks.to_vec();
    updated.push(ContentBlock::Link {
        id,
        url: url.to_string(),
        text: text.to_string(),
    });
    updated
}

pub fn with_image(blocks: &[ContentBlock], id: BlockId, upload: ImageUpload) -> Vec<ContentBlock> {
    let mut updated = blocks.to_vec();
    updated.push(ContentBlock::Image {
        id,
        src: upload.src,
        alt: upload.alt,
        width: IMAGE_DEFAULT_WIDTH,
    });
    updated
}

pub fn without_block(blocks: &[ContentBlock], id: BlockId) -> Vec<ContentBlock> {
    blocks
        .iter()
        .filter(|block| block.id() != Some(id))
        .cloned()
        .collect()
}

pub fn with_image_resized(blocks: &[ContentBlock], id: BlockId, delta: i32) -> Vec<ContentBlock> {
    blocks
        .iter()
        .map(|block| match block {
            ContentBlock::Image {
                id: image_id,
                src,
                alt,
                width,
            } if *image_id == id => ContentBlock::Image {
                id: *image_id,
                src: src.clone(),
                alt: alt.clone(),
                width: clamp_width(i64::from(*width) + i64::from(delta)),
            },
            other => other.clone(),
        })
        .collect()
}
