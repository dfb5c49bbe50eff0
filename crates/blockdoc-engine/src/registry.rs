//! Block-type registry.
//!
//! Everything the engine needs to know about a block type - its tag, the
//! styles/classes/attributes it carries by default, which types it may absorb
//! on merge, which types it may be toggled to - lives in one explicit
//! [`BlockRegistry`] value handed to the serializer and the [`Document`].
//! Two documents with different registries never interfere.
//!
//! [`Document`]: crate::editing::Document

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{AttributeMap, ClassList, StyleMap};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Unknown block type: {0}")]
    UnknownType(String),
    #[error("Block type registered more than once: {0}")]
    DuplicateType(BlockType),
    #[error("Failed to parse block type table: {0}")]
    Parse(#[from] toml::de::Error),
}

/// The registered kinds of block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockType {
    Paragraph,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Code,
    Quote,
    #[serde(rename = "ul")]
    UnorderedList,
    #[serde(rename = "ol")]
    OrderedList,
    Image,
    Video,
    /// Free-form container holding arbitrary markup
    Container,
    /// Multi-column container; content lives in its columns
    Columns,
}

impl BlockType {
    pub const ALL: [BlockType; 15] = [
        BlockType::Paragraph,
        BlockType::H1,
        BlockType::H2,
        BlockType::H3,
        BlockType::H4,
        BlockType::H5,
        BlockType::H6,
        BlockType::Code,
        BlockType::Quote,
        BlockType::UnorderedList,
        BlockType::OrderedList,
        BlockType::Image,
        BlockType::Video,
        BlockType::Container,
        BlockType::Columns,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::Paragraph => "paragraph",
            BlockType::H1 => "h1",
            BlockType::H2 => "h2",
            BlockType::H3 => "h3",
            BlockType::H4 => "h4",
            BlockType::H5 => "h5",
            BlockType::H6 => "h6",
            BlockType::Code => "code",
            BlockType::Quote => "quote",
            BlockType::UnorderedList => "ul",
            BlockType::OrderedList => "ol",
            BlockType::Image => "image",
            BlockType::Video => "video",
            BlockType::Container => "container",
            BlockType::Columns => "columns",
        }
    }

    /// Types whose content is a sequence of list items.
    pub fn is_list(self) -> bool {
        matches!(self, BlockType::UnorderedList | BlockType::OrderedList)
    }

    /// Types whose content is a resource URL rather than markup.
    pub fn is_media(self) -> bool {
        matches!(self, BlockType::Image | BlockType::Video)
    }

    pub fn is_columns(self) -> bool {
        self == BlockType::Columns
    }

    pub fn heading_level(self) -> Option<u8> {
        match self {
            BlockType::H1 => Some(1),
            BlockType::H2 => Some(2),
            BlockType::H3 => Some(3),
            BlockType::H4 => Some(4),
            BlockType::H5 => Some(5),
            BlockType::H6 => Some(6),
            _ => None,
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        BlockType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or(RegistryError::UnknownType(s))
    }
}

/// Property bags a type contributes to every block of that type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDefaults {
    #[serde(default)]
    pub styles: StyleMap,
    #[serde(default)]
    pub classes: ClassList,
    #[serde(default)]
    pub attributes: AttributeMap,
}

impl TypeDefaults {
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty() && self.classes.is_empty() && self.attributes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockTypeSpec {
    pub kind: BlockType,
    pub tag: String,
    #[serde(default)]
    pub defaults: TypeDefaults,
    /// Types a block of this kind absorbs when the following block merges into it
    #[serde(default)]
    pub compatible: Vec<BlockType>,
    /// Types a block of this kind may be toggled to
    #[serde(default)]
    pub transitions: Vec<BlockType>,
    /// Wrapping applied to plain content on entry into this type; `{content}`
    /// marks where the content goes
    #[serde(default)]
    pub content_pattern: Option<String>,
}

impl BlockTypeSpec {
    fn new(kind: BlockType, tag: &str) -> Self {
        Self {
            kind,
            tag: tag.to_string(),
            defaults: TypeDefaults::default(),
            compatible: Vec::new(),
            transitions: Vec::new(),
            content_pattern: None,
        }
    }

    fn compatible(mut self, kinds: &[BlockType]) -> Self {
        self.compatible = kinds.to_vec();
        self
    }

    fn transitions(mut self, kinds: &[BlockType]) -> Self {
        self.transitions = kinds.to_vec();
        self
    }

    fn defaults(mut self, styles: &str, classes: &str, attributes: &str) -> Self {
        self.defaults = TypeDefaults {
            styles: StyleMap::parse(styles),
            classes: ClassList::parse(classes),
            attributes: AttributeMap::parse(attributes),
        };
        self
    }

    fn pattern(mut self, pattern: &str) -> Self {
        self.content_pattern = Some(pattern.to_string());
        self
    }
}

fn default_type() -> BlockType {
    BlockType::Paragraph
}

fn default_column_count() -> usize {
    2
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRegistry {
    /// Type used for synthesized blocks (empty document, refilled lists)
    #[serde(default = "default_type")]
    pub default_type: BlockType,
    /// Number of columns a multi-column block is parsed into
    #[serde(default = "default_column_count")]
    pub column_count: usize,
    #[serde(default)]
    pub types: Vec<BlockTypeSpec>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        use BlockType::*;

        const HEADINGS: [BlockType; 6] = [H1, H2, H3, H4, H5, H6];
        let text_targets = [Paragraph, H1, H2, H3, Quote, UnorderedList, OrderedList, Code];

        let mut types = vec![
            BlockTypeSpec::new(Paragraph, "p")
                .compatible(&[H1, H2, H3, H4, H5, H6, Quote])
                .transitions(&text_targets),
        ];
        for (level, kind) in HEADINGS.into_iter().enumerate() {
            types.push(
                BlockTypeSpec::new(kind, &format!("h{}", level + 1))
                    .compatible(&[Paragraph])
                    .transitions(&text_targets),
            );
        }
        types.extend([
            BlockTypeSpec::new(Code, "pre")
                .defaults("", "", r#"spellcheck="false""#)
                .transitions(&[Paragraph]),
            BlockTypeSpec::new(Quote, "blockquote")
                .compatible(&[Paragraph])
                .transitions(&text_targets),
            BlockTypeSpec::new(UnorderedList, "ul")
                .compatible(&[OrderedList])
                .transitions(&[OrderedList, Paragraph])
                .pattern("<li>{content}</li>"),
            BlockTypeSpec::new(OrderedList, "ol")
                .compatible(&[UnorderedList])
                .transitions(&[UnorderedList, Paragraph])
                .pattern("<li>{content}</li>"),
            BlockTypeSpec::new(Image, "figure").defaults("", "media", ""),
            BlockTypeSpec::new(Video, "figure").defaults("", "media", ""),
            BlockTypeSpec::new(Container, "div"),
            BlockTypeSpec::new(Columns, "div"),
        ]);

        Self {
            default_type: Paragraph,
            column_count: default_column_count(),
            types,
        }
    }
}

impl BlockRegistry {
    /// Load a table from TOML. Types the table leaves out keep their
    /// built-in definition.
    pub fn from_toml_str(input: &str) -> Result<Self, RegistryError> {
        let mut registry: BlockRegistry = toml::from_str(input)?;

        for (i, spec) in registry.types.iter().enumerate() {
            if registry.types[..i].iter().any(|s| s.kind == spec.kind) {
                return Err(RegistryError::DuplicateType(spec.kind));
            }
        }

        let builtin = BlockRegistry::default();
        for spec in builtin.types {
            if registry.spec(spec.kind).is_none() {
                registry.types.push(spec);
            }
        }
        registry.column_count = registry.column_count.max(1);

        Ok(registry)
    }

    pub fn spec(&self, kind: BlockType) -> Option<&BlockTypeSpec> {
        self.types.iter().find(|s| s.kind == kind)
    }

    pub fn tag_for(&self, kind: BlockType) -> &str {
        self.spec(kind).map(|s| s.tag.as_str()).unwrap_or("div")
    }

    /// Type recovered from a bare tag; the first registered type wins.
    pub fn type_for_tag(&self, tag: &str) -> Option<BlockType> {
        self.types
            .iter()
            .find(|s| s.tag.eq_ignore_ascii_case(tag))
            .map(|s| s.kind)
    }

    /// Whether a tag alone is enough to recover `kind` when parsing.
    pub fn tag_identifies(&self, kind: BlockType) -> bool {
        self.type_for_tag(self.tag_for(kind)) == Some(kind)
    }

    pub fn defaults(&self, kind: BlockType) -> TypeDefaults {
        self.spec(kind).map(|s| s.defaults.clone()).unwrap_or_default()
    }

    /// Whether `current` may merge into a preceding `previous` block.
    ///
    /// Only the previous block's table is consulted.
    pub fn is_merge_compatible(&self, previous: BlockType, current: BlockType) -> bool {
        previous == current
            || self
                .spec(previous)
                .is_some_and(|s| s.compatible.contains(&current))
    }

    pub fn transitions(&self, kind: BlockType) -> &[BlockType] {
        self.spec(kind).map(|s| s.transitions.as_slice()).unwrap_or(&[])
    }

    pub fn content_pattern(&self, kind: BlockType) -> Option<&str> {
        self.spec(kind).and_then(|s| s.content_pattern.as_deref())
    }
}
