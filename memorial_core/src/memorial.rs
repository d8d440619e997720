//! # Memorial Document
//!
//! The technical memorial ("memorial descritivo") is a list of pages, each an
//! ordered list of blocks. Comparison blocks pair an existing installation
//! with the projected motor that replaces it; the projected motors of every
//! comparison block feed the project summary.
//!
//! ## Structure
//!
//! ```text
//! Memorial
//! ├── meta: MemorialMetadata (version, title, timestamps)
//! ├── settings: MemorialSettings (dimensioning policy)
//! ├── locked: bool
//! └── pages: Vec<Page>
//!     └── blocks: Vec<Block> (text | comparison | summary table)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use memorial_core::memorial::{BlockKind, ComparisonData, Memorial};
//!
//! let mut memorial = Memorial::new("Projeto Campo Forte");
//! memorial.add_block(BlockKind::Comparison(ComparisonData::projecting(10.0)), None).unwrap();
//! memorial.add_block(BlockKind::Comparison(ComparisonData::projecting(7.5)), None).unwrap();
//!
//! let summary = memorial.summary();
//! assert_eq!(summary.motor_count, 2);
//! assert_eq!(summary.total_cv, 17.5);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::summary::{summarize, ProjectSummary};
use crate::catalog::{self, MotorRating};
use crate::errors::{CalcError, CalcResult};
use crate::policy::DimensioningPolicy;

/// Current schema version for .mdt files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Font size of blocks added without explicit formatting (pt)
pub const DEFAULT_FONT_SIZE: f32 = 11.0;

/// Root document container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memorial {
    pub meta: MemorialMetadata,
    pub settings: MemorialSettings,
    /// When set, every editing operation is refused
    #[serde(default)]
    pub locked: bool,
    pub pages: Vec<Page>,
}

/// Memorial metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorialMetadata {
    /// Schema version (for compatibility checks)
    pub version: String,
    pub title: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Per-document settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorialSettings {
    #[serde(default)]
    pub policy: DimensioningPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: Uuid,
    pub blocks: Vec<Block>,
}

impl Page {
    pub fn new() -> Self {
        Page {
            id: Uuid::new_v4(),
            blocks: Vec::new(),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// One content block with its formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: Uuid,
    pub kind: BlockKind,
    pub font_size: f32,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub align: TextAlign,
}

impl Block {
    pub fn new(kind: BlockKind) -> Self {
        Block {
            id: Uuid::new_v4(),
            kind,
            font_size: DEFAULT_FONT_SIZE,
            bold: false,
            italic: false,
            align: TextAlign::Left,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Block::new(BlockKind::Text(value.into()))
    }

    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn aligned(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }
}

/// Block content.
///
/// ## JSON Example
///
/// ```json
/// { "type": "comparison", "value": { "before": { "cv": 1.0, "cable": "2.5", "breaker": "DISJ 10A", "starter": "DIRETA" }, "after": { "cv": 1.0 } } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum BlockKind {
    Text(String),
    Comparison(ComparisonData),
    /// Rendered from the current project summary
    SummaryTable,
}

/// Existing installation versus the projected motor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonData {
    pub before: ExistingInstallation,
    pub after: ProjectedMotor,
}

impl ComparisonData {
    /// Comparison against the default existing installation.
    pub fn projecting(cv: f64) -> Self {
        ComparisonData {
            before: ExistingInstallation::default(),
            after: ProjectedMotor { cv },
        }
    }
}

impl Default for ComparisonData {
    fn default() -> Self {
        ComparisonData::projecting(1.0)
    }
}

/// The installation being replaced, as surveyed (free-form labels).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingInstallation {
    pub cv: f64,
    pub cable: String,
    pub breaker: String,
    pub starter: String,
}

impl Default for ExistingInstallation {
    fn default() -> Self {
        ExistingInstallation {
            cv: 1.0,
            cable: "2.5".to_string(),
            breaker: "DISJ 10A".to_string(),
            starter: "DIRETA".to_string(),
        }
    }
}

/// The catalogued motor proposed for the position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedMotor {
    pub cv: f64,
}

/// Partial update for [`Memorial::update_block`]; `None` fields are left as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockUpdate {
    pub kind: Option<BlockKind>,
    pub font_size: Option<f32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub align: Option<TextAlign>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

impl Memorial {
    /// Create a memorial with one page holding the standard heading.
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        let mut first_page = Page::new();
        first_page.blocks = vec![
            Block::text("MEMORIAL DESCRITIVO TÉCNICO")
                .with_font_size(14.0)
                .bold()
                .aligned(TextAlign::Center),
            Block::text("DIMENSIONAMENTO E EFICIÊNCIA ENERGÉTICA")
                .with_font_size(10.0)
                .aligned(TextAlign::Center),
            Block::text(""),
        ];

        Memorial {
            meta: MemorialMetadata {
                version: SCHEMA_VERSION.to_string(),
                title: title.into(),
                created: now,
                modified: now,
            },
            settings: MemorialSettings::default(),
            locked: false,
            pages: vec![first_page],
        }
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
        self.touch();
    }

    fn ensure_unlocked(&self, operation: &str) -> CalcResult<()> {
        if self.locked {
            return Err(CalcError::document_locked(operation));
        }
        Ok(())
    }

    /// Append an empty page and return its id.
    pub fn add_page(&mut self) -> CalcResult<Uuid> {
        self.ensure_unlocked("add page")?;
        let page = Page::new();
        let id = page.id;
        self.pages.push(page);
        self.touch();
        Ok(id)
    }

    /// Add a block with default formatting to `target_page`, or to the last page.
    pub fn add_block(&mut self, kind: BlockKind, target_page: Option<Uuid>) -> CalcResult<Uuid> {
        self.insert_block(Block::new(kind), target_page)
    }

    /// Append a pre-formatted block to `target_page`, or to the last page.
    ///
    /// A memorial without pages gets a fresh one.
    pub fn insert_block(&mut self, block: Block, target_page: Option<Uuid>) -> CalcResult<Uuid> {
        self.ensure_unlocked("add block")?;

        let page = match target_page {
            Some(page_id) => self
                .pages
                .iter_mut()
                .find(|p| p.id == page_id)
                .ok_or_else(|| CalcError::page_not_found(page_id))?,
            None => {
                if self.pages.is_empty() {
                    self.pages.push(Page::new());
                }
                let last = self.pages.len() - 1;
                &mut self.pages[last]
            }
        };

        let id = block.id;
        page.blocks.push(block);
        self.touch();
        Ok(id)
    }

    pub fn block(&self, block_id: Uuid) -> Option<&Block> {
        self.blocks().find(|b| b.id == block_id)
    }

    /// All blocks in reading order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.pages.iter().flat_map(|p| p.blocks.iter())
    }

    pub fn update_block(&mut self, block_id: Uuid, update: BlockUpdate) -> CalcResult<()> {
        self.ensure_unlocked("update block")?;

        let block = self
            .pages
            .iter_mut()
            .flat_map(|p| p.blocks.iter_mut())
            .find(|b| b.id == block_id)
            .ok_or_else(|| CalcError::block_not_found(block_id))?;

        if let Some(kind) = update.kind {
            block.kind = kind;
        }
        if let Some(font_size) = update.font_size {
            block.font_size = font_size;
        }
        if let Some(bold) = update.bold {
            block.bold = bold;
        }
        if let Some(italic) = update.italic {
            block.italic = italic;
        }
        if let Some(align) = update.align {
            block.align = align;
        }
        self.touch();
        Ok(())
    }

    pub fn remove_block(&mut self, block_id: Uuid) -> CalcResult<Block> {
        self.ensure_unlocked("remove block")?;

        let (page_index, index) = self
            .locate(block_id)
            .ok_or_else(|| CalcError::block_not_found(block_id))?;
        let block = self.pages[page_index].blocks.remove(index);
        self.touch();
        Ok(block)
    }

    /// Swap a block with its neighbour within the same page.
    ///
    /// Returns `false` when the block is already first (Up) or last (Down).
    pub fn move_block(&mut self, block_id: Uuid, direction: MoveDirection) -> CalcResult<bool> {
        self.ensure_unlocked("move block")?;

        let (page_index, index) = self
            .locate(block_id)
            .ok_or_else(|| CalcError::block_not_found(block_id))?;
        let blocks = &mut self.pages[page_index].blocks;
        let target = match direction {
            MoveDirection::Up if index > 0 => index - 1,
            MoveDirection::Down if index + 1 < blocks.len() => index + 1,
            _ => return Ok(false),
        };
        blocks.swap(index, target);
        self.touch();
        Ok(true)
    }

    /// (page index, block index) of a block
    fn locate(&self, block_id: Uuid) -> Option<(usize, usize)> {
        self.pages.iter().enumerate().find_map(|(page_index, page)| {
            page.blocks
                .iter()
                .position(|b| b.id == block_id)
                .map(|index| (page_index, index))
        })
    }

    /// Projected motors of every comparison block, resolved through the
    /// catalog. Ratings missing from the catalog are skipped.
    pub fn projected_motors(&self) -> Vec<MotorRating> {
        catalog::resolve_all(self.blocks().filter_map(|b| match &b.kind {
            BlockKind::Comparison(data) => Some(data.after.cv),
            _ => None,
        }))
    }

    /// Project summary over the projected motors, using this memorial's policy.
    pub fn summary(&self) -> ProjectSummary {
        summarize(&self.projected_motors(), &self.settings.policy)
    }
}

impl Default for Memorial {
    fn default() -> Self {
        Memorial::new("")
    }
}
