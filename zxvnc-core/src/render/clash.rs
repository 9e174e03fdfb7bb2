//! Attribute-clash resolution.
//!
//! Every tile may show only two colours. For each tile the resolver tries
//! every pair in a fixed [`CandidateTable`] and keeps the one with the
//! lowest total error, where a pixel's error is its distance to the nearer
//! colour of the pair. Ties go to the pair enumerated first.

use crate::render::frame::{SCREEN_HEIGHT, SCREEN_WIDTH, ToneFrame};
use crate::render::palette::Palette;

/// Tiles per attribute row.
pub const TILE_COLUMNS: usize = SCREEN_WIDTH / 8;

// ── TilePair ─────────────────────────────────────────────────────

/// The two palette indices a tile may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TilePair {
    /// Colour drawn where the bitmap bit is set.
    pub ink: u8,
    /// Colour drawn where the bitmap bit is clear.
    pub paper: u8,
}

impl TilePair {
    pub const fn new(ink: u8, paper: u8) -> Self {
        Self { ink, paper }
    }
}

// ── TileLayout ───────────────────────────────────────────────────

/// Shape of an attribute cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileLayout {
    /// 8×8 cells, 32×24 attributes.
    Block,
    /// 8×1 cells (Timex hi-colour), 32×192 attributes.
    Strip,
}

impl TileLayout {
    /// Pixel rows covered by one tile.
    pub const fn tile_height(self) -> usize {
        match self {
            TileLayout::Block => 8,
            TileLayout::Strip => 1,
        }
    }

    /// Number of tile rows on screen.
    pub const fn rows(self) -> usize {
        SCREEN_HEIGHT / self.tile_height()
    }

    pub const fn tile_count(self) -> usize {
        TILE_COLUMNS * self.rows()
    }
}

// ── CandidateTable ───────────────────────────────────────────────

/// The ordered list of pairs the resolver searches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateTable {
    pairs: Vec<TilePair>,
    /// Pair used when the search is bypassed (monochrome).
    mono: TilePair,
}

impl CandidateTable {
    /// The 56 classic pairs.
    ///
    /// Walks the attribute code `a = ink | paper << 3 | bright << 6` from
    /// 1 to 127 and keeps codes with `ink > paper`, so each unordered pair
    /// of distinct colours appears once per brightness bank.
    pub fn classic() -> Self {
        let pairs = (1u8..128)
            .filter_map(|a| {
                let ink = a & 7;
                let paper = (a >> 3) & 7;
                let bright = (a >> 6) << 3;
                (ink > paper).then_some(TilePair::new(ink | bright, paper | bright))
            })
            .collect();
        Self {
            pairs,
            mono: TilePair::new(7, 0),
        }
    }

    /// The 256 ULAplus pairs: per CLUT, every ink entry (0..8) against every
    /// paper entry (8..16).
    pub fn extended() -> Self {
        let mut pairs = Vec::with_capacity(256);
        for clut in 0..4u8 {
            for paper in 0..8u8 {
                for ink in 0..8u8 {
                    pairs.push(TilePair::new(clut * 16 + ink, clut * 16 + 8 + paper));
                }
            }
        }
        Self {
            pairs,
            mono: TilePair::new(7, 8),
        }
    }

    /// The table matching `palette`.
    pub fn for_palette(palette: &Palette) -> Self {
        if palette.is_extended() {
            Self::extended()
        } else {
            Self::classic()
        }
    }

    pub fn pairs(&self) -> &[TilePair] {
        &self.pairs
    }

    pub fn mono(&self) -> TilePair {
        self.mono
    }
}

// ── TileGrid ─────────────────────────────────────────────────────

/// One resolved pair per tile, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    layout: TileLayout,
    pairs: Vec<TilePair>,
}

impl TileGrid {
    /// A grid with every tile set to `pair`.
    pub fn uniform(layout: TileLayout, pair: TilePair) -> Self {
        Self {
            layout,
            pairs: vec![pair; layout.tile_count()],
        }
    }

    pub fn layout(&self) -> TileLayout {
        self.layout
    }

    /// Tile coordinates of pixel `(x, y)`.
    #[inline]
    pub fn tile_of(&self, x: usize, y: usize) -> (usize, usize) {
        (x / 8, y / self.layout.tile_height())
    }

    #[inline]
    pub fn pair(&self, column: usize, row: usize) -> TilePair {
        self.pairs[row * TILE_COLUMNS + column]
    }

    #[inline]
    pub fn pair_at(&self, x: usize, y: usize) -> TilePair {
        let (column, row) = self.tile_of(x, y);
        self.pair(column, row)
    }

    /// All pairs in row-major order.
    pub fn pairs(&self) -> &[TilePair] {
        &self.pairs
    }
}

// ── Resolution ───────────────────────────────────────────────────

/// Total error of drawing tile `(column, row)` with `pair`.
pub fn tile_cost(
    frame: &ToneFrame,
    palette: &Palette,
    layout: TileLayout,
    column: usize,
    row: usize,
    pair: TilePair,
) -> u32 {
    let ink = palette.tone(pair.ink);
    let paper = palette.tone(pair.paper);
    let height = layout.tile_height();

    let mut cost = 0;
    for y in row * height..(row + 1) * height {
        for x in column * 8..column * 8 + 8 {
            let px = frame.get(x, y);
            cost += px.distance(ink).min(px.distance(paper));
        }
    }
    cost
}

/// Pick the cheapest candidate for one tile.
///
/// Never fails: on a uniform tile with no exact match the first candidate
/// with the least error still wins.
pub fn resolve_tile(
    frame: &ToneFrame,
    palette: &Palette,
    candidates: &CandidateTable,
    layout: TileLayout,
    column: usize,
    row: usize,
) -> (TilePair, u32) {
    let mut best = (candidates.pairs[0], u32::MAX);
    for &pair in &candidates.pairs {
        let cost = tile_cost(frame, palette, layout, column, row, pair);
        if cost < best.1 {
            best = (pair, cost);
            if cost == 0 {
                break;
            }
        }
    }
    best
}

/// Resolve every tile of `frame`.
pub fn resolve(
    frame: &ToneFrame,
    palette: &Palette,
    candidates: &CandidateTable,
    layout: TileLayout,
    monochrome: bool,
) -> TileGrid {
    if monochrome {
        return TileGrid::uniform(layout, candidates.mono);
    }

    let mut pairs = Vec::with_capacity(layout.tile_count());
    for row in 0..layout.rows() {
        for column in 0..TILE_COLUMNS {
            let (pair, _) = resolve_tile(frame, palette, candidates, layout, column, row);
            pairs.push(pair);
        }
    }
    TileGrid { layout, pairs }
}

// ── Tests ────────────────────────────────────────────────────────
