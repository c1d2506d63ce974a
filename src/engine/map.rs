// Static tile grid: per-cell kind, walkability and world/tile conversions.
//
// The level is authored as rows of single-character tile codes. Codes are
// resolved once, in `GridMap::from_rows`, into the closed `TileKind` enum;
// after that nothing downstream ever looks at a character again.

use glam::{IVec2, Vec2};
use thiserror::Error;

// ============================================================================
// TILE KINDS
// ============================================================================

/// Wall textures, in the order their slots appear in the texture atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WallTexture {
    Smiley,
    Red,
    Bush,
    Sky,
    Pink,
    Wallpaper,
    Dirt,
    Exit,
}

impl WallTexture {
    pub const ALL: [WallTexture; 8] = [
        WallTexture::Smiley,
        WallTexture::Red,
        WallTexture::Bush,
        WallTexture::Sky,
        WallTexture::Pink,
        WallTexture::Wallpaper,
        WallTexture::Dirt,
        WallTexture::Exit,
    ];

    /// Atlas slot index (see `texture::TextureAtlas::slot_origin`).
    pub fn slot(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    Floor,
    Wall(WallTexture),
}

pub const FLOOR_CODE: char = '.';

/// Tile code lookup table. Every non-floor code must appear here.
const WALL_CODES: [(char, WallTexture); 8] = [
    ('#', WallTexture::Pink),
    ('=', WallTexture::Dirt),
    ('M', WallTexture::Wallpaper),
    ('N', WallTexture::Bush),
    ('~', WallTexture::Sky),
    ('!', WallTexture::Red),
    ('@', WallTexture::Smiley),
    ('^', WallTexture::Exit),
];

impl TileKind {
    pub fn from_code(code: char) -> Option<TileKind> {
        if code == FLOOR_CODE {
            return Some(TileKind::Floor);
        }
        WALL_CODES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|&(_, tex)| TileKind::Wall(tex))
    }

    pub fn is_floor(self) -> bool {
        matches!(self, TileKind::Floor)
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("map has {actual} tiles, expected {width} x {height}")]
    DimensionMismatch { width: i32, height: i32, actual: usize },
    #[error("map tile at [{x}, {y}] has an unknown tile code {code:?}")]
    UnknownTileCode { x: i32, y: i32, code: char },
    #[error("map edge at [{x}, {y}] is a floor (should be wall)")]
    OpenBoundary { x: i32, y: i32 },
    #[error("map has no floor tile")]
    NoFloor,
    #[error("tile [{x}, {y}] is outside the map")]
    OutOfBounds { x: i32, y: i32 },
}

// ============================================================================
// GRID MAP
// ============================================================================

/// Immutable after construction; shared by reference with every subsystem.
#[derive(Debug, Clone)]
pub struct GridMap {
    tiles: Vec<TileKind>,
    width: i32,
    height: i32,
}

/// Reference level, 24 x 24.
pub const REFERENCE_WIDTH: i32 = 24;
pub const REFERENCE_HEIGHT: i32 = 24;
pub const REFERENCE_LEVEL: [&str; 24] = [
    "~~~~~~~~~~~~~~~~MMM@MMMM",
    "~..............=M......M",
    "~..............=M......M",
    "~..............=@......@",
    "~..............=M......M",
    "~....N......N..........M",
    "~..............=MMM@MM.M",
    "~..............======M.M",
    "~..............=MMMMMM.M",
    "~..............=M......M",
    "~...N....N.....=M..N..M#",
    "~.....................M#",
    "~..............=M..N..M#",
    "~..............=M.....M#",
    "~...........N..=MMMMM.M#",
    "~..............======.=#",
    "#.!!!!!!.!!!!!!........#",
    "#.!....!.!..........=..#",
    "#.!.N..!.!..==..=...=..#",
    "#...........==..==..=..#",
    "#.!!!!!!.!..==.........#",
    "#.######.#..==....=....#",
    "N......................^",
    "########################",
];

impl GridMap {
    /// Parse and validate a level. Rows are listed top (y = 0) to bottom.
    pub fn from_rows(width: i32, height: i32, rows: &[&str]) -> Result<Self, MapError> {
        if width <= 0 || height <= 0 {
            return Err(MapError::DimensionMismatch { width, height, actual: rows.len() });
        }
        let codes: Vec<char> = rows.iter().flat_map(|r| r.chars()).collect();
        let rows_ok = rows.len() == height as usize
            && rows.iter().all(|r| r.chars().count() == width as usize);
        if !rows_ok || codes.len() != (width * height) as usize {
            return Err(MapError::DimensionMismatch { width, height, actual: codes.len() });
        }

        let mut tiles = Vec::with_capacity(codes.len());
        for (i, &code) in codes.iter().enumerate() {
            let (x, y) = (i as i32 % width, i as i32 / width);
            let kind = TileKind::from_code(code)
                .ok_or(MapError::UnknownTileCode { x, y, code })?;
            tiles.push(kind);
        }

        let map = Self { tiles, width, height };
        map.validate()?;
        Ok(map)
    }

    pub fn reference() -> Result<Self, MapError> {
        Self::from_rows(REFERENCE_WIDTH, REFERENCE_HEIGHT, &REFERENCE_LEVEL)
    }

    /// Wall-enclosed arena check: every boundary cell must be a wall and
    /// at least one cell must be floor.
    pub fn validate(&self) -> Result<(), MapError> {
        for y in 0..self.height {
            for x in 0..self.width {
                let edge = x == 0 || y == 0 || x == self.width - 1 || y == self.height - 1;
                if edge && self.tiles[self.idx(IVec2::new(x, y))].is_floor() {
                    return Err(MapError::OpenBoundary { x, y });
                }
            }
        }
        if !self.tiles.iter().any(|t| t.is_floor()) {
            return Err(MapError::NoFloor);
        }
        Ok(())
    }

    pub fn width(&self) -> i32 { self.width }
    pub fn height(&self) -> i32 { self.height }

    #[inline]
    pub fn in_bounds(&self, tile: IVec2) -> bool {
        tile.x >= 0 && tile.y >= 0 && tile.x < self.width && tile.y < self.height
    }

    #[inline]
    fn idx(&self, tile: IVec2) -> usize {
        (tile.y * self.width + tile.x) as usize
    }

    pub fn tile_at(&self, tile: IVec2) -> Result<TileKind, MapError> {
        if !self.in_bounds(tile) {
            return Err(MapError::OutOfBounds { x: tile.x, y: tile.y });
        }
        Ok(self.tiles[self.idx(tile)])
    }

    /// True iff in bounds and a floor tile.
    #[inline]
    pub fn is_walkable(&self, tile: IVec2) -> bool {
        self.in_bounds(tile) && self.tiles[self.idx(tile)].is_floor()
    }

    /// Row-major index of a tile, for per-tile scratch arrays.
    /// Caller guarantees `tile` is in bounds.
    #[inline]
    pub fn index_of(&self, tile: IVec2) -> usize {
        self.idx(tile)
    }

    #[inline]
    pub fn tile_of_index(&self, idx: usize) -> IVec2 {
        IVec2::new(idx as i32 % self.width, idx as i32 / self.width)
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// All floor tiles, row-major.
    pub fn floor_tiles(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_floor())
            .map(|(i, _)| self.tile_of_index(i))
    }
}

/// Tile containing a world position.
#[inline]
pub fn world_to_tile(pos: Vec2) -> IVec2 {
    pos.floor().as_ivec2()
}

/// World-space center of a tile.
#[inline]
pub fn tile_center(tile: IVec2) -> Vec2 {
    tile.as_vec2() + Vec2::splat(0.5)
}

#[cfg(test)]
pub(crate) fn open_room(width: i32, height: i32) -> GridMap {
    let mut rows = Vec::new();
    for y in 0..height {
        let row: String = (0..width)
            .map(|x| if x == 0 || y == 0 || x == width - 1 || y == height - 1 { '#' } else { '.' })
            .collect();
        rows.push(row);
    }
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    GridMap::from_rows(width, height, &refs).expect("open room is valid")
}
