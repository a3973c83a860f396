//! Static course geometry.

use serde::{Deserialize, Serialize};

use crate::constants::{
    OOB_MARGIN_BOTTOM, OOB_MARGIN_SIDE, OOB_MARGIN_TOP, SPAWN_INSET_X, WORLD_HEIGHT, WORLD_WIDTH,
};
use crate::error::LevelError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformRole {
    Start,
    Pad,
    End,
}

/// Index of a platform in level order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlatformId(pub usize);

/// Axis-aligned rectangle with a role tag. `y` grows downward.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    role: PlatformRole,
}

impl Platform {
    pub fn new(x: f64, y: f64, width: f64, height: f64, role: PlatformRole) -> Self {
        Self {
            x,
            y,
            width,
            height,
            role,
        }
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }

    #[inline]
    pub fn role(&self) -> PlatformRole {
        self.role
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    fn is_well_formed(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    fn is_inside(&self, width: f64, height: f64) -> bool {
        self.left() >= 0.0 && self.right() <= width && self.top() >= 0.0 && self.bottom() <= height
    }
}

/// Region outside of which an agent is considered lost.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn around(width: f64, height: f64) -> Self {
        Self {
            min_x: -OOB_MARGIN_SIDE,
            max_x: width + OOB_MARGIN_SIDE,
            min_y: -OOB_MARGIN_TOP,
            max_y: height + OOB_MARGIN_BOTTOM,
        }
    }

    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// Level description tuple: `(x, y, width, height, role)`.
pub type PlatformTuple = (f64, f64, f64, f64, PlatformRole);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LevelFile", into = "LevelFile")]
pub struct Level {
    platforms: Vec<Platform>,
    width: f64,
    height: f64,
    start: usize,
    end: usize,
}

impl Level {
    pub fn new(platforms: Vec<Platform>) -> Result<Self, LevelError> {
        Self::with_size(platforms, WORLD_WIDTH, WORLD_HEIGHT)
    }

    pub fn with_size(platforms: Vec<Platform>, width: f64, height: f64) -> Result<Self, LevelError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(LevelError::InvalidWorld);
        }
        if platforms.is_empty() {
            return Err(LevelError::EmptyLevel);
        }
        if let Some(index) = platforms.iter().position(|p| !p.is_well_formed()) {
            return Err(LevelError::InvalidPlatform { index });
        }
        let start = platforms
            .iter()
            .position(|p| p.role == PlatformRole::Start)
            .ok_or(LevelError::MissingStart)?;
        let end = platforms
            .iter()
            .position(|p| p.role == PlatformRole::End)
            .ok_or(LevelError::MissingEnd)?;
        for index in [start, end] {
            if !platforms[index].is_inside(width, height) {
                return Err(LevelError::OutsideWorld { index });
            }
        }

        Ok(Self {
            platforms,
            width,
            height,
            start,
            end,
        })
    }

    pub fn from_tuples(tuples: &[PlatformTuple]) -> Result<Self, LevelError> {
        Self::new(
            tuples
                .iter()
                .map(|&(x, y, w, h, role)| Platform::new(x, y, w, h, role))
                .collect(),
        )
    }

    /// The built-in course: a start ledge, six pads climbing and dipping to
    /// the right, and an end ledge at floor height.
    pub fn fixed() -> Self {
        let ground_y = WORLD_HEIGHT - 40.0;
        let pads = [
            (180.0, WORLD_HEIGHT - 140.0),
            (350.0, WORLD_HEIGHT - 200.0),
            (520.0, WORLD_HEIGHT - 260.0),
            (700.0, WORLD_HEIGHT - 230.0),
            (880.0, WORLD_HEIGHT - 280.0),
            (1050.0, WORLD_HEIGHT - 200.0),
        ];

        let mut platforms = Vec::with_capacity(pads.len() + 2);
        platforms.push(Platform::new(0.0, ground_y, 100.0, 20.0, PlatformRole::Start));
        for (x, y) in pads {
            platforms.push(Platform::new(x, y, 100.0, 20.0, PlatformRole::Pad));
        }
        let end_x = pads[pads.len() - 1].0 + 240.0;
        platforms.push(Platform::new(end_x, ground_y, 100.0, 20.0, PlatformRole::End));

        Self {
            platforms,
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
            start: 0,
            end: pads.len() + 1,
        }
    }

    #[inline]
    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlatformId, &Platform)> {
        self.platforms
            .iter()
            .enumerate()
            .map(|(idx, p)| (PlatformId(idx), p))
    }

    #[inline]
    pub fn get(&self, id: PlatformId) -> Option<&Platform> {
        self.platforms.get(id.0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn start(&self) -> (PlatformId, &Platform) {
        (PlatformId(self.start), &self.platforms[self.start])
    }

    pub fn end(&self) -> (PlatformId, &Platform) {
        (PlatformId(self.end), &self.platforms[self.end])
    }

    pub fn pad_count(&self) -> usize {
        self.platforms
            .iter()
            .filter(|p| p.role == PlatformRole::Pad)
            .count()
    }

    /// Top-left corner for a body of the given height resting on the start platform.
    pub fn spawn_point(&self, body_height: f64) -> (f64, f64) {
        let (_, start) = self.start();
        (start.left() + SPAWN_INSET_X, start.top() - body_height)
    }

    /// Platform with the smallest left edge strictly right of `x`; the end
    /// platform once nothing lies ahead.
    pub fn nearest_ahead(&self, x: f64) -> (PlatformId, &Platform) {
        self.iter()
            .filter(|(_, p)| p.left() > x)
            .min_by(|(_, a), (_, b)| a.left().total_cmp(&b.left()))
            .unwrap_or_else(|| self.end())
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::around(self.width, self.height)
    }

    pub fn to_tuples(&self) -> Vec<PlatformTuple> {
        self.platforms
            .iter()
            .map(|p| (p.x, p.y, p.width, p.height, p.role))
            .collect()
    }
}

/// On-disk shape of a level: optional world size plus the platform tuples.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct LevelFile {
    #[serde(default = "default_width")]
    width: f64,
    #[serde(default = "default_height")]
    height: f64,
    platforms: Vec<PlatformTuple>,
}

fn default_width() -> f64 {
    WORLD_WIDTH
}

fn default_height() -> f64 {
    WORLD_HEIGHT
}

impl TryFrom<LevelFile> for Level {
    type Error = LevelError;

    fn try_from(file: LevelFile) -> Result<Self, Self::Error> {
        let platforms = file
            .platforms
            .iter()
            .map(|&(x, y, w, h, role)| Platform::new(x, y, w, h, role))
            .collect();
        Level::with_size(platforms, file.width, file.height)
    }
}

impl From<Level> for LevelFile {
    fn from(level: Level) -> Self {
        LevelFile {
            width: level.width,
            height: level.height,
            platforms: level.to_tuples(),
        }
    }
}
