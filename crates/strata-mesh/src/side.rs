//! Patch sides and per-side joint levels.

use glam::IVec2;

/// One of the four cardinal sides of a patch. X grows to the right, Y to
/// the back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// -X
    Left = 0,
    /// +X
    Right = 1,
    /// -Y
    Front = 2,
    /// +Y
    Back = 3,
}

impl Side {
    /// All sides in index order.
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Front, Side::Back];

    /// Index into per-side arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The side facing this one across a seam.
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Front => Side::Back,
            Side::Back => Side::Front,
        }
    }

    /// Outward direction in grid space.
    pub fn direction(self) -> IVec2 {
        match self {
            Side::Left => IVec2::NEG_X,
            Side::Right => IVec2::X,
            Side::Front => IVec2::NEG_Y,
            Side::Back => IVec2::Y,
        }
    }

    /// Patch-local lattice position of external vertex `k` on this side.
    pub fn external(self, k: i32, span: i32) -> IVec2 {
        match self {
            Side::Left => IVec2::new(0, k),
            Side::Right => IVec2::new(span, k),
            Side::Front => IVec2::new(k, 0),
            Side::Back => IVec2::new(k, span),
        }
    }

    /// Patch-local lattice position of the vertex one step inward from external `k`.
    pub fn internal(self, k: i32, span: i32) -> IVec2 {
        self.external(k, span) - self.direction()
    }

    /// Whether a patch-local lattice position lies on this side.
    pub fn contains(self, local: IVec2, span: i32) -> bool {
        match self {
            Side::Left => local.x == 0,
            Side::Right => local.x == span,
            Side::Front => local.y == 0,
            Side::Back => local.y == span,
        }
    }
}

/// How many levels coarser the neighbor across each side is.
///
/// Zero means no elision on that side: the neighbor is at the same level,
/// finer, or absent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct JointLevels([u32; 4]);

impl JointLevels {
    /// No seams on any side.
    pub const NONE: JointLevels = JointLevels([0; 4]);

    /// Joint levels indexed by [`Side::index`].
    pub fn new(levels: [u32; 4]) -> Self {
        Self(levels)
    }

    /// Joint level on one side.
    pub fn get(&self, side: Side) -> u32 {
        self.0[side.index()]
    }

    /// Set the joint level on one side.
    pub fn set(&mut self, side: Side, level: u32) {
        self.0[side.index()] = level;
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, side: Side, level: u32) -> Self {
        self.set(side, level);
        self
    }
}
