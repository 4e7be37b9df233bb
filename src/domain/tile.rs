/// Tile kinds and their passability.
/// Properties are queried via methods, not stored as flags,
/// so terrain semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum TileKind {
    #[default]
    Grass,
    Water,
    Bridge, // Neutral: land and boat both cross
    Tree,
    House,
    Rock,
    Dock,   // Neutral: boat launch / landing
}

/// Movement class of an entity. Decides which tile kinds block it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveClass {
    /// Player on foot.
    Land,
    /// Player riding the boat.
    Water,
    /// Enemies: only water stops them (forests and houses do not).
    Roamer,
}

impl TileKind {
    /// Blocks entities walking on land.
    pub fn blocks_land(self) -> bool {
        matches!(self, TileKind::Water | TileKind::Tree | TileKind::House | TileKind::Rock)
    }

    /// Blocks the boat (and the player riding it).
    pub fn blocks_water(self) -> bool {
        matches!(self, TileKind::Grass | TileKind::Tree | TileKind::House | TileKind::Rock)
    }

    pub fn blocks(self, class: MoveClass) -> bool {
        match class {
            MoveClass::Land => self.blocks_land(),
            MoveClass::Water => self.blocks_water(),
            MoveClass::Roamer => self == TileKind::Water,
        }
    }

    /// Arrows stop on trees and houses.
    pub fn blocks_arrows(self) -> bool {
        matches!(self, TileKind::Tree | TileKind::House)
    }

    /// Can a boat rider step off onto this tile?
    pub fn is_landing(self) -> bool {
        matches!(self, TileKind::Grass | TileKind::Bridge | TileKind::Dock)
    }

    /// Single-character code used by ASCII maps in tests and debug dumps.
    pub fn from_char(c: char) -> TileKind {
        match c {
            '~' => TileKind::Water,
            '=' => TileKind::Bridge,
            'T' => TileKind::Tree,
            'H' => TileKind::House,
            'o' => TileKind::Rock,
            'D' => TileKind::Dock,
            _ => TileKind::Grass,
        }
    }
}
