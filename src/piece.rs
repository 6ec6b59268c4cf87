//! Piece model: colors, piece types, board coordinates and the per-type
//! move generators.
//!
//! Move generation here is purely geometric. It never looks at check; the
//! self-check filter lives in [`crate::position`]. Generators read the board
//! through the [`Occupancy`] trait so they work against any grid that can
//! report which color occupies a cell.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::MicroChessError;

/// Number of rows on the board
pub const ROWS: usize = 5;
/// Number of columns on the board
pub const COLS: usize = 4;

const STRAIGHT: [(isize, isize); 4] = [(0, 1), (1, 0), (-1, 0), (0, -1)];
const DIAGONAL: [(isize, isize); 4] = [(-1, -1), (1, 1), (1, -1), (-1, 1)];
const ALL_DIRECTIONS: [(isize, isize); 8] = [
    (0, 1),
    (1, 0),
    (-1, 0),
    (0, -1),
    (-1, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
];
const KNIGHT_JUMPS: [(isize, isize); 8] = [
    (-1, 2),
    (2, -1),
    (-1, -2),
    (-2, -1),
    (2, 1),
    (1, 2),
    (-2, 1),
    (1, -2),
];

/// Side color. The discriminant doubles as an array index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Black = 0,
    White = 1,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::Black, Color::White];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Row delta of a pawn advance. Black starts at row 0 and moves down the grid.
    pub const fn forward(self) -> isize {
        match self {
            Color::Black => 1,
            Color::White => -1,
        }
    }

    fn prefix(self) -> char {
        match self {
            Color::Black => 'B',
            Color::White => 'W',
        }
    }
}

impl TryFrom<usize> for Color {
    type Error = MicroChessError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(Color::Black),
            1 => Ok(Color::White),
            other => Err(MicroChessError::InvalidColor(other)),
        }
    }
}

/// Zero-based (row, column) board coordinate. Row 0 is Black's back rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn in_bounds(self) -> bool {
        self.row < ROWS && self.col < COLS
    }

    /// The coordinate `(dr, dc)` away, if it is still on the board.
    pub fn offset(self, dr: isize, dc: isize) -> Option<Coord> {
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        let target = Coord::new(row, col);
        target.in_bounds().then_some(target)
    }

    fn delta_to(self, other: Coord) -> (isize, isize) {
        (
            other.row as isize - self.row as isize,
            other.col as isize - self.col as isize,
        )
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Read access to a grid, as needed by the move generators.
pub trait Occupancy {
    /// Color of the piece standing on `coord`, `None` if the cell is empty.
    fn color_at(&self, coord: Coord) -> Option<Color>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceType {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceType {
    pub const ALL: [PieceType; 6] = [
        PieceType::King,
        PieceType::Queen,
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Knight,
        PieceType::Pawn,
    ];

    pub fn symbol(self) -> char {
        match self {
            PieceType::King => 'K',
            PieceType::Queen => 'Q',
            PieceType::Rook => 'R',
            PieceType::Bishop => 'B',
            PieceType::Knight => 'N',
            PieceType::Pawn => 'P',
        }
    }

    /// Every square a piece of this type and color standing on `from` could
    /// move to next, ignoring check. Friendly-occupied squares are excluded,
    /// enemy-occupied squares are included as captures.
    pub fn destinations<B: Occupancy + ?Sized>(
        self,
        color: Color,
        from: Coord,
        board: &B,
    ) -> Vec<Coord> {
        match self {
            PieceType::King => step(color, from, board, &ALL_DIRECTIONS),
            PieceType::Queen => slide(color, from, board, &ALL_DIRECTIONS),
            PieceType::Rook => slide(color, from, board, &STRAIGHT),
            PieceType::Bishop => slide(color, from, board, &DIAGONAL),
            PieceType::Knight => step(color, from, board, &KNIGHT_JUMPS),
            PieceType::Pawn => pawn(color, from, board),
        }
    }

    /// Cheap geometric test: `true` means a piece of this type on `from`
    /// cannot possibly attack `king`, whatever else is on the board.
    /// `false` only means the full move generation has to decide.
    pub fn cannot_check(self, color: Color, from: Coord, king: Coord) -> bool {
        let (dr, dc) = from.delta_to(king);
        let (adr, adc) = (dr.abs(), dc.abs());
        match self {
            PieceType::King => adr > 1 || adc > 1,
            PieceType::Queen => dr != 0 && dc != 0 && adr != adc,
            PieceType::Rook => dr != 0 && dc != 0,
            PieceType::Bishop => adr != adc,
            PieceType::Knight => !matches!((adr, adc), (1, 2) | (2, 1)),
            PieceType::Pawn => dr != color.forward() || adc != 1,
        }
    }
}

fn is_open_to(color: Color, target: Coord, board: &(impl Occupancy + ?Sized)) -> bool {
    board.color_at(target) != Some(color)
}

/// Sliding pieces: walk each direction until the edge or the first occupied
/// square, which is included only when it holds an enemy piece.
fn slide<B: Occupancy + ?Sized>(
    color: Color,
    from: Coord,
    board: &B,
    directions: &[(isize, isize)],
) -> Vec<Coord> {
    let mut destinations = Vec::new();
    for &(dr, dc) in directions {
        let mut current = from;
        while let Some(next) = current.offset(dr, dc) {
            match board.color_at(next) {
                None => destinations.push(next),
                Some(occupant) => {
                    if occupant != color {
                        destinations.push(next);
                    }
                    break;
                }
            }
            current = next;
        }
    }
    destinations
}

/// Fixed-offset pieces (King, Knight).
fn step<B: Occupancy + ?Sized>(
    color: Color,
    from: Coord,
    board: &B,
    offsets: &[(isize, isize)],
) -> Vec<Coord> {
    offsets
        .iter()
        .filter_map(|&(dr, dc)| from.offset(dr, dc))
        .filter(|&target| is_open_to(color, target, board))
        .collect()
}

/// One step forward onto an empty square, or one step diagonally forward
/// onto an enemy piece. No double step, promotion or en passant.
fn pawn<B: Occupancy + ?Sized>(color: Color, from: Coord, board: &B) -> Vec<Coord> {
    let forward = color.forward();
    let mut destinations = Vec::with_capacity(3);

    if let Some(ahead) = from.offset(forward, 0) {
        if board.color_at(ahead).is_none() {
            destinations.push(ahead);
        }
    }
    for dc in [-1, 1] {
        if let Some(target) = from.offset(forward, dc) {
            if board.color_at(target) == Some(color.opponent()) {
                destinations.push(target);
            }
        }
    }
    destinations
}

/// A piece on the board. Type, color and starting square never change;
/// only the current coordinate moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    kind: PieceType,
    color: Color,
    pub(crate) coord: Coord,
    origin: Coord,
}

impl Piece {
    pub fn new(kind: PieceType, color: Color, coord: Coord) -> Self {
        Self {
            kind,
            color,
            coord,
            origin: coord,
        }
    }

    pub fn kind(&self) -> PieceType {
        self.kind
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn coord(&self) -> Coord {
        self.coord
    }

    /// Square the piece was set up on. Kept for variant rules such as a pawn
    /// double step; the standard rules never read it.
    pub fn origin(&self) -> Coord {
        self.origin
    }

    pub fn destinations<B: Occupancy + ?Sized>(&self, board: &B) -> Vec<Coord> {
        self.kind.destinations(self.color, self.coord, board)
    }

    pub fn cannot_check(&self, king: Coord) -> bool {
        self.kind.cannot_check(self.color, self.coord, king)
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.color.prefix(), self.kind.symbol())
    }
}
