//! Position/board engine.
//!
//! A [`Position`] owns the grid, the side to move, an authoritative piece
//! store and a cached king square per color. Grid cells hold indices into the
//! store; the per-color piece lists are derived from the store in insertion
//! order, so a capture only has to clear one slot to stay consistent.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{MicroChessError, Result};
use crate::piece::{Color, Coord, Occupancy, Piece, PieceType, COLS, ROWS};

/// Starting layout: Black on rows 0-1, White on rows 3-4, White to move.
pub const INITIAL_LAYOUT: [(Color, PieceType, Coord); 10] = [
    (Color::Black, PieceType::King, Coord::new(0, 0)),
    (Color::Black, PieceType::Knight, Coord::new(0, 1)),
    (Color::Black, PieceType::Bishop, Coord::new(0, 2)),
    (Color::Black, PieceType::Rook, Coord::new(0, 3)),
    (Color::Black, PieceType::Pawn, Coord::new(1, 0)),
    (Color::White, PieceType::Rook, Coord::new(4, 0)),
    (Color::White, PieceType::Bishop, Coord::new(4, 1)),
    (Color::White, PieceType::Knight, Coord::new(4, 2)),
    (Color::White, PieceType::King, Coord::new(4, 3)),
    (Color::White, PieceType::Pawn, Coord::new(3, 3)),
];

/// An (origin, destination) pair. Legality is a property of a move together
/// with the position it is played in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Coord,
    pub to: Coord,
}

impl Move {
    pub const fn new(from: Coord, to: Coord) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Terminal-state query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Winner(Color),
    Draw,
    Ongoing,
}

impl Outcome {
    pub fn is_decided(self) -> bool {
        !matches!(self, Outcome::Ongoing)
    }
}

type Grid = [[Option<u8>; COLS]; ROWS];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    cells: Grid,
    /// Captured pieces leave a `None` behind so indices stay stable.
    pieces: Vec<Option<Piece>>,
    turn: Color,
    kings: [Coord; 2],
}

impl Position {
    /// The canonical starting position.
    pub fn initial() -> Self {
        // INITIAL_LAYOUT is a fixed table with one king per color on distinct squares.
        Self::build(Color::White, &INITIAL_LAYOUT)
            .unwrap_or_else(|err| unreachable!("starting layout is invalid: {err}"))
    }

    /// Set up an arbitrary position, e.g. an endgame fixture.
    ///
    /// Pieces are stored in row-major board order regardless of the order of
    /// `placements`, exactly as for the starting position. Fails unless every
    /// square is on the board, no square is used twice and each color has
    /// exactly one King.
    pub fn from_placements(turn: Color, placements: &[(Color, PieceType, Coord)]) -> Result<Self> {
        Self::build(turn, placements)
    }

    fn build(turn: Color, placements: &[(Color, PieceType, Coord)]) -> Result<Self> {
        let mut layout = [[None; COLS]; ROWS];
        for &(color, kind, coord) in placements {
            if !coord.in_bounds() {
                return Err(MicroChessError::invalid_config(
                    "placements",
                    format!("{coord} is off the {ROWS}x{COLS} board"),
                ));
            }
            if layout[coord.row][coord.col].is_some() {
                return Err(MicroChessError::invalid_config(
                    "placements",
                    format!("{coord} is occupied twice"),
                ));
            }
            layout[coord.row][coord.col] = Some((color, kind));
        }

        let mut cells: Grid = [[None; COLS]; ROWS];
        let mut pieces = Vec::with_capacity(placements.len());
        let mut kings: [Option<Coord>; 2] = [None, None];

        for (row, line) in layout.iter().enumerate() {
            for (col, cell) in line.iter().enumerate() {
                let Some((color, kind)) = *cell else {
                    continue;
                };
                let coord = Coord::new(row, col);
                if kind == PieceType::King {
                    if kings[color.index()].is_some() {
                        return Err(MicroChessError::invalid_config(
                            "placements",
                            format!("{color:?} has more than one King"),
                        ));
                    }
                    kings[color.index()] = Some(coord);
                }
                cells[row][col] = Some(pieces.len() as u8);
                pieces.push(Some(Piece::new(kind, color, coord)));
            }
        }

        let king_of = |color: Color| {
            kings[color.index()].ok_or_else(|| {
                MicroChessError::invalid_config("placements", format!("{color:?} has no King"))
            })
        };
        let kings = [king_of(Color::Black)?, king_of(Color::White)?];

        let position = Self {
            cells,
            pieces,
            turn,
            kings,
        };
        // The side that just moved can never be left in check.
        if position.is_in_check(turn.opponent()) {
            return Err(MicroChessError::invalid_config(
                "placements",
                format!("{:?} is in check but {turn:?} is to move", turn.opponent()),
            ));
        }
        Ok(position)
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn piece_at(&self, coord: Coord) -> Option<&Piece> {
        if !coord.in_bounds() {
            return None;
        }
        self.cells[coord.row][coord.col].and_then(|id| self.pieces[id as usize].as_ref())
    }

    /// Live pieces of `color` in setup order.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = &Piece> + '_ {
        self.live_pieces(color).map(|(_, piece)| piece)
    }

    pub fn piece_count(&self, color: Color) -> usize {
        self.pieces(color).count()
    }

    /// Cached square of `color`'s King.
    pub fn king(&self, color: Color) -> Coord {
        self.kings[color.index()]
    }

    fn live_pieces(&self, color: Color) -> impl Iterator<Item = (usize, &Piece)> + '_ {
        self.pieces
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|piece| (id, piece)))
            .filter(move |(_, piece)| piece.color() == color)
    }

    /// Every move of the side to move that does not leave its own King in
    /// check. Order: pieces in setup order, then each piece's destination order.
    pub fn legal_moves_for_mover(&self) -> Vec<Move> {
        let mut scratch = self.clone();
        let mut moves = Vec::new();
        for (id, piece) in self.live_pieces(self.turn) {
            for to in piece.destinations(self) {
                if !scratch.exposes_king(id, to) {
                    moves.push(Move::new(piece.coord(), to));
                }
            }
        }
        moves
    }

    /// Whether any opposing piece attacks `color`'s King.
    pub fn is_in_check(&self, color: Color) -> bool {
        let king = self.king(color);
        self.live_pieces(color.opponent())
            // A piece whose cell was overwritten by a simulated capture no longer attacks.
            .filter(|(id, piece)| self.cells[piece.coord().row][piece.coord().col] == Some(*id as u8))
            .filter(|(_, piece)| !piece.cannot_check(king))
            .any(|(_, piece)| piece.destinations(self).contains(&king))
    }

    /// [`Position::is_in_check`] for a raw color index, as handed over by
    /// callers that store colors as integers.
    pub fn is_in_check_by_index(&self, color: usize) -> Result<bool> {
        Ok(self.is_in_check(Color::try_from(color)?))
    }

    /// Whether playing `mv` would leave the moving piece's own King in check.
    ///
    /// The move is played on this position and undone again before
    /// returning; the position is left exactly as it was.
    pub fn would_be_check(&mut self, mv: Move) -> Result<bool> {
        let id = self.occupant_id(mv.from)?;
        Self::check_on_board(mv.to)?;
        Ok(self.exposes_king(id, mv.to))
    }

    fn check_on_board(to: Coord) -> Result<()> {
        if to.in_bounds() {
            Ok(())
        } else {
            Err(MicroChessError::invalid_config(
                "move",
                format!("destination {to} is off the board"),
            ))
        }
    }

    fn occupant_id(&self, origin: Coord) -> Result<usize> {
        if !origin.in_bounds() {
            return Err(MicroChessError::EmptyOrigin { origin });
        }
        match self.cells[origin.row][origin.col] {
            Some(id) if self.pieces[id as usize].is_some() => Ok(id as usize),
            _ => Err(MicroChessError::EmptyOrigin { origin }),
        }
    }

    fn exposes_king(&mut self, id: usize, to: Coord) -> bool {
        let Some(piece) = self.pieces[id] else {
            return false;
        };
        let from = piece.coord();
        let color = piece.color();
        let saved_from = self.cells[from.row][from.col];
        let saved_to = self.cells[to.row][to.col];
        let saved_king = self.kings[color.index()];

        self.place(id, to);
        self.cells[from.row][from.col] = None;
        if piece.kind() == PieceType::King {
            self.kings[color.index()] = to;
        }

        let in_check = self.is_in_check(color);

        self.cells[from.row][from.col] = saved_from;
        self.cells[to.row][to.col] = saved_to;
        if let Some(moved) = self.pieces[id].as_mut() {
            moved.coord = from;
        }
        self.kings[color.index()] = saved_king;

        in_check
    }

    fn place(&mut self, id: usize, to: Coord) {
        self.cells[to.row][to.col] = Some(id as u8);
        if let Some(piece) = self.pieces[id].as_mut() {
            piece.coord = to;
        }
    }

    /// True iff the side to move has no legal move. Stalemate is not told
    /// apart from checkmate.
    pub fn is_checkmate(&self) -> bool {
        self.legal_moves_for_mover().is_empty()
    }

    pub fn winner(&self) -> Outcome {
        self.outcome_with(&self.legal_moves_for_mover())
    }

    /// [`Position::winner`] for callers that already generated the legal moves.
    pub(crate) fn outcome_with(&self, legal_moves: &[Move]) -> Outcome {
        if legal_moves.is_empty() {
            return Outcome::Winner(self.turn.opponent());
        }
        if self.piece_count(Color::Black) == 1 && self.piece_count(Color::White) == 1 {
            return Outcome::Draw;
        }
        Outcome::Ongoing
    }

    /// Play `mv` in place: remove any captured piece, relocate the mover,
    /// update the King cache and hand the turn over. Nothing changes when the
    /// move fails, including when it lands on a friendly piece or a King.
    pub fn apply_move(&mut self, mv: Move) -> Result<()> {
        let id = self.occupant_id(mv.from)?;
        let Some(piece) = self.pieces[id] else {
            return Err(MicroChessError::EmptyOrigin { origin: mv.from });
        };
        if piece.color() != self.turn {
            return Err(MicroChessError::WrongMover {
                origin: mv.from,
                expected: self.turn,
                found: piece.color(),
            });
        }
        Self::check_on_board(mv.to)?;

        let captured = self.cells[mv.to.row][mv.to.col]
            .and_then(|target| self.pieces[target as usize].map(|victim| (target, victim)));
        if let Some((target, victim)) = captured {
            if victim.color() == piece.color() || victim.kind() == PieceType::King {
                return Err(MicroChessError::IllegalCapture { target: mv.to });
            }
            self.pieces[target as usize] = None;
        }
        self.place(id, mv.to);
        self.cells[mv.from.row][mv.from.col] = None;
        if piece.kind() == PieceType::King {
            self.kings[piece.color().index()] = mv.to;
        }
        self.turn = self.turn.opponent();

        debug_assert!(self.is_consistent(), "position diverged after {mv}");
        Ok(())
    }

    /// Copy this position and play `mv` on the copy; `self` is untouched.
    pub fn simulate_move(&self, mv: Move) -> Result<Position> {
        let mut next = self.clone();
        next.apply_move(mv)?;
        Ok(next)
    }

    /// Structural invariants: every occupied cell points at a live piece
    /// standing on that cell, every live piece is on its cell, each color has
    /// exactly one King and the King cache matches it.
    pub fn is_consistent(&self) -> bool {
        for (row, line) in self.cells.iter().enumerate() {
            for (col, cell) in line.iter().enumerate() {
                if let Some(id) = cell {
                    match self.pieces.get(*id as usize).copied().flatten() {
                        Some(piece) if piece.coord() == Coord::new(row, col) => {}
                        _ => return false,
                    }
                }
            }
        }
        for (id, slot) in self.pieces.iter().enumerate() {
            if let Some(piece) = slot {
                let at = piece.coord();
                if self.cells[at.row][at.col] != Some(id as u8) {
                    return false;
                }
            }
        }
        Color::ALL.iter().all(|&color| {
            let mut kings = self
                .pieces(color)
                .filter(|piece| piece.kind() == PieceType::King);
            match (kings.next(), kings.next()) {
                (Some(king), None) => king.coord() == self.king(color),
                _ => false,
            }
        })
    }
}

impl Occupancy for Position {
    fn color_at(&self, coord: Coord) -> Option<Color> {
        self.piece_at(coord).map(Piece::color)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..ROWS {
            for col in 0..COLS {
                match self.piece_at(Coord::new(row, col)) {
                    Some(piece) => write!(f, " {piece} ")?,
                    None => write!(f, " () ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
