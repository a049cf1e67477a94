//! Grid classification, coordinate transforms, and the fixed waypoint route.

use glam::Vec2;
use rampart_core::CellCoord;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_GRID_SIZE: u32 = 20;
const DEFAULT_CELL_SIZE: f32 = 2.0;

/// Classification of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GridCell {
    /// Buildable ground.
    Empty,
    /// Part of the enemy route.
    Path,
    /// Occupied by a tower.
    Tower,
    /// First cell of the route where enemies spawn.
    Start,
    /// Last cell of the route that enemies try to reach.
    End,
    /// Scenery that can never be built on.
    Decoration,
}

/// Author-defined description of a map.
///
/// The route is described by its turn points. Consecutive turn points must
/// share a row or a column and are joined by a straight run of cells.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapLayout {
    /// Number of cells along each edge of the square grid.
    pub size: u32,
    /// Edge length of a single cell in world units.
    pub cell_size: f32,
    /// Ordered turn points of the route, from start to end.
    pub turn_points: Vec<CellCoord>,
    /// Cells that hold scenery.
    pub decorations: Vec<CellCoord>,
}

impl Default for MapLayout {
    fn default() -> Self {
        Self {
            size: DEFAULT_GRID_SIZE,
            cell_size: DEFAULT_CELL_SIZE,
            turn_points: vec![
                CellCoord::new(0, 2),
                CellCoord::new(16, 2),
                CellCoord::new(16, 7),
                CellCoord::new(3, 7),
                CellCoord::new(3, 12),
                CellCoord::new(16, 12),
                CellCoord::new(16, 17),
                CellCoord::new(19, 17),
            ],
            decorations: vec![
                CellCoord::new(5, 4),
                CellCoord::new(10, 4),
                CellCoord::new(9, 9),
                CellCoord::new(12, 15),
                CellCoord::new(1, 18),
            ],
        }
    }
}

impl MapLayout {
    /// Checks the layout and returns the cell-by-cell route it describes.
    pub fn validate(&self) -> Result<Vec<CellCoord>, LayoutError> {
        if self.size == 0 {
            return Err(LayoutError::EmptyGrid);
        }

        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(LayoutError::InvalidCellSize(self.cell_size));
        }

        if let Some(cell) = self
            .turn_points
            .iter()
            .find(|cell| !within(**cell, self.size))
        {
            return Err(LayoutError::TurnPointOutOfBounds(*cell));
        }

        if let Some(pair) = self.turn_points.windows(2).find(|pair| {
            pair[0].column() != pair[1].column() && pair[0].row() != pair[1].row()
        }) {
            return Err(LayoutError::TurnPointNotAligned(pair[0], pair[1]));
        }

        let route = walk_route(&self.turn_points);
        if route.len() < 2 {
            return Err(LayoutError::RouteTooShort);
        }

        for decoration in &self.decorations {
            if !within(*decoration, self.size) {
                return Err(LayoutError::DecorationOutOfBounds(*decoration));
            }
            if route.contains(decoration) {
                return Err(LayoutError::DecorationOnRoute(*decoration));
            }
        }

        Ok(route)
    }
}

/// Reasons a [`MapLayout`] cannot be turned into a grid.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum LayoutError {
    /// The grid has no cells.
    #[error("grid size must be positive")]
    EmptyGrid,
    /// The cell size is zero, negative, or not finite.
    #[error("cell size {0} must be a positive finite number")]
    InvalidCellSize(f32),
    /// A route turn point lies outside the grid.
    #[error("route turn point {0:?} lies outside the grid")]
    TurnPointOutOfBounds(CellCoord),
    /// Two consecutive turn points share neither a row nor a column.
    #[error("route turn points {0:?} and {1:?} are not on a shared row or column")]
    TurnPointNotAligned(CellCoord, CellCoord),
    /// The route covers fewer than two cells.
    #[error("route must cover at least two cells")]
    RouteTooShort,
    /// A decoration lies outside the grid.
    #[error("decoration {0:?} lies outside the grid")]
    DecorationOutOfBounds(CellCoord),
    /// A decoration overlaps the route.
    #[error("decoration {0:?} overlaps the route")]
    DecorationOnRoute(CellCoord),
}

/// Square grid of classified cells plus the precomputed enemy route.
#[derive(Clone, Debug)]
pub struct GridMap {
    size: u32,
    cell_size: f32,
    cells: Vec<GridCell>,
    route: Vec<CellCoord>,
    path: Vec<Vec2>,
}

impl GridMap {
    /// Builds a grid from an author-defined layout.
    pub fn from_layout(layout: &MapLayout) -> Result<Self, LayoutError> {
        let route = layout.validate()?;
        Ok(Self::build(layout, route))
    }

    /// Builds the grid described by [`MapLayout::default`].
    pub(crate) fn standard() -> Self {
        let layout = MapLayout::default();
        let route = walk_route(&layout.turn_points);
        Self::build(&layout, route)
    }

    fn build(layout: &MapLayout, route: Vec<CellCoord>) -> Self {
        let capacity_u64 = u64::from(layout.size) * u64::from(layout.size);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        let mut grid = Self {
            size: layout.size,
            cell_size: layout.cell_size,
            cells: vec![GridCell::Empty; capacity],
            route: Vec::new(),
            path: Vec::new(),
        };

        for decoration in &layout.decorations {
            grid.set(*decoration, GridCell::Decoration);
        }

        let last = route.len().saturating_sub(1);
        for (index, cell) in route.iter().enumerate() {
            let class = if index == 0 {
                GridCell::Start
            } else if index == last {
                GridCell::End
            } else {
                GridCell::Path
            };
            grid.set(*cell, class);
        }

        grid.path = route.iter().map(|cell| grid.grid_to_world(*cell)).collect();
        grid.route = route;
        grid
    }

    /// Number of cells along each edge.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Edge length of a single cell in world units.
    #[must_use]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub fn in_bounds(&self, cell: CellCoord) -> bool {
        within(cell, self.size)
    }

    /// Classification of the cell, or `None` outside the grid.
    #[must_use]
    pub fn cell(&self, cell: CellCoord) -> Option<GridCell> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Converts a world position into the cell containing it.
    ///
    /// Positions outside the grid, including non-finite ones, yield `None`.
    #[must_use]
    pub fn world_to_grid(&self, position: Vec2) -> Option<CellCoord> {
        let column = axis_to_cell(position.x, self.cell_size, self.size)?;
        let row = axis_to_cell(position.y, self.cell_size, self.size)?;
        Some(CellCoord::new(column, row))
    }

    /// World position of the cell centre.
    #[must_use]
    pub fn grid_to_world(&self, cell: CellCoord) -> Vec2 {
        Vec2::new(
            (cell.column() as f32 + 0.5) * self.cell_size,
            (cell.row() as f32 + 0.5) * self.cell_size,
        )
    }

    /// Reports whether a tower may be built on the cell.
    #[must_use]
    pub fn can_place_tower(&self, cell: CellCoord) -> bool {
        self.cell(cell) == Some(GridCell::Empty)
    }

    /// Flips a cell between [`GridCell::Empty`] and [`GridCell::Tower`].
    ///
    /// Returns `false` without changing anything when the cell is out of
    /// bounds or not in the expected starting state.
    pub fn set_tower_placed(&mut self, cell: CellCoord, occupied: bool) -> bool {
        let (from, to) = if occupied {
            (GridCell::Empty, GridCell::Tower)
        } else {
            (GridCell::Tower, GridCell::Empty)
        };

        if self.cell(cell) != Some(from) {
            return false;
        }

        self.set(cell, to);
        true
    }

    /// World-space waypoints of the route, one per traversed cell.
    #[must_use]
    pub fn path(&self) -> &[Vec2] {
        &self.path
    }

    /// Cells traversed by the route in walking order.
    #[must_use]
    pub fn route(&self) -> &[CellCoord] {
        &self.route
    }

    fn set(&mut self, cell: CellCoord, class: GridCell) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = class;
            }
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.in_bounds(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.size).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

fn within(cell: CellCoord, size: u32) -> bool {
    cell.column() < size && cell.row() < size
}

fn axis_to_cell(value: f32, cell_size: f32, size: u32) -> Option<u32> {
    let scaled = (value / cell_size).floor();
    if !scaled.is_finite() || scaled < 0.0 || scaled >= size as f32 {
        return None;
    }
    Some(scaled as u32)
}

fn walk_route(turn_points: &[CellCoord]) -> Vec<CellCoord> {
    let mut route = Vec::new();

    if let Some(first) = turn_points.first() {
        push_distinct(&mut route, *first);
    }

    for pair in turn_points.windows(2) {
        let target = pair[1];
        let mut column = pair[0].column();
        let mut row = pair[0].row();

        while column != target.column() {
            column = step_toward(column, target.column());
            push_distinct(&mut route, CellCoord::new(column, row));
        }
        while row != target.row() {
            row = step_toward(row, target.row());
            push_distinct(&mut route, CellCoord::new(column, row));
        }
    }

    route
}

fn step_toward(current: u32, target: u32) -> u32 {
    if current < target {
        current + 1
    } else {
        current - 1
    }
}

fn push_distinct(route: &mut Vec<CellCoord>, cell: CellCoord) {
    if route.last() != Some(&cell) {
        route.push(cell);
    }
}
