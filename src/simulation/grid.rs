//! Road network generation from a character grid
//!
//! Every non-blank cell becomes an intersection and every pair of 4-adjacent
//! cells is joined by two directed roads, one per direction.

use log::info;

use super::config::SimConfig;
use super::error::ConfigError;
use super::policy::PolicyKind;
use super::types::{Direction, GridCoord, SimRoad};
use super::world::SimWorld;

/// North, south, west, east
const NEIGHBOR_OFFSETS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// A blank cell means "no road"
pub fn is_road(cell: char) -> bool {
    cell != ' '
}

/// Validated grid description, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    cells: Vec<Vec<char>>,
    cols: usize,
}

impl TileGrid {
    pub fn parse(rows: &[&str]) -> Result<Self, ConfigError> {
        let cells: Vec<Vec<char>> = rows.iter().map(|row| row.chars().collect()).collect();
        let cols = cells.first().map(Vec::len).unwrap_or(0);
        if cells.is_empty() || cols == 0 {
            return Err(ConfigError::InvalidGrid("grid must have at least one cell"));
        }
        if cells.iter().any(|row| row.len() != cols) {
            return Err(ConfigError::InvalidGrid("grid rows must all have the same width"));
        }
        if !cells.iter().flatten().any(|cell| is_road(*cell)) {
            return Err(ConfigError::InvalidGrid("grid contains no road tiles"));
        }
        Ok(Self { cells, cols })
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_road_at(&self, coord: GridCoord) -> bool {
        self.cells
            .get(coord.row)
            .and_then(|row| row.get(coord.col))
            .is_some_and(|cell| is_road(*cell))
    }

    /// Road tiles in row-major order
    pub fn road_tiles(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.rows())
            .flat_map(move |row| (0..self.cols).map(move |col| GridCoord::new(row, col)))
            .filter(|coord| self.is_road_at(*coord))
    }

    /// Road tiles 4-adjacent to `coord`, in N, S, W, E order
    pub fn neighbors(&self, coord: GridCoord) -> impl Iterator<Item = GridCoord> + '_ {
        NEIGHBOR_OFFSETS.iter().filter_map(move |(dr, dc)| {
            let row = coord.row.checked_add_signed(*dr)?;
            let col = coord.col.checked_add_signed(*dc)?;
            let next = GridCoord::new(row, col);
            self.is_road_at(next).then_some(next)
        })
    }
}

/// Signal phase shift of the intersection at `coord`
pub fn phase_offset_for(coord: GridCoord, step: f32) -> f32 {
    (coord.row + coord.col) as f32 * step
}

/// Build a world whose network mirrors the grid description
///
/// Every intersection gets its own `policy` instance.
pub fn build_grid_world(
    rows: &[&str],
    config: SimConfig,
    policy: PolicyKind,
) -> Result<SimWorld, ConfigError> {
    let grid = TileGrid::parse(rows)?;
    let tile_length = config.tile_length_m;
    let tile_speed = config.tile_speed_mps;
    let offset_step = config.phase_offset_step_s;

    let mut world = SimWorld::with_config(config)?;
    world.road_network.set_grid_size(grid.rows(), grid.cols());

    for coord in grid.road_tiles() {
        world.add_grid_intersection(
            format!("I{}_{}", coord.row, coord.col),
            policy.build(),
            coord,
            phase_offset_for(coord, offset_step),
        );
    }

    for from in grid.road_tiles() {
        for to in grid.neighbors(from) {
            let origin = world
                .road_network
                .intersection_at(from)
                .ok_or(ConfigError::UnknownCoordinate(from))?;
            let destination = world
                .road_network
                .intersection_at(to)
                .ok_or(ConfigError::UnknownCoordinate(to))?;
            let approach = if from.row == to.row {
                Direction::EW
            } else {
                Direction::NS
            };
            let road = SimRoad::new(
                world.next_road_id(),
                format!("R{}_{}_to_{}_{}", from.row, from.col, to.row, to.col),
                tile_length,
                tile_speed,
                approach,
                destination,
            )
            .with_topology(origin, from, to);
            world.add_road(road)?;
        }
    }

    info!(
        "built grid network: {} intersections, {} roads",
        world.road_network.intersection_count(),
        world.road_network.road_count()
    );
    Ok(world)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::types::IntersectionId;

    const PLUS: [&str; 3] = [" + ", "+++", " + "];

    #[test]
    fn test_every_road_tile_becomes_intersection() {
        let world = build_grid_world(&PLUS, SimConfig::default(), PolicyKind::Fixed).unwrap();
        assert_eq!(world.intersections().len(), 5);
        // 4 adjacencies, two directed roads each
        assert_eq!(world.roads().len(), 8);
        assert_eq!(world.intersections()[0].name, "I0_1");
    }

    #[test]
    fn test_approach_follows_axis() {
        let world = build_grid_world(&["++", "+ "], SimConfig::default(), PolicyKind::Fixed).unwrap();
        for road in world.roads() {
            let (from, to) = (road.from_tile.unwrap(), road.to_tile.unwrap());
            let expected = if from.row == to.row { Direction::EW } else { Direction::NS };
            assert_eq!(road.approach, expected, "{}", road.name);
            assert_eq!(road.length, 8.0);
            assert_eq!(road.screen_points.len(), 2);
        }
    }

    #[test]
    fn test_phase_offsets_desynchronize_signals() {
        let world = build_grid_world(&PLUS, SimConfig::default(), PolicyKind::Fixed).unwrap();
        let offsets: Vec<f32> = world.intersections().iter().map(|i| i.phase_offset).collect();
        assert_eq!(offsets, vec![2.0, 2.0, 4.0, 6.0, 6.0]);
    }

    #[test]
    fn test_route_across_grid_uses_fewest_roads() {
        let mut world = build_grid_world(
            &["+++", "+ +", "+++"],
            SimConfig::default(),
            PolicyKind::Fixed,
        )
        .unwrap();
        let route = world
            .road_network
            .bfs_route(GridCoord::new(0, 0), GridCoord::new(2, 2))
            .unwrap()
            .unwrap();
        assert_eq!(route.len(), 4);

        let first = world.road_network.get_road(route[0]).unwrap();
        assert_eq!(first.from_tile, Some(GridCoord::new(0, 0)));
        let last = world.road_network.get_road(route[3]).unwrap();
        assert_eq!(last.to_tile, Some(GridCoord::new(2, 2)));
        // consecutive roads share a node
        for pair in route.windows(2) {
            let a = world.road_network.get_road(pair[0]).unwrap();
            let b = world.road_network.get_road(pair[1]).unwrap();
            assert_eq!(Some(a.destination), b.origin);
        }
    }

    #[test]
    fn test_disconnected_islands_have_no_route() {
        let mut world = build_grid_world(&["+ +"], SimConfig::default(), PolicyKind::Fixed).unwrap();
        assert_eq!(
            world
                .road_network
                .bfs_route(GridCoord::new(0, 0), GridCoord::new(0, 2))
                .unwrap(),
            None
        );
        assert_eq!(world.road_network.intersection_at(GridCoord::new(0, 2)), Some(IntersectionId(1)));
    }

    #[test]
    fn test_invalid_grids_rejected() {
        let config = SimConfig::default;
        assert!(build_grid_world(&[], config(), PolicyKind::Fixed).is_err());
        assert!(build_grid_world(&["++", "+"], config(), PolicyKind::Fixed).is_err());
        assert!(build_grid_world(&["   "], config(), PolicyKind::Fixed).is_err());
    }
}
