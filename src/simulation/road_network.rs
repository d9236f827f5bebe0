//! Road network graph for routing
//!
//! Roads are stored in insertion order and addressed by [`RoadId`]. Roads
//! with a known origin also become edges of a petgraph digraph whose nodes
//! are intersections; routing runs over that graph.

use log::debug;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet, VecDeque};

use super::error::ConfigError;
use super::types::{GridCoord, IntersectionId, RoadId, SimRoad};

/// Edge data for the road network graph
#[derive(Debug, Clone, Copy)]
pub struct RoadEdge {
    pub road_id: RoadId,
}

#[derive(Default)]
pub struct SimRoadNetwork {
    /// Directed graph of intersections connected by roads with a known origin
    graph: DiGraph<IntersectionId, RoadEdge>,

    /// Maps intersection IDs to their node indices in the graph
    intersection_to_node: HashMap<IntersectionId, NodeIndex>,

    /// Grid nodes by coordinate
    coord_to_intersection: HashMap<GridCoord, IntersectionId>,

    /// Grid coordinate of every grid node
    intersection_coords: HashMap<IntersectionId, GridCoord>,

    /// Rows and columns of the grid the network was generated from
    grid_size: Option<(usize, usize)>,

    /// Cached BFS results, cleared whenever the graph changes
    route_cache: HashMap<(GridCoord, GridCoord), Option<Vec<RoadId>>>,

    /// All roads, indexed by `RoadId`
    roads: Vec<SimRoad>,
}

impl SimRoadNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an intersection node, optionally anchored to a grid cell
    pub fn add_intersection(&mut self, intersection_id: IntersectionId, coord: Option<GridCoord>) {
        if self.contains_intersection(intersection_id) {
            return;
        }

        let node_index = self.graph.add_node(intersection_id);
        self.intersection_to_node.insert(intersection_id, node_index);
        if let Some(coord) = coord {
            self.coord_to_intersection.insert(coord, intersection_id);
            self.intersection_coords.insert(intersection_id, coord);
        }
        self.route_cache.clear();
    }

    pub fn contains_intersection(&self, intersection_id: IntersectionId) -> bool {
        self.intersection_to_node.contains_key(&intersection_id)
    }

    /// The handle the next added road must carry
    pub fn next_road_id(&self) -> RoadId {
        RoadId(self.roads.len())
    }

    /// Adds a road and, if it has an origin, the matching graph edge
    pub fn add_road(&mut self, road: SimRoad) -> Result<RoadId, ConfigError> {
        if road.id != self.next_road_id() {
            return Err(ConfigError::UnknownRoad(road.id));
        }
        let end_node = *self
            .intersection_to_node
            .get(&road.destination)
            .ok_or(ConfigError::UnknownIntersection(road.destination))?;

        if let Some(origin) = road.origin {
            let start_node = *self
                .intersection_to_node
                .get(&origin)
                .ok_or(ConfigError::UnknownIntersection(origin))?;
            self.graph
                .add_edge(start_node, end_node, RoadEdge { road_id: road.id });
            self.route_cache.clear();
        }

        let id = road.id;
        self.roads.push(road);
        Ok(id)
    }

    pub fn get_road(&self, road_id: RoadId) -> Option<&SimRoad> {
        self.roads.get(road_id.0)
    }

    pub fn road(&self, road_id: RoadId) -> Result<&SimRoad, ConfigError> {
        self.get_road(road_id).ok_or(ConfigError::UnknownRoad(road_id))
    }

    /// All roads in insertion order
    pub fn roads(&self) -> &[SimRoad] {
        &self.roads
    }

    pub fn intersection_at(&self, coord: GridCoord) -> Option<IntersectionId> {
        self.coord_to_intersection.get(&coord).copied()
    }

    pub fn coord_of(&self, intersection_id: IntersectionId) -> Option<GridCoord> {
        self.intersection_coords.get(&intersection_id).copied()
    }

    pub fn set_grid_size(&mut self, rows: usize, cols: usize) {
        self.grid_size = Some((rows, cols));
    }

    pub fn grid_size(&self) -> Option<(usize, usize)> {
        self.grid_size
    }

    /// Whether the intersection sits on the outer edge of the grid
    ///
    /// Intersections without grid coordinates are never border tiles.
    pub fn is_border(&self, intersection_id: IntersectionId) -> bool {
        match (self.grid_size, self.coord_of(intersection_id)) {
            (Some((rows, cols)), Some(coord)) => {
                coord.row == 0 || coord.col == 0 || coord.row + 1 == rows || coord.col + 1 == cols
            }
            _ => false,
        }
    }

    /// Roads leaving an intersection, in insertion order
    pub fn departing_roads(&self, intersection_id: IntersectionId) -> Vec<RoadId> {
        let Some(node) = self.intersection_to_node.get(&intersection_id) else {
            return Vec::new();
        };
        let mut roads: Vec<RoadId> = self
            .graph
            .edges(*node)
            .map(|edge| edge.weight().road_id)
            .collect();
        // petgraph yields the most recently added edge first
        roads.sort();
        roads
    }

    /// Finds the road connecting two intersections
    pub fn find_road_between(
        &self,
        from_intersection: IntersectionId,
        to_intersection: IntersectionId,
    ) -> Option<RoadId> {
        self.departing_roads(from_intersection)
            .into_iter()
            .find(|road_id| self.roads[road_id.0].destination == to_intersection)
    }

    /// Fewest-edges route between two grid coordinates
    ///
    /// Returns `Ok(None)` when the goal is unreachable, `Ok(Some(vec![]))`
    /// when start and goal coincide, and an error if either coordinate is not
    /// a network node.
    pub fn bfs_route(
        &mut self,
        start: GridCoord,
        goal: GridCoord,
    ) -> Result<Option<Vec<RoadId>>, ConfigError> {
        let start_id = self
            .intersection_at(start)
            .ok_or(ConfigError::UnknownCoordinate(start))?;
        let goal_id = self
            .intersection_at(goal)
            .ok_or(ConfigError::UnknownCoordinate(goal))?;

        if let Some(cached) = self.route_cache.get(&(start, goal)) {
            return Ok(cached.clone());
        }

        let route = self.bfs_between(start_id, goal_id);
        if route.is_none() {
            debug!("no route from {} to {}", start, goal);
        }
        self.route_cache.insert((start, goal), route.clone());
        Ok(route)
    }

    fn bfs_between(&self, start: IntersectionId, goal: IntersectionId) -> Option<Vec<RoadId>> {
        if start == goal {
            return Some(Vec::new());
        }

        let mut previous: HashMap<IntersectionId, (IntersectionId, RoadId)> = HashMap::new();
        let mut seen: HashSet<IntersectionId> = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            if current == goal {
                break;
            }
            for road_id in self.departing_roads(current) {
                let next = self.roads[road_id.0].destination;
                if seen.insert(next) {
                    previous.insert(next, (current, road_id));
                    queue.push_back(next);
                }
            }
        }

        let mut route = Vec::new();
        let mut cursor = goal;
        while cursor != start {
            let (prev, road_id) = previous.get(&cursor)?;
            route.push(*road_id);
            cursor = *prev;
        }
        route.reverse();
        Some(route)
    }

    /// Get number of roads
    pub fn road_count(&self) -> usize {
        self.roads.len()
    }

    /// Get number of intersections
    pub fn intersection_count(&self) -> usize {
        self.intersection_to_node.len()
    }
}
