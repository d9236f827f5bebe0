//! Text snapshot of the world, one line per approach direction
//!
//! ```text
//! NS:.......C.............C....
//! EW:..C.......................
//! X1 NS GREEN | entered=3 exited=1 avg_travel_time_s=12.00
//! ```

use super::metrics::RunSummary;
use super::types::Direction;
use super::world::SimWorld;

/// Characters per road line
pub const ASCII_WIDTH: usize = 60;

/// Cell index of a vehicle on a line of `width` cells
fn cell_for(progress: f32, width: usize) -> usize {
    let last = width.saturating_sub(1);
    ((progress * last as f32) as usize).min(last)
}

/// Draw every unfinished vehicle as `C` on its approach line
pub fn draw(world: &SimWorld, width: usize) -> String {
    let width = width.max(1);
    let mut lines = [vec!['.'; width], vec!['.'; width]];

    for vehicle in world.vehicles().iter().filter(|v| !v.finished) {
        let Some(road) = world.road_network.get_road(vehicle.road) else {
            continue;
        };
        let line = match road.approach {
            Direction::NS => &mut lines[0],
            Direction::EW => &mut lines[1],
        };
        line[cell_for(road.progress(vehicle.position), width)] = 'C';
    }

    Direction::ALL
        .iter()
        .zip(lines.iter())
        .map(|(direction, line)| format!("{}:{}", direction, line.iter().collect::<String>()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Frame for the driver's render callback: road lines, signals, running totals
pub fn render(world: &SimWorld, summary: &RunSummary) -> Option<String> {
    let signals = world
        .intersections()
        .iter()
        .map(|i| format!("{} {} {}", i.name, i.light.direction(), i.light.color()))
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!("{}\n{} | {}", draw(world, ASCII_WIDTH), signals, summary))
}
