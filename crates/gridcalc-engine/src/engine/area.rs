//! Rectangular selections.
//!
//! - [`Area`] is normalized: `top <= bottom` and `left <= right`.
//! - [`Zone`] is a raw drag selection whose corners may come in any order.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::address::{AddressParts, Point, parse_address, point_to_address};

#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub top: usize,
    pub left: usize,
    pub bottom: usize,
    pub right: usize,
}

#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub start_y: usize,
    pub start_x: usize,
    pub end_y: usize,
    pub end_x: usize,
}

impl Area {
    pub fn new(top: usize, left: usize, bottom: usize, right: usize) -> Area {
        zone_to_area(Zone {
            start_y: top,
            start_x: left,
            end_y: bottom,
            end_x: right,
        })
    }

    /// A 1x1 area covering `point`.
    pub fn point(point: Point) -> Area {
        Area {
            top: point.y,
            left: point.x,
            bottom: point.y,
            right: point.x,
        }
    }

    pub fn height(&self) -> usize {
        self.bottom - self.top + 1
    }

    pub fn width(&self) -> usize {
        self.right - self.left + 1
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.top, self.left)
    }

    pub fn contains(&self, point: Point) -> bool {
        (self.top..=self.bottom).contains(&point.y) && (self.left..=self.right).contains(&point.x)
    }

    /// Clip to `bounds`; None when the two do not overlap.
    pub fn clip(&self, bounds: &Area) -> Option<Area> {
        let top = self.top.max(bounds.top);
        let left = self.left.max(bounds.left);
        let bottom = self.bottom.min(bounds.bottom);
        let right = self.right.min(bounds.right);
        if top > bottom || left > right {
            return None;
        }
        Some(Area {
            top,
            left,
            bottom,
            right,
        })
    }

    /// Points in row-major order.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        (self.top..=self.bottom)
            .flat_map(move |y| (self.left..=self.right).map(move |x| Point::new(y, x)))
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&area_to_range(self))
    }
}

/// Normalize a zone. Total: every zone has exactly one area.
pub fn zone_to_area(zone: Zone) -> Area {
    Area {
        top: zone.start_y.min(zone.end_y),
        left: zone.start_x.min(zone.end_x),
        bottom: zone.start_y.max(zone.end_y),
        right: zone.start_x.max(zone.end_x),
    }
}

pub fn area_to_zone(area: Area) -> Zone {
    Zone {
        start_y: area.top,
        start_x: area.left,
        end_y: area.bottom,
        end_x: area.right,
    }
}

/// `(height, width)` of an area.
pub fn area_shape(area: &Area) -> (usize, usize) {
    (area.height(), area.width())
}

/// Render an area as `"A1:B3"`, or `"A1"` when it covers one cell.
pub fn area_to_range(area: &Area) -> String {
    let start = point_to_address(area.top_left());
    if area.top == area.bottom && area.left == area.right {
        return start;
    }
    format!(
        "{}:{}",
        start,
        point_to_address(Point::new(area.bottom, area.right))
    )
}

/// Split a range like `"A1:B5"`, `"A:C"` or `"$2:4"` into its two ends.
pub fn parse_range(range: &str) -> Option<(AddressParts, AddressParts)> {
    let (start, end) = range.split_once(':')?;
    Some((parse_address(start)?, parse_address(end)?))
}

/// Resolve a range against `bounds`, completing omitted axes (`A:A` spans
/// every row) and clipping to the table. None if nothing remains.
pub fn range_to_area(range: &str, bounds: &Area) -> Option<Area> {
    let (start, end) = parse_range(range)?;
    let start_y = if start.has_row() { start.point.y } else { bounds.top };
    let start_x = if start.has_col() { start.point.x } else { bounds.left };
    let end_y = if end.has_row() { end.point.y } else { bounds.bottom };
    let end_x = if end.has_col() { end.point.x } else { bounds.right };
    zone_to_area(Zone {
        start_y,
        start_x,
        end_y,
        end_x,
    })
    .clip(bounds)
}
