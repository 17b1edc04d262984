use serde::{Deserialize, Serialize};

pub use glam::{DAffine2, DVec2};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn to_vec(self) -> DVec2 {
        DVec2::new(self.width, self.height)
    }
}

impl From<DVec2> for Dimensions {
    fn from(v: DVec2) -> Self {
        Self::new(v.x, v.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle of the given size centered on the origin
    pub fn centered(width: f64, height: f64) -> Self {
        Self::new(-width / 2.0, -height / 2.0, width, height)
    }

    pub fn from_points(points: &[DVec2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (min, max) = rest
            .iter()
            .fold((*first, *first), |(min, max), p| (min.min(*p), max.max(*p)));
        Some(Self::new(min.x, min.y, max.x - min.x, max.y - min.y))
    }

    pub fn min(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    pub fn max(&self) -> DVec2 {
        DVec2::new(self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Corners in order: top-left, top-right, bottom-right, bottom-left
    pub fn corners(&self) -> [DVec2; 4] {
        [
            DVec2::new(self.x, self.y),
            DVec2::new(self.x + self.width, self.y),
            DVec2::new(self.x + self.width, self.y + self.height),
            DVec2::new(self.x, self.y + self.height),
        ]
    }

    pub fn contains(&self, point: DVec2) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    pub fn union(&self, other: &BoundingBox) -> Self {
        let min = self.min().min(other.min());
        let max = self.max().max(other.max());
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    /// Overlap of two rectangles, `None` when they do not touch
    pub fn intersect(&self, other: &BoundingBox) -> Option<Self> {
        let min = self.min().max(other.min());
        let max = self.max().min(other.max());
        (max.x >= min.x && max.y >= min.y).then(|| Self::new(min.x, min.y, max.x - min.x, max.y - min.y))
    }

    pub fn expand(&self, margin: f64) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + margin * 2.0,
            self.height + margin * 2.0,
        )
    }

    /// Axis-aligned bounds of this rectangle after an affine transform
    pub fn transformed(&self, transform: &DAffine2) -> Self {
        let corners = self.corners().map(|c| transform.transform_point2(c));
        Self::from_points(&corners).unwrap_or(*self)
    }
}

/// The eight resize handles of the control box, in clockwise order from the
/// top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleName {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl HandleName {
    pub const ALL: [HandleName; 8] = [
        HandleName::TopLeft,
        HandleName::Top,
        HandleName::TopRight,
        HandleName::Right,
        HandleName::BottomRight,
        HandleName::Bottom,
        HandleName::BottomLeft,
        HandleName::Left,
    ];

    pub fn to_kebab_case(&self) -> &'static str {
        match self {
            HandleName::TopLeft => "top-left",
            HandleName::Top => "top",
            HandleName::TopRight => "top-right",
            HandleName::Right => "right",
            HandleName::BottomRight => "bottom-right",
            HandleName::Bottom => "bottom",
            HandleName::BottomLeft => "bottom-left",
            HandleName::Left => "left",
        }
    }

    pub fn cursor(&self) -> &'static str {
        match self {
            HandleName::TopLeft => "nw-resize",
            HandleName::Top => "n-resize",
            HandleName::TopRight => "ne-resize",
            HandleName::Right => "e-resize",
            HandleName::BottomRight => "se-resize",
            HandleName::Bottom => "s-resize",
            HandleName::BottomLeft => "sw-resize",
            HandleName::Left => "w-resize",
        }
    }

    /// Normalized position of the handle on the node rectangle
    pub fn unit_position(&self) -> DVec2 {
        match self {
            HandleName::TopLeft => DVec2::new(0.0, 0.0),
            HandleName::Top => DVec2::new(0.5, 0.0),
            HandleName::TopRight => DVec2::new(1.0, 0.0),
            HandleName::Right => DVec2::new(1.0, 0.5),
            HandleName::BottomRight => DVec2::new(1.0, 1.0),
            HandleName::Bottom => DVec2::new(0.5, 1.0),
            HandleName::BottomLeft => DVec2::new(0.0, 1.0),
            HandleName::Left => DVec2::new(0.0, 0.5),
        }
    }

    /// Anchor that stays fixed while this handle is dragged
    pub fn opposite_anchor(&self) -> DVec2 {
        match self {
            HandleName::Top => DVec2::new(0.5, 1.0),
            HandleName::Bottom => DVec2::new(0.5, 0.0),
            HandleName::Left => DVec2::new(1.0, 0.5),
            HandleName::Right => DVec2::new(0.0, 0.5),
            corner => DVec2::ONE - corner.unit_position(),
        }
    }

    /// Per-axis growth direction: -1 when dragging towards negative local
    /// coordinates grows the node, 0 when the axis is locked.
    pub fn resize_direction(&self) -> DVec2 {
        match self {
            HandleName::TopLeft => DVec2::new(-1.0, -1.0),
            HandleName::Top => DVec2::new(0.0, -1.0),
            HandleName::TopRight => DVec2::new(1.0, -1.0),
            HandleName::Right => DVec2::new(1.0, 0.0),
            HandleName::BottomRight => DVec2::new(1.0, 1.0),
            HandleName::Bottom => DVec2::new(0.0, 1.0),
            HandleName::BottomLeft => DVec2::new(-1.0, 1.0),
            HandleName::Left => DVec2::new(-1.0, 0.0),
        }
    }
}

/// Keyboard/mouse modifier keys held during an event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on Windows/Linux, Command on macOS
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveTab {
    Transform,
    Layers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_from_points() {
        let bbox = BoundingBox::from_points(&[
            DVec2::new(10.0, 5.0),
            DVec2::new(-2.0, 8.0),
            DVec2::new(4.0, -1.0),
        ])
        .unwrap();
        assert_eq!(bbox, BoundingBox::new(-2.0, -1.0, 12.0, 9.0));
        assert!(BoundingBox::from_points(&[]).is_none());
    }

    #[test]
    fn test_bounding_box_intersect() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, -5.0, 10.0, 10.0);
        assert_eq!(a.intersect(&b), Some(BoundingBox::new(5.0, 0.0, 5.0, 5.0)));
        assert_eq!(a.intersect(&BoundingBox::new(20.0, 0.0, 1.0, 1.0)), None);
    }

    #[test]
    fn test_bounding_box_transformed_by_rotation() {
        let bbox = BoundingBox::centered(100.0, 50.0);
        let rotated = bbox.transformed(&DAffine2::from_angle(std::f64::consts::FRAC_PI_2));
        assert!((rotated.width - 50.0).abs() < 1e-9);
        assert!((rotated.height - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_opposite_anchor_of_every_handle() {
        assert_eq!(HandleName::TopLeft.opposite_anchor(), DVec2::new(1.0, 1.0));
        assert_eq!(HandleName::Top.opposite_anchor(), DVec2::new(0.5, 1.0));
        assert_eq!(HandleName::TopRight.opposite_anchor(), DVec2::new(0.0, 1.0));
        assert_eq!(HandleName::Right.opposite_anchor(), DVec2::new(0.0, 0.5));
        assert_eq!(HandleName::BottomRight.opposite_anchor(), DVec2::new(0.0, 0.0));
        assert_eq!(HandleName::Bottom.opposite_anchor(), DVec2::new(0.5, 0.0));
        assert_eq!(HandleName::BottomLeft.opposite_anchor(), DVec2::new(1.0, 0.0));
        assert_eq!(HandleName::Left.opposite_anchor(), DVec2::new(1.0, 0.5));
    }

    #[test]
    fn test_handle_cursors() {
        let cursors: Vec<_> = HandleName::ALL.iter().map(|h| h.cursor()).collect();
        assert_eq!(
            cursors,
            vec![
                "nw-resize", "n-resize", "ne-resize", "e-resize", "se-resize", "s-resize",
                "sw-resize", "w-resize"
            ]
        );
    }
}
