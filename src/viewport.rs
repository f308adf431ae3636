use crate::model::Point;

pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 10.0;
pub const ZOOM_FACTOR: f64 = 1.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Pan/zoom state of the preview: `display = data * scale + translate`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportTransform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
    panning: bool,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self {
            translate_x: 0.0,
            translate_y: 0.0,
            scale: 1.0,
            panning: false,
        }
    }
}

impl ViewportTransform {
    pub fn data_to_display(&self, p: Point) -> Point {
        Point::new(
            p.x * self.scale + self.translate_x,
            p.y * self.scale + self.translate_y,
        )
    }

    pub fn display_to_data(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.translate_x) / self.scale,
            (p.y - self.translate_y) / self.scale,
        )
    }

    /// Zooms by one step keeping the point under `cursor` fixed. Returns `false` and
    /// leaves the state alone when the scale is already at its limit.
    pub fn zoom(&mut self, direction: ZoomDirection, cursor: Point) -> bool {
        let wanted = match direction {
            ZoomDirection::In => self.scale * ZOOM_FACTOR,
            ZoomDirection::Out => self.scale / ZOOM_FACTOR,
        };
        let new_scale = wanted.clamp(MIN_SCALE, MAX_SCALE);
        if new_scale == self.scale {
            return false;
        }
        let ratio = new_scale / self.scale;
        self.translate_x = cursor.x - (cursor.x - self.translate_x) * ratio;
        self.translate_y = cursor.y - (cursor.y - self.translate_y) * ratio;
        self.scale = new_scale;
        true
    }

    pub fn begin_pan(&mut self) {
        self.panning = true;
    }

    /// Release or pointer leave.
    pub fn end_pan(&mut self) {
        self.panning = false;
    }

    pub fn is_panning(&self) -> bool {
        self.panning
    }

    /// Moves by a pointer delta, only while a pan is active.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if self.panning {
            self.translate_x += dx;
            self.translate_y += dy;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn zoom_keeps_point_under_cursor() {
        let mut view = ViewportTransform {
            translate_x: 13.0,
            translate_y: -7.0,
            scale: 2.0,
            ..Default::default()
        };
        for (direction, cursor) in [
            (ZoomDirection::In, Point::new(100.0, 50.0)),
            (ZoomDirection::Out, Point::new(-20.0, 300.0)),
            (ZoomDirection::In, Point::new(0.0, 0.0)),
        ] {
            let under = view.display_to_data(cursor);
            assert!(view.zoom(direction, cursor));
            assert!(close(view.data_to_display(under), cursor));
        }
    }

    #[test]
    fn zoom_steps_by_ten_percent() {
        let mut view = ViewportTransform::default();
        view.zoom(ZoomDirection::In, Point::default());
        assert!((view.scale - 1.1).abs() < 1e-12);
        view.zoom(ZoomDirection::Out, Point::default());
        assert!((view.scale - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zoom_clamps_and_stops_at_the_limits() {
        let mut view = ViewportTransform::default();
        while view.zoom(ZoomDirection::In, Point::new(5.0, 5.0)) {}
        assert_eq!(view.scale, MAX_SCALE);
        let at_limit = view;
        assert!(!view.zoom(ZoomDirection::In, Point::new(1.0, 2.0)));
        assert_eq!(view, at_limit);

        while view.zoom(ZoomDirection::Out, Point::new(5.0, 5.0)) {}
        assert_eq!(view.scale, MIN_SCALE);
    }

    #[test]
    fn pan_only_moves_while_panning() {
        let mut view = ViewportTransform::default();
        view.pan_by(5.0, 5.0);
        assert_eq!((view.translate_x, view.translate_y), (0.0, 0.0));
        view.begin_pan();
        view.pan_by(5.0, -2.0);
        view.pan_by(1.0, 1.0);
        view.end_pan();
        view.pan_by(100.0, 100.0);
        assert_eq!((view.translate_x, view.translate_y), (6.0, -1.0));
        assert!(!view.is_panning());
    }

    #[test]
    fn reset_restores_identity() {
        let mut view = ViewportTransform::default();
        view.zoom(ZoomDirection::In, Point::new(3.0, 4.0));
        view.begin_pan();
        view.pan_by(9.0, 9.0);
        view.reset();
        assert_eq!(view, ViewportTransform::default());
    }
}
