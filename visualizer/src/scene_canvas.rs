use iced::{
    mouse,
    widget::canvas::{self, Frame, Geometry, Path, Stroke},
    Color, Point, Rectangle, Renderer, Theme,
};
use stormcore::math::lat_lon_to_3d;
use stormcore::prediction::ErrorChart;
use stormcore::prelude::TrackSource;
use stormcore::scene::{track_color, GlobeView, Primitive, PrimitiveShape, Rgba, ThemePalette};

pub fn to_color(rgba: Rgba) -> Color {
    Color::from_rgba8(rgba.r, rgba.g, rgba.b, f32::from(rgba.a) / 255.0)
}

fn faded(rgba: Rgba, opacity: f64) -> Color {
    let mut color = to_color(rgba);
    color.a *= opacity.clamp(0.0, 1.0) as f32;
    color
}

/// Strokes consecutive visible points, lifting the pen over hidden ones.
fn polyline(points: &[Option<Point>]) -> Path {
    Path::new(|builder| {
        let mut pen_down = false;
        for point in points {
            match point {
                Some(point) if pen_down => builder.line_to(*point),
                Some(point) => {
                    builder.move_to(*point);
                    pen_down = true;
                }
                None => pen_down = false,
            }
        }
    })
}

/// Orthographic globe with a graticule and the retained track primitives.
pub struct GlobeCanvas {
    pub primitives: Vec<Primitive>,
    pub view: GlobeView,
    pub palette: ThemePalette,
}

impl GlobeCanvas {
    fn screen(&self, center: Point, radius: f32, position: stormcore::math::Vec3) -> Option<Point> {
        self.view
            .project(position)
            .map(|(x, y)| Point::new(center.x + x as f32 * radius, center.y + y as f32 * radius))
    }
}

impl canvas::Program<crate::Message> for GlobeCanvas {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), to_color(self.palette.globe_bg));

        let center = Point::new(bounds.width / 2.0, bounds.height / 2.0);
        let radius = bounds.width.min(bounds.height) * 0.45;
        let disk = Path::circle(center, radius * self.view.scale() as f32);
        frame.fill(&disk, to_color(self.palette.ocean));

        let grid = Stroke::default()
            .with_width(1.0)
            .with_color(to_color(self.palette.land));
        for lat in (-60..=60).step_by(30) {
            let ring: Vec<Option<Point>> = (-180..=180)
                .step_by(5)
                .map(|lon| self.screen(center, radius, lat_lon_to_3d(lat as f64, lon as f64, 1.0)))
                .collect();
            frame.stroke(&polyline(&ring), grid.clone());
        }
        for lon in (-180..180).step_by(30) {
            let meridian: Vec<Option<Point>> = (-90..=90)
                .step_by(5)
                .map(|lat| self.screen(center, radius, lat_lon_to_3d(lat as f64, lon as f64, 1.0)))
                .collect();
            frame.stroke(&polyline(&meridian), grid.clone());
        }

        let pixel_scale = radius * self.view.scale() as f32;
        for primitive in &self.primitives {
            let color = faded(primitive.color, primitive.opacity);
            match &primitive.shape {
                PrimitiveShape::Path { points, radius: width } => {
                    let projected: Vec<Option<Point>> = points
                        .iter()
                        .map(|point| self.screen(center, radius, *point))
                        .collect();
                    frame.stroke(
                        &polyline(&projected),
                        Stroke::default()
                            .with_width((*width as f32 * pixel_scale * 2.0).max(1.5))
                            .with_color(color),
                    );
                }
                PrimitiveShape::Marker {
                    position,
                    radius: size,
                } => {
                    if let Some(point) = self.screen(center, radius, *position) {
                        let marker = Path::circle(point, (*size as f32 * pixel_scale).max(2.0));
                        frame.fill(&marker, color);
                    }
                }
            }
        }

        vec![frame.into_geometry()]
    }
}

/// Track error per forecast hour, one line per model.
pub struct ErrorChartCanvas {
    pub chart: ErrorChart,
    pub palette: ThemePalette,
}

impl canvas::Program<crate::Message> for ErrorChartCanvas {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), to_color(self.palette.bg_secondary));

        let (left, right, top, bottom) = (44.0, 12.0, 22.0, 24.0);
        let width = (bounds.width - left - right).max(1.0);
        let height = (bounds.height - top - bottom).max(1.0);
        let text_color = to_color(self.palette.text_secondary);
        let max_error = self.chart.max_error().max(1) as f32;
        let count = self.chart.labels.len();

        let x_at = |i: usize| {
            if count > 1 {
                left + width * i as f32 / (count - 1) as f32
            } else {
                left
            }
        };
        let y_at = |km: u32| top + height - height * km as f32 / max_error;

        let axes = Path::new(|builder| {
            builder.move_to(Point::new(left, top));
            builder.line_to(Point::new(left, top + height));
            builder.line_to(Point::new(left + width, top + height));
        });
        frame.stroke(
            &axes,
            Stroke::default()
                .with_width(1.0)
                .with_color(to_color(self.palette.border)),
        );

        for km in [0, max_error as u32 / 2, max_error as u32] {
            frame.fill_text(canvas::Text {
                content: format!("{km}"),
                position: Point::new(4.0, y_at(km) - 6.0),
                color: text_color,
                size: 11.0.into(),
                ..canvas::Text::default()
            });
        }

        let label_every = count.div_ceil(6).max(1);
        for (i, label) in self.chart.labels.iter().enumerate().step_by(label_every) {
            frame.fill_text(canvas::Text {
                content: label.clone(),
                position: Point::new(x_at(i) - 8.0, top + height + 6.0),
                color: text_color,
                size: 11.0.into(),
                ..canvas::Text::default()
            });
        }

        for (slot, series) in self.chart.series.iter().enumerate() {
            let color = to_color(track_color(TrackSource::Model(series.model)));
            let points: Vec<Option<Point>> = series
                .errors_km
                .iter()
                .enumerate()
                .map(|(i, km)| Some(Point::new(x_at(i), y_at(*km))))
                .collect();
            frame.stroke(
                &polyline(&points),
                Stroke::default().with_width(2.0).with_color(color),
            );
            frame.fill_text(canvas::Text {
                content: series.label.clone(),
                position: Point::new(left + 8.0 + slot as f32 * 96.0, 4.0),
                color,
                size: 12.0.into(),
                ..canvas::Text::default()
            });
        }

        vec![frame.into_geometry()]
    }
}
