//! Radar chart geometry.
//!
//! Everything here is a pure function of the dimension list and the canvas
//! size: spokes, concentric rings, label anchors, the value polygon and its
//! markers.  Coordinates are relative to the chart centre with y pointing
//! down (screen space), so dimension 0 sits straight above the centre and the
//! rest follow clockwise.

use serde::Serialize;
use std::f64::consts::PI;

use super::error::{CoreError, CoreResult};
use super::types::{Dimension, MAX_VALUE, MIN_VALUE};

/// Space reserved around the outer ring for labels.
pub const MARGIN: f64 = 80.0;
/// Distance of the label anchors beyond the outer ring.
pub const LABEL_OFFSET: f64 = 30.0;
pub const RING_COUNT: usize = 5;
pub const MARKER_RADIUS: f64 = 5.0;
/// Labels this close to the vertical axis are centred.
pub const LABEL_CENTER_EPSILON: f64 = 5.0;

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    fn polar(radius: f64, angle: f64) -> Self {
        Self {
            x: radius * angle.cos(),
            y: radius * angle.sin(),
        }
    }

    pub fn distance_from_origin(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    fn for_x(x: f64) -> Self {
        if x.abs() < LABEL_CENTER_EPSILON {
            TextAnchor::Middle
        } else if x > 0.0 {
            TextAnchor::Start
        } else {
            TextAnchor::End
        }
    }

    pub fn as_svg(&self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Spoke {
    pub angle: f64,
    pub end: Point,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub text: String,
    pub position: Point,
    pub anchor: TextAnchor,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Marker {
    pub center: Point,
    pub radius: f64,
}

/// Everything needed to draw one profile.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RadarChart {
    pub size: f64,
    /// Canvas position of the chart origin.
    pub center: Point,
    pub outer_radius: f64,
    pub rings: Vec<f64>,
    pub spokes: Vec<Spoke>,
    pub labels: Vec<Label>,
    /// Closed polygon; the last vertex connects back to the first.
    pub polygon: Vec<Point>,
    pub markers: Vec<Marker>,
}

/// Angle of spoke `index` out of `count`, starting due north.
pub fn spoke_angle(index: usize, count: usize) -> f64 {
    -PI / 2.0 + index as f64 * (2.0 * PI / count as f64)
}

/// Map a value in `[MIN_VALUE, MAX_VALUE]` linearly onto `[0, outer_radius]`.
pub fn value_radius(value: u8, outer_radius: f64) -> f64 {
    let span = (MAX_VALUE - MIN_VALUE) as f64;
    (value as f64 - MIN_VALUE as f64) / span * outer_radius
}

pub fn build_chart(dimensions: &[Dimension], size: f64) -> CoreResult<RadarChart> {
    if dimensions.is_empty() {
        return Err(CoreError::validation("Nothing to chart: no dimensions"));
    }
    let outer_radius = size / 2.0 - MARGIN;
    if !outer_radius.is_finite() || outer_radius <= 0.0 {
        return Err(CoreError::validation(format!(
            "Chart size {} is too small (minimum {})",
            size,
            MARGIN * 2.0
        )));
    }

    let count = dimensions.len();
    let rings = (1..=RING_COUNT)
        .map(|level| outer_radius / RING_COUNT as f64 * level as f64)
        .collect();

    let mut spokes = Vec::with_capacity(count);
    let mut labels = Vec::with_capacity(count);
    let mut polygon = Vec::with_capacity(count);

    for (i, dim) in dimensions.iter().enumerate() {
        let angle = spoke_angle(i, count);
        spokes.push(Spoke {
            angle,
            end: Point::polar(outer_radius, angle),
        });

        let position = Point::polar(outer_radius + LABEL_OFFSET, angle);
        labels.push(Label {
            text: dim.name.clone(),
            position,
            anchor: TextAnchor::for_x(position.x),
        });

        polygon.push(Point::polar(value_radius(dim.value, outer_radius), angle));
    }

    let markers = polygon
        .iter()
        .map(|p| Marker {
            center: *p,
            radius: MARKER_RADIUS,
        })
        .collect();

    Ok(RadarChart {
        size,
        center: Point {
            x: size / 2.0,
            y: size / 2.0,
        },
        outer_radius,
        rings,
        spokes,
        labels,
        polygon,
        markers,
    })
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl RadarChart {
    /// Render as a standalone SVG document.
    pub fn to_svg(&self) -> String {
        let mut body = String::new();

        for r in &self.rings {
            body.push_str(&format!(
                r##"<circle cx="0" cy="0" r="{:.2}" fill="none" stroke="#94a3b8" stroke-width="1" opacity="0.4"/>"##,
                r
            ));
        }
        for spoke in &self.spokes {
            body.push_str(&format!(
                r##"<line x1="0" y1="0" x2="{:.2}" y2="{:.2}" stroke="#94a3b8" stroke-width="1" opacity="0.4"/>"##,
                spoke.end.x, spoke.end.y
            ));
        }
        for label in &self.labels {
            body.push_str(&format!(
                r##"<text x="{:.2}" y="{:.2}" text-anchor="{}" dominant-baseline="middle" font-size="14" font-weight="500" fill="#0f172a">{}</text>"##,
                label.position.x,
                label.position.y,
                label.anchor.as_svg(),
                escape_xml(&label.text)
            ));
        }

        let points: Vec<String> = self
            .polygon
            .iter()
            .map(|p| format!("{:.2},{:.2}", p.x, p.y))
            .collect();
        body.push_str(&format!(
            r##"<polygon points="{}" fill="#3b82f6" fill-opacity="0.25" stroke="#2563eb" stroke-width="3"/>"##,
            points.join(" ")
        ));
        for marker in &self.markers {
            body.push_str(&format!(
                r##"<circle cx="{:.2}" cy="{:.2}" r="{}" fill="#2563eb"/>"##,
                marker.center.x, marker.center.y, marker.radius
            ));
        }

        format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {size} {size}"><g transform="translate({cx}, {cy})">{body}</g></svg>"##,
            size = self.size,
            cx = self.center.x,
            cy = self.center.y,
            body = body
        )
    }
}
