//! Drawing and buffer-control commands.
//!
//! Every command is a variant of the closed [`Command`] enum with its own
//! typed operand record. On the wire a command becomes the pair
//! `[opcode_id, [operand, ...]]`, where the opcode id is the position of the
//! operation in [`Opcode::ALL`].

use serde::Serialize;

/// Wire opcode of a command. Discriminants are the wire ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Opcode {
    FillRect,
    StrokeRect,
    FillRects,
    StrokeRects,
    ClearRect,
    FillArc,
    FillCircle,
    StrokeArc,
    StrokeCircle,
    FillArcs,
    StrokeArcs,
    FillCircles,
    StrokeCircles,
    StrokeLine,
    BeginPath,
    ClosePath,
    Stroke,
    FillPath,
    Fill,
    MoveTo,
    LineTo,
    Rect,
    Arc,
    Ellipse,
    ArcTo,
    QuadraticCurveTo,
    BezierCurveTo,
    FillText,
    StrokeText,
    SetLineDash,
    DrawImage,
    PutImageData,
    Clip,
    Save,
    Restore,
    Translate,
    Rotate,
    Scale,
    Transform,
    SetTransform,
    ResetTransform,
    Set,
    Clear,
    Sleep,
    FillPolygon,
    StrokePolygon,
    StrokeLines,
}

impl Opcode {
    /// Every opcode, indexed by wire id.
    pub const ALL: [Self; 47] = [
        Self::FillRect,
        Self::StrokeRect,
        Self::FillRects,
        Self::StrokeRects,
        Self::ClearRect,
        Self::FillArc,
        Self::FillCircle,
        Self::StrokeArc,
        Self::StrokeCircle,
        Self::FillArcs,
        Self::StrokeArcs,
        Self::FillCircles,
        Self::StrokeCircles,
        Self::StrokeLine,
        Self::BeginPath,
        Self::ClosePath,
        Self::Stroke,
        Self::FillPath,
        Self::Fill,
        Self::MoveTo,
        Self::LineTo,
        Self::Rect,
        Self::Arc,
        Self::Ellipse,
        Self::ArcTo,
        Self::QuadraticCurveTo,
        Self::BezierCurveTo,
        Self::FillText,
        Self::StrokeText,
        Self::SetLineDash,
        Self::DrawImage,
        Self::PutImageData,
        Self::Clip,
        Self::Save,
        Self::Restore,
        Self::Translate,
        Self::Rotate,
        Self::Scale,
        Self::Transform,
        Self::SetTransform,
        Self::ResetTransform,
        Self::Set,
        Self::Clear,
        Self::Sleep,
        Self::FillPolygon,
        Self::StrokePolygon,
        Self::StrokeLines,
    ];

    /// Wire id of this opcode.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Look up an opcode by wire id.
    #[must_use]
    pub fn from_id(id: u64) -> Option<Self> {
        usize::try_from(id).ok().and_then(|i| Self::ALL.get(i).copied())
    }
}

/// A primitive operand value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Operand {
    /// An absent optional argument.
    Null,
    /// A boolean flag.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// A string.
    Str(String),
    /// A nested list of operands.
    Array(Vec<Operand>),
}

impl Operand {
    /// Whether every float in this operand is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        match self {
            Self::Float(f) => f.is_finite(),
            Self::Array(items) => items.iter().all(Self::is_finite),
            Self::Null | Self::Bool(_) | Self::Int(_) | Self::Str(_) => true,
        }
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Operand {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Operand {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<bool> for Operand {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Operand {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Operand {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&[f64]> for Operand {
    fn from(values: &[f64]) -> Self {
        Self::Array(values.iter().copied().map(Self::Float).collect())
    }
}

impl<T: Into<Operand>> From<Option<T>> for Operand {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

fn points(points: &[(f64, f64)]) -> Operand {
    Operand::Array(
        points
            .iter()
            .map(|&(x, y)| Operand::Array(vec![Operand::Float(x), Operand::Float(y)]))
            .collect(),
    )
}

/// Winding rule for filling a path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FillRule {
    /// Non-zero winding.
    #[default]
    NonZero,
    /// Even-odd winding.
    EvenOdd,
}

impl FillRule {
    /// Name understood by the renderer.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NonZero => "nonzero",
            Self::EvenOdd => "evenodd",
        }
    }
}

/// Coefficients of a 2D affine transform matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
#[allow(missing_docs)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    fn operands(&self) -> Vec<Operand> {
        [self.a, self.b, self.c, self.d, self.e, self.f]
            .into_iter()
            .map(Operand::Float)
            .collect()
    }
}

/// One drawing or buffer-control instruction.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum Command {
    /// Fill a rectangle.
    FillRect { x: f64, y: f64, width: f64, height: f64 },
    /// Outline a rectangle.
    StrokeRect { x: f64, y: f64, width: f64, height: f64 },
    /// Fill many rectangles.
    FillRects { x: Vec<f64>, y: Vec<f64>, width: Vec<f64>, height: Vec<f64> },
    /// Outline many rectangles.
    StrokeRects { x: Vec<f64>, y: Vec<f64>, width: Vec<f64>, height: Vec<f64> },
    /// Erase a rectangle to transparent.
    ClearRect { x: f64, y: f64, width: f64, height: f64 },
    /// Fill an arc.
    FillArc {
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    },
    /// Fill a circle.
    FillCircle { x: f64, y: f64, radius: f64 },
    /// Outline an arc.
    StrokeArc {
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    },
    /// Outline a circle.
    StrokeCircle { x: f64, y: f64, radius: f64 },
    /// Fill many arcs.
    FillArcs {
        x: Vec<f64>,
        y: Vec<f64>,
        radius: Vec<f64>,
        start_angle: Vec<f64>,
        end_angle: Vec<f64>,
        anticlockwise: bool,
    },
    /// Outline many arcs.
    StrokeArcs {
        x: Vec<f64>,
        y: Vec<f64>,
        radius: Vec<f64>,
        start_angle: Vec<f64>,
        end_angle: Vec<f64>,
        anticlockwise: bool,
    },
    /// Fill many circles.
    FillCircles { x: Vec<f64>, y: Vec<f64>, radius: Vec<f64> },
    /// Outline many circles.
    StrokeCircles { x: Vec<f64>, y: Vec<f64>, radius: Vec<f64> },
    /// Draw a line segment.
    StrokeLine { x1: f64, y1: f64, x2: f64, y2: f64 },
    /// Start a new path.
    BeginPath,
    /// Close the current sub-path.
    ClosePath,
    /// Outline the current path.
    Stroke,
    /// Fill a path widget by model id.
    FillPath { path_model_id: String },
    /// Fill the current path.
    Fill { rule: FillRule },
    /// Move the pen without drawing.
    MoveTo { x: f64, y: f64 },
    /// Add a straight segment to the current path.
    LineTo { x: f64, y: f64 },
    /// Add a rectangle to the current path.
    Rect { x: f64, y: f64, width: f64, height: f64 },
    /// Add an arc to the current path.
    Arc {
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    },
    /// Add an ellipse to the current path.
    Ellipse {
        x: f64,
        y: f64,
        radius_x: f64,
        radius_y: f64,
        rotation: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    },
    /// Add an arc through two control points.
    ArcTo { x1: f64, y1: f64, x2: f64, y2: f64, radius: f64 },
    /// Add a quadratic curve.
    QuadraticCurveTo { cp_x: f64, cp_y: f64, x: f64, y: f64 },
    /// Add a cubic curve.
    BezierCurveTo {
        cp1_x: f64,
        cp1_y: f64,
        cp2_x: f64,
        cp2_y: f64,
        x: f64,
        y: f64,
    },
    /// Fill text.
    FillText { text: String, x: f64, y: f64, max_width: Option<f64> },
    /// Outline text.
    StrokeText { text: String, x: f64, y: f64, max_width: Option<f64> },
    /// Set the stroke dash pattern.
    SetLineDash { segments: Vec<f64> },
    /// Draw an image widget by model id.
    DrawImage {
        image_model_id: String,
        x: f64,
        y: f64,
        width: Option<f64>,
        height: Option<f64>,
    },
    /// Paint the pixels of an image widget, unscaled, by model id.
    PutImageData { image_model_id: String, x: f64, y: f64 },
    /// Clip to the current path.
    Clip,
    /// Push the drawing state.
    Save,
    /// Pop the drawing state.
    Restore,
    /// Translate the coordinate system.
    Translate { x: f64, y: f64 },
    /// Rotate the coordinate system by radians.
    Rotate { angle: f64 },
    /// Scale the coordinate system.
    Scale { x: f64, y: f64 },
    /// Multiply the current transform.
    Transform(Matrix),
    /// Replace the current transform.
    SetTransform(Matrix),
    /// Reset the transform to identity.
    ResetTransform,
    /// Set a drawing-state attribute such as `fillStyle`.
    Set { attribute: String, value: Operand },
    /// Clear the whole canvas.
    Clear,
    /// Pause the renderer between commands.
    Sleep { milliseconds: u32 },
    /// Fill a closed polygon.
    FillPolygon { points: Vec<(f64, f64)> },
    /// Outline a closed polygon.
    StrokePolygon { points: Vec<(f64, f64)> },
    /// Outline an open polyline.
    StrokeLines { points: Vec<(f64, f64)> },
}

impl Command {
    /// The wire opcode of this command.
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        match self {
            Self::FillRect { .. } => Opcode::FillRect,
            Self::StrokeRect { .. } => Opcode::StrokeRect,
            Self::FillRects { .. } => Opcode::FillRects,
            Self::StrokeRects { .. } => Opcode::StrokeRects,
            Self::ClearRect { .. } => Opcode::ClearRect,
            Self::FillArc { .. } => Opcode::FillArc,
            Self::FillCircle { .. } => Opcode::FillCircle,
            Self::StrokeArc { .. } => Opcode::StrokeArc,
            Self::StrokeCircle { .. } => Opcode::StrokeCircle,
            Self::FillArcs { .. } => Opcode::FillArcs,
            Self::StrokeArcs { .. } => Opcode::StrokeArcs,
            Self::FillCircles { .. } => Opcode::FillCircles,
            Self::StrokeCircles { .. } => Opcode::StrokeCircles,
            Self::StrokeLine { .. } => Opcode::StrokeLine,
            Self::BeginPath => Opcode::BeginPath,
            Self::ClosePath => Opcode::ClosePath,
            Self::Stroke => Opcode::Stroke,
            Self::FillPath { .. } => Opcode::FillPath,
            Self::Fill { .. } => Opcode::Fill,
            Self::MoveTo { .. } => Opcode::MoveTo,
            Self::LineTo { .. } => Opcode::LineTo,
            Self::Rect { .. } => Opcode::Rect,
            Self::Arc { .. } => Opcode::Arc,
            Self::Ellipse { .. } => Opcode::Ellipse,
            Self::ArcTo { .. } => Opcode::ArcTo,
            Self::QuadraticCurveTo { .. } => Opcode::QuadraticCurveTo,
            Self::BezierCurveTo { .. } => Opcode::BezierCurveTo,
            Self::FillText { .. } => Opcode::FillText,
            Self::StrokeText { .. } => Opcode::StrokeText,
            Self::SetLineDash { .. } => Opcode::SetLineDash,
            Self::DrawImage { .. } => Opcode::DrawImage,
            Self::PutImageData { .. } => Opcode::PutImageData,
            Self::Clip => Opcode::Clip,
            Self::Save => Opcode::Save,
            Self::Restore => Opcode::Restore,
            Self::Translate { .. } => Opcode::Translate,
            Self::Rotate { .. } => Opcode::Rotate,
            Self::Scale { .. } => Opcode::Scale,
            Self::Transform(_) => Opcode::Transform,
            Self::SetTransform(_) => Opcode::SetTransform,
            Self::ResetTransform => Opcode::ResetTransform,
            Self::Set { .. } => Opcode::Set,
            Self::Clear => Opcode::Clear,
            Self::Sleep { .. } => Opcode::Sleep,
            Self::FillPolygon { .. } => Opcode::FillPolygon,
            Self::StrokePolygon { .. } => Opcode::StrokePolygon,
            Self::StrokeLines { .. } => Opcode::StrokeLines,
        }
    }

    /// The operand list in wire order.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn operands(&self) -> Vec<Operand> {
        use crate::command::Operand::Float as F;

        match self {
            Self::FillRect { x, y, width, height }
            | Self::StrokeRect { x, y, width, height }
            | Self::ClearRect { x, y, width, height }
            | Self::Rect { x, y, width, height } => vec![F(*x), F(*y), F(*width), F(*height)],
            Self::FillRects { x, y, width, height }
            | Self::StrokeRects { x, y, width, height } => vec![
                x.as_slice().into(),
                y.as_slice().into(),
                width.as_slice().into(),
                height.as_slice().into(),
            ],
            Self::FillArc {
                x,
                y,
                radius,
                start_angle,
                end_angle,
                anticlockwise,
            }
            | Self::StrokeArc {
                x,
                y,
                radius,
                start_angle,
                end_angle,
                anticlockwise,
            }
            | Self::Arc {
                x,
                y,
                radius,
                start_angle,
                end_angle,
                anticlockwise,
            } => vec![
                F(*x),
                F(*y),
                F(*radius),
                F(*start_angle),
                F(*end_angle),
                Operand::Bool(*anticlockwise),
            ],
            Self::FillCircle { x, y, radius } | Self::StrokeCircle { x, y, radius } => {
                vec![F(*x), F(*y), F(*radius)]
            }
            Self::FillArcs {
                x,
                y,
                radius,
                start_angle,
                end_angle,
                anticlockwise,
            }
            | Self::StrokeArcs {
                x,
                y,
                radius,
                start_angle,
                end_angle,
                anticlockwise,
            } => vec![
                x.as_slice().into(),
                y.as_slice().into(),
                radius.as_slice().into(),
                start_angle.as_slice().into(),
                end_angle.as_slice().into(),
                Operand::Bool(*anticlockwise),
            ],
            Self::FillCircles { x, y, radius } | Self::StrokeCircles { x, y, radius } => vec![
                x.as_slice().into(),
                y.as_slice().into(),
                radius.as_slice().into(),
            ],
            Self::StrokeLine { x1, y1, x2, y2 } => vec![F(*x1), F(*y1), F(*x2), F(*y2)],
            Self::BeginPath
            | Self::ClosePath
            | Self::Stroke
            | Self::Clip
            | Self::Save
            | Self::Restore
            | Self::ResetTransform
            | Self::Clear => Vec::new(),
            Self::FillPath { path_model_id } => vec![path_model_id.as_str().into()],
            Self::Fill { rule } => vec![rule.as_str().into()],
            Self::MoveTo { x, y }
            | Self::LineTo { x, y }
            | Self::Translate { x, y }
            | Self::Scale { x, y } => vec![F(*x), F(*y)],
            Self::PutImageData { image_model_id, x, y } => {
                vec![image_model_id.as_str().into(), F(*x), F(*y)]
            }
            Self::Ellipse {
                x,
                y,
                radius_x,
                radius_y,
                rotation,
                start_angle,
                end_angle,
                anticlockwise,
            } => vec![
                F(*x),
                F(*y),
                F(*radius_x),
                F(*radius_y),
                F(*rotation),
                F(*start_angle),
                F(*end_angle),
                Operand::Bool(*anticlockwise),
            ],
            Self::ArcTo {
                x1,
                y1,
                x2,
                y2,
                radius,
            } => vec![F(*x1), F(*y1), F(*x2), F(*y2), F(*radius)],
            Self::QuadraticCurveTo { cp_x, cp_y, x, y } => {
                vec![F(*cp_x), F(*cp_y), F(*x), F(*y)]
            }
            Self::BezierCurveTo {
                cp1_x,
                cp1_y,
                cp2_x,
                cp2_y,
                x,
                y,
            } => vec![F(*cp1_x), F(*cp1_y), F(*cp2_x), F(*cp2_y), F(*x), F(*y)],
            Self::FillText {
                text,
                x,
                y,
                max_width,
            }
            | Self::StrokeText {
                text,
                x,
                y,
                max_width,
            } => vec![text.as_str().into(), F(*x), F(*y), (*max_width).into()],
            Self::SetLineDash { segments } => vec![segments.as_slice().into()],
            Self::DrawImage {
                image_model_id,
                x,
                y,
                width,
                height,
            } => vec![
                image_model_id.as_str().into(),
                F(*x),
                F(*y),
                (*width).into(),
                (*height).into(),
            ],
            Self::Rotate { angle } => vec![F(*angle)],
            Self::Transform(matrix) | Self::SetTransform(matrix) => matrix.operands(),
            Self::Set { attribute, value } => vec![attribute.as_str().into(), value.clone()],
            Self::Sleep { milliseconds } => vec![(*milliseconds).into()],
            Self::FillPolygon { points: p }
            | Self::StrokePolygon { points: p }
            | Self::StrokeLines { points: p } => vec![points(p)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_ids_follow_fixed_order() {
        assert_eq!(Opcode::FillRect.id(), 0);
        assert_eq!(Opcode::StrokeLine.id(), 13);
        assert_eq!(Opcode::DrawImage.id(), 30);
        assert_eq!(Opcode::Set.id(), 41);
        assert_eq!(Opcode::Clear.id(), 42);
        assert_eq!(Opcode::Sleep.id(), 43);
        assert_eq!(Opcode::StrokeLines.id(), 46);
        for (index, opcode) in Opcode::ALL.iter().enumerate() {
            assert_eq!(usize::from(opcode.id()), index);
        }
    }

    #[test]
    fn test_opcode_from_id() {
        assert_eq!(Opcode::from_id(5), Some(Opcode::FillArc));
        assert_eq!(Opcode::from_id(47), None);
        assert_eq!(Opcode::from_id(u64::MAX), None);
    }

    #[test]
    fn test_optional_operands_become_null() {
        let cmd = Command::FillText {
            text: "hi".to_string(),
            x: 1.0,
            y: 2.0,
            max_width: None,
        };
        assert_eq!(
            cmd.operands(),
            vec![
                Operand::Str("hi".to_string()),
                Operand::Float(1.0),
                Operand::Float(2.0),
                Operand::Null
            ]
        );
    }

    #[test]
    fn test_put_image_data_references_image_model() {
        let cmd = Command::PutImageData {
            image_model_id: "IPY_MODEL_img".to_string(),
            x: 3.0,
            y: 4.0,
        };
        assert_eq!(cmd.opcode(), Opcode::PutImageData);
        assert_eq!(
            serde_json::to_value(cmd.operands()).unwrap(),
            serde_json::json!(["IPY_MODEL_img", 3.0, 4.0])
        );
    }

    #[test]
    fn test_polygon_points_nested() {
        let cmd = Command::FillPolygon {
            points: vec![(0.0, 1.0), (2.0, 3.0)],
        };
        let json = serde_json::to_value(cmd.operands()).unwrap();
        assert_eq!(json, serde_json::json!([[[0.0, 1.0], [2.0, 3.0]]]));
    }

    #[test]
    fn test_operand_finiteness() {
        assert!(Operand::Float(1.5).is_finite());
        assert!(!Operand::Float(f64::NAN).is_finite());
        assert!(!Operand::Array(vec![Operand::Int(1), Operand::Float(f64::INFINITY)]).is_finite());
        assert!(Operand::Str("x".into()).is_finite());
    }

    #[test]
    fn test_set_carries_attribute_and_value() {
        let cmd = Command::Set {
            attribute: "fillStyle".to_string(),
            value: "#ff0000".into(),
        };
        assert_eq!(cmd.opcode(), Opcode::Set);
        let json = serde_json::to_value(cmd.operands()).unwrap();
        assert_eq!(json, serde_json::json!(["fillStyle", "#ff0000"]));
    }
}

#[cfg(test)]
pub(crate) mod strategies {
    use super::*;
    use proptest::prelude::*;

    /// Coordinates on a quarter-pixel grid, exact through a JSON round trip.
    pub(crate) fn coord() -> impl Strategy<Value = f64> {
        (-100_000i32..100_000).prop_map(|n| f64::from(n) / 4.0)
    }

    fn coords(max: usize) -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(coord(), 0..max)
    }

    fn label() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_ #]{0,16}"
    }

    fn operand() -> impl Strategy<Value = Operand> {
        prop_oneof![
            label().prop_map(Operand::Str),
            any::<i64>().prop_map(Operand::Int),
            coord().prop_map(Operand::Float),
            any::<bool>().prop_map(Operand::Bool),
            Just(Operand::Null),
        ]
    }

    pub(crate) fn arb_command() -> impl Strategy<Value = Command> {
        prop_oneof![
            (coord(), coord(), coord(), coord())
                .prop_map(|(x, y, width, height)| Command::FillRect { x, y, width, height }),
            (coords(8), coords(8), coords(8), coords(8)).prop_map(|(x, y, width, height)| {
                Command::StrokeRects { x, y, width, height }
            }),
            (coord(), coord(), coord(), coord(), coord(), any::<bool>()).prop_map(
                |(x, y, radius, start_angle, end_angle, anticlockwise)| Command::Arc {
                    x,
                    y,
                    radius,
                    start_angle,
                    end_angle,
                    anticlockwise,
                }
            ),
            (coord(), coord()).prop_map(|(x, y)| Command::MoveTo { x, y }),
            (coord(), coord()).prop_map(|(x, y)| Command::LineTo { x, y }),
            (label(), coord(), coord(), prop::option::of(coord())).prop_map(
                |(text, x, y, max_width)| Command::FillText {
                    text,
                    x,
                    y,
                    max_width,
                }
            ),
            coords(6).prop_map(|segments| Command::SetLineDash { segments }),
            (
                label(),
                coord(),
                coord(),
                prop::option::of(coord()),
                prop::option::of(coord())
            )
                .prop_map(|(image_model_id, x, y, width, height)| Command::DrawImage {
                    image_model_id,
                    x,
                    y,
                    width,
                    height,
                }),
            (label(), coord(), coord()).prop_map(|(image_model_id, x, y)| {
                Command::PutImageData { image_model_id, x, y }
            }),
            (label(), operand()).prop_map(|(attribute, value)| Command::Set { attribute, value }),
            any::<u32>().prop_map(|milliseconds| Command::Sleep { milliseconds }),
            prop::collection::vec((coord(), coord()), 0..8)
                .prop_map(|points| Command::FillPolygon { points }),
            prop_oneof![Just(FillRule::NonZero), Just(FillRule::EvenOdd)]
                .prop_map(|rule| Command::Fill { rule }),
            (coord(), coord(), coord(), coord(), coord(), coord()).prop_map(
                |(a, b, c, d, e, f)| Command::Transform(Matrix { a, b, c, d, e, f })
            ),
            Just(Command::Save),
            Just(Command::Restore),
            Just(Command::BeginPath),
            Just(Command::Clear),
        ]
    }
}
