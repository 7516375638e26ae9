//! Static QA checklists.
//!
//! Checks common to every figure style come first; the style-specific table is
//! appended after them. Ids are unique within every effective set.

use crate::figure::FigureStyle;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Failure blocks `passed` and triggers regeneration.
    Hard,
    /// Reported only.
    Soft,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Hard => "hard",
            Severity::Soft => "soft",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QaCheckDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub severity: Severity,
    pub instruction: &'static str,
}

const fn check(
    id: &'static str,
    name: &'static str,
    severity: Severity,
    instruction: &'static str,
) -> QaCheckDefinition {
    QaCheckDefinition {
        id,
        name,
        severity,
        instruction,
    }
}

pub static COMMON_CHECKS: [QaCheckDefinition; 5] = [
    check(
        "text_legibility",
        "Text legibility",
        Severity::Hard,
        "Every piece of text is sharp and readable: not blurred, clipped, overlapping other \
         elements, or too small to read at normal viewing size.",
    ),
    check(
        "spelling",
        "Spelling",
        Severity::Hard,
        "Every visible word is spelled correctly. There is no garbled, mirrored, or invented \
         pseudo-text anywhere in the image.",
    ),
    check(
        "prompt_fidelity",
        "Prompt fidelity",
        Severity::Hard,
        "The figure shows the subject and all content explicitly requested in the prompt, \
         with nothing essential missing or substituted.",
    ),
    check(
        "rendering_artifacts",
        "Rendering artifacts",
        Severity::Soft,
        "No visual artifacts: distorted shapes, duplicated elements, broken lines, or \
         smudged regions.",
    ),
    check(
        "layout_balance",
        "Layout balance",
        Severity::Soft,
        "Elements are evenly distributed, aligned, and nothing important is cut off at the \
         image edges.",
    ),
];

pub static MAP_CHECKS: [QaCheckDefinition; 4] = [
    check(
        "scale_bar",
        "Scale bar",
        Severity::Hard,
        "A scale bar with distance units is present and readable.",
    ),
    check(
        "north_arrow",
        "North arrow",
        Severity::Hard,
        "A north arrow or compass rose indicates orientation.",
    ),
    check(
        "map_legend",
        "Map legend",
        Severity::Soft,
        "A legend explains the symbols, line styles, and colours used on the map.",
    ),
    check(
        "place_labels",
        "Place labels",
        Severity::Soft,
        "Place names are positioned next to the features they name without colliding \
         with each other.",
    ),
];

pub static CHART_CHECKS: [QaCheckDefinition; 4] = [
    check(
        "axis_labels",
        "Axis labels",
        Severity::Hard,
        "Every axis has a descriptive label, including units where the quantity has units.",
    ),
    check(
        "data_consistency",
        "Data consistency",
        Severity::Hard,
        "Plotted values, tick marks, and scales are mutually consistent and match any \
         numbers stated in the prompt.",
    ),
    check(
        "chart_legend",
        "Chart legend",
        Severity::Soft,
        "When more than one series is shown, a legend identifies each series.",
    ),
    check(
        "chart_title",
        "Chart title",
        Severity::Soft,
        "The chart has a concise title describing what it shows.",
    ),
];

pub static DIAGRAM_CHECKS: [QaCheckDefinition; 4] = [
    check(
        "label_coverage",
        "Label coverage",
        Severity::Hard,
        "Every node, box, or component in the diagram carries a label.",
    ),
    check(
        "connector_clarity",
        "Connector clarity",
        Severity::Hard,
        "Connectors and arrows clearly show which elements they join and in which \
         direction; none end in empty space.",
    ),
    check(
        "flow_direction",
        "Flow direction",
        Severity::Soft,
        "The overall reading direction (left-to-right or top-to-bottom) is consistent.",
    ),
    check(
        "visual_hierarchy",
        "Visual hierarchy",
        Severity::Soft,
        "Primary elements are visually more prominent than secondary ones; similar \
         elements share the same shape and colour.",
    ),
];

pub fn style_checks(style: FigureStyle) -> &'static [QaCheckDefinition] {
    match style {
        FigureStyle::Diagram => &DIAGRAM_CHECKS,
        FigureStyle::Map => &MAP_CHECKS,
        FigureStyle::Chart => &CHART_CHECKS,
    }
}

/// Common checks followed by the style's own checks, in table order.
pub fn effective_checks(style: FigureStyle) -> Vec<&'static QaCheckDefinition> {
    COMMON_CHECKS
        .iter()
        .chain(style_checks(style).iter())
        .collect()
}
