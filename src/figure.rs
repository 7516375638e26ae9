//! Figure styles
//!
//! A figure style is a closed identifier selecting which QA checklist and which
//! generation framing apply to a request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FigureStyle {
    Diagram,
    Map,
    Chart,
}

impl FigureStyle {
    pub const ALL: [FigureStyle; 3] = [FigureStyle::Diagram, FigureStyle::Map, FigureStyle::Chart];

    pub fn as_str(self) -> &'static str {
        match self {
            FigureStyle::Diagram => "diagram",
            FigureStyle::Map => "map",
            FigureStyle::Chart => "chart",
        }
    }

    /// Generation framing used by prompt enrichment for this style.
    pub fn framing(self) -> &'static str {
        match self {
            FigureStyle::Diagram => {
                "a clean technical diagram: labelled nodes, unambiguous connectors with \
                 arrowheads showing direction, consistent shapes per element type, \
                 generous whitespace, flat colours on a light background"
            }
            FigureStyle::Map => {
                "a cartographic map: clear geographic features, legible place labels, \
                 a scale bar, a north arrow, a legend explaining symbols and colours, \
                 restrained thematic palette"
            }
            FigureStyle::Chart => {
                "a publication-quality data chart: labelled axes with units, readable \
                 tick marks, a title, a legend when more than one series is shown, \
                 values consistent with the request"
            }
        }
    }
}

impl fmt::Display for FigureStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FigureStyle {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "diagram" => Ok(FigureStyle::Diagram),
            "map" => Ok(FigureStyle::Map),
            "chart" => Ok(FigureStyle::Chart),
            other => Err(format!(
                "Unknown figure style '{}' (expected diagram, map, or chart)",
                other
            )),
        }
    }
}
