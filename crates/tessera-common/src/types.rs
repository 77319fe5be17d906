use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn orientation(&self) -> Orientation {
        if self.width > self.height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// The widget kinds the bridge knows how to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Label,
    Button,
    Image,
    VBox,
    HBox,
    Grid,
}

impl WidgetKind {
    pub fn is_container(self) -> bool {
        matches!(self, Self::VBox | Self::HBox | Self::Grid)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::Button => "button",
            Self::Image => "image",
            Self::VBox => "vbox",
            Self::HBox => "hbox",
            Self::Grid => "grid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "label" => Some(Self::Label),
            "button" => Some(Self::Button),
            "image" => Some(Self::Image),
            "vbox" => Some(Self::VBox),
            "hbox" => Some(Self::HBox),
            "grid" => Some(Self::Grid),
            _ => None,
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
