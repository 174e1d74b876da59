//! Dependency Graph Style System
//!
//! Colour and size tables for node kinds and edge classifications. The
//! renderers pick icons from here; the rendering surface reads the rest
//! through [`crate::AssembledGraph::node_style`] and
//! [`crate::AssembledGraph::edge_style`].

use crate::config::LayoutConfig;
use depgraph_core::{EdgeClassification, PresentationKind};

/// RGB color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn lighten(&self, factor: f32) -> Self {
        Self {
            r: ((self.r as f32) + (255.0 - self.r as f32) * factor) as u8,
            g: ((self.g as f32) + (255.0 - self.g as f32) * factor) as u8,
            b: ((self.b as f32) + (255.0 - self.b as f32) * factor) as u8,
            a: self.a,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeColors {
    pub fill: Color,
    pub border: Color,
    pub text: Color,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeStyle {
    pub color: Color,
    pub width: f32,
    pub dashed: bool,
    pub animated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeStyle {
    pub colors: NodeColors,
    pub corner_radius: f32,
    pub font_size: f32,
    pub min_width: f32,
    pub min_height: f32,
}

// ============================================================================
// Color Constants
// ============================================================================

// Apps (blue tones)
pub const COLOR_APP_FILL: Color = Color::rgb(80, 130, 180);
pub const COLOR_APP_BORDER: Color = Color::rgb(60, 110, 160);
pub const COLOR_APP_TEXT: Color = Color::rgb(255, 255, 255);

// Databases (green tones)
pub const COLOR_DATABASE_FILL: Color = Color::rgb(80, 140, 100);
pub const COLOR_DATABASE_BORDER: Color = Color::rgb(60, 120, 80);
pub const COLOR_DATABASE_TEXT: Color = Color::rgb(255, 255, 255);

// Custom resources (purple tones)
pub const COLOR_CUSTOM_FILL: Color = Color::rgb(130, 100, 160);
pub const COLOR_CUSTOM_BORDER: Color = Color::rgb(110, 80, 140);
pub const COLOR_CUSTOM_TEXT: Color = Color::rgb(255, 255, 255);

// Unknown/Default
pub const COLOR_GENERIC_FILL: Color = Color::rgb(100, 100, 100);
pub const COLOR_GENERIC_BORDER: Color = Color::rgb(80, 80, 80);
pub const COLOR_GENERIC_TEXT: Color = Color::rgb(255, 255, 255);

pub const COLOR_ROOT_BORDER: Color = Color::rgb(255, 200, 100);

// Edge colors
pub const COLOR_EDGE_NORMAL: Color = Color::rgb(140, 140, 140);
pub const COLOR_EDGE_DEGRADED: Color = Color::rgb(220, 70, 60);

pub const ICON_APP: &str = "app";
pub const ICON_DATABASE: &str = "database";
pub const ICON_CUSTOM_RESOURCE: &str = "custom-resource";
pub const ICON_GENERIC: &str = "resource";

// ============================================================================
// Style Functions
// ============================================================================

/// Style for a node box. The root node keeps its kind colours with a highlighted border.
pub fn get_node_style(kind: PresentationKind, is_root: bool) -> NodeStyle {
    let base = get_node_colors(kind);
    let colors = if is_root {
        NodeColors {
            fill: base.fill.lighten(0.1),
            border: COLOR_ROOT_BORDER,
            text: base.text,
        }
    } else {
        base
    };

    NodeStyle {
        colors,
        corner_radius: 6.0,
        font_size: if is_root { 14.0 } else { 12.0 },
        min_width: LayoutConfig::DEFAULT_NODE_WIDTH,
        min_height: LayoutConfig::DEFAULT_NODE_HEIGHT,
    }
}

pub fn get_node_colors(kind: PresentationKind) -> NodeColors {
    match kind {
        PresentationKind::App => NodeColors {
            fill: COLOR_APP_FILL,
            border: COLOR_APP_BORDER,
            text: COLOR_APP_TEXT,
        },
        PresentationKind::Database => NodeColors {
            fill: COLOR_DATABASE_FILL,
            border: COLOR_DATABASE_BORDER,
            text: COLOR_DATABASE_TEXT,
        },
        PresentationKind::CustomResource => NodeColors {
            fill: COLOR_CUSTOM_FILL,
            border: COLOR_CUSTOM_BORDER,
            text: COLOR_CUSTOM_TEXT,
        },
        PresentationKind::Generic => NodeColors {
            fill: COLOR_GENERIC_FILL,
            border: COLOR_GENERIC_BORDER,
            text: COLOR_GENERIC_TEXT,
        },
    }
}

/// Icon name for a node. Databases with a known engine get `database-<engine>`.
pub fn icon_for(kind: PresentationKind, subtype: Option<&str>) -> &'static str {
    match kind {
        PresentationKind::App => ICON_APP,
        PresentationKind::Database => match subtype.map(str::to_ascii_lowercase).as_deref() {
            Some("postgres") | Some("postgresql") => "database-postgres",
            Some("mysql") => "database-mysql",
            Some("redis") => "database-redis",
            Some("mongodb") => "database-mongodb",
            _ => ICON_DATABASE,
        },
        PresentationKind::CustomResource => ICON_CUSTOM_RESOURCE,
        PresentationKind::Generic => ICON_GENERIC,
    }
}

pub fn get_edge_style(classification: EdgeClassification) -> EdgeStyle {
    match classification {
        EdgeClassification::Normal => EdgeStyle {
            color: COLOR_EDGE_NORMAL,
            width: 1.5,
            dashed: false,
            animated: false,
        },
        EdgeClassification::Degraded => EdgeStyle {
            color: COLOR_EDGE_DEGRADED,
            width: 2.5,
            dashed: true,
            animated: true,
        },
    }
}
