use crate::prelude::{ModelKind, TrackSource};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(hex: u32) -> Self {
        Self {
            r: (hex >> 16) as u8,
            g: (hex >> 8) as u8,
            b: hex as u8,
            a: 255,
        }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

pub const AI_COLOR: Rgba = Rgba::rgb(0x4285f4);
pub const ECMWF_COLOR: Rgba = Rgba::rgb(0x34a853);
pub const GFS_COLOR: Rgba = Rgba::rgb(0xfbbc04);
pub const ACTUAL_COLOR: Rgba = Rgba::rgb(0xea4335);

/// Fixed per-source track color; independent of the theme.
pub fn track_color(source: TrackSource) -> Rgba {
    match source {
        TrackSource::Model(ModelKind::Ai) => AI_COLOR,
        TrackSource::Model(ModelKind::Ecmwf) => ECMWF_COLOR,
        TrackSource::Model(ModelKind::Gfs) => GFS_COLOR,
        TrackSource::Actual => ACTUAL_COLOR,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn palette(self) -> ThemePalette {
        match self {
            Theme::Dark => ThemePalette {
                bg_primary: Rgba::rgb(0x0a0a1a),
                bg_secondary: Rgba::rgb(0x12122a),
                bg_card: Rgba::rgb(0xffffff).with_alpha(13),
                border: Rgba::rgb(0xffffff).with_alpha(26),
                text_primary: Rgba::rgb(0xffffff),
                text_secondary: Rgba::rgb(0xffffff).with_alpha(179),
                ocean: Rgba::rgb(0x0a1628),
                land: Rgba::rgb(0x28503c).with_alpha(230),
                globe_bg: Rgba::rgb(0x050510),
            },
            Theme::Light => ThemePalette {
                bg_primary: Rgba::rgb(0xf5f7fa),
                bg_secondary: Rgba::rgb(0xffffff),
                bg_card: Rgba::rgb(0x000000).with_alpha(8),
                border: Rgba::rgb(0x000000).with_alpha(26),
                text_primary: Rgba::rgb(0x1a1a2e),
                text_secondary: Rgba::rgb(0x000000).with_alpha(179),
                ocean: Rgba::rgb(0xa8d5e5),
                land: Rgba::rgb(0x508c64).with_alpha(230),
                globe_bg: Rgba::rgb(0xe8f4fc),
            },
        }
    }
}

/// Background and text colors for the scene and chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemePalette {
    pub bg_primary: Rgba,
    pub bg_secondary: Rgba,
    pub bg_card: Rgba,
    pub border: Rgba,
    pub text_primary: Rgba,
    pub text_secondary: Rgba,
    pub ocean: Rgba,
    pub land: Rgba,
    pub globe_bg: Rgba,
}
