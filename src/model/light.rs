use super::{BaseInfo, YesNo};
use crate::diff::diff_schema;
use serde::{Deserialize, Serialize};

/// Highest raw brightness value the gateway accepts.
pub const MAX_DIM: u8 = 254;

/// On/off plus brightness, shared by lights and groups.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimmable {
    #[serde(rename = "5850", default, skip_serializing_if = "Option::is_none")]
    pub on: Option<YesNo>,

    #[serde(rename = "5851", default, skip_serializing_if = "Option::is_none")]
    pub dim: Option<u8>,
}

diff_schema!(Dimmable {
    scalar on => "on",
    scalar dim => "dim",
});

impl Dimmable {
    pub fn is_on(&self) -> bool {
        self.on.is_some_and(|on| on.is_yes())
    }

    /// Brightness in percent, 0-100.
    pub fn dim_percent(&self) -> u8 {
        dim_percent(self.dim.unwrap_or(0))
    }

    pub fn set_on(&mut self, on: bool) {
        self.on = Some(YesNo::from(on));
    }

    pub fn set_dim_percent(&mut self, percent: u8) {
        self.dim = Some(calc_dim(percent));
    }
}

// The gateway scale is piecewise linear: 1:1 up to 10%, two steps per
// percent up to 40%, then 3.1 steps per percent up to 254.

/// Convert a raw 0-254 brightness to percent, rounded half up.
pub fn dim_percent(dim: u8) -> u8 {
    let dim = f64::from(dim);
    let percent = if dim <= 10.0 {
        dim
    } else if dim <= 69.0 {
        (dim + 11.0) / 2.0
    } else {
        (dim - 69.0) / 3.1 + 40.0
    };
    (percent + 0.5).floor().min(100.0) as u8
}

/// Convert a brightness percentage to the gateway's 0-254 scale.
pub fn calc_dim(percent: u8) -> u8 {
    match percent {
        0..=10 => percent,
        11..=40 => percent * 2 - 11,
        _ => {
            let dim = f64::from(percent - 40) * 3.1 + 69.0;
            dim.min(f64::from(MAX_DIM)) as u8
        }
    }
}

/// The three white-spectrum presets the gateway supports natively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTemperature {
    Cold,
    Normal,
    Warm,
}

impl ColorTemperature {
    pub fn hex(&self) -> &'static str {
        match self {
            ColorTemperature::Cold => "f5faf6",
            ColorTemperature::Normal => "f1e0b5",
            ColorTemperature::Warm => "efd275",
        }
    }

    /// CIE xy coordinates in the gateway's 0-65535 scale.
    pub fn xy(&self) -> (u32, u32) {
        match self {
            ColorTemperature::Cold => (24930, 24694),
            ColorTemperature::Normal => (30140, 26909),
            ColorTemperature::Warm => (33135, 27211),
        }
    }

    /// Accepts the hex code or the preset name.
    pub fn from_hex(hex: &str) -> Option<Self> {
        match hex.to_ascii_lowercase().as_str() {
            "f5faf6" | "cold" => Some(ColorTemperature::Cold),
            "f1e0b5" | "normal" => Some(ColorTemperature::Normal),
            "efd275" | "warm" => Some(ColorTemperature::Warm),
            _ => None,
        }
    }

    /// Nearest preset for a color temperature in mireds.
    pub fn from_mireds(mireds: u32) -> Self {
        if mireds < 150 {
            ColorTemperature::Cold
        } else if mireds < 250 {
            ColorTemperature::Normal
        } else {
            ColorTemperature::Warm
        }
    }

    /// Representative mired value reported for the preset.
    pub fn mireds(&self) -> u32 {
        match self {
            ColorTemperature::Cold => 111,
            ColorTemperature::Normal => 222,
            ColorTemperature::Warm => 400,
        }
    }
}

/// Colour and brightness settings of a light, also stored in scenes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LightSetting {
    #[serde(flatten)]
    pub base: BaseInfo,

    #[serde(flatten)]
    pub dimmable: Dimmable,

    #[serde(rename = "5706", default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(rename = "5707", default, skip_serializing_if = "Option::is_none")]
    pub hue: Option<u32>,

    #[serde(rename = "5708", default, skip_serializing_if = "Option::is_none")]
    pub saturation: Option<u32>,

    #[serde(rename = "5709", default, skip_serializing_if = "Option::is_none")]
    pub color_x: Option<u32>,

    #[serde(rename = "5710", default, skip_serializing_if = "Option::is_none")]
    pub color_y: Option<u32>,

    #[serde(rename = "5711", default, skip_serializing_if = "Option::is_none")]
    pub color_temperature: Option<u32>,
}

diff_schema!(LightSetting {
    flatten base => "base",
    flatten dimmable => "dimmable",
    scalar color => "color",
    scalar hue => "hue",
    scalar saturation => "saturation",
    scalar color_x => "color_x",
    scalar color_y => "color_y",
    scalar color_temperature => "color_temperature",
});

impl LightSetting {
    /// Select a preset by hex code plus its matching xy coordinates.
    pub fn set_color_temperature(&mut self, preset: ColorTemperature) {
        let (x, y) = preset.xy();
        self.color = Some(preset.hex().to_string());
        self.color_x = Some(x);
        self.color_y = Some(y);
    }

    pub fn color_temperature_preset(&self) -> Option<ColorTemperature> {
        if let Some(preset) = self.color.as_deref().and_then(ColorTemperature::from_hex) {
            return Some(preset);
        }
        self.color_temperature.map(ColorTemperature::from_mireds)
    }
}

/// A light bulb entry of a device (key 3311).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Light {
    #[serde(flatten)]
    pub setting: LightSetting,

    #[serde(rename = "5712", default, skip_serializing_if = "Option::is_none")]
    pub transition_time: Option<u32>,

    #[serde(rename = "5805", default, skip_serializing_if = "Option::is_none")]
    pub cumulative_active_power: Option<f64>,

    #[serde(rename = "5852", default, skip_serializing_if = "Option::is_none")]
    pub on_time: Option<i64>,

    #[serde(rename = "5820", default, skip_serializing_if = "Option::is_none")]
    pub power_factor: Option<f64>,

    #[serde(rename = "5701", default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

diff_schema!(Light {
    flatten setting => "setting",
    scalar transition_time => "transition_time",
    scalar cumulative_active_power => "cumulative_active_power",
    scalar on_time => "on_time",
    scalar power_factor => "power_factor",
    scalar unit => "unit",
});
