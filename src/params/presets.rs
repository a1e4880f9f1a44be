//! Named look presets, merged as partial overrides onto the default record.

use std::fmt;
use std::str::FromStr;

use glam::Vec3;

use super::SceneParameters;

/// Preset selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    /// Pale blue sky, soft white clouds
    #[default]
    Dreamy,

    /// Warm orange light, dense clouds, counter-rotating vortex
    Sunset,

    /// Dark navy storm with fast vortex and sharper detail
    Storm,

    /// Night sky with yellowish moon
    Moonlight,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::Dreamy,
        Preset::Sunset,
        Preset::Storm,
        Preset::Moonlight,
    ];

    /// Following preset in [`Preset::ALL`], wrapping around
    pub fn next(self) -> Preset {
        let index = Preset::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Preset::ALL[(index + 1) % Preset::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            Preset::Dreamy => "dreamy",
            Preset::Sunset => "sunset",
            Preset::Storm => "storm",
            Preset::Moonlight => "moonlight",
        }
    }

    /// Merge this preset's overrides onto `base`.
    ///
    /// Fields a preset does not mention keep their value from `base`.
    pub fn apply(self, base: SceneParameters) -> SceneParameters {
        match self {
            Preset::Dreamy => SceneParameters {
                background: srgb(0xA8BAC9),
                light_color_1: srgb(0xD1D1E0),
                light_color_2: srgb(0xFFF0F2),
                cloud_base: srgb(0xF2F2FF),
                cloud_shadow: srgb(0x59597A),
                sun_glow: srgb(0xFFFFFF),
                sun_core: srgb(0xFFFFFF),
                sun_glare: srgb(0xFFD9CC),
                vortex_speed: 0.3,
                vortex_twist: 0.1,
                ..base
            },
            Preset::Sunset => SceneParameters {
                background: srgb(0xDABCCA),
                light_color_1: srgb(0xFF9900),
                light_color_2: srgb(0xE7D4CB),
                cloud_base: srgb(0xFFDAB9),
                cloud_shadow: srgb(0x04052F),
                sun_glow: srgb(0xFFAA00),
                sun_core: srgb(0xFFFFCC),
                sun_glare: srgb(0xE2C5A7),
                cloud_density: 3.8,
                sun_core_pow: 36.0,
                sun_glare_pow: 16.0,
                vortex_speed: -0.6,
                vortex_twist: 0.2,
                ..base
            },
            Preset::Storm => SceneParameters {
                background: srgb(0x05186B),
                light_color_1: srgb(0xB4BFCB),
                light_color_2: srgb(0xA6BACE),
                cloud_base: srgb(0x4B5C74),
                cloud_shadow: srgb(0x000000),
                sun_glow: srgb(0xDFE3EC),
                sun_core: srgb(0xAADDFF),
                sun_glare: srgb(0x0F2D61),
                vortex_speed: 0.9,
                vortex_twist: -0.15,
                noise_scale_detail: 0.9,
                sun_core_pow: 11.0,
                sun_glare_pow: 16.0,
                ..base
            },
            Preset::Moonlight => SceneParameters {
                background: srgb(0x080C15),
                light_color_1: srgb(0x6B6D70),
                light_color_2: srgb(0xBABEC5),
                cloud_base: srgb(0x989655),
                cloud_shadow: srgb(0x050810),
                sun_glow: srgb(0xF4FFA3),
                sun_core: srgb(0xFFFCE5),
                sun_glare: srgb(0x10337A),
                sun_core_pow: 67.0,
                sun_glare_pow: 16.0,
                vortex_speed: -0.6,
                vortex_twist: 0.2,
                ..base
            },
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        match lowered.as_str() {
            "default" => Ok(Preset::Dreamy),
            "moon" => Ok(Preset::Moonlight),
            _ => Preset::ALL
                .into_iter()
                .find(|preset| preset.name() == lowered)
                .ok_or_else(|| {
                    format!("unknown preset '{s}' (expected dreamy, sunset, storm or moonlight)")
                }),
        }
    }
}

/// Convert a packed 0xRRGGBB sRGB color to linear light
pub fn srgb(hex: u32) -> Vec3 {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xFF) as f32 / 255.0);
    Vec3::new(channel(16), channel(8), channel(0))
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srgb_endpoints() {
        assert_eq!(srgb(0x000000), Vec3::ZERO);
        assert!((srgb(0xFFFFFF) - Vec3::ONE).abs().max_element() < 1e-6);
    }

    #[test]
    fn test_srgb_matches_linear_defaults() {
        // #A8BAC9 was authored as the sRGB encoding of (0.4, 0.5, 0.6)
        let bg = srgb(0xA8BAC9);
        assert!((bg - Vec3::new(0.4, 0.5, 0.6)).abs().max_element() < 0.02);
    }

    #[test]
    fn test_presets_only_override_their_fields() {
        let base = SceneParameters {
            render_steps: 64,
            tunnel_radius: 2.2,
            ..Default::default()
        };
        for preset in Preset::ALL {
            let params = preset.apply(base.clone());
            assert_eq!(params.render_steps, 64);
            assert_eq!(params.tunnel_radius, 2.2);
            assert_eq!(params.validate(), Ok(()), "{preset} is invalid");
        }
    }

    #[test]
    fn test_storm_overrides_detail_scale() {
        let params = Preset::Storm.apply(SceneParameters::default());
        assert_eq!(params.noise_scale_detail, 0.9);
        assert_eq!(params.vortex_twist, -0.15);
    }

    #[test]
    fn test_next_visits_every_preset() {
        let mut preset = Preset::Dreamy;
        let mut seen = Vec::new();
        for _ in 0..Preset::ALL.len() {
            preset = preset.next();
            seen.push(preset);
        }
        assert_eq!(seen, [Preset::Sunset, Preset::Storm, Preset::Moonlight, Preset::Dreamy]);
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!("Sunset".parse::<Preset>(), Ok(Preset::Sunset));
        assert_eq!("moon".parse::<Preset>(), Ok(Preset::Moonlight));
        assert_eq!("default".parse::<Preset>(), Ok(Preset::Dreamy));
        assert!("fog".parse::<Preset>().is_err());
    }
}
