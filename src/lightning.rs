//! Lightning veins running along the tunnel wall.
//!
//! Time is cut into short slots. A slot either fires (random trigger or the
//! audio beat) or stays dark; a firing slot places one bolt at a pseudo-random
//! angle around the wall and lights everything near it.

use std::f32::consts::{PI, TAU};

use glam::{Vec3, Vec3Swizzles};

use crate::noise::{smoothstep, NoiseSource};
use crate::params::SceneParameters;
use crate::path::PathModel;

/// Trigger slots per second
pub const SLOTS_PER_SECOND: f32 = 8.0;

/// Beat level that fires a strike in audio-sync mode
const BEAT_TRIGGER_FLOOR: f32 = 0.1;

/// Envelopes below this are treated as dark
const MIN_FLASH: f32 = 0.001;

const GLOW_SOFTNESS: f32 = 0.1;
const CORE_SOFTNESS: f32 = 0.0001;
const CORE_STRENGTH: f32 = 0.002;

/// Lightning contribution at a point
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Strike {
    /// Thin emissive channel
    pub core: f32,

    /// Broad illumination around the channel
    pub glow: f32,
}

/// A firing slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flash {
    /// Slot index, seeds the strike placement
    pub slot: f32,

    /// Envelope in (0, 1]
    pub envelope: f32,
}

/// Classic sine-fract hash in [0, 1)
#[inline]
pub fn hash(n: f32) -> f32 {
    let x = n.sin() * 43_758.547;
    x - x.floor()
}

/// Lightning for one frame, given the beat snapshot for that frame
#[derive(Debug, Clone)]
pub struct LightningField<N> {
    noise: N,
    path: PathModel,
    enabled: bool,
    chance: f32,
    audio_sync: bool,
    tunnel_radius: f32,
    beat: f32,
}

impl<N: NoiseSource> LightningField<N> {
    pub fn new(params: &SceneParameters, noise: N, beat: f32) -> Self {
        Self {
            noise,
            path: PathModel::new(params),
            enabled: params.lightning_enabled,
            chance: params.lightning_chance,
            audio_sync: params.lightning_audio_sync,
            tunnel_radius: params.tunnel_radius,
            beat,
        }
    }

    /// Flash for the slot containing `time`, if that slot fires
    pub fn flash(&self, time: f32) -> Option<Flash> {
        if !self.enabled {
            return None;
        }

        let t = time * SLOTS_PER_SECOND;
        let slot = t.floor();
        let local = t - slot;

        let envelope = if self.audio_sync {
            if self.beat <= BEAT_TRIGGER_FLOOR {
                return None;
            }
            self.beat * self.beat
        } else {
            if hash(slot) >= self.chance {
                return None;
            }
            // Fast rise, slower fall, sharpened
            let pulse = smoothstep(0.0, 0.1, local) * smoothstep(1.0, 0.3, local);
            pulse.powi(3)
        };

        (envelope >= MIN_FLASH).then_some(Flash { slot, envelope })
    }

    /// Angle of the bolt around the tunnel axis at depth `z`
    pub fn vein_angle(&self, slot: f32, z: f32) -> f32 {
        let base = hash(slot + 13.0) * 6.28;
        // Coarse wiggle unique to the slot, plus a finer shared one
        let coarse = self.noise.evaluate(Vec3::new(0.0, 0.0, z * 0.15 + slot * 10.0)) * 2.0;
        let fine = self.noise.evaluate(Vec3::new(0.0, 0.0, z * 0.8)) * 0.5;
        base + coarse + fine
    }

    /// Core and glow at `p`, both zero when no slot is firing
    pub fn strike(&self, p: Vec3, time: f32) -> Strike {
        let Some(flash) = self.flash(time) else {
            return Strike::default();
        };

        let rel = (p - self.path.at(p.z)).xy();
        let r = rel.length();

        let mut diff = (rel.y.atan2(rel.x) - self.vein_angle(flash.slot, p.z)).rem_euclid(TAU);
        if diff > PI {
            diff = TAU - diff;
        }

        let wall = (r - self.tunnel_radius).abs();
        let d2 = (diff * r).powi(2) + wall * wall;

        Strike {
            core: CORE_STRENGTH / (d2 + CORE_SOFTNESS) * flash.envelope,
            glow: 1.0 / (d2 + GLOW_SOFTNESS) * flash.envelope,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    /// Noise that is zero everywhere, so veins do not wiggle
    struct Flat;

    impl NoiseSource for Flat {
        fn evaluate(&self, _coord: Vec3) -> f32 {
            0.0
        }
    }

    fn storm(chance: f32) -> SceneParameters {
        SceneParameters {
            lightning_enabled: true,
            lightning_chance: chance,
            ..Default::default()
        }
    }

    fn peak_time(slot: u32) -> f32 {
        (slot as f32 + 0.2) / SLOTS_PER_SECOND
    }

    #[test]
    fn test_disabled_is_dark_everywhere() {
        let params = SceneParameters {
            lightning_enabled: false,
            lightning_chance: 1.0,
            ..Default::default()
        };
        let field = LightningField::new(&params, Flat, 1.0);
        for i in 0..100 {
            let f = i as f32;
            let p = Vec3::new(f.sin() * 2.0, f.cos() * 2.0, f);
            assert_eq!(field.strike(p, f * 0.037), Strike::default());
        }
    }

    #[test]
    fn test_certain_chance_fires_every_slot_at_peak() {
        let field = LightningField::new(&storm(1.0), Flat, 0.0);
        for slot in 0..200 {
            let flash = field.flash(peak_time(slot)).expect("slot should fire");
            assert!((flash.envelope - 1.0).abs() < 1e-5);
            assert_eq!(flash.slot, slot as f32);

            let s = field.strike(Vec3::new(1.7, 2.5, 3.0), peak_time(slot));
            assert!(s.core > 0.0 && s.glow > 0.0);
        }
    }

    #[test]
    fn test_zero_chance_never_fires() {
        let field = LightningField::new(&storm(0.0), Flat, 0.0);
        assert!((0..200).all(|slot| field.flash(peak_time(slot)).is_none()));
    }

    #[test]
    fn test_envelope_is_dark_at_slot_edges() {
        let field = LightningField::new(&storm(1.0), Flat, 0.0);
        assert!(field.flash(0.0).is_none());
        assert!(field.flash(0.99 / SLOTS_PER_SECOND).is_none());
    }

    #[test]
    fn test_audio_sync_follows_beat() {
        let params = SceneParameters {
            lightning_audio_sync: true,
            lightning_chance: 0.0,
            ..storm(0.0)
        };

        let quiet = LightningField::new(&params, Flat, 0.05);
        assert!(quiet.flash(1.0).is_none());

        let loud = LightningField::new(&params, Flat, 0.6);
        // Chance is ignored and the envelope is the squared beat at any local time
        for time in [0.0, 0.51, 3.99] {
            let flash = loud.flash(time).expect("beat should fire");
            assert!((flash.envelope - 0.36).abs() < 1e-6);
        }
    }

    #[test]
    fn test_core_peaks_on_the_vein() {
        let params = storm(1.0);
        let field = LightningField::new(&params, Flat, 0.0);
        let time = peak_time(5);
        let z = 4.0;

        let angle = field.vein_angle(5.0, z);
        let on_wall = Vec2::from_angle(angle) * params.tunnel_radius;
        let on_vein = PathModel::new(&params).at(z) + on_wall.extend(0.0);

        let s = field.strike(on_vein, time);
        assert!((s.core - CORE_STRENGTH / CORE_SOFTNESS).abs() < 0.5);
        assert!((s.glow - 1.0 / GLOW_SOFTNESS).abs() < 0.05);

        let off_vein = on_vein - on_wall.extend(0.0) * 0.5;
        let off = field.strike(off_vein, time);
        assert!(off.core < s.core * 0.01);
        assert!(off.glow < s.glow);
    }

    #[test]
    fn test_hash_range() {
        for i in -500..500 {
            let h = hash(i as f32 * 0.73);
            assert!((0.0..1.0).contains(&h));
        }
    }
}
