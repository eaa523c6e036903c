//! Volume curve applied to external sink volume commands

/// Device volume at full scale
pub const VOLUME_FULL_SCALE: f32 = 65536.0;

/// Bluetooth AVRCP absolute volume divisor (0..127 maps onto 0..1)
pub const BT_VOLUME_DIVISOR: f32 = 128.0;

/// Receives device volume changes
///
/// Implemented by the DAC/renderer layer. Volume commands never touch the
/// output buffer, so this is called without the buffer lock held.
pub trait VolumeControl: Send + Sync {
    /// Set the left/right device volume (0 to 65536)
    fn set_volume(&self, left: u32, right: u32);
}

/// Map a linear 0..1 level onto the device scale
///
/// Uses a cubic curve: `round(65536 * level^3)`. Input is clamped.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn volume_curve(level: f32) -> u32 {
    let level = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };
    (VOLUME_FULL_SCALE * level.powi(3)).round() as u32
}

/// Left/right device volume pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceVolume {
    /// Left channel
    pub left: u32,
    /// Right channel
    pub right: u32,
}

impl DeviceVolume {
    /// Same volume on both channels
    #[must_use]
    pub fn mono(volume: u32) -> Self {
        Self {
            left: volume,
            right: volume,
        }
    }

    /// From an AirPlay linear volume (0.0 to 1.0)
    #[must_use]
    pub fn from_linear(level: f32) -> Self {
        Self::mono(volume_curve(level))
    }

    /// From a Bluetooth absolute volume (0 to 127)
    #[must_use]
    pub fn from_bluetooth(raw: u16) -> Self {
        Self::mono(volume_curve(f32::from(raw) / BT_VOLUME_DIVISOR))
    }

    /// Apply to a device
    pub fn apply(self, control: &dyn VolumeControl) {
        control.set_volume(self.left, self.right);
    }
}
