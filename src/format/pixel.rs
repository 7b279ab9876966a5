use std::fmt::Write as _;

/// Build a DRM fourcc code from its four characters (little-endian).
pub const fn fourcc_code(a: u8, b: u8, c: u8, d: u8) -> u32 {
    (a as u32) | ((b as u32) << 8) | ((c as u32) << 16) | ((d as u32) << 24)
}

pub const DRM_FORMAT_ARGB8888: u32 = fourcc_code(b'A', b'R', b'2', b'4');
pub const DRM_FORMAT_XRGB8888: u32 = fourcc_code(b'X', b'R', b'2', b'4');
pub const DRM_FORMAT_ABGR8888: u32 = fourcc_code(b'A', b'B', b'2', b'4');

pub const DRM_FORMAT_MOD_LINEAR: u64 = 0;
pub const DRM_FORMAT_MOD_INVALID: u64 = 0x00ff_ffff_ffff_ffff;

/// Vendor bits of a modifier (top 8 bits).
pub const fn mod_vendor(modifier: u64) -> u8 {
    ((modifier >> 56) & 0xff) as u8
}

/// Vendor-specific layout code of a modifier (low 56 bits).
pub const fn mod_code(modifier: u64) -> u64 {
    modifier & 0x00ff_ffff_ffff_ffff
}

/// Known modifier vendors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Vendor {
    None,
    Intel,
    Amd,
    Nvidia,
    Samsung,
    Qcom,
    Vivante,
    Broadcom,
    Arm,
    Allwinner,
    Amlogic,
}

impl Vendor {
    pub fn from_modifier(modifier: u64) -> Option<Self> {
        Some(match mod_vendor(modifier) {
            0x00 => Self::None,
            0x01 => Self::Intel,
            0x02 => Self::Amd,
            0x03 => Self::Nvidia,
            0x04 => Self::Samsung,
            0x05 => Self::Qcom,
            0x06 => Self::Vivante,
            0x07 => Self::Broadcom,
            0x08 => Self::Arm,
            0x09 => Self::Allwinner,
            0x0a => Self::Amlogic,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "DRM_FORMAT_MOD_VENDOR_NONE",
            Self::Intel => "DRM_FORMAT_MOD_VENDOR_INTEL",
            Self::Amd => "DRM_FORMAT_MOD_VENDOR_AMD",
            Self::Nvidia => "DRM_FORMAT_MOD_VENDOR_NVIDIA",
            Self::Samsung => "DRM_FORMAT_MOD_VENDOR_SAMSUNG",
            Self::Qcom => "DRM_FORMAT_MOD_VENDOR_QCOM",
            Self::Vivante => "DRM_FORMAT_MOD_VENDOR_VIVANTE",
            Self::Broadcom => "DRM_FORMAT_MOD_VENDOR_BROADCOM",
            Self::Arm => "DRM_FORMAT_MOD_VENDOR_ARM",
            Self::Allwinner => "DRM_FORMAT_MOD_VENDOR_ALLWINNER",
            Self::Amlogic => "DRM_FORMAT_MOD_VENDOR_AMLOGIC",
        }
    }
}

/// Vendor name for a modifier; unknown vendor bits map to `"Unknown"`.
pub fn vendor_name(modifier: u64) -> &'static str {
    Vendor::from_modifier(modifier).map_or("Unknown", Vendor::name)
}

/// A fourcc format plus modifiers in order of preference.
///
/// An empty modifier list means "no modifier constraint". The list is never reordered.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PixelFormat {
    fourcc: u32,
    modifiers: Vec<u64>,
}

impl PixelFormat {
    pub fn new(fourcc: u32, modifiers: impl Into<Vec<u64>>) -> Self {
        Self {
            fourcc,
            modifiers: modifiers.into(),
        }
    }

    /// Linear-only variant of `fourcc`.
    pub fn linear(fourcc: u32) -> Self {
        Self::new(fourcc, vec![DRM_FORMAT_MOD_LINEAR])
    }

    pub fn fourcc(&self) -> u32 {
        self.fourcc
    }

    pub fn modifiers(&self) -> &[u64] {
        &self.modifiers
    }

    /// True when `modifier` satisfies this format's constraint.
    pub fn accepts(&self, modifier: u64) -> bool {
        self.modifiers.is_empty() || self.modifiers.contains(&modifier)
    }

    /// The four code characters, e.g. `XR24`.
    pub fn fourcc_str(&self) -> String {
        self.fourcc
            .to_le_bytes()
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' })
            .collect()
    }
}

/// Human-readable, multi-line description of a format and its modifiers.
pub fn describe_format(preamble: &str, format: &PixelFormat) -> String {
    let mut line = format!(
        "{preamble} fourcc '{}' modifiers: [ \n",
        format.fourcc_str()
    );
    for &modifier in format.modifiers() {
        let _ = writeln!(
            line,
            "  {}: code 0x{:07x}",
            vendor_name(modifier),
            mod_code(modifier)
        );
    }
    line.push(']');
    line
}

#[cfg(test)]
#[path = "../../tests/unit/format/pixel.rs"]
mod tests;
