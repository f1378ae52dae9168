use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};
use std::fmt;

/// 24-bit RGB color, stored as `0xRRGGBB`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const DEFAULT_GREY: Color = Color(0xcccccc);

    /// Parses `"#rrggbb"`, `"0xrrggbb"` or plain hex digits.
    pub fn parse(text: &str) -> Option<Color> {
        let digits = text
            .trim()
            .trim_start_matches('#')
            .trim_start_matches("0x");
        // tolerate an alpha suffix as found in some authored palettes
        let digits = if digits.len() == 8 { &digits[..6] } else { digits };
        u32::from_str_radix(digits, 16)
            .ok()
            .map(|v| Color(v & 0x00ff_ffff))
    }

    pub fn to_vec3(self) -> glam::Vec3 {
        glam::Vec3::new(
            ((self.0 >> 16) & 0xff) as f32 / 255.0,
            ((self.0 >> 8) & 0xff) as f32 / 255.0,
            (self.0 & 0xff) as f32 / 255.0,
        )
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color(#{:06x})", self.0)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Num(u32),
            Text(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Num(n) => Ok(Color(n & 0x00ff_ffff)),
            Repr::Text(s) => {
                Color::parse(&s).ok_or_else(|| D::Error::custom(format!("invalid color: {s}")))
            }
        }
    }
}

/// Flat material state, the subset of a PBR material the state manager owns.
/// The live material of a mesh is shared (`Arc<RwLock<Material>>`) so that
/// tinting mutates in place while backup/restore swaps whole instances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Color,
    pub opacity: f32,
    pub transparent: bool,
    pub depth_write: bool,
    pub metalness: f32,
    pub roughness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Color::DEFAULT_GREY,
            opacity: 1.0,
            transparent: false,
            depth_write: true,
            metalness: 0.0,
            roughness: 1.0,
        }
    }
}

impl Material {
    pub fn with_color(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    /// The opaque default state, forced onto live materials when a restore is
    /// requested but no backup exists.
    pub fn force_opaque(&mut self) {
        self.transparent = false;
        self.opacity = 1.0;
        self.depth_write = true;
    }
}
