use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Accepts `#rrggbb` and `#rgb`, with or without the leading `#`.
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.trim().trim_start_matches('#');
        if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::new(r, g, b))
            }
            3 => {
                let digit = |idx: usize| u8::from_str_radix(&hex[idx..idx + 1], 16).ok();
                let (r, g, b) = (digit(0)?, digit(1)?, digit(2)?);
                Some(Self::new(r * 17, g * 17, b * 17))
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Brightens in HSV space; `factor` is a percentage (125 = 25 % brighter).
    /// Once value saturates, the remainder is taken out of saturation.
    pub fn lighter(self, factor: u32) -> Self {
        if factor == 0 {
            return self;
        }
        let (h, mut s, v) = self.to_hsv();
        let mut v = v * factor as f32 / 100.0;
        if v > 255.0 {
            s = (s - (v - 255.0)).max(0.0);
            v = 255.0;
        }
        Self::from_hsv(h, s, v)
    }

    /// Dark or light text, whichever reads better on top of `self`.
    pub fn contrast_text(self) -> Rgb {
        let luminance =
            f32::from(self.r) * 0.299 + f32::from(self.g) * 0.587 + f32::from(self.b) * 0.114;
        if luminance >= 150.0 {
            Rgb::new(0x11, 0x18, 0x27)
        } else {
            Rgb::new(0xf8, 0xfa, 0xfc)
        }
    }

    fn to_hsv(self) -> (f32, f32, f32) {
        let r = f32::from(self.r);
        let g = f32::from(self.g);
        let b = f32::from(self.b);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let s = if max <= 0.0 { 0.0 } else { delta / max * 255.0 };
        let h = if delta <= 0.0 {
            0.0
        } else if max == r {
            60.0 * ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };
        (h, s, max)
    }

    fn from_hsv(h: f32, s: f32, v: f32) -> Self {
        let s = (s / 255.0).clamp(0.0, 1.0);
        let v = (v / 255.0).clamp(0.0, 1.0);
        let c = v * s;
        let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
        let m = v - c;
        let (r, g, b) = match (h / 60.0) as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let channel = |value: f32| ((value + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Self::new(channel(r), channel(g), channel(b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

pub const PROFILE_PALETTE: [Rgb; 8] = [
    Rgb::new(0x38, 0xbd, 0xf8),
    Rgb::new(0xf4, 0x72, 0xb6),
    Rgb::new(0x22, 0xc5, 0x5e),
    Rgb::new(0xf5, 0x9e, 0x0b),
    Rgb::new(0xef, 0x44, 0x44),
    Rgb::new(0xa8, 0x55, 0xf7),
    Rgb::new(0x14, 0xb8, 0xa6),
    Rgb::new(0xea, 0xb3, 0x08),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(Rgb::from_hex("#2b313b"), Some(Rgb::new(0x2b, 0x31, 0x3b)));
        assert_eq!(Rgb::from_hex("8AFB71"), Some(Rgb::new(0x8a, 0xfb, 0x71)));
        assert_eq!(Rgb::from_hex("#fff"), Some(Rgb::new(255, 255, 255)));
        assert_eq!(Rgb::from_hex("#12345"), None);
        assert_eq!(Rgb::from_hex("#zzzzzz"), None);
        assert_eq!(Rgb::new(0x6d, 0xd3, 0xfb).to_hex(), "#6dd3fb");
    }

    #[test]
    fn lighter_brightens_without_changing_hue_family() {
        let base = Rgb::new(0x40, 0x80, 0x20);
        let light = base.lighter(125);
        assert!(light.g > base.g);
        assert!(light.g >= light.r && light.g >= light.b);
        assert_eq!(Rgb::new(0, 0, 0).lighter(125), Rgb::new(0, 0, 0));
    }

    #[test]
    fn contrast_text_flips_on_bright_backgrounds() {
        assert_eq!(Rgb::new(255, 255, 255).contrast_text(), Rgb::new(0x11, 0x18, 0x27));
        assert_eq!(Rgb::new(0x1f, 0x29, 0x37).contrast_text(), Rgb::new(0xf8, 0xfa, 0xfc));
    }

    #[test]
    fn lighter_on_saturated_value_desaturates() {
        let base = Rgb::new(0x8a, 0xfb, 0x71);
        let light = base.lighter(125);
        assert_eq!(light.g, 255);
        assert!(light.r > base.r);
        assert!(light.b > base.b);
    }
}
