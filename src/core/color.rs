//! Colour primitives: RGB triples, HSL conversion, the literal colour parser,
//! the heat scale and a zero-alloc ANSI true-colour wrapper for previews.

use std::{fmt, str};

use serde::Serialize;
use thiserror::Error;

use crate::core::constants::{
    COLOR_LIGHTNESS, COLOR_SATURATION, HEAT_DEGENERATE_T, HEAT_LOWER_HUE, HEAT_UPPER_HUE,
};

#[derive(Debug, Error, PartialEq)]
pub enum ColorError {
    #[error("invalid hex colour digit in \"{0}\"")]
    InvalidHexDigit(String),
    #[error("hex colour must be exactly 6 digits: \"{0}\"")]
    InvalidHexLength(String),
    #[error("expected three comma separated components in \"{0}\"")]
    BadComponents(String),
    #[error("unrecognized colour \"{0}\"")]
    Unrecognized(String),
}

// --- Rgb ---

/// Colour with each channel in `[0, 1]` (by convention; literal `rgb(...)`
/// components are passed through unchecked).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Packed `0xRRGGBB`. Bits above 24 are ignored.
    #[must_use]
    pub fn from_packed(hex: u32) -> Self {
        let byte = |shift: u32| f32::from(((hex >> shift) & 0xFF) as u8) / 255.0;
        Self::new(byte(16), byte(8), byte(0))
    }

    /// HSL to RGB. Hue wraps around, saturation and lightness are clamped.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_hsl(h: f64, s: f64, l: f64) -> Self {
        let h = h.rem_euclid(1.0);
        let s = s.clamp(0.0, 1.0);
        let l = l.clamp(0.0, 1.0);
        if s == 0.0 {
            let v = l as f32;
            return Self::new(v, v, v);
        }
        let q = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        Self::new(
            hue_to_channel(p, q, h + 1.0 / 3.0) as f32,
            hue_to_channel(p, q, h) as f32,
            hue_to_channel(p, q, h - 1.0 / 3.0) as f32,
        )
    }

    /// Channels scaled to bytes, for terminal output.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_bytes(self) -> (u8, u8, u8) {
        let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        (byte(self.r), byte(self.g), byte(self.b))
    }

    #[must_use]
    pub fn to_hex(self) -> String {
        let (r, g, b) = self.to_bytes();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

fn hue_to_channel(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

// --- Literal colours ---

/// A colour as a user writes it: a packed integer or a colour string.
#[derive(Clone, Debug, PartialEq)]
pub enum ColorValue {
    Packed(u32),
    Literal(String),
}

impl From<u32> for ColorValue {
    fn from(v: u32) -> Self {
        Self::Packed(v)
    }
}

impl From<&str> for ColorValue {
    fn from(s: &str) -> Self {
        // `0xRRGGBB` on the command line means a packed integer
        match s.trim().strip_prefix("0x").map(|h| u32::from_str_radix(h, 16)) {
            Some(Ok(v)) => Self::Packed(v),
            _ => Self::Literal(s.to_owned()),
        }
    }
}

impl fmt::Display for ColorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Packed(v) => write!(f, "0x{v:06x}"),
            Self::Literal(s) => f.write_str(s),
        }
    }
}

/// `true` if the string starts like one of the literal colour syntaxes.
#[must_use]
pub fn looks_like_color(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    lower.starts_with("rgb") || lower.starts_with("hsl") || (lower.starts_with('#') && lower.len() == 7)
}

/// Parse a packed integer, `rgb(r,g,b)`, `hsl(h,s,l)` or `#rrggbb`.
pub fn parse_color(value: &ColorValue) -> Result<Rgb, ColorError> {
    match value {
        ColorValue::Packed(v) => Ok(Rgb::from_packed(*v)),
        ColorValue::Literal(s) => parse_color_str(s),
    }
}

pub fn parse_color_str(s: &str) -> Result<Rgb, ColorError> {
    let t = s.trim();
    let lower = t.to_ascii_lowercase();
    if lower.starts_with("rgb") {
        let [r, g, b] = components(t)?;
        #[allow(clippy::cast_possible_truncation)]
        return Ok(Rgb::new(r as f32, g as f32, b as f32));
    }
    if lower.starts_with("hsl") {
        let [h, s, l] = components(t)?;
        return Ok(Rgb::from_hsl(h, s, l));
    }
    if t.starts_with('#') {
        return from_hex(t);
    }
    Err(ColorError::Unrecognized(t.to_owned()))
}

/// The three numbers between `xxx(` and `)`.
fn components(s: &str) -> Result<[f64; 3], ColorError> {
    let bad = || ColorError::BadComponents(s.to_owned());
    let open = s.find('(').ok_or_else(bad)?;
    let inner = s[open + 1..].trim_end().strip_suffix(')').ok_or_else(bad)?;
    let mut out = [0.0; 3];
    let mut parts = inner.split(',');
    for slot in &mut out {
        let part = parts.next().ok_or_else(bad)?;
        *slot = lexical_core::parse::<f64>(part.trim().as_bytes()).map_err(|_| bad())?;
    }
    if parts.next().is_some() {
        return Err(bad());
    }
    Ok(out)
}

fn from_hex(hex: &str) -> Result<Rgb, ColorError> {
    let h = hex.trim_start_matches('#');
    if h.len() != 6 {
        return Err(ColorError::InvalidHexLength(hex.to_owned()));
    }
    u32::from_str_radix(h, 16)
        .map(Rgb::from_packed)
        .map_err(|_| ColorError::InvalidHexDigit(hex.to_owned()))
}

// --- Heat scale ---

/// Map `value` within `[min, max]` onto the heat hues: `min` lands on
/// [`HEAT_LOWER_HUE`] (blue-purple), `max` on [`HEAT_UPPER_HUE`] (red).
/// `hue_offset` rotates the result around the colour wheel.
#[must_use]
pub fn heat(value: f64, min: f64, max: f64, hue_offset: f64) -> Rgb {
    let span = max - min;
    let mut t = (value - min) / span;
    if span == 0.0 || !t.is_finite() {
        t = HEAT_DEGENERATE_T;
    }
    Rgb::from_hsl(heat_hue(t, hue_offset), COLOR_SATURATION, COLOR_LIGHTNESS)
}

/// Hue of a normalized heat position.
#[inline]
#[must_use]
pub fn heat_hue(t: f64, hue_offset: f64) -> f64 {
    let hue = t * (HEAT_UPPER_HUE - HEAT_LOWER_HUE) + HEAT_LOWER_HUE;
    (hue + hue_offset).rem_euclid(1.0)
}

// --- AnsiCode ---

/// Terminal colour escape, either a fixed sequence or a true-colour one
/// built inline without allocating.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AnsiCode {
    Static(&'static str),
    Inline { buf: [u8; 20], len: u8 },
}

impl AnsiCode {
    #[inline]
    pub const fn reset() -> Self {
        Self::Static("\x1b[0m")
    }

    pub const fn dim() -> Self {
        Self::Static("\x1b[2m")
    }

    /// True-colour escape `ESC[38;2;R;G;Bm`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        let mut buf = [0u8; 20];
        buf[..7].copy_from_slice(b"\x1b[38;2;");
        let mut len = 7;

        for (i, v) in [r, g, b].into_iter().enumerate() {
            len += write_u8(&mut buf[len..], v);
            if i != 2 {
                buf[len] = b';';
                len += 1;
            }
        }
        buf[len] = b'm';
        len += 1;
        Self::Inline {
            buf,
            len: len as u8,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Static(s) => s,
            // only ever filled with ASCII by `rgb`
            Self::Inline { buf, len } => str::from_utf8(&buf[..*len as usize]).unwrap_or(""),
        }
    }
}

impl From<Rgb> for AnsiCode {
    fn from(c: Rgb) -> Self {
        let (r, g, b) = c.to_bytes();
        Self::rgb(r, g, b)
    }
}

fn write_u8(dst: &mut [u8], mut n: u8) -> usize {
    let mut tmp = [0u8; 3];
    let mut i = 3;
    loop {
        i -= 1;
        tmp[i] = b'0' + n % 10;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    let len = 3 - i;
    dst[..len].copy_from_slice(&tmp[i..]);
    len
}

impl fmt::Display for AnsiCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wrap `text` in colour + reset sequence.
#[inline]
#[must_use]
pub fn colorize(c: &AnsiCode, text: &str) -> String {
    format!("{c}{text}{}", AnsiCode::reset())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn close(a: Rgb, b: Rgb) -> bool {
        (a.r - b.r).abs() < EPS && (a.g - b.g).abs() < EPS && (a.b - b.b).abs() < EPS
    }

    #[test]
    fn test_hex_and_packed() {
        assert_eq!(parse_color_str("#ff0000").unwrap(), Rgb::new(1.0, 0.0, 0.0));
        assert_eq!(parse_color(&ColorValue::Packed(0x00_00ff)).unwrap(), Rgb::new(0.0, 0.0, 1.0));
        assert_eq!(ColorValue::from("0xff6600"), ColorValue::Packed(0xff_6600));
        assert!(matches!(parse_color_str("#ff00"), Err(ColorError::InvalidHexLength(_))));
        assert!(matches!(parse_color_str("#gg0000"), Err(ColorError::InvalidHexDigit(_))));
    }

    #[test]
    fn test_rgb_components_pass_through() {
        assert_eq!(parse_color_str("rgb(0.1, 0.5,1)").unwrap(), Rgb::new(0.1, 0.5, 1.0));
        assert_eq!(parse_color_str("RGB(255,0,0)").unwrap(), Rgb::new(255.0, 0.0, 0.0));
        assert!(parse_color_str("rgb(1,2)").is_err());
        assert!(parse_color_str("rgb(1,2,3,4)").is_err());
    }

    #[test]
    fn test_hsl() {
        assert!(close(parse_color_str("hsl(0,1,0.5)").unwrap(), Rgb::new(1.0, 0.0, 0.0)));
        assert!(close(Rgb::from_hsl(1.0 / 3.0, 1.0, 0.5), Rgb::new(0.0, 1.0, 0.0)));
        assert!(close(Rgb::from_hsl(0.5, 0.0, 0.25), Rgb::new(0.25, 0.25, 0.25)));
    }

    #[test]
    fn test_unrecognized() {
        assert!(matches!(parse_color_str("tomato"), Err(ColorError::Unrecognized(_))));
    }

    #[test]
    fn test_heat_boundaries() {
        let hsl = |h| Rgb::from_hsl(h, COLOR_SATURATION, COLOR_LIGHTNESS);
        assert!(close(heat(-3.0, -3.0, 5.0, 0.0), hsl(0.7)));
        assert!(close(heat(5.0, -3.0, 5.0, 0.0), hsl(0.0)));
        assert!((heat_hue(0.5, 0.0) - 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_heat_degenerate_is_defined() {
        let c = heat(2.0, 2.0, 2.0, 0.0);
        assert!(c.r.is_finite() && c.g.is_finite() && c.b.is_finite());
        assert_eq!(c, heat(7.0, 7.0, 7.0, 0.0));
    }

    #[test]
    fn test_heat_hue_offset_wraps() {
        assert!((heat_hue(1.0, 0.25) - 0.25).abs() < 1e-12);
        assert!((heat_hue(0.0, 0.5) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_looks_like_color() {
        assert!(looks_like_color("rgb(1,1,1)"));
        assert!(looks_like_color("#123abc"));
        assert!(!looks_like_color("#12"));
        assert!(!looks_like_color("dog"));
    }

    #[test]
    fn test_ansi_rgb() {
        assert_eq!(AnsiCode::rgb(255, 0, 7).as_str(), "\x1b[38;2;255;0;7m");
        assert_eq!(AnsiCode::from(Rgb::new(1.0, 0.0, 0.0)).as_str(), "\x1b[38;2;255;0;0m");
    }
}
