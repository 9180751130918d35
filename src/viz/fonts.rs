//! Font registration for the `ab_glyph` text path.
//!
//! `ab_glyph` does not discover OS fonts, so a file has to be registered by
//! name before any text is drawn. "sans-serif" is registered once per process
//! from `$NEON_TOKYO_FONT` or a list of common system locations. A theme
//! carrying `font_path` additionally registers that file under its
//! `font_family` name.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use anyhow::Result;
use plotters::style::{FontFamily, FontStyle, register_font};

use crate::error::NeonError;
use crate::theme::Theme;

pub const FONT_ENV: &str = "NEON_TOKYO_FONT";

const SYSTEM_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static SANS_SERIF: OnceLock<bool> = OnceLock::new();
static NAMED: Mutex<Vec<String>> = Mutex::new(Vec::new());

/// Read a font file and register it under `name`. The bytes live for the
/// rest of the process, as plotters requires.
fn register_file(name: &str, path: &Path) -> bool {
    let Ok(bytes) = std::fs::read(path) else {
        return false;
    };
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    match register_font(name, FontStyle::Normal, bytes) {
        Ok(()) => {
            log::debug!("registered font {name:?} from {}", path.display());
            true
        }
        Err(_) => {
            log::warn!("{} is not a usable font file", path.display());
            false
        }
    }
}

fn sans_serif_candidates() -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Some(p) = std::env::var_os(FONT_ENV) {
        out.push(PathBuf::from(p));
    }
    out.extend(SYSTEM_CANDIDATES.iter().map(PathBuf::from));
    out
}

fn ensure_sans_serif() -> bool {
    *SANS_SERIF.get_or_init(|| {
        sans_serif_candidates()
            .iter()
            .any(|p| p.is_file() && register_file("sans-serif", p))
    })
}

fn ensure_named(name: &str, path: &Path) -> bool {
    let Ok(mut named) = NAMED.lock() else {
        return false;
    };
    if named.iter().any(|n| n == name) {
        return true;
    }
    if register_file(name, path) {
        named.push(name.to_string());
        true
    } else {
        false
    }
}

/// Font family to draw `theme` with.
///
/// The theme's own family when its `font_path` registered, otherwise
/// sans-serif. Fails only when no font at all is available.
pub fn resolve(theme: &Theme) -> Result<FontFamily<'_>> {
    if let Some(path) = theme.font_path.as_deref() {
        if ensure_named(&theme.font_family, path) {
            // sans-serif still backs any text drawn without a family
            ensure_sans_serif();
            return Ok(FontFamily::Name(theme.font_family.as_str()));
        }
        log::warn!(
            "font {:?} could not be loaded from {}, falling back to sans-serif",
            theme.font_family,
            path.display()
        );
    }
    if ensure_sans_serif() {
        log::debug!(
            "font family {:?} has no font file, using sans-serif",
            theme.font_family
        );
        Ok(FontFamily::SansSerif)
    } else {
        Err(NeonError::FontUnavailable.into())
    }
}
