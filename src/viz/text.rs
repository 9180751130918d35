//! Text measurement for layout decisions (legend width, label gutters).
//!
//! Plotters can only measure text through a loaded font, and layout has to be
//! decided before anything is drawn, so widths are estimated from the glyph
//! count.

/// Heuristic pixel width of `text` at `font_px`.
pub fn estimate_text_width_px(text: &str, font_px: u32) -> u32 {
    ((text.chars().count() as f32) * (font_px as f32) * 0.60).ceil() as u32
}

/// Widest of several strings.
pub fn max_text_width_px<'a, I>(texts: I, font_px: u32) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    texts
        .into_iter()
        .map(|t| estimate_text_width_px(t, font_px))
        .max()
        .unwrap_or(0)
}

/// Cut `text` so it fits `max_px`, ending in a single ellipsis when cut.
pub fn truncate_to_width(text: &str, font_px: u32, max_px: u32) -> String {
    if estimate_text_width_px(text, font_px) <= max_px {
        return text.to_string();
    }
    let mut out = String::new();
    for ch in text.chars() {
        out.push(ch);
        if estimate_text_width_px(&out, font_px) + estimate_text_width_px("…", font_px) > max_px {
            out.pop();
            break;
        }
    }
    out.push('…');
    out
}

/// Wrap on word boundaries to fit `max_px`; words longer than a line are
/// broken by characters.
pub fn wrap_text_to_width(text: &str, font_px: u32, max_px: u32) -> Vec<String> {
    if max_px <= 12 {
        return vec![truncate_to_width(text, font_px, max_px)];
    }
    let fits = |s: &str| estimate_text_width_px(s, font_px) <= max_px;
    let mut lines: Vec<String> = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        let candidate = if cur.is_empty() {
            word.to_string()
        } else {
            format!("{cur} {word}")
        };
        if fits(&candidate) {
            cur = candidate;
            continue;
        }
        if !cur.is_empty() {
            lines.push(std::mem::take(&mut cur));
        }
        if fits(word) {
            cur = word.to_string();
            continue;
        }
        for ch in word.chars() {
            cur.push(ch);
            if !fits(&cur) {
                cur.pop();
                lines.push(std::mem::take(&mut cur));
                cur.push(ch);
            }
        }
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_on_words() {
        // 14 px font: 8.4 px per glyph, 100 px holds 11 glyphs
        let lines = wrap_text_to_width("neon lights over tokyo", 14, 100);
        assert_eq!(lines, vec!["neon lights", "over tokyo"]);
    }

    #[test]
    fn long_word_is_broken() {
        let lines = wrap_text_to_width("cyberpunkcyberpunk", 14, 60);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| estimate_text_width_px(l, 14) <= 60));
        assert_eq!(lines.concat(), "cyberpunkcyberpunk");
    }

    #[test]
    fn truncation_adds_ellipsis() {
        let t = truncate_to_width("a very long legend label", 14, 60);
        assert!(t.ends_with('…'));
        assert!(estimate_text_width_px(&t, 14) <= 60);
    }
}
