//! Color tokens for the TailorFlow UI.

use ratatui::style::Color;

/// Color scheme used by all draw functions.
#[derive(Debug, Clone, Copy)]
pub struct ColorScheme {
    /// Primary text color
    pub text: Color,
    /// Dimmed text color (secondary info, footer hints)
    pub text_dim: Color,
    /// Border color for the focused pane
    pub focus_border: Color,
    /// Border color for unfocused panes
    pub unfocused_border: Color,
    /// Background for selected list rows
    pub selection_bg: Color,
    /// Positive accents (matched skills, good scores)
    pub ok: Color,
    /// Cautionary accents (middling scores, hygiene flags)
    pub warn: Color,
    /// Error accents (missing skills, failures)
    pub err: Color,
    /// Accent for inserted diff text
    pub diff_insert: Color,
    /// Accent for deleted diff text
    pub diff_delete: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        // Nord-ish muted palette, matching a dark terminal.
        Self {
            text: Color::Rgb(216, 222, 233),
            text_dim: Color::Rgb(106, 112, 128),
            focus_border: Color::Rgb(136, 192, 208),
            unfocused_border: Color::Rgb(67, 76, 94),
            selection_bg: Color::Rgb(59, 66, 82),
            ok: Color::Rgb(163, 190, 140),
            warn: Color::Rgb(235, 203, 139),
            err: Color::Rgb(191, 97, 106),
            diff_insert: Color::Rgb(163, 190, 140),
            diff_delete: Color::Rgb(191, 97, 106),
        }
    }
}

impl ColorScheme {
    /// Color a 0-100 match score.
    pub fn score_color(&self, score: u8) -> Color {
        match score {
            70.. => self.ok,
            40..=69 => self.warn,
            _ => self.err,
        }
    }
}
