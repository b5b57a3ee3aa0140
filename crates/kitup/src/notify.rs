use console::{Style, Term};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorDepth {
    None,
    Basic,
    Extended,
}

// Kit brand colours on a 256-colour terminal.
const KIT_GRADIENT: [u8; 3] = [79, 80, 45];
const KIT_SUCCESS: u8 = 77;
const KIT_FAIL: u8 = 124;
const KIT_YELLOW: u8 = 220;

/// Console colour capabilities, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    depth: ColorDepth,
}

impl Palette {
    #[must_use]
    pub fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        let term = std::env::var("TERM").ok();
        let colorterm = std::env::var("COLORTERM").ok();
        Self::from_env(
            no_color,
            console::colors_enabled(),
            term.as_deref(),
            colorterm.as_deref(),
        )
    }

    #[must_use]
    pub fn from_env(
        no_color: bool,
        colors_enabled: bool,
        term: Option<&str>,
        colorterm: Option<&str>,
    ) -> Self {
        let depth = if no_color || !colors_enabled {
            ColorDepth::None
        } else if colorterm.is_some_and(|c| c.contains("truecolor") || c.contains("24bit"))
            || term.is_some_and(|t| t.contains("256color"))
            || cfg!(windows)
        {
            ColorDepth::Extended
        } else {
            ColorDepth::Basic
        };
        Self { depth }
    }

    #[must_use]
    pub fn plain() -> Self {
        Self {
            depth: ColorDepth::None,
        }
    }

    #[must_use]
    pub fn depth(self) -> ColorDepth {
        self.depth
    }

    #[must_use]
    pub fn style(self, severity: Severity) -> Style {
        let style = Style::new();
        match (self.depth, severity) {
            (ColorDepth::None, _) => style,
            (ColorDepth::Extended, Severity::Info) => style.color256(KIT_GRADIENT[0]).bold(),
            (ColorDepth::Extended, Severity::Success) => style.color256(KIT_SUCCESS).bold(),
            (ColorDepth::Extended, Severity::Warning) => style.color256(KIT_YELLOW).bold(),
            (ColorDepth::Extended, Severity::Failure) => style.color256(KIT_FAIL).bold(),
            (ColorDepth::Basic, Severity::Info | Severity::Success) => style.cyan().bold(),
            (ColorDepth::Basic, Severity::Warning) => style.yellow().bright().bold(),
            (ColorDepth::Basic, Severity::Failure) => style.red().bold(),
        }
    }

    /// Render `text` in the Kit gradient, split at word boundaries.
    #[must_use]
    pub fn gradient(self, text: &str) -> String {
        match self.depth {
            ColorDepth::None => text.to_string(),
            ColorDepth::Basic => Style::new().cyan().bold().apply_to(text).to_string(),
            ColorDepth::Extended => gradient_segments(text, KIT_GRADIENT.len())
                .into_iter()
                .zip(KIT_GRADIENT)
                .map(|(segment, color)| {
                    Style::new()
                        .color256(color)
                        .bold()
                        .apply_to(segment)
                        .to_string()
                })
                .collect(),
        }
    }
}

/// Split `text` into `parts` consecutive pieces of roughly equal length,
/// cutting only where a word starts.
fn gradient_segments(text: &str, parts: usize) -> Vec<&str> {
    let word_starts: Vec<usize> = std::iter::once(0)
        .chain(text.match_indices(' ').map(|(i, _)| i + 1))
        .collect();

    let mut cuts = vec![0];
    for n in 1..parts {
        let target = text.len() * n / parts;
        let nearest = word_starts
            .iter()
            .copied()
            .min_by_key(|start| start.abs_diff(target))
            .unwrap_or(0);
        cuts.push(nearest.max(cuts.last().copied().unwrap_or(0)));
    }
    cuts.push(text.len());

    cuts.windows(2).map(|w| &text[w[0]..w[1]]).collect()
}

/// Interpret a yes/no answer; anything that is not clearly yes or no
/// falls back to `default`.
#[must_use]
pub fn parse_answer(input: &str, default: bool) -> bool {
    match input.trim_start().chars().next() {
        Some('y' | 'Y') => true,
        Some('n' | 'N') => false,
        _ => default,
    }
}

/// Status messages and yes/no prompts on the console.
pub struct Notifier {
    term: Term,
    palette: Palette,
    assume_defaults: bool,
}

impl Notifier {
    #[must_use]
    pub fn new(palette: Palette, assume_defaults: bool) -> Self {
        Self {
            term: Term::stdout(),
            palette,
            assume_defaults,
        }
    }

    pub fn notify(&self, message: &str, severity: Severity) {
        let line = self.palette.style(severity).apply_to(message).to_string();
        let _ = self.term.write_line(&line);
    }

    /// Ask a yes/no question. Returns `default` on empty or unrecognised
    /// input, when stdin cannot be read, and in assume-defaults mode.
    #[must_use]
    pub fn confirm(&self, message: &str, default: bool) -> bool {
        let indicator = if default { " [Y/n] " } else { " [y/N] " };
        let prompt = self.palette.gradient(&format!("{message}{indicator}"));

        if self.assume_defaults {
            let answer = if default { "y" } else { "n" };
            let _ = self.term.write_line(&format!("{prompt}{answer}"));
            return default;
        }

        if self.term.write_str(&prompt).is_err() {
            return default;
        }

        let input = if self.term.is_term() {
            self.term.read_line().ok()
        } else {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).ok().map(|_| line)
        };

        input.map_or(default, |line| parse_answer(&line, default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_answer_accepts_yes_and_no_prefixes() {
        assert!(parse_answer("y", false));
        assert!(parse_answer("Yes please", false));
        assert!(!parse_answer("n", true));
        assert!(!parse_answer("  NO", true));
    }

    #[test]
    fn parse_answer_falls_back_to_default() {
        assert!(parse_answer("", true));
        assert!(!parse_answer("", false));
        assert!(parse_answer("\n", true));
        assert!(!parse_answer("maybe", false));
        assert!(parse_answer("1", true));
    }

    #[test]
    fn no_color_disables_styling() {
        let palette = Palette::from_env(true, true, Some("xterm-256color"), None);
        assert_eq!(palette.depth(), ColorDepth::None);
        assert_eq!(palette.gradient("Use dev branch?"), "Use dev branch?");
    }

    #[test]
    fn disabled_console_colors_disable_styling() {
        let palette = Palette::from_env(false, false, Some("xterm-256color"), None);
        assert_eq!(palette.depth(), ColorDepth::None);
    }

    #[cfg(not(windows))]
    #[test]
    fn terminal_capabilities_pick_color_depth() {
        assert_eq!(
            Palette::from_env(false, true, Some("xterm-256color"), None).depth(),
            ColorDepth::Extended
        );
        assert_eq!(
            Palette::from_env(false, true, Some("xterm"), Some("truecolor")).depth(),
            ColorDepth::Extended
        );
        assert_eq!(
            Palette::from_env(false, true, Some("xterm"), None).depth(),
            ColorDepth::Basic
        );
    }

    #[test]
    fn gradient_segments_cover_text_and_cut_at_words() {
        let text = "Add Visual Studio Code extension? [Y/n] ";
        let segments = gradient_segments(text, 3);

        assert_eq!(segments.len(), 3);
        assert_eq!(segments.concat(), text);
        let mut cut = 0;
        for segment in &segments[..2] {
            cut += segment.len();
            assert!(cut == 0 || text.as_bytes()[cut - 1] == b' ', "cut at {cut}");
        }
    }

    #[test]
    fn gradient_segments_handle_single_word() {
        let segments = gradient_segments("kitup", 3);
        assert_eq!(segments.concat(), "kitup");
        assert_eq!(segments.len(), 3);
    }

    #[test]
    fn plain_palette_leaves_messages_unstyled() {
        let style = Palette::plain().style(Severity::Failure);
        assert_eq!(style.apply_to("boom").to_string(), "boom");
    }
}
