pub use colored::{Color, Colorize};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

static HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^##+\s*(.*?)\s*$").unwrap());
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static CODE_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```[a-zA-Z0-9_-]*\n?(.*?)```").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]+)`").unwrap());

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColorScheme {
    pub foreground: Option<ColorWrapper>,
    pub bold: bool,
    pub underline: bool,
}

// Wrapper type for Color that implements Serialize/Deserialize
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct ColorWrapper(Color);

impl From<ColorWrapper> for String {
    fn from(wrapper: ColorWrapper) -> Self {
        format!("{:?}", wrapper.0)
    }
}

impl From<String> for ColorWrapper {
    fn from(s: String) -> Self {
        ColorWrapper(Color::from_str(&s).unwrap_or(Color::White))
    }
}

impl From<Color> for ColorWrapper {
    fn from(color: Color) -> Self {
        ColorWrapper(color)
    }
}

impl ColorScheme {
    fn fg(color: Color) -> Self {
        Self {
            foreground: Some(ColorWrapper(color)),
            ..Default::default()
        }
    }

    pub fn apply(&self, text: &str) -> colored::ColoredString {
        let mut colored_text: colored::ColoredString = text.into();

        if let Some(fg) = &self.foreground {
            colored_text = colored_text.color(fg.0);
        }
        if self.bold {
            colored_text = colored_text.bold();
        }
        if self.underline {
            colored_text = colored_text.underline();
        }

        colored_text
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    #[default]
    Dark,
    Light,
    Monochrome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub header: ColorScheme,
    pub emphasis: ColorScheme,
    pub code: ColorScheme,
    pub code_block: ColorScheme,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn named(name: ThemeName) -> Self {
        match name {
            ThemeName::Dark => Self::dark(),
            ThemeName::Light => Self::light(),
            ThemeName::Monochrome => Self::monochrome(),
        }
    }

    pub fn dark() -> Self {
        Self {
            header: ColorScheme {
                bold: true,
                underline: true,
                ..Default::default()
            },
            emphasis: ColorScheme {
                bold: true,
                ..Default::default()
            },
            code: ColorScheme::fg(Color::BrightYellow),
            code_block: ColorScheme::fg(Color::BrightCyan),
        }
    }

    pub fn light() -> Self {
        Self {
            header: ColorScheme {
                bold: true,
                underline: true,
                ..ColorScheme::fg(Color::Blue)
            },
            emphasis: ColorScheme {
                bold: true,
                ..Default::default()
            },
            code: ColorScheme::fg(Color::Magenta),
            code_block: ColorScheme::fg(Color::Blue),
        }
    }

    pub fn monochrome() -> Self {
        let plain = ColorScheme::default();
        Self {
            header: ColorScheme {
                bold: true,
                underline: true,
                ..Default::default()
            },
            emphasis: ColorScheme {
                bold: true,
                ..Default::default()
            },
            code: plain.clone(),
            code_block: plain,
        }
    }

    pub fn format_output(&self, analysis: &str, color: bool) -> String {
        let text = analysis.replace("\\n", "\n");
        if !color {
            return text;
        }

        let text = CODE_BLOCK.replace_all(&text, |caps: &Captures| {
            self.code_block.apply(caps[1].trim_end_matches('\n')).to_string()
        });
        let text = HEADER.replace_all(&text, |caps: &Captures| {
            self.header.apply(&caps[1]).to_string()
        });
        let text = BOLD.replace_all(&text, |caps: &Captures| {
            self.emphasis.apply(&caps[1]).to_string()
        });
        let text = INLINE_CODE.replace_all(&text, |caps: &Captures| {
            self.code.apply(&caps[1]).to_string()
        });
        text.into_owned()
    }
}
