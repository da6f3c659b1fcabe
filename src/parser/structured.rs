use super::ParseError;
use pulldown_cmark::{Event, Options, Parser, Tag};

pub const EXTENSIONS: [&str; 4] = ["html", "htm", "md", "csv"];

const HTML_WIDTH: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Html,
    Markdown,
    Csv,
}

impl Format {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "html" | "htm" => Some(Format::Html),
            "md" | "markdown" => Some(Format::Markdown),
            "csv" => Some(Format::Csv),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Format::Html => "html",
            Format::Markdown => "md",
            Format::Csv => "csv",
        }
    }
}

pub fn parse(format: Format, data: &[u8]) -> Result<(String, usize), ParseError> {
    let text = std::str::from_utf8(data)
        .map_err(|e| ParseError::Structured(format!("not valid UTF-8: {}", e)))?;

    match format {
        Format::Html => Ok(parse_html(text)),
        Format::Markdown => Ok(parse_markdown(text)),
        Format::Csv => parse_csv(text).map_err(ParseError::Structured),
    }
}

fn parse_html(text: &str) -> (String, usize) {
    let rendered = html2text::from_read(text.as_bytes(), HTML_WIDTH);
    let elements = rendered.lines().filter(|line| !line.trim().is_empty()).count();
    (rendered, elements)
}

fn parse_markdown(text: &str) -> (String, usize) {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);

    let elements = Parser::new_ext(text, options)
        .filter(|event| {
            matches!(
                event,
                Event::Start(Tag::Heading { .. })
                    | Event::Start(Tag::Item)
                    | Event::Start(Tag::Table(_))
                    | Event::Start(Tag::CodeBlock(_))
            )
        })
        .count();
    (text.to_string(), elements)
}

fn parse_csv(text: &str) -> Result<(String, usize), String> {
    let mut rows = Vec::new();
    let mut width = None;

    for (number, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split(',').map(|cell| cell.trim().trim_matches('"')).collect();
        match width {
            None => width = Some(cells.len()),
            Some(expected) if expected != cells.len() => {
                return Err(format!(
                    "row {} has {} columns, expected {}",
                    number + 1,
                    cells.len(),
                    expected
                ));
            }
            _ => {}
        }
        rows.push(cells.join(" | "));
    }

    let count = rows.len();
    Ok((rows.join("\n"), count))
}
