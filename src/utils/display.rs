use colored::Colorize;
use prettytable::{format, Cell, Row, Table};

use crate::models::favorites::FavoriteEntry;
use crate::models::media::MediaSummary;

pub struct DisplayFormatter;

impl DisplayFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format_header(&self, text: &str) -> String {
        format!("\n=== {} ===", text.bright_white().bold())
    }

    pub fn format_media_table(&self, entries: &[MediaSummary]) -> String {
        if entries.is_empty() {
            return "No results.".dimmed().to_string();
        }

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);

        table.add_row(Row::new(
            ["Id", "Title", "Score", "Year"]
                .iter()
                .map(|h| Cell::new(h).style_spec("b"))
                .collect(),
        ));

        for entry in entries {
            table.add_row(Row::new(vec![
                Cell::new(&entry.id.to_string()),
                Cell::new(&entry.title),
                Cell::new(&self.format_score(entry.score)),
                Cell::new(&entry.year.map(|y| y.to_string()).unwrap_or_else(|| "-".into())),
            ]));
        }

        table.to_string()
    }

    pub fn format_score(&self, score: Option<f64>) -> String {
        match score {
            Some(score) if score >= 7.5 => format!("{:.2}", score).green().to_string(),
            Some(score) if score >= 5.0 => format!("{:.2}", score).yellow().to_string(),
            Some(score) => format!("{:.2}", score).red().to_string(),
            None => "N/A".to_string(),
        }
    }

    pub fn format_media_summary(&self, entry: &MediaSummary) -> String {
        let mut output = Vec::new();
        output.push(self.format_header(&format!("{} ({})", entry.title, entry.kind)));
        output.push(format!("Id: {}", entry.id));
        output.push(format!("Score: {}", self.format_score(entry.score)));
        if let Some(year) = entry.year {
            output.push(format!("Year: {}", year));
        }
        output.push(format!("Image: {}", entry.image_url));

        output.join("\n")
    }

    pub fn format_favorites_table(&self, entries: &[FavoriteEntry]) -> String {
        if entries.is_empty() {
            return "No favorites yet.".dimmed().to_string();
        }

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);

        table.add_row(Row::new(
            ["Id", "Type", "Added"]
                .iter()
                .map(|h| Cell::new(h).style_spec("b"))
                .collect(),
        ));

        for entry in entries {
            table.add_row(Row::new(vec![
                Cell::new(&entry.id.to_string()),
                Cell::new(entry.kind.as_str()),
                Cell::new(&entry.added_at.format("%Y-%m-%d %H:%M").to_string()),
            ]));
        }

        table.to_string()
    }

    pub fn format_notice(&self, message: &str, success: bool) -> String {
        if success {
            message.green().to_string()
        } else {
            message.red().to_string()
        }
    }
}
