//! Rendering of the stored record for the terminal.
//!
//! Markdown output embeds `facts_table` verbatim, since it is already HTML.

use crate::store::StoredRecord;
use std::fmt::Write;

/// Output format for `show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    Json,
    Markdown,
}

pub fn render(stored: &StoredRecord, format: Format) -> Result<String, serde_json::Error> {
    match format {
        Format::Json => render_json(stored),
        Format::Markdown => Ok(render_markdown(stored)),
    }
}

pub fn render_json(stored: &StoredRecord) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(stored)
}

/// Render the record as a single Markdown page.
pub fn render_markdown(stored: &StoredRecord) -> String {
    let record = &stored.record;
    let mut md = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(md, "# Mission to Mars\n");
    let _ = writeln!(md, "_Last scraped: {}_\n", stored.updated_at);

    let _ = writeln!(md, "## Latest Mars News\n");
    let _ = writeln!(md, "### {}\n", record.news_title);
    let _ = writeln!(md, "{}\n", record.news_p);

    let _ = writeln!(md, "## Featured Mars Image\n");
    let _ = writeln!(md, "![Featured image]({})\n", record.featured_image_url);

    let _ = writeln!(md, "## Current Weather on Mars\n");
    let _ = writeln!(md, "> {}\n", record.mars_weather);

    let _ = writeln!(md, "## Mars Facts\n");
    let _ = writeln!(md, "{}\n", record.facts_table);

    let _ = writeln!(md, "## Mars Hemispheres\n");
    for entry in &record.hemisphere_image_urls {
        let _ = writeln!(md, "- [{}]({})", entry.title, entry.image_url);
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrapeConfig;
    use crate::models::MergedRecord;

    fn stored() -> StoredRecord {
        StoredRecord {
            updated_at: "2026-10-14T09:30:00+00:00".to_string(),
            record: MergedRecord {
                news_title: "Dust Storm Update".to_string(),
                news_p: "The storm is fading.".to_string(),
                ..MergedRecord::fallback(&ScrapeConfig::default())
            },
        }
    }

    #[test]
    fn test_markdown_has_every_section() {
        let md = render_markdown(&stored());
        assert!(md.contains("### Dust Storm Update"));
        assert!(md.contains("The storm is fading."));
        assert!(md.contains("> Data not found!"));
        assert!(md.contains("<table border=\"1\""));
        assert_eq!(md.matches("- [Not Found](").count(), 4);
        assert!(md.contains("2026-10-14T09:30:00+00:00"));
    }

    #[test]
    fn test_json_round_trips() {
        let json = render(&stored(), Format::Json).unwrap();
        let back: StoredRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stored());
    }
}
