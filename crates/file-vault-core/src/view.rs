//! Filter and render pipeline.
//!
//! The visible set is recomputed from the [`Catalog`] on every selection or
//! search change: one linear pass, no index, cache order preserved. The
//! result is projected into [`RenderedItem`]s carrying the display strings
//! (human size, icon glyph, date) a frontend needs.
//!
//! # Visibility rule
//!
//! A record is visible iff
//!
//! 1. the category selector is [`CategoryFilter::All`] or equals the
//!    record's category, **and**
//! 2. the search term is empty or the record name contains it,
//!    case-insensitively.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::catalog::Catalog;
use crate::models::{Category, FileRecord};

/// Category selector: everything, or one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => *c == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            s.parse::<Category>()
                .map(CategoryFilter::Only)
                .map_err(|_| {
                    format!(
                        "Unknown category: '{}'. Use all, picture, video, large, or file.",
                        s
                    )
                })
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Only(c) => write!(f, "{}", c),
        }
    }
}

/// Layout of the rendered file list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grid" => Ok(ViewMode::Grid),
            "list" => Ok(ViewMode::List),
            other => Err(format!("Unknown view: '{}'. Use grid or list.", other)),
        }
    }
}

/// Current selector, search term, and layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub category: CategoryFilter,
    pub search: String,
    pub mode: ViewMode,
}

/// Select the visible records, in cache order.
pub fn filter_records<'a>(
    records: &'a [FileRecord],
    category: &CategoryFilter,
    search: &str,
) -> Vec<&'a FileRecord> {
    let needle = search.to_lowercase();
    records
        .iter()
        .filter(|r| category.matches(r.category))
        .filter(|r| needle.is_empty() || r.name.to_lowercase().contains(&needle))
        .collect()
}

/// How a record can be previewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewKind {
    Image,
    Video,
    /// No inline preview; offer a download instead.
    Download,
}

impl PreviewKind {
    pub fn for_record(record: &FileRecord) -> Self {
        match record.category {
            Category::Picture => PreviewKind::Image,
            Category::Video => PreviewKind::Video,
            Category::Large | Category::File => PreviewKind::Download,
        }
    }
}

/// Icon glyph shown next to a record.
pub fn icon_for(category: Category) -> &'static str {
    match category {
        Category::Picture => "🖼️",
        Category::Video => "🎥",
        Category::Large => "💾",
        Category::File => "📄",
    }
}

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Format a byte count with base-1024 units, rounded to two decimals with
/// trailing zeros dropped: `0 Bytes`, `1 KB`, `1.43 MB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut unit = 0;
    let mut scaled = bytes as f64;
    while scaled >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }
    let rounded = (scaled * 100.0).round() / 100.0;
    let text = format!("{:.2}", rounded);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", text, SIZE_UNITS[unit])
}

/// A visible record projected for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedItem {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub category: Category,
    pub icon: &'static str,
    pub size: u64,
    pub size_label: String,
    /// Local calendar date of the record's creation time.
    pub date: String,
}

impl RenderedItem {
    pub fn from_record(record: &FileRecord) -> Self {
        let date = record
            .created_local()
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| record.date.clone());
        Self {
            id: record.id,
            name: record.name.clone(),
            mime_type: record.mime_type.clone(),
            category: record.category,
            icon: icon_for(record.category),
            size: record.size,
            size_label: format_file_size(record.size),
            date,
        }
    }
}

/// Output of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RenderedView {
    /// Nothing matched: the "no files found" state.
    Empty,
    Items {
        mode: ViewMode,
        items: Vec<RenderedItem>,
    },
}

const GRID_COLUMNS: usize = 4;

impl RenderedView {
    pub fn items(&self) -> &[RenderedItem] {
        match self {
            RenderedView::Empty => &[],
            RenderedView::Items { items, .. } => items,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RenderedView::Empty)
    }

    /// Plain-text projection for terminals.
    pub fn to_text(&self) -> String {
        let (mode, items) = match self {
            RenderedView::Empty => {
                return "📂 No files found\nTry uploading files or changing the filter.\n"
                    .to_string()
            }
            RenderedView::Items { mode, items } => (mode, items),
        };

        let mut out = String::new();
        match mode {
            ViewMode::Grid => {
                for row in items.chunks(GRID_COLUMNS) {
                    let cells: Vec<String> = row
                        .iter()
                        .map(|i| format!("[{}] {} {} ({})", i.id, i.icon, i.name, i.size_label))
                        .collect();
                    out.push_str(&cells.join("   "));
                    out.push('\n');
                }
            }
            ViewMode::List => {
                for i in items {
                    out.push_str(&format!(
                        "{:>5}  {}  {:<40}  {:>10} • {} • {}\n",
                        i.id, i.icon, i.name, i.size_label, i.date, i.category
                    ));
                }
            }
        }
        out
    }
}

/// Run the pipeline: filter the catalog by `state` and project the result.
pub fn render(catalog: &Catalog, state: &ViewState) -> RenderedView {
    let visible = filter_records(catalog.records(), &state.category, &state.search);
    if visible.is_empty() {
        return RenderedView::Empty;
    }
    RenderedView::Items {
        mode: state.mode,
        items: visible.into_iter().map(RenderedItem::from_record).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewFileRecord;

    fn record(id: i64, name: &str, mime: &str, size: usize) -> FileRecord {
        FileRecord::from_new(id, &NewFileRecord::from_bytes(name, mime, &vec![0u8; size]))
    }

    fn sample() -> Vec<FileRecord> {
        vec![
            record(1, "Holiday.PNG", "image/png", 10),
            record(2, "clip.mp4", "video/mp4", 10),
            record(3, "notes.txt", "text/plain", 10),
            record(4, "holiday-plan.pdf", "application/pdf", 10),
        ]
    }

    fn ids(v: &[&FileRecord]) -> Vec<i64> {
        v.iter().map(|r| r.id).collect()
    }

    #[test]
    fn all_with_empty_search_returns_everything() {
        let recs = sample();
        assert_eq!(ids(&filter_records(&recs, &CategoryFilter::All, "")), vec![1, 2, 3, 4]);
    }

    #[test]
    fn category_filter() {
        let recs = sample();
        let only_video = CategoryFilter::Only(Category::Video);
        assert_eq!(ids(&filter_records(&recs, &only_video, "")), vec![2]);
        let only_large = CategoryFilter::Only(Category::Large);
        assert!(filter_records(&recs, &only_large, "").is_empty());
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let recs = sample();
        assert_eq!(ids(&filter_records(&recs, &CategoryFilter::All, "HOLIDAY")), vec![1, 4]);
        assert_eq!(
            ids(&filter_records(&recs, &CategoryFilter::Only(Category::File), "holiday")),
            vec![4]
        );
        assert!(filter_records(&recs, &CategoryFilter::All, "zzz").is_empty());
    }

    #[test]
    fn parse_selectors() {
        assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "picture".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(Category::Picture)
        );
        assert!("pictures".parse::<CategoryFilter>().is_err());
        assert_eq!("List".parse::<ViewMode>().unwrap(), ViewMode::List);
        assert!("table".parse::<ViewMode>().is_err());
    }

    #[test]
    fn file_size_formatting() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(1), "1 Bytes");
        assert_eq!(format_file_size(1023), "1023 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1_500_000), "1.43 MB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3 GB");
        assert_eq!(format_file_size(2048 * 1024 * 1024 * 1024), "2048 GB");
    }

    #[test]
    fn render_empty_state() {
        let catalog = Catalog::new();
        let view = render(&catalog, &ViewState::default());
        assert!(view.is_empty());
        assert!(view.to_text().contains("No files found"));
    }

    #[test]
    fn rendered_item_fields() {
        let rec = record(9, "a.png", "image/png", 2048);
        let item = RenderedItem::from_record(&rec);
        assert_eq!(item.icon, "🖼️");
        assert_eq!(item.size_label, "2 KB");
        assert_eq!(item.date.len(), 10);
        assert_eq!(PreviewKind::for_record(&rec), PreviewKind::Image);
    }

    #[test]
    fn rendered_date_is_local() {
        let mut rec = record(1, "late.txt", "text/plain", 1);
        rec.date = "2026-03-01T23:59:30.000Z".to_string();
        let local = rec.created_local().unwrap();
        let item = RenderedItem::from_record(&rec);
        assert_eq!(item.date, local.format("%Y-%m-%d").to_string());

        rec.date = "not a date".to_string();
        assert_eq!(RenderedItem::from_record(&rec).date, "not a date");
    }

    #[test]
    fn grid_text_wraps_rows() {
        let items: Vec<RenderedItem> = (1..=5)
            .map(|i| RenderedItem::from_record(&record(i, &format!("f{}.txt", i), "text/plain", 1)))
            .collect();
        let view = RenderedView::Items {
            mode: ViewMode::Grid,
            items,
        };
        assert_eq!(view.to_text().lines().count(), 2);
    }
}
