// TUI module for rendering the launcher panel
pub mod colors;
pub mod input;

// Re-exports
pub use colors::*;
pub use input::{handle_key_event, KeyAction};

use crate::coordinator::{SearchMode, Snapshot};
use crate::domain::{Entry, EntryKind};
use crate::geometry::WindowGeometry;
use crate::thumbnail::Thumbnail;
use image::RgbaImage;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

/// Smallest panel that still fits the search box, one result and the footer
const MIN_PANEL_WIDTH: u16 = 30;
const MIN_PANEL_HEIGHT: u16 = 9;

/// Renders the launcher panel at the stored geometry
pub fn render(frame: &mut Frame, snapshot: &Snapshot, geometry: &WindowGeometry) {
    let area = panel_area(geometry, frame.area());
    frame.render_widget(Clear, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Search box
            Constraint::Length(1), // Mode line
            Constraint::Min(0),    // Results
            Constraint::Length(1), // Footer
        ])
        .split(area);

    render_search_box(frame, chunks[0], snapshot);
    render_mode_line(frame, chunks[1], snapshot);
    render_results(frame, chunks[2], snapshot);
    render_footer(frame, chunks[3]);
}

/// Places the panel inside `screen`. A stored size is honoured when it fits;
/// otherwise the panel fills the space right and below its origin.
pub fn panel_area(geometry: &WindowGeometry, screen: Rect) -> Rect {
    let left = geometry
        .left
        .min(screen.width.saturating_sub(MIN_PANEL_WIDTH));
    let top = geometry
        .top
        .min(screen.height.saturating_sub(MIN_PANEL_HEIGHT));

    let room_x = screen.width - left;
    let room_y = screen.height - top;

    let (width, height) = match geometry.size {
        Some((w, h)) => (
            w.clamp(MIN_PANEL_WIDTH.min(room_x), room_x),
            h.clamp(MIN_PANEL_HEIGHT.min(room_y), room_y),
        ),
        None => (room_x, room_y),
    };

    Rect::new(screen.x + left, screen.y + top, width, height)
}

/// Two cells showing the thumbnail reduced to 2x2 pixels, one per quadrant.
/// Each cell is an upper half block: foreground is the top pixel, background
/// the bottom one.
pub fn thumbnail_swatch(thumbnail: &Thumbnail) -> Vec<Span<'static>> {
    let img = thumbnail.image();

    (0..2)
        .map(|qx| {
            let [r, g, b] = quadrant_average(img, qx, 0);
            let [lr, lg, lb] = quadrant_average(img, qx, 1);
            let style = Style::default()
                .fg(Color::Rgb(r, g, b))
                .bg(Color::Rgb(lr, lg, lb));
            Span::styled("▀", style)
        })
        .collect()
}

fn quadrant_average(img: &RgbaImage, qx: u32, qy: u32) -> [u8; 3] {
    let (width, height) = img.dimensions();
    let (half_w, half_h) = (width.div_ceil(2), height.div_ceil(2));
    let xs = (qx * half_w).min(width)..((qx + 1) * half_w).min(width);
    let ys = (qy * half_h).min(height)..((qy + 1) * half_h).min(height);

    let mut sum = [0u64; 3];
    let mut count = 0u64;
    for y in ys {
        for x in xs.clone() {
            let p = img.get_pixel(x, y);
            sum[0] += u64::from(p[0]);
            sum[1] += u64::from(p[1]);
            sum[2] += u64::from(p[2]);
            count += 1;
        }
    }

    if count == 0 {
        return [0, 0, 0];
    }
    sum.map(|c| (c / count) as u8)
}

fn render_search_box(frame: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let title = match snapshot.mode {
        SearchMode::Catalog => " Search ",
        SearchMode::FileSystem { .. } => " Search files ",
    };

    let line = Line::from(vec![
        Span::styled("› ", Style::default().fg(ACCENT_HIGHLIGHT)),
        Span::styled(
            snapshot.key.clone(),
            Style::default()
                .fg(TEXT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("▏", Style::default().fg(ACCENT_HIGHLIGHT)),
    ]);

    let search = Paragraph::new(line).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(ACCENT_HIGHLIGHT))
            .style(Style::default().bg(BG_DARK)),
    );

    frame.render_widget(search, area);
}

fn render_mode_line(frame: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let mut spans = match &snapshot.mode {
        SearchMode::Catalog => vec![
            Span::styled(" catalog ", Style::default().fg(BG_DARK).bg(ACCENT_SECONDARY)),
            Span::styled(
                format!(" {} entries", snapshot.catalog_len),
                Style::default().fg(TEXT_SECONDARY),
            ),
        ],
        SearchMode::FileSystem { base } => vec![
            Span::styled(" files ", Style::default().fg(BG_DARK).bg(ACCENT_PRIMARY)),
            Span::styled(
                format!(" {}", base.display()),
                Style::default().fg(TEXT_SECONDARY),
            ),
        ],
    };

    if snapshot.crawling {
        spans.push(Span::styled(
            "  searching…",
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::ITALIC),
        ));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG_DARK)),
        area,
    );
}

fn render_results(frame: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .style(Style::default().bg(BG_DARK));

    if snapshot.results.is_empty() {
        let hint = if snapshot.key.is_empty() {
            "Type to search"
        } else {
            "No matches"
        };
        let empty = Paragraph::new(Span::styled(hint, Style::default().fg(TEXT_SECONDARY)))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = snapshot.results.iter().map(|e| result_item(e)).collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(BG_SELECTED)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▌");

    let mut state = ListState::default().with_selected(snapshot.selected);
    frame.render_stateful_widget(list, area, &mut state);
}

fn result_item(entry: &Entry) -> ListItem<'static> {
    let mut spans = thumbnail_swatch(&entry.thumbnail());
    spans.push(Span::raw(" "));

    let name_style = match entry.kind() {
        EntryKind::Directory => Style::default().fg(ACCENT_HIGHLIGHT),
        EntryKind::File => Style::default().fg(TEXT_PRIMARY),
    };
    spans.push(Span::styled(entry.name().to_string(), name_style));

    if let Some(parent) = entry.path().parent() {
        spans.push(Span::styled(
            format!("  {}", parent.display()),
            Style::default().fg(TEXT_SECONDARY),
        ));
    }

    ListItem::new(Line::from(spans))
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(ACCENT_HIGHLIGHT));
    let label = |l: &'static str| Span::styled(l, Style::default().fg(TEXT_SECONDARY));

    let controls = Line::from(vec![
        key("↑↓ "),
        label("Select"),
        Span::raw("  "),
        key("Tab "),
        label("Search inside"),
        Span::raw("  "),
        key("Enter "),
        label("Open"),
        Span::raw("  "),
        key("Esc "),
        label("Back"),
    ]);

    frame.render_widget(
        Paragraph::new(controls)
            .alignment(Alignment::Center)
            .style(Style::default().bg(BG_DARK)),
        area,
    );
}
