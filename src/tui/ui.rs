//! Main UI layout and rendering
//!
//! Composes header, sidebar, mosaic and footer. Every clickable region is
//! recorded in `app.regions` so the next mouse event resolves against
//! what is actually on screen.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::app::{App, StatusLevel};
use super::colors::{swatch, ACCENT, MUTED};
use super::controller::{Focus, ScreenRegions};
use super::heatmap::HeatmapView;
use super::info::info_lines;
use crate::data::CatalogStatus;
use crate::mosaic::{MosaicGeometry, TileId};
use crate::palette::{all_names, Palette};
use crate::tiles::{TilePresentation, TileRegions, TileRegistry, TitleButton};

const SWATCH_WIDTH: u16 = 12;
const PALETTE_MENU_WIDTH: u16 = 26;
const MENU_SWATCH_WIDTH: u16 = 6;
/// Narrowest mosaic kept next to the sidebar
const MIN_MOSAIC_COLUMNS: u16 = 10;

/// Draw the complete UI
pub fn draw(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Main layout: header, body, footer
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Palette and colorscale controls
            Constraint::Min(5),    // Sidebar + mosaic
            Constraint::Length(3), // Status/help bar
        ])
        .split(area);

    app.regions = ScreenRegions::default();

    render_header(frame, main_layout[0], app);
    render_body(frame, main_layout[1], app);
    render_footer(frame, main_layout[2], app);

    if app.palette_open {
        render_palette_menu(frame, area, app);
    }

    // Help overlay if active
    if app.show_help {
        render_help_overlay(frame, area);
    }
}

fn text_width(text: &str) -> u16 {
    Span::raw(text).width() as u16
}

fn render_header(frame: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default().borders(Borders::BOTTOM);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let palette_label = format!(" Palette: {} ▾ ", app.palette.name);
    let scale_label = format!(
        " Colorscale: {} ",
        if app.show_colorscale { "on" } else { "off" }
    );
    let row = Rect::new(inner.x, inner.y, inner.width, inner.height.min(1));
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(text_width(&palette_label)),
            Constraint::Length(SWATCH_WIDTH + 2),
            Constraint::Length(text_width(&scale_label)),
            Constraint::Min(0),
        ])
        .split(row);

    let palette_style = if app.palette_open {
        Style::default().fg(Color::Black).bg(ACCENT)
    } else {
        Style::default().fg(ACCENT).bold()
    };
    frame.render_widget(Paragraph::new(palette_label).style(palette_style), layout[0]);

    let mut spans = vec![Span::raw(" ")];
    spans.extend(swatch(&app.palette, SWATCH_WIDTH));
    frame.render_widget(Paragraph::new(Line::from(spans)), layout[1]);

    let scale_style = if app.show_colorscale {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(MUTED)
    };
    frame.render_widget(Paragraph::new(scale_label).style(scale_style), layout[2]);

    let version = Paragraph::new(format!("npy-mosaic {} ", crate::app_version()))
        .style(Style::default().fg(MUTED))
        .alignment(Alignment::Right);
    frame.render_widget(version, layout[3]);

    // Store areas for mouse hit detection
    app.regions.palette_button = layout[0];
    app.regions.colorscale_button = layout[2];
}

fn render_body(frame: &mut Frame, area: Rect, app: &mut App) {
    let sidebar = app
        .sidebar_columns()
        .min(area.width.saturating_sub(MIN_MOSAIC_COLUMNS));
    let body_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(sidebar), Constraint::Min(0)])
        .split(area);

    render_sidebar(frame, body_layout[0], app);
    render_mosaic(frame, body_layout[1], app);
}

fn panel_block(title: String, focused: bool) -> Block<'static> {
    Block::default()
        .title(title)
        .title_style(Style::default().fg(ACCENT).bold())
        .borders(Borders::ALL)
        .border_style(if focused {
            Style::default().fg(ACCENT)
        } else {
            Style::default().fg(MUTED)
        })
}

/// First row of a `visible`-row window over `len` items that keeps `selected` in view
fn window_start(selected: usize, len: usize, visible: usize) -> usize {
    if visible == 0 || len <= visible {
        return 0;
    }
    selected.saturating_sub(visible / 2).min(len - visible)
}

fn selected_style(selected: bool) -> Style {
    if selected {
        Style::default().fg(Color::Black).bg(ACCENT)
    } else {
        Style::default().fg(Color::White)
    }
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &mut App) {
    app.regions.sidebar = area;
    if area.width == 0 {
        return;
    }
    app.regions.sidebar_handle = Rect::new(area.x + area.width - 1, area.y, 1, area.height);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Percentage(40)])
        .split(area);

    render_file_list(frame, layout[0], app);
    render_index_list(frame, layout[1], app);
}

fn render_file_list(frame: &mut Frame, area: Rect, app: &mut App) {
    let catalog = &app.catalog;
    let title = match catalog.status() {
        CatalogStatus::Loading => format!(" Files {} ", app.spinner()),
        _ => format!(" Files ({}) ", catalog.files().len()),
    };
    let block = panel_block(title, app.focus == Focus::Files);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let placeholder = match catalog.status() {
        CatalogStatus::Errored(message) => Some((format!("Error: {}", message), Color::Red)),
        CatalogStatus::Idle | CatalogStatus::Loading if catalog.files().is_empty() => {
            Some(("Loading files...".to_string(), MUTED))
        }
        _ if catalog.files().is_empty() => Some(("No files".to_string(), MUTED)),
        _ => None,
    };
    if let Some((text, color)) = placeholder {
        frame.render_widget(
            Paragraph::new(text)
                .style(Style::default().fg(color))
                .wrap(Wrap { trim: true }),
            inner,
        );
        return;
    }

    let files = catalog.files();
    let selected = catalog
        .selected_filename()
        .and_then(|name| files.iter().position(|f| f.filename == name));
    let visible = usize::from(inner.height);
    let start = window_start(selected.unwrap_or(0), files.len(), visible);

    let mut items = Vec::new();
    for (row, (pos, file)) in files.iter().enumerate().skip(start).take(visible).enumerate() {
        let rect = Rect::new(inner.x, inner.y + row as u16, inner.width, 1);
        let marker = if app.cache.has(&file.filename) { "*" } else { " " };
        let size = file
            .size_mb
            .map(|mb| format!(" {:.2} MB", mb))
            .unwrap_or_default();
        let line = Line::from(vec![
            Span::raw(format!("{}{} ", marker, file.filename)),
            Span::styled(format!("{}{}", file.shape_label(), size), Style::default().fg(MUTED)),
        ]);
        frame.render_widget(
            Paragraph::new(line).style(selected_style(selected == Some(pos))),
            rect,
        );
        items.push((file.filename.clone(), rect));
    }
    app.regions.file_items = items;
}

fn render_index_list(frame: &mut Frame, area: Rect, app: &mut App) {
    let catalog = &app.catalog;
    let title = if catalog.is_fetching() {
        format!(" Index {} ", app.spinner())
    } else {
        " Index ".to_string()
    };
    let block = panel_block(title, app.focus == Focus::Indices);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let range = catalog.valid_index_range();
    let placeholder = if catalog.selected_filename().is_none() {
        Some("Select file first")
    } else if range.is_empty() {
        Some("No indices")
    } else {
        None
    };
    if let Some(text) = placeholder {
        frame.render_widget(Paragraph::new(text).style(Style::default().fg(MUTED)), inner);
        return;
    }

    let selected = catalog.selected_index();
    let visible = usize::from(inner.height);
    let start = window_start(selected, range.len(), visible);

    let mut items = Vec::new();
    for (row, index) in range.skip(start).take(visible).enumerate() {
        let rect = Rect::new(inner.x, inner.y + row as u16, inner.width, 1);
        frame.render_widget(
            Paragraph::new(format!(" {}", index)).style(selected_style(index == selected)),
            rect,
        );
        items.push((index, rect));
    }
    app.regions.index_items = items;
}

fn render_mosaic(frame: &mut Frame, area: Rect, app: &mut App) {
    app.regions.mosaic = area;
    let geometry = MosaicGeometry::compute(app.workspace.mosaic(), area);

    if geometry.leaves.is_empty() {
        let hint = Paragraph::new(vec![
            Line::from(""),
            Line::from("No tiles"),
            Line::from("Click here or press s to create one").fg(MUTED),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(MUTED)),
        );
        frame.render_widget(hint, area);
        app.regions.geometry = geometry;
        return;
    }

    let active = app.workspace.effective_target().cloned();
    let maximized = app.workspace.maximize_state().maximized().cloned();
    let mut tiles = TileRegistry::new();
    for (id, rect) in &geometry.leaves {
        // tiles squeezed out by a maximized neighbour are not drawn
        if rect.width < 2 || rect.height < 2 {
            continue;
        }
        let regions = TileRegions::for_frame(*rect);
        render_tile(
            frame,
            &regions,
            id,
            app,
            active.as_ref() == Some(id),
            maximized.as_ref() == Some(id),
        );
        tiles.register(id.clone(), regions);
    }

    // the split that +/- resizes
    if let Some(splitter) = active
        .as_ref()
        .and_then(|id| geometry.parent_splitter(app.workspace.mosaic(), id))
    {
        frame
            .buffer_mut()
            .set_style(splitter.handle, Style::default().fg(ACCENT));
    }

    app.regions.geometry = geometry;
    app.regions.tiles = tiles;
}

fn render_tile(
    frame: &mut Frame,
    regions: &TileRegions,
    id: &TileId,
    app: &App,
    active: bool,
    maximized: bool,
) {
    let border = if active { ACCENT } else { MUTED };
    let block = Block::default()
        .title(format!(" Tile {} ", id))
        .title_style(if active {
            Style::default().fg(ACCENT).bold()
        } else {
            Style::default().fg(Color::White)
        })
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    frame.render_widget(block, regions.frame);

    for (button, rect) in &regions.buttons {
        let style = match button {
            TitleButton::Remove => Style::default().fg(Color::Red),
            _ => Style::default().fg(Color::White),
        };
        frame.render_widget(Paragraph::new(button.label(maximized)).style(style), *rect);
    }

    let fallback = TilePresentation::default();
    let presentation = app
        .workspace
        .presentation()
        .lookup(id)
        .unwrap_or(&fallback);

    let mut content = regions.content;
    if presentation.info_panel_shown() && content.width > 0 {
        let width = presentation.info_panel_columns().min(content.width / 2);
        let panel = Rect::new(content.x + content.width - width, content.y, width, content.height);
        content.width -= width;
        let info = Paragraph::new(info_lines(id, presentation)).block(
            Block::default()
                .borders(Borders::LEFT)
                .border_style(Style::default().fg(MUTED)),
        );
        frame.render_widget(info, panel);
    }

    match &presentation.heatmap {
        Some(binding) => {
            let title_row = Rect::new(content.x, content.y, content.width, content.height.min(1));
            frame.render_widget(
                Paragraph::new(binding.title())
                    .style(Style::default().fg(Color::Gray))
                    .alignment(Alignment::Center),
                title_row,
            );
            let grid = Rect::new(
                content.x,
                content.y + title_row.height,
                content.width,
                content.height - title_row.height,
            );
            frame.render_widget(
                HeatmapView::new(binding, &app.palette).show_scale(app.show_colorscale),
                grid,
            );
        }
        None => {
            let text = Paragraph::new(presentation.display_text(id))
                .style(Style::default().fg(MUTED))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(text, content);
        }
    }
}

fn render_palette_menu(frame: &mut Frame, area: Rect, app: &mut App) {
    let anchor = app.regions.palette_button;
    let names = all_names();
    let y = anchor.y + 1;
    let width = PALETTE_MENU_WIDTH.min(area.width.saturating_sub(anchor.x));
    let height = (names.len() as u16 + 2).min(area.height.saturating_sub(y));
    if width < 3 || height < 3 {
        return;
    }
    let menu = Rect::new(anchor.x, y, width, height);
    frame.render_widget(Clear, menu);
    let block = Block::default()
        .title(" Palette ")
        .title_style(Style::default().fg(ACCENT).bold())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .style(Style::default().bg(Color::Black));
    let inner = block.inner(menu);
    frame.render_widget(block, menu);

    let mut items = Vec::new();
    for (row, name) in names.iter().take(usize::from(inner.height)).enumerate() {
        let rect = Rect::new(inner.x, inner.y + row as u16, inner.width, 1);
        let mut spans = swatch(&Palette::named(name), MENU_SWATCH_WIDTH);
        spans.push(Span::raw(format!(" {}", name)));
        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(selected_style(*name == app.palette.name)),
            rect,
        );
        items.push((name.to_string(), rect));
    }
    app.regions.palette_menu = Some(menu);
    app.regions.palette_items = items;
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let content = if let Some(ref msg) = app.status_message {
        let style = match msg.level {
            StatusLevel::Info => Style::default().fg(Color::White),
            StatusLevel::Warning => Style::default().fg(Color::Yellow),
            StatusLevel::Error => Style::default().fg(Color::Red),
            StatusLevel::Success => Style::default().fg(Color::Green),
        };
        Paragraph::new(msg.text.as_str())
            .style(style)
            .wrap(Wrap { trim: true })
    } else {
        let help = match app.focus {
            Focus::Mosaic => {
                "arrows: tile | s: split | x: remove | m: maximize | i: info | e: export | Tab: next | ?: help"
            }
            Focus::Files => "up/down: file | r: refresh | Tab: next | ?: help",
            Focus::Indices => "up/down: index | scroll: index | Tab: next | ?: help",
        };
        Paragraph::new(help).style(Style::default().fg(MUTED))
    };

    let block = Block::default().borders(Borders::TOP);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(content.alignment(Alignment::Center), inner);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    // Center the help popup
    let popup_width = 60u16.min(area.width);
    let popup_height = 34u16.min(area.height);
    let popup_x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let help_text = r#"
 npy-mosaic - Keyboard & Mouse

 TILES
   arrows / hjkl    Cycle the active tile
   s                Split active tile (or create one)
   x                Remove active tile
   m                Maximize / restore active tile
   i                Toggle info panel
   [ / ]            Narrow / widen info panel
   + / -            Grow / shrink active tile's split
   e                Export heatmap to HTML

 DATA
   n / N            Next / previous file
   Tab              Cycle focus: tiles, files, index
   r                Refresh file list

 DISPLAY
   p                Palette menu (arrows preview)
   c                Toggle color scale

 MOUSE
   Click title      Select tile, or press its button
   Drag title       Swap with the tile dropped on
   Drag border      Resize split or sidebar
   Scroll sidebar   Step the index

 OTHER
   ? / F1           Toggle this help
   q / Ctrl+C       Quit application
"#;

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .title(" Help ")
                .title_style(Style::default().fg(ACCENT).bold())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .style(Style::default().bg(Color::Black)),
        );

    frame.render_widget(help, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::tui::controller::{resolve_click, Action};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn drawn(app: &mut App, width: u16, height: u16) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        terminal
    }

    #[test]
    fn test_window_keeps_selection_visible() {
        assert_eq!(window_start(3, 5, 10), 0);
        assert_eq!(window_start(0, 50, 10), 0);
        assert_eq!(window_start(25, 50, 10), 20);
        assert_eq!(window_start(49, 50, 10), 40);
        assert_eq!(window_start(7, 50, 0), 0);
    }

    #[test]
    fn test_draw_registers_every_tile() {
        let mut app = App::new(AppConfig::default());
        drawn(&mut app, 120, 40);
        assert_eq!(app.regions.tiles.len(), 4);
        for id in ["a", "b", "c", "d"] {
            let regions = app.regions.tiles.lookup(&id.into()).unwrap();
            assert_eq!(regions.buttons.len(), TitleButton::ALL.len());
        }
        assert!(app.regions.sidebar.width > 0);
        assert!(app.regions.palette_button.width > 0);
        assert!(app.regions.palette_menu.is_none());
    }

    #[test]
    fn test_maximized_tile_hides_others() {
        let mut app = App::new(AppConfig::default());
        app.workspace.toggle_maximize(&"b".into());
        drawn(&mut app, 120, 40);
        assert_eq!(app.regions.tiles.len(), 1);
        assert_eq!(
            app.regions.tiles.lookup(&"b".into()).map(|r| r.frame),
            Some(app.regions.mosaic)
        );
    }

    #[test]
    fn test_empty_mosaic_click_creates_tile() {
        let mut app = App::new(AppConfig::default());
        for id in ["a", "b", "c", "d"] {
            app.workspace.remove(&id.into());
        }
        drawn(&mut app, 120, 40);
        assert!(app.regions.tiles.is_empty());
        let mosaic = app.regions.mosaic;
        let action = resolve_click(&app.regions, false, mosaic.x + 5, mosaic.y + 5);
        assert!(matches!(action, Some(Action::CreateTile)));
    }

    #[test]
    fn test_palette_menu_lists_all_palettes() {
        let mut app = App::new(AppConfig::default());
        app.palette_open = true;
        drawn(&mut app, 120, 40);
        let items: Vec<&str> = app.regions.palette_items.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(items.first(), all_names().first());
        assert!(items.contains(&"Viridis"));
        assert!(app.regions.palette_menu.is_some());
    }
}
