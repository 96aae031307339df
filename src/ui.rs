use crate::app::App;
use crate::braille::{draw_polyline, fill_rings, BrailleCanvas};
use glam::DVec2;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};
use tui_choropleth::color::case_color;
use tui_choropleth::map::ViewTransform;
use tui_choropleth::scene::{BorderLayer, Scene};
use tui_choropleth::{MapStatistic, Rgba, ViewState};

/// Color translucent fills and strokes are composited over
const BACKDROP: Rgba = Rgba::rgb(0x12, 0x14, 0x18);
/// Lighter backdrop once the scene switches to zone styling
const ZONE_BACKDROP: Rgba = Rgba::rgb(0x2b, 0x2f, 0x36);

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into map area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_map(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.map.meta() {
        Some(meta) => format!(" {} ", meta.name),
        None => " Loading ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(transform) = app.view_transform() else {
        return;
    };
    frame.render_widget(
        MapWidget {
            scene: app.map.scene(),
            transform,
        },
        inner,
    );
}

fn to_color(c: Rgba) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

/// Paints the retained scene: region fills as cell backgrounds, borders and
/// the highlight outline as braille dots
struct MapWidget<'a> {
    scene: &'a Scene,
    transform: ViewTransform,
}

impl MapWidget<'_> {
    fn to_pixels(&self, points: impl Iterator<Item = DVec2>) -> Vec<DVec2> {
        points.map(|p| self.transform.to_surface(p)).collect()
    }

    fn paint(&self, canvas: &mut BrailleCanvas) {
        let backdrop = if self.scene.zone_styled() { ZONE_BACKDROP } else { BACKDROP };

        // Regions in paint order, so the raised hovered shape lands last
        for region in self.scene.regions() {
            let fill = *region.fill.value();
            if fill.is_transparent() {
                continue;
            }
            let rings: Vec<Vec<DVec2>> = region.path.rings().map(|ring| self.to_pixels(ring)).collect();
            fill_rings(canvas, &rings, fill.over(backdrop));
        }

        for layer in [BorderLayer::States, BorderLayer::Districts] {
            let Some(border) = self.scene.borders(layer) else {
                continue;
            };
            let stroke = *border.stroke.value();
            if border.stroke_width <= 0.0 || stroke.is_transparent() {
                continue;
            }
            let ink = stroke.over(backdrop);
            for line in &border.lines {
                draw_polyline(canvas, &self.to_pixels(line.iter().copied()), ink);
            }
        }

        if let Some(hovered) = self.scene.hovered() {
            let ink = hovered.stroke.value().over(backdrop);
            for ring in hovered.path.rings() {
                draw_polyline(canvas, &self.to_pixels(ring), ink);
            }
        }
    }
}

impl Widget for MapWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut canvas = BrailleCanvas::new(area.width as usize, area.height as usize);
        self.paint(&mut canvas);

        for cy in 0..area.height {
            for cx in 0..area.width {
                let Some(cell) = canvas.cell(cx as usize, cy as usize) else {
                    continue;
                };
                let target = &mut buf[(area.x + cx, area.y + cy)];
                if let Some(paint) = cell.paint {
                    target.set_bg(to_color(paint));
                }
                // Skip empty braille characters (U+2800)
                if let (Some(ink), false) = (cell.ink, cell.ch == '\u{2800}') {
                    target.set_char(cell.ch).set_fg(to_color(ink));
                }
            }
        }
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let metric = app.map.metric();
    let statistic = match app.map.meta().map(|m| m.statistic) {
        Some(MapStatistic::Zone) => "zones",
        _ => "totals",
    };
    let state = match app.map.view_state() {
        ViewState::Ready => String::new(),
        ViewState::Loading { target } => format!(" loading {target}…"),
        ViewState::Transitioning { target } => format!(" opening {target}…"),
    };
    let hovered = app
        .map
        .scene()
        .hovered()
        .map(|shape| {
            shape
                .tooltip
                .clone()
                .unwrap_or_else(|| shape.properties.display_name().to_string())
        })
        .unwrap_or_default();

    let mut spans = vec![
        Span::styled(" Metric: ", Style::default().fg(Color::DarkGray)),
        Span::styled(metric.as_str(), Style::default().fg(to_color(case_color(metric)))),
        Span::styled(format!(" ({statistic})"), Style::default().fg(Color::Magenta)),
        Span::styled(state, Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(hovered, Style::default().fg(Color::White)),
    ];
    if let Some(metric) = app.map.unassigned_notice() {
        spans.push(Span::styled(
            format!(" | district {metric} numbers under reconciliation"),
            Style::default().fg(Color::Yellow),
        ));
    }
    if let Some(status) = &app.status {
        spans.push(Span::styled(format!(" | {status}"), Style::default().fg(Color::Red)));
    }
    spans.push(Span::styled(
        " | m:metric z:zones ⌫:back q:quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
