use super::input::{Control, Cursor, controls};
use crate::{
    background::{Color, Raster},
    form::{Field, FieldKind, FieldState, FormController},
};
use crossterm::{
    QueueableCommand,
    cursor::MoveTo,
    style::{Attribute, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
};
use std::io::{self, Write};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const PANEL: Color = Color::new(0x2b, 0x1d, 0x30);
const TEXT: Color = Color::new(0xf4, 0xe9, 0xf0);
const MUTED: Color = Color::new(0xb5, 0x9f, 0xb0);
const ACCENT: Color = Color::new(0xff, 0x8f, 0xc7);
const HIGHLIGHT: Color = Color::new(0x4a, 0x30, 0x50);
const INPUT: Color = Color::new(0x3a, 0x28, 0x3f);
const TRACK: Color = Color::new(0x4d, 0x3a, 0x52);
const ALERT: Color = Color::new(0x5c, 0x1f, 0x2e);

const MAX_PANEL_WIDTH: u16 = 76;
const MIN_COLUMNS: u16 = 24;
const MIN_ROWS: u16 = 10;
const SLIDER_TRACK: usize = 21;
const HELP: &str = "Tab next  ←/→ choose  Space select  PgDn next  PgUp back  Ctrl+S submit  Esc quit";

/// Marks the cell covered by the right half of a double width character.
const CONTINUATION: char = '\0';

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Cell {
    pub(crate) symbol: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
    pub(crate) bold: bool,
}

#[derive(Clone, Copy, Debug)]
struct Style {
    fg: Color,
    bg: Option<Color>,
    bold: bool,
}

impl Style {
    const fn fg(fg: Color) -> Self {
        Self { fg, bg: None, bold: false }
    }

    const fn bold(self) -> Self {
        Self { bold: true, ..self }
    }

    const fn on(self, bg: Color) -> Self {
        Self { bg: Some(bg), ..self }
    }
}

#[derive(Clone, Debug)]
struct Span {
    text: String,
    style: Style,
}

type Line = Vec<Span>;

fn span<S: Into<String>>(text: S, style: Style) -> Span {
    Span { text: text.into(), style }
}

/// A full screen of cells, composed off screen and then written out in one go.
#[derive(Clone, Debug)]
pub(crate) struct Frame {
    columns: u16,
    rows: u16,
    cells: Vec<Cell>,
}

impl Frame {
    pub(crate) fn new(columns: u16, rows: u16, backdrop: Color) -> Self {
        let cell = Cell { symbol: ' ', fg: TEXT, bg: backdrop, bold: false };
        Self { columns, rows, cells: vec![cell; columns as usize * rows as usize] }
    }

    pub(crate) fn cell(&self, x: u16, y: u16) -> Option<&Cell> {
        if x >= self.columns || y >= self.rows {
            return None;
        }
        self.cells.get(y as usize * self.columns as usize + x as usize)
    }

    fn cell_mut(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        if x >= self.columns || y >= self.rows {
            return None;
        }
        self.cells.get_mut(y as usize * self.columns as usize + x as usize)
    }

    /// Paint the raster using half blocks: every cell shows two vertically stacked pixels.
    pub(crate) fn paint_background(&mut self, raster: &Raster) {
        let columns = raster.columns().min(self.columns as usize);
        let rows = raster.rows().div_ceil(2).min(self.rows as usize);
        for y in 0..rows {
            for x in 0..columns {
                let Some(top) = raster.pixel(x, y * 2) else { continue };
                // An odd number of pixel rows leaves the last cell with a single pixel.
                let bottom = raster.pixel(x, y * 2 + 1).unwrap_or(top);
                if let Some(cell) = self.cell_mut(x as u16, y as u16) {
                    *cell = Cell { symbol: '▀', fg: top, bg: bottom, bold: false };
                }
            }
        }
    }

    fn fill(&mut self, x: u16, y: u16, width: u16, height: u16, bg: Color) {
        for row in y..y.saturating_add(height) {
            for column in x..x.saturating_add(width) {
                if let Some(cell) = self.cell_mut(column, row) {
                    *cell = Cell { symbol: ' ', fg: TEXT, bg, bold: false };
                }
            }
        }
    }

    /// Write text starting at the given position, truncating it to `max_width` cells.
    fn put_text(&mut self, x: u16, y: u16, text: &str, style: Style, max_width: u16) -> u16 {
        let mut used = 0;
        for symbol in text.chars() {
            let width = symbol.width().unwrap_or(0) as u16;
            if width == 0 {
                continue;
            }
            if used + width > max_width {
                break;
            }
            for offset in 0..width {
                if let Some(cell) = self.cell_mut(x + used + offset, y) {
                    let bg = style.bg.unwrap_or(cell.bg);
                    let symbol = if offset == 0 { symbol } else { CONTINUATION };
                    *cell = Cell { symbol, fg: style.fg, bg, bold: style.bold };
                }
            }
            used += width;
        }
        used
    }

    fn put_line(&mut self, x: u16, y: u16, line: &Line, max_width: u16) {
        let mut used = 0;
        for span in line {
            used += self.put_text(x + used, y, &span.text, span.style, max_width.saturating_sub(used));
        }
    }

    /// Write the frame to the terminal.
    pub(crate) fn flush<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut current: Option<(Color, Color, bool)> = None;
        for y in 0..self.rows {
            writer.queue(MoveTo(0, y))?;
            for x in 0..self.columns {
                let Some(cell) = self.cell(x, y) else { continue };
                if cell.symbol == CONTINUATION {
                    continue;
                }
                let style = (cell.fg, cell.bg, cell.bold);
                if current != Some(style) {
                    let bold = if cell.bold { Attribute::Bold } else { Attribute::NormalIntensity };
                    writer
                        .queue(SetAttribute(bold))?
                        .queue(SetForegroundColor(cell.fg.into()))?
                        .queue(SetBackgroundColor(cell.bg.into()))?;
                    current = Some(style);
                }
                writer.queue(Print(cell.symbol))?;
            }
        }
        writer.queue(ResetColor)?;
        writer.flush()
    }

    #[cfg(test)]
    pub(crate) fn row_text(&self, y: u16) -> String {
        (0..self.columns)
            .filter_map(|x| self.cell(x, y))
            .map(|cell| cell.symbol)
            .filter(|symbol| *symbol != CONTINUATION)
            .collect()
    }
}

/// Everything that's shown on screen.
pub(crate) struct View<'a> {
    pub(crate) controller: &'a FormController,
    pub(crate) background: Option<&'a Raster>,
    pub(crate) cursor: &'a Cursor,
    pub(crate) alert: Option<&'a str>,
    pub(crate) submitting: bool,
}

/// Compose the whole screen: the background with the form panel on top of it.
pub(crate) fn compose(view: &View, columns: u16, rows: u16, backdrop: Color) -> Frame {
    let mut frame = Frame::new(columns, rows, backdrop);
    if let Some(raster) = view.background {
        frame.paint_background(raster);
    }
    if columns < MIN_COLUMNS || rows < MIN_ROWS {
        frame.put_text(0, 0, "Terminal too small", Style::fg(TEXT).on(PANEL), columns);
        return frame;
    }

    let panel_width = columns.saturating_sub(4).min(MAX_PANEL_WIDTH);
    let panel_x = (columns - panel_width) / 2;
    let panel_height = rows - 2;
    frame.fill(panel_x, 1, panel_width, panel_height, PANEL);

    let inner_x = panel_x + 2;
    let inner_width = panel_width.saturating_sub(4);
    let header = header_lines(view.controller, inner_width as usize);
    let mut y = 2;
    for line in &header {
        frame.put_line(inner_x, y, line, inner_width);
        y += 1;
    }

    // The body scrolls so the focused control stays on screen.
    let body_top = y + 1;
    let body_bottom = rows.saturating_sub(4);
    let visible = body_bottom.saturating_sub(body_top) as usize;
    let (body, focus) = body_lines(view, inner_width as usize);
    let scroll = focus.saturating_sub(visible.saturating_sub(3)).min(body.len().saturating_sub(visible));
    for (offset, line) in body.iter().skip(scroll).take(visible).enumerate() {
        frame.put_line(inner_x, body_top + offset as u16, line, inner_width);
    }

    let help = if view.controller.is_submitted() { "Enter close" } else { HELP };
    frame.put_text(inner_x, rows - 3, help, Style::fg(MUTED).on(PANEL), inner_width);

    if let Some(message) = view.alert {
        draw_alert(&mut frame, message, columns, rows);
    }
    frame
}

fn header_lines(controller: &FormController, width: usize) -> Vec<Line> {
    let structure = controller.structure();
    let progress = controller.progress();
    let percentage = format!(" {:>3}%", progress.percentage());
    let bar_width = width.saturating_sub(percentage.width());
    let filled = ((bar_width as f32) * progress.fraction).round() as usize;
    vec![
        vec![span(&structure.title, Style::fg(ACCENT).bold())],
        vec![],
        vec![
            span("█".repeat(filled), Style::fg(ACCENT)),
            span("█".repeat(bar_width - filled.min(bar_width)), Style::fg(TRACK)),
            span(percentage, Style::fg(MUTED)),
        ],
        vec![span(&progress.label, Style::fg(MUTED))],
    ]
}

/// Build the scrollable part of the panel, returning its lines and the line the focused
/// control starts at.
fn body_lines(view: &View, width: usize) -> (Vec<Line>, usize) {
    let controller = view.controller;
    let structure = controller.structure();
    let mut lines = Vec::new();
    if controller.is_submitted() {
        lines.extend(wrap(&structure.confirmation, width).into_iter().map(|text| vec![span(text, Style::fg(TEXT))]));
        return (lines, 0);
    }
    let visible = (1..=controller.total_sections()).find(|section| controller.is_visible(*section));
    let Some(section) = visible.and_then(|section| structure.sections.get(section - 1)) else {
        return (lines, 0);
    };

    if controller.current_section() == 1 {
        if let Some(intro) = &structure.intro {
            lines.extend(wrap(intro, width).into_iter().map(|text| vec![span(text, Style::fg(MUTED))]));
            lines.push(vec![]);
        }
    }
    lines.push(vec![span(&section.title, Style::fg(TEXT).bold())]);
    lines.push(vec![]);

    let mut focus = 0;
    for (index, control) in controls(controller).into_iter().enumerate() {
        let focused = index == view.cursor.control;
        if focused {
            focus = lines.len();
        }
        match control {
            Control::Field(field) => field_lines(&mut lines, field, controller, view.cursor, focused, width),
            Control::Submit => {
                let (label, style) = match (view.submitting, focused) {
                    (true, _) => ("  Submitting...  ", Style::fg(MUTED).on(INPUT)),
                    (false, true) => ("[ Submit ]", Style::fg(PANEL).on(ACCENT).bold()),
                    (false, false) => ("[ Submit ]", Style::fg(ACCENT).on(INPUT)),
                };
                lines.push(vec![span(label, style)]);
            }
        }
        lines.push(vec![]);
    }
    (lines, focus)
}

fn field_lines(
    lines: &mut Vec<Line>,
    field: &Field,
    controller: &FormController,
    cursor: &Cursor,
    focused: bool,
    width: usize,
) {
    let marker = if focused { span("› ", Style::fg(ACCENT).bold()) } else { span("  ", Style::fg(TEXT)) };
    for (index, text) in wrap(&field.label, width.saturating_sub(2)).into_iter().enumerate() {
        let prefix = if index == 0 { marker.clone() } else { span("  ", Style::fg(TEXT)) };
        lines.push(vec![prefix, span(text, Style::fg(TEXT))]);
    }

    let state = controller.field_state(&field.name);
    match (&field.kind, state) {
        (FieldKind::Text, Some(FieldState::Text(text))) => {
            let box_width = width.saturating_sub(4);
            let caret = if focused { "▏" } else { " " };
            let shown = tail_fitting(text, box_width.saturating_sub(2));
            let padding = box_width.saturating_sub(shown.width() + 2);
            let content = format!(" {shown}{caret}{}", " ".repeat(padding));
            lines.push(vec![span("  ", Style::fg(TEXT)), span(content, Style::fg(TEXT).on(INPUT))]);
        }
        (FieldKind::SingleChoice { options }, Some(FieldState::Choice(selected))) => {
            for (index, option) in options.iter().enumerate() {
                let mark = if *selected == Some(index) { "(•)" } else { "( )" };
                lines.push(option_line(mark, option.label(), focused && cursor.option == index));
            }
        }
        (FieldKind::MultiChoice { options }, Some(FieldState::Checks(checks))) => {
            for (index, (option, checked)) in options.iter().zip(checks).enumerate() {
                let mark = if *checked { "[x]" } else { "[ ]" };
                lines.push(option_line(mark, option.label(), focused && cursor.option == index));
            }
        }
        (FieldKind::Slider { min, max, .. }, Some(FieldState::Slider(value))) => {
            let span_width = max.abs_diff(*min).max(1) as f32;
            let position = ((value.abs_diff(*min) as f32 / span_width) * (SLIDER_TRACK - 1) as f32).round() as usize;
            let display = controller.slider_display(&field.name).unwrap_or_default();
            let knob = if focused { Style::fg(ACCENT).bold() } else { Style::fg(TEXT) };
            lines.push(vec![
                span(format!("    {min} "), Style::fg(MUTED)),
                span("━".repeat(position), Style::fg(ACCENT)),
                span("●", knob),
                span("━".repeat(SLIDER_TRACK - 1 - position.min(SLIDER_TRACK - 1)), Style::fg(TRACK)),
                span(format!(" {max}   "), Style::fg(MUTED)),
                span(display.to_string(), Style::fg(TEXT).bold()),
            ]);
        }
        _ => (),
    }
}

fn option_line(mark: &str, label: &str, highlighted: bool) -> Line {
    let style = if highlighted { Style::fg(TEXT).on(HIGHLIGHT) } else { Style::fg(TEXT) };
    vec![span("    ", Style::fg(TEXT)), span(format!("{mark} {label}"), style)]
}

fn draw_alert(frame: &mut Frame, message: &str, columns: u16, rows: u16) {
    let width = columns.saturating_sub(8).min(50);
    let text = wrap(message, width.saturating_sub(4) as usize);
    let height = text.len() as u16 + 5;
    let x = (columns - width) / 2;
    let y = rows.saturating_sub(height) / 2;
    frame.fill(x, y, width, height, ALERT);

    let inner = width.saturating_sub(4);
    frame.put_text(x + 2, y + 1, "Error", Style::fg(TEXT).on(ALERT).bold(), inner);
    for (offset, line) in text.iter().enumerate() {
        frame.put_text(x + 2, y + 2 + offset as u16, line, Style::fg(TEXT).on(ALERT), inner);
    }
    frame.put_text(x + 2, y + height - 2, "[ OK ]", Style::fg(PANEL).on(ACCENT).bold(), inner);
}

/// Word wrap text so that each line fits in `width` cells. Words longer than a line are
/// left for the renderer to truncate.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.width() + 1 + word.width() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// The longest suffix of `text` that fits in `width` cells.
fn tail_fitting(text: &str, width: usize) -> &str {
    let mut used = 0;
    for (index, symbol) in text.char_indices().rev() {
        used += symbol.width().unwrap_or(0);
        if used > width {
            return &text[index + symbol.len_utf8()..];
        }
    }
    text
}
