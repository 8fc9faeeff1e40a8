//! Layout and drawing: menu, board, ghost, tray, sidebar, quit menu, game over, effects.

use crate::app::{MenuEntry, MenuState, QuitOption, Screen};
use crate::board::{BOARD_SIZE, Cell};
use crate::fx::{ClearFade, SPARK_OFFSETS, VisualFx, CLEAR_FADE_MS};
use crate::game::{GameOverReason, GameSession, HAND_SIZE, TIME_LIMIT_SECS};
use crate::input::{Drag, Ghost, TrayMetrics};
use crate::placement::GridMetrics;
use crate::shapes::Shape;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{CellFilter, Duration as TfxDuration, EffectRenderer, Interpolation, fx, ref_count};

/// Terminal cells per board cell.
pub const CELL_W: u16 = 4;
pub const CELL_H: u16 = 2;
/// Board with its border.
const BOARD_W: u16 = BOARD_SIZE as u16 * CELL_W + 2;
const BOARD_H: u16 = BOARD_SIZE as u16 * CELL_H + 2;
const TRAY_W: u16 = 16;
const SLOT_H: u16 = 6;
const SIDEBAR_WIDTH: u16 = 26;
/// Tray pieces are drawn at half scale: 2 columns x 1 row per cell.
const MINI_W: u16 = 2;

/// Where everything sits for a given terminal area. Shared by drawing and pointer hit tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardLayout {
    pub board: Rect,
    pub grid: Rect,
    pub tray: Rect,
    pub sidebar: Rect,
    pub metrics: GridMetrics,
    pub tray_metrics: TrayMetrics,
}

pub fn board_layout(area: Rect) -> BoardLayout {
    let total_w = BOARD_W + TRAY_W + SIDEBAR_WIDTH;
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(BOARD_H),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(BOARD_W),
            Constraint::Length(TRAY_W),
            Constraint::Length(SIDEBAR_WIDTH),
        ])
        .split(vert[1]);
    let board = cols[0];
    let grid = Rect {
        x: board.x + 1,
        y: board.y + 1,
        width: board.width.saturating_sub(2),
        height: board.height.saturating_sub(2),
    };
    let tray = cols[1];
    let slots = std::array::from_fn(|i| {
        Rect {
            x: tray.x,
            y: tray.y + 1 + i as u16 * SLOT_H,
            width: tray.width,
            height: SLOT_H,
        }
        .intersection(tray)
    });
    BoardLayout {
        board,
        grid,
        tray,
        sidebar: cols[2],
        metrics: GridMetrics {
            origin_x: grid.x as f32,
            origin_y: grid.y as f32,
            cell_w: CELL_W as f32,
            cell_h: CELL_H as f32,
        },
        tray_metrics: TrayMetrics { slots },
    }
}

/// Everything one frame needs to read.
pub struct View<'a> {
    pub screen: Screen,
    pub session: &'a GameSession,
    pub drag: Option<Drag>,
    pub ghost: Option<&'a Ghost>,
    pub menu: &'a MenuState,
    pub quit_selected: QuitOption,
    pub has_save: bool,
    pub theme: &'a Theme,
    pub layout: BoardLayout,
    pub now: Instant,
}

pub fn draw(frame: &mut Frame, view: &View<'_>, fx: &mut VisualFx) {
    let area = frame.area();
    Block::default()
        .style(Style::default().bg(view.theme.bg))
        .render(area, frame.buffer_mut());
    match view.screen {
        Screen::Menu => draw_menu(frame, view, area),
        Screen::Playing => {
            draw_game(frame, view);
            draw_effects(frame, view, fx);
        }
        Screen::QuitMenu => {
            draw_game(frame, view);
            draw_quit_menu(frame, view.theme, view.quit_selected);
        }
        Screen::GameOver => {
            draw_game(frame, view);
            draw_effects(frame, view, fx);
            if let crate::game::Status::Over(reason) = view.session.status {
                draw_game_over(frame, view, reason, area);
            }
        }
    }
}

fn bold(style: Style) -> Style {
    style.add_modifier(Modifier::BOLD)
}

/// Centred rect of at most `w` x `h` inside `area`.
fn centered(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

/// `set_string` that skips positions outside the buffer.
fn put(buf: &mut Buffer, x: u16, y: u16, s: &str, style: Style) {
    if buf.area.contains(Position::new(x, y)) {
        buf.set_string(x, y, s, style);
    }
}

fn draw_menu(frame: &mut Frame, view: &View<'_>, area: Rect) {
    let theme = view.theme;
    let entries = view.menu.entries(view.has_save);
    let popup_h = entries.len() as u16 * 2 + 9;
    let popup = centered(area, 44, popup_h);

    let title = Line::from(vec![
        Span::styled(" NEON ", bold(Style::default().fg(theme.title))),
        Span::styled("BLOCKS ", bold(Style::default().fg(theme.blocks[0]))),
    ]);
    let highlight_style = bold(Style::default().fg(theme.bg).bg(theme.blocks[0]));
    let normal_style = Style::default().fg(theme.main_fg);
    let hint_style = Style::default().fg(theme.inactive_fg);

    let mut lines = vec![Line::from(""), title, Line::from("")];
    for (i, entry) in entries.iter().enumerate() {
        let label = match entry {
            MenuEntry::Resume => " Resume saved game ".to_string(),
            MenuEntry::Mode(mode) => format!(" {} ", mode.label()),
            MenuEntry::Exit => " Exit ".to_string(),
        };
        let style = if i == view.menu.selected {
            highlight_style
        } else {
            normal_style
        };
        lines.push(Line::from(Span::styled(label, style)));
        let hint = match entry {
            MenuEntry::Mode(mode) => mode_hint(*mode),
            _ => "",
        };
        lines.push(Line::from(Span::styled(hint, hint_style)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Best: {}", view.session.score.high_score()),
        Style::default().fg(theme.title),
    )));
    lines.push(Line::from(Span::styled(
        "↑/↓ choose   Enter start   q quit",
        hint_style,
    )));

    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );

    // slide in from below
    let elapsed = view
        .now
        .saturating_duration_since(view.menu.animation_start)
        .as_millis() as f32;
    let t = (elapsed / 500.0).min(1.0);
    let offset_t = 1.0 - (1.0 - t).powi(3);
    let mut anim_popup = popup;
    anim_popup.y += ((1.0 - offset_t) * 6.0) as u16;
    p.render(anim_popup.intersection(area), frame.buffer_mut());
}

fn mode_hint(mode: crate::GameMode) -> &'static str {
    match mode {
        crate::GameMode::Classic => "no timer, no bombs",
        crate::GameMode::Time => "120 s, clears add time",
        crate::GameMode::Bomb => "defuse bombs by clearing",
        crate::GameMode::Color => "one-colour lines score x3",
    }
}

fn draw_game(frame: &mut Frame, view: &View<'_>) {
    draw_board(frame, view);
    draw_tray(frame, view);
    draw_sidebar(frame, view, view.layout.sidebar);
}

fn empty_bg(theme: &Theme, row: usize, col: usize) -> Color {
    if (row / 3 + col / 3) % 2 == 1 {
        theme.square_bg
    } else {
        theme.bg
    }
}

/// Top-left terminal cell of board cell (row, col).
fn cell_origin(grid: Rect, row: usize, col: usize) -> (u16, u16) {
    (
        grid.x + col as u16 * CELL_W,
        grid.y + row as u16 * CELL_H,
    )
}

/// Fill one board cell with `glyph` in both terminal rows.
fn paint_cell(buf: &mut Buffer, grid: Rect, row: usize, col: usize, glyph: &str, style: Style) {
    let (x, y) = cell_origin(grid, row, col);
    for dy in 0..CELL_H {
        for dx in 0..CELL_W {
            if let Some(c) = buf.cell_mut(Position::new(x + dx, y + dy)) {
                c.set_symbol(glyph).set_style(style);
            }
        }
    }
}

fn draw_filled(buf: &mut Buffer, theme: &Theme, grid: Rect, row: usize, col: usize, cell: Cell) {
    let color = theme.block_color(cell.color);
    if cell.rock {
        paint_cell(buf, grid, row, col, "▓", Style::default().fg(color).bg(theme.bg));
        return;
    }
    let glyph = if cell.ice { "░" } else { " " };
    paint_cell(buf, grid, row, col, glyph, Style::default().fg(theme.ice).bg(color));
    if let Some(fuse) = cell.bomb {
        let (x, y) = cell_origin(grid, row, col);
        put(
            buf,
            x,
            y,
            &format!("{:^4}", fuse.max(0)),
            bold(Style::default().fg(theme.bomb).bg(Color::Black)),
        );
    }
}

fn draw_board(frame: &mut Frame, view: &View<'_>) {
    let theme = view.theme;
    let layout = view.layout;
    let session = view.session;
    let title = format!(" Neon Blocks · {} ", session.mode.label());
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, Style::default().fg(theme.title)))
        .render(layout.board, frame.buffer_mut());

    let buf = frame.buffer_mut();
    for row in 0..BOARD_SIZE {
        for col in 0..BOARD_SIZE {
            match session.board.get(row, col) {
                Some(cell) => draw_filled(buf, theme, layout.grid, row, col, cell),
                None => {
                    let bg = empty_bg(theme, row, col);
                    paint_cell(buf, layout.grid, row, col, " ", Style::default().bg(bg));
                    let (x, y) = cell_origin(layout.grid, row, col);
                    put(buf, x + 1, y, "·", Style::default().fg(theme.div_line).bg(bg));
                }
            }
        }
    }

    if let (Some(ghost), Some(drag)) = (view.ghost, view.drag) {
        if let Some(item) = session.hand.get(drag.slot).and_then(Option::as_ref) {
            draw_ghost(buf, theme, layout.grid, view, ghost, &item.shape);
        }
    }
}

fn draw_ghost(buf: &mut Buffer, theme: &Theme, grid: Rect, view: &View<'_>, ghost: &Ghost, shape: &Shape) {
    // groups that would clear light up first, then the outline goes on top
    for row in 0..BOARD_SIZE {
        for col in 0..BOARD_SIZE {
            if !ghost.prediction.covers(row, col) {
                continue;
            }
            if let Some(cell) = view.session.board.get(row, col) {
                if !cell.rock {
                    paint_cell(
                        buf,
                        grid,
                        row,
                        col,
                        " ",
                        Style::default().bg(theme.highlight),
                    );
                }
            }
        }
    }
    let (glyph, color) = if ghost.valid {
        ("▒", theme.ghost_ok)
    } else {
        ("╳", theme.ghost_blocked)
    };
    for (dr, dc) in shape.offsets() {
        let r = ghost.pos.row + dr as i32;
        let c = ghost.pos.col + dc as i32;
        if !(0..BOARD_SIZE as i32).contains(&r) || !(0..BOARD_SIZE as i32).contains(&c) {
            continue;
        }
        let (r, c) = (r as usize, c as usize);
        let bg = if ghost.prediction.covers(r, c) {
            theme.highlight
        } else {
            empty_bg(theme, r, c)
        };
        paint_cell(buf, grid, r, c, glyph, Style::default().fg(color).bg(bg));
    }
}

fn draw_tray(frame: &mut Frame, view: &View<'_>) {
    let theme = view.theme;
    let held = view.drag.map(|d| d.slot);
    for slot in 0..HAND_SIZE {
        let area = view.layout.tray_metrics.slots[slot];
        let is_held = held == Some(slot);
        let border = if is_held {
            Style::default().fg(theme.inactive_fg).bg(theme.bg)
        } else {
            Style::default().fg(theme.div_line).bg(theme.bg)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(Span::styled(
                format!(" {} ", slot + 1),
                Style::default().fg(theme.inactive_fg),
            ));
        let inner = block.inner(area);
        block.render(area, frame.buffer_mut());
        let Some(item) = &view.session.hand[slot] else {
            continue;
        };
        let color = if is_held {
            theme.inactive_fg
        } else {
            theme.block_color(item.color)
        };
        draw_mini_shape(frame.buffer_mut(), inner, &item.shape, color);
    }
}

/// Piece at half scale, centred in `area`.
fn draw_mini_shape(buf: &mut Buffer, area: Rect, shape: &Shape, color: Color) {
    let w = shape.width() as u16 * MINI_W;
    let h = shape.height() as u16;
    let origin = centered(area, w, h);
    for (r, c) in shape.offsets() {
        let x = origin.x + c as u16 * MINI_W;
        let y = origin.y + r as u16;
        if y < area.bottom() && x < area.right() {
            put(buf, x, y, "██", Style::default().fg(color));
        }
    }
}

fn sidebar_block_style(theme: &Theme) -> Style {
    Style::default().fg(theme.div_line).bg(theme.bg)
}

fn draw_sidebar(frame: &mut Frame, view: &View<'_>, area: Rect) {
    let theme = view.theme;
    let session = view.session;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = sidebar_block_style(theme);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Stats
            Constraint::Length(1),
            Constraint::Length(4), // Timer or bombs
            Constraint::Length(1),
            Constraint::Fill(1), // Keys
        ])
        .split(area);

    let stats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let stats_inner = stats_block.inner(chunks[0]);
    stats_block.render(chunks[0], frame.buffer_mut());
    let stat = |name: &'static str, value: String| {
        Line::from(vec![
            Span::styled(name, title_style),
            Span::styled(value, fg_style),
        ])
    };
    let stats_lines = vec![
        stat("Score: ", session.score.score().to_string()),
        stat("Best:  ", session.score.high_score().to_string()),
        stat("Moves: ", session.moves.to_string()),
        stat("Mode:  ", session.mode.label().to_string()),
    ];
    Paragraph::new(ratatui::text::Text::from(stats_lines)).render(stats_inner, frame.buffer_mut());

    if session.mode.has_timer() {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style);
        let inner = block.inner(chunks[2]);
        block.render(chunks[2], frame.buffer_mut());
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(inner);
        let secs = session.time_left;
        Paragraph::new(Line::from(vec![
            Span::styled("Time: ", title_style),
            Span::styled(format!("{:02}:{:02}", secs / 60, secs % 60), fg_style),
        ]))
        .render(rows[0], frame.buffer_mut());
        let ratio = (secs as f64 / TIME_LIMIT_SECS as f64).min(1.0);
        let bar_color = if ratio > 0.5 {
            Color::Green
        } else if secs > crate::game::LOW_TIME_SECS {
            Color::Yellow
        } else {
            Color::Red
        };
        Gauge::default()
            .ratio(ratio)
            .label("")
            .gauge_style(Style::default().fg(bar_color).bg(theme.square_bg))
            .render(rows[1], frame.buffer_mut());
    } else if session.mode.spawns_bombs() {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style);
        let inner = block.inner(chunks[2]);
        block.render(chunks[2], frame.buffer_mut());
        let nearest = session
            .board
            .filled_cells()
            .filter_map(|(_, _, c)| c.bomb)
            .min();
        let lines = vec![
            stat("Bombs: ", session.board.bomb_count().to_string()),
            match nearest {
                Some(n) => Line::from(vec![
                    Span::styled("Next:  ", title_style),
                    Span::styled(n.to_string(), bold(Style::default().fg(theme.bomb))),
                ]),
                None => Line::from(""),
            },
        ];
        Paragraph::new(ratatui::text::Text::from(lines)).render(inner, frame.buffer_mut());
    }

    let hint_style = Style::default().fg(theme.inactive_fg);
    let keys = vec![
        Line::from(Span::styled("mouse  drag a piece", hint_style)),
        Line::from(Span::styled("1-3    pick up", hint_style)),
        Line::from(Span::styled("arrows move", hint_style)),
        Line::from(Span::styled("enter  drop", hint_style)),
        Line::from(Span::styled("esc    put back", hint_style)),
        Line::from(Span::styled("r      rotate all", hint_style)),
        Line::from(Span::styled("q      menu", hint_style)),
    ];
    Paragraph::new(keys).render(chunks[4], frame.buffer_mut());
}

fn draw_effects(frame: &mut Frame, view: &View<'_>, fx: &mut VisualFx) {
    let grid = view.layout.grid;
    let theme = view.theme;
    let buf = frame.buffer_mut();
    for burst in &fx.bursts {
        let (x, y) = cell_origin(grid, burst.row, burst.col);
        let style = bold(Style::default().fg(theme.tint(burst.tint)));
        for i in 0..burst.live_sparks() as usize {
            let (dx, dy) = SPARK_OFFSETS[i % SPARK_OFFSETS.len()];
            let sx = x as i32 + 1 + dx as i32;
            let sy = y as i32 + dy as i32;
            if sx >= 0 && sy >= 0 {
                let glyph = if i % 2 == 0 { "*" } else { "+" };
                if let Some(c) = buf.cell_mut(Position::new(sx as u16, sy as u16)) {
                    c.set_symbol(glyph).set_fg(style.fg.unwrap_or(theme.main_fg));
                }
            }
        }
    }
    for text in &fx.texts {
        let (x, y) = cell_origin(grid, text.row, text.col);
        let w = text.text.chars().count() as u16;
        let tx = (x + CELL_W / 2).saturating_sub(w / 2).max(grid.x);
        let ty = y.saturating_sub(text.rise).max(grid.y);
        put(
            buf,
            tx,
            ty,
            &text.text,
            bold(Style::default().fg(theme.tint(text.tint)).bg(theme.bg)),
        );
    }
    if let Some(fade) = &mut fx.fade {
        apply_clear_fade(frame, view, fade);
    }
}

/// Terminal cells covered by the swept board cells.
fn swept_positions(grid: Rect, cells: &[(usize, usize)]) -> HashSet<(u16, u16)> {
    let mut out = HashSet::new();
    for &(row, col) in cells {
        let (x, y) = cell_origin(grid, row, col);
        for dy in 0..CELL_H {
            for dx in 0..CELL_W {
                out.insert((x + dx, y + dy));
            }
        }
    }
    out
}

/// Swept cells flash white, then the TachyonFX fade takes them to the background.
fn apply_clear_fade(frame: &mut Frame, view: &View<'_>, fade: &mut ClearFade) {
    let theme = view.theme;
    let grid = view.layout.grid;
    let delta = fade
        .last_process
        .map(|t| view.now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    fade.last_process = Some(view.now);

    for &(row, col) in &fade.cells {
        if view.session.board.get(row, col).is_none() {
            paint_cell(
                frame.buffer_mut(),
                grid,
                row,
                col,
                " ",
                Style::default().bg(theme.highlight),
            );
        }
    }

    if fade.effect.is_none() {
        let swept = swept_positions(grid, &fade.cells);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            swept.contains(&(pos.x, pos.y))
        }));
        let bg = theme.bg;
        fade.effect = Some(
            fx::fade_to(bg, bg, (CLEAR_FADE_MS, Interpolation::Linear))
                .with_filter(filter)
                .with_area(grid),
        );
    }
    if let Some(effect) = &mut fade.effect {
        frame.render_effect(effect, grid, TfxDuration::from_millis(delta_ms));
    }
}

fn draw_game_over(frame: &mut Frame, view: &View<'_>, reason: GameOverReason, area: Rect) {
    let theme = view.theme;
    let score = &view.session.score;
    let popup = centered(area, 36, 12);
    let title = match reason {
        GameOverReason::NoMoves => " No more moves ",
        GameOverReason::TimeUp => " Time's up! ",
        GameOverReason::BombExploded => " Boom! ",
    };
    let fg = Style::default().fg(theme.main_fg);
    let mut lines: Vec<Line> = vec![
        Line::from(""),
        Line::from(Span::styled(
            title,
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", score.score()), fg)),
        Line::from(Span::styled(format!(" Best: {} ", score.high_score()), fg)),
        Line::from(Span::styled(format!(" Moves: {} ", view.session.moves), fg)),
    ];
    if score.is_record() {
        lines.push(Line::from(Span::styled(
            " New record! ",
            bold(Style::default().fg(Color::Yellow)),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " Enter — Again   Esc — Menu   Q — Quit ",
        fg,
    )));
    let rect = popup;
    for y in rect.top()..rect.bottom() {
        for x in rect.left()..rect.right() {
            if let Some(c) = frame.buffer_mut().cell_mut(Position::new(x, y)) {
                c.reset();
                c.set_bg(theme.bg);
            }
        }
    }
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .title(Span::styled(" Neon Blocks ", theme.title)),
    );
    p.render(popup, frame.buffer_mut());
}

pub fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption) {
    let area = frame.area();
    let quit_rect = centered(area, 24, 8);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title))
        .title(" Paused ");

    for y in quit_rect.top()..quit_rect.bottom() {
        for x in quit_rect.left()..quit_rect.right() {
            if let Some(c) = frame.buffer_mut().cell_mut(Position::new(x, y)) {
                c.reset();
                c.set_bg(theme.bg);
            }
        }
    }

    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    let options = [
        (QuitOption::Resume, " Resume "),
        (QuitOption::MainMenu, " Main Menu "),
        (QuitOption::Exit, " Exit "),
    ];

    for (i, (opt, label)) in options.iter().enumerate() {
        let style = if *opt == selected {
            bold(Style::default().fg(theme.bg).bg(theme.title))
        } else {
            Style::default().fg(theme.title)
        };
        let rx = inner.x + (inner.width.saturating_sub(label.len() as u16)) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        put(frame.buffer_mut(), rx, ry, label, style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameMode;
    use crate::board::BlockColor;
    use crate::input::DragController;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn session() -> GameSession {
        GameSession::new(GameMode::Time, 0, &mut StdRng::seed_from_u64(3))
    }

    #[test]
    fn test_layout_metrics_match_grid() {
        let l = board_layout(Rect::new(0, 0, 120, 30));
        assert_eq!(l.board.width, BOARD_W);
        assert_eq!(l.metrics.origin_x, l.grid.x as f32);
        assert_eq!(l.metrics.cell_w, 4.0);
        assert_eq!(l.grid.width, BOARD_SIZE as u16 * CELL_W);
        for slot in l.tray_metrics.slots {
            assert!(l.tray.contains(Position::new(slot.x, slot.y)));
            assert_eq!(slot.height, SLOT_H);
        }
        let (x, y) = l.metrics.cell_center(8, 8);
        assert!(x < l.grid.right() as f32 && y < l.grid.bottom() as f32);
    }

    #[test]
    fn test_tray_slots_hit_test() {
        let l = board_layout(Rect::new(0, 0, 120, 30));
        let s = l.tray_metrics.slots[1];
        assert_eq!(l.tray_metrics.slot_at(s.x + 2, s.y + 2), Some(1));
        assert_eq!(l.tray_metrics.slot_at(l.grid.x, l.grid.y), None);
    }

    fn render(screen: Screen, session: &GameSession, drag: &DragController) -> Buffer {
        let backend = TestBackend::new(100, 26);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::default();
        let menu = MenuState::default();
        let layout = board_layout(Rect::new(0, 0, 100, 26));
        let ghost = drag.ghost(&layout.metrics, session);
        let mut fx = VisualFx::new(true);
        terminal
            .draw(|f| {
                let view = View {
                    screen,
                    session,
                    drag: drag.active(),
                    ghost: ghost.as_ref(),
                    menu: &menu,
                    quit_selected: QuitOption::Resume,
                    has_save: true,
                    theme: &theme,
                    layout,
                    now: Instant::now(),
                };
                draw(f, &view, &mut fx);
            })
            .unwrap();
        terminal.backend().buffer().clone()
    }

    fn text_of(buf: &Buffer) -> String {
        let mut s = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                s.push_str(buf[(x, y)].symbol());
            }
            s.push('\n');
        }
        s
    }

    #[test]
    fn test_sidebar_shows_stats_and_timer() {
        let s = session();
        let text = text_of(&render(Screen::Playing, &s, &DragController::new()));
        assert!(text.contains("Score: 0"));
        assert!(text.contains("Time: 02:00"));
        assert!(text.contains("Mode:  Time"));
    }

    #[test]
    fn test_filled_cell_uses_block_colour() {
        let mut s = session();
        s.board.set(0, 0, Some(Cell::plain(BlockColor::Red)));
        let buf = render(Screen::Playing, &s, &DragController::new());
        let l = board_layout(Rect::new(0, 0, 100, 26));
        assert_eq!(
            buf[(l.grid.x, l.grid.y)].bg,
            Theme::default().block_color(BlockColor::Red)
        );
    }

    #[test]
    fn test_ghost_drawn_where_piece_would_land() {
        let s = session();
        let mut drag = DragController::new();
        let l = board_layout(Rect::new(0, 0, 100, 26));
        assert!(drag.pick(&s, &l.metrics, 0));
        let ghost = drag.ghost(&l.metrics, &s).unwrap();
        let buf = render(Screen::Playing, &s, &drag);
        let (x, y) = cell_origin(l.grid, ghost.pos.row as usize, ghost.pos.col as usize);
        let first = s.hand[0].as_ref().unwrap().shape.offsets().next().unwrap();
        let gx = x + first.1 as u16 * CELL_W;
        let gy = y + first.0 as u16 * CELL_H;
        let expected = if ghost.valid { "▒" } else { "╳" };
        assert_eq!(buf[(gx, gy)].symbol(), expected);
    }

    #[test]
    fn test_menu_lists_resume_and_modes() {
        let s = session();
        let text = text_of(&render(Screen::Menu, &s, &DragController::new()));
        assert!(text.contains("Resume saved game"));
        for mode in GameMode::ALL {
            assert!(text.contains(mode.label()));
        }
    }

    #[test]
    fn test_game_over_popup() {
        let mut s = session();
        s.score.award(40);
        s.status = crate::game::Status::Over(GameOverReason::TimeUp);
        let text = text_of(&render(Screen::GameOver, &s, &DragController::new()));
        assert!(text.contains("Time's up!"));
        assert!(text.contains("Score: 40"));
        assert!(text.contains("New record!"));
    }
}
