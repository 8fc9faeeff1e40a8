//! App: terminal init, main loop, countdown, key and mouse handling.

use crate::fx::VisualFx;
use crate::game::{Game, GameEvent, SoundCue};
use crate::input::{Action, DragController, Release, key_to_action};
use crate::sound::{Sound, TerminalBell};
use crate::storage::Store;
use crate::theme::Theme;
use crate::ui::{self, BoardLayout, View};
use crate::{Args, GameMode};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use rand::rngs::StdRng;
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
    GameOver,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    MainMenu,
    Exit,
}

impl QuitOption {
    fn next(self) -> Self {
        match self {
            Self::Resume => Self::MainMenu,
            Self::MainMenu => Self::Exit,
            Self::Exit => Self::Resume,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Resume => Self::Exit,
            Self::MainMenu => Self::Resume,
            Self::Exit => Self::MainMenu,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEntry {
    Resume,
    Mode(GameMode),
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuState {
    pub selected: usize,
    pub animation_start: Instant,
}

impl Default for MenuState {
    fn default() -> Self {
        Self {
            selected: 0,
            animation_start: Instant::now(),
        }
    }
}

impl MenuState {
    /// Resume (only with a save), the four modes, then exit.
    pub fn entries(&self, has_save: bool) -> Vec<MenuEntry> {
        let mut out = Vec::with_capacity(6);
        if has_save {
            out.push(MenuEntry::Resume);
        }
        out.extend(GameMode::ALL.map(MenuEntry::Mode));
        out.push(MenuEntry::Exit);
        out
    }

    fn step(&mut self, has_save: bool, forward: bool) {
        let n = self.entries(has_save).len();
        self.selected = if forward {
            (self.selected + 1) % n
        } else {
            (self.selected + n - 1) % n
        };
    }

    fn current(&self, has_save: bool) -> MenuEntry {
        let entries = self.entries(has_save);
        entries[self.selected.min(entries.len() - 1)]
    }
}

/// One-second repeating timer. At most one is ever running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Countdown {
    next: Option<Instant>,
}

impl Countdown {
    const PERIOD: Duration = Duration::from_secs(1);

    /// (Re)start; replaces whatever was running.
    pub fn start(&mut self, now: Instant) {
        self.next = Some(now + Self::PERIOD);
    }

    pub fn stop(&mut self) {
        self.next = None;
    }

    /// Whole seconds elapsed since the last call.
    pub fn due(&mut self, now: Instant) -> u32 {
        let Some(mut next) = self.next else {
            return 0;
        };
        let mut ticks = 0;
        while now >= next {
            ticks += 1;
            next += Self::PERIOD;
        }
        self.next = Some(next);
        ticks
    }
}

pub struct App {
    args: Args,
    theme: Theme,
    game: Game,
    drag: DragController,
    fx: VisualFx,
    sound: Box<dyn Sound>,
    screen: Screen,
    menu_state: MenuState,
    quit_selected: QuitOption,
    countdown: Countdown,
    has_save: bool,
    layout: BoardLayout,
    last_frame: Instant,
}

impl App {
    pub fn new(args: Args, theme: Theme, store: Box<dyn Store>, rng: StdRng) -> Result<Self> {
        let game = Game::new(store, rng);
        let has_save = game.has_saved_session();
        let now = Instant::now();
        let mut app = Self {
            fx: VisualFx::new(!args.no_animation),
            sound: Box::new(TerminalBell::stdout(!args.mute)),
            theme,
            game,
            drag: DragController::new(),
            screen: Screen::Menu,
            menu_state: MenuState::default(),
            quit_selected: QuitOption::Resume,
            countdown: Countdown::default(),
            has_save,
            layout: ui::board_layout(Rect::new(0, 0, 80, 24)),
            last_frame: now,
            args,
        };
        if app.args.resume && app.resume_game(now) {
            return Ok(app);
        }
        if app.args.no_menu {
            app.start_game(app.args.mode, now);
        }
        Ok(app)
    }

    fn start_game(&mut self, mode: GameMode, now: Instant) {
        self.game.start(mode);
        self.begin_play(now);
    }

    fn resume_game(&mut self, now: Instant) -> bool {
        if !self.game.resume() {
            self.has_save = false;
            return false;
        }
        self.begin_play(now);
        if self.game.session.is_over() {
            self.end_play();
        }
        true
    }

    fn begin_play(&mut self, now: Instant) {
        self.fx.clear();
        self.drag.cancel();
        self.screen = Screen::Playing;
        if self.game.session.mode.has_timer() {
            self.countdown.start(now);
        } else {
            self.countdown.stop();
        }
    }

    fn end_play(&mut self) {
        self.countdown.stop();
        self.drag.cancel();
        self.screen = Screen::GameOver;
    }

    fn open_main_menu(&mut self) {
        self.countdown.stop();
        self.drag.cancel();
        self.has_save = self.game.has_saved_session();
        self.menu_state = MenuState::default();
        self.screen = Screen::Menu;
    }

    fn open_quit_menu(&mut self) {
        self.countdown.stop();
        self.drag.cancel();
        self.quit_selected = QuitOption::Resume;
        self.screen = Screen::QuitMenu;
    }

    fn close_quit_menu(&mut self, now: Instant) {
        self.screen = Screen::Playing;
        if self.game.session.mode.has_timer() {
            self.countdown.start(now);
        }
    }

    /// Route queued game cues to sound and effects; notice game over.
    fn dispatch_events(&mut self) {
        for event in self.game.drain_events() {
            match event {
                GameEvent::Sound(cue) => self.sound.play(cue),
                GameEvent::Fx(cue) => self.fx.push(cue),
            }
        }
        if self.screen == Screen::Playing && self.game.session.is_over() {
            self.end_play();
        }
    }

    /// Returns false when the app should exit.
    fn handle_action(&mut self, action: Action, now: Instant) -> bool {
        match self.screen {
            Screen::Menu => match action {
                Action::Up | Action::Left => self.menu_state.step(self.has_save, false),
                Action::Down | Action::Right => self.menu_state.step(self.has_save, true),
                Action::Select => match self.menu_state.current(self.has_save) {
                    MenuEntry::Resume => {
                        if !self.resume_game(now) {
                            self.menu_state.selected = 0;
                        }
                    }
                    MenuEntry::Mode(mode) => self.start_game(mode, now),
                    MenuEntry::Exit => return false,
                },
                Action::Menu | Action::Back => return false,
                _ => {}
            },
            Screen::Playing => {
                if self.drag.is_dragging() {
                    let metrics = self.layout.metrics;
                    match action {
                        Action::Up => self.drag.nudge(&metrics, -1, 0),
                        Action::Down => self.drag.nudge(&metrics, 1, 0),
                        Action::Left => self.drag.nudge(&metrics, 0, -1),
                        Action::Right => self.drag.nudge(&metrics, 0, 1),
                        Action::Select => self.release(),
                        Action::Back => {
                            self.drag.cancel();
                        }
                        Action::Menu => self.open_quit_menu(),
                        _ => {}
                    }
                } else {
                    match action {
                        Action::Pick(slot) => {
                            if self.drag.pick(&self.game.session, &self.layout.metrics, slot) {
                                self.sound.play(SoundCue::Pickup);
                            }
                        }
                        Action::Rotate => self.game.rotate_hand(),
                        Action::Menu | Action::Back => self.open_quit_menu(),
                        _ => {}
                    }
                }
            }
            Screen::QuitMenu => match action {
                Action::Down | Action::Right => self.quit_selected = self.quit_selected.next(),
                Action::Up | Action::Left => self.quit_selected = self.quit_selected.prev(),
                Action::Select => match self.quit_selected {
                    QuitOption::Resume => self.close_quit_menu(now),
                    QuitOption::MainMenu => self.open_main_menu(),
                    QuitOption::Exit => return false,
                },
                Action::Menu | Action::Back => self.close_quit_menu(now),
                _ => {}
            },
            Screen::GameOver => match action {
                Action::Select => self.start_game(self.game.session.mode, now),
                Action::Back => self.open_main_menu(),
                Action::Menu => return false,
                _ => {}
            },
        }
        self.dispatch_events();
        true
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.screen != Screen::Playing {
            return;
        }
        let (column, row) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.drag.press(&self.game.session, &self.layout.tray_metrics, column, row) {
                    self.sound.play(SoundCue::Pickup);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
                self.drag.motion(column, row);
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.drag.motion(column, row);
                self.release();
            }
            MouseEventKind::Down(MouseButton::Right) => {
                self.drag.cancel();
            }
            _ => {}
        }
        self.dispatch_events();
    }

    fn release(&mut self) {
        match self.drag.release(&self.layout.metrics, &mut self.game) {
            Release::Placed(report) => {
                if report.refilled {
                    tracing::debug!("tray refilled");
                }
            }
            Release::Returned | Release::Idle => {}
        }
    }

    fn tick(&mut self, now: Instant) {
        let delta_ms = now
            .saturating_duration_since(self.last_frame)
            .as_millis()
            .min(u32::MAX as u128) as u32;
        self.last_frame = now;
        self.fx.tick(delta_ms);
        if self.screen == Screen::Playing {
            for _ in 0..self.countdown.due(now) {
                if self.game.tick_second().is_some() {
                    break;
                }
            }
        }
        self.dispatch_events();
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = execute!(std::io::stdout(), DisableMouseCapture);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.args.frame_rate.max(1.0));
        loop {
            let now = Instant::now();
            let size = terminal.size()?;
            self.layout = ui::board_layout(Rect::new(0, 0, size.width, size.height));
            self.tick(now);

            let ghost = if self.screen == Screen::Playing {
                self.drag.ghost(&self.layout.metrics, &self.game.session)
            } else {
                None
            };
            let view = View {
                screen: self.screen,
                session: &self.game.session,
                drag: self.drag.active(),
                ghost: ghost.as_ref(),
                menu: &self.menu_state,
                quit_selected: self.quit_selected,
                has_save: self.has_save,
                theme: &self.theme,
                layout: self.layout,
                now,
            };
            let fx = &mut self.fx;
            terminal.draw(|f| ui::draw(f, &view, fx))?;

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let keep_running = match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            self.handle_action(key_to_action(key), Instant::now())
                        }
                        Event::Mouse(mouse) => {
                            self.handle_mouse(mouse);
                            true
                        }
                        _ => true,
                    };
                    if !keep_running {
                        return Ok(());
                    }
                }
            }
        }
    }
}
