use crate::help::Help;
use crate::model::{CalendarModel, Step};
use crate::store::{Storage, StorageError};
use crate::theme::Theme;
use crate::today::TodayInfo;
use crate::weather::{Location, WeatherLookup, WeatherSource};
use crate::widget::{DayPanel, MonthView, Prompt, TodayPanel, MONTH_HEIGHT, MONTH_WIDTH};
use crossterm::event::{poll, read, KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    text::Line,
    widgets::{Paragraph, Widget},
    Terminal,
};
use std::io::{self, Write};
use std::time::{Duration, Instant};
use time::{OffsetDateTime, UtcOffset};
use tracing::error;

/// How often to wake up while the today panel is showing
const TICK: Duration = Duration::from_millis(250);

/// Columns between the month and the day panel
const GUTTER: u16 = 2;

#[derive(Debug)]
pub(crate) struct App<S, W> {
    model: CalendarModel<S>,
    theme: Theme,
    state: AppState,
    offset: UtcOffset,
    weather_source: W,
    location: Option<Location>,
    today_info: Option<TodayInfo>,
    status: Option<String>,
}

impl<S, W> App<S, W>
where
    S: Storage,
    W: WeatherSource + Clone + Send + 'static,
{
    /// `offset` is the local UTC offset, determined before any threads were
    /// started
    pub(crate) fn new(
        model: CalendarModel<S>,
        offset: UtcOffset,
        weather_source: W,
        location: Option<Location>,
    ) -> App<S, W> {
        let theme = Theme::load(model.store().storage());
        App {
            model,
            theme,
            state: AppState::Calendar,
            offset,
            weather_source,
            location,
            today_info: None,
            status: None,
        }
    }

    pub(crate) fn run<B: Backend>(mut self, mut terminal: Terminal<B>) -> io::Result<()> {
        while !self.quitting() {
            self.tick(Instant::now());
            self.draw(&mut terminal)?;
            self.handle_input()?;
        }
        Ok(())
    }

    fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        terminal.draw(|frame| frame.render_widget(self, frame.area()))?;
        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        // Keep redrawing while the today panel counts down or waits on the
        // weather
        let timeout = self.today_info.as_ref().map(|info| {
            if info.weather_pending() {
                TICK
            } else {
                info.remaining(Instant::now())
            }
        });
        if let Some(timeout) = timeout {
            if !poll(timeout)? {
                return Ok(());
            }
        }
        let normal_modifiers = KeyModifiers::NONE | KeyModifiers::SHIFT;
        if let Some(KeyEvent {
            code, modifiers, ..
        }) = read()?.as_key_press_event()
        {
            if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
                self.state = AppState::Quitting;
            } else if !normal_modifiers.contains(modifiers) || !self.handle_key(code) {
                self.beep()?;
            }
        }
        // else: Redraw on resize, and we might as well redraw on other stuff
        // too
        Ok(())
    }

    // Returns `false` if the user pressed an invalid key
    fn handle_key(&mut self, key: KeyCode) -> bool {
        match &mut self.state {
            AppState::Calendar => {
                self.status = None;
                self.handle_calendar_key(key)
            }
            AppState::Helping => {
                self.state = AppState::Calendar;
                true
            }
            AppState::Adding(_) | AppState::Deleting(_) if key == KeyCode::Esc => {
                self.state = AppState::Calendar;
                true
            }
            AppState::Adding(input) => {
                if key != KeyCode::Enter {
                    return edit_input(input, key, |_| true);
                }
                let text = std::mem::take(input);
                match self.model.add_event_to_selected(&text) {
                    Ok(true) => {
                        self.state = AppState::Calendar;
                        true
                    }
                    Ok(false) => {
                        // Nothing but whitespace
                        if let AppState::Adding(input) = &mut self.state {
                            *input = text;
                        }
                        false
                    }
                    Err(e) => {
                        self.state = AppState::Calendar;
                        self.report(&e);
                        false
                    }
                }
            }
            AppState::Deleting(input) => {
                if key != KeyCode::Enter {
                    return edit_input(input, key, |c| c.is_ascii_digit());
                }
                let Some(index) = input.parse::<usize>().ok().and_then(|n| n.checked_sub(1))
                else {
                    return false;
                };
                if self.delete_event(index) {
                    self.state = AppState::Calendar;
                    true
                } else {
                    false
                }
            }
            AppState::Quitting => false,
        }
    }

    fn handle_calendar_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('n' | '>') | KeyCode::PageDown => {
                self.model.navigate(Step::Forward).is_ok()
            }
            KeyCode::Char('p' | '<') | KeyCode::PageUp => {
                self.model.navigate(Step::Backward).is_ok()
            }
            KeyCode::Char('t') | KeyCode::Home => {
                self.model.jump_to_today();
                self.show_today(Instant::now());
                true
            }
            KeyCode::Char('h') | KeyCode::Left => self.model.move_selection(-1).is_ok(),
            KeyCode::Char('l') | KeyCode::Right => self.model.move_selection(1).is_ok(),
            KeyCode::Char('k') | KeyCode::Up => self.model.move_selection(-7).is_ok(),
            KeyCode::Char('j') | KeyCode::Down => self.model.move_selection(7).is_ok(),
            KeyCode::Char('a') | KeyCode::Enter => {
                if self.model.selected().is_some() {
                    self.state = AppState::Adding(String::new());
                    true
                } else {
                    false
                }
            }
            KeyCode::Char(c @ '1'..='9') => c
                .to_digit(10)
                .and_then(|d| usize::try_from(d - 1).ok())
                .is_some_and(|index| self.delete_event(index)),
            KeyCode::Char('d') => {
                if self.model.selected_events().is_empty() {
                    false
                } else {
                    self.state = AppState::Deleting(String::new());
                    true
                }
            }
            KeyCode::Esc => {
                if self.model.selected().is_some() {
                    self.model.clear_selection();
                } else {
                    self.state = AppState::Quitting;
                }
                true
            }
            KeyCode::Char('D') => {
                let theme = self.theme.toggled();
                match theme.save(self.model.store_mut().storage_mut()) {
                    Ok(()) => {
                        self.theme = theme;
                        true
                    }
                    Err(e) => {
                        self.report(&e);
                        false
                    }
                }
            }
            KeyCode::Char('?') => {
                self.state = AppState::Helping;
                true
            }
            KeyCode::Char('q') => {
                self.state = AppState::Quitting;
                true
            }
            _ => false,
        }
    }

    /// Deletes the selected day's event at `index`.  Returns `false` if there
    /// is no such event or it could not be saved.
    fn delete_event(&mut self, index: usize) -> bool {
        if index >= self.model.selected_events().len() {
            return false;
        }
        match self.model.remove_event_from_selected(index) {
            Ok(()) => true,
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    fn show_today(&mut self, at: Instant) {
        let now = OffsetDateTime::now_utc().to_offset(self.offset);
        let weather = WeatherLookup::start(self.weather_source.clone(), self.location);
        self.today_info = Some(TodayInfo::new(now, weather, at));
    }

    fn tick(&mut self, now: Instant) {
        if self.today_info.as_ref().is_some_and(|info| info.expired(now)) {
            self.today_info = None;
        }
    }

    fn report(&mut self, e: &StorageError) {
        error!(error = %e, "failed to save");
        let mut msg = e.to_string();
        if let Some(source) = std::error::Error::source(e) {
            msg = format!("{msg}: {source}");
        }
        self.status = Some(msg);
    }

    fn beep(&self) -> io::Result<()> {
        io::stdout().write_all(b"\x07")
    }

    fn quitting(&self) -> bool {
        self.state == AppState::Quitting
    }
}

impl<S, W> Widget for &mut App<S, W>
where
    S: Storage,
    W: WeatherSource + Clone + Send + 'static,
{
    fn render(self, area: Rect, buf: &mut Buffer) {
        let palette = self.theme.palette();
        buf.set_style(area, palette.base);
        let [main, status] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);
        let [month, _, panel] = Layout::horizontal([
            Constraint::Length(MONTH_WIDTH),
            Constraint::Length(GUTTER),
            Constraint::Min(0),
        ])
        .areas(main);
        let month = Rect {
            height: month.height.min(MONTH_HEIGHT),
            ..month
        };
        match self.model.grid() {
            Ok(grid) => MonthView {
                grid: &grid,
                palette,
            }
            .render(month, buf),
            Err(e) => Paragraph::new(Line::styled(e.to_string(), palette.status)).render(month, buf),
        }
        let events = self.model.selected_events();
        DayPanel {
            selected: self.model.selected(),
            events: &events,
            prompt: match &self.state {
                AppState::Adding(text) => Some(Prompt {
                    label: "New event",
                    text,
                }),
                AppState::Deleting(text) => Some(Prompt {
                    label: "Delete event number",
                    text,
                }),
                _ => None,
            },
            palette,
        }
        .render(panel, buf);
        let status_line = match &self.status {
            Some(msg) => Line::styled(msg.as_str(), palette.status),
            None => Line::styled("Press ? for help", palette.muted),
        };
        Paragraph::new(status_line).render(status, buf);
        if let Some(info) = self.today_info.as_mut() {
            let weather = info.weather().text().to_owned();
            TodayPanel {
                local_time: &info.local_time,
                from_india: &info.from_india,
                weather: &weather,
                palette,
            }
            .render(TodayPanel::area(area), buf);
        }
        if self.state == AppState::Helping {
            Help(palette.base).render(area, buf);
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum AppState {
    Calendar,
    Helping,
    Adding(String),
    /// Typing the number of an event to delete
    Deleting(String),
    Quitting,
}

/// Applies an editing key to a line of input, accepting only characters
/// that pass `accept`
fn edit_input(input: &mut String, key: KeyCode, accept: fn(char) -> bool) -> bool {
    match key {
        KeyCode::Backspace => input.pop().is_some(),
        KeyCode::Char(c) if accept(c) => {
            input.push(c);
            true
        }
        _ => false,
    }
}
