use crate::datemath::{build_month_grid, format_date_key, DateKey, MonthGrid, OutOfTimeError};
use crate::store::{EventStore, Storage, StorageError};
use time::{Date, Month};
use tracing::debug;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Step {
    Backward,
    Forward,
}

/// The month being viewed, the selected day, and the events behind them
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct CalendarModel<S> {
    today: Date,
    view_year: i32,
    view_month: Month,
    selected: Option<DateKey>,
    store: EventStore<S>,
}

impl<S: Storage> CalendarModel<S> {
    pub(crate) fn new(today: Date, store: EventStore<S>) -> Self {
        CalendarModel {
            today,
            view_year: today.year(),
            view_month: today.month(),
            selected: None,
            store,
        }
    }

    pub(crate) fn view(&self) -> (i32, Month) {
        (self.view_year, self.view_month)
    }

    pub(crate) fn selected(&self) -> Option<DateKey> {
        self.selected
    }

    pub(crate) fn store(&self) -> &EventStore<S> {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut EventStore<S> {
        &mut self.store
    }

    /// Moves the view one month, refusing to leave the representable range
    pub(crate) fn navigate(&mut self, step: Step) -> Result<(), OutOfTimeError> {
        let (year, month) = match (step, self.view_month) {
            (Step::Forward, Month::December) => (self.view_year + 1, Month::January),
            (Step::Forward, m) => (self.view_year, m.next()),
            (Step::Backward, Month::January) => (self.view_year - 1, Month::December),
            (Step::Backward, m) => (self.view_year, m.previous()),
        };
        Date::from_calendar_date(year, month, 1).map_err(|_| OutOfTimeError)?;
        self.view_year = year;
        self.view_month = month;
        debug!(year, %month, "navigated");
        Ok(())
    }

    pub(crate) fn jump_to_today(&mut self) {
        self.view_year = self.today.year();
        self.view_month = self.today.month();
    }

    /// Selects `date`, first moving the view to its month if needed
    pub(crate) fn select_day(&mut self, date: DateKey) {
        if (date.year(), date.month()) != (self.view_year, self.view_month) {
            self.view_year = date.year();
            self.view_month = date.month();
        }
        self.selected = Some(date);
    }

    pub(crate) fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Selects the day `days` away from the current selection.  Without a
    /// selection, selects today if it is in view and the 1st of the viewed
    /// month otherwise.
    pub(crate) fn move_selection(&mut self, days: i32) -> Result<(), OutOfTimeError> {
        let target = match self.selected {
            Some(key) => key.offset(days).ok_or(OutOfTimeError)?,
            None if (self.today.year(), self.today.month()) == self.view() => {
                DateKey::from(self.today)
            }
            None => format_date_key(self.view_year, self.view_month, 1)
                .map_err(|_| OutOfTimeError)?,
        };
        self.select_day(target);
        Ok(())
    }

    pub(crate) fn grid(&self) -> Result<MonthGrid, OutOfTimeError> {
        build_month_grid(
            self.view_year,
            self.view_month,
            self.today,
            self.selected,
            |key| self.store.has_events(key),
        )
    }

    pub(crate) fn selected_events(&self) -> Vec<String> {
        self.selected
            .map(|key| self.store.get_events(key))
            .unwrap_or_default()
    }

    /// Returns `false` without storing anything if no day is selected or the
    /// trimmed text is empty
    pub(crate) fn add_event_to_selected(&mut self, text: &str) -> Result<bool, StorageError> {
        let text = text.trim();
        let Some(date) = self.selected else {
            return Ok(false);
        };
        if text.is_empty() {
            return Ok(false);
        }
        self.store.add_event(date, text)?;
        Ok(true)
    }

    pub(crate) fn remove_event_from_selected(&mut self, index: usize) -> Result<(), StorageError> {
        match self.selected {
            Some(date) => self.store.remove_event(date, index),
            None => Ok(()),
        }
    }
}
