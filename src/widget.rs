use crate::datemath::{DateKey, GridCell, MonthGrid, WEEKDAYS};
use crate::theme::Palette;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Clear, Paragraph, Widget, Wrap},
};

/// Number of columns per day of week
pub(crate) const DAY_WIDTH: u16 = 4;

/// Width of the month view: the week-number column plus seven days
pub(crate) const MONTH_WIDTH: u16 = DAY_WIDTH * 8;

/// Title, weekday header, and six weeks
pub(crate) const MONTH_HEIGHT: u16 = 8;

const TODAY_WIDTH: u16 = 34;
const TODAY_HEIGHT: u16 = 5;

/// The month grid with a week-number column down the left
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct MonthView<'a> {
    pub(crate) grid: &'a MonthGrid,
    pub(crate) palette: &'a Palette,
}

impl MonthView<'_> {
    fn header(&self) -> Line<'static> {
        let mut spans = vec![Span::styled(" Wk ", self.palette.week_number)];
        for wd in WEEKDAYS {
            let name = wd.to_string();
            let abbrev = name.get(..2).unwrap_or(&name);
            spans.push(Span::styled(
                format!(" {abbrev} "),
                self.palette.weekday_header,
            ));
        }
        Line::from(spans)
    }

    fn cell_style(&self, cell: &GridCell) -> Style {
        let p = self.palette;
        let mut style = if !cell.is_current_month {
            p.other_month
        } else if cell.is_weekend() {
            p.weekend
        } else {
            p.base
        };
        if cell.is_today {
            style = style.patch(p.today);
        }
        if cell.has_events {
            style = style.patch(p.has_events);
        }
        if cell.is_selected {
            style = style.patch(p.selected);
        }
        style
    }

    fn show(&self, cell: &GridCell) -> Span<'static> {
        let s = if cell.is_today {
            format!("[{:2}]", cell.day())
        } else {
            format!(" {:2} ", cell.day())
        };
        Span::styled(s, self.cell_style(cell))
    }
}

impl Widget for MonthView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut lines = Vec::with_capacity(usize::from(MONTH_HEIGHT));
        lines.push(Line::styled(self.grid.title(), self.palette.title).centered());
        lines.push(self.header());
        for row in &self.grid.rows {
            let mut spans = Vec::with_capacity(row.days.len() + 1);
            spans.push(Span::styled(
                format!("{:>3} ", row.week_number),
                self.palette.week_number,
            ));
            spans.extend(row.days.iter().map(|cell| self.show(cell)));
            lines.push(Line::from(spans));
        }
        let area = Rect {
            width: area.width.min(MONTH_WIDTH),
            ..area
        };
        Paragraph::new(Text::from(lines))
            .style(self.palette.base)
            .render(area, buf);
    }
}

/// Events of the selected day, plus the entry line while adding one
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct DayPanel<'a> {
    pub(crate) selected: Option<DateKey>,
    pub(crate) events: &'a [String],
    pub(crate) prompt: Option<Prompt<'a>>,
    pub(crate) palette: &'a Palette,
}

/// A line of typed input shown under the events
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Prompt<'a> {
    pub(crate) label: &'static str,
    pub(crate) text: &'a str,
}

impl Widget for DayPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let p = self.palette;
        let Some(date) = self.selected else {
            Paragraph::new(Line::styled("Select a day with the arrow keys", p.muted))
                .style(p.base)
                .wrap(Wrap { trim: true })
                .render(area, buf);
            return;
        };
        let block = Block::bordered()
            .title(format!(" {} ", date.long_form()))
            .style(p.base);
        let mut lines = Vec::with_capacity(self.events.len() + 2);
        if self.events.is_empty() {
            lines.push(Line::styled("No events", p.muted));
        } else {
            for (i, text) in std::iter::zip(1.., self.events) {
                lines.push(Line::from(vec![
                    Span::styled(format!("{i}. "), p.muted),
                    Span::raw(text.clone()),
                ]));
            }
        }
        if let Some(Prompt { label, text }) = self.prompt {
            lines.push(Line::raw(""));
            lines.push(Line::from(vec![
                Span::styled(format!("{label}: "), p.title),
                Span::raw(format!("{text}_")),
            ]));
        }
        Paragraph::new(Text::from(lines))
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

/// Popup with the local time, offset from India, and weather
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct TodayPanel<'a> {
    pub(crate) local_time: &'a str,
    pub(crate) from_india: &'a str,
    pub(crate) weather: &'a str,
    pub(crate) palette: &'a Palette,
}

impl TodayPanel<'_> {
    /// Area in the top right corner of `area`
    pub(crate) fn area(area: Rect) -> Rect {
        let width = TODAY_WIDTH.min(area.width);
        let height = TODAY_HEIGHT.min(area.height);
        Rect {
            x: area.x + area.width - width,
            y: area.y,
            width,
            height,
        }
    }
}

impl Widget for TodayPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let p = self.palette;
        let row = |label: &'static str, value: &str| {
            Line::from(vec![
                Span::styled(format!("{label:<12}"), p.title),
                Span::raw(value.to_owned()),
            ])
        };
        let text = Text::from(vec![
            row("Local time", self.local_time),
            row("From India", self.from_india),
            row("Weather", self.weather),
        ]);
        Clear.render(area, buf);
        Paragraph::new(text)
            .block(
                Block::bordered()
                    .title(" Today ")
                    .title_alignment(Alignment::Center),
            )
            .style(p.base)
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datemath::build_month_grid;
    use crate::theme::Theme;
    use ratatui::buffer::Cell;
    use time::{macros::date, Month};

    fn lines(buf: &Buffer) -> Vec<String> {
        buf.content
            .chunks(usize::from(buf.area.width))
            .map(|row| row.iter().map(Cell::symbol).collect())
            .collect()
    }

    #[test]
    fn test_month_view() {
        let busy = DateKey::from(date!(2026 - 10 - 02));
        let grid = build_month_grid(
            2026,
            Month::October,
            date!(2026 - 10 - 19),
            None,
            |k| k == busy,
        )
        .unwrap();
        let area = Rect::new(0, 0, MONTH_WIDTH, MONTH_HEIGHT);
        let mut buffer = Buffer::empty(area);
        MonthView {
            grid: &grid,
            palette: Theme::Light.palette(),
        }
        .render(area, &mut buffer);
        assert_eq!(
            lines(&buffer),
            [
                "          October 2026          ",
                " Wk  Su  Mo  Tu  We  Th  Fr  Sa ",
                " 40  27  28  29  30   1   2   3 ",
                " 41   4   5   6   7   8   9  10 ",
                " 42  11  12  13  14  15  16  17 ",
                " 43  18 [19] 20  21  22  23  24 ",
                " 44  25  26  27  28  29  30  31 ",
                " 45   1   2   3   4   5   6   7 ",
            ]
        );
        let palette = Theme::Light.palette();
        // 2 October is a Friday with events
        assert_eq!(
            buffer.content[usize::from(2 * MONTH_WIDTH + 6 * DAY_WIDTH)].style(),
            palette.base.patch(palette.has_events)
        );
        // 27 September is outside the month
        assert_eq!(
            buffer.content[usize::from(2 * MONTH_WIDTH + DAY_WIDTH)].style(),
            palette.other_month
        );
    }

    #[test]
    fn test_day_panel_without_selection() {
        let area = Rect::new(0, 0, 40, 4);
        let mut buffer = Buffer::empty(area);
        DayPanel {
            selected: None,
            events: &[],
            prompt: None,
            palette: Theme::Dark.palette(),
        }
        .render(area, &mut buffer);
        assert_eq!(lines(&buffer)[0].trim_end(), "Select a day with the arrow keys");
    }

    #[test]
    fn test_day_panel_lists_events() {
        let area = Rect::new(0, 0, 40, 7);
        let mut buffer = Buffer::empty(area);
        let events = [String::from("Dentist"), String::from("Call mum")];
        DayPanel {
            selected: Some(DateKey::from(date!(2026 - 10 - 19))),
            events: &events,
            prompt: Some(Prompt {
                label: "New event",
                text: "Lun",
            }),
            palette: Theme::Light.palette(),
        }
        .render(area, &mut buffer);
        let lines = lines(&buffer);
        assert!(lines[0].contains(" Monday, October 19, 2026 "), "{lines:?}");
        assert_eq!(lines[1], "│1. Dentist                            │");
        assert_eq!(lines[2], "│2. Call mum                           │");
        assert_eq!(lines[4], "│New event: Lun_                       │");
    }

    #[test]
    fn test_day_panel_no_events() {
        let area = Rect::new(0, 0, 40, 4);
        let mut buffer = Buffer::empty(area);
        DayPanel {
            selected: Some(DateKey::from(date!(2026 - 10 - 19))),
            events: &[],
            prompt: None,
            palette: Theme::Light.palette(),
        }
        .render(area, &mut buffer);
        assert_eq!(lines(&buffer)[1], "│No events                             │");
    }

    #[test]
    fn test_today_panel() {
        let area = Rect::new(0, 0, 60, 10);
        let mut buffer = Buffer::empty(area);
        let panel_area = TodayPanel::area(area);
        assert_eq!(panel_area, Rect::new(26, 0, 34, 5));
        TodayPanel {
            local_time: "09:05",
            from_india: "+5.5h",
            weather: "Loading...",
            palette: Theme::Light.palette(),
        }
        .render(panel_area, &mut buffer);
        let lines = lines(&buffer);
        assert!(lines[0].contains(" Today "), "{lines:?}");
        assert!(lines[1].ends_with("│Local time  09:05               │"));
        assert!(lines[2].ends_with("│From India  +5.5h               │"));
        assert!(lines[3].ends_with("│Weather     Loading...          │"));
    }
}
