use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Flex, Layout, Rect},
    style::Style,
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Widget},
};

static TEXT: &[&str] = &[
    "n, >, PAGE DOWN   Next month\n",
    "p, <, PAGE UP     Previous month\n",
    "t, HOME           Jump to today\n",
    "ARROWS, hjkl      Move the selected day\n",
    "a, ENTER          Add an event to the selected day\n",
    "1-9               Delete that event\n",
    "d                 Delete an event by number\n",
    "ESC               Clear the selection, or quit if none\n",
    "D                 Toggle dark theme\n",
    "?                 Show this help\n",
    "q, CTRL-C         Quit\n",
    "\n",
    "Press the Any Key to dismiss.\n",
];

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct Help(pub(crate) Style);

impl Widget for Help {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = TEXT.iter().map(|&s| Line::raw(s)).collect::<Vec<_>>();
        let text = Text::from(lines);
        let height = u16::try_from(text.height())
            .unwrap_or(u16::MAX)
            .min(area.height)
            .saturating_add(2);
        let width = u16::try_from(text.width())
            .unwrap_or(u16::MAX)
            .min(area.width)
            .saturating_add(2);
        let para = Paragraph::new(text)
            .block(
                Block::bordered()
                    .title(" Commands ")
                    .title_alignment(Alignment::Center),
            )
            .style(self.0);
        let [help_area] = Layout::horizontal([width]).flex(Flex::Center).areas(area);
        let [help_area] = Layout::vertical([height])
            .flex(Flex::Center)
            .areas(help_area);
        let outer_area = Rect {
            x: help_area.x.saturating_sub(1),
            y: help_area.y,
            width: help_area.width.saturating_add(2),
            height: help_area.height,
        }
        .intersection(area);
        Clear.render(outer_area, buf);
        Block::new().style(self.0).render(outer_area, buf);
        para.render(help_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::buffer::Cell;

    #[test]
    fn test_lists_commands() {
        let area = Rect::new(0, 0, 80, 24);
        let mut buffer = Buffer::empty(area);
        Help(Style::new()).render(area, &mut buffer);
        let text = buffer
            .content
            .iter()
            .map(Cell::symbol)
            .collect::<String>();
        assert!(text.contains(" Commands "));
        assert!(text.contains("Toggle dark theme"));
        assert!(text.contains("n, >, PAGE DOWN"));
        assert!(text.contains("q, CTRL-C"));
        assert!(text.contains("Clear the selection, or quit if none"));
        assert!(text.contains("Delete an event by number"));
    }
}
