use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Screen regions for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Areas {
    pub header: Rect,
    pub preview: Rect,
    pub directory: Rect,
    pub generated: Rect,
    /// Present while a company detail is open.
    pub company: Option<Rect>,
    pub notice: Rect,
    pub help: Rect,
}

pub fn split(area: Rect, company_open: bool) -> Areas {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(38), Constraint::Percentage(62)])
        .split(rows[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0)])
        .split(columns[0]);

    let (generated, company) = if company_open {
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(columns[1]);
        (right[0], Some(right[1]))
    } else {
        (columns[1], None)
    };

    Areas {
        header: rows[0],
        preview: left[0],
        directory: left[1],
        generated,
        company,
        notice: rows[2],
        help: rows[3],
    }
}

/// A `width` x `height` box centered in `area`, shrunk to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
