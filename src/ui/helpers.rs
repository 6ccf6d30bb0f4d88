use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::error::domain_error;

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Message shown to the user: the domain error when there is one, otherwise the
/// root cause of the chain.
pub(crate) fn surface_error(err: &Error) -> String {
    if let Some(domain) = domain_error(err) {
        return domain.to_string();
    }
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Clamp `selected + offset` into `0..len`.
pub(crate) fn step_selection(selected: usize, len: usize, offset: isize) -> usize {
    if len == 0 {
        return 0;
    }
    let target = selected as isize + offset;
    target.clamp(0, len as isize - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepertoireError;
    use anyhow::Context;

    #[test]
    fn domain_errors_win_over_context() {
        let err = Err::<(), _>(RepertoireError::DuplicateSong)
            .context("failed to create song")
            .unwrap_err();
        assert_eq!(surface_error(&err), "This song already exists in the catalog.");
    }

    #[test]
    fn selection_is_clamped() {
        assert_eq!(step_selection(0, 3, -1), 0);
        assert_eq!(step_selection(1, 3, 5), 2);
        assert_eq!(step_selection(4, 0, 1), 0);
    }
}
