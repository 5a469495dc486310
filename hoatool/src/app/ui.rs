use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{palette::tailwind, Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, HighlightSpacing, Paragraph, Row, Table, Wrap},
    Frame,
};
use strum::IntoEnumIterator;

use super::app::App;
use super::screen::{dues_table_constraint_len_calculator, CurrentScreen};
use shared_lib::SlotName;

pub fn ui(frame: &mut Frame, app: &mut App) {
    // Create the layout sections.
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let current_keys_hint = {
        match app.current_screen {
            CurrentScreen::Login => Span::styled(
                "(q) to quit / (:) Create Administrator / (\u{23ce}) Login",
                Style::default().fg(Color::LightBlue).bg(Color::Black),
            ),
            CurrentScreen::Dues => Span::styled(
                "(q) to quit / (e) Edit Session / (p) Change Period / (j) Advance Row / (k) Retreat Row / (G) Go to Last / (H) Go to First",
                Style::default().fg(Color::LightBlue),
            ),
        }
    };

    let key_notes_footer = Paragraph::new(Line::from(current_keys_hint)).block(
        Block::default()
            .borders(Borders::ALL)
            .style(Style::new().bg(tailwind::SLATE.c900)),
    );
    let footer_chunks = chunks[chunks.len() - 1];
    frame.render_widget(key_notes_footer, footer_chunks);

    if let CurrentScreen::Login = app.current_screen {
        let title_block = Block::default()
            .borders(Borders::ALL)
            .style(Style::default().bg(tailwind::SLATE.c900));

        let title = Paragraph::new(Text::styled("HOATOOL", Style::default().fg(Color::Green)))
            .block(title_block)
            .centered()
            .bold();
        frame.render_widget(title, chunks[0]);

        let centered_area = centered_rect(60, 25, frame.area());
        let popup_block = Block::default()
            .title(" Login ")
            .borders(Borders::ALL)
            .style(Style::default().bg(tailwind::EMERALD.c950));

        let mut content = "Administrator: ".to_string();
        content.push_str(app.key_input.as_str());
        let login_text = Text::styled(content, Style::default().fg(tailwind::EMERALD.c50));
        let login_paragraph = Paragraph::new(login_text)
            .block(popup_block)
            .wrap(Wrap { trim: false });
        frame.render_widget(login_paragraph, centered_area);

        if app.invalid_input {
            let error_footer = Paragraph::new(Line::from(
                "Unrecognized administrator! -- (q) to quit / (:) Create Administrator / (\u{23ce}) Login",
            ))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .style(tailwind::RED.c500),
            );
            frame.render_widget(error_footer, footer_chunks);
        }
    }

    if let CurrentScreen::Dues = app.current_screen {
        let totals_line = match app.view.as_ref() {
            Some(view) => format!(
                " Dues Ledger {} | dues paid {:.2} | membership fees paid {:.2} ",
                app.period, view.totals.total_dues_paid, view.totals.total_fee_paid
            ),
            None => format!(" Dues Ledger {} ", app.period),
        };
        let title = Paragraph::new(Text::styled(
            totals_line,
            Style::default().fg(app.dues_table_colors.header_fg),
        ))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::new().fg(app.dues_table_colors.footer_border_color))
                .style(Style::default().bg(tailwind::SLATE.c900)),
        )
        .centered();
        frame.render_widget(title, chunks[0]);

        render_dues_table(frame, chunks[1], app);
    }
}

fn render_dues_table(frame: &mut Frame, area: Rect, app: &mut App) {
    let colors = &app.dues_table_colors;

    let header_style = Style::default()
        .fg(colors.header_fg)
        .bg(colors.header_bg);
    let selected_row_style = Style::default()
        .add_modifier(Modifier::REVERSED)
        .fg(colors.selected_row_style_fg);

    let mut header_cells: Vec<Cell> = vec![Cell::from("Member")];
    for slot in SlotName::iter() {
        header_cells.push(Cell::from(slot.to_string()));
    }
    let header = Row::new(header_cells).style(header_style).height(1);

    let displayable = app.displayable_rows();
    let (member_len, cell_len) = dues_table_constraint_len_calculator(&displayable);

    let rows = displayable.iter().enumerate().map(|(i, data)| {
        let color = match i % 2 {
            0 => colors.normal_row_color,
            _ => colors.alt_row_color,
        };
        let mut cells: Vec<Cell> = vec![Cell::from(Text::from(data.member.clone()))];
        for cell in data.cells.iter() {
            cells.push(Cell::from(Text::from(cell.clone())));
        }
        Row::new(cells)
            .style(Style::new().fg(colors.row_fg).bg(color))
            .height(1)
    });

    let mut widths: Vec<Constraint> = vec![Constraint::Length(member_len.max(6) + 1)];
    for _ in SlotName::iter() {
        widths.push(Constraint::Length(cell_len.max(3) + 1));
    }

    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(selected_row_style)
        .bg(colors.buffer_bg)
        .highlight_spacing(HighlightSpacing::Always);

    frame.render_stateful_widget(table, area, &mut app.dues_table_state);
}

/// helper function to create a centered rect using up certain percentage
/// of the available rect `r`
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
