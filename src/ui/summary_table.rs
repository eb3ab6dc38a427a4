use aba_session::{
    app::App,
    summary::{ActivityTally, SummaryRow},
};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

fn result_color(label: &str) -> Color {
    match label {
        "Fez" => Color::Green,
        "Fez com ajuda" => Color::Yellow,
        "Não fez" => Color::Red,
        "Pulado" | "Não realizado" => Color::DarkGray,
        _ => Color::Magenta,
    }
}

/// Pure presenter for a single try row
pub fn present_row(row: &SummaryRow) -> Row<'static> {
    Row::new(vec![
        Cell::from(row.behavior.clone()),
        Cell::from(row.activity.clone()),
        Cell::from(row.try_number.to_string()),
        Cell::from(row.result.clone()).style(Style::default().fg(result_color(&row.result))),
        Cell::from(row.time.clone()),
        Cell::from(row.reward.clone()),
    ])
}

pub fn tally_line(tally: &ActivityTally) -> String {
    format!(
        "{} · {}: {} fez, {} com ajuda, {} não fez, {} pulado, {} não realizado, {} reforço",
        tally.behavior,
        tally.activity,
        tally.did,
        tally.did_with_help,
        tally.did_not,
        tally.skipped,
        tally.not_performed,
        tally.rewarded
    )
}

pub fn render_summary(app: &mut App, f: &mut Frame) {
    let Some(summary) = app.summary.as_ref() else {
        return;
    };
    let area = f.area();

    let tally_height = (summary.tallies.len() as u16).min(8) + 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),            // title
            Constraint::Min(0),               // tries table
            Constraint::Length(tally_height), // per activity
            Constraint::Length(1),            // legend
        ])
        .split(area);

    let title = Paragraph::new(format!(
        "{} · {} · {} · {}",
        summary.header.patient_name,
        summary.header.plan_name,
        summary.header.applicator_name,
        summary.header.application_date
    ))
    .block(Block::default().borders(Borders::ALL).title("Resumo"))
    .style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    // Account for borders and header
    let table_height = chunks[1].height.saturating_sub(3) as usize;
    let max_scroll = summary.rows.len().saturating_sub(table_height);
    if app.summary_scroll > max_scroll {
        app.summary_scroll = max_scroll;
    }

    let header = Row::new(vec![
        Cell::from("Comportamento"),
        Cell::from("Atividade"),
        Cell::from("#"),
        Cell::from("Resultado"),
        Cell::from("Tempo"),
        Cell::from("Reforço"),
    ])
    .style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = summary
        .rows
        .iter()
        .skip(app.summary_scroll)
        .take(table_height)
        .map(present_row)
        .collect();

    let table = Table::new(
        rows,
        &[
            Constraint::Percentage(25),
            Constraint::Percentage(30),
            Constraint::Length(4),
            Constraint::Length(15),
            Constraint::Length(7),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(format!(
        "Tentativas ({})",
        summary.total_tries()
    )));
    f.render_widget(table, chunks[1]);

    let tallies = Paragraph::new(
        summary
            .tallies
            .iter()
            .map(tally_line)
            .collect::<Vec<_>>()
            .join("\n"),
    )
    .block(Block::default().borders(Borders::ALL).title("Atividades"))
    .style(Style::default().fg(Color::Gray));
    f.render_widget(tallies, chunks[2]);

    let legend = Paragraph::new("↑/↓ rolar | (q) sair e enviar")
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC))
        .alignment(Alignment::Center);
    f.render_widget(legend, chunks[3]);
}
