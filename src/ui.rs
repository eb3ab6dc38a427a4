pub mod screen;
pub mod summary_table;

use aba_session::{
    app::{App, AppState, PromptStage},
    plan::total_tries,
    summary::result_label,
    walker::WalkerState,
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
    Frame,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

pub fn draw(app: &mut App, f: &mut Frame) {
    screen::current_screen(&app.state).render(app, f);
}

fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Session view: where we are in the plan and what the try is doing.
pub struct SessionView<'a>(pub &'a App);

impl Widget for SessionView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let walker = &self.0.walker;
        let header = walker.context().header();

        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(4), // session header
                Constraint::Min(5),    // current try
                Constraint::Length(3), // progress
                Constraint::Length(1), // legend
            ])
            .split(area);

        let info = Paragraph::new(vec![
            Line::from(vec![
                Span::styled("Paciente: ", dim_style),
                Span::styled(header.patient_name.as_str(), bold_style),
                Span::styled("   Aplicador: ", dim_style),
                Span::raw(header.applicator_name.as_str()),
            ]),
            Line::from(vec![
                Span::styled("Plano: ", dim_style),
                Span::styled(header.plan_name.as_str(), bold_style),
                Span::styled("   Tipo: ", dim_style),
                Span::raw(walker.context().plan_type().to_string()),
                Span::styled("   Data: ", dim_style),
                Span::raw(header.application_date.as_str()),
            ]),
        ])
        .block(Block::default().borders(Borders::BOTTOM));
        info.render(chunks[0], buf);

        let (Some(cursor), Some(behavior), Some(activity)) = (
            walker.cursor(),
            walker.current_behavior(),
            walker.current_activity(),
        ) else {
            Paragraph::new(Span::styled("Sessão concluída", bold_style))
                .alignment(Alignment::Center)
                .render(chunks[1], buf);
            return;
        };

        let status = match walker.state() {
            WalkerState::AwaitingStart => match walker.delay_remaining() {
                Some(secs) => Span::styled(
                    format!("começa em {}", format_clock(secs)),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
                None => Span::styled("pressione enter para iniciar", italic_style),
            },
            WalkerState::Running => Span::styled(
                format_clock(walker.elapsed_secs()),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            WalkerState::Recording => Span::styled("registrando…", italic_style),
            WalkerState::Completed => Span::raw(""),
        };

        let current = Paragraph::new(vec![
            Line::from(Span::styled(
                behavior.behavior_name.as_str(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(activity.activity_name.as_str(), bold_style)),
            Line::from(Span::styled(
                format!(
                    "tentativa {} de {}",
                    cursor.try_index + 1,
                    activity.tries.len()
                ),
                dim_style,
            )),
            Line::from(""),
            Line::from(status),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        current.render(chunks[1], buf);

        let total = total_tries(walker.queue());
        let done = walker
            .queue()
            .iter()
            .flat_map(|b| &b.activities)
            .flat_map(|a| &a.tries)
            .filter(|t| t.is_completed())
            .count();
        let ratio = if total == 0 {
            0.0
        } else {
            done as f64 / total as f64
        };
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Progresso"))
            .gauge_style(Style::default().fg(Color::Magenta))
            .ratio(ratio.clamp(0.0, 1.0))
            .label(format!("{done}/{total}"))
            .render(chunks[2], buf);

        Paragraph::new(Span::styled(
            "(enter) iniciar / (1) fez / (2) fez com ajuda / (3) não fez / (s) pular atividade / (esc) sair",
            italic_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
    }
}

/// Reward question layered on a plain frame.
pub fn render_reward_prompt(app: &App, f: &mut Frame) {
    let AppState::RewardPrompt(prompt) = &app.state else {
        return;
    };

    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Length(5),
            Constraint::Min(0),
        ])
        .split(area);

    let question = match &prompt.stage {
        PromptStage::Asking => vec![
            Line::from(Span::styled(
                "Houve reforço?",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("(s)im / (n)ão"),
        ],
        PromptStage::Describing(text) => vec![
            Line::from(Span::styled(
                "Qual reforço? (vazio para \"Yes\")",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![
                Span::raw("> "),
                Span::styled(text.as_str(), Style::default().fg(Color::Yellow)),
                Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
            ]),
        ],
    };

    let widget = Paragraph::new(question)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(
                    "Reforço · {}",
                    result_label(Some(&prompt.draft.outcome))
                )),
        )
        .alignment(Alignment::Center);
    f.render_widget(widget, chunks[1]);
}
