//! Renderização da interface TUI

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use super::app::{App, InputMode, LogLevel, VISIBLE_LOGS};
use crate::types::RowStatus;

/// Renderiza a interface completa
pub fn render(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                        // Cabeçalho
            Constraint::Length(3),                        // Filtro
            Constraint::Min(8),                           // Tabela
            Constraint::Length(VISIBLE_LOGS as u16 + 2), // Logs
            Constraint::Length(1),                        // Ajuda
        ])
        .split(area);

    render_header(frame, app, chunks[0]);
    render_filter(frame, app, chunks[1]);
    render_table(frame, app, chunks[2]);
    render_logs(frame, app, chunks[3]);
    render_help(frame, app, chunks[4]);
}

// ═══════════════════════════════════════════════════════════════════════════════
// CABEÇALHO E FILTRO
// ═══════════════════════════════════════════════════════════════════════════════

fn render_header(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let status = match (&app.status, app.table.is_loading()) {
        (Some(status), _) => status.clone(),
        (None, true) => "Buscando...".to_string(),
        (None, false) => format!(
            "{} de {} registro(s)",
            app.table.filtered_count(),
            app.table.total_count()
        ),
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " 🔎 Busca de inativação ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("│ Base: {} │ ", app.title)),
        Span::styled(status, Style::default().fg(Color::Gray)),
    ]))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn render_filter(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let editing = app.input_mode == InputMode::Filter;
    let border = if editing { Color::Yellow } else { Color::DarkGray };
    let mut text = app.filter_input.clone();
    if editing {
        text.push('▏');
    }

    let filter = Paragraph::new(text).block(
        Block::default()
            .title(" Filtro (nome ou CPF) ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );
    frame.render_widget(filter, area);
}

// ═══════════════════════════════════════════════════════════════════════════════
// TABELA DE RESULTADOS
// ═══════════════════════════════════════════════════════════════════════════════

fn status_style(status: RowStatus) -> Style {
    match status {
        RowStatus::NotFound => Style::default().fg(Color::Yellow),
        RowStatus::Active => Style::default().fg(Color::Green),
        RowStatus::Inactive => Style::default().fg(Color::Red),
        RowStatus::Unclassified => Style::default(),
    }
}

fn render_table(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let header = Row::new(["Nome", "CPF", "E-mail", "Status", "Situação"]).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row<'_>> = if app.table.is_loading() {
        // esqueleto enquanto a busca não volta
        (0..app.table.placeholder_rows())
            .map(|_| {
                Row::new(["░░░░░░░░░░░░", "░░░░░░░░░", "░░░░░░░░░░", "░░░░", "░░░░"])
                    .style(Style::default().fg(Color::DarkGray))
            })
            .collect()
    } else {
        app.table
            .page_rows()
            .into_iter()
            .map(|row| {
                let style = status_style(row.status);
                Row::new(vec![
                    Cell::from(row.nome),
                    Cell::from(row.cpf),
                    Cell::from(row.email),
                    Cell::from(row.status_atual),
                    Cell::from(row.status.label()),
                ])
                .style(style)
            })
            .collect()
    };

    let empty = rows.is_empty();
    let title = format!(" {} ", app.table.page_info());
    let table = Table::new(
        rows,
        [
            Constraint::Percentage(30),
            Constraint::Length(15),
            Constraint::Percentage(25),
            Constraint::Length(12),
            Constraint::Min(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(title)
            .title_alignment(Alignment::Right)
            .borders(Borders::ALL),
    );
    frame.render_widget(table, area);

    if empty && !app.table.is_loading() {
        let inner = Rect {
            x: area.x + 1,
            y: area.y + 2,
            width: area.width.saturating_sub(2),
            height: 1,
        };
        let message = Paragraph::new("Nenhum registro")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(message, inner);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOGS E AJUDA
// ═══════════════════════════════════════════════════════════════════════════════

fn render_logs(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let lines: Vec<Line<'_>> = app
        .recent_logs()
        .map(|entry| {
            let color = match entry.level {
                LogLevel::Info => Color::White,
                LogLevel::Success => Color::Green,
                LogLevel::Warning => Color::Yellow,
                LogLevel::Error => Color::Red,
            };
            Line::from(vec![
                Span::styled(
                    format!("{} ", entry.timestamp),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(format!("{} ", entry.level.symbol())),
                Span::styled(entry.message.clone(), Style::default().fg(color)),
            ])
        })
        .collect();

    let logs = Paragraph::new(lines).block(Block::default().title(" Logs ").borders(Borders::ALL));
    frame.render_widget(logs, area);
}

fn render_help(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let help = match app.input_mode {
        InputMode::Browse => "/ filtrar │ n/→ próxima │ p/← anterior │ Esc limpar filtro │ q sair",
        InputMode::Filter => "Enter aplicar │ Esc limpar │ Backspace apagar",
    };
    let paragraph = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}
