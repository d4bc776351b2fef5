//! TUI layout and widget rendering.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, Gauge, Paragraph, Row, Table};

use super::runtime::{App, Slider};
use super::style;

const SLIDER_BAR_WIDTH: usize = 24;

/// Renders the full TUI frame.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),  // header
            Constraint::Min(8),     // chart
            Constraint::Length(7),  // sliders
            Constraint::Length(10), // results
            Constraint::Length(3),  // SOC gauge
            Constraint::Length(1),  // footer
        ])
        .split(frame.area());

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(chunks[1]);

    render_header(frame, app, chunks[0]);
    render_chart(frame, app, top[0]);
    render_decisions(frame, app, top[1]);
    render_sliders(frame, app, chunks[2]);
    render_results(frame, app, chunks[3]);
    render_soc_gauge(frame, app, chunks[4]);
    render_footer(frame, chunks[5]);
}

/// Header bar: title and base totals.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let header = Line::from(vec![
        Span::styled(
            " SOLAR-TWIN ",
            Style::default()
                .fg(style::HEADER_FG)
                .bg(style::HEADER_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " {} records │ solar {:.1} kWh │ load {:.1} kWh ",
            app.base.records, app.base.solar_kwh, app.base.consumption_kwh,
        )),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

/// Measured and forecast solar against consumption, per record.
fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let y_bounds = style::auto_bounds_y(&[
        &app.actual_series,
        &app.predicted_series,
        &app.consumption_series,
    ]);

    let x_lo = app.actual_series.first().map_or(0.0, |p| p.0);
    let x_hi = app.actual_series.last().map_or(1.0, |p| p.0).max(x_lo + 1.0);

    let mut datasets = vec![
        Dataset::default()
            .name("Actual")
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(style::ACTUAL_COLOR))
            .data(&app.actual_series),
    ];
    datasets.push(
        Dataset::default()
            .name("Consumption")
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(style::CONSUMPTION_COLOR))
            .data(&app.consumption_series),
    );
    if !app.predicted_series.is_empty() {
        datasets.push(
            Dataset::default()
                .name("Predicted")
                .marker(symbols::Marker::Dot)
                .style(Style::default().fg(style::PREDICTED_COLOR))
                .data(&app.predicted_series),
        );
    }

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(" Solar vs Consumption ")
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title("record")
                .bounds([x_lo, x_hi])
                .labels(vec![format!("{}", x_lo as u32), format!("{}", x_hi as u32)]),
        )
        .y_axis(
            Axis::default()
                .title("kW")
                .bounds(y_bounds)
                .labels(vec![
                    format!("{:.1}", y_bounds[0]),
                    format!("{:.1}", y_bounds[1]),
                ]),
        );

    frame.render_widget(chart, area);
}

/// Latest recommendations that fit the pane.
fn render_decisions(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().title(" Energy Decisions ").borders(Borders::ALL);
    if app.decisions.is_empty() {
        let hint = Paragraph::new("  none yet: run `decide` or `pipeline`").block(block);
        frame.render_widget(hint, area);
        return;
    }

    // borders and header
    let visible = usize::from(area.height.saturating_sub(3));
    let skip = app.decisions.len().saturating_sub(visible);
    let rows = app.decisions[skip..].iter().map(|r| {
        Row::new(vec![
            r.timestamp.format("%m-%d %H:%M").to_string(),
            format!("{:.2}", r.consumption_kw),
            r.decision.map_or("-", |d| d.code()).to_string(),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(11),
            Constraint::Length(6),
            Constraint::Min(10),
        ],
    )
    .header(
        Row::new(vec!["time", "kW", "decision"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(block);
    frame.render_widget(table, area);
}

/// One line per slider, the selected one highlighted.
fn render_sliders(frame: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = Slider::ALL
        .iter()
        .enumerate()
        .map(|(i, &slider)| {
            let (lo, hi) = slider.range();
            let value = slider.get(&app.what_if);
            let text = format!(
                " {:<24} {} {:>6.1}",
                slider.label(),
                style::slider_bar((value - lo) / (hi - lo), SLIDER_BAR_WIDTH),
                value
            );
            if i == app.selected {
                Line::from(Span::styled(
                    text,
                    Style::default()
                        .fg(style::SELECTED)
                        .add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(text)
            }
        })
        .collect();

    let block = Block::default().title(" Scenario ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Dispatch metrics, or the evaluation error with no metrics.
fn render_results(frame: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = match &app.outcome {
        Ok(report) => {
            let o = &report.outcome;
            let d = &o.dispatch;
            let mut lines = vec![
                Line::from(format!(
                    "  simulated solar={:>8.2} kWh   consumption={:>8.2} kWh",
                    o.totals.solar_generated_kwh, o.totals.consumed_kwh
                )),
                Line::from(format!(
                    "  net after battery={:>8.2} kWh   charged={:>8.2}   used={:>8.2}",
                    d.net_energy_kwh, d.battery_charged_kwh, d.battery_discharged_kwh
                )),
                Line::from(format!(
                    "  grid import={:>8.2} kWh   export={:>8.2} kWh",
                    d.grid_import_kwh, d.grid_export_kwh
                )),
                Line::from(format!(
                    "  battery keeps {:.0}% minimum charge ({:.2} kWh reserved)",
                    o.battery.min_state_of_charge_fraction * 100.0,
                    d.reserve_energy_kwh
                )),
                Line::from(format!("  estimated CO₂ saved: {:.2} kg", report.co2_saved_kg)),
            ];
            if let Some(advice) = report.grid_advisory() {
                lines.push(Line::from(format!("  {advice}")));
            }
            lines
        }
        Err(message) => vec![Line::from(Span::styled(
            format!("  {message}"),
            Style::default().fg(style::ERROR_FG),
        ))],
    };

    let block = Block::default()
        .title(" Battery Dispatch ")
        .borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Final state-of-charge gauge.
fn render_soc_gauge(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().title(" SOC ").borders(Borders::ALL);
    let Some(soc) = app.soc_fraction() else {
        frame.render_widget(Paragraph::new("  n/a").block(block), area);
        return;
    };
    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(style::soc_color(soc)))
        .ratio(soc.clamp(0.0, 1.0))
        .label(format!("{:.0}%", soc * 100.0));
    frame.render_widget(gauge, area);
}

/// Footer with keybinding hints.
fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(Span::styled(
        " q:Quit  ↑/↓:Select  ←/→:Adjust  r:Reset",
        Style::default().fg(style::FOOTER_FG),
    )));
    frame.render_widget(footer, area);
}
