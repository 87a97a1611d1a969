use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, LegendPosition, Paragraph},
};
use std::{
    io::{self, Stdout},
    time::Duration,
};

use crate::types::{ClassAggregate, PsdCurve};

pub const CHART_TITLE: &str = "Average PSD of Intracranial EEG (Ictal vs Interictal)";
pub const X_TITLE: &str = "Frequency (Hz)";
pub const Y_TITLE: &str = "Power Spectral Density (V²/Hz)";

const BORDER: Color = Color::Rgb(96, 160, 192);
const GRID: Color = Color::Rgb(64, 64, 64);
const MAX_Y_TICKS: i32 = 6;
const X_TICKS: usize = 5;

pub struct App {
    pub should_quit: bool,
    pub ictal: ClassAggregate,
    pub interictal: ClassAggregate,
    pub data_path: String,
}

impl App {
    pub fn new(ictal: ClassAggregate, interictal: ClassAggregate, data_path: String) -> App {
        App {
            should_quit: false,
            ictal,
            interictal,
            data_path,
        }
    }
}

/// Curve converted for a log10 Y axis; values a log axis cannot hold are dropped.
pub fn log_points(curve: &PsdCurve) -> Vec<(f64, f64)> {
    curve
        .frequencies
        .iter()
        .zip(&curve.power)
        .filter(|(f, p)| f.is_finite() && p.is_finite() && **p > 0.0)
        .map(|(f, p)| (*f, p.log10()))
        .collect()
}

/// Whole decades enclosing every point, as log10 exponents.
pub fn decade_bounds(series: &[&[(f64, f64)]]) -> [f64; 2] {
    let (lo, hi) = series
        .iter()
        .flat_map(|points| points.iter().map(|(_, y)| *y))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
            (lo.min(y), hi.max(y))
        });

    if !lo.is_finite() || !hi.is_finite() {
        return [-1.0, 1.0];
    }
    let lo = lo.floor();
    let hi = hi.ceil();
    if hi > lo { [lo, hi] } else { [lo, lo + 1.0] }
}

/// Evenly spaced decade exponents covering `bounds`; may widen the top bound.
pub fn decade_ticks(bounds: [f64; 2]) -> Vec<i32> {
    let lo = bounds[0] as i32;
    let hi = bounds[1] as i32;
    let span = (hi - lo).max(1);
    let step = (span + MAX_Y_TICKS - 2) / (MAX_Y_TICKS - 1);
    let count = (span + step - 1) / step;
    (0..=count).map(|i| lo + i * step).collect()
}

fn frequency_ticks(max_freq: f64) -> Vec<f64> {
    (0..X_TICKS)
        .map(|i| max_freq * i as f64 / (X_TICKS - 1) as f64)
        .collect()
}

/// Point storage the chart widget borrows from while drawing.
struct ChartData {
    ictal: Vec<(f64, f64)>,
    interictal: Vec<(f64, f64)>,
    grid: Vec<Vec<(f64, f64)>>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    x_ticks: Vec<f64>,
    y_ticks: Vec<i32>,
}

impl ChartData {
    fn new(app: &App) -> ChartData {
        let ictal = log_points(&app.ictal.curve);
        let interictal = log_points(&app.interictal.curve);

        let max_freq = app
            .ictal
            .curve
            .frequencies
            .iter()
            .chain(&app.interictal.curve.frequencies)
            .copied()
            .filter(|f| f.is_finite())
            .fold(0.0f64, f64::max);
        let x_bounds = [0.0, if max_freq > 0.0 { max_freq } else { 1.0 }];

        let y_ticks = decade_ticks(decade_bounds(&[&ictal, &interictal]));
        let y_bounds = [
            *y_ticks.first().unwrap_or(&-1) as f64,
            *y_ticks.last().unwrap_or(&1) as f64,
        ];
        let x_ticks = frequency_ticks(x_bounds[1]);

        let mut grid = Vec::new();
        for x in &x_ticks {
            grid.push(vec![(*x, y_bounds[0]), (*x, y_bounds[1])]);
        }
        for y in &y_ticks {
            grid.push(vec![(x_bounds[0], *y as f64), (x_bounds[1], *y as f64)]);
        }

        ChartData {
            ictal,
            interictal,
            grid,
            x_bounds,
            y_bounds,
            x_ticks,
            y_ticks,
        }
    }
}

pub type TerminalType = Terminal<CrosstermBackend<Stdout>>;

pub fn init_terminal() -> Result<TerminalType, anyhow::Error> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

pub fn restore_terminal() -> Result<(), anyhow::Error> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
    Ok(())
}

pub fn handle_events(app: &mut App, timeout: Duration) -> Result<(), anyhow::Error> {
    if event::poll(timeout)? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        app.should_quit = true;
                    }
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        app.should_quit = true;
                    }
                    _ => {}
                }
            }
        }
    }
    Ok(())
}

/// Runs its cleanup on drop unless disarmed, so a panic still restores the terminal.
struct RestoreGuard<F: FnMut()> {
    cleanup: Option<F>,
}

impl<F: FnMut()> RestoreGuard<F> {
    fn new(cleanup: F) -> RestoreGuard<F> {
        RestoreGuard {
            cleanup: Some(cleanup),
        }
    }

    fn disarm(mut self) {
        self.cleanup = None;
    }
}

impl<F: FnMut()> Drop for RestoreGuard<F> {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.as_mut() {
            cleanup();
        }
    }
}

/// Show the comparison chart until the user quits.
pub fn show(app: &mut App) -> Result<(), anyhow::Error> {
    let mut terminal = init_terminal()?;
    let guard = RestoreGuard::new(|| {
        let _ = restore_terminal();
    });
    let result = run(&mut terminal, app);
    guard.disarm();
    restore_terminal()?;
    result
}

fn run<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), anyhow::Error> {
    let refresh = Duration::from_millis(250);
    while !app.should_quit {
        terminal.draw(|f| draw_ui(f, app))?;
        handle_events(app, refresh)?;
    }
    Ok(())
}

pub fn draw_ui(f: &mut Frame, app: &App) {
    let size = f.area();

    if size.width < 40 || size.height < 15 {
        let error_msg = Paragraph::new("Terminal too small!\nMinimum: 40x15")
            .style(Style::default().fg(Color::Red))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(error_msg, size);
        return;
    }

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),   // PSD chart
            Constraint::Length(3), // Status bar
        ])
        .split(size);

    draw_chart(f, main_layout[0], app);
    draw_status_bar(f, main_layout[1], app);
}

fn draw_chart(f: &mut Frame, area: Rect, app: &App) {
    let data = ChartData::new(app);

    let mut datasets: Vec<Dataset> = data
        .grid
        .iter()
        .map(|line| {
            Dataset::default()
                .marker(Marker::Dot)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(GRID))
                .data(line)
        })
        .collect();
    datasets.push(
        Dataset::default()
            .name(app.interictal.class.label())
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Blue))
            .data(&data.interictal),
    );
    datasets.push(
        Dataset::default()
            .name(app.ictal.class.label())
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Red))
            .data(&data.ictal),
    );

    let axis_style = Style::default().fg(Color::Rgb(160, 160, 160));
    let x_labels: Vec<Span> = data
        .x_ticks
        .iter()
        .map(|x| Span::styled(format!("{:.0}", x), axis_style))
        .collect();
    let y_labels: Vec<Span> = data
        .y_ticks
        .iter()
        .map(|k| Span::styled(format!("1e{}", k), axis_style))
        .collect();

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(Line::from(format!(" {} ", CHART_TITLE)).centered())
                .title_style(
                    Style::default()
                        .fg(Color::Rgb(128, 224, 208))
                        .add_modifier(Modifier::BOLD),
                )
                .borders(Borders::ALL)
                .border_style(Style::default().fg(BORDER)),
        )
        .x_axis(
            Axis::default()
                .title(X_TITLE)
                .style(axis_style)
                .bounds(data.x_bounds)
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title(Y_TITLE)
                .style(axis_style)
                .bounds(data.y_bounds)
                .labels(y_labels),
        )
        .legend_position(Some(LegendPosition::TopRight))
        .hidden_legend_constraints((Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)));

    f.render_widget(chart, area);
}

fn draw_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let key = Style::default().fg(Color::Rgb(128, 160, 192));
    let value = Style::default().fg(Color::White);
    let hot = Style::default()
        .fg(Color::Rgb(255, 255, 0))
        .add_modifier(Modifier::BOLD);

    let status = Line::from(vec![
        Span::styled("Data: ", key),
        Span::styled(app.data_path.clone(), value),
        Span::styled(" | Ictal: ", key),
        Span::styled(format!("{} files", app.ictal.file_count), value),
        Span::styled(" | Interictal: ", key),
        Span::styled(format!("{} files", app.interictal.file_count), value),
        Span::styled(" | Resolution: ", key),
        Span::styled(format!("{:.2} Hz", app.ictal.curve.resolution()), value),
        Span::styled(" | ", key),
        Span::styled("Q", hot),
        Span::styled("/", key),
        Span::styled("ESC", hot),
        Span::styled(" to quit", value),
    ]);

    f.render_widget(Paragraph::new(status).alignment(Alignment::Center), inner);
}
