pub mod web;

use crate::error::Result;
use crate::graph::{ConflictGraph, GreedyColorer};
use crate::utils::serialization::ScheduleInstance;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color as TuiColor, Modifier, Style},
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Context, Line as CanvasLine, Points},
        Block, Borders, Paragraph, Widget,
    },
    Terminal,
};
use serde::Serialize;
use std::collections::VecDeque;
use std::f64::consts::PI;
use std::io::{self, Stdout};
use std::time::Duration;

pub use web::{serve, ScheduleRequest};

const LOG_LIMIT: usize = 64;

const SLOT_PALETTE: [TuiColor; 12] = [
    TuiColor::Red,
    TuiColor::Green,
    TuiColor::Yellow,
    TuiColor::Blue,
    TuiColor::Magenta,
    TuiColor::Cyan,
    TuiColor::LightRed,
    TuiColor::LightGreen,
    TuiColor::LightYellow,
    TuiColor::LightBlue,
    TuiColor::LightMagenta,
    TuiColor::LightCyan,
];

#[derive(Clone, Debug, Serialize)]
pub struct GraphStats {
    pub exams: usize,
    pub conflicts: usize,
    pub max_degree: usize,
    pub slots: u32,
    pub fingerprint: String,
    /// Highest-degree exams first, as visited by the colorer.
    pub busiest: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SlotSummary {
    pub slot: u32,
    pub label: String,
    pub exams: Vec<String>,
}

/// Everything the terminal view draws, computed once from an instance.
#[derive(Clone, Debug, Serialize)]
pub struct ScheduleView {
    pub stats: GraphStats,
    pub slots: Vec<SlotSummary>,
    pub gantt: Vec<String>,
    pub layout: GraphLayout,
    pub logs: VecDeque<String>,
}

impl ScheduleView {
    pub fn from_instance(instance: &ScheduleInstance) -> Result<Self> {
        let graph = &instance.graph;
        let timetable = instance.to_timetable()?;

        let busiest = GreedyColorer::ordering(graph)
            .into_iter()
            .take(5)
            .map(|idx| format!("{} ({})", graph.exam(idx), graph.degree(idx)))
            .collect();
        let stats = GraphStats {
            exams: graph.node_count(),
            conflicts: graph.edge_count(),
            max_degree: graph.max_degree(),
            slots: instance.coloring.slot_count(),
            fingerprint: instance.coloring.fingerprint(),
            busiest,
        };

        let slots = timetable
            .slots()
            .into_iter()
            .map(|(slot, rows)| SlotSummary {
                slot,
                label: instance.timetable.slot_label(slot),
                exams: rows.iter().map(|row| row.exam.to_string()).collect(),
            })
            .collect();

        Ok(ScheduleView {
            stats,
            slots,
            gantt: timetable.render_gantt().lines().map(str::to_string).collect(),
            layout: GraphLayout::build(graph, |idx| {
                instance.coloring.slot_of(graph.exam(idx)).unwrap_or_default()
            }),
            logs: VecDeque::with_capacity(LOG_LIMIT),
        })
    }
}

pub struct Visualizer {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    view: ScheduleView,
    finished: bool,
}

impl Visualizer {
    pub fn for_instance(instance: &ScheduleInstance) -> io::Result<Self> {
        let view = ScheduleView::from_instance(instance)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;

        let mut stdout = io::stdout();
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            view,
            finished: false,
        })
    }

    pub fn log<S: Into<String>>(&mut self, entry: S) -> io::Result<()> {
        push_log(&mut self.view.logs, entry.into());
        self.render()
    }

    pub fn finish(&mut self) -> io::Result<()> {
        self.restore_terminal()
    }

    pub fn wait_for_exit(&mut self, prompt: &str) -> io::Result<()> {
        self.log(prompt)?;
        loop {
            if event::poll(Duration::from_millis(100))? {
                match event::read()? {
                    Event::Key(key) => match key.code {
                        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => break,
                        _ => {}
                    },
                    Event::Resize(_, _) => {
                        self.render()?;
                    }
                    _ => {}
                }
            }
        }
        self.finish()
    }

    fn render(&mut self) -> io::Result<()> {
        let snapshot = self.view.clone();

        self.terminal.draw(|frame| {
            let size = frame.size();
            let vertical = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(9),
                    Constraint::Min(12),
                    Constraint::Length(7),
                ])
                .split(size);

            let summary_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
                .split(vertical[0]);

            let middle_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
                .split(vertical[1]);

            frame.render_widget(Self::stats_block(&snapshot), summary_chunks[0]);
            frame.render_widget(Self::slots_block(&snapshot), summary_chunks[1]);
            frame.render_widget(Self::graph_canvas(&snapshot), middle_chunks[0]);
            frame.render_widget(Self::timeline_block(&snapshot), middle_chunks[1]);
            frame.render_widget(Self::log_block(&snapshot), vertical[2]);
        })?;
        Ok(())
    }

    fn stats_block(view: &ScheduleView) -> Paragraph<'_> {
        let stats = &view.stats;
        let mut lines = vec![
            Line::from(format!("exams: {}", stats.exams)),
            Line::from(format!("conflicts: {}", stats.conflicts)),
            Line::from(format!(
                "slots: {} (bound {})",
                stats.slots,
                stats.max_degree + 1
            )),
            Line::from(format!("fingerprint: {}", short_hash(&stats.fingerprint))),
            Line::from("busiest:"),
        ];
        for exam in &stats.busiest {
            lines.push(Line::from(format!("  {exam}")));
        }
        Paragraph::new(lines).block(Block::default().title("Conflict graph").borders(Borders::ALL))
    }

    fn slots_block(view: &ScheduleView) -> Paragraph<'_> {
        let mut lines = Vec::new();
        for slot in &view.slots {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{} ", slot.label),
                    Style::default()
                        .fg(slot_color(slot.slot))
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(slot.exams.join(", ")),
            ]));
        }
        if lines.is_empty() {
            lines.push(Line::from("no exams scheduled"));
        }
        Paragraph::new(lines).block(Block::default().title("Slots").borders(Borders::ALL))
    }

    fn timeline_block(view: &ScheduleView) -> Paragraph<'_> {
        let lines: Vec<Line> = view.gantt.iter().map(|line| Line::from(line.as_str())).collect();
        Paragraph::new(lines).block(Block::default().title("Timeline").borders(Borders::ALL))
    }

    fn log_block(view: &ScheduleView) -> Paragraph<'_> {
        let mut lines: Vec<Line> = view
            .logs
            .iter()
            .rev()
            .map(|entry| Line::from(entry.as_str()))
            .collect();
        if lines.is_empty() {
            lines.push(Line::from("logs will appear here"));
        }
        Paragraph::new(lines)
            .block(
                Block::default()
                    .title("Log (newest first)")
                    .borders(Borders::ALL),
            )
            .style(Style::default().fg(TuiColor::Gray))
    }

    fn graph_canvas(view: &ScheduleView) -> impl Widget + '_ {
        let layout = &view.layout;
        let title = format!(
            "Graph view ({} of {} exams shown)",
            layout.nodes.len(),
            view.stats.exams
        );
        Canvas::default()
            .block(Block::default().title(title).borders(Borders::ALL))
            .x_bounds([-1.3, 1.3])
            .y_bounds([-1.3, 1.3])
            .paint(move |ctx: &mut Context<'_>| {
                for edge in &layout.edges {
                    ctx.draw(&CanvasLine {
                        x1: edge.x1,
                        y1: edge.y1,
                        x2: edge.x2,
                        y2: edge.y2,
                        color: TuiColor::DarkGray,
                    });
                }

                for node in &layout.nodes {
                    ctx.draw(&Points {
                        coords: &[(node.x, node.y)],
                        color: slot_color(node.slot),
                    });
                }

                for node in &layout.nodes {
                    ctx.print(node.x + 0.03, node.y + 0.03, node.label.clone());
                }
            })
    }

    fn restore_terminal(&mut self) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for Visualizer {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct GraphLayout {
    pub nodes: Vec<NodePoint>,
    pub edges: Vec<EdgeSegment>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NodePoint {
    pub idx: u32,
    pub label: String,
    pub slot: u32,
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct EdgeSegment {
    pub from: u32,
    pub to: u32,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl GraphLayout {
    pub const MAX_NODES: usize = 40;
    pub const MAX_EDGES: usize = 160;

    /// Places exams on a circle in insertion order; `slot_of` tints each node.
    pub fn build(graph: &ConflictGraph, slot_of: impl Fn(u32) -> u32) -> Self {
        let visualized = graph.node_count().min(Self::MAX_NODES);
        let mut nodes = Vec::with_capacity(visualized);
        for idx in 0..visualized {
            let angle = 2.0 * PI * (idx as f64) / (visualized.max(1) as f64);
            nodes.push(NodePoint {
                idx: idx as u32,
                label: graph.exam(idx as u32).to_string(),
                slot: slot_of(idx as u32),
                x: angle.cos(),
                y: angle.sin(),
            });
        }

        let edges = graph
            .edges()
            .into_iter()
            .filter(|&(from, to)| (from as usize) < visualized && (to as usize) < visualized)
            .take(Self::MAX_EDGES)
            .map(|(from, to)| {
                let src = &nodes[from as usize];
                let dst = &nodes[to as usize];
                EdgeSegment {
                    from,
                    to,
                    x1: src.x,
                    y1: src.y,
                    x2: dst.x,
                    y2: dst.y,
                }
            })
            .collect();

        GraphLayout { nodes, edges }
    }
}

fn slot_color(slot: u32) -> TuiColor {
    SLOT_PALETTE[slot as usize % SLOT_PALETTE.len()]
}

fn short_hash(hex_string: &str) -> String {
    if hex_string.len() <= 12 {
        hex_string.to_string()
    } else {
        format!(
            "{}…{}",
            &hex_string[..6],
            &hex_string[hex_string.len() - 4..]
        )
    }
}

fn push_log(logs: &mut VecDeque<String>, entry: String) {
    if logs.len() == LOG_LIMIT {
        logs.pop_front();
    }
    logs.push_back(entry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Enrollment;
    use crate::schedule::{SchedulePlan, TimetableConfig};

    fn instance() -> ScheduleInstance {
        let enrollment: Enrollment = [
            ("s1", vec!["A", "B"]),
            ("s2", vec!["B", "C"]),
            ("s3", vec!["D"]),
        ]
        .into_iter()
        .collect();
        let plan = SchedulePlan::from_enrollment(&enrollment, &TimetableConfig::default()).unwrap();
        ScheduleInstance::new(&plan)
    }

    #[test]
    fn view_summarises_slots_and_busiest_exams() {
        let view = ScheduleView::from_instance(&instance()).unwrap();
        assert_eq!(view.stats.exams, 4);
        assert_eq!(view.stats.conflicts, 2);
        assert_eq!(view.stats.slots, 2);
        assert_eq!(view.stats.busiest[0], "B (2)");
        assert_eq!(view.slots.len(), 2);
        assert_eq!(view.slots[0].exams, vec!["B", "D"]);
        assert_eq!(view.slots[1].label, "Slot 2 (11:00 - 13:00)");
        assert_eq!(view.gantt.len(), 6);
    }

    #[test]
    fn layout_places_nodes_on_unit_circle() {
        let instance = instance();
        let layout = GraphLayout::build(&instance.graph, |_| 0);
        assert_eq!(layout.nodes.len(), 4);
        assert_eq!(layout.edges.len(), 2);
        for node in &layout.nodes {
            let radius = (node.x * node.x + node.y * node.y).sqrt();
            assert!((radius - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn layout_caps_visualized_nodes() {
        let mut graph = ConflictGraph::new();
        for idx in 0..(GraphLayout::MAX_NODES + 5) {
            graph.add_conflict(format!("E{idx}"), "Hub");
        }
        let layout = GraphLayout::build(&graph, |_| 0);
        assert_eq!(layout.nodes.len(), GraphLayout::MAX_NODES);
        assert!(layout
            .edges
            .iter()
            .all(|edge| (edge.to as usize) < GraphLayout::MAX_NODES));
    }

    #[test]
    fn log_buffer_is_bounded() {
        let mut logs = VecDeque::new();
        for idx in 0..(LOG_LIMIT + 3) {
            push_log(&mut logs, format!("entry {idx}"));
        }
        assert_eq!(logs.len(), LOG_LIMIT);
        assert_eq!(logs.front().map(String::as_str), Some("entry 3"));
    }
}
