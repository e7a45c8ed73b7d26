use askama::Template;

use super::stats::{self, ReportRow};

pub const TITLE: &str = "GTM Automation Bot - Data Analysis Dashboard";
pub const SINGLE_KEYWORD_NOTE: &str = "Requires more than one keyword for comparative chart.";

const WIDTH: f64 = 1800.0;
const HEIGHT: f64 = 1400.0;
const PANEL_W: f64 = 840.0;
const PANEL_H: f64 = 600.0;
const VIRIDIS: [&str; 10] = [
    "#440154", "#482878", "#3e4989", "#31688e", "#26828e",
    "#1f9e89", "#35b779", "#6ece58", "#b5de2b", "#fde725",
];

#[derive(Template)]
#[template(path = "dashboard.svg", escape = "html")]
pub struct DashboardSvg {
    width: f64,
    height: f64,
    title: &'static str,
    title_x: f64,
    panels: Vec<Panel>,
}

pub struct Panel {
    x: f64,
    y: f64,
    title: String,
    title_x: f64,
    rects: Vec<Rect>,
    lines: Vec<Line>,
    dots: Vec<Dot>,
    labels: Vec<Label>,
}

pub struct Rect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    fill: &'static str,
}

pub struct Line {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    width: f64,
}

pub struct Dot {
    cx: f64,
    cy: f64,
}

pub struct Label {
    x: f64,
    y: f64,
    text: String,
    anchor: &'static str,
    size: u32,
}

/// Plot area inside a panel.
struct Frame {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

impl Frame {
    fn new(left: f64) -> Self {
        Frame {
            left,
            top: 60.0,
            right: PANEL_W - 30.0,
            bottom: PANEL_H - 70.0,
        }
    }

    fn width(&self) -> f64 {
        self.right - self.left
    }

    fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

fn round(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// `n` colours spread evenly across the viridis ramp.
fn palette(n: usize) -> Vec<&'static str> {
    match n {
        0 => Vec::new(),
        1 => vec![VIRIDIS[0]],
        _ => (0..n)
            .map(|i| VIRIDIS[(i * (VIRIDIS.len() - 1) + (n - 1) / 2) / (n - 1)])
            .collect(),
    }
}

fn label(x: f64, y: f64, text: impl Into<String>, anchor: &'static str, size: u32) -> Label {
    Label {
        x: round(x),
        y: round(y),
        text: text.into(),
        anchor,
        size,
    }
}

fn line(x1: f64, y1: f64, x2: f64, y2: f64, width: f64) -> Line {
    Line {
        x1: round(x1),
        y1: round(y1),
        x2: round(x2),
        y2: round(y2),
        width,
    }
}

fn rect(x: f64, y: f64, width: f64, height: f64, fill: &'static str) -> Rect {
    Rect {
        x: round(x),
        y: round(y),
        width: round(width.max(0.0)),
        height: round(height.max(0.0)),
        fill,
    }
}

impl Panel {
    fn new(col: usize, row: usize, title: &str) -> Self {
        Panel {
            x: 40.0 + col as f64 * (PANEL_W + 40.0),
            y: 120.0 + row as f64 * (PANEL_H + 40.0),
            title: title.to_string(),
            title_x: PANEL_W / 2.0,
            rects: Vec::new(),
            lines: Vec::new(),
            dots: Vec::new(),
            labels: Vec::new(),
        }
    }

    fn axes(&mut self, frame: &Frame) {
        self.lines.push(line(frame.left, frame.top, frame.left, frame.bottom, 1.5));
        self.lines.push(line(frame.left, frame.bottom, frame.right, frame.bottom, 1.5));
    }
}

/// Smallest integer tick top that is at least `max`.
fn count_ticks(max: usize) -> Vec<usize> {
    let step = ((max as f64 / 5.0).ceil() as usize).max(1);
    (0..=max.div_ceil(step)).map(|i| i * step).collect()
}

fn intent_panel(rows: &[ReportRow]) -> Panel {
    let mut panel = Panel::new(0, 0, "Post Intent Analysis");
    let frame = Frame::new(200.0);
    let counts = stats::count_by(rows, |r| r.intent.as_str());
    let colors = palette(counts.len());
    let ticks = count_ticks(counts.iter().map(|(_, n)| *n).max().unwrap_or(1));
    let top = *ticks.last().unwrap_or(&1) as f64;
    let band = frame.height() / counts.len().max(1) as f64;

    for &tick in &ticks {
        let x = frame.left + tick as f64 / top * frame.width();
        panel.labels.push(label(x, frame.bottom + 24.0, tick.to_string(), "middle", 14));
    }
    for (i, (intent, n)) in counts.iter().enumerate() {
        let y = frame.top + i as f64 * band;
        let w = *n as f64 / top * frame.width();
        panel.rects.push(rect(frame.left, y + band * 0.1, w, band * 0.8, colors[i]));
        panel.labels.push(label(frame.left - 10.0, y + band / 2.0 + 5.0, intent.clone(), "end", 16));
    }
    panel.labels.push(label(frame.left + frame.width() / 2.0, frame.bottom + 52.0, "count", "middle", 16));
    panel.axes(&frame);
    panel
}

fn sentiment_panel(rows: &[ReportRow]) -> Panel {
    let mut panel = Panel::new(1, 0, "Overall Sentiment Breakdown");
    let frame = Frame::new(80.0);
    let counts = stats::count_by(rows, |r| r.sentiment.as_str());
    let colors = palette(counts.len());
    let ticks = count_ticks(counts.iter().map(|(_, n)| *n).max().unwrap_or(1));
    let top = *ticks.last().unwrap_or(&1) as f64;
    let band = frame.width() / counts.len().max(1) as f64;

    for &tick in &ticks {
        let y = frame.bottom - tick as f64 / top * frame.height();
        panel.labels.push(label(frame.left - 10.0, y + 5.0, tick.to_string(), "end", 14));
    }
    for (i, (sentiment, n)) in counts.iter().enumerate() {
        let x = frame.left + i as f64 * band;
        let h = *n as f64 / top * frame.height();
        panel.rects.push(rect(x + band * 0.1, frame.bottom - h, band * 0.8, h, colors[i]));
        panel.labels.push(label(x + band / 2.0, frame.bottom + 24.0, sentiment.clone(), "middle", 16));
    }
    panel.labels.push(label(frame.left + frame.width() / 2.0, frame.bottom + 52.0, "Sentiment", "middle", 16));
    panel.axes(&frame);
    panel
}

fn relevance_panel(rows: &[ReportRow]) -> Panel {
    let mut panel = Panel::new(0, 1, "Relevance Score Distribution by Intent");
    let frame = Frame::new(200.0);
    let groups = stats::relevance_by_intent(rows);
    let colors = palette(groups.len());

    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    for (_, b) in &groups {
        for v in [b.whisker_low, b.whisker_high].iter().chain(&b.outliers) {
            lo = lo.min(*v);
            hi = hi.max(*v);
        }
    }
    let scale = |v: f64| frame.left + (v - lo) / (hi - lo) * frame.width();
    let band = frame.height() / groups.len().max(1) as f64;

    for i in 0..=4 {
        let v = lo + (hi - lo) * i as f64 / 4.0;
        panel.labels.push(label(scale(v), frame.bottom + 24.0, format!("{:.2}", v), "middle", 14));
    }
    for (i, (intent, b)) in groups.iter().enumerate() {
        let mid = frame.top + i as f64 * band + band / 2.0;
        let half = band * 0.3;
        panel.lines.push(line(scale(b.whisker_low), mid, scale(b.q1), mid, 1.5));
        panel.lines.push(line(scale(b.q3), mid, scale(b.whisker_high), mid, 1.5));
        panel.lines.push(line(scale(b.whisker_low), mid - half / 2.0, scale(b.whisker_low), mid + half / 2.0, 1.5));
        panel.lines.push(line(scale(b.whisker_high), mid - half / 2.0, scale(b.whisker_high), mid + half / 2.0, 1.5));
        panel.rects.push(rect(scale(b.q1), mid - half, scale(b.q3) - scale(b.q1), half * 2.0, colors[i]));
        panel.lines.push(line(scale(b.median), mid - half, scale(b.median), mid + half, 2.5));
        for v in &b.outliers {
            panel.dots.push(Dot { cx: round(scale(*v)), cy: round(mid) });
        }
        panel.labels.push(label(frame.left - 10.0, mid + 5.0, intent.clone(), "end", 16));
    }
    panel.labels.push(label(frame.left + frame.width() / 2.0, frame.bottom + 52.0, "Relevance", "middle", 16));
    panel.axes(&frame);
    panel
}

fn keyword_panel(rows: &[ReportRow]) -> Panel {
    let distinct = stats::count_by(rows, |r| r.keyword.as_str()).len();
    if distinct <= 1 {
        let mut panel = Panel::new(1, 1, "");
        panel.labels.push(label(PANEL_W / 2.0, PANEL_H / 2.0, SINGLE_KEYWORD_NOTE, "middle", 18));
        return panel;
    }

    let mut panel = Panel::new(1, 1, "Sentiment Breakdown by Keyword");
    let frame = Frame::new(80.0);
    let tab = stats::keyword_sentiment(rows);
    let colors = palette(tab.sentiments.len());
    let totals: Vec<usize> = tab.counts.iter().map(|c| c.iter().sum()).collect();
    let ticks = count_ticks(totals.iter().copied().max().unwrap_or(1));
    let top = *ticks.last().unwrap_or(&1) as f64;
    let band = frame.width() / tab.keywords.len() as f64;

    for &tick in &ticks {
        let y = frame.bottom - tick as f64 / top * frame.height();
        panel.labels.push(label(frame.left - 10.0, y + 5.0, tick.to_string(), "end", 14));
    }
    for (i, keyword) in tab.keywords.iter().enumerate() {
        let x = frame.left + i as f64 * band;
        let mut base = frame.bottom;
        for (j, n) in tab.counts[i].iter().enumerate() {
            let h = *n as f64 / top * frame.height();
            panel.rects.push(rect(x + band * 0.15, base - h, band * 0.7, h, colors[j]));
            base -= h;
        }
        panel.labels.push(label(x + band / 2.0, frame.bottom + 24.0, keyword.clone(), "middle", 16));
    }
    for (j, sentiment) in tab.sentiments.iter().enumerate() {
        let y = frame.top + j as f64 * 24.0;
        panel.rects.push(rect(frame.right - 150.0, y, 16.0, 16.0, colors[j]));
        panel.labels.push(label(frame.right - 126.0, y + 13.0, sentiment.clone(), "start", 14));
    }
    panel.axes(&frame);
    panel
}

pub fn build(rows: &[ReportRow]) -> DashboardSvg {
    DashboardSvg {
        width: WIDTH,
        height: HEIGHT,
        title: TITLE,
        title_x: WIDTH / 2.0,
        panels: vec![
            intent_panel(rows),
            sentiment_panel(rows),
            relevance_panel(rows),
            keyword_panel(rows),
        ],
    }
}
