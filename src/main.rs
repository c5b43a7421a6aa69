// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, DisableLineWrap, EnableLineWrap, EndSynchronizedUpdate,
        EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use heatfield::{FieldConfig, Grid};
use std::fs::File;
use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "heatfield")]
#[command(about = "Animated stochastic heat field in the terminal", long_about = None)]
struct Args {
    /// ms per frame (lower = faster)
    #[arg(long, default_value_t = 33)]
    ms: u64,

    /// uniform draws averaged per cell
    #[arg(long, default_value_t = 3)]
    random_values: usize,

    /// neighbour weight, 0..1
    #[arg(long, default_value_t = 0.5)]
    spatial: f32,

    /// history weight, 0..1
    #[arg(long, default_value_t = 0.5)]
    temporal: f32,

    /// frames kept in the history ring
    #[arg(long, default_value_t = 8)]
    frame_history: usize,

    /// trend prediction weight, 0..=1
    #[arg(long, default_value_t = 0.3)]
    regression: f32,

    /// contrast exponent (0 = none, may be negative)
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    contrast: f32,

    /// stretch each frame to the full gradient
    #[arg(long, default_value_t = false)]
    normalize: bool,

    /// fixed RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// write debug logs here (the terminal is taken by the view)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

const HUD_ROWS: usize = 3;
const HALF_BLOCK: char = '▀';

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    fg: (u8, u8, u8),
    bg: (u8, u8, u8),
}

fn rgb(c: (u8, u8, u8)) -> Color {
    Color::Rgb {
        r: c.0,
        g: c.1,
        b: c.2,
    }
}

struct TermGuard {
    out: Stdout,
}

impl TermGuard {
    fn new() -> io::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            out,
            EnterAlternateScreen,
            DisableLineWrap,
            cursor::Hide,
            cursor::MoveTo(0, 0)
        )?;
        Ok(Self { out })
    }
}

impl Drop for TermGuard {
    fn drop(&mut self) {
        let _ = execute!(
            self.out,
            EndSynchronizedUpdate,
            ResetColor,
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}

fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("could not create log file {}", path.display()))?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("heatfield=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(anyhow::Error::msg)
        .context("could not install log subscriber")
}

/// Grid for a terminal of `cols` x `rows`: two field rows per text row.
fn grid_for(cols: usize, rows: usize, cfg: &FieldConfig, seed: Option<u64>) -> Result<Grid> {
    let w = cols.max(1);
    let h = (rows.saturating_sub(HUD_ROWS) * 2).max(2);
    let grid = match seed {
        Some(s) => Grid::with_seed(w, h, cfg.frame_history, s),
        None => Grid::new(w, h, cfg.frame_history),
    };
    grid.context("could not build heat grid")
}

fn pixel(rgba: &[u8], i: usize) -> (u8, u8, u8) {
    (rgba[i * 4], rgba[i * 4 + 1], rgba[i * 4 + 2])
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let mut cfg = FieldConfig {
        random_values: args.random_values,
        spatial_smoothing: args.spatial,
        temporal_smoothing: args.temporal,
        frame_history: args.frame_history,
        regression_weight: args.regression,
    };
    cfg.validate().context("invalid field settings")?;
    let mut contrast = args.contrast;
    let mut normalize = args.normalize;
    let mut paused = false;

    let mut tg = TermGuard::new()?;
    let out = &mut tg.out;

    let mut cols_rows = terminal::size()?;
    let mut grid = grid_for(cols_rows.0 as usize, cols_rows.1 as usize, &cfg, args.seed)?;
    let mut last_frame: Vec<Option<Cell>> = vec![None; grid.size() / 2];
    info!(?cfg, w = grid.dimensions().0, h = grid.dimensions().1, "heatfield start");

    let mut last_present = Instant::now();
    let mut fps_timer = Instant::now();
    let mut frames: u32 = 0;
    let mut fps: f32 = 0.0;

    loop {
        // Handle terminal resize
        let now_cols_rows = terminal::size()?;
        if now_cols_rows != cols_rows {
            cols_rows = now_cols_rows;
            grid = grid_for(cols_rows.0 as usize, cols_rows.1 as usize, &cfg, args.seed)?;
            last_frame = vec![None; grid.size() / 2];
            execute!(out, terminal::Clear(terminal::ClearType::All), cursor::MoveTo(0, 0))?;
        }

        // Input
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(k) = event::read()? {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match k.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char(' ') => paused = !paused,
                    KeyCode::Char('r') | KeyCode::Char('R') => grid.reset(cfg.frame_history)?,
                    KeyCode::Char('n') | KeyCode::Char('N') => normalize = !normalize,
                    KeyCode::Char('c') | KeyCode::Char('C') => contrast = (contrast + 0.1).min(3.0),
                    KeyCode::Char('x') | KeyCode::Char('X') => contrast = (contrast - 0.1).max(-3.0),
                    KeyCode::Char('[') => {
                        cfg.random_values = cfg.random_values.saturating_sub(1).max(1)
                    }
                    KeyCode::Char(']') => cfg.random_values = (cfg.random_values + 1).min(32),
                    KeyCode::Left => {
                        cfg.spatial_smoothing = (cfg.spatial_smoothing - 0.05).clamp(0.0, 0.95)
                    }
                    KeyCode::Right => {
                        cfg.spatial_smoothing = (cfg.spatial_smoothing + 0.05).clamp(0.0, 0.95)
                    }
                    KeyCode::Down => {
                        cfg.temporal_smoothing = (cfg.temporal_smoothing - 0.05).clamp(0.0, 0.95)
                    }
                    KeyCode::Up => {
                        cfg.temporal_smoothing = (cfg.temporal_smoothing + 0.05).clamp(0.0, 0.95)
                    }
                    KeyCode::Char(',') => {
                        cfg.regression_weight = (cfg.regression_weight - 0.05).clamp(0.0, 1.0)
                    }
                    KeyCode::Char('.') => {
                        cfg.regression_weight = (cfg.regression_weight + 0.05).clamp(0.0, 1.0)
                    }
                    KeyCode::Char('-') => {
                        cfg.frame_history = cfg.frame_history.saturating_sub(1).max(1)
                    }
                    KeyCode::Char('=') | KeyCode::Char('+') => {
                        cfg.frame_history = (cfg.frame_history + 1).min(64)
                    }
                    _ => {}
                }
            }
        }

        if !paused {
            grid.update(&cfg)?;
        }

        let (w, h) = grid.dimensions();
        let text_rows = h / 2;
        let rgba = grid.color_buffer(contrast, normalize);

        queue!(out, BeginSynchronizedUpdate)?;

        let mut cur_fg = None;
        let mut cur_bg = None;
        for ty in 0..text_rows {
            for tx in 0..w {
                let top = pixel(&rgba, (ty * 2) * w + tx);
                let bottom = pixel(&rgba, (ty * 2 + 1) * w + tx);
                let cell = Cell { fg: top, bg: bottom };

                let fi = ty * w + tx;
                if last_frame[fi] == Some(cell) {
                    continue;
                }
                queue!(out, cursor::MoveTo(tx as u16, (ty + HUD_ROWS) as u16))?;
                if cur_fg != Some(cell.fg) {
                    queue!(out, SetForegroundColor(rgb(cell.fg)))?;
                    cur_fg = Some(cell.fg);
                }
                if cur_bg != Some(cell.bg) {
                    queue!(out, SetBackgroundColor(rgb(cell.bg)))?;
                    cur_bg = Some(cell.bg);
                }
                queue!(out, Print(HALF_BLOCK))?;
                last_frame[fi] = Some(cell);
            }
        }

        // HUD (always redraw, cheap)
        let stats = grid.stats();
        let line1 = format!(
            "Heat Field  draws:{}  spatial:{:.2}  temporal:{:.2}  history:{}  trend:{:.2}  contrast:{:+.1}  norm:{}  fps:{:>5.1}{}",
            cfg.random_values,
            cfg.spatial_smoothing,
            cfg.temporal_smoothing,
            cfg.frame_history,
            cfg.regression_weight,
            contrast,
            if normalize { "on " } else { "off" },
            fps,
            if paused { "  [PAUSED]" } else { "" }
        );
        let line2 = "Keys: Q quit  SPACE pause  R reset  N normalize  C/X contrast  [ ] draws  ←/→ spatial  ↑/↓ temporal  , . trend  -/= history";
        let line3 = format!(
            "v[min:{:.3} max:{:.3} avg:{:.3}]  frame:{}  grid:{}x{}",
            stats.min,
            stats.max,
            stats.mean,
            grid.frames(),
            w,
            h
        );

        queue!(out, ResetColor)?;
        for (row, line) in [line1.as_str(), line2, line3.as_str()].into_iter().enumerate() {
            let shown: String = line.chars().take(w).collect();
            let pad = w.saturating_sub(shown.chars().count());
            queue!(
                out,
                cursor::MoveTo(0, row as u16),
                Print(shown),
                Print(" ".repeat(pad))
            )?;
        }

        queue!(out, ResetColor, EndSynchronizedUpdate)?;
        out.flush()?;

        // FPS estimate
        frames += 1;
        if fps_timer.elapsed() >= Duration::from_millis(500) {
            let secs = fps_timer.elapsed().as_secs_f32();
            fps = frames as f32 / secs;
            fps_timer = Instant::now();
            frames = 0;
        }

        let target = Duration::from_millis(args.ms);
        let elapsed = last_present.elapsed();
        if elapsed < target {
            std::thread::sleep(target - elapsed);
        }
        last_present = Instant::now();
    }
}
