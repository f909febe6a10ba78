mod session;

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

use std::time::Duration;

use canvas::doc::{CanvasObject, Point, Style};
use canvas::reconciler::Applied;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use crate::session::Session;

const SYNC_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("invalid board name `{0}`; use letters, digits, `-` or `_`")]
    InvalidBoard(String),
    #[error("websocket connect failed: {0}")]
    WsConnect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket closed")]
    WsClosed,
    #[error("frame decode failed: {0}")]
    Decode(#[from] frames::CodecError),
    #[error("timed out waiting for the initial sync")]
    Timeout,
    #[error("relay rejected a frame ({code}): {message}")]
    ServerError { code: String, message: String },
    #[error("no object with id `{0}` on this board")]
    UnknownObject(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "canvas-cli", about = "Shared canvas replica over the relay websocket")]
struct Cli {
    #[arg(long, env = "CANVAS_URL", default_value = "ws://127.0.0.1:8080")]
    url: String,

    #[arg(long, env = "CANVAS_BOARD", default_value = "default")]
    board: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every change applied to the board until interrupted.
    Watch,
    /// Draw a shape and publish it.
    Draw(DrawCommand),
    /// Move an object by an offset.
    Move {
        id: String,
        #[arg(long, allow_negative_numbers = true, default_value_t = 0.0)]
        dx: f64,
        #[arg(long, allow_negative_numbers = true, default_value_t = 0.0)]
        dy: f64,
    },
    /// Remove an object by id.
    Remove { id: String },
    /// Remove everything on the board.
    Clear,
    /// Print the board's objects as JSON.
    Dump,
}

#[derive(Args, Debug)]
struct DrawCommand {
    #[command(subcommand)]
    shape: ShapeArgs,

    #[command(flatten)]
    style: StyleArgs,
}

#[derive(Subcommand, Debug)]
enum ShapeArgs {
    Rect {
        #[arg(allow_negative_numbers = true)]
        left: f64,
        #[arg(allow_negative_numbers = true)]
        top: f64,
        width: f64,
        height: f64,
    },
    Ellipse {
        #[arg(allow_negative_numbers = true)]
        left: f64,
        #[arg(allow_negative_numbers = true)]
        top: f64,
        rx: f64,
        ry: f64,
    },
    Line {
        #[arg(allow_negative_numbers = true)]
        x1: f64,
        #[arg(allow_negative_numbers = true)]
        y1: f64,
        #[arg(allow_negative_numbers = true)]
        x2: f64,
        #[arg(allow_negative_numbers = true)]
        y2: f64,
    },
    /// Freehand stroke through `x,y` points.
    Path {
        #[arg(value_parser = parse_point, num_args = 2.., required = true, allow_negative_numbers = true)]
        points: Vec<Point>,
    },
}

#[derive(Args, Debug)]
struct StyleArgs {
    #[arg(long, global = true, default_value = "#000000")]
    stroke: String,

    #[arg(long, global = true, default_value_t = 1.0)]
    stroke_width: f64,

    #[arg(long, global = true)]
    fill: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut session = Session::connect(&cli.url, &cli.board, SYNC_TIMEOUT).await?;

    let result = match cli.command {
        Command::Watch => run_watch(&mut session).await,
        Command::Draw(draw) => {
            let id = session.replica_mut().add_local(build_object(&draw));
            println!("{}", id.unwrap_or_default());
            Ok(())
        }
        Command::Move { id, dx, dy } => {
            if session.replica_mut().modify_local(&id, |obj| obj.translate(dx, dy)) {
                Ok(())
            } else {
                Err(CliError::UnknownObject(id))
            }
        }
        Command::Remove { id } => {
            if session.replica_mut().remove_local(&id) {
                Ok(())
            } else {
                Err(CliError::UnknownObject(id))
            }
        }
        Command::Clear => {
            session.replica_mut().clear_local();
            Ok(())
        }
        Command::Dump => print_json(&session.replica().build_full_sync().payload()),
    };

    session.close().await;
    result
}

async fn run_watch(session: &mut Session) -> Result<(), CliError> {
    eprintln!("watching: {} objects", session.replica().doc().len());
    loop {
        tokio::select! {
            applied = session.next_applied() => {
                if let Some(line) = describe(&applied?) {
                    println!("{line}");
                }
            }
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

fn build_object(draw: &DrawCommand) -> CanvasObject {
    let style = Style {
        stroke: draw.style.stroke.clone(),
        stroke_width: draw.style.stroke_width,
        fill: draw.style.fill.clone(),
    };
    match &draw.shape {
        ShapeArgs::Rect { left, top, width, height } => CanvasObject::rect(*left, *top, *width, *height, style),
        ShapeArgs::Ellipse { left, top, rx, ry } => CanvasObject::ellipse(*left, *top, *rx, *ry, style),
        ShapeArgs::Line { x1, y1, x2, y2 } => CanvasObject::line(*x1, *y1, *x2, *y2, style),
        ShapeArgs::Path { points } => CanvasObject::path(points.clone(), style),
    }
}

fn parse_point(raw: &str) -> Result<Point, String> {
    let (x, y) = raw.split_once(',').ok_or_else(|| format!("expected x,y, got `{raw}`"))?;
    let coord = |v: &str| v.trim().parse::<f64>().map_err(|e| format!("bad coordinate `{v}`: {e}"));
    Ok(Point::new(coord(x)?, coord(y)?))
}

/// One line of `watch` output, or `None` for events with nothing to show.
fn describe(applied: &Applied) -> Option<String> {
    let line = match applied {
        Applied::Inserted(id) => format!("added     {id}"),
        Applied::Updated(id) => format!("modified  {id}"),
        Applied::Removed(id) => format!("removed   {id}"),
        Applied::Cleared => "cleared".to_owned(),
        Applied::Replaced { count, skipped } => format!("synced    {count} objects ({skipped} skipped)"),
        Applied::Ignored(reason) => format!("ignored   {reason:?}"),
        Applied::Dropped(e) => format!("dropped   {e}"),
        Applied::Passthrough => return None,
    };
    Some(line)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
