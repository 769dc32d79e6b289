use std::sync::Arc;

use clap::{Parser, Subcommand};
use drawroom::{
    BootstrapError, BuilderError, ClientConfig, CommitError, ConfigError, ConnectionStatus, HttpTransport,
    RoomTransport, RoomView, StrokeStore, TracingNotifier, TransportError, parse_hex_color,
};
use strokes::{Point, RoomId};


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Transport(#[from] TransportError),
    #[error("{0}")]
    Bootstrap(#[from] BootstrapError),
    #[error("drawing failed: {0}")]
    Builder(#[from] BuilderError),
    #[error("{0}")]
    Commit(#[from] CommitError),
    #[error("invalid --points value {0:?}; expected \"x,y;x,y;...\"")]
    InvalidPoints(String),
    #[error("invalid color {0:?}; expected #rgb or #rrggbb")]
    InvalidColor(String),
    #[error("commit abandoned before the server answered")]
    CommitAbandoned,
}

#[derive(Parser, Debug)]
#[command(name = "drawroom", about = "Shared drawing room client")]
struct Cli {
    #[arg(long, env = "DRAWROOM_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    #[arg(long, env = "DRAWROOM_CSRF_TOKEN")]
    csrf_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print room metadata and the committed stroke ids in render order.
    Show { room_id: RoomId },
    /// Follow a room and print the render list whenever it changes.
    Watch { room_id: RoomId },
    /// Draw one stroke and commit it.
    Draw {
        room_id: RoomId,
        /// Semicolon-separated `x,y` pairs.
        #[arg(long)]
        points: String,
        #[arg(long, default_value = "#808080")]
        color: String,
        /// Opacity in percent.
        #[arg(long, default_value_t = 70.0)]
        alpha: f64,
        #[arg(long, default_value_t = 20)]
        width: u32,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env()?
        .with_base_url(&cli.base_url)?
        .with_csrf_token(cli.csrf_token);
    let transport: Arc<dyn RoomTransport> = Arc::new(HttpTransport::from_config(&config)?);

    match cli.command {
        Command::Show { room_id } => run_show(transport.as_ref(), room_id).await,
        Command::Watch { room_id } => run_watch(transport, &config, room_id).await,
        Command::Draw { room_id, points, color, alpha, width } => {
            let stroke = StrokeArgs { points: parse_points(&points)?, color, alpha, width };
            run_draw(transport, &config, room_id, stroke).await
        }
    }
}

async fn run_show(transport: &dyn RoomTransport, room_id: RoomId) -> Result<(), CliError> {
    let envelope = transport.fetch_room(room_id).await?;
    let room = envelope.room;
    let mut store = StrokeStore::new();
    store.initialize(room.strokes);

    println!("{} ({}x{})", room.name, room.canvas_width, room.canvas_height);
    println!("strokes: {}", store.len());
    println!("order: {}", join_ids(store.iter().map(|stroke| stroke.id)));
    Ok(())
}

async fn run_watch(transport: Arc<dyn RoomTransport>, config: &ClientConfig, room_id: RoomId) -> Result<(), CliError> {
    let mut view = RoomView::open(transport, room_id, config, Arc::new(TracingNotifier)).await?;
    print_render_list(&view);

    let mut status = view.connection();
    loop {
        tokio::select! {
            changed = view.next_event() => {
                if view.connection() != status {
                    status = view.connection();
                    log_status(room_id, status);
                }
                if changed {
                    print_render_list(&view);
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::warn!(error = %e, "ctrl-c handler failed");
                }
                break;
            }
        }
    }

    view.deactivate();
    Ok(())
}

struct StrokeArgs {
    points: Vec<Point>,
    color: String,
    alpha: f64,
    width: u32,
}

async fn run_draw(
    transport: Arc<dyn RoomTransport>,
    config: &ClientConfig,
    room_id: RoomId,
    stroke: StrokeArgs,
) -> Result<(), CliError> {
    if parse_hex_color(&stroke.color).is_none() {
        return Err(CliError::InvalidColor(stroke.color));
    }
    let Some((&first, rest)) = stroke.points.split_first() else {
        return Err(CliError::InvalidPoints(String::new()));
    };
    let (last, middle) = match rest.split_last() {
        Some((&last, middle)) => (last, middle),
        None => (first, rest),
    };

    let mut view = RoomView::open(transport, room_id, config, Arc::new(TracingNotifier)).await?;
    let tools = view.tools_mut();
    tools.set_stroke_width(stroke.width);
    tools.apply_color_change(&stroke.color, stroke.alpha);

    view.pointer_down(first)?;
    for &point in middle {
        view.pointer_move(point)?;
    }
    let ticket = view.pointer_up(last)?;

    let outcome = view.wait_for_commit(ticket).await;
    view.deactivate();
    match outcome {
        Some(Ok(id)) => {
            println!("{id}");
            Ok(())
        }
        Some(Err(e)) => Err(e.into()),
        None => Err(CliError::CommitAbandoned),
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Parse `"x,y;x,y;..."`. Blank segments are skipped; at least one point is
/// required and every coordinate must be finite.
fn parse_points(raw: &str) -> Result<Vec<Point>, CliError> {
    let invalid = || CliError::InvalidPoints(raw.to_owned());
    let mut points = Vec::new();
    for pair in raw.split(';').map(str::trim).filter(|pair| !pair.is_empty()) {
        let (x, y) = pair.split_once(',').ok_or_else(invalid)?;
        let x: f64 = x.trim().parse().map_err(|_| invalid())?;
        let y: f64 = y.trim().parse().map_err(|_| invalid())?;
        let point = Point::new(x, y);
        if !point.is_finite() {
            return Err(invalid());
        }
        points.push(point);
    }
    if points.is_empty() {
        return Err(invalid());
    }
    Ok(points)
}

fn join_ids(ids: impl Iterator<Item = u64>) -> String {
    ids.map(|id| id.to_string()).collect::<Vec<_>>().join(" ")
}

fn print_render_list(view: &RoomView) {
    println!("render: [{}]", join_ids(view.render_list().into_iter().map(|stroke| stroke.id)));
}

fn log_status(room_id: RoomId, status: ConnectionStatus) {
    match status {
        ConnectionStatus::Connected => tracing::info!(room_id, "feed connected"),
        ConnectionStatus::Connecting => tracing::info!(room_id, "feed connecting"),
        ConnectionStatus::Disconnected => tracing::warn!(room_id, "feed disconnected"),
    }
}
