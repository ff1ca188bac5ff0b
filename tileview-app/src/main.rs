use anyhow::{bail, Context};
use tileview::{
    constants::TOKEN_ENV_VAR, GridRequest, HttpTileFetcher, InputEvent, Point, Viewer, ViewerConfig,
    ViewerEvent,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Headless viewer driven by line commands on stdin
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tileview::init_logging();

    let mut config = match std::env::args().nth(1) {
        Some(path) => ViewerConfig::load(&path)
            .map_err(|e| anyhow::anyhow!(e))
            .with_context(|| format!("loading config from {}", path))?,
        None => ViewerConfig::default(),
    };
    config.server = config.server.with_env_token(TOKEN_ENV_VAR);
    if config.server.token.is_none() {
        log::warn!("no token configured; set {} if the tile server needs one", TOKEN_ENV_VAR);
    }

    let fetcher = HttpTileFetcher::new(config.server.clone()).map_err(|e| anyhow::anyhow!(e))?;
    let mut viewer = Viewer::new(config, Arc::new(fetcher)).map_err(|e| anyhow::anyhow!(e))?;

    let events = viewer.events();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_millis(50));
        loop {
            tick.tick().await;
            for event in events.try_iter() {
                report(&event);
            }
        }
    });

    spawn_request(viewer.start().map_err(|e| anyhow::anyhow!(e))?)?;
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        let inputs = match parse_command(&words) {
            Ok(Command::Quit) => break,
            Ok(Command::State) => {
                print_state(&viewer);
                continue;
            }
            Ok(Command::Help) => {
                print_help();
                continue;
            }
            Ok(Command::Inputs(inputs)) => inputs,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        for input in inputs {
            let update = viewer.handle_input(input).map_err(|e| anyhow::anyhow!(e))?;
            if let Some(request) = update.request {
                spawn_request(request)?;
            }
        }
    }

    Ok(())
}

enum Command {
    Inputs(Vec<InputEvent>),
    State,
    Help,
    Quit,
}

fn parse_command(words: &[&str]) -> anyhow::Result<Command> {
    let command = match words {
        [] => Command::Inputs(Vec::new()),
        ["in"] => Command::Inputs(vec![InputEvent::Scroll { delta_y: -1.0 }]),
        ["out"] => Command::Inputs(vec![InputEvent::Scroll { delta_y: 1.0 }]),
        ["+"] => Command::Inputs(vec![InputEvent::ZoomIn]),
        ["-"] => Command::Inputs(vec![InputEvent::ZoomOut]),
        ["leave"] => Command::Inputs(vec![InputEvent::PointerLeave]),
        ["drag", x0, y0, x1, y1] => {
            let from = Point::new(x0.parse()?, y0.parse()?);
            let to = Point::new(x1.parse()?, y1.parse()?);
            Command::Inputs(vec![
                InputEvent::DragStart { position: from },
                InputEvent::DragMove { position: to },
                InputEvent::DragEnd,
            ])
        }
        ["state"] => Command::State,
        ["help"] => Command::Help,
        ["quit"] | ["exit"] => Command::Quit,
        other => bail!("unknown command: {}", other.join(" ")),
    };
    Ok(command)
}

fn spawn_request(request: GridRequest) -> anyhow::Result<()> {
    tileview::runtime::spawn(request).map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}

fn report(event: &ViewerEvent) {
    match event {
        ViewerEvent::OffsetChanged { offset } => {
            println!("offset ({:.1}, {:.1})", offset.x, offset.y)
        }
        ViewerEvent::ZoomChanged { scale, level } => {
            println!("scale {:.2} at level {}", scale, level)
        }
        ViewerEvent::GridReady { level, grid } => println!(
            "level {} grid {}x{} ready ({} of {} tiles)",
            level,
            grid.dimension(),
            grid.dimension(),
            grid.resolved_count(),
            grid.len()
        ),
    }
}

fn print_state(viewer: &Viewer) {
    let state = viewer.state();
    println!(
        "level {} scale {:.2} offset ({:.1}, {:.1}){}",
        state.level,
        state.scale,
        state.offset.x,
        state.offset.y,
        if state.loading { " loading..." } else { "" }
    );
    if let Some(grid) = state.grid {
        for row in grid.rows() {
            let line: String = row
                .iter()
                .map(|cell| if cell.is_some() { '#' } else { '.' })
                .collect();
            println!("  {}", line);
        }
    }
    println!("  cached levels: {:?}", viewer.cache().cached_levels());
}

fn print_help() {
    println!("commands: in | out | + | - | drag x0 y0 x1 y1 | leave | state | help | quit");
}
