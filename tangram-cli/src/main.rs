use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use tangram_core::{
    Catalog, GameConfig, MatchReport, MatchResult, Matcher, MirrorScale, Mismatch, PieceId,
    PieceState, Point, Transform,
};

const USAGE: &str = "Usage: tangram-check <arrangement.json> [shape-id] [--catalog catalog.json] [--config config.json] [--json]
       tangram-check --list [--catalog catalog.json]";

/// One piece as written in an arrangement file.
#[derive(Clone, Debug, Deserialize)]
struct PlacedPiece {
    id: PieceId,
    position: Point,
    #[serde(default)]
    rotation: f64,
    #[serde(default)]
    scale: MirrorScale,
    #[serde(default = "placed_on_board")]
    on_board: bool,
}

fn placed_on_board() -> bool {
    true
}

/// Board snapshot to verify: which shape it is meant to be and where the pieces lie.
#[derive(Clone, Debug, Default, Deserialize)]
struct ArrangementFile {
    shape: Option<String>,
    pieces: Vec<PlacedPiece>,
}

impl ArrangementFile {
    fn states(&self) -> HashMap<PieceId, PieceState> {
        self.pieces
            .iter()
            .map(|p| {
                let state = PieceState {
                    transform: Transform {
                        position: p.position,
                        rotation_deg: p.rotation,
                        scale: p.scale,
                    },
                    on_board: p.on_board,
                };
                (p.id.clone(), state)
            })
            .collect()
    }
}

#[derive(Debug, Default)]
struct Args {
    arrangement: Option<String>,
    shape: Option<String>,
    catalog: Option<String>,
    config: Option<String>,
    json: bool,
    list: bool,
}

fn parse_args(raw: &[String]) -> Result<Args, String> {
    let mut args = Args::default();
    let mut it = raw.iter();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--catalog" => args.catalog = Some(it.next().ok_or("--catalog needs a path")?.clone()),
            "--config" => args.config = Some(it.next().ok_or("--config needs a path")?.clone()),
            "--json" => args.json = true,
            "--list" => args.list = true,
            flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
            _ if args.arrangement.is_none() => args.arrangement = Some(a.clone()),
            _ if args.shape.is_none() => args.shape = Some(a.clone()),
            extra => return Err(format!("unexpected argument {extra}")),
        }
    }
    if !args.list && args.arrangement.is_none() {
        return Err("missing arrangement file".into());
    }
    Ok(args)
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let level = env::var("TANGRAM_LOG")
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Warn);
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{l} {t} {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}

fn load_catalog(path: Option<&str>) -> Result<Catalog, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(Catalog::from_json(&fs::read_to_string(p)?)?),
        None => Ok(Catalog::bundled()?),
    }
}

fn describe(mismatch: &Mismatch) -> String {
    match mismatch {
        Mismatch::NotOnBoard => "not on the board".to_string(),
        Mismatch::Position {
            distance,
            tolerance,
        } => format!("{distance:.1} units from target (tolerance {tolerance})"),
        Mismatch::Rotation {
            diff_deg,
            tolerance,
        } => format!("rotated {diff_deg:.1}° off (tolerance {tolerance}°)"),
        Mismatch::Scale { expected, actual } => format!(
            "mirrored wrong: expected [{}, {}], got [{}, {}]",
            expected.x.factor(),
            expected.y.factor(),
            actual.x.factor(),
            actual.y.factor()
        ),
    }
}

fn print_report(shape_id: &str, report: &MatchReport) {
    for d in &report.diagnostics {
        let dist = d.distance.map_or("-".to_string(), |v| format!("{v:.1}"));
        let angle = d.angle_diff_deg.map_or("-".to_string(), |v| format!("{v:.1}"));
        let scale = match d.scale_ok {
            Some(true) => "ok",
            Some(false) => "flipped",
            None => "-",
        };
        println!(
            "  {:<18} on_board={:<5} dist={:>6} angle={:>6} scale={}",
            d.piece_id, d.on_board, dist, angle, scale
        );
    }
    match &report.result {
        MatchResult::Solved => println!("{shape_id}: solved"),
        MatchResult::Failed { piece_id, mismatch } => {
            println!("{shape_id}: not solved, {piece_id} is {}", describe(mismatch))
        }
        MatchResult::NoSolutionAvailable => {
            println!("{shape_id}: no solution template, cannot verify")
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let raw: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(a) => a,
        Err(msg) => {
            eprintln!("{msg}\n{USAGE}");
            std::process::exit(2);
        }
    };
    init_logging()?;

    let catalog = load_catalog(args.catalog.as_deref())?;
    if args.list {
        for s in catalog.shapes() {
            let mark = if s.has_solution() { "*" } else { " " };
            println!(
                "{mark} {:<12} {:<16} {:?}/{:?}",
                s.id, s.name, s.category, s.difficulty
            );
        }
        return Ok(());
    }

    let config = match args.config.as_deref() {
        Some(p) => GameConfig::from_json(&fs::read_to_string(p)?)?,
        None => GameConfig::default(),
    };
    let path = args.arrangement.as_deref().ok_or("missing arrangement file")?;
    let file: ArrangementFile = serde_json::from_str(&fs::read_to_string(path)?)?;
    let shape_id = args
        .shape
        .or(file.shape.clone())
        .unwrap_or_else(|| config.initial_shape.clone());
    let shape = catalog
        .shape(&shape_id)
        .ok_or_else(|| format!("unknown shape: {shape_id}"))?;
    log::info!("checking {} pieces against {}", file.pieces.len(), shape.id);

    let matcher = Matcher::new(config.tolerances, config.presence);
    let report = matcher.check_detailed(&file.states(), &shape.solution);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&shape.id, &report);
    }
    if !report.result.is_solved() {
        std::process::exit(1);
    }
    Ok(())
}
