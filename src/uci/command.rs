//! UCI command parsing.

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    Position(Vec<String>),
    Go(GoParams),
    Perft(usize),
    SetOption { name: String, value: Option<String> },
    Stop,
    PonderHit,
    Quit,
    Unknown(String),
}

/// Arguments of a `go` command.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoParams {
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub movetime: Option<u64>,
    pub movestogo: Option<u64>,
    pub depth: Option<u32>,
    pub nodes: Option<u64>,
    pub ponder: bool,
    pub infinite: bool,
}

/// Parse the token after index `i` as a `T`.
#[inline]
fn parse_next<T: std::str::FromStr>(parts: &[&str], i: usize) -> Option<T> {
    parts.get(i + 1).and_then(|v| v.parse::<T>().ok())
}

fn parse_go_params(parts: &[&str]) -> GoParams {
    let mut params = GoParams::default();
    let mut i = 1;

    while i < parts.len() {
        let consumed = match parts[i] {
            "wtime" => {
                params.wtime = parse_next(parts, i);
                2
            }
            "btime" => {
                params.btime = parse_next(parts, i);
                2
            }
            "winc" => {
                params.winc = parse_next(parts, i);
                2
            }
            "binc" => {
                params.binc = parse_next(parts, i);
                2
            }
            "movetime" => {
                params.movetime = parse_next(parts, i);
                2
            }
            "movestogo" => {
                params.movestogo = parse_next(parts, i);
                2
            }
            "depth" => {
                params.depth = parse_next(parts, i);
                2
            }
            "nodes" => {
                params.nodes = parse_next(parts, i);
                2
            }
            "ponder" => {
                params.ponder = true;
                1
            }
            "infinite" => {
                params.infinite = true;
                1
            }
            _ => 1,
        };
        i += consumed;
    }
    params
}

/// Split a `setoption` line into name and value. Both can span several
/// tokens ("Move Overhead").
fn parse_setoption(parts: &[&str]) -> Option<(String, Option<String>)> {
    let mut name_parts: Vec<&str> = Vec::new();
    let mut value_parts: Vec<&str> = Vec::new();
    let mut mode = "";

    for part in parts.iter().skip(1) {
        match *part {
            "name" => mode = "name",
            "value" => mode = "value",
            _ => match mode {
                "name" => name_parts.push(part),
                "value" => value_parts.push(part),
                _ => {}
            },
        }
    }

    if name_parts.is_empty() {
        return None;
    }

    let value = if value_parts.is_empty() {
        None
    } else {
        Some(value_parts.join(" "))
    };
    Some((name_parts.join(" "), value))
}

/// Parse one input line; `None` for blank lines.
#[must_use]
pub fn parse_uci_command(line: &str) -> Option<UciCommand> {
    let trimmed = line.trim();
    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    let first = parts.first()?;

    let cmd = match *first {
        "uci" => UciCommand::Uci,
        "isready" => UciCommand::IsReady,
        "ucinewgame" => UciCommand::UciNewGame,
        "position" => UciCommand::Position(
            parts
                .iter()
                .skip(1)
                .map(|p| (*p).to_string())
                .collect(),
        ),
        "go" => UciCommand::Go(parse_go_params(&parts)),
        "perft" => {
            let depth = parts
                .get(1)
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(1);
            UciCommand::Perft(depth)
        }
        "setoption" => match parse_setoption(&parts) {
            Some((name, value)) => UciCommand::SetOption { name, value },
            None => UciCommand::Unknown(trimmed.to_string()),
        },
        "stop" => UciCommand::Stop,
        "ponderhit" => UciCommand::PonderHit,
        "quit" => UciCommand::Quit,
        _ => UciCommand::Unknown(trimmed.to_string()),
    };

    Some(cmd)
}
