//! Interactive dice-merge advisor.
//!
//! Commands (1-based cell indices):
//!   s <kind> <index> <pip>   spawn a die
//!   r <index>                remove a die
//!   m <src> <dest> <kind>    merge src onto dest, spawning <kind>
//!   e                        exit
//!
//! Illegal requests print a diagnostic and leave the board unchanged. After
//! every command the board, its DPS, and the recommended next action are
//! printed.

use std::io::{self, BufRead, Write};

use dicemerge::advisor::{recommend, AdvisorParams};
use dicemerge::board::Board;
use dicemerge::catalog::Catalog;
use dicemerge::context::GameContext;
use dicemerge::types::{Deck, DieKind};

struct Args {
    depth: usize,
    breadth: usize,
    gamma: f64,
    catalog: Option<String>,
    deck: String,
}

fn parse_args() -> Args {
    let argv: Vec<String> = std::env::args().collect();
    let defaults = AdvisorParams::default();
    let mut args = Args {
        depth: defaults.depth,
        breadth: defaults.breadth,
        gamma: defaults.gamma,
        catalog: None,
        deck: "c,j,o,g,m".to_string(),
    };

    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "--depth" => {
                i += 1;
                args.depth = parse_value(&argv, i, "--depth");
            }
            "--breadth" => {
                i += 1;
                args.breadth = parse_value(&argv, i, "--breadth");
            }
            "--gamma" => {
                i += 1;
                args.gamma = parse_value(&argv, i, "--gamma");
            }
            "--catalog" => {
                i += 1;
                args.catalog = argv.get(i).cloned();
            }
            "--deck" => {
                i += 1;
                if let Some(d) = argv.get(i) {
                    args.deck = d.clone();
                }
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!(
                    "Usage: advisor [--depth N] [--breadth N] [--gamma F] \
                     [--catalog FILE] [--deck c,j,o,g,m]"
                );
                std::process::exit(1);
            }
        }
        i += 1;
    }
    args
}

fn parse_value<T: std::str::FromStr>(argv: &[String], i: usize, flag: &str) -> T {
    argv.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
        eprintln!("Invalid value for {}", flag);
        std::process::exit(1);
    })
}

fn parse_deck(spec: &str) -> Result<Deck, String> {
    let kinds: Result<Vec<DieKind>, _> = spec.split(',').map(DieKind::from_token).collect();
    let kinds = kinds.map_err(|e| e.to_string())?;
    Deck::new(kinds).map_err(|e| e.to_string())
}

/// 1-based command index to 0-based cell index.
fn to_cell(token: &str) -> Option<usize> {
    token.parse::<usize>().ok().filter(|&i| i >= 1).map(|i| i - 1)
}

/// Apply one command line to the board. Returns (next board, keep running).
fn process_command(line: &str, board: Board) -> (Board, bool) {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(&cmd) = tokens.first() else {
        println!("Empty command received");
        return (board, true);
    };
    match (cmd.to_lowercase().as_str(), tokens.len()) {
        ("e", _) => {
            println!("Exit received");
            (board, false)
        }
        ("s", 4) => {
            let parsed = (
                DieKind::from_token(tokens[1]),
                to_cell(tokens[2]),
                tokens[3].parse::<u8>(),
            );
            match parsed {
                (Ok(kind), Some(cell), Ok(pip)) => match board.spawn(kind, cell, pip) {
                    Ok(next) => (next, true),
                    Err(e) => {
                        println!("{}", e);
                        (board, true)
                    }
                },
                _ => {
                    println!("Bad args for (S)pawn: {}", line);
                    (board, true)
                }
            }
        }
        ("s", n) => {
            println!("Wrong number of args for (S)pawn: {}", n);
            (board, true)
        }
        ("r", 2) => match to_cell(tokens[1]) {
            Some(cell) => match board.remove(cell) {
                Ok(next) => (next, true),
                Err(e) => {
                    println!("{}", e);
                    (board, true)
                }
            },
            None => {
                println!("Bad index for (R)emove: {}", tokens[1]);
                (board, true)
            }
        },
        ("r", n) => {
            println!("Wrong number of args for (R)emove: {}", n);
            (board, true)
        }
        ("m", 4) => {
            let parsed = (
                to_cell(tokens[1]),
                to_cell(tokens[2]),
                DieKind::from_token(tokens[3]),
            );
            match parsed {
                (Some(src), Some(dest), Ok(kind)) => match board.merge(src, dest, kind) {
                    Ok(next) => (next, true),
                    Err(e) => {
                        println!("{}", e);
                        (board, true)
                    }
                },
                _ => {
                    println!("Bad args for (M)erge: {}", line);
                    (board, true)
                }
            }
        }
        ("m", n) => {
            println!("Wrong number of args for (M)erge: {}", n);
            (board, true)
        }
        _ => {
            println!("Unknown command received");
            (board, true)
        }
    }
}

fn prompt(deck: &Deck) {
    println!("---- COMMANDS ----");
    println!("(S)pawn kind index pip");
    println!("(R)emove index");
    println!("(M)erge src dest new_kind");
    println!("(E)xit");
    println!("---- DECK ----");
    println!("{}", deck);
}

fn main() {
    let args = parse_args();

    let catalog = match &args.catalog {
        Some(path) => match Catalog::from_path(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load catalog {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => Catalog::builtin(),
    };
    let deck = match parse_deck(&args.deck) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Bad deck {:?}: {}", args.deck, e);
            std::process::exit(1);
        }
    };
    let ctx = match GameContext::new(catalog, deck.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to build session: {}", e);
            std::process::exit(1);
        }
    };
    let params = AdvisorParams {
        depth: args.depth,
        breadth: args.breadth,
        gamma: args.gamma,
    };

    let mut board = Board::empty(deck.clone());
    println!("Initialized empty board with deck {}", deck);
    print!("{}", board);
    println!("DPS: {}", ctx.score(&board));

    let stdin = io::stdin();
    loop {
        prompt(&deck);

        match recommend(&ctx, &board, &params) {
            Ok(Some(action)) => println!(
                "Optimal step with depth {} and breadth {}: {}",
                params.depth, params.breadth, action
            ),
            Ok(None) => println!("No optimal step here"),
            Err(e) => println!("No optimal step here ({})", e),
        }

        print!("Next command:\n> ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let (next, cont) = process_command(line.trim(), board);
        board = next;
        if !cont {
            println!("Bye!");
            break;
        }
        print!("{}", board);
        println!("DPS: {}", ctx.score(&board));
    }
}
