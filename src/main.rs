mod logging;
mod shell;

use rand::SeedableRng;
use rand::rngs::StdRng;
use skill_trials::clock::SystemClock;
use skill_trials::games;
use skill_trials::session::{Lineup, Session};
use std::env;
use std::path::PathBuf;
use std::rc::Rc;

fn main()
{
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String>
{
    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("list") => {
            list_games();
            Ok(())
        }
        Some("-h") | Some("--help") => {
            print_help();
            Ok(())
        }
        _ => play(&args),
    }
}

#[derive(Debug, Default, PartialEq)]
struct PlayConfig
{
    seed: Option<u64>,
    lineup: Lineup,
    log_path: Option<PathBuf>,
}

impl PlayConfig
{
    fn from_args(args: &[String]) -> Result<Self, String>
    {
        let mut config = Self::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let (key, inline) = match arg.split_once('=') {
                Some((key, value)) => (key, Some(value.to_string())),
                None => (arg.as_str(), None),
            };
            let mut value = || {
                inline
                    .clone()
                    .or_else(|| iter.next().cloned())
                    .ok_or_else(|| format!("Missing value for {key}"))
            };
            match key {
                "--seed" => {
                    let raw = value()?;
                    let seed = raw
                        .parse::<u64>()
                        .map_err(|_| format!("Invalid seed '{raw}'"))?;
                    config.seed = Some(seed);
                }
                "--games" => {
                    config.lineup = Lineup::parse(&value()?).map_err(|err| err.to_string())?;
                }
                "--log" => {
                    config.log_path = Some(PathBuf::from(value()?));
                }
                other => return Err(format!("Unknown option '{other}'. Run with --help.")),
            }
        }
        Ok(config)
    }
}

fn play(args: &[String]) -> Result<(), String>
{
    let config = PlayConfig::from_args(args)?;
    logging::init_tracing(config.log_path.as_deref())?;

    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    tracing::info!(seed = ?config.seed, lineup = ?config.lineup.games(), "starting session");
    let mut session = Session::new(Rc::new(SystemClock::new()), rng, config.lineup);
    shell::run(&mut session)
}

fn list_games()
{
    println!("Available games:");
    for game in games::registry() {
        println!("  {:<10} {:<14} - {}", game.id.key(), game.name, game.tagline);
    }
}

fn print_help()
{
    println!("skill-trials");
    println!("\nUsage:");
    println!("  skill-trials [--seed=N] [--games=a,b,c,d,e] [--log=PATH]");
    println!("  skill-trials list");
    println!("\nNotes:");
    println!("  A run plays five distinct games in random order; win three to unlock the message.");
    println!("  --games picks the five games (default: reaction,typing,memory,aim,timing).");
    println!("  Logs go to --log only; set RUST_LOG to change the level.");
}
