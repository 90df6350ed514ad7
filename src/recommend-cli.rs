//! A simple CLI tool for ranking a group session offline.
//! This uses the server's own scoring implementation, and is by definition
//! compatible with the output of the session dump endpoint.

use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::BufReader;

use clap::{Arg, ArgAction, ArgMatches, Command};
use rocket::serde::json::serde_json;

use groupmenu_backend::model::{
    cache::participant_hash,
    recommendation::{compute_recommendations, RecommendationItem},
    session::GroupSession,
};

const PROGRAM_NAME: &str = "recommend-cli";

const ABOUT_TEXT: &str = "Rank the food categories for a group session.

EXIT CODES:
     0: Ranking printed.
 Other: Error.";

const DUMP_PATH: &str = "DUMP_PATH";

const DUMP_PATH_HELP: &str = "The path to a JSON dump of a session,\n\
as returned by `GET /sessions/<session_id>/dump`";

const JSON: &str = "json";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .arg(
            Arg::new(DUMP_PATH)
                .help(DUMP_PATH_HELP)
                .action(ArgAction::Set)
                .required(true),
        )
        .arg(
            Arg::new(JSON)
                .long(JSON)
                .help("Print the ranking as JSON, as the recommendations endpoint would")
                .action(ArgAction::SetTrue),
        )
}

/// Errors that this program may produce.
#[derive(Debug, Eq, PartialEq)]
enum Error {
    /// IO error described by the inner message.
    IO(String),
    /// Failed to decode the JSON dump.
    Format(String),
}

/// The ranking for one session.
#[derive(Debug, Eq, PartialEq)]
struct Ranking {
    title: String,
    completed: usize,
    total: usize,
    participant_hash: String,
    items: Vec<RecommendationItem>,
}

/// One line of the human-readable ranking.
struct FriendlyItem<'a>(usize, &'a RecommendationItem);

impl Display for FriendlyItem<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let FriendlyItem(rank, item) = self;
        write!(
            f,
            "{:>2}. {} {}: score {}, {} like{}, {} dislike{}, {}% satisfied",
            rank,
            item.category.emoji(),
            item.category.label(),
            item.score,
            item.like_count,
            if item.like_count != 1 { "s" } else { "" },
            item.dislike_count,
            if item.dislike_count != 1 { "s" } else { "" },
            item.satisfaction_rate,
        )
    }
}

/// Load a session dump and rank it.
fn rank(path: &str) -> Result<Ranking, Error> {
    // Load the file.
    let file = BufReader::new(File::open(path).map_err(|e| Error::IO(e.to_string()))?);
    let session: GroupSession =
        serde_json::from_reader(file).map_err(|e| Error::Format(e.to_string()))?;

    Ok(Ranking {
        title: session.title.clone(),
        completed: session.completed_count(),
        total: session.participants().len(),
        participant_hash: participant_hash(session.participants()).as_str().to_string(),
        items: compute_recommendations(session.participants()),
    })
}

/// Rank the dump, report the result, and return the exit code.
fn run(args: &ArgMatches) -> u8 {
    let path: &String = args.get_one(DUMP_PATH).unwrap(); // Required argument is guaranteed to be present.
    match rank(path) {
        Ok(ranking) if args.get_flag(JSON) => match serde_json::to_string_pretty(&ranking.items) {
            Ok(json) => {
                println!("{json}");
                0
            }
            Err(e) => {
                println!("Failed to encode ranking: {e}");
                1
            }
        },
        Ok(ranking) => {
            println!(
                "{}: {} of {} participant{} completed (state {})",
                ranking.title,
                ranking.completed,
                ranking.total,
                if ranking.total != 1 { "s" } else { "" },
                ranking.participant_hash,
            );
            for (i, item) in ranking.items.iter().enumerate() {
                println!("{}", FriendlyItem(i + 1, item));
            }
            0
        }
        Err(Error::IO(msg)) => {
            println!("IO error: {msg}");
            1
        }
        Err(Error::Format(msg)) => {
            println!("Invalid session dump: {msg}");
            1
        }
    }
}

fn main() {
    let args = cli().get_matches();
    let exit_code = run(&args);
    std::process::exit(exit_code.into())
}

#[cfg(test)]
mod tests {
    use groupmenu_backend::model::catalog::Category::*;

    use super::*;

    #[test]
    fn ranking() {
        // This test actually enters backend code, so enable logging.
        log4rs_test_utils::test_logging::init_logging_once_for(["groupmenu_backend"], None, None);

        let ranking = rank("example_dumps/session.json").unwrap();
        assert_eq!(ranking.title, "Friday lunch");
        assert_eq!((ranking.completed, ranking.total), (3, 4));
        assert_eq!(ranking.participant_hash.len(), 64);

        let order: Vec<_> = ranking.items.iter().map(|i| i.category).collect();
        assert_eq!(
            order,
            vec![Japanese, Asian, Cafe, Chinese, Etc, Western, Korean, Fast]
        );
        assert_eq!(ranking.items[6].score, 1);
        assert_eq!(ranking.items[6].satisfaction_rate, 57);
    }

    #[test]
    fn bad_dumps() {
        assert!(matches!(
            rank("example_dumps/session_malformed.json"),
            Err(Error::Format(_))
        ));
        assert!(matches!(rank("not a real file"), Err(Error::IO(_))));
    }

    #[test]
    fn friendly_output() {
        let item = RecommendationItem {
            category: Korean,
            score: 1,
            like_count: 2,
            dislike_count: 1,
            satisfaction_rate: 57,
        };
        assert_eq!(
            FriendlyItem(7, &item).to_string(),
            " 7. 🍚 Korean: score 1, 2 likes, 1 dislike, 57% satisfied"
        );
    }

    #[test]
    fn correct_cli_usage() {
        let command_line = [PROGRAM_NAME, "example_dumps/session.json"];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(run(&args), 0);

        let command_line = [PROGRAM_NAME, "--json", "example_dumps/session.json"];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(run(&args), 0);

        let command_line = [PROGRAM_NAME, "example_dumps/session_malformed.json"];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(run(&args), 1);

        let command_line = [PROGRAM_NAME, "not a real file"];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(run(&args), 1);
    }

    #[test]
    fn bad_cli_usage() {
        // Something very wrong.
        let command_line = [PROGRAM_NAME, "this", "invocation", "is", "incorrect"];
        cli().try_get_matches_from(command_line).unwrap_err();

        // No options at all.
        let command_line = [PROGRAM_NAME];
        cli().try_get_matches_from(command_line).unwrap_err();
    }
}
