use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use vote_tally::builder::Builder;
use vote_tally::*;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::tab::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;

#[derive(Debug, Snafu)]
pub enum TabError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The Excel file has no worksheet to read"))]
    EmptyExcel {},
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a positive integer"))]
    ParsingJsonNumber {},
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Error opening CSV file"))]
    CsvOpen { source: csv::Error },
    #[snafu(display("Error reading CSV line"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("The file has no header row"))]
    MissingHeader {},
    #[snafu(display("Line {lineno} is too short"))]
    LineTooShort { lineno: usize },
    #[snafu(display("Ballot {ballot}: {value:?} is not a valid rating for option {option}"))]
    InvalidRating {
        ballot: String,
        option: String,
        value: String,
    },
    #[snafu(display("Ballot {ballot}: expected selectedOptionId or ratingPerOption"))]
    InvalidBallot { ballot: String },
    #[snafu(display("Voting error"))]
    Voting { source: VotingErrors },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type TabResult<T> = Result<T, TabError>;

/// A ballot, as parsed by the readers.
/// This is before checking the options and the ratings.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub id: Option<String>,
    /// The label of each column and the content of the cell, in column order.
    pub choices: Vec<(String, String)>,
}

fn seat_stats_to_json(stats: &[SeatStats]) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for seat_stat in stats.iter() {
        let mut tally: JSMap<String, JSValue> = JSMap::new();
        for (name, score) in seat_stat.tally.iter() {
            tally.insert(name.clone(), json!(score));
        }
        l.push(json!({
            "seat": seat_stat.seat,
            "tally": tally,
            "elected": seat_stat.elected
        }));
    }
    l
}

fn result_stats_to_json(rs: &TallyResult) -> JSValue {
    let resignations: Vec<JSValue> = rs
        .resignations
        .iter()
        .map(|r| {
            json!({
                "resigned": r.resigned,
                "held": r.held,
                "seats": seat_stats_to_json(&r.seat_stats),
                "winners": r.winners
            })
        })
        .collect();
    json!({
        "winners": rs.winners,
        "seats": seat_stats_to_json(&rs.seat_stats),
        "resignations": resignations
    })
}

fn build_summary_js(
    config: &ElectionConfig,
    method: &TallyMethod,
    rs: &TallyResult,
    ranking: Option<&Vec<String>>,
) -> JSValue {
    let c = OutputConfig {
        contest: config.output_settings.contest_name.clone(),
        date: config.output_settings.contest_date.clone(),
        jurisdiction: config.output_settings.contest_juridiction.clone(),
        office: config.output_settings.contest_office.clone(),
        seats: method.seats(),
    };
    let mut summary: JSMap<String, JSValue> = JSMap::new();
    summary.insert("config".to_string(), json!(c));
    summary.insert("results".to_string(), result_stats_to_json(rs));
    if let Some(r) = ranking {
        summary.insert("ranking".to_string(), json!(r));
    }
    JSValue::Object(summary)
}

fn validate_method(vote: &VoteConfig) -> TabResult<TallyMethod> {
    let seats = vote.seats.unwrap_or(1);
    let res = match vote.vote_type.as_str() {
        "plurality" | "first-past-the-post" => TallyMethod::Plurality { seats },
        "spsv" | "proportional-score" => TallyMethod::ProportionalScore {
            seats,
            min_rating: vote.min_rating.unwrap_or(0),
            max_rating: vote.max_rating.unwrap_or(5),
        },
        x => {
            whatever!("Cannot use vote type {:?}: currently not implemented", x)
        }
    };
    Ok(res)
}

// Converts the parsed ballots according to the counting method.
fn validate_ballots(
    parsed_ballots: &[ParsedBallot],
    method: &TallyMethod,
) -> TabResult<Vec<Ballot>> {
    let mut res: Vec<Ballot> = Vec::new();
    for (idx, pb) in parsed_ballots.iter().enumerate() {
        let ballot_id = pb.id.clone().unwrap_or_else(|| format!("#{}", idx + 1));
        debug!("Choices for ballot {:?}: {:?}", ballot_id, pb.choices);
        let ballot = match method {
            TallyMethod::Plurality { .. } => {
                let selected = pb
                    .choices
                    .iter()
                    .map(|(_, cell)| cell)
                    .find(|cell| !cell.is_empty());
                match selected {
                    Some(s) => Ballot::Plurality {
                        selected: s.clone(),
                    },
                    None => {
                        warn!("validate_ballots: ballot {}: no selection, skipping", ballot_id);
                        continue;
                    }
                }
            }
            TallyMethod::ProportionalScore { .. } => {
                let mut ratings = std::collections::BTreeMap::new();
                for (option, cell) in pb.choices.iter().filter(|(_, cell)| !cell.is_empty()) {
                    let rating = cell.parse::<i64>().ok().context(InvalidRatingSnafu {
                        ballot: ballot_id.clone(),
                        option: option.clone(),
                        value: cell.clone(),
                    })?;
                    ratings.insert(option.clone(), rating);
                }
                Ballot::Score { ratings }
            }
        };
        res.push(ballot);
    }
    Ok(res)
}

fn read_ballot_data(path: &str, cfs: &FileSource, method: &TallyMethod) -> TabResult<Vec<Ballot>> {
    info!("Attempting to read ballot file {:?}", path);
    let parsed_ballots = match cfs.provider.as_str() {
        "json" => return read_json_ballots(path),
        "csv" => io_csv::read_csv_ballots(path, cfs)?,
        "xlsx" | "excel" => io_excel::read_excel_ballots(path, cfs)?,
        x => whatever!("Provider not implemented {:?}", x),
    };
    validate_ballots(&parsed_ballots, method)
}

fn read_json_ballots(path: &str) -> TabResult<Vec<Ballot>> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let ballots: Vec<BallotConfig> =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    ballots
        .iter()
        .enumerate()
        .map(|(idx, b)| b.to_ballot(idx))
        .collect()
}

// The files that contain the ballots, with their full paths.
fn ballot_sources(
    args: &Args,
    config: &ElectionConfig,
    root_p: &Path,
) -> TabResult<Vec<(String, FileSource)>> {
    if let Some(input) = &args.input {
        let provider = args.input_type.clone().unwrap_or_else(|| "json".to_string());
        let template = config.ballot_sources.as_ref().and_then(|s| s.first());
        let cfs = FileSource::from_input(
            input,
            &provider,
            args.excel_worksheet_name.clone(),
            template,
        );
        return Ok(vec![(input.clone(), cfs)]);
    }
    let mut res: Vec<(String, FileSource)> = Vec::new();
    for cfs in config.ballot_sources.clone().unwrap_or_default() {
        let p: PathBuf = [root_p, Path::new(&cfs.file_path)].iter().collect();
        res.push((p.as_path().display().to_string(), cfs));
    }
    Ok(res)
}

fn write_summary(
    args: &Args,
    config: &ElectionConfig,
    root_p: &Path,
    pretty_js_stats: &str,
) -> TabResult<()> {
    let out_path: Option<String> = match (&args.out, &config.output_settings.output_directory) {
        (Some(out), _) if out == "stdout" => None,
        (Some(out), _) => Some(out.clone()),
        (None, Some(dir)) => {
            let p: PathBuf = [
                root_p,
                Path::new(dir),
                Path::new(&format!("{}_summary.json", config.vote.id)),
            ]
            .iter()
            .collect();
            Some(p.as_path().display().to_string())
        }
        (None, None) => None,
    };
    match out_path {
        Some(path) => {
            info!("Writing summary to {:?}", path);
            fs::write(&path, pretty_js_stats).context(WritingOutputSnafu { path })
        }
        None => {
            println!("{}", pretty_js_stats);
            Ok(())
        }
    }
}

pub fn run_election(args: &Args) -> TabResult<()> {
    let config_path = args.config.clone();
    let config_p = Path::new(config_path.as_str());
    let config_str = fs::read_to_string(config_path.clone()).context(OpeningJsonSnafu {
        path: config_path.clone(),
    })?;
    let config: ElectionConfig = serde_json::from_str(&config_str).context(ParsingJsonSnafu {})?;
    info!("config: {:?}", config);

    // Validate the rules:
    let method = validate_method(&config.vote)?;

    let mut builder = Builder::new(&config.vote.id, &method).context(VotingSnafu {})?;
    for o in config.vote.options.iter() {
        builder
            .add_option(&VoteOption {
                id: o.id.clone(),
                name: o.name.clone(),
                description: o.description.clone(),
            })
            .context(VotingSnafu {})?;
    }
    for r in config.vote.resigned.clone().unwrap_or_default() {
        builder.resign(&r).context(VotingSnafu {})?;
    }

    for (idx, b) in config.ballots.clone().unwrap_or_default().iter().enumerate() {
        builder.add_ballot(&b.to_ballot(idx)?).context(VotingSnafu {})?;
    }

    let root_p = config_p.parent().context(MissingParentDirSnafu {})?;
    let sources = ballot_sources(args, &config, root_p)?;
    if sources.is_empty() && config.ballots.is_none() {
        warn!("No ballot source and no ballot in the configuration");
    }
    for (path, cfs) in sources.iter() {
        for ballot in read_ballot_data(path, cfs, &method)? {
            builder.add_ballot(&ballot).context(VotingSnafu {})?;
        }
    }
    info!("Read {} ballots", builder.ballots().len());

    let result = builder.tally_stats().context(VotingSnafu {})?;
    for (idx, winner) in result.winners.iter().enumerate() {
        info!("Seat {}: {}", idx + 1, winner);
    }
    let ranking = if args.rank {
        Some(builder.rank().context(VotingSnafu {})?)
    } else {
        None
    };

    // Assemble the final json
    let result_js = build_summary_js(&config, &method, &result, ranking.as_ref());
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    write_summary(args, &config, root_p, &pretty_js_stats)?;

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        let summary_ref = read_summary(summary_p.clone())?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}
