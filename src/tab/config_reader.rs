use crate::tab::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use std::collections::BTreeMap;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction")]
    pub contest_juridiction: Option<String>,
    #[serde(rename = "contestOffice")]
    pub contest_office: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
    pub office: Option<String>,
    pub seats: u32,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "firstVoteColumnIndex")]
    _first_vote_column_index: Option<JSValue>,
    #[serde(rename = "firstVoteRowIndex")]
    _first_vote_row_index: Option<JSValue>,
    #[serde(rename = "idColumnIndex")]
    pub id_column_index: Option<JSValue>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

impl FileSource {
    /// A source for a file given on the command line. The layout of the file is
    /// taken from `template` if provided.
    pub fn from_input(
        path: &str,
        provider: &str,
        excel_worksheet_name: Option<String>,
        template: Option<&FileSource>,
    ) -> FileSource {
        FileSource {
            provider: provider.to_string(),
            file_path: path.to_string(),
            _first_vote_column_index: template.and_then(|t| t._first_vote_column_index.clone()),
            _first_vote_row_index: template.and_then(|t| t._first_vote_row_index.clone()),
            id_column_index: template.and_then(|t| t.id_column_index.clone()),
            excel_worksheet_name: excel_worksheet_name
                .or_else(|| template.and_then(|t| t.excel_worksheet_name.clone())),
        }
    }

    /// The first column with votes, starting at 0. Defaults to the first column.
    pub fn first_vote_column_index(&self) -> TabResult<usize> {
        let x = read_js_int_or(&self._first_vote_column_index, 1)?;
        Ok(x - 1)
    }

    /// The first row with a ballot, starting at 0. The header is the row right
    /// before it. Defaults to the second row.
    pub fn first_vote_row_index(&self) -> TabResult<usize> {
        let x = read_js_int_or(&self._first_vote_row_index, 2)?;
        if x < 2 {
            whatever!("firstVoteRowIndex must leave room for a header row, got {}", x)
        }
        Ok(x - 1)
    }

    pub fn id_column_index_int(&self) -> TabResult<Option<usize>> {
        if self.id_column_index.is_some() {
            read_js_int(&self.id_column_index).map(|x| Some(x - 1))
        } else {
            Ok(None)
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OptionConfig {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct VoteConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub vote_type: String,
    pub seats: Option<u32>,
    #[serde(rename = "minRating")]
    pub min_rating: Option<i64>,
    #[serde(rename = "maxRating")]
    pub max_rating: Option<i64>,
    pub options: Vec<OptionConfig>,
    pub resigned: Option<Vec<String>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BallotConfig {
    pub id: Option<String>,
    #[serde(rename = "selectedOptionId")]
    pub selected_option_id: Option<String>,
    #[serde(rename = "ratingPerOption")]
    pub rating_per_option: Option<BTreeMap<String, i64>>,
}

impl BallotConfig {
    pub fn to_ballot(&self, idx: usize) -> TabResult<Ballot> {
        match (&self.selected_option_id, &self.rating_per_option) {
            (Some(selected), None) => Ok(Ballot::Plurality {
                selected: selected.clone(),
            }),
            (None, Some(ratings)) => Ok(Ballot::Score {
                ratings: ratings.clone(),
            }),
            _ => InvalidBallotSnafu {
                ballot: self.id.clone().unwrap_or_else(|| format!("#{}", idx + 1)),
            }
            .fail(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ElectionConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    pub vote: VoteConfig,
    #[serde(rename = "ballotSources")]
    pub ballot_sources: Option<Vec<FileSource>>,
    pub ballots: Option<Vec<BallotConfig>>,
}

pub fn read_summary(path: String) -> TabResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    debug!("read content: {:?}", contents);
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn read_js_int(x: &Option<JSValue>) -> TabResult<usize> {
    match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .filter(|x| *x >= 1)
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {}),
        Some(JSValue::String(s)) => s
            .parse::<usize>()
            .ok()
            .filter(|x| *x >= 1)
            .context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}

fn read_js_int_or(x: &Option<JSValue>, default: usize) -> TabResult<usize> {
    match x {
        None | Some(JSValue::Null) => Ok(default),
        _ => read_js_int(x),
    }
}
