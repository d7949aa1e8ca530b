// Primitives for reading CSV files.

use std::fs::File;

use crate::tab::{
    io_common::{label_cells, make_default_id},
    *,
};

pub fn read_csv_ballots(path: &str, cfs: &FileSource) -> TabResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(path);

    let id_idx_o = cfs.id_column_index_int()?;
    let choices_start_col = cfs.first_vote_column_index()?;

    let mut res: Vec<ParsedBallot> = Vec::new();
    let (header, records, row_offset) = get_records(path, cfs)?;
    let labels: Vec<String> = header
        .iter()
        .skip(choices_start_col)
        .map(|s| s.trim().to_string())
        .collect();
    debug!("read_csv_ballots: labels: {:?}", labels);

    for (idx, line_r) in records.enumerate() {
        let lineno = idx + row_offset + 1;
        let line = line_r.context(CsvLineParseSnafu {})?;
        debug!("{:?} {:?}", lineno, line);
        let id = if let Some(id_idx) = id_idx_o {
            line.get(id_idx)
                .context(LineTooShortSnafu { lineno })?
                .to_string()
        } else {
            default_id(lineno)
        };

        let cells: Vec<String> = line
            .iter()
            .skip(choices_start_col)
            .map(|s| s.trim().to_string())
            .collect();
        res.push(ParsedBallot {
            id: Some(id),
            choices: label_cells(&labels, cells),
        });
    }
    Ok(res)
}

// Returns the header, the ballot lines and the index of the first ballot line.
fn get_records(
    path: &str,
    cfs: &FileSource,
) -> TabResult<(csv::StringRecord, csv::StringRecordsIntoIter<File>, usize)> {
    let first_row = cfs.first_vote_row_index()?;
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu {})?;
    let mut records = rdr.into_records();
    // The header is the row right before the first ballot.
    for _ in 1..first_row {
        _ = records.next();
    }
    let header = records
        .next()
        .context(MissingHeaderSnafu {})?
        .context(CsvLineParseSnafu {})?;
    Ok((header, records, first_row))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_tmp(name: &str, contents: &str) -> String {
        let p = std::env::temp_dir().join(name);
        fs::write(&p, contents).unwrap();
        p.display().to_string()
    }

    fn source(js: JSValue) -> FileSource {
        serde_json::from_value(js).unwrap()
    }

    #[test]
    fn reads_ratings_with_header() {
        let path = write_tmp(
            "votetab_reads_ratings_with_header.csv",
            "id,alice,bob\nb1,5,\nb2, 1 ,3\n",
        );
        let cfs = source(json!({
            "provider": "csv",
            "filePath": path,
            "idColumnIndex": 1,
            "firstVoteColumnIndex": 2
        }));
        let pbs = read_csv_ballots(&path, &cfs).unwrap();
        assert_eq!(pbs.len(), 2);
        assert_eq!(pbs[0].id, Some("b1".to_string()));
        assert_eq!(
            pbs[0].choices,
            vec![
                ("alice".to_string(), "5".to_string()),
                ("bob".to_string(), "".to_string())
            ]
        );
        assert_eq!(pbs[1].choices[0], ("alice".to_string(), "1".to_string()));
    }

    #[test]
    fn skips_rows_before_header() {
        let path = write_tmp(
            "votetab_skips_rows_before_header.csv",
            "Moderator election\nchoice\nalice\ncarol\n",
        );
        let cfs = source(json!({
            "provider": "csv",
            "filePath": path,
            "firstVoteRowIndex": 3
        }));
        let pbs = read_csv_ballots(&path, &cfs).unwrap();
        assert_eq!(pbs.len(), 2);
        assert_eq!(pbs[1].choices, vec![("choice".to_string(), "carol".to_string())]);
        // Lines are numbered from the top of the file.
        assert_eq!(
            pbs[1].id,
            Some("votetab_skips_rows_before_header.csv-00000004".to_string())
        );
    }

    #[test]
    fn missing_id_cell() {
        let path = write_tmp("votetab_missing_id_cell.csv", "alice,bob,id\n5,3,b1\n4,2\n");
        let cfs = source(json!({
            "provider": "csv",
            "filePath": path,
            "idColumnIndex": 3
        }));
        assert!(matches!(
            read_csv_ballots(&path, &cfs),
            Err(TabError::LineTooShort { lineno: 3 })
        ));
    }
}
