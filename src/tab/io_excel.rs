// Primitives for reading Excel files.

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::tab::{
    io_common::{label_cells, make_default_id},
    *,
};

pub fn read_excel_ballots(path: &str, cfs: &FileSource) -> TabResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(path);
    let id_idx_o = cfs.id_column_index_int()?;
    let choices_start_col = cfs.first_vote_column_index()?;
    let first_row = cfs.first_vote_row_index()?;

    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match &cfs.excel_worksheet_name {
        Some(name) => workbook.worksheet_range(name),
        None => workbook.worksheet_range_at(0),
    }
    .context(EmptyExcelSnafu {})?
    .context(OpeningExcelSnafu { path })?;

    let mut iter = wrange.rows();
    // The header is the row right before the first ballot.
    for _ in 1..first_row {
        _ = iter.next();
    }
    let header = iter.next().context(MissingHeaderSnafu {})?;
    let mut labels: Vec<String> = Vec::new();
    for cell in header.iter().skip(choices_start_col) {
        labels.push(read_cell(cell)?);
    }
    debug!("read_excel_ballots: labels: {:?}", labels);

    let mut res: Vec<ParsedBallot> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let lineno = idx + first_row + 1;
        debug!("read_excel_ballots: {:?} {:?}", lineno, row);
        let id = if let Some(id_idx) = id_idx_o {
            read_cell(row.get(id_idx).context(LineTooShortSnafu { lineno })?)?
        } else {
            default_id(lineno)
        };
        let mut cells: Vec<String> = Vec::new();
        for cell in row.iter().skip(choices_start_col) {
            cells.push(read_cell(cell)?);
        }
        res.push(ParsedBallot {
            id: Some(id),
            choices: label_cells(&labels, cells),
        });
    }
    Ok(res)
}

// Ratings are often stored as floating point numbers by spreadsheets.
fn read_cell(cell: &DataType) -> TabResult<String> {
    match cell {
        DataType::String(s) => Ok(s.trim().to_string()),
        DataType::Empty => Ok("".to_string()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Float(f) if f.fract() == 0.0 => Ok(format!("{}", *f as i64)),
        DataType::Float(f) => Ok(f.to_string()),
        _ => whatever!("read_cell: could not understand cell {:?}", cell),
    }
}
