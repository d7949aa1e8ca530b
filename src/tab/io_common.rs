use std::path::Path;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Identifiers for the ballots that do not have one in the file.
pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

/// Pairs the label of each column with the content of the cell.
pub fn label_cells(labels: &[String], cells: Vec<String>) -> Vec<(String, String)> {
    labels.iter().cloned().zip(cells).collect()
}
