//! Interactive input-file picker.
//!
//! Used when `-f` is omitted and stdin is a terminal. CSV files under the
//! working directory are listed with a preview of their columns, so plates can
//! be told apart before anything is fitted:
//!
//! ```text
//!   1) runs/plate_a.csv    time | R1, R2, R3
//!   2) runs/notes.csv      (not a growth table: CSV needs a time column ...)
//! ```

use std::fs::{self, File};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::io::ingest::read_column_names;

const SEARCH_DEPTH: usize = 4;

/// Directories never worth descending into.
const SKIPPED_DIRS: [&str; 4] = [".git", "target", "node_modules", "growth_plots"];

/// Replicate names shown per file before eliding the rest.
const PREVIEW_COLUMNS: usize = 6;

/// One discovered CSV file and what its header says.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvCandidate {
    pub path: PathBuf,
    /// `Ok(columns)` (time label first) or why the header is unusable.
    pub columns: Result<Vec<String>, String>,
}

impl CsvCandidate {
    fn inspect(path: PathBuf) -> Self {
        let columns = File::open(&path)
            .map_err(|e| e.to_string())
            .and_then(|f| read_column_names(f).map_err(|e| e.to_string()));
        Self { path, columns }
    }

    pub fn is_growth_table(&self) -> bool {
        self.columns.is_ok()
    }

    /// `time | R1, R2, ...` or the reason the file cannot be analysed.
    pub fn preview(&self) -> String {
        match &self.columns {
            Ok(cols) => {
                let reps = &cols[1..];
                let mut shown = reps.iter().take(PREVIEW_COLUMNS).cloned().collect::<Vec<_>>().join(", ");
                if reps.len() > PREVIEW_COLUMNS {
                    shown.push_str(&format!(", ... (+{})", reps.len() - PREVIEW_COLUMNS));
                }
                format!("{} | {shown}", cols[0])
            }
            Err(reason) => format!("(not a growth table: {reason})"),
        }
    }
}

/// Use `file` when given, otherwise ask interactively (only when stdin is a terminal).
pub fn resolve_csv_path(file: Option<&Path>) -> Result<PathBuf, AppError> {
    match file {
        Some(path) => validate_csv_path(path),
        None if io::stdin().is_terminal() => {
            let stdin = io::stdin();
            pick_csv(&discover_csv_files(Path::new(".")), &mut stdin.lock(), &mut io::stdout())
        }
        None => Err(AppError::new(
            2,
            "No input CSV given. Provide one with `growth fit -f <file.csv>`.",
        )),
    }
}

/// Check that `path` is an existing `.csv` file.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::new(2, format!("CSV file not found: {}", path.display())));
    }
    if path.is_dir() {
        return Err(AppError::new(
            2,
            format!("Expected a file, got a directory: {}", path.display()),
        ));
    }
    if !has_csv_extension(path) {
        return Err(AppError::new(
            2,
            format!("Expected a .csv file (got: {}).", path.display()),
        ));
    }
    Ok(path.to_path_buf())
}

/// Every `*.csv` under `root` (bounded depth), sorted by path, with column previews.
pub fn discover_csv_files(root: &Path) -> Vec<CsvCandidate> {
    let mut paths = Vec::new();
    let mut pending = vec![(root.to_path_buf(), 0usize)];

    while let Some((dir, depth)) = pending.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(kind) = entry.file_type() else {
                continue;
            };
            if kind.is_dir() {
                let skipped = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| SKIPPED_DIRS.contains(&n));
                if depth < SEARCH_DEPTH && !skipped {
                    pending.push((path, depth + 1));
                }
            } else if kind.is_file() && has_csv_extension(&path) {
                paths.push(path);
            }
        }
    }

    paths.sort();
    paths.into_iter().map(CsvCandidate::inspect).collect()
}

/// Show `candidates` and read a choice: a list number, a path, or `q`.
///
/// Files whose header is unusable are listed but cannot be chosen by number.
pub fn pick_csv<R: BufRead, W: Write>(
    candidates: &[CsvCandidate],
    input: &mut R,
    out: &mut W,
) -> Result<PathBuf, AppError> {
    let io_err = |e: io::Error| AppError::new(2, format!("Terminal I/O failed: {e}"));

    if candidates.is_empty() {
        return Err(AppError::new(
            2,
            "No .csv files found. Provide one with `growth fit -f <file.csv>`.",
        ));
    }

    let width = candidates.iter().map(|c| display_path(&c.path).len()).max().unwrap_or(0);
    writeln!(out, "Found {} CSV file(s):", candidates.len()).map_err(io_err)?;
    for (i, c) in candidates.iter().enumerate() {
        writeln!(out, "{:>3}) {:<width$}  {}", i + 1, display_path(&c.path), c.preview()).map_err(io_err)?;
    }

    loop {
        write!(out, "File number (1-{}), a path, or q: ", candidates.len()).map_err(io_err)?;
        out.flush().map_err(io_err)?;

        let mut line = String::new();
        if input.read_line(&mut line).map_err(io_err)? == 0 {
            return Err(AppError::new(
                2,
                "No input received. Provide a CSV path with `growth fit -f <file.csv>`.",
            ));
        }
        let answer = line.trim();

        if answer.eq_ignore_ascii_case("q") {
            return Err(AppError::new(2, "Canceled."));
        }

        let chosen = match answer.parse::<usize>() {
            Ok(n) => match candidates.get(n.wrapping_sub(1)) {
                Some(c) if c.is_growth_table() => validate_csv_path(&c.path),
                Some(c) => Err(AppError::new(2, c.preview())),
                None => Err(AppError::new(2, format!("No file number {n}."))),
            },
            Err(_) => validate_csv_path(Path::new(answer)),
        };

        match chosen {
            Ok(path) => return Ok(path),
            Err(err) => writeln!(out, "{err}").map_err(io_err)?,
        }
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn display_path(path: &Path) -> String {
    path.strip_prefix("./").unwrap_or(path).display().to_string()
}
