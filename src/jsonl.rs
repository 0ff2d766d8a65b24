//! Line-delimited JSON files, gzip-compressed when the path ends in `.gz`.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::{Compression, read::MultiGzDecoder, write::GzEncoder};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    core::domain::{Problem, ProblemSet, Sample},
    error::EvalError,
};

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Expands a leading `~/` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> EvalError + '_ {
    move |source| EvalError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Parses records lazily, skipping blank lines.
pub fn stream_jsonl<T: DeserializeOwned>(
    path: &Path,
) -> Result<impl Iterator<Item = Result<T, EvalError>>, EvalError> {
    let path = expand_home(path);
    let file = File::open(&path).map_err(io_error(&path))?;
    let reader: Box<dyn BufRead> = if is_gzip(&path) {
        // Multi-member so files written in append mode stay readable.
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    Ok(reader
        .lines()
        .enumerate()
        .filter_map(move |(idx, line)| {
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(io_error(&path)(e))),
            };
            if line.trim().is_empty() {
                return None;
            }
            Some(
                serde_json::from_str(&line).map_err(|source| EvalError::Json {
                    path: path.clone(),
                    line: idx + 1,
                    source,
                }),
            )
        }))
}

pub fn read_problems(path: &Path) -> Result<ProblemSet, EvalError> {
    let problems = stream_jsonl::<Problem>(path)?.collect::<Result<Vec<_>, _>>()?;
    tracing::info!("Loaded {} problems from {}", problems.len(), path.display());
    ProblemSet::new(problems)
}

pub fn read_samples(path: &Path) -> Result<Vec<Sample>, EvalError> {
    stream_jsonl::<Sample>(path)?.collect()
}

enum Sink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

/// Streams records to a file, one JSON document per line.
pub struct JsonlWriter {
    path: PathBuf,
    sink: Sink,
    written: usize,
}

impl JsonlWriter {
    pub fn create(path: &Path, append: bool) -> Result<Self, EvalError> {
        let path = expand_home(path);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(&path)
            .map_err(io_error(&path))?;
        let file = BufWriter::new(file);
        let sink = if is_gzip(&path) {
            Sink::Gzip(GzEncoder::new(file, Compression::default()))
        } else {
            Sink::Plain(file)
        };

        Ok(Self {
            path,
            sink,
            written: 0,
        })
    }

    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<(), EvalError> {
        let mut line = serde_json::to_vec(record).map_err(|source| EvalError::Json {
            path: self.path.clone(),
            line: self.written + 1,
            source,
        })?;
        line.push(b'\n');

        let result = match &mut self.sink {
            Sink::Plain(w) => w.write_all(&line),
            Sink::Gzip(w) => w.write_all(&line),
        };
        result.map_err(io_error(&self.path))?;
        self.written += 1;
        Ok(())
    }

    /// Flushes buffers and writes the gzip trailer. Returns the record count.
    pub fn finish(self) -> Result<usize, EvalError> {
        let result = match self.sink {
            Sink::Plain(mut w) => w.flush(),
            Sink::Gzip(w) => w.finish().and_then(|mut inner| inner.flush()),
        };
        result.map_err(io_error(&self.path))?;
        Ok(self.written)
    }
}

pub fn write_jsonl<T, I>(path: &Path, records: I, append: bool) -> Result<usize, EvalError>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = JsonlWriter::create(path, append)?;
    for record in records {
        writer.write(&record)?;
    }
    writer.finish()
}
