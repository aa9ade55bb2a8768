//! Sparse samples file, one sample per line: `<label ordinal> <index>:<value> ...`.
//!
//! Indices are 1-based and refer to the feature schema; absent indices are 0.
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::{ClassifierError, Result};
use crate::labels::ClassLabel;
use crate::sample::TrainingSample;

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(b' ')
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'));
    builder
}

/// Read samples whose vectors have `dimensions` features.
pub fn read_samples<L, P>(path: P, dimensions: usize) -> Result<Vec<TrainingSample<L>>>
where
    L: ClassLabel,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ClassifierError::io(path, e))?;
    let mut reader = reader_builder().from_reader(BufReader::new(file));

    let mut samples = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| ClassifierError::corpus(path, e.to_string()))?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(row_idx + 1);
        let fail = |reason: String| ClassifierError::corpus(path, format!("line {}: {}", line, reason));

        let mut fields = record.iter().map(str::trim).filter(|f| !f.is_empty());
        let label_field = match fields.next() {
            Some(field) => field,
            None => continue,
        };
        let ordinal: usize = label_field
            .parse()
            .map_err(|_| fail(format!("invalid label '{}'", label_field)))?;
        let label = L::from_ordinal(ordinal)
            .ok_or_else(|| fail(format!("{} is not a {} label ordinal", ordinal, L::TAXONOMY)))?;

        let mut features = vec![0.0; dimensions];
        for field in fields {
            let (index, value) = field
                .split_once(':')
                .ok_or_else(|| fail(format!("expected <index>:<value>, got '{}'", field)))?;
            let index: usize = index
                .parse()
                .map_err(|_| fail(format!("invalid feature index '{}'", index)))?;
            if index == 0 || index > dimensions {
                return Err(fail(format!(
                    "feature index {} outside 1..={}",
                    index, dimensions
                )));
            }
            features[index - 1] = value
                .parse()
                .map_err(|_| fail(format!("invalid feature value '{}'", value)))?;
        }
        samples.push(TrainingSample::new(features, label));
    }

    log::info!(
        "[ZoneClassifier::Samples] Read {} samples from {}",
        samples.len(),
        path.display()
    );
    Ok(samples)
}

/// Write samples, omitting zero-valued features.
pub fn write_samples<'a, L, P, I>(path: P, samples: I) -> Result<()>
where
    L: ClassLabel,
    P: AsRef<Path>,
    I: IntoIterator<Item = &'a TrainingSample<L>>,
{
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| ClassifierError::io(path, e))?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .flexible(true)
        .from_writer(BufWriter::new(file));

    for sample in samples {
        let mut record = vec![sample.label().ordinal().to_string()];
        record.extend(
            sample
                .features()
                .iter()
                .enumerate()
                .filter(|(_, v)| **v != 0.0)
                .map(|(i, v)| format!("{}:{}", i + 1, v)),
        );
        writer
            .write_record(&record)
            .map_err(|e| ClassifierError::corpus(path, e.to_string()))?;
    }
    writer
        .flush()
        .map_err(|e| ClassifierError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::{GeneralLabel, Label};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reads_sparse_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("train.svm");
        fs::write(
            &path,
            "# zone samples\n0 1:0.5 3:2\n16  2:1.25\n\n12\n",
        )
        .unwrap();

        let samples: Vec<TrainingSample<Label>> = read_samples(&path, 3).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].label(), Label::from_ordinal(0).unwrap());
        assert_eq!(samples[0].features(), &[0.5, 0.0, 2.0]);
        assert_eq!(samples[1].features(), &[0.0, 1.25, 0.0]);
        assert_eq!(samples[2].features(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn index_beyond_schema_is_a_corpus_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("train.svm");
        fs::write(&path, "0 4:1\n").unwrap();
        let err = read_samples::<Label, _>(&path, 3).unwrap_err();
        assert!(matches!(err, ClassifierError::Corpus { .. }));
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn unknown_ordinal_is_a_corpus_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("train.svm");
        fs::write(&path, "9 1:1\n").unwrap();
        let err = read_samples::<GeneralLabel, _>(&path, 1).unwrap_err();
        assert!(matches!(err, ClassifierError::Corpus { .. }));
    }

    #[test]
    fn written_samples_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.svm");
        let samples = vec![
            TrainingSample::new(vec![0.0, 0.1, 3.0], GeneralLabel::Body),
            TrainingSample::new(vec![1.0, 0.0, 0.0], GeneralLabel::Other),
        ];
        write_samples(&path, &samples).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().next(), Some("1 2:0.1 3:3"));
        let back: Vec<TrainingSample<GeneralLabel>> = read_samples(&path, 3).unwrap();
        assert_eq!(back.len(), samples.len());
        for (read, written) in back.iter().zip(&samples) {
            assert_eq!(read.features(), written.features());
            assert_eq!(read.label(), written.label());
        }
    }
}
