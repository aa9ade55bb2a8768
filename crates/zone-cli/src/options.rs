use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use serde::Serialize;

use zone_classifiers::config::{KernelType, SvmParameters};
use zone_classifiers::error::{ClassifierError, Result};

pub const DEFAULT_EXTENSION: &str = "cermstr";
pub const DEFAULT_FOLDS: usize = 5;

/// Validated options of one training run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub cross: bool,
    pub folds: usize,
    pub extension: String,
    pub fonts: Option<PathBuf>,
    pub svm: SvmParameters,
}

pub fn build_command() -> Command {
    Command::new("train-zone-classifier")
        .version(clap::crate_version!())
        .about("Train an SVM classifier that labels segmented document zones")
        .arg(
            Arg::new("input")
                .long("input")
                .help("Directory of labeled documents or a samples file. In cross-validation mode, a directory holding one entry per fold named 0..k-1.")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::AnyPath),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .help("Model output path. In cross-validation mode, fold i is written to <output>-i.")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("kernel")
                .long("kernel")
                .help("Kernel type: 0=linear, 1=polynomial, 2=rbf, 3=sigmoid")
                .value_parser(clap::value_parser!(i64))
                .allow_negative_numbers(true)
                .default_value("2"),
        )
        .arg(
            Arg::new("gamma")
                .short('g')
                .long("gamma")
                .help("Kernel gamma")
                .value_parser(clap::value_parser!(f64))
                .default_value("1.0"),
        )
        .arg(
            Arg::new("cost")
                .short('C')
                .long("cost")
                .help("Misclassification cost C")
                .value_parser(clap::value_parser!(f64))
                .default_value("16.0"),
        )
        .arg(
            Arg::new("degree")
                .long("degree")
                .help("Polynomial degree; required by the polynomial kernel")
                .value_parser(clap::value_parser!(i64))
                .allow_negative_numbers(true),
        )
        .arg(
            Arg::new("cross")
                .long("cross")
                .help("Run k-fold cross-validation")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("ext")
                .long("ext")
                .help("Extension of document files in input directories")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .default_value(DEFAULT_EXTENSION),
        )
        .arg(
            Arg::new("folds")
                .long("folds")
                .help("Number of cross-validation folds")
                .value_parser(clap::value_parser!(usize))
                .default_value("5"),
        )
        .arg(
            Arg::new("fonts")
                .long("fonts")
                .help("File listing known fonts, one per line, most frequent first. Enables the font-code feature.")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
}

impl TrainOptions {
    /// Validate parsed arguments. Every failure is a configuration error.
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let input = matches
            .get_one::<PathBuf>("input")
            .cloned()
            .ok_or_else(|| ClassifierError::configuration("the --input option is required"))?;
        let output = matches
            .get_one::<PathBuf>("output")
            .cloned()
            .ok_or_else(|| ClassifierError::configuration("the --output option is required"))?;
        if !input.exists() {
            return Err(ClassifierError::configuration(format!(
                "input {} does not exist",
                input.display()
            )));
        }

        let code = matches.get_one::<i64>("kernel").copied().unwrap_or(2);
        let kernel = KernelType::from_code(code)?;

        let degree = match matches.get_one::<i64>("degree").copied() {
            None => None,
            Some(d) if d >= 1 && d <= u32::MAX as i64 => Some(d as u32),
            Some(d) => {
                return Err(ClassifierError::configuration(format!(
                    "degree must be a positive integer, got {}",
                    d
                )))
            }
        };

        let gamma = matches.get_one::<f64>("gamma").copied().unwrap_or(1.0);
        let cost = matches.get_one::<f64>("cost").copied().unwrap_or(16.0);
        let svm = SvmParameters::new(kernel, gamma, cost, degree);
        svm.validate()?;

        let cross = matches.get_flag("cross");
        let folds = matches
            .get_one::<usize>("folds")
            .copied()
            .unwrap_or(DEFAULT_FOLDS);
        if cross && folds < 2 {
            return Err(ClassifierError::configuration(format!(
                "cross-validation needs at least 2 folds, got {}",
                folds
            )));
        }

        let extension = matches
            .get_one::<String>("ext")
            .cloned()
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
        let fonts = matches.get_one::<PathBuf>("fonts").cloned();

        Ok(TrainOptions {
            input,
            output,
            cross,
            folds,
            extension,
            fonts,
            svm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(args: &[&str]) -> Result<TrainOptions> {
        let matches = build_command()
            .try_get_matches_from(std::iter::once("train-zone-classifier").chain(args.iter().copied()))
            .unwrap();
        TrainOptions::from_matches(&matches)
    }

    #[test]
    fn defaults_match_documented_values() {
        let dir = tempdir().unwrap();
        let input = dir.path().to_str().unwrap();
        let opts = parse(&["--input", input, "--output", "model.json"]).unwrap();
        assert_eq!(opts.svm.kernel, KernelType::Rbf);
        assert_eq!(opts.svm.gamma, 1.0);
        assert_eq!(opts.svm.cost, 16.0);
        assert_eq!(opts.svm.degree, None);
        assert_eq!(opts.extension, "cermstr");
        assert_eq!(opts.folds, 5);
        assert!(!opts.cross);
    }

    #[test]
    fn short_aliases() {
        let dir = tempdir().unwrap();
        let input = dir.path().to_str().unwrap();
        let opts = parse(&[
            "--input", input, "--output", "m", "-g", "0.5", "-C", "4", "--kernel", "0",
        ])
        .unwrap();
        assert_eq!(opts.svm.kernel, KernelType::Linear);
        assert_eq!(opts.svm.gamma, 0.5);
        assert_eq!(opts.svm.cost, 4.0);
    }

    #[test]
    fn missing_paths_are_configuration_errors() {
        assert!(matches!(
            parse(&["--output", "m"]),
            Err(ClassifierError::Configuration(_))
        ));
        let dir = tempdir().unwrap();
        let input = dir.path().to_str().unwrap();
        assert!(matches!(
            parse(&["--input", input]),
            Err(ClassifierError::Configuration(_))
        ));
    }

    #[test]
    fn polynomial_requires_positive_degree() {
        let dir = tempdir().unwrap();
        let input = dir.path().to_str().unwrap();
        assert!(parse(&["--input", input, "--output", "m", "--kernel", "1"]).is_err());
        assert!(parse(&["--input", input, "--output", "m", "--kernel", "1", "--degree", "0"]).is_err());
        let opts = parse(&["--input", input, "--output", "m", "--kernel", "1", "--degree", "3"]).unwrap();
        assert_eq!(opts.svm.degree, Some(3));
    }

    #[test]
    fn kernel_code_out_of_range() {
        let dir = tempdir().unwrap();
        let input = dir.path().to_str().unwrap();
        assert!(parse(&["--input", input, "--output", "m", "--kernel", "4"]).is_err());
        assert!(parse(&["--input", input, "--output", "m", "--kernel", "-1"]).is_err());
    }

    #[test]
    fn options_serialize_for_logging() {
        let dir = tempdir().unwrap();
        let input = dir.path().to_str().unwrap();
        let opts = parse(&["--input", input, "--output", "m", "--cross"]).unwrap();
        let json = serde_json::to_string_pretty(&opts).unwrap();
        assert!(json.contains("\"cross\": true"));
        assert!(json.contains("\"kernel\": \"rbf\""));
    }
}
