use anyhow::Result;
use log::LevelFilter;

use zone_cli::options::{build_command, TrainOptions};
use zone_cli::pipeline;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(
            env_logger::Env::default()
                .filter_or("ZONE_LOG", "error,zone_classifiers=info,zone_cli=info"),
        )
        .init();

    let matches = match build_command().try_get_matches() {
        Ok(matches) => matches,
        // Help and version exit 0; every parse error exits 1.
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            std::process::exit(1)
        }
        Err(e) => e.exit(),
    };

    let options = match TrainOptions::from_matches(&matches) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("error: {}\n\n{}", e, build_command().render_usage());
            std::process::exit(1)
        }
    };

    match pipeline::run(&options) {
        Ok(paths) => {
            for path in paths {
                log::info!("[ZoneCli::Train] Wrote {}", path.display());
            }
            Ok(())
        }
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
