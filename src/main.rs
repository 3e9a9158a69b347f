use chiptest::*;

use clap::Parser;
use log::*;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// HDL and vector file pairs: <chip.hdl> <chip.tst> ...
    files: Vec<String>,

    /// Base directory for resolving referenced chips. Defaults to the
    /// directory of the first HDL file.
    #[arg(short, long)]
    directory: Option<String>,

    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.files.is_empty() {
        anyhow::bail!("no files given; expected <chip.hdl> <chip.tst> pairs");
    }
    if args.files.len() % 2 != 0 {
        anyhow::bail!("files must come in <chip.hdl> <chip.tst> pairs");
    }

    let pairs: Vec<(PathBuf, PathBuf)> = args
        .files
        .chunks(2)
        .map(|pair| (PathBuf::from(&pair[0]), PathBuf::from(&pair[1])))
        .collect();

    let base_dir = match &args.directory {
        Some(directory) => PathBuf::from(directory),
        None => pairs[0]
            .0
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(|parent| parent.to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let mut sim = Simulator::with_dir(&base_dir);
    let mut total = 0;
    let mut passed = 0;
    let mut broken_files = 0;

    for (hdl_file, tst_file) in &pairs {
        let chip = match hdl_file.file_stem() {
            Some(stem) => stem.to_string_lossy().into_owned(),
            None => {
                error!("{}: not an HDL file name", hdl_file.display());
                broken_files += 1;
                continue;
            },
        };

        match sim.definition(&chip) {
            Ok(def) => debug!("{chip}: {} inputs, {} outputs, {} parts", def.inputs.len(), def.outputs.len(), def.parts.len()),
            Err(e) => {
                error!("{}: {e}", hdl_file.display());
                broken_files += 1;
                continue;
            },
        }

        let suite = match TestSuite::from_file(tst_file) {
            Ok(suite) => suite,
            Err(e) => {
                error!("{}: {e}", tst_file.display());
                broken_files += 1;
                continue;
            },
        };

        let report = run_suite(&mut sim, &suite);
        println!(
            "{:<15} : {}/{} passed",
            report.chip,
            report.passed,
            report.total()
        );
        total += report.total();
        passed += report.passed;
    }

    if pairs.len() > 1 {
        println!("{:<15} : {passed}/{total} passed", "TOTAL");
    }

    if passed < total || broken_files > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    use chrono::{DateTime, Utc};

    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            let now: DateTime<Utc> = Utc::now();
            out.finish(format_args!(
                "[{} {}] {}",
                now.format("%H:%M:%S%.3f"),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .expect("logger is initialized once");
}
