use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let matches = Command::new("bbl_decoder")
        .about("Decode Betaflight blackbox log files")
        .arg(
            Arg::new("files")
                .help("One or more .BBL files to decode")
                .required(true)
                .num_args(1..),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print diagnostic tracing during parsing")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");
    let files: Vec<PathBuf> = matches
        .get_many::<String>("files")
        .unwrap()
        .map(PathBuf::from)
        .collect();

    for file in &files {
        let result = bbl_decoder::parse_file(&file, verbose)
            .with_context(|| format!("failed to parse {:?}", file))?;

        println!(
            "{}: {} bytes, {:.1} ms",
            file.display(),
            result.file_size,
            result.parse_time_ms
        );
        for session in &result.sessions {
            println!(
                "  session {}: {} frames, {:.2}s @ {:.1} Hz, {} corrupted frame(s), {} warning(s)",
                session.index,
                session.flight_data.frame_count,
                session.flight_data.duration_s,
                session.flight_data.sample_rate_hz,
                session.corrupted_frame_count,
                session.warnings.len(),
            );
            for warning in &session.warnings {
                println!("    warning: {warning}");
            }
        }
        if !result.success {
            if let Some(err) = &result.error {
                eprintln!("  {err}");
            }
        }
    }

    Ok(())
}
