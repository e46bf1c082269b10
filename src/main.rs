use std::io::{self, BufWriter};

use anyhow::Result;
use env_logger::Env;
use log::info;

use crystalaspects::batch;
use crystalaspects::output;
use crystalaspects::settings;

fn main() -> Result<()> {
    let (settings, args) = settings::load_config()?;

    env_logger::Builder::from_env(Env::default().default_filter_or(&settings.log_level)).init();

    if args.print_config {
        print!("{}", toml::to_string(&settings)?);
        return Ok(());
    }

    if args.frames {
        for (path, frames) in args.files.iter().zip(batch::frame_counts(&args.files)?) {
            println!("{} {}", path.display(), frames);
        }
        return Ok(());
    }

    info!("analysing {} files", args.files.len());
    let reports = batch::analyse_files(&args.files, &settings);

    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        info!("{failed} of {} files could not be analysed", reports.len());
    }

    let stdout = io::stdout();
    output::write_reports(BufWriter::new(stdout.lock()), &reports, settings.output)
}
