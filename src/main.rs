use clap::Parser;

use schemagen::cli::Args;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .init();

    let output = args.command.run(&args.config, args.format)?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}
