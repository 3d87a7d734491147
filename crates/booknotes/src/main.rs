use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = booknotes::cli::Cli::parse();
    booknotes::init(cli.verbose);
    booknotes::cli::run(cli)
}
