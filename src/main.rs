use clap::Parser;
use switchyard::cli::{run_cli, Cli};
use switchyard::otel::{init_logging_with_config, LogConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging_with_config(&LogConfig::from_env())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let output = runtime.block_on(run_cli(cli))?;
    println!("{output}");
    Ok(())
}
