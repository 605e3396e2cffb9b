use clap::Parser;

use taxbrief::cli::Cli;
use taxbrief::config::{get_config, init_config, init_config_from};
use taxbrief::runtime::modes::{Mode, detect_mode, run_server};
use taxbrief::system::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match cli.config.as_deref() {
        Some(path) => init_config_from(path),
        None => init_config(),
    }

    match detect_mode(cli.command.as_ref()) {
        Mode::Server => {
            let config = get_config();
            // guard 需要存活到进程结束，保证日志刷盘
            let _guard = init_logging(&config.logging)?;
            run_server().await
        }
        #[cfg(feature = "cli")]
        Mode::Cli => {
            taxbrief::system::init_cli_logging("warn");
            if let Some(cmd) = cli.command
                && let Err(e) = taxbrief::runtime::modes::run_cli(cmd).await
            {
                eprintln!("{}", e.format_colored());
                std::process::exit(1);
            }
            Ok(())
        }
        Mode::Unknown => {
            anyhow::bail!("This build has no CLI support; run without a subcommand to serve")
        }
    }
}
