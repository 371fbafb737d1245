// src/main.rs

use fsevent_watch::{cli, logging, run};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let code = match run_main().await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("fsevent-watch error: {err:?}");
            1
        }
    };
    // Exit here rather than returning: dropping the runtime would wait for
    // the blocking thread parked on stdin.
    std::process::exit(code);
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await?;
    Ok(())
}
