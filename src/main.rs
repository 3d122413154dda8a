// src/main.rs

use airflow_runner::{cli, load_settings, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("airflow-runner error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<i32> {
    let args = cli::parse();
    let settings = load_settings(&args)?;

    let log_file = settings
        .log_to_file
        .then(|| logging::log_file_path(&settings.log_dir, &settings.flow_path));
    logging::init_logging(args.log_level, log_file.as_deref())?;

    let outcome = run(&settings).await?;
    Ok(outcome.exit_code())
}
