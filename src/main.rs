use std::process;

use stegobase::cli::{self, AppError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main()
{
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stegobase=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let result = cli::run();
    match &result
    {
        Ok(_) => {},
        Err(AppError::Usage { help }) => println!("{help}"),
        Err(err) => eprintln!("Error: {err}"),
    }
    process::exit(cli::exit_code(&result));
}
