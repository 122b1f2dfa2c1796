use anyhow::Result;
use med_news_tui::config::AppConfig;
use med_news_tui::internal::ui::app::App;
use med_news_tui::tui;

const LOG_FILE_NAME: &str = "med-news-tui.log";

#[tokio::main]
async fn main() -> Result<()> {
    // Config first: it carries the log settings.
    let config = AppConfig::load();

    // While the TUI owns the terminal, logs go to a daily file. Console
    // logging is only enabled when the terminal cannot be initialized.
    match tui::init() {
        Ok(terminal) => {
            let log_dir = config.logging.log_directory.as_deref().unwrap_or("logs");
            let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
            let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

            // RUST_LOG takes precedence over the config.
            let env_filter = match std::env::var("RUST_LOG") {
                Ok(_) => tracing_subscriber::EnvFilter::from_default_env(),
                Err(_) => tracing_subscriber::EnvFilter::new(config.logging.filter_directives()),
            };

            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(non_blocking)
                .with_ansi(false)
                .compact()
                .init();

            tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting");

            let mut app = App::new(config);
            let res = app.run(terminal).await;

            tui::restore()?;

            if let Err(err) = res {
                tracing::error!("{:#}", err);
                eprintln!("{err:?}");
            }

            Ok(())
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .init();

            eprintln!("Failed to initialize TUI: {e:?}");
            Err(e.into())
        }
    }
}
