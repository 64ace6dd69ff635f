use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use signaldash_core::baskets::BasketError;
use signaldash_core::domain::basket::{SaveBasketRequest, UserId};
use signaldash_core::signals::render::{render_comparison, render_stats, render_view};
use signaldash_core::signals::{
    HttpSignalSource, MockComparison, SentimentFilter, SignalQuery, SignalViewer, SortKey,
    SortOrder, ViewState,
};

#[derive(Debug, Parser)]
#[command(name = "signaldash")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch the signal list once and print summary, table and source comparison.
    Signals(SignalsArgs),

    /// Load or save stock baskets.
    #[command(subcommand)]
    Basket(BasketCommand),
}

#[derive(Debug, clap::Args)]
struct SignalsArgs {
    /// all, positive, negative or neutral.
    #[arg(long, default_value = "all")]
    sentiment: SentimentFilter,

    /// Case-insensitive ticker substring.
    #[arg(long, default_value = "")]
    search: String,

    /// date, symbol, sentiment_score or tweets.
    #[arg(long, default_value = "date")]
    sort_by: SortKey,

    /// Sort descending instead of ascending.
    #[arg(long)]
    desc: bool,

    /// Skip the source comparison chart.
    #[arg(long)]
    no_chart: bool,
}

#[derive(Debug, Subcommand)]
enum BasketCommand {
    /// Print the caller's most recently created basket as JSON.
    Latest {
        /// Authenticated user id (UUID).
        #[arg(long)]
        user: Option<UserId>,
    },

    /// Create or update a basket from a JSON file of the form {"basket": .., "stocks": [..]}.
    Save {
        #[arg(long)]
        user: Option<UserId>,

        #[arg(long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = signaldash_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    tracing::debug!(command = ?args.command, "signaldash starting");

    let res = match args.command {
        Command::Signals(signals_args) => run_signals(&settings, signals_args).await,
        Command::Basket(cmd) => run_basket(&settings, cmd).await,
    };

    if let Err(err) = &res {
        sentry_anyhow::capture_anyhow(err);
    }
    res
}

async fn run_signals(
    settings: &signaldash_core::config::Settings,
    args: SignalsArgs,
) -> anyhow::Result<()> {
    let source = HttpSignalSource::from_settings(settings)?;

    let mut viewer = SignalViewer::with_query(SignalQuery {
        sentiment: args.sentiment,
        search: args.search,
        sort_key: args.sort_by,
        sort_order: if args.desc {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        },
    });
    viewer.load(&source).await;

    let state = viewer.state();
    if !matches!(state, ViewState::Error(_)) {
        print!("{}", render_stats(viewer.stats()));
        println!();
    }
    print!("{}", render_view(&state));

    if !args.no_chart {
        println!();
        print!("{}", render_comparison(&MockComparison));
    }

    if let ViewState::Error(message) = state {
        anyhow::bail!(message);
    }
    Ok(())
}

async fn run_basket(
    settings: &signaldash_core::config::Settings,
    cmd: BasketCommand,
) -> anyhow::Result<()> {
    let store = signaldash_core::storage::connect_basket_store(settings).await?;

    match cmd {
        BasketCommand::Latest { user } => {
            let latest = store
                .get_most_recent_basket(user)
                .await
                .map_err(report_basket_error)?;
            println!("{}", serde_json::to_string_pretty(&latest)?);
        }
        BasketCommand::Save { user, file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let req: SaveBasketRequest = serde_json::from_str(&text)
                .with_context(|| format!("{} is not a valid basket file", file.display()))?;

            let basket_id = store
                .save_basket(user, &req.basket, &req.stocks)
                .await
                .map_err(report_basket_error)?;
            println!("{basket_id}");
        }
    }
    Ok(())
}

fn report_basket_error(err: BasketError) -> anyhow::Error {
    if let Some(basket) = err.partial_basket() {
        if let Ok(json) = serde_json::to_string_pretty(basket) {
            eprintln!("basket found but its stocks could not be loaded:\n{json}");
        }
    }
    anyhow::Error::new(err)
}

fn init_sentry(settings: &signaldash_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_signals_flags() {
        let args = Args::try_parse_from([
            "signaldash",
            "signals",
            "--sentiment",
            "Positive",
            "--search",
            "aapl",
            "--sort-by",
            "tweets",
            "--desc",
        ])
        .unwrap();

        let Command::Signals(s) = args.command else {
            panic!("expected signals command");
        };
        assert_eq!(s.sentiment, "positive".parse::<SentimentFilter>().unwrap());
        assert_eq!(s.search, "aapl");
        assert_eq!(s.sort_by, SortKey::Tweets);
        assert!(s.desc);
        assert!(!s.no_chart);
    }

    #[test]
    fn signals_defaults_match_viewer_defaults() {
        let args = Args::try_parse_from(["signaldash", "signals"]).unwrap();
        let Command::Signals(s) = args.command else {
            panic!("expected signals command");
        };
        let defaults = SignalQuery::default();
        assert_eq!(s.sentiment, defaults.sentiment);
        assert_eq!(s.sort_by, defaults.sort_key);
        assert!(!s.desc);
    }

    #[test]
    fn rejects_unknown_sort_key() {
        assert!(Args::try_parse_from(["signaldash", "signals", "--sort-by", "price"]).is_err());
    }

    #[test]
    fn basket_user_is_optional_but_validated() {
        let args = Args::try_parse_from(["signaldash", "basket", "latest"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Basket(BasketCommand::Latest { user: None })
        ));

        assert!(
            Args::try_parse_from(["signaldash", "basket", "latest", "--user", "nope"]).is_err()
        );
    }
}
