use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use stratforge::application::session::StrategySession;
use stratforge::config::{Config, Mode};
use stratforge::domain::ports::StrategyGenerator;
use stratforge::domain::ranking::{SortDirection, SortKey, best_net_profit, best_win_rate};
use stratforge::domain::types::{
    BACKTEST_TIMEFRAMES, BacktestInput, BacktestRecord, Market, Preferences, RiskTolerance,
    ScriptVersion, Strategy, TradingStyle,
};
use stratforge::infrastructure::gemini::GeminiStrategyService;
use stratforge::infrastructure::library_persistence::{JsonFileStore, LibraryGateway};
use stratforge::infrastructure::mock::MockStrategyService;

#[derive(Parser)]
#[command(
    name = "stratforge",
    about = "Generate, optimize, backtest and manage AI-designed trading strategies"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a new strategy from preferences
    Generate {
        #[arg(long, default_value = "DayTrading")]
        style: TradingStyle,
        #[arg(long, default_value = "Crypto")]
        market: Market,
        #[arg(long, default_value = "Medium")]
        risk: RiskTolerance,
        #[arg(long, default_value_t = 10_000.0)]
        capital: f64,
        #[arg(long = "script-version", default_value = "v5")]
        version: ScriptVersion,
        /// Save the generated strategy to the library under this name
        #[arg(long)]
        save_as: Option<String>,
    },
    /// Produce an optimized variant of a saved strategy
    Optimize {
        id: Uuid,
        /// Save the optimized strategy to the library under this name
        #[arg(long)]
        save_as: Option<String>,
    },
    /// Run a simulated backtest of a saved strategy and record the result
    Backtest {
        id: Uuid,
        #[arg(long)]
        asset: String,
        #[arg(long, default_value = "1h")]
        timeframe: String,
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
    },
    /// List the strategy library
    List {
        #[arg(long, default_value = "savedAt")]
        sort: SortKey,
        #[arg(long, default_value = "desc")]
        direction: SortDirection,
    },
    /// Show one saved strategy in full
    Show { id: Uuid },
    /// Delete a saved strategy
    Delete { id: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let generator: Arc<dyn StrategyGenerator> = match config.mode {
        Mode::Mock => Arc::new(MockStrategyService::new()),
        Mode::Gemini => Arc::new(GeminiStrategyService::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
        )),
    };
    let gateway = LibraryGateway::new(Arc::new(JsonFileStore::new()?));
    let mut session = StrategySession::open(generator, gateway);

    match cli.command {
        Command::Generate {
            style,
            market,
            risk,
            capital,
            version,
            save_as,
        } => {
            anyhow::ensure!(capital > 0.0, "capital must be positive");
            let preferences = Preferences {
                trading_style: style,
                market,
                risk_tolerance: risk,
                capital,
                pine_script_version: version,
            };
            let strategy = session.generate(&preferences).await?.clone();
            print_strategy(&strategy);
            if let Some(name) = save_as {
                let id = session.save_current(&name)?;
                println!("\nSaved as \"{name}\" ({id})");
            }
        }
        Command::Optimize { id, save_as } => {
            session.load(id)?;
            let optimized = session.optimize().await?.clone();
            print_strategy(&optimized);
            if let Some(name) = save_as {
                let new_id = session.save_current(&name)?;
                println!("\nSaved as \"{name}\" ({new_id})");
            }
        }
        Command::Backtest {
            id,
            asset,
            timeframe,
            start_date,
            end_date,
        } => {
            if !BACKTEST_TIMEFRAMES.contains(&timeframe.as_str()) {
                warn!(
                    "Timeframe '{}' is not in the usual set ({})",
                    timeframe,
                    BACKTEST_TIMEFRAMES.join(", ")
                );
            }
            session.load(id)?;
            let input = BacktestInput {
                asset,
                timeframe,
                start_date,
                end_date,
            };
            let record = session.run_backtest(&input).await?;
            print_record(&record);
        }
        Command::List { sort, direction } => {
            let ranked = session.ranked(sort, direction);
            if ranked.is_empty() {
                println!("No saved strategies.");
            } else {
                println!("{} strategies, sorted by {sort} ({direction}):\n", ranked.len());
                for saved in &ranked {
                    println!(
                        "{}  {:<28} saved {}  confidence {:.2}  best win rate {:.1}  best net profit {:.1}  runs {}",
                        saved.id,
                        saved.name(),
                        saved.saved_at.format("%Y-%m-%d %H:%M"),
                        saved.strategy.confidence_score,
                        best_win_rate(saved),
                        best_net_profit(saved),
                        saved.backtest_history.len(),
                    );
                }
            }
        }
        Command::Show { id } => {
            session.load(id)?;
            if let Some(current) = session.current() {
                print_strategy(current.strategy());
                if let Some(saved) = session.library().get(id) {
                    println!("\nSaved at: {}", saved.saved_at.format("%Y-%m-%d %H:%M:%S UTC"));
                    println!("Backtest history ({} runs, newest first):", saved.backtest_history.len());
                    for run in &saved.backtest_history {
                        println!(
                            "  {} {}  net profit {}  win rate {}  {} trades",
                            run.input.asset,
                            run.input.timeframe,
                            run.metrics.net_profit,
                            run.metrics.win_rate,
                            run.metrics.total_trades,
                        );
                    }
                }
            }
        }
        Command::Delete { id } => {
            session.delete(id)?;
            println!("Deleted {id}");
        }
    }

    Ok(())
}

fn print_strategy(strategy: &Strategy) {
    println!("# {}", strategy.strategy_name);
    println!(
        "{} | {} | {} | Pine Script {}",
        strategy.trading_style, strategy.market, strategy.risk_tolerance,
        strategy.pine_script_version
    );
    println!("\n{}", strategy.description);
    println!("\nRationale: {}", strategy.generation_rationale);
    if !strategy.parameters.is_empty() {
        println!("\nParameters:");
        for (key, value) in &strategy.parameters {
            println!("  {key} = {value}");
        }
    }
    if !strategy.logic_breakdown.is_empty() {
        println!("\nLogic:");
        for step in &strategy.logic_breakdown {
            println!("  [{}] {}", step.kind, step.description);
        }
    }
    let h = &strategy.backtest_highlights;
    println!(
        "\nHighlights: net profit {}, win rate {}, profit factor {}, max drawdown {}, {} trades",
        h.net_profit, h.win_rate, h.profit_factor, h.max_drawdown, h.total_trades
    );
    println!("Confidence: {:.2}", strategy.confidence_score);
    println!("\n{}", strategy.pine_script);
}

fn print_record(record: &BacktestRecord) {
    let m = &record.metrics;
    println!(
        "Backtest of {} on {}: net profit {}, win rate {}, profit factor {}, max drawdown {}, {} trades",
        record.input.asset, record.input.timeframe, m.net_profit, m.win_rate, m.profit_factor,
        m.max_drawdown, m.total_trades
    );
    println!("\nStrengths: {}", record.analysis.strengths);
    println!("Weaknesses: {}", record.analysis.weaknesses);
    println!("Suggestion: {}", record.analysis.suggestion);
    println!(
        "\n{} chart points, {} trade markers",
        record.chart_data.len(),
        record.trades.len()
    );
}
