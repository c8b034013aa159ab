//! Competitor Radar
//!
//! Competitor pricing intelligence from the command line.

use clap::{Parser, Subcommand};
use competitor_radar::{
    config::Config,
    data::DataStore,
    forecast::DiscountForecaster,
    pipeline::{AnalysisPipeline, ProductAnalysis},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "competitor-radar")]
#[command(about = "Competitor pricing analysis and strategy recommendations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List products present in the competitor table
    Products,
    /// Forecast discount trends for a product
    Forecast {
        /// Product title to forecast
        product: String,
        /// Forecast horizon in days (overrides config)
        #[arg(short = 'n', long)]
        horizon: Option<usize>,
    },
    /// Run the full analysis for a product
    Analyze {
        /// Product title to analyze
        product: String,
        /// Relay the recommendation to the configured Slack webhook
        #[arg(long)]
        notify: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Products => list_products(config),
        Commands::Forecast { product, horizon } => forecast_product(config, &product, horizon),
        Commands::Analyze { product, notify } => analyze_product(config, &product, notify).await,
    }
}

fn list_products(config: Config) -> anyhow::Result<()> {
    let store = DataStore::new(config.data);
    let products = store.products()?;

    println!("\n📦 Products ({}):\n", products.len());
    for product in products {
        println!("  {product}");
    }

    Ok(())
}

fn forecast_product(config: Config, product: &str, horizon: Option<usize>) -> anyhow::Result<()> {
    let store = DataStore::new(config.data);
    let forecaster = DiscountForecaster::new(horizon.unwrap_or(config.forecast.horizon));

    let records = store.competitor_series(product)?;
    let series: Vec<_> = records
        .iter()
        .map(|r| (r.date, r.discount_percent))
        .collect();
    let forecast = forecaster.fit_and_forecast(&series)?;

    println!("\n📈 Discount forecast for {product}:\n");
    println!("{:<12} {:>10}", "Date", "Discount");
    println!("{}", "-".repeat(23));
    for point in forecast {
        println!("{:<12} {:>9}%", point.date, point.predicted_discount);
    }

    Ok(())
}

async fn analyze_product(config: Config, product: &str, notify: bool) -> anyhow::Result<()> {
    let pipeline = AnalysisPipeline::from_config(&config)?;
    let analysis = pipeline.analyze(product, notify).await?;
    render(&analysis);
    Ok(())
}

fn render(analysis: &ProductAnalysis) {
    println!("\n🔍 Competitor Analysis: {}\n", analysis.product);

    if analysis.records.is_empty() {
        println!("No competitor data found for this product.");
    } else {
        println!(
            "{:<12} {:>10} {:>10} {:>12}",
            "Date", "Price", "Discount", "Predicted"
        );
        println!("{}", "-".repeat(48));
        for record in &analysis.records {
            let predicted = record
                .predicted_discount
                .map(|d| format!("{d}%"))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{:<12} {:>10} {:>9}% {:>12}",
                record.date, record.price, record.discount_percent, predicted
            );
        }
    }

    println!("\n💬 Customer Sentiment:");
    match (&analysis.sentiment_summary, &analysis.sentiment_note) {
        (Some(summary), _) => println!("  {summary}"),
        (None, Some(note)) => println!("  {note}"),
        (None, None) => println!("  No sentiment data."),
    }

    println!("\n📈 Discount Forecast:");
    if analysis.forecast.is_empty() {
        let note = analysis.forecast_note.as_deref().unwrap_or("No forecast.");
        println!("  {note}");
    } else {
        for point in &analysis.forecast {
            println!("  {}  {}%", point.date, point.predicted_discount);
        }
    }

    println!("\n🤖 Strategy Recommendations:\n");
    match (&analysis.recommendation, &analysis.recommendation_note) {
        (Some(recommendation), _) => println!("{}", recommendation.text),
        (None, Some(note)) => println!("{note}"),
        (None, None) => println!("No recommendations available."),
    }

    if analysis.delivered {
        println!("\n✅ Recommendation relayed to Slack.");
    } else if let Some(note) = &analysis.delivery_note {
        println!("\n⚠️  Slack delivery failed: {note}");
    }
}
