//! Interactive CLI for the AI waiter.

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use maitred::services::{MenuService, OrderService};
use maitred::{Agent, ChatModel, Conversation, Dependencies, RunConfig};

#[derive(Debug, Parser)]
#[command(
    name = "maitred",
    about = "Tool-calling AI waiter that takes restaurant orders at the table"
)]
struct Args {
    /// Name of the LLM model to use, in format provider:model
    /// (e.g. openai:gpt-4o-mini, groq:llama-3.3-70b-versatile)
    #[arg(long, default_value = "openai:gpt-4o-mini", value_name = "PROVIDER:MODEL")]
    model: String,

    /// API key for the model service. If not provided, the provider's
    /// environment variable is consulted (e.g. OPENAI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Name of the restaurant
    #[arg(long, default_value = "Le Bistro")]
    restaurant_name: String,

    /// Table number for the order
    #[arg(long, default_value_t = 1)]
    table_number: u32,

    /// Enable debug output (transcript dumps, usage summary)
    #[arg(long)]
    debug: bool,
}

fn init_tracing(debug: bool) {
    let default_filter = if debug { "maitred=debug" } else { "maitred=warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_user_line() -> anyhow::Result<Option<String>> {
    print!("You: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    let bytes = std::io::stdin().lock().read_line(&mut line)?;
    if bytes == 0 {
        // stdin closed
        return Ok(None);
    }
    Ok(Some(line.trim_end().to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    // Resolve the gateway before anything else; a bad provider or missing
    // credential should fail at startup, not mid-conversation.
    let model = ChatModel::resolve(&args.model, args.api_key.as_deref())
        .context("failed to set up the model gateway")?;

    let deps = Dependencies {
        menu_service: Arc::new(MenuService::new()),
        order_service: Arc::new(OrderService::new()),
        restaurant_name: args.restaurant_name,
        table_number: args.table_number,
    };

    let mut conversation = Conversation::new(
        Agent::waiter(),
        deps.clone(),
        Arc::new(model),
        RunConfig::default(),
    );

    loop {
        let reply = conversation.advance().await?;
        println!("AI Waiter: {}", reply.message);

        if conversation.is_done() {
            break;
        }

        match read_user_line()? {
            Some(line) => conversation.push_user_message(line)?,
            None => break,
        }
    }

    let orders = deps.order_service.orders();
    if !orders.is_empty() {
        println!("Order placed:");
        for order in &orders {
            println!("  {}", order);
        }
    }

    if args.debug {
        eprintln!("{}", conversation.usage().summary());
    }

    Ok(())
}
