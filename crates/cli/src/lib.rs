pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;

use commands::finance_health::FinanceScope;
use commands::history::HistoryArgs;
use commands::insights::InsightsArgs;
use commands::tickets::TicketAction;

#[derive(Debug, Parser)]
#[command(
    name = "inventra",
    about = "Inventra operator CLI",
    long_about = "Ask inventory, sales, finance and procurement questions, manage reorder tickets, and operate the local database.",
    after_help = "Examples:\n  inventra ask \"What's low on stock in north?\"\n  inventra tickets --create-from-reorder --region south\n  inventra doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Answer a single question through the classify/gather/decide pipeline")]
    Ask {
        query: String,
        #[arg(long, help = "Record the exchange under this conversation session")]
        session: Option<String>,
    },
    #[command(about = "Interactive session; `history`, `clear` and `exit` are recognised")]
    Chat {
        #[arg(long, help = "Resume an existing session instead of starting a new one")]
        session: Option<String>,
    },
    #[command(about = "Inventory, sales, finance and ticket dashboards without calling the model")]
    Stats,
    #[command(about = "Trending products, regional performance and weather impact from recorded sales")]
    Insights {
        #[arg(long, help = "Also report the daily sales velocity of this SKU")]
        sku: Option<String>,
        #[arg(long, help = "Restrict the weather breakdown to one inventory category")]
        category: Option<String>,
        #[arg(long, help = "Window for trends and velocity (default 30)")]
        days: Option<u32>,
        #[arg(long, help = "Minimum units for a product to count as trending (default 10)")]
        min_units: Option<i64>,
    },
    #[command(about = "List, create or update reorder tickets")]
    Tickets(TicketsArgs),
    #[command(about = "Run the 90-day financial health review")]
    FinanceHealth {
        #[arg(long)]
        region: Option<String>,
        #[arg(long, conflicts_with = "region", help = "Review every region in turn")]
        all_regions: bool,
    },
    #[command(about = "Browse, search or clear conversation history")]
    History {
        #[arg(long)]
        session: Option<String>,
        #[arg(long, help = "Case-insensitive keyword across questions and answers")]
        search: Option<String>,
        #[arg(long, requires = "session")]
        clear: bool,
        #[arg(long)]
        limit: Option<u32>,
    },
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo dataset and verify it")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, LLM and weather readiness, and DB connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

#[derive(Debug, Args)]
struct TicketsArgs {
    #[arg(long, conflicts_with = "update", help = "Ask for a reorder decision and open tickets from it")]
    create_from_reorder: bool,
    #[arg(long, requires = "create_from_reorder")]
    region: Option<String>,
    #[arg(long, value_name = "ID", requires = "status")]
    update: Option<i64>,
    #[arg(long, help = "Filter when listing; new status when updating")]
    status: Option<String>,
    #[arg(
        long,
        conflicts_with_all = ["create_from_reorder", "update", "status"],
        help = "List pending tickets of one priority (low, medium, high)"
    )]
    priority: Option<String>,
    #[arg(long)]
    limit: Option<u32>,
}

impl TicketsArgs {
    fn into_action(self) -> TicketAction {
        if let Some(priority) = self.priority {
            return TicketAction::ByPriority { priority, limit: self.limit };
        }
        match (self.create_from_reorder, self.update, self.status) {
            (true, _, _) => TicketAction::CreateFromReorder { region: self.region },
            (false, Some(id), Some(status)) => TicketAction::Update { id, status },
            (false, _, status) => TicketAction::List { status, limit: self.limit },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Ask { query, session } => commands::ask::run(&query, session.as_deref()),
        Command::Chat { session } => commands::chat::run(session),
        Command::Stats => commands::stats::run(),
        Command::Insights { sku, category, days, min_units } => {
            commands::insights::run(InsightsArgs { sku, category, days, min_units })
        }
        Command::Tickets(args) => commands::tickets::run(args.into_action()),
        Command::FinanceHealth { region, all_regions } => {
            let scope = if all_regions {
                FinanceScope::AllRegions
            } else {
                FinanceScope::Single { region }
            };
            commands::finance_health::run(scope)
        }
        Command::History { session, search, clear, limit } => {
            commands::history::run(HistoryArgs { session, search, clear, limit })
        }
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
