pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::ask::AskArgs;

#[derive(Debug, Parser)]
#[command(
    name = "cpg",
    about = "CPG analytics voice backend operator CLI",
    long_about = "Check readiness, apply migrations, load demo promotions, and ask the intent \
                  dispatcher a question from the terminal.",
    after_help = "Examples:\n  cpg doctor --json\n  cpg seed\n  cpg ask TotalTradeSpend --year 2016"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Validate config and database connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Apply migrations and load the deterministic demo promotions")]
    Seed {
        #[arg(long, help = "Remove the demo promotions before loading them again")]
        reset: bool,
    },
    #[command(about = "Dispatch one intent against the configured database")]
    Ask {
        #[arg(help = "Intent name, e.g. TotalTradeSpend, TotalGrossProfit, TotalROI")]
        intent: String,
        #[arg(long, help = "Year slot (four digits)")]
        year: Option<String>,
        #[arg(long, help = "Brand slot")]
        brand: Option<String>,
        #[arg(long, help = "Customer slot")]
        customer: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Doctor { json } => {
            let (exit_code, output) = commands::doctor::run(json);
            commands::CommandResult { exit_code, output }
        }
        Command::Migrate => commands::migrate::run(),
        Command::Seed { reset } => commands::seed::run(reset),
        Command::Ask { intent, year, brand, customer } => {
            commands::ask::run(AskArgs { intent, year, brand, customer })
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
