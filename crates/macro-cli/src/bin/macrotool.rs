use clap::{Parser, Subcommand};

use macro_cli::commands::rank_ops::RankArgs;
use macro_cli::commands::{config_ops, rank_ops, simulate_ops};

#[derive(Parser)]
#[command(name = "macrotool", about = "Macro suggestion diagnostics")]
struct Cli {
    /// Write a JSON trace to this directory (needs the `trace` feature)
    #[arg(long, global = true)]
    trace_dir: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rank the macros in a file for a query
    Rank {
        /// Path to the macros TOML file
        macros_file: String,
        /// Typed query (empty for idle suggestions)
        #[arg(default_value = "")]
        query: String,
        /// Input type of the focused field, or `textarea`
        #[arg(long, default_value = "text")]
        input_type: String,
        /// Name attribute of the focused field
        #[arg(long, default_value = "")]
        field_name: String,
        /// Page domain
        #[arg(long, default_value = "")]
        domain: String,
        /// Custom settings TOML (defaults to the embedded settings)
        #[arg(long)]
        settings: Option<String>,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Replay a typing script and show what the user sees after each step
    Simulate {
        /// Path to the macros TOML file
        macros_file: String,
        /// Path to the script file
        script_file: String,
        /// Page domain
        #[arg(long, default_value = "")]
        domain: String,
        /// Custom settings TOML (defaults to the embedded settings)
        #[arg(long)]
        settings: Option<String>,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the embedded default settings TOML
    SettingsExport,
    /// Validate a settings TOML file
    SettingsValidate {
        /// Path to the settings TOML file
        file: String,
    },
    /// Validate a macros TOML file
    MacrosValidate {
        /// Path to the macros TOML file
        file: String,
        /// Print the parsed macros as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Some(dir) = &cli.trace_dir {
        macro_engine::init_tracing(std::path::Path::new(dir));
    }

    match cli.command {
        Command::Rank {
            macros_file,
            query,
            input_type,
            field_name,
            domain,
            settings,
            json,
        } => rank_ops::rank_cmd(&RankArgs {
            macros_file: &macros_file,
            query: &query,
            input_type: &input_type,
            field_name: &field_name,
            domain: &domain,
            settings: settings.as_deref(),
            json,
        }),
        Command::Simulate {
            macros_file,
            script_file,
            domain,
            settings,
            json,
        } => simulate_ops::simulate_cmd(
            &macros_file,
            &script_file,
            &domain,
            settings.as_deref(),
            json,
        ),
        Command::SettingsExport => config_ops::settings_export(),
        Command::SettingsValidate { file } => config_ops::settings_validate(&file),
        Command::MacrosValidate { file, json } => config_ops::macros_validate(&file, json),
    }
}
