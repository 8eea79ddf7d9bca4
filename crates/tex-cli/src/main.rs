use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tex")]
#[command(about = "Textile order dashboard CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> local...)
        #[arg(required = true)]
        paths: Vec<String>,

        /// Also check the merged config for this role (BRAND | SUPPLIER):
        /// unused keys, typed settings and the service token
        #[arg(long)]
        role: Option<String>,

        /// Fail instead of warning on unused keys
        #[arg(long, default_value_t = false)]
        strict: bool,
    },

    /// Print the board columns for one role
    Board {
        /// JSON array of service order records
        #[arg(long)]
        orders: String,

        /// BRAND | SUPPLIER
        #[arg(long)]
        role: String,

        /// Reference instant (RFC 3339). Defaults to now.
        #[arg(long)]
        at: Option<String>,
    },

    /// Print filtered + sorted orders
    List {
        #[arg(long)]
        orders: String,

        #[arg(long)]
        role: String,

        /// Case-insensitive text over display id, counterpart and product
        #[arg(long)]
        search: Option<String>,

        /// TODAY | WEEK | MONTH
        #[arg(long)]
        range: Option<String>,

        /// Canonical status; repeatable. Widened to the whole board column.
        #[arg(long = "status")]
        statuses: Vec<String>,

        /// Sort keys, e.g. "deadline:asc,value:desc"
        #[arg(long)]
        sort: Option<String>,

        /// Include rejected / cancelled / finalized orders
        #[arg(long, default_value_t = false)]
        all: bool,

        #[arg(long)]
        at: Option<String>,

        #[arg(long, default_value_t = tex_board::DEFAULT_DUE_SOON_DAYS)]
        due_soon_days: i64,
    },

    /// Validate an action against one order (nothing is written)
    Transition {
        #[arg(long)]
        orders: String,

        #[arg(long)]
        role: String,

        /// Order id
        #[arg(long = "order")]
        order_id: String,

        /// ACCEPT | NEGOTIATE | REJECT | ADVANCE | CONFIRM_RECEIPT
        #[arg(long)]
        action: String,
    },

    /// Print the milestone timeline of one order
    Timeline {
        #[arg(long)]
        orders: String,

        #[arg(long)]
        role: String,

        #[arg(long = "order")]
        order_id: String,
    },
}

fn main() -> Result<()> {
    // Dev convenience; a missing file is fine, a malformed one is not.
    if let Err(e) = dotenvy::from_filename(".env.local") {
        if !e.not_found() {
            return Err(e).context("failed to load .env.local");
        }
    }

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash {
            paths,
            role,
            strict,
        } => commands::config::config_hash(paths, role, strict)?,

        Commands::Board { orders, role, at } => commands::board::board(&orders, &role, at)?,

        Commands::List {
            orders,
            role,
            search,
            range,
            statuses,
            sort,
            all,
            at,
            due_soon_days,
        } => commands::board::list(
            &orders,
            &role,
            commands::board::ListArgs {
                search,
                range,
                statuses,
                sort,
                all,
                at,
                due_soon_days,
            },
        )?,

        Commands::Transition {
            orders,
            role,
            order_id,
            action,
        } => commands::order::transition(&orders, &role, &order_id, &action)?,

        Commands::Timeline {
            orders,
            role,
            order_id,
        } => commands::order::timeline(&orders, &role, &order_id)?,
    }

    Ok(())
}

/// Logs go to stderr; stdout carries command output only.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();
}
