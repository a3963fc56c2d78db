use clap::{Parser, Subcommand};
use crate::config::Config;
use crate::db::DbConnection;
use crate::detail::{get_default_module, section_config_gaps, section_visibility, visible_sections, SectionVisibility};
use crate::models::{Order, OrderRecord, Role, StageConfig};
use crate::pipeline::{
    audit_orders, can_perform_primary_action, compute_stage_counts_at, get_order_stage_at,
    get_visible_stages, group_by_stage, is_at_risk_at, matching_stages, risk_reasons_at,
    stage_config, unstaged_orders, visible_stage_ids, STAGE_REGISTRY,
};
use crate::repo::OrderRepo;
use crate::cli::output::{
    format_audit, format_board, format_counts, format_import, format_order_detail,
    format_order_table, format_sections, format_stages, is_tty,
};
use crate::cli::error::{parse_role, user_error, validate_order_id};
use crate::filter::{filter_orders, parse_filter};
use chrono::{DateTime, Local};
use log::debug;
use std::collections::HashSet;
use std::io::Read;
use anyhow::{Context, Result};

#[derive(Parser)]
#[command(name = "rhos")]
#[command(about = "RichHabitsOS order pipeline - stage boards, risk detection and role views")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Session role (defaults to the rc `role` key, else admin)
    #[arg(long, global = true)]
    pub role: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import an order snapshot (JSON array as returned by the orders API)
    Import {
        /// Snapshot file, or - for stdin
        file: String,
        /// Drop stored orders missing from this snapshot
        #[arg(long)]
        replace: bool,
    },
    /// List orders visible to the role
    List {
        /// Filter arguments (e.g., "stage=in-production risk")
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        filter: Vec<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show the kanban board for the role's stages
    Board {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Count orders per stage
    Counts {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// List pipeline stages
    Stages {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show an order as the role sees it
    Show {
        /// Order ID
        id: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show the role's detail-view sections
    Sections {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Report orders the pipeline classifies badly
    Audit {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

pub fn run() -> Result<()> {
    let cli = match Cli::try_parse_from(std::env::args()) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    let config = Config::load().context("Failed to load configuration")?;
    handle_command(cli, &config)
}

fn handle_command(cli: Cli, config: &Config) -> Result<()> {
    let role = resolve_role(cli.role.as_deref(), config);
    debug!("Session role: {}", role.as_str());

    match cli.command {
        Commands::Import { file, replace } => handle_import(config, &file, replace),
        Commands::List { filter, json } => {
            let flags = ListFlags::extract(filter).unwrap_or_else(|e| user_error(&e));
            let role = match flags.role.as_deref() {
                Some(name) => resolve_role(Some(name), config),
                None => role,
            };
            handle_list(config, role, flags.filter, json || flags.json)
        }
        Commands::Board { json } => handle_board(config, role, json),
        Commands::Counts { json } => handle_counts(config, role, json),
        Commands::Stages { json } => handle_stages(role, json),
        Commands::Show { id, json } => handle_show(config, role, &id, json),
        Commands::Sections { json } => handle_sections(role, json),
        Commands::Audit { json } => handle_audit(config, json),
    }
}

/// Flags given after the first filter token land in the trailing filter list;
/// they are pulled back out here so only filter terms reach the parser.
#[derive(Debug, Default, PartialEq)]
struct ListFlags {
    filter: Vec<String>,
    json: bool,
    role: Option<String>,
}

impl ListFlags {
    fn extract(args: Vec<String>) -> Result<Self, String> {
        let mut flags = ListFlags::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            if arg == "--json" {
                flags.json = true;
            } else if arg == "--role" {
                let value = args.next()
                    .ok_or_else(|| "Option '--role' requires a value.".to_string())?;
                flags.role = Some(value);
            } else if let Some(value) = arg.strip_prefix("--role=") {
                flags.role = Some(value.to_string());
            } else {
                flags.filter.push(arg);
            }
        }
        Ok(flags)
    }
}

/// `--role` wins over the rc file; admin when neither is set
fn resolve_role(flag: Option<&str>, config: &Config) -> Role {
    match flag.or(config.role.as_deref()) {
        Some(name) => parse_role(name).unwrap_or_else(|e| user_error(&e)),
        None => Role::Admin,
    }
}

fn load_orders(config: &Config) -> Result<Vec<Order>> {
    let conn = DbConnection::connect(config)
        .context("Failed to connect to database")?;
    OrderRepo::list_all(&conn).context("Failed to list orders")
}

/// An order is shown to a role when any stage claiming it (overlay included)
/// is visible to that role. Admin also sees unstaged orders.
fn visible_to_role(order: &Order, role: Role, now: DateTime<Local>) -> bool {
    role == Role::Admin
        || matching_stages(order, now)
            .into_iter()
            .any(|id| stage_config(id).is_visible_to(role))
}

fn order_json(order: &Order, now: DateTime<Local>) -> serde_json::Value {
    let stage = get_order_stage_at(order, now);
    serde_json::json!({
        "order": OrderRecord::from(order),
        "stage": stage.map(|s| s.id),
        "at_risk": is_at_risk_at(order, now),
        "risk_reasons": risk_reasons_at(order, now)
            .iter()
            .map(|r| r.describe())
            .collect::<Vec<_>>(),
    })
}

fn read_snapshot(file: &str) -> Result<String> {
    if file == "-" {
        let mut contents = String::new();
        std::io::stdin()
            .read_to_string(&mut contents)
            .context("Failed to read snapshot from stdin")?;
        return Ok(contents);
    }
    let path = std::path::Path::new(file);
    if !path.exists() {
        user_error(&format!("Snapshot file not found: {}", file));
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read snapshot: {}", file))
}

fn first_duplicate_id(orders: &[Order]) -> Option<i64> {
    let mut seen = HashSet::new();
    orders.iter().map(|o| o.id).find(|id| !seen.insert(*id))
}

fn handle_import(config: &Config, file: &str, replace: bool) -> Result<()> {
    let contents = read_snapshot(file)?;
    let records: Vec<OrderRecord> = serde_json::from_str(&contents)
        .unwrap_or_else(|e| user_error(&format!("Invalid order snapshot in {}: {}", file, e)));

    let orders = records
        .into_iter()
        .map(Order::try_from)
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|e| user_error(&format!("Invalid order snapshot in {}: {}", file, e)));

    if let Some(id) = first_duplicate_id(&orders) {
        user_error(&format!("Invalid order snapshot in {}: order {} appears more than once", file, id));
    }

    let conn = DbConnection::connect(config)
        .context("Failed to connect to database")?;
    let source = if file == "-" { "stdin" } else { file };
    let record = OrderRepo::import_snapshot(&conn, source, &orders, replace)?;
    print!("{}", format_import(&record));
    Ok(())
}

fn handle_list(config: &Config, role: Role, filter_args: Vec<String>, json: bool) -> Result<()> {
    let filter_expr = parse_filter(filter_args)
        .unwrap_or_else(|e| user_error(&format!("Filter parse error: {}", e)));

    let orders = load_orders(config)?;
    let now = Local::now();
    let selected: Vec<&Order> = filter_orders(&orders, &filter_expr, now)
        .into_iter()
        .filter(|o| visible_to_role(o, role, now))
        .collect();

    if json {
        let json_orders: Vec<serde_json::Value> = selected.iter().map(|o| order_json(o, now)).collect();
        println!("{}", serde_json::to_string_pretty(&json_orders)?);
    } else {
        print!("{}", format_order_table(&selected, now, is_tty()));
    }
    Ok(())
}

fn handle_board(config: &Config, role: Role, json: bool) -> Result<()> {
    let orders = load_orders(config)?;
    let now = Local::now();
    let stages = get_visible_stages(role);
    let columns = group_by_stage(&orders, &stages, now);

    if json {
        let json_columns: Vec<serde_json::Value> = columns.iter().map(|column| {
            serde_json::json!({
                "stage": column.stage.id,
                "label": column.stage.label,
                "count": column.orders.len(),
                "orders": column.orders.iter().map(|o| o.id).collect::<Vec<_>>(),
            })
        }).collect();
        println!("{}", serde_json::to_string_pretty(&json_columns)?);
        return Ok(());
    }

    print!("{}", format_board(&columns, now, is_tty()));
    if role == Role::Admin {
        let unstaged = unstaged_orders(&orders, now);
        if !unstaged.is_empty() {
            println!(
                "{} order{} in no stage (run `rhos audit` for details)",
                unstaged.len(),
                if unstaged.len() == 1 { "" } else { "s" }
            );
        }
    }
    Ok(())
}

fn handle_counts(config: &Config, role: Role, json: bool) -> Result<()> {
    let orders = load_orders(config)?;
    let mut counts = compute_stage_counts_at(&orders, Local::now());
    counts.retain_stages(&visible_stage_ids(role));

    if json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
    } else {
        print!("{}", format_counts(&counts));
    }
    Ok(())
}

fn handle_stages(role: Role, json: bool) -> Result<()> {
    let stages: Vec<&'static StageConfig> = STAGE_REGISTRY.iter().collect();

    if json {
        let json_stages: Vec<serde_json::Value> = stages.iter().map(|stage| {
            serde_json::json!({
                "id": stage.id,
                "label": stage.label,
                "description": stage.description,
                "icon": stage.icon,
                "color_class": stage.color_class,
                "bg_class": stage.bg_class,
                "border_class": stage.border_class,
                "primary_action": {
                    "label": stage.primary_action.label,
                    "roles": stage.primary_action.roles,
                },
                "visible_to_roles": stage.visible_to_roles,
                "visible": stage.is_visible_to(role),
            })
        }).collect();
        println!("{}", serde_json::to_string_pretty(&json_stages)?);
    } else {
        print!("{}", format_stages(&stages, role, is_tty()));
    }
    Ok(())
}

fn handle_show(config: &Config, role: Role, id: &str, json: bool) -> Result<()> {
    let order_id = validate_order_id(id).unwrap_or_else(|e| user_error(&e));

    let conn = DbConnection::connect(config)
        .context("Failed to connect to database")?;
    let order = match OrderRepo::get_by_id(&conn, order_id)? {
        Some(order) => order,
        None => user_error(&format!("Order {} not found", order_id)),
    };
    let now = Local::now();

    if json {
        let stage = get_order_stage_at(&order, now);
        let sections = visible_sections(role, true);
        let (default, advanced): (Vec<_>, Vec<_>) = sections
            .into_iter()
            .partition(|s| section_visibility(role, *s) == SectionVisibility::Default);
        let mut value = order_json(&order, now);
        value["role"] = serde_json::json!(role);
        value["default_module"] =
            serde_json::json!(get_default_module(role, stage.map(|s| s.id), Some(order.status)));
        value["sections"] = serde_json::json!({ "default": default, "advanced": advanced });
        value["primary_action"] = match stage {
            Some(stage) => serde_json::json!({
                "label": stage.primary_action.label,
                "allowed": can_perform_primary_action(role, stage.id),
            }),
            None => serde_json::Value::Null,
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", format_order_detail(&order, role, now, is_tty()));
    }
    Ok(())
}

fn handle_sections(role: Role, json: bool) -> Result<()> {
    if json {
        let config = crate::detail::role_section_config(role);
        let gaps = section_config_gaps(role);
        let value = serde_json::json!({
            "role": role,
            "default_module": config.default_module,
            "default_visible": config.default_visible,
            "advanced_sections": config.advanced_sections,
            "overlapping": gaps.overlapping,
            "unlisted": gaps.unlisted,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", format_sections(role));
    }
    Ok(())
}

fn handle_audit(config: &Config, json: bool) -> Result<()> {
    let orders = load_orders(config)?;
    let findings = audit_orders(&orders, Local::now());

    if json {
        let value = serde_json::json!({
            "orders": orders.len(),
            "findings": findings,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", format_audit(&findings, orders.len()));
    }
    Ok(())
}
