// Output formatting utilities

use crate::detail::{
    get_default_module, role_section_config, section_config_gaps, visible_sections,
    SectionVisibility, section_visibility,
};
use crate::models::{Order, Role, StageConfig};
use crate::pipeline::{
    can_perform_primary_action, get_order_stage_at, needs_attention, risk_reasons_at,
    AuditFinding, StageColumn, StageCounts,
};
use crate::repo::ImportRecord;
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use std::io::IsTerminal;

// ANSI escape codes for terminal formatting
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";

const ANSI_FG_RED: &str = "\x1b[31m";
const ANSI_FG_GREEN: &str = "\x1b[32m";
const ANSI_FG_YELLOW: &str = "\x1b[33m";
const ANSI_FG_BLUE: &str = "\x1b[34m";
const ANSI_FG_MAGENTA: &str = "\x1b[35m";
const ANSI_FG_CYAN: &str = "\x1b[36m";
const ANSI_FG_BRIGHT_BLACK: &str = "\x1b[90m";
const ANSI_FG_BRIGHT_BLUE: &str = "\x1b[94m";

/// Map a stage's text color class (e.g. `text-amber-600`) to an ANSI foreground
fn color_class_to_fg(class: &str) -> Option<&'static str> {
    let name = class.strip_prefix("text-")?.split('-').next()?;
    match name {
        "gray" | "slate" => Some(ANSI_FG_BRIGHT_BLACK),
        "red" => Some(ANSI_FG_RED),
        "green" | "emerald" => Some(ANSI_FG_GREEN),
        "amber" | "yellow" | "orange" => Some(ANSI_FG_YELLOW),
        "blue" => Some(ANSI_FG_BLUE),
        "indigo" => Some(ANSI_FG_BRIGHT_BLUE),
        "purple" | "violet" => Some(ANSI_FG_MAGENTA),
        "cyan" | "teal" => Some(ANSI_FG_CYAN),
        _ => None,
    }
}

/// Check if stdout is a terminal (TTY)
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width dynamically
///
/// Uses the `terminal_size` crate, with fallback to the COLUMNS environment
/// variable and a sensible default.
pub fn get_terminal_width() -> usize {
    if let Some((terminal_size::Width(w), _)) = terminal_size::terminal_size() {
        if w > 0 {
            return w as usize;
        }
    }

    if let Ok(cols) = std::env::var("COLUMNS") {
        if let Ok(width) = cols.parse::<usize>() {
            if width > 0 && width < 10000 {
                return width;
            }
        }
    }

    120
}

fn bold_if_tty(text: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", ANSI_BOLD, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

fn stage_colored(stage: &StageConfig, text: &str, is_tty: bool) -> String {
    match (is_tty, color_class_to_fg(stage.color_class)) {
        (true, Some(fg)) => format!("{}{}{}", fg, text, ANSI_RESET),
        _ => text.to_string(),
    }
}

/// Format date for display
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format timestamp for display in local time
pub fn format_timestamp(ts: i64) -> String {
    Local
        .timestamp_opt(ts, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Format a delivery date relative to today (e.g. "in 3 days", "2 days late")
pub fn format_relative_date(date: NaiveDate, today: NaiveDate) -> String {
    let days_diff = (date - today).num_days();
    match days_diff {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        -1 => "1 day late".to_string(),
        d if d < 0 => format!("{} days late", -d),
        d if d <= 60 => format!("in {} days", d),
        _ => format_date(date),
    }
}

/// Truncate to `width` characters, marking the cut with ".."
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let keep = width.saturating_sub(2);
    format!("{}..", text.chars().take(keep).collect::<String>())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrderColumn {
    Id,
    Code,
    Name,
    Status,
    Stage,
    Priority,
    Due,
    Risk,
}

const ORDER_COLUMNS: [OrderColumn; 8] = [
    OrderColumn::Id,
    OrderColumn::Code,
    OrderColumn::Name,
    OrderColumn::Status,
    OrderColumn::Stage,
    OrderColumn::Priority,
    OrderColumn::Due,
    OrderColumn::Risk,
];

fn column_label(column: OrderColumn) -> &'static str {
    match column {
        OrderColumn::Id => "ID",
        OrderColumn::Code => "Code",
        OrderColumn::Name => "Name",
        OrderColumn::Status => "Status",
        OrderColumn::Stage => "Stage",
        OrderColumn::Priority => "Priority",
        OrderColumn::Due => "Est. Delivery",
        OrderColumn::Risk => "Risk",
    }
}

/// Lower number = more important; the least important columns are hidden first
fn column_priority(column: OrderColumn) -> u8 {
    match column {
        OrderColumn::Id => 1,
        OrderColumn::Stage => 2,
        OrderColumn::Risk => 3,
        OrderColumn::Code => 4,
        OrderColumn::Name => 5,
        OrderColumn::Due => 6,
        OrderColumn::Priority => 7,
        OrderColumn::Status => 8,
    }
}

const NAME_MIN_WIDTH: usize = 12;

struct OrderRow {
    stage: Option<&'static StageConfig>,
    values: Vec<String>,
}

fn order_row(order: &Order, now: DateTime<Local>) -> OrderRow {
    let stage = get_order_stage_at(order, now);
    let reasons = risk_reasons_at(order, now);
    let risk = if reasons.is_empty() {
        String::new()
    } else if needs_attention(order, now) {
        "!".repeat(reasons.len())
    } else {
        // At risk but already shipped or completed
        "-".to_string()
    };

    let values = ORDER_COLUMNS
        .iter()
        .map(|column| match column {
            OrderColumn::Id => order.id.to_string(),
            OrderColumn::Code => order.order_code.clone().unwrap_or_default(),
            OrderColumn::Name => order.order_name.clone().unwrap_or_default(),
            OrderColumn::Status => order.status.as_str().to_string(),
            OrderColumn::Stage => stage.map_or("-", |s| s.label).to_string(),
            OrderColumn::Priority => order.priority.as_str().to_string(),
            OrderColumn::Due => order
                .est_delivery
                .map(|d| format_relative_date(d, now.date_naive()))
                .unwrap_or_default(),
            OrderColumn::Risk => risk.clone(),
        })
        .collect();

    OrderRow { stage, values }
}

/// Format orders as a table sized to the terminal
pub fn format_order_table(orders: &[&Order], now: DateTime<Local>, is_tty: bool) -> String {
    if orders.is_empty() {
        return "No orders found.\n".to_string();
    }

    let rows: Vec<OrderRow> = orders.iter().map(|o| order_row(o, now)).collect();

    let mut widths: Vec<usize> = ORDER_COLUMNS
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            rows.iter()
                .map(|r| r.values[idx].chars().count())
                .max()
                .unwrap_or(0)
                .max(column_label(*column).len())
        })
        .collect();

    // Skip columns that are empty for every row
    let mut visible: Vec<usize> = (0..ORDER_COLUMNS.len())
        .filter(|&idx| rows.iter().any(|r| !r.values[idx].is_empty()))
        .collect();

    let total = |visible: &[usize], widths: &[usize]| -> usize {
        visible.iter().map(|&i| widths[i]).sum::<usize>() + visible.len().saturating_sub(1)
    };

    let target_width = get_terminal_width();

    // Truncate the name first, then hide columns by priority
    let name_idx = 2;
    let current = total(&visible, &widths);
    if current > target_width && visible.contains(&name_idx) {
        let excess = current - target_width;
        widths[name_idx] = widths[name_idx].saturating_sub(excess).max(NAME_MIN_WIDTH);
    }
    while total(&visible, &widths) > target_width && visible.len() > 2 {
        let hide = visible
            .iter()
            .copied()
            .filter(|&i| column_priority(ORDER_COLUMNS[i]) > 2)
            .max_by_key(|&i| column_priority(ORDER_COLUMNS[i]));
        match hide {
            Some(idx) => visible.retain(|&i| i != idx),
            None => break,
        }
    }

    let mut output = String::new();

    let header: Vec<String> = visible
        .iter()
        .map(|&i| format!("{:<width$}", column_label(ORDER_COLUMNS[i]), width = widths[i]))
        .collect();
    output.push_str(&bold_if_tty(header.join(" ").trim_end(), is_tty));
    output.push('\n');
    let separator: Vec<String> = visible.iter().map(|&i| "─".repeat(widths[i])).collect();
    output.push_str(&separator.join(" "));
    output.push('\n');

    for row in &rows {
        let cells: Vec<String> = visible
            .iter()
            .map(|&i| {
                let text = truncate(&row.values[i], widths[i]);
                let padded = format!("{:<width$}", text, width = widths[i]);
                match (ORDER_COLUMNS[i], row.stage) {
                    (OrderColumn::Stage, Some(stage)) => stage_colored(stage, &padded, is_tty),
                    _ => padded,
                }
            })
            .collect();
        output.push_str(cells.join(" ").trim_end());
        output.push('\n');
    }

    output.push_str(&format!("\n{} order{}\n", rows.len(), if rows.len() == 1 { "" } else { "s" }));
    output
}

/// One-line summary used inside board columns
fn order_summary_line(order: &Order, now: DateTime<Local>) -> String {
    let mut line = format!("  {:>5} {}", order.id, order.display_code());
    if let Some(name) = &order.order_name {
        line.push_str(&format!(" {}", name));
    }
    if let Some(due) = order.est_delivery {
        line.push_str(&format!(" due={}", format_date(due)));
    }
    let reasons = risk_reasons_at(order, now);
    if !reasons.is_empty() {
        let described: Vec<String> = reasons.iter().map(|r| r.describe()).collect();
        line.push_str(&format!(" [{}]", described.join(", ")));
    }
    line
}

/// Kanban board: one section per visible stage
pub fn format_board(columns: &[StageColumn], now: DateTime<Local>, is_tty: bool) -> String {
    let mut output = String::new();
    for column in columns {
        let heading = format!("=== {} ({}) ===", column.stage.label, column.orders.len());
        output.push_str(&stage_colored(column.stage, &bold_if_tty(&heading, is_tty), is_tty));
        output.push('\n');
        if column.orders.is_empty() {
            output.push_str("  (empty)\n");
        }
        for order in &column.orders {
            output.push_str(&order_summary_line(order, now));
            output.push('\n');
        }
        output.push('\n');
    }
    output
}

/// Stage counts in registry order
pub fn format_counts(counts: &StageCounts) -> String {
    let mut output = String::new();
    for (id, count) in counts.iter() {
        let label = crate::pipeline::stage_config(id).label;
        output.push_str(&format!("{:<22} {:>5}\n", label, count));
    }
    output
}

/// Registry listing for `stages`
pub fn format_stages(stages: &[&'static StageConfig], role: Role, is_tty: bool) -> String {
    let mut output = String::new();
    for stage in stages {
        let roles: Vec<&str> = stage.visible_to_roles.iter().map(|r| r.as_str()).collect();
        let action_marker = if can_perform_primary_action(role, stage.id) { "*" } else { " " };
        output.push_str(&format!(
            "{:<22} {}\n    {}\n    action: {}{} | visible to: {}\n",
            stage.id.as_str(),
            stage_colored(stage, stage.label, is_tty),
            stage.description,
            stage.primary_action.label,
            action_marker,
            roles.join(", ")
        ));
    }
    output.push_str(&format!("\n* = available to role '{}'\n", role.as_str()));
    output
}

/// Order detail as seen by a role
pub fn format_order_detail(order: &Order, role: Role, now: DateTime<Local>, is_tty: bool) -> String {
    let mut output = String::new();
    let stage = get_order_stage_at(order, now);

    let title = match &order.order_name {
        Some(name) => format!("Order {} - {}", order.display_code(), name),
        None => format!("Order {}", order.display_code()),
    };
    output.push_str(&bold_if_tty(&title, is_tty));
    output.push('\n');

    output.push_str(&format!("{:<16} {}\n", "ID:", order.id));
    output.push_str(&format!("{:<16} {}\n", "Status:", order.status.as_str()));
    let stage_text = match stage {
        Some(s) => stage_colored(s, s.label, is_tty),
        None => "(none)".to_string(),
    };
    output.push_str(&format!("{:<16} {}\n", "Stage:", stage_text));
    output.push_str(&format!("{:<16} {}\n", "Priority:", order.priority.as_str()));
    if let Some(due) = order.est_delivery {
        output.push_str(&format!(
            "{:<16} {} ({})\n",
            "Est. Delivery:",
            format_date(due),
            format_relative_date(due, now.date_naive())
        ));
    }
    output.push_str(&format!(
        "{:<16} {}\n",
        "Created:",
        order.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    ));
    if let Some(salesperson) = &order.salesperson_id {
        output.push_str(&format!("{:<16} {}\n", "Salesperson:", salesperson));
    }

    let check = |done: bool| if done { "[x]" } else { "[ ]" };
    output.push_str(&format!(
        "{:<16} {} design approved  {} sizes validated  {} deposit received  {} invoiced\n",
        "Milestones:",
        check(order.design_approved),
        check(order.sizes_validated),
        check(order.deposit_received),
        check(order.has_invoice())
    ));

    let reasons = risk_reasons_at(order, now);
    if !reasons.is_empty() {
        let described: Vec<String> = reasons.iter().map(|r| r.describe()).collect();
        output.push_str(&format!("{:<16} {}\n", "At risk:", described.join(", ")));
    }

    if let Some(stage) = stage {
        let allowed = if can_perform_primary_action(role, stage.id) {
            "available"
        } else {
            "not available to this role"
        };
        output.push_str(&format!("{:<16} {} ({})\n", "Next action:", stage.primary_action.label, allowed));
    }

    let module = get_default_module(role, stage.map(|s| s.id), Some(order.status));
    output.push_str(&format!("\nOpens on: {}\n", module.as_str()));
    output.push_str(&format_section_lists(role));
    output
}

fn format_section_lists(role: Role) -> String {
    let all = visible_sections(role, true);
    let (default, advanced): (Vec<_>, Vec<_>) = all
        .iter()
        .partition(|s| section_visibility(role, **s) == SectionVisibility::Default);
    let names = |sections: &[&crate::detail::SectionId]| -> String {
        sections.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
    };
    format!(
        "Sections:        {}\nAdvanced:        {}\n",
        names(&default),
        if advanced.is_empty() { "(none)".to_string() } else { names(&advanced) }
    )
}

/// Role section configuration, including any listing gaps
pub fn format_sections(role: Role) -> String {
    let config = role_section_config(role);
    let mut output = format!("Role: {}\nDefault module: {}\n", role.as_str(), config.default_module.as_str());
    output.push_str(&format_section_lists(role));

    let gaps = section_config_gaps(role);
    if !gaps.overlapping.is_empty() {
        let names: Vec<&str> = gaps.overlapping.iter().map(|s| s.as_str()).collect();
        output.push_str(&format!("Listed twice:    {}\n", names.join(", ")));
    }
    if !gaps.unlisted.is_empty() {
        let names: Vec<&str> = gaps.unlisted.iter().map(|s| s.as_str()).collect();
        output.push_str(&format!("Hidden:          {}\n", names.join(", ")));
    }
    output
}

/// Audit findings, one per line
pub fn format_audit(findings: &[AuditFinding], order_count: usize) -> String {
    if findings.is_empty() {
        return format!("No classification issues across {} order{}.\n", order_count, if order_count == 1 { "" } else { "s" });
    }
    let mut output = String::new();
    for finding in findings {
        output.push_str(&finding.describe());
        output.push('\n');
    }
    output.push_str(&format!(
        "\n{} finding{} across {} order{}\n",
        findings.len(),
        if findings.len() == 1 { "" } else { "s" },
        order_count,
        if order_count == 1 { "" } else { "s" }
    ));
    output
}

/// Import confirmation line
pub fn format_import(record: &ImportRecord) -> String {
    format!(
        "Imported {} order{} from {}{} at {}\n",
        record.order_count,
        if record.order_count == 1 { "" } else { "s" },
        record.source,
        if record.replaced { " (replaced existing snapshot)" } else { "" },
        format_timestamp(record.imported_ts)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderStatus, Priority};

    #[test]
    fn test_color_class_to_fg() {
        assert_eq!(color_class_to_fg("text-amber-600"), Some(ANSI_FG_YELLOW));
        assert_eq!(color_class_to_fg("text-red-600"), Some(ANSI_FG_RED));
        assert_eq!(color_class_to_fg("bg-red-50"), None);
        assert_eq!(color_class_to_fg("text-pink-600"), None);
    }

    #[test]
    fn test_format_relative_date() {
        let today = NaiveDate::from_ymd_opt(2026, 5, 10).unwrap();
        let day = |d: u32| NaiveDate::from_ymd_opt(2026, 5, d).unwrap();
        assert_eq!(format_relative_date(day(10), today), "today");
        assert_eq!(format_relative_date(day(11), today), "tomorrow");
        assert_eq!(format_relative_date(day(9), today), "1 day late");
        assert_eq!(format_relative_date(day(7), today), "3 days late");
        assert_eq!(format_relative_date(day(20), today), "in 10 days");
        let far = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        assert_eq!(format_relative_date(far, today), "2027-01-01");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Varsity Team Hoodies", 10), "Varsity ..");
    }

    #[test]
    fn test_order_table_plain() {
        let mut order = Order::new(42).with_status(OrderStatus::Production).with_priority(Priority::High);
        order.order_code = Some("RH-42".to_string());
        let table = format_order_table(&[&order], Local::now(), false);
        assert!(table.starts_with("ID"));
        assert!(table.contains("In Production"));
        assert!(table.contains("RH-42"));
        assert!(table.contains("1 order\n"));
        assert!(!table.contains("\x1b["));
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(format_order_table(&[], Local::now(), false), "No orders found.\n");
    }

    #[test]
    fn test_order_detail_for_finance() {
        let order = Order::new(8).with_status(OrderStatus::SizesValidated);
        let detail = format_order_detail(&order, Role::Finance, Local::now(), false);
        assert!(detail.contains("Stage:           Ready to Invoice"));
        assert!(detail.contains("Next action:     Create Invoice (available)"));
        assert!(detail.contains("Opens on: invoice"));
    }

    #[test]
    fn test_format_sections_lists_hidden() {
        let text = format_sections(Role::Manufacturer);
        assert!(text.contains("Default module: manufacturing"));
        assert!(text.contains("Hidden:          customer, invoice, payments, activity"));
    }
}
