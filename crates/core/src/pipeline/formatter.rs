use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::finance::FinancialSummary;
use crate::domain::intent::Intent;
use crate::domain::inventory::{InventoryReport, InventorySnapshot, CRITICAL_COVERAGE_DAYS};
use crate::domain::region::{capitalize, Region};
use crate::domain::sales::{
    period_label, ProductSales, RegionalPerformance, SalesPatternSummary, WeatherImpact,
};
use crate::domain::ticket::TicketSnapshot;
use crate::pipeline::payload::{DataResult, DecisionResult, Report};

pub const GREETING: &str = "I'm Inventra, your AI assistant. How can I help?";
pub const NO_RECOMMENDATIONS: &str = "No recommendations available.";
pub const NO_OPPORTUNITIES: &str = "No opportunities identified.";
pub const NO_VENDOR_RECOMMENDATIONS: &str = "No vendor recommendations available.";
pub const NO_SALES_DATA: &str = "No sales data found";
pub const NO_FINANCE_DATA: &str = "No finance data found";

const MAX_LISTED_ITEMS: usize = 10;
const PRODUCT_NAME_WIDTH: usize = 25;

/// Renders the final answer. Exactly one rule per intent; `General` gets the greeting.
pub fn format_response(
    intent: Intent,
    data: &DataResult,
    decision: &DecisionResult,
    region: Option<Region>,
) -> String {
    match intent {
        Intent::InventoryStatus => match data {
            DataResult::Inventory(snapshot) => format_inventory(snapshot, region),
            _ => format_inventory(&InventorySnapshot::default(), region),
        },
        Intent::SalesAnalysis => match data {
            DataResult::Sales(report) => format_sales(report),
            _ => format_sales(&Report::unavailable(NO_SALES_DATA)),
        },
        Intent::FinancialReport => match data {
            DataResult::Financial(report) => format_financial(report, region),
            _ => format_financial(&Report::unavailable(NO_FINANCE_DATA), region),
        },
        Intent::TicketStatus => match data {
            DataResult::Tickets(snapshot) => format_tickets(snapshot),
            _ => format_tickets(&TicketSnapshot::default()),
        },
        Intent::ReorderRecommendation => {
            decision.analysis().unwrap_or(NO_RECOMMENDATIONS).to_string()
        }
        Intent::SalesOpportunity => decision.analysis().unwrap_or(NO_OPPORTUNITIES).to_string(),
        Intent::VendorSelection => {
            decision.analysis().unwrap_or(NO_VENDOR_RECOMMENDATIONS).to_string()
        }
        Intent::General => GREETING.to_string(),
    }
}

pub fn format_inventory(snapshot: &InventorySnapshot, region: Option<Region>) -> String {
    let header = match region {
        Some(region) => format!("INVENTORY STATUS in {} region", region.canonical_name()),
        None => "INVENTORY STATUS".to_string(),
    };

    let mut lines = vec![
        header,
        String::new(),
        format!("Total items: {}", snapshot.total_items),
        format!("Low stock alerts: {}", snapshot.low_stock_count),
        String::new(),
    ];

    if !snapshot.category_summary.is_empty() {
        lines.push("INVENTORY BY CATEGORY:".to_string());
        lines.extend(
            snapshot.category_summary.iter().map(|(category, qty)| format!("- {category}: {qty} units")),
        );
        lines.push(String::new());
    }

    if region.is_none() && !snapshot.region_summary.is_empty() {
        lines.push("INVENTORY BY REGION:".to_string());
        lines.extend(
            snapshot
                .region_summary
                .iter()
                .map(|(name, qty)| format!("- {}: {qty} units", capitalize(name))),
        );
        lines.push(String::new());
    }

    if snapshot.low_stock_items.is_empty() {
        lines.push("All items adequately stocked!".to_string());
    } else {
        lines.push("LOW STOCK ITEMS:".to_string());
        lines.extend(snapshot.low_stock_items.iter().take(MAX_LISTED_ITEMS).map(|item| {
            format!(
                "- {} ({}): {} units (threshold: {})",
                item.name, item.sku, item.qty, item.reorder_threshold
            )
        }));
    }

    lines.join("\n")
}

pub fn format_sales(report: &Report<SalesPatternSummary>) -> String {
    let summary = match report {
        Report::Ready(summary) => summary,
        Report::Unavailable { error } => return format!("Sales Analysis: {error}"),
    };

    format!(
        "SALES ANALYSIS ({})\n\nTotal sales: {} units\nTotal revenue: {}\nAvg daily sales: {:.1} units",
        summary.period,
        summary.total_units,
        format_currency(summary.total_revenue),
        summary.avg_daily_units
    )
}

pub fn format_financial(report: &Report<FinancialSummary>, region: Option<Region>) -> String {
    let summary = match report {
        Report::Ready(summary) => summary,
        Report::Unavailable { error } => return format!("Financial Report: {error}"),
    };

    let region_suffix = region
        .map(|region| format!(" for {} region", region.canonical_name()))
        .unwrap_or_default();

    let mut lines = vec![
        format!("FINANCIAL SUMMARY ({}){region_suffix}", summary.period),
        String::new(),
        format!("Total sales: {}", format_currency(summary.total_sales)),
        format!("Total purchases: {}", format_currency(summary.total_purchases)),
        format!("Net profit: {}", format_currency(summary.net_profit)),
    ];

    if summary.total_sales > Decimal::ZERO {
        if let Some(margin) = summary.profit_margin_pct() {
            lines.push(format!("Profit margin: {}%", format_fixed(margin, 1)));
        }
    }

    lines.join("\n")
}

pub fn format_tickets(snapshot: &TicketSnapshot) -> String {
    let mut lines = vec![
        "TICKET STATUS".to_string(),
        String::new(),
        format!("Total pending: {}", snapshot.stats.total_pending),
        format!("Total value: {}", format_currency(snapshot.stats.total_value)),
        String::new(),
    ];

    if !snapshot.tickets.is_empty() {
        lines.push("RECENT TICKETS:".to_string());
        lines.extend(snapshot.tickets.iter().take(MAX_LISTED_ITEMS).map(|ticket| {
            let name: String = ticket
                .product_name
                .as_deref()
                .filter(|name| !name.is_empty())
                .unwrap_or("N/A")
                .chars()
                .take(PRODUCT_NAME_WIDTH)
                .collect();
            format!(
                "#{:>3} | {:<8} | {:<25} | Qty: {:>3} | {:<6}",
                ticket.id.0,
                ticket.sku,
                name,
                ticket.recommended_qty,
                ticket.priority.as_str()
            )
        }));
    }

    lines.join("\n")
}

pub fn format_inventory_report(report: &InventoryReport, region: Option<Region>) -> String {
    let period = period_label(report.window_days);
    let mut lines = vec![
        format_inventory(&report.snapshot, region),
        String::new(),
        format!("Sales velocity ({period}): {:.1} units/day", report.avg_daily_units),
        format!("Revenue ({period}): {}", format_currency(report.revenue)),
        String::new(),
    ];

    if report.critical_items.is_empty() {
        lines.push(format!("No items at risk of stockout within {CRITICAL_COVERAGE_DAYS:.0} days."));
    } else {
        lines.push(format!("CRITICAL ITEMS (under {CRITICAL_COVERAGE_DAYS:.0} days of stock):"));
        lines.extend(report.critical_items.iter().take(MAX_LISTED_ITEMS).map(|item| {
            format!(
                "- {}: {} units, {:.1} days left at {:.1} units/day",
                item.sku, item.qty, item.coverage_days, item.avg_daily_sales
            )
        }));
    }

    lines.join("\n")
}

pub fn format_trending_products(products: &[ProductSales], window_days: u32) -> String {
    let mut lines = vec![format!("TRENDING PRODUCTS ({})", period_label(window_days)), String::new()];
    if products.is_empty() {
        lines.push("No products reached the minimum sales.".to_string());
    } else {
        lines.extend(products.iter().map(|product| {
            format!("- {}: {} units, {}", product.sku, product.units, format_currency(product.revenue))
        }));
    }
    lines.join("\n")
}

pub fn format_regional_performance(report: &Report<RegionalPerformance>) -> String {
    let performance = match report {
        Report::Ready(performance) => performance,
        Report::Unavailable { error } => return format!("Regional Performance: {error}"),
    };

    let mut lines = vec![format!("REGIONAL PERFORMANCE ({})", performance.period), String::new()];
    lines.extend(performance.regions.iter().map(|region| {
        format!(
            "- {}: {} units, {} over {} sales (avg {})",
            capitalize(&region.region),
            region.total_units,
            format_currency(region.total_revenue),
            region.transaction_count,
            format_currency(region.avg_transaction_size)
        )
    }));
    lines.push(String::new());
    lines.push(format!("Best region: {}", capitalize(&performance.best_region)));
    lines.push(format!("Total revenue: {}", format_currency(performance.total_revenue)));
    lines.join("\n")
}

pub fn format_weather_impact(report: &Report<WeatherImpact>) -> String {
    let impact = match report {
        Report::Ready(impact) => impact,
        Report::Unavailable { error } => return format!("Weather Impact: {error}"),
    };

    let mut lines = vec![
        format!("WEATHER IMPACT ({})", impact.category),
        String::new(),
        format!(
            "Best selling condition: {} ({} units)",
            impact.best_condition, impact.best_condition_units
        ),
    ];
    if let Some(range) = &impact.temperature_range {
        lines.push(format!(
            "Temperature: {:.1} to {:.1}°C (avg {:.1}°C)",
            range.min, range.max, range.avg
        ));
    }
    lines.push(String::new());
    lines.extend(impact.conditions.iter().map(|condition| {
        let mut line = format!("- {}: {} units", condition.condition, condition.total_units);
        if let Some(temperature) = condition.avg_temperature {
            line.push_str(&format!(", avg {temperature:.1}°C"));
        }
        if let Some(rainfall) = condition.avg_rainfall {
            line.push_str(&format!(", avg {rainfall:.1}mm rain"));
        }
        line
    }));
    lines.join("\n")
}

/// `Rs` amount with thousands grouping and two decimals, e.g. `Rs 1,234,567.89`.
pub fn format_currency(amount: Decimal) -> String {
    let fixed = format_fixed(amount, 2);
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, "00"));
    format!("Rs {sign}{}.{fraction}", group_thousands(whole))
}

fn format_fixed(value: Decimal, places: u32) -> String {
    let rounded = value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    let rounded = if rounded.is_zero() { Decimal::ZERO } else { rounded };
    format!("{:.*}", places as usize, rounded)
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
