//! Transaction totals and chart data for the dashboard.
//!
//! Everything here works on transactions that have already been fetched,
//! most recent first.

use serde::Serialize;

use crate::transaction::{Transaction, TransactionType};

/// How many transactions the "recent" lists hold.
pub const RECENT_LIMIT: usize = 5;

/// Colours assigned to pie-chart slices, cycled by position.
pub const PIE_CHART_PALETTE: [&str; 5] = ["#2848ff", "#36932e", "#FFBB28", "#9b2929", "#bc3385"];

/// One category in a pie chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChartSlice {
    /// The category as written on the first transaction in the group.
    pub name: String,
    /// The summed amount.
    pub value: f64,
    /// The slice colour.
    pub fill: &'static str,
}

/// Group `transactions` by category and sum their amounts.
///
/// Categories are compared after trimming and lowercasing, so "Food " and
/// "food" share a slice. A slice takes its colour from the position of the
/// transaction that started it, not from the slice's own position. Slices
/// are returned in order of first appearance.
pub fn build_pie_chart(transactions: &[Transaction]) -> Vec<PieChartSlice> {
    let mut keys: Vec<String> = Vec::new();
    let mut slices: Vec<PieChartSlice> = Vec::new();

    for (index, transaction) in transactions.iter().enumerate() {
        let name = transaction.category.trim();
        let key = name.to_lowercase();

        match keys.iter().position(|existing| *existing == key) {
            Some(position) => slices[position].value += transaction.amount,
            None => {
                keys.push(key);
                slices.push(PieChartSlice {
                    name: name.to_owned(),
                    value: transaction.amount,
                    fill: PIE_CHART_PALETTE[index % PIE_CHART_PALETTE.len()],
                });
            }
        }
    }

    slices
}

/// The numbers and lists shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    /// Total income minus total expenses.
    pub total_balance: f64,
    /// Sum of all income.
    pub total_income: f64,
    /// Sum of all expenses.
    pub total_expense: f64,
    /// The most recent transactions of either type.
    pub recent_transactions: Vec<Transaction>,
    /// The most recent income.
    pub recent_incomes: Vec<Transaction>,
    /// The most recent expenses.
    pub recent_expenses: Vec<Transaction>,
    /// Category breakdown of `recent_transactions`.
    pub recent_transaction_pie_chart_data: Vec<PieChartSlice>,
    /// Category breakdown of `recent_incomes`.
    pub recent_incomes_pie_chart_data: Vec<PieChartSlice>,
}

/// Build the dashboard report from all of a user's transactions.
///
/// `transactions` must be ordered most recent first.
pub fn summarize(transactions: Vec<Transaction>) -> DashboardReport {
    let (incomes, expenses): (Vec<_>, Vec<_>) = transactions
        .iter()
        .cloned()
        .partition(|transaction| transaction.kind == TransactionType::Income);

    let total_income: f64 = incomes.iter().map(|transaction| transaction.amount).sum();
    let total_expense: f64 = expenses.iter().map(|transaction| transaction.amount).sum();

    let recent_transactions = most_recent(transactions);
    let recent_incomes = most_recent(incomes);
    let recent_expenses = most_recent(expenses);

    DashboardReport {
        total_balance: total_income - total_expense,
        total_income,
        total_expense,
        recent_transaction_pie_chart_data: build_pie_chart(&recent_transactions),
        recent_incomes_pie_chart_data: build_pie_chart(&recent_incomes),
        recent_transactions,
        recent_incomes,
        recent_expenses,
    }
}

fn most_recent(mut transactions: Vec<Transaction>) -> Vec<Transaction> {
    transactions.truncate(RECENT_LIMIT);
    transactions
}
