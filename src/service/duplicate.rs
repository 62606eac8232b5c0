//! Soft duplicate detection for captured receipts.
//!
//! A candidate is scored against each receipt the session already captured.
//! A high score only flags the receipt; submission is never blocked.

use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use serde::Serialize;
use std::collections::VecDeque;

use crate::models::{ProcessedReceipt, ReceiptData};

const STORE_WEIGHT: f64 = 0.5;
const AMOUNT_WEIGHT: f64 = 0.3;
const TIME_WEIGHT: f64 = 0.2;

/// Scores strictly above this are flagged
pub const DUPLICATE_THRESHOLD: f64 = 0.8;

/// Receipts further apart than this get no time similarity
const TIME_WINDOW_HOURS: f64 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DuplicateCheck {
    pub is_duplicate: bool,
    pub score: f64,
}

/// Highest similarity between `candidate` and any receipt in `history`
pub fn check_for_duplicates<'a, I>(candidate: &ReceiptData, history: I) -> DuplicateCheck
where
    I: IntoIterator<Item = &'a ProcessedReceipt>,
{
    let score = history
        .into_iter()
        .map(|previous| similarity(candidate, &previous.data))
        .fold(0.0_f64, f64::max)
        .clamp(0.0, 1.0);

    DuplicateCheck {
        is_duplicate: score > DUPLICATE_THRESHOLD,
        score,
    }
}

fn similarity(a: &ReceiptData, b: &ReceiptData) -> f64 {
    STORE_WEIGHT * store_similarity(&a.store, &b.store)
        + AMOUNT_WEIGHT * amount_similarity(&a.total, &b.total)
        + TIME_WEIGHT * time_similarity(a, b)
}

fn normalize_store(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn store_similarity(a: &str, b: &str) -> f64 {
    let (a, b) = (normalize_store(a), normalize_store(b));
    if !a.is_empty() && a == b {
        1.0
    } else {
        0.0
    }
}

/// 1.0 for totals within a cent, falling linearly with the relative difference
fn amount_similarity(a: &BigDecimal, b: &BigDecimal) -> f64 {
    let diff = (a - b).abs();
    if diff <= BigDecimal::new(1.into(), 2) {
        return 1.0;
    }

    let largest = if a.abs() > b.abs() { a.abs() } else { b.abs() };
    if largest.is_zero() {
        return 1.0;
    }

    let relative = (diff / largest).to_f64().unwrap_or(1.0);
    (1.0 - relative).max(0.0)
}

fn time_similarity(a: &ReceiptData, b: &ReceiptData) -> f64 {
    let minutes = (a.timestamp - b.timestamp).num_minutes().abs() as f64;
    let hours = minutes / 60.0;
    (1.0 - hours / TIME_WINDOW_HOURS).max(0.0)
}

/// Bounded, session-owned capture history. Oldest entries are evicted first.
#[derive(Debug, Clone)]
pub struct ReceiptHistory {
    entries: VecDeque<ProcessedReceipt>,
    capacity: usize,
}

impl ReceiptHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, receipt: ProcessedReceipt) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(receipt);
    }

    pub fn check(&self, candidate: &ReceiptData) -> DuplicateCheck {
        check_for_duplicates(candidate, self.entries.iter())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcessedReceipt> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
