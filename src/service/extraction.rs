//! Receipt extraction: image bytes -> OCR text -> `ReceiptData`.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ExtractionError;
use crate::models::{Category, ReceiptData, ReceiptItem};
use crate::service::category::guess_category;

/// Turns a receipt image into raw text
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image: &[u8]) -> Result<String, ExtractionError>;
}

/// Reads the upload as already-recognized UTF-8 text (text uploads, device-side OCR)
#[derive(Debug, Default, Clone)]
pub struct PlainTextRecognizer;

#[async_trait]
impl TextRecognizer for PlainTextRecognizer {
    async fn recognize(&self, image: &[u8]) -> Result<String, ExtractionError> {
        let text = String::from_utf8_lossy(image).into_owned();
        if text.trim().is_empty() {
            return Err(ExtractionError::NoText);
        }
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct OcrRequest<'a> {
    image: &'a str,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    text: String,
}

/// Remote OCR service: POST `{image: base64}`, answers `{text}`
#[derive(Debug, Clone)]
pub struct HttpOcrRecognizer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpOcrRecognizer {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl TextRecognizer for HttpOcrRecognizer {
    async fn recognize(&self, image: &[u8]) -> Result<String, ExtractionError> {
        use base64::Engine;

        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let started = std::time::Instant::now();

        let response = self
            .client
            .post(&self.endpoint)
            .json(&OcrRequest { image: &encoded })
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ExtractionError::Recognizer(e.to_string()))?;

        let body: OcrResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::Recognizer(e.to_string()))?;

        tracing::debug!(
            "OCR returned {} chars in {:?}",
            body.text.len(),
            started.elapsed()
        );

        if body.text.trim().is_empty() {
            return Err(ExtractionError::NoText);
        }
        Ok(body.text)
    }
}

/// Money with two decimals: grouped `1,234.56` / `1.234,56`, or plain `12.50` / `12,50`
const AMOUNT: &str = r"\d{1,3}(?:,\d{3})+\.\d{2}|\d{1,3}(?:\.\d{3})+,\d{2}|\d+[.,]\d{2}";

/// Compiled patterns for receipt text
pub struct ReceiptParser {
    amount: Regex,
    item_line: Regex,
    total_line: Regex,
    skip_line: Regex,
    date: Regex,
    time: Regex,
}

impl Default for ReceiptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiptParser {
    pub fn new() -> Self {
        // literal patterns
        let compile = |p: &str| Regex::new(p).expect("valid receipt pattern");
        Self {
            amount: compile(&format!(r"\$?\s*({AMOUNT})\b")),
            item_line: compile(&format!(r"^(.*?[A-Za-z].*?)\s+\$?\s*({AMOUNT})\s*[A-Za-z]?$")),
            total_line: compile(r"(?i)\b(grand\s+)?total\b"),
            skip_line: compile(
                r"(?i)\b(sub\s*-?total|total|tax|change|cash|visa|mastercard|amex|debit|credit|card|balance|tender|savings)\b",
            ),
            date: compile(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})\b"),
            time: compile(r"\b(\d{1,2}):(\d{2})(?::(\d{2}))?\s*([AaPp][Mm])?\b"),
        }
    }

    /// Parse OCR text. `now` is used when no date is printed.
    /// Items are categorized only when `categorize` is set.
    pub fn parse(
        &self,
        raw_text: &str,
        now: DateTime<Utc>,
        categorize: bool,
    ) -> Result<ReceiptData, ExtractionError> {
        let lines: Vec<&str> = raw_text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if lines.is_empty() {
            return Err(ExtractionError::NoText);
        }

        let store_idx = lines
            .iter()
            .position(|l| {
                l.chars().any(char::is_alphabetic)
                    && !self.amount.is_match(l)
                    && !self.total_line.is_match(l)
                    && !self.date.is_match(l)
            })
            .ok_or(ExtractionError::MissingStore)?;
        let store = lines[store_idx].to_string();

        let total = lines
            .iter()
            .rev()
            .filter(|l| self.total_line.is_match(l) && !l.to_lowercase().contains("subtotal"))
            .find_map(|l| self.amount_in(l))
            .ok_or(ExtractionError::MissingTotal)?;

        let items = lines[store_idx + 1..]
            .iter()
            .filter(|l| !self.skip_line.is_match(l))
            .filter_map(|l| {
                let caps = self.item_line.captures(l)?;
                let name = caps.get(1)?.as_str().trim().to_string();
                let price = parse_amount(caps.get(2)?.as_str())?;
                let category = if categorize {
                    guess_category(&name)
                } else {
                    Category::Other
                };
                Some(ReceiptItem {
                    name,
                    price,
                    category,
                })
            })
            .collect();

        let (timestamp, timestamp_confidence) = self.timestamp(&lines, now);

        Ok(ReceiptData {
            store,
            total,
            items,
            timestamp,
            raw_text: raw_text.to_string(),
            timestamp_confidence,
        })
    }

    fn amount_in(&self, line: &str) -> Option<BigDecimal> {
        self.amount
            .captures_iter(line)
            .last()
            .and_then(|c| c.get(1))
            .and_then(|m| parse_amount(m.as_str()))
    }

    fn timestamp(&self, lines: &[&str], now: DateTime<Utc>) -> (DateTime<Utc>, f64) {
        for line in lines {
            let Some(caps) = self.date.captures(line) else {
                continue;
            };
            let month: u32 = caps[1].parse().unwrap_or(0);
            let day: u32 = caps[2].parse().unwrap_or(0);
            let mut year: i32 = caps[3].parse().unwrap_or(0);
            if year < 100 {
                year += 2000;
            }
            let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
                continue;
            };

            let time = lines.iter().find_map(|l| self.time_in(l));
            let confidence = if time.is_some() { 1.0 } else { 0.5 };
            let naive = date.and_time(time.unwrap_or(NaiveTime::MIN));
            return (Utc.from_utc_datetime(&naive), confidence);
        }
        (now, 0.0)
    }

    fn time_in(&self, line: &str) -> Option<NaiveTime> {
        let caps = self.time.captures(line)?;
        let mut hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        let second: u32 = caps.get(3).and_then(|s| s.as_str().parse().ok()).unwrap_or(0);
        if let Some(meridiem) = caps.get(4) {
            let pm = meridiem.as_str().eq_ignore_ascii_case("pm");
            hour %= 12;
            if pm {
                hour += 12;
            }
        }
        NaiveTime::from_hms_opt(hour, minute, second)
    }
}

/// The last `.` or `,` is the decimal mark; any earlier ones group thousands
fn parse_amount(raw: &str) -> Option<BigDecimal> {
    let normalized = match raw.rfind(['.', ',']) {
        Some(idx) => format!("{}.{}", raw[..idx].replace(['.', ','], ""), &raw[idx + 1..]),
        None => raw.to_string(),
    };
    BigDecimal::from_str(&normalized).ok()
}

/// Parse receipt text with a fresh parser
pub fn parse_receipt_text(
    raw_text: &str,
    now: DateTime<Utc>,
    categorize: bool,
) -> Result<ReceiptData, ExtractionError> {
    ReceiptParser::new().parse(raw_text, now, categorize)
}

/// Recognize and parse in one step
pub async fn extract(
    recognizer: &dyn TextRecognizer,
    parser: &ReceiptParser,
    image: &[u8],
    now: DateTime<Utc>,
    categorize: bool,
) -> Result<ReceiptData, ExtractionError> {
    let text = recognizer.recognize(image).await?;
    parser.parse(&text, now, categorize)
}
