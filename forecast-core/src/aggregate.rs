//! Day grouping and daily summaries.
//!
//! The provider hands back samples every few hours. These functions fold them
//! into one card per calendar day: bucket by the provider's own date label,
//! then reduce each bucket to high/low, mean humidity and a representative
//! condition.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::model::{DailySummary, DayBucket, NormalizedSample, RawSample};
use crate::normalize::normalize_sample;

/// Upper bound on the number of daily cards.
pub const MAX_FORECAST_DAYS: usize = 7;

/// Labels for the first positions; later days use their weekday name.
pub const POSITIONAL_LABELS: [&str; 2] = ["Today", "Tomorrow"];

/// Partition samples into per-date buckets.
///
/// Buckets are ordered by first occurrence of their date key and each keeps
/// the relative order of its members. Only dates that had at least
/// one sample produce a bucket.
pub fn group(samples: Vec<NormalizedSample>) -> Vec<DayBucket> {
    let mut buckets: Vec<DayBucket> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for sample in samples {
        let key = sample.raw.date_key().to_string();
        match index.get(&key) {
            Some(&i) => buckets[i].samples.push(sample),
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push(DayBucket {
                    date: key,
                    samples: vec![sample],
                });
            }
        }
    }

    buckets
}

/// Reduce buckets to daily summaries, keeping at most [`MAX_FORECAST_DAYS`].
///
/// `labels[i]` names the summary at position `i`; positions past the end of
/// `labels` get the weekday of their date.
pub fn summarize(buckets: &[DayBucket], labels: &[&str]) -> Vec<DailySummary> {
    buckets
        .iter()
        .filter(|bucket| !bucket.samples.is_empty())
        .take(MAX_FORECAST_DAYS)
        .enumerate()
        .filter_map(|(position, bucket)| {
            let label = labels
                .get(position)
                .map(|l| l.to_string())
                .unwrap_or_else(|| weekday_label(&bucket.date));
            summarize_bucket(bucket, label)
        })
        .collect()
}

/// Normalize, group and summarize a raw forecast in one go.
pub fn daily_forecast(samples: Vec<RawSample>) -> Vec<DailySummary> {
    let normalized = samples.into_iter().map(normalize_sample).collect();
    summarize(&group(normalized), &POSITIONAL_LABELS)
}

fn summarize_bucket(bucket: &DayBucket, day_label: String) -> Option<DailySummary> {
    // Positional pick, not a frequency mode: length 5 -> index 2, length 2 -> index 1.
    let representative = bucket.samples.get(bucket.samples.len() / 2)?;

    let (low_c, high_c) = bucket.samples.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(low, high), s| (low.min(s.raw.temperature_c), high.max(s.raw.temperature_c)),
    );

    let humidity_sum: u32 = bucket.samples.iter().map(|s| u32::from(s.raw.humidity_pct)).sum();
    let avg_humidity_pct = (f64::from(humidity_sum) / bucket.samples.len() as f64).round() as u8;

    Some(DailySummary {
        date: bucket.date.clone(),
        day_label,
        high_c,
        low_c,
        avg_humidity_pct,
        condition: representative.condition,
        description: representative.raw.description.clone(),
    })
}

fn weekday_label(date: &str) -> String {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%A").to_string())
        .unwrap_or_else(|_| date.to_string())
}
