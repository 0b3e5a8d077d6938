// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
// ABOUTME: Output formatting helpers for pantry-chef
// ABOUTME: Renders review sessions, usage summaries and commit receipts

use pantry_chef::commit::{CommitReceipt, UsageStatus};
use pantry_chef::quota::{Remaining, UsageSummary};
use pantry_chef::review::ReviewSnapshot;

/// Print the drafts of a review session
pub fn display_review(review: &ReviewSnapshot) {
    println!("\nDetected ingredients ({}):", review.drafts.len());
    println!("{}", "=".repeat(60));
    if review.drafts.is_empty() {
        println!("   (none)");
    }
    for draft in &review.drafts {
        let confidence = draft
            .confidence_percent
            .map_or_else(String::new, |p| format!(" ({p}% confident)"));
        let quantity = if draft.quantity.is_empty() {
            "<quantity needed>"
        } else {
            draft.quantity.as_str()
        };
        println!("  [{}] {} - {}{}", draft.position, draft.name, quantity, confidence);
    }

    let incomplete = review.incomplete();
    if !incomplete.is_empty() {
        println!(
            "\n{} draft(s) still need a quantity; use --edit N=NAME:QTY",
            incomplete.len()
        );
    }
}

/// Print a usage summary
pub fn display_usage(summary: &UsageSummary) {
    println!("\nUsage for {} ({} tier):", summary.user_id, summary.tier);
    println!("{}", "=".repeat(60));
    for line in &summary.actions {
        let remaining = match line.remaining {
            Remaining::Unbounded => "unlimited".to_owned(),
            Remaining::Finite(n) => n.to_string(),
        };
        let limit = line
            .limit
            .as_finite()
            .map_or_else(|| "unlimited".to_owned(), |n| n.to_string());
        println!(
            "  {:<22} used {:>3} / {:<9} remaining {}",
            line.action.as_str(),
            line.used,
            limit,
            remaining
        );
    }
    println!("\nResets at {}", summary.resets_at.format("%Y-%m-%d %H:%M UTC"));
}

/// Print a commit receipt
pub fn display_receipt(receipt: &CommitReceipt) {
    println!("\nSaved {} item(s) to the pantry", receipt.count);
    match receipt.usage {
        UsageStatus::Recorded | UsageStatus::Unmetered => {}
        UsageStatus::Pending => {
            println!("Warning: the account store was unavailable and this scan was not counted");
        }
        UsageStatus::OverLimit => {
            println!("Warning: your monthly scan limit was reached before this scan was counted");
        }
    }
}
