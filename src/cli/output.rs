//! Output formatting module
//!
//! This module handles formatting transfer events, transfer graphs and
//! balance changes for the terminal.

use crate::{
    Result,
    analysis::{BalanceChange, TransferEvent, TransferGraph},
    analysis::graph::{display_account, truncate_address},
    data_source::Transaction,
};
use serde::Serialize;

/// Output any serializable result as pretty JSON
pub fn output_json<T: Serialize + ?Sized>(w: &mut impl std::io::Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *w, value)?;
    writeln!(w)?; // Add trailing newline
    Ok(())
}

fn write_header(w: &mut impl std::io::Write, tx: &Transaction) -> Result<()> {
    writeln!(w, "Transaction {} (version {})", tx.hash, tx.version)?;
    if let Some(timestamp) = tx.timestamp() {
        writeln!(w, "Committed at {}", timestamp.format("%Y-%m-%d %H:%M:%S UTC"))?;
    }
    writeln!(w, "{}", "=".repeat(80))?;
    writeln!(w)?;
    Ok(())
}

/// Output transfer events as text table
pub fn output_transfer_events_table(
    w: &mut impl std::io::Write,
    tx: &Transaction,
    events: &[TransferEvent],
) -> Result<()> {
    write_header(w, tx)?;

    if events.is_empty() {
        writeln!(w, "No fungible asset transfers.")?;
        return Ok(());
    }

    writeln!(
        w,
        "{:<8} {:<16} {:<16} {:<16} {:>20}",
        "Type", "Account", "Store", "Asset", "Amount"
    )?;
    writeln!(w, "{:-<80}", "")?;

    for event in events {
        writeln!(
            w,
            "{:<8} {:<16} {:<16} {:<16} {:>20}",
            event.kind.name(),
            display_account(&event.account),
            truncate_address(&event.fungible_store),
            truncate_address(&event.asset),
            event.amount
        )?;
    }

    Ok(())
}

/// Output the transfer graph grouped by sender
pub fn output_graph_pretty(
    w: &mut impl std::io::Write,
    tx: &Transaction,
    graph: &TransferGraph,
) -> Result<()> {
    write_header(w, tx)?;

    if graph.transfers.is_empty() && graph.orphans.is_empty() {
        writeln!(w, "No fungible asset transfers.")?;
        return Ok(());
    }

    for (sender, transfers) in graph.by_sender() {
        writeln!(w, "{}", display_account(sender))?;
        for transfer in transfers {
            writeln!(
                w,
                "  → {:<16} {:>20} {}",
                display_account(&transfer.to),
                transfer.amount,
                truncate_address(&transfer.asset)
            )?;
        }
        writeln!(w)?;
    }

    if !graph.orphans.is_empty() {
        writeln!(w, "Orphans:")?;
        for orphan in &graph.orphans.incoming {
            writeln!(
                w,
                "  IN:  {:<16} {:>20} {}",
                display_account(&orphan.account),
                orphan.amount,
                truncate_address(&orphan.asset)
            )?;
        }
        for orphan in &graph.orphans.outgoing {
            writeln!(
                w,
                "  OUT: {:<16} {:>20} {}",
                display_account(&orphan.account),
                orphan.amount,
                truncate_address(&orphan.asset)
            )?;
        }
    }

    Ok(())
}

/// Output balance changes as text table
pub fn output_balance_table(
    w: &mut impl std::io::Write,
    version: u64,
    changes: &[BalanceChange],
) -> Result<()> {
    writeln!(w, "Balance changes at version {} (against {})", version, version.saturating_sub(1))?;
    writeln!(w, "{}", "=".repeat(100))?;
    writeln!(w)?;

    if changes.is_empty() {
        writeln!(w, "No balance changes.")?;
        return Ok(());
    }

    writeln!(
        w,
        "{:<16} {:<16} {:<16} {:>16} {:>16} {:>16}",
        "Account", "Store", "Asset", "Before", "After", "Change"
    )?;
    writeln!(w, "{:-<100}", "")?;

    for change in changes {
        writeln!(
            w,
            "{:<16} {:<16} {:<16} {:>16} {:>16} {:>16}",
            display_account(change.account()),
            truncate_address(change.fungible_store()),
            truncate_address(change.asset()),
            change.balance_before(),
            change.balance_after(),
            change.change()
        )?;
    }

    Ok(())
}
