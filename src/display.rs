use colored::Colorize;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use itertools::Itertools;

use crate::blocks::{BlockRecord, RoundPlan, Vp};
use crate::controller::{block_leader, effective_plan, is_swap_block, RoundSnapshot};
use crate::state::Roles;

pub fn vp_label(vp: Vp) -> String {
    match vp {
        Vp::Vp1 => "VP1".blue().bold().to_string(),
        Vp::Vp2 => "VP2".magenta().bold().to_string(),
    }
}

pub fn roles_table(roles: &Roles) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Role").set_alignment(CellAlignment::Left),
        Cell::new("Player").set_alignment(CellAlignment::Center),
    ]);

    for (name, vp) in [
        ("Signaler", roles.signaler),
        ("Judge", roles.judge),
        ("First player", roles.first_player),
        ("Second player", roles.second_player),
    ] {
        table.add_row(vec![
            Cell::new(name.bold().to_string()),
            Cell::new(vp_label(vp)).set_alignment(CellAlignment::Center),
        ]);
    }

    table.to_string()
}

pub fn plan_table(plan: &RoundPlan) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Player"),
        Cell::new("Hand").set_alignment(CellAlignment::Center),
    ]);
    for vp in [Vp::Vp1, Vp::Vp2] {
        table.add_row(vec![
            Cell::new(vp_label(vp)),
            Cell::new(plan.hand(vp).to_string()).set_alignment(CellAlignment::Center),
        ]);
    }

    table.to_string()
}

/// One row per block: index, practice flag, round count, swap and leader.
pub fn schedule_table(blocks: &[BlockRecord]) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("#").set_alignment(CellAlignment::Right),
        Cell::new("Block").set_alignment(CellAlignment::Right),
        Cell::new("Type"),
        Cell::new("Rounds").set_alignment(CellAlignment::Right),
        Cell::new("Hands").set_alignment(CellAlignment::Center),
        Cell::new("Leader").set_alignment(CellAlignment::Center),
    ]);

    for (pos, block) in blocks.iter().enumerate() {
        let kind = if block.practice {
            "practice".yellow().to_string()
        } else {
            "experiment".to_string()
        };
        let hands = if is_swap_block(block.index) {
            "swapped".red().bold().to_string()
        } else {
            "as stored".dimmed().to_string()
        };
        table.add_row(vec![
            Cell::new(pos + 1).set_alignment(CellAlignment::Right),
            Cell::new(block.index).set_alignment(CellAlignment::Right),
            Cell::new(kind),
            Cell::new(block.total_rounds()).set_alignment(CellAlignment::Right),
            Cell::new(hands).set_alignment(CellAlignment::Center),
            Cell::new(vp_label(block_leader(block.index))).set_alignment(CellAlignment::Center),
        ]);
    }

    table.to_string()
}

/// Every round of a block as dealt, next to the stored plan.
pub fn block_plans_table(block: &BlockRecord) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Round").set_alignment(CellAlignment::Right),
        Cell::new("VP1").set_alignment(CellAlignment::Center),
        Cell::new("VP2").set_alignment(CellAlignment::Center),
        Cell::new("Stored").set_alignment(CellAlignment::Center),
    ]);

    for (idx, stored) in block.rounds.iter().enumerate() {
        let dealt = match effective_plan(block, idx) {
            Some(plan) => plan,
            None => continue,
        };
        let stored_str = [stored.vp1, stored.vp2].iter().map(|h| h.to_string()).join(" / ");
        table.add_row(vec![
            Cell::new(idx + 1).set_alignment(CellAlignment::Right),
            Cell::new(dealt.vp1.to_string()).set_alignment(CellAlignment::Center),
            Cell::new(dealt.vp2.to_string()).set_alignment(CellAlignment::Center),
            Cell::new(stored_str.dimmed().to_string()).set_alignment(CellAlignment::Center),
        ]);
    }

    table.to_string()
}

pub fn round_header(snapshot: &RoundSnapshot) -> String {
    let block = if snapshot.practice {
        format!("Practice block {}", snapshot.block_index)
    } else {
        format!("Block {}", snapshot.block_index)
    };
    format!(
        "--- {}  |  Round {}/{} ---",
        block, snapshot.round_in_block, snapshot.total_rounds
    )
    .cyan()
    .bold()
    .to_string()
}

pub fn pause_banner(message: &str) -> String {
    let width = message.lines().map(|l| l.chars().count()).max().unwrap_or(0);
    let rule = "\u{2500}".repeat(width + 4);
    let body = message
        .lines()
        .map(|l| format!("  {}", l.yellow().bold()))
        .join("\n");
    format!("{}\n{}\n{}", rule.dimmed(), body, rule.dimmed())
}

pub fn print_section(title: &str, content: &str) {
    println!("\n{}", title.cyan().bold());
    println!("{}", content);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "Error:".red().bold(), msg);
}

pub fn print_success(msg: &str) {
    println!("{}", msg.green().bold());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::Hand;

    #[test]
    fn test_schedule_table_lists_every_block() {
        colored::control::set_override(false);
        let blocks: Vec<BlockRecord> = (1..=4)
            .map(|index| BlockRecord {
                index,
                practice: false,
                rounds: vec![RoundPlan::new(Hand(1, 2), Hand(3, 4))],
            })
            .collect();
        let out = schedule_table(&blocks);
        assert_eq!(out.matches("swapped").count(), 2);
        assert_eq!(out.matches("as stored").count(), 2);
    }

    #[test]
    fn test_block_plans_table_shows_dealt_hands() {
        colored::control::set_override(false);
        let block = BlockRecord {
            index: 2,
            practice: false,
            rounds: vec![RoundPlan::new(Hand(31, 32), Hand(41, 42))],
        };
        let out = block_plans_table(&block);
        assert!(out.contains("(41, 42)"));
        assert!(out.contains("(31, 32) / (41, 42)"));
    }

    #[test]
    fn test_pause_banner_keeps_every_line() {
        colored::control::set_override(false);
        let out = pause_banner("first\nsecond line");
        assert!(out.contains("first"));
        assert!(out.contains("second line"));
    }
}
