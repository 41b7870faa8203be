use std::time::Duration;

use anyhow::Result;
use diff_model::{Buffer, Comparison, ComparisonOptions, RopeBuffer, ThreeSide};

fn main() -> Result<()> {
    env_logger::init();

    let base = "alpha\nbeta\ngamma\ndelta\nepsilon\n";
    let left = "alpha\nBETA\ngamma\ndelta\nepsilon\nzeta\n";
    let right = "alpha\nbeta\ngamma\nDelta!\nepsilon\nzeta\n";

    let mut merge: Comparison<ThreeSide> = Comparison::three_way(
        RopeBuffer::new(left),
        RopeBuffer::new(base),
        RopeBuffer::new(right),
        ComparisonOptions::default(),
    );

    // Diff on the thread pool, then pick the result up here
    merge.schedule_rediff();
    if let Some(status) = merge.wait_for_rediff(Duration::from_secs(5))? {
        println!("Rediff: {}", status);
    }

    println!(
        "{} changes, {} conflicts",
        merge.registry().changes_count(),
        merge.registry().conflicts_count()
    );
    for change in merge.registry().changes() {
        println!(
            "  {} {} {}: left {} base {} right {}",
            change.id(),
            change.conflict_type().category(),
            change.diff_type(),
            change.range(ThreeSide::Left),
            change.range(ThreeSide::Base),
            change.range(ThreeSide::Right)
        );
    }

    let applied = merge.apply_non_conflicted_changes(ThreeSide::Base)?;
    println!("\nApplied {} non-conflicting changes", applied);

    // Anything left is a conflict; take LEFT for each
    let conflicts: Vec<_> = merge
        .registry()
        .valid_changes()
        .map(|change| change.id())
        .collect();
    for id in conflicts.into_iter().rev() {
        merge.replace_change(id, ThreeSide::Left, ThreeSide::Base)?;
    }

    println!("\nMerged result:");
    print!("{}", merge.buffer(ThreeSide::Base).text());

    Ok(())
}
