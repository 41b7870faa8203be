use anyhow::Result;
use diff_model::{
    ApplyMode, Buffer, ChangeId, Comparison, ComparisonOptions, LineRange, RopeBuffer, Side,
};

fn main() -> Result<()> {
    env_logger::init();

    // Two versions of the same file
    let old = "fn main() {\n    let x = 1;\n    println!(\"{}\", x);\n}\n";
    let new = "fn main() {\n    let x = 2;\n    let y = 3;\n    println!(\"{}\", x + y);\n}\n";

    let mut comparison: Comparison<Side> = Comparison::two_way(
        RopeBuffer::new(old),
        RopeBuffer::new(new),
        ComparisonOptions::new().inner_fragments(true),
    );
    let events = comparison.subscribe();

    println!("Rediff: {}", comparison.rediff_now()?);
    for change in comparison.registry().changes() {
        println!(
            "  {} {}: left {} right {}",
            change.id(),
            change.diff_type(),
            change.range(Side::Left),
            change.range(Side::Right)
        );
    }

    // Typing on the left moves or damages the tracked changes
    comparison.edit(Side::Left, LineRange::empty(0), &["// header"])?;
    println!("\nAfter inserting a header on the left:");
    for change in comparison.registry().changes() {
        println!(
            "  {} {} left {}",
            change.id(),
            change.validity(),
            change.range(Side::Left)
        );
    }

    // Take every change from the right
    let ids: Vec<ChangeId> = comparison
        .registry()
        .valid_changes()
        .map(|change| change.id())
        .collect();
    let applied = comparison.apply_changes(&ids, Side::Right, ApplyMode::Replace)?;
    println!("\nApplied {} changes, left is now:", applied);
    print!("{}", comparison.buffer(Side::Left).text());

    println!("\nEvents:");
    for event in events.try_iter() {
        println!("  {}", event);
    }

    println!("\nRediff: {}", comparison.rediff_now()?);
    println!("Contents: {}", comparison.registry().contents_equal());

    Ok(())
}
