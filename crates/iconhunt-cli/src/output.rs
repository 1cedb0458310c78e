//! Output formatting: framed SVG blocks or a JSON document.

use iconhunt::ResolutionResult;

pub fn print_result(result: &ResolutionResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    if result.is_empty() {
        println!("No SVGs found for the given query");
        return Ok(());
    }

    println!("Successfully downloaded {} SVG(s):", result.len());
    for (i, svg) in result.svgs().iter().enumerate() {
        println!("\n--- SVG {} ---", i + 1);
        println!("{svg}");
        println!("--- End SVG ---");
    }
    Ok(())
}
