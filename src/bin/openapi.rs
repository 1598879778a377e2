use anyhow::Result;

fn main() -> Result<()> {
    let spec = mealivo::mealivo::openapi();
    println!("{}", spec.to_pretty_json()?);
    Ok(())
}
