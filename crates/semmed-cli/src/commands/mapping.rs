use anyhow::Result;
use semmed_core::mapping::index_mapping;

/// Print the index mapping as pretty JSON
pub fn execute() -> Result<()> {
    println!("{}", render()?);
    Ok(())
}

pub fn render() -> Result<String> {
    Ok(serde_json::to_string_pretty(&index_mapping())?)
}
