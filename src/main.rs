fn main() -> anyhow::Result<()> {
    aquadesk::run()?;
    Ok(())
}
