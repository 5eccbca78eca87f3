pub fn run() -> anyhow::Result<()> {
    println!("tracelens {}", env!("CARGO_PKG_VERSION"));
    println!("Grounded step-by-step explanations for execution traces");
    Ok(())
}
