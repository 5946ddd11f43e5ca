use anyhow::Result;

mod app;
mod logging;

fn main() -> Result<()> {
    let args = backup_device_copy::cli::parse();
    app::run(args)
}
