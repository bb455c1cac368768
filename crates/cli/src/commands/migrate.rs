use crate::commands::{block_on, load_config, open_database, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("migrate") {
        Ok(config) => config,
        Err(result) => return result,
    };

    block_on("migrate", async {
        let pool = open_database(&config).await?;
        pool.close().await;
        Ok("applied pending migrations".to_string())
    })
}
