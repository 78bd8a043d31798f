//! Serve command implementation.

use oxipack_server::{ServerConfig, serve};

pub fn cmd_serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("oxipack-http")
        .build()?;

    println!("OxiPack listening on http://{}{}", config.bind, config.api_prefix);
    runtime.block_on(serve(config))?;
    Ok(())
}
