use knight_chase::web::run_server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("♞ Knight Chase");
    println!("==============");
    println!();

    run_server().await?;

    Ok(())
}
