use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = gig_server::Args::parse();

	gig_server::run(args).await
}
